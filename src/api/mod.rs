use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{ApiError, parse_error_message};
use crate::forms::{LoginRequest, RegisterRequest};
use crate::listview::{self, RecordSource};
use crate::manage::{CandidateService, VoterService};
use crate::models::{Ballot, Candidate, NewCandidate, TallyEntry, Vote, Voter};
use crate::session::SessionStore;

// One backend, one endpoint table
const BALLOTS: &str = "/ballots";
const VOTES: &str = "/votes";
const CANDIDATES: &str = "/candidates";
const POST_CANDIDATE: &str = "/post_candidates";
const ELIGIBLE_VOTERS: &str = "/eligible-voters";
const DISABLE_VOTER: &str = "/disable-voter";
const TALLY: &str = "/tally";
const LOGIN: &str = "/login";
const REGISTER: &str = "/auth/register";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
}

#[derive(Serialize)]
struct DisableVoterRequest<'a> {
    #[serde(rename = "NIC")]
    nic: &'a str,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(config: &Config, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // `id` becomes a single encoded path segment under `collection`
    fn item_url(&self, collection: &str, id: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.url(collection)).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    // Attach the bearer token when a session exists
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: parse_error_message(&body),
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        debug!("GET {}{}", self.base_url, path);
        let body = self.send(self.http.get(self.url(path)).query(query)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn fetch_ballots(&self, ballot_id: Option<&str>) -> Result<Vec<Ballot>, ApiError> {
        let query: Vec<(&str, &str)> = ballot_id.map(|id| vec![("ballot_id", id)]).unwrap_or_default();
        let ballots: Vec<Ballot> = self.get_json(BALLOTS, &query).await?;
        Ok(apply_ballot_hint(ballots, ballot_id))
    }

    pub async fn fetch_votes(&self) -> Result<Vec<Vote>, ApiError> {
        self.get_json(VOTES, &[]).await
    }

    pub async fn fetch_candidates(&self) -> Result<Vec<Candidate>, ApiError> {
        self.get_json(CANDIDATES, &[]).await
    }

    pub async fn fetch_voters(&self) -> Result<Vec<Voter>, ApiError> {
        self.get_json(ELIGIBLE_VOTERS, &[]).await
    }

    pub async fn fetch_tally(&self) -> Result<Vec<TallyEntry>, ApiError> {
        self.get_json(TALLY, &[]).await
    }

    // Logs in and stores the returned token in the session store
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let body = self.send(self.http.post(self.url(LOGIN)).json(request)).await.map_err(|e| {
            error!("Login failed: {}", e);
            e
        })?;
        let response: LoginResponse = serde_json::from_str(&body)?;
        if let Some(token) = &response.token {
            self.session.set(token.clone());
            info!("Logged in as {}", request.email);
        }
        Ok(response)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.send(self.http.post(self.url(REGISTER)).json(request)).await.map_err(|e| {
            error!("Registration failed: {}", e);
            e
        })?;
        info!("Registered {}", request.email);
        Ok(())
    }

    pub fn logout(&self) {
        self.session.clear();
    }
}

// The backend may ignore the hint, so apply it locally as well
fn apply_ballot_hint(ballots: Vec<Ballot>, hint: Option<&str>) -> Vec<Ballot> {
    match hint {
        Some(hint) if !hint.is_empty() => listview::filter(&ballots, hint).into_iter().cloned().collect(),
        _ => ballots,
    }
}

#[async_trait]
impl RecordSource<Ballot> for ApiClient {
    async fn fetch(&self, query: Option<&str>) -> Result<Vec<Ballot>, ApiError> {
        self.fetch_ballots(query).await
    }
}

#[async_trait]
impl RecordSource<Vote> for ApiClient {
    async fn fetch(&self, _query: Option<&str>) -> Result<Vec<Vote>, ApiError> {
        self.fetch_votes().await
    }
}

#[async_trait]
impl RecordSource<Candidate> for ApiClient {
    async fn fetch(&self, _query: Option<&str>) -> Result<Vec<Candidate>, ApiError> {
        self.fetch_candidates().await
    }
}

#[async_trait]
impl RecordSource<Voter> for ApiClient {
    async fn fetch(&self, _query: Option<&str>) -> Result<Vec<Voter>, ApiError> {
        self.fetch_voters().await
    }
}

#[async_trait]
impl RecordSource<TallyEntry> for ApiClient {
    async fn fetch(&self, _query: Option<&str>) -> Result<Vec<TallyEntry>, ApiError> {
        self.fetch_tally().await
    }
}

#[async_trait]
impl CandidateService for ApiClient {
    async fn create_candidate(&self, candidate: &NewCandidate) -> Result<Candidate, ApiError> {
        let body = self
            .send(self.http.post(self.url(POST_CANDIDATE)).json(candidate))
            .await?;
        // Some backends answer with a status message instead of the record
        match serde_json::from_str::<Candidate>(&body) {
            Ok(created) => Ok(created),
            Err(_) => {
                debug!("create_candidate: response was not a candidate, using submitted record");
                Ok(candidate.clone().into())
            }
        }
    }

    async fn delete_candidate(&self, id: &str) -> Result<(), ApiError> {
        let url = self.item_url(CANDIDATES, id)?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl VoterService for ApiClient {
    async fn disable_voter(&self, nic: &str) -> Result<(), ApiError> {
        self.send(
            self.http
                .post(self.url(DISABLE_VOTER))
                .json(&DisableVoterRequest { nic }),
        )
        .await?;
        Ok(())
    }
}
