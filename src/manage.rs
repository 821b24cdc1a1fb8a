use async_trait::async_trait;
use log::{error, info};

use crate::error::ApiError;
use crate::forms::{CandidateForm, validate_nic};
use crate::listview;
use crate::models::{Candidate, NewCandidate, Voter};

pub const ALL_PARTIES: &str = "All";

#[async_trait]
pub trait CandidateService: Send + Sync {
    async fn create_candidate(&self, candidate: &NewCandidate) -> Result<Candidate, ApiError>;
    async fn delete_candidate(&self, id: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait VoterService: Send + Sync {
    async fn disable_voter(&self, nic: &str) -> Result<(), ApiError>;
}

// Inline feedback shown under a management form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(text) | Notice::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// Candidate management page state.
///
/// Local entries change only after the backend confirms the mutation. A
/// rejected call leaves the list as it was and sets an error notice.
#[derive(Debug, Default)]
pub struct CandidateRoster {
    candidates: Vec<Candidate>,
    search_term: String,
    party: Option<String>,
    notice: Option<Notice>,
}

impl CandidateRoster {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    // "All" (or nothing) clears the party filter
    pub fn select_party(&mut self, party: Option<&str>) {
        self.party = party
            .filter(|p| !p.is_empty() && *p != ALL_PARTIES)
            .map(str::to_string);
    }

    /// Party choices for the filter dropdown, "All" first, then each party
    /// in order of first appearance.
    pub fn parties(&self) -> Vec<String> {
        let mut parties = vec![ALL_PARTIES.to_string()];
        for c in &self.candidates {
            if !parties.iter().any(|p| p == &c.party) {
                parties.push(c.party.clone());
            }
        }
        parties
    }

    pub fn visible(&self) -> Vec<&Candidate> {
        listview::filter(&self.candidates, &self.search_term)
            .into_iter()
            .filter(|c| self.party.as_deref().is_none_or(|p| c.party == p))
            .collect()
    }

    pub async fn register<S>(&mut self, service: &S, form: &CandidateForm) -> bool
    where
        S: CandidateService + ?Sized,
    {
        let new = match form.validate() {
            Ok(new) => new,
            Err(e) => {
                self.notice = Some(Notice::Error(e.to_string()));
                return false;
            }
        };
        match service.create_candidate(&new).await {
            Ok(created) => {
                info!("Registered candidate {} ({})", created.name, created.id);
                self.candidates.push(created);
                self.notice = Some(Notice::Success("Candidate successfully added!".to_string()));
                true
            }
            Err(e) => {
                error!("Failed to register candidate: {}", e);
                self.notice = Some(Notice::Error(e.user_message("Failed to register candidate")));
                false
            }
        }
    }

    pub async fn remove<S>(&mut self, service: &S, id: &str) -> bool
    where
        S: CandidateService + ?Sized,
    {
        match service.delete_candidate(id).await {
            Ok(()) => {
                info!("Deleted candidate {}", id);
                self.candidates.retain(|c| c.id != id);
                self.notice = Some(Notice::Success("Candidate deleted".to_string()));
                true
            }
            Err(e) => {
                error!("Failed to delete candidate {}: {}", id, e);
                self.notice = Some(Notice::Error(e.user_message("Failed to delete candidate")));
                false
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct VoterRoster {
    voters: Vec<Voter>,
    notice: Option<Notice>,
}

impl VoterRoster {
    pub fn new(voters: Vec<Voter>) -> Self {
        Self { voters, notice: None }
    }

    pub fn voters(&self) -> &[Voter] {
        &self.voters
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub async fn disable<S>(&mut self, service: &S, nic: &str) -> bool
    where
        S: VoterService + ?Sized,
    {
        let nic = match validate_nic(nic) {
            Ok(nic) => nic,
            Err(e) => {
                self.notice = Some(Notice::Error(e.to_string()));
                return false;
            }
        };
        match service.disable_voter(&nic).await {
            Ok(()) => {
                info!("Disabled voter {}", nic);
                if let Some(voter) = self.voters.iter_mut().find(|v| v.nic == nic) {
                    voter.disabled = true;
                }
                self.notice = Some(Notice::Success("Voter has been disabled successfully".to_string()));
                true
            }
            Err(e) => {
                error!("Failed to disable voter {}: {}", nic, e);
                self.notice = Some(Notice::Error(e.user_message("Failed to disable voter")));
                false
            }
        }
    }
}
