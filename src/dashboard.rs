use log::{info, warn};

use crate::listview::RecordSource;
use crate::models::{Candidate, Record, Vote, Voter};

// One summary card. A failed fetch shows its message in place of the count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tile {
    Count(usize),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub registered_voters: Tile,
    pub candidates: Tile,
    pub votes_cast: Tile,
}

impl Dashboard {
    pub fn tiles(&self) -> [(&'static str, &Tile); 3] {
        [
            ("Registered Voters", &self.registered_voters),
            ("Candidates", &self.candidates),
            ("Votes Cast", &self.votes_cast),
        ]
    }

    pub fn has_failures(&self) -> bool {
        self.tiles().iter().any(|(_, tile)| matches!(tile, Tile::Failed(_)))
    }
}

async fn count<R, S>(source: &S) -> Tile
where
    R: Record,
    S: RecordSource<R> + ?Sized,
{
    match source.fetch(None).await {
        Ok(records) => Tile::Count(records.len()),
        Err(e) => {
            warn!("Dashboard could not count {}: {}", R::NOUN, e);
            Tile::Failed(e.user_message(&format!("Failed to fetch {}", R::NOUN)))
        }
    }
}

/// Fetch the three collections side by side and count them. One failing
/// endpoint does not hide the other two counts.
pub async fn load_dashboard<S>(source: &S) -> Dashboard
where
    S: RecordSource<Voter> + RecordSource<Candidate> + RecordSource<Vote> + ?Sized,
{
    let (registered_voters, candidates, votes_cast) = tokio::join!(
        count::<Voter, S>(source),
        count::<Candidate, S>(source),
        count::<Vote, S>(source),
    );
    info!(
        "Dashboard loaded: voters={:?} candidates={:?} votes={:?}",
        registered_voters, candidates, votes_cast
    );
    Dashboard {
        registered_voters,
        candidates,
        votes_cast,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct FakeBackend {
        voters: usize,
        candidates: usize,
        votes_down: bool,
    }

    fn voter(i: usize) -> Voter {
        Voter {
            first_name: "Amal".to_string(),
            last_name: format!("Perera {i}"),
            age: 30,
            registration_code: format!("REG-{i}"),
            nic: format!("{:09}V", i),
            disabled: false,
        }
    }

    #[async_trait]
    impl RecordSource<Voter> for FakeBackend {
        async fn fetch(&self, _query: Option<&str>) -> Result<Vec<Voter>, ApiError> {
            Ok((0..self.voters).map(voter).collect())
        }
    }

    #[async_trait]
    impl RecordSource<Candidate> for FakeBackend {
        async fn fetch(&self, _query: Option<&str>) -> Result<Vec<Candidate>, ApiError> {
            Ok((0..self.candidates)
                .map(|i| Candidate {
                    id: i.to_string(),
                    name: format!("Candidate {i}"),
                    party: "Independent".to_string(),
                })
                .collect())
        }
    }

    #[async_trait]
    impl RecordSource<Vote> for FakeBackend {
        async fn fetch(&self, _query: Option<&str>) -> Result<Vec<Vote>, ApiError> {
            if self.votes_down {
                return Err(ApiError::Status {
                    status: 503,
                    message: None,
                });
            }
            Ok(vec![Vote {
                id: "1".to_string(),
                voter_nic: "199912345678".to_string(),
                timestamp: Utc.with_ymd_and_hms(2025, 10, 21, 10, 30, 0).unwrap(),
                cipher_text: "AES256-CBC:Xj9K".to_string(),
                plain_text: "Candidate A".to_string(),
                candidate_id: "CAND001".to_string(),
            }])
        }
    }

    #[tokio::test]
    async fn counts_each_collection() {
        let backend = FakeBackend {
            voters: 3,
            candidates: 2,
            votes_down: false,
        };
        let dashboard = load_dashboard(&backend).await;
        assert_eq!(dashboard.registered_voters, Tile::Count(3));
        assert_eq!(dashboard.candidates, Tile::Count(2));
        assert_eq!(dashboard.votes_cast, Tile::Count(1));
        assert!(!dashboard.has_failures());
    }

    #[tokio::test]
    async fn one_failed_endpoint_keeps_the_other_counts() {
        let backend = FakeBackend {
            voters: 4,
            candidates: 0,
            votes_down: true,
        };
        let dashboard = load_dashboard(&backend).await;
        assert_eq!(dashboard.registered_voters, Tile::Count(4));
        assert_eq!(dashboard.candidates, Tile::Count(0));
        assert_eq!(dashboard.votes_cast, Tile::Failed("Failed to fetch votes".to_string()));
        assert!(dashboard.has_failures());
    }
}
