use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::UnknownField;
use crate::listview::SortDirection;

// Value a record exposes for one of its sortable fields.
// Text compares lexicographically, Time by instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue<'a> {
    Text(&'a str),
    Time(DateTime<Utc>),
    Number(i64),
}

/// One row of a listed collection.
///
/// Implementors name their searchable text, their sortable fields and at most
/// one masked field. Identity is always by `id()`, never by row position.
pub trait Record: Clone + Send + Sync + 'static {
    type Field: Copy + Eq + fmt::Debug + Send + Sync + 'static;

    /// Plural noun used in user-facing messages ("ballots", "votes", ...).
    const NOUN: &'static str;

    fn id(&self) -> &str;
    fn search_fields(&self) -> Vec<&str>;
    fn sort_value(&self, field: Self::Field) -> SortValue<'_>;
    fn default_sort() -> (Self::Field, SortDirection);

    // Field hidden until the row is revealed, if the record has one
    fn masked_value(&self) -> Option<&str> {
        None
    }
}

// --- Ballots ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ballot {
    pub public_ballot_id: String,
    pub hashed_ballot: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotField {
    BallotId,
    CreatedAt,
}

impl FromStr for BallotField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" | "ballot_id" | "public_ballot_id" => Ok(BallotField::BallotId),
            "created_at" | "created" => Ok(BallotField::CreatedAt),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

impl Record for Ballot {
    type Field = BallotField;
    const NOUN: &'static str = "ballots";

    fn id(&self) -> &str {
        &self.public_ballot_id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.public_ballot_id]
    }

    fn sort_value(&self, field: BallotField) -> SortValue<'_> {
        match field {
            BallotField::BallotId => SortValue::Text(&self.public_ballot_id),
            BallotField::CreatedAt => SortValue::Time(self.created_at),
        }
    }

    fn default_sort() -> (BallotField, SortDirection) {
        (BallotField::CreatedAt, SortDirection::Descending)
    }

    fn masked_value(&self) -> Option<&str> {
        Some(&self.hashed_ballot)
    }
}

// --- Votes ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    #[serde(rename = "voterNIC")]
    pub voter_nic: String,
    pub timestamp: DateTime<Utc>,
    pub cipher_text: String,
    pub plain_text: String,
    pub candidate_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteField {
    Timestamp,
    VoterNic,
    CandidateId,
}

impl FromStr for VoteField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp" | "time" => Ok(VoteField::Timestamp),
            "nic" | "voter_nic" | "voterNIC" => Ok(VoteField::VoterNic),
            "candidate" | "candidate_id" | "candidateId" => Ok(VoteField::CandidateId),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

impl Record for Vote {
    type Field = VoteField;
    const NOUN: &'static str = "votes";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.voter_nic, &self.candidate_id]
    }

    fn sort_value(&self, field: VoteField) -> SortValue<'_> {
        match field {
            VoteField::Timestamp => SortValue::Time(self.timestamp),
            VoteField::VoterNic => SortValue::Text(&self.voter_nic),
            VoteField::CandidateId => SortValue::Text(&self.candidate_id),
        }
    }

    fn default_sort() -> (VoteField, SortDirection) {
        (VoteField::Timestamp, SortDirection::Descending)
    }

    fn masked_value(&self) -> Option<&str> {
        Some(&self.plain_text)
    }
}

// --- Candidates ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub party: String,
}

// Payload for registering a candidate. The id is generated client side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub id: String,
    pub name: String,
    pub party: String,
}

impl NewCandidate {
    pub fn new(name: String, party: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            party,
        }
    }
}

impl From<NewCandidate> for Candidate {
    fn from(new: NewCandidate) -> Self {
        Candidate {
            id: new.id,
            name: new.name,
            party: new.party,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateField {
    Name,
    Party,
}

impl FromStr for CandidateField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(CandidateField::Name),
            "party" => Ok(CandidateField::Party),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

impl Record for Candidate {
    type Field = CandidateField;
    const NOUN: &'static str = "candidates";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name]
    }

    fn sort_value(&self, field: CandidateField) -> SortValue<'_> {
        match field {
            CandidateField::Name => SortValue::Text(&self.name),
            CandidateField::Party => SortValue::Text(&self.party),
        }
    }

    fn default_sort() -> (CandidateField, SortDirection) {
        (CandidateField::Name, SortDirection::Ascending)
    }
}

// --- Voters ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub age: u32,
    pub registration_code: String,
    #[serde(rename = "NIC")]
    pub nic: String,
    #[serde(default)]
    pub disabled: bool,
}

impl Voter {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoterField {
    LastName,
    Nic,
    Age,
}

impl FromStr for VoterField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "last_name" => Ok(VoterField::LastName),
            "nic" | "NIC" => Ok(VoterField::Nic),
            "age" => Ok(VoterField::Age),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

impl Record for Voter {
    type Field = VoterField;
    const NOUN: &'static str = "voters";

    fn id(&self) -> &str {
        &self.nic
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            &self.first_name,
            &self.last_name,
            &self.nic,
            &self.registration_code,
        ]
    }

    fn sort_value(&self, field: VoterField) -> SortValue<'_> {
        match field {
            VoterField::LastName => SortValue::Text(&self.last_name),
            VoterField::Nic => SortValue::Text(&self.nic),
            VoterField::Age => SortValue::Number(i64::from(self.age)),
        }
    }

    fn default_sort() -> (VoterField, SortDirection) {
        (VoterField::LastName, SortDirection::Ascending)
    }
}

// --- Tally ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyEntry {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub party: String,
    pub vote_count: u64,
}

impl TallyEntry {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyField {
    VoteCount,
    LastName,
}

impl Record for TallyEntry {
    type Field = TallyField;
    const NOUN: &'static str = "results";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.first_name, &self.last_name, &self.party]
    }

    fn sort_value(&self, field: TallyField) -> SortValue<'_> {
        match field {
            // Counts beyond i64::MAX are not a realistic tally
            TallyField::VoteCount => SortValue::Number(i64::try_from(self.vote_count).unwrap_or(i64::MAX)),
            TallyField::LastName => SortValue::Text(&self.last_name),
        }
    }

    fn default_sort() -> (TallyField, SortDirection) {
        (TallyField::VoteCount, SortDirection::Descending)
    }
}
