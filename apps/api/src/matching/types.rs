//! In-memory records flowing through the matching pipeline.
//!
//! JSON field names are camelCase so request handlers can accept and return
//! these types directly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The job opening a candidate pool is scored against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Missing or empty means the upstream embedding call failed or was never made.
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
}

impl JobDescriptor {
    /// Text sent to the embedding source for this job.
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.title, self.description)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

/// Read-only candidate input. Scoring never mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub current_title: String,
    pub current_company: String,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_experience_months: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing)]
    pub embedding: Option<Vec<f32>>,
}

impl CandidateProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Text sent to the embedding source for this candidate.
    pub fn embedding_text(&self) -> String {
        let mut text = self.current_title.clone();
        if !self.current_company.is_empty() {
            text.push_str(" at ");
            text.push_str(&self.current_company);
        }
        if !self.skills.is_empty() {
            text.push_str(". Skills: ");
            text.push_str(&self.skills.join(", "));
        }
        text
    }
}

/// Which scoring path produced a `match_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMethod {
    Vector,
    Keyword,
}

/// A candidate augmented with its score for one ranking call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: CandidateProfile,
    /// Always within 0..=100.
    pub match_score: u8,
    pub score_method: ScoreMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biased_flag: Option<bool>,
    /// Qualitative score from the enrichment step. Never replaces `match_score`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl ScoredCandidate {
    pub fn new(candidate: CandidateProfile, match_score: u8, score_method: ScoreMethod) -> Self {
        Self {
            candidate,
            match_score: match_score.min(100),
            score_method,
            biased_flag: None,
            deep_score: None,
            reasoning: None,
        }
    }
}
