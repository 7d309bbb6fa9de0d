//! Keyword Scorer — deterministic lexical-overlap score used whenever either
//! side of a comparison lacks a valid embedding.
//!
//! Algorithm:
//! 1. Tokenize job title + description into a lower-cased set (tokens of
//!    ≤2 chars dropped; `+`, `.` and `#` kept so "c++" and ".net" survive)
//! 2. Candidate tokens: each skill as a unit, plus title and company words
//! 3. base = round(matches / total × 65)
//! 4. +25 when any title word appears in the job set
//! 5. Clamp to [10, 100]; an empty candidate token list scores exactly 10

use std::collections::HashSet;

use crate::matching::types::{CandidateProfile, JobDescriptor};

/// Score given to profiles with nothing to match on. Keeps thin profiles
/// visible to downstream review instead of scoring them out at zero.
pub const KEYWORD_FLOOR: u8 = 10;
/// Points available for skill/title/company overlap.
pub const OVERLAP_WEIGHT: f64 = 65.0;
pub const TITLE_BONUS: u8 = 25;

/// Precomputed job token set, reused across every candidate in a ranking call.
pub struct KeywordScorer {
    job_tokens: HashSet<String>,
}

impl KeywordScorer {
    pub fn for_job(job: &JobDescriptor) -> Self {
        Self {
            job_tokens: tokenize_job_text(&format!("{} {}", job.title, job.description)),
        }
    }

    pub fn score(&self, candidate: &CandidateProfile) -> u8 {
        let title_tokens = word_tokens(&candidate.current_title);
        let mut tokens: Vec<String> = candidate
            .skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| is_significant(s))
            .collect();
        tokens.extend(title_tokens.iter().cloned());
        tokens.extend(word_tokens(&candidate.current_company));

        if tokens.is_empty() {
            return KEYWORD_FLOOR;
        }

        let matches = tokens
            .iter()
            .filter(|t| self.job_tokens.contains(t.as_str()))
            .count();
        let base = ((matches as f64 / tokens.len() as f64) * OVERLAP_WEIGHT).round() as u8;

        let title_bonus = if title_tokens
            .iter()
            .any(|t| self.job_tokens.contains(t.as_str()))
        {
            TITLE_BONUS
        } else {
            0
        };

        base.saturating_add(title_bonus).clamp(KEYWORD_FLOOR, 100)
    }
}

/// One-off keyword score for a single job/candidate pair. The ranking loop
/// uses [`KeywordScorer`] directly to tokenize the job only once.
#[cfg(test)]
pub fn keyword_score(job: &JobDescriptor, candidate: &CandidateProfile) -> u8 {
    KeywordScorer::for_job(job).score(candidate)
}

/// Splits free text on anything that is not alphanumeric, `+`, `.` or `#`.
/// Periods stay part of the token, so "kubernetes." and "kubernetes" differ.
pub fn tokenize_job_text(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '.' | '#')))
        .filter(|t| is_significant(t))
        .map(str::to_string)
        .collect()
}

fn word_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| is_significant(t))
        .collect()
}

fn is_significant(token: &str) -> bool {
    token.chars().count() > 2
}
