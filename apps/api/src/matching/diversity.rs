//! Diversity Reranker — keeps one employer from crowding the top of a ranking.
//!
//! Penalty-only: repeats of an already-seen company are docked a few points
//! and flagged, never removed and never explicitly promoted.

use std::collections::HashSet;

use crate::matching::ranking::sort_by_score_desc;
use crate::matching::types::ScoredCandidate;

/// Number of accepted entries that are never penalised.
pub const PROTECTED_PREFIX: usize = 5;
pub const REPEAT_EMPLOYER_PENALTY: u8 = 5;

/// Walks an already-sorted ranking once, penalising repeat employers after the
/// first [`PROTECTED_PREFIX`] accepted entries, then re-sorts (stable).
///
/// The protected prefix counts positions in the output being built, not
/// score rank, so a single dominant company keeps its first five occurrences
/// unpenalised.
pub fn diversify(ranked: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut output: Vec<ScoredCandidate> = Vec::with_capacity(ranked.len());

    for mut scored in ranked {
        let company = normalize_company(&scored.candidate.current_company);
        let repeat = company.as_ref().is_some_and(|c| seen.contains(c));

        if output.len() >= PROTECTED_PREFIX && repeat {
            scored.match_score = scored.match_score.saturating_sub(REPEAT_EMPLOYER_PENALTY);
            scored.biased_flag = Some(true);
        } else if let Some(company) = company {
            seen.insert(company);
        }

        output.push(scored);
    }

    sort_by_score_desc(&mut output);
    output
}

/// Lower-cased, trimmed company name. Blank names are never "seen".
fn normalize_company(company: &str) -> Option<String> {
    let normalized = company.trim().to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::types::{CandidateProfile, ScoreMethod};

    fn scored(name: &str, company: &str, score: u8) -> ScoredCandidate {
        ScoredCandidate::new(
            CandidateProfile {
                first_name: name.to_string(),
                current_company: company.to_string(),
                ..Default::default()
            },
            score,
            ScoreMethod::Keyword,
        )
    }

    fn scores(ranked: &[ScoredCandidate]) -> Vec<u8> {
        ranked.iter().map(|s| s.match_score).collect()
    }

    #[test]
    fn test_single_company_penalises_after_five() {
        let input: Vec<ScoredCandidate> = [90, 85, 80, 75, 70, 65, 60]
            .iter()
            .enumerate()
            .map(|(i, &s)| scored(&format!("c{i}"), "Acme", s))
            .collect();

        let output = diversify(input);

        assert_eq!(scores(&output), vec![90, 85, 80, 75, 70, 60, 55]);
        assert!(output[..5].iter().all(|s| s.biased_flag.is_none()));
        assert_eq!(output[5].candidate.first_name, "c5");
        assert_eq!(output[5].biased_flag, Some(true));
        assert_eq!(output[6].candidate.first_name, "c6");
        assert_eq!(output[6].biased_flag, Some(true));
    }

    #[test]
    fn test_penalty_lets_new_company_overtake() {
        let mut input: Vec<ScoredCandidate> = (0..5)
            .map(|i| scored(&format!("acme{i}"), "Acme", 90 - i as u8))
            .collect();
        input.push(scored("acme5", "Acme", 68));
        input.push(scored("globex", "Globex", 66));

        let output = diversify(input);
        let names: Vec<&str> = output.iter().map(|s| s.candidate.first_name.as_str()).collect();

        assert_eq!(names[5], "globex");
        assert_eq!(output[5].match_score, 66);
        assert_eq!(names[6], "acme5");
        assert_eq!(output[6].match_score, 63);
    }

    #[test]
    fn test_unique_companies_never_penalised() {
        let input: Vec<ScoredCandidate> = (0..8)
            .map(|i| scored(&format!("c{i}"), &format!("Company {i}"), 80 - i as u8))
            .collect();
        let output = diversify(input);
        assert!(output.iter().all(|s| s.biased_flag.is_none()));
        assert_eq!(scores(&output), (0..8).map(|i| 80 - i as u8).collect::<Vec<_>>());
    }

    #[test]
    fn test_company_names_normalised() {
        let mut input: Vec<ScoredCandidate> = (0..5)
            .map(|i| scored(&format!("c{i}"), &format!("Co{i}"), 90 - i as u8))
            .collect();
        input.push(scored("first", "  Acme ", 70));
        input.push(scored("repeat", "ACME", 69));

        let output = diversify(input);
        let repeat = output.iter().find(|s| s.candidate.first_name == "repeat").unwrap();
        assert_eq!(repeat.match_score, 64);
        assert_eq!(repeat.biased_flag, Some(true));
    }

    #[test]
    fn test_blank_company_never_counted() {
        let input: Vec<ScoredCandidate> = (0..8).map(|i| scored(&format!("c{i}"), "  ", 50)).collect();
        let output = diversify(input);
        assert!(output.iter().all(|s| s.biased_flag.is_none() && s.match_score == 50));
    }

    #[test]
    fn test_penalty_saturates_at_zero() {
        let mut input: Vec<ScoredCandidate> = (0..5).map(|i| scored(&format!("c{i}"), "Acme", 10)).collect();
        input.push(scored("low", "Acme", 3));
        let output = diversify(input);
        let low = output.iter().find(|s| s.candidate.first_name == "low").unwrap();
        assert_eq!(low.match_score, 0);
    }

    #[test]
    fn test_ties_after_penalty_stay_stable() {
        let mut input: Vec<ScoredCandidate> = (0..5).map(|i| scored(&format!("a{i}"), "Acme", 90)).collect();
        input.push(scored("acme-late", "Acme", 70));
        input.push(scored("globex", "Globex", 65));

        let output = diversify(input);
        // acme-late drops to 65 and ties with globex; input order is preserved
        assert_eq!(output[5].candidate.first_name, "acme-late");
        assert_eq!(output[6].candidate.first_name, "globex");
    }

    #[test]
    fn test_length_preserved_and_empty_input() {
        assert!(diversify(Vec::new()).is_empty());
        let input = vec![scored("a", "Acme", 40), scored("b", "Acme", 30)];
        assert_eq!(diversify(input).len(), 2);
    }
}
