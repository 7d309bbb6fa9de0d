// Candidate-to-job matching: validity checks, vector and keyword scoring,
// ranking, diversity re-ranking and best-effort LLM enrichment.
// The deterministic path (validator → similarity/keyword → ranking → diversity)
// performs no I/O; only deep_match and pipeline's embedding fill touch the network.

pub mod deep_match;
pub mod diversity;
pub mod handlers;
pub mod keyword;
pub mod pipeline;
pub mod prompts;
pub mod ranking;
pub mod similarity;
pub mod types;
pub mod validator;
