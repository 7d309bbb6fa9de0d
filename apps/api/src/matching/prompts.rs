// Prompt constants for the qualitative deep-match review.
// Reuses the JSON-only fragment from llm_client::prompts.

/// System prompt for deep matching. Combined with `JSON_ONLY_SYSTEM` at call time.
pub const DEEP_MATCH_SYSTEM: &str = "You are a critical technical recruiter. \
    You judge how well one candidate fits one job opening and you do not inflate scores.";

/// Deep-match prompt template. Replace `{job_title}`, `{job_description}` and
/// `{candidate_profile}` before sending.
pub const DEEP_MATCH_PROMPT_TEMPLATE: &str = r#"Score how well this candidate fits the job.

JOB TITLE: {job_title}

JOB DESCRIPTION:
{job_description}

CANDIDATE:
{candidate_profile}

Scoring rules:
- 0-30: the candidate's skill set is unrelated to the role
- 31-69: partial overlap, transferable skills, or missing key requirements
- 70-100: strong, direct alignment with the core requirements
Be critical. Title similarity alone is not alignment.

Return exactly one JSON object with this schema:
{"score": 0, "reasoning": "one or two sentences"}"#;
