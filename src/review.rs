//! Review prompt composition and structured-field extraction.
//!
//! The model is instructed to close its answer with two literal lines
//! (`Quality Score: ...` and `Security Risk Level: ...`). Extraction is
//! deliberately forgiving: a malformed or missing line falls back to a
//! neutral default rather than failing the request.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Persona used when the caller does not supply a custom prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a senior software engineer performing a strict code review.";

/// Instruction block appended to every system prompt, custom or not. The two
/// closing lines are what [`ReviewAnalysis::parse`] scans for.
const STRUCTURED_REPLY_INSTRUCTIONS: &str = "Review the following diff. Return your response in Markdown.\n\
At the very end of your review, you MUST include the following two lines exactly:\n\
Quality Score: [Number between 1 and 10]\n\
Security Risk Level: [Low, Medium, or High]";

/// Score used when no `Quality Score:` line is found.
pub const DEFAULT_QUALITY_SCORE: i32 = 5;

static SCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Quality Score:\s*(\d+)").expect("valid regex"));
static RISK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Security Risk Level:\s*(Low|Medium|High)").expect("valid regex"));

/// Build the system message for a review: the caller's custom prompt (or the
/// default persona) followed by the fixed instruction block. An empty or
/// whitespace-only custom prompt counts as absent.
pub fn compose_system_prompt(custom_prompt: Option<&str>) -> String {
    let persona = custom_prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    format!("{persona}\n\n{STRUCTURED_REPLY_INSTRUCTIONS}")
}

/// Build the user message carrying the diff under review.
pub fn compose_user_message(diff: &str) -> String {
    format!("Review the following diff:\n\n{diff}")
}

/// Security risk classification extracted from a review answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SecurityRisk {
    #[default]
    Low,
    Medium,
    High,
}

impl SecurityRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityRisk::Low => "LOW",
            SecurityRisk::Medium => "MEDIUM",
            SecurityRisk::High => "HIGH",
        }
    }
}

impl fmt::Display for SecurityRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured fields pulled out of a model answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewAnalysis {
    pub quality_score: i32,
    pub security_risk: SecurityRisk,
}

impl ReviewAnalysis {
    /// Scan an answer for the two structured lines, case-insensitively.
    ///
    /// The first integer after `Quality Score:` and the first of
    /// Low/Medium/High after `Security Risk Level:` win; anything missing or
    /// unparseable falls back to score 5 / LOW. The score is stored as
    /// reported, without range validation.
    pub fn parse(answer: &str) -> Self {
        let quality_score = SCORE_RE
            .captures(answer)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(DEFAULT_QUALITY_SCORE);

        let security_risk = RISK_RE
            .captures(answer)
            .and_then(|c| c.get(1))
            .map(|m| match m.as_str().to_ascii_lowercase().as_str() {
                "high" => SecurityRisk::High,
                "medium" => SecurityRisk::Medium,
                _ => SecurityRisk::Low,
            })
            .unwrap_or_default();

        Self {
            quality_score,
            security_risk,
        }
    }
}

/// Pull the assistant's answer text out of a chat-completion response body.
pub fn answer_content(response: &serde_json::Value) -> Option<&str> {
    response.get("choices")?.get(0)?.get("message")?.get("content")?.as_str()
}
