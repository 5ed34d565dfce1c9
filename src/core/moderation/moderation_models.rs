// Moderation domain models - verdicts, rejection reasons and configuration.
//
// These are pure domain types. The HTTP layer converts rejections to 400s,
// the classifier clients produce `ClassifierResponse`s.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::core::confessions::MAX_CONFESSION_CHARS;

/// Terms rejected by the local filter unless overridden by configuration.
pub const DEFAULT_BANNED_TERMS: &[&str] = &["nigger", "faggot", "kike", "spic", "tranny"];

/// Reason given when the classifier could not be reached.
pub const CLASSIFIER_UNAVAILABLE_REASON: &str =
    "Moderation is temporarily unavailable, so your post could not be checked";

/// Why a piece of text was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// The lexical filter matched a banned term.
    BannedTerm { term: String },
    /// The external classifier flagged the text.
    Flagged { reason: Option<String> },
    /// The external classifier failed or timed out. Treated as flagged.
    ClassifierUnavailable,
}

impl RejectionReason {
    /// Stable, machine-checkable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::BannedTerm { .. } => "banned_language",
            RejectionReason::Flagged { .. } => "content_flagged",
            RejectionReason::ClassifierUnavailable => "moderation_unavailable",
        }
    }
}

// The banned term itself is never echoed back to the client.
impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::BannedTerm { .. } => {
                write!(f, "Your post contains banned language")
            }
            RejectionReason::Flagged { reason: Some(r) } => {
                write!(f, "Your post was flagged by moderation: {}", r)
            }
            RejectionReason::Flagged { reason: None } => {
                write!(f, "Your post was flagged by moderation")
            }
            RejectionReason::ClassifierUnavailable => write!(f, "{}", CLASSIFIER_UNAVAILABLE_REASON),
        }
    }
}

/// Final decision of the moderation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// Text may be stored. Carries the trimmed text.
    Admit(String),
    /// Text must not be stored.
    Reject(RejectionReason),
}

/// Result of the lexical filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterResult {
    Pass,
    Reject { term: String },
}

/// What the moderation gateway concluded from the external classifier.
///
/// `Unavailable` is kept distinct so logs show outages, even though the
/// pipeline turns it into a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayVerdict {
    Approved,
    Rejected { reason: Option<String> },
    Unavailable { cause: String },
}

/// Wire format of the external classifier's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierResponse {
    pub flagged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Wire format of the request sent to the external classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierRequest {
    pub text: String,
}

/// Configuration for the moderation pipeline.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Lower-cased terms matched as substrings.
    pub banned_terms: Vec<String>,
    /// Upper bound on a single classifier call.
    pub classifier_timeout: Duration,
    /// Maximum text length in characters, after trimming.
    pub max_chars: usize,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            banned_terms: DEFAULT_BANNED_TERMS.iter().map(|t| t.to_string()).collect(),
            classifier_timeout: Duration::from_secs(5),
            max_chars: MAX_CONFESSION_CHARS,
        }
    }
}
