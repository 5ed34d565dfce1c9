// Moderation pipeline - decides whether submitted text may be stored.
//
// Order is fixed: trim, length check, lexical filter, classifier. Each step
// short-circuits, so local checks always run before (and instead of) the
// network call.

use super::lexical_filter::LexicalFilter;
use super::moderation_gateway::{Classifier, ModerationGateway};
use super::moderation_models::{
    FilterResult, GatewayVerdict, ModerationConfig, ModerationOutcome, RejectionReason,
};
use thiserror::Error;

/// Text that fails validation before any moderation runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModerationError {
    #[error("Content is required")]
    Empty,

    #[error("Content exceeds maximum length of {0} characters")]
    TooLong(usize),
}

pub struct ModerationPipeline<C: Classifier> {
    filter: LexicalFilter,
    gateway: ModerationGateway<C>,
    max_chars: usize,
}

impl<C: Classifier> ModerationPipeline<C> {
    pub fn new(config: ModerationConfig, classifier: C) -> Self {
        Self {
            filter: LexicalFilter::new(&config.banned_terms),
            gateway: ModerationGateway::new(classifier, config.classifier_timeout),
            max_chars: config.max_chars,
        }
    }

    /// The local filter, for callers that only need the lexical check.
    pub fn filter(&self) -> &LexicalFilter {
        &self.filter
    }

    /// Run the full pipeline over `text`.
    ///
    /// Validation failures come back as `Err`; moderation decisions as `Ok`.
    pub async fn evaluate(&self, text: &str) -> Result<ModerationOutcome, ModerationError> {
        let trimmed = validate_length(text, self.max_chars)?;

        if let FilterResult::Reject { term } = self.filter.check(trimmed) {
            tracing::info!(stage = "lexical", "Rejected text containing a banned term");
            tracing::debug!(term = %term, "Banned term matched");
            return Ok(ModerationOutcome::Reject(RejectionReason::BannedTerm {
                term,
            }));
        }

        let outcome = match self.gateway.classify(trimmed).await {
            GatewayVerdict::Approved => ModerationOutcome::Admit(trimmed.to_string()),
            GatewayVerdict::Rejected { reason } => {
                ModerationOutcome::Reject(RejectionReason::Flagged { reason })
            }
            GatewayVerdict::Unavailable { cause } => {
                tracing::warn!(stage = "classifier", cause = %cause, "Rejecting unclassified text");
                ModerationOutcome::Reject(RejectionReason::ClassifierUnavailable)
            }
        };
        Ok(outcome)
    }
}

/// Trim `text` and check it is between 1 and `max_chars` characters.
pub fn validate_length(text: &str, max_chars: usize) -> Result<&str, ModerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ModerationError::Empty);
    }
    if trimmed.chars().count() > max_chars {
        return Err(ModerationError::TooLong(max_chars));
    }
    Ok(trimmed)
}
