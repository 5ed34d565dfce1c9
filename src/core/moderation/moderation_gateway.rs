// Moderation gateway - asks the external classifier and interprets its answer.
//
// The one policy that matters here: if the classifier cannot give an answer
// (network error, timeout, bad status, malformed body) the text is treated as
// flagged. An outage must never look like a "safe" verdict.

use super::moderation_models::{ClassifierResponse, GatewayVerdict};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier request failed: {0}")]
    Transport(String),

    #[error("Classifier returned status {0}")]
    Status(u16),

    #[error("Classifier returned a malformed response: {0}")]
    Malformed(String),

    #[error("Classifier timed out after {0:?}")]
    Timeout(Duration),
}

// ============================================================================
// CLASSIFIER TRAIT (PORT)
// ============================================================================

/// An external semantic classifier reached over the network.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassifierResponse, ClassifierError>;
}

// Lets the composition root pick a classifier at runtime.
#[async_trait]
impl Classifier for Box<dyn Classifier> {
    async fn classify(&self, text: &str) -> Result<ClassifierResponse, ClassifierError> {
        (**self).classify(text).await
    }
}

// ============================================================================
// GATEWAY
// ============================================================================

pub struct ModerationGateway<C: Classifier> {
    classifier: C,
    timeout: Duration,
}

impl<C: Classifier> ModerationGateway<C> {
    pub fn new(classifier: C, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    /// Classify `text`, never waiting longer than the configured timeout.
    pub async fn classify(&self, text: &str) -> GatewayVerdict {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.classifier.classify(text)).await
        {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout(self.timeout)),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(ClassifierResponse {
                flagged: false, ..
            }) => {
                tracing::debug!(elapsed_ms, verdict = "approved", "Classifier approved text");
                GatewayVerdict::Approved
            }
            Ok(ClassifierResponse {
                flagged: true,
                reason,
            }) => {
                tracing::info!(
                    elapsed_ms,
                    verdict = "rejected",
                    reason = ?reason,
                    "Classifier flagged text"
                );
                GatewayVerdict::Rejected { reason }
            }
            Err(err) => {
                tracing::warn!(
                    elapsed_ms,
                    verdict = "unavailable",
                    error = %err,
                    "Classifier unavailable, failing closed"
                );
                GatewayVerdict::Unavailable {
                    cause: err.to_string(),
                }
            }
        }
    }
}
