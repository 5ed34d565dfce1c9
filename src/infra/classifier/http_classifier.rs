use crate::core::moderation::{Classifier, ClassifierError, ClassifierRequest, ClassifierResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Client for a moderation endpoint that speaks `{text}` -> `{flagged, reason?}`.
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifierResponse, ClassifierError> {
        let payload = ClassifierRequest {
            text: text.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClassifierError::Status(response.status().as_u16()));
        }

        response
            .json::<ClassifierResponse>()
            .await
            .map_err(|e| ClassifierError::Malformed(e.to_string()))
    }
}
