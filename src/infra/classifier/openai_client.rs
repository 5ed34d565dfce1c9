use crate::core::moderation::{Classifier, ClassifierError, ClassifierResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Talks to the OpenAI moderation API directly.
pub struct OpenAiModerationClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiModerationClient {
    pub fn new(
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }

    /// Point the client somewhere other than api.openai.com.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Names of the categories the API marked as hit, in a stable order.
    fn flagged_categories(result: &ApiModerationResult) -> Option<String> {
        let hits: Vec<&str> = result
            .categories
            .iter()
            .filter(|(_, hit)| **hit)
            .map(|(name, _)| name.as_str())
            .collect();
        if hits.is_empty() {
            None
        } else {
            Some(hits.join(", "))
        }
    }
}

#[async_trait]
impl Classifier for OpenAiModerationClient {
    async fn classify(&self, text: &str) -> Result<ClassifierResponse, ClassifierError> {
        let url = format!("{}/moderations", self.base_url);

        let payload = json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClassifierError::Status(response.status().as_u16()));
        }

        let body: ApiModerationResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;

        // An empty result list is not a verdict.
        let result = body
            .results
            .first()
            .ok_or_else(|| ClassifierError::Malformed("no moderation results".to_string()))?;

        Ok(ClassifierResponse {
            flagged: result.flagged,
            reason: if result.flagged {
                Self::flagged_categories(result)
            } else {
                None
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiModerationResponse {
    results: Vec<ApiModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ApiModerationResult {
    flagged: bool,
    #[serde(default)]
    categories: BTreeMap<String, bool>,
}
