// Server configuration, read from the environment (and `.env` via dotenv).

use crate::core::moderation::{Classifier, ModerationConfig, DEFAULT_BANNED_TERMS};
use crate::infra::classifier::{HttpClassifier, OpenAiModerationClient};
use anyhow::{anyhow, bail, Context};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_DATABASE_URL: &str = "data/confessions.db";
const DEFAULT_OPENAI_MODEL: &str = "omni-moderation-latest";
const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("Unknown STORAGE_BACKEND '{}' (expected sqlite or memory)", other)),
        }
    }
}

/// Where moderation verdicts come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierSource {
    /// Generic `{text}` -> `{flagged, reason?}` endpoint.
    Endpoint(String),
    /// The OpenAI moderation API.
    OpenAi { api_key: String, model: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageBackend,
    pub database_url: String,
    pub classifier: ClassifierSource,
    pub moderation: ModerationConfig,
    pub moderate_comments: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a valid socket address")?;

        let storage = match var("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Sqlite,
        };

        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let classifier = match (var("MODERATION_ENDPOINT"), var("OPENAI_API_KEY")) {
            (Some(endpoint), _) => ClassifierSource::Endpoint(endpoint),
            (None, Some(api_key)) => ClassifierSource::OpenAi {
                api_key,
                model: var("OPENAI_MODERATION_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            },
            (None, None) => bail!(
                "No moderation classifier configured: set MODERATION_ENDPOINT or OPENAI_API_KEY"
            ),
        };

        let timeout_ms = match var("MODERATION_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("MODERATION_TIMEOUT_MS must be a whole number of milliseconds")?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let banned_terms = match var("BANNED_TERMS") {
            Some(raw) => raw
                .split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            None => DEFAULT_BANNED_TERMS.iter().map(|t| t.to_string()).collect(),
        };

        let moderate_comments = match var("MODERATE_COMMENTS") {
            Some(raw) => raw
                .trim()
                .parse::<bool>()
                .context("MODERATE_COMMENTS must be true or false")?,
            None => true,
        };

        Ok(Self {
            bind_addr,
            storage,
            database_url,
            classifier,
            moderation: ModerationConfig {
                banned_terms,
                classifier_timeout: Duration::from_millis(timeout_ms),
                ..ModerationConfig::default()
            },
            moderate_comments,
        })
    }

    /// Construct the configured classifier.
    pub fn build_classifier(&self) -> anyhow::Result<Box<dyn Classifier>> {
        let timeout = self.moderation.classifier_timeout;
        let classifier: Box<dyn Classifier> = match &self.classifier {
            ClassifierSource::Endpoint(endpoint) => {
                tracing::info!(%endpoint, "Using HTTP moderation classifier");
                Box::new(HttpClassifier::new(endpoint.clone(), timeout)?)
            }
            ClassifierSource::OpenAi { api_key, model } => {
                tracing::info!(%model, "Using OpenAI moderation classifier");
                Box::new(OpenAiModerationClient::new(
                    api_key.clone(),
                    model.clone(),
                    timeout,
                )?)
            }
        };
        Ok(classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_endpoint() {
        let cfg = config(&[("MODERATION_ENDPOINT", "http://localhost:9000/classify")]).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.storage, StorageBackend::Sqlite);
        assert_eq!(cfg.database_url, "data/confessions.db");
        assert_eq!(cfg.moderation.classifier_timeout, Duration::from_millis(5000));
        assert_eq!(cfg.moderation.banned_terms.len(), DEFAULT_BANNED_TERMS.len());
        assert!(cfg.moderate_comments);
        assert_eq!(
            cfg.classifier,
            ClassifierSource::Endpoint("http://localhost:9000/classify".to_string())
        );
    }

    #[test]
    fn test_missing_classifier_fails() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("MODERATION_ENDPOINT"));

        // Blank counts as unset.
        assert!(config(&[("OPENAI_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn test_endpoint_wins_over_openai() {
        let cfg = config(&[
            ("MODERATION_ENDPOINT", "http://mod"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert!(matches!(cfg.classifier, ClassifierSource::Endpoint(_)));

        let cfg = config(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(
            cfg.classifier,
            ClassifierSource::OpenAi {
                api_key: "sk-test".to_string(),
                model: "omni-moderation-latest".to_string(),
            }
        );
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("MODERATION_ENDPOINT", "http://mod"),
            ("BIND_ADDR", "0.0.0.0:3000"),
            ("STORAGE_BACKEND", "Memory"),
            ("MODERATION_TIMEOUT_MS", "250"),
            ("BANNED_TERMS", " Foo, ,bar "),
            ("MODERATE_COMMENTS", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.storage, StorageBackend::Memory);
        assert_eq!(cfg.moderation.classifier_timeout, Duration::from_millis(250));
        assert_eq!(cfg.moderation.banned_terms, vec!["foo", "bar"]);
        assert!(!cfg.moderate_comments);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let base = ("MODERATION_ENDPOINT", "http://mod");
        assert!(config(&[base, ("STORAGE_BACKEND", "postgres")]).is_err());
        assert!(config(&[base, ("MODERATION_TIMEOUT_MS", "soon")]).is_err());
        assert!(config(&[base, ("BIND_ADDR", "not-an-addr")]).is_err());
        assert!(config(&[base, ("MODERATE_COMMENTS", "maybe")]).is_err());
    }

    #[test]
    fn test_build_classifier() {
        let cfg = config(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert!(cfg.build_classifier().is_ok());
    }
}
