// Classifier implementations - HTTP clients for external moderation services.

pub mod http_classifier;
pub mod openai_client;

pub use http_classifier::HttpClassifier;
pub use openai_client::OpenAiModerationClient;
