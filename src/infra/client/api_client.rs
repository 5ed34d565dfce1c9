use crate::core::confessions::{Comment, Confession, ConfessionSort};
use crate::core::identity::IdentityProvider;
use crate::core::moderation::{FilterResult, LexicalFilter};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Your confession contains banned language.")]
    BannedLanguage,

    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with `success: false`.
    #[error("{message} (HTTP {status})")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    Malformed(String),
}

/// Response envelope used by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
    code: Option<String>,
}

/// HTTP client for the confessions API.
pub struct ConfessionsApiClient {
    client: Client,
    base_url: String,
    filter: LexicalFilter,
}

impl ConfessionsApiClient {
    pub fn new(base_url: impl Into<String>, filter: LexicalFilter) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            filter,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            // Proxies and routing errors answer without the envelope.
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    code: None,
                    message: format!("HTTP error! status: {}", status.as_u16()),
                })
            }
            Err(e) => return Err(ClientError::Malformed(e.to_string())),
        };

        if !status.is_success() || !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                code: envelope.code,
                message: envelope
                    .error
                    .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16())),
            });
        }

        envelope
            .data
            .ok_or_else(|| ClientError::Malformed("response has no data".to_string()))
    }

    pub async fn list(&self, sort: ConfessionSort) -> Result<Vec<Confession>, ClientError> {
        self.request(Method::GET, &format!("/confessions?sort={}", sort), None)
            .await
    }

    /// Submit a confession. Banned language is refused here, before any
    /// request is made; the server re-checks everything anyway.
    pub async fn submit(&self, content: &str) -> Result<Confession, ClientError> {
        if let FilterResult::Reject { .. } = self.filter.check(content) {
            return Err(ClientError::BannedLanguage);
        }
        self.request(
            Method::POST,
            "/confessions",
            Some(json!({ "content": content })),
        )
        .await
    }

    pub async fn toggle_like(
        &self,
        id: &str,
        identity: &dyn IdentityProvider,
    ) -> Result<Confession, ClientError> {
        let user_id = identity.get_or_create_identity();
        self.request(
            Method::POST,
            &format!("/confessions/{}/like", id),
            Some(json!({ "userId": user_id })),
        )
        .await
    }

    pub async fn add_comment(&self, id: &str, content: &str) -> Result<Comment, ClientError> {
        self.request(
            Method::POST,
            &format!("/confessions/{}/comments", id),
            Some(json!({ "content": content })),
        )
        .await
    }

    pub async fn list_comments(&self, id: &str) -> Result<Vec<Comment>, ClientError> {
        self.request(Method::GET, &format!("/confessions/{}/comments", id), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::confessions::ConfessionService;
    use crate::core::identity::FixedIdentity;
    use crate::core::moderation::{
        Classifier, ClassifierError, ClassifierResponse, ModerationConfig, ModerationPipeline,
        DEFAULT_BANNED_TERMS,
    };
    use crate::http::router;
    use crate::infra::storage::InMemoryConfessionStore;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    struct PassClassifier;

    #[async_trait]
    impl Classifier for PassClassifier {
        async fn classify(&self, text: &str) -> Result<ClassifierResponse, ClassifierError> {
            Ok(ClassifierResponse {
                flagged: text.contains("threat"),
                reason: None,
            })
        }
    }

    async fn spawn_api() -> ConfessionsApiClient {
        let pipeline = ModerationPipeline::new(ModerationConfig::default(), PassClassifier);
        let service = ConfessionService::new(InMemoryConfessionStore::new(), pipeline);
        let app = router(Arc::new(service));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        ConfessionsApiClient::new(
            format!("http://{}/", addr),
            LexicalFilter::new(DEFAULT_BANNED_TERMS),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_full_flow_against_router() {
        let client = spawn_api().await;

        let posted = client.submit("hello world").await.unwrap();
        assert_eq!(posted.content, "hello world");

        let listed = client.list(ConfessionSort::Recent).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, posted.id);

        let me = FixedIdentity::new("client-a");
        let liked = client.toggle_like(&posted.id, &me).await.unwrap();
        assert_eq!(liked.likes, 1);
        let unliked = client.toggle_like(&posted.id, &me).await.unwrap();
        assert_eq!(unliked.likes, 0);

        let comment = client.add_comment(&posted.id, "me too").await.unwrap();
        assert_eq!(comment.confession_id, posted.id);
        let comments = client.list_comments(&posted.id).await.unwrap();
        assert_eq!(comments, vec![comment]);
    }

    #[tokio::test]
    async fn test_server_rejection_surfaces_code() {
        let client = spawn_api().await;

        let err = client.submit("this is a threat").await.unwrap_err();
        match err {
            ClientError::Api { status, code, .. } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("content_flagged"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Listing comments of an unknown confession is an empty list.
        let comments = client.list_comments("missing").await.unwrap();
        assert!(comments.is_empty());

        let err = client
            .toggle_like("missing", &FixedIdentity::new("client-a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_non_envelope_error_keeps_status() {
        let app = axum::Router::new().route(
            "/confessions",
            axum::routing::get(|| async {
                (axum::http::StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>")
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let client = ConfessionsApiClient::new(
            format!("http://{}", addr),
            LexicalFilter::new(DEFAULT_BANNED_TERMS),
        )
        .unwrap();

        let err = client.list(ConfessionSort::Recent).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 502, code: None, .. }));

        // Unrouted paths get axum's empty 404, not a parse error.
        let err = client.list_comments("x").await;
        assert!(matches!(err, Err(ClientError::Api { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_banned_language_blocked_before_request() {
        // Nothing listens on port 1; reaching the network would be a Transport error.
        let client = ConfessionsApiClient::new(
            "http://127.0.0.1:1",
            LexicalFilter::new(DEFAULT_BANNED_TERMS),
        )
        .unwrap();

        let err = client.submit("you FAGGOT").await.unwrap_err();
        assert!(matches!(err, ClientError::BannedLanguage));
    }
}
