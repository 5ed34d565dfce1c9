// Storage ports for confessions and comments.
//
// The core defines WHAT it needs from persistence; `infra::storage` provides
// the in-memory and SQLite implementations. Records live under namespaced
// keys so any key-value backend can enumerate them by prefix.

use super::confession_models::{Comment, Confession};
use crate::core::identity::{AnonymousId, IdentityError};
use crate::core::moderation::{ModerationError, RejectionReason};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfessionError {
    /// Empty or oversized content, or a bad identifier.
    #[error("{0}")]
    Validation(String),

    /// Moderation refused the content. Never retried automatically.
    #[error("{0}")]
    Rejected(RejectionReason),

    #[error("Confession not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ConfessionError {
    /// Stable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ConfessionError::Validation(_) => "validation",
            ConfessionError::Rejected(reason) => reason.code(),
            ConfessionError::NotFound(_) => "not_found",
            ConfessionError::StorageError(_) => "storage",
        }
    }
}

impl From<ModerationError> for ConfessionError {
    fn from(err: ModerationError) -> Self {
        ConfessionError::Validation(err.to_string())
    }
}

impl From<IdentityError> for ConfessionError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Invalid(msg) => ConfessionError::Validation(msg),
            IdentityError::StorageError(msg) => ConfessionError::StorageError(msg),
        }
    }
}

// ============================================================================
// KEY LAYOUT
// ============================================================================

pub const CONFESSION_PREFIX: &str = "confession:";
pub const COMMENT_PREFIX: &str = "comment:";

pub fn confession_key(id: &str) -> String {
    format!("{}{}", CONFESSION_PREFIX, id)
}

/// Prefix shared by every comment of one confession.
pub fn comment_prefix(confession_id: &str) -> String {
    format!("{}{}:", COMMENT_PREFIX, confession_id)
}

pub fn comment_key(confession_id: &str, comment_id: &str) -> String {
    format!("{}{}", comment_prefix(confession_id), comment_id)
}

// ============================================================================
// STORAGE TRAITS (PORTS)
// ============================================================================

/// Persistence for confession records.
///
/// The store does no moderation; it trusts its callers.
#[async_trait]
pub trait ConfessionStore: Send + Sync {
    /// Persist a brand new record with `content`.
    async fn create(&self, content: &str) -> Result<Confession, ConfessionError>;

    /// All confessions, most recent first. A snapshot: records are never
    /// observed half-written.
    async fn list(&self) -> Result<Vec<Confession>, ConfessionError>;

    /// Look up one confession.
    async fn get(&self, id: &str) -> Result<Option<Confession>, ConfessionError>;

    /// Atomically flip `identity`'s like on confession `id`.
    ///
    /// The read-modify-write is serialized per id: two concurrent calls from
    /// the same identity cancel out, calls from different identities both land.
    async fn toggle_like(
        &self,
        id: &str,
        identity: &AnonymousId,
    ) -> Result<Confession, ConfessionError>;
}

/// Persistence for comments.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Store a comment and bump the parent's `comment_count` as one unit.
    /// Fails with `NotFound` (touching nothing) if the parent is missing.
    async fn append(&self, confession_id: &str, content: &str)
        -> Result<Comment, ConfessionError>;

    /// Comments of one confession, newest first.
    async fn list_for(&self, confession_id: &str) -> Result<Vec<Comment>, ConfessionError>;
}

/// Sort helper shared by the backends.
pub(crate) fn newest_first_confessions(mut confessions: Vec<Confession>) -> Vec<Confession> {
    confessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    confessions
}

pub(crate) fn newest_first_comments(mut comments: Vec<Comment>) -> Vec<Comment> {
    comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    comments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(confession_key("abc"), "confession:abc");
        assert_eq!(comment_key("abc", "xyz"), "comment:abc:xyz");
        assert!(comment_key("abc", "xyz").starts_with(&comment_prefix("abc")));
        assert!(!comment_key("abcd", "xyz").starts_with(&comment_prefix("abc")));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ConfessionError::Rejected(RejectionReason::ClassifierUnavailable).code(),
            "moderation_unavailable"
        );
        assert_eq!(ConfessionError::from(ModerationError::Empty).code(), "validation");
    }
}
