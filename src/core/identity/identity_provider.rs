// Anonymous identity - the only notion of "who" this system has.
//
// An identity is a random opaque string a client keeps for itself. It exists
// purely so a like can be toggled off again; nothing else is keyed by it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Longest identifier accepted from a client.
pub const MAX_IDENTITY_CHARS: usize = 128;

/// An opaque anonymous identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnonymousId(String);

impl AnonymousId {
    /// Generate a new random identifier (UUID v4, OS randomness).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validate an identifier supplied by a client.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Invalid("userId is required".to_string()));
        }
        if trimmed.chars().count() > MAX_IDENTITY_CHARS {
            return Err(IdentityError::Invalid(format!(
                "userId exceeds maximum length of {} characters",
                MAX_IDENTITY_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AnonymousId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AnonymousId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for AnonymousId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid identity: {0}")]
    Invalid(String),

    #[error("Identity storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// PROVIDER TRAIT (PORT)
// ============================================================================

/// Source of the caller's anonymous identity.
///
/// Implementations never fail: when persistence is unavailable they hand out
/// an identity that only lives as long as the provider, which makes like
/// de-duplication best-effort for that client.
pub trait IdentityProvider: Send + Sync {
    fn get_or_create_identity(&self) -> AnonymousId;
}

/// A provider that always returns the identity it was built with.
///
/// The HTTP layer wraps the request's `userId` in one of these; tests use it
/// as a fake.
#[derive(Debug, Clone)]
pub struct FixedIdentity(AnonymousId);

impl FixedIdentity {
    pub fn new(id: impl Into<AnonymousId>) -> Self {
        Self(id.into())
    }
}

impl IdentityProvider for FixedIdentity {
    fn get_or_create_identity(&self) -> AnonymousId {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(AnonymousId::generate(), AnonymousId::generate());
    }

    #[test]
    fn test_parse_trims_and_validates() {
        assert_eq!(AnonymousId::parse("  abc ").unwrap().as_str(), "abc");
        assert!(AnonymousId::parse("   ").is_err());
        assert!(AnonymousId::parse(&"x".repeat(MAX_IDENTITY_CHARS + 1)).is_err());
    }

    #[test]
    fn test_fixed_identity_is_stable() {
        let provider = FixedIdentity::new("userA");
        assert_eq!(
            provider.get_or_create_identity(),
            provider.get_or_create_identity()
        );
    }
}
