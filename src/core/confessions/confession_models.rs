// Confession domain models - the records the stores persist and the API returns.
//
// These are pure domain types with no HTTP or database dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::identity::AnonymousId;

/// Maximum confession length, counted in characters after trimming.
pub const MAX_CONFESSION_CHARS: usize = 1000;

/// Maximum comment length, counted in characters after trimming.
pub const MAX_COMMENT_CHARS: usize = 500;

/// An anonymous confession.
///
/// `likes` always equals `liked_by.len()`. Only the store's like-toggle
/// touches either field, and it re-derives the counter from the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confession {
    pub id: String,
    pub content: String,
    pub likes: u64,
    /// Older records call this field `comments`.
    #[serde(alias = "comments", default)]
    pub comment_count: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub liked_by: BTreeSet<AnonymousId>,
}

impl Confession {
    /// Build a fresh record for content that already passed moderation.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            likes: 0,
            comment_count: 0,
            timestamp: Utc::now(),
            liked_by: BTreeSet::new(),
        }
    }

    /// Flip `identity`'s membership in `liked_by`. Returns true if the
    /// identity now likes this confession.
    pub fn toggle_like(&mut self, identity: &AnonymousId) -> bool {
        let liked = if self.liked_by.remove(identity) {
            false
        } else {
            self.liked_by.insert(identity.clone());
            true
        };
        self.likes = self.liked_by.len() as u64;
        liked
    }

    /// Score used by the trending sort.
    pub fn trending_score(&self) -> u64 {
        self.likes.saturating_add(self.comment_count.saturating_mul(2))
    }
}

/// A comment attached to a confession.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub confession_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    pub fn new(confession_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            confession_id: confession_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// How a confession listing should be ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfessionSort {
    /// Most recent first (the stored order).
    #[default]
    Recent,
    /// Most likes first.
    Popular,
    /// Highest `likes + 2 * comments` first.
    Trending,
}

impl ConfessionSort {
    /// Reorder `confessions` in place. Expects recency order on input so
    /// ties stay most-recent-first.
    pub fn apply(self, confessions: &mut [Confession]) {
        match self {
            ConfessionSort::Recent => confessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            ConfessionSort::Popular => confessions.sort_by(|a, b| b.likes.cmp(&a.likes)),
            ConfessionSort::Trending => {
                confessions.sort_by_key(|c| std::cmp::Reverse(c.trending_score()))
            }
        }
    }
}

impl fmt::Display for ConfessionSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfessionSort::Recent => write!(f, "recent"),
            ConfessionSort::Popular => write!(f, "popular"),
            ConfessionSort::Trending => write!(f, "trending"),
        }
    }
}

impl FromStr for ConfessionSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recent" => Ok(ConfessionSort::Recent),
            "popular" => Ok(ConfessionSort::Popular),
            "trending" => Ok(ConfessionSort::Trending),
            other => Err(format!("Unknown sort '{}'", other)),
        }
    }
}
