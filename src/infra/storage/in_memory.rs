// In-memory implementation of ConfessionStore and CommentStore.
//
// Used for tests and for `STORAGE_BACKEND=memory`. Everything is gone when
// the process exits.

use crate::core::confessions::confession_store::{newest_first_comments, newest_first_confessions};
use crate::core::confessions::{
    comment_key, comment_prefix, confession_key, Comment, CommentStore, Confession,
    ConfessionError, ConfessionStore,
};
use crate::core::identity::AnonymousId;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory record store.
///
/// **DashMap:**
/// `get_mut` holds the shard's write lock for as long as the guard lives,
/// which is what makes a toggle's read-modify-write atomic per key. Other
/// keys (on other shards) stay available meanwhile.
pub struct InMemoryConfessionStore {
    /// `confession:<id>` -> record
    confessions: DashMap<String, Confession>,
    /// `comment:<confession_id>:<id>` -> comment
    comments: DashMap<String, Comment>,
}

impl InMemoryConfessionStore {
    pub fn new() -> Self {
        Self {
            confessions: DashMap::new(),
            comments: DashMap::new(),
        }
    }
}

impl Default for InMemoryConfessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfessionStore for InMemoryConfessionStore {
    async fn create(&self, content: &str) -> Result<Confession, ConfessionError> {
        let confession = Confession::new(content);
        self.confessions
            .insert(confession_key(&confession.id), confession.clone());
        Ok(confession)
    }

    async fn list(&self) -> Result<Vec<Confession>, ConfessionError> {
        // Each value is cloned under its shard lock, so no record is torn.
        let all = self
            .confessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        Ok(newest_first_confessions(all))
    }

    async fn get(&self, id: &str) -> Result<Option<Confession>, ConfessionError> {
        Ok(self
            .confessions
            .get(&confession_key(id))
            .map(|entry| entry.value().clone()))
    }

    async fn toggle_like(
        &self,
        id: &str,
        identity: &AnonymousId,
    ) -> Result<Confession, ConfessionError> {
        let mut entry = self
            .confessions
            .get_mut(&confession_key(id))
            .ok_or_else(|| ConfessionError::NotFound(id.to_string()))?;
        entry.toggle_like(identity);
        Ok(entry.clone())
    }
}

#[async_trait]
impl CommentStore for InMemoryConfessionStore {
    async fn append(
        &self,
        confession_id: &str,
        content: &str,
    ) -> Result<Comment, ConfessionError> {
        // Hold the parent for the whole operation so the comment and the
        // counter change together.
        let mut parent = self
            .confessions
            .get_mut(&confession_key(confession_id))
            .ok_or_else(|| ConfessionError::NotFound(confession_id.to_string()))?;

        let comment = Comment::new(confession_id, content);
        self.comments
            .insert(comment_key(confession_id, &comment.id), comment.clone());
        parent.comment_count = parent.comment_count.saturating_add(1);
        Ok(comment)
    }

    async fn list_for(&self, confession_id: &str) -> Result<Vec<Comment>, ConfessionError> {
        let prefix = comment_prefix(confession_id);
        let comments = self
            .comments
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .map(|entry| entry.value().clone())
            .collect();
        Ok(newest_first_comments(comments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let store = InMemoryConfessionStore::new();
        let first = store.create("first").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = store.create("second").await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_toggle_parity() {
        let store = InMemoryConfessionStore::new();
        let c = store.create("hello").await.unwrap();
        let user = AnonymousId::from("userA");

        for n in 1..=7 {
            let updated = store.toggle_like(&c.id, &user).await.unwrap();
            let expected = if n % 2 == 1 { 1 } else { 0 };
            assert_eq!(updated.likes, expected);
            assert_eq!(updated.liked_by.contains(&user), n % 2 == 1);
        }
    }

    #[tokio::test]
    async fn test_toggle_missing_creates_nothing() {
        let store = InMemoryConfessionStore::new();
        let err = store
            .toggle_like("nope", &AnonymousId::from("userA"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConfessionError::NotFound(_)));
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_from_distinct_users() {
        let store = Arc::new(InMemoryConfessionStore::new());
        let c = store.create("popular").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..64 {
            let store = Arc::clone(&store);
            let id = c.id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .toggle_like(&id, &AnonymousId::from(format!("user-{}", i)))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let after = store.get(&c.id).await.unwrap().unwrap();
        assert_eq!(after.likes, 64);
        assert_eq!(after.liked_by.len(), 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_from_same_user_cancel_out() {
        let store = Arc::new(InMemoryConfessionStore::new());
        let c = store.create("contested").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = Arc::clone(&store);
            let id = c.id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .toggle_like(&id, &AnonymousId::from("same"))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let after = store.get(&c.id).await.unwrap().unwrap();
        assert_eq!(after.likes, 0);
        assert!(after.liked_by.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mixed_writes_with_concurrent_readers() {
        let store = Arc::new(InMemoryConfessionStore::new());
        let c = store.create("busy").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..150 {
            let store = Arc::clone(&store);
            let id = c.id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .toggle_like(&id, &AnonymousId::from(format!("user-{}", i)))
                    .await
                    .unwrap();
            }));
        }
        // An even number of toggles from one identity nets out to nothing.
        for _ in 0..20 {
            let store = Arc::clone(&store);
            let id = c.id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .toggle_like(&id, &AnonymousId::from("same"))
                    .await
                    .unwrap();
            }));
        }
        for i in 0..200 {
            let store = Arc::clone(&store);
            let id = c.id.clone();
            handles.push(tokio::spawn(async move {
                store.append(&id, &format!("comment {}", i)).await.unwrap();
            }));
        }
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for confession in store.list().await.unwrap() {
                    assert_eq!(confession.likes, confession.liked_by.len() as u64);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let after = store.get(&c.id).await.unwrap().unwrap();
        assert_eq!(after.likes, 150);
        assert_eq!(after.liked_by.len(), 150);
        assert_eq!(after.comment_count, 200);
        assert_eq!(store.list_for(&c.id).await.unwrap().len(), 200);
    }

    #[tokio::test]
    async fn test_append_increments_parent() {
        let store = InMemoryConfessionStore::new();
        let c = store.create("hello").await.unwrap();
        let other = store.create("other").await.unwrap();

        store.append(&c.id, "nice").await.unwrap();
        store.append(&c.id, "agreed").await.unwrap();

        assert_eq!(store.get(&c.id).await.unwrap().unwrap().comment_count, 2);
        assert_eq!(store.list_for(&c.id).await.unwrap().len(), 2);
        assert!(store.list_for(&other.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_to_missing_parent() {
        let store = InMemoryConfessionStore::new();
        let err = store.append("ghost", "hi").await.unwrap_err();

        assert!(matches!(err, ConfessionError::NotFound(_)));
        assert!(store.list_for("ghost").await.unwrap().is_empty());
    }
}
