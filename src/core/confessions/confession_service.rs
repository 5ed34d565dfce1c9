// Confession service - the public operations, composed from the pipeline,
// the stores and the identity provider.
//
// NO HTTP dependencies here. The http layer maps `ConfessionError` onto
// status codes; a CLI or test can drive this directly.

use super::confession_models::{Comment, Confession, ConfessionSort, MAX_COMMENT_CHARS};
use super::confession_store::{CommentStore, ConfessionError, ConfessionStore};
use crate::core::identity::IdentityProvider;
use crate::core::moderation::{
    validate_length, Classifier, FilterResult, ModerationOutcome, ModerationPipeline,
    RejectionReason,
};

pub struct ConfessionService<S, C>
where
    S: ConfessionStore + CommentStore,
    C: Classifier,
{
    store: S,
    pipeline: ModerationPipeline<C>,
    /// Run the lexical filter over comments too.
    moderate_comments: bool,
}

impl<S, C> ConfessionService<S, C>
where
    S: ConfessionStore + CommentStore,
    C: Classifier,
{
    pub fn new(store: S, pipeline: ModerationPipeline<C>) -> Self {
        Self {
            store,
            pipeline,
            moderate_comments: true,
        }
    }

    pub fn with_comment_moderation(mut self, enabled: bool) -> Self {
        self.moderate_comments = enabled;
        self
    }

    /// Moderate `text` and store it as a new confession.
    pub async fn submit(&self, text: &str) -> Result<Confession, ConfessionError> {
        match self.pipeline.evaluate(text).await? {
            ModerationOutcome::Admit(content) => {
                let confession = self.store.create(&content).await?;
                tracing::info!(confession_id = %confession.id, "Confession stored");
                Ok(confession)
            }
            ModerationOutcome::Reject(reason) => {
                tracing::info!(code = reason.code(), "Confession rejected");
                Err(ConfessionError::Rejected(reason))
            }
        }
    }

    /// All confessions, most recent first.
    pub async fn list(&self) -> Result<Vec<Confession>, ConfessionError> {
        self.store.list().await
    }

    /// All confessions in the requested order. Stored order is untouched.
    pub async fn list_sorted(
        &self,
        sort: ConfessionSort,
    ) -> Result<Vec<Confession>, ConfessionError> {
        let mut confessions = self.store.list().await?;
        sort.apply(&mut confessions);
        Ok(confessions)
    }

    /// Flip the caller's like on confession `id`.
    pub async fn toggle_like(
        &self,
        id: &str,
        identity: &dyn IdentityProvider,
    ) -> Result<Confession, ConfessionError> {
        let who = identity.get_or_create_identity();
        let confession = self.store.toggle_like(id, &who).await?;
        tracing::debug!(confession_id = %id, likes = confession.likes, "Like toggled");
        Ok(confession)
    }

    /// Validate and append a comment to confession `id`.
    pub async fn add_comment(&self, id: &str, text: &str) -> Result<Comment, ConfessionError> {
        let content = validate_length(text, MAX_COMMENT_CHARS)?;

        if self.moderate_comments {
            if let FilterResult::Reject { term } = self.pipeline.filter().check(content) {
                tracing::info!(confession_id = %id, "Comment rejected by lexical filter");
                return Err(ConfessionError::Rejected(RejectionReason::BannedTerm {
                    term,
                }));
            }
        }

        let comment = self.store.append(id, content).await?;
        tracing::info!(confession_id = %id, comment_id = %comment.id, "Comment stored");
        Ok(comment)
    }

    /// Comments of confession `id`, newest first.
    pub async fn list_comments(&self, id: &str) -> Result<Vec<Comment>, ConfessionError> {
        self.store.list_for(id).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
