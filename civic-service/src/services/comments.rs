/// Comment thread - comments for one post, newest first
///
/// Adding or deleting a comment also maintains the parent post's
/// `comment_count`. Both writes go through one atomic batch, so the count
/// can never drift from the live comment records.
use crate::error::{AppError, Result};
use crate::models::{document_fields, Actor, Comment};
use crate::services::session::Session;
use document_store::{generate_id, DocumentStore, Query, WriteOp};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

#[derive(Serialize)]
struct CommentRecord<'a> {
    post_id: &'a str,
    text: &'a str,
    author_id: &'a str,
    author_name: &'a str,
}

pub struct CommentThread {
    store: Arc<dyn DocumentStore>,
    session: watch::Receiver<Session>,
    comments_collection: String,
    posts_collection: String,
    post_id: String,
}

impl CommentThread {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: watch::Receiver<Session>,
        comments_collection: impl Into<String>,
        posts_collection: impl Into<String>,
        post_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            session,
            comments_collection: comments_collection.into(),
            posts_collection: posts_collection.into(),
            post_id: post_id.into(),
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    fn require_actor(&self) -> Result<Actor> {
        self.session
            .borrow()
            .actor()
            .cloned()
            .ok_or(AppError::AuthenticationRequired)
    }

    /// One-shot fetch, newest first.
    pub async fn fetch(&self) -> Result<Vec<Comment>> {
        let query = Query::new()
            .filter("post_id", self.post_id.as_str())
            .order_by_desc("created_at");
        let docs = self.store.query(&self.comments_collection, &query).await?;
        Ok(docs
            .iter()
            .filter_map(|doc| match doc.to::<Comment>() {
                Ok(comment) => Some(comment),
                Err(err) => {
                    warn!(id = %doc.id, "skipping malformed comment record: {}", err);
                    None
                }
            })
            .collect())
    }

    /// Create a comment and increment the parent's `comment_count` in one
    /// atomic batch.
    pub async fn add(&self, text: &str) -> Result<Comment> {
        let actor = self.require_actor()?;

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Comment text is required".to_string()));
        }

        // The parent must exist before attaching anything to it.
        self.store
            .get(&self.posts_collection, &self.post_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("{}/{}", self.posts_collection, self.post_id))
            })?;

        let id = generate_id();
        let record = CommentRecord {
            post_id: &self.post_id,
            text,
            author_id: &actor.uid,
            author_name: &actor.username,
        };
        self.store
            .commit(vec![
                WriteOp::Create {
                    collection: self.comments_collection.clone(),
                    id: id.clone(),
                    fields: document_fields(&record)?,
                },
                WriteOp::Increment {
                    collection: self.posts_collection.clone(),
                    id: self.post_id.clone(),
                    field: "comment_count".to_string(),
                    delta: 1,
                },
            ])
            .await?;

        // Read back for the store-assigned timestamp.
        let doc = self
            .store
            .get(&self.comments_collection, &id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", self.comments_collection, id)))?;
        Ok(doc.to()?)
    }

    /// Moderation delete: the author or an administrator only. Decrements the
    /// parent's `comment_count` in the same atomic batch.
    pub async fn delete(&self, comment_id: &str) -> Result<()> {
        let actor = self.require_actor()?;

        let doc = self
            .store
            .get(&self.comments_collection, comment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("{}/{}", self.comments_collection, comment_id))
            })?;
        let comment: Comment = doc.to()?;

        if comment.author_id != actor.uid && !actor.is_admin {
            return Err(AppError::AuthorizationDenied);
        }

        self.store
            .commit(vec![
                WriteOp::Delete {
                    collection: self.comments_collection.clone(),
                    id: comment_id.to_string(),
                },
                WriteOp::Increment {
                    collection: self.posts_collection.clone(),
                    id: comment.post_id.clone(),
                    field: "comment_count".to_string(),
                    delta: -1,
                },
            ])
            .await?;
        Ok(())
    }
}
