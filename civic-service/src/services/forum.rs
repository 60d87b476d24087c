/// Forum chat - the shared live message stream
///
/// One live subscription over the forum-messages collection, oldest first so
/// the conversation reads top to bottom. Snapshots replace local state
/// wholesale on every delivery.
use crate::error::{AppError, Result};
use crate::models::{document_fields, Actor, ForumMessage};
use crate::services::session::Session;
use document_store::{DocumentStore, LiveQuery, Query};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

#[derive(Serialize)]
struct MessageRecord<'a> {
    text: &'a str,
    author_id: &'a str,
    display_name: &'a str,
    photo_url: Option<&'a str>,
}

pub struct ForumChat {
    store: Arc<dyn DocumentStore>,
    session: watch::Receiver<Session>,
    collection: String,
    live: LiveQuery,
}

impl ForumChat {
    pub async fn new(
        store: Arc<dyn DocumentStore>,
        session: watch::Receiver<Session>,
        collection: impl Into<String>,
    ) -> Result<Self> {
        let collection = collection.into();
        let live = store
            .subscribe(&collection, &Query::new().order_by_asc("created_at"))
            .await?;
        Ok(Self {
            store,
            session,
            collection,
            live,
        })
    }

    pub fn messages(&self) -> Vec<ForumMessage> {
        self.live
            .snapshot()
            .iter()
            .filter_map(|doc| match doc.to::<ForumMessage>() {
                Ok(message) => Some(message),
                Err(err) => {
                    warn!(id = %doc.id, "skipping malformed forum message: {}", err);
                    None
                }
            })
            .collect()
    }

    pub async fn changed(&mut self) -> Result<()> {
        self.live.changed().await?;
        Ok(())
    }

    fn require_actor(&self) -> Result<Actor> {
        self.session
            .borrow()
            .actor()
            .cloned()
            .ok_or(AppError::AuthenticationRequired)
    }

    pub async fn send(&self, text: &str) -> Result<ForumMessage> {
        let actor = self.require_actor()?;

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Message text is required".to_string()));
        }

        let record = MessageRecord {
            text,
            author_id: &actor.uid,
            display_name: &actor.username,
            photo_url: actor.photo_url.as_deref(),
        };
        let doc = self
            .store
            .create(&self.collection, document_fields(&record)?)
            .await?;
        Ok(doc.to()?)
    }
}
