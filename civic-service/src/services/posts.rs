/// Post feed - live, area-scoped list of reports with engagement operations
///
/// Holds at most one live subscription. Changing the area tears the old
/// subscription down before opening the new one; the free-text search is a
/// view-level predicate re-applied to the full snapshot on every read, never
/// maintained incrementally.
use crate::error::{AppError, Result};
use crate::models::{document_fields, Actor, Area, AreaFilter, Ministry, NewPost, Post};
use crate::services::session::Session;
use crate::storage::BlobStorage;
use document_store::{DocumentStore, LiveQuery, Query};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// Record written to the posts collection. The store assigns the id and the
/// `created_at` timestamp; counters start at zero.
#[derive(Serialize)]
struct PostRecord<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtitle: Option<&'a str>,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    area: Area,
    ministry: Ministry,
    author_id: &'a str,
    author_name: &'a str,
    like_count: i64,
    dislike_count: i64,
    comment_count: i64,
}

pub struct PostFeed {
    store: Arc<dyn DocumentStore>,
    session: watch::Receiver<Session>,
    collection: String,
    page_size: usize,
    area: AreaFilter,
    search: String,
    live: Option<LiveQuery>,
    blobs: Option<Arc<dyn BlobStorage>>,
}

impl PostFeed {
    pub async fn new(
        store: Arc<dyn DocumentStore>,
        session: watch::Receiver<Session>,
        collection: impl Into<String>,
        page_size: usize,
    ) -> Result<Self> {
        let collection = collection.into();
        let area = AreaFilter::All;
        let live = store
            .subscribe(&collection, &Self::query_for(area, page_size))
            .await?;
        Ok(Self {
            store,
            session,
            collection,
            page_size,
            area,
            search: String::new(),
            live: Some(live),
            blobs: None,
        })
    }

    pub fn with_storage(mut self, blobs: Arc<dyn BlobStorage>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    fn query_for(area: AreaFilter, page_size: usize) -> Query {
        let mut query = Query::new().order_by_desc("created_at").limit(page_size);
        if let AreaFilter::Only(area) = area {
            query = query.filter("area", area.as_str());
        }
        query
    }

    pub fn area(&self) -> AreaFilter {
        self.area
    }

    /// Re-scope the subscription. The prior one is cancelled first so at most
    /// one listener is ever active.
    pub async fn set_area(&mut self, area: AreaFilter) -> Result<()> {
        if area == self.area && self.live.is_some() {
            return Ok(());
        }
        self.live = None;
        let live = self
            .store
            .subscribe(&self.collection, &Self::query_for(area, self.page_size))
            .await?;
        self.live = Some(live);
        self.area = area;
        Ok(())
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// The current snapshot, mapped to typed posts and filtered by the
    /// search predicate. Malformed records are skipped, not fatal.
    pub fn posts(&self) -> Vec<Post> {
        let Some(live) = &self.live else {
            return Vec::new();
        };
        live.snapshot()
            .iter()
            .filter_map(|doc| match doc.to::<Post>() {
                Ok(post) => Some(post),
                Err(err) => {
                    warn!(id = %doc.id, "skipping malformed post record: {}", err);
                    None
                }
            })
            .filter(|post| post.matches_search(&self.search))
            .collect()
    }

    /// Wait for the next snapshot delivery.
    pub async fn changed(&mut self) -> Result<()> {
        match &mut self.live {
            Some(live) => {
                live.changed().await?;
                Ok(())
            }
            None => Err(AppError::BackendUnavailable(
                "no active subscription".to_string(),
            )),
        }
    }

    fn require_actor(&self) -> Result<Actor> {
        self.session
            .borrow()
            .actor()
            .cloned()
            .ok_or(AppError::AuthenticationRequired)
    }

    /// Create a report. Visibility comes from the live subscription
    /// re-delivering the snapshot, not from a local patch.
    pub async fn create(&self, new_post: &NewPost) -> Result<String> {
        let actor = self.require_actor()?;

        let title = new_post.title.trim();
        let content = new_post.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(AppError::Validation(
                "Title and description are required".to_string(),
            ));
        }
        let area = new_post
            .area
            .ok_or_else(|| AppError::Validation("Area is required".to_string()))?;

        let record = PostRecord {
            title,
            subtitle: new_post.subtitle.as_deref(),
            content,
            image_url: new_post.image_url.as_deref(),
            area,
            ministry: new_post.ministry,
            author_id: &actor.uid,
            author_name: &actor.username,
            like_count: 0,
            dislike_count: 0,
            comment_count: 0,
        };
        let doc = self
            .store
            .create(&self.collection, document_fields(&record)?)
            .await?;
        Ok(doc.id)
    }

    /// Upload the image first, then create the report carrying its URL.
    pub async fn create_with_image(
        &self,
        new_post: &NewPost,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let blobs = self
            .blobs
            .as_ref()
            .ok_or_else(|| AppError::Internal("blob storage not configured".to_string()))?;
        let blob = blobs.upload(content_type, bytes).await?;

        let mut with_image = new_post.clone();
        with_image.image_url = Some(blob.url);
        self.create(&with_image).await
    }

    /// Atomic server-side increment; returns the new count.
    pub async fn like(&self, post_id: &str) -> Result<i64> {
        self.require_actor()?;
        Ok(self
            .store
            .increment(&self.collection, post_id, "like_count", 1)
            .await?)
    }

    /// Atomic server-side increment; returns the new count.
    pub async fn dislike(&self, post_id: &str) -> Result<i64> {
        self.require_actor()?;
        Ok(self
            .store
            .increment(&self.collection, post_id, "dislike_count", 1)
            .await?)
    }

    /// Moderation delete: the owner or an administrator only.
    pub async fn delete(&self, post_id: &str) -> Result<()> {
        let actor = self.require_actor()?;
        let doc = self
            .store
            .get(&self.collection, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", self.collection, post_id)))?;
        let post: Post = doc.to()?;

        if post.author_id != actor.uid && !actor.is_admin {
            return Err(AppError::AuthorizationDenied);
        }
        self.store.delete(&self.collection, post_id).await?;
        Ok(())
    }
}
