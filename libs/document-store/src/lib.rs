//! Document store contract
//!
//! The hosted document database is reached exclusively through the
//! [`DocumentStore`] trait: named collections of schemaless JSON documents
//! with field-level partial updates, atomic numeric increments, atomic write
//! batches, one-shot queries, and push-based live query subscriptions.
//!
//! # Modules
//!
//! - `error`: Store error types
//! - `memory`: In-memory reference backend for tests and local development

pub mod error;
pub mod memory;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A single record in a collection. `fields` never contains the id; the id is
/// assigned by the store and carried alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Deserialize the document into a typed model. The id is injected into
    /// the field map under `"id"` so models can carry it as a plain field.
    pub fn to<T: DeserializeOwned>(&self) -> Result<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Field equality predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub equals: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A filtered, ordered, limited query over one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, equals: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            equals: equals.into(),
        });
        self
    }

    pub fn order_by_asc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: Direction::Descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One write in an atomic batch. Creates carry a caller-generated id so the
/// batch can reference its own documents before committing.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Create {
        collection: String,
        id: String,
        fields: Map<String, Value>,
    },
    Update {
        collection: String,
        id: String,
        patch: Map<String, Value>,
    },
    Increment {
        collection: String,
        id: String,
        field: String,
        delta: i64,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// Generate a fresh document id, usable for [`WriteOp::Create`].
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A live query subscription.
///
/// The backend pushes the full, ordered result set on every matching change;
/// consumers replace their local state wholesale on each delivery. Dropping
/// the handle cancels the producer task.
pub struct LiveQuery {
    rx: watch::Receiver<Vec<Document>>,
    task: JoinHandle<()>,
}

impl LiveQuery {
    pub fn new(rx: watch::Receiver<Vec<Document>>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }

    /// The most recently delivered snapshot.
    pub fn snapshot(&self) -> Vec<Document> {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot delivery.
    pub async fn changed(&mut self) -> Result<()> {
        self.rx
            .changed()
            .await
            .map_err(|_| StoreError::Unavailable("live query closed".to_string()))
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Backend contract for the hosted document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a store-assigned id. A `created_at` RFC 3339
    /// field is stamped by the store when the caller did not supply one.
    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<Document>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Merge `patch` into the document's fields.
    async fn update(&self, collection: &str, id: &str, patch: Map<String, Value>) -> Result<()>;

    /// Atomically add `delta` to a numeric field and return the new value.
    /// A missing field counts as zero; results saturate at zero.
    async fn increment(&self, collection: &str, id: &str, field: &str, delta: i64) -> Result<i64>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// One-shot filtered/ordered query.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;

    /// Open a live subscription. The initial snapshot is available
    /// immediately via [`LiveQuery::snapshot`].
    async fn subscribe(&self, collection: &str, query: &Query) -> Result<LiveQuery>;

    /// Apply a batch of writes atomically: either every op takes effect or
    /// none does.
    async fn commit(&self, ops: Vec<WriteOp>) -> Result<()>;
}
