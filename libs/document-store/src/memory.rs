//! In-memory reference backend
//!
//! Implements the full [`DocumentStore`] contract over process memory. Used by
//! the test suites and for local development; production deployments swap in
//! an adapter for the hosted document database behind the same trait.

use crate::error::{Result, StoreError};
use crate::{generate_id, Direction, Document, Filter, LiveQuery, Query, WriteOp};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{broadcast, watch};
use tracing::debug;

type Collection = BTreeMap<String, Map<String, Value>>;
type Collections = HashMap<String, Collection>;

const EVENT_CAPACITY: usize = 64;

/// All collections live behind a single lock so write batches are genuinely
/// atomic across collections.
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
    events: broadcast::Sender<String>,
    clock: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            events,
            clock: AtomicI64::new(0),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn notify(&self, collection: &str) {
        // No receivers is fine; subscriptions come and go.
        let _ = self.events.send(collection.to_string());
    }

    /// Strictly monotonic timestamp so documents created back-to-back still
    /// order deterministically under `created_at` sorts.
    fn next_timestamp(&self) -> String {
        let candidate = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        let mut last = self.clock.load(Ordering::Relaxed);
        let next = loop {
            let next = candidate.max(last + 1);
            match self
                .clock
                .compare_exchange(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break next,
                Err(current) => last = current,
            }
        };
        DateTime::from_timestamp_nanos(next).to_rfc3339_opts(SecondsFormat::Nanos, true)
    }
}

#[async_trait::async_trait]
impl crate::DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<Document> {
        let id = generate_id();
        let stamp = self.next_timestamp();
        let mut fields = fields;
        fields
            .entry("created_at".to_string())
            .or_insert_with(|| Value::String(stamp));
        {
            let mut guard = self.write()?;
            guard
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), fields.clone());
        }
        self.notify(collection);
        Ok(Document { id, fields })
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let guard = self.read()?;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn update(&self, collection: &str, id: &str, patch: Map<String, Value>) -> Result<()> {
        {
            let mut guard = self.write()?;
            let fields = guard
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            for (key, value) in patch {
                fields.insert(key, value);
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, delta: i64) -> Result<i64> {
        let new_value = {
            let mut guard = self.write()?;
            let fields = guard
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            apply_increment(fields, field, delta)
        };
        self.notify(collection);
        Ok(new_value)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        {
            let mut guard = self.write()?;
            guard
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
        }
        self.notify(collection);
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let guard = self.read()?;
        Ok(evaluate(&guard, collection, query))
    }

    async fn subscribe(&self, collection: &str, query: &Query) -> Result<LiveQuery> {
        // Register for events before reading the initial snapshot: a write
        // landing between the two then has a queued notification, so it can
        // never be absent from both the snapshot and the event stream.
        let mut events = self.events.subscribe();
        let initial = {
            let guard = self.read()?;
            evaluate(&guard, collection, query)
        };
        let (tx, rx) = watch::channel(initial);

        let inner = Arc::clone(&self.inner);
        let collection = collection.to_string();
        let query = query.clone();
        debug!(collection = %collection, "live query opened");
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(name) if name == collection => {}
                    Ok(_) => continue,
                    // Missed notifications only mean we re-evaluate late;
                    // the snapshot is rebuilt from scratch either way.
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                let snapshot = match inner.read() {
                    Ok(guard) => evaluate(&guard, &collection, &query),
                    Err(_) => break,
                };
                if tx.send(snapshot).is_err() {
                    break;
                }
            }
        });

        Ok(LiveQuery::new(rx, task))
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        debug!(ops = ops.len(), "applying write batch");
        let mut touched: HashSet<String> = HashSet::new();
        {
            let mut guard = self.write()?;
            // Stage against a copy; swap in only if every op applies.
            let mut staged = guard.clone();
            for op in &ops {
                let stamp = self.next_timestamp();
                apply_op(&mut staged, op, &stamp)?;
                touched.insert(op_collection(op).to_string());
            }
            *guard = staged;
        }
        for collection in touched {
            self.notify(&collection);
        }
        Ok(())
    }
}

fn op_collection(op: &WriteOp) -> &str {
    match op {
        WriteOp::Create { collection, .. }
        | WriteOp::Update { collection, .. }
        | WriteOp::Increment { collection, .. }
        | WriteOp::Delete { collection, .. } => collection,
    }
}

fn apply_op(staged: &mut Collections, op: &WriteOp, stamp: &str) -> Result<()> {
    match op {
        WriteOp::Create {
            collection,
            id,
            fields,
        } => {
            let docs = staged.entry(collection.clone()).or_default();
            if docs.contains_key(id) {
                return Err(StoreError::Unavailable(format!(
                    "create conflict: {}/{} already exists",
                    collection, id
                )));
            }
            let mut fields = fields.clone();
            fields
                .entry("created_at".to_string())
                .or_insert_with(|| Value::String(stamp.to_string()));
            docs.insert(id.clone(), fields);
            Ok(())
        }
        WriteOp::Update {
            collection,
            id,
            patch,
        } => {
            let fields = staged
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            for (key, value) in patch {
                fields.insert(key.clone(), value.clone());
            }
            Ok(())
        }
        WriteOp::Increment {
            collection,
            id,
            field,
            delta,
        } => {
            let fields = staged
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            apply_increment(fields, field, *delta);
            Ok(())
        }
        WriteOp::Delete { collection, id } => {
            staged
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            Ok(())
        }
    }
}

/// Counters never go negative: decrements saturate at zero.
fn apply_increment(fields: &mut Map<String, Value>, field: &str, delta: i64) -> i64 {
    let current = fields.get(field).and_then(Value::as_i64).unwrap_or(0);
    let new_value = current.saturating_add(delta).max(0);
    fields.insert(field.to_string(), Value::from(new_value));
    new_value
}

fn matches(fields: &Map<String, Value>, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|filter| fields.get(&filter.field) == Some(&filter.equals))
}

fn evaluate(collections: &Collections, collection: &str, query: &Query) -> Vec<Document> {
    let mut results: Vec<Document> = collections
        .get(collection)
        .map(|docs| {
            docs.iter()
                .filter(|(_, fields)| matches(fields, &query.filters))
                .map(|(id, fields)| Document {
                    id: id.clone(),
                    fields: fields.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some(order) = &query.order_by {
        results.sort_by(|a, b| {
            let ordering = compare_values(a.get(&order.field), b.get(&order.field));
            let ordering = match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            // Deterministic order for equal keys.
            ordering.then_with(|| a.id.cmp(&b.id))
        });
    }

    if let Some(limit) = query.limit {
        results.truncate(limit);
    }
    results
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
