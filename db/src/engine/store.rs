//! The in-memory vector store: a growable sequence of [`VectorRecord`]s
//! mirrored by a [`KdTree`], guarded end-to-end by a single mutex.
//!
//! Every public method here acquires the lock for its entire duration -
//! including reads - and returns owned values rather than references into
//! the guarded state, so nothing escapes the critical section.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use fallible_collections::vec::FallibleVec;
use uuid::Uuid;
use vector_similarity::KdTree;

use crate::errors::ServerError;

/// A single stored vector: a stable UUID handle and its dense payload.
///
/// Dimension is implicit in `payload.len()`; the owning store enforces
/// that every record's dimension matches the store's configured `D`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub uuid: Uuid,
    pub payload: Vec<f64>,
}

fn to_f32_point(payload: &[f64]) -> Vec<f32> {
    payload.iter().map(|v| *v as f32).collect()
}

struct Inner {
    records: Vec<VectorRecord>,
    by_uuid: HashMap<Uuid, usize>,
    tree: KdTree,
    dimension: usize,
}

impl Inner {
    fn new(dimension: usize) -> Self {
        Self {
            records: Vec::new(),
            by_uuid: HashMap::new(),
            tree: KdTree::new(dimension),
            dimension,
        }
    }

    fn check_dimension(&self, found: usize) -> Result<(), ServerError> {
        if found != self.dimension {
            return Err(ServerError::DimensionMismatch {
                expected: self.dimension,
                found,
            });
        }
        Ok(())
    }

    fn insert(&mut self, uuid: Uuid, payload: Vec<f64>) -> Result<usize, ServerError> {
        self.check_dimension(payload.len())?;
        let point = to_f32_point(&payload);
        let index = self.records.len();
        FallibleVec::try_push(&mut self.records, VectorRecord { uuid, payload })?;
        self.by_uuid.insert(uuid, index);
        // the tree's own dimension always matches self.dimension, so this
        // insert cannot itself fail on a dimension check
        let _ = self.tree.insert(point, index);
        Ok(index)
    }

    fn read(&self, index: usize) -> Option<VectorRecord> {
        self.records.get(index).cloned()
    }

    fn read_by_uuid(&self, uuid: &Uuid) -> Option<(usize, VectorRecord)> {
        let index = *self.by_uuid.get(uuid)?;
        self.records.get(index).cloned().map(|r| (index, r))
    }

    fn update(&mut self, index: usize, payload: Vec<f64>) -> Result<(), ServerError> {
        if index >= self.records.len() {
            return Err(ServerError::IndexNotFound {
                index,
                size: self.records.len(),
            });
        }
        self.check_dimension(payload.len())?;
        let point = to_f32_point(&payload);
        self.records[index].payload = payload;
        // the stale node left behind by the old payload is a documented,
        // accepted property of this index (see the design notes on
        // tree/store coupling) - it is never removed here
        let _ = self.tree.insert(point, index);
        Ok(())
    }

    fn delete(&mut self, index: usize) -> Result<VectorRecord, ServerError> {
        if index >= self.records.len() {
            return Err(ServerError::IndexNotFound {
                index,
                size: self.records.len(),
            });
        }
        let removed = self.records.remove(index);
        self.by_uuid.remove(&removed.uuid);
        self.rebuild_after_shift();
        Ok(removed)
    }

    /// Rebuilds the UUID index and the KD-tree from the current sequence.
    ///
    /// Called after a delete: because delete shifts every subsequent
    /// record's index down by one, leaving the old tree in place would
    /// make `nearest` return indices that point at the *wrong* record,
    /// not merely a stale one. A full rebuild is the crate's resolution of
    /// that open question (see the design notes).
    fn rebuild_after_shift(&mut self) {
        self.by_uuid.clear();
        let mut tree = KdTree::new(self.dimension);
        for (index, record) in self.records.iter().enumerate() {
            self.by_uuid.insert(record.uuid, index);
            let _ = tree.insert(to_f32_point(&record.payload), index);
        }
        self.tree = tree;
    }

    fn nearest(&self, query: &[f64]) -> Result<Option<(usize, VectorRecord)>, ServerError> {
        self.check_dimension(query.len())?;
        let point = to_f32_point(query);
        Ok(self
            .tree
            .nearest(&point)
            .and_then(|index| self.read(index).map(|record| (index, record))))
    }
}

/// The engine's single entry point. Every method locks `inner` for its
/// whole body; no method ever hands out a reference that outlives the
/// guard.
pub struct VectorStore {
    inner: Mutex<Inner>,
    dimension: usize,
    /// Set by every mutating operation, cleared by the persistence task
    /// once it has written a fresh snapshot. Lets the autosave loop skip
    /// writing when nothing has changed.
    pub dirty: AtomicBool,
}

impl VectorStore {
    /// Creates an empty store for `dimension`-dimensional vectors.
    /// `initial_capacity` is a hint only; `0` is treated as a request for
    /// the default of 10, matching the source lineage's `init`.
    pub fn new(dimension: usize, initial_capacity: usize) -> Self {
        let mut inner = Inner::new(dimension);
        let capacity = if initial_capacity == 0 {
            10
        } else {
            initial_capacity
        };
        inner.records.reserve(capacity);
        Self {
            inner: Mutex::new(inner),
            dimension,
            dirty: AtomicBool::new(false),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[tracing::instrument(skip(self, payload))]
    pub fn insert(&self, uuid: Uuid, payload: Vec<f64>) -> Result<usize, ServerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let index = inner.insert(uuid, payload)?;
        self.dirty.store(true, Ordering::SeqCst);
        Ok(index)
    }

    #[tracing::instrument(skip(self))]
    pub fn read(&self, index: usize) -> Result<VectorRecord, ServerError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.read(index).ok_or(ServerError::IndexNotFound {
            index,
            size: inner.records.len(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn read_by_uuid(&self, uuid: Uuid) -> Result<(usize, VectorRecord), ServerError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner
            .read_by_uuid(&uuid)
            .ok_or_else(|| ServerError::UuidNotFound(uuid.to_string()))
    }

    #[tracing::instrument(skip(self, payload))]
    pub fn update(&self, index: usize, payload: Vec<f64>) -> Result<(), ServerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.update(index, payload)?;
        self.dirty.store(true, Ordering::SeqCst);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&self, index: usize) -> Result<VectorRecord, ServerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let removed = inner.delete(index)?;
        self.dirty.store(true, Ordering::SeqCst);
        Ok(removed)
    }

    #[tracing::instrument(skip(self, query))]
    pub fn nearest(&self, query: Vec<f64>) -> Result<(usize, VectorRecord), ServerError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner
            .nearest(&query)?
            .ok_or(ServerError::IndexNotFound { index: 0, size: 0 })
    }

    /// Returns a snapshot of every live record, in index order. Used by
    /// [`crate::engine::persistence`] to serialize the store without
    /// holding the lock across file I/O.
    pub fn snapshot(&self) -> Vec<VectorRecord> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.records.clone()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuilds a store from a previously-saved sequence of records, in
    /// ascending index order - the same re-derivation `load` performs
    /// per the persistence design (the tree is never itself persisted).
    pub fn from_records(dimension: usize, records: Vec<VectorRecord>) -> Self {
        let store = Self::new(dimension, records.len());
        {
            let mut inner = store.inner.lock().expect("store mutex poisoned");
            for record in records {
                let _ = inner.insert(record.uuid, record.payload);
            }
        }
        store
    }
}
