//! Inverted value-bucket index and the two-stage search pipeline.
//!
//! The index maps component fingerprints to the records containing a
//! component in that 0.01 grain. It is an over-approximation: a record
//! appears once per embedding component, possibly several times in one
//! bucket, and search deduplicates. The whole structure lives behind a
//! single readers-writer lock; it is rebuilt from storage at startup and
//! observes every successful mutation before the mutation returns.

/// Two-fractional-digit bucket keys.
pub mod fingerprint;

pub use fingerprint::fingerprint;

use crate::error::{Error, Result};
use crate::record::Vector;
use crate::search::{cosine_similarity, rerank};
use crate::storage::{Envelope, ShardedStorage};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// In-memory candidate index over the sharded storage.
///
/// Bucket entries are shared handles, not owning copies: a record inserted
/// once is referenced from one bucket per embedding component. Deleting a
/// record purges every bucket occurrence before the persistent delete, so
/// a search running after the purge can never surface a tombstoned record.
pub struct VectorIndex {
    storage: Arc<ShardedStorage>,
    buckets: RwLock<HashMap<String, Vec<Arc<Vector>>>>,
}

impl VectorIndex {
    /// Builds the index from a full storage scan. No searches can run until
    /// the build finishes.
    pub fn new(storage: Arc<ShardedStorage>) -> Result<Self> {
        let index = Self {
            storage,
            buckets: RwLock::new(HashMap::new()),
        };
        index.build()?;
        Ok(index)
    }

    fn build(&self) -> Result<()> {
        let mut buckets = self.buckets.write();
        let mut indexed = 0usize;
        let mut skipped = 0usize;
        for envelope in self.storage.scan_all()? {
            let vector = match envelope {
                Ok(Envelope::Vector(vector)) => vector,
                Ok(Envelope::Object(_)) => continue,
                Err(Error::Serialization(err)) => {
                    tracing::warn!(%err, "skipping undecodable record during index rebuild");
                    skipped += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };
            let handle = Arc::new(vector);
            for &value in &handle.embedding {
                buckets
                    .entry(fingerprint(value))
                    .or_default()
                    .push(Arc::clone(&handle));
            }
            indexed += 1;
        }
        tracing::info!(records = indexed, skipped, "index rebuilt from storage");
        Ok(())
    }

    /// Validates and persists a record, then indexes every embedding
    /// component. The write lock spans both steps, so no search observes a
    /// stored record missing from the index.
    pub fn insert(&self, vector: Vector) -> Result<()> {
        vector.validate()?;
        let mut buckets = self.buckets.write();
        self.storage.insert_vector(&vector)?;
        let handle = Arc::new(vector);
        for &value in &handle.embedding {
            buckets
                .entry(fingerprint(value))
                .or_default()
                .push(Arc::clone(&handle));
        }
        Ok(())
    }

    /// Removes a record from every bucket, then from storage.
    ///
    /// The purge runs first so searches never see ghost hits. If the
    /// storage delete fails afterwards the record is unreachable by search
    /// until the next rebuild restores its entries; that degradation is
    /// preferred over returning deleted records.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut buckets = self.buckets.write();
        let vector = self.storage.get_vector(id)?;
        for &value in &vector.embedding {
            let key = fingerprint(value);
            let mut now_empty = false;
            if let Some(bucket) = buckets.get_mut(&key) {
                if let Some(position) = bucket.iter().position(|entry| entry.id == id) {
                    bucket.remove(position);
                }
                now_empty = bucket.is_empty();
            }
            if now_empty {
                buckets.remove(&key);
            }
        }
        self.storage.delete_vector(id)
    }

    /// Two-stage top-k search.
    ///
    /// Candidates are gathered from the buckets of every query component and
    /// scored once with cosine similarity; pairs that cannot be compared
    /// (dimension or compression mismatch) score 0 rather than failing the
    /// query. The scored multiset is stably sorted descending, deduplicated
    /// by id keeping the first occurrence, and cut to `k`. Full records are
    /// then fetched from storage (ids lost to a concurrent delete drop out
    /// silently) and, when the query carries text, reranked lexically.
    pub fn search(&self, query: &Vector, k: usize) -> Result<Vec<Vector>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".into()));
        }

        let buckets = self.buckets.read();
        let mut candidates: Vec<Arc<Vector>> = Vec::new();
        for &value in &query.embedding {
            if let Some(bucket) = buckets.get(&fingerprint(value)) {
                candidates.extend(bucket.iter().cloned());
            }
        }

        let mut scored: Vec<(f64, &Arc<Vector>)> = candidates
            .iter()
            .map(|candidate| {
                let similarity = cosine_similarity(query, candidate).unwrap_or(0.0);
                (similarity, candidate)
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let mut seen: HashSet<&str> = HashSet::with_capacity(scored.len());
        let mut ids: Vec<String> = Vec::with_capacity(k.min(scored.len()));
        for (_, candidate) in &scored {
            if seen.insert(candidate.id.as_str()) {
                ids.push(candidate.id.clone());
                if ids.len() == k {
                    break;
                }
            }
        }

        let mut results = self.storage.get_vectors(&ids)?;
        drop(buckets);

        rerank(&mut results, &query.text);
        results.truncate(k);
        Ok(results)
    }

    /// Number of live bucket entries, counting duplicates. Test hook.
    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.buckets.read().values().map(Vec::len).sum()
    }
}
