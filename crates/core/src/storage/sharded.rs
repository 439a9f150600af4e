//! Placement layer fanning CRUD out across the static shard list.
//!
//! Every identifier is routed to exactly one shard by
//! [`node_index`](crate::storage::placement::node_index); full scans fan out
//! to every shard and concatenate, with cross-shard order undefined. The
//! outer lock serializes fan-out reads against mutations; each shard's own
//! lock applies beneath it. Membership is fixed at open time and immutable
//! for the process lifetime.

use crate::error::{Error, Result};
use crate::record::{Object, Vector};
use crate::storage::envelope::Envelope;
use crate::storage::placement::node_index;
use crate::storage::shard::{Scan, Shard};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;

/// Keyed storage across N shards with rendezvous placement.
pub struct ShardedStorage {
    nodes: RwLock<Vec<Shard>>,
}

impl ShardedStorage {
    /// Opens one shard per name under `data_dir`, at `node_<name>.db`.
    pub fn open(data_dir: impl AsRef<Path>, node_names: &[String]) -> Result<Self> {
        if node_names.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one shard is required".into(),
            ));
        }
        let mut nodes = Vec::with_capacity(node_names.len());
        for name in node_names {
            let path = data_dir.as_ref().join(format!("node_{name}.db"));
            nodes.push(Shard::open(path)?);
        }
        tracing::info!(shards = nodes.len(), "opened sharded storage");
        Ok(Self {
            nodes: RwLock::new(nodes),
        })
    }

    /// Number of shards in the membership list.
    pub fn shard_count(&self) -> usize {
        self.nodes.read().len()
    }

    /// Index of the shard owning `id`. Exposed for distribution checks.
    pub fn owner_of(&self, id: &str) -> usize {
        node_index(id, self.shard_count())
    }

    /// Stores a vector on its owning shard.
    pub fn insert_vector(&self, vector: &Vector) -> Result<()> {
        let nodes = self.nodes.write();
        nodes[node_index(&vector.id, nodes.len())].put_vector(vector)
    }

    /// Fetches a vector from its owning shard.
    pub fn get_vector(&self, id: &str) -> Result<Vector> {
        let nodes = self.nodes.read();
        nodes[node_index(id, nodes.len())].get_vector(id)
    }

    /// Deletes a vector from its owning shard; `NotFound` when absent.
    pub fn delete_vector(&self, id: &str) -> Result<()> {
        let nodes = self.nodes.write();
        nodes[node_index(id, nodes.len())].delete_vector(id)
    }

    /// Merges a metadata patch into a stored vector.
    pub fn patch_vector_metadata(&self, id: &str, patch: &HashMap<String, String>) -> Result<()> {
        let nodes = self.nodes.write();
        nodes[node_index(id, nodes.len())].patch_vector_metadata(id, patch)
    }

    /// Best-effort batch fetch across shards: each id is routed to its
    /// owner; missing ids are skipped, other failures abort.
    pub fn get_vectors(&self, ids: &[String]) -> Result<Vec<Vector>> {
        let nodes = self.nodes.read();
        let mut vectors = Vec::with_capacity(ids.len());
        for id in ids {
            match nodes[node_index(id, nodes.len())].get_vector(id) {
                Ok(vector) => vectors.push(vector),
                Err(Error::NotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(vectors)
    }

    /// Fetches every vector from every shard. Cross-shard order is
    /// undefined; decode failures abort.
    pub fn get_all_vectors(&self) -> Result<Vec<Vector>> {
        let nodes = self.nodes.read();
        let mut vectors = Vec::new();
        for node in nodes.iter() {
            for envelope in node.scan()? {
                if let Envelope::Vector(vector) = envelope? {
                    vectors.push(vector);
                }
            }
        }
        Ok(vectors)
    }

    /// Stores an object on its owning shard.
    pub fn insert_object(&self, object: &Object) -> Result<()> {
        let nodes = self.nodes.write();
        nodes[node_index(&object.id, nodes.len())].put_object(object)
    }

    /// Fetches an object from its owning shard.
    pub fn get_object(&self, id: &str) -> Result<Object> {
        let nodes = self.nodes.read();
        nodes[node_index(id, nodes.len())].get_object(id)
    }

    /// Deletes an object from its owning shard; `NotFound` when absent.
    pub fn delete_object(&self, id: &str) -> Result<()> {
        let nodes = self.nodes.write();
        nodes[node_index(id, nodes.len())].delete_object(id)
    }

    /// Merges a metadata patch into a stored object.
    pub fn patch_object_metadata(&self, id: &str, patch: &HashMap<String, String>) -> Result<()> {
        let nodes = self.nodes.write();
        nodes[node_index(id, nodes.len())].patch_object_metadata(id, patch)
    }

    /// Fetches every object from every shard.
    pub fn get_all_objects(&self) -> Result<Vec<Object>> {
        let nodes = self.nodes.read();
        let mut objects = Vec::new();
        for node in nodes.iter() {
            for envelope in node.scan()? {
                if let Envelope::Object(object) = envelope? {
                    objects.push(object);
                }
            }
        }
        Ok(objects)
    }

    /// Snapshots every shard's scan and chains them into one lazily decoded
    /// sequence of envelopes. Used by the index rebuild, which tolerates
    /// undecodable entries.
    pub fn scan_all(&self) -> Result<impl Iterator<Item = Result<Envelope>>> {
        let nodes = self.nodes.read();
        let mut scans: Vec<Scan> = Vec::with_capacity(nodes.len());
        for node in nodes.iter() {
            scans.push(node.scan()?);
        }
        Ok(scans.into_iter().flatten())
    }
}
