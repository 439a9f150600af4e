//! Single-shard store over an embedded ordered key-value database.
//!
//! A shard owns one database file and is authoritative for every key placed
//! on it. Values are [`Envelope`]s; vectors and objects share the key
//! namespace, and a lookup that finds the other kind reports `NotFound`.
//! Access follows a multi-reader / single-writer discipline: readers run in
//! parallel, writers exclude both readers and other writers, and each write
//! is atomic at the engine level.

use crate::error::{Error, Result};
use crate::record::{Object, Vector};
use crate::storage::envelope::Envelope;
use parking_lot::RwLock;
use rocksdb::{IteratorMode, Options, DB};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A single-node keyed store backed by an embedded database.
pub struct Shard {
    db: RwLock<DB>,
    path: PathBuf,
}

impl Shard {
    /// Opens (creating if missing) the shard database at `path`. The parent
    /// directory is created when absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, &path)?;
        tracing::debug!(path = %path.display(), "opened shard");
        Ok(Self {
            db: RwLock::new(db),
            path,
        })
    }

    /// Path of the underlying database.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stores a vector record, overwriting any previous record under its id.
    pub fn put_vector(&self, vector: &Vector) -> Result<()> {
        let bytes = Envelope::encode_vector(vector)?;
        let db = self.db.write();
        db.put(vector.id.as_bytes(), bytes)?;
        Ok(())
    }

    /// Fetches a vector record by id.
    pub fn get_vector(&self, id: &str) -> Result<Vector> {
        let db = self.db.read();
        fetch_vector(&db, id)
    }

    /// Deletes a vector record by id; `NotFound` when absent.
    pub fn delete_vector(&self, id: &str) -> Result<()> {
        let db = self.db.write();
        // The engine's delete is silent on missing keys, so presence (and
        // kind) is checked under the same write lock.
        fetch_vector(&db, id)?;
        db.delete(id.as_bytes())?;
        Ok(())
    }

    /// Merges `patch` into a stored vector's metadata: patch keys override,
    /// unmentioned keys survive. `NotFound` when the record is absent.
    pub fn patch_vector_metadata(&self, id: &str, patch: &HashMap<String, String>) -> Result<()> {
        let db = self.db.write();
        let mut vector = fetch_vector(&db, id)?;
        for (key, value) in patch {
            vector.metadata.insert(key.clone(), value.clone());
        }
        let bytes = Envelope::encode_vector(&vector)?;
        db.put(id.as_bytes(), bytes)?;
        Ok(())
    }

    /// Best-effort batch fetch: missing ids are skipped, any other failure
    /// aborts.
    pub fn get_many(&self, ids: &[String]) -> Result<Vec<Vector>> {
        let db = self.db.read();
        let mut vectors = Vec::with_capacity(ids.len());
        for id in ids {
            match fetch_vector(&db, id) {
                Ok(vector) => vectors.push(vector),
                Err(Error::NotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(vectors)
    }

    /// Stores an object record, overwriting any previous record under its id.
    pub fn put_object(&self, object: &Object) -> Result<()> {
        let bytes = Envelope::encode_object(object)?;
        let db = self.db.write();
        db.put(object.id.as_bytes(), bytes)?;
        Ok(())
    }

    /// Fetches an object record by id.
    pub fn get_object(&self, id: &str) -> Result<Object> {
        let db = self.db.read();
        fetch_object(&db, id)
    }

    /// Deletes an object record by id; `NotFound` when absent.
    pub fn delete_object(&self, id: &str) -> Result<()> {
        let db = self.db.write();
        fetch_object(&db, id)?;
        db.delete(id.as_bytes())?;
        Ok(())
    }

    /// Merges `patch` into a stored object's metadata.
    pub fn patch_object_metadata(&self, id: &str, patch: &HashMap<String, String>) -> Result<()> {
        let db = self.db.write();
        let mut object = fetch_object(&db, id)?;
        for (key, value) in patch {
            object.metadata.insert(key.clone(), value.clone());
        }
        let bytes = Envelope::encode_object(&object)?;
        db.put(id.as_bytes(), bytes)?;
        Ok(())
    }

    /// Produces a finite, restartable sequence of every stored envelope in
    /// key order.
    ///
    /// The raw values are snapshotted under a brief read lock; decoding is
    /// deferred to the returned iterator, so a rebuild can skip undecodable
    /// records without holding the shard lock. Restarting means calling
    /// `scan` again.
    pub fn scan(&self) -> Result<Scan> {
        let db = self.db.read();
        let mut values = Vec::new();
        for entry in db.iterator(IteratorMode::Start) {
            let (_key, value) = entry?;
            values.push(value);
        }
        Ok(Scan {
            values: values.into_iter(),
        })
    }
}

/// Lazily decoded key-ordered snapshot of one shard's records.
pub struct Scan {
    values: std::vec::IntoIter<Box<[u8]>>,
}

impl Iterator for Scan {
    type Item = Result<Envelope>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.values.next()?;
        Some(Envelope::decode(&bytes))
    }
}

fn fetch_vector(db: &DB, id: &str) -> Result<Vector> {
    let Some(bytes) = db.get(id.as_bytes())? else {
        return Err(Error::NotFound(id.into()));
    };
    match Envelope::decode(&bytes)? {
        Envelope::Vector(vector) => Ok(vector),
        Envelope::Object(_) => Err(Error::NotFound(id.into())),
    }
}

fn fetch_object(db: &DB, id: &str) -> Result<Object> {
    let Some(bytes) = db.get(id.as_bytes())? else {
        return Err(Error::NotFound(id.into()));
    };
    match Envelope::decode(&bytes)? {
        Envelope::Object(object) => Ok(object),
        Envelope::Vector(_) => Err(Error::NotFound(id.into())),
    }
}
