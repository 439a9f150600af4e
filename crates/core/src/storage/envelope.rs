//! Self-describing record envelopes.
//!
//! Vectors and objects share a shard's key namespace, so every stored value
//! is tagged with its kind. Envelopes are JSON: the payload stays readable
//! with external tooling and decoding never depends on which kind a key was
//! written as.

use crate::error::Result;
use crate::record::{Object, Vector};
use serde::{Deserialize, Serialize};

/// A stored record: either an embedding vector or an opaque object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Envelope {
    /// An embedding record.
    Vector(Vector),
    /// An opaque blob record.
    Object(Object),
}

/// Borrowing counterpart of [`Envelope`] used on the write path, so records
/// can be encoded without cloning.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EnvelopeRef<'a> {
    Vector(&'a Vector),
    Object(&'a Object),
}

impl Envelope {
    /// Encodes a vector record as an envelope.
    pub fn encode_vector(vector: &Vector) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&EnvelopeRef::Vector(vector))?)
    }

    /// Encodes an object record as an envelope.
    pub fn encode_object(object: &Object) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&EnvelopeRef::Object(object))?)
    }

    /// Decodes an envelope from its serialized form.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
