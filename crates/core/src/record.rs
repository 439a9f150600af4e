//! Core record types: the `Vector` entity and the opaque `Object` blob.
//!
//! A `Vector` is an identified f64 embedding with string metadata, optional
//! free-form text (consumed by the reranker), and an optional binary payload.
//! Its embedding may be lossily compressed in place by scalar quantization,
//! magnitude pruning, or sparse encoding; the `compressed` flag is true
//! exactly when at least one compression artifact is present, and records
//! are only comparable by cosine similarity when their compression states
//! agree.

use crate::error::{Error, Result};
use crate::quantization::QuantizationParameters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An identified embedding record, the primary unit of storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Caller-supplied unique identifier; primary key within its shard.
    pub id: String,
    /// Ordered embedding components. Dimension is per-record; there is no
    /// global schema.
    pub embedding: Vec<f64>,
    /// Arbitrary string key-value metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Free-form text consumed by the lexical reranker.
    #[serde(default)]
    pub text: String,
    /// Optional opaque payload, base64 in the serialized form.
    #[serde(default, with = "optional_base64")]
    pub object: Option<Vec<u8>>,
    /// True iff the embedding has undergone at least one of
    /// quantize / prune / sparsify.
    #[serde(default)]
    pub compressed: bool,
    /// Present iff the embedding is quantized.
    #[serde(default)]
    pub quantization: Option<QuantizationParameters>,
    /// Parallel to `embedding` when present; `true` marks a pruned-out
    /// component.
    #[serde(default)]
    pub pruning_mask: Option<Vec<bool>>,
    /// Original positions of the retained components when the embedding is
    /// stored sparsely; parallel to `embedding`.
    #[serde(default)]
    pub sparse_indices: Option<Vec<usize>>,
    /// Reranker score for the current query. Transient; never persisted.
    #[serde(skip)]
    pub relevance: f64,
}

impl Vector {
    /// Creates an uncompressed record with empty metadata and text.
    pub fn new(id: impl Into<String>, embedding: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            embedding,
            metadata: HashMap::new(),
            text: String::new(),
            object: None,
            compressed: false,
            quantization: None,
            pruning_mask: None,
            sparse_indices: None,
            relevance: 0.0,
        }
    }

    /// Checks the record invariants; violations are `InvalidArgument`.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::InvalidArgument("record id must not be empty".into()));
        }
        if let Some(mask) = &self.pruning_mask {
            if mask.len() != self.embedding.len() {
                return Err(Error::InvalidArgument(format!(
                    "pruning mask length {} does not match embedding length {}",
                    mask.len(),
                    self.embedding.len()
                )));
            }
        }
        if let Some(indices) = &self.sparse_indices {
            if indices.len() != self.embedding.len() {
                return Err(Error::InvalidArgument(format!(
                    "sparse index count {} does not match embedding length {}",
                    indices.len(),
                    self.embedding.len()
                )));
            }
        }
        if let Some(params) = &self.quantization {
            params.validate()?;
        }
        let has_artifact = self.quantization.is_some()
            || self.pruning_mask.is_some()
            || self.sparse_indices.is_some();
        if self.compressed != has_artifact {
            return Err(Error::InvalidArgument(format!(
                "compressed flag is {} but compression artifacts are {}",
                self.compressed,
                if has_artifact { "present" } else { "absent" }
            )));
        }
        Ok(())
    }

    /// Quantizes every embedding component in place and records the
    /// parameters.
    pub fn quantize(&mut self, params: QuantizationParameters) -> Result<()> {
        params.validate()?;
        for value in &mut self.embedding {
            *value = params.quantize(*value);
        }
        self.quantization = Some(params);
        self.compressed = true;
        Ok(())
    }

    /// Zeroes every component with magnitude below `threshold` and marks it
    /// in the pruning mask. Reuses an existing mask so repeated prunes
    /// accumulate.
    pub fn prune(&mut self, threshold: f64) {
        let mut mask = self
            .pruning_mask
            .take()
            .unwrap_or_else(|| vec![false; self.embedding.len()]);
        for (value, pruned) in self.embedding.iter_mut().zip(mask.iter_mut()) {
            if value.abs() < threshold {
                *value = 0.0;
                *pruned = true;
            }
        }
        self.pruning_mask = Some(mask);
        self.compressed = true;
    }

    /// Drops zero components, recording the original position of every
    /// retained one. A present pruning mask is filtered in parallel so it
    /// stays aligned with the retained components.
    pub fn sparsify(&mut self) {
        let mask = self.pruning_mask.take();
        let mut values = Vec::with_capacity(self.embedding.len());
        let mut indices = Vec::with_capacity(self.embedding.len());
        let mut kept_mask = mask.as_ref().map(|m| Vec::with_capacity(m.len()));
        for (position, &value) in self.embedding.iter().enumerate() {
            if value != 0.0 {
                values.push(value);
                indices.push(position);
                if let (Some(kept), Some(mask)) = (kept_mask.as_mut(), mask.as_ref()) {
                    kept.push(mask[position]);
                }
            }
        }
        self.embedding = values;
        self.sparse_indices = Some(indices);
        self.pruning_mask = kept_mask;
        self.compressed = true;
    }

    /// Scales the embedding to unit L2 norm, in place.
    ///
    /// The norm is taken over the representation the record actually holds:
    /// quantized records are dequantized, normalized, and requantized;
    /// pruned records normalize the non-pruned components only; sparse and
    /// plain records normalize their stored components directly. A zero
    /// norm leaves the record unchanged.
    pub fn normalize(&mut self) {
        if let Some(params) = self.quantization {
            let mut dense: Vec<f64> = self
                .embedding
                .iter()
                .map(|&value| params.dequantize(value))
                .collect();
            l2_normalize(&mut dense);
            for (slot, value) in self.embedding.iter_mut().zip(dense) {
                *slot = params.quantize(value);
            }
        } else if let Some(mask) = &self.pruning_mask {
            let norm = self
                .embedding
                .iter()
                .zip(mask.iter())
                .filter(|(_, &pruned)| !pruned)
                .map(|(value, _)| value * value)
                .sum::<f64>()
                .sqrt();
            if norm > 0.0 {
                for (value, &pruned) in self.embedding.iter_mut().zip(mask.iter()) {
                    if !pruned {
                        *value /= norm;
                    }
                }
            }
        } else {
            // Sparse storage keeps only nonzero components, so the dense
            // sparse representation and the plain case share this path.
            l2_normalize(&mut self.embedding);
        }
    }
}

fn l2_normalize(values: &mut [f64]) {
    let norm = values.iter().map(|value| value * value).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in values {
            *value /= norm;
        }
    }
}

/// An opaque blob with metadata, placed on shards by the same rule as
/// vectors and stored in the same key namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Caller-supplied unique identifier.
    pub id: String,
    /// Payload bytes, base64 in the serialized form.
    #[serde(default, with = "base64_bytes")]
    pub object: Vec<u8>,
    /// Arbitrary string key-value metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Object {
    /// Creates an object with empty metadata.
    pub fn new(id: impl Into<String>, object: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            object,
            metadata: HashMap::new(),
        }
    }
}

/// Serde helper: `Vec<u8>` as a base64 string.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Serde helper: `Option<Vec<u8>>` as an optional base64 string.
mod optional_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> QuantizationParameters {
        QuantizationParameters {
            min: -1.0,
            max: 1.0,
            bits: 8,
        }
    }

    #[test]
    fn validate_accepts_plain_record() {
        let vector = Vector::new("v1", vec![0.1, 0.2, 0.3]);
        assert!(vector.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_id() {
        let vector = Vector::new("", vec![0.1]);
        assert!(matches!(
            vector.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn validate_rejects_mask_length_mismatch() {
        let mut vector = Vector::new("v1", vec![0.1, 0.2]);
        vector.pruning_mask = Some(vec![false]);
        vector.compressed = true;
        assert!(vector.validate().is_err());
    }

    #[test]
    fn validate_rejects_incoherent_compressed_flag() {
        let mut with_artifact = Vector::new("v1", vec![0.1]);
        with_artifact.quantization = Some(params());
        assert!(with_artifact.validate().is_err());

        let mut bare_flag = Vector::new("v2", vec![0.1]);
        bare_flag.compressed = true;
        assert!(bare_flag.validate().is_err());
    }

    #[test]
    fn quantize_marks_record_compressed() {
        let mut vector = Vector::new("v1", vec![0.5, -0.5, 0.0]);
        vector.quantize(params()).unwrap();
        assert!(vector.compressed);
        assert_eq!(vector.quantization, Some(params()));
        assert_eq!(vector.embedding, vec![129.0, -127.0, 1.0]);
        assert!(vector.validate().is_ok());
    }

    #[test]
    fn prune_zeroes_small_components() {
        let mut vector = Vector::new("v1", vec![0.05, -0.4, 0.01, 0.9]);
        vector.prune(0.1);
        assert_eq!(vector.embedding, vec![0.0, -0.4, 0.0, 0.9]);
        assert_eq!(
            vector.pruning_mask,
            Some(vec![true, false, true, false])
        );
        assert!(vector.compressed);
        assert!(vector.validate().is_ok());
    }

    #[test]
    fn prune_accumulates_into_existing_mask() {
        let mut vector = Vector::new("v1", vec![0.05, 0.2, 0.9]);
        vector.prune(0.1);
        vector.prune(0.5);
        assert_eq!(vector.embedding, vec![0.0, 0.0, 0.9]);
        assert_eq!(vector.pruning_mask, Some(vec![true, true, false]));
    }

    #[test]
    fn sparsify_records_original_positions() {
        let mut vector = Vector::new("v1", vec![0.0, 0.7, 0.0, -0.2]);
        vector.sparsify();
        assert_eq!(vector.embedding, vec![0.7, -0.2]);
        assert_eq!(vector.sparse_indices, Some(vec![1, 3]));
        assert!(vector.compressed);
        assert!(vector.validate().is_ok());
    }

    #[test]
    fn sparsify_keeps_mask_parallel() {
        let mut vector = Vector::new("v1", vec![0.05, 0.7, 0.01, -0.2]);
        vector.prune(0.1);
        vector.sparsify();
        assert_eq!(vector.embedding, vec![0.7, -0.2]);
        assert_eq!(vector.sparse_indices, Some(vec![1, 3]));
        assert_eq!(vector.pruning_mask, Some(vec![false, false]));
        assert!(vector.validate().is_ok());
    }

    #[test]
    fn normalize_plain_is_unit_length() {
        let mut vector = Vector::new("v1", vec![3.0, 4.0]);
        vector.normalize();
        assert_eq!(vector.embedding, vec![0.6, 0.8]);
    }

    #[test]
    fn normalize_zero_vector_is_noop() {
        let mut vector = Vector::new("v1", vec![0.0, 0.0]);
        vector.normalize();
        assert_eq!(vector.embedding, vec![0.0, 0.0]);
    }

    #[test]
    fn normalize_pruned_skips_masked_components() {
        let mut vector = Vector::new("v1", vec![0.01, 3.0, 4.0]);
        vector.prune(0.1);
        vector.normalize();
        assert_eq!(vector.embedding[0], 0.0);
        assert!((vector.embedding[1] - 0.6).abs() < 1e-12);
        assert!((vector.embedding[2] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn normalize_quantized_round_trips_through_grid() {
        let mut vector = Vector::new("v1", vec![0.5, 0.5]);
        vector.quantize(params()).unwrap();
        vector.normalize();
        // Both components dequantize to the same value, so the normalized
        // dense form is (x, x) with unit norm, requantized onto the grid.
        assert_eq!(vector.embedding[0], vector.embedding[1]);
        assert!(vector.quantization.is_some());
    }

    #[test]
    fn envelope_fields_survive_serde_round_trip() {
        let mut vector = Vector::new("v1", vec![0.1, 0.2]);
        vector.metadata.insert("name".into(), "Vector 1".into());
        vector.text = "alpha beta".into();
        vector.object = Some(vec![1, 2, 3]);
        vector.relevance = 0.75;

        let json = serde_json::to_string(&vector).unwrap();
        // Blob bytes travel as base64, relevance does not travel at all.
        assert!(json.contains("\"AQID\""));
        assert!(!json.contains("relevance"));

        let back: Vector = serde_json::from_str(&json).unwrap();
        assert_eq!(back.object, Some(vec![1, 2, 3]));
        assert_eq!(back.relevance, 0.0);
        assert_eq!(back.text, "alpha beta");
    }

    #[test]
    fn object_bytes_round_trip_as_base64() {
        let object = Object::new("o1", b"payload".to_vec());
        let json = serde_json::to_string(&object).unwrap();
        let back: Object = serde_json::from_str(&json).unwrap();
        assert_eq!(back, object);
    }
}
