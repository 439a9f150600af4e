//! Cosine similarity between records.
//!
//! Two records are comparable only when their compression states agree and
//! their embeddings have equal length; violating either is a
//! `DimensionMismatch`. Quantized components are dequantized with their own
//! record's parameters before the standard formula, so two records quantized
//! on different grids still compare in real space. Compressed records
//! without parameters (pruned or sparse) compare on their stored values.

use crate::error::{Error, Result};
use crate::record::Vector;

/// Computes the cosine similarity of two records' embeddings.
///
/// A zero norm on either side yields 0.0, never NaN.
pub fn cosine_similarity(a: &Vector, b: &Vector) -> Result<f64> {
    if a.compressed != b.compressed {
        return Err(Error::DimensionMismatch(
            "cannot compare compressed and uncompressed embeddings".into(),
        ));
    }
    if a.embedding.len() != b.embedding.len() {
        return Err(Error::DimensionMismatch(format!(
            "embedding lengths differ: {} vs {}",
            a.embedding.len(),
            b.embedding.len()
        )));
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (&x, &y) in a.embedding.iter().zip(b.embedding.iter()) {
        let x = real_value(a, x);
        let y = real_value(b, y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Maps a stored component back to real space when the record carries
/// quantization parameters.
fn real_value(record: &Vector, value: f64) -> f64 {
    match &record.quantization {
        Some(params) => params.dequantize(value),
        None => value,
    }
}
