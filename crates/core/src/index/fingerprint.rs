//! Bucket keys for the inverted value index.
//!
//! A scalar's fingerprint is its decimal form rounded to two fractional
//! digits with ties away from zero. All components within the same 0.01
//! grain share a bucket, which is what makes the index a cheap, lossy
//! candidate filter.

use crate::config::FINGERPRINT_SCALE;

/// Returns the bucket key for an embedding component.
///
/// The sign of negative zero is preserved (`-0.004` keys as `"-0.00"`), so
/// a component always rebuilds the same key it was indexed under.
pub fn fingerprint(value: f64) -> String {
    let scaled = (value * FINGERPRINT_SCALE).round();
    format!("{:.2}", scaled / FINGERPRINT_SCALE)
}
