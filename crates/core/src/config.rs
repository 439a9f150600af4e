//! Global configuration constants for shardvec.
//!
//! Tuning parameters and input validation limits live here as compile-time
//! constants; runtime configuration (port, data directory, shard count) is
//! handled via CLI arguments in the server binary.

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 3400;

/// Default directory holding the per-shard databases.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default number of shards opened at startup.
///
/// Shard membership is static for the process lifetime; changing the count
/// re-routes identifiers, so an existing data directory must be reopened
/// with the count it was created with.
pub const DEFAULT_SHARD_COUNT: usize = 8;

/// Graceful shutdown drain timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Scale factor for index bucket keys.
///
/// Embedding components are rounded to `1 / FINGERPRINT_SCALE` before being
/// formatted as bucket keys, so 100.0 gives the two-fractional-digit grain.
pub const FINGERPRINT_SCALE: f64 = 100.0;

/// Maximum allowed embedding dimension per record.
pub const MAX_DIMENSION: usize = 4096;

/// Maximum number of results (`k`) per search request.
pub const MAX_K: usize = 10_000;

/// Maximum HTTP request body size in bytes (32 MiB), which also caps
/// multipart object uploads.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;
