//! # shardvec-core
//!
//! Horizontally sharded vector database engine: approximate nearest-neighbor
//! retrieval over f64 embeddings with a text-aware reranker, lossy
//! compression, and an auxiliary opaque-object store.
//!
//! This is the synchronous core library with zero async dependencies; the
//! HTTP transport lives in `shardvec-server`.
//!
//! ## Architecture
//!
//! ```text
//! search:  query → value-bucket index → candidates → cosine sort → dedup
//!            → top-k → storage fetch → lexical rerank → top-k
//! insert:  record → rendezvous placement → shard write → bucket append
//! startup: scan all shards → rebuild index (storage is the source of truth)
//! ```

/// Global configuration constants: limits, defaults, and tuning parameters.
pub mod config;
/// Error taxonomy and the crate-wide `Result` alias.
pub mod error;
/// Inverted value-bucket index and the two-stage search pipeline.
pub mod index;
/// Scalar quantization parameters and their pinned formulas.
pub mod quantization;
/// Core record types: `Vector`, `Object`, and the compression operations.
pub mod record;
/// Search primitives: cosine similarity and lexical reranking.
pub mod search;
/// Storage layer: per-shard embedded stores and rendezvous placement.
pub mod storage;
