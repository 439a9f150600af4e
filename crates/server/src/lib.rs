//! shardvec-server: HTTP transport for shardvec.
//!
//! Provides the REST API over the sharded vector index and object store.
//! Core database logic lives in `shardvec-core`.

/// REST API layer: Axum router, HTTP handlers, request models, and errors.
pub mod api;
