//! Storage layer: per-shard embedded stores and rendezvous placement.
//!
//! Each shard wraps one embedded ordered key-value database holding
//! self-describing JSON envelopes. [`ShardedStorage`] fans CRUD out across a
//! static shard list, routing every identifier with XOR distance over
//! SHA-256 digests.

/// Self-describing serialized envelopes shared by vectors and objects.
pub mod envelope;
/// Rendezvous-style shard selection by hashed-identifier XOR distance.
pub mod placement;
/// Single-shard store over an embedded key-value database.
pub mod shard;
/// Fan-out layer routing CRUD across the static shard list.
pub mod sharded;

pub use envelope::Envelope;
pub use placement::node_index;
pub use shard::Shard;
pub use sharded::ShardedStorage;
