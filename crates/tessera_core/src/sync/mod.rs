//! # Snapshot Views for Parallel Consumers
//!
//! ## The Problem
//!
//! ```text
//! Main thread:     add / remove components  (relocates packed data)
//! Worker threads:  read or update values    (must not see a relocation)
//! ```
//!
//! ## The Solution: Borrowed Snapshots
//!
//! A snapshot is a borrow of a store's packed arrays. Workers get copies of the
//! borrow; the main thread cannot mutate the store until all of them are dropped.
//! No locks, no copies, and the window is checked at compile time.

mod snapshot;

pub use snapshot::{IdView, OwnedSnapshot, Snapshot, SnapshotMut};
