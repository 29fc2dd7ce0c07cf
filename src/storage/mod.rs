//! Local persistence
//!
//! The only state kept between runs is the previous ranking snapshot.

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotError, SnapshotStore};
