//! State and geometry layer for the geotrigger SDK
//!
//! Pure, synchronous building blocks consumed by the engine:
//!
//! - [`geometry`] — containment tests for circular and polygon regions
//! - [`store`] — the monitored/entered sets and the nearby-list diff
//! - [`session`] — region/beacon visit sessions with observation de-dup
//! - [`snapshot`] — JSON persistence over a host key/value store
//!
//! Nothing here performs I/O beyond the [`snapshot::StateBackend`]
//! collaborator, and nothing is internally synchronized; serialization
//! of mutations is the engine's responsibility.

pub mod error;
pub mod geometry;
pub mod session;
pub mod snapshot;
pub mod store;

pub use error::{Result, StateError};
pub use session::SessionBook;
pub use snapshot::{MemoryBackend, StateBackend};
pub use store::{MonitoringState, RegionDiff};
