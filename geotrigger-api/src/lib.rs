//! Typed backend API for the geotrigger SDK
//!
//! This crate owns the wire model (regions, beacons, location samples,
//! sessions) and a blocking JSON client for the backend endpoints the
//! monitoring engine consumes. The engine depends on the [`GeoBackend`]
//! trait rather than the concrete client, which keeps transport
//! concerns out of the state machines and makes them testable against
//! an in-memory backend.

pub mod backend;
pub mod client;
pub mod error;
pub mod model;

pub use backend::GeoBackend;
pub use client::GeoClient;
pub use error::{ApiError, Result};
pub use model::{
    AuthorizationStatus, Beacon, BeaconId, BeaconObservation, BeaconSession, Coordinate,
    DeviceRef, Geometry, LocationSample, Proximity, Region, RegionId, RegionSession, TriggerKind,
};
