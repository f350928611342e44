//! Geofence and beacon-proximity monitoring engine
//!
//! The engine sits between a platform's location and Bluetooth
//! services and a geotrigger backend. Hosts construct a
//! [`GeofenceManager`] with their platform collaborators, feed it raw
//! signals (location fixes, native geofence enters and exits, beacon
//! ranging batches), and observe confirmed transitions through a
//! [`GeofenceListener`]. All state mutation and backend I/O runs on a
//! single background worker thread.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use geotrigger_engine::{EngineConfig, GeofenceManager, Platform};
//! use geotrigger_engine::{GeoClient, MemoryBackend};
//! # use geotrigger_engine::{LocationProvider, PermissionOracle, Geocoder};
//! # use geotrigger_engine::{Region, RegionId};
//! # struct NoopLocations;
//! # impl LocationProvider for NoopLocations {
//! #     fn subscribe_region(&self, _: &Region) {}
//! #     fn unsubscribe_region(&self, _: &RegionId) {}
//! #     fn request_single_fix(&self) {}
//! # }
//! # struct AllGranted;
//! # impl PermissionOracle for AllGranted {
//! #     fn foreground_location(&self) -> bool { true }
//! #     fn background_location(&self) -> bool { true }
//! #     fn precise_location(&self) -> bool { true }
//! #     fn bluetooth(&self) -> bool { false }
//! # }
//! # struct NoGeocoder;
//! # impl Geocoder for NoGeocoder {
//! #     fn country_code(&self, _: f64, _: f64) -> Option<String> { None }
//! # }
//!
//! let backend = Arc::new(GeoClient::new("https://api.example.com"));
//! let manager = GeofenceManager::new(
//!     EngineConfig::default(),
//!     None,
//!     backend,
//!     Platform {
//!         locations: Arc::new(NoopLocations),
//!         beacons: None,
//!         permissions: Arc::new(AllGranted),
//!         geocoder: Arc::new(NoGeocoder),
//!         persistence: Arc::new(MemoryBackend::new()),
//!     },
//! );
//!
//! manager.enable().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod platform;

mod beacons;
mod context;
mod regions;
mod reporter;
mod sync;
mod worker;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use manager::{GeofenceManager, Platform};
pub use platform::{
    BeaconScanner, Geocoder, GeofenceListener, LocationProvider, PermissionOracle, RangedBeacon,
};

// Re-export the wire model and collaborators hosts need to construct a
// manager without depending on the lower crates directly
pub use geotrigger_api::model::{
    AuthorizationStatus, Beacon, BeaconId, BeaconSession, Coordinate, DeviceRef, Geometry,
    LocationSample, Proximity, Region, RegionId, RegionSession, TriggerKind,
};
pub use geotrigger_api::{ApiError, GeoBackend, GeoClient};
pub use geotrigger_state::{MemoryBackend, StateBackend};
