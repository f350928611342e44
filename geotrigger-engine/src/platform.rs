//! Platform collaborator traits and the host-facing listener
//!
//! The engine never touches location or Bluetooth hardware; the host
//! wires in implementations of these traits. All of them may be called
//! from the engine's worker thread and must not block for long.

use geotrigger_api::model::{Beacon, LocationSample, Region, RegionId};

/// Platform location services
///
/// Implementations deliver validated location fixes and native
/// geofence enter/exit signals back into the engine through the
/// manager's `handle_*` entry points. For polygon regions, platform
/// geofencing APIs generally cannot represent the shape; providers are
/// expected to register a coarse boundary, whose imprecise enter
/// signals the engine confirms against a real fix before committing.
pub trait LocationProvider: Send + Sync {
    /// Register a native geofence subscription for a region
    fn subscribe_region(&self, region: &Region);

    /// Remove the native geofence subscription for a region
    fn unsubscribe_region(&self, region_id: &RegionId);

    /// Request one fresh fix, delivered asynchronously like any other
    /// location update
    fn request_single_fix(&self);
}

/// Platform beacon scanning
///
/// Optional capability; hosts without Bluetooth support simply do not
/// provide one and the engine skips beacon monitoring entirely.
pub trait BeaconScanner: Send + Sync {
    /// Start monitoring and ranging the given beacons for a region
    fn start_monitoring(&self, region: &Region, beacons: &[Beacon]);

    /// Stop monitoring beacons for a region
    fn stop_monitoring(&self, region_id: &RegionId);
}

/// Current capability grants, queried before every subscription pass
pub trait PermissionOracle: Send + Sync {
    fn foreground_location(&self) -> bool;
    fn background_location(&self) -> bool;
    fn precise_location(&self) -> bool;
    fn bluetooth(&self) -> bool;
}

/// Best-effort reverse geocoding for the device-location update
pub trait Geocoder: Send + Sync {
    /// ISO country code for a coordinate; `None` on any failure
    fn country_code(&self, latitude: f64, longitude: f64) -> Option<String>;
}

/// A single ranging result from the beacon scanner
///
/// `distance_m` of `None` (or a negative value) marks an observation
/// the hardware could not resolve; the engine discards it without
/// mutating state.
#[derive(Debug, Clone, PartialEq)]
pub struct RangedBeacon {
    pub major: u32,
    pub minor: Option<u32>,
    pub distance_m: Option<f64>,
}

/// Host-facing observer of confirmed engine events
///
/// All methods have empty default bodies so hosts implement only what
/// they care about. Delivery happens on the engine worker thread from
/// a snapshot of the listener list taken per notification.
pub trait GeofenceListener: Send + Sync {
    fn on_region_entered(&self, _region: &Region) {}
    fn on_region_exited(&self, _region: &Region) {}
    fn on_beacon_entered(&self, _beacon: &Beacon) {}
    fn on_beacon_exited(&self, _beacon: &Beacon) {}
    fn on_beacons_ranged(&self, _beacons: &[Beacon]) {}
    fn on_location_updated(&self, _sample: &LocationSample) {}
}
