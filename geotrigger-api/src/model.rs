//! Wire model shared by the backend client and the monitoring engine
//!
//! Everything in this module serializes with serde and is treated as
//! immutable once fetched; a re-fetch replaces values wholesale rather
//! than merging.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a geographic region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(String);

impl RegionId {
    /// Creates a new RegionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        RegionId::new(s)
    }
}

impl From<String> for RegionId {
    fn from(s: String) -> Self {
        RegionId::new(s)
    }
}

/// Unique identifier for a beacon
///
/// The synthetic "main" beacon of a region reuses the region's id, so
/// conversions from [`RegionId`] are provided.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeaconId(String);

impl BeaconId {
    /// Creates a new BeaconId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BeaconId {
    fn from(s: &str) -> Self {
        BeaconId::new(s)
    }
}

impl From<&RegionId> for BeaconId {
    fn from(id: &RegionId) -> Self {
        BeaconId::new(id.as_str())
    }
}

/// Reference to the registered device on whose behalf triggers are sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRef {
    /// Backend-assigned device identifier
    pub id: String,
}

impl DeviceRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// A WGS84 coordinate pair, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Region geometry, exactly one of circular or polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// Circle around a center point
    Circle {
        center: Coordinate,
        /// Radius in meters
        radius_m: f64,
    },
    /// Closed ring of vertices; the last vertex implicitly connects to
    /// the first
    Polygon { vertices: Vec<Coordinate> },
}

impl Geometry {
    /// Whether this geometry is a polygon
    pub fn is_polygon(&self) -> bool {
        matches!(self, Geometry::Polygon { .. })
    }
}

/// A named geographic area a device can be inside or outside of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    /// Beacon-region major id; regions without one carry no beacons
    pub major: Option<u32>,
    pub geometry: Geometry,
}

// ============================================================================
// Beacons
// ============================================================================

/// Proximity bucket for a ranged beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proximity {
    Immediate,
    Near,
    Far,
    Unknown,
}

/// A short-range Bluetooth proximity marker associated with a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beacon {
    pub id: BeaconId,
    pub name: String,
    pub major: u32,
    /// `None` denotes the synthetic "main" beacon representing the
    /// parent region itself
    pub minor: Option<u32>,
    /// Whether enter/exit should fire backend triggers
    pub triggers: bool,
    /// Mutable, updated by ranging
    pub proximity: Proximity,
}

impl Beacon {
    /// Whether this is the main beacon bounding a beacon session
    pub fn is_main(&self) -> bool {
        self.minor.is_none()
    }
}

// ============================================================================
// Location samples
// ============================================================================

/// A validated location fix from the platform location provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    /// Horizontal accuracy in meters
    pub accuracy: Option<f64>,
    /// Meters per second
    pub speed: Option<f64>,
    /// Degrees from true north
    pub course: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    /// Minimal sample with only a coordinate and the current time
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
            speed: None,
            course: None,
            timestamp: Utc::now(),
        }
    }

    /// Coordinate validity invariant; invalid samples must be discarded
    /// before reaching any tracker
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// The sample's coordinate pair
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Location permission state reported alongside device-location updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    /// Background and precise location granted
    Always,
    /// Foreground-only location
    WhenInUse,
    Denied,
}

/// Enter or exit, for trigger reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Enter,
    Exit,
}

// ============================================================================
// Sessions
// ============================================================================

/// A time-bounded record of a single visit to a region
///
/// Created on confirmed region enter, closed on confirmed exit, then
/// submitted as one aggregate event and discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSession {
    pub region_id: RegionId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// Append-only while the session is open
    pub locations: Vec<LocationSample>,
}

/// A single ranging observation recorded into a beacon session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconObservation {
    pub beacon_id: BeaconId,
    pub proximity: Proximity,
    pub timestamp: DateTime<Utc>,
}

/// A time-bounded record of a single visit to a beacon-enabled region
///
/// Opened by the main beacon entering, closed by the main beacon
/// exiting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconSession {
    /// The beacon-region's parent
    pub region_id: RegionId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub beacons: Vec<BeaconObservation>,
}
