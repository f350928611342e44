//! Backend contract consumed by the monitoring engine
//!
//! The engine only ever talks to the backend through [`GeoBackend`], so
//! tests can substitute an in-memory implementation and the transport
//! can evolve independently of the engine.

use crate::error::Result;
use crate::model::{
    AuthorizationStatus, Beacon, BeaconId, BeaconSession, DeviceRef, LocationSample, Region,
    RegionId, RegionSession, TriggerKind,
};

/// The backend endpoints the engine consumes
///
/// All calls are blocking; the engine invokes them from its single
/// worker thread, never from a platform callback thread.
pub trait GeoBackend: Send + Sync {
    /// Fetch the regions near a coordinate
    fn nearby_regions(&self, latitude: f64, longitude: f64) -> Result<Vec<Region>>;

    /// Fetch the candidate beacon list for a region
    fn beacons_for_region(&self, region: &RegionId) -> Result<Vec<Beacon>>;

    /// Report a confirmed region enter/exit
    fn region_trigger(&self, device: &DeviceRef, region: &RegionId, kind: TriggerKind)
        -> Result<()>;

    /// Report a confirmed beacon enter/exit
    fn beacon_trigger(&self, device: &DeviceRef, beacon: &BeaconId, kind: TriggerKind)
        -> Result<()>;

    /// Persist the device's location; `None` clears the stored location
    fn update_device_location(
        &self,
        device: &DeviceRef,
        sample: Option<&LocationSample>,
        country: Option<&str>,
        auth: AuthorizationStatus,
    ) -> Result<()>;

    /// Submit a closed region session as one aggregate event
    fn submit_region_session(&self, session: &RegionSession) -> Result<()>;

    /// Submit a closed beacon session as one aggregate event
    fn submit_beacon_session(&self, session: &BeaconSession) -> Result<()>;
}
