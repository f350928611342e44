//! Blocking HTTP client for the geotrigger backend
//!
//! A minimal JSON-over-HTTP client. Request and response shapes mirror
//! the types in [`crate::model`]; there is no retry logic here — the
//! engine decides what a failed call means.

use std::time::Duration;

use serde::Serialize;

use crate::backend::GeoBackend;
use crate::error::Result;
use crate::model::{
    AuthorizationStatus, Beacon, BeaconId, BeaconSession, DeviceRef, LocationSample, Region,
    RegionId, RegionSession, TriggerKind,
};

#[derive(Serialize)]
struct TriggerBody<'a> {
    device_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    region_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    beacon_id: Option<&'a str>,
    kind: TriggerKind,
}

#[derive(Serialize)]
struct DeviceLocationBody<'a> {
    location: Option<&'a LocationSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<&'a str>,
    auth_status: AuthorizationStatus,
}

/// Client for the geotrigger REST backend
#[derive(Debug, Clone)]
pub struct GeoClient {
    agent: ureq::Agent,
    base_url: String,
}

impl GeoClient {
    /// Create a client with default timeouts
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeouts(base_url, Duration::from_secs(5), Duration::from_secs(10))
    }

    /// Create a client with explicit connect/read timeouts
    pub fn with_timeouts(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect_timeout)
                .timeout_read(read_timeout)
                .build(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn post_json(&self, path: &str, body: &impl Serialize) -> Result<()> {
        self.agent.post(&self.url(path)).send_json(body)?;
        Ok(())
    }
}

impl GeoBackend for GeoClient {
    fn nearby_regions(&self, latitude: f64, longitude: f64) -> Result<Vec<Region>> {
        let regions = self
            .agent
            .get(&self.url("regions/nearby"))
            .query("lat", &latitude.to_string())
            .query("lon", &longitude.to_string())
            .call()?
            .into_json::<Vec<Region>>()?;
        Ok(regions)
    }

    fn beacons_for_region(&self, region: &RegionId) -> Result<Vec<Beacon>> {
        let beacons = self
            .agent
            .get(&self.url(&format!("regions/{}/beacons", region)))
            .call()?
            .into_json::<Vec<Beacon>>()?;
        Ok(beacons)
    }

    fn region_trigger(
        &self,
        device: &DeviceRef,
        region: &RegionId,
        kind: TriggerKind,
    ) -> Result<()> {
        self.post_json(
            "triggers/region",
            &TriggerBody {
                device_id: &device.id,
                region_id: Some(region.as_str()),
                beacon_id: None,
                kind,
            },
        )
    }

    fn beacon_trigger(
        &self,
        device: &DeviceRef,
        beacon: &BeaconId,
        kind: TriggerKind,
    ) -> Result<()> {
        self.post_json(
            "triggers/beacon",
            &TriggerBody {
                device_id: &device.id,
                region_id: None,
                beacon_id: Some(beacon.as_str()),
                kind,
            },
        )
    }

    fn update_device_location(
        &self,
        device: &DeviceRef,
        sample: Option<&LocationSample>,
        country: Option<&str>,
        auth: AuthorizationStatus,
    ) -> Result<()> {
        let body = DeviceLocationBody {
            location: sample,
            country,
            auth_status: auth,
        };
        self.agent
            .put(&self.url(&format!("devices/{}/location", device.id)))
            .send_json(&body)?;
        Ok(())
    }

    fn submit_region_session(&self, session: &RegionSession) -> Result<()> {
        self.post_json("events/region-session", session)
    }

    fn submit_beacon_session(&self, session: &BeaconSession) -> Result<()> {
        self.post_json("events/beacon-session", session)
    }
}
