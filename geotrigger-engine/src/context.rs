//! Shared collaborator context
//!
//! One [`EngineContext`] is constructed per [`crate::GeofenceManager`]
//! and handed to the worker; every component operates through it. There
//! are no process-wide singletons.

use std::sync::Arc;

use parking_lot::RwLock;

use geotrigger_api::model::{AuthorizationStatus, DeviceRef};
use geotrigger_api::GeoBackend;
use geotrigger_state::{snapshot, MonitoringState, StateBackend};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::platform::{BeaconScanner, Geocoder, GeofenceListener, LocationProvider, PermissionOracle};

pub(crate) struct EngineContext {
    pub config: EngineConfig,
    pub device: Option<DeviceRef>,
    pub backend: Arc<dyn GeoBackend>,
    /// Worker-written, facade-read; the worker is the only writer
    pub store: Arc<RwLock<MonitoringState>>,
    pub persistence: Arc<dyn StateBackend>,
    pub locations: Arc<dyn LocationProvider>,
    /// Beacon support is an optional capability resolved at construction
    pub beacons: Option<Arc<dyn BeaconScanner>>,
    pub permissions: Arc<dyn PermissionOracle>,
    pub geocoder: Arc<dyn Geocoder>,
    pub listeners: Arc<RwLock<Vec<Arc<dyn GeofenceListener>>>>,
}

impl EngineContext {
    /// The registered device, or a typed not-ready signal
    pub fn require_device(&self) -> Result<&DeviceRef> {
        self.device.as_ref().ok_or(EngineError::NotReady)
    }

    /// Notify every listener from a snapshot of the current list
    ///
    /// The snapshot means listeners added or removed during delivery
    /// take effect on the next notification, never mid-pass.
    pub fn notify<F>(&self, deliver: F)
    where
        F: Fn(&dyn GeofenceListener),
    {
        let snapshot: Vec<Arc<dyn GeofenceListener>> = self.listeners.read().clone();
        for listener in snapshot {
            deliver(listener.as_ref());
        }
    }

    /// Persist the monitored/entered sets; failures are logged only
    pub fn persist(&self) {
        let state = self.store.read();
        if let Err(e) = snapshot::save(&state, self.persistence.as_ref()) {
            tracing::warn!("Failed to persist monitoring snapshot: {}", e);
        }
    }

    /// Authorization status derived from the current permission grants
    pub fn auth_status(&self) -> AuthorizationStatus {
        if self.permissions.background_location() && self.permissions.precise_location() {
            AuthorizationStatus::Always
        } else if self.permissions.foreground_location() {
            AuthorizationStatus::WhenInUse
        } else {
            AuthorizationStatus::Denied
        }
    }
}
