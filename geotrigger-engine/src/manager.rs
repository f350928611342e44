//! The host-facing monitoring facade
//!
//! [`GeofenceManager`] is the one public entry point. Every platform
//! signal and lifecycle request enqueues a command to the background
//! worker; the worker serializes all state mutation and backend I/O on
//! its own thread, so the facade methods return immediately. Monitored
//! and entered sets are readable synchronously through a shared lock.

use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use parking_lot::RwLock;

use geotrigger_api::model::{Beacon, BeaconId, DeviceRef, LocationSample, Region, RegionId};
use geotrigger_api::GeoBackend;
use geotrigger_state::{snapshot, MonitoringState, StateBackend};

use crate::config::EngineConfig;
use crate::context::EngineContext;
use crate::error::{EngineError, Result};
use crate::platform::{
    BeaconScanner, Geocoder, GeofenceListener, LocationProvider, PermissionOracle, RangedBeacon,
};
use crate::worker::{spawn_engine_worker, Command};

/// Platform collaborators wired in by the host at construction
pub struct Platform {
    pub locations: Arc<dyn LocationProvider>,
    /// Hosts without Bluetooth pass `None` and beacon monitoring is
    /// skipped entirely
    pub beacons: Option<Arc<dyn BeaconScanner>>,
    pub permissions: Arc<dyn PermissionOracle>,
    pub geocoder: Arc<dyn Geocoder>,
    pub persistence: Arc<dyn StateBackend>,
}

/// Geofence and beacon-proximity monitoring engine
pub struct GeofenceManager {
    command_tx: mpsc::Sender<Command>,
    store: Arc<RwLock<MonitoringState>>,
    listeners: Arc<RwLock<Vec<Arc<dyn GeofenceListener>>>>,
    _worker: JoinHandle<()>,
}

impl GeofenceManager {
    /// Create a manager, restoring any persisted monitoring snapshot
    ///
    /// `device` is `None` until the host registers one with the
    /// backend; the engine then tracks transitions locally without
    /// reporting triggers.
    pub fn new(
        config: EngineConfig,
        device: Option<DeviceRef>,
        backend: Arc<dyn GeoBackend>,
        platform: Platform,
    ) -> Self {
        let store = Arc::new(RwLock::new(snapshot::load(platform.persistence.as_ref())));
        let listeners: Arc<RwLock<Vec<Arc<dyn GeofenceListener>>>> =
            Arc::new(RwLock::new(Vec::new()));

        let ctx = Arc::new(EngineContext {
            config,
            device,
            backend,
            store: Arc::clone(&store),
            persistence: platform.persistence,
            locations: platform.locations,
            beacons: platform.beacons,
            permissions: platform.permissions,
            geocoder: platform.geocoder,
            listeners: Arc::clone(&listeners),
        });

        let (command_tx, command_rx) = mpsc::channel();
        let worker = spawn_engine_worker(ctx, command_rx);

        Self {
            command_tx,
            store,
            listeners,
            _worker: worker,
        }
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Register a listener for confirmed engine events
    pub fn add_listener(&self, listener: Arc<dyn GeofenceListener>) {
        self.listeners.write().push(listener);
    }

    /// Remove a previously registered listener (pointer identity)
    pub fn remove_listener(&self, listener: &Arc<dyn GeofenceListener>) {
        self.listeners.write().retain(|l| !Arc::ptr_eq(l, listener));
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start monitoring: re-arm persisted regions and request a fix
    pub fn enable(&self) -> Result<()> {
        self.send(Command::Enable)
    }

    /// Stop monitoring and forget all state, local and persisted
    ///
    /// Open sessions are discarded without submission and the device
    /// location is cleared upstream.
    pub fn disable(&self) -> Result<()> {
        self.send(Command::Disable)
    }

    // ========================================================================
    // Platform signal entry points
    // ========================================================================

    /// Feed a location fix from the platform provider
    pub fn handle_location_update(&self, sample: LocationSample) -> Result<()> {
        if !sample.is_valid() {
            return Err(EngineError::InvalidLocation {
                latitude: sample.latitude,
                longitude: sample.longitude,
            });
        }
        self.send(Command::Location(sample))
    }

    /// Feed a native geofence enter signal
    pub fn handle_region_enter(&self, region_id: RegionId) -> Result<()> {
        self.send(Command::RegionEnter(region_id))
    }

    /// Feed a native geofence exit signal
    pub fn handle_region_exit(&self, region_id: RegionId) -> Result<()> {
        self.send(Command::RegionExit(region_id))
    }

    /// Feed a native beacon-region enter signal
    pub fn handle_beacon_enter(&self, beacon_id: BeaconId) -> Result<()> {
        self.send(Command::BeaconEnter(beacon_id))
    }

    /// Feed a native beacon-region exit signal
    pub fn handle_beacon_exit(&self, beacon_id: BeaconId) -> Result<()> {
        self.send(Command::BeaconExit(beacon_id))
    }

    /// Feed a batch of ranging results from the beacon scanner
    pub fn handle_ranged_beacons(&self, beacons: Vec<RangedBeacon>) -> Result<()> {
        self.send(Command::Ranged(beacons))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Currently monitored regions
    pub fn monitored_regions(&self) -> Vec<Region> {
        self.store.read().regions()
    }

    /// Ids of regions the device is confirmed inside of
    pub fn entered_region_ids(&self) -> Vec<RegionId> {
        self.store.read().entered_region_ids()
    }

    /// Currently monitored beacons
    pub fn monitored_beacons(&self) -> Vec<Beacon> {
        self.store.read().beacons()
    }

    /// Ids of beacons the device is confirmed near
    pub fn entered_beacon_ids(&self) -> Vec<BeaconId> {
        self.store.read().entered_beacon_ids()
    }

    /// Block until every command enqueued before this call has run
    pub fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.send(Command::Barrier(ack_tx))?;
        ack_rx.recv().map_err(|_| EngineError::WorkerDisconnected)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| EngineError::WorkerDisconnected)
    }
}

impl Drop for GeofenceManager {
    fn drop(&mut self) {
        let _ = self.command_tx.send(Command::Shutdown);
    }
}
