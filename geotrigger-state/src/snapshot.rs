//! Serialized snapshots of the monitoring state
//!
//! The host application supplies a key/value [`StateBackend`]; the
//! engine persists the monitored/entered sets after every committed
//! mutation and restores them at construction. Snapshots are plain JSON
//! with last-writer-wins semantics; no schema migration.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use geotrigger_api::model::{Beacon, BeaconId, Region, RegionId};

use crate::error::{Result, StateError};
use crate::store::MonitoringState;

const KEY_MONITORED_REGIONS: &str = "geotrigger.monitored_regions";
const KEY_ENTERED_REGIONS: &str = "geotrigger.entered_regions";
const KEY_MONITORED_BEACONS: &str = "geotrigger.monitored_beacons";
const KEY_ENTERED_BEACONS: &str = "geotrigger.entered_beacons";

/// Collaborator-backed key/value store for persisted engine state
pub trait StateBackend: Send + Sync {
    /// Read a value, `None` when absent
    fn load(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one
    fn store(&self, key: &str, value: &str);

    /// Delete a value
    fn remove(&self, key: &str);
}

/// In-memory backend for tests and hosts without persistence
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

#[derive(Serialize, Deserialize)]
struct RegionsSnapshot(Vec<Region>);

#[derive(Serialize, Deserialize)]
struct BeaconsSnapshot(Vec<Beacon>);

/// Persist the monitored/entered sets
pub fn save(state: &MonitoringState, backend: &dyn StateBackend) -> Result<()> {
    let regions = serde_json::to_string(&RegionsSnapshot(state.regions()))
        .map_err(|e| StateError::Snapshot(e.to_string()))?;
    let entered_regions = serde_json::to_string(&state.entered_region_ids())
        .map_err(|e| StateError::Snapshot(e.to_string()))?;
    let beacons = serde_json::to_string(&BeaconsSnapshot(state.beacons()))
        .map_err(|e| StateError::Snapshot(e.to_string()))?;
    let entered_beacons = serde_json::to_string(&state.entered_beacon_ids())
        .map_err(|e| StateError::Snapshot(e.to_string()))?;

    backend.store(KEY_MONITORED_REGIONS, &regions);
    backend.store(KEY_ENTERED_REGIONS, &entered_regions);
    backend.store(KEY_MONITORED_BEACONS, &beacons);
    backend.store(KEY_ENTERED_BEACONS, &entered_beacons);
    Ok(())
}

/// Restore a monitoring state from persisted snapshots
///
/// Missing keys restore as empty; a corrupt snapshot restores the
/// affected set as empty rather than failing the whole load.
pub fn load(backend: &dyn StateBackend) -> MonitoringState {
    let mut state = MonitoringState::new();

    if let Some(raw) = backend.load(KEY_MONITORED_REGIONS) {
        match serde_json::from_str::<RegionsSnapshot>(&raw) {
            Ok(snapshot) => {
                for region in snapshot.0 {
                    state.insert_region(region);
                }
            }
            Err(e) => tracing::warn!("Discarding corrupt monitored-regions snapshot: {}", e),
        }
    }

    if let Some(raw) = backend.load(KEY_ENTERED_REGIONS) {
        match serde_json::from_str::<Vec<RegionId>>(&raw) {
            Ok(ids) => {
                for id in ids {
                    // mark_entered keeps entered ⊆ monitored even if the
                    // snapshots disagree
                    state.mark_entered(&id);
                }
            }
            Err(e) => tracing::warn!("Discarding corrupt entered-regions snapshot: {}", e),
        }
    }

    if let Some(raw) = backend.load(KEY_MONITORED_BEACONS) {
        match serde_json::from_str::<BeaconsSnapshot>(&raw) {
            Ok(snapshot) => state.replace_beacons(snapshot.0),
            Err(e) => tracing::warn!("Discarding corrupt monitored-beacons snapshot: {}", e),
        }
    }

    if let Some(raw) = backend.load(KEY_ENTERED_BEACONS) {
        match serde_json::from_str::<Vec<BeaconId>>(&raw) {
            Ok(ids) => {
                for id in ids {
                    state.mark_beacon_entered(&id);
                }
            }
            Err(e) => tracing::warn!("Discarding corrupt entered-beacons snapshot: {}", e),
        }
    }

    state
}

/// Remove every persisted snapshot
pub fn clear(backend: &dyn StateBackend) {
    backend.remove(KEY_MONITORED_REGIONS);
    backend.remove(KEY_ENTERED_REGIONS);
    backend.remove(KEY_MONITORED_BEACONS);
    backend.remove(KEY_ENTERED_BEACONS);
}
