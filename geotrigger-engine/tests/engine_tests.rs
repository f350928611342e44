//! End-to-end engine tests against in-memory collaborators
//!
//! Every scenario drives the manager through its public entry points
//! and uses `flush()` to wait for the worker before asserting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use geotrigger_engine::{
    ApiError, AuthorizationStatus, Beacon, BeaconId, BeaconScanner, BeaconSession, Coordinate,
    DeviceRef, EngineConfig, EngineError, GeoBackend, Geocoder, GeofenceListener, GeofenceManager,
    Geometry, LocationProvider, LocationSample, MemoryBackend, PermissionOracle, Platform,
    Proximity, RangedBeacon, Region, RegionId, RegionSession, TriggerKind,
};

// ============================================================================
// In-memory collaborators
// ============================================================================

#[derive(Default)]
struct MockBackend {
    nearby: Mutex<Vec<Region>>,
    beacons: Mutex<Vec<Beacon>>,
    fail_triggers: AtomicBool,
    region_triggers: Mutex<Vec<(RegionId, TriggerKind)>>,
    beacon_triggers: Mutex<Vec<(BeaconId, TriggerKind)>>,
    region_sessions: Mutex<Vec<RegionSession>>,
    beacon_sessions: Mutex<Vec<BeaconSession>>,
    location_updates: Mutex<Vec<Option<LocationSample>>>,
}

impl GeoBackend for MockBackend {
    fn nearby_regions(&self, _latitude: f64, _longitude: f64) -> Result<Vec<Region>, ApiError> {
        Ok(self.nearby.lock().clone())
    }

    fn beacons_for_region(&self, _region: &RegionId) -> Result<Vec<Beacon>, ApiError> {
        Ok(self.beacons.lock().clone())
    }

    fn region_trigger(
        &self,
        _device: &DeviceRef,
        region: &RegionId,
        kind: TriggerKind,
    ) -> Result<(), ApiError> {
        if self.fail_triggers.load(Ordering::SeqCst) {
            return Err(ApiError::Http(503));
        }
        self.region_triggers.lock().push((region.clone(), kind));
        Ok(())
    }

    fn beacon_trigger(
        &self,
        _device: &DeviceRef,
        beacon: &BeaconId,
        kind: TriggerKind,
    ) -> Result<(), ApiError> {
        if self.fail_triggers.load(Ordering::SeqCst) {
            return Err(ApiError::Http(503));
        }
        self.beacon_triggers.lock().push((beacon.clone(), kind));
        Ok(())
    }

    fn update_device_location(
        &self,
        _device: &DeviceRef,
        sample: Option<&LocationSample>,
        _country: Option<&str>,
        _auth: AuthorizationStatus,
    ) -> Result<(), ApiError> {
        self.location_updates.lock().push(sample.cloned());
        Ok(())
    }

    fn submit_region_session(&self, session: &RegionSession) -> Result<(), ApiError> {
        self.region_sessions.lock().push(session.clone());
        Ok(())
    }

    fn submit_beacon_session(&self, session: &BeaconSession) -> Result<(), ApiError> {
        self.beacon_sessions.lock().push(session.clone());
        Ok(())
    }
}

#[derive(Default)]
struct MockLocations {
    subscribed: Mutex<Vec<RegionId>>,
    unsubscribed: Mutex<Vec<RegionId>>,
    fix_requests: Mutex<usize>,
}

impl LocationProvider for MockLocations {
    fn subscribe_region(&self, region: &Region) {
        self.subscribed.lock().push(region.id.clone());
    }

    fn unsubscribe_region(&self, region_id: &RegionId) {
        self.unsubscribed.lock().push(region_id.clone());
    }

    fn request_single_fix(&self) {
        *self.fix_requests.lock() += 1;
    }
}

#[derive(Default)]
struct MockScanner {
    started: Mutex<Vec<(RegionId, Vec<Beacon>)>>,
    stopped: Mutex<Vec<RegionId>>,
}

impl BeaconScanner for MockScanner {
    fn start_monitoring(&self, region: &Region, beacons: &[Beacon]) {
        self.started.lock().push((region.id.clone(), beacons.to_vec()));
    }

    fn stop_monitoring(&self, region_id: &RegionId) {
        self.stopped.lock().push(region_id.clone());
    }
}

struct AllGranted;

impl PermissionOracle for AllGranted {
    fn foreground_location(&self) -> bool {
        true
    }
    fn background_location(&self) -> bool {
        true
    }
    fn precise_location(&self) -> bool {
        true
    }
    fn bluetooth(&self) -> bool {
        true
    }
}

struct ForegroundOnly;

impl PermissionOracle for ForegroundOnly {
    fn foreground_location(&self) -> bool {
        true
    }
    fn background_location(&self) -> bool {
        false
    }
    fn precise_location(&self) -> bool {
        true
    }
    fn bluetooth(&self) -> bool {
        false
    }
}

struct NoGeocoder;

impl Geocoder for NoGeocoder {
    fn country_code(&self, _latitude: f64, _longitude: f64) -> Option<String> {
        None
    }
}

#[derive(Default)]
struct RecordingListener {
    entered: Mutex<Vec<RegionId>>,
    exited: Mutex<Vec<RegionId>>,
    beacon_entered: Mutex<Vec<BeaconId>>,
    beacon_exited: Mutex<Vec<BeaconId>>,
    ranged: Mutex<Vec<Vec<Beacon>>>,
}

impl GeofenceListener for RecordingListener {
    fn on_region_entered(&self, region: &Region) {
        self.entered.lock().push(region.id.clone());
    }

    fn on_region_exited(&self, region: &Region) {
        self.exited.lock().push(region.id.clone());
    }

    fn on_beacon_entered(&self, beacon: &Beacon) {
        self.beacon_entered.lock().push(beacon.id.clone());
    }

    fn on_beacon_exited(&self, beacon: &Beacon) {
        self.beacon_exited.lock().push(beacon.id.clone());
    }

    fn on_beacons_ranged(&self, beacons: &[Beacon]) {
        self.ranged.lock().push(beacons.to_vec());
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn circle(id: &str, lat: f64, lon: f64, radius_m: f64) -> Region {
    Region {
        id: RegionId::new(id),
        name: id.to_string(),
        major: None,
        geometry: Geometry::Circle {
            center: Coordinate::new(lat, lon),
            radius_m,
        },
    }
}

fn beacon_region(id: &str, major: u32) -> Region {
    Region {
        major: Some(major),
        ..circle(id, 40.0, -8.0, 500.0)
    }
}

fn square(id: &str) -> Region {
    Region {
        id: RegionId::new(id),
        name: id.to_string(),
        major: None,
        geometry: Geometry::Polygon {
            vertices: vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Coordinate::new(1.0, 1.0),
                Coordinate::new(1.0, 0.0),
            ],
        },
    }
}

struct Harness {
    manager: GeofenceManager,
    backend: Arc<MockBackend>,
    locations: Arc<MockLocations>,
    scanner: Arc<MockScanner>,
    listener: Arc<RecordingListener>,
}

fn harness_with(permissions: Arc<dyn PermissionOracle>, device: Option<DeviceRef>) -> Harness {
    // Best effort; only the first test in the process wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let backend = Arc::new(MockBackend::default());
    let locations = Arc::new(MockLocations::default());
    let scanner = Arc::new(MockScanner::default());
    let listener = Arc::new(RecordingListener::default());

    let manager = GeofenceManager::new(
        EngineConfig::default(),
        device,
        backend.clone(),
        Platform {
            locations: locations.clone(),
            beacons: Some(scanner.clone()),
            permissions,
            geocoder: Arc::new(NoGeocoder),
            persistence: Arc::new(MemoryBackend::new()),
        },
    );
    manager.add_listener(listener.clone());

    Harness {
        manager,
        backend,
        locations,
        scanner,
        listener,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(AllGranted), Some(DeviceRef::new("device-1")))
}

// ============================================================================
// Lifecycle and synchronization
// ============================================================================

#[test]
fn test_enable_requests_cold_start_fix() {
    let h = harness();
    h.manager.enable().unwrap();
    h.manager.flush().unwrap();

    assert_eq!(*h.locations.fix_requests.lock(), 1);
}

#[test]
fn test_first_fix_synchronizes_regions() {
    let h = harness();
    *h.backend.nearby.lock() = vec![circle("a", 40.0, -8.0, 100.0), circle("b", 41.0, -8.0, 100.0)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.5, -8.0))
        .unwrap();
    h.manager.flush().unwrap();

    assert_eq!(h.manager.monitored_regions().len(), 2);
    let subscribed = h.locations.subscribed.lock();
    assert!(subscribed.contains(&RegionId::new("a")));
    assert!(subscribed.contains(&RegionId::new("b")));
    // The device location was pushed upstream
    assert_eq!(h.backend.location_updates.lock().len(), 1);
}

#[test]
fn test_displacement_gate_skips_nearby_fixes() {
    let h = harness();
    *h.backend.nearby.lock() = vec![circle("a", 40.0, -8.0, 100.0)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    // ~11m north, well under the 100m threshold
    h.manager
        .handle_location_update(LocationSample::at(40.0001, -8.0))
        .unwrap();
    h.manager.flush().unwrap();

    assert_eq!(h.backend.location_updates.lock().len(), 1);

    // ~1.1km north passes the gate
    h.manager
        .handle_location_update(LocationSample::at(40.01, -8.0))
        .unwrap();
    h.manager.flush().unwrap();
    assert_eq!(h.backend.location_updates.lock().len(), 2);
}

#[test]
fn test_sync_diff_leaves_overlap_untouched() {
    let h = harness();
    *h.backend.nearby.lock() = vec![circle("a", 40.0, -8.0, 100.0), circle("b", 41.0, -8.0, 100.0)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.flush().unwrap();

    // Second sync drops "a", keeps "b", adds "c"
    *h.backend.nearby.lock() = vec![circle("b", 41.0, -8.0, 100.0), circle("c", 42.0, -8.0, 100.0)];
    h.manager
        .handle_location_update(LocationSample::at(41.0, -8.0))
        .unwrap();
    h.manager.flush().unwrap();

    let monitored: Vec<RegionId> = h.manager.monitored_regions().iter().map(|r| r.id.clone()).collect();
    assert_eq!(monitored.len(), 2);
    assert!(monitored.contains(&RegionId::new("b")));
    assert!(monitored.contains(&RegionId::new("c")));

    // "b" was subscribed exactly once and never unsubscribed
    let subscribed = h.locations.subscribed.lock();
    assert_eq!(subscribed.iter().filter(|id| **id == RegionId::new("b")).count(), 1);
    assert_eq!(*h.locations.unsubscribed.lock(), vec![RegionId::new("a")]);
}

#[test]
fn test_stale_region_teardown_survives_failed_exit_trigger() {
    let h = harness();
    *h.backend.nearby.lock() = vec![beacon_region("shop", 7)];
    *h.backend.beacons.lock() = vec![minor_beacon("b1", 7, 1)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.handle_region_enter(RegionId::new("shop")).unwrap();
    h.manager.handle_beacon_enter(BeaconId::new("shop")).unwrap();
    h.manager.flush().unwrap();

    // The region drops out of the nearby list while the trigger
    // endpoint is down
    h.backend.fail_triggers.store(true, Ordering::SeqCst);
    *h.backend.nearby.lock() = vec![];
    h.manager
        .handle_location_update(LocationSample::at(41.0, -8.0))
        .unwrap();
    h.manager.flush().unwrap();

    // Teardown is not gated on the rejected exit trigger
    assert!(h.manager.monitored_regions().is_empty());
    assert!(h.manager.entered_region_ids().is_empty());
    assert!(h.manager.monitored_beacons().is_empty());
    assert_eq!(*h.scanner.stopped.lock(), vec![RegionId::new("shop")]);
    assert_eq!(*h.locations.unsubscribed.lock(), vec![RegionId::new("shop")]);
    // The unconfirmed region session is discarded; the beacon session
    // closes with the scanner and is submitted
    assert!(h.backend.region_sessions.lock().is_empty());
    assert_eq!(h.backend.beacon_sessions.lock().len(), 1);

    // No orphaned session is left accumulating fixes
    h.manager
        .handle_location_update(LocationSample::at(41.01, -8.0))
        .unwrap();
    h.manager.flush().unwrap();
    assert!(h.backend.region_sessions.lock().is_empty());
}

#[test]
fn test_foreground_only_skips_region_sync() {
    let h = harness_with(Arc::new(ForegroundOnly), Some(DeviceRef::new("device-1")));
    *h.backend.nearby.lock() = vec![circle("a", 40.0, -8.0, 100.0)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.flush().unwrap();

    // Location still pushed, but no regions fetched or subscribed
    assert_eq!(h.backend.location_updates.lock().len(), 1);
    assert!(h.manager.monitored_regions().is_empty());
    assert!(h.locations.subscribed.lock().is_empty());
}

#[test]
fn test_disable_forgets_everything() {
    let h = harness();
    *h.backend.nearby.lock() = vec![beacon_region("a", 7)];
    *h.backend.beacons.lock() = vec![minor_beacon("b1", 7, 1)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.handle_region_enter(RegionId::new("a")).unwrap();
    h.manager.handle_beacon_enter(BeaconId::new("a")).unwrap();
    h.manager.disable().unwrap();
    h.manager.flush().unwrap();

    assert!(h.manager.monitored_regions().is_empty());
    assert!(h.manager.entered_region_ids().is_empty());
    assert!(h.manager.monitored_beacons().is_empty());
    assert_eq!(*h.locations.unsubscribed.lock(), vec![RegionId::new("a")]);
    assert_eq!(*h.scanner.stopped.lock(), vec![RegionId::new("a")]);
    // Device location cleared upstream
    assert_eq!(h.backend.location_updates.lock().last(), Some(&None));
    // Open sessions of both kinds were discarded, not submitted
    assert!(h.backend.region_sessions.lock().is_empty());
    assert!(h.backend.beacon_sessions.lock().is_empty());
}

// ============================================================================
// Region transitions
// ============================================================================

#[test]
fn test_circular_enter_and_exit_with_session() {
    let h = harness();
    *h.backend.nearby.lock() = vec![circle("a", 40.0, -8.0, 100.0)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.handle_region_enter(RegionId::new("a")).unwrap();
    h.manager.flush().unwrap();

    assert_eq!(h.manager.entered_region_ids(), vec![RegionId::new("a")]);
    assert_eq!(*h.listener.entered.lock(), vec![RegionId::new("a")]);
    assert_eq!(
        *h.backend.region_triggers.lock(),
        vec![(RegionId::new("a"), TriggerKind::Enter)]
    );

    h.manager.handle_region_exit(RegionId::new("a")).unwrap();
    h.manager.flush().unwrap();

    assert!(h.manager.entered_region_ids().is_empty());
    assert_eq!(*h.listener.exited.lock(), vec![RegionId::new("a")]);

    // One closed session, seeded with the fix that preceded the enter
    let sessions = h.backend.region_sessions.lock();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].region_id, RegionId::new("a"));
    assert!(sessions[0].end.is_some());
    assert_eq!(sessions[0].locations.len(), 1);
}

#[test]
fn test_duplicate_enter_is_idempotent() {
    let h = harness();
    *h.backend.nearby.lock() = vec![circle("a", 40.0, -8.0, 100.0)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.handle_region_enter(RegionId::new("a")).unwrap();
    h.manager.handle_region_enter(RegionId::new("a")).unwrap();
    h.manager.flush().unwrap();

    assert_eq!(h.backend.region_triggers.lock().len(), 1);
    assert_eq!(h.listener.entered.lock().len(), 1);
}

#[test]
fn test_enter_for_unknown_region_is_ignored() {
    let h = harness();
    h.manager.enable().unwrap();
    h.manager.handle_region_enter(RegionId::new("ghost")).unwrap();
    h.manager.flush().unwrap();

    assert!(h.manager.entered_region_ids().is_empty());
    assert!(h.backend.region_triggers.lock().is_empty());
}

#[test]
fn test_membership_waits_for_backend_ack() {
    let h = harness();
    *h.backend.nearby.lock() = vec![circle("a", 40.0, -8.0, 100.0)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();

    h.backend.fail_triggers.store(true, Ordering::SeqCst);
    h.manager.handle_region_enter(RegionId::new("a")).unwrap();
    h.manager.flush().unwrap();

    // Rejected trigger leaves membership unchanged
    assert!(h.manager.entered_region_ids().is_empty());
    assert!(h.listener.entered.lock().is_empty());

    // The next detection retries and commits
    h.backend.fail_triggers.store(false, Ordering::SeqCst);
    h.manager.handle_region_enter(RegionId::new("a")).unwrap();
    h.manager.flush().unwrap();

    assert_eq!(h.manager.entered_region_ids(), vec![RegionId::new("a")]);
}

#[test]
fn test_no_device_commits_locally() {
    let h = harness_with(Arc::new(AllGranted), None);
    *h.backend.nearby.lock() = vec![circle("a", 40.0, -8.0, 100.0)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.handle_region_enter(RegionId::new("a")).unwrap();
    h.manager.flush().unwrap();

    // Membership tracked, nothing reported
    assert_eq!(h.manager.entered_region_ids(), vec![RegionId::new("a")]);
    assert!(h.backend.region_triggers.lock().is_empty());
    assert!(h.backend.location_updates.lock().is_empty());
}

// ============================================================================
// Polygon confirmation
// ============================================================================

#[test]
fn test_polygon_enter_waits_for_confirming_fix() {
    let h = harness();
    *h.backend.nearby.lock() = vec![square("poly")];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(0.5, 0.5))
        .unwrap();
    h.manager.flush().unwrap();
    // The first fix already confirmed containment
    assert_eq!(h.manager.entered_region_ids(), vec![RegionId::new("poly")]);
}

#[test]
fn test_polygon_coarse_enter_not_confirmed_outside() {
    let h = harness();
    *h.backend.nearby.lock() = vec![square("poly")];

    h.manager.enable().unwrap();
    // First fix is outside the square (but within coarse range)
    h.manager
        .handle_location_update(LocationSample::at(2.0, 0.5))
        .unwrap();
    h.manager.handle_region_enter(RegionId::new("poly")).unwrap();
    h.manager.flush().unwrap();

    // Coarse signal alone never commits a polygon enter
    assert!(h.manager.entered_region_ids().is_empty());
    // The engine asked for a confirming fix (beyond the cold-start one)
    assert_eq!(*h.locations.fix_requests.lock(), 2);

    // A fix outside drops the pending enter; a fix inside commits it
    h.manager
        .handle_location_update(LocationSample::at(2.0, 0.6))
        .unwrap();
    h.manager.flush().unwrap();
    assert!(h.manager.entered_region_ids().is_empty());

    h.manager
        .handle_location_update(LocationSample::at(0.5, 0.5))
        .unwrap();
    h.manager.flush().unwrap();
    assert_eq!(h.manager.entered_region_ids(), vec![RegionId::new("poly")]);
}

#[test]
fn test_polygon_exit_on_fix_outside() {
    let h = harness();
    *h.backend.nearby.lock() = vec![square("poly")];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(0.5, 0.5))
        .unwrap();
    h.manager.flush().unwrap();
    assert_eq!(h.manager.entered_region_ids(), vec![RegionId::new("poly")]);

    h.manager
        .handle_location_update(LocationSample::at(2.0, 0.5))
        .unwrap();
    h.manager.flush().unwrap();

    assert!(h.manager.entered_region_ids().is_empty());
    assert_eq!(*h.listener.exited.lock(), vec![RegionId::new("poly")]);
}

// ============================================================================
// Beacons
// ============================================================================

fn minor_beacon(id: &str, major: u32, minor: u32) -> Beacon {
    Beacon {
        id: BeaconId::new(id),
        name: id.to_string(),
        major,
        minor: Some(minor),
        triggers: true,
        proximity: Proximity::Unknown,
    }
}

#[test]
fn test_region_enter_arms_beacon_monitoring() {
    let h = harness();
    *h.backend.nearby.lock() = vec![beacon_region("shop", 7)];
    *h.backend.beacons.lock() = vec![
        minor_beacon("b1", 7, 1),
        // Non-triggering beacons are not monitored
        Beacon {
            triggers: false,
            ..minor_beacon("b2", 7, 2)
        },
    ];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.handle_region_enter(RegionId::new("shop")).unwrap();
    h.manager.flush().unwrap();

    let started = h.scanner.started.lock();
    assert_eq!(started.len(), 1);
    let (region_id, beacons) = &started[0];
    assert_eq!(region_id, &RegionId::new("shop"));
    // Main beacon first, then the triggering minor beacon
    assert_eq!(beacons.len(), 2);
    assert!(beacons[0].is_main());
    assert_eq!(beacons[0].id, BeaconId::new("shop"));
    assert_eq!(beacons[1].id, BeaconId::new("b1"));

    assert_eq!(h.manager.monitored_beacons().len(), 2);
}

#[test]
fn test_main_beacon_bounds_session_without_triggers() {
    let h = harness();
    *h.backend.nearby.lock() = vec![beacon_region("shop", 7)];
    *h.backend.beacons.lock() = vec![minor_beacon("b1", 7, 1)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.handle_region_enter(RegionId::new("shop")).unwrap();

    // Main beacon opens the session; no beacon trigger fires
    h.manager.handle_beacon_enter(BeaconId::new("shop")).unwrap();
    // The minor beacon fires a trigger
    h.manager.handle_beacon_enter(BeaconId::new("b1")).unwrap();
    h.manager.flush().unwrap();

    assert_eq!(
        *h.backend.beacon_triggers.lock(),
        vec![(BeaconId::new("b1"), TriggerKind::Enter)]
    );
    assert_eq!(h.manager.entered_beacon_ids().len(), 2);
    assert_eq!(h.listener.beacon_entered.lock().len(), 2);

    // Ranging feeds the open session
    h.manager
        .handle_ranged_beacons(vec![RangedBeacon {
            major: 7,
            minor: Some(1),
            distance_m: Some(0.5),
        }])
        .unwrap();
    h.manager.handle_beacon_exit(BeaconId::new("shop")).unwrap();
    h.manager.flush().unwrap();

    let sessions = h.backend.beacon_sessions.lock();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].region_id, RegionId::new("shop"));
    assert!(sessions[0].end.is_some());
    assert_eq!(sessions[0].beacons.len(), 1);
    assert_eq!(sessions[0].beacons[0].proximity, Proximity::Immediate);
    assert_eq!(*h.listener.beacon_exited.lock(), vec![BeaconId::new("shop")]);
}

#[test]
fn test_ranging_updates_proximity_and_notifies() {
    let h = harness();
    *h.backend.nearby.lock() = vec![beacon_region("shop", 7)];
    *h.backend.beacons.lock() = vec![minor_beacon("b1", 7, 1)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.handle_region_enter(RegionId::new("shop")).unwrap();

    h.manager
        .handle_ranged_beacons(vec![
            RangedBeacon {
                major: 7,
                minor: Some(1),
                distance_m: Some(5.0),
            },
            // Unresolved distance is discarded
            RangedBeacon {
                major: 7,
                minor: Some(1),
                distance_m: None,
            },
            // Unknown beacon is ignored
            RangedBeacon {
                major: 9,
                minor: Some(9),
                distance_m: Some(1.0),
            },
        ])
        .unwrap();
    h.manager.flush().unwrap();

    let monitored = h.manager.monitored_beacons();
    let b1 = monitored.iter().find(|b| b.id == BeaconId::new("b1")).unwrap();
    assert_eq!(b1.proximity, Proximity::Near);

    let ranged = h.listener.ranged.lock();
    assert_eq!(ranged.len(), 1);
    assert_eq!(ranged[0].len(), 1);
    assert_eq!(ranged[0][0].id, BeaconId::new("b1"));
}

#[test]
fn test_region_exit_stops_beacon_monitoring() {
    let h = harness();
    *h.backend.nearby.lock() = vec![beacon_region("shop", 7)];
    *h.backend.beacons.lock() = vec![minor_beacon("b1", 7, 1)];

    h.manager.enable().unwrap();
    h.manager
        .handle_location_update(LocationSample::at(40.0, -8.0))
        .unwrap();
    h.manager.handle_region_enter(RegionId::new("shop")).unwrap();
    h.manager.handle_beacon_enter(BeaconId::new("shop")).unwrap();
    h.manager.handle_region_exit(RegionId::new("shop")).unwrap();
    h.manager.flush().unwrap();

    assert_eq!(*h.scanner.stopped.lock(), vec![RegionId::new("shop")]);
    assert!(h.manager.monitored_beacons().is_empty());
    // The open beacon session was closed and submitted with the exit
    assert_eq!(h.backend.beacon_sessions.lock().len(), 1);
}

// ============================================================================
// Input validation
// ============================================================================

#[test]
fn test_invalid_location_is_rejected_at_the_facade() {
    let h = harness();
    h.manager.enable().unwrap();

    let result = h.manager.handle_location_update(LocationSample::at(91.0, 0.0));
    assert!(matches!(
        result,
        Err(EngineError::InvalidLocation { latitude, .. }) if latitude == 91.0
    ));
}
