//! Background worker thread
//!
//! Location fixes, native geofence signals, ranging results and
//! enable/disable requests arrive concurrently from independent
//! platform threads. The worker funnels all of them through one thread
//! so every read-modify-write of the monitoring state (check entered,
//! mutate, report) is atomic with respect to the others. Backend calls
//! run inside the same thread, so a fetch result is always applied
//! against the state as it exists when the response lands.

use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use geotrigger_api::model::{BeaconId, LocationSample, RegionId};
use geotrigger_state::SessionBook;

use crate::beacons;
use crate::context::EngineContext;
use crate::platform::RangedBeacon;
use crate::regions;
use crate::sync;

/// Commands sent from the sync facade to the background worker
#[derive(Debug)]
pub(crate) enum Command {
    Enable,
    Disable,
    Location(LocationSample),
    RegionEnter(RegionId),
    RegionExit(RegionId),
    BeaconEnter(BeaconId),
    BeaconExit(BeaconId),
    Ranged(Vec<RangedBeacon>),
    /// Acknowledged once every previously enqueued command has run
    Barrier(mpsc::Sender<()>),
    Shutdown,
}

/// Mutable state owned exclusively by the worker thread
pub(crate) struct WorkerState {
    pub enabled: bool,
    pub sessions: SessionBook,
    /// Most recent validated fix, used to seed new region sessions
    pub last_fix: Option<LocationSample>,
    /// Last fix accepted by the monitoring synchronizer
    pub last_synced: Option<LocationSample>,
    /// The single region currently driving beacon monitoring
    pub beacon_region: Option<RegionId>,
}

impl WorkerState {
    fn new(ctx: &EngineContext) -> Self {
        Self {
            enabled: false,
            sessions: SessionBook::new(ctx.config.observation_window),
            last_fix: None,
            last_synced: None,
            beacon_region: None,
        }
    }
}

/// Spawns the engine worker thread
pub(crate) fn spawn_engine_worker(
    ctx: Arc<EngineContext>,
    command_rx: mpsc::Receiver<Command>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut ws = WorkerState::new(&ctx);
        tracing::info!("Geofence worker started");

        while let Ok(command) = command_rx.recv() {
            match command {
                Command::Enable => handle_enable(&ctx, &mut ws),
                Command::Disable => handle_disable(&ctx, &mut ws),
                Command::Location(sample) => handle_location(&ctx, &mut ws, sample),
                Command::RegionEnter(id) => regions::native_enter(&ctx, &mut ws, &id),
                Command::RegionExit(id) => regions::native_exit(&ctx, &mut ws, &id),
                Command::BeaconEnter(id) => beacons::native_enter(&ctx, &mut ws, &id),
                Command::BeaconExit(id) => beacons::native_exit(&ctx, &mut ws, &id),
                Command::Ranged(observations) => {
                    beacons::handle_ranged(&ctx, &mut ws, &observations)
                }
                Command::Barrier(ack) => {
                    let _ = ack.send(());
                }
                Command::Shutdown => break,
            }
        }

        tracing::info!("Geofence worker shut down");
    })
}

fn handle_enable(ctx: &EngineContext, ws: &mut WorkerState) {
    if ws.enabled {
        tracing::debug!("Monitoring already enabled");
        return;
    }
    ws.enabled = true;

    if ctx.device.is_none() {
        tracing::info!("No registered device; monitoring runs geometry-only");
    }

    // Re-arm native subscriptions for regions restored from the
    // persisted snapshot
    if ctx.permissions.background_location() && ctx.permissions.precise_location() {
        for region in ctx.store.read().regions() {
            ctx.locations.subscribe_region(&region);
        }
    }

    // Cold start: the first fix passes the displacement gate and runs
    // the synchronizer
    ctx.locations.request_single_fix();
    tracing::info!("Monitoring enabled");
}

fn handle_disable(ctx: &EngineContext, ws: &mut WorkerState) {
    if !ws.enabled {
        tracing::debug!("Monitoring already disabled");
        return;
    }

    // Open sessions are discarded, not submitted: a disable is not an
    // exit. Clearing before the beacon teardown keeps the open beacon
    // session from being closed and submitted on the way down.
    ws.sessions.clear();

    if let Some(region_id) = ws.beacon_region.clone() {
        beacons::stop_region_beacons(ctx, ws, &region_id);
    }

    let regions = ctx.store.read().regions();
    for region in &regions {
        ctx.locations.unsubscribe_region(&region.id);
    }

    ctx.store.write().clear();
    geotrigger_state::snapshot::clear(ctx.persistence.as_ref());

    if let Ok(device) = ctx.require_device() {
        if let Err(e) =
            ctx.backend
                .update_device_location(device, None, None, ctx.auth_status())
        {
            tracing::warn!("Failed to clear device location: {}", e);
        }
    }

    ws.enabled = false;
    ws.last_fix = None;
    ws.last_synced = None;
    tracing::info!("Monitoring disabled, {} region(s) released", regions.len());
}

fn handle_location(ctx: &EngineContext, ws: &mut WorkerState, sample: LocationSample) {
    if !ws.enabled {
        tracing::debug!("Dropping location update while disabled");
        return;
    }

    ctx.notify(|l| l.on_location_updated(&sample));
    ws.last_fix = Some(sample.clone());

    // Fixes append to sessions already open; a session opened by this
    // very fix is seeded with it instead
    ws.sessions.record_location(&sample);

    // Synchronize first so regions fetched because of this fix are
    // evaluated against it
    sync::maybe_synchronize(ctx, ws, &sample);
    regions::evaluate_polygons(ctx, ws, &sample);
}
