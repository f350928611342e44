//! Beacon monitoring and ranging
//!
//! Beacon monitoring is scoped to a single entered region at a time.
//! Entering a region with a major id fetches its beacons and arms the
//! scanner with the fetched list plus a synthetic "main" beacon that
//! represents the region itself; the main beacon's enter and exit bound
//! the beacon session. Ranging results bucket into proximity classes
//! and feed the open session through the observation de-dup.

use geotrigger_api::model::{Beacon, BeaconId, Proximity, Region, RegionId, TriggerKind};

use crate::context::EngineContext;
use crate::platform::RangedBeacon;
use crate::reporter;
use crate::worker::WorkerState;

/// The synthetic beacon bounding a region's beacon session
fn main_beacon(region: &Region, major: u32) -> Beacon {
    Beacon {
        id: BeaconId::from(&region.id),
        name: region.name.clone(),
        major,
        minor: None,
        triggers: false,
        proximity: Proximity::Unknown,
    }
}

pub(crate) fn start_region_beacons(ctx: &EngineContext, ws: &mut WorkerState, region: &Region) {
    let Some(scanner) = ctx.beacons.as_ref() else {
        tracing::debug!("No beacon scanner wired, skipping beacons for {}", region.id);
        return;
    };
    if !ctx.permissions.bluetooth() {
        tracing::debug!("Bluetooth not granted, skipping beacons for {}", region.id);
        return;
    }
    let Some(major) = region.major else {
        return;
    };

    // One beacon region at a time
    if let Some(current) = ws.beacon_region.clone() {
        if current == region.id {
            tracing::debug!("Beacons for {} already monitored", region.id);
            return;
        }
        stop_region_beacons(ctx, ws, &current);
    }

    let fetched = match ctx.backend.beacons_for_region(&region.id) {
        Ok(beacons) => beacons,
        Err(e) => {
            tracing::warn!("Failed to fetch beacons for {}: {}", region.id, e);
            return;
        }
    };

    let mut monitored = vec![main_beacon(region, major)];
    monitored.extend(fetched.into_iter().filter(|b| b.triggers));

    ctx.store.write().replace_beacons(monitored.clone());
    ctx.persist();
    scanner.start_monitoring(region, &monitored);
    ws.beacon_region = Some(region.id.clone());
    tracing::info!(
        "Monitoring {} beacon(s) for region {}",
        monitored.len(),
        region.id
    );
}

pub(crate) fn stop_region_beacons(ctx: &EngineContext, ws: &mut WorkerState, region_id: &RegionId) {
    if ws.beacon_region.as_ref() != Some(region_id) {
        return;
    }

    if let Some(scanner) = ctx.beacons.as_ref() {
        scanner.stop_monitoring(region_id);
    }

    if let Some(session) = ws.sessions.stop_beacon(region_id) {
        reporter::submit_beacon_session(ctx, session);
    }

    ctx.store.write().clear_beacons();
    ctx.persist();
    ws.beacon_region = None;
    tracing::info!("Stopped beacon monitoring for region {}", region_id);
}

pub(crate) fn native_enter(ctx: &EngineContext, ws: &mut WorkerState, beacon_id: &BeaconId) {
    let Some(beacon) = ctx.store.read().beacon(beacon_id).cloned() else {
        tracing::warn!("Enter signal for non-cached beacon {}, ignoring", beacon_id);
        return;
    };

    if ctx.store.read().is_beacon_entered(beacon_id) {
        tracing::debug!("Beacon {} already entered, ignoring enter signal", beacon_id);
        return;
    }

    if beacon.is_main() {
        // The main beacon fires no trigger; it opens the session
        ctx.store.write().mark_beacon_entered(beacon_id);
        ctx.persist();
        ws.sessions.start_beacon(RegionId::new(beacon_id.as_str()));
        tracing::info!("Entered main beacon for region {}", beacon_id);
        ctx.notify(|l| l.on_beacon_entered(&beacon));
        return;
    }

    if !reporter::report_beacon(ctx, beacon_id, TriggerKind::Enter) {
        tracing::debug!("Enter for beacon {} not committed, will retry on next detection", beacon_id);
        return;
    }

    ctx.store.write().mark_beacon_entered(beacon_id);
    ctx.persist();
    tracing::info!("Entered beacon {} ({})", beacon_id, beacon.name);
    ctx.notify(|l| l.on_beacon_entered(&beacon));
}

pub(crate) fn native_exit(ctx: &EngineContext, ws: &mut WorkerState, beacon_id: &BeaconId) {
    let Some(beacon) = ctx.store.read().beacon(beacon_id).cloned() else {
        tracing::warn!("Exit signal for non-cached beacon {}, ignoring", beacon_id);
        return;
    };

    if !ctx.store.read().is_beacon_entered(beacon_id) {
        tracing::debug!("Beacon {} not entered, ignoring exit signal", beacon_id);
        return;
    }

    if beacon.is_main() {
        ctx.store.write().mark_beacon_exited(beacon_id);
        ctx.persist();
        if let Some(session) = ws.sessions.stop_beacon(&RegionId::new(beacon_id.as_str())) {
            reporter::submit_beacon_session(ctx, session);
        }
        tracing::info!("Exited main beacon for region {}", beacon_id);
        ctx.notify(|l| l.on_beacon_exited(&beacon));
        return;
    }

    if !reporter::report_beacon(ctx, beacon_id, TriggerKind::Exit) {
        tracing::debug!("Exit for beacon {} not committed, will retry on next detection", beacon_id);
        return;
    }

    ctx.store.write().mark_beacon_exited(beacon_id);
    ctx.persist();
    tracing::info!("Exited beacon {} ({})", beacon_id, beacon.name);
    ctx.notify(|l| l.on_beacon_exited(&beacon));
}

/// Apply a batch of ranging results
///
/// Observations without a usable distance are discarded. The rest
/// update the cached proximity of their beacon and feed the open beacon
/// session; the listener sees only beacons actually updated by this
/// batch.
pub(crate) fn handle_ranged(ctx: &EngineContext, ws: &mut WorkerState, ranged: &[RangedBeacon]) {
    let mut updated: Vec<Beacon> = Vec::new();

    for observation in ranged {
        let Some(distance) = observation.distance_m.filter(|d| *d >= 0.0) else {
            tracing::debug!(
                "Discarding unresolved ranging for major {} minor {:?}",
                observation.major,
                observation.minor
            );
            continue;
        };

        let proximity = ctx.config.bucket(distance);
        let mut store = ctx.store.write();
        if !store.update_proximity(observation.major, observation.minor, proximity) {
            tracing::debug!(
                "Ranged unmonitored beacon major {} minor {:?}, ignoring",
                observation.major,
                observation.minor
            );
            continue;
        }
        if let Some(beacon) = store.beacon_by_identifiers(observation.major, observation.minor) {
            updated.push(beacon.clone());
        }
    }

    for beacon in &updated {
        ws.sessions.record_observation(beacon);
    }

    if !updated.is_empty() {
        ctx.notify(|l| l.on_beacons_ranged(&updated));
    }
}
