//! Region transition handling
//!
//! Native geofence signals are trusted for circular regions. For
//! polygon regions the native subscription only covers a coarse
//! boundary, so an enter signal never commits on its own: it requests
//! a fresh fix, and membership follows from evaluating the polygon
//! against real fixes. Exits are trusted for both shapes.

use geotrigger_api::model::{LocationSample, Region, RegionId, TriggerKind};
use geotrigger_state::geometry;

use crate::beacons;
use crate::context::EngineContext;
use crate::reporter;
use crate::worker::WorkerState;

pub(crate) fn native_enter(ctx: &EngineContext, ws: &mut WorkerState, region_id: &RegionId) {
    let Some(region) = ctx.store.read().region(region_id).cloned() else {
        tracing::warn!("Enter signal for non-cached region {}, ignoring", region_id);
        return;
    };

    if ctx.store.read().is_entered(region_id) {
        tracing::debug!("Region {} already entered, ignoring enter signal", region_id);
        return;
    }

    if region.geometry.is_polygon() {
        // Coarse boundary signal; polygon membership commits only
        // through fix-driven evaluation
        tracing::debug!("Requesting confirming fix for polygon region {}", region_id);
        ctx.locations.request_single_fix();
        return;
    }

    commit_enter(ctx, ws, &region);
}

pub(crate) fn native_exit(ctx: &EngineContext, ws: &mut WorkerState, region_id: &RegionId) {
    let Some(region) = ctx.store.read().region(region_id).cloned() else {
        tracing::warn!("Exit signal for non-cached region {}, ignoring", region_id);
        return;
    };

    if !ctx.store.read().is_entered(region_id) {
        tracing::debug!("Region {} not entered, ignoring exit signal", region_id);
        return;
    }

    commit_exit(ctx, ws, &region);
}

/// Evaluate every monitored polygon region against a fix
///
/// Containment is authoritative here: a fix inside commits an enter
/// and a fix outside commits an exit, regardless of what the coarse
/// native boundary last said.
pub(crate) fn evaluate_polygons(ctx: &EngineContext, ws: &mut WorkerState, sample: &LocationSample) {
    let point = sample.coordinate();
    // Bind before the loop so the read guard is released; the body
    // takes the write lock on the same thread
    let polygon_regions = ctx.store.read().polygon_regions();
    for region in polygon_regions {
        let inside = geometry::contains(&region, &point);
        let entered = ctx.store.read().is_entered(&region.id);

        if inside && !entered {
            commit_enter(ctx, ws, &region);
        } else if !inside && entered {
            commit_exit(ctx, ws, &region);
        }
    }
}

/// Report an enter trigger and, once acknowledged, flip membership
pub(crate) fn commit_enter(ctx: &EngineContext, ws: &mut WorkerState, region: &Region) {
    if !reporter::report_region(ctx, &region.id, TriggerKind::Enter) {
        tracing::debug!("Enter for {} not committed, will retry on next detection", region.id);
        return;
    }

    ctx.store.write().mark_entered(&region.id);
    ctx.persist();
    ws.sessions.start_region(region.id.clone(), ws.last_fix.clone());

    if region.major.is_some() {
        beacons::start_region_beacons(ctx, ws, region);
    }

    tracing::info!("Entered region {} ({})", region.id, region.name);
    ctx.notify(|l| l.on_region_entered(region));
}

/// Report an exit trigger and, once acknowledged, flip membership
pub(crate) fn commit_exit(ctx: &EngineContext, ws: &mut WorkerState, region: &Region) {
    if !reporter::report_region(ctx, &region.id, TriggerKind::Exit) {
        tracing::debug!("Exit for {} not committed, will retry on next detection", region.id);
        return;
    }

    ctx.store.write().mark_exited(&region.id);
    ctx.persist();

    if let Some(session) = ws.sessions.stop_region(&region.id) {
        reporter::submit_region_session(ctx, session);
    }

    if ws.beacon_region.as_ref() == Some(&region.id) {
        beacons::stop_region_beacons(ctx, ws, &region.id);
    }

    tracing::info!("Exited region {} ({})", region.id, region.name);
    ctx.notify(|l| l.on_region_exited(region));
}

/// Stop monitoring a region the synchronizer found stale
///
/// An entered stale region gets a synthesized exit first so the host
/// never sees a region vanish while still inside it. Only the trigger
/// and the membership flip are confirmation-gated; session and beacon
/// teardown happen regardless, since once the region leaves the
/// monitored set nothing can ever close its session or release its
/// scanner.
pub(crate) fn force_exit(ctx: &EngineContext, ws: &mut WorkerState, region: &Region) {
    if ctx.store.read().is_entered(&region.id) {
        commit_exit(ctx, ws, region);
    }

    if ws.sessions.stop_region(&region.id).is_some() {
        tracing::debug!("Discarding unconfirmed session for stale region {}", region.id);
    }
    if ws.beacon_region.as_ref() == Some(&region.id) {
        beacons::stop_region_beacons(ctx, ws, &region.id);
    }

    ctx.locations.unsubscribe_region(&region.id);
    ctx.store.write().remove_region(&region.id);
    tracing::debug!("Stopped monitoring stale region {}", region.id);
}
