//! Monitoring synchronizer
//!
//! Keeps the monitored region set aligned with what the backend knows
//! to be nearby. Runs at most once per displacement threshold, pushes
//! the device location upstream, and applies the fetched list as a
//! minimal diff: stale regions are force-exited and unsubscribed,
//! fresh regions subscribed, overlapping regions left untouched.

use geotrigger_api::model::LocationSample;
use geotrigger_state::geometry;

use crate::context::EngineContext;
use crate::regions;
use crate::worker::WorkerState;

pub(crate) fn maybe_synchronize(ctx: &EngineContext, ws: &mut WorkerState, sample: &LocationSample) {
    if !displaced(ctx, ws, sample) {
        return;
    }

    let country = ctx.geocoder.country_code(sample.latitude, sample.longitude);

    if let Ok(device) = ctx.require_device() {
        if let Err(e) = ctx.backend.update_device_location(
            device,
            Some(sample),
            country.as_deref(),
            ctx.auth_status(),
        ) {
            tracing::warn!("Failed to push device location: {}", e);
        }
    }

    if !(ctx.permissions.background_location() && ctx.permissions.precise_location()) {
        tracing::debug!("Foreground-only authorization, skipping region sync");
        ws.last_synced = Some(sample.clone());
        return;
    }

    let nearby = match ctx.backend.nearby_regions(sample.latitude, sample.longitude) {
        Ok(regions) => regions,
        Err(e) => {
            // last_synced stays put so the next fix retries
            tracing::warn!("Nearby-region fetch failed, will retry on next fix: {}", e);
            return;
        }
    };

    let diff = ctx.store.read().diff_regions(&nearby);
    tracing::info!(
        "Region sync: {} nearby, {} fresh, {} stale",
        nearby.len(),
        diff.fresh.len(),
        diff.stale.len()
    );

    for region in &diff.stale {
        regions::force_exit(ctx, ws, region);
    }

    for region in diff.fresh {
        ctx.locations.subscribe_region(&region);
        ctx.store.write().insert_region(region);
    }

    ctx.persist();
    ws.last_synced = Some(sample.clone());
}

/// Displacement gate: the first fix always passes
fn displaced(ctx: &EngineContext, ws: &WorkerState, sample: &LocationSample) -> bool {
    match &ws.last_synced {
        None => true,
        Some(previous) => {
            let distance =
                geometry::distance_meters(&previous.coordinate(), &sample.coordinate());
            distance > ctx.config.displacement_threshold_m
        }
    }
}
