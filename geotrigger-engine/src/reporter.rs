//! Trigger and session reporting
//!
//! Enters and exits commit locally only after the backend acknowledges
//! the trigger, so membership never drifts ahead of what the backend
//! has seen. The one exception is an unregistered device: with no
//! device there is nothing to report against, and the engine keeps
//! tracking transitions locally. Failed triggers are not queued; the
//! next native detection or fix evaluation retries naturally.

use geotrigger_api::model::{
    BeaconId, BeaconSession, RegionId, RegionSession, TriggerKind,
};

use crate::context::EngineContext;
use crate::error::EngineError;

/// Report a region trigger; returns whether the transition may commit
pub(crate) fn report_region(ctx: &EngineContext, region_id: &RegionId, kind: TriggerKind) -> bool {
    let device = match ctx.require_device() {
        Ok(device) => device,
        Err(EngineError::NotReady) => {
            tracing::debug!("No device registered, committing {:?} for {} locally", kind, region_id);
            return true;
        }
        Err(_) => return false,
    };

    match ctx.backend.region_trigger(device, region_id, kind) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                "Region {:?} trigger for {} failed, leaving membership unchanged: {}",
                kind,
                region_id,
                e
            );
            false
        }
    }
}

/// Report a beacon trigger; returns whether the transition may commit
pub(crate) fn report_beacon(ctx: &EngineContext, beacon_id: &BeaconId, kind: TriggerKind) -> bool {
    let device = match ctx.require_device() {
        Ok(device) => device,
        Err(EngineError::NotReady) => {
            tracing::debug!("No device registered, committing {:?} for {} locally", kind, beacon_id);
            return true;
        }
        Err(_) => return false,
    };

    match ctx.backend.beacon_trigger(device, beacon_id, kind) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                "Beacon {:?} trigger for {} failed, leaving membership unchanged: {}",
                kind,
                beacon_id,
                e
            );
            false
        }
    }
}

/// Submit a closed region session; fire-and-forget
pub(crate) fn submit_region_session(ctx: &EngineContext, session: RegionSession) {
    if ctx.device.is_none() {
        tracing::debug!("No device registered, dropping region session for {}", session.region_id);
        return;
    }
    if let Err(e) = ctx.backend.submit_region_session(&session) {
        tracing::warn!("Dropping unsubmittable region session for {}: {}", session.region_id, e);
    }
}

/// Submit a closed beacon session; fire-and-forget
pub(crate) fn submit_beacon_session(ctx: &EngineContext, session: BeaconSession) {
    if ctx.device.is_none() {
        tracing::debug!("No device registered, dropping beacon session for {}", session.region_id);
        return;
    }
    if let Err(e) = ctx.backend.submit_beacon_session(&session) {
        tracing::warn!("Dropping unsubmittable beacon session for {}: {}", session.region_id, e);
    }
}
