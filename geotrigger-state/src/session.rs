//! Visit session bookkeeping
//!
//! [`SessionBook`] owns every open session: at most one region session
//! per region id and at most one beacon session at a time (a single
//! entered beacon region drives beacon monitoring). Closing a session
//! returns it for submission; the book never retains closed sessions.

use chrono::{Duration, Utc};

use geotrigger_api::model::{
    Beacon, BeaconObservation, BeaconSession, LocationSample, RegionId, RegionSession,
};

/// Default de-dup window for beacon observations: 15 minutes
pub fn default_observation_window() -> Duration {
    Duration::minutes(15)
}

/// Open-session bookkeeping for the session manager
#[derive(Debug)]
pub struct SessionBook {
    region_sessions: Vec<RegionSession>,
    beacon_session: Option<BeaconSession>,
    observation_window: Duration,
}

impl SessionBook {
    /// Create an empty book with the given observation de-dup window
    pub fn new(observation_window: Duration) -> Self {
        Self {
            region_sessions: Vec::new(),
            beacon_session: None,
            observation_window,
        }
    }

    // ========================================================================
    // Region sessions
    // ========================================================================

    /// Open a region session, seeded with the most recent known fix
    ///
    /// Starting while a session is already open for the id indicates a
    /// missed exit; the existing session is kept and `false` returned.
    pub fn start_region(&mut self, region_id: RegionId, seed: Option<LocationSample>) -> bool {
        if self.region_sessions.iter().any(|s| s.region_id == region_id) {
            tracing::warn!(
                "Region session for {} already open, ignoring start (missed exit?)",
                region_id
            );
            return false;
        }

        self.region_sessions.push(RegionSession {
            region_id,
            start: Utc::now(),
            end: None,
            locations: seed.into_iter().collect(),
        });
        true
    }

    /// Append a fix to every open region session
    pub fn record_location(&mut self, sample: &LocationSample) {
        for session in &mut self.region_sessions {
            session.locations.push(sample.clone());
        }
    }

    /// Close and return the region session, if one is open
    pub fn stop_region(&mut self, region_id: &RegionId) -> Option<RegionSession> {
        let index = self
            .region_sessions
            .iter()
            .position(|s| &s.region_id == region_id)?;
        let mut session = self.region_sessions.remove(index);
        session.end = Some(Utc::now());
        Some(session)
    }

    /// Whether a region session is open for the id
    pub fn has_region_session(&self, region_id: &RegionId) -> bool {
        self.region_sessions.iter().any(|s| &s.region_id == region_id)
    }

    /// Number of open region sessions
    pub fn open_region_sessions(&self) -> usize {
        self.region_sessions.len()
    }

    // ========================================================================
    // Beacon sessions
    // ========================================================================

    /// Open the beacon session for a beacon-region's parent
    pub fn start_beacon(&mut self, region_id: RegionId) -> bool {
        if let Some(open) = &self.beacon_session {
            tracing::warn!(
                "Beacon session for {} already open, ignoring start for {} (missed exit?)",
                open.region_id,
                region_id
            );
            return false;
        }

        self.beacon_session = Some(BeaconSession {
            region_id,
            start: Utc::now(),
            end: None,
            beacons: Vec::new(),
        });
        true
    }

    /// Record a ranging observation into the open beacon session
    ///
    /// The observation is dropped when the most recent one for the same
    /// beacon has the same proximity bucket and is younger than the
    /// de-dup window; proximity changes always record. Returns whether
    /// the observation was appended.
    pub fn record_observation(&mut self, beacon: &Beacon) -> bool {
        let window = self.observation_window;
        let Some(session) = self.beacon_session.as_mut() else {
            return false;
        };

        let now = Utc::now();
        let last = session
            .beacons
            .iter()
            .rev()
            .find(|o| o.beacon_id == beacon.id);

        let should_append = match last {
            None => true,
            Some(last) => last.proximity != beacon.proximity || now - last.timestamp > window,
        };

        if should_append {
            session.beacons.push(BeaconObservation {
                beacon_id: beacon.id.clone(),
                proximity: beacon.proximity,
                timestamp: now,
            });
        }
        should_append
    }

    /// Close and return the beacon session if it belongs to the region
    pub fn stop_beacon(&mut self, region_id: &RegionId) -> Option<BeaconSession> {
        if self.beacon_session.as_ref()?.region_id != *region_id {
            return None;
        }
        let mut session = self.beacon_session.take()?;
        session.end = Some(Utc::now());
        Some(session)
    }

    /// Whether a beacon session is currently open
    pub fn has_beacon_session(&self) -> bool {
        self.beacon_session.is_some()
    }

    /// Drop every open session without closing or returning them
    pub fn clear(&mut self) {
        if !self.region_sessions.is_empty() || self.beacon_session.is_some() {
            tracing::debug!(
                "Discarding {} open region session(s) and {} beacon session(s)",
                self.region_sessions.len(),
                usize::from(self.beacon_session.is_some())
            );
        }
        self.region_sessions.clear();
        self.beacon_session = None;
    }
}

impl Default for SessionBook {
    fn default() -> Self {
        Self::new(default_observation_window())
    }
}
