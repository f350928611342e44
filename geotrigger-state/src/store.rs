//! Monitored/entered sets for regions and beacons
//!
//! [`MonitoringState`] is the single shared mutable resource of the
//! engine. It is not internally synchronized; the engine funnels every
//! mutation through one worker thread and shares the state behind a
//! lock for read-side queries.
//!
//! Invariants maintained here:
//! - `entered_regions ⊆ keys(monitored_regions)`
//! - `entered_beacons ⊆ ids(monitored_beacons)`

use std::collections::{HashMap, HashSet};

use geotrigger_api::model::{Beacon, BeaconId, Proximity, Region, RegionId};

/// The subscribe/unsubscribe delta between the monitored set and a
/// freshly fetched nearby-region list
#[derive(Debug, Default)]
pub struct RegionDiff {
    /// Monitored but absent from the fresh list; synthesize exits and
    /// unsubscribe
    pub stale: Vec<Region>,
    /// Present in the fresh list but not yet monitored; subscribe
    pub fresh: Vec<Region>,
}

/// Process-wide monitoring state
#[derive(Debug, Default)]
pub struct MonitoringState {
    monitored_regions: HashMap<RegionId, Region>,
    entered_regions: HashSet<RegionId>,
    monitored_beacons: Vec<Beacon>,
    entered_beacons: HashSet<BeaconId>,
}

impl MonitoringState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Regions
    // ========================================================================

    /// Look up a monitored region
    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.monitored_regions.get(id)
    }

    /// All monitored regions
    pub fn regions(&self) -> Vec<Region> {
        self.monitored_regions.values().cloned().collect()
    }

    /// Monitored regions with polygon geometry, the ones evaluated
    /// against every location fix
    pub fn polygon_regions(&self) -> Vec<Region> {
        self.monitored_regions
            .values()
            .filter(|r| r.geometry.is_polygon())
            .cloned()
            .collect()
    }

    /// Start monitoring a region; replaces any previous entry wholesale
    pub fn insert_region(&mut self, region: Region) {
        self.monitored_regions.insert(region.id.clone(), region);
    }

    /// Stop monitoring a region, dropping entered membership with it
    pub fn remove_region(&mut self, id: &RegionId) -> Option<Region> {
        self.entered_regions.remove(id);
        self.monitored_regions.remove(id)
    }

    /// Whether the region is currently entered
    pub fn is_entered(&self, id: &RegionId) -> bool {
        self.entered_regions.contains(id)
    }

    /// Mark a region entered; refused for unmonitored ids
    pub fn mark_entered(&mut self, id: &RegionId) -> bool {
        if !self.monitored_regions.contains_key(id) {
            return false;
        }
        self.entered_regions.insert(id.clone())
    }

    /// Clear a region's entered membership
    pub fn mark_exited(&mut self, id: &RegionId) -> bool {
        self.entered_regions.remove(id)
    }

    /// Ids of all entered regions
    pub fn entered_region_ids(&self) -> Vec<RegionId> {
        self.entered_regions.iter().cloned().collect()
    }

    /// Number of monitored regions
    pub fn region_count(&self) -> usize {
        self.monitored_regions.len()
    }

    /// Split a fresh nearby-region list into stale and fresh entries
    ///
    /// Regions present on both sides are deliberately absent from the
    /// result; leaving them untouched avoids spurious exit/enter pairs
    /// and churn against platform subscription limits.
    pub fn diff_regions(&self, nearby: &[Region]) -> RegionDiff {
        let nearby_ids: HashSet<&RegionId> = nearby.iter().map(|r| &r.id).collect();

        let stale = self
            .monitored_regions
            .values()
            .filter(|r| !nearby_ids.contains(&r.id))
            .cloned()
            .collect();

        let fresh = nearby
            .iter()
            .filter(|r| !self.monitored_regions.contains_key(&r.id))
            .cloned()
            .collect();

        RegionDiff { stale, fresh }
    }

    // ========================================================================
    // Beacons
    // ========================================================================

    /// Currently monitored beacons, in fetch order
    pub fn beacons(&self) -> Vec<Beacon> {
        self.monitored_beacons.clone()
    }

    /// Look up a monitored beacon by id
    pub fn beacon(&self, id: &BeaconId) -> Option<&Beacon> {
        self.monitored_beacons.iter().find(|b| &b.id == id)
    }

    /// Look up a monitored beacon by its major/minor pair
    pub fn beacon_by_identifiers(&self, major: u32, minor: Option<u32>) -> Option<&Beacon> {
        self.monitored_beacons
            .iter()
            .find(|b| b.major == major && b.minor == minor)
    }

    /// Replace the monitored beacon list wholesale (last-fetch-wins)
    ///
    /// Entered membership for beacons no longer in the list is dropped.
    pub fn replace_beacons(&mut self, beacons: Vec<Beacon>) {
        let ids: HashSet<&BeaconId> = beacons.iter().map(|b| &b.id).collect();
        self.entered_beacons.retain(|id| ids.contains(id));
        self.monitored_beacons = beacons;
    }

    /// Drop all monitored and entered beacons
    pub fn clear_beacons(&mut self) {
        self.monitored_beacons.clear();
        self.entered_beacons.clear();
    }

    /// Whether the beacon is currently entered
    pub fn is_beacon_entered(&self, id: &BeaconId) -> bool {
        self.entered_beacons.contains(id)
    }

    /// Mark a beacon entered; refused for unmonitored ids
    pub fn mark_beacon_entered(&mut self, id: &BeaconId) -> bool {
        if self.beacon(id).is_none() {
            return false;
        }
        self.entered_beacons.insert(id.clone())
    }

    /// Clear a beacon's entered membership
    pub fn mark_beacon_exited(&mut self, id: &BeaconId) -> bool {
        self.entered_beacons.remove(id)
    }

    /// Ids of all entered beacons
    pub fn entered_beacon_ids(&self) -> Vec<BeaconId> {
        self.entered_beacons.iter().cloned().collect()
    }

    /// Drop everything: monitored and entered regions and beacons
    pub fn clear(&mut self) {
        self.monitored_regions.clear();
        self.entered_regions.clear();
        self.monitored_beacons.clear();
        self.entered_beacons.clear();
    }

    /// Update a monitored beacon's proximity in place
    ///
    /// Returns false when no beacon matches the identifiers.
    pub fn update_proximity(&mut self, major: u32, minor: Option<u32>, proximity: Proximity) -> bool {
        match self
            .monitored_beacons
            .iter_mut()
            .find(|b| b.major == major && b.minor == minor)
        {
            Some(beacon) => {
                beacon.proximity = proximity;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotrigger_api::model::{Coordinate, Geometry};

    fn region(id: &str) -> Region {
        Region {
            id: RegionId::new(id),
            name: id.to_string(),
            major: None,
            geometry: Geometry::Circle {
                center: Coordinate::new(0.0, 0.0),
                radius_m: 100.0,
            },
        }
    }

    fn beacon(id: &str, major: u32, minor: Option<u32>) -> Beacon {
        Beacon {
            id: BeaconId::new(id),
            name: id.to_string(),
            major,
            minor,
            triggers: true,
            proximity: Proximity::Unknown,
        }
    }

    #[test]
    fn test_entered_requires_monitored() {
        let mut state = MonitoringState::new();
        let id = RegionId::new("a");

        // Unknown region cannot be entered
        assert!(!state.mark_entered(&id));
        assert!(!state.is_entered(&id));

        state.insert_region(region("a"));
        assert!(state.mark_entered(&id));
        assert!(state.is_entered(&id));

        // Second mark is a no-op
        assert!(!state.mark_entered(&id));
    }

    #[test]
    fn test_remove_region_drops_entered() {
        let mut state = MonitoringState::new();
        state.insert_region(region("a"));
        state.mark_entered(&RegionId::new("a"));

        state.remove_region(&RegionId::new("a"));
        assert!(!state.is_entered(&RegionId::new("a")));
        assert_eq!(state.region_count(), 0);
    }

    #[test]
    fn test_diff_minimality() {
        let mut state = MonitoringState::new();
        state.insert_region(region("a"));
        state.insert_region(region("b"));

        let diff = state.diff_regions(&[region("b"), region("c")]);

        assert_eq!(diff.stale.len(), 1);
        assert_eq!(diff.stale[0].id, RegionId::new("a"));
        assert_eq!(diff.fresh.len(), 1);
        assert_eq!(diff.fresh[0].id, RegionId::new("c"));
    }

    #[test]
    fn test_replace_beacons_retains_still_monitored_entered() {
        let mut state = MonitoringState::new();
        state.replace_beacons(vec![beacon("b1", 1, Some(1)), beacon("b2", 1, Some(2))]);
        state.mark_beacon_entered(&BeaconId::new("b1"));
        state.mark_beacon_entered(&BeaconId::new("b2"));

        state.replace_beacons(vec![beacon("b1", 1, Some(1))]);

        assert!(state.is_beacon_entered(&BeaconId::new("b1")));
        assert!(!state.is_beacon_entered(&BeaconId::new("b2")));
    }

    #[test]
    fn test_update_proximity() {
        let mut state = MonitoringState::new();
        state.replace_beacons(vec![beacon("b1", 1, Some(1))]);

        assert!(state.update_proximity(1, Some(1), Proximity::Near));
        assert_eq!(
            state.beacon(&BeaconId::new("b1")).unwrap().proximity,
            Proximity::Near
        );

        // Unknown identifiers leave state untouched
        assert!(!state.update_proximity(9, Some(9), Proximity::Far));
    }

    #[test]
    fn test_polygon_regions_filter() {
        let mut state = MonitoringState::new();
        state.insert_region(region("circle"));
        state.insert_region(Region {
            id: RegionId::new("poly"),
            name: "poly".to_string(),
            major: None,
            geometry: Geometry::Polygon {
                vertices: vec![
                    Coordinate::new(0.0, 0.0),
                    Coordinate::new(0.0, 1.0),
                    Coordinate::new(1.0, 1.0),
                ],
            },
        });

        let polygons = state.polygon_regions();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].id, RegionId::new("poly"));
    }
}
