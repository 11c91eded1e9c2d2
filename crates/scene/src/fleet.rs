use std::collections::{BTreeMap, BTreeSet};

use foundation::handles::Handle;
use foundation::math::GeoPoint;
use foundation::Arena;
use tracing::debug;

use crate::transform::Transform;
use crate::vessel::{KinematicsConfig, Vessel, VesselId, VesselReport};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    /// Existing vessel; the report moved its target.
    Retargeted,
    /// Existing vessel; only speed/heading/timestamp changed.
    Refreshed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SyncSummary {
    pub created: usize,
    pub retargeted: usize,
    pub refreshed: usize,
    pub removed: usize,
}

/// Every tracked vessel, keyed by id.
///
/// Vessels live in an arena and are updated in place so interpolation keeps
/// its continuity across reports. Iteration is ordered by id.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    config: KinematicsConfig,
    vessels: Arena<Vessel>,
    index: BTreeMap<VesselId, Handle>,
    selected: Option<VesselId>,
}

impl Fleet {
    pub fn new(config: KinematicsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &KinematicsConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &VesselId> {
        self.index.keys()
    }

    pub fn get(&self, id: &VesselId) -> Option<&Vessel> {
        let handle = *self.index.get(id)?;
        self.vessels.get(handle)
    }

    /// Create the vessel on its first report, update it in place afterwards.
    pub fn upsert(&mut self, id: VesselId, report: VesselReport) -> UpsertOutcome {
        if let Some(&handle) = self.index.get(&id) {
            if let Some(vessel) = self.vessels.get_mut(handle) {
                return if vessel.apply_report(report, &self.config) {
                    UpsertOutcome::Retargeted
                } else {
                    UpsertOutcome::Refreshed
                };
            }
        }

        debug!(vessel = %id, "tracking new vessel");
        let handle = self
            .vessels
            .alloc(Vessel::new(id.clone(), report, &self.config));
        self.index.insert(id, handle);
        UpsertOutcome::Created
    }

    pub fn remove(&mut self, id: &VesselId) -> Option<Vessel> {
        let handle = self.index.remove(id)?;
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        debug!(vessel = %id, "dropping vessel");
        self.vessels.remove(handle)
    }

    /// Apply a full feed snapshot: upsert every report and drop vessels that
    /// are no longer listed.
    pub fn sync(
        &mut self,
        reports: impl IntoIterator<Item = (VesselId, VesselReport)>,
    ) -> SyncSummary {
        let mut summary = SyncSummary::default();
        let mut seen = BTreeSet::new();

        for (id, report) in reports {
            match self.upsert(id.clone(), report) {
                UpsertOutcome::Created => summary.created += 1,
                UpsertOutcome::Retargeted => summary.retargeted += 1,
                UpsertOutcome::Refreshed => summary.refreshed += 1,
            }
            seen.insert(id);
        }

        let stale: Vec<VesselId> = self
            .index
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        for id in stale {
            self.remove(&id);
            summary.removed += 1;
        }

        summary
    }

    /// Advance every vessel by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        let config = &self.config;
        for (_handle, vessel) in self.vessels.iter_mut() {
            vessel.tick(dt, config);
        }
    }

    pub fn transform(&self, id: &VesselId) -> Option<Transform> {
        self.get(id).map(Vessel::transform)
    }

    /// Snapshot of every vessel's transform, ordered by id.
    pub fn transforms(&self) -> Vec<(VesselId, Transform)> {
        self.index
            .iter()
            .filter_map(|(id, handle)| {
                self.vessels
                    .get(*handle)
                    .map(|v| (id.clone(), v.transform()))
            })
            .collect()
    }

    pub fn selected(&self) -> Option<&VesselId> {
        self.selected.as_ref()
    }

    /// Select a tracked vessel. Any route on the previous selection is
    /// dropped.
    pub fn select(&mut self, id: &VesselId) -> bool {
        if !self.index.contains_key(id) {
            return false;
        }
        if self.selected.as_ref() != Some(id) {
            self.deselect();
            self.selected = Some(id.clone());
        }
        true
    }

    pub fn deselect(&mut self) {
        if let Some(previous) = self.selected.take() {
            if let Some(vessel) = self.get_mut(&previous) {
                vessel.clear_route();
            }
        }
    }

    /// Attach a route to the selected vessel.
    ///
    /// Routes for any other id are ignored and `false` is returned.
    pub fn set_route(&mut self, id: &VesselId, waypoints: Vec<GeoPoint>) -> bool {
        if self.selected.as_ref() != Some(id) {
            debug!(vessel = %id, "ignoring route for unselected vessel");
            return false;
        }
        let config = self.config.clone();
        match self.get_mut(id) {
            Some(vessel) => vessel.set_route(waypoints, &config),
            None => false,
        }
    }

    fn get_mut(&mut self, id: &VesselId) -> Option<&mut Vessel> {
        let handle = *self.index.get(id)?;
        self.vessels.get_mut(handle)
    }
}
