//! Zone registry: owns every zone of the current event and the
//! actor-to-zone index.
//!
//! Both maps are `DashMap`s so disconnect handling can run on a host
//! thread while the tick loop polls containment. Lock order is always
//! `actor_index` before `zones`; no `zones` guard is held while touching
//! the index.

use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use incursion_core::state::ZoneView;
use incursion_core::types::{ActorId, Location, ZoneId};
use incursion_planner::ZonePlacement;

use crate::zone::Zone;

/// Result of moving an actor in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneTransition {
    Unchanged,
    Entered(ZoneId),
    Exited(ZoneId),
    Moved { from: ZoneId, to: ZoneId },
}

/// Nearest active zone to a location.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestZone {
    pub id: ZoneId,
    pub name: String,
    /// Distance from the zone edge; negative inside.
    pub edge_distance: f64,
}

#[derive(Debug)]
pub struct ZoneRegistry {
    zones: DashMap<ZoneId, Zone>,
    actor_index: DashMap<ActorId, ZoneId>,
    next_id: AtomicU32,
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self {
            zones: DashMap::new(),
            actor_index: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inactive zone.
    pub fn register(&self, placement: ZonePlacement) -> ZoneId {
        let id = ZoneId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let zone = Zone::new(id, placement);
        info!(
            zone = id.0,
            name = %zone.name,
            x = zone.center.position.x,
            y = zone.center.position.y,
            radius = zone.radius,
            "zone registered"
        );
        self.zones.insert(id, zone);
        id
    }

    /// Remove a zone and every index entry pointing at it.
    pub fn unregister(&self, id: ZoneId) -> Option<Zone> {
        let removed = self.zones.remove(&id).map(|(_, zone)| zone);
        if removed.is_some() {
            self.actor_index.retain(|_, zone| *zone != id);
            debug!(zone = id.0, "zone unregistered");
        }
        removed
    }

    pub fn zone(&self, id: ZoneId) -> Option<ZoneView> {
        self.zones.get(&id).map(|zone| zone.view())
    }

    pub fn zone_name(&self, id: ZoneId) -> Option<String> {
        self.zones.get(&id).map(|zone| zone.name.clone())
    }

    /// Case-insensitive lookup by display name.
    pub fn zone_by_name(&self, name: &str) -> Option<ZoneView> {
        self.zones
            .iter()
            .find(|zone| zone.name.eq_ignore_ascii_case(name))
            .map(|zone| zone.view())
    }

    /// All zones, ordered by id.
    pub fn zones(&self) -> Vec<ZoneView> {
        let mut views: Vec<ZoneView> = self.zones.iter().map(|zone| zone.view()).collect();
        views.sort_by_key(|view| view.id);
        views
    }

    pub fn active_zones(&self) -> Vec<ZoneView> {
        let mut views: Vec<ZoneView> = self
            .zones
            .iter()
            .filter(|zone| zone.active)
            .map(|zone| zone.view())
            .collect();
        views.sort_by_key(|view| view.id);
        views
    }

    /// Active zone containing a location. Overlaps resolve to the lowest id.
    pub fn zone_at(&self, location: &Location) -> Option<ZoneId> {
        self.zones
            .iter()
            .filter(|zone| zone.active && zone.contains(location))
            .map(|zone| zone.id)
            .min()
    }

    /// Closest active zone by edge distance.
    pub fn nearest_zone(&self, location: &Location) -> Option<NearestZone> {
        self.zones
            .iter()
            .filter(|zone| zone.active)
            .filter_map(|zone| {
                zone.edge_distance(location).map(|edge_distance| NearestZone {
                    id: zone.id,
                    name: zone.name.clone(),
                    edge_distance,
                })
            })
            .min_by(|a, b| {
                a.edge_distance
                    .total_cmp(&b.edge_distance)
                    .then(a.id.cmp(&b.id))
            })
    }

    pub fn distance_from_center(&self, id: ZoneId, location: &Location) -> Option<f64> {
        self.zones
            .get(&id)
            .and_then(|zone| zone.distance_from_center(location))
    }

    /// Zone the actor is currently indexed in.
    pub fn zone_of(&self, actor: ActorId) -> Option<ZoneId> {
        self.actor_index.get(&actor).map(|zone| *zone)
    }

    /// Move an actor in the index. Occupant sets change only on an actual
    /// transition. The actor's index entry stays locked for the whole
    /// update, so a poll and a disconnect for the same actor serialize.
    pub fn update_actor_zone(&self, actor: ActorId, zone: Option<ZoneId>) -> ZoneTransition {
        match self.actor_index.entry(actor) {
            Entry::Occupied(mut entry) => {
                let from = *entry.get();
                match zone {
                    Some(to) if to == from => ZoneTransition::Unchanged,
                    Some(to) => {
                        self.shift_occupant(actor, Some(from), Some(to));
                        entry.insert(to);
                        ZoneTransition::Moved { from, to }
                    }
                    None => {
                        self.shift_occupant(actor, Some(from), None);
                        entry.remove();
                        ZoneTransition::Exited(from)
                    }
                }
            }
            Entry::Vacant(entry) => match zone {
                Some(to) => {
                    self.shift_occupant(actor, None, Some(to));
                    entry.insert(to);
                    ZoneTransition::Entered(to)
                }
                None => ZoneTransition::Unchanged,
            },
        }
    }

    fn shift_occupant(&self, actor: ActorId, from: Option<ZoneId>, to: Option<ZoneId>) {
        if let Some(mut old) = from.and_then(|id| self.zones.get_mut(&id)) {
            old.occupants.remove(&actor);
        }
        if let Some(mut new) = to.and_then(|id| self.zones.get_mut(&id)) {
            new.occupants.insert(actor);
        }
    }

    /// Drop an actor from the index (disconnect). Returns the zone it was in.
    pub fn remove_actor(&self, actor: ActorId) -> Option<ZoneId> {
        match self.update_actor_zone(actor, None) {
            ZoneTransition::Exited(zone) => Some(zone),
            _ => None,
        }
    }

    /// Indexed actors, ordered by id.
    pub fn indexed_actors(&self) -> Vec<(ActorId, ZoneId)> {
        let mut entries: Vec<(ActorId, ZoneId)> = self
            .actor_index
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        entries.sort();
        entries
    }

    pub fn activate_all(&self) {
        for mut zone in self.zones.iter_mut() {
            zone.active = true;
        }
        info!(zones = self.zones.len(), "zones activated");
    }

    /// Deactivate every zone and forget all occupants.
    pub fn deactivate_all(&self) {
        for mut zone in self.zones.iter_mut() {
            zone.active = false;
            zone.occupants.clear();
        }
        self.actor_index.clear();
        info!(zones = self.zones.len(), "zones deactivated");
    }

    pub fn clear(&self) {
        self.zones.clear();
        self.actor_index.clear();
    }

    /// Actors currently inside any zone.
    pub fn occupant_count(&self) -> usize {
        self.actor_index.len()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
