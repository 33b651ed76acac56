//! A single contested zone.

use std::collections::HashSet;

use incursion_core::state::ZoneView;
use incursion_core::types::{ActorId, Location, ZoneId};
use incursion_planner::ZonePlacement;

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub center: Location,
    pub radius: f64,
    pub active: bool,
    pub occupants: HashSet<ActorId>,
}

impl Zone {
    /// New inactive, empty zone from a placement.
    pub fn new(id: ZoneId, placement: ZonePlacement) -> Self {
        Self {
            id,
            name: placement.name,
            center: placement.center,
            radius: placement.radius,
            active: false,
            occupants: HashSet::new(),
        }
    }

    /// Planar containment, boundary included. Height is ignored.
    pub fn contains(&self, location: &Location) -> bool {
        self.center
            .horizontal_range_sq_to(location)
            .is_some_and(|d2| d2 <= self.radius * self.radius)
    }

    /// Horizontal distance from the centre, `None` in another world.
    pub fn distance_from_center(&self, location: &Location) -> Option<f64> {
        self.center.horizontal_range_to(location)
    }

    /// Distance from the edge; negative inside.
    pub fn edge_distance(&self, location: &Location) -> Option<f64> {
        self.distance_from_center(location).map(|d| d - self.radius)
    }

    pub fn view(&self) -> ZoneView {
        let mut occupants: Vec<ActorId> = self.occupants.iter().copied().collect();
        occupants.sort();
        ZoneView {
            id: self.id,
            name: self.name.clone(),
            center: self.center.clone(),
            radius: self.radius,
            active: self.active,
            occupants,
        }
    }
}
