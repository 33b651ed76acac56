//! Zone placement for incursion events.
//!
//! Chooses zone centres relative to existing faction territory, keeping
//! clear of claimed cells, water and each other.

pub mod planner;
pub mod surface;

pub use planner::{zone_count, PlanningContext, Rejection, ZonePlacement, ZonePlanner};
pub use surface::{FlatSurface, Lake, Surface, SurfaceProbe, SurfaceRejection};

#[cfg(test)]
mod tests;
