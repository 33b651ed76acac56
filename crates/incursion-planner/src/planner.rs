//! Stochastic zone placement.
//!
//! Candidates are scattered on a ring around the centroid of known faction
//! territory, dropped onto the surface, filtered against claims and
//! separation, and accepted greedily starting with the ones furthest from
//! any territory.

use std::collections::HashSet;
use std::f64::consts::TAU;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use incursion_core::config::IncursionConfig;
use incursion_core::types::{Location, MapCell, Position, WorldId};

use crate::surface::{find_surface, SurfaceProbe};

/// Inner edge of the candidate ring as a fraction of the mean territory distance.
const RING_INNER: f64 = 0.5;
/// Outer edge of the candidate ring.
const RING_OUTER: f64 = 0.9;

/// An accepted zone location.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePlacement {
    pub name: String,
    pub center: Location,
    pub radius: f64,
}

/// What the planner knows about the world when it runs.
#[derive(Debug, Clone, Copy)]
pub struct PlanningContext<'a> {
    pub territory_centers: &'a [Location],
    pub claimed: &'a HashSet<MapCell>,
    /// Zones already placed; new zones keep their distance from these too.
    pub existing: &'a [ZonePlacement],
}

/// Why a surfaced candidate was refused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    ClaimedCell(MapCell),
    TooClose { distance: f64 },
}

/// Number of zones for a given online population:
/// `clamp(base + max(0, actors - min) / per_zone, base, max)`.
/// The base count wins when it exceeds the maximum.
pub fn zone_count(config: &IncursionConfig, online: usize) -> usize {
    let extra = online.saturating_sub(config.min_actors) / config.actors_per_zone.max(1);
    config
        .zone_base_count
        .saturating_add(extra)
        .min(config.zone_max_count)
        .max(config.zone_base_count)
}

pub struct ZonePlanner {
    config: Arc<IncursionConfig>,
    surface: Arc<dyn SurfaceProbe>,
    rng: ChaCha8Rng,
}

impl ZonePlanner {
    /// Seeded from `config.seed` when set, otherwise from OS entropy.
    pub fn new(config: Arc<IncursionConfig>, surface: Arc<dyn SurfaceProbe>) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            config,
            surface,
            rng,
        }
    }

    pub fn with_seed(
        config: Arc<IncursionConfig>,
        surface: Arc<dyn SurfaceProbe>,
        seed: u64,
    ) -> Self {
        Self {
            config,
            surface,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// World zones are placed in: the one holding the probe's spawn.
    pub fn world(&self) -> WorldId {
        self.surface.spawn().world
    }

    /// Place up to `target` zones. May return fewer, including none.
    pub fn plan(&mut self, target: usize, ctx: &PlanningContext<'_>) -> Vec<ZonePlacement> {
        if target == 0 {
            return Vec::new();
        }

        let spawn = self.surface.spawn();
        let world = spawn.world.clone();

        let mut territories: Vec<Position> = ctx
            .territory_centers
            .iter()
            .filter(|t| t.world == world)
            .map(|t| t.position)
            .collect();
        let have_territory = !territories.is_empty();
        if !have_territory {
            warn!(world = %world, "no faction territory known, placing around spawn");
            territories.push(spawn.position);
        }

        let (cx, cy) = centroid(&territories);
        let mean_distance = if have_territory {
            territories
                .iter()
                .map(|t| ((t.x - cx).powi(2) + (t.y - cy).powi(2)).sqrt())
                .sum::<f64>()
                / territories.len() as f64
        } else {
            self.config.fallback_territory_distance
        };

        let candidate_count = target * self.config.candidate_multiplier;
        let jitter = self.config.candidate_jitter;
        let mut candidates: Vec<(Location, f64)> = Vec::with_capacity(candidate_count);
        let mut surface_rejects = 0usize;

        for _ in 0..candidate_count {
            let bearing: f64 = self.rng.gen_range(0.0..TAU);
            let ring = mean_distance * self.rng.gen_range(RING_INNER..RING_OUTER);
            // Bearing 0 = North, clockwise.
            let mut x = cx + ring * bearing.sin();
            let mut y = cy + ring * bearing.cos();
            if jitter > 0.0 {
                x += self.rng.gen_range(-jitter..jitter);
                y += self.rng.gen_range(-jitter..jitter);
            }

            match find_surface(
                self.surface.as_ref(),
                &world,
                x.floor(),
                y.floor(),
                &self.config,
            ) {
                Ok(location) => {
                    let nearest = nearest_distance(&location.position, &territories);
                    candidates.push((location, nearest));
                }
                Err(reason) => {
                    surface_rejects += 1;
                    debug!(x, y, ?reason, "candidate rejected by surface probe");
                }
            }
        }

        // Furthest from every territory first.
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut accepted: Vec<ZonePlacement> = Vec::with_capacity(target);
        for (location, _) in candidates {
            if accepted.len() >= target {
                break;
            }
            let others: Vec<&ZonePlacement> =
                ctx.existing.iter().chain(accepted.iter()).collect();
            match self.check_placement(&location, ctx.claimed, &others) {
                Ok(()) => {
                    let name = format!("Zone-{}", ctx.existing.len() + accepted.len() + 1);
                    info!(
                        zone = %name,
                        x = location.position.x,
                        y = location.position.y,
                        z = location.position.z,
                        "zone placed"
                    );
                    accepted.push(ZonePlacement {
                        name,
                        center: location,
                        radius: self.config.zone_radius,
                    });
                }
                Err(reason) => debug!(?reason, "candidate rejected"),
            }
        }

        if accepted.len() < target {
            warn!(
                placed = accepted.len(),
                requested = target,
                candidates = candidate_count,
                surface_rejects,
                "could not place every requested zone"
            );
        }
        accepted
    }

    /// Claim-footprint and separation checks for one surfaced candidate.
    pub fn check_placement(
        &self,
        center: &Location,
        claimed: &HashSet<MapCell>,
        others: &[&ZonePlacement],
    ) -> Result<(), Rejection> {
        let radius = self.config.zone_radius;
        let buffer = self.config.town_buffer;

        if !claimed.is_empty() {
            let home = MapCell::containing(&center.position);
            let size = MapCell::SIZE as f64;
            let reach = (radius / size).ceil() as i32 + (buffer / size).ceil() as i32;
            for dx in -reach..=reach {
                for dy in -reach..=reach {
                    let cell = MapCell::new(home.x + dx, home.y + dy);
                    if claimed.contains(&cell)
                        && cell.distance_to(center.position.x, center.position.y)
                            < radius + buffer
                    {
                        return Err(Rejection::ClaimedCell(cell));
                    }
                }
            }
        }

        for other in others {
            if let Some(distance) = other.center.horizontal_range_to(center) {
                if distance < self.config.min_zone_separation {
                    return Err(Rejection::TooClose { distance });
                }
            }
        }

        Ok(())
    }
}

fn centroid(points: &[Position]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    (sx / n, sy / n)
}

fn nearest_distance(from: &Position, territories: &[Position]) -> f64 {
    territories
        .iter()
        .map(|t| from.horizontal_range_to(t))
        .fold(f64::MAX, f64::min)
}
