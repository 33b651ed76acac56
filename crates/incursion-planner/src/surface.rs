//! Surface probing for zone placement.
//!
//! A candidate centre is only usable on dry, solid ground outside ocean and
//! river biomes, with a mostly dry neighbourhood.

use serde::{Deserialize, Serialize};

use incursion_core::config::IncursionConfig;
use incursion_core::enums::{BiomeClass, SurfaceMaterial};
use incursion_core::types::{Location, Position, WorldId};

/// Topmost surface column at a horizontal position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub height: f64,
    pub material: SurfaceMaterial,
    /// Material directly above the surface; dry air reads as `Solid`.
    pub above: SurfaceMaterial,
    pub biome: BiomeClass,
}

impl Surface {
    pub fn land(height: f64) -> Self {
        Self {
            height,
            material: SurfaceMaterial::Solid,
            above: SurfaceMaterial::Solid,
            biome: BiomeClass::Land,
        }
    }

    fn is_wet(&self) -> bool {
        self.material == SurfaceMaterial::Water || self.above == SurfaceMaterial::Water
    }
}

/// Host terrain query.
pub trait SurfaceProbe: Send + Sync {
    /// Spawn of the primary world; also names the world zones are placed in.
    fn spawn(&self) -> Location;

    fn surface_at(&self, world: &WorldId, x: f64, y: f64) -> Option<Surface>;
}

/// Why a candidate column was refused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceRejection {
    NoSurface,
    Liquid(SurfaceMaterial),
    Biome(BiomeClass),
    Waterlogged { fraction: f64 },
}

/// Resolve a horizontal candidate to a standing location, or say why not.
pub fn find_surface(
    probe: &dyn SurfaceProbe,
    world: &WorldId,
    x: f64,
    y: f64,
    config: &IncursionConfig,
) -> Result<Location, SurfaceRejection> {
    let surface = probe
        .surface_at(world, x, y)
        .ok_or(SurfaceRejection::NoSurface)?;

    if surface.biome.is_disallowed() {
        return Err(SurfaceRejection::Biome(surface.biome));
    }
    if surface.material.is_liquid() {
        return Err(SurfaceRejection::Liquid(surface.material));
    }
    if surface.above.is_liquid() {
        return Err(SurfaceRejection::Liquid(surface.above));
    }

    let fraction = water_fraction(probe, world, x, y, config);
    if fraction > config.max_water_fraction {
        return Err(SurfaceRejection::Waterlogged { fraction });
    }

    Ok(Location::new(
        world.clone(),
        Position::new(x, y, surface.height),
    ))
}

/// Share of a sampled square around (x, y) whose surface is water.
pub fn water_fraction(
    probe: &dyn SurfaceProbe,
    world: &WorldId,
    x: f64,
    y: f64,
    config: &IncursionConfig,
) -> f64 {
    let r = config.water_sample_radius;
    let step = config.water_sample_step;
    let samples_per_axis = (2.0 * r / step).floor() as i64 + 1;

    let mut total = 0u32;
    let mut wet = 0u32;
    for i in 0..samples_per_axis {
        for j in 0..samples_per_axis {
            let sx = x - r + i as f64 * step;
            let sy = y - r + j as f64 * step;
            total += 1;
            if probe
                .surface_at(world, sx, sy)
                .is_some_and(|s| s.is_wet())
            {
                wet += 1;
            }
        }
    }

    if total == 0 {
        0.0
    } else {
        wet as f64 / total as f64
    }
}

/// Circular body of water on otherwise flat land.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lake {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Lake {
    fn covers(&self, x: f64, y: f64) -> bool {
        let dx = x - self.x;
        let dy = y - self.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// Flat solid land at a fixed height, for hosts without terrain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatSurface {
    pub spawn: Location,
    pub height: f64,
    #[serde(default)]
    pub lakes: Vec<Lake>,
}

impl FlatSurface {
    pub fn new(spawn: Location, height: f64) -> Self {
        Self {
            spawn,
            height,
            lakes: Vec::new(),
        }
    }

    pub fn with_lake(mut self, lake: Lake) -> Self {
        self.lakes.push(lake);
        self
    }
}

impl SurfaceProbe for FlatSurface {
    fn spawn(&self) -> Location {
        self.spawn.clone()
    }

    fn surface_at(&self, world: &WorldId, x: f64, y: f64) -> Option<Surface> {
        if *world != self.spawn.world {
            return None;
        }
        if self.lakes.iter().any(|lake| lake.covers(x, y)) {
            return Some(Surface {
                height: self.height,
                material: SurfaceMaterial::Water,
                above: SurfaceMaterial::Water,
                biome: BiomeClass::Land,
            });
        }
        Some(Surface::land(self.height))
    }
}
