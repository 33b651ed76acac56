//! World files: factions, territory, connected actors and terrain for a
//! headless run, loaded into the in-memory directories.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use incursion_core::directory::{InMemoryActors, InMemoryFactions};
use incursion_core::types::{ActorId, FactionId, Location, MapCell, Position, WorldId};
use incursion_planner::{FlatSurface, Lake, SurfaceProbe};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldFile {
    pub world: String,
    pub spawn: [f64; 3],
    #[serde(default = "default_height")]
    pub surface_height: f64,
    #[serde(default)]
    pub lakes: Vec<Lake>,
    #[serde(default)]
    pub factions: Vec<FactionEntry>,
    #[serde(default)]
    pub actors: Vec<ActorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactionEntry {
    pub id: u32,
    pub name: String,
    /// Territory centre `[x, y]`; factions without one hold no land.
    #[serde(default)]
    pub territory: Option<[f64; 2]>,
    /// Claimed map cells as `[cx, cy]` cell coordinates.
    #[serde(default)]
    pub claims: Vec<[i32; 2]>,
    #[serde(default)]
    pub members: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorEntry {
    pub id: u64,
    pub position: [f64; 3],
    #[serde(default)]
    pub rank: Option<u8>,
}

fn default_height() -> f64 {
    64.0
}

/// Directories and terrain built from a world file.
#[derive(Clone)]
pub struct World {
    pub factions: Arc<InMemoryFactions>,
    pub actors: Arc<InMemoryActors>,
    pub surface: Arc<dyn SurfaceProbe>,
}

impl WorldFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| AppError::WorldIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Four factions with towns on the axes at 1500 units and `actors`
    /// members spread between them near the origin.
    pub fn demo(actors: u64) -> Self {
        let towns = [
            ("Avalon", 1500.0, 0.0),
            ("Bastion", -1500.0, 0.0),
            ("Cinder", 0.0, 1500.0),
            ("Dusk", 0.0, -1500.0),
        ];
        let factions = towns
            .iter()
            .enumerate()
            .map(|(i, (name, x, y))| {
                let home = MapCell::containing(&Position::new(*x, *y, 0.0));
                FactionEntry {
                    id: i as u32 + 1,
                    name: (*name).to_string(),
                    territory: Some([*x, *y]),
                    claims: (-2..=2)
                        .flat_map(|dx| (-2..=2).map(move |dy| [home.x + dx, home.y + dy]))
                        .collect(),
                    members: (1..=actors).filter(|a| a % 4 == i as u64).collect(),
                }
            })
            .collect();
        let actors = (1..=actors)
            .map(|id| ActorEntry {
                id,
                position: [(id % 10) as f64 * 5.0, (id / 10) as f64 * 5.0, 64.0],
                rank: Some((id % 9) as u8),
            })
            .collect();

        Self {
            world: "overworld".into(),
            spawn: [0.0, 0.0, 64.0],
            surface_height: 64.0,
            lakes: Vec::new(),
            factions,
            actors,
        }
    }

    pub fn build(&self) -> World {
        let world = WorldId::new(self.world.clone());
        let at = |[x, y, z]: [f64; 3]| Location::new(world.clone(), Position::new(x, y, z));

        let factions = Arc::new(InMemoryFactions::new());
        for entry in &self.factions {
            let id = FactionId(entry.id);
            factions.add_faction(id, entry.name.clone());
            if let Some([x, y]) = entry.territory {
                let claims = entry
                    .claims
                    .iter()
                    .map(|[cx, cy]| MapCell::new(*cx, *cy))
                    .collect();
                factions.set_territory(id, at([x, y, self.surface_height]), claims);
            }
            for member in &entry.members {
                factions.set_member(ActorId(*member), id);
            }
        }

        let actors = Arc::new(InMemoryActors::new());
        for entry in &self.actors {
            actors.connect(ActorId(entry.id), at(entry.position));
            actors.set_rank(ActorId(entry.id), entry.rank);
        }

        let surface = self
            .lakes
            .iter()
            .fold(FlatSurface::new(at(self.spawn), self.surface_height), |s, lake| {
                s.with_lake(*lake)
            });

        info!(
            world = %self.world,
            factions = self.factions.len(),
            actors = self.actors.len(),
            lakes = self.lakes.len(),
            "world loaded"
        );
        World {
            factions,
            actors,
            surface: Arc::new(surface),
        }
    }
}
