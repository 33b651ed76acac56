//! Read-only collaborators the engine queries: who is online and where,
//! and which faction everyone belongs to.
//!
//! All calls are synchronous lookups against already-resident state.
//! The in-memory implementations are backed by `DashMap` so a host can
//! connect and move actors from another thread while the tick loop reads.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;
use crate::types::{ActorId, FactionId, Location, MapCell, WorldId};

/// Cached identity of a faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
}

/// A connected actor and its live location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub location: Location,
}

pub trait FactionDirectory: Send + Sync {
    fn faction(&self, id: FactionId) -> Result<Option<Faction>, DirectoryError>;

    /// Faction the actor belongs to, `None` for unaffiliated actors.
    fn faction_of(&self, actor: ActorId) -> Result<Option<Faction>, DirectoryError>;

    /// Claimed cells in a world; zones may not overlap them.
    fn claimed_cells(&self, world: &WorldId) -> Result<HashSet<MapCell>, DirectoryError>;

    /// One representative centre per faction territory.
    fn territory_centers(&self) -> Result<Vec<Location>, DirectoryError>;
}

pub trait ActorDirectory: Send + Sync {
    fn online_actors(&self) -> Result<Vec<ActorSnapshot>, DirectoryError>;

    fn online_count(&self) -> Result<usize, DirectoryError> {
        Ok(self.online_actors()?.len())
    }

    /// Rank in the external progression system (lower is stronger);
    /// `None` for actors outside it.
    fn progression_rank(&self, _actor: ActorId) -> Option<u8> {
        None
    }
}

#[derive(Debug, Clone)]
struct TerritoryEntry {
    center: Location,
    claims: Vec<MapCell>,
}

/// Faction directory held entirely in memory.
#[derive(Debug)]
pub struct InMemoryFactions {
    factions: DashMap<FactionId, Faction>,
    members: DashMap<ActorId, FactionId>,
    territories: DashMap<FactionId, TerritoryEntry>,
    available: AtomicBool,
}

impl Default for InMemoryFactions {
    fn default() -> Self {
        Self {
            factions: DashMap::new(),
            members: DashMap::new(),
            territories: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }
}

impl InMemoryFactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_faction(&self, id: FactionId, name: impl Into<String>) {
        self.factions.insert(
            id,
            Faction {
                id,
                name: name.into(),
            },
        );
    }

    pub fn remove_faction(&self, id: FactionId) {
        self.factions.remove(&id);
        self.territories.remove(&id);
        self.members.retain(|_, faction| *faction != id);
    }

    pub fn set_member(&self, actor: ActorId, faction: FactionId) {
        self.members.insert(actor, faction);
    }

    pub fn remove_member(&self, actor: ActorId) {
        self.members.remove(&actor);
    }

    /// Record a faction's territory centre and its claimed cells.
    pub fn set_territory(&self, faction: FactionId, center: Location, claims: Vec<MapCell>) {
        self.territories
            .insert(faction, TerritoryEntry { center, claims });
    }

    /// Simulate the backing service going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), DirectoryError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DirectoryError::Unavailable("faction"))
        }
    }
}

impl FactionDirectory for InMemoryFactions {
    fn faction(&self, id: FactionId) -> Result<Option<Faction>, DirectoryError> {
        self.ensure_available()?;
        Ok(self.factions.get(&id).map(|f| f.clone()))
    }

    fn faction_of(&self, actor: ActorId) -> Result<Option<Faction>, DirectoryError> {
        self.ensure_available()?;
        let Some(id) = self.members.get(&actor).map(|f| *f) else {
            return Ok(None);
        };
        Ok(self.factions.get(&id).map(|f| f.clone()))
    }

    fn claimed_cells(&self, world: &WorldId) -> Result<HashSet<MapCell>, DirectoryError> {
        self.ensure_available()?;
        Ok(self
            .territories
            .iter()
            .filter(|entry| entry.center.world == *world)
            .flat_map(|entry| entry.claims.clone())
            .collect())
    }

    fn territory_centers(&self) -> Result<Vec<Location>, DirectoryError> {
        self.ensure_available()?;
        let mut centers: Vec<(FactionId, Location)> = self
            .territories
            .iter()
            .map(|entry| (*entry.key(), entry.center.clone()))
            .collect();
        centers.sort_by_key(|(id, _)| *id);
        Ok(centers.into_iter().map(|(_, center)| center).collect())
    }
}

#[derive(Debug, Clone)]
struct ActorEntry {
    location: Location,
    rank: Option<u8>,
}

/// Actor directory held entirely in memory.
#[derive(Debug)]
pub struct InMemoryActors {
    actors: DashMap<ActorId, ActorEntry>,
    available: AtomicBool,
}

impl Default for InMemoryActors {
    fn default() -> Self {
        Self {
            actors: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }
}

impl InMemoryActors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, id: ActorId, location: Location) {
        self.actors.insert(
            id,
            ActorEntry {
                location,
                rank: None,
            },
        );
    }

    pub fn disconnect(&self, id: ActorId) -> bool {
        self.actors.remove(&id).is_some()
    }

    /// Move a connected actor; returns false if it is not online.
    pub fn move_to(&self, id: ActorId, location: Location) -> bool {
        match self.actors.get_mut(&id) {
            Some(mut entry) => {
                entry.location = location;
                true
            }
            None => false,
        }
    }

    pub fn set_rank(&self, id: ActorId, rank: Option<u8>) {
        if let Some(mut entry) = self.actors.get_mut(&id) {
            entry.rank = rank;
        }
    }

    pub fn location_of(&self, id: ActorId) -> Option<Location> {
        self.actors.get(&id).map(|entry| entry.location.clone())
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl ActorDirectory for InMemoryActors {
    fn online_actors(&self) -> Result<Vec<ActorSnapshot>, DirectoryError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("actor"));
        }
        let mut actors: Vec<ActorSnapshot> = self
            .actors
            .iter()
            .map(|entry| ActorSnapshot {
                id: *entry.key(),
                location: entry.location.clone(),
            })
            .collect();
        actors.sort_by_key(|a| a.id);
        Ok(actors)
    }

    fn online_count(&self) -> Result<usize, DirectoryError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("actor"));
        }
        Ok(self.actors.len())
    }

    fn progression_rank(&self, actor: ActorId) -> Option<u8> {
        self.actors.get(&actor).and_then(|entry| entry.rank)
    }
}
