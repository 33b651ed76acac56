//! Enumeration types used throughout the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the incursion controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventPhase {
    /// No event running; trigger conditions are checked every tick.
    #[default]
    Idle,
    /// Zones are placed, countdown in progress.
    Starting,
    /// Zones are live and capture points are ticking.
    Active,
    /// Event is closing; concludes on the next tick.
    Ending,
}

impl fmt::Display for EventPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventPhase::Idle => "IDLE",
            EventPhase::Starting => "STARTING",
            EventPhase::Active => "ACTIVE",
            EventPhase::Ending => "ENDING",
        };
        f.write_str(name)
    }
}

/// Tier assigned to an actor when it enters a zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorTier {
    /// High-rank actors: marked and worn down while inside.
    SpiritWeight,
    /// Everyone else.
    #[default]
    Insignificant,
}

/// What a capture point did on its last tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Nobody present; progress decays.
    #[default]
    Decaying,
    /// A single faction present; progress accrues.
    Capturing,
    /// Two or more factions present; progress frozen.
    Contested,
}

/// How an event got started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartTrigger {
    /// Cooldown elapsed and enough actors online.
    Natural,
    /// Operator command; cooldown and actor checks bypassed.
    Forced,
}

/// Why an active event was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Planned duration elapsed.
    DurationElapsed,
    /// Online actors dropped below the minimum.
    NotEnoughActors,
    /// Operator force-stop.
    ForceStopped,
}

/// Surface material sampled by terrain probing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceMaterial {
    #[default]
    Solid,
    Water,
    Lava,
}

impl SurfaceMaterial {
    pub fn is_liquid(&self) -> bool {
        matches!(self, SurfaceMaterial::Water | SurfaceMaterial::Lava)
    }
}

/// Coarse biome classification used to exclude placements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiomeClass {
    #[default]
    Land,
    Ocean,
    River,
}

impl BiomeClass {
    /// Biomes a zone may never be centred in.
    pub fn is_disallowed(&self) -> bool {
        matches!(self, BiomeClass::Ocean | BiomeClass::River)
    }
}
