//! Read-only views of engine state handed to the host and UI layers.

use serde::{Deserialize, Serialize};

use crate::enums::{CaptureMode, EventPhase};
use crate::types::{ActorId, EventId, FactionId, Location, PointId, ZoneId};

/// A zone as seen from outside the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneView {
    pub id: ZoneId,
    pub name: String,
    pub center: Location,
    pub radius: f64,
    pub active: bool,
    /// Occupants sorted by id.
    pub occupants: Vec<ActorId>,
}

/// Capture state of one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureView {
    pub point: PointId,
    pub name: String,
    pub zone: ZoneId,
    pub location: Location,
    pub owner: FactionId,
    pub owner_name: Option<String>,
    pub progress: f64,
    pub max_progress: f64,
    pub contested: bool,
    pub mode: CaptureMode,
    /// Seconds this point has been held uncontested (any owner).
    pub owned_secs: u64,
}

impl CaptureView {
    /// Progress as a percentage of the maximum.
    pub fn percentage(&self) -> f64 {
        if self.max_progress <= 0.0 {
            return 0.0;
        }
        self.progress / self.max_progress * 100.0
    }
}

/// The running event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub id: EventId,
    pub started_at_ms: u64,
    pub planned_end_ms: u64,
    pub countdown_remaining: u32,
    pub remaining_secs: u64,
    pub zones: Vec<ZoneId>,
    pub total_kills: u32,
    pub total_deaths: u32,
}

/// Everything the host may want to render after a tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub phase: EventPhase,
    pub event: Option<EventSnapshot>,
    pub cooldown_remaining_secs: u64,
    pub zones: Vec<ZoneView>,
    pub captures: Vec<CaptureView>,
    /// Winner of the most recently concluded event, if any.
    pub last_winner: Option<FactionId>,
}
