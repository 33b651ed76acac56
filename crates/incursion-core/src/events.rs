//! Notifications pushed by the engine to presentation, effects and reward layers.
//!
//! Fire-and-forget: the engine never waits on a consumer.

use serde::{Deserialize, Serialize};

use crate::enums::{ActorTier, EndReason, EventPhase};
use crate::state::CaptureView;
use crate::types::{ActorId, EventId, FactionId, PointId, ZoneId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notice {
    /// Controller changed phase.
    PhaseChanged { from: EventPhase, to: EventPhase },
    /// Server-wide announcement text.
    Broadcast { message: String },
    /// Actor crossed into a zone.
    ZoneEntered {
        actor: ActorId,
        zone: ZoneId,
        zone_name: String,
        tier: ActorTier,
    },
    /// Actor left a zone (walked out, disconnected, or the event closed).
    ZoneExited {
        actor: ActorId,
        zone: ZoneId,
        zone_name: String,
        secs_inside: u64,
    },
    /// Actor outside every zone is getting close to one.
    ZoneApproach {
        actor: ActorId,
        zone: ZoneId,
        zone_name: String,
        distance: f64,
        band: f64,
    },
    /// Per-tick capture state of a point.
    CaptureChanged { point: PointId, state: CaptureView },
    /// A point changed hands.
    OwnershipChanged {
        point: PointId,
        previous: FactionId,
        owner: FactionId,
        owner_name: Option<String>,
    },
    /// Active event is closing.
    EventClosing { event: EventId, reason: EndReason },
    /// Event concluded; `winner` is `FactionId::NONE` when nobody held a point.
    EventEnded {
        event: EventId,
        winner: FactionId,
        winner_name: Option<String>,
        winner_secs: u64,
    },
}
