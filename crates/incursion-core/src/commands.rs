//! Operator commands accepted by the control surface.
//!
//! Commands are queued and applied at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::types::ActorId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlCommand {
    /// Start an event; `forced` bypasses cooldown and actor checks.
    StartEvent { forced: bool },
    /// Close the running event immediately.
    ForceStop,
    /// A kill happened inside the running event.
    RecordKill { killer: ActorId, victim: ActorId },
    /// A death happened inside the running event.
    RecordDeath { actor: ActorId },
    /// An actor disconnected.
    ActorDisconnected { actor: ActorId },
}
