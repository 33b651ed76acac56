//! Incursion engine: event state machine, zone registry and capture.
//!
//! Headless and host-agnostic. The host drives `EventController::tick`
//! and `EventController::poll_containment` from its own timers and drains
//! notices from a `NoticeSink`.

pub mod capture;
pub mod controller;
pub mod event;
pub mod fsm;
pub mod notify;
pub mod watch;
pub mod zone;
pub mod zone_registry;

pub use controller::{Collaborators, DisconnectHandle, EventController};
pub use incursion_core as core;
