//! Incursion host driver.
//!
//! Wires the engine crates to a dedicated loop thread, exposes a control
//! surface over a command channel, and loads config and world files for
//! the `incursion` binary.

pub mod control;
pub mod error;
pub mod game_loop;
pub mod logging;
pub mod state;
pub mod world;

pub use incursion_core as core;
