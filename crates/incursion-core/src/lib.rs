//! Core types and definitions for the incursion engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! identities and geometry, configuration, notifications, snapshots,
//! control commands, and the collaborator interfaces the engine reads from.
//! It has no dependency on any host runtime.

pub mod clock;
pub mod commands;
pub mod config;
pub mod directory;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
