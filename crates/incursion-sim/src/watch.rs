//! Containment poll.
//!
//! Runs several times per tick while the event is Active: every connected
//! actor is checked against the active zones and the registry's actor
//! index, and only actual transitions produce enter/exit notices. Actors
//! outside every zone get approach warnings, rate-limited per band.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use incursion_core::config::{IncursionConfig, MILLIS_PER_SECOND};
use incursion_core::directory::ActorDirectory;
use incursion_core::enums::ActorTier;
use incursion_core::error::DirectoryError;
use incursion_core::events::Notice;
use incursion_core::types::{ActorId, Location, ZoneId};

use crate::zone_registry::{ZoneRegistry, ZoneTransition};

/// Per-actor record while inside a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupantState {
    pub zone: ZoneId,
    pub tier: ActorTier,
    pub entered_at_ms: u64,
}

/// Tier from an optional progression rank.
pub fn tier_for(rank: Option<u8>, config: &IncursionConfig) -> ActorTier {
    match rank {
        Some(r) if (config.tier_min_sequence..=config.tier_max_sequence).contains(&r) => {
            ActorTier::SpiritWeight
        }
        _ => ActorTier::Insignificant,
    }
}

pub struct ZoneWatch {
    config: Arc<IncursionConfig>,
    registry: Arc<ZoneRegistry>,
    occupants: DashMap<ActorId, OccupantState>,
    /// Last warning instant per (actor, band bits).
    warnings: DashMap<(ActorId, u64), u64>,
}

impl ZoneWatch {
    pub fn new(config: Arc<IncursionConfig>, registry: Arc<ZoneRegistry>) -> Self {
        Self {
            config,
            registry,
            occupants: DashMap::new(),
            warnings: DashMap::new(),
        }
    }

    /// Check every connected actor once.
    pub fn poll(
        &self,
        now_ms: u64,
        actors: &dyn ActorDirectory,
    ) -> Result<Vec<Notice>, DirectoryError> {
        let online = actors.online_actors()?;
        let mut notices = Vec::new();

        for actor in &online {
            let zone = self.registry.zone_at(&actor.location);
            match self.registry.update_actor_zone(actor.id, zone) {
                ZoneTransition::Entered(to) => {
                    notices.push(self.enter(actor.id, to, now_ms, actors));
                }
                ZoneTransition::Exited(from) => {
                    notices.push(self.exit(actor.id, from, now_ms));
                }
                ZoneTransition::Moved { from, to } => {
                    notices.push(self.exit(actor.id, from, now_ms));
                    notices.push(self.enter(actor.id, to, now_ms, actors));
                }
                ZoneTransition::Unchanged => {
                    if zone.is_none() {
                        notices.extend(self.approach(actor.id, &actor.location, now_ms));
                    }
                }
            }
        }

        // Indexed actors that vanished without a disconnect notice.
        let connected: HashSet<ActorId> = online.iter().map(|a| a.id).collect();
        for (actor, _) in self.registry.indexed_actors() {
            if !connected.contains(&actor) {
                notices.extend(self.forget(actor, now_ms));
            }
        }

        Ok(notices)
    }

    /// Drop an actor (disconnect). Emits an exit if it was inside a zone.
    pub fn forget(&self, actor: ActorId, now_ms: u64) -> Option<Notice> {
        self.warnings.retain(|(who, _), _| *who != actor);
        let zone = self.registry.remove_actor(actor)?;
        Some(self.exit(actor, zone, now_ms))
    }

    /// Exit every tracked actor; used when the event closes.
    pub fn release_all(&self, now_ms: u64) -> Vec<Notice> {
        let notices = self
            .registry
            .indexed_actors()
            .into_iter()
            .filter_map(|(actor, _)| self.forget(actor, now_ms))
            .collect();
        self.clear();
        notices
    }

    pub fn occupant(&self, actor: ActorId) -> Option<OccupantState> {
        self.occupants.get(&actor).map(|s| *s)
    }

    pub fn time_in_zone_secs(&self, actor: ActorId, now_ms: u64) -> Option<u64> {
        self.occupant(actor)
            .map(|s| now_ms.saturating_sub(s.entered_at_ms) / MILLIS_PER_SECOND)
    }

    pub fn clear(&self) {
        self.occupants.clear();
        self.warnings.clear();
    }

    fn enter(
        &self,
        actor: ActorId,
        zone: ZoneId,
        now_ms: u64,
        actors: &dyn ActorDirectory,
    ) -> Notice {
        let tier = tier_for(actors.progression_rank(actor), &self.config);
        self.occupants.insert(
            actor,
            OccupantState {
                zone,
                tier,
                entered_at_ms: now_ms,
            },
        );
        self.warnings.retain(|(who, _), _| *who != actor);
        let zone_name = self.registry.zone_name(zone).unwrap_or_default();
        debug!(actor = actor.0, zone = %zone_name, ?tier, "actor entered zone");
        Notice::ZoneEntered {
            actor,
            zone,
            zone_name,
            tier,
        }
    }

    fn exit(&self, actor: ActorId, zone: ZoneId, now_ms: u64) -> Notice {
        let secs_inside = self
            .occupants
            .remove(&actor)
            .map(|(_, s)| now_ms.saturating_sub(s.entered_at_ms) / MILLIS_PER_SECOND)
            .unwrap_or(0);
        let zone_name = self.registry.zone_name(zone).unwrap_or_default();
        debug!(actor = actor.0, zone = %zone_name, secs_inside, "actor left zone");
        Notice::ZoneExited {
            actor,
            zone,
            zone_name,
            secs_inside,
        }
    }

    fn approach(&self, actor: ActorId, location: &Location, now_ms: u64) -> Option<Notice> {
        let nearest = self.registry.nearest_zone(location)?;
        let distance = nearest.edge_distance;
        if distance <= 0.0 {
            return None;
        }
        let band = self
            .config
            .approach_warning_distances
            .iter()
            .copied()
            .filter(|band| distance <= *band)
            .fold(None, |best: Option<f64>, band| match best {
                Some(b) if b <= band => Some(b),
                _ => Some(band),
            })?;

        let cooldown = self.config.approach_warning_cooldown_seconds * MILLIS_PER_SECOND;
        let key = (actor, band.to_bits());
        if let Some(last) = self.warnings.get(&key).map(|t| *t) {
            if now_ms.saturating_sub(last) < cooldown {
                return None;
            }
        }
        self.warnings.insert(key, now_ms);

        Some(Notice::ZoneApproach {
            actor,
            zone: nearest.id,
            zone_name: nearest.name,
            distance,
            band,
        })
    }
}
