//! Capture points and the per-tick capture algorithm.
//!
//! `step` is a pure function from (previous state, faction presence, now)
//! to the next state. `CaptureEngine::tick` evaluates every point into a
//! buffer and only commits once all of them succeeded, so a failing
//! directory lookup leaves the previous tick's state untouched.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use incursion_core::config::{IncursionConfig, MILLIS_PER_SECOND};
use incursion_core::directory::{ActorSnapshot, Faction, FactionDirectory};
use incursion_core::enums::CaptureMode;
use incursion_core::error::DirectoryError;
use incursion_core::state::CaptureView;
use incursion_core::types::{ActorId, FactionId, Location, PointId, ZoneId};

/// A capture point (beacon) bound to one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturePoint {
    pub id: PointId,
    pub name: String,
    pub zone: ZoneId,
    pub location: Location,
}

/// Mutable capture state of one point.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureState {
    pub owner: FactionId,
    pub owner_name: Option<String>,
    pub progress: f64,
    pub contested: bool,
    pub mode: CaptureMode,
    pub last_update_ms: u64,
    /// Uncontested owned time, any owner.
    pub owned_millis: u64,
    /// Uncontested owned time per faction that has held this point.
    pub ledger: BTreeMap<FactionId, u64>,
}

impl CaptureState {
    pub fn new(now_ms: u64) -> Self {
        Self {
            owner: FactionId::NONE,
            owner_name: None,
            progress: 0.0,
            contested: false,
            mode: CaptureMode::Decaying,
            last_update_ms: now_ms,
            owned_millis: 0,
            ledger: BTreeMap::new(),
        }
    }

    fn accrues(&self) -> bool {
        !self.owner.is_none() && !self.contested
    }

    /// Credit time since the last update to the current owner.
    fn accrue(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_update_ms);
        if self.accrues() && elapsed > 0 {
            *self.ledger.entry(self.owner).or_default() += elapsed;
            self.owned_millis += elapsed;
        }
        self.last_update_ms = now_ms;
    }

    fn clear_owner(&mut self) {
        self.owner = FactionId::NONE;
        self.owner_name = None;
        self.progress = 0.0;
    }
}

/// Actors of one faction standing on a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub name: String,
    pub count: usize,
}

/// Ownership change produced by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipChange {
    Captured { previous: FactionId, owner: FactionId },
    Lost { previous: FactionId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: CaptureState,
    pub ownership: Option<OwnershipChange>,
    /// The point went from uncontested to contested.
    pub contest_started: bool,
}

/// Advance one point by one tick.
pub fn step(
    previous: &CaptureState,
    presence: &BTreeMap<FactionId, Presence>,
    now_ms: u64,
    config: &IncursionConfig,
) -> StepOutcome {
    let mut next = previous.clone();
    next.accrue(now_ms);

    let mut ownership = None;
    let mut present = presence.iter();

    match (present.next(), present.next()) {
        (None, _) => {
            next.contested = false;
            next.mode = CaptureMode::Decaying;
            if next.progress > 0.0 {
                next.progress = (next.progress - config.decay_rate).max(0.0);
            }
            if next.progress <= 0.0 {
                if !next.owner.is_none() {
                    ownership = Some(OwnershipChange::Lost {
                        previous: next.owner,
                    });
                }
                next.clear_owner();
            }
        }
        (Some((&faction, who)), None) => {
            next.contested = false;
            next.mode = CaptureMode::Capturing;
            let delta = config.points_per_actor * who.count as f64;
            next.progress = (next.progress + delta).clamp(0.0, config.max_progress);
            if next.progress >= config.max_progress && faction != next.owner {
                ownership = Some(OwnershipChange::Captured {
                    previous: next.owner,
                    owner: faction,
                });
                next.owner = faction;
                next.owner_name = Some(who.name.clone());
                next.ledger.entry(faction).or_insert(0);
            }
        }
        (Some(_), Some(_)) => {
            next.contested = true;
            next.mode = CaptureMode::Contested;
        }
    }

    StepOutcome {
        contest_started: next.contested && !previous.contested,
        state: next,
        ownership,
    }
}

/// One committed point update from a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureUpdate {
    pub point: PointId,
    pub view: CaptureView,
    pub ownership: Option<OwnershipChange>,
}

pub struct CaptureEngine {
    config: Arc<IncursionConfig>,
    points: DashMap<PointId, CapturePoint>,
    states: DashMap<PointId, CaptureState>,
    next_id: AtomicU32,
}

impl CaptureEngine {
    pub fn new(config: Arc<IncursionConfig>) -> Self {
        Self {
            config,
            points: DashMap::new(),
            states: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Lay out `beaconsPerZone` points for a zone: the first at the centre,
    /// the rest evenly spaced on a ring at half the radius.
    pub fn derive_points(
        &self,
        zone: ZoneId,
        zone_name: &str,
        center: &Location,
        radius: f64,
    ) -> Vec<CapturePoint> {
        let count = self.config.beacons_per_zone.max(1);
        let ring = count.saturating_sub(1);
        (0..count)
            .map(|k| {
                let id = PointId(self.next_id.fetch_add(1, Ordering::SeqCst));
                let position = if k == 0 {
                    center.position
                } else {
                    let angle = TAU * (k - 1) as f64 / ring as f64;
                    center
                        .position
                        .offset(radius / 2.0 * angle.sin(), radius / 2.0 * angle.cos())
                };
                let name = if count == 1 {
                    format!("{zone_name} - Beacon")
                } else {
                    format!("{zone_name} - Beacon {}", k + 1)
                };
                CapturePoint {
                    id,
                    name,
                    zone,
                    location: Location::new(center.world.clone(), position),
                }
            })
            .collect()
    }

    /// Add a point with a fresh state.
    pub fn install(&self, point: CapturePoint, now_ms: u64) {
        debug!(point = %point.id, name = %point.name, "capture point installed");
        self.states.insert(point.id, CaptureState::new(now_ms));
        self.points.insert(point.id, point);
    }

    /// Start the possession clock of every point.
    pub fn arm(&self, now_ms: u64) {
        for mut state in self.states.iter_mut() {
            state.last_update_ms = now_ms;
        }
        info!(points = self.points.len(), "capture armed");
    }

    /// Run one capture tick over every point.
    pub fn tick(
        &self,
        now_ms: u64,
        actors: &[ActorSnapshot],
        factions: &dyn FactionDirectory,
    ) -> Result<Vec<CaptureUpdate>, DirectoryError> {
        let radius_sq = self.config.capture_radius * self.config.capture_radius;
        let mut membership: HashMap<ActorId, Option<Faction>> = HashMap::new();
        let mut pending: Vec<(PointId, StepOutcome)> = Vec::with_capacity(self.points.len());

        for point in self.sorted_points() {
            let mut presence: BTreeMap<FactionId, Presence> = BTreeMap::new();
            for actor in actors {
                let inside = point
                    .location
                    .horizontal_range_sq_to(&actor.location)
                    .is_some_and(|d2| d2 <= radius_sq);
                if !inside {
                    continue;
                }
                let faction = match membership.get(&actor.id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let looked_up = factions.faction_of(actor.id)?;
                        membership.insert(actor.id, looked_up.clone());
                        looked_up
                    }
                };
                if let Some(faction) = faction {
                    presence
                        .entry(faction.id)
                        .or_insert_with(|| Presence {
                            name: faction.name.clone(),
                            count: 0,
                        })
                        .count += 1;
                }
            }

            let Some(previous) = self.states.get(&point.id).map(|s| s.clone()) else {
                continue;
            };
            pending.push((point.id, step(&previous, &presence, now_ms, &self.config)));
        }

        let mut updates = Vec::with_capacity(pending.len());
        for (id, outcome) in pending {
            if outcome.contest_started {
                info!(point = %id, "capture point contested");
            }
            match outcome.ownership {
                Some(OwnershipChange::Captured { previous, owner }) => info!(
                    point = %id,
                    previous = previous.0,
                    owner = owner.0,
                    name = outcome.state.owner_name.as_deref().unwrap_or(""),
                    "capture point taken"
                ),
                Some(OwnershipChange::Lost { previous }) => {
                    info!(point = %id, previous = previous.0, "capture point lost")
                }
                None => {}
            }
            self.states.insert(id, outcome.state);
            if let Some(view) = self.view(id) {
                updates.push(CaptureUpdate {
                    point: id,
                    view,
                    ownership: outcome.ownership,
                });
            }
        }
        Ok(updates)
    }

    /// Credit still-accruing time up to `now` without changing anything else.
    pub fn settle(&self, now_ms: u64) {
        for mut state in self.states.iter_mut() {
            state.accrue(now_ms);
        }
    }

    /// Faction with the greatest total possession across all points, with
    /// its total in milliseconds. Ties go to the lowest faction id. `None`
    /// when no faction ever owned a point.
    pub fn winner(&self) -> Option<(FactionId, u64)> {
        let mut totals: BTreeMap<FactionId, u64> = BTreeMap::new();
        for state in self.states.iter() {
            for (faction, millis) in &state.ledger {
                *totals.entry(*faction).or_default() += millis;
            }
        }
        // Ascending id order; a tie keeps the earlier, lower id.
        totals
            .into_iter()
            .fold(None, |best: Option<(FactionId, u64)>, (faction, millis)| {
                match best {
                    Some((_, top)) if millis <= top => best,
                    _ => Some((faction, millis)),
                }
            })
    }

    /// Fresh state for every point.
    pub fn reset_all(&self, now_ms: u64) {
        for mut state in self.states.iter_mut() {
            *state = CaptureState::new(now_ms);
        }
    }

    /// Forget every point.
    pub fn clear(&self) {
        self.points.clear();
        self.states.clear();
    }

    pub fn has_points(&self) -> bool {
        !self.points.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn point(&self, id: PointId) -> Option<CapturePoint> {
        self.points.get(&id).map(|p| p.clone())
    }

    pub fn state(&self, id: PointId) -> Option<CaptureState> {
        self.states.get(&id).map(|s| s.clone())
    }

    pub fn view(&self, id: PointId) -> Option<CaptureView> {
        let point = self.point(id)?;
        let state = self.state(id)?;
        Some(CaptureView {
            point: id,
            name: point.name,
            zone: point.zone,
            location: point.location,
            owner: state.owner,
            owner_name: state.owner_name,
            progress: state.progress,
            max_progress: self.config.max_progress,
            contested: state.contested,
            mode: state.mode,
            owned_secs: state.owned_millis / MILLIS_PER_SECOND,
        })
    }

    /// Views of every point, ordered by id.
    pub fn views(&self) -> Vec<CaptureView> {
        self.sorted_points()
            .into_iter()
            .filter_map(|p| self.view(p.id))
            .collect()
    }

    pub fn percentage(&self, id: PointId) -> Option<f64> {
        self.view(id).map(|v| v.percentage())
    }

    pub fn points_owned_by(&self, faction: FactionId) -> Vec<PointId> {
        if faction.is_none() {
            return Vec::new();
        }
        let mut owned: Vec<PointId> = self
            .states
            .iter()
            .filter(|s| s.owner == faction)
            .map(|s| *s.key())
            .collect();
        owned.sort();
        owned
    }

    /// Possession seconds for a faction across all points, including time
    /// still accruing up to `now`.
    pub fn total_possession_secs(&self, faction: FactionId, now_ms: u64) -> u64 {
        let millis: u64 = self
            .states
            .iter()
            .map(|s| {
                let settled = s.ledger.get(&faction).copied().unwrap_or(0);
                let running = if s.accrues() && s.owner == faction {
                    now_ms.saturating_sub(s.last_update_ms)
                } else {
                    0
                };
                settled + running
            })
            .sum();
        millis / MILLIS_PER_SECOND
    }

    fn sorted_points(&self) -> Vec<CapturePoint> {
        let mut points: Vec<CapturePoint> = self.points.iter().map(|p| p.clone()).collect();
        points.sort_by_key(|p| p.id);
        points
    }
}
