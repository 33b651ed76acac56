//! Event controller: the top-level incursion state machine.
//!
//! `EventController` owns the event, the zone registry, the capture engine
//! and the containment watch. It is driven by two periodic calls from the
//! host: `tick` (about once per second) and `poll_containment` (several
//! times per second). Both run to completion and never block.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use incursion_core::clock::Clock;
use incursion_core::config::{render, IncursionConfig, MILLIS_PER_SECOND};
use incursion_core::directory::{ActorDirectory, FactionDirectory};
use incursion_core::enums::{EndReason, EventPhase, StartTrigger};
use incursion_core::error::{ConfigError, ControlError, IncursionError, PlacementError};
use incursion_core::events::Notice;
use incursion_core::state::{EngineSnapshot, EventSnapshot};
use incursion_core::types::{ActorId, EventId, FactionId};
use incursion_planner::{zone_count, PlanningContext, SurfaceProbe, ZonePlanner};

use crate::capture::{CaptureEngine, OwnershipChange};
use crate::event::IncursionEvent;
use crate::fsm::{evaluate, PhaseContext, PhaseStep};
use crate::notify::NoticeSink;
use crate::watch::ZoneWatch;
use crate::zone_registry::ZoneRegistry;

/// Everything the controller reads from or pushes to.
#[derive(Clone)]
pub struct Collaborators {
    pub factions: Arc<dyn FactionDirectory>,
    pub actors: Arc<dyn ActorDirectory>,
    pub surface: Arc<dyn SurfaceProbe>,
    pub clock: Arc<dyn Clock>,
    pub sink: Arc<dyn NoticeSink>,
}

/// Handle of the running capture task. Dropping it stops capture ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CaptureTask {
    armed_at_ms: u64,
}

/// Lets a host thread report disconnects while the loop thread ticks.
#[derive(Clone)]
pub struct DisconnectHandle {
    watch: Arc<ZoneWatch>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NoticeSink>,
}

impl DisconnectHandle {
    /// Remove the actor from zone tracking; returns true if it was inside a zone.
    pub fn disconnect(&self, actor: ActorId) -> bool {
        match self.watch.forget(actor, self.clock.now_millis()) {
            Some(notice) => {
                self.sink.publish(notice);
                true
            }
            None => false,
        }
    }
}

pub struct EventController {
    config: Arc<IncursionConfig>,
    factions: Arc<dyn FactionDirectory>,
    actors: Arc<dyn ActorDirectory>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NoticeSink>,
    planner: ZonePlanner,
    registry: Arc<ZoneRegistry>,
    capture: Arc<CaptureEngine>,
    watch: Arc<ZoneWatch>,

    phase: EventPhase,
    event: Option<IncursionEvent>,
    cooldown_ends_at_ms: u64,
    capture_task: Option<CaptureTask>,
    next_event_id: u64,
    last_winner: Option<FactionId>,
}

impl EventController {
    /// Fails when `config` does not validate.
    pub fn new(
        config: Arc<IncursionConfig>,
        collaborators: Collaborators,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = Arc::new(ZoneRegistry::new());
        let planner = ZonePlanner::new(config.clone(), collaborators.surface.clone());
        Ok(Self {
            capture: Arc::new(CaptureEngine::new(config.clone())),
            watch: Arc::new(ZoneWatch::new(config.clone(), registry.clone())),
            registry,
            planner,
            factions: collaborators.factions,
            actors: collaborators.actors,
            clock: collaborators.clock,
            sink: collaborators.sink,
            config,
            phase: EventPhase::Idle,
            event: None,
            cooldown_ends_at_ms: 0,
            capture_task: None,
            next_event_id: 1,
            last_winner: None,
        })
    }

    // --- Periodic entry points ---

    /// One event tick. Failures are logged and the tick is skipped.
    pub fn tick(&mut self) {
        if let Err(err) = self.try_tick() {
            warn!(phase = %self.phase, error = %err, "event tick failed, skipping");
        }
    }

    fn try_tick(&mut self) -> Result<(), IncursionError> {
        let now = self.clock.now_millis();
        let online = match self.actors.online_count() {
            Ok(online) => Some(online),
            Err(err) => {
                warn!(phase = %self.phase, error = %err, "actor count unavailable");
                None
            }
        };

        let ctx = PhaseContext {
            phase: self.phase,
            now_ms: now,
            cooldown_ends_at_ms: self.cooldown_ends_at_ms,
            online,
            min_actors: self.config.min_actors,
            countdown_remaining: self.event.as_ref().map_or(0, |e| e.countdown_remaining),
            planned_end_ms: self.event.as_ref().map(|e| e.planned_end_ms),
        };

        match evaluate(&ctx) {
            PhaseStep::Stay => {}
            PhaseStep::Begin(trigger) => {
                if let Err(err) = self.begin(trigger, now, online.unwrap_or(0)) {
                    warn!(error = %err, "event start aborted");
                }
            }
            PhaseStep::Countdown { remaining } => self.countdown(remaining),
            PhaseStep::Activate => self.activate(now),
            PhaseStep::Run => self.run(now)?,
            PhaseStep::End(reason) => self.end(reason, now),
            PhaseStep::Conclude => self.conclude(now),
            PhaseStep::Abandon => self.abandon(),
        }
        Ok(())
    }

    /// Containment poll; only does work while Active.
    pub fn poll_containment(&self) {
        if self.phase != EventPhase::Active {
            return;
        }
        match self
            .watch
            .poll(self.clock.now_millis(), self.actors.as_ref())
        {
            Ok(notices) => notices.into_iter().for_each(|n| self.sink.publish(n)),
            Err(err) => warn!(error = %err, "containment poll failed, skipping"),
        }
    }

    // --- Control surface ---

    /// Start an event. `forced` bypasses the cooldown and actor checks.
    pub fn start_event(&mut self, forced: bool) -> bool {
        match self.try_start_event(forced) {
            Ok(()) => true,
            Err(err) => {
                info!(forced, error = %err, "start request refused");
                false
            }
        }
    }

    pub fn try_start_event(&mut self, forced: bool) -> Result<(), ControlError> {
        if self.phase != EventPhase::Idle {
            return Err(ControlError::AlreadyRunning(self.phase));
        }
        let now = self.clock.now_millis();
        if !forced && now < self.cooldown_ends_at_ms {
            return Err(ControlError::CooldownActive {
                remaining_secs: (self.cooldown_ends_at_ms - now) / MILLIS_PER_SECOND,
            });
        }
        let online = self.actors.online_count().unwrap_or_else(|err| {
            warn!(error = %err, "actor count unavailable");
            0
        });
        if !forced && online < self.config.min_actors {
            return Err(ControlError::NotEnoughActors {
                online,
                required: self.config.min_actors,
            });
        }
        let trigger = if forced {
            StartTrigger::Forced
        } else {
            StartTrigger::Natural
        };
        self.begin(trigger, now, online)
    }

    /// Close a Starting or Active event at once.
    pub fn force_stop(&mut self) -> bool {
        self.try_force_stop().is_ok()
    }

    pub fn try_force_stop(&mut self) -> Result<(), ControlError> {
        match self.phase {
            EventPhase::Starting | EventPhase::Active => {
                self.broadcast(self.config.messages.event_force_stopped.clone());
                self.end(EndReason::ForceStopped, self.clock.now_millis());
                Ok(())
            }
            EventPhase::Idle | EventPhase::Ending => Err(ControlError::NotRunning),
        }
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    pub fn config(&self) -> &Arc<IncursionConfig> {
        &self.config
    }

    pub fn active_event(&self) -> Option<EventSnapshot> {
        let now = self.clock.now_millis();
        self.event.as_ref().map(|e| e.snapshot(now))
    }

    pub fn remaining_cooldown_secs(&self) -> u64 {
        self.cooldown_ends_at_ms
            .saturating_sub(self.clock.now_millis())
            / MILLIS_PER_SECOND
    }

    /// Count a kill (and the victim's death). Ignored outside Active.
    pub fn record_kill(&mut self, killer: ActorId, victim: ActorId) {
        if self.phase != EventPhase::Active {
            return;
        }
        if let Some(event) = self.event.as_mut() {
            event.record_kill();
            event.record_death();
            debug!(killer = killer.0, victim = victim.0, "kill recorded");
        }
    }

    /// Count a death without a killer. Ignored outside Active.
    pub fn record_death(&mut self, actor: ActorId) {
        if self.phase != EventPhase::Active {
            return;
        }
        if let Some(event) = self.event.as_mut() {
            event.record_death();
            debug!(actor = actor.0, "death recorded");
        }
    }

    pub fn disconnect_handle(&self) -> DisconnectHandle {
        DisconnectHandle {
            watch: self.watch.clone(),
            clock: self.clock.clone(),
            sink: self.sink.clone(),
        }
    }

    pub fn registry(&self) -> &Arc<ZoneRegistry> {
        &self.registry
    }

    pub fn capture(&self) -> &Arc<CaptureEngine> {
        &self.capture
    }

    pub fn watch(&self) -> &Arc<ZoneWatch> {
        &self.watch
    }

    /// Winner of the most recently concluded event.
    pub fn last_winner(&self) -> Option<FactionId> {
        self.last_winner
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase,
            event: self.active_event(),
            cooldown_remaining_secs: self.remaining_cooldown_secs(),
            zones: self.registry.zones(),
            captures: self.capture.views(),
            last_winner: self.last_winner,
        }
    }

    // --- Transitions ---

    fn transition(&mut self, to: EventPhase) {
        if self.phase == to {
            return;
        }
        let from = self.phase;
        self.phase = to;
        info!(%from, %to, "event phase transition");
        self.sink.publish(Notice::PhaseChanged { from, to });
    }

    fn broadcast(&self, message: String) {
        info!(%message, "broadcast");
        self.sink.publish(Notice::Broadcast { message });
    }

    /// Idle -> Starting: place zones, derive capture points, start the countdown.
    fn begin(&mut self, trigger: StartTrigger, now: u64, online: usize) -> Result<(), ControlError> {
        let target = zone_count(&self.config, online);

        let territory = self.factions.territory_centers().unwrap_or_else(|err| {
            warn!(error = %err, "faction territory unavailable, treating as empty");
            Vec::new()
        });
        let world = self.planner.world();
        let claimed = self.factions.claimed_cells(&world).unwrap_or_else(|err| {
            warn!(error = %err, "claimed cells unavailable, treating as empty");
            HashSet::new()
        });

        self.registry.clear();
        self.capture.clear();
        self.watch.clear();

        let placements = self.planner.plan(
            target,
            &PlanningContext {
                territory_centers: &territory,
                claimed: &claimed,
                existing: &[],
            },
        );
        if placements.is_empty() {
            warn!(requested = target, "no valid zone location, event cancelled");
            self.broadcast(self.config.messages.event_cancelled.clone());
            return Err(PlacementError::NoValidZones { requested: target }.into());
        }

        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        let mut event = IncursionEvent::new(id, now, &self.config);

        for placement in placements {
            let name = placement.name.clone();
            let center = placement.center.clone();
            let radius = placement.radius;
            let zone = self.registry.register(placement);
            event.add_zone(zone);
            for point in self.capture.derive_points(zone, &name, &center, radius) {
                self.capture.install(point, now);
            }
        }

        info!(
            event = id.0,
            ?trigger,
            zones = event.zones.len(),
            requested = target,
            points = self.capture.point_count(),
            countdown = event.countdown_remaining,
            "event starting"
        );
        let countdown = event.countdown_remaining;
        self.event = Some(event);
        self.transition(EventPhase::Starting);
        self.broadcast(render(
            &self.config.messages.event_starting,
            &[("countdown", countdown.to_string())],
        ));
        Ok(())
    }

    fn countdown(&mut self, remaining: u32) {
        if let Some(event) = self.event.as_mut() {
            event.countdown_remaining = remaining;
        }
        if self.config.announces_countdown(remaining) {
            self.broadcast(render(
                &self.config.messages.event_starting,
                &[("countdown", remaining.to_string())],
            ));
        }
    }

    /// Starting -> Active: open the zones and start the possession clock.
    fn activate(&mut self, now: u64) {
        let zones = match self.event.as_mut() {
            Some(event) => {
                event.countdown_remaining = 0;
                event.zones.len()
            }
            None => 0,
        };
        self.registry.activate_all();
        if self.capture.has_points() {
            self.capture.arm(now);
            self.capture_task = Some(CaptureTask { armed_at_ms: now });
        }
        self.transition(EventPhase::Active);
        self.broadcast(render(
            &self.config.messages.event_started,
            &[("zones", zones.to_string())],
        ));
    }

    /// Active self-loop. Capture is computed before anything is announced
    /// so a failing tick changes nothing.
    fn run(&mut self, now: u64) -> Result<(), IncursionError> {
        if self.capture_task.is_some() {
            let actors = self.actors.online_actors()?;
            let updates = self.capture.tick(now, &actors, self.factions.as_ref())?;
            for update in updates {
                if let Some(change) = update.ownership {
                    let (previous, owner) = match change {
                        OwnershipChange::Captured { previous, owner } => (previous, owner),
                        OwnershipChange::Lost { previous } => (previous, FactionId::NONE),
                    };
                    self.sink.publish(Notice::OwnershipChanged {
                        point: update.point,
                        previous,
                        owner,
                        owner_name: update.view.owner_name.clone(),
                    });
                }
                self.sink.publish(Notice::CaptureChanged {
                    point: update.point,
                    state: update.view,
                });
            }
        }

        let marks = self.config.time_remaining_announcements.clone();
        let due = self
            .event
            .as_mut()
            .and_then(|event| event.due_reminder(now, &marks));
        if let Some(minutes) = due {
            self.broadcast(render(
                &self.config.messages.event_time_remaining,
                &[("minutes", minutes.to_string())],
            ));
        }
        Ok(())
    }

    /// Starting/Active -> Ending.
    fn end(&mut self, reason: EndReason, now: u64) {
        if let Some(task) = self.capture_task.take() {
            self.capture.settle(now);
            debug!(
                ran_for_secs = now.saturating_sub(task.armed_at_ms) / MILLIS_PER_SECOND,
                "capture task stopped"
            );
        }
        self.broadcast(self.config.messages.event_ending.clone());
        if let Some(event) = &self.event {
            info!(event = event.id.0, ?reason, "event ending");
            self.sink.publish(Notice::EventClosing {
                event: event.id,
                reason,
            });
        }
        self.transition(EventPhase::Ending);
    }

    /// Ending -> Idle: release occupants, report the winner, start the cooldown.
    fn conclude(&mut self, now: u64) {
        for notice in self.watch.release_all(now) {
            self.sink.publish(notice);
        }
        self.registry.deactivate_all();

        let winner = if self.capture.has_points() {
            self.capture.winner()
        } else {
            None
        };
        let (winner_id, winner_millis) = winner.unwrap_or((FactionId::NONE, 0));
        let winner_name = if winner_id.is_none() {
            None
        } else {
            self.factions
                .faction(winner_id)
                .ok()
                .flatten()
                .map(|f| f.name)
        };

        if let Some(event) = self.event.take() {
            info!(
                event = event.id.0,
                winner = winner_id.0,
                winner_secs = winner_millis / MILLIS_PER_SECOND,
                kills = event.total_kills,
                deaths = event.total_deaths,
                "event concluded"
            );
            if !winner_id.is_none() {
                let name = winner_name
                    .clone()
                    .unwrap_or_else(|| format!("Faction {}", winner_id.0));
                self.broadcast(render(
                    &self.config.messages.event_winner,
                    &[("faction", name)],
                ));
            }
            self.broadcast(self.config.messages.event_ended.clone());
            self.sink.publish(Notice::EventEnded {
                event: event.id,
                winner: winner_id,
                winner_name,
                winner_secs: winner_millis / MILLIS_PER_SECOND,
            });
        }
        self.last_winner = Some(winner_id).filter(|w| !w.is_none());

        self.capture.reset_all(now);
        self.capture.clear();
        self.registry.clear();
        self.capture_task = None;

        self.cooldown_ends_at_ms = now + self.config.cooldown_millis();
        info!(minutes = self.config.cooldown_minutes, "cooldown started");
        self.transition(EventPhase::Idle);
    }

    /// Non-idle phase with no event: drop back to Idle without a cooldown.
    fn abandon(&mut self) {
        warn!(phase = %self.phase, "no event in a running phase, returning to idle");
        self.watch.clear();
        self.registry.clear();
        self.capture.clear();
        self.capture_task = None;
        self.transition(EventPhase::Idle);
    }
}
