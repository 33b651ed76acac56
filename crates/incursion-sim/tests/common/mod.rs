//! Shared harness for controller integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use incursion_core::clock::ManualClock;
use incursion_core::config::IncursionConfig;
use incursion_core::directory::{InMemoryActors, InMemoryFactions};
use incursion_core::events::Notice;
use incursion_core::types::{ActorId, FactionId, Location, MapCell, Position, WorldId};
use incursion_planner::{FlatSurface, Lake, SurfaceProbe};
use incursion_sim::notify::RecordingSink;
use incursion_sim::{Collaborators, EventController};

pub const F1: FactionId = FactionId(1);
pub const F2: FactionId = FactionId(2);

/// Where the crowd of background actors stands, far from every zone.
pub const CROWD: (f64, f64) = (5000.0, 5000.0);

pub fn loc(x: f64, y: f64) -> Location {
    Location::new(WorldId::new("overworld"), Position::new(x, y, 64.0))
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub factions: Arc<InMemoryFactions>,
    pub actors: Arc<InMemoryActors>,
    pub sink: Arc<RecordingSink>,
    pub controller: EventController,
}

/// Short countdown and a fixed seed; everything else default.
pub fn test_config() -> IncursionConfig {
    IncursionConfig {
        seed: Some(7),
        countdown_seconds: 3,
        ..IncursionConfig::default()
    }
}

/// Four factions with towns at +-1500 on each axis, `online` background
/// actors standing at `CROWD`.
pub fn harness(config: IncursionConfig, online: u64) -> Harness {
    harness_on(config, online, FlatSurface::new(loc(0.0, 0.0), 64.0))
}

pub fn harness_on(config: IncursionConfig, online: u64, surface: FlatSurface) -> Harness {
    let factions = Arc::new(InMemoryFactions::new());
    let towns = [
        (F1, "Avalon", 1500.0, 0.0),
        (F2, "Bastion", -1500.0, 0.0),
        (FactionId(3), "Cinder", 0.0, 1500.0),
        (FactionId(4), "Dusk", 0.0, -1500.0),
    ];
    for (id, name, x, y) in towns {
        factions.add_faction(id, name);
        let center = loc(x, y);
        let home = MapCell::containing(&center.position);
        let claims = (-2..=2)
            .flat_map(|dx| (-2..=2).map(move |dy| MapCell::new(home.x + dx, home.y + dy)))
            .collect();
        factions.set_territory(id, center, claims);
    }

    let actors = Arc::new(InMemoryActors::new());
    for id in 1..=online {
        actors.connect(ActorId(id), loc(CROWD.0, CROWD.1));
    }

    let clock = Arc::new(ManualClock::new(1_000_000));
    let sink = Arc::new(RecordingSink::new());
    let surface: Arc<dyn SurfaceProbe> = Arc::new(surface);
    let controller = EventController::new(
        Arc::new(config),
        Collaborators {
            factions: factions.clone(),
            actors: actors.clone(),
            surface,
            clock: clock.clone(),
            sink: sink.clone(),
        },
    )
    .unwrap();

    Harness {
        clock,
        factions,
        actors,
        sink,
        controller,
    }
}

/// Land covered by one lake larger than the placement ring.
pub fn flooded() -> FlatSurface {
    FlatSurface::new(loc(0.0, 0.0), 64.0).with_lake(Lake {
        x: 0.0,
        y: 0.0,
        radius: 10_000.0,
    })
}

impl Harness {
    /// Advance one second and run an event tick.
    pub fn tick(&mut self) {
        self.clock.advance_secs(1);
        self.controller.tick();
    }

    /// Natural start plus the countdown; leaves the controller Active.
    pub fn run_to_active(&mut self) {
        self.controller.tick();
        let countdown = self
            .controller
            .active_event()
            .map(|e| e.countdown_remaining)
            .unwrap_or(0);
        for _ in 0..countdown {
            self.tick();
        }
    }

    pub fn broadcasts(&self) -> Vec<String> {
        broadcasts(&self.sink.drain())
    }
}

pub fn broadcasts(notices: &[Notice]) -> Vec<String> {
    notices
        .iter()
        .filter_map(|n| match n {
            Notice::Broadcast { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
