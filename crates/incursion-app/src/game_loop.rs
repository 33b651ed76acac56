//! Event loop thread.
//!
//! Owns the `EventController` and drives its two periodic units on their
//! own deadlines: the event tick (which also runs the capture tick while
//! Active) and the faster containment poll. Both periods come from the
//! controller's config. Commands arrive between ticks
//! over an `mpsc` channel; the loop sleeps in `recv_timeout` until the
//! next deadline or command, whichever comes first.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use incursion_core::commands::ControlCommand;
use incursion_core::config::IncursionConfig;
use incursion_core::state::EngineSnapshot;
use incursion_sim::EventController;

use crate::error::AppError;
use crate::state::{LoopCommand, LoopLiveness};

/// Periods of the two loop units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    pub event_tick: Duration,
    pub containment_poll: Duration,
}

impl LoopTiming {
    pub fn from_config(config: &IncursionConfig) -> Self {
        Self {
            event_tick: Duration::from_millis(config.event_tick_millis.max(1)),
            containment_poll: Duration::from_millis(config.containment_poll_millis.max(1)),
        }
    }
}

/// Spawn the loop thread around `controller`. `liveness` reads alive from
/// here until the thread exits.
pub fn spawn_game_loop(
    controller: EventController,
    latest_snapshot: Arc<Mutex<Option<EngineSnapshot>>>,
    liveness: &LoopLiveness,
) -> Result<(mpsc::Sender<LoopCommand>, JoinHandle<()>), AppError> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>();
    let guard = liveness.enter();

    let handle = std::thread::Builder::new()
        .name("incursion-event-loop".into())
        .spawn(move || {
            let _alive = guard;
            run_game_loop(controller, cmd_rx, &latest_snapshot)
        })
        .map_err(AppError::Spawn)?;

    Ok((cmd_tx, handle))
}

/// Runs until `Shutdown` or until every sender is dropped.
fn run_game_loop(
    mut controller: EventController,
    cmd_rx: mpsc::Receiver<LoopCommand>,
    latest_snapshot: &Mutex<Option<EngineSnapshot>>,
) {
    let timing = LoopTiming::from_config(controller.config());
    info!(
        tick_ms = timing.event_tick.as_millis() as u64,
        poll_ms = timing.containment_poll.as_millis() as u64,
        "event loop started"
    );
    publish(&controller, latest_snapshot);

    let start = Instant::now();
    let mut next_tick = start + timing.event_tick;
    let mut next_poll = start + timing.containment_poll;

    loop {
        let deadline = next_tick.min(next_poll);
        let wait = deadline.saturating_duration_since(Instant::now());

        match cmd_rx.recv_timeout(wait) {
            Ok(LoopCommand::Control { command, reply }) => {
                let applied = apply(&mut controller, command);
                publish(&controller, latest_snapshot);
                if let Some(reply) = reply {
                    let _ = reply.send(applied);
                }
                continue;
            }
            Ok(LoopCommand::Shutdown) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        if now >= next_poll {
            controller.poll_containment();
            next_poll = advance(next_poll, timing.containment_poll, now);
        }
        if now >= next_tick {
            controller.tick();
            publish(&controller, latest_snapshot);
            next_tick = advance(next_tick, timing.event_tick, now);
        }
    }
    info!(phase = %controller.phase(), "event loop stopped");
}

/// Next deadline after `previous`; resets instead of catching up when the
/// loop fell more than two periods behind.
fn advance(previous: Instant, period: Duration, now: Instant) -> Instant {
    let next = previous + period;
    if now > next && now - next > period * 2 {
        warn!(behind_ms = (now - next).as_millis() as u64, "event loop behind schedule");
        now + period
    } else {
        next
    }
}

/// Apply one control command; returns whether it took effect.
pub fn apply(controller: &mut EventController, command: ControlCommand) -> bool {
    debug!(?command, "control command");
    match command {
        ControlCommand::StartEvent { forced } => controller.start_event(forced),
        ControlCommand::ForceStop => controller.force_stop(),
        ControlCommand::RecordKill { killer, victim } => {
            controller.record_kill(killer, victim);
            true
        }
        ControlCommand::RecordDeath { actor } => {
            controller.record_death(actor);
            true
        }
        ControlCommand::ActorDisconnected { actor } => {
            controller.disconnect_handle().disconnect(actor)
        }
    }
}

fn publish(controller: &EventController, latest_snapshot: &Mutex<Option<EngineSnapshot>>) {
    if let Ok(mut lock) = latest_snapshot.lock() {
        *lock = Some(controller.snapshot());
    }
}
