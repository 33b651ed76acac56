//! Control surface: the operator-facing API over the loop thread.
//!
//! Commands go through the loop's channel and are applied between ticks;
//! queries read the snapshot the loop published last.

use std::sync::mpsc;
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use incursion_core::commands::ControlCommand;
use incursion_core::enums::EventPhase;
use incursion_core::state::{EngineSnapshot, EventSnapshot};
use incursion_core::types::ActorId;
use incursion_sim::EventController;

use crate::error::AppError;
use crate::game_loop;
use crate::state::{HostState, LoopCommand};

/// How long a command waits for the loop to answer.
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct ControlSurface {
    state: HostState,
    /// Also serializes `start` calls.
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ControlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the loop thread around `controller`.
    pub fn start(&self, controller: EventController) -> Result<(), AppError> {
        let mut slot = self.handle.lock().map_err(|_| AppError::LoopStopped)?;
        if self.state.liveness.is_alive() {
            return Err(AppError::AlreadyRunning);
        }
        // Reap a loop that exited on its own.
        if let Some(stale) = slot.take() {
            let _ = stale.join();
        }

        let (cmd_tx, handle) = game_loop::spawn_game_loop(
            controller,
            self.state.snapshot.clone(),
            &self.state.liveness,
        )?;
        let mut commands = self.state.commands.lock().map_err(|_| AppError::LoopStopped)?;
        *commands = Some(cmd_tx);
        *slot = Some(handle);
        info!("control surface attached");
        Ok(())
    }

    /// Send a command and wait for the loop's verdict.
    pub fn send(&self, command: ControlCommand) -> Result<bool, AppError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.post(LoopCommand::Control {
            command,
            reply: Some(reply_tx),
        })?;
        reply_rx
            .recv_timeout(REPLY_TIMEOUT)
            .map_err(|_| AppError::LoopStopped)
    }

    pub fn start_event(&self, forced: bool) -> bool {
        self.send_or_false(ControlCommand::StartEvent { forced })
    }

    pub fn force_stop(&self) -> bool {
        self.send_or_false(ControlCommand::ForceStop)
    }

    pub fn record_kill(&self, killer: ActorId, victim: ActorId) {
        self.post_or_warn(ControlCommand::RecordKill { killer, victim });
    }

    pub fn record_death(&self, actor: ActorId) {
        self.post_or_warn(ControlCommand::RecordDeath { actor });
    }

    pub fn actor_disconnected(&self, actor: ActorId) {
        self.post_or_warn(ControlCommand::ActorDisconnected { actor });
    }

    pub fn snapshot(&self) -> Option<EngineSnapshot> {
        self.state
            .snapshot
            .lock()
            .ok()
            .and_then(|lock| lock.clone())
    }

    pub fn phase(&self) -> EventPhase {
        self.snapshot().map(|s| s.phase).unwrap_or_default()
    }

    pub fn active_event(&self) -> Option<EventSnapshot> {
        self.snapshot().and_then(|s| s.event)
    }

    pub fn remaining_cooldown_secs(&self) -> u64 {
        self.snapshot().map_or(0, |s| s.cooldown_remaining_secs)
    }

    /// Whether the loop thread is alive right now.
    pub fn is_running(&self) -> bool {
        self.state.liveness.is_alive()
    }

    /// Stop the loop thread and wait for it to exit.
    pub fn shutdown(&self) {
        let _ = self.post(LoopCommand::Shutdown);
        if let Ok(mut commands) = self.state.commands.lock() {
            *commands = None;
        }
        let handle = self.handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("event loop thread panicked");
            }
        }
    }

    /// Block until the loop thread exits on its own.
    pub fn wait(&self) {
        let handle = self.handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn post(&self, command: LoopCommand) -> Result<(), AppError> {
        let commands = self.state.commands.lock().map_err(|_| AppError::LoopStopped)?;
        match commands.as_ref() {
            Some(tx) => tx.send(command).map_err(|_| AppError::LoopStopped),
            None => Err(AppError::LoopStopped),
        }
    }

    fn post_or_warn(&self, command: ControlCommand) {
        if let Err(err) = self.post(LoopCommand::Control {
            command,
            reply: None,
        }) {
            warn!(error = %err, "control command dropped");
        }
    }

    fn send_or_false(&self, command: ControlCommand) -> bool {
        self.send(command).unwrap_or_else(|err| {
            warn!(error = %err, "control command failed");
            false
        })
    }
}
