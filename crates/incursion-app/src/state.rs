//! State shared between the control surface and the loop thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use incursion_core::commands::ControlCommand;
use incursion_core::state::EngineSnapshot;

/// Messages accepted by the loop thread.
#[derive(Debug)]
pub enum LoopCommand {
    /// Apply a control command at the next tick boundary. The outcome is
    /// sent back on `reply` when one is given.
    Control {
        command: ControlCommand,
        reply: Option<mpsc::Sender<bool>>,
    },
    /// Stop the loop thread.
    Shutdown,
}

/// Whether a loop thread is alive. Cleared by the thread itself on exit,
/// including exits by panic, so it never reports a dead loop as running.
#[derive(Debug, Clone, Default)]
pub struct LoopLiveness(Arc<AtomicBool>);

impl LoopLiveness {
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Mark the loop alive until the returned guard is dropped.
    pub fn enter(&self) -> AliveGuard {
        self.0.store(true, Ordering::SeqCst);
        AliveGuard(self.0.clone())
    }
}

/// Held by the loop thread for its whole run.
#[derive(Debug)]
pub struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What the host keeps about its loop.
///
/// `mpsc::Sender` is not `Sync`, so the sender sits behind a `Mutex`. The
/// snapshot slot is replaced by the loop after every tick and command.
#[derive(Default)]
pub struct HostState {
    /// `None` until a loop is spawned and after shutdown.
    pub commands: Mutex<Option<mpsc::Sender<LoopCommand>>>,
    pub snapshot: Arc<Mutex<Option<EngineSnapshot>>>,
    pub liveness: LoopLiveness,
}
