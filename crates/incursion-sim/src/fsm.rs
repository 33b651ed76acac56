//! Event phase state machine.
//!
//! A pure function from the controller's situation to the next step. The
//! controller applies the step's side effects; nothing here touches zones
//! or capture state.

use incursion_core::enums::{EndReason, EventPhase, StartTrigger};

/// Input to the phase FSM for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseContext {
    pub phase: EventPhase,
    pub now_ms: u64,
    pub cooldown_ends_at_ms: u64,
    /// Connected actors; `None` while the actor directory is unavailable.
    pub online: Option<usize>,
    pub min_actors: usize,
    /// Countdown seconds left on the current event (Starting only).
    pub countdown_remaining: u32,
    /// Planned end of the current event, if one exists.
    pub planned_end_ms: Option<u64>,
}

/// What the controller should do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStep {
    /// Nothing to do.
    Stay,
    /// Idle -> Starting.
    Begin(StartTrigger),
    /// Starting self-loop with the countdown after this tick.
    Countdown { remaining: u32 },
    /// Starting -> Active (countdown reached zero this tick).
    Activate,
    /// Active self-loop: run capture and announcements.
    Run,
    /// Active -> Ending.
    End(EndReason),
    /// Ending -> Idle.
    Conclude,
    /// Non-idle phase without an event; drop straight back to Idle.
    Abandon,
}

/// Evaluate the FSM for one tick.
pub fn evaluate(ctx: &PhaseContext) -> PhaseStep {
    match ctx.phase {
        EventPhase::Idle => evaluate_idle(ctx),
        EventPhase::Starting => evaluate_starting(ctx),
        EventPhase::Active => evaluate_active(ctx),
        EventPhase::Ending => PhaseStep::Conclude,
    }
}

fn evaluate_idle(ctx: &PhaseContext) -> PhaseStep {
    if ctx.now_ms < ctx.cooldown_ends_at_ms {
        return PhaseStep::Stay;
    }
    match ctx.online {
        Some(online) if online >= ctx.min_actors => PhaseStep::Begin(StartTrigger::Natural),
        _ => PhaseStep::Stay,
    }
}

fn evaluate_starting(ctx: &PhaseContext) -> PhaseStep {
    if ctx.planned_end_ms.is_none() {
        return PhaseStep::Abandon;
    }
    match ctx.countdown_remaining.saturating_sub(1) {
        0 => PhaseStep::Activate,
        remaining => PhaseStep::Countdown { remaining },
    }
}

fn evaluate_active(ctx: &PhaseContext) -> PhaseStep {
    let Some(planned_end) = ctx.planned_end_ms else {
        return PhaseStep::Abandon;
    };
    if ctx.now_ms >= planned_end {
        return PhaseStep::End(EndReason::DurationElapsed);
    }
    match ctx.online {
        Some(online) if online < ctx.min_actors => PhaseStep::End(EndReason::NotEnoughActors),
        _ => PhaseStep::Run,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(phase: EventPhase) -> PhaseContext {
        PhaseContext {
            phase,
            now_ms: 10_000,
            cooldown_ends_at_ms: 0,
            online: Some(35),
            min_actors: 30,
            countdown_remaining: 60,
            planned_end_ms: Some(20_000),
        }
    }

    #[test]
    fn test_idle_starts_when_ready() {
        assert_eq!(
            evaluate(&ctx(EventPhase::Idle)),
            PhaseStep::Begin(StartTrigger::Natural)
        );
    }

    #[test]
    fn test_idle_waits_for_cooldown_and_actors() {
        let mut c = ctx(EventPhase::Idle);
        c.cooldown_ends_at_ms = 10_001;
        assert_eq!(evaluate(&c), PhaseStep::Stay);

        let mut c = ctx(EventPhase::Idle);
        c.online = Some(29);
        assert_eq!(evaluate(&c), PhaseStep::Stay);

        let mut c = ctx(EventPhase::Idle);
        c.cooldown_ends_at_ms = 10_000;
        c.online = Some(30);
        assert_eq!(evaluate(&c), PhaseStep::Begin(StartTrigger::Natural));
    }

    #[test]
    fn test_starting_counts_down_then_activates() {
        let c = ctx(EventPhase::Starting);
        assert_eq!(evaluate(&c), PhaseStep::Countdown { remaining: 59 });

        let mut c = ctx(EventPhase::Starting);
        c.countdown_remaining = 1;
        assert_eq!(evaluate(&c), PhaseStep::Activate);

        let mut c = ctx(EventPhase::Starting);
        c.countdown_remaining = 0;
        assert_eq!(evaluate(&c), PhaseStep::Activate);
    }

    #[test]
    fn test_active_exit_conditions() {
        assert_eq!(evaluate(&ctx(EventPhase::Active)), PhaseStep::Run);

        let mut c = ctx(EventPhase::Active);
        c.now_ms = 20_000;
        c.online = Some(0);
        assert_eq!(
            evaluate(&c),
            PhaseStep::End(EndReason::DurationElapsed),
            "duration is checked first"
        );

        let mut c = ctx(EventPhase::Active);
        c.online = Some(29);
        assert_eq!(evaluate(&c), PhaseStep::End(EndReason::NotEnoughActors));
    }

    #[test]
    fn test_unknown_actor_count() {
        let mut c = ctx(EventPhase::Idle);
        c.online = None;
        assert_eq!(evaluate(&c), PhaseStep::Stay);

        c.phase = EventPhase::Active;
        assert_eq!(evaluate(&c), PhaseStep::Run);

        c.now_ms = 20_000;
        assert_eq!(evaluate(&c), PhaseStep::End(EndReason::DurationElapsed));

        c.phase = EventPhase::Starting;
        assert_eq!(evaluate(&c), PhaseStep::Countdown { remaining: 59 });
    }

    #[test]
    fn test_ending_always_concludes() {
        assert_eq!(evaluate(&ctx(EventPhase::Ending)), PhaseStep::Conclude);
    }

    #[test]
    fn test_missing_event_abandons() {
        let mut c = ctx(EventPhase::Active);
        c.planned_end_ms = None;
        assert_eq!(evaluate(&c), PhaseStep::Abandon);
        c.phase = EventPhase::Starting;
        assert_eq!(evaluate(&c), PhaseStep::Abandon);
    }
}
