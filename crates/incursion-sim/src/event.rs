//! The running incursion event.

use std::collections::BTreeSet;

use incursion_core::config::{IncursionConfig, MILLIS_PER_MINUTE, MILLIS_PER_SECOND};
use incursion_core::state::EventSnapshot;
use incursion_core::types::{EventId, ZoneId};

#[derive(Debug, Clone, PartialEq)]
pub struct IncursionEvent {
    pub id: EventId,
    pub started_at_ms: u64,
    pub planned_end_ms: u64,
    pub countdown_remaining: u32,
    pub zones: Vec<ZoneId>,
    pub total_kills: u32,
    pub total_deaths: u32,
    /// Time-remaining marks (minutes) already announced.
    announced: BTreeSet<u64>,
}

impl IncursionEvent {
    /// Created on the Idle -> Starting transition; the planned end counts
    /// from this instant.
    pub fn new(id: EventId, now_ms: u64, config: &IncursionConfig) -> Self {
        Self {
            id,
            started_at_ms: now_ms,
            planned_end_ms: now_ms + config.duration_millis(),
            countdown_remaining: config.countdown_seconds,
            zones: Vec::new(),
            total_kills: 0,
            total_deaths: 0,
            announced: BTreeSet::new(),
        }
    }

    pub fn add_zone(&mut self, zone: ZoneId) {
        self.zones.push(zone);
    }

    pub fn remaining_millis(&self, now_ms: u64) -> u64 {
        self.planned_end_ms.saturating_sub(now_ms)
    }

    pub fn record_kill(&mut self) {
        self.total_kills += 1;
    }

    pub fn record_death(&mut self) {
        self.total_deaths += 1;
    }

    /// Smallest time-remaining mark crossed since the last call, if any.
    /// Every crossed mark is consumed so a late tick announces once.
    pub fn due_reminder(&mut self, now_ms: u64, marks: &[u64]) -> Option<u64> {
        let remaining = self.remaining_millis(now_ms);
        if remaining == 0 {
            return None;
        }
        let crossed: Vec<u64> = marks
            .iter()
            .copied()
            .filter(|m| *m > 0 && remaining <= m * MILLIS_PER_MINUTE)
            .filter(|m| !self.announced.contains(m))
            .collect();
        self.announced.extend(crossed.iter().copied());
        crossed.into_iter().min()
    }

    pub fn snapshot(&self, now_ms: u64) -> EventSnapshot {
        EventSnapshot {
            id: self.id,
            started_at_ms: self.started_at_ms,
            planned_end_ms: self.planned_end_ms,
            countdown_remaining: self.countdown_remaining,
            remaining_secs: self.remaining_millis(now_ms) / MILLIS_PER_SECOND,
            zones: self.zones.clone(),
            total_kills: self.total_kills,
            total_deaths: self.total_deaths,
        }
    }
}
