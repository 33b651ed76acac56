//! Engine configuration and tuning parameters.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides. Keys are camelCase in JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Milliseconds per minute.
pub const MILLIS_PER_MINUTE: u64 = 60_000;

/// Milliseconds per second.
pub const MILLIS_PER_SECOND: u64 = 1_000;

/// Largest accepted candidate jitter, in blocks.
pub const MAX_CANDIDATE_JITTER: f64 = 100_000.0;

/// Largest water sample grid edge (samples per axis).
pub const MAX_WATER_SAMPLES_PER_AXIS: f64 = 64.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncursionConfig {
    // --- Event lifecycle ---
    /// Minimum connected actors to start (and keep) an event.
    pub min_actors: usize,
    /// Quiet period after an event concludes.
    pub cooldown_minutes: u64,
    /// Planned event duration, counted from the Idle -> Starting transition.
    pub duration_minutes: u64,
    /// Countdown length in the Starting phase.
    pub countdown_seconds: u32,
    /// Countdown values that get a broadcast.
    pub countdown_announcements: Vec<u32>,
    /// Every countdown value at or below this gets a broadcast.
    pub countdown_final_seconds: u32,
    /// Remaining-minute marks that get a reminder while Active.
    pub time_remaining_announcements: Vec<u64>,

    // --- Zones ---
    pub zone_base_count: usize,
    pub actors_per_zone: usize,
    pub zone_max_count: usize,
    pub zone_radius: f64,
    /// Extra clearance between a zone edge and claimed cells.
    pub town_buffer: f64,
    pub min_zone_separation: f64,

    // --- Placement search ---
    /// Candidates generated per requested zone.
    pub candidate_multiplier: usize,
    /// Maximum jitter added on each horizontal axis.
    pub candidate_jitter: f64,
    /// Mean territory distance used when no territory is known.
    pub fallback_territory_distance: f64,
    /// Half-size of the square sampled for water coverage.
    pub water_sample_radius: f64,
    pub water_sample_step: f64,
    /// Candidates whose sampled area is wetter than this are rejected.
    pub max_water_fraction: f64,
    /// Fixed RNG seed for placement; entropy when absent.
    pub seed: Option<u64>,

    // --- Capture points ---
    pub beacons_per_zone: usize,
    pub capture_radius: f64,
    pub max_progress: f64,
    pub points_per_actor: f64,
    /// Progress lost per tick with nobody present.
    pub decay_rate: f64,

    // --- Tiers ---
    pub tier_min_sequence: u8,
    pub tier_max_sequence: u8,

    // --- Proximity warnings ---
    pub approach_warning_distances: Vec<f64>,
    pub approach_warning_cooldown_seconds: u64,

    // --- Scheduling ---
    pub event_tick_millis: u64,
    pub containment_poll_millis: u64,

    pub messages: MessageTemplates,
}

impl Default for IncursionConfig {
    fn default() -> Self {
        Self {
            min_actors: 30,
            cooldown_minutes: 120,
            duration_minutes: 30,
            countdown_seconds: 60,
            countdown_announcements: vec![60, 30, 10],
            countdown_final_seconds: 5,
            time_remaining_announcements: vec![10, 5, 1],
            zone_base_count: 2,
            actors_per_zone: 20,
            zone_max_count: 5,
            zone_radius: 150.0,
            town_buffer: 50.0,
            min_zone_separation: 500.0,
            candidate_multiplier: 8,
            candidate_jitter: 100.0,
            fallback_territory_distance: 1000.0,
            water_sample_radius: 30.0,
            water_sample_step: 10.0,
            max_water_fraction: 0.3,
            seed: None,
            beacons_per_zone: 1,
            capture_radius: 20.0,
            max_progress: 100.0,
            points_per_actor: 1.0,
            decay_rate: 0.5,
            tier_min_sequence: 4,
            tier_max_sequence: 5,
            approach_warning_distances: vec![500.0, 300.0, 200.0, 100.0, 50.0],
            approach_warning_cooldown_seconds: 10,
            event_tick_millis: 1_000,
            containment_poll_millis: 250,
            messages: MessageTemplates::default(),
        }
    }
}

impl IncursionConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: IncursionConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.actors_per_zone == 0 {
            return Err(invalid("actorsPerZone", "must be at least 1"));
        }
        if self.zone_base_count == 0 {
            return Err(invalid("zoneBaseCount", "must be at least 1"));
        }
        if self.zone_max_count < self.zone_base_count {
            return Err(invalid(
                "zoneMaxCount",
                format!("must be >= zoneBaseCount ({})", self.zone_base_count),
            ));
        }
        if !(self.zone_radius > 0.0) {
            return Err(invalid("zoneRadius", "must be positive"));
        }
        if self.town_buffer < 0.0 {
            return Err(invalid("townBuffer", "must not be negative"));
        }
        if self.min_zone_separation < 0.0 {
            return Err(invalid("minZoneSeparation", "must not be negative"));
        }
        if !(self.capture_radius > 0.0) {
            return Err(invalid("captureRadius", "must be positive"));
        }
        if !(self.max_progress > 0.0) {
            return Err(invalid("maxProgress", "must be positive"));
        }
        if self.points_per_actor < 0.0 {
            return Err(invalid("pointsPerActor", "must not be negative"));
        }
        if self.decay_rate < 0.0 {
            return Err(invalid("decayRate", "must not be negative"));
        }
        if self.beacons_per_zone == 0 {
            return Err(invalid("beaconsPerZone", "must be at least 1"));
        }
        if self.candidate_multiplier == 0 {
            return Err(invalid("candidateMultiplier", "must be at least 1"));
        }
        if !(0.0..=MAX_CANDIDATE_JITTER).contains(&self.candidate_jitter) {
            return Err(invalid(
                "candidateJitter",
                format!("must be within [0, {MAX_CANDIDATE_JITTER}]"),
            ));
        }
        if !(self.fallback_territory_distance > 0.0 && self.fallback_territory_distance.is_finite())
        {
            return Err(invalid("fallbackTerritoryDistance", "must be positive and finite"));
        }
        if !(self.water_sample_step > 0.0 && self.water_sample_step.is_finite()) {
            return Err(invalid("waterSampleStep", "must be positive and finite"));
        }
        if !(self.water_sample_radius >= 0.0 && self.water_sample_radius.is_finite()) {
            return Err(invalid("waterSampleRadius", "must be finite and not negative"));
        }
        if 2.0 * self.water_sample_radius / self.water_sample_step > MAX_WATER_SAMPLES_PER_AXIS {
            return Err(invalid(
                "waterSampleRadius",
                format!("samples more than {MAX_WATER_SAMPLES_PER_AXIS} points per axis"),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_water_fraction) {
            return Err(invalid("maxWaterFraction", "must be within [0, 1]"));
        }
        if self.tier_min_sequence > self.tier_max_sequence {
            return Err(invalid(
                "tierMinSequence",
                "must not exceed tierMaxSequence",
            ));
        }
        if self.event_tick_millis == 0 {
            return Err(invalid("eventTickMillis", "must be positive"));
        }
        if self.containment_poll_millis == 0 {
            return Err(invalid("containmentPollMillis", "must be positive"));
        }
        Ok(())
    }

    pub fn duration_millis(&self) -> u64 {
        self.duration_minutes * MILLIS_PER_MINUTE
    }

    pub fn cooldown_millis(&self) -> u64 {
        self.cooldown_minutes * MILLIS_PER_MINUTE
    }

    /// Whether a countdown value deserves a broadcast.
    pub fn announces_countdown(&self, remaining: u32) -> bool {
        remaining > 0
            && (remaining <= self.countdown_final_seconds
                || self.countdown_announcements.contains(&remaining))
    }
}

/// Broadcast text. Placeholders: `%countdown%`, `%zones%`, `%minutes%`, `%faction%`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageTemplates {
    pub event_starting: String,
    pub event_started: String,
    pub event_time_remaining: String,
    pub event_ending: String,
    pub event_ended: String,
    pub event_winner: String,
    pub event_cancelled: String,
    pub event_force_stopped: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            event_starting: "[Incursion] An incursion begins in %countdown% seconds!".into(),
            event_started: "[Incursion] The incursion has begun! %zones% zones active.".into(),
            event_time_remaining:
                "[Incursion] %minutes% minutes remaining! Contest the beacons while you can!"
                    .into(),
            event_ending: "[Incursion] The incursion is ending...".into(),
            event_ended: "[Incursion] The incursion has concluded.".into(),
            event_winner: "[Incursion] %faction% held the beacons longest.".into(),
            event_cancelled:
                "[Incursion] Event cancelled - could not find suitable zone locations".into(),
            event_force_stopped:
                "[Incursion] Event has been force-stopped by an administrator".into(),
        }
    }
}

/// Substitute `%key%` placeholders.
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("%{key}%"), value)
    })
}
