#[cfg(test)]
mod tests {
    use crate::clock::{Clock, ManualClock};
    use crate::commands::ControlCommand;
    use crate::config::{render, IncursionConfig};
    use crate::directory::{ActorDirectory, FactionDirectory, InMemoryActors, InMemoryFactions};
    use crate::enums::*;
    use crate::error::{ConfigError, DirectoryError};
    use crate::events::Notice;
    use crate::state::{CaptureView, EngineSnapshot};
    use crate::types::*;

    fn overworld() -> WorldId {
        WorldId::new("overworld")
    }

    // ---- Config ----

    #[test]
    fn test_config_defaults() {
        let config = IncursionConfig::default();
        assert_eq!(config.min_actors, 30);
        assert_eq!(config.cooldown_minutes, 120);
        assert_eq!(config.duration_minutes, 30);
        assert_eq!(config.countdown_seconds, 60);
        assert_eq!(config.zone_base_count, 2);
        assert_eq!(config.actors_per_zone, 20);
        assert_eq!(config.zone_max_count, 5);
        assert_eq!(config.zone_radius, 150.0);
        assert_eq!(config.town_buffer, 50.0);
        assert_eq!(config.min_zone_separation, 500.0);
        assert_eq!(config.capture_radius, 20.0);
        assert_eq!(config.max_progress, 100.0);
        assert_eq!(config.points_per_actor, 1.0);
        assert_eq!(config.decay_rate, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_json_keeps_defaults() {
        let config =
            IncursionConfig::from_json(r#"{ "minActors": 10, "decayRate": 2.0 }"#).unwrap();
        assert_eq!(config.min_actors, 10);
        assert_eq!(config.decay_rate, 2.0);
        assert_eq!(config.zone_radius, 150.0);
        assert_eq!(config.messages, IncursionConfig::default().messages);
    }

    #[test]
    fn test_config_rejects_inverted_zone_counts() {
        let err = IncursionConfig::from_json(r#"{ "zoneBaseCount": 4, "zoneMaxCount": 2 }"#)
            .unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "zoneMaxCount"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_rejects_zero_actors_per_zone() {
        let config = IncursionConfig {
            actors_per_zone: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "actorsPerZone",
                ..
            })
        ));
    }

    fn rejected_field(config: IncursionConfig) -> &'static str {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_config_rejects_unbounded_jitter() {
        for jitter in [1e308, f64::INFINITY, f64::NAN, -1.0] {
            let config = IncursionConfig {
                candidate_jitter: jitter,
                ..Default::default()
            };
            assert_eq!(rejected_field(config), "candidateJitter", "jitter {jitter}");
        }
        let config = IncursionConfig {
            candidate_jitter: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_fallback_distance() {
        for distance in [0.0, -5.0, f64::INFINITY, f64::NAN] {
            let config = IncursionConfig {
                fallback_territory_distance: distance,
                ..Default::default()
            };
            assert_eq!(rejected_field(config), "fallbackTerritoryDistance");
        }
    }

    #[test]
    fn test_config_caps_water_sample_grid() {
        let config = IncursionConfig {
            water_sample_radius: 1e9,
            water_sample_step: 1.0,
            ..Default::default()
        };
        assert_eq!(rejected_field(config), "waterSampleRadius");

        let config = IncursionConfig {
            water_sample_radius: f64::NAN,
            ..Default::default()
        };
        assert_eq!(rejected_field(config), "waterSampleRadius");

        let config = IncursionConfig {
            water_sample_radius: 32.0,
            water_sample_step: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_bad_json_is_parse_error() {
        assert!(matches!(
            IncursionConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_config_missing_file_is_io_error() {
        let err = IncursionConfig::load("/definitely/not/here/incursion.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_countdown_announcement_marks() {
        let config = IncursionConfig::default();
        for announced in [60, 30, 10, 5, 4, 3, 2, 1] {
            assert!(config.announces_countdown(announced), "{announced}");
        }
        for silent in [59, 31, 11, 6, 0] {
            assert!(!config.announces_countdown(silent), "{silent}");
        }
    }

    #[test]
    fn test_render_placeholders() {
        let text = render(
            "%zones% zones, %countdown%s, %zones% again",
            &[("zones", "3".into()), ("countdown", "10".into())],
        );
        assert_eq!(text, "3 zones, 10s, 3 again");
    }

    // ---- Geometry ----

    #[test]
    fn test_horizontal_range_ignores_height() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 250.0);
        assert_eq!(a.horizontal_range_to(&b), 5.0);
        assert_eq!(a.horizontal_range_sq_to(&b), 25.0);
        assert!(a.range_to(&b) > 250.0);
    }

    #[test]
    fn test_squared_and_euclidean_agree_on_boundary() {
        let center = Position::new(100.0, -40.0, 64.0);
        let radius = 150.0_f64;
        let samples = [
            center.offset(150.0, 0.0),
            center.offset(0.0, -150.0),
            center.offset(90.0, 120.0),
            center.offset(150.000_001, 0.0),
            center.offset(-149.999, 0.0),
        ];
        for pos in samples {
            let by_square = center.horizontal_range_sq_to(&pos) <= radius * radius;
            let by_root = center.horizontal_range_to(&pos) <= radius;
            assert_eq!(by_square, by_root, "disagreement at {pos:?}");
        }
    }

    #[test]
    fn test_location_cross_world_has_no_range() {
        let a = Location::new(overworld(), Position::default());
        let b = Location::new(WorldId::new("nether"), Position::default());
        assert_eq!(a.horizontal_range_to(&b), None);
        assert_eq!(a.horizontal_range_to(&a), Some(0.0));
    }

    #[test]
    fn test_map_cell_containing_negative_coordinates() {
        assert_eq!(
            MapCell::containing(&Position::new(-1.0, 15.9, 0.0)),
            MapCell::new(-1, 0)
        );
        assert_eq!(
            MapCell::containing(&Position::new(32.0, -16.0, 0.0)),
            MapCell::new(2, -1)
        );
        assert_eq!(MapCell::new(0, 0).center(), (8.0, 8.0));
        assert_eq!(MapCell::new(-1, 0).distance_to(-8.0, 8.0), 0.0);
    }

    #[test]
    fn test_faction_none_sentinel() {
        assert!(FactionId::NONE.is_none());
        assert!(!FactionId(7).is_none());
        assert_eq!(PointId(3).to_string(), "beacon_3");
    }

    // ---- Directories ----

    #[test]
    fn test_in_memory_factions_membership() {
        let factions = InMemoryFactions::new();
        factions.add_faction(FactionId(1), "Avalon");
        factions.set_member(ActorId(10), FactionId(1));

        let faction = factions.faction_of(ActorId(10)).unwrap().unwrap();
        assert_eq!(faction.name, "Avalon");
        assert_eq!(factions.faction_of(ActorId(11)).unwrap(), None);

        factions.remove_faction(FactionId(1));
        assert_eq!(factions.faction_of(ActorId(10)).unwrap(), None);
    }

    #[test]
    fn test_in_memory_factions_unavailable() {
        let factions = InMemoryFactions::new();
        factions.set_available(false);
        assert_eq!(
            factions.territory_centers(),
            Err(DirectoryError::Unavailable("faction"))
        );
        factions.set_available(true);
        assert_eq!(factions.territory_centers(), Ok(Vec::new()));
    }

    #[test]
    fn test_claimed_cells_filtered_by_world() {
        let factions = InMemoryFactions::new();
        factions.add_faction(FactionId(1), "A");
        factions.add_faction(FactionId(2), "B");
        factions.set_territory(
            FactionId(1),
            Location::new(overworld(), Position::new(8.0, 8.0, 64.0)),
            vec![MapCell::new(0, 0), MapCell::new(0, 1)],
        );
        factions.set_territory(
            FactionId(2),
            Location::new(WorldId::new("nether"), Position::default()),
            vec![MapCell::new(5, 5)],
        );
        let cells = factions.claimed_cells(&overworld()).unwrap();
        assert_eq!(cells.len(), 2);
        assert!(!cells.contains(&MapCell::new(5, 5)));
        assert_eq!(factions.territory_centers().unwrap().len(), 2);
    }

    #[test]
    fn test_in_memory_actors_lifecycle() {
        let actors = InMemoryActors::new();
        let here = Location::new(overworld(), Position::new(1.0, 2.0, 3.0));
        actors.connect(ActorId(2), here.clone());
        actors.connect(ActorId(1), here.clone());
        actors.set_rank(ActorId(1), Some(4));

        let online = actors.online_actors().unwrap();
        assert_eq!(online.len(), 2);
        assert_eq!(online[0].id, ActorId(1));
        assert_eq!(actors.progression_rank(ActorId(1)), Some(4));
        assert_eq!(actors.progression_rank(ActorId(2)), None);

        let there = Location::new(overworld(), Position::new(9.0, 9.0, 3.0));
        assert!(actors.move_to(ActorId(2), there.clone()));
        assert_eq!(actors.location_of(ActorId(2)), Some(there));
        assert!(actors.disconnect(ActorId(2)));
        assert!(!actors.move_to(ActorId(2), here));
        assert_eq!(actors.online_count().unwrap(), 1);
    }

    // ---- Clock ----

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        clock.advance_secs(2);
        clock.advance_millis(5);
        assert_eq!(clock.now_millis(), 3_005);
        clock.set(0);
        assert_eq!(clock.now_millis(), 0);
    }

    // ---- Wire types ----

    #[test]
    fn test_notice_tagged_serialization() {
        let notice = Notice::ZoneEntered {
            actor: ActorId(4),
            zone: ZoneId(1),
            zone_name: "Zone-1".into(),
            tier: ActorTier::SpiritWeight,
        };
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["type"], "ZoneEntered");
        assert_eq!(json["tier"], "SpiritWeight");
        let back: Notice = serde_json::from_value(json).unwrap();
        assert_eq!(back, notice);
    }

    #[test]
    fn test_control_command_tagged_serialization() {
        let cmd: ControlCommand =
            serde_json::from_str(r#"{ "type": "StartEvent", "forced": true }"#).unwrap();
        assert_eq!(cmd, ControlCommand::StartEvent { forced: true });
    }

    #[test]
    fn test_capture_view_percentage() {
        let view = CaptureView {
            point: PointId(0),
            name: "Zone-1 - Beacon".into(),
            zone: ZoneId(1),
            location: Location::default(),
            owner: FactionId::NONE,
            owner_name: None,
            progress: 25.0,
            max_progress: 50.0,
            contested: false,
            mode: CaptureMode::Capturing,
            owned_secs: 0,
        };
        assert_eq!(view.percentage(), 50.0);
    }

    #[test]
    fn test_default_snapshot_is_idle() {
        let snapshot = EngineSnapshot::default();
        assert_eq!(snapshot.phase, EventPhase::Idle);
        assert!(snapshot.event.is_none());
        assert_eq!(EventPhase::Starting.to_string(), "STARTING");
    }
}
