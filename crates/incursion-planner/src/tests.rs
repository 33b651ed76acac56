#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use incursion_core::config::IncursionConfig;
    use incursion_core::enums::{BiomeClass, SurfaceMaterial};
    use incursion_core::types::{Location, MapCell, Position, WorldId};

    use crate::planner::*;
    use crate::surface::*;

    fn overworld() -> WorldId {
        WorldId::new("overworld")
    }

    fn at(x: f64, y: f64) -> Location {
        Location::new(overworld(), Position::new(x, y, 64.0))
    }

    fn flat() -> Arc<dyn SurfaceProbe> {
        Arc::new(FlatSurface::new(at(0.0, 0.0), 64.0))
    }

    fn planner_with(config: IncursionConfig, surface: Arc<dyn SurfaceProbe>) -> ZonePlanner {
        ZonePlanner::with_seed(Arc::new(config), surface, 42)
    }

    /// Probe answering from a closure.
    struct FnProbe<F: Fn(f64, f64) -> Option<Surface> + Send + Sync>(F);

    impl<F: Fn(f64, f64) -> Option<Surface> + Send + Sync> SurfaceProbe for FnProbe<F> {
        fn spawn(&self) -> Location {
            at(0.0, 0.0)
        }

        fn surface_at(&self, _world: &WorldId, x: f64, y: f64) -> Option<Surface> {
            (self.0)(x, y)
        }
    }

    fn four_towns() -> Vec<Location> {
        vec![
            at(1500.0, 0.0),
            at(-1500.0, 0.0),
            at(0.0, 1500.0),
            at(0.0, -1500.0),
        ]
    }

    fn placement(x: f64, y: f64) -> ZonePlacement {
        ZonePlacement {
            name: "existing".into(),
            center: at(x, y),
            radius: 150.0,
        }
    }

    // ---- Zone count ----

    #[test]
    fn test_zone_count_formula() {
        let config = IncursionConfig::default();
        assert_eq!(zone_count(&config, 10), 2, "below minimum floors at base");
        assert_eq!(zone_count(&config, 35), 2);
        assert_eq!(zone_count(&config, 50), 3);
        assert_eq!(zone_count(&config, 70), 4);
        assert_eq!(zone_count(&config, 500), 5, "capped at max");
    }

    #[test]
    fn test_zone_count_inverted_bounds_use_base() {
        let config = IncursionConfig {
            zone_base_count: 6,
            zone_max_count: 5,
            ..IncursionConfig::default()
        };
        assert_eq!(zone_count(&config, 35), 6);
        assert_eq!(zone_count(&config, 500), 6);
    }

    // ---- Placement checks ----

    #[test]
    fn test_separation_boundary() {
        let planner = planner_with(IncursionConfig::default(), flat());
        let existing = placement(0.0, 0.0);
        let claimed = HashSet::new();

        let near = planner.check_placement(&at(400.0, 0.0), &claimed, &[&existing]);
        assert!(matches!(near, Err(Rejection::TooClose { distance }) if distance == 400.0));

        let far = planner.check_placement(&at(520.0, 0.0), &claimed, &[&existing]);
        assert_eq!(far, Ok(()));
    }

    #[test]
    fn test_separation_ignores_other_worlds() {
        let planner = planner_with(IncursionConfig::default(), flat());
        let elsewhere = ZonePlacement {
            name: "nether".into(),
            center: Location::new(WorldId::new("nether"), Position::default()),
            radius: 150.0,
        };
        assert_eq!(
            planner.check_placement(&at(10.0, 0.0), &HashSet::new(), &[&elsewhere]),
            Ok(())
        );
    }

    #[test]
    fn test_claimed_cell_inside_footprint_rejected() {
        let planner = planner_with(IncursionConfig::default(), flat());
        let center = at(8.0, 8.0);

        // Cell (12, 0) has its centre 192 units away, inside radius + buffer.
        let claimed: HashSet<MapCell> = [MapCell::new(12, 0)].into_iter().collect();
        assert_eq!(
            planner.check_placement(&center, &claimed, &[]),
            Err(Rejection::ClaimedCell(MapCell::new(12, 0)))
        );

        // Cell (13, 0) is 208 away.
        let claimed: HashSet<MapCell> = [MapCell::new(13, 0)].into_iter().collect();
        assert_eq!(planner.check_placement(&center, &claimed, &[]), Ok(()));
    }

    // ---- Surface ----

    #[test]
    fn test_surface_rejects_liquids_and_biomes() {
        let config = IncursionConfig::default();
        let probe = FnProbe(|x: f64, _y: f64| {
            Some(if x < 0.0 {
                Surface {
                    biome: BiomeClass::Ocean,
                    ..Surface::land(60.0)
                }
            } else if x < 100.0 {
                Surface {
                    material: SurfaceMaterial::Lava,
                    ..Surface::land(60.0)
                }
            } else if x < 200.0 {
                Surface {
                    above: SurfaceMaterial::Water,
                    ..Surface::land(60.0)
                }
            } else {
                Surface::land(70.0)
            })
        });
        let world = overworld();

        assert_eq!(
            find_surface(&probe, &world, -50.0, 0.0, &config),
            Err(SurfaceRejection::Biome(BiomeClass::Ocean))
        );
        assert_eq!(
            find_surface(&probe, &world, 50.0, 0.0, &config),
            Err(SurfaceRejection::Liquid(SurfaceMaterial::Lava))
        );
        assert_eq!(
            find_surface(&probe, &world, 150.0, 0.0, &config),
            Err(SurfaceRejection::Liquid(SurfaceMaterial::Water))
        );
        let ok = find_surface(&probe, &world, 500.0, 0.0, &config).unwrap();
        assert_eq!(ok.position.z, 70.0);
    }

    #[test]
    fn test_surface_no_column() {
        let probe = FnProbe(|_x: f64, _y: f64| None);
        assert_eq!(
            find_surface(&probe, &overworld(), 0.0, 0.0, &IncursionConfig::default()),
            Err(SurfaceRejection::NoSurface)
        );
    }

    #[test]
    fn test_water_fraction_threshold() {
        let config = IncursionConfig::default();
        let world = overworld();

        // Small pond: 9 of 49 samples wet.
        let pond = FlatSurface::new(at(0.0, 0.0), 64.0).with_lake(Lake {
            x: 0.0,
            y: 0.0,
            radius: 20.0,
        });
        assert!(find_surface(&pond, &world, 25.0, 0.0, &config).is_ok());

        // Larger lake: 17 of 49 samples wet.
        let lake = FlatSurface::new(at(0.0, 0.0), 64.0).with_lake(Lake {
            x: 0.0,
            y: 0.0,
            radius: 40.0,
        });
        let fraction = water_fraction(&lake, &world, 45.0, 0.0, &config);
        assert!((fraction - 17.0 / 49.0).abs() < 1e-9);
        assert!(matches!(
            find_surface(&lake, &world, 45.0, 0.0, &config),
            Err(SurfaceRejection::Waterlogged { .. })
        ));
    }

    #[test]
    fn test_flat_surface_other_world_has_no_column() {
        let surface = FlatSurface::new(at(0.0, 0.0), 64.0);
        assert!(surface
            .surface_at(&WorldId::new("nether"), 0.0, 0.0)
            .is_none());
    }

    // ---- Planning ----

    #[test]
    fn test_plan_respects_separation() {
        let mut planner = planner_with(IncursionConfig::default(), flat());
        let towns = four_towns();
        let claimed = HashSet::new();
        let ctx = PlanningContext {
            territory_centers: &towns,
            claimed: &claimed,
            existing: &[],
        };

        let zones = planner.plan(5, &ctx);
        assert!(!zones.is_empty());
        assert!(zones.len() <= 5);
        for (i, a) in zones.iter().enumerate() {
            assert_eq!(a.name, format!("Zone-{}", i + 1));
            assert_eq!(a.radius, 150.0);
            for b in &zones[i + 1..] {
                let d = a.center.horizontal_range_to(&b.center).unwrap();
                assert!(d >= 500.0, "{} and {} only {d} apart", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_plan_is_deterministic_per_seed() {
        let towns = four_towns();
        let claimed = HashSet::new();
        let ctx = PlanningContext {
            territory_centers: &towns,
            claimed: &claimed,
            existing: &[],
        };
        let a = planner_with(IncursionConfig::default(), flat()).plan(3, &ctx);
        let b = planner_with(IncursionConfig::default(), flat()).plan(3, &ctx);
        assert_eq!(a, b);
    }

    #[test]
    fn test_plan_keeps_clear_of_existing_zones() {
        let mut planner = planner_with(IncursionConfig::default(), flat());
        let towns = four_towns();
        let claimed = HashSet::new();
        let existing = vec![placement(900.0, 900.0), placement(-900.0, -900.0)];
        let ctx = PlanningContext {
            territory_centers: &towns,
            claimed: &claimed,
            existing: &existing,
        };

        let zones = planner.plan(2, &ctx);
        for zone in &zones {
            for old in &existing {
                assert!(zone.center.horizontal_range_to(&old.center).unwrap() >= 500.0);
            }
        }
        if let Some(first) = zones.first() {
            assert_eq!(first.name, "Zone-3");
        }
    }

    #[test]
    fn test_plan_without_territory_rings_spawn() {
        let mut planner = planner_with(IncursionConfig::default(), flat());
        let claimed = HashSet::new();
        let ctx = PlanningContext {
            territory_centers: &[],
            claimed: &claimed,
            existing: &[],
        };

        let zones = planner.plan(2, &ctx);
        assert!(!zones.is_empty());
        let max_jitter = 100.0 * 2f64.sqrt() + 1.0;
        for zone in &zones {
            let d = zone.center.position.horizontal_range_to(&Position::default());
            assert!(d >= 500.0 - max_jitter && d <= 900.0 + max_jitter, "{d}");
        }
    }

    #[test]
    fn test_plan_all_water_places_nothing() {
        let water = Arc::new(FnProbe(|_x: f64, _y: f64| {
            Some(Surface {
                material: SurfaceMaterial::Water,
                ..Surface::land(62.0)
            })
        }));
        let mut planner = planner_with(IncursionConfig::default(), water);
        let towns = four_towns();
        let claimed = HashSet::new();
        let ctx = PlanningContext {
            territory_centers: &towns,
            claimed: &claimed,
            existing: &[],
        };
        assert!(planner.plan(3, &ctx).is_empty());
    }

    #[test]
    fn test_plan_avoids_claimed_cells() {
        let mut planner = planner_with(IncursionConfig::default(), flat());
        let towns = four_towns();
        // Claim a wide band through the middle of the candidate ring.
        let claimed: HashSet<MapCell> = (-80..80)
            .flat_map(|x| (-5..5).map(move |y| MapCell::new(x, y)))
            .collect();
        let ctx = PlanningContext {
            territory_centers: &towns,
            claimed: &claimed,
            existing: &[],
        };

        for zone in planner.plan(4, &ctx) {
            for cell in &claimed {
                let d = cell.distance_to(zone.center.position.x, zone.center.position.y);
                assert!(d >= 200.0, "{} overlaps claim {cell:?}", zone.name);
            }
        }
    }

    #[test]
    fn test_plan_zero_target() {
        let mut planner = planner_with(IncursionConfig::default(), flat());
        let claimed = HashSet::new();
        let ctx = PlanningContext {
            territory_centers: &[],
            claimed: &claimed,
            existing: &[],
        };
        assert!(planner.plan(0, &ctx).is_empty());
    }
}
