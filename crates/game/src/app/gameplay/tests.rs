    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const DT: f32 = 1.0 / 60.0;

    struct ColonyHarness {
        entities: EntityManager,
        catalog: ColonyCatalog,
        modifiers: ColonyModifiers,
        rng: SimRng,
        events: ColonyEventBus,
    }

    impl ColonyHarness {
        fn new() -> Self {
            let mut entities = EntityManager::default();
            entities.nest.create(NEST_POSITION);
            Self {
                entities,
                catalog: ColonyCatalog::builtin(),
                modifiers: ColonyModifiers {
                    food_spawn_interval_seconds: f32::INFINITY,
                    ..ColonyModifiers::default()
                },
                rng: SimRng::new(7),
                events: ColonyEventBus::default(),
            }
        }

        fn spawn(&mut self, kind: UnitKind, position: Vec2) -> UnitId {
            self.entities
                .ants
                .spawn_unit(kind, position, &self.catalog, 0)
                .expect("spawn unit")
        }

        fn place_food(&mut self, food_type: FoodType, position: Vec2) -> FoodId {
            self.entities
                .food
                .spawn_food(food_type, position, &self.catalog)
                .expect("spawn food")
        }

        fn tick(&mut self, fixed_dt_seconds: f32) -> Vec<ColonyEvent> {
            let mut ctx = ColonyTickContext {
                fixed_dt_seconds,
                modifiers: self.modifiers,
                catalog: &self.catalog,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            self.entities.update(&mut ctx);
            self.events.drain()
        }
    }

    fn test_scene(temp: &TempDir) -> ColonyScene {
        ColonyScene::new(temp.path().join("saves"), 0.0)
    }

    fn loaded_scene(temp: &TempDir) -> (ColonyScene, SceneWorld) {
        let mut scene = test_scene(temp);
        let mut world = SceneWorld::default();
        scene.load(&mut world);
        (scene, world)
    }

    fn hotkey_snapshot(digit: u8) -> InputSnapshot {
        let mut hotkeys = ants_engine::HotkeySet::default();
        hotkeys.insert(digit);
        InputSnapshot::empty().with_hotkeys(hotkeys)
    }

    fn archetype(def_name: &str) -> ants_engine::EntityArchetype {
        ants_engine::EntityArchetype {
            id: ants_engine::EntityDefId(0),
            def_name: def_name.to_string(),
            label: def_name.to_string(),
            renderable: RenderableKind::Disc,
            color: [1, 2, 3],
            size: 0.5,
            move_speed: 9.0,
            health: None,
            damage: None,
            capacity: None,
            cost: None,
            attack_range: None,
            attack_cooldown_ticks: None,
            food_value: None,
            tags: Vec::new(),
        }
    }

    fn ant_view(id: u64, kind: UnitKind, position: Vec2, attacking: bool) -> AntTargetView {
        AntTargetView {
            id: UnitId(id),
            kind,
            position,
            attacking,
        }
    }

    #[test]
    fn move_towards_reports_arrival_within_radius() {
        let mut position = Vec2::new(0.0, 0.0);
        assert!(move_towards(&mut position, Vec2::new(0.3, 0.0), 1.0, DT, 0.4));
        assert_eq!(position, Vec2::ZERO);

        let reached = move_towards(&mut position, Vec2::new(10.0, 0.0), 6.0, 1.0, 0.1);
        assert!(!reached);
        assert!((position.x - 6.0).abs() < 1e-5);
    }

    #[test]
    fn move_towards_never_overshoots_target() {
        let target = Vec2::new(1.0, 1.0);
        let mut position = Vec2::ZERO;
        assert!(move_towards(&mut position, target, 100.0, 1.0, 0.0));
        assert_eq!(position, target);

        let mut position = Vec2::ZERO;
        for _ in 0..200 {
            move_towards(&mut position, target, 3.0, DT, 0.0);
            assert!(position.x <= target.x && position.y <= target.y);
        }
        assert_eq!(position, target);
    }

    #[test]
    fn worker_completes_forage_cycle_and_delivery_is_credited() {
        let mut harness = ColonyHarness::new();
        let unit_id = harness.spawn(UnitKind::Worker, NEST_POSITION);
        let food_id = harness.place_food(FoodType::Apple, Vec2::new(3.0, 0.0));
        let mut resources = ColonyResources::default();
        let mut seen_states = Vec::new();
        let mut collected = false;

        for _ in 0..600 {
            for event in harness.tick(DT) {
                match event {
                    ColonyEvent::FoodCollected { food_id: id, .. } => collected |= id == food_id,
                    ColonyEvent::FoodDelivered { unit_id: id, value } => {
                        assert_eq!(id, unit_id);
                        resources.credit_delivery(value);
                    }
                    _ => {}
                }
            }
            let state = harness.entities.ants.find(unit_id).expect("unit").state;
            if seen_states.last() != Some(&state) {
                seen_states.push(state);
            }
            if resources.total_food_collected > 0 {
                break;
            }
        }

        assert!(collected);
        assert_eq!(resources.food, STARTING_FOOD + 10);
        assert_eq!(resources.total_food_collected, 10);
        assert_eq!(
            seen_states,
            vec![
                UnitState::Spawning,
                UnitState::SeekingFood,
                UnitState::CollectingFood,
                UnitState::ReturningToNest,
                UnitState::DeliveringFood,
                UnitState::SeekingFood,
            ]
        );
        assert_eq!(harness.entities.food.food_count(), 0);
        let unit = harness.entities.ants.find(unit_id).expect("unit");
        assert_eq!(unit.food_collected, 0);
        assert_eq!(unit.carried_value, 0);
    }

    #[test]
    fn carried_food_never_exceeds_capacity() {
        let mut harness = ColonyHarness::new();
        harness.spawn(UnitKind::Car, NEST_POSITION);
        harness.spawn(UnitKind::Worker, NEST_POSITION);
        harness.spawn(UnitKind::Flying, NEST_POSITION);
        for index in 0..12 {
            let angle = index as f32 * 0.5;
            harness.place_food(
                FoodType::Seed,
                Vec2::new(angle.cos() * 5.0, angle.sin() * 5.0),
            );
        }
        let mut largest_delivery = 0;

        for _ in 0..3000 {
            for event in harness.tick(DT) {
                if let ColonyEvent::FoodDelivered { value, .. } = event {
                    largest_delivery = largest_delivery.max(value);
                }
            }
            for unit in &harness.entities.ants.units {
                assert!(
                    unit.food_collected <= unit.capacity,
                    "{:?} carries {} with capacity {}",
                    unit.kind,
                    unit.food_collected,
                    unit.capacity
                );
            }
        }

        assert_eq!(harness.entities.food.food_count(), 0);
        assert!(largest_delivery > 1, "car should bring back several seeds at once");
    }

    #[test]
    fn capacity_upgrade_applies_to_foragers_but_not_queen() {
        let stats = ColonyCatalog::builtin();
        assert_eq!(effective_capacity(stats.unit(UnitKind::Worker), 2), 3);
        assert_eq!(effective_capacity(stats.unit(UnitKind::Queen), 2), 0);
    }

    #[test]
    fn engaged_boss_pulls_nearby_foragers_into_fight_and_releases_claims() {
        let mut harness = ColonyHarness::new();
        let unit_id = harness.spawn(UnitKind::Fire, Vec2::new(2.0, 0.0));
        let food_id = harness.place_food(FoodType::Seed, Vec2::new(8.0, 0.0));
        for _ in 0..40 {
            harness.tick(DT);
        }
        assert_eq!(
            harness.entities.food.foods[0].claimed_by,
            Some(unit_id),
            "forager should have claimed {food_id:?}"
        );

        harness
            .entities
            .enemies
            .spawn_boss(1, Vec2::new(6.0, 0.0), &harness.catalog)
            .expect("boss");
        assert!(harness.entities.enemies.engage());
        let mut boss_hits = 0;
        for _ in 0..120 {
            for event in harness.tick(DT) {
                if matches!(event, ColonyEvent::BossHit { .. }) {
                    boss_hits += 1;
                }
            }
        }

        let unit = harness.entities.ants.find(unit_id).expect("unit");
        assert_eq!(unit.state, UnitState::Fighting);
        assert_eq!(unit.target_food, None);
        assert_eq!(harness.entities.food.foods[0].claimed_by, None);
        assert!(boss_hits > 0);
        let boss = harness.entities.enemies.boss().expect("boss");
        assert!(boss.hp < boss.max_hp);
    }

    #[test]
    fn fighters_resume_foraging_once_boss_is_gone() {
        let mut harness = ColonyHarness::new();
        let carrier = harness.spawn(UnitKind::Fire, Vec2::new(3.0, 0.0));
        let empty = harness.spawn(UnitKind::Fire, Vec2::new(3.0, 1.0));
        harness
            .entities
            .enemies
            .spawn_boss(1, Vec2::new(6.0, 0.0), &harness.catalog)
            .expect("boss");
        assert!(harness.entities.enemies.engage());
        for _ in 0..40 {
            harness.tick(DT);
        }
        for id in [carrier, empty] {
            assert_eq!(harness.entities.ants.find(id).expect("unit").state, UnitState::Fighting);
        }
        if let Some(unit) = harness.entities.ants.units.iter_mut().find(|unit| unit.id == carrier) {
            unit.food_collected = 1;
            unit.carried_value = 3;
        }

        if let Some(boss) = harness.entities.enemies.boss.as_mut() {
            boss.hp = 0;
        }
        for _ in 0..3 {
            harness.tick(DT);
        }

        assert!(harness.entities.enemies.boss().is_none());
        let carrier = harness.entities.ants.find(carrier).expect("carrier");
        assert_eq!(carrier.state, UnitState::ReturningToNest);
        assert_eq!(carrier.carried_value, 3);
        assert_eq!(
            harness.entities.ants.find(empty).expect("empty").state,
            UnitState::SeekingFood
        );
    }

    #[test]
    fn queen_never_fights() {
        let mut harness = ColonyHarness::new();
        let queen_id = harness.spawn(UnitKind::Queen, NEST_POSITION);
        harness
            .entities
            .enemies
            .spawn_boss(1, Vec2::new(1.0, 0.0), &harness.catalog)
            .expect("boss");
        harness.entities.enemies.engage();
        for _ in 0..60 {
            harness.tick(DT);
        }
        let queen = harness.entities.ants.find(queen_id).expect("queen");
        assert_eq!(queen.state, UnitState::Nesting);
    }

    #[test]
    fn boss_target_priority_is_attacker_then_queen_then_nearest_then_wander() {
        let boss = Vec2::ZERO;
        let attacker_far = ant_view(1, UnitKind::Fire, Vec2::new(1.0, 0.0), true);
        let attacker_near = ant_view(2, UnitKind::Worker, Vec2::new(0.5, 0.0), true);
        let queen = ant_view(3, UnitKind::Queen, Vec2::new(9.0, 0.0), false);
        let nearest = ant_view(4, UnitKind::Car, Vec2::new(2.0, 0.0), false);
        let far = ant_view(5, UnitKind::Worker, Vec2::new(7.0, 0.0), false);

        assert_eq!(
            select_boss_target(boss, 0, &[queen, nearest, attacker_far, attacker_near]),
            BossTarget::Attacker(UnitId(2))
        );
        assert_eq!(
            select_boss_target(boss, 0, &[far, nearest, queen]),
            BossTarget::Queen(UnitId(3))
        );
        assert_eq!(
            select_boss_target(boss, 0, &[far, nearest]),
            BossTarget::Nearest(UnitId(4))
        );
        assert_eq!(
            select_boss_target(boss, 5, &[]),
            BossTarget::Wander(BOSS_WANDER_WAYPOINTS[1])
        );
    }

    #[test]
    fn boss_attacks_on_frame_cooldown_only_within_range() {
        let catalog = ColonyCatalog::builtin();
        let cooldown = catalog.boss.attack_cooldown_ticks;
        let mut enemies = EnemyEntityManager::default();
        enemies.spawn_boss(1, Vec2::ZERO, &catalog).expect("boss");
        enemies.engage();
        let in_range = [ant_view(1, UnitKind::Worker, Vec2::new(0.5, 0.0), false)];

        let hits: usize = (0..cooldown).map(|_| enemies.update(DT, &in_range).len()).sum();
        assert_eq!(hits, 1);
        assert_eq!(enemies.update(DT, &in_range), vec![(UnitId(1), catalog.boss.base_damage)]);

        let mut enemies = EnemyEntityManager::default();
        enemies.spawn_boss(1, Vec2::ZERO, &catalog).expect("boss");
        enemies.engage();
        let out_of_range = [ant_view(1, UnitKind::Worker, Vec2::new(10.0, 0.0), false)];
        assert!(enemies.update(DT, &out_of_range).is_empty());
        let boss = enemies.boss().expect("boss");
        assert!(boss.position.x > 0.0);
        assert_eq!(boss.target_ant, Some(UnitId(1)));
    }

    #[test]
    fn unengaged_boss_stays_put() {
        let catalog = ColonyCatalog::builtin();
        let mut enemies = EnemyEntityManager::default();
        enemies.spawn_boss(1, Vec2::new(3.0, 3.0), &catalog).expect("boss");
        let ants = [ant_view(1, UnitKind::Worker, Vec2::new(3.5, 3.0), false)];
        for _ in 0..120 {
            assert!(enemies.update(DT, &ants).is_empty());
        }
        assert_eq!(enemies.boss().expect("boss").position, Vec2::new(3.0, 3.0));
        assert!(enemies.engaged_boss_view().is_none());
    }

    #[test]
    fn boss_stats_scale_with_level() {
        let stats = ColonyCatalog::builtin().boss;
        let first = Boss::scaled(EnemyId(0), 1, Vec2::ZERO, &stats);
        let third = Boss::scaled(EnemyId(1), 3, Vec2::ZERO, &stats);
        assert_eq!(first.max_hp, stats.base_hp);
        assert_eq!(third.max_hp, (stats.base_hp as f32 * 2.25).round() as u32);
        assert_eq!(third.damage, (stats.base_damage as f32 * 1.5625).round() as u32);
    }

    #[test]
    fn only_one_queen_and_one_boss_at_a_time() {
        let mut harness = ColonyHarness::new();
        harness.spawn(UnitKind::Queen, NEST_POSITION);
        assert_eq!(
            harness
                .entities
                .ants
                .spawn_unit(UnitKind::Queen, NEST_POSITION, &harness.catalog, 0),
            Err(SpawnError::QueenAlreadyAlive)
        );

        let catalog = harness.catalog.clone();
        assert!(harness.entities.enemies.spawn_boss(1, Vec2::ZERO, &catalog).is_some());
        assert!(harness.entities.enemies.spawn_boss(1, Vec2::ZERO, &catalog).is_none());
    }

    #[test]
    fn unit_cap_rejects_spawns() {
        let mut harness = ColonyHarness::new();
        for _ in 0..MAX_UNITS {
            harness.spawn(UnitKind::Worker, NEST_POSITION);
        }
        assert_eq!(
            harness
                .entities
                .ants
                .spawn_unit(UnitKind::Worker, NEST_POSITION, &harness.catalog, 0),
            Err(SpawnError::UnitCapReached { cap: MAX_UNITS })
        );
    }

    #[test]
    fn larvae_hatch_once_age_reaches_threshold() {
        let catalog = ColonyCatalog::builtin();
        let mut ants = AntEntityManager::default();
        let mut events = ColonyEventBus::default();
        assert!(ants.lay_larva(UnitKind::Worker, Vec2::new(1.0, 1.0)));

        for _ in 0..9 {
            ants.update_larvae(0.5, &catalog, 0, &mut events);
        }
        assert_eq!(ants.larvae.len(), 1);
        assert!(ants.units.is_empty());

        ants.update_larvae(0.5, &catalog, 0, &mut events);
        assert!(ants.larvae.is_empty());
        assert_eq!(ants.count_of(UnitKind::Worker), 1);
        assert!(events
            .iter()
            .any(|event| matches!(event, ColonyEvent::LarvaHatched { kind: UnitKind::Worker, .. })));
    }

    #[test]
    fn larva_waits_while_unit_cap_is_reached() {
        let catalog = ColonyCatalog::builtin();
        let mut ants = AntEntityManager::default();
        let mut events = ColonyEventBus::default();
        for _ in 0..MAX_UNITS {
            ants.spawn_unit(UnitKind::Worker, Vec2::ZERO, &catalog, 0)
                .expect("spawn");
        }
        ants.lay_larva(UnitKind::Worker, Vec2::ZERO);
        ants.update_larvae(LARVAE_HATCH_SECONDS + 1.0, &catalog, 0, &mut events);
        assert_eq!(ants.larvae.len(), 1);

        ants.units.pop();
        ants.update_larvae(0.0, &catalog, 0, &mut events);
        assert!(ants.larvae.is_empty());
        assert_eq!(ants.units.len(), MAX_UNITS);
    }

    #[test]
    fn larvae_are_capped() {
        let mut ants = AntEntityManager::default();
        for _ in 0..MAX_LARVAE {
            assert!(ants.lay_larva(UnitKind::Worker, Vec2::ZERO));
        }
        assert!(!ants.lay_larva(UnitKind::Worker, Vec2::ZERO));
    }

    #[test]
    fn queen_lays_worker_larva_every_interval() {
        let mut harness = ColonyHarness::new();
        harness.spawn(UnitKind::Queen, NEST_POSITION);
        let mut laid = 0;
        // One tick to leave Spawning, then twenty half-second ticks of laying timer.
        for _ in 0..21 {
            laid += harness
                .tick(0.5)
                .iter()
                .filter(|event| matches!(event, ColonyEvent::LarvaLaid { kind: UnitKind::Worker }))
                .count();
        }
        assert_eq!(laid, 1);
        assert_eq!(harness.entities.ants.larvae.len(), 1);
    }

    #[test]
    fn validation_discards_non_finite_entities_and_releases_claims() {
        let mut harness = ColonyHarness::new();
        let broken_id = harness.spawn(UnitKind::Worker, NEST_POSITION);
        let healthy_id = harness.spawn(UnitKind::Worker, NEST_POSITION);
        let food_id = harness.place_food(FoodType::Seed, Vec2::new(4.0, 0.0));
        harness.place_food(FoodType::Sugar, Vec2::new(-4.0, 0.0));
        assert!(harness.entities.food.claim_nearest(broken_id, Vec2::new(4.0, 0.0)).is_some());

        harness.entities.ants.units[0].position = Vec2::new(f32::NAN, 0.0);
        harness.entities.food.foods[1].position = Vec2::new(f32::INFINITY, 1.0);
        let catalog = harness.catalog.clone();
        harness
            .entities
            .enemies
            .spawn_boss(1, Vec2::ZERO, &catalog)
            .expect("boss");
        if let Some(boss) = harness.entities.enemies.boss.as_mut() {
            boss.hp = boss.max_hp + 1;
        }

        let report = validate_entities(&mut harness.entities, &mut harness.events);

        assert_eq!(report.invalid_units, 1);
        assert_eq!(report.invalid_food, 1);
        assert_eq!(report.invalid_enemies, 1);
        assert_eq!(report.total_discarded(), 3);
        assert!(harness.entities.ants.find(broken_id).is_none());
        assert!(harness.entities.ants.find(healthy_id).is_some());
        assert!(harness.entities.enemies.boss().is_none());
        let food = &harness.entities.food.foods;
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].id, food_id);
        assert_eq!(food[0].claimed_by, None);
        assert_eq!(
            harness
                .events
                .iter()
                .filter(|event| matches!(event, ColonyEvent::EntityDiscarded { .. }))
                .count(),
            3
        );
    }

    #[test]
    fn validation_enforces_collection_caps() {
        let mut harness = ColonyHarness::new();
        let stats = harness.catalog.unit(UnitKind::Worker).clone();
        for id in 0..(MAX_UNITS as u64 + 3) {
            harness
                .entities
                .ants
                .units
                .push(Unit::new(UnitId(id), UnitKind::Worker, Vec2::ZERO, &stats, 0));
        }
        for id in 0..(MAX_LARVAE as u64 + 2) {
            harness.entities.ants.larvae.push(Larva {
                id: UnitId(10_000 + id),
                kind: UnitKind::Worker,
                position: Vec2::ZERO,
                age_seconds: 0.0,
                hatch_age_seconds: LARVAE_HATCH_SECONDS,
            });
        }

        let report = validate_entities(&mut harness.entities, &mut harness.events);

        assert_eq!(report.units_over_cap, 3);
        assert_eq!(report.larvae_over_cap, 2);
        assert_eq!(harness.entities.ants.units.len(), MAX_UNITS);
        assert_eq!(harness.entities.ants.larvae.len(), MAX_LARVAE);
        assert!(validate_entities(&mut harness.entities, &mut harness.events).is_clean());
    }

    #[test]
    fn food_placement_respects_cap() {
        let catalog = ColonyCatalog::builtin();
        let mut food = FoodEntityManager::default();
        for _ in 0..MAX_FOOD {
            assert!(food.spawn_food(FoodType::Seed, Vec2::ZERO, &catalog).is_some());
        }
        assert!(food.spawn_food(FoodType::Seed, Vec2::ZERO, &catalog).is_none());
    }

    #[test]
    fn timed_food_spawning_stops_at_map_limit() {
        let catalog = ColonyCatalog::builtin();
        let mut food = FoodEntityManager::default();
        let mut rng = SimRng::new(3);
        for _ in 0..(FOOD_ON_MAP_LIMIT + 10) {
            food.update_spawning(1.0, 1.0, 0, &mut rng, &catalog);
        }
        assert_eq!(food.food_count(), FOOD_ON_MAP_LIMIT);
        assert!(food.foods.iter().all(|item| item.food_type == FoodType::Seed));
        assert!(food
            .foods
            .iter()
            .all(|item| item.position.distance(NEST_POSITION) > FOOD_KEEP_OUT_RADIUS));
    }

    #[test]
    fn food_type_roll_stays_within_unlocked_tier() {
        let mut rng = SimRng::new(11);
        let rolls: Vec<FoodType> = (0..400).map(|_| pick_food_type(1, &mut rng)).collect();
        assert!(rolls.iter().all(|food| food.tier() <= 1));
        let sugar = rolls.iter().filter(|food| **food == FoodType::Sugar).count();
        assert!(sugar > 200, "best unlocked tier should dominate, got {sugar}/400");
    }

    #[test]
    fn intro_sequence_fires_steps_in_order_at_expected_ticks() {
        let entry = Vec2::new(20.0, -9.0);
        let mut sequence = boss_intro_sequence(entry, DT);
        let mut fired = Vec::new();
        let mut finished_at = None;
        for tick in 1..=400u32 {
            let frame = sequence.advance();
            for action in frame.fired {
                fired.push((tick, action));
            }
            if frame.finished {
                finished_at = Some(tick);
                break;
            }
        }

        assert_eq!(
            fired,
            vec![
                (1, CinematicAction::PanCamera { to: entry }),
                (91, CinematicAction::ShowBanner(BOSS_INTRO_BANNER.to_string())),
                (
                    211,
                    CinematicAction::Burst {
                        at: entry,
                        color: BOSS_BURST_COLOR,
                    }
                ),
                (211, CinematicAction::SpawnBoss { at: entry }),
                (211, CinematicAction::Hold),
                (271, CinematicAction::HideBanner),
                (271, CinematicAction::ReturnCamera),
                (331, CinematicAction::EngageBoss),
            ]
        );
        assert_eq!(finished_at, Some(331));
        assert!(sequence.is_finished());
    }

    #[test]
    fn timed_step_reports_progress() {
        let mut sequence = CinematicSequence::new(
            "pan",
            vec![CinematicStep {
                action: CinematicAction::ReturnCamera,
                duration_ticks: 4,
            }],
        );
        let progress: Vec<f32> = (0..4)
            .filter_map(|_| sequence.advance().active.map(|(_, progress)| progress))
            .collect();
        assert_eq!(progress, vec![0.25, 0.5, 0.75, 1.0]);
        assert!(sequence.is_finished());
        assert_eq!(sequence.advance(), CinematicFrame {
            fired: Vec::new(),
            active: None,
            finished: true,
        });
    }

    #[test]
    fn burst_particles_spread_from_origin() {
        let mut rng = SimRng::new(5);
        let origin = Vec2::new(2.0, 2.0);
        let particles = burst_particles(origin, [1, 2, 3], &mut rng);
        assert_eq!(particles.len(), 48);
        assert!(particles
            .iter()
            .all(|particle| particle.position == origin && particle.velocity.length() > 2.9));
    }

    #[test]
    fn unit_price_grows_fifteen_percent_per_owned_unit() {
        assert_eq!(unit_price(10, 0), 10);
        assert_eq!(unit_price(10, 1), 12);
        assert_eq!(unit_price(100, 2), 133);
        assert_eq!(unit_price(10, 10_000), u64::MAX);
    }

    #[test]
    fn upgrade_price_doubles_per_level() {
        assert_eq!(upgrade_price(UpgradeKind::Speed, 0), 50);
        assert_eq!(upgrade_price(UpgradeKind::Speed, 3), 400);
        assert_eq!(upgrade_price(UpgradeKind::FoodTier, 2), 800);
        assert_eq!(upgrade_price(UpgradeKind::Capacity, 200), u64::MAX);
    }

    #[test]
    fn upgrade_levels_map_to_modifiers() {
        let levels = UpgradeLevels {
            speed: 2,
            capacity: 3,
            food_tier: 9,
            spawn_rate: 1,
        };
        let modifiers = levels.modifiers();
        assert!((modifiers.speed_multiplier - 1.2).abs() < 1e-6);
        assert_eq!(modifiers.capacity_bonus, 3);
        assert_eq!(modifiers.food_tier, FoodType::Cake.tier());
        assert!((modifiers.food_spawn_interval_seconds - 1.76).abs() < 1e-5);
    }

    #[test]
    fn boss_defeat_pays_reward_and_raises_threshold() {
        let mut resources = ColonyResources::default();
        resources.total_food_collected = BOSS_FIRST_THRESHOLD;
        assert!(resources.boss_threshold_reached());

        let reward = resources.record_boss_defeat(resources.boss_level());
        assert_eq!(reward, BOSS_REWARD_BASE);
        assert_eq!(resources.food, STARTING_FOOD + BOSS_REWARD_BASE);
        assert_eq!(resources.next_boss_threshold, BOSS_FIRST_THRESHOLD * BOSS_THRESHOLD_GROWTH);
        assert!(!resources.boss_threshold_reached());
        assert_eq!(resources.boss_level(), 2);

        assert_eq!(resources.credit_delivery(10), 11);
    }

    #[test]
    fn hotkeys_map_to_shop_actions() {
        assert_eq!(shop_action_for_hotkey(1), Some(ShopAction::BuyUnit(UnitKind::Worker)));
        assert_eq!(shop_action_for_hotkey(5), Some(ShopAction::BuyUnit(UnitKind::Queen)));
        assert_eq!(
            shop_action_for_hotkey(8),
            Some(ShopAction::BuyUpgrade(UpgradeKind::FoodTier))
        );
        assert_eq!(shop_action_for_hotkey(9), Some(ShopAction::SummonBoss));
        assert_eq!(
            shop_action_for_hotkey(0),
            Some(ShopAction::BuyUpgrade(UpgradeKind::SpawnRate))
        );
        assert_eq!(shop_action_for_hotkey(10), None);
    }

    #[test]
    fn system_order_text_matches_tick_order() {
        let joined = COLONY_SYSTEM_ORDER
            .iter()
            .map(|system| system.name())
            .collect::<Vec<_>>()
            .join(">");
        assert_eq!(joined, COLONY_SYSTEM_ORDER_TEXT);

        let mut harness = ColonyHarness::new();
        harness.tick(DT);
        assert_eq!(harness.entities.last_tick_order, COLONY_SYSTEM_ORDER.to_vec());
    }

    #[test]
    fn aggregate_views_cover_every_manager() {
        let mut harness = ColonyHarness::new();
        harness.spawn(UnitKind::Worker, NEST_POSITION);
        harness.spawn(UnitKind::Car, NEST_POSITION);
        harness.entities.ants.lay_larva(UnitKind::Worker, NEST_POSITION);
        harness.place_food(FoodType::Cake, Vec2::new(5.0, 5.0));
        let catalog = harness.catalog.clone();
        harness
            .entities
            .enemies
            .spawn_boss(1, Vec2::new(-5.0, 0.0), &catalog)
            .expect("boss");

        let counts = harness.entities.colony_counts();
        assert_eq!(counts.of(UnitKind::Worker), 1);
        assert_eq!(counts.of(UnitKind::Car), 1);
        assert_eq!(counts.total_units(), 2);
        assert_eq!(counts.larvae, 1);
        assert_eq!(counts.food, 1);
        assert!(counts.boss_alive);

        let summaries = harness.entities.all_entities();
        assert_eq!(summaries.len(), 6);
        assert_eq!(summaries[0].kind, EntitySummaryKind::Nest);
        assert!(summaries
            .iter()
            .any(|summary| summary.kind == EntitySummaryKind::Boss(EnemyKind::Anteater)));
        assert_eq!(
            harness
                .entities
                .nearest_food(Vec2::new(4.0, 4.0))
                .map(|food| food.food_type),
            Some(FoodType::Cake)
        );
        assert!(harness.entities.nearest_unit(NEST_POSITION).is_some());
    }

    #[test]
    fn catalog_falls_back_to_builtin_without_defs() {
        assert_eq!(ColonyCatalog::from_defs(None), ColonyCatalog::builtin());
        let empty = DefDatabase::from_entity_defs(Vec::new());
        assert_eq!(ColonyCatalog::from_defs(Some(&empty)), ColonyCatalog::builtin());
    }

    #[test]
    fn catalog_reads_def_values_and_fills_missing_fields() {
        let mut worker = archetype("ants.worker");
        worker.health = Some(99);
        worker.capacity = Some(0);
        let mut cake = archetype("food.cake");
        cake.food_value = Some(40);
        let database = DefDatabase::from_entity_defs(vec![worker, cake]);

        let catalog = ColonyCatalog::from_defs(Some(&database));
        let builtin = ColonyCatalog::builtin();
        let stats = catalog.unit(UnitKind::Worker);
        assert_eq!(stats.max_hp, 99);
        assert_eq!(stats.capacity, 1);
        assert_eq!(stats.damage, builtin.unit(UnitKind::Worker).damage);
        assert_eq!(stats.move_speed, 9.0);
        assert_eq!(stats.visual.color, [1, 2, 3]);
        assert_eq!(catalog.food(FoodType::Cake).value, 40);
        assert_eq!(catalog.food(FoodType::Seed), builtin.food(FoodType::Seed));
    }

    #[test]
    fn forager_tag_sets_unit_role() {
        let mut car = archetype("ants.car");
        car.tags = vec!["guard".to_string()];
        let mut flying = archetype("ants.flying");
        flying.tags = vec!["forager".to_string()];
        let mut queen = archetype("ants.queen");
        queen.tags = vec!["forager".to_string()];
        let worker = archetype("ants.worker");
        let database = DefDatabase::from_entity_defs(vec![car, flying, queen, worker]);

        let catalog = ColonyCatalog::from_defs(Some(&database));
        assert!(!catalog.unit(UnitKind::Car).forager);
        assert_eq!(effective_capacity(catalog.unit(UnitKind::Car), 2), 0);
        assert!(catalog.unit(UnitKind::Flying).forager);
        assert!(catalog.unit(UnitKind::Worker).forager, "untagged def keeps built-in role");
        assert!(!catalog.unit(UnitKind::Queen).forager);

        let mut harness = ColonyHarness::new();
        harness.catalog = catalog;
        let guard = harness.spawn(UnitKind::Car, Vec2::new(1.0, 0.0));
        harness.place_food(FoodType::Seed, Vec2::new(4.0, 0.0));
        for _ in 0..40 {
            harness.tick(DT);
        }
        assert_eq!(harness.entities.ants.find(guard).expect("car").state, UnitState::Nesting);
    }

    #[test]
    fn shipped_colony_defs_match_builtin_catalog() {
        let temp = TempDir::new().expect("tempdir");
        let base = temp.path().join("assets").join("base");
        fs::create_dir_all(&base).expect("base dir");
        let shipped = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("assets")
            .join("base")
            .join("colony.xml");
        fs::copy(&shipped, base.join("colony.xml")).expect("copy colony.xml");
        let request = ContentPlanRequest {
            enabled_mods: Vec::new(),
            compiler_version: "test".to_string(),
            game_version: "test".to_string(),
        };

        let database = ants_engine::build_or_load_def_database(
            &ants_engine::AppPaths::under_root(temp.path()),
            &request,
        )
        .expect("compile shipped defs");

        assert_eq!(ColonyCatalog::from_defs(Some(&database)), ColonyCatalog::builtin());
    }

    #[test]
    fn scene_load_spawns_nest_and_starting_worker() {
        let temp = TempDir::new().expect("tempdir");
        let (scene, world) = loaded_scene(&temp);

        assert_eq!(scene.entities.colony_counts().of(UnitKind::Worker), 1);
        assert!(scene.entities.nest.nest.is_some());
        assert_eq!(world.entity_count(), 2);
        assert_eq!(scene.resources.food, STARTING_FOOD);
        let title = scene.debug_title(&world).expect("title");
        assert!(title.starts_with("Idle Ants | food 50 | ants 1"), "{title}");
    }

    #[test]
    fn scene_update_runs_simulation_and_syncs_render_entities() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);

        for _ in 0..(60 * 5) {
            assert_eq!(
                scene.update(DT, &InputSnapshot::empty(), &mut world),
                SceneCommand::None
            );
            world.apply_pending();
        }

        assert!(scene.entities.food.next_food_id >= 2, "timer should have spawned food");
        let food_on_map = scene.entities.food.foods.len();
        assert_eq!(world.entity_count(), 2 + food_on_map + scene.entities.ants.larvae.len());
        let hud = scene.hud(&world).expect("hud");
        assert!(hud.lines[0].starts_with("Food "));
        assert!(hud.lines.iter().any(|line| line.starts_with("[9] Summon")));
        assert_eq!(hud.boss_health, None);
    }

    #[test]
    fn shop_hotkeys_buy_units_and_report_rejections() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);

        scene.update(DT, &hotkey_snapshot(1), &mut world);
        assert_eq!(scene.entities.ants.count_of(UnitKind::Worker), 2);
        assert_eq!(scene.resources.food, STARTING_FOOD - 12);

        scene.update(DT, &hotkey_snapshot(4), &mut world);
        assert_eq!(scene.entities.ants.count_of(UnitKind::Car), 0);
        assert_eq!(
            scene.status_line.as_deref(),
            Some("[4] need 500 food, have 38")
        );
    }

    #[test]
    fn second_queen_and_maxed_upgrades_are_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let mut scene = test_scene(&temp);
        scene.reset_colony();
        scene.resources.food = 1_000_000;

        assert_eq!(scene.buy_unit(UnitKind::Queen), Ok(()));
        assert_eq!(
            scene.buy_unit(UnitKind::Queen),
            Err(PurchaseError::Spawn(SpawnError::QueenAlreadyAlive))
        );
        for _ in 0..3 {
            assert_eq!(scene.buy_upgrade(UpgradeKind::FoodTier), Ok(()));
        }
        assert_eq!(
            scene.buy_upgrade(UpgradeKind::FoodTier),
            Err(PurchaseError::MaxLevel {
                kind: UpgradeKind::FoodTier,
                max_level: 3,
            })
        );
        assert_eq!(scene.upgrades.food_tier, 3);
    }

    #[test]
    fn uncapped_upgrade_at_top_level_saturates() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, _world) = loaded_scene(&temp);
        scene.upgrades.speed = u32::MAX;
        scene.resources.food = u64::MAX;

        scene
            .handle_shop(ShopAction::BuyUpgrade(UpgradeKind::Speed), DT)
            .expect("affordable at max food");

        assert_eq!(scene.upgrades.speed, u32::MAX);
        assert_eq!(scene.resources.food, 0);
    }

    #[test]
    fn capacity_upgrade_raises_existing_forager_capacity() {
        let temp = TempDir::new().expect("tempdir");
        let mut scene = test_scene(&temp);
        scene.reset_colony();
        scene.resources.food = 1_000;

        scene.buy_upgrade(UpgradeKind::Capacity).expect("upgrade");

        assert_eq!(scene.resources.food, 1_000 - 75);
        assert!(scene.entities.ants.units.iter().all(|unit| unit.capacity == 2));
    }

    #[test]
    fn left_click_places_food_at_cursor_with_cooldown() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);
        let click = InputSnapshot::empty()
            .with_left_click_pressed(true)
            .with_cursor_position_px(Some(Vec2::new(400.0 + 24.0 * 5.0, 300.0)))
            .with_window_size((800, 600));

        let placed = scene.place_food_on_click(&click, &world).expect("food placed");
        let food = scene
            .entities
            .food
            .foods
            .iter()
            .find(|food| food.id == placed)
            .expect("food");
        assert!((food.position.x - 5.0).abs() < 1e-4);
        assert!(food.position.y.abs() < 1e-4);
        assert!(scene.place_food_on_click(&click, &world).is_none());

        scene.update(FOOD_CLICK_COOLDOWN_SECONDS, &InputSnapshot::empty(), &mut world);
        assert!(scene.place_food_on_click(&click, &world).is_some());
    }

    #[test]
    fn summon_plays_intro_then_engages_boss() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);

        scene.update(DT, &hotkey_snapshot(9), &mut world);
        assert!(scene.cinematic.is_some());
        for _ in 1..90 {
            scene.update(DT, &InputSnapshot::empty(), &mut world);
        }
        assert!(world.camera().position.distance(BOSS_ENTRY_POSITION) < 1e-3);

        let pan = snapshot_panning_right();
        for _ in 90..150 {
            scene.update(DT, &pan, &mut world);
        }
        assert!(world.camera().position.distance(BOSS_ENTRY_POSITION) < 1e-3);
        let hud = scene.hud(&world).expect("hud");
        assert_eq!(hud.banner.as_deref(), Some(BOSS_INTRO_BANNER));

        scene.update(DT, &hotkey_snapshot(9), &mut world);
        assert_eq!(
            scene.status_line.as_deref(),
            Some("[9] a boss encounter is already in progress")
        );

        for _ in 151..331 {
            scene.update(DT, &InputSnapshot::empty(), &mut world);
        }
        assert!(scene.cinematic.is_none());
        let boss = scene.entities.enemies.boss().expect("boss spawned");
        assert!(boss.engaged);
        assert_eq!(boss.level, 1);
        assert!(world.camera().position.distance(Vec2::ZERO) < 1e-3);
        assert_eq!(scene.hud(&world).expect("hud").banner, None);
        assert_eq!(scene.hud(&world).expect("hud").boss_health, Some(1.0));
    }

    fn snapshot_panning_right() -> InputSnapshot {
        InputSnapshot::empty().with_action_down(InputAction::PanRight, true)
    }

    #[test]
    fn camera_pans_outside_cinematics() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);
        for _ in 0..60 {
            scene.update(DT, &snapshot_panning_right(), &mut world);
        }
        assert!((world.camera().position.x - CAMERA_SPEED_UNITS_PER_SECOND).abs() < 1e-3);

        scene.update(DT, &InputSnapshot::empty().with_zoom_delta_steps(3), &mut world);
        assert!((world.camera().zoom - 1.3).abs() < 1e-5);
    }

    #[test]
    fn food_threshold_triggers_intro() {
        let temp = TempDir::new().expect("tempdir");
        let mut scene = test_scene(&temp);
        scene.reset_colony();
        scene.resources.total_food_collected = BOSS_FIRST_THRESHOLD;

        scene.run_colony_tick(DT);

        assert_eq!(scene.cinematic.as_ref().map(|sequence| sequence.name), Some("boss_intro"));
    }

    #[test]
    fn boss_death_credits_reward_and_plays_defeat_sequence() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);
        let catalog = scene.catalog.clone();
        scene
            .entities
            .enemies
            .spawn_boss(1, Vec2::new(10.0, 0.0), &catalog)
            .expect("boss");
        if let Some(boss) = scene.entities.enemies.boss.as_mut() {
            boss.hp = 0;
        }

        scene.update(DT, &InputSnapshot::empty(), &mut world);

        assert!(scene.entities.enemies.boss().is_none());
        assert_eq!(scene.resources.bosses_defeated, 1);
        assert_eq!(scene.resources.food, STARTING_FOOD + BOSS_REWARD_BASE);
        assert!((scene.resources.food_multiplier - 1.1).abs() < 1e-6);
        assert_eq!(
            scene.hud(&world).expect("hud").banner.as_deref(),
            Some("ANTEATER DEFEATED! +500 FOOD")
        );
        assert!(!world.particles().is_empty());
        for _ in 0..200 {
            scene.update(DT, &InputSnapshot::empty(), &mut world);
        }
        assert!(scene.cinematic.is_none());
        assert_eq!(scene.banner, None);
    }

    #[test]
    fn save_round_trip_restores_economy() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);
        scene.resources.food = 4321;
        scene.resources.total_food_collected = 2500;
        scene.resources.record_boss_defeat(1);
        scene.upgrades.speed = 2;
        scene.upgrades.food_tier = 1;
        scene.buy_unit(UnitKind::Car).expect("car");
        scene.buy_unit(UnitKind::Queen).expect("queen");
        world.camera_mut().position = Vec2::new(3.0, -2.0);
        world.camera_mut().set_zoom_clamped(1.5);
        let saved_resources = scene.resources.clone();

        let path = scene.save_to_disk(&world).expect("save");
        assert_eq!(path, temp.path().join("saves").join(SAVE_FILE_NAME));

        let (mut restored, mut restored_world) = loaded_scene(&temp);
        assert_eq!(restored.resources, saved_resources);
        assert_eq!(restored.upgrades, scene.upgrades);
        let counts = restored.entities.colony_counts();
        assert_eq!(counts.of(UnitKind::Worker), 1);
        assert_eq!(counts.of(UnitKind::Car), 1);
        assert!(restored.entities.ants.queen_alive());
        assert_eq!(restored_world.camera().position, Vec2::new(3.0, -2.0));
        assert!((restored_world.camera().zoom - 1.5).abs() < 1e-6);

        restored.resources.food = 1;
        restored
            .load_from_disk(&mut restored_world)
            .expect("reload");
        assert_eq!(restored.resources.food, saved_resources.food);
        assert_eq!(restored.entities.colony_counts().total_units(), 3);
    }

    fn valid_save_json() -> serde_json::Value {
        let temp = TempDir::new().expect("tempdir");
        let (scene, world) = loaded_scene(&temp);
        serde_json::to_value(scene.build_save_game(&world)).expect("save json")
    }

    #[test]
    fn save_with_wrong_version_is_rejected_with_path() {
        let mut save = valid_save_json();
        save["save_version"] = json!(7);
        let parsed = parse_save_game_json(&save.to_string()).expect("parse");
        let error = validate_save_game(&parsed).expect_err("version");
        assert_eq!(
            error.to_string(),
            "validation failed at save_version: expected 1, got 7"
        );
    }

    #[test]
    fn save_with_bad_values_is_rejected() {
        let mut save = valid_save_json();
        save["food_multiplier"] = json!(0.5);
        let parsed = parse_save_game_json(&save.to_string()).expect("parse");
        assert_eq!(
            validate_save_game(&parsed).expect_err("multiplier").to_string(),
            "validation failed at food_multiplier: expected finite number >= 1, got 0.5"
        );

        let mut save = valid_save_json();
        save["upgrades"]["spawn_rate"] = json!(6);
        let parsed = parse_save_game_json(&save.to_string()).expect("parse");
        assert_eq!(
            validate_save_game(&parsed).expect_err("spawn rate").to_string(),
            "validation failed at upgrades.spawn_rate: expected level <= 5, got 6"
        );

        let mut save = valid_save_json();
        save["upgrades"]["speed"] = json!(u32::MAX);
        let parsed = parse_save_game_json(&save.to_string()).expect("parse");
        assert_eq!(
            validate_save_game(&parsed).expect_err("speed").to_string(),
            format!("validation failed at upgrades.speed: expected level <= {SAVED_UPGRADE_LEVEL_LIMIT}, got {}", u32::MAX)
        );

        let mut save = valid_save_json();
        save["unit_counts"]["worker"] = json!(MAX_UNITS + 1);
        let parsed = parse_save_game_json(&save.to_string()).expect("parse");
        assert!(validate_save_game(&parsed)
            .expect_err("unit cap")
            .to_string()
            .starts_with("validation failed at unit_counts:"));
    }

    #[test]
    fn malformed_save_reports_json_path() {
        let mut save = valid_save_json();
        save["camera"]["zoom"] = json!(null);
        let error = parse_save_game_json(&save.to_string()).expect_err("null zoom");
        assert!(
            error.to_string().starts_with("parse save json at camera.zoom:"),
            "{error}"
        );

        let error = parse_save_game_json("{").expect_err("truncated");
        assert!(error.to_string().starts_with("parse save json"), "{error}");
    }

    #[test]
    fn rejected_load_leaves_colony_untouched() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);
        let mut save = valid_save_json();
        save["save_version"] = json!(99);
        fs::create_dir_all(temp.path().join("saves")).expect("saves dir");
        fs::write(scene.save_path(), save.to_string()).expect("write save");
        scene.resources.food = 777;

        assert!(matches!(
            scene.load_from_disk(&mut world),
            Err(SaveError::Invalid { path: "save_version", .. })
        ));
        assert_eq!(scene.resources.food, 777);
    }

    #[test]
    fn rejected_save_at_scene_load_is_set_aside_not_overwritten() {
        let temp = TempDir::new().expect("tempdir");
        let mut scene = test_scene(&temp);
        let mut save = valid_save_json();
        save["save_version"] = json!(2);
        save["food"] = json!(987_654);
        fs::create_dir_all(temp.path().join("saves")).expect("saves dir");
        fs::write(scene.save_path(), save.to_string()).expect("write save");
        let mut world = SceneWorld::default();

        scene.load(&mut world);

        assert_eq!(scene.resources, ColonyResources::default());
        assert!(!scene.save_path().exists());
        let rejected = rejected_save_path(&scene.save_path());
        let kept: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&rejected).expect("rejected save")).expect("json");
        assert_eq!(kept["food"], json!(987_654));

        scene.unload(&mut world);
        let written = read_save_file(&scene.save_path()).expect("fresh save on unload");
        assert_eq!(written.food, STARTING_FOOD);
        let kept: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&rejected).expect("rejected save")).expect("json");
        assert_eq!(kept["food"], json!(987_654));
    }

    #[test]
    fn load_key_sets_aside_malformed_save() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);
        fs::create_dir_all(temp.path().join("saves")).expect("saves dir");
        fs::write(scene.save_path(), "{").expect("write save");
        scene.resources.food = 321;

        scene.update(DT, &InputSnapshot::empty().with_load_pressed(true), &mut world);

        assert_eq!(scene.resources.food, 321);
        assert!(!scene.save_path().exists());
        assert_eq!(
            fs::read_to_string(rejected_save_path(&scene.save_path())).expect("rejected save"),
            "{"
        );
    }

    #[test]
    fn rejected_save_that_cannot_move_blocks_background_saves_until_explicit_save() {
        let temp = TempDir::new().expect("tempdir");
        let mut scene = ColonyScene::new(temp.path().join("saves"), 0.5);
        let blocker = rejected_save_path(&scene.save_path());
        fs::create_dir_all(&blocker).expect("blocking dir");
        fs::write(blocker.join("keep"), "x").expect("blocking file");
        fs::write(scene.save_path(), "not json").expect("write save");
        let mut world = SceneWorld::default();

        scene.load(&mut world);
        for _ in 0..60 {
            scene.update(DT, &InputSnapshot::empty(), &mut world);
        }
        assert_eq!(fs::read_to_string(scene.save_path()).expect("save"), "not json");
        scene.unload(&mut world);
        assert_eq!(fs::read_to_string(scene.save_path()).expect("save"), "not json");

        scene.load(&mut world);
        scene.update(DT, &InputSnapshot::empty().with_save_pressed(true), &mut world);
        let written = read_save_file(&scene.save_path()).expect("explicit save");
        assert_eq!(written.save_version, SAVE_VERSION);
    }

    #[test]
    fn reset_discards_save_and_requests_hard_reset() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);
        scene.save_to_disk(&world).expect("save");
        assert!(scene.save_path().exists());

        let command = scene.update(DT, &InputSnapshot::empty().with_reset_pressed(true), &mut world);

        assert_eq!(command, SceneCommand::HardReset);
        assert!(!scene.save_path().exists());
        scene.unload(&mut world);
        assert!(!scene.save_path().exists(), "unload after reset must not write a save");
        world.clear();
        scene.load(&mut world);
        assert_eq!(scene.resources, ColonyResources::default());
    }

    #[test]
    fn unload_writes_save() {
        let temp = TempDir::new().expect("tempdir");
        let (mut scene, mut world) = loaded_scene(&temp);
        scene.resources.food = 99;
        scene.unload(&mut world);
        let saved = read_save_file(&scene.save_path()).expect("saved on unload");
        assert_eq!(saved.food, 99);
    }

    #[test]
    fn autosave_writes_after_interval() {
        let temp = TempDir::new().expect("tempdir");
        let mut scene = ColonyScene::new(temp.path().join("saves"), 0.5);
        let mut world = SceneWorld::default();
        scene.load(&mut world);
        for _ in 0..29 {
            scene.update(DT, &InputSnapshot::empty(), &mut world);
        }
        assert!(!scene.save_path().exists());
        for _ in 0..2 {
            scene.update(DT, &InputSnapshot::empty(), &mut world);
        }
        assert!(scene.save_path().exists());
    }
