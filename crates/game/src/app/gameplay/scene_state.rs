struct ColonyScene {
    saves_dir: PathBuf,
    autosave_interval_seconds: f32,
    autosave_timer_seconds: f32,
    catalog: ColonyCatalog,
    entities: EntityManager,
    resources: ColonyResources,
    upgrades: UpgradeLevels,
    rng: SimRng,
    events: ColonyEventBus,
    cinematic: Option<CinematicSequence>,
    cinematic_camera_from: Vec2,
    cinematic_camera_home: Vec2,
    banner: Option<String>,
    status_line: Option<String>,
    click_cooldown_seconds: f32,
    skip_save_on_unload: bool,
    /// Set when a rejected save could not be moved aside; only an explicit save clears it.
    background_saves_blocked: bool,
    last_validation: ValidationReport,
    system_order_text: String,
    tick_count: u64,
}

impl ColonyScene {
    fn new(saves_dir: PathBuf, autosave_interval_seconds: f32) -> Self {
        Self {
            saves_dir,
            autosave_interval_seconds: autosave_interval_seconds.max(0.0),
            autosave_timer_seconds: 0.0,
            catalog: ColonyCatalog::builtin(),
            entities: EntityManager::default(),
            resources: ColonyResources::default(),
            upgrades: UpgradeLevels::default(),
            rng: SimRng::new(RNG_SEED),
            events: ColonyEventBus::default(),
            cinematic: None,
            cinematic_camera_from: Vec2::ZERO,
            cinematic_camera_home: Vec2::ZERO,
            banner: None,
            status_line: None,
            click_cooldown_seconds: 0.0,
            skip_save_on_unload: false,
            background_saves_blocked: false,
            last_validation: ValidationReport::default(),
            system_order_text: COLONY_SYSTEM_ORDER_TEXT.to_string(),
            tick_count: 0,
        }
    }

    /// Fresh colony: default economy, the nest and one worker.
    fn reset_colony(&mut self) {
        self.entities.clear();
        self.resources = ColonyResources::default();
        self.upgrades = UpgradeLevels::default();
        self.cinematic = None;
        self.banner = None;
        self.status_line = None;
        self.entities.nest.create(NEST_POSITION);
        if let Err(error) = self.entities.ants.spawn_unit(
            UnitKind::Worker,
            self.entities.nest.position(),
            &self.catalog,
            0,
        ) {
            warn!(error = %error, "starting_worker_spawn_failed");
        }
    }

    fn modifiers(&self) -> ColonyModifiers {
        self.upgrades.modifiers()
    }

    fn handle_shop(&mut self, action: ShopAction, fixed_dt_seconds: f32) -> Result<(), PurchaseError> {
        match action {
            ShopAction::BuyUnit(kind) => self.buy_unit(kind),
            ShopAction::BuyUpgrade(kind) => self.buy_upgrade(kind),
            ShopAction::SummonBoss => self.summon_boss(fixed_dt_seconds),
        }
    }

    fn unit_price_of(&self, kind: UnitKind) -> u64 {
        unit_price(self.catalog.unit(kind).cost, self.entities.ants.count_of(kind))
    }

    fn buy_unit(&mut self, kind: UnitKind) -> Result<(), PurchaseError> {
        let price = self.unit_price_of(kind);
        if self.resources.food < price {
            return Err(PurchaseError::Unaffordable {
                price,
                food: self.resources.food,
            });
        }
        if kind == UnitKind::Queen && self.entities.ants.queen_alive() {
            return Err(SpawnError::QueenAlreadyAlive.into());
        }
        if self.entities.ants.units.len() >= MAX_UNITS {
            return Err(SpawnError::UnitCapReached { cap: MAX_UNITS }.into());
        }
        let unit_id = self.entities.ants.spawn_unit(
            kind,
            self.entities.nest.position(),
            &self.catalog,
            self.upgrades.capacity,
        )?;
        self.resources.try_spend(price);
        info!(
            unit_id = unit_id.0,
            kind = kind.label(),
            price,
            food = self.resources.food,
            "unit_purchased"
        );
        Ok(())
    }

    fn buy_upgrade(&mut self, kind: UpgradeKind) -> Result<(), PurchaseError> {
        let level = self.upgrades.level(kind);
        if let Some(max_level) = kind.max_level() {
            if level >= max_level {
                return Err(PurchaseError::MaxLevel { kind, max_level });
            }
        }
        let price = upgrade_price(kind, level);
        if !self.resources.try_spend(price) {
            return Err(PurchaseError::Unaffordable {
                price,
                food: self.resources.food,
            });
        }
        let next_level = level.saturating_add(1);
        *self.upgrades.level_mut(kind) = next_level;
        if kind == UpgradeKind::Capacity {
            let catalog = &self.catalog;
            let bonus = self.upgrades.capacity;
            for unit in &mut self.entities.ants.units {
                unit.capacity = effective_capacity(catalog.unit(unit.kind), bonus);
            }
        }
        info!(
            upgrade = kind.label(),
            level = next_level,
            price,
            food = self.resources.food,
            "upgrade_purchased"
        );
        Ok(())
    }

    fn summon_boss(&mut self, fixed_dt_seconds: f32) -> Result<(), PurchaseError> {
        if !self.start_boss_intro(fixed_dt_seconds) {
            return Err(PurchaseError::BossActive);
        }
        Ok(())
    }

    /// Starts the intro sequence unless a boss is alive or a sequence is running.
    fn start_boss_intro(&mut self, fixed_dt_seconds: f32) -> bool {
        if self.entities.enemies.boss().is_some() || self.cinematic.is_some() {
            return false;
        }
        info!(
            level = self.resources.boss_level(),
            total_food_collected = self.resources.total_food_collected,
            "boss_intro_started"
        );
        self.cinematic = Some(boss_intro_sequence(BOSS_ENTRY_POSITION, fixed_dt_seconds));
        true
    }

    fn maybe_trigger_boss(&mut self, fixed_dt_seconds: f32) {
        if self.resources.boss_threshold_reached() {
            self.start_boss_intro(fixed_dt_seconds);
        }
    }

    fn process_events(&mut self, fixed_dt_seconds: f32) {
        for event in self.events.drain() {
            match event {
                ColonyEvent::FoodDelivered { unit_id, value } => {
                    let credited = self.resources.credit_delivery(value);
                    debug!(unit_id = unit_id.0, value, credited, "food_delivered");
                }
                ColonyEvent::BossDefeated {
                    enemy_id,
                    level,
                    position,
                } => {
                    let reward = self.resources.record_boss_defeat(level);
                    info!(
                        enemy_id = enemy_id.0,
                        level,
                        reward,
                        food = self.resources.food,
                        next_boss_threshold = self.resources.next_boss_threshold,
                        "boss_defeated"
                    );
                    // The intro may still be running if the boss died before it ended.
                    if let Some(sequence) = self.cinematic.take() {
                        debug!(sequence = sequence.name, "cinematic_interrupted");
                        self.banner = None;
                    }
                    self.cinematic = Some(boss_defeat_sequence(position, reward, fixed_dt_seconds));
                }
                ColonyEvent::UnitDied { unit_id, kind } => {
                    debug!(unit_id = unit_id.0, kind = kind.label(), "unit_died");
                }
                ColonyEvent::LarvaHatched { unit_id, kind } => {
                    debug!(unit_id = unit_id.0, kind = kind.label(), "larva_hatched");
                }
                ColonyEvent::FoodCollected { .. }
                | ColonyEvent::LarvaLaid { .. }
                | ColonyEvent::BossHit { .. }
                | ColonyEvent::AntHit { .. }
                | ColonyEvent::EntityDiscarded { .. } => {}
            }
        }
    }

    fn advance_cinematic(&mut self, world: &mut SceneWorld) {
        let Some(sequence) = self.cinematic.as_mut() else {
            return;
        };
        let frame = sequence.advance();
        let name = sequence.name;
        for action in frame.fired {
            match action {
                CinematicAction::PanCamera { .. } => {
                    self.cinematic_camera_home = world.camera().position;
                    self.cinematic_camera_from = world.camera().position;
                }
                CinematicAction::ReturnCamera => {
                    self.cinematic_camera_from = world.camera().position;
                }
                CinematicAction::ShowBanner(text) => self.banner = Some(text),
                CinematicAction::HideBanner => self.banner = None,
                CinematicAction::Burst { at, color } => {
                    for particle in burst_particles(at, color, &mut self.rng) {
                        if !world.push_particle(particle) {
                            break;
                        }
                    }
                }
                CinematicAction::SpawnBoss { at } => {
                    let level = self.resources.boss_level();
                    self.entities.enemies.spawn_boss(level, at, &self.catalog);
                }
                CinematicAction::EngageBoss => {
                    if self.entities.enemies.engage() {
                        info!("boss_engaged");
                    }
                }
                CinematicAction::Hold => {}
            }
        }
        match frame.active {
            Some((CinematicAction::PanCamera { to }, progress)) => {
                world.camera_mut().position = self.cinematic_camera_from.lerp(to, progress);
            }
            Some((CinematicAction::ReturnCamera, progress)) => {
                world.camera_mut().position = self
                    .cinematic_camera_from
                    .lerp(self.cinematic_camera_home, progress);
            }
            _ => {}
        }
        if frame.finished {
            debug!(sequence = name, tick = self.tick_count, "cinematic_finished");
            self.cinematic = None;
        }
    }

    fn camera_input(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot, world: &mut SceneWorld) {
        let zoom_steps = input.zoom_delta_steps();
        if zoom_steps != 0 {
            world.camera_mut().apply_zoom_steps(zoom_steps);
        }
        if self.cinematic.is_some() {
            return;
        }
        let delta = camera_delta(input, fixed_dt_seconds, CAMERA_SPEED_UNITS_PER_SECOND);
        if delta != Vec2::ZERO {
            world.camera_mut().position += delta;
        }
    }

    fn place_food_on_click(&mut self, input: &InputSnapshot, world: &SceneWorld) -> Option<FoodId> {
        if !input.left_click_pressed() || self.click_cooldown_seconds > 0.0 {
            return None;
        }
        let cursor_px = input.cursor_position_px()?;
        let position = screen_to_world_px(world.camera(), input.window_size(), cursor_px);
        if !position.is_finite() {
            return None;
        }
        let food_type = pick_food_type(self.modifiers().food_tier, &mut self.rng);
        let food_id = self
            .entities
            .food
            .spawn_food(food_type, position, &self.catalog)?;
        self.click_cooldown_seconds = FOOD_CLICK_COOLDOWN_SECONDS;
        debug!(
            food_id = food_id.0,
            food_type = food_type.def_name(),
            x = position.x,
            y = position.y,
            "food_placed"
        );
        Some(food_id)
    }

    fn run_colony_tick(&mut self, fixed_dt_seconds: f32) {
        let mut ctx = ColonyTickContext {
            fixed_dt_seconds,
            modifiers: self.upgrades.modifiers(),
            catalog: &self.catalog,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        self.entities.update(&mut ctx);
        self.process_events(fixed_dt_seconds);
        self.last_validation = validate_entities(&mut self.entities, &mut self.events);
        self.events.drain();
        self.maybe_trigger_boss(fixed_dt_seconds);
    }

    fn build_save_game(&self, world: &SceneWorld) -> SaveGame {
        let camera = world.camera();
        SaveGame {
            save_version: SAVE_VERSION,
            food: self.resources.food,
            total_food_collected: self.resources.total_food_collected,
            food_multiplier: self.resources.food_multiplier,
            bosses_defeated: self.resources.bosses_defeated,
            next_boss_threshold: self.resources.next_boss_threshold,
            upgrades: self.upgrades,
            unit_counts: SavedUnitCounts::from_counts(&self.entities.colony_counts()),
            queen_alive: self.entities.ants.queen_alive(),
            camera: SavedCamera {
                x: camera.position.x,
                y: camera.position.y,
                zoom: camera.zoom,
            },
        }
    }

    /// Replaces the colony with the saved economy. Units respawn at the nest; food and any
    /// boss encounter in progress are not part of a save.
    fn apply_save_game(&mut self, save: SaveGame, world: &mut SceneWorld) {
        self.entities.clear();
        self.cinematic = None;
        self.banner = None;
        self.entities.nest.create(NEST_POSITION);
        self.resources = ColonyResources {
            food: save.food,
            total_food_collected: save.total_food_collected,
            food_multiplier: save.food_multiplier,
            bosses_defeated: save.bosses_defeated,
            next_boss_threshold: save.next_boss_threshold,
        };
        self.upgrades = save.upgrades;
        let nest_position = self.entities.nest.position();
        let queen = save.queen_alive.then_some((UnitKind::Queen, 1));
        for (kind, count) in save.unit_counts.iter().chain(queen) {
            for _ in 0..count {
                let position = self.rng.point_within(nest_position, NEST_ARRIVAL_RADIUS);
                if let Err(error) = self.entities.ants.spawn_unit(
                    kind,
                    position,
                    &self.catalog,
                    self.upgrades.capacity,
                ) {
                    warn!(kind = kind.label(), error = %error, "saved_unit_spawn_failed");
                    break;
                }
            }
        }
        let camera = world.camera_mut();
        camera.position = Vec2::new(save.camera.x, save.camera.y);
        camera.set_zoom_clamped(save.camera.zoom);
    }

    fn save_path(&self) -> PathBuf {
        save_file_path(&self.saves_dir)
    }

    fn save_to_disk(&self, world: &SceneWorld) -> Result<PathBuf, SaveError> {
        let path = self.save_path();
        write_save_file(&path, &self.build_save_game(world))?;
        Ok(path)
    }

    /// A save that parses badly or fails validation is renamed aside so later saves cannot
    /// overwrite it.
    fn load_from_disk(&mut self, world: &mut SceneWorld) -> Result<PathBuf, SaveError> {
        let path = self.save_path();
        let save = match read_save_file(&path) {
            Ok(save) => save,
            Err(error) => {
                if error.is_rejected_content() {
                    self.set_aside_rejected_save(&path);
                }
                return Err(error);
            }
        };
        self.apply_save_game(save, world);
        Ok(path)
    }

    fn set_aside_rejected_save(&mut self, path: &Path) {
        let rejected = rejected_save_path(path);
        match fs::rename(path, &rejected) {
            Ok(()) => warn!(
                path = %path.display(),
                moved_to = %rejected.display(),
                "rejected_save_set_aside"
            ),
            Err(error) => {
                self.background_saves_blocked = true;
                warn!(
                    path = %path.display(),
                    error = %error,
                    "rejected_save_kept_background_saves_blocked"
                );
            }
        }
    }

    fn discard_save_file(&self) {
        let path = self.save_path();
        match fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), "save_discarded"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => warn!(path = %path.display(), error = %error, "save_discard_failed"),
        }
    }

    fn tick_autosave(&mut self, fixed_dt_seconds: f32, world: &SceneWorld) {
        if self.autosave_interval_seconds <= 0.0 || self.background_saves_blocked {
            return;
        }
        self.autosave_timer_seconds += fixed_dt_seconds;
        if self.autosave_timer_seconds < self.autosave_interval_seconds {
            return;
        }
        self.autosave_timer_seconds = 0.0;
        match self.save_to_disk(world) {
            Ok(path) => debug!(path = %path.display(), "autosave_written"),
            Err(error) => warn!(error = %error, "autosave_failed"),
        }
    }

    fn hud_lines(&self) -> Vec<String> {
        let counts = self.entities.colony_counts();
        let mut lines = vec![
            format!(
                "Food {}  x{:.1}  collected {} / boss at {}",
                self.resources.food,
                self.resources.food_multiplier,
                self.resources.total_food_collected,
                self.resources.next_boss_threshold
            ),
            format!(
                "Ants {}  larvae {}  food on map {}  bosses defeated {}",
                counts.total_units(),
                counts.larvae,
                counts.food,
                self.resources.bosses_defeated
            ),
        ];
        for digit in [1, 2, 3, 4, 5, 6, 7, 8, 9, 0] {
            let Some(action) = shop_action_for_hotkey(digit) else {
                continue;
            };
            lines.push(format!("[{digit}] {}", self.shop_entry_text(action, &counts)));
        }
        if let Some(status) = &self.status_line {
            lines.push(status.clone());
        }
        if !self.last_validation.is_clean() {
            lines.push(format!(
                "discarded {} invalid entities",
                self.last_validation.total_discarded()
            ));
        }
        lines
    }

    fn shop_entry_text(&self, action: ShopAction, counts: &ColonyCounts) -> String {
        match action {
            ShopAction::BuyUnit(kind) => format!(
                "{} x{}  {} food",
                kind.label(),
                counts.of(kind),
                self.unit_price_of(kind)
            ),
            ShopAction::BuyUpgrade(kind) => {
                let level = self.upgrades.level(kind);
                match kind.max_level() {
                    Some(max_level) if level >= max_level => {
                        format!("{} lv{level}  max", kind.label())
                    }
                    _ => format!(
                        "{} lv{level}  {} food",
                        kind.label(),
                        upgrade_price(kind, level)
                    ),
                }
            }
            ShopAction::SummonBoss => "Summon anteater".to_string(),
        }
    }
}

fn camera_delta(input: &InputSnapshot, fixed_dt_seconds: f32, speed: f32) -> Vec2 {
    let mut direction = Vec2::ZERO;
    if input.is_down(InputAction::PanUp) {
        direction.y += 1.0;
    }
    if input.is_down(InputAction::PanDown) {
        direction.y -= 1.0;
    }
    if input.is_down(InputAction::PanRight) {
        direction.x += 1.0;
    }
    if input.is_down(InputAction::PanLeft) {
        direction.x -= 1.0;
    }
    if direction == Vec2::ZERO {
        return direction;
    }
    direction.normalized() * (speed * fixed_dt_seconds)
}
