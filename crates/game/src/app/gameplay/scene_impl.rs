impl Scene for ColonyScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.catalog = ColonyCatalog::from_defs(world.def_database());
        // The world may have been cleared by a hard reset; old render ids are gone with it.
        self.entities.forget_visuals();
        self.rng = SimRng::new(RNG_SEED);
        self.events = ColonyEventBus::default();
        self.autosave_timer_seconds = 0.0;
        self.click_cooldown_seconds = 0.0;
        self.skip_save_on_unload = false;
        self.background_saves_blocked = false;
        self.last_validation = ValidationReport::default();
        self.system_order_text = COLONY_SYSTEM_ORDER_TEXT.to_string();
        self.tick_count = 0;
        self.reset_colony();

        if self.save_path().exists() {
            match self.load_from_disk(world) {
                Ok(path) => info!(path = %path.display(), "save_loaded"),
                Err(error) => warn!(error = %error, "save_load_failed"),
            }
        }

        self.entities.sync_visuals(world, &self.catalog);
        world.apply_pending();
        info!(
            entity_count = world.entity_count(),
            food = self.resources.food,
            sys = %self.system_order_text,
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.save_pressed() {
            match self.save_to_disk(world) {
                Ok(path) => {
                    self.background_saves_blocked = false;
                    info!(path = %path.display(), "save_written");
                }
                Err(error) => warn!(error = %error, "save_failed"),
            }
        }

        if input.load_pressed() {
            match self.load_from_disk(world) {
                Ok(path) => info!(path = %path.display(), "save_loaded"),
                Err(error) => warn!(error = %error, "load_failed"),
            }
        }

        if input.reset_pressed() {
            self.discard_save_file();
            self.skip_save_on_unload = true;
            info!("colony_reset_requested");
            return SceneCommand::HardReset;
        }

        for digit in input.hotkeys().iter() {
            let Some(action) = shop_action_for_hotkey(digit) else {
                continue;
            };
            self.status_line = Some(match self.handle_shop(action, fixed_dt_seconds) {
                Ok(()) => format!("[{digit}] ok"),
                Err(error) => {
                    debug!(digit, error = %error, "shop_action_rejected");
                    format!("[{digit}] {error}")
                }
            });
        }

        self.click_cooldown_seconds = (self.click_cooldown_seconds - fixed_dt_seconds).max(0.0);
        self.place_food_on_click(input, world);
        self.camera_input(fixed_dt_seconds, input, world);

        self.tick_count = self.tick_count.saturating_add(1);
        self.run_colony_tick(fixed_dt_seconds);
        self.advance_cinematic(world);

        world.tick_particles(fixed_dt_seconds);
        self.entities.sync_visuals(world, &self.catalog);
        self.tick_autosave(fixed_dt_seconds, world);

        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        if self.skip_save_on_unload {
            self.skip_save_on_unload = false;
        } else if self.background_saves_blocked {
            warn!("unload_save_skipped_rejected_save_kept");
        } else {
            match self.save_to_disk(world) {
                Ok(path) => info!(path = %path.display(), "save_written"),
                Err(error) => warn!(error = %error, "save_failed"),
            }
        }
        self.entities.clear();
        self.entities.sync_visuals(world, &self.catalog);
        self.cinematic = None;
        self.banner = None;
        info!(ticks = self.tick_count, "scene_unloaded");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let counts = self.entities.colony_counts();
        Some(format!(
            "Idle Ants | food {} | ants {} | boss {}",
            self.resources.food,
            counts.total_units(),
            if counts.boss_alive { "yes" } else { "no" }
        ))
    }

    fn hud(&self, _world: &SceneWorld) -> Option<HudSnapshot> {
        Some(HudSnapshot {
            lines: self.hud_lines(),
            banner: self.banner.clone(),
            boss_health: self
                .entities
                .enemies
                .boss()
                .map(|boss| boss.hp as f32 / boss.max_hp.max(1) as f32),
        })
    }
}
