struct ColonyTickContext<'a> {
    fixed_dt_seconds: f32,
    modifiers: ColonyModifiers,
    catalog: &'a ColonyCatalog,
    rng: &'a mut SimRng,
    events: &'a mut ColonyEventBus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntitySummaryKind {
    Ant(UnitKind),
    Larva(UnitKind),
    Food(FoodType),
    Boss(EnemyKind),
    Nest,
}

/// Uniform row of the aggregate entity listing.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EntitySummary {
    kind: EntitySummaryKind,
    position: Vec2,
    hp: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ColonyCounts {
    units_by_kind: [usize; 5],
    larvae: usize,
    food: usize,
    boss_alive: bool,
}

impl ColonyCounts {
    fn of(&self, kind: UnitKind) -> usize {
        self.units_by_kind[kind.index()]
    }

    fn total_units(&self) -> usize {
        self.units_by_kind.iter().sum()
    }
}

/// Façade over the ant, food, enemy and nest managers. Runs them in
/// `COLONY_SYSTEM_ORDER` and owns the cross-manager hand-offs (damage, claims).
#[derive(Debug, Default)]
struct EntityManager {
    ants: AntEntityManager,
    food: FoodEntityManager,
    enemies: EnemyEntityManager,
    nest: NestEntityManager,
    last_tick_order: Vec<ColonySystemId>,
}

impl EntityManager {
    fn update(&mut self, ctx: &mut ColonyTickContext<'_>) {
        self.last_tick_order.clear();
        for system_id in COLONY_SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            self.run_system(system_id, ctx);
        }
    }

    fn run_system(&mut self, system_id: ColonySystemId, ctx: &mut ColonyTickContext<'_>) {
        match system_id {
            ColonySystemId::FoodSpawn => self.food.update_spawning(
                ctx.fixed_dt_seconds,
                ctx.modifiers.food_spawn_interval_seconds,
                ctx.modifiers.food_tier,
                ctx.rng,
                ctx.catalog,
            ),
            ColonySystemId::Larvae => self.ants.update_larvae(
                ctx.fixed_dt_seconds,
                ctx.catalog,
                ctx.modifiers.capacity_bonus,
                ctx.events,
            ),
            ColonySystemId::AntBehavior => {
                let mut ant_ctx = AntTickContext {
                    fixed_dt_seconds: ctx.fixed_dt_seconds,
                    nest_position: self.nest.position(),
                    boss: self.enemies.engaged_boss_view(),
                    modifiers: ctx.modifiers,
                    catalog: ctx.catalog,
                    food: &mut self.food,
                    rng: &mut *ctx.rng,
                    events: &mut *ctx.events,
                };
                let boss_hits = self.ants.update_units(&mut ant_ctx);
                for (unit_id, damage) in &boss_hits {
                    ctx.events.emit(ColonyEvent::BossHit {
                        unit_id: *unit_id,
                        damage: *damage,
                    });
                }
                self.enemies.apply_hits(&boss_hits);
            }
            ColonySystemId::BossAi => {
                let views = self.ant_target_views(ctx.catalog);
                let ant_hits = self.enemies.update(ctx.fixed_dt_seconds, &views);
                for (unit_id, damage) in &ant_hits {
                    ctx.events.emit(ColonyEvent::AntHit {
                        unit_id: *unit_id,
                        damage: *damage,
                    });
                }
                self.ants.apply_hits(&ant_hits);
            }
            ColonySystemId::Cleanup => {
                self.ants.remove_dead(&mut self.food, ctx.events);
                self.food.remove_collected();
                self.enemies.remove_dead(ctx.events);
            }
        }
    }

    fn ant_target_views(&self, catalog: &ColonyCatalog) -> Vec<AntTargetView> {
        let boss_position = self.enemies.boss().map(|boss| boss.position);
        self.ants
            .units
            .iter()
            .map(|unit| AntTargetView {
                id: unit.id,
                kind: unit.kind,
                position: unit.position,
                attacking: boss_position.is_some_and(|position| {
                    unit.is_attacking(position, catalog.unit(unit.kind).attack_range)
                }),
            })
            .collect()
    }

    fn colony_counts(&self) -> ColonyCounts {
        let mut counts = ColonyCounts {
            larvae: self.ants.larvae.len(),
            food: self.food.food_count(),
            boss_alive: self.enemies.boss().is_some(),
            ..ColonyCounts::default()
        };
        for unit in &self.ants.units {
            counts.units_by_kind[unit.kind.index()] += 1;
        }
        counts
    }

    fn all_entities(&self) -> Vec<EntitySummary> {
        let mut summaries = Vec::new();
        if let Some(nest) = self.nest.nest {
            summaries.push(EntitySummary {
                kind: EntitySummaryKind::Nest,
                position: nest.position,
                hp: None,
            });
        }
        summaries.extend(self.ants.units.iter().map(|unit| EntitySummary {
            kind: EntitySummaryKind::Ant(unit.kind),
            position: unit.position,
            hp: Some((unit.hp, unit.max_hp)),
        }));
        summaries.extend(self.ants.larvae.iter().map(|larva| EntitySummary {
            kind: EntitySummaryKind::Larva(larva.kind),
            position: larva.position,
            hp: None,
        }));
        summaries.extend(
            self.food
                .foods
                .iter()
                .filter(|food| !food.collected)
                .map(|food| EntitySummary {
                    kind: EntitySummaryKind::Food(food.food_type),
                    position: food.position,
                    hp: None,
                }),
        );
        if let Some(boss) = self.enemies.boss() {
            summaries.push(EntitySummary {
                kind: EntitySummaryKind::Boss(boss.kind),
                position: boss.position,
                hp: Some((boss.hp, boss.max_hp)),
            });
        }
        summaries
    }

    fn nearest_food(&self, from: Vec2) -> Option<&Food> {
        self.food.nearest(from)
    }

    fn nearest_unit(&self, from: Vec2) -> Option<&Unit> {
        self.ants.nearest(from)
    }

    fn clear(&mut self) {
        self.ants.clear();
        self.food.clear();
        self.enemies.clear();
        self.nest.clear();
    }

    fn sync_visuals(&mut self, world: &mut SceneWorld, catalog: &ColonyCatalog) {
        self.nest.sync_visuals(world, catalog);
        self.food.sync_visuals(world, catalog);
        self.ants.sync_visuals(world, catalog);
        self.enemies.sync_visuals(world, catalog);
    }

    /// Drops every render id without touching the world; used after the world was cleared.
    fn forget_visuals(&mut self) {
        self.nest.render_id = None;
        self.food.render_ids.clear();
        self.ants.unit_render_ids.clear();
        self.ants.larva_render_ids.clear();
        self.enemies.render_id = None;
    }
}
