#[derive(Debug, Clone, PartialEq)]
struct Unit {
    id: UnitId,
    kind: UnitKind,
    position: Vec2,
    velocity: Vec2,
    state: UnitState,
    state_seconds: f32,
    capacity: u32,
    food_collected: u32,
    carried_value: u32,
    hp: u32,
    max_hp: u32,
    attack_cooldown_ticks: u32,
    target_food: Option<FoodId>,
    wander_target: Option<Vec2>,
    cosmetic_phase: f32,
    lay_timer_seconds: f32,
}

impl Unit {
    fn new(id: UnitId, kind: UnitKind, position: Vec2, stats: &UnitStats, capacity_bonus: u32) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            state: UnitState::Spawning,
            state_seconds: 0.0,
            capacity: effective_capacity(stats, capacity_bonus),
            food_collected: 0,
            carried_value: 0,
            hp: stats.max_hp.max(1),
            max_hp: stats.max_hp.max(1),
            attack_cooldown_ticks: 0,
            target_food: None,
            wander_target: None,
            cosmetic_phase: 0.0,
            lay_timer_seconds: 0.0,
        }
    }

    fn enter(&mut self, state: UnitState) {
        self.state = state;
        self.state_seconds = 0.0;
    }

    fn is_attacking(&self, boss_position: Vec2, attack_range: f32) -> bool {
        self.state == UnitState::Fighting && self.position.distance(boss_position) <= attack_range
    }
}

fn effective_capacity(stats: &UnitStats, capacity_bonus: u32) -> u32 {
    if stats.forager {
        stats.capacity.max(1).saturating_add(capacity_bonus)
    } else {
        0
    }
}

/// Pending unit that hatches into `kind` once `age_seconds >= hatch_age_seconds`.
#[derive(Debug, Clone, PartialEq)]
struct Larva {
    id: UnitId,
    kind: UnitKind,
    position: Vec2,
    age_seconds: f32,
    hatch_age_seconds: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
enum SpawnError {
    #[error("a queen is already alive")]
    QueenAlreadyAlive,
    #[error("colony is at the {cap} unit cap")]
    UnitCapReached { cap: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BossView {
    position: Vec2,
}

struct AntTickContext<'a> {
    fixed_dt_seconds: f32,
    nest_position: Vec2,
    boss: Option<BossView>,
    modifiers: ColonyModifiers,
    catalog: &'a ColonyCatalog,
    food: &'a mut FoodEntityManager,
    rng: &'a mut SimRng,
    events: &'a mut ColonyEventBus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnitAction {
    None,
    HitBoss { damage: u32 },
    LayLarva { position: Vec2 },
}

#[derive(Debug, Default)]
struct AntEntityManager {
    units: Vec<Unit>,
    larvae: Vec<Larva>,
    next_unit_id: u64,
    unit_render_ids: HashMap<UnitId, EntityId>,
    larva_render_ids: HashMap<UnitId, EntityId>,
}

impl AntEntityManager {
    fn alloc_unit_id(&mut self) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id = self.next_unit_id.saturating_add(1);
        id
    }

    fn spawn_unit(
        &mut self,
        kind: UnitKind,
        position: Vec2,
        catalog: &ColonyCatalog,
        capacity_bonus: u32,
    ) -> Result<UnitId, SpawnError> {
        if kind == UnitKind::Queen && self.queen_alive() {
            return Err(SpawnError::QueenAlreadyAlive);
        }
        if self.units.len() >= MAX_UNITS {
            return Err(SpawnError::UnitCapReached { cap: MAX_UNITS });
        }
        let id = self.alloc_unit_id();
        self.units
            .push(Unit::new(id, kind, position, catalog.unit(kind), capacity_bonus));
        debug!(unit_id = id.0, kind = kind.label(), "unit_spawned");
        Ok(id)
    }

    fn lay_larva(&mut self, kind: UnitKind, position: Vec2) -> bool {
        if self.larvae.len() >= MAX_LARVAE {
            return false;
        }
        let id = self.alloc_unit_id();
        self.larvae.push(Larva {
            id,
            kind,
            position,
            age_seconds: 0.0,
            hatch_age_seconds: LARVAE_HATCH_SECONDS,
        });
        true
    }

    fn queen_alive(&self) -> bool {
        self.units.iter().any(|unit| unit.kind == UnitKind::Queen)
    }

    fn count_of(&self, kind: UnitKind) -> usize {
        self.units.iter().filter(|unit| unit.kind == kind).count()
    }

    fn find(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    fn nearest(&self, from: Vec2) -> Option<&Unit> {
        self.units
            .iter()
            .min_by(|a, b| a.position.distance(from).total_cmp(&b.position.distance(from)))
    }

    /// Ages larvae and hatches ripe ones. A larva that cannot hatch because of the unit cap
    /// waits until there is room.
    fn update_larvae(
        &mut self,
        fixed_dt_seconds: f32,
        catalog: &ColonyCatalog,
        capacity_bonus: u32,
        events: &mut ColonyEventBus,
    ) {
        for larva in &mut self.larvae {
            larva.age_seconds += fixed_dt_seconds;
        }
        let mut index = 0;
        while index < self.larvae.len() {
            let larva = &self.larvae[index];
            if larva.age_seconds < larva.hatch_age_seconds {
                index += 1;
                continue;
            }
            let (kind, position) = (larva.kind, larva.position);
            match self.spawn_unit(kind, position, catalog, capacity_bonus) {
                Ok(unit_id) => {
                    self.larvae.remove(index);
                    events.emit(ColonyEvent::LarvaHatched { unit_id, kind });
                }
                Err(error) => {
                    debug!(error = %error, "larva_hatch_deferred");
                    index += 1;
                }
            }
        }
    }

    /// Runs one state-machine step per unit; returns damage dealt to the boss.
    fn update_units(&mut self, ctx: &mut AntTickContext<'_>) -> Vec<(UnitId, u32)> {
        let catalog = ctx.catalog;
        let dt = ctx.fixed_dt_seconds;
        let mut boss_hits = Vec::new();
        let mut laid = Vec::new();

        for unit in &mut self.units {
            let stats = catalog.unit(unit.kind);
            unit.capacity = effective_capacity(stats, ctx.modifiers.capacity_bonus)
                .max(unit.food_collected);
            let before = unit.position;
            match step_unit(unit, stats, ctx) {
                UnitAction::None => {}
                UnitAction::HitBoss { damage } => boss_hits.push((unit.id, damage)),
                UnitAction::LayLarva { position } => laid.push(position),
            }
            let moved = unit.position - before;
            unit.velocity = if dt > 0.0 { moved * (1.0 / dt) } else { Vec2::ZERO };
            unit.cosmetic_phase =
                (unit.cosmetic_phase + moved.length() * 6.0).rem_euclid(std::f32::consts::TAU);
        }

        for position in laid {
            if self.lay_larva(UnitKind::Worker, position) {
                ctx.events.emit(ColonyEvent::LarvaLaid {
                    kind: UnitKind::Worker,
                });
            }
        }
        boss_hits
    }

    fn apply_hits(&mut self, hits: &[(UnitId, u32)]) {
        for (unit_id, damage) in hits {
            if let Some(unit) = self.units.iter_mut().find(|unit| unit.id == *unit_id) {
                unit.hp = unit.hp.saturating_sub(*damage);
            }
        }
    }

    fn remove_dead(&mut self, food: &mut FoodEntityManager, events: &mut ColonyEventBus) -> usize {
        let before = self.units.len();
        self.units.retain(|unit| {
            if unit.hp > 0 {
                return true;
            }
            food.release_claims_of(unit.id);
            events.emit(ColonyEvent::UnitDied {
                unit_id: unit.id,
                kind: unit.kind,
            });
            false
        });
        before - self.units.len()
    }

    fn clear(&mut self) {
        self.units.clear();
        self.larvae.clear();
    }

    fn sync_visuals(&mut self, world: &mut SceneWorld, catalog: &ColonyCatalog) {
        for unit in &self.units {
            let stats = catalog.unit(unit.kind);
            let scale = if unit.state == UnitState::Spawning {
                let t = (unit.state_seconds / SPAWN_DURATION_SECONDS).clamp(0.0, 1.0);
                SPAWN_START_SCALE + (1.0 - SPAWN_START_SCALE) * t
            } else {
                1.0
            };
            let visual = EntityVisual {
                scale,
                adornment: unit.kind.adornment(unit.cosmetic_phase),
                health_fraction: (unit.hp < unit.max_hp)
                    .then(|| unit.hp as f32 / unit.max_hp as f32),
                layer: RenderLayer::Units,
                carrying: unit.food_collected > 0,
            };
            let transform = Transform {
                position: unit.position,
                rotation_radians: (unit.velocity.length() > f32::EPSILON)
                    .then(|| unit.velocity.angle()),
            };
            match self.unit_render_ids.get(&unit.id) {
                Some(render_id) => {
                    world.update_entity(*render_id, transform, visual);
                }
                None => {
                    let render_id = world.spawn_with_visual(
                        transform,
                        renderable_for(&stats.visual, unit.kind.def_name()),
                        visual,
                    );
                    self.unit_render_ids.insert(unit.id, render_id);
                }
            }
        }

        for larva in &self.larvae {
            let growth = (larva.age_seconds / larva.hatch_age_seconds.max(f32::EPSILON)).clamp(0.0, 1.0);
            let visual = EntityVisual {
                scale: 0.6 + 0.4 * growth,
                layer: RenderLayer::Food,
                ..EntityVisual::default()
            };
            let transform = Transform::at(larva.position);
            match self.larva_render_ids.get(&larva.id) {
                Some(render_id) => {
                    world.update_entity(*render_id, transform, visual);
                }
                None => {
                    let render_id = world.spawn_with_visual(
                        transform,
                        renderable_for(&catalog.larva, LARVA_DEF_NAME),
                        visual,
                    );
                    self.larva_render_ids.insert(larva.id, render_id);
                }
            }
        }

        let units = &self.units;
        self.unit_render_ids.retain(|unit_id, render_id| {
            let alive = units.iter().any(|unit| unit.id == *unit_id);
            if !alive {
                world.despawn(*render_id);
            }
            alive
        });
        let larvae = &self.larvae;
        self.larva_render_ids.retain(|larva_id, render_id| {
            let alive = larvae.iter().any(|larva| larva.id == *larva_id);
            if !alive {
                world.despawn(*render_id);
            }
            alive
        });
    }
}

fn step_unit(unit: &mut Unit, stats: &UnitStats, ctx: &mut AntTickContext<'_>) -> UnitAction {
    let dt = ctx.fixed_dt_seconds;
    unit.state_seconds += dt;
    unit.attack_cooldown_ticks = unit.attack_cooldown_ticks.saturating_sub(1);
    let speed = stats.move_speed * ctx.modifiers.speed_multiplier;

    if stats.forager && unit.state.is_foraging() {
        if let Some(boss) = ctx.boss {
            if unit.position.distance(boss.position) <= ANT_AGGRO_RADIUS {
                if let Some(food_id) = unit.target_food.take() {
                    ctx.food.release_claim(food_id, unit.id);
                }
                unit.wander_target = None;
                unit.enter(UnitState::Fighting);
            }
        }
    }

    match unit.state {
        UnitState::Spawning => {
            if unit.state_seconds >= SPAWN_DURATION_SECONDS {
                unit.enter(if stats.forager {
                    UnitState::SeekingFood
                } else {
                    UnitState::Nesting
                });
            }
        }
        UnitState::Nesting => {
            move_towards(&mut unit.position, ctx.nest_position, speed, dt, 0.05);
            if unit.kind != UnitKind::Queen {
                return UnitAction::None;
            }
            unit.lay_timer_seconds += dt;
            if unit.lay_timer_seconds >= QUEEN_LAY_INTERVAL_SECONDS {
                unit.lay_timer_seconds = 0.0;
                return UnitAction::LayLarva {
                    position: ctx.rng.point_within(unit.position, 1.0),
                };
            }
        }
        UnitState::SeekingFood => {
            if unit.food_collected >= unit.capacity {
                unit.enter(UnitState::ReturningToNest);
                return UnitAction::None;
            }
            let mut target = None;
            if let Some(food_id) = unit.target_food {
                match ctx.food.claimed_position(food_id, unit.id) {
                    Some(position) => target = Some(position),
                    None => unit.target_food = None,
                }
            }
            if target.is_none() {
                if let Some((food_id, position)) = ctx.food.claim_nearest(unit.id, unit.position) {
                    unit.target_food = Some(food_id);
                    target = Some(position);
                }
            }
            match target {
                Some(food_position) => {
                    unit.wander_target = None;
                    if move_towards(&mut unit.position, food_position, speed, dt, COLLECT_RADIUS) {
                        unit.enter(UnitState::CollectingFood);
                    }
                }
                None => {
                    let goal = match unit.wander_target {
                        Some(goal) => goal,
                        None => {
                            let goal = ctx.rng.point_within(ctx.nest_position, ANT_WANDER_RADIUS);
                            unit.wander_target = Some(goal);
                            goal
                        }
                    };
                    let wander_speed = speed * ANT_WANDER_SPEED_FACTOR;
                    if move_towards(&mut unit.position, goal, wander_speed, dt, 0.2) {
                        unit.wander_target = None;
                    }
                }
            }
        }
        UnitState::CollectingFood => {
            if unit.state_seconds < COLLECT_DURATION_SECONDS {
                return UnitAction::None;
            }
            let collected = unit
                .target_food
                .take()
                .and_then(|food_id| ctx.food.collect(food_id, unit.id).map(|value| (food_id, value)));
            let Some((food_id, value)) = collected else {
                unit.enter(UnitState::SeekingFood);
                return UnitAction::None;
            };
            unit.food_collected += 1;
            unit.carried_value = unit.carried_value.saturating_add(value);
            ctx.events.emit(ColonyEvent::FoodCollected {
                unit_id: unit.id,
                food_id,
                value,
            });
            if unit.food_collected < unit.capacity && ctx.food.has_unclaimed() {
                unit.enter(UnitState::SeekingFood);
            } else {
                unit.enter(UnitState::ReturningToNest);
            }
        }
        UnitState::ReturningToNest => {
            if move_towards(&mut unit.position, ctx.nest_position, speed, dt, NEST_ARRIVAL_RADIUS) {
                unit.enter(UnitState::DeliveringFood);
            }
        }
        UnitState::DeliveringFood => {
            if unit.state_seconds >= DELIVER_DURATION_SECONDS {
                if unit.food_collected > 0 {
                    ctx.events.emit(ColonyEvent::FoodDelivered {
                        unit_id: unit.id,
                        value: unit.carried_value,
                    });
                }
                unit.food_collected = 0;
                unit.carried_value = 0;
                unit.enter(UnitState::SeekingFood);
            }
        }
        UnitState::Fighting => {
            let Some(boss) = ctx.boss else {
                unit.enter(if unit.food_collected > 0 {
                    UnitState::ReturningToNest
                } else {
                    UnitState::SeekingFood
                });
                return UnitAction::None;
            };
            if unit.position.distance(boss.position) > stats.attack_range {
                move_towards(
                    &mut unit.position,
                    boss.position,
                    speed,
                    dt,
                    stats.attack_range * 0.8,
                );
            }
            if unit.position.distance(boss.position) <= stats.attack_range
                && unit.attack_cooldown_ticks == 0
                && stats.damage > 0
            {
                unit.attack_cooldown_ticks = stats.attack_cooldown_ticks;
                return UnitAction::HitBoss {
                    damage: stats.damage,
                };
            }
        }
    }
    UnitAction::None
}
