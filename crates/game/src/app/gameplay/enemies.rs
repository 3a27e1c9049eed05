#[derive(Debug, Clone, PartialEq)]
struct Boss {
    id: EnemyId,
    kind: EnemyKind,
    level: u32,
    position: Vec2,
    velocity: Vec2,
    hp: u32,
    max_hp: u32,
    damage: u32,
    move_speed: f32,
    attack_range: f32,
    attack_cooldown_ticks: u32,
    cooldown_remaining_ticks: u32,
    /// Non-owning; re-resolved every tick and treated as "no target" once dangling.
    target_ant: Option<UnitId>,
    engaged: bool,
    wander_index: usize,
}

impl Boss {
    /// Stats grow with `level`, which is one more than the number of bosses already defeated.
    fn scaled(id: EnemyId, level: u32, position: Vec2, stats: &BossStats) -> Self {
        let exponent = level.saturating_sub(1).min(32) as i32;
        let max_hp = (stats.base_hp as f32 * BOSS_HP_GROWTH.powi(exponent)).round().max(1.0) as u32;
        let damage = (stats.base_damage as f32 * BOSS_DAMAGE_GROWTH.powi(exponent)).round() as u32;
        Self {
            id,
            kind: EnemyKind::Anteater,
            level,
            position,
            velocity: Vec2::ZERO,
            hp: max_hp,
            max_hp,
            damage,
            move_speed: stats.move_speed,
            attack_range: stats.attack_range,
            attack_cooldown_ticks: stats.attack_cooldown_ticks.max(1),
            cooldown_remaining_ticks: 0,
            target_ant: None,
            engaged: false,
            wander_index: 0,
        }
    }
}

/// What the boss AI needs to know about one ant.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AntTargetView {
    id: UnitId,
    kind: UnitKind,
    position: Vec2,
    attacking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BossTarget {
    Attacker(UnitId),
    Queen(UnitId),
    Nearest(UnitId),
    Wander(Vec2),
}

impl BossTarget {
    fn unit_id(self) -> Option<UnitId> {
        match self {
            Self::Attacker(id) | Self::Queen(id) | Self::Nearest(id) => Some(id),
            Self::Wander(_) => None,
        }
    }
}

/// Attackers first (nearest wins), then the queen, then the nearest ant, then the next
/// wander waypoint.
fn select_boss_target(boss_position: Vec2, wander_index: usize, ants: &[AntTargetView]) -> BossTarget {
    if let Some(id) = nearest_ant_id(boss_position, ants.iter().filter(|ant| ant.attacking)) {
        return BossTarget::Attacker(id);
    }
    if let Some(queen) = ants.iter().find(|ant| ant.kind == UnitKind::Queen) {
        return BossTarget::Queen(queen.id);
    }
    if let Some(id) = nearest_ant_id(boss_position, ants.iter()) {
        return BossTarget::Nearest(id);
    }
    BossTarget::Wander(BOSS_WANDER_WAYPOINTS[wander_index % BOSS_WANDER_WAYPOINTS.len()])
}

fn nearest_ant_id<'a>(from: Vec2, candidates: impl Iterator<Item = &'a AntTargetView>) -> Option<UnitId> {
    candidates
        .min_by(|a, b| {
            a.position
                .distance(from)
                .total_cmp(&b.position.distance(from))
                .then(a.id.cmp(&b.id))
        })
        .map(|ant| ant.id)
}

#[derive(Debug, Default)]
struct EnemyEntityManager {
    boss: Option<Boss>,
    next_enemy_id: u64,
    render_id: Option<EntityId>,
}

impl EnemyEntityManager {
    fn spawn_boss(&mut self, level: u32, position: Vec2, catalog: &ColonyCatalog) -> Option<EnemyId> {
        if self.boss.is_some() {
            warn!("boss_spawn_rejected_already_alive");
            return None;
        }
        let id = EnemyId(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.saturating_add(1);
        let boss = Boss::scaled(id, level, position, &catalog.boss);
        info!(
            enemy_id = id.0,
            kind = boss.kind.def_name(),
            level,
            max_hp = boss.max_hp,
            damage = boss.damage,
            "boss_spawned"
        );
        self.boss = Some(boss);
        Some(id)
    }

    fn boss(&self) -> Option<&Boss> {
        self.boss.as_ref()
    }

    fn engage(&mut self) -> bool {
        let Some(boss) = self.boss.as_mut() else {
            return false;
        };
        boss.engaged = true;
        true
    }

    fn engaged_boss_view(&self) -> Option<BossView> {
        self.boss
            .as_ref()
            .filter(|boss| boss.engaged && boss.hp > 0)
            .map(|boss| BossView {
                position: boss.position,
            })
    }

    fn apply_hits(&mut self, hits: &[(UnitId, u32)]) {
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        for (_, damage) in hits {
            boss.hp = boss.hp.saturating_sub(*damage);
        }
    }

    /// Moves and attacks for one tick; returns damage dealt to ants.
    fn update(&mut self, fixed_dt_seconds: f32, ants: &[AntTargetView]) -> Vec<(UnitId, u32)> {
        let Some(boss) = self.boss.as_mut() else {
            return Vec::new();
        };
        if !boss.engaged || boss.hp == 0 {
            boss.velocity = Vec2::ZERO;
            return Vec::new();
        }
        boss.cooldown_remaining_ticks = boss.cooldown_remaining_ticks.saturating_sub(1);

        let target = select_boss_target(boss.position, boss.wander_index, ants);
        boss.target_ant = target.unit_id();
        let before = boss.position;
        let mut hits = Vec::new();

        match target {
            BossTarget::Wander(waypoint) => {
                if move_towards(
                    &mut boss.position,
                    waypoint,
                    boss.move_speed * 0.6,
                    fixed_dt_seconds,
                    BOSS_WAYPOINT_ARRIVAL,
                ) {
                    boss.wander_index = boss.wander_index.wrapping_add(1);
                }
            }
            BossTarget::Attacker(id) | BossTarget::Queen(id) | BossTarget::Nearest(id) => {
                let Some(ant) = ants.iter().find(|ant| ant.id == id) else {
                    boss.target_ant = None;
                    return hits;
                };
                if boss.position.distance(ant.position) > boss.attack_range {
                    move_towards(
                        &mut boss.position,
                        ant.position,
                        boss.move_speed,
                        fixed_dt_seconds,
                        boss.attack_range * 0.8,
                    );
                }
                if boss.position.distance(ant.position) <= boss.attack_range
                    && boss.cooldown_remaining_ticks == 0
                {
                    boss.cooldown_remaining_ticks = boss.attack_cooldown_ticks;
                    hits.push((id, boss.damage));
                    debug!(unit_id = id.0, damage = boss.damage, "boss_attack");
                }
            }
        }
        boss.position = clamp_to_arena(boss.position);
        boss.velocity = if fixed_dt_seconds > 0.0 {
            (boss.position - before) * (1.0 / fixed_dt_seconds)
        } else {
            Vec2::ZERO
        };
        hits
    }

    fn remove_dead(&mut self, events: &mut ColonyEventBus) -> Option<u32> {
        let boss = self.boss.as_ref().filter(|boss| boss.hp == 0)?;
        let level = boss.level;
        events.emit(ColonyEvent::BossDefeated {
            enemy_id: boss.id,
            level,
            position: boss.position,
        });
        self.boss = None;
        Some(level)
    }

    fn clear(&mut self) {
        self.boss = None;
    }

    fn sync_visuals(&mut self, world: &mut SceneWorld, catalog: &ColonyCatalog) {
        let Some(boss) = self.boss.as_ref() else {
            if let Some(render_id) = self.render_id.take() {
                world.despawn(render_id);
            }
            return;
        };
        let visual = EntityVisual {
            health_fraction: Some(boss.hp as f32 / boss.max_hp.max(1) as f32),
            layer: RenderLayer::Boss,
            ..EntityVisual::default()
        };
        let transform = Transform {
            position: boss.position,
            rotation_radians: (boss.velocity.length() > f32::EPSILON).then(|| boss.velocity.angle()),
        };
        match self.render_id {
            Some(render_id) => {
                world.update_entity(render_id, transform, visual);
            }
            None => {
                self.render_id = Some(world.spawn_with_visual(
                    transform,
                    renderable_for(&catalog.boss.visual, boss.kind.def_name()),
                    visual,
                ));
            }
        }
    }
}
