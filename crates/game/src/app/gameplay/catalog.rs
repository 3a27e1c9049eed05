#[derive(Debug, Clone, PartialEq)]
struct VisualStats {
    renderable: RenderableKind,
    color: [u8; 3],
    size: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct UnitStats {
    visual: VisualStats,
    /// Carries food and joins boss fights; the queen never does.
    forager: bool,
    move_speed: f32,
    capacity: u32,
    max_hp: u32,
    damage: u32,
    cost: u32,
    attack_range: f32,
    attack_cooldown_ticks: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct FoodStats {
    visual: VisualStats,
    value: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct BossStats {
    visual: VisualStats,
    move_speed: f32,
    base_hp: u32,
    base_damage: u32,
    attack_range: f32,
    attack_cooldown_ticks: u32,
}

/// Tuning for every colony entity, read from compiled defs with built-in fallbacks.
#[derive(Debug, Clone, PartialEq)]
struct ColonyCatalog {
    units: [UnitStats; 5],
    foods: [FoodStats; 4],
    boss: BossStats,
    nest: VisualStats,
    larva: VisualStats,
}

const NEST_DEF_NAME: &str = "colony.nest";
const LARVA_DEF_NAME: &str = "colony.larvae";
const FORAGER_TAG: &str = "forager";

impl ColonyCatalog {
    fn builtin() -> Self {
        Self {
            units: UnitKind::ALL.map(builtin_unit_stats),
            foods: FoodType::ALL.map(builtin_food_stats),
            boss: BossStats {
                visual: disc([120, 90, 70], 1.1),
                move_speed: 1.5,
                base_hp: 600,
                base_damage: 15,
                attack_range: 1.2,
                attack_cooldown_ticks: 90,
            },
            nest: disc([110, 75, 45], 1.4),
            larva: disc([245, 240, 220], 0.18),
        }
    }

    /// Missing or incomplete defs fall back to built-in stats with a warning, so the
    /// colony always has a full catalog.
    fn from_defs(database: Option<&ants_engine::DefDatabase>) -> Self {
        let mut catalog = Self::builtin();
        let Some(database) = database else {
            warn!("colony_defs_unavailable_using_builtin");
            return catalog;
        };
        let defs = DefDatabaseView::new(database);

        for kind in UnitKind::ALL {
            let Some(def) = defs.lookup(kind.def_name()) else {
                continue;
            };
            let fallback = catalog.units[kind.index()].clone();
            let forager = kind.is_forager() && forager_role(def, fallback.forager);
            let mut capacity = stat_or(&def.def_name, "capacity", def.capacity, fallback.capacity);
            if forager && capacity == 0 {
                warn!(def_name = %def.def_name, "forager_capacity_zero_clamped");
                capacity = 1;
            }
            catalog.units[kind.index()] = UnitStats {
                visual: visual_from_def(def),
                forager,
                move_speed: def.move_speed,
                capacity,
                max_hp: stat_or(&def.def_name, "health", def.health, fallback.max_hp),
                damage: stat_or(&def.def_name, "damage", def.damage, fallback.damage),
                cost: stat_or(&def.def_name, "cost", def.cost, fallback.cost),
                attack_range: stat_or(&def.def_name, "attackRange", def.attack_range, fallback.attack_range),
                attack_cooldown_ticks: stat_or(
                    &def.def_name,
                    "attackCooldownTicks",
                    def.attack_cooldown_ticks,
                    fallback.attack_cooldown_ticks,
                ),
            };
        }

        for food_type in FoodType::ALL {
            let Some(def) = defs.lookup(food_type.def_name()) else {
                continue;
            };
            let fallback = catalog.foods[food_type.tier() as usize].clone();
            catalog.foods[food_type.tier() as usize] = FoodStats {
                visual: visual_from_def(def),
                value: stat_or(&def.def_name, "foodValue", def.food_value, fallback.value),
            };
        }

        if let Some(def) = defs.lookup(EnemyKind::Anteater.def_name()) {
            let fallback = catalog.boss.clone();
            catalog.boss = BossStats {
                visual: visual_from_def(def),
                move_speed: def.move_speed,
                base_hp: stat_or(&def.def_name, "health", def.health, fallback.base_hp),
                base_damage: stat_or(&def.def_name, "damage", def.damage, fallback.base_damage),
                attack_range: stat_or(&def.def_name, "attackRange", def.attack_range, fallback.attack_range),
                attack_cooldown_ticks: stat_or(
                    &def.def_name,
                    "attackCooldownTicks",
                    def.attack_cooldown_ticks,
                    fallback.attack_cooldown_ticks,
                ),
            };
        }

        if let Some(def) = defs.lookup(NEST_DEF_NAME) {
            catalog.nest = visual_from_def(def);
        }
        if let Some(def) = defs.lookup(LARVA_DEF_NAME) {
            catalog.larva = visual_from_def(def);
        }
        catalog
    }

    fn unit(&self, kind: UnitKind) -> &UnitStats {
        &self.units[kind.index()]
    }

    fn food(&self, food_type: FoodType) -> &FoodStats {
        &self.foods[food_type.tier() as usize]
    }
}

/// Def lookups that warn when a name is missing.
struct DefDatabaseView<'a> {
    database: &'a ants_engine::DefDatabase,
}

impl<'a> DefDatabaseView<'a> {
    fn new(database: &'a ants_engine::DefDatabase) -> Self {
        Self { database }
    }

    fn lookup(&self, def_name: &str) -> Option<&'a ants_engine::EntityArchetype> {
        let found = self.database.entity_def_by_name(def_name);
        if found.is_none() {
            warn!(def_name, "colony_def_missing_using_builtin");
        }
        found
    }
}

fn stat_or<T: Copy + std::fmt::Debug>(def_name: &str, field: &'static str, value: Option<T>, fallback: T) -> T {
    match value {
        Some(value) => value,
        None => {
            warn!(def_name, field, fallback = ?fallback, "colony_def_field_missing_using_builtin");
            fallback
        }
    }
}

/// Untagged defs keep the built-in role.
fn forager_role(def: &ants_engine::EntityArchetype, fallback: bool) -> bool {
    if def.tags.is_empty() {
        fallback
    } else {
        def.has_tag(FORAGER_TAG)
    }
}

fn visual_from_def(def: &ants_engine::EntityArchetype) -> VisualStats {
    VisualStats {
        renderable: def.renderable.clone(),
        color: def.color,
        size: def.size,
    }
}

fn disc(color: [u8; 3], size: f32) -> VisualStats {
    VisualStats {
        renderable: RenderableKind::Disc,
        color,
        size,
    }
}

fn builtin_unit_stats(kind: UnitKind) -> UnitStats {
    let (move_speed, capacity, max_hp, damage, cost, color, size) = match kind {
        UnitKind::Worker => (2.5, 1, 20, 2, 10, [60, 40, 30], 0.35),
        UnitKind::Flying => (4.0, 2, 15, 1, 100, [90, 110, 160], 0.35),
        UnitKind::Fire => (3.0, 1, 35, 6, 250, [200, 60, 30], 0.4),
        UnitKind::Car => (6.0, 5, 40, 3, 500, [70, 70, 80], 0.5),
        UnitKind::Queen => (0.8, 0, 200, 0, 1000, [150, 60, 150], 0.7),
    };
    UnitStats {
        visual: disc(color, size),
        forager: kind.is_forager(),
        move_speed,
        capacity,
        max_hp,
        damage,
        cost,
        attack_range: 1.0,
        attack_cooldown_ticks: 30,
    }
}

fn builtin_food_stats(food_type: FoodType) -> FoodStats {
    let (value, color, size) = match food_type {
        FoodType::Seed => (1, [200, 170, 90], 0.18),
        FoodType::Sugar => (3, [245, 245, 250], 0.2),
        FoodType::Apple => (10, [210, 40, 40], 0.3),
        FoodType::Cake => (25, [240, 180, 200], 0.36),
    };
    FoodStats {
        visual: disc(color, size),
        value,
    }
}
