/// What one validation pass discarded. Particle overflow never shows up here because
/// `SceneWorld::push_particle` refuses particles past `MAX_PARTICLES`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ValidationReport {
    invalid_units: usize,
    invalid_larvae: usize,
    invalid_food: usize,
    invalid_enemies: usize,
    units_over_cap: usize,
    larvae_over_cap: usize,
    food_over_cap: usize,
}

impl ValidationReport {
    fn total_discarded(&self) -> usize {
        self.invalid_units
            + self.invalid_larvae
            + self.invalid_food
            + self.invalid_enemies
            + self.units_over_cap
            + self.larvae_over_cap
            + self.food_over_cap
    }

    fn is_clean(&self) -> bool {
        self.total_discarded() == 0
    }
}

fn unit_defect(unit: &Unit) -> Option<&'static str> {
    if !unit.position.is_finite() {
        return Some("non_finite_position");
    }
    if !unit.velocity.is_finite() {
        return Some("non_finite_velocity");
    }
    if unit.max_hp == 0 || unit.hp > unit.max_hp {
        return Some("hp_out_of_range");
    }
    if unit.food_collected > unit.capacity {
        return Some("over_capacity");
    }
    None
}

fn boss_defect(boss: &Boss) -> Option<&'static str> {
    if !boss.position.is_finite() || !boss.velocity.is_finite() {
        return Some("non_finite_position");
    }
    if boss.max_hp == 0 || boss.hp > boss.max_hp {
        return Some("hp_out_of_range");
    }
    None
}

/// Logs and discards entities with broken numeric state and trims collections to their caps.
fn validate_entities(manager: &mut EntityManager, events: &mut ColonyEventBus) -> ValidationReport {
    let mut report = ValidationReport::default();
    let EntityManager {
        ants, food, enemies, ..
    } = manager;

    ants.units.retain(|unit| match unit_defect(unit) {
        None => true,
        Some(reason) => {
            warn!(unit_id = unit.id.0, kind = unit.kind.label(), reason, "invalid_unit_discarded");
            food.release_claims_of(unit.id);
            events.emit(ColonyEvent::EntityDiscarded { reason });
            report.invalid_units += 1;
            false
        }
    });
    if ants.units.len() > MAX_UNITS {
        for unit in &ants.units[MAX_UNITS..] {
            food.release_claims_of(unit.id);
        }
        report.units_over_cap = ants.units.len() - MAX_UNITS;
        ants.units.truncate(MAX_UNITS);
        warn!(discarded = report.units_over_cap, cap = MAX_UNITS, "unit_cap_enforced");
    }

    ants.larvae.retain(|larva| {
        let valid = larva.position.is_finite()
            && larva.age_seconds.is_finite()
            && larva.hatch_age_seconds.is_finite();
        if !valid {
            warn!(larva_id = larva.id.0, "invalid_larva_discarded");
            events.emit(ColonyEvent::EntityDiscarded {
                reason: "invalid_larva",
            });
            report.invalid_larvae += 1;
        }
        valid
    });
    if ants.larvae.len() > MAX_LARVAE {
        report.larvae_over_cap = ants.larvae.len() - MAX_LARVAE;
        ants.larvae.truncate(MAX_LARVAE);
        warn!(discarded = report.larvae_over_cap, cap = MAX_LARVAE, "larvae_cap_enforced");
    }

    food.foods.retain(|item| {
        let valid = item.position.is_finite();
        if !valid {
            warn!(food_id = item.id.0, "invalid_food_discarded");
            events.emit(ColonyEvent::EntityDiscarded {
                reason: "invalid_food",
            });
            report.invalid_food += 1;
        }
        valid
    });
    if food.foods.len() > MAX_FOOD {
        report.food_over_cap = food.foods.len() - MAX_FOOD;
        food.foods.truncate(MAX_FOOD);
        warn!(discarded = report.food_over_cap, cap = MAX_FOOD, "food_cap_enforced");
    }
    // Claims held by discarded units or pointing at discarded food are dropped.
    for unit in &mut ants.units {
        if let Some(food_id) = unit.target_food {
            if !food.foods.iter().any(|item| item.id == food_id) {
                unit.target_food = None;
            }
        }
    }

    if let Some(reason) = enemies.boss.as_ref().and_then(boss_defect) {
        warn!(reason, "invalid_boss_discarded");
        events.emit(ColonyEvent::EntityDiscarded { reason });
        enemies.boss = None;
        report.invalid_enemies += 1;
    }

    if !report.is_clean() {
        info!(discarded = report.total_discarded(), report = ?report, "validation_report");
    }
    report
}
