#[derive(Debug, Clone, PartialEq)]
struct Food {
    id: FoodId,
    position: Vec2,
    food_type: FoodType,
    value: u32,
    collected: bool,
    claimed_by: Option<UnitId>,
}

#[derive(Debug, Default)]
struct FoodEntityManager {
    foods: Vec<Food>,
    next_food_id: u64,
    spawn_timer_seconds: f32,
    render_ids: HashMap<FoodId, EntityId>,
}

impl FoodEntityManager {
    fn spawn_food(
        &mut self,
        food_type: FoodType,
        position: Vec2,
        catalog: &ColonyCatalog,
    ) -> Option<FoodId> {
        if self.foods.len() >= MAX_FOOD {
            debug!(food_count = self.foods.len(), "food_spawn_rejected_cap");
            return None;
        }
        let id = FoodId(self.next_food_id);
        self.next_food_id = self.next_food_id.saturating_add(1);
        self.foods.push(Food {
            id,
            position: clamp_to_arena(position),
            food_type,
            value: catalog.food(food_type).value,
            collected: false,
            claimed_by: None,
        });
        Some(id)
    }

    /// Timer-driven spawning; stops adding food once the map holds `FOOD_ON_MAP_LIMIT`.
    fn update_spawning(
        &mut self,
        fixed_dt_seconds: f32,
        spawn_interval_seconds: f32,
        food_tier: u32,
        rng: &mut SimRng,
        catalog: &ColonyCatalog,
    ) {
        self.spawn_timer_seconds += fixed_dt_seconds;
        if self.spawn_timer_seconds < spawn_interval_seconds {
            return;
        }
        self.spawn_timer_seconds = 0.0;
        if self.food_count() >= FOOD_ON_MAP_LIMIT {
            return;
        }
        let food_type = pick_food_type(food_tier, rng);
        let position = rng.point_in_arena_outside(NEST_POSITION, FOOD_KEEP_OUT_RADIUS);
        self.spawn_food(food_type, position, catalog);
    }

    /// Claims the nearest uncollected, unclaimed food for `unit_id`.
    fn claim_nearest(&mut self, unit_id: UnitId, from: Vec2) -> Option<(FoodId, Vec2)> {
        let food = self
            .foods
            .iter_mut()
            .filter(|food| !food.collected && food.claimed_by.is_none())
            .min_by(|a, b| {
                a.position
                    .distance(from)
                    .total_cmp(&b.position.distance(from))
                    .then(a.id.cmp(&b.id))
            })?;
        food.claimed_by = Some(unit_id);
        Some((food.id, food.position))
    }

    /// Position of food still claimed by `unit_id`; `None` once it is gone or lost.
    fn claimed_position(&self, food_id: FoodId, unit_id: UnitId) -> Option<Vec2> {
        self.foods
            .iter()
            .find(|food| food.id == food_id && !food.collected && food.claimed_by == Some(unit_id))
            .map(|food| food.position)
    }

    fn collect(&mut self, food_id: FoodId, unit_id: UnitId) -> Option<u32> {
        let food = self
            .foods
            .iter_mut()
            .find(|food| food.id == food_id && !food.collected && food.claimed_by == Some(unit_id))?;
        food.collected = true;
        Some(food.value)
    }

    fn release_claim(&mut self, food_id: FoodId, unit_id: UnitId) {
        if let Some(food) = self
            .foods
            .iter_mut()
            .find(|food| food.id == food_id && food.claimed_by == Some(unit_id))
        {
            food.claimed_by = None;
        }
    }

    fn release_claims_of(&mut self, unit_id: UnitId) {
        for food in &mut self.foods {
            if food.claimed_by == Some(unit_id) {
                food.claimed_by = None;
            }
        }
    }

    fn has_unclaimed(&self) -> bool {
        self.foods
            .iter()
            .any(|food| !food.collected && food.claimed_by.is_none())
    }

    fn remove_collected(&mut self) -> usize {
        let before = self.foods.len();
        self.foods.retain(|food| !food.collected);
        before - self.foods.len()
    }

    fn food_count(&self) -> usize {
        self.foods.iter().filter(|food| !food.collected).count()
    }

    fn nearest(&self, from: Vec2) -> Option<&Food> {
        self.foods
            .iter()
            .filter(|food| !food.collected)
            .min_by(|a, b| a.position.distance(from).total_cmp(&b.position.distance(from)))
    }

    fn clear(&mut self) {
        self.foods.clear();
        self.spawn_timer_seconds = 0.0;
    }

    fn sync_visuals(&mut self, world: &mut SceneWorld, catalog: &ColonyCatalog) {
        for food in &self.foods {
            let stats = catalog.food(food.food_type);
            let visual = EntityVisual {
                layer: RenderLayer::Food,
                ..EntityVisual::default()
            };
            let transform = Transform::at(food.position);
            match self.render_ids.get(&food.id) {
                Some(render_id) => {
                    world.update_entity(*render_id, transform, visual);
                }
                None => {
                    let render_id = world.spawn_with_visual(
                        transform,
                        renderable_for(&stats.visual, food.food_type.def_name()),
                        visual,
                    );
                    self.render_ids.insert(food.id, render_id);
                }
            }
        }
        let foods = &self.foods;
        self.render_ids.retain(|food_id, render_id| {
            let alive = foods.iter().any(|food| food.id == *food_id);
            if !alive {
                world.despawn(*render_id);
            }
            alive
        });
    }
}

/// Weighted toward the best unlocked tier: tier `t` has weight `t + 1`.
fn pick_food_type(food_tier: u32, rng: &mut SimRng) -> FoodType {
    let max_tier = food_tier.min(FoodType::Cake.tier());
    let total_weight = (max_tier + 1) * (max_tier + 2) / 2;
    let mut roll = rng.below(total_weight);
    for tier in 0..=max_tier {
        let weight = tier + 1;
        if roll < weight {
            return FoodType::from_tier(tier);
        }
        roll -= weight;
    }
    FoodType::from_tier(max_tier)
}

fn renderable_for(stats: &VisualStats, debug_name: &'static str) -> RenderableDesc {
    RenderableDesc {
        kind: stats.renderable.clone(),
        color: stats.color,
        radius_world: stats.size,
        debug_name,
    }
}
