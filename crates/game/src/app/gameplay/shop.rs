#[derive(Debug, Clone, PartialEq)]
struct ColonyResources {
    food: u64,
    total_food_collected: u64,
    food_multiplier: f32,
    bosses_defeated: u32,
    next_boss_threshold: u64,
}

impl Default for ColonyResources {
    fn default() -> Self {
        Self {
            food: STARTING_FOOD,
            total_food_collected: 0,
            food_multiplier: 1.0,
            bosses_defeated: 0,
            next_boss_threshold: BOSS_FIRST_THRESHOLD,
        }
    }
}

impl ColonyResources {
    /// Credits a delivery scaled by the food multiplier; returns the amount credited.
    fn credit_delivery(&mut self, carried_value: u32) -> u64 {
        let credited = (carried_value as f32 * self.food_multiplier).round().max(0.0) as u64;
        self.food = self.food.saturating_add(credited);
        self.total_food_collected = self.total_food_collected.saturating_add(credited);
        credited
    }

    fn try_spend(&mut self, price: u64) -> bool {
        if self.food < price {
            return false;
        }
        self.food -= price;
        true
    }

    fn boss_threshold_reached(&self) -> bool {
        self.total_food_collected >= self.next_boss_threshold
    }

    fn boss_level(&self) -> u32 {
        self.bosses_defeated.saturating_add(1)
    }

    /// Pays the defeat reward and raises the next threshold; returns the reward.
    fn record_boss_defeat(&mut self, level: u32) -> u64 {
        let reward = BOSS_REWARD_BASE.saturating_mul(u64::from(level.max(1)));
        self.food = self.food.saturating_add(reward);
        self.bosses_defeated = self.bosses_defeated.saturating_add(1);
        self.next_boss_threshold = self.next_boss_threshold.saturating_mul(BOSS_THRESHOLD_GROWTH);
        self.food_multiplier = 1.0 + FOOD_MULTIPLIER_PER_BOSS * self.bosses_defeated as f32;
        reward
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum UpgradeKind {
    Speed,
    Capacity,
    FoodTier,
    SpawnRate,
}

impl UpgradeKind {
    fn label(self) -> &'static str {
        match self {
            Self::Speed => "Speed",
            Self::Capacity => "Capacity",
            Self::FoodTier => "Food tier",
            Self::SpawnRate => "Spawn rate",
        }
    }

    fn base_price(self) -> u64 {
        match self {
            Self::Speed => 50,
            Self::Capacity => 75,
            Self::FoodTier => 200,
            Self::SpawnRate => 150,
        }
    }

    fn max_level(self) -> Option<u32> {
        match self {
            Self::Speed | Self::Capacity => None,
            Self::FoodTier => Some(FoodType::Cake.tier()),
            Self::SpawnRate => Some(5),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct UpgradeLevels {
    speed: u32,
    capacity: u32,
    food_tier: u32,
    spawn_rate: u32,
}

impl UpgradeLevels {
    fn level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Speed => self.speed,
            UpgradeKind::Capacity => self.capacity,
            UpgradeKind::FoodTier => self.food_tier,
            UpgradeKind::SpawnRate => self.spawn_rate,
        }
    }

    fn level_mut(&mut self, kind: UpgradeKind) -> &mut u32 {
        match kind {
            UpgradeKind::Speed => &mut self.speed,
            UpgradeKind::Capacity => &mut self.capacity,
            UpgradeKind::FoodTier => &mut self.food_tier,
            UpgradeKind::SpawnRate => &mut self.spawn_rate,
        }
    }

    fn modifiers(&self) -> ColonyModifiers {
        ColonyModifiers {
            speed_multiplier: 1.0 + 0.1 * self.speed as f32,
            capacity_bonus: self.capacity,
            food_tier: self.food_tier.min(FoodType::Cake.tier()),
            food_spawn_interval_seconds: FOOD_SPAWN_INTERVAL_SECONDS
                * 0.88_f32.powi(self.spawn_rate.min(32) as i32),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColonyModifiers {
    speed_multiplier: f32,
    capacity_bonus: u32,
    food_tier: u32,
    food_spawn_interval_seconds: f32,
}

impl Default for ColonyModifiers {
    fn default() -> Self {
        UpgradeLevels::default().modifiers()
    }
}

/// `base_cost * 1.15^owned`, rounded up.
fn unit_price(base_cost: u32, owned: usize) -> u64 {
    let exponent = owned.min(i32::MAX as usize) as i32;
    let price = f64::from(base_cost) * UNIT_PRICE_GROWTH.powi(exponent);
    if price >= u64::MAX as f64 {
        u64::MAX
    } else {
        price.ceil() as u64
    }
}

/// `base * 2^level`.
fn upgrade_price(kind: UpgradeKind, level: u32) -> u64 {
    kind.base_price().saturating_mul(2u64.saturating_pow(level))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShopAction {
    BuyUnit(UnitKind),
    BuyUpgrade(UpgradeKind),
    SummonBoss,
}

fn shop_action_for_hotkey(digit: u8) -> Option<ShopAction> {
    let action = match digit {
        1 => ShopAction::BuyUnit(UnitKind::Worker),
        2 => ShopAction::BuyUnit(UnitKind::Flying),
        3 => ShopAction::BuyUnit(UnitKind::Fire),
        4 => ShopAction::BuyUnit(UnitKind::Car),
        5 => ShopAction::BuyUnit(UnitKind::Queen),
        6 => ShopAction::BuyUpgrade(UpgradeKind::Speed),
        7 => ShopAction::BuyUpgrade(UpgradeKind::Capacity),
        8 => ShopAction::BuyUpgrade(UpgradeKind::FoodTier),
        9 => ShopAction::SummonBoss,
        0 => ShopAction::BuyUpgrade(UpgradeKind::SpawnRate),
        _ => return None,
    };
    Some(action)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
enum PurchaseError {
    #[error("need {price} food, have {food}")]
    Unaffordable { price: u64, food: u64 },
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("{} is already at max level {max_level}", .kind.label())]
    MaxLevel { kind: UpgradeKind, max_level: u32 },
    #[error("a boss encounter is already in progress")]
    BossActive,
}
