#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct UnitId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct FoodId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct EnemyId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
enum UnitKind {
    Worker,
    Flying,
    Fire,
    Car,
    Queen,
}

impl UnitKind {
    const ALL: [UnitKind; 5] = [
        UnitKind::Worker,
        UnitKind::Flying,
        UnitKind::Fire,
        UnitKind::Car,
        UnitKind::Queen,
    ];

    fn index(self) -> usize {
        match self {
            Self::Worker => 0,
            Self::Flying => 1,
            Self::Fire => 2,
            Self::Car => 3,
            Self::Queen => 4,
        }
    }

    fn def_name(self) -> &'static str {
        match self {
            Self::Worker => "ants.worker",
            Self::Flying => "ants.flying",
            Self::Fire => "ants.fire",
            Self::Car => "ants.car",
            Self::Queen => "ants.queen",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Worker => "Worker",
            Self::Flying => "Flying",
            Self::Fire => "Fire",
            Self::Car => "Car",
            Self::Queen => "Queen",
        }
    }

    fn is_forager(self) -> bool {
        self != Self::Queen
    }

    fn adornment(self, cosmetic_phase: f32) -> Adornment {
        match self {
            Self::Worker | Self::Fire => Adornment::Legs {
                phase: cosmetic_phase,
            },
            Self::Flying => Adornment::Wings {
                phase: cosmetic_phase,
            },
            Self::Car => Adornment::Wheels {
                angle: cosmetic_phase,
            },
            Self::Queen => Adornment::Crown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum FoodType {
    Seed,
    Sugar,
    Apple,
    Cake,
}

impl FoodType {
    const ALL: [FoodType; 4] = [
        FoodType::Seed,
        FoodType::Sugar,
        FoodType::Apple,
        FoodType::Cake,
    ];

    /// Visual tier; also the food-tier upgrade level that unlocks the type.
    fn tier(self) -> u32 {
        match self {
            Self::Seed => 0,
            Self::Sugar => 1,
            Self::Apple => 2,
            Self::Cake => 3,
        }
    }

    fn from_tier(tier: u32) -> Self {
        match tier {
            0 => Self::Seed,
            1 => Self::Sugar,
            2 => Self::Apple,
            _ => Self::Cake,
        }
    }

    fn def_name(self) -> &'static str {
        match self {
            Self::Seed => "food.seed",
            Self::Sugar => "food.sugar",
            Self::Apple => "food.apple",
            Self::Cake => "food.cake",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitState {
    Spawning,
    SeekingFood,
    CollectingFood,
    ReturningToNest,
    DeliveringFood,
    Fighting,
    Nesting,
}

impl UnitState {
    fn is_foraging(self) -> bool {
        matches!(
            self,
            Self::SeekingFood | Self::CollectingFood | Self::ReturningToNest | Self::DeliveringFood
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnemyKind {
    Anteater,
}

impl EnemyKind {
    fn def_name(self) -> &'static str {
        match self {
            Self::Anteater => "enemy.anteater",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ColonyEvent {
    FoodCollected {
        unit_id: UnitId,
        food_id: FoodId,
        value: u32,
    },
    FoodDelivered {
        unit_id: UnitId,
        value: u32,
    },
    LarvaLaid {
        kind: UnitKind,
    },
    LarvaHatched {
        unit_id: UnitId,
        kind: UnitKind,
    },
    UnitDied {
        unit_id: UnitId,
        kind: UnitKind,
    },
    BossHit {
        unit_id: UnitId,
        damage: u32,
    },
    AntHit {
        unit_id: UnitId,
        damage: u32,
    },
    BossDefeated {
        enemy_id: EnemyId,
        level: u32,
        position: Vec2,
    },
    EntityDiscarded {
        reason: &'static str,
    },
}

#[derive(Debug, Default)]
struct ColonyEventBus {
    events: Vec<ColonyEvent>,
}

impl ColonyEventBus {
    fn emit(&mut self, event: ColonyEvent) {
        self.events.push(event);
    }

    fn drain(&mut self) -> Vec<ColonyEvent> {
        std::mem::take(&mut self.events)
    }

    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = &ColonyEvent> {
        self.events.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColonySystemId {
    FoodSpawn,
    Larvae,
    AntBehavior,
    BossAi,
    Cleanup,
}

impl ColonySystemId {
    fn name(self) -> &'static str {
        match self {
            Self::FoodSpawn => "FoodSpawn",
            Self::Larvae => "Larvae",
            Self::AntBehavior => "AntBehavior",
            Self::BossAi => "BossAi",
            Self::Cleanup => "Cleanup",
        }
    }
}

const COLONY_SYSTEM_ORDER: [ColonySystemId; 5] = [
    ColonySystemId::FoodSpawn,
    ColonySystemId::Larvae,
    ColonySystemId::AntBehavior,
    ColonySystemId::BossAi,
    ColonySystemId::Cleanup,
];
