use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(test)]
use ants_engine::{ContentPlanRequest, DefDatabase};
use ants_engine::{
    screen_to_world_px, write_text_atomic, Adornment, EntityId, EntityVisual, HudSnapshot,
    InputAction, InputSnapshot, Particle, RenderLayer, RenderableDesc, RenderableKind, Scene,
    SceneCommand, SceneWorld, Transform, Vec2,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

const CAMERA_SPEED_UNITS_PER_SECOND: f32 = 10.0;
const ARENA_HALF_WIDTH: f32 = 24.0;
const ARENA_HALF_HEIGHT: f32 = 13.0;
const NEST_POSITION: Vec2 = Vec2 { x: 0.0, y: 0.0 };
const NEST_ARRIVAL_RADIUS: f32 = 1.2;
const FOOD_KEEP_OUT_RADIUS: f32 = 2.5;
const COLLECT_RADIUS: f32 = 0.4;
const SPAWN_DURATION_SECONDS: f32 = 0.5;
const SPAWN_START_SCALE: f32 = 0.4;
const COLLECT_DURATION_SECONDS: f32 = 0.5;
const DELIVER_DURATION_SECONDS: f32 = 0.25;
const ANT_AGGRO_RADIUS: f32 = 6.0;
const ANT_WANDER_RADIUS: f32 = 4.0;
const ANT_WANDER_SPEED_FACTOR: f32 = 0.5;
const QUEEN_LAY_INTERVAL_SECONDS: f32 = 10.0;
const LARVAE_HATCH_SECONDS: f32 = 5.0;
const FOOD_SPAWN_INTERVAL_SECONDS: f32 = 2.0;
const FOOD_ON_MAP_LIMIT: usize = 40;
const FOOD_CLICK_COOLDOWN_SECONDS: f32 = 0.15;
const MAX_UNITS: usize = 500;
const MAX_FOOD: usize = 200;
const MAX_LARVAE: usize = 50;
const UNIT_PRICE_GROWTH: f64 = 1.15;
const BOSS_FIRST_THRESHOLD: u64 = 1000;
const BOSS_THRESHOLD_GROWTH: u64 = 3;
const BOSS_HP_GROWTH: f32 = 1.5;
const BOSS_DAMAGE_GROWTH: f32 = 1.25;
const BOSS_REWARD_BASE: u64 = 500;
const BOSS_ENTRY_POSITION: Vec2 = Vec2 { x: 20.0, y: -9.0 };
const BOSS_WANDER_WAYPOINTS: [Vec2; 4] = [
    Vec2 { x: 8.0, y: 0.0 },
    Vec2 { x: 0.0, y: 6.0 },
    Vec2 { x: -8.0, y: 0.0 },
    Vec2 { x: 0.0, y: -6.0 },
];
const BOSS_WAYPOINT_ARRIVAL: f32 = 0.5;
const FOOD_MULTIPLIER_PER_BOSS: f32 = 0.1;
const SAVE_VERSION: u32 = 1;
const SAVE_FILE_NAME: &str = "colony.save.json";
const REJECTED_SAVE_SUFFIX: &str = ".rejected";
/// Uncapped upgrades stop being affordable long before this; saves beyond it are corrupt.
const SAVED_UPGRADE_LEVEL_LIMIT: u32 = 64;
const STARTING_FOOD: u64 = 50;
const RNG_SEED: u64 = 0x1D1E_A475;
const COLONY_SYSTEM_ORDER_TEXT: &str = "FoodSpawn>Larvae>AntBehavior>BossAi>Cleanup";

include!("types.rs");
include!("steering.rs");
include!("catalog.rs");
include!("ants.rs");
include!("food.rs");
include!("nest.rs");
include!("enemies.rs");
include!("entity_manager.rs");
include!("validation.rs");
include!("cinematic.rs");
include!("shop.rs");
include!("save.rs");
include!("scene_state.rs");
include!("scene_impl.rs");

pub(crate) fn build_colony_scene(saves_dir: PathBuf, autosave_interval_seconds: f32) -> Box<dyn Scene> {
    Box::new(ColonyScene::new(saves_dir, autosave_interval_seconds))
}
