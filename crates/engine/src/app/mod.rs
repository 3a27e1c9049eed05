mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::{HotkeySet, InputAction};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    screen_to_world_px, world_to_screen_px, Renderer, Viewport, PIXELS_PER_WORLD,
};
pub use scene::{
    Adornment, Camera2D, Entity, EntityId, EntityVisual, HudSnapshot, InputSnapshot, Particle,
    RenderLayer, RenderableDesc, RenderableKind, Scene, SceneCommand, SceneWorld, Transform, Vec2,
    MAX_PARTICLES,
};
