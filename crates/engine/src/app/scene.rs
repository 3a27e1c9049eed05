use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::input::{ActionStates, HotkeySet, InputAction};
use crate::content::DefDatabase;

pub const MAX_PARTICLES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    /// Unload the scene, clear its world and load it again from scratch.
    HardReset,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    cursor_position_px: Option<Vec2>,
    left_click_pressed: bool,
    save_pressed: bool,
    load_pressed: bool,
    reset_pressed: bool,
    zoom_delta_steps: i32,
    hotkeys: HotkeySet,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_left_click_pressed(mut self, left_click_pressed: bool) -> Self {
        self.left_click_pressed = left_click_pressed;
        self
    }

    pub fn with_save_pressed(mut self, save_pressed: bool) -> Self {
        self.save_pressed = save_pressed;
        self
    }

    pub fn with_load_pressed(mut self, load_pressed: bool) -> Self {
        self.load_pressed = load_pressed;
        self
    }

    pub fn with_reset_pressed(mut self, reset_pressed: bool) -> Self {
        self.reset_pressed = reset_pressed;
        self
    }

    pub fn with_zoom_delta_steps(mut self, zoom_delta_steps: i32) -> Self {
        self.zoom_delta_steps = zoom_delta_steps;
        self
    }

    pub fn with_hotkeys(mut self, hotkeys: HotkeySet) -> Self {
        self.hotkeys = hotkeys;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn save_pressed(&self) -> bool {
        self.save_pressed
    }

    pub fn load_pressed(&self) -> bool {
        self.load_pressed
    }

    pub fn reset_pressed(&self) -> bool {
        self.reset_pressed
    }

    pub fn zoom_delta_steps(&self) -> i32 {
        self.zoom_delta_steps
    }

    pub fn hotkeys(&self) -> HotkeySet {
        self.hotkeys
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or zero for a (near) zero vector.
    pub fn normalized(self) -> Vec2 {
        let length = self.length();
        if length <= f32::EPSILON || !length.is_finite() {
            return Vec2::ZERO;
        }
        Vec2::new(self.x / length, self.y / length)
    }

    pub fn lerp(self, to: Vec2, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        self + (to - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 2.0;
pub const CAMERA_ZOOM_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::default(),
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }
}

impl Camera2D {
    pub fn effective_zoom(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }

    pub fn apply_zoom_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        let target_zoom = self.zoom + steps as f32 * CAMERA_ZOOM_STEP;
        self.set_zoom_clamped(target_zoom);
    }
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec2,
    pub rotation_radians: Option<f32>,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation_radians: None,
        }
    }
}

/// How a def is drawn. `Sprite` names a PNG under `assets/base/sprites`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderableKind {
    Placeholder,
    Disc,
    Sprite(String),
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub color: [u8; 3],
    pub radius_world: f32,
    pub debug_name: &'static str,
}

/// Type-specific cosmetic drawn on top of the body.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Adornment {
    #[default]
    None,
    Legs {
        phase: f32,
    },
    Wings {
        phase: f32,
    },
    Wheels {
        angle: f32,
    },
    Crown,
}

/// Draw order bucket; lower layers are drawn first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum RenderLayer {
    Ground,
    Food,
    #[default]
    Units,
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityVisual {
    pub scale: f32,
    pub adornment: Adornment,
    pub health_fraction: Option<f32>,
    pub layer: RenderLayer,
    pub carrying: bool,
}

impl Default for EntityVisual {
    fn default() -> Self {
        Self {
            scale: 1.0,
            adornment: Adornment::None,
            health_fraction: None,
            layer: RenderLayer::Units,
            carrying: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub renderable: RenderableDesc,
    pub visual: EntityVisual,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: [u8; 3],
    pub ttl_seconds: f32,
    pub size_px: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudSnapshot {
    pub lines: Vec<String>,
    pub banner: Option<String>,
    /// Boss health in `0.0..=1.0` while a boss is on the field.
    pub boss_health: Option<f32>,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    camera: Camera2D,
    particles: Vec<Particle>,
    def_database: Option<DefDatabase>,
}

impl SceneWorld {
    pub fn spawn(&mut self, transform: Transform, renderable: RenderableDesc) -> EntityId {
        self.spawn_with_visual(transform, renderable, EntityVisual::default())
    }

    pub fn spawn_with_visual(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        visual: EntityVisual,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            renderable,
            visual,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_unstable();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.pending_spawns
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.pending_despawns.clear();
        }

        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            self.entities.push(entity);
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera2D::default();
        self.particles.clear();
    }

    /// Updates an applied or still-pending entity in place.
    pub fn update_entity(&mut self, id: EntityId, transform: Transform, visual: EntityVisual) -> bool {
        let entity = self
            .entities
            .iter_mut()
            .chain(self.pending_spawns.iter_mut())
            .find(|entity| entity.id == id);
        let Some(entity) = entity else {
            return false;
        };
        entity.transform = transform;
        entity.visual = visual;
        true
    }

    pub fn push_particle(&mut self, particle: Particle) -> bool {
        if self.particles.len() >= MAX_PARTICLES {
            return false;
        }
        self.particles.push(particle);
        true
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn tick_particles(&mut self, fixed_dt_seconds: f32) {
        self.particles.retain_mut(|particle| {
            particle.position += particle.velocity * fixed_dt_seconds;
            particle.velocity = particle.velocity * 0.92;
            particle.ttl_seconds -= fixed_dt_seconds;
            particle.ttl_seconds > 0.0
        });
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn set_def_database(&mut self, def_database: DefDatabase) {
        self.def_database = Some(def_database);
    }

    pub fn def_database(&self) -> Option<&DefDatabase> {
        self.def_database.as_ref()
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
    fn hud(&self, _world: &SceneWorld) -> Option<HudSnapshot> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn set_def_database(&mut self, def_database: DefDatabase) {
        self.world.set_def_database(def_database);
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        self.scene.update(fixed_dt_seconds, input, &mut self.world)
    }

    pub(crate) fn apply_pending(&mut self) {
        self.world.apply_pending();
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn hud(&self) -> Option<HudSnapshot> {
        self.scene.hud(&self.world)
    }

    pub(crate) fn hard_reset(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
        }
        self.world.clear();
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn shutdown(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.world);
        self.world.clear();
        self.is_loaded = false;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn disc(debug_name: &'static str) -> RenderableDesc {
        RenderableDesc {
            kind: RenderableKind::Disc,
            color: [200, 100, 50],
            radius_world: 0.5,
            debug_name,
        }
    }

    struct CountingScene {
        spawn_count: usize,
        loads: Rc<Cell<u32>>,
        unloads: Rc<Cell<u32>>,
    }

    impl Scene for CountingScene {
        fn load(&mut self, world: &mut SceneWorld) {
            self.loads.set(self.loads.get() + 1);
            for _ in 0..self.spawn_count {
                world.spawn(Transform::default(), disc("test"));
            }
            world.apply_pending();
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            _world: &mut SceneWorld,
        ) -> SceneCommand {
            SceneCommand::None
        }

        fn unload(&mut self, _world: &mut SceneWorld) {
            self.unloads.set(self.unloads.get() + 1);
        }
    }

    fn counting_runtime(spawn_count: usize) -> (SceneRuntime, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let loads = Rc::new(Cell::new(0));
        let unloads = Rc::new(Cell::new(0));
        let runtime = SceneRuntime::new(Box::new(CountingScene {
            spawn_count,
            loads: Rc::clone(&loads),
            unloads: Rc::clone(&unloads),
        }));
        (runtime, loads, unloads)
    }

    #[test]
    fn spawned_entities_appear_after_apply_pending() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Transform::default(), disc("a"));
        assert_eq!(world.entity_count(), 0);
        world.apply_pending();
        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(id).is_some());
    }

    #[test]
    fn despawn_of_pending_spawn_never_lands() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Transform::default(), disc("a"));
        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn despawn_unknown_entity_returns_false() {
        let mut world = SceneWorld::default();
        assert!(!world.despawn(EntityId(99)));
    }

    #[test]
    fn applied_spawn_order_is_monotonic() {
        let mut world = SceneWorld::default();
        world.spawn(Transform::default(), disc("a"));
        world.spawn(Transform::default(), disc("b"));
        world.apply_pending();
        world.spawn(Transform::default(), disc("c"));
        world.apply_pending();
        let orders = world
            .entities()
            .iter()
            .map(Entity::applied_spawn_order)
            .collect::<Vec<_>>();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn update_entity_reaches_pending_spawns() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Transform::default(), disc("a"));
        let visual = EntityVisual {
            scale: 0.4,
            ..EntityVisual::default()
        };
        assert!(world.update_entity(id, Transform::at(Vec2::new(2.0, 3.0)), visual));
        world.apply_pending();
        let entity = world.find_entity(id).expect("entity");
        assert_eq!(entity.transform.position, Vec2::new(2.0, 3.0));
        assert_eq!(entity.visual.scale, 0.4);
    }

    #[test]
    fn particles_expire_and_are_capped() {
        let mut world = SceneWorld::default();
        let particle = Particle {
            position: Vec2::ZERO,
            velocity: Vec2::new(1.0, 0.0),
            color: [255, 255, 255],
            ttl_seconds: 0.05,
            size_px: 2,
        };
        for _ in 0..MAX_PARTICLES {
            assert!(world.push_particle(particle));
        }
        assert!(!world.push_particle(particle));

        world.tick_particles(0.1);
        assert!(world.particles().is_empty());
    }

    #[test]
    fn zoom_is_clamped_and_recovers_from_nan() {
        let mut camera = Camera2D::default();
        camera.apply_zoom_steps(100);
        assert_eq!(camera.zoom, CAMERA_ZOOM_MAX);
        camera.apply_zoom_steps(-100);
        assert_eq!(camera.zoom, CAMERA_ZOOM_MIN);
        camera.zoom = f32::NAN;
        assert_eq!(camera.effective_zoom(), CAMERA_ZOOM_DEFAULT);
    }

    #[test]
    fn normalized_zero_vector_stays_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        let unit = Vec2::new(3.0, 4.0).normalized();
        assert!((unit.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hard_reset_unloads_clears_and_reloads() {
        let (mut runtime, loads, unloads) = counting_runtime(2);
        runtime.load();
        runtime.world_mut().camera_mut().position = Vec2::new(5.0, 5.0);
        assert_eq!(runtime.world().entity_count(), 2);

        runtime.hard_reset();
        assert_eq!(loads.get(), 2);
        assert_eq!(unloads.get(), 1);
        assert_eq!(runtime.world().entity_count(), 2);
        assert_eq!(runtime.world().camera().position, Vec2::ZERO);
    }

    #[test]
    fn load_is_idempotent_and_shutdown_unloads_once() {
        let (mut runtime, loads, unloads) = counting_runtime(1);
        runtime.load();
        runtime.load();
        assert_eq!(loads.get(), 1);

        runtime.shutdown();
        runtime.shutdown();
        assert_eq!(unloads.get(), 1);
        assert_eq!(runtime.world().entity_count(), 0);
    }
}
