use crate::app::{Camera2D, Vec2};

pub const PIXELS_PER_WORLD: f32 = 24.0;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

pub(crate) fn camera_pixels_per_world(camera: &Camera2D) -> f32 {
    PIXELS_PER_WORLD * camera.effective_zoom()
}

/// World position to screen pixels. World +y points up, screen +y points down.
pub fn world_to_screen_px(camera: &Camera2D, window_size: (u32, u32), world: Vec2) -> (i32, i32) {
    let pixels_per_world = camera_pixels_per_world(camera);
    let x = (world.x - camera.position.x) * pixels_per_world + window_size.0 as f32 * 0.5;
    let y = window_size.1 as f32 * 0.5 - (world.y - camera.position.y) * pixels_per_world;
    (x.round() as i32, y.round() as i32)
}

pub fn screen_to_world_px(camera: &Camera2D, window_size: (u32, u32), screen_px: Vec2) -> Vec2 {
    let pixels_per_world = camera_pixels_per_world(camera);
    Vec2 {
        x: camera.position.x + (screen_px.x - window_size.0 as f32 * 0.5) / pixels_per_world,
        y: camera.position.y - (screen_px.y - window_size.1 as f32 * 0.5) / pixels_per_world,
    }
}
