use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{Adornment, Camera2D, Entity, HudSnapshot, RenderableKind, SceneWorld, Vec2};
use crate::sprite_keys::validate_sprite_key;

use super::hud::{blend_pixel, draw_hud, fill_rect_blended};
use super::transform::camera_pixels_per_world;
use super::{world_to_screen_px, Viewport};

const CLEAR_COLOR: [u8; 4] = [86, 64, 42, 255];
const GRID_CELL_WORLD: f32 = 2.0;
const GRID_COLOR: [u8; 4] = [96, 72, 48, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const LEG_COLOR: [u8; 4] = [30, 22, 16, 255];
const WING_COLOR: [u8; 4] = [220, 235, 255, 140];
const WHEEL_COLOR: [u8; 4] = [28, 28, 30, 255];
const CROWN_COLOR: [u8; 4] = [255, 210, 60, 255];
const CARRY_COLOR: [u8; 4] = [250, 240, 200, 255];
const HEALTH_BG_COLOR: [u8; 4] = [40, 10, 10, 220];
const HEALTH_FILL_COLOR: [u8; 4] = [90, 220, 90, 255];
const HEALTH_LOW_COLOR: [u8; 4] = [230, 70, 50, 255];
const VIEW_CULL_PADDING_PX: i32 = 48;
const MIN_BODY_RADIUS_PX: i32 = 2;

#[derive(Debug)]
struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: HashSet<String>,
    draw_order: Vec<usize>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sprite_cache: HashMap::new(),
            warned_missing_sprite_keys: HashSet::new(),
            draw_order: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(
        &mut self,
        world: &SceneWorld,
        hud: Option<&HudSnapshot>,
    ) -> Result<(), Error> {
        let (width, height) = (self.viewport.width, self.viewport.height);
        if width == 0 || height == 0 {
            return Ok(());
        }

        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }
        draw_world_grid(frame, width, height, world.camera());

        collect_draw_order(world, &mut self.draw_order);
        let camera = world.camera();
        let pixels_per_world = camera_pixels_per_world(camera);
        for index in self.draw_order.iter().copied() {
            let entity = &world.entities()[index];
            let (cx, cy) = world_to_screen_px(camera, (width, height), entity.transform.position);
            if !on_screen(cx, cy, width, height) {
                continue;
            }
            let radius_px = body_radius_px(entity, pixels_per_world);
            let color = rgba(entity.renderable.color);

            draw_adornment_under(frame, width, height, entity, cx, cy, radius_px);
            match &entity.renderable.kind {
                RenderableKind::Placeholder => {
                    fill_rect_blended(
                        frame,
                        width,
                        height,
                        cx - radius_px,
                        cy - radius_px,
                        radius_px * 2 + 1,
                        radius_px * 2 + 1,
                        PLACEHOLDER_COLOR,
                    );
                }
                RenderableKind::Disc => {
                    draw_disc(frame, width, height, cx, cy, radius_px, color);
                }
                RenderableKind::Sprite(key) => {
                    match resolve_cached_sprite(
                        &mut self.sprite_cache,
                        &mut self.warned_missing_sprite_keys,
                        &self.asset_root,
                        key,
                    ) {
                        Some(sprite) => {
                            let scale = (radius_px * 2) as f32 / sprite.width.max(1) as f32;
                            draw_sprite_centered_scaled(frame, width, height, cx, cy, sprite, scale);
                        }
                        None => draw_disc(frame, width, height, cx, cy, radius_px, color),
                    }
                }
            }
            draw_adornment_over(frame, width, height, entity, cx, cy, radius_px);
            if entity.visual.carrying {
                let heading = entity.transform.rotation_radians.unwrap_or(0.0);
                let tip_x = cx + (heading.cos() * radius_px as f32).round() as i32;
                let tip_y = cy - (heading.sin() * radius_px as f32).round() as i32;
                draw_disc(frame, width, height, tip_x, tip_y, (radius_px / 2).max(1), CARRY_COLOR);
            }
            if let Some(fraction) = entity.visual.health_fraction {
                draw_health_bar(frame, width, height, cx, cy - radius_px - 6, radius_px, fraction);
            }
        }

        for particle in world.particles() {
            let (px, py) = world_to_screen_px(camera, (width, height), particle.position);
            let alpha = (particle.ttl_seconds.clamp(0.0, 1.0) * 255.0) as u8;
            let [r, g, b] = particle.color;
            let half = particle.size_px.max(1) / 2;
            fill_rect_blended(
                frame,
                width,
                height,
                px - half,
                py - half,
                particle.size_px.max(1),
                particle.size_px.max(1),
                [r, g, b, alpha.max(40)],
            );
        }

        if let Some(hud) = hud {
            draw_hud(frame, width, height, hud);
        }

        self.pixels.render()
    }
}

fn rgba(color: [u8; 3]) -> [u8; 4] {
    [color[0], color[1], color[2], 255]
}

fn on_screen(x: i32, y: i32, width: u32, height: u32) -> bool {
    x >= -VIEW_CULL_PADDING_PX
        && y >= -VIEW_CULL_PADDING_PX
        && x < width as i32 + VIEW_CULL_PADDING_PX
        && y < height as i32 + VIEW_CULL_PADDING_PX
}

fn body_radius_px(entity: &Entity, pixels_per_world: f32) -> i32 {
    let scale = if entity.visual.scale.is_finite() && entity.visual.scale > 0.0 {
        entity.visual.scale
    } else {
        1.0
    };
    ((entity.renderable.radius_world * scale * pixels_per_world).round() as i32)
        .max(MIN_BODY_RADIUS_PX)
}

/// Sorts by layer first, then by spawn order so equal-layer draws stay stable.
fn collect_draw_order(world: &SceneWorld, out: &mut Vec<usize>) {
    out.clear();
    out.extend(0..world.entities().len());
    let entities = world.entities();
    out.sort_by(|a, b| {
        let (a, b) = (&entities[*a], &entities[*b]);
        match a.visual.layer.cmp(&b.visual.layer) {
            Ordering::Equal => a.applied_spawn_order().cmp(&b.applied_spawn_order()),
            other => other,
        }
    });
}

fn draw_adornment_under(
    frame: &mut [u8],
    width: u32,
    height: u32,
    entity: &Entity,
    cx: i32,
    cy: i32,
    radius_px: i32,
) {
    let heading = entity.transform.rotation_radians.unwrap_or(0.0);
    let (side_x, side_y) = (-heading.sin(), -heading.cos());
    match entity.visual.adornment {
        Adornment::Legs { phase } => {
            let swing = phase.sin() * radius_px as f32 * 0.4;
            for (offset, sign) in [(-0.6f32, 1.0f32), (0.0, -1.0), (0.6, 1.0)] {
                let along = offset * radius_px as f32 + swing * sign;
                for side in [-1.0f32, 1.0] {
                    let reach = radius_px as f32 * 1.4 * side;
                    let lx = cx as f32 + heading.cos() * along + side_x * reach;
                    let ly = cy as f32 - heading.sin() * along + side_y * reach;
                    draw_line(frame, width, height, (cx, cy), (lx.round() as i32, ly.round() as i32), LEG_COLOR);
                }
            }
        }
        Adornment::Wheels { angle } => {
            let wheel_radius = (radius_px / 3).max(1);
            for (along, side) in [(-0.7f32, -1.0f32), (-0.7, 1.0), (0.7, -1.0), (0.7, 1.0)] {
                let wx = cx as f32 + heading.cos() * along * radius_px as f32 + side_x * side * radius_px as f32;
                let wy = cy as f32 - heading.sin() * along * radius_px as f32 + side_y * side * radius_px as f32;
                let (wx, wy) = (wx.round() as i32, wy.round() as i32);
                draw_disc(frame, width, height, wx, wy, wheel_radius, WHEEL_COLOR);
                let spoke_x = wx + (angle.cos() * wheel_radius as f32).round() as i32;
                let spoke_y = wy - (angle.sin() * wheel_radius as f32).round() as i32;
                draw_line(frame, width, height, (wx, wy), (spoke_x, spoke_y), CARRY_COLOR);
            }
        }
        Adornment::None | Adornment::Wings { .. } | Adornment::Crown => {}
    }
}

fn draw_adornment_over(
    frame: &mut [u8],
    width: u32,
    height: u32,
    entity: &Entity,
    cx: i32,
    cy: i32,
    radius_px: i32,
) {
    match entity.visual.adornment {
        Adornment::Wings { phase } => {
            let spread = radius_px as f32 * (0.8 + 0.4 * phase.sin().abs());
            let wing_radius = (radius_px * 2 / 3).max(1);
            for side in [-1.0f32, 1.0] {
                let wx = cx + (side * spread).round() as i32;
                draw_disc(frame, width, height, wx, cy - radius_px / 2, wing_radius, WING_COLOR);
            }
        }
        Adornment::Crown => {
            let top = cy - radius_px - 4;
            let tooth = (radius_px / 3).max(2);
            for step in -1..=1 {
                fill_rect_blended(
                    frame,
                    width,
                    height,
                    cx + step * tooth * 2 - tooth / 2,
                    top - tooth,
                    tooth,
                    tooth * 2,
                    CROWN_COLOR,
                );
            }
            fill_rect_blended(frame, width, height, cx - tooth * 3, top, tooth * 6, tooth, CROWN_COLOR);
        }
        Adornment::None | Adornment::Legs { .. } | Adornment::Wheels { .. } => {}
    }
}

fn draw_health_bar(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: i32,
    top: i32,
    radius_px: i32,
    fraction: f32,
) {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let bar_width = (radius_px * 2).max(10);
    let left = cx - bar_width / 2;
    fill_rect_blended(frame, width, height, left, top, bar_width, 3, HEALTH_BG_COLOR);
    let fill_color = if fraction < 0.3 {
        HEALTH_LOW_COLOR
    } else {
        HEALTH_FILL_COLOR
    };
    let fill = (bar_width as f32 * fraction).round() as i32;
    fill_rect_blended(frame, width, height, left, top, fill, 3, fill_color);
}

fn draw_world_grid(frame: &mut [u8], width: u32, height: u32, camera: &Camera2D) {
    let pixels_per_world = camera_pixels_per_world(camera) * GRID_CELL_WORLD;
    if !pixels_per_world.is_finite() || pixels_per_world < 4.0 {
        return;
    }
    let (origin_x, origin_y) = world_to_screen_px(camera, (width, height), Vec2::ZERO);
    let step = pixels_per_world.round() as i32;
    let first_x = origin_x.rem_euclid(step);
    let first_y = origin_y.rem_euclid(step);
    for x in (first_x..width as i32).step_by(step as usize) {
        fill_rect_blended(frame, width, height, x, 0, 1, height as i32, GRID_COLOR);
    }
    for y in (first_y..height as i32).step_by(step as usize) {
        fill_rect_blended(frame, width, height, 0, y, width as i32, 1, GRID_COLOR);
    }
}

fn draw_disc(frame: &mut [u8], width: u32, height: u32, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
    let radius = radius.max(0);
    let radius_sq = radius * radius + radius;
    for dy in -radius..=radius {
        let y = cy + dy;
        if y < 0 || y >= height as i32 {
            continue;
        }
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius_sq {
                continue;
            }
            let x = cx + dx;
            if x < 0 || x >= width as i32 {
                continue;
            }
            blend_pixel(frame, width as usize, x as usize, y as usize, color);
        }
    }
}

fn draw_line(frame: &mut [u8], width: u32, height: u32, from: (i32, i32), to: (i32, i32), color: [u8; 4]) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        if x >= 0 && y >= 0 && x < width as i32 && y < height as i32 {
            blend_pixel(frame, width as usize, x as usize, y as usize, color);
        }
        if x == to.0 && y == to.1 {
            break;
        }
        let doubled = err * 2;
        if doubled >= dy {
            err += dy;
            x += sx;
        }
        if doubled <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: &mut HashSet<String>,
    asset_root: &Path,
    key: &str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(key) {
        let sprite = match resolve_sprite_image_path(asset_root, key).and_then(|path| {
            load_sprite_rgba(&path).map_err(|reason| format!("{reason} ({})", path.display()))
        }) {
            Ok(sprite) => Some(sprite),
            Err(reason) => {
                warn_sprite_load_once(warned_missing_sprite_keys, key, &reason);
                None
            }
        };
        cache.insert(key.to_string(), sprite);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn resolve_sprite_image_path(asset_root: &Path, key: &str) -> Result<PathBuf, String> {
    validate_sprite_key(key).map_err(|error| format!("invalid_key:{error}"))?;
    Ok(asset_root
        .join("base")
        .join("sprites")
        .join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(warned_keys: &mut HashSet<String>, key: &str, reason: &str) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    warn!(sprite_key = key, reason, "renderer_sprite_load_failed_using_disc");
}

fn draw_sprite_centered_scaled(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center_x: i32,
    center_y: i32,
    sprite: &LoadedSprite,
    scale: f32,
) {
    if sprite.width == 0 || sprite.height == 0 {
        return;
    }
    if sprite.rgba.len() < sprite.width as usize * sprite.height as usize * 4 {
        return;
    }
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let scaled_w = (sprite.width as f32 * scale).round().max(1.0) as i32;
    let scaled_h = (sprite.height as f32 * scale).round().max(1.0) as i32;
    let left = center_x - scaled_w / 2;
    let top = center_y - scaled_h / 2;

    for out_y in top.max(0)..(top + scaled_h).min(height as i32) {
        let src_y = (((out_y - top) as f32 / scale) as u32).min(sprite.height - 1) as usize;
        for out_x in left.max(0)..(left + scaled_w).min(width as i32) {
            let src_x = (((out_x - left) as f32 / scale) as u32).min(sprite.width - 1) as usize;
            let src = (src_y * sprite.width as usize + src_x) * 4;
            let color = [
                sprite.rgba[src],
                sprite.rgba[src + 1],
                sprite.rgba[src + 2],
                sprite.rgba[src + 3],
            ];
            if color[3] == 0 {
                continue;
            }
            blend_pixel(frame, width as usize, out_x as usize, out_y as usize, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::app::{EntityVisual, RenderLayer, RenderableDesc, Transform};

    fn blank(width: u32, height: u32) -> Vec<u8> {
        vec![0; width as usize * height as usize * 4]
    }

    fn spawn(world: &mut SceneWorld, layer: RenderLayer) {
        world.spawn_with_visual(
            Transform::default(),
            RenderableDesc {
                kind: RenderableKind::Disc,
                color: [1, 2, 3],
                radius_world: 0.5,
                debug_name: "t",
            },
            EntityVisual {
                layer,
                ..EntityVisual::default()
            },
        );
    }

    #[test]
    fn draw_order_sorts_by_layer_then_spawn_order() {
        let mut world = SceneWorld::default();
        spawn(&mut world, RenderLayer::Boss);
        spawn(&mut world, RenderLayer::Food);
        spawn(&mut world, RenderLayer::Units);
        spawn(&mut world, RenderLayer::Food);
        world.apply_pending();

        let mut order = Vec::new();
        collect_draw_order(&world, &mut order);
        assert_eq!(order, vec![1, 3, 2, 0]);
    }

    #[test]
    fn disc_fills_center_and_clips_at_edges() {
        let mut frame = blank(10, 10);
        draw_disc(&mut frame, 10, 10, 0, 0, 3, [9, 9, 9, 255]);
        assert_eq!(&frame[0..4], &[9, 9, 9, 255]);
        draw_disc(&mut frame, 10, 10, -50, 200, 3, [9, 9, 9, 255]);
    }

    #[test]
    fn line_reaches_both_endpoints() {
        let mut frame = blank(8, 8);
        draw_line(&mut frame, 8, 8, (1, 1), (6, 4), [7, 7, 7, 255]);
        let at = |x: usize, y: usize| (y * 8 + x) * 4;
        assert_eq!(frame[at(1, 1)], 7);
        assert_eq!(frame[at(6, 4)], 7);
    }

    #[test]
    fn body_radius_has_a_floor() {
        let mut world = SceneWorld::default();
        spawn(&mut world, RenderLayer::Units);
        world.apply_pending();
        let entity = &world.entities()[0];
        assert_eq!(body_radius_px(entity, 0.01), MIN_BODY_RADIUS_PX);
    }

    #[test]
    fn missing_sprite_is_cached_as_absent_and_warned_once() {
        let temp = TempDir::new().expect("temp");
        let mut cache = HashMap::new();
        let mut warned = HashSet::new();
        assert!(resolve_cached_sprite(&mut cache, &mut warned, temp.path(), "ants/worker").is_none());
        assert!(resolve_cached_sprite(&mut cache, &mut warned, temp.path(), "ants/worker").is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(warned.len(), 1);
    }

    #[test]
    fn invalid_sprite_key_is_rejected_before_touching_disk() {
        let error = resolve_sprite_image_path(Path::new("/assets"), "../secret")
            .expect_err("traversal must fail");
        assert!(error.starts_with("invalid_key:"));
    }

    #[test]
    fn sprite_draw_skips_transparent_texels() {
        let sprite = LoadedSprite {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 255, 0, 0],
        };
        let mut frame = blank(4, 4);
        draw_sprite_centered_scaled(&mut frame, 4, 4, 1, 1, &sprite, 1.0);
        let red = (4 + 0) * 4;
        let clear = (4 + 1) * 4;
        assert_eq!(&frame[red..red + 4], &[255, 0, 0, 255]);
        assert_eq!(&frame[clear..clear + 4], &[0, 0, 0, 0]);
    }
}
