use crate::app::HudSnapshot;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
const PANEL_TEXT_SCALE: i32 = 2;
const BANNER_TEXT_SCALE: i32 = 5;
const PANEL_PADDING: i32 = 10;
const PANEL_INSET: i32 = 6;
const PANEL_BG_COLOR: [u8; 4] = [12, 10, 8, 200];
const PANEL_BORDER_COLOR: [u8; 4] = [120, 96, 60, 255];
const TEXT_PRIMARY_COLOR: [u8; 4] = [246, 238, 220, 255];
const TEXT_HEADER_COLOR: [u8; 4] = [255, 204, 96, 255];
const BANNER_TEXT_COLOR: [u8; 4] = [255, 236, 180, 255];
const BANNER_SHADOW_COLOR: [u8; 4] = [30, 10, 6, 255];
const BOSS_BAR_WIDTH_PX: i32 = 360;
const BOSS_BAR_HEIGHT_PX: i32 = 14;
const BOSS_BAR_BG_COLOR: [u8; 4] = [40, 12, 12, 230];
const BOSS_BAR_FILL_COLOR: [u8; 4] = [210, 48, 40, 255];

const fn glyph_advance(scale: i32) -> i32 {
    (GLYPH_WIDTH + 1) * scale
}

const fn line_advance(scale: i32) -> i32 {
    (GLYPH_HEIGHT + 2) * scale
}

pub(crate) fn text_width_px(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * glyph_advance(scale)
}

pub(crate) fn draw_hud(frame: &mut [u8], width: u32, height: u32, hud: &HudSnapshot) {
    if width == 0 || height == 0 {
        return;
    }
    draw_panel(frame, width, height, &hud.lines);
    if let Some(fraction) = hud.boss_health {
        draw_boss_bar(frame, width, height, fraction);
    }
    if let Some(banner) = hud.banner.as_deref() {
        draw_banner(frame, width, height, banner);
    }
}

fn draw_panel(frame: &mut [u8], width: u32, height: u32, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let longest = lines
        .iter()
        .map(|line| text_width_px(line, PANEL_TEXT_SCALE))
        .max()
        .unwrap_or(0);
    let panel_width = longest + PANEL_INSET * 2;
    let panel_height = lines.len() as i32 * line_advance(PANEL_TEXT_SCALE) + PANEL_INSET * 2;
    let left = PANEL_PADDING - PANEL_INSET;
    let top = PANEL_PADDING - PANEL_INSET;
    fill_rect_blended(frame, width, height, left, top, panel_width, panel_height, PANEL_BG_COLOR);
    draw_rect_outline(frame, width, height, left, top, panel_width, panel_height, PANEL_BORDER_COLOR);

    for (index, line) in lines.iter().enumerate() {
        let color = if index == 0 {
            TEXT_HEADER_COLOR
        } else {
            TEXT_PRIMARY_COLOR
        };
        let y = PANEL_PADDING + index as i32 * line_advance(PANEL_TEXT_SCALE);
        draw_text(frame, width, height, PANEL_PADDING, y, line, color, PANEL_TEXT_SCALE);
    }
}

fn draw_banner(frame: &mut [u8], width: u32, height: u32, banner: &str) {
    let text_width = text_width_px(banner, BANNER_TEXT_SCALE);
    let x = (width as i32 - text_width) / 2;
    let y = height as i32 / 3;
    let shadow = BANNER_TEXT_SCALE / 2;
    draw_text(
        frame,
        width,
        height,
        x + shadow,
        y + shadow,
        banner,
        BANNER_SHADOW_COLOR,
        BANNER_TEXT_SCALE,
    );
    draw_text(frame, width, height, x, y, banner, BANNER_TEXT_COLOR, BANNER_TEXT_SCALE);
}

fn draw_boss_bar(frame: &mut [u8], width: u32, height: u32, fraction: f32) {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let left = (width as i32 - BOSS_BAR_WIDTH_PX) / 2;
    let top = PANEL_PADDING;
    fill_rect_blended(
        frame,
        width,
        height,
        left,
        top,
        BOSS_BAR_WIDTH_PX,
        BOSS_BAR_HEIGHT_PX,
        BOSS_BAR_BG_COLOR,
    );
    let fill = (BOSS_BAR_WIDTH_PX as f32 * fraction).round() as i32;
    fill_rect_blended(
        frame,
        width,
        height,
        left,
        top,
        fill,
        BOSS_BAR_HEIGHT_PX,
        BOSS_BAR_FILL_COLOR,
    );
    draw_rect_outline(
        frame,
        width,
        height,
        left,
        top,
        BOSS_BAR_WIDTH_PX,
        BOSS_BAR_HEIGHT_PX,
        PANEL_BORDER_COLOR,
    );
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_text(
    frame: &mut [u8],
    width: u32,
    height: u32,
    mut x: i32,
    y: i32,
    text: &str,
    color: [u8; 4],
    scale: i32,
) {
    for ch in text.chars() {
        draw_glyph(frame, width, height, x, y, glyph_rows(ch), color, scale);
        x += glyph_advance(scale);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_glyph(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rows: [u8; GLYPH_HEIGHT as usize],
    color: [u8; 4],
    scale: i32,
) {
    for (row_index, row_bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if row_bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            fill_rect_blended(
                frame,
                width,
                height,
                x + col * scale,
                y + row_index as i32 * scale,
                scale,
                scale,
                color,
            );
        }
    }
}

/// Alpha-blends `color` over the frame; alpha 255 overwrites.
#[allow(clippy::too_many_arguments)]
pub(crate) fn fill_rect_blended(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = x.saturating_add(rect_width).min(width as i32);
    let end_y = y.saturating_add(rect_height).min(height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }
    for py in start_y..end_y {
        for px in start_x..end_x {
            blend_pixel(frame, width as usize, px as usize, py as usize, color);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_rect_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    if rect_width <= 1 || rect_height <= 1 {
        return;
    }
    fill_rect_blended(frame, width, height, x, y, rect_width, 1, color);
    fill_rect_blended(frame, width, height, x, y + rect_height - 1, rect_width, 1, color);
    fill_rect_blended(frame, width, height, x, y, 1, rect_height, color);
    fill_rect_blended(frame, width, height, x + rect_width - 1, y, 1, rect_height, color);
}

pub(crate) fn blend_pixel(frame: &mut [u8], width: usize, x: usize, y: usize, color: [u8; 4]) {
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(dst) = frame.get_mut(byte_offset..byte_offset + 4) else {
        return;
    };
    let alpha = color[3] as u32;
    if alpha == 255 {
        dst.copy_from_slice(&color);
        return;
    }
    for channel in 0..3 {
        let blended = (color[channel] as u32 * alpha + dst[channel] as u32 * (255 - alpha)) / 255;
        dst[channel] = blended as u8;
    }
    dst[3] = 255;
}

/// 3x5 glyph rows, most significant bit on the left. Lowercase draws as uppercase.
fn glyph_rows(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b111, 0b001, 0b010, 0b000, 0b010],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '*' => [0b000, 0b101, 0b010, 0b101, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        _ => [0; 5],
    }
}
