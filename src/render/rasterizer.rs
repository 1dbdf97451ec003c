// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Snapshot -> RGB frame.
//!
//! Resolution per cell: colors resolve through the palette (defaults are
//! white on black), INVERSE swaps, BLINK replaces the inverse flag with the
//! gate's blink phase, DECSCNM swaps once more on top. Intensity rides on
//! the blend maximum (bold 255, dim 145, normal 200), so bold text is
//! brighter without a second palette. The per-pixel blend against the cell
//! background is `(v*fg + (max-v)*bg) >> 8` with `v` the glyph coverage
//! scaled into `[0, max]`.
//!
//! Missing glyphs fill the cell with noise: visibly broken beats invisibly
//! broken, and the frame still encodes.

use rand::Rng;

use crate::term::palette::{Palette, Rgb};
use crate::term::{Attrs, Cell, CellColor, ScreenSnapshot};

use super::font::{CachedGlyph, FontSet};

const INTENSITY_BOLD: u16 = 255;
const INTENSITY_DIM: u16 = 145;
const INTENSITY_NORMAL: u16 = 200;

/// One rendered frame, RGB8, row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub rgb: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let offset = (y * self.width + x) * 3;
        Rgb::new(self.rgb[offset], self.rgb[offset + 1], self.rgb[offset + 2])
    }
}

#[must_use]
pub fn rasterize(
    snap: &ScreenSnapshot,
    fonts: &FontSet,
    palette: &Palette,
    blink_phase: bool,
) -> Frame {
    let cell_w = fonts.cell_width();
    let cell_h = fonts.cell_height();
    let width = snap.width * cell_w;
    let height = snap.height * cell_h;
    let mut frame = Frame {
        width,
        height,
        rgb: vec![0; width * height * 3],
    };

    for cy in 0..snap.height {
        for cx in 0..snap.width {
            let cell = snap.cell(cx, cy);
            draw_cell(
                &mut frame,
                cell,
                fonts,
                palette,
                blink_phase,
                snap.global_invert,
                cx * cell_w,
                cy * cell_h,
            );
        }
    }

    frame
}

#[allow(clippy::too_many_arguments)]
fn draw_cell(
    frame: &mut Frame,
    cell: &Cell,
    fonts: &FontSet,
    palette: &Palette,
    blink_phase: bool,
    global_invert: bool,
    origin_x: usize,
    origin_y: usize,
) {
    let cell_w = fonts.cell_width();
    let cell_h = fonts.cell_height();

    let (mut fg, mut bg) = resolve_colors(cell, palette);

    let inverse = if cell.attrs.contains(Attrs::BLINK) {
        blink_phase
    } else {
        cell.attrs.contains(Attrs::INVERSE)
    };
    if inverse {
        std::mem::swap(&mut fg, &mut bg);
    }
    if global_invert {
        std::mem::swap(&mut fg, &mut bg);
    }

    let max = intensity(cell.attrs);

    // Cell background first.
    let bg_px = Rgb::new(
        ((u16::from(bg.r) * max) >> 8) as u8,
        ((u16::from(bg.g) * max) >> 8) as u8,
        ((u16::from(bg.b) * max) >> 8) as u8,
    );
    fill_rect(frame, origin_x, origin_y, cell_w, cell_h, bg_px);

    // Glyph, unless it is a plain space.
    if cell.ch != ' ' {
        match fonts.glyph(cell.ch, cell.attrs.contains(Attrs::ITALIC)) {
            Some(glyph) => {
                let glyph = fit_to_cell(&glyph, cell_w, cell_h);
                blit_glyph(frame, &glyph, fonts, origin_x, origin_y, fg, bg, max);
            }
            None => noise_fill(frame, origin_x, origin_y, cell_w, cell_h),
        }
    }

    // Decoration rows paint straight over glyph and background.
    let fg_px = Rgb::new(
        ((u16::from(fg.r) * max) >> 8) as u8,
        ((u16::from(fg.g) * max) >> 8) as u8,
        ((u16::from(fg.b) * max) >> 8) as u8,
    );
    if cell.attrs.contains(Attrs::UNDERLINE) && cell_h >= 2 {
        fill_rect(frame, origin_x, origin_y + cell_h - 2, cell_w, 1, fg_px);
    }
    if cell.attrs.contains(Attrs::STRIKETHROUGH) {
        fill_rect(frame, origin_x, origin_y + cell_h / 2, cell_w, 1, fg_px);
    }
}

/// Foreground/background RGB for a cell, before inversion. Equal palette
/// indices would render an invisible cell, so that degenerate pair is
/// forced to white-on-black.
fn resolve_colors(cell: &Cell, palette: &Palette) -> (Rgb, Rgb) {
    if let (CellColor::Indexed(f), CellColor::Indexed(b)) = (cell.fg, cell.bg) {
        if f == b {
            return (Rgb::WHITE, Rgb::BLACK);
        }
    }
    (
        palette.resolve(cell.fg, Rgb::WHITE),
        palette.resolve(cell.bg, Rgb::BLACK),
    )
}

fn intensity(attrs: Attrs) -> u16 {
    if attrs.contains(Attrs::BOLD) {
        INTENSITY_BOLD
    } else if attrs.contains(Attrs::DIM) {
        INTENSITY_DIM
    } else {
        INTENSITY_NORMAL
    }
}

fn fill_rect(frame: &mut Frame, x0: usize, y0: usize, w: usize, h: usize, color: Rgb) {
    for y in y0..(y0 + h).min(frame.height) {
        let row = y * frame.width;
        for x in x0..(x0 + w).min(frame.width) {
            let offset = (row + x) * 3;
            frame.rgb[offset] = color.r;
            frame.rgb[offset + 1] = color.g;
            frame.rgb[offset + 2] = color.b;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn blit_glyph(
    frame: &mut Frame,
    glyph: &CachedGlyph,
    fonts: &FontSet,
    origin_x: usize,
    origin_y: usize,
    fg: Rgb,
    bg: Rgb,
    max: u16,
) {
    let cell_w = fonts.cell_width() as i32;

    // Center horizontally, sit on the baseline.
    let draw_x = origin_x as i32 + (cell_w - glyph.width as i32) / 2;
    let draw_y = origin_y as i32 + fonts.ascent() - (glyph.height as i32 + glyph.ymin);

    for gy in 0..glyph.height {
        let py = draw_y + gy as i32;
        if py < 0 {
            continue;
        }
        let py = py as usize;
        if py >= frame.height {
            break;
        }

        for gx in 0..glyph.width {
            let px = draw_x + gx as i32;
            if px < 0 || px as usize >= frame.width {
                continue;
            }
            let px = px as usize;

            let coverage = u16::from(glyph.coverage[gy * glyph.width + gx]);
            let v = coverage * max / 255;
            let sub = max - v;

            let offset = (py * frame.width + px) * 3;
            frame.rgb[offset] = ((v * u16::from(fg.r) + sub * u16::from(bg.r)) >> 8) as u8;
            frame.rgb[offset + 1] = ((v * u16::from(fg.g) + sub * u16::from(bg.g)) >> 8) as u8;
            frame.rgb[offset + 2] = ((v * u16::from(fg.b) + sub * u16::from(bg.b)) >> 8) as u8;
        }
    }
}

/// Downscale an oversized glyph (fallback faces come in their own sizes) to
/// the cell box by box-averaging. Glyphs that already fit pass through.
fn fit_to_cell(glyph: &CachedGlyph, cell_w: usize, cell_h: usize) -> CachedGlyph {
    if glyph.width <= cell_w && glyph.height <= cell_h {
        return glyph.clone();
    }

    let new_w = glyph.width.min(cell_w).max(1);
    let new_h = glyph.height.min(cell_h).max(1);
    let mut coverage = vec![0u8; new_w * new_h];

    for ny in 0..new_h {
        let y0 = ny * glyph.height / new_h;
        let y1 = (((ny + 1) * glyph.height).div_ceil(new_h)).min(glyph.height);
        for nx in 0..new_w {
            let x0 = nx * glyph.width / new_w;
            let x1 = (((nx + 1) * glyph.width).div_ceil(new_w)).min(glyph.width);

            let mut sum = 0u32;
            let mut count = 0u32;
            for y in y0..y1 {
                for x in x0..x1 {
                    sum += u32::from(glyph.coverage[y * glyph.width + x]);
                    count += 1;
                }
            }
            coverage[ny * new_w + nx] = (sum / count.max(1)) as u8;
        }
    }

    CachedGlyph {
        width: new_w,
        height: new_h,
        xmin: 0,
        ymin: 0,
        coverage,
    }
}

fn noise_fill(frame: &mut Frame, x0: usize, y0: usize, w: usize, h: usize) {
    let mut rng = rand::rng();
    for y in y0..(y0 + h).min(frame.height) {
        for x in x0..(x0 + w).min(frame.width) {
            let offset = (y * frame.width + x) * 3;
            let v: u8 = rng.random();
            frame.rgb[offset] = v;
            frame.rgb[offset + 1] = v;
            frame.rgb[offset + 2] = v;
        }
    }
}
