// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The 256-entry xterm palette.
//!
//! Layout: 0..=15 are the VGA base colors (normal + bright), 16..=231 the
//! 6x6x6 color cube, 232..=255 the 24-step grayscale ramp. Truecolor cells
//! never consult this table.

use super::cell::CellColor;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Rgb { Rgb { r, g, b } }
}

/// VGA base colors, ANSI order (black, red, green, yellow, blue, magenta,
/// cyan, white), normal row then bright row.
const BASE_16: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(170, 0, 0),
    Rgb::new(0, 170, 0),
    Rgb::new(170, 85, 0),
    Rgb::new(0, 0, 170),
    Rgb::new(170, 0, 170),
    Rgb::new(0, 170, 170),
    Rgb::new(170, 170, 170),
    Rgb::new(85, 85, 85),
    Rgb::new(255, 85, 85),
    Rgb::new(85, 255, 85),
    Rgb::new(255, 255, 85),
    Rgb::new(85, 85, 255),
    Rgb::new(255, 85, 255),
    Rgb::new(85, 255, 255),
    Rgb::new(255, 255, 255),
];

/// Component levels of the 6x6x6 cube, per the xterm formula
/// `v = i == 0 ? 0 : i * 40 + 55`.
const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

#[derive(Debug)]
pub struct Palette {
    table: [Rgb; 256],
}

impl Default for Palette {
    fn default() -> Self { Palette::new() }
}

impl Palette {
    #[must_use]
    pub fn new() -> Palette {
        let mut table = [Rgb::default(); 256];

        table[..16].copy_from_slice(&BASE_16);

        for r in 0..6 {
            for g in 0..6 {
                for b in 0..6 {
                    table[16 + r * 36 + g * 6 + b] =
                        Rgb::new(CUBE_LEVELS[r], CUBE_LEVELS[g], CUBE_LEVELS[b]);
                }
            }
        }

        for i in 0..24 {
            let v = 8 + (i as u8) * 10;
            table[232 + i] = Rgb::new(v, v, v);
        }

        Palette { table }
    }

    #[must_use]
    pub fn lookup(&self, index: u8) -> Rgb { self.table[index as usize] }

    /// Resolve a cell color to RGB. `default_to` supplies the RGB for
    /// [`CellColor::Default`] (white for foregrounds, black for backgrounds).
    #[must_use]
    pub fn resolve(&self, color: CellColor, default_to: Rgb) -> Rgb {
        match color {
            CellColor::Default => default_to,
            CellColor::Indexed(i) => self.lookup(i),
            CellColor::Rgb(r, g, b) => Rgb::new(r, g, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_colors_match_vga() {
        let p = Palette::new();
        assert_eq!(p.lookup(0), Rgb::new(0, 0, 0));
        assert_eq!(p.lookup(1), Rgb::new(170, 0, 0));
        assert_eq!(p.lookup(7), Rgb::new(170, 170, 170));
        assert_eq!(p.lookup(15), Rgb::new(255, 255, 255));
    }

    #[test]
    fn cube_corners() {
        let p = Palette::new();
        // 16 = (0,0,0), 231 = (5,5,5) -> (255,255,255).
        assert_eq!(p.lookup(16), Rgb::new(0, 0, 0));
        assert_eq!(p.lookup(231), Rgb::new(255, 255, 255));
        // 16 + 1*36 + 2*6 + 3 = 67 -> (95, 135, 175).
        assert_eq!(p.lookup(67), Rgb::new(95, 135, 175));
    }

    #[test]
    fn grayscale_ramp() {
        let p = Palette::new();
        assert_eq!(p.lookup(232), Rgb::new(8, 8, 8));
        assert_eq!(p.lookup(255), Rgb::new(238, 238, 238));
    }

    #[test]
    fn resolve_kinds() {
        let p = Palette::new();
        assert_eq!(p.resolve(CellColor::Default, Rgb::WHITE), Rgb::WHITE);
        assert_eq!(p.resolve(CellColor::Indexed(1), Rgb::WHITE), Rgb::new(170, 0, 0));
        assert_eq!(
            p.resolve(CellColor::Rgb(1, 2, 3), Rgb::WHITE),
            Rgb::new(1, 2, 3)
        );
    }
}
