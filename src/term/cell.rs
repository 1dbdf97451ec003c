// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Character cell model: codepoint + color pair + attribute bitset.
//!
//! A [`Cell`] is what the parser writes and the rasterizer reads. Style state
//! travels on the cursor (the [`Pen`]) and is stamped into the cell on emit,
//! so later pen changes never mutate already-placed cells.

/// How a cell's foreground or background resolves to RGB.
///
/// `Default` defers to the terminal defaults (white on black). `Indexed`
/// points into the 256-entry xterm palette. `Rgb` is 24-bit truecolor and
/// bypasses the palette entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellColor {
    #[default]
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

/// Packed attribute flags, one bit each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attrs(u8);

impl Attrs {
    pub const BOLD: Attrs = Attrs(1 << 0);
    pub const DIM: Attrs = Attrs(1 << 1);
    pub const INVERSE: Attrs = Attrs(1 << 2);
    pub const UNDERLINE: Attrs = Attrs(1 << 3);
    pub const STRIKETHROUGH: Attrs = Attrs(1 << 4);
    pub const BLINK: Attrs = Attrs(1 << 5);
    pub const ITALIC: Attrs = Attrs(1 << 6);

    #[must_use]
    pub fn empty() -> Attrs { Attrs(0) }

    #[must_use]
    pub fn contains(self, other: Attrs) -> bool { self.0 & other.0 == other.0 }

    pub fn insert(&mut self, other: Attrs) { self.0 |= other.0; }

    pub fn remove(&mut self, other: Attrs) { self.0 &= !other.0; }

    pub fn set(&mut self, other: Attrs, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    #[must_use]
    pub fn is_empty(self) -> bool { self.0 == 0 }
}

/// One character position on the virtual screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: CellColor,
    pub bg: CellColor,
    pub attrs: Attrs,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            fg: CellColor::Default,
            bg: CellColor::Default,
            attrs: Attrs::empty(),
        }
    }
}

/// Current drawing state carried by the cursor and applied on emit.
///
/// Erase operations also use the pen so that "erase with background"
/// semantics hold: a cleared region takes the colors active at clear time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pen {
    pub fg: CellColor,
    pub bg: CellColor,
    pub attrs: Attrs,
}

impl Pen {
    /// A blank cell in this pen's colors, used as erase fill.
    #[must_use]
    pub fn blank_cell(&self) -> Cell {
        Cell {
            ch: ' ',
            fg: self.fg,
            bg: self.bg,
            attrs: Attrs::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attrs_insert_remove_contains() {
        let mut a = Attrs::empty();
        assert!(a.is_empty());

        a.insert(Attrs::BOLD);
        a.insert(Attrs::BLINK);
        assert!(a.contains(Attrs::BOLD));
        assert!(a.contains(Attrs::BLINK));
        assert!(!a.contains(Attrs::ITALIC));

        a.remove(Attrs::BOLD);
        assert!(!a.contains(Attrs::BOLD));
        assert!(a.contains(Attrs::BLINK));
    }

    #[test]
    fn default_cell_is_blank_with_default_colors() {
        let cell = Cell::default();
        assert_eq!(cell.ch, ' ');
        assert_eq!(cell.fg, CellColor::Default);
        assert_eq!(cell.bg, CellColor::Default);
        assert!(cell.attrs.is_empty());
    }

    #[test]
    fn pen_blank_cell_keeps_colors_drops_attrs() {
        let mut pen = Pen::default();
        pen.fg = CellColor::Indexed(3);
        pen.bg = CellColor::Rgb(10, 20, 30);
        pen.attrs.insert(Attrs::UNDERLINE);

        let blank = pen.blank_cell();
        assert_eq!(blank.ch, ' ');
        assert_eq!(blank.fg, CellColor::Indexed(3));
        assert_eq!(blank.bg, CellColor::Rgb(10, 20, 30));
        assert!(blank.attrs.is_empty());
    }
}
