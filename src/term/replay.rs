// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Full-screen repaint generator for character-stream viewers.
//!
//! A telnet or SSH client that connects mid-session missed every byte the
//! child produced so far, so the session starts (and, in dumb mode,
//! refreshes) with a synthesized repaint: clear screen, then row by row a
//! cursor move and each cell prefixed with its color SGR, then a final move
//! to the live cursor position.

use super::buffer::ScreenSnapshot;
use super::cell::CellColor;

/// Generate the repaint byte stream for one snapshot.
#[must_use]
pub fn full_redraw(snap: &ScreenSnapshot) -> Vec<u8> {
    // ~12 bytes per cell covers the SGR prefix + a short UTF-8 char.
    let mut out = Vec::with_capacity(snap.width * snap.height * 12);
    out.extend_from_slice(b"\x1b[2J");

    let mut utf8 = [0u8; 4];
    for y in 0..snap.height {
        out.extend_from_slice(format!("\x1b[{}H", y + 1).as_bytes());
        for x in 0..snap.width {
            let cell = snap.cell(x, y);
            out.extend_from_slice(
                format!("\x1b[{};{}m", fg_code(cell.fg), bg_code(cell.bg)).as_bytes(),
            );
            out.extend_from_slice(cell.ch.encode_utf8(&mut utf8).as_bytes());
        }
    }

    let (x, y) = (snap.cursor.x.min(snap.width - 1), snap.cursor.y);
    out.extend_from_slice(format!("\x1b[{};{}H", y + 1, x + 1).as_bytes());
    out
}

fn fg_code(color: CellColor) -> String {
    match color {
        CellColor::Default => "39".into(),
        CellColor::Indexed(i @ 0..=7) => format!("{}", 30 + u16::from(i)),
        CellColor::Indexed(i @ 8..=15) => format!("{}", 90 + u16::from(i) - 8),
        CellColor::Indexed(i) => format!("38;5;{i}"),
        CellColor::Rgb(r, g, b) => format!("38;2;{r};{g};{b}"),
    }
}

fn bg_code(color: CellColor) -> String {
    match color {
        CellColor::Default => "49".into(),
        CellColor::Indexed(i @ 0..=7) => format!("{}", 40 + u16::from(i)),
        CellColor::Indexed(i @ 8..=15) => format!("{}", 100 + u16::from(i) - 8),
        CellColor::Indexed(i) => format!("48;5;{i}"),
        CellColor::Rgb(r, g, b) => format!("48;2;{r};{g};{b}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::TerminalEmulator;

    /// Feeding a repaint into a fresh emulator must reproduce the screen
    /// content; the repaint is itself ANSI the emulator understands.
    #[test]
    fn redraw_round_trips_through_emulator() {
        let mut source = TerminalEmulator::new(10, 4);
        source.consume(b"hi\x1b[31mred\x1b[2;3Hdeep");
        let snap = source.snapshot();

        let bytes = full_redraw(&snap);

        let mut sink = TerminalEmulator::new(10, 4);
        sink.consume(&bytes);
        let replayed = sink.snapshot();

        for y in 0..4 {
            for x in 0..10 {
                let a = snap.cell(x, y);
                let b = replayed.cell(x, y);
                assert_eq!(a.ch, b.ch, "char mismatch at ({x},{y})");
                assert_eq!(a.fg, b.fg, "fg mismatch at ({x},{y})");
                assert_eq!(a.bg, b.bg, "bg mismatch at ({x},{y})");
            }
        }
        assert_eq!(snap.cursor, replayed.cursor);
    }

    #[test]
    fn redraw_starts_with_clear_and_ends_with_cursor_move() {
        let mut source = TerminalEmulator::new(5, 2);
        source.consume(b"ab");
        let bytes = full_redraw(&source.snapshot());

        assert!(bytes.starts_with(b"\x1b[2J"));
        let tail = String::from_utf8_lossy(&bytes);
        assert!(tail.ends_with("\x1b[1;3H"), "got tail: {tail}");
    }

    #[test]
    fn truecolor_cells_replay_as_truecolor() {
        let mut source = TerminalEmulator::new(5, 1);
        source.consume(b"\x1b[38;2;1;2;3mZ");
        let bytes = full_redraw(&source.snapshot());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("38;2;1;2;3"), "got: {text}");
    }
}
