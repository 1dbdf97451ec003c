// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Printable-character emission and in-row editing (ICH / DCH / ECH / REP).

use crate::term::buffer::TermBuffer;
use crate::term::cell::Cell;

/// Place one decoded codepoint at the cursor with the current pen, then
/// advance.
///
/// Wrap is deferred: a print that fills the last column parks the cursor on
/// that column and raises `pending_wrap`; the *next* print wraps to a fresh
/// row first (auto-wrap on, with a scroll check). This is what keeps a
/// full-width line followed by CR LF from producing two row advances, and
/// it keeps the cursor column strictly inside the grid between calls. With
/// auto-wrap off the cursor simply sticks to the right margin.
pub fn print(buf: &mut TermBuffer, ch: char) {
    let w = buf.width();

    if buf.pending_wrap {
        buf.pending_wrap = false;
        if buf.wraparound {
            buf.cursor.x = 0;
            buf.cursor.y += 1;
            buf.scroll_check();
        }
    }

    let (x, y) = (buf.cursor.x.min(w - 1), buf.cursor.y);
    buf.set_cell(
        x,
        y,
        Cell {
            ch,
            fg: buf.pen.fg,
            bg: buf.pen.bg,
            attrs: buf.pen.attrs,
        },
    );
    buf.last_character = ch;

    if x + 1 < w {
        buf.cursor.x = x + 1;
    } else {
        buf.cursor.x = w - 1;
        buf.pending_wrap = buf.wraparound;
    }
}

/// CSI `b`: repeat the last emitted character `n` times.
pub fn repeat_last(buf: &mut TermBuffer, n: usize) {
    let ch = buf.last_character;
    for _ in 0..n.min(buf.width() * buf.height()) {
        print(buf, ch);
    }
}

/// CSI `@`: insert `n` blank cells at the cursor.
pub fn insert_blanks(buf: &mut TermBuffer, n: usize) { buf.insert_character(n); }

/// CSI `P`: delete `n` cells at the cursor.
pub fn delete_chars(buf: &mut TermBuffer, n: usize) { buf.delete_character(n); }

/// CSI `X`: erase `n` cells from the cursor, cursor stays put.
pub fn erase_chars(buf: &mut TermBuffer, n: usize) { buf.erase_characters(n); }
