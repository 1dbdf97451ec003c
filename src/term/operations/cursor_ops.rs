// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Cursor motion: CUU/CUD/CUF/CUB, CNL, CHA, VPA, CUP, and the C0 motions.
//!
//! CSI motions clamp at the edges and never scroll; only LF (and the ESC
//! index family in `performer.rs`) trigger the scroll check. Every motion
//! clears the deferred-wrap flag: once the cursor has been moved
//! explicitly, the parked wrap no longer applies.

use crate::term::buffer::TermBuffer;

pub fn up(buf: &mut TermBuffer, n: usize) {
    buf.pending_wrap = false;
    buf.cursor.y = buf.cursor.y.saturating_sub(n);
}

pub fn down(buf: &mut TermBuffer, n: usize) {
    buf.pending_wrap = false;
    buf.cursor.y = (buf.cursor.y + n).min(buf.height() - 1);
}

pub fn forward(buf: &mut TermBuffer, n: usize) {
    buf.pending_wrap = false;
    buf.cursor.x = (buf.cursor.x + n).min(buf.width() - 1);
}

pub fn back(buf: &mut TermBuffer, n: usize) {
    buf.pending_wrap = false;
    buf.cursor.x = buf.cursor.x.saturating_sub(n);
}

/// CSI `E`: down `n`, column 0.
pub fn next_line(buf: &mut TermBuffer, n: usize) {
    down(buf, n);
    buf.cursor.x = 0;
}

/// CSI `G`: absolute column (1-based parameter).
pub fn set_column(buf: &mut TermBuffer, col_1based: usize) {
    buf.pending_wrap = false;
    buf.cursor.x = col_1based.saturating_sub(1).min(buf.width() - 1);
}

/// CSI `d`: absolute row (1-based parameter).
pub fn set_row(buf: &mut TermBuffer, row_1based: usize) {
    buf.pending_wrap = false;
    buf.cursor.y = row_1based.saturating_sub(1).min(buf.height() - 1);
}

/// CSI `H` / `f`: absolute position (1-based row;col).
pub fn set_position(buf: &mut TermBuffer, row_1based: usize, col_1based: usize) {
    set_row(buf, row_1based);
    set_column(buf, col_1based);
}

/// CR: column 0.
pub fn carriage_return(buf: &mut TermBuffer) {
    buf.pending_wrap = false;
    buf.cursor.x = 0;
}

/// LF: next row, scrolling at the bottom.
pub fn line_feed(buf: &mut TermBuffer) {
    buf.pending_wrap = false;
    buf.cursor.y += 1;
    buf.scroll_check();
}

/// BS: one column left, or to column 0 of the previous row at a left edge.
/// A parked wrap is cancelled instead of moving (the cursor already sits on
/// the column the glyph went to).
pub fn backspace(buf: &mut TermBuffer) {
    if buf.pending_wrap {
        buf.pending_wrap = false;
        return;
    }
    if buf.cursor.x > 0 {
        buf.cursor.x -= 1;
    } else if buf.cursor.y > 0 {
        buf.cursor.x = 0;
        buf.cursor.y -= 1;
    }
}

/// HT: next horizontal tab stop. Past the last stop the cursor parks on
/// the right margin with the wrap deferred, so the next print starts a
/// fresh row.
pub fn horizontal_tab(buf: &mut TermBuffer) {
    let next = buf.next_h_tab(buf.cursor.x);
    if next >= buf.width() {
        buf.cursor.x = buf.width() - 1;
        buf.pending_wrap = buf.wraparound;
    } else {
        buf.pending_wrap = false;
        buf.cursor.x = next;
    }
}

/// VT / CSI `Y`: next vertical tab stop, capped at the last row.
pub fn vertical_tab(buf: &mut TermBuffer) {
    buf.pending_wrap = false;
    buf.cursor.y = buf.next_v_tab(buf.cursor.y);
}

/// ESC `D`: index: down one row, scrolling at the bottom.
pub fn index(buf: &mut TermBuffer) {
    buf.pending_wrap = false;
    buf.cursor.y += 1;
    buf.scroll_check();
}

/// ESC `M`: reverse index: up one row, scrolling down at the top.
pub fn reverse_index(buf: &mut TermBuffer) {
    buf.pending_wrap = false;
    if buf.cursor.y > 0 {
        buf.cursor.y -= 1;
    } else {
        buf.insert_line(0);
    }
}
