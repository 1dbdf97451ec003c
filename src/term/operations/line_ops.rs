// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Display / line erasure (ED, EL) and line insertion / deletion (IL, DL).

use crate::term::buffer::TermBuffer;

/// CSI `J`: erase in display. Modes 2 and 3 also home the cursor.
pub fn erase_display(buf: &mut TermBuffer, mode: usize) {
    match mode {
        0 => buf.erase_to_end(),
        1 => buf.erase_from_start(),
        2 | 3 => {
            buf.erase_all();
            buf.pending_wrap = false;
            buf.cursor.x = 0;
            buf.cursor.y = 0;
        }
        other => tracing::debug!("erase_display: unsupported mode {other}"),
    }
}

/// CSI `K`: erase in line. The cursor does not move.
pub fn erase_line(buf: &mut TermBuffer, mode: usize) {
    let (x, y) = (buf.cursor.x, buf.cursor.y);
    match mode {
        0 => buf.erase_line_range(y, x.min(buf.width()), buf.width()),
        1 => buf.erase_line_range(y, 0, (x + 1).min(buf.width())),
        2 => buf.erase_line(y),
        other => tracing::debug!("erase_line: unsupported mode {other}"),
    }
}

/// CSI `L`: insert `n` blank lines at the cursor row; column resets.
pub fn insert_lines(buf: &mut TermBuffer, n: usize) {
    let y = buf.cursor.y;
    for _ in 0..n.min(buf.height()) {
        buf.insert_line(y);
    }
    buf.pending_wrap = false;
    buf.cursor.x = 0;
}

/// CSI `M`: delete `n` lines at the cursor row; column resets.
pub fn delete_lines(buf: &mut TermBuffer, n: usize) {
    let y = buf.cursor.y;
    for _ in 0..n.min(buf.height()) {
        buf.delete_line(y);
    }
    buf.pending_wrap = false;
    buf.cursor.x = 0;
}
