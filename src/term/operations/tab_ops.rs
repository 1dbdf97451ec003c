// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tab stop management: HTS / VTS (via ESC `H` / ESC `J`) and TBC
//! (`CSI ... g`). The vertical variants mirror the horizontal ones, one
//! stop flag per row.

use crate::term::buffer::TermBuffer;

/// ESC `H`: set a horizontal tab stop at the cursor column.
pub fn set_h_tab_at_cursor(buf: &mut TermBuffer) {
    let x = buf.cursor.x;
    buf.set_h_tab(x);
}

/// ESC `J`: set a vertical tab stop at the cursor row.
pub fn set_v_tab_at_cursor(buf: &mut TermBuffer) {
    let y = buf.cursor.y;
    buf.set_v_tab(y);
}

/// CSI `g`: tabulation clear.
pub fn clear_tabs(buf: &mut TermBuffer, mode: usize) {
    match mode {
        0 => {
            let x = buf.cursor.x;
            buf.clear_h_tab(x);
        }
        1 => {
            let y = buf.cursor.y;
            buf.clear_v_tab(y);
        }
        3 => buf.clear_all_h_tabs(),
        4 => buf.clear_all_v_tabs(),
        5 => {
            buf.clear_all_h_tabs();
            buf.clear_all_v_tabs();
        }
        other => tracing::debug!("tabulation clear: unsupported mode {other}"),
    }
}
