// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! DEC private mode set/reset (`CSI ? ... h` / `CSI ? ... l`).
//!
//! Supported: DECAWM (?7, auto-wrap), DECCOLM (?3, 80/132 column switch,
//! which clears the screen per the DEC contract) and DECSCNM (?5, global
//! invert).

use crate::term::buffer::TermBuffer;

const NARROW_WIDTH: usize = 80;
const WIDE_WIDTH: usize = 132;

pub fn set_private_mode(buf: &mut TermBuffer, mode: usize, on: bool) {
    match mode {
        3 => {
            let width = if on { WIDE_WIDTH } else { NARROW_WIDTH };
            buf.resize_width(width);
        }
        5 => buf.global_invert = on,
        7 => buf.wraparound = on,
        other => {
            tracing::debug!(mode = other, on, "unsupported DEC private mode");
        }
    }
}
