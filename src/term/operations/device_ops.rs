// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Device queries that produce replies for the child: DSR and DA.
//!
//! Replies are appended to the performer's reply accumulator; the PTY
//! supervisor writes them back into the PTY master. They are never pushed
//! into viewer queues.

use crate::term::buffer::TermBuffer;

/// CSI `n`: device status report.
///
/// `5` asks "are you ok" (answer: `ESC [ 0 n`), `6` asks for the cursor
/// position (answer: `ESC [ row ; col R`, 1-based).
pub fn device_status_report(buf: &TermBuffer, kind: usize, reply: &mut Vec<u8>) {
    match kind {
        5 => reply.extend_from_slice(b"\x1b[0n"),
        6 => {
            // Clamped like every other cursor read site, so the reply never
            // names a column past the right margin.
            let row = buf.cursor.y.min(buf.height().saturating_sub(1)) + 1;
            let col = buf.cursor.x.min(buf.width().saturating_sub(1)) + 1;
            reply.extend_from_slice(format!("\x1b[{row};{col}R").as_bytes());
        }
        other => tracing::debug!("DSR: unsupported report kind {other}"),
    }
}

/// CSI `c`: device attributes. Identifies as a VT101 with no options.
pub fn device_attributes(reply: &mut Vec<u8>) { reply.extend_from_slice(b"\x1b[?1;0c"); }
