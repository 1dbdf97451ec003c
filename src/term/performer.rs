// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The [`vte::Perform`] implementation: routes parser dispatches to the
//! operation modules.
//!
//! The performer is transient, created per `consume` call with a mutable
//! view of the buffer, so all durable state (pen, tab stops, modes) lives on
//! [`TermBuffer`] and survives across calls. Replies to device queries
//! accumulate in `reply` and are handed back to the caller, never into the
//! viewer fan-out.
//!
//! Dispatch routing:
//!
//! | Sequence type | Pattern         | Method           |
//! |---------------|-----------------|------------------|
//! | Printable     | regular chars   | `print()`        |
//! | Control       | C0 bytes        | `execute()`      |
//! | CSI           | `ESC [ ... f`   | `csi_dispatch()` |
//! | OSC           | `ESC ] ... ST`  | `osc_dispatch()` |
//! | ESC           | `ESC f`         | `esc_dispatch()` |
//! | DCS           | `ESC P ... ST`  | `hook()` (ignored) |

use vte::{Params, Perform};

use super::buffer::TermBuffer;
use super::operations::{char_ops, cursor_ops, device_ops, line_ops, mode_ops, sgr_ops,
                        tab_ops};

pub(crate) struct Performer<'a> {
    pub buf: &'a mut TermBuffer,
    pub reply: Vec<u8>,
}

impl<'a> Performer<'a> {
    pub fn new(buf: &'a mut TermBuffer) -> Performer<'a> {
        Performer {
            buf,
            reply: Vec::new(),
        }
    }
}

/// First subparameter of parameter `index`, or `default` when the parameter
/// is missing or zero. Motion and count opcodes treat 0 as 1.
fn param_or(params: &Params, index: usize, default: usize) -> usize {
    let value = params
        .iter()
        .nth(index)
        .and_then(|p| p.first())
        .copied()
        .unwrap_or(0);
    if value == 0 { default } else { value as usize }
}

/// Like [`param_or`] but 0 is meaningful (ED/EL/TBC selectors).
fn param_raw(params: &Params, index: usize) -> usize {
    params
        .iter()
        .nth(index)
        .and_then(|p| p.first())
        .copied()
        .unwrap_or(0) as usize
}

impl Perform for Performer<'_> {
    fn print(&mut self, ch: char) { char_ops::print(self.buf, ch); }

    fn execute(&mut self, byte: u8) {
        match byte {
            0x08 => cursor_ops::backspace(self.buf),
            0x09 => cursor_ops::horizontal_tab(self.buf),
            0x0A => cursor_ops::line_feed(self.buf),
            0x0B => cursor_ops::vertical_tab(self.buf),
            0x0D => cursor_ops::carriage_return(self.buf),
            // BEL and the rest of C0 are deliberate no-ops.
            _ => {}
        }
    }

    fn csi_dispatch(
        &mut self,
        params: &Params,
        intermediates: &[u8],
        ignore: bool,
        action: char,
    ) {
        if ignore {
            tracing::debug!(action = %action, "CSI: parameter overflow, sequence dropped");
            return;
        }

        let private = intermediates.contains(&b'?');
        if private {
            match action {
                'h' | 'l' => {
                    let on = action == 'h';
                    for param in params.iter() {
                        let mode = param.first().copied().unwrap_or(0) as usize;
                        mode_ops::set_private_mode(self.buf, mode, on);
                    }
                }
                other => {
                    tracing::debug!(action = %other, "CSI: unsupported private sequence");
                }
            }
            return;
        }

        match action {
            'A' => cursor_ops::up(self.buf, param_or(params, 0, 1)),
            'B' => cursor_ops::down(self.buf, param_or(params, 0, 1)),
            'C' => cursor_ops::forward(self.buf, param_or(params, 0, 1)),
            'D' => cursor_ops::back(self.buf, param_or(params, 0, 1)),
            'E' => cursor_ops::next_line(self.buf, param_or(params, 0, 1)),
            'G' => cursor_ops::set_column(self.buf, param_or(params, 0, 1)),
            'd' => cursor_ops::set_row(self.buf, param_or(params, 0, 1)),
            'H' | 'f' => cursor_ops::set_position(
                self.buf,
                param_or(params, 0, 1),
                param_or(params, 1, 1),
            ),
            'J' => line_ops::erase_display(self.buf, param_raw(params, 0)),
            'K' => line_ops::erase_line(self.buf, param_raw(params, 0)),
            'L' => line_ops::insert_lines(self.buf, param_or(params, 0, 1)),
            'M' => line_ops::delete_lines(self.buf, param_or(params, 0, 1)),
            '@' => char_ops::insert_blanks(self.buf, param_or(params, 0, 1)),
            'P' => char_ops::delete_chars(self.buf, param_or(params, 0, 1)),
            'X' => char_ops::erase_chars(self.buf, param_or(params, 0, 1)),
            'b' => char_ops::repeat_last(self.buf, param_or(params, 0, 1)),
            'm' => sgr_ops::process(self.buf, params),
            'n' => device_ops::device_status_report(
                self.buf,
                param_raw(params, 0),
                &mut self.reply,
            ),
            'c' => device_ops::device_attributes(&mut self.reply),
            'g' => tab_ops::clear_tabs(self.buf, param_raw(params, 0)),
            'Y' => cursor_ops::vertical_tab(self.buf),
            // ANSI (non-private) mode set/reset: nothing supported.
            'h' | 'l' => {
                tracing::debug!(action = %action, "CSI: ANSI mode set/reset ignored");
            }
            other => {
                tracing::debug!(action = %other, "CSI: unsupported final byte, sequence dropped");
            }
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        if !intermediates.is_empty() {
            // `ESC (` / `ESC )` charset designation: G0/G1 sets other than
            // UTF-8 are out of scope, consume silently.
            return;
        }
        match byte {
            b'D' => cursor_ops::index(self.buf),
            b'E' => {
                cursor_ops::index(self.buf);
                self.buf.cursor.x = 0;
            }
            b'M' => cursor_ops::reverse_index(self.buf),
            b'H' => tab_ops::set_h_tab_at_cursor(self.buf),
            b'J' => tab_ops::set_v_tab_at_cursor(self.buf),
            // ST after an aborted string sequence.
            b'\\' => {}
            other => {
                tracing::debug!(byte = other, "ESC: unsupported sequence, treated as no-op");
            }
        }
    }

    fn osc_dispatch(&mut self, params: &[&[u8]], _bell_terminated: bool) {
        // Title / palette OSC payloads are not honored; the only requirement
        // is to leave the sequence cleanly, which vte guarantees.
        tracing::trace!(params = params.len(), "OSC: payload discarded");
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _action: char) {
        tracing::trace!("DCS: entered, payload will be discarded");
    }

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}
}
