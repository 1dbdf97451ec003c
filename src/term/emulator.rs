// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The terminal emulator facade: `consume(bytes) -> maybe reply`.
//!
//! Owns the `vte` state machine and the cell buffer. Each call feeds a chunk
//! of PTY output through the parser; escape-sequence state (a CSI split
//! across two reads, a half-received UTF-8 character) carries over between
//! calls inside `vte::Parser`. Device-query replies (DSR, DA) are returned
//! to the caller, which writes them back into the PTY.
//!
//! ```text
//! Child process (irssi, htop, ...)
//!         |
//!     PTY master (byte stream)
//!         |
//!     TerminalEmulator::consume()
//!         |            \
//!     TermBuffer     reply bytes -> back into the PTY
//!         |
//!     ScreenSnapshot -> rasterizer / telnet replay
//! ```

use super::buffer::{ScreenSnapshot, TermBuffer};
use super::performer::Performer;

pub struct TerminalEmulator {
    parser: vte::Parser,
    buffer: TermBuffer,
}

impl std::fmt::Debug for TerminalEmulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalEmulator")
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

impl TerminalEmulator {
    #[must_use]
    pub fn new(width: usize, height: usize) -> TerminalEmulator {
        TerminalEmulator {
            parser: vte::Parser::new(),
            buffer: TermBuffer::new(width, height),
        }
    }

    /// Feed one chunk of child output. Returns the bytes to answer to the
    /// child, if the chunk contained a device query. Never fails, never
    /// panics: malformed sequences are dropped by the state machine and
    /// logged by the dispatch layer.
    pub fn consume(&mut self, bytes: &[u8]) -> Option<Vec<u8>> {
        let TerminalEmulator { parser, buffer } = self;
        let mut performer = Performer::new(buffer);
        parser.advance(&mut performer, bytes);

        let reply = std::mem::take(&mut performer.reply);
        if reply.is_empty() { None } else { Some(reply) }
    }

    #[must_use]
    pub fn buffer(&self) -> &TermBuffer { &self.buffer }

    pub fn buffer_mut(&mut self) -> &mut TermBuffer { &mut self.buffer }

    #[must_use]
    pub fn snapshot(&self) -> ScreenSnapshot { self.buffer.snapshot() }
}
