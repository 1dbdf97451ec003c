// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # termcam
//!
//! Attach a long-lived program to a pseudo-terminal and publish its screen:
//!
//! - as rendered images over HTTP/HTTPS: single frames and
//!   `multipart/x-mixed-replace` streams in PNG, JPEG, BMP and TGA;
//! - as live character-stream sessions over telnet and SSH, optionally
//!   forwarding viewer keystrokes back into the child.
//!
//! The crate splits into four layers:
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`term`] | cell buffer, ANSI/VT parser ([`vte`]-driven), palette, screen replay |
//! | [`render`] | render gate, glyph cache, rasterizer, frame encoders |
//! | [`net`] | fan-out hub, HTTP server, telnet and SSH sessions |
//! | [`pty`] | child process supervisor |
//!
//! Data flow: the PTY supervisor reads child output, feeds the parser
//! (which mutates the cell buffer and bumps the render gate) and broadcasts
//! the raw bytes through the hub to every telnet/SSH viewer. HTTP clients
//! sit on the other side of the render gate and pull encoded frames at
//! their own pace.

pub mod config;
pub mod logging;
pub mod net;
pub mod pty;
pub mod render;
pub mod term;

pub use config::{Config, ConfigError};
pub use net::{Hub, HttpServer, SshServer, TelnetServer};
pub use pty::PtySupervisor;
pub use render::{FontSet, FrameSource, ImageFormat, RenderGate};
pub use term::{TermBuffer, TerminalEmulator};
