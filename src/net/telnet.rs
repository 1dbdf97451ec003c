// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Telnet viewer sessions.
//!
//! On accept: the canonical option negotiation block, then a full-screen
//! repaint so the newcomer sees the current screen, then the viewer loop.
//! "Smart" mode relays the fan-out queue verbatim (the remote terminal
//! interprets the same ANSI the child produced). "Dumb" mode instead
//! discards the queued bytes on every wake and sends a fresh repaint
//! (coalescing any number of pending chunks into one redraw) for clients
//! that cannot keep up with raw control-sequence streams.
//!
//! Keyboard input flows back to the child unless `ignore-keypresses` is
//! set, after stripping telnet IAC command sequences (RFC 854/855), and
//! optionally NUL bytes ("telnet workarounds" for clients that pad line
//! ends).

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::net::hub::Hub;
use crate::render::FrameSource;
use crate::term::replay;

/// IAC WONT AUTH, IAC WILL SUPPRESS-GA, IAC DONT LINEMODE, IAC DONT
/// NEW-ENVIRON, IAC WILL ECHO, IAC DONT ECHO, IAC DO TIMING-MARK.
const NEGOTIATION: &[u8] = &[
    0xFF, 0xFC, 0x25, //
    0xFF, 0xFB, 0x03, //
    0xFF, 0xFE, 0x22, //
    0xFF, 0xFE, 0x27, //
    0xFF, 0xFB, 0x01, //
    0xFF, 0xFE, 0x01, //
    0xFF, 0xFD, 0x2D, //
];

/// Strips telnet command sequences from the keyboard byte stream.
///
/// `IAC <cmd> <opt>` is three bytes to drop, `IAC IAC` is an escaped data
/// byte 0xFF, and `IAC SB ... SE` subnegotiation is dropped wholesale.
#[derive(Debug, Default)]
pub(crate) struct IacFilter {
    state: FilterState,
    drop_nulls: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum FilterState {
    #[default]
    Ground,
    AfterIac,
    SkipOption,
    Subnegotiation,
}

impl IacFilter {
    pub(crate) fn new(drop_nulls: bool) -> IacFilter {
        IacFilter {
            state: FilterState::Ground,
            drop_nulls,
        }
    }

    /// Filter `input`, appending surviving data bytes to `out`. The state
    /// carries across calls, so sequences split over reads stay intact.
    pub(crate) fn filter(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &byte in input {
            match self.state {
                FilterState::Ground => match byte {
                    0xFF => self.state = FilterState::AfterIac,
                    0x00 if self.drop_nulls => {}
                    _ => out.push(byte),
                },
                FilterState::AfterIac => match byte {
                    // Escaped data byte.
                    0xFF => {
                        out.push(0xFF);
                        self.state = FilterState::Ground;
                    }
                    // SB: subnegotiation until SE.
                    0xFA => self.state = FilterState::Subnegotiation,
                    // WILL/WONT/DO/DONT and friends carry one option byte.
                    _ => self.state = FilterState::SkipOption,
                },
                FilterState::SkipOption => self.state = FilterState::Ground,
                FilterState::Subnegotiation => {
                    if byte == 0xF0 {
                        self.state = FilterState::Ground;
                    }
                }
            }
        }
    }
}

pub struct TelnetServer {
    listener: TcpListener,
    hub: Arc<Hub>,
    frames: Arc<FrameSource>,
    stop: CancellationToken,
    dumb_mode: bool,
    workarounds: bool,
}

impl TelnetServer {
    #[must_use]
    pub fn new(
        listener: TcpListener,
        hub: Arc<Hub>,
        frames: Arc<FrameSource>,
        stop: CancellationToken,
        dumb_mode: bool,
        workarounds: bool,
    ) -> TelnetServer {
        TelnetServer {
            listener,
            hub,
            frames,
            stop,
            dumb_mode,
            workarounds,
        }
    }

    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            addr = %self.listener.local_addr().map(|a| a.to_string()).unwrap_or_default(),
            "telnet server listening"
        );

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                () = self.stop.cancelled() => break,
            };

            match accepted {
                Ok((socket, peer)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        tracing::info!(%peer, "telnet viewer connected");
                        if let Err(error) = server.session(socket, &peer.to_string()).await {
                            tracing::debug!(%peer, %error, "telnet session error");
                        }
                        tracing::info!(%peer, "telnet viewer disconnected");
                    });
                }
                Err(error) => tracing::warn!(%error, "telnet accept failed"),
            }
        }
        tracing::debug!("telnet accept loop exited");
    }

    async fn session(&self, socket: TcpStream, peer: &str) -> std::io::Result<()> {
        let (mut reader, mut writer) = socket.into_split();

        writer.write_all(NEGOTIATION).await?;
        writer
            .write_all(&replay::full_redraw(&self.frames.screen_snapshot()))
            .await?;
        writer.flush().await?;

        let viewer_id = format!("telnet:{peer}");
        let queue = self.hub.register(&viewer_id);

        let mut iac = IacFilter::new(self.workarounds);
        let mut input = [0u8; 1024];

        let result = loop {
            tokio::select! {
                chunk = queue.recv(&self.stop) => {
                    let Some(chunk) = chunk else { break Ok(()) };
                    if self.dumb_mode {
                        // Coalesce: whatever else queued up is covered by
                        // one repaint.
                        queue.drain();
                        let redraw = replay::full_redraw(&self.frames.screen_snapshot());
                        if let Err(error) = writer.write_all(&redraw).await {
                            break Err(error);
                        }
                    } else if let Err(error) = writer.write_all(&chunk).await {
                        break Err(error);
                    }
                }
                read = reader.read(&mut input) => {
                    match read {
                        Ok(0) => break Ok(()),
                        Ok(n) => {
                            let mut keys = Vec::with_capacity(n);
                            iac.filter(&input[..n], &mut keys);
                            self.hub.send_keys(keys);
                        }
                        Err(error) => break Err(error),
                    }
                }
            }
        };

        self.hub.unregister(&viewer_id);
        result
    }
}
