// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The PTY supervisor: spawn the child on a sized pseudo-terminal, pump its
//! output into the parser and the fan-out hub, write replies and viewer
//! keystrokes back, and respawn on exit per the restart policy.
//!
//! ```text
//!   child stdout/stderr ── pty master ── reader thread ── mpsc ──┐
//!                                                                v
//!                                              supervisor task (async)
//!                                              |  parser -> buffer -> gate
//!                                              |  hub.broadcast(chunk)
//!                                              |  DSR/DA replies ─┐
//!   viewer keystrokes ── hub channel ──────────┘                  |
//!                                             pty master <── writes
//! ```
//!
//! The PTY read is blocking, so each child gets a dedicated reader thread
//! bridged into the async supervisor through a channel; everything else is
//! tasks. On child exit: restart after `restart-interval` seconds, or, when
//! the interval is negative, cancel the whole process (a finished child
//! means the show is over).

use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use portable_pty::{CommandBuilder, PtySize, native_pty_system};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::net::hub::Hub;
use crate::render::RenderGate;
use crate::term::TerminalEmulator;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PtyError {
    #[error("exec-command is empty")]
    EmptyCommand,

    #[error("cannot open pty: {0}")]
    Open(#[source] anyhow::Error),

    #[error("cannot spawn {command}: {source}")]
    Spawn {
        command: String,
        source: anyhow::Error,
    },
}

pub struct PtySupervisor {
    emulator: Arc<Mutex<TerminalEmulator>>,
    gate: Arc<RenderGate>,
    hub: Arc<Hub>,
    keystrokes: mpsc::UnboundedReceiver<Vec<u8>>,
    stop: CancellationToken,

    command: String,
    directory: Option<String>,
    width: u16,
    height: u16,
    restart_interval: i64,
    stderr_to_stdout: bool,
    local_output: bool,
}

struct ChildHandles {
    pid: Option<u32>,
    output: mpsc::Receiver<Vec<u8>>,
    writer: Box<dyn Write + Send>,
    killer: Box<dyn portable_pty::ChildKiller + Send + Sync>,
}

impl PtySupervisor {
    #[must_use]
    pub fn new(
        config: &Config,
        emulator: Arc<Mutex<TerminalEmulator>>,
        gate: Arc<RenderGate>,
        hub: Arc<Hub>,
        keystrokes: mpsc::UnboundedReceiver<Vec<u8>>,
        stop: CancellationToken,
    ) -> PtySupervisor {
        PtySupervisor {
            emulator,
            gate,
            hub,
            keystrokes,
            stop,
            command: config.exec_command.clone(),
            directory: config.directory.clone(),
            width: config.width as u16,
            height: config.height as u16,
            restart_interval: config.restart_interval,
            stderr_to_stdout: config.stderr_to_stdout,
            local_output: config.local_output,
        }
    }

    /// Spawn / supervise until stop. Sets the stop flag itself when the
    /// child exits and restarting is disabled.
    pub async fn run(mut self) {
        loop {
            if self.stop.is_cancelled() {
                break;
            }

            let mut child = match self.spawn_child() {
                Ok(child) => child,
                Err(error) => {
                    tracing::error!(%error, "cannot start child, stopping");
                    self.stop.cancel();
                    break;
                }
            };
            tracing::info!(command = %self.command, pid = ?child.pid, "child started");

            self.pump(&mut child).await;

            if self.stop.is_cancelled() {
                let _ = child.killer.kill();
                break;
            }

            if self.restart_interval < 0 {
                tracing::info!("child exited, restart disabled, stopping");
                self.stop.cancel();
                break;
            }

            tracing::info!(
                seconds = self.restart_interval,
                "child exited, restarting after interval"
            );
            tokio::select! {
                () = tokio::time::sleep(Duration::from_secs(self.restart_interval as u64)) => {}
                () = self.stop.cancelled() => break,
            }
        }
        tracing::debug!("PTY supervisor exited");
    }

    /// Relay loop for one child lifetime; returns when the child's output
    /// stream ends or stop fires.
    async fn pump(&mut self, child: &mut ChildHandles) {
        loop {
            tokio::select! {
                chunk = child.output.recv() => {
                    let Some(chunk) = chunk else { break };
                    if chunk.is_empty() {
                        continue;
                    }

                    // Parser first, so a frame rendered right after the
                    // gate bump reflects this chunk.
                    let reply = {
                        let mut emulator =
                            self.emulator.lock().expect("emulator lock poisoned");
                        emulator.consume(&chunk)
                    };
                    self.gate.notify_update();

                    if let Some(reply) = reply {
                        if let Err(error) = child.writer.write_all(&reply) {
                            tracing::warn!(%error, "cannot write device reply to pty");
                        }
                    }

                    if self.local_output {
                        let mut stdout = std::io::stdout().lock();
                        let _ = stdout.write_all(&chunk);
                        let _ = stdout.flush();
                    }

                    self.hub.broadcast(&Bytes::from(chunk));
                }
                keys = self.keystrokes.recv() => {
                    let Some(keys) = keys else { break };
                    if let Err(error) = child.writer.write_all(&keys) {
                        tracing::warn!(%error, "cannot write keystrokes to pty");
                    } else {
                        let _ = child.writer.flush();
                    }
                }
                () = self.stop.cancelled() => break,
            }
        }
    }

    fn spawn_child(&self) -> Result<ChildHandles, PtyError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: self.height,
                cols: self.width,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(PtyError::Open)?;

        let mut cmd = self.command_builder()?;
        cmd.env("COLUMNS", self.width.to_string());
        cmd.env("LINES", self.height.to_string());
        cmd.env("TERM", "ansi");
        if let Some(directory) = &self.directory {
            cmd.cwd(directory);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|source| PtyError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        // The slave side lives in the child now.
        drop(pair.slave);

        let reader = pair.master.try_clone_reader().map_err(PtyError::Open)?;
        let writer = pair.master.take_writer().map_err(PtyError::Open)?;
        let pid = child.process_id();
        let killer = child.clone_killer();

        // Keep the master alive for the lifetime of the reader thread; the
        // thread owns it together with the child handle so `wait` reaps the
        // process after EOF.
        let (tx, rx) = mpsc::channel::<Vec<u8>>(64);
        std::thread::Builder::new()
            .name("pty-reader".to_string())
            .spawn(move || {
                let master = pair.master;
                let mut child = child;
                let mut reader = reader;
                let mut buf = [0u8; 4096];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if tx.blocking_send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                    }
                }
                drop(master);
                match child.wait() {
                    Ok(status) => tracing::info!(%status, "child exited"),
                    Err(error) => tracing::warn!(%error, "cannot reap child"),
                }
            })
            .map_err(|source| PtyError::Open(source.into()))?;

        Ok(ChildHandles {
            pid,
            output: rx,
            writer,
            killer,
        })
    }

    /// Whitespace-split argv; no shell quoting. With
    /// `stderr-to-stdout` off the command is wrapped in a shell that sends
    /// stderr to /dev/null (the PTY has no separate stderr channel to
    /// redirect).
    fn command_builder(&self) -> Result<CommandBuilder, PtyError> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or(PtyError::EmptyCommand)?;

        if self.stderr_to_stdout {
            let mut cmd = CommandBuilder::new(program);
            cmd.args(parts);
            Ok(cmd)
        } else {
            let script = format!("exec {} 2>/dev/null", self.command);
            let mut cmd = CommandBuilder::new("/bin/sh");
            cmd.args(["-c", script.as_str()]);
            Ok(cmd)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::minimal_config;

    fn supervisor_for(command: &str, restart_interval: i64) -> PtySupervisor {
        let mut config = minimal_config();
        config.exec_command = command.to_string();
        config.restart_interval = restart_interval;
        config.width = 40;
        config.height = 10;

        let emulator = Arc::new(Mutex::new(TerminalEmulator::new(40, 10)));
        let stop = CancellationToken::new();
        let gate = Arc::new(RenderGate::new(stop.clone()));
        let (hub, keystrokes) = Hub::new(false);
        PtySupervisor::new(&config, emulator, gate, hub, keystrokes, stop)
    }

    #[tokio::test]
    async fn child_output_reaches_emulator_and_gate() {
        let supervisor = supervisor_for("/bin/echo term-says-hi", -1);
        let emulator = supervisor.emulator.clone();
        let gate = supervisor.gate.clone();
        let stop = supervisor.stop.clone();

        supervisor.run().await;

        // Restart disabled: the supervisor cancelled the token on exit.
        assert!(stop.is_cancelled());
        assert!(gate.latest() > 0);
        let text = emulator.lock().unwrap().buffer().row_text(0);
        assert!(text.contains("term-says-hi"), "row 0 was: {text:?}");
    }

    #[tokio::test]
    async fn child_sees_terminal_environment() {
        // The stderr-to-/dev/null wrapper goes through a shell, which also
        // lets the child expand the injected variables.
        let mut supervisor = supervisor_for("echo $TERM:$COLUMNS:$LINES", -1);
        supervisor.stderr_to_stdout = false;
        let emulator = supervisor.emulator.clone();

        supervisor.run().await;

        let screen = emulator.lock().unwrap().buffer().row_text(0);
        assert!(screen.contains("ansi:40:10"), "row 0 was: {screen:?}");
    }

    #[tokio::test]
    async fn spawn_failure_cancels_stop_flag() {
        let supervisor = supervisor_for("/definitely/not/a/binary", -1);
        let stop = supervisor.stop.clone();
        supervisor.run().await;
        assert!(stop.is_cancelled());
    }

    #[test]
    fn empty_command_is_an_error() {
        let supervisor = supervisor_for("", -1);
        assert!(matches!(
            supervisor.command_builder(),
            Err(PtyError::EmptyCommand)
        ));
    }
}
