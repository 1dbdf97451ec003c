// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! SSH viewer sessions.
//!
//! Same viewer semantics as telnet (initial repaint, smart/dumb relay,
//! keystroke forwarding) behind an SSH transport. Key exchange and the
//! wire protocol belong to `russh`; the only accepted authentication is a
//! password checked against PAM. The host key is the RSA key in the
//! configured `ssh-keys` directory.
//!
//! Per connection, `russh` drives a [`SshHandler`]: password auth captures
//! the username (it becomes part of the viewer id), the `shell` request
//! starts the relay task, and channel close / EOF tears it down.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use russh::server::{Auth, Config, Handler, Msg, Server, Session};
use russh::{Channel, ChannelId, CryptoVec};
use tokio_util::sync::CancellationToken;

use crate::net::auth::check_password;
use crate::net::hub::Hub;
use crate::render::FrameSource;
use crate::term::replay;

pub const HOST_KEY_FILE: &str = "ssh_host_rsa_key";

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum SshSetupError {
    #[error("cannot load SSH host key {path}: {source}")]
    HostKey {
        path: String,
        source: russh::keys::Error,
    },
}

/// Build the server configuration with the host key from
/// `<ssh_keys_dir>/ssh_host_rsa_key`. Fatal at startup on failure.
pub fn server_config(ssh_keys_dir: &Path) -> Result<Config, SshSetupError> {
    let key_path = ssh_keys_dir.join(HOST_KEY_FILE);
    let host_key =
        russh::keys::load_secret_key(&key_path, None).map_err(|source| SshSetupError::HostKey {
            path: key_path.display().to_string(),
            source,
        })?;

    Ok(Config {
        auth_rejection_time: Duration::from_secs(3),
        auth_rejection_time_initial: Some(Duration::ZERO),
        inactivity_timeout: None,
        keys: vec![host_key],
        ..Config::default()
    })
}

pub struct SshServer {
    hub: Arc<Hub>,
    frames: Arc<FrameSource>,
    stop: CancellationToken,
    dumb_mode: bool,
    session_seq: Arc<AtomicU64>,
}

impl SshServer {
    #[must_use]
    pub fn new(
        hub: Arc<Hub>,
        frames: Arc<FrameSource>,
        stop: CancellationToken,
        dumb_mode: bool,
    ) -> SshServer {
        SshServer {
            hub,
            frames,
            stop,
            dumb_mode,
            session_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Accept loop; returns on stop.
    pub async fn run(mut self, config: Arc<Config>, addr: std::net::SocketAddr) {
        tracing::info!(%addr, "SSH server listening");
        let stop = self.stop.clone();
        tokio::select! {
            result = self.run_on_address(config, addr) => {
                if let Err(error) = result {
                    tracing::error!(%error, "SSH server terminated");
                }
            }
            () = stop.cancelled() => {}
        }
        tracing::debug!("SSH accept loop exited");
    }
}

impl Server for SshServer {
    type Handler = SshHandler;

    fn new_client(&mut self, peer: Option<std::net::SocketAddr>) -> SshHandler {
        let seq = self.session_seq.fetch_add(1, Ordering::Relaxed);
        tracing::info!(peer = ?peer, seq, "SSH connection accepted");
        SshHandler {
            hub: self.hub.clone(),
            frames: self.frames.clone(),
            stop: self.stop.clone(),
            dumb_mode: self.dumb_mode,
            seq,
            username: None,
            viewer: None,
        }
    }
}

/// Relay state for one authenticated session channel.
struct ViewerTask {
    id: String,
    cancel: CancellationToken,
}

pub struct SshHandler {
    hub: Arc<Hub>,
    frames: Arc<FrameSource>,
    stop: CancellationToken,
    dumb_mode: bool,
    seq: u64,
    username: Option<String>,
    viewer: Option<ViewerTask>,
}

impl SshHandler {
    fn stop_viewer(&mut self) {
        if let Some(viewer) = self.viewer.take() {
            viewer.cancel.cancel();
            self.hub.unregister(&viewer.id);
        }
    }
}

impl Drop for SshHandler {
    fn drop(&mut self) { self.stop_viewer(); }
}

#[async_trait::async_trait]
impl Handler for SshHandler {
    type Error = russh::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        if check_password(user, password).await {
            tracing::info!(user, "SSH password accepted");
            self.username = Some(user.to_string());
            Ok(Auth::Accept)
        } else {
            tracing::warn!(user, "SSH password rejected");
            Ok(Auth::Reject {
                proceed_with_methods: None,
            })
        }
    }

    async fn channel_open_session(
        &mut self,
        _channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        _term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(russh::Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        // The screen has a fixed size; the client's requested geometry is
        // acknowledged and ignored.
        session.channel_success(channel)?;
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel)?;

        let user = self.username.as_deref().unwrap_or("unknown");
        let viewer_id = format!("ssh:{user}#{}", self.seq);
        let queue = self.hub.register(&viewer_id);
        let cancel = self.stop.child_token();
        self.viewer = Some(ViewerTask {
            id: viewer_id.clone(),
            cancel: cancel.clone(),
        });

        let handle = session.handle();
        let frames = self.frames.clone();
        let dumb_mode = self.dumb_mode;

        tokio::spawn(async move {
            // Initial screen replay, then the relay loop.
            let redraw = replay::full_redraw(&frames.screen_snapshot());
            if handle
                .data(channel, CryptoVec::from(redraw))
                .await
                .is_err()
            {
                return;
            }

            while let Some(chunk) = queue.recv(&cancel).await {
                let payload = if dumb_mode {
                    queue.drain();
                    CryptoVec::from(replay::full_redraw(&frames.screen_snapshot()))
                } else {
                    CryptoVec::from(chunk.to_vec())
                };
                if handle.data(channel, payload).await.is_err() {
                    tracing::debug!(viewer = %viewer_id, "SSH channel gone, relay ends");
                    break;
                }
            }
            let _ = handle.close(channel).await;
        });

        Ok(())
    }

    async fn data(
        &mut self,
        _channel: ChannelId,
        data: &[u8],
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.hub.send_keys(data.to_vec());
        Ok(())
    }

    async fn channel_eof(
        &mut self,
        _channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.stop_viewer();
        Ok(())
    }

    async fn channel_close(
        &mut self,
        _channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.stop_viewer();
        Ok(())
    }
}
