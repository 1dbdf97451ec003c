// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The `termcam` daemon: load config, build the pipeline, run until SIGINT
//! or SIGTERM, exit 0 on a clean stop and non-zero on an init failure.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use termcam::config::Config;
use termcam::net::{HttpServer, Hub, SshServer, TelnetServer, ssh, tls_acceptor};
use termcam::pty::PtySupervisor;
use termcam::render::{FontSet, FrameSource, RenderGate};
use termcam::term::TerminalEmulator;

#[derive(Debug, Parser)]
#[command(
    name = "termcam",
    version,
    about = "Publish a terminal program as images over HTTP(S) and as telnet/SSH sessions"
)]
struct Cli {
    /// Configuration file (YAML).
    #[arg(short = 'c', long = "config")]
    config: std::path::PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,

    /// Log everything to the screen regardless of the configured level.
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)
        .wrap_err_with(|| format!("loading {}", cli.config.display()))?;
    if cli.verbose {
        config.logging.loglevel_screen = "debug".to_string();
    }
    if cli.check {
        println!("{} is valid", cli.config.display());
        return Ok(());
    }

    // Daemonize before the runtime exists; forking a running tokio runtime
    // is not sound.
    if config.fork {
        nix::unistd::daemon(true, false).into_diagnostic().wrap_err("daemonizing")?;
    }

    let _log_guard = termcam::logging::init(&config.logging)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?
        .block_on(run(config))
}

async fn run(config: Config) -> miette::Result<()> {
    // Fatal-at-startup resources first: fonts, listeners, keys.
    let fonts = Arc::new(FontSet::load(&config.font_files, config.font_height)?);

    let stop = CancellationToken::new();
    let emulator = Arc::new(Mutex::new(TerminalEmulator::new(
        config.width,
        config.height,
    )));
    let gate = Arc::new(RenderGate::new(stop.clone()));
    let (hub, keystrokes) = Hub::new(config.ignore_keypresses);
    let frames = Arc::new(FrameSource::new(
        emulator.clone(),
        gate.clone(),
        fonts,
        config.compression_level,
        config.max_wait(),
    ));

    let mut tasks: Vec<tokio::task::JoinHandle<()>> = Vec::new();

    // HTTP.
    if config.http_port != 0 {
        let listener = bind(&config.http_addr, config.http_port).await?;
        let server = Arc::new(HttpServer::new(listener, None, frames.clone(), stop.clone()));
        tasks.push(tokio::spawn(server.run()));
    }

    // HTTPS: same handler, TLS-wrapped sockets. Key and certificate
    // presence was validated with the config.
    if config.https_port != 0 {
        if let (Some(key), Some(cert)) = (&config.https_key, &config.https_certificate) {
            let acceptor = tls_acceptor(key, cert)?;
            let listener = bind(&config.http_addr, config.https_port).await?;
            let server = Arc::new(HttpServer::new(
                listener,
                Some(acceptor),
                frames.clone(),
                stop.clone(),
            ));
            tasks.push(tokio::spawn(server.run()));
        }
    }

    // Telnet.
    if config.telnet_port != 0 {
        let listener = bind(&config.telnet_addr, config.telnet_port).await?;
        let server = Arc::new(TelnetServer::new(
            listener,
            hub.clone(),
            frames.clone(),
            stop.clone(),
            config.dumb_telnet,
            config.telnet_workarounds,
        ));
        tasks.push(tokio::spawn(server.run()));
    }

    // SSH. The key directory was validated with the config.
    if config.ssh_port != 0 {
        if let Some(keys_dir) = &config.ssh_keys {
            let ssh_config = Arc::new(ssh::server_config(keys_dir)?);
            let addr = socket_addr(&config.ssh_addr, config.ssh_port)?;
            let server = SshServer::new(
                hub.clone(),
                frames.clone(),
                stop.clone(),
                config.dumb_telnet,
            );
            tasks.push(tokio::spawn(server.run(ssh_config, addr)));
        }
    }

    // The child itself.
    let supervisor = PtySupervisor::new(
        &config,
        emulator,
        gate,
        hub,
        keystrokes,
        stop.clone(),
    );
    tasks.push(tokio::spawn(supervisor.run()));

    tracing::info!(command = %config.exec_command, "termcam running");

    // Wait for SIGINT/SIGTERM or an internally triggered stop (child gone
    // with restarts disabled).
    wait_for_shutdown(&stop).await;
    stop.cancel();

    for task in tasks {
        let _ = task.await;
    }
    tracing::info!("clean shutdown");
    Ok(())
}

async fn wait_for_shutdown(stop: &CancellationToken) {
    let mut sigterm =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(error) => {
                tracing::error!(%error, "cannot install SIGTERM handler");
                stop.cancelled().await;
                return;
            }
        };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                tracing::error!(%error, "cannot wait for SIGINT");
            }
            tracing::info!("SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            tracing::info!("SIGTERM, shutting down");
        }
        () = stop.cancelled() => {
            tracing::info!("internal stop, shutting down");
        }
    }
}

async fn bind(addr: &str, port: u16) -> miette::Result<TcpListener> {
    let socket_addr = socket_addr(addr, port)?;
    TcpListener::bind(socket_addr)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("binding {socket_addr}"))
}

fn socket_addr(addr: &str, port: u16) -> miette::Result<SocketAddr> {
    let ip: IpAddr = addr
        .parse()
        .into_diagnostic()
        .wrap_err_with(|| format!("\"{addr}\" is not an IP address"))?;
    Ok(SocketAddr::new(ip, port))
}
