// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Transport abstraction for connection handlers.
//!
//! A handler gets a [`NetStream`], plain TCP or TLS-wrapped TCP, and uses
//! the same two operations on either: `send` (write-all) and `read`. The
//! variant is chosen at accept time by the listener; handlers never branch
//! on it.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::server::TlsStream;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TlsSetupError {
    #[error("cannot read {what} file {path}: {source}")]
    Io {
        what: &'static str,
        path: String,
        source: std::io::Error,
    },

    #[error("no private key found in {path}")]
    NoKey { path: String },

    #[error("TLS configuration rejected: {0}")]
    Rustls(#[from] tokio_rustls::rustls::Error),
}

pub enum NetStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl std::fmt::Debug for NetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetStream::Plain(_) => f.write_str("NetStream::Plain"),
            NetStream::Tls(_) => f.write_str("NetStream::Tls"),
        }
    }
}

impl NetStream {
    /// Write the whole buffer or fail.
    pub async fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            NetStream::Plain(s) => s.write_all(bytes).await,
            NetStream::Tls(s) => s.write_all(bytes).await,
        }
    }

    /// Read up to `buf.len()` bytes; 0 means the peer closed.
    pub async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            NetStream::Plain(s) => s.read(buf).await,
            NetStream::Tls(s) => s.read(buf).await,
        }
    }

    pub async fn flush(&mut self) -> std::io::Result<()> {
        match self {
            NetStream::Plain(s) => s.flush().await,
            NetStream::Tls(s) => s.flush().await,
        }
    }
}

/// Build the TLS acceptor from PEM key + certificate files. Fatal at
/// startup when the files are unreadable or inconsistent.
pub fn tls_acceptor(key_path: &Path, cert_path: &Path) -> Result<TlsAcceptor, TlsSetupError> {
    // The ring provider backs every TLS socket; installing twice (tests) is
    // harmless.
    let _ = tokio_rustls::rustls::crypto::ring::default_provider().install_default();

    let certs = {
        let file = std::fs::File::open(cert_path).map_err(|source| TlsSetupError::Io {
            what: "certificate",
            path: cert_path.display().to_string(),
            source,
        })?;
        let mut reader = std::io::BufReader::new(file);
        rustls_pemfile::certs(&mut reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| TlsSetupError::Io {
                what: "certificate",
                path: cert_path.display().to_string(),
                source,
            })?
    };

    let key = {
        let file = std::fs::File::open(key_path).map_err(|source| TlsSetupError::Io {
            what: "key",
            path: key_path.display().to_string(),
            source,
        })?;
        let mut reader = std::io::BufReader::new(file);
        rustls_pemfile::private_key(&mut reader)
            .map_err(|source| TlsSetupError::Io {
                what: "key",
                path: key_path.display().to_string(),
                source,
            })?
            .ok_or_else(|| TlsSetupError::NoKey {
                path: key_path.display().to_string(),
            })?
    };

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
