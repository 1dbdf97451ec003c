// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The HTTP/1.0 frame server.
//!
//! One task per accepted connection: read the request head up to
//! `\r\n\r\n`, split the request line, dispatch on the path.
//!
//! | Path | Method | Reply |
//! |------|--------|-------|
//! | `/`, `/index.html` | GET | HTML page embedding `/stream.mjpeg` |
//! | `/frame.{png,jpeg,bmp,tga}` | GET, HEAD | one frame (HEAD = peek, 304 when nothing to show) |
//! | `/stream.m{png,jpeg,bmp,tga}` | GET | `multipart/x-mixed-replace` until disconnect/stop |
//! | anything else | * | 404 |
//!
//! The same handler serves plain TCP and TLS; the listener wraps accepted
//! sockets into [`NetStream`] so the handler cannot tell the difference.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;

use crate::render::{FrameSource, ImageFormat};

use super::stream::NetStream;

const MAX_REQUEST_HEAD: usize = 16 * 1024;
const MULTIPART_BOUNDARY: &str = "myboundary";

const INDEX_HTML: &str = concat!(
    "<!DOCTYPE html>",
    "<html lang=\"en\">",
    "<body>",
    "<img src=\"/stream.mjpeg\">",
    "</body>",
    "</html>"
);

/// Parsed request line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Request {
    pub method: Method,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Head,
}

/// Parse the request head (everything up to the blank line). Returns `None`
/// for anything that is not a well-formed GET/HEAD request line.
pub(crate) fn parse_request(head: &str) -> Option<Request> {
    let request_line = head.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let method = match parts.next()? {
        "GET" => Method::Get,
        "HEAD" => Method::Head,
        _ => return None,
    };
    let path = parts.next()?.to_string();
    // "HTTP/1.x" version token must be present.
    parts.next()?;
    Some(Request { method, path })
}

pub(crate) fn multipart_part_header(format: ImageFormat, len: usize) -> String {
    format!(
        "\r\n--{MULTIPART_BOUNDARY}\r\nContent-Type: {}\r\nContent-Length: {len}\r\n\r\n",
        format.content_type()
    )
}

pub struct HttpServer {
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    frames: Arc<FrameSource>,
    stop: CancellationToken,
    connection_seq: AtomicU64,
}

impl HttpServer {
    #[must_use]
    pub fn new(
        listener: TcpListener,
        tls: Option<TlsAcceptor>,
        frames: Arc<FrameSource>,
        stop: CancellationToken,
    ) -> HttpServer {
        HttpServer {
            listener,
            tls,
            frames,
            stop,
            connection_seq: AtomicU64::new(0),
        }
    }

    /// Accept loop; returns on stop.
    pub async fn run(self: Arc<Self>) {
        let scheme = if self.tls.is_some() { "https" } else { "http" };
        tracing::info!(
            addr = %self.listener.local_addr().map(|a| a.to_string()).unwrap_or_default(),
            scheme,
            "HTTP server listening"
        );

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                () = self.stop.cancelled() => break,
            };

            match accepted {
                Ok((socket, peer)) => {
                    let server = self.clone();
                    let id = self.connection_seq.fetch_add(1, Ordering::Relaxed);
                    tokio::spawn(async move {
                        tracing::debug!(%peer, id, "HTTP connection accepted");
                        server.handle_connection(socket).await;
                        tracing::debug!(%peer, id, "HTTP connection closed");
                    });
                }
                Err(error) => {
                    tracing::warn!(%error, "HTTP accept failed");
                }
            }
        }
        tracing::debug!("HTTP accept loop exited");
    }

    async fn handle_connection(&self, socket: TcpStream) {
        let mut stream = match &self.tls {
            Some(acceptor) => match acceptor.accept(socket).await {
                Ok(tls) => NetStream::Tls(Box::new(tls)),
                Err(error) => {
                    tracing::debug!(%error, "TLS handshake failed");
                    return;
                }
            },
            None => NetStream::Plain(socket),
        };

        let Some(head) = read_request_head(&mut stream, &self.stop).await else {
            return;
        };
        let Some(request) = parse_request(&head) else {
            return;
        };
        tracing::debug!(method = ?request.method, path = %request.path, "HTTP request");

        // Errors past this point are per-connection: log and drop.
        if let Err(error) = self.dispatch(&mut stream, &request).await {
            tracing::debug!(%error, path = %request.path, "HTTP connection error");
        }
        let _ = stream.flush().await;
    }

    async fn dispatch(
        &self,
        stream: &mut NetStream,
        request: &Request,
    ) -> std::io::Result<()> {
        let path = request.path.as_str();

        if path == "/" || path == "/index.html" {
            return self.serve_index(stream, request.method).await;
        }

        if let Some(format) = path
            .strip_prefix("/frame.")
            .and_then(ImageFormat::from_frame_extension)
        {
            return self.serve_frame(stream, request.method, format).await;
        }

        if let Some(format) = path
            .strip_prefix("/stream.")
            .and_then(ImageFormat::from_stream_extension)
        {
            if request.method == Method::Get {
                return self.serve_stream(stream, format).await;
            }
        }

        stream.send(b"HTTP/1.0 404 Not Found\r\n\r\n").await
    }

    async fn serve_index(&self, stream: &mut NetStream, method: Method) -> std::io::Result<()> {
        let header = format!(
            "HTTP/1.0 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n",
            INDEX_HTML.len()
        );
        stream.send(header.as_bytes()).await?;
        if method == Method::Get {
            stream.send(INDEX_HTML.as_bytes()).await?;
        }
        Ok(())
    }

    async fn serve_frame(
        &self,
        stream: &mut NetStream,
        method: Method,
        format: ImageFormat,
    ) -> std::io::Result<()> {
        let peek = method == Method::Head;
        let mut after_ts = 0;

        match self.frames.get_frame(format, &mut after_ts, peek).await {
            Some(bytes) => {
                let header = format!(
                    "HTTP/1.0 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
                    format.content_type(),
                    bytes.len()
                );
                stream.send(header.as_bytes()).await?;
                if method == Method::Get {
                    stream.send(&bytes).await?;
                }
                Ok(())
            }
            None => stream.send(b"HTTP/1.0 304 Not Modified\r\n\r\n").await,
        }
    }

    async fn serve_stream(
        &self,
        stream: &mut NetStream,
        format: ImageFormat,
    ) -> std::io::Result<()> {
        let header = format!(
            "HTTP/1.0 200 OK\r\n\
             Cache-Control: no-cache\r\n\
             Pragma: no-cache\r\n\
             Server: TermCamNG\r\n\
             Expires: Thu, 01 Dec 1994 16:00:00 GMT\r\n\
             Connection: close\r\n\
             Content-Type: multipart/x-mixed-replace; boundary={MULTIPART_BOUNDARY}\r\n\r\n"
        );
        stream.send(header.as_bytes()).await?;

        let mut after_ts = 0;
        while !self.stop.is_cancelled() {
            let Some(bytes) = self.frames.get_frame(format, &mut after_ts, false).await else {
                // Encode failed and the cache is empty: try again on the
                // next gate wake rather than tearing the stream down.
                continue;
            };

            stream
                .send(multipart_part_header(format, bytes.len()).as_bytes())
                .await?;
            stream.send(&bytes).await?;
        }
        Ok(())
    }
}

/// Read until the request head terminator, bounded in size and by stop.
async fn read_request_head(stream: &mut NetStream, stop: &CancellationToken) -> Option<String> {
    let mut head: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];

    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        if head.len() > MAX_REQUEST_HEAD {
            tracing::debug!("request head too large, dropping connection");
            return None;
        }
        let n = tokio::select! {
            n = stream.read(&mut buf) => n.ok()?,
            () = stop.cancelled() => return None,
        };
        if n == 0 {
            return None;
        }
        head.extend_from_slice(&buf[..n]);
    }

    String::from_utf8(head).ok()
}
