// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Network surfaces: the fan-out hub, the HTTP/HTTPS frame server, and the
//! telnet/SSH character-stream sessions.

pub mod auth;
pub mod http;
pub mod hub;
pub mod ssh;
pub mod stream;
pub mod telnet;

pub use http::HttpServer;
pub use hub::{Hub, ViewerQueue};
pub use ssh::SshServer;
pub use stream::{NetStream, tls_acceptor};
pub use telnet::TelnetServer;
