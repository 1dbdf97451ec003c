// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! PAM password check for SSH viewers.
//!
//! PAM conversations are blocking and the handle is not `Send`, so the
//! whole check (construct, authenticate, drop) runs on the blocking
//! thread pool.

/// PAM service consulted for SSH passwords.
pub const PAM_SERVICE: &str = "common-auth";

/// `true` when `user`/`password` pass the PAM `common-auth` stack.
pub async fn check_password(user: &str, password: &str) -> bool {
    let user = user.to_string();
    let password = password.to_string();

    let result = tokio::task::spawn_blocking(move || {
        let mut authenticator = match pam::Authenticator::with_password(PAM_SERVICE) {
            Ok(authenticator) => authenticator,
            Err(error) => {
                tracing::error!(%error, service = PAM_SERVICE, "cannot open PAM service");
                return false;
            }
        };
        authenticator
            .get_handler()
            .set_credentials(user.as_str(), password.as_str());
        match authenticator.authenticate() {
            Ok(()) => true,
            Err(error) => {
                tracing::info!(%error, user, "PAM rejected password");
                false
            }
        }
    })
    .await;

    result.unwrap_or(false)
}
