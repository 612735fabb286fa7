//! Helpers shared by the integration tests.

#![allow(dead_code)]

pub mod gallery;

use std::net::TcpListener;

use wiremock::MockServer;

/// Set to `1` to fail instead of skipping when the asset host cannot bind.
const REQUIRE_ASSET_HOST_ENV: &str = "ALBUM_DOWNLOADER_REQUIRE_SOCKET_TESTS";

/// True if the mock asset host can bind a localhost socket.
///
/// Panics instead of returning false when the environment demands socket tests.
pub fn asset_host_available() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return true;
    }

    let required = std::env::var(REQUIRE_ASSET_HOST_ENV)
        .is_ok_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
    assert!(
        !required,
        "mock asset host cannot bind 127.0.0.1 and {REQUIRE_ASSET_HOST_ENV} is set"
    );
    eprintln!("skipping album run: no localhost socket for the mock asset host");
    false
}

/// Starts the mock asset host, or returns `None` when it cannot bind.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if asset_host_available() {
        Some(MockServer::start().await)
    } else {
        None
    }
}
