#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dengue watch API server binary.
//!
//! Pass `--interactive` to be prompted for the bind address, port, and a
//! missing weather API key before starting.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if std::env::args().any(|arg| arg == "--interactive") {
        pretty_env_logger::init_custom_env("RUST_LOG");
        return dengue_watch_server::interactive::run().await;
    }

    dengue_watch_server::run_server().await
}
