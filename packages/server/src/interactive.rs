//! Interactive mode for the server.
//!
//! Prompts for bind address and port, and for the weather API key when it
//! is not already set, before starting the server. Nothing is written back
//! to the process environment.

use dengue_watch_weather::API_KEY_ENV;
use dialoguer::{Confirm, Input, Password};

use crate::{ServerSettings, parse_port};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Environment values (`BIND_ADDR`, `PORT`, `OPENWEATHER_API_KEY`) seed the
/// prompts; the answers are passed to [`super::serve_with`] directly. The
/// logger must already be installed.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Dengue Watch Server");
    println!();

    let defaults = ServerSettings::from_env();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(defaults.bind_addr.clone())
        .interact_text()
        .unwrap_or(defaults.bind_addr);

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default(defaults.port.to_string())
        .interact_text()
        .unwrap_or_else(|_| defaults.port.to_string());

    let weather_key = defaults
        .weather_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            Password::new()
                .with_prompt(format!(
                    "{API_KEY_ENV} is not set. Enter it (leave blank for cached data only)"
                ))
                .allow_empty_password(true)
                .interact()
                .ok()
                .filter(|k| !k.trim().is_empty())
        });

    let settings = ServerSettings {
        bind_addr,
        port: parse_port(Some(&port_str)),
        weather_key,
    };

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{}?",
            settings.bind_addr, settings.port
        ))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::serve_with(settings).await
}
