//! hello-listener: a blocking TCP greeter
//!
//! Accepts one connection at a time, reads a single chunk from the
//! client, logs it, answers with a fixed reply and closes.
//!
//! Features:
//! - Configurable address, backlog, read limit and reply
//! - `send` mode to poke a running listener from the command line
//! - Configuration via CLI arguments or TOML file

mod client;
mod config;
mod listener;
mod message;

use config::{Config, Mode};
use listener::Listener;
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match &config.mode {
        Mode::Serve => run_server(&config),
        Mode::Send { message } => run_send(&config, message),
    }
}

/// Bind and serve until the first I/O error.
fn run_server(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        listen = %config.listen,
        backlog = config.backlog,
        read_limit = config.read_limit,
        reply = %config.reply,
        "Starting hello-listener"
    );

    let listener = Listener::bind(config)?;
    listener.serve_forever()?;
    Ok(())
}

/// Send one message to the configured address and print the reply.
fn run_send(config: &Config, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let reply = client::send(config.listen.as_str(), message.as_bytes())?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&reply)?;
    stdout.write_all(b"\n")?;
    Ok(())
}
