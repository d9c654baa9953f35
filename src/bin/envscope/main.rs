//! envscope - play an automated envelope from the terminal
//!
//! Run with: cargo run --bin envscope
//! Logs go to envscope.log; set RUST_LOG=debug for parameter traffic.

mod app;
mod ui;

use std::{fs::File, sync::Mutex};

use saavy_automation::patch::EnvelopeSettings;
use tracing_subscriber::EnvFilter;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // The terminal belongs to the UI, so logs go to a file
    let log_file = File::create("envscope.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let settings = EnvelopeSettings::adsr(0.05, 0.2, 0.6, 0.4)
        .with_max_voices(8)
        .with_velocity_sensitivity(0.5);

    app::Envscope::new(settings).run()
}
