use std::path::PathBuf;

use anyhow::{Context, Result};
use audience::run_session;
use clap::Parser;
use meeting::{BridgeConnector, MeetingLink};
use robot::{ServoActuatorConnector, ServoBackend, SimulatedServo};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings};

/// Raise a robot hand whenever someone in a meeting raises theirs.
#[derive(Parser, Debug)]
struct Args {
    /// Meeting URL. Invite links and Google Calendar redirects both work.
    url: String,
    /// Turn on debug logs.
    #[arg(long)]
    debug: bool,
    /// Config file (default: ./hand_raiser.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Drive a simulated servo even if a robot is configured.
    #[arg(long)]
    simulate_robot: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let settings = load_settings(args.config.as_deref())?;
    let link = MeetingLink::parse(&args.url)
        .with_context(|| format!("unusable meeting link '{}'", args.url))?;

    let sources = BridgeConnector::new(&settings.bridge_url, settings.bot_name.clone());
    let actuators = ServoActuatorConnector::new(
        servo_backend(&settings, args.simulate_robot),
        settings.servo_geometry(),
    );

    let reason = run_session(
        &link,
        &sources,
        &actuators,
        settings.session_config(),
        shutdown_signal(),
    )
    .await?;
    info!(?reason, "hand_raiser: hand lowered, exiting");
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn servo_backend(settings: &Settings, simulate: bool) -> ServoBackend {
    match (&settings.robot_url, simulate) {
        (Some(base_url), false) => ServoBackend::Http {
            base_url: base_url.clone(),
            secret: settings.robot_secret.clone(),
        },
        (None, false) => {
            warn!("hand_raiser: no robot_url configured, driving a simulated servo");
            ServoBackend::Simulated(SimulatedServo::new())
        }
        (_, true) => ServoBackend::Simulated(SimulatedServo::new()),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = sigterm.recv() => info!("hand_raiser: SIGTERM received"),
                }
            }
            Err(err) => {
                warn!(error = %err, "hand_raiser: cannot listen for SIGTERM");
                ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("hand_raiser: interrupt received"),
        Err(err) => {
            // Without a handler the default SIGINT action still applies.
            warn!(error = %err, "hand_raiser: cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
