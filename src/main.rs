//! Application entry point for the `serverroom-monitor` daemon.
//!
//! This binary orchestrates the full startup sequence:
//! - Initializing structured logging/tracing
//! - Loading configuration from environment variables or `.env`
//! - Starting the telemetry sender behind its bounded queue
//! - Claiming the GPIO lines, sensor and display (`hw::Board`)
//! - Running the control loop until SIGINT/SIGTERM
//!
//! A fatal control-loop error still runs the hardware cleanup, then the
//! process exits with a non-zero status. Restarting is left to the service
//! manager.
//!
//! # Environment Variables
//! - `SUPABASE_URL`, `SUPABASE_SERVICE_KEY` (**required**) – telemetry store
//! - `MONITOR_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `FORCE_COLOR` (optional) – force ANSI colours on or off
//! - see `config.rs` for the rest
use std::{env, io::IsTerminal};

use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;

use serverroom_monitor::config;
use serverroom_monitor::control::{ControlLoop, Peripherals, Settings, ShutdownSignals};
use serverroom_monitor::hw::Board;
use serverroom_monitor::power::Relay;
use serverroom_monitor::ports::{OutputLine, StatusDisplay};
use serverroom_monitor::telemetry::{HttpTransport, RetryPolicy, TelemetryQueue};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();
    tracing::info!("Server Room Monitor starting (device={})", cfg.device_id);

    // Installed before any hardware is claimed, so a signal during startup
    // still reaches the cleanup path.
    let signals = ShutdownSignals::install()?;

    let transport = HttpTransport::new(
        &cfg.supabase_url,
        &cfg.supabase_service_key,
        cfg.telemetry_timeout,
    )?;
    let (queue, sender) = TelemetryQueue::spawn(
        transport,
        RetryPolicy::new(cfg.telemetry_max_attempts),
        cfg.telemetry_queue_depth,
    );

    let board = Board::open(&cfg)?;
    let peripherals = Peripherals {
        environment: Box::new(board.environment),
        gas: Box::new(board.gas),
        grid: Box::new(board.grid),
        relay: Relay::new(
            Box::new(board.relay) as Box<dyn OutputLine + Send>,
            cfg.relay_active_high,
        ),
        indicator: Box::new(board.leds),
        alarm: Box::new(board.alarm),
        display: board
            .display
            .map(|lcd| Box::new(lcd) as Box<dyn StatusDisplay + Send>),
    };

    let control = ControlLoop::new(Settings::from_config(&cfg), peripherals, queue)?;
    let result = control.run(signals.recv()).await;

    // Abandon any delivery still in flight.
    sender.abort();
    tracing::info!("Shutdown complete.");
    result
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Log level controlled by `RUST_LOG`, else the `MONITOR_LOG_LEVEL` env var
///
/// Rotation and retention are the service manager's job (journald).
fn init_tracing() {
    // ---
    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to MONITOR_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("MONITOR_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
