//! Server room supervisor core.
//!
//! Watches temperature, humidity, a gas-sensor line and utility power, moves
//! the room onto backup power through a relay when mains is lost, sounds an
//! alarm on threshold breaches and ships telemetry rows to a REST store.
//!
//! Modules depend on this root for the shared model types rather than on each
//! other's files:
//! - `debounce` – minimum-dwell filter for the grid-sense line
//! - `power`    – GRID / BACKUP / WAIT_GRID_STABLE relay state machine
//! - `alarm`    – threshold policy with cooldown-gated actuation
//! - `beeper`   – background buzzer pattern
//! - `telemetry`– bounded retry delivery behind a queue
//! - `control`  – the fixed-period loop tying it together
//! - `hw`       – Linux adapters for the `ports` traits

pub mod alarm;
pub mod beeper;
pub mod config;
pub mod control;
pub mod debounce;
pub mod display;
pub mod hw;
pub mod ports;
pub mod power;
pub mod telemetry;

mod models;

pub use config::Config;
pub use models::{EnvironmentSample, PowerSource, TelemetrySample};
