//! Fixed-period control loop.
//!
//! Each cycle, in order: read sensors → power state machine → alarm policy →
//! display → local log → telemetry (rate limited) → sleep out the period.
//! This is the only writer of the power, debounce and alarm state, so none of
//! it needs locking.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::alarm::{AlarmAction, AlarmPolicy, Thresholds};
use crate::debounce::DebouncedInput;
use crate::display::StatusLines;
use crate::ports::{
    AlarmActuator, DigitalInput, EnvironmentReader, OutputLine, PowerIndicator, StatusDisplay,
};
use crate::power::{PowerStateMachine, Relay};
use crate::telemetry::TelemetryQueue;
use crate::{Config, EnvironmentSample, PowerSource, TelemetrySample};

// ---

/// Loop tuning, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub device_id: String,
    pub period: Duration,
    pub post_interval: Duration,
    pub grid_filter: Duration,
    pub grid_stable_delay: Duration,
    pub thresholds: Thresholds,
    pub pattern_on: Duration,
    pub pattern_off: Duration,
}

impl Settings {
    // ---
    pub fn from_config(cfg: &Config) -> Self {
        // ---
        Settings {
            device_id: cfg.device_id.clone(),
            period: cfg.sensor_read_interval,
            post_interval: cfg.post_interval,
            grid_filter: cfg.grid_sense_filter,
            grid_stable_delay: cfg.grid_stable_delay,
            thresholds: Thresholds {
                temp_high_c: cfg.temp_high_c,
                humid_high_pct: cfg.humid_high_pct,
            },
            pattern_on: cfg.buzz_on,
            pattern_off: cfg.buzz_off,
        }
    }
}

/// The external collaborators, owned by the loop from construction on.
pub struct Peripherals {
    pub environment: Box<dyn EnvironmentReader + Send>,
    pub gas: Box<dyn DigitalInput + Send>,
    pub grid: Box<dyn DigitalInput + Send>,
    pub relay: Relay<Box<dyn OutputLine + Send>>,
    pub indicator: Box<dyn PowerIndicator + Send>,
    pub alarm: Box<dyn AlarmActuator + Send>,
    /// `None` when no display is fitted.
    pub display: Option<Box<dyn StatusDisplay + Send>>,
}

/// What one cycle observed and decided.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub environment: EnvironmentSample,
    pub grid_present: bool,
    pub power_source: PowerSource,
    pub alarm_active: bool,
    pub alarm_action: AlarmAction,
    pub telemetry_queued: bool,
}

/// SIGINT and SIGTERM listeners.
///
/// Registered at construction, so a signal delivered before [`Self::recv`] is
/// first polled is still seen and never takes the default (kill) action.
pub struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl ShutdownSignals {
    // ---
    pub fn install() -> Result<Self> {
        // ---
        Ok(ShutdownSignals {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Resolve on the first SIGINT or SIGTERM.
    pub async fn recv(mut self) {
        // ---
        tokio::select! {
            _ = self.interrupt.recv() => info!("SIGINT received"),
            _ = self.terminate.recv() => info!("SIGTERM received"),
        }
    }
}

type Power = PowerStateMachine<Box<dyn OutputLine + Send>, Box<dyn PowerIndicator + Send>>;

pub struct ControlLoop {
    // ---
    settings: Settings,
    environment: Box<dyn EnvironmentReader + Send>,
    gas: Box<dyn DigitalInput + Send>,
    grid: DebouncedInput<Box<dyn DigitalInput + Send>>,
    power: Power,
    policy: AlarmPolicy,
    alarm: Box<dyn AlarmActuator + Send>,
    /// A start has been issued and not yet followed by a stop.
    alarm_sounding: bool,
    display: Option<Box<dyn StatusDisplay + Send>>,
    telemetry: TelemetryQueue,
    last_post: Option<Instant>,
}

impl ControlLoop {
    // ---
    /// Reads the grid line once and drives the relay to GRID before returning.
    pub fn new(settings: Settings, p: Peripherals, telemetry: TelemetryQueue) -> Result<Self> {
        // ---
        let grid = DebouncedInput::new("Grid sense", p.grid, settings.grid_filter)?;
        let power = PowerStateMachine::new(p.relay, p.indicator, settings.grid_stable_delay)?;
        let policy = AlarmPolicy::new(settings.thresholds, settings.pattern_on, settings.pattern_off);

        Ok(ControlLoop {
            settings,
            environment: p.environment,
            gas: p.gas,
            grid,
            power,
            policy,
            alarm: p.alarm,
            alarm_sounding: false,
            display: p.display,
            telemetry,
            last_post: None,
        })
    }

    /// Run until `shutdown` resolves or a cycle fails, then clean up.
    ///
    /// A failed cycle is returned as the error after the cleanup ran.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        // ---
        tokio::pin!(shutdown);
        info!(
            "Control loop running (device={}, period {:?})",
            self.settings.device_id, self.settings.period
        );

        let result = loop {
            let started = Instant::now();
            if let Err(e) = self.step(started) {
                break Err(e);
            }

            let elapsed = started.elapsed();
            if elapsed > self.settings.period {
                warn!(
                    "Cycle overran its period: {:?} > {:?}",
                    elapsed, self.settings.period
                );
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutting down ...");
                    break Ok(());
                }
                _ = tokio::time::sleep_until(started + self.settings.period) => {}
            }
        };

        if let Err(e) = &result {
            error!("Fatal error in control loop: {:#}", e);
        }
        self.shutdown();
        result
    }

    /// One control cycle at `now`.
    pub fn step(&mut self, now: Instant) -> Result<CycleReport> {
        // ---
        // 1. Sensors
        let (temperature_c, humidity_pct) = self.environment.read();
        let gas_alert = self.gas.is_active().unwrap_or_else(|e| {
            warn!("Gas sensor read failed, treating as no alert: {}", e);
            false
        });
        let grid_present = self.grid.read();
        let environment = EnvironmentSample {
            temperature_c,
            humidity_pct,
            gas_alert,
        };

        // 2. Power source
        let power_source = self.power.update_at(grid_present, now)?;

        // 3. Alarm
        let alarm_action = self.policy.evaluate(&environment, now);
        self.apply_alarm(alarm_action);
        let alarm_active = self.policy.is_active();

        // 4. Display
        self.render(&environment, grid_present, alarm_active);

        // 5. Local log
        info!(
            "T={}C H={}% Gas={} Grid={} PWR={} ALM={}",
            fmt_reading(environment.temperature_c),
            fmt_reading(environment.humidity_pct),
            if gas_alert { "ALERT" } else { "OK" },
            if grid_present { "YES" } else { "NO" },
            power_source,
            if alarm_active { "ON" } else { "OFF" },
        );

        // 6. Telemetry
        let due = self
            .last_post
            .map_or(true, |t| now.saturating_duration_since(t) >= self.settings.post_interval);
        let mut telemetry_queued = false;
        if due {
            let sample = TelemetrySample::new(
                &self.settings.device_id,
                &environment,
                grid_present,
                power_source,
                alarm_active,
            );
            if self.telemetry.submit(sample) {
                self.last_post = Some(now);
                telemetry_queued = true;
            }
        }

        Ok(CycleReport {
            environment,
            grid_present,
            power_source,
            alarm_active,
            alarm_action,
            telemetry_queued,
        })
    }

    /// Stop the alarm, blank the display and put the relay on the GRID path.
    pub fn shutdown(&mut self) {
        // ---
        info!("Cleaning up ...");
        if let Err(e) = self.alarm.stop_pattern() {
            warn!("Failed to stop alarm: {}", e);
        }
        self.alarm_sounding = false;

        if let Some(display) = self.display.as_mut() {
            if let Err(e) = display.clear() {
                warn!("Failed to clear display: {}", e);
            }
        }

        if let Err(e) = self.power.safe_shutdown() {
            error!("Failed to de-energise relay on shutdown: {}", e);
        }
    }

    pub fn power_source(&self) -> PowerSource {
        self.power.power_source()
    }

    // ---

    fn apply_alarm(&mut self, action: AlarmAction) {
        // ---
        match action {
            AlarmAction::Start => {
                if let Err(e) = self.alarm.start_pattern() {
                    warn!("Failed to start alarm: {}", e);
                }
                self.alarm_sounding = true;
            }
            AlarmAction::Hold => {}
            AlarmAction::Stop => {
                if let Err(e) = self.alarm.stop_pattern() {
                    warn!("Failed to stop alarm: {}", e);
                }
                // Alarm just cleared: hand the lamps back to the power state.
                // On backup the red lamp stays steadily lit.
                let cleared = std::mem::take(&mut self.alarm_sounding);
                if cleared || !self.power.on_grid() {
                    if let Err(e) = self.power.refresh_indicator() {
                        warn!("Power indicator write failed: {}", e);
                    }
                }
            }
        }
    }

    fn render(&mut self, env: &EnvironmentSample, grid_present: bool, alarm_active: bool) {
        // ---
        let Some(display) = self.display.as_mut() else {
            return;
        };
        let lines = StatusLines::new(
            env.temperature_c,
            env.humidity_pct,
            env.gas_alert,
            grid_present,
            alarm_active,
        );
        if let Err(e) = display.render(&lines) {
            warn!("LCD write error: {}", e);
        }
    }
}

fn fmt_reading(value: Option<f64>) -> String {
    value.map_or_else(|| "--".to_string(), |v| format!("{v:.1}"))
}
