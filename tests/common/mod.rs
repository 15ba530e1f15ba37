//! Mock hardware for integration tests.
//!
//! Records every actuator call in one shared log so tests can assert on the
//! full command history, in order, without touching GPIO.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use serverroom_monitor::alarm::Thresholds;
use serverroom_monitor::control::{Peripherals, Settings};
use serverroom_monitor::display::StatusLines;
use serverroom_monitor::ports::{
    AlarmActuator, DigitalInput, EnvironmentReader, OutputLine, PowerIndicator, StatusDisplay,
};
use serverroom_monitor::power::Relay;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    /// Physical relay level.
    Relay(bool),
    GridLed,
    BackupLed,
    AlarmStart,
    AlarmStop,
    Render(StatusLines),
    Clear,
}

type Log = Arc<Mutex<Vec<HwCall>>>;

fn push(log: &Log, call: HwCall) {
    log.lock().unwrap().push(call);
}

// ── MockBoard ─────────────────────────────────────────────────

/// Handles to the simulated world plus the call log.
#[derive(Clone)]
pub struct MockBoard {
    pub calls: Log,
    pub grid: Arc<AtomicBool>,
    pub gas: Arc<AtomicBool>,
    pub env: Arc<Mutex<(Option<f64>, Option<f64>)>>,
    pub relay_fails: Arc<AtomicBool>,
    pub gas_fails: Arc<AtomicBool>,
    pub display_fails: Arc<AtomicBool>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            calls: Arc::default(),
            grid: Arc::new(AtomicBool::new(true)),
            gas: Arc::new(AtomicBool::new(false)),
            env: Arc::new(Mutex::new((Some(22.0), Some(40.0)))),
            relay_fails: Arc::default(),
            gas_fails: Arc::default(),
            display_fails: Arc::default(),
        }
    }

    pub fn set_grid(&self, present: bool) {
        self.grid.store(present, Ordering::SeqCst);
    }

    pub fn set_gas(&self, alert: bool) {
        self.gas.store(alert, Ordering::SeqCst);
    }

    pub fn set_env(&self, t: Option<f64>, h: Option<f64>) {
        *self.env.lock().unwrap() = (t, h);
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<HwCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Drain the log, dropping display renders.
    pub fn take_actuation(&self) -> Vec<HwCall> {
        self.take()
            .into_iter()
            .filter(|c| !matches!(c, HwCall::Render(_)))
            .collect()
    }

    pub fn count(&self, call: &HwCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    /// Peripherals for a relay board of the given polarity.
    pub fn peripherals(&self, relay_active_high: bool, with_display: bool) -> Peripherals {
        // ---
        let display = with_display.then(|| {
            Box::new(MockDisplay {
                calls: self.calls.clone(),
                fails: self.display_fails.clone(),
            }) as Box<dyn StatusDisplay + Send>
        });

        Peripherals {
            environment: Box::new(MockEnv(self.env.clone())),
            gas: Box::new(MockInput {
                level: self.gas.clone(),
                fails: self.gas_fails.clone(),
            }),
            grid: Box::new(MockInput {
                level: self.grid.clone(),
                fails: Arc::default(),
            }),
            relay: Relay::new(
                Box::new(MockRelay {
                    calls: self.calls.clone(),
                    fails: self.relay_fails.clone(),
                }) as Box<dyn OutputLine + Send>,
                relay_active_high,
            ),
            indicator: Box::new(MockIndicator(self.calls.clone())),
            alarm: Box::new(MockAlarm(self.calls.clone())),
            display,
        }
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

// ── Components ────────────────────────────────────────────────

struct MockEnv(Arc<Mutex<(Option<f64>, Option<f64>)>>);

impl EnvironmentReader for MockEnv {
    fn read(&mut self) -> (Option<f64>, Option<f64>) {
        *self.0.lock().unwrap()
    }
}

struct MockInput {
    level: Arc<AtomicBool>,
    fails: Arc<AtomicBool>,
}

impl DigitalInput for MockInput {
    fn is_active(&mut self) -> Result<bool> {
        if self.fails.load(Ordering::SeqCst) {
            bail!("gpio read failed");
        }
        Ok(self.level.load(Ordering::SeqCst))
    }
}

struct MockRelay {
    calls: Log,
    fails: Arc<AtomicBool>,
}

impl OutputLine for MockRelay {
    fn set_level(&mut self, high: bool) -> Result<()> {
        if self.fails.load(Ordering::SeqCst) {
            bail!("relay line write failed");
        }
        push(&self.calls, HwCall::Relay(high));
        Ok(())
    }
}

struct MockIndicator(Log);

impl PowerIndicator for MockIndicator {
    fn set_grid_indicator(&mut self) -> Result<()> {
        push(&self.0, HwCall::GridLed);
        Ok(())
    }

    fn set_backup_indicator(&mut self) -> Result<()> {
        push(&self.0, HwCall::BackupLed);
        Ok(())
    }
}

struct MockAlarm(Log);

impl AlarmActuator for MockAlarm {
    fn start_pattern(&mut self) -> Result<()> {
        push(&self.0, HwCall::AlarmStart);
        Ok(())
    }

    fn stop_pattern(&mut self) -> Result<()> {
        push(&self.0, HwCall::AlarmStop);
        Ok(())
    }
}

struct MockDisplay {
    calls: Log,
    fails: Arc<AtomicBool>,
}

impl StatusDisplay for MockDisplay {
    fn render(&mut self, lines: &StatusLines) -> Result<()> {
        if self.fails.load(Ordering::SeqCst) {
            bail!("i2c nack");
        }
        push(&self.calls, HwCall::Render(lines.clone()));
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.fails.load(Ordering::SeqCst) {
            bail!("i2c nack");
        }
        push(&self.calls, HwCall::Clear);
        Ok(())
    }
}

// ── Settings ──────────────────────────────────────────────────

pub const PERIOD: Duration = Duration::from_secs(5);

pub fn settings() -> Settings {
    Settings {
        device_id: "pi-test".to_string(),
        period: PERIOD,
        post_interval: Duration::from_secs(30),
        grid_filter: Duration::from_millis(500),
        grid_stable_delay: Duration::from_secs(15),
        thresholds: Thresholds {
            temp_high_c: 35.0,
            humid_high_pct: 70.0,
        },
        pattern_on: Duration::from_millis(200),
        pattern_off: Duration::from_millis(800),
    }
}
