//! Capability traits between the supervision core and the hardware.
//!
//! ```text
//!   hw adapter ──▶ port trait ──▶ ControlLoop / PowerStateMachine
//! ```
//!
//! Every external collaborator is owned by the component that drives it and
//! handed in at construction. Nothing reaches hardware through global state.
//! Input lines are polarity-normalized by the adapter, so `true` always means
//! the logical condition ("grid present", "gas detected").

use anyhow::Result;

use crate::display::StatusLines;

// ---

/// Temperature/humidity acquisition.
pub trait EnvironmentReader {
    /// Returns `(temperature_c, humidity_pct)`. A failed acquisition reports
    /// both as `None`; transient faults never surface as errors.
    fn read(&mut self) -> (Option<f64>, Option<f64>);
}

/// A polarity-normalized digital input line.
pub trait DigitalInput {
    fn is_active(&mut self) -> Result<bool>;
}

/// A raw output line, driven by physical level.
pub trait OutputLine {
    fn set_level(&mut self, high: bool) -> Result<()>;
}

/// Green/red power indicators.
pub trait PowerIndicator {
    fn set_grid_indicator(&mut self) -> Result<()>;
    fn set_backup_indicator(&mut self) -> Result<()>;
}

/// The audible/visual alarm. Both calls are idempotent.
pub trait AlarmActuator {
    fn start_pattern(&mut self) -> Result<()>;
    fn stop_pattern(&mut self) -> Result<()>;
}

/// Two-line status readout. Best effort: callers log and swallow errors.
pub trait StatusDisplay {
    fn render(&mut self, lines: &StatusLines) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

// ---

impl<T: DigitalInput + ?Sized> DigitalInput for Box<T> {
    fn is_active(&mut self) -> Result<bool> {
        (**self).is_active()
    }
}

impl<T: OutputLine + ?Sized> OutputLine for Box<T> {
    fn set_level(&mut self, high: bool) -> Result<()> {
        (**self).set_level(high)
    }
}

impl<T: PowerIndicator + ?Sized> PowerIndicator for Box<T> {
    fn set_grid_indicator(&mut self) -> Result<()> {
        (**self).set_grid_indicator()
    }

    fn set_backup_indicator(&mut self) -> Result<()> {
        (**self).set_backup_indicator()
    }
}
