//! Power source state machine: GRID → BACKUP → WAIT_GRID_STABLE → GRID.
//!
//! ```text
//!            grid lost               grid back
//!   Grid ─────────────▶ Backup ─────────────▶ WaitGridStable
//!    ▲                    ▲                        │     │
//!    │                    └──── grid lost ─────────┘     │
//!    └──────────── grid held for stable delay ───────────┘
//! ```
//!
//! Returning to the grid requires the (already debounced) grid signal to stay
//! present for the whole stabilization delay, which keeps the relay from
//! chattering on a flaky mains feed. A flicker during the wait sends the
//! machine back to `Backup` and the next wait starts from zero.
//!
//! The de-energised relay position is always the GRID path, whatever the
//! board polarity, so losing control power falls back to mains.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::Instant;

use crate::ports::{OutputLine, PowerIndicator};
use crate::PowerSource;

// ---

/// Current state. Only `WaitGridStable` carries data: when it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Grid,
    Backup,
    WaitGridStable { since: Instant },
}

impl PowerState {
    // ---
    pub fn name(&self) -> &'static str {
        // ---
        match self {
            PowerState::Grid => "GRID",
            PowerState::Backup => "BACKUP",
            PowerState::WaitGridStable { .. } => "WAIT_GRID_STABLE",
        }
    }

    pub fn power_source(&self) -> PowerSource {
        // ---
        match self {
            PowerState::Grid => PowerSource::Grid,
            _ => PowerSource::Backup,
        }
    }
}

// ---

/// Relay driver resolving "energised" against the board's polarity.
pub struct Relay<L> {
    // ---
    line: L,
    active_high: bool,
}

impl<L: OutputLine> Relay<L> {
    // ---
    pub fn new(line: L, active_high: bool) -> Self {
        Relay { line, active_high }
    }

    pub fn energize(&mut self) -> Result<()> {
        // ---
        self.line.set_level(self.active_high)?;
        tracing::debug!("Relay: energised (BACKUP)");
        Ok(())
    }

    pub fn de_energize(&mut self) -> Result<()> {
        // ---
        self.line.set_level(!self.active_high)?;
        tracing::debug!("Relay: de-energised (GRID)");
        Ok(())
    }
}

// ---

pub struct PowerStateMachine<L, V> {
    // ---
    relay: Relay<L>,
    indicator: V,
    stable_delay: Duration,
    state: PowerState,
}

impl<L: OutputLine, V: PowerIndicator> PowerStateMachine<L, V> {
    // ---
    /// Start in `Grid` and drive the outputs to match. The first `update`
    /// corrects the state if mains is actually absent.
    pub fn new(relay: Relay<L>, indicator: V, stable_delay: Duration) -> Result<Self> {
        // ---
        let mut machine = PowerStateMachine {
            relay,
            indicator,
            stable_delay,
            state: PowerState::Grid,
        };
        machine.apply_state()?;
        Ok(machine)
    }

    /// Feed this cycle's debounced grid signal; returns the power source label.
    pub fn update(&mut self, grid_present: bool) -> Result<PowerSource> {
        self.update_at(grid_present, Instant::now())
    }

    pub fn update_at(&mut self, grid_present: bool, now: Instant) -> Result<PowerSource> {
        // ---
        let next = match (self.state, grid_present) {
            (PowerState::Grid, false) => Some(PowerState::Backup),
            (PowerState::Backup, true) => Some(PowerState::WaitGridStable { since: now }),
            (PowerState::WaitGridStable { .. }, false) => Some(PowerState::Backup),
            (PowerState::WaitGridStable { since }, true)
                if now.saturating_duration_since(since) >= self.stable_delay =>
            {
                Some(PowerState::Grid)
            }
            _ => None,
        };

        if let Some(next) = next {
            self.transition(next)?;
        }
        Ok(self.state.power_source())
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn power_source(&self) -> PowerSource {
        self.state.power_source()
    }

    pub fn on_grid(&self) -> bool {
        self.state == PowerState::Grid
    }

    /// Rewrite the indicator for the current state without a transition.
    pub fn refresh_indicator(&mut self) -> Result<()> {
        // ---
        match self.state {
            PowerState::Grid => self.indicator.set_grid_indicator(),
            _ => self.indicator.set_backup_indicator(),
        }
    }

    /// Force the relay to the GRID-safe position, bypassing the state machine.
    pub fn safe_shutdown(&mut self) -> Result<()> {
        // ---
        self.relay.de_energize()?;
        tracing::info!("Relay de-energised (safe shutdown)");
        Ok(())
    }

    // ---

    fn transition(&mut self, next: PowerState) -> Result<()> {
        // ---
        tracing::info!("Power state: {} -> {}", self.state.name(), next.name());
        self.state = next;
        self.apply_state()
    }

    fn apply_state(&mut self) -> Result<()> {
        // ---
        let indicator = if self.state == PowerState::Grid {
            self.relay
                .de_energize()
                .context("Failed to de-energise relay")?;
            self.indicator.set_grid_indicator()
        } else {
            self.relay.energize().context("Failed to energise relay")?;
            self.indicator.set_backup_indicator()
        };

        if let Err(e) = indicator {
            tracing::warn!("Power indicator write failed: {}", e);
        }
        Ok(())
    }
}
