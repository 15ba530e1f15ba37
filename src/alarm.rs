//! Alarm policy: threshold evaluation plus cooldown-gated actuation.
//!
//! The actuator pattern runs on its own, so restarting it every cycle while it
//! is already sounding would be redundant. A start is only issued once the
//! cooldown (one full on/off pattern period) has expired; stopping is never
//! gated.

use std::time::Duration;

use tokio::time::Instant;

use crate::EnvironmentSample;

// ---

/// Configured trip points. Readings strictly above a threshold alarm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub temp_high_c: f64,
    pub humid_high_pct: f64,
}

impl Thresholds {
    // ---
    /// Absent readings never alarm; only a present value above its
    /// threshold does. The gas line is taken as ground truth.
    pub fn is_breached(&self, env: &EnvironmentSample) -> bool {
        // ---
        let temp_alarm = env.temperature_c.is_some_and(|t| t > self.temp_high_c);
        let humid_alarm = env.humidity_pct.is_some_and(|h| h > self.humid_high_pct);
        temp_alarm || humid_alarm || env.gas_alert
    }
}

/// What the caller must do with the alarm actuator this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmAction {
    /// Alarm active and cooldown expired: (re)start the pattern.
    Start,
    /// Alarm active, pattern still within its cooldown: leave it alone.
    Hold,
    /// Alarm inactive: stop the pattern.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmState {
    pub active: bool,
    /// Only ever moved forward, and only when a start is issued.
    pub cooldown_until: Option<Instant>,
}

pub struct AlarmPolicy {
    // ---
    thresholds: Thresholds,
    pattern_period: Duration,
    state: AlarmState,
}

impl AlarmPolicy {
    // ---
    pub fn new(thresholds: Thresholds, pattern_on: Duration, pattern_off: Duration) -> Self {
        // ---
        AlarmPolicy {
            thresholds,
            pattern_period: pattern_on + pattern_off,
            state: AlarmState {
                active: false,
                cooldown_until: None,
            },
        }
    }

    /// Evaluate one cycle's sample at `now`.
    pub fn evaluate(&mut self, env: &EnvironmentSample, now: Instant) -> AlarmAction {
        // ---
        let active = self.thresholds.is_breached(env);
        self.state.active = active;

        if !active {
            return AlarmAction::Stop;
        }

        let armed = self.state.cooldown_until.map_or(true, |until| now >= until);
        if !armed {
            return AlarmAction::Hold;
        }

        self.state.cooldown_until = Some(now + self.pattern_period);
        AlarmAction::Start
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }
}
