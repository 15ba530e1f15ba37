//! Minimum-dwell debounce for noisy digital lines.
//!
//! The stable value only follows the raw line after the raw level has been
//! observed different from it, without interruption, for at least the filter
//! duration. A single sample back at the stable level restarts the run. A
//! zero filter is a pass-through.

use std::time::Duration;

use tokio::time::Instant;

use crate::ports::DigitalInput;

// ---

/// Pure debounce state, fed with `(raw, now)` samples.
#[derive(Debug, Clone)]
pub struct Debouncer {
    // ---
    filter: Duration,
    stable: bool,
    differing_since: Option<Instant>,
}

/// A committed change of the stable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub value: bool,
    pub dwell: Duration,
}

impl Debouncer {
    // ---
    pub fn new(initial: bool, filter: Duration) -> Self {
        // ---
        Debouncer {
            filter,
            stable: initial,
            differing_since: None,
        }
    }

    /// Feed one raw sample taken at `now`. Returns the transition if this
    /// sample committed one.
    pub fn sample(&mut self, raw: bool, now: Instant) -> Option<Transition> {
        // ---
        if raw == self.stable {
            self.differing_since = None;
            return None;
        }

        let since = *self.differing_since.get_or_insert(now);
        let dwell = now.saturating_duration_since(since);
        if dwell < self.filter {
            return None;
        }

        self.stable = raw;
        self.differing_since = None;
        Some(Transition { value: raw, dwell })
    }

    pub fn stable(&self) -> bool {
        self.stable
    }

    /// True while a differing run is being timed.
    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.differing_since.is_some()
    }
}

// ---

/// A [`DigitalInput`] with a [`Debouncer`] in front of it.
pub struct DebouncedInput<I> {
    // ---
    name: &'static str,
    input: I,
    state: Debouncer,
}

impl<I: DigitalInput> DebouncedInput<I> {
    // ---
    /// Seed the stable value from an immediate read of the line.
    pub fn new(name: &'static str, mut input: I, filter: Duration) -> anyhow::Result<Self> {
        // ---
        let initial = input
            .is_active()
            .map_err(|e| anyhow::anyhow!("Initial read of {} line failed: {}", name, e))?;

        tracing::info!(
            "{} line initialised: {} (filter {} ms)",
            name,
            if initial { "ACTIVE" } else { "INACTIVE" },
            filter.as_millis()
        );

        Ok(DebouncedInput {
            name,
            input,
            state: Debouncer::new(initial, filter),
        })
    }

    /// Sample the line once and return the debounced value.
    ///
    /// A failed read skips the sample and holds the last stable value.
    pub fn read(&mut self) -> bool {
        // ---
        match self.input.is_active() {
            Ok(raw) => {
                if let Some(change) = self.state.sample(raw, Instant::now()) {
                    tracing::info!(
                        "{} line changed -> {} (after {} ms stable)",
                        self.name,
                        if change.value { "ACTIVE" } else { "INACTIVE" },
                        change.dwell.as_millis()
                    );
                }
            }
            Err(e) => {
                tracing::warn!("{} line read failed, holding last value: {}", self.name, e);
            }
        }
        self.state.stable()
    }

    pub fn stable(&self) -> bool {
        self.state.stable()
    }
}
