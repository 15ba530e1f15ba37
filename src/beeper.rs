//! Repeating buzzer pattern driven from a background task.
//!
//! The pattern task and [`Beeper::stop_pattern`] share the buzzer line behind
//! one mutex together with an epoch counter. Each pattern step checks, under
//! the lock, that its epoch is still current before writing; stop bumps the
//! epoch and writes "off" under the same lock. Once stop returns, no stale
//! task can turn the buzzer back on.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;

use crate::ports::{AlarmActuator, OutputLine};

// ---

type Line = Box<dyn OutputLine + Send>;

struct Shared {
    buzzer: Line,
    epoch: u64,
}

/// Alarm actuator: beeping buzzer plus a steady red lamp.
pub struct Beeper {
    // ---
    shared: Arc<Mutex<Shared>>,
    lamp: Line,
    on: Duration,
    off: Duration,
    task: Option<JoinHandle<()>>,
}

impl Beeper {
    // ---
    pub fn new(buzzer: Line, lamp: Line, on: Duration, off: Duration) -> Self {
        // ---
        Beeper {
            shared: Arc::new(Mutex::new(Shared { buzzer, epoch: 0 })),
            lamp,
            on,
            off,
            task: None,
        }
    }

    #[cfg(test)]
    fn is_sounding(&self) -> bool {
        self.task.is_some()
    }

    fn silence(&mut self) -> Result<()> {
        // ---
        let mut shared = self
            .shared
            .lock()
            .map_err(|_| anyhow!("buzzer lock poisoned"))?;
        shared.epoch += 1;
        shared.buzzer.set_level(false)
    }
}

impl AlarmActuator for Beeper {
    // ---
    fn start_pattern(&mut self) -> Result<()> {
        // ---
        if self.task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Ok(());
        }

        let epoch = {
            let mut shared = self
                .shared
                .lock()
                .map_err(|_| anyhow!("buzzer lock poisoned"))?;
            shared.epoch += 1;
            shared.epoch
        };

        let shared = Arc::clone(&self.shared);
        self.task = Some(tokio::spawn(run_pattern(shared, epoch, self.on, self.off)));
        tracing::info!("Alarm started");

        self.lamp.set_level(true)
    }

    fn stop_pattern(&mut self) -> Result<()> {
        // ---
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        drop(task);

        self.silence()?;
        tracing::info!("Alarm stopped");
        Ok(())
    }
}

impl Drop for Beeper {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.silence();
        }
    }
}

/// Pattern loop; exits at the first step after its epoch went stale.
async fn run_pattern(shared: Arc<Mutex<Shared>>, epoch: u64, on: Duration, off: Duration) {
    // ---
    loop {
        if !step(&shared, epoch, true) {
            break;
        }
        tokio::time::sleep(on).await;

        if !step(&shared, epoch, false) {
            break;
        }
        tokio::time::sleep(off).await;
    }
    tracing::debug!("Buzzer pattern {} finished", epoch);
}

fn step(shared: &Mutex<Shared>, epoch: u64, level: bool) -> bool {
    // ---
    let Ok(mut shared) = shared.lock() else {
        return false;
    };
    if shared.epoch != epoch {
        return false;
    }
    if let Err(e) = shared.buzzer.set_level(level) {
        tracing::warn!("Buzzer write failed: {}", e);
    }
    true
}
