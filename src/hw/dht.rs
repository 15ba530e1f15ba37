//! DHT22 readings through the kernel `dht11` IIO driver.
//!
//! The driver exposes milli-degrees and milli-percent under the IIO device
//! node and answers `EIO` when a transfer fails its checksum, which happens
//! routinely. A few back-to-back attempts are made before giving up.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::ports::EnvironmentReader;

// ---

const ATTEMPTS: u32 = 3;

pub struct IioDht22 {
    // ---
    temperature: PathBuf,
    humidity: PathBuf,
}

impl IioDht22 {
    // ---
    pub fn new(device: impl AsRef<Path>) -> Self {
        // ---
        let device = device.as_ref();
        IioDht22 {
            temperature: device.join("in_temp_input"),
            humidity: device.join("in_humidityrelative_input"),
        }
    }

    fn read_once(&self) -> Result<(f64, f64)> {
        // ---
        let t = read_milli(&self.temperature)?;
        let h = read_milli(&self.humidity)?;
        Ok((t, h))
    }
}

impl EnvironmentReader for IioDht22 {
    // ---
    fn read(&mut self) -> (Option<f64>, Option<f64>) {
        // ---
        for attempt in 1..=ATTEMPTS {
            match self.read_once() {
                Ok((t, h)) => return (Some(round1(t)), Some(round1(h))),
                Err(e) => tracing::debug!("DHT22 read attempt {} failed: {:#}", attempt, e),
            }
        }
        tracing::warn!("DHT22: all {} read attempts failed", ATTEMPTS);
        (None, None)
    }
}

fn read_milli(path: &Path) -> Result<f64> {
    // ---
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let milli: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("parsing {:?} from {}", raw.trim(), path.display()))?;
    Ok(milli as f64 / 1000.0)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
