//! GPIO lines through the sysfs interface (`/sys/class/gpio`).
//!
//! Pull resistors cannot be set from sysfs; configure them in the boot
//! firmware (`gpio=24=ip,pd` in `config.txt`) to match the polarity flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::ports::{DigitalInput, OutputLine, PowerIndicator};

// ---

/// Line factory rooted at a sysfs gpio class directory.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    // ---
    root: PathBuf,
    base: u32,
}

impl SysfsGpio {
    // ---
    /// `base` is added to every BCM number (the gpiochip base on newer kernels).
    pub fn new(root: impl Into<PathBuf>, base: u32) -> Self {
        SysfsGpio {
            root: root.into(),
            base,
        }
    }

    /// Input line; `active_high` says which physical level means "active".
    pub fn input(&self, bcm: u32, active_high: bool) -> Result<SysfsInput> {
        // ---
        let dir = self.export(bcm)?;
        write_attr(&dir.join("direction"), "in")?;
        Ok(SysfsInput {
            value: dir.join("value"),
            active_high,
        })
    }

    /// Output line, switched to output mode already at `initial_high` so it
    /// never glitches through the other level.
    pub fn output(&self, bcm: u32, initial_high: bool) -> Result<SysfsOutput> {
        // ---
        let dir = self.export(bcm)?;
        write_attr(
            &dir.join("direction"),
            if initial_high { "high" } else { "low" },
        )?;
        tracing::debug!("GPIO{} configured as output ({})", bcm, initial_high);
        Ok(SysfsOutput {
            value: dir.join("value"),
        })
    }

    fn export(&self, bcm: u32) -> Result<PathBuf> {
        // ---
        let number = bcm + self.base;
        let dir = self.root.join(format!("gpio{number}"));
        if !dir.exists() {
            write_attr(&self.root.join("export"), &number.to_string())
                .with_context(|| format!("Failed to export GPIO{bcm}"))?;
        }
        Ok(dir)
    }
}

fn write_attr(path: &Path, value: &str) -> Result<()> {
    fs::write(path, value).with_context(|| format!("Failed to write {}", path.display()))
}

// ---

#[derive(Debug, Clone)]
pub struct SysfsInput {
    value: PathBuf,
    active_high: bool,
}

impl DigitalInput for SysfsInput {
    fn is_active(&mut self) -> Result<bool> {
        // ---
        let raw = fs::read_to_string(&self.value)
            .with_context(|| format!("Failed to read {}", self.value.display()))?;
        let high = raw.trim() == "1";
        Ok(high == self.active_high)
    }
}

/// Clones address the same physical line.
#[derive(Debug, Clone)]
pub struct SysfsOutput {
    value: PathBuf,
}

impl OutputLine for SysfsOutput {
    fn set_level(&mut self, high: bool) -> Result<()> {
        write_attr(&self.value, if high { "1" } else { "0" })
    }
}

// ---

/// Green = grid, red = backup.
pub struct LedPair<L> {
    pub green: L,
    pub red: L,
}

impl<L: OutputLine> PowerIndicator for LedPair<L> {
    // ---
    fn set_grid_indicator(&mut self) -> Result<()> {
        self.green.set_level(true)?;
        self.red.set_level(false)
    }

    fn set_backup_indicator(&mut self) -> Result<()> {
        self.green.set_level(false)?;
        self.red.set_level(true)
    }
}
