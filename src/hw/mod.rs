//! Linux adapters for the hardware ports.
//!
//! - `gpio` – sysfs GPIO input/output lines and the LED pair
//! - `dht`  – DHT22 through the kernel IIO driver
//! - `lcd`  – 16x2 character LCD through the kernel `charlcd` driver
//!
//! [`Board::open`] is the single gateway used by `main`: it claims every line
//! with its safe initial level and reports the optional display as present or
//! absent once, up front.

mod dht;
mod gpio;
mod lcd;

pub use dht::IioDht22;
pub use gpio::{LedPair, SysfsGpio, SysfsInput, SysfsOutput};
pub use lcd::CharLcd;

use anyhow::{Context, Result};

use crate::beeper::Beeper;
use crate::Config;

// ---

const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Every hardware handle the control loop needs, already configured.
pub struct Board {
    pub environment: IioDht22,
    pub gas: SysfsInput,
    pub grid: SysfsInput,
    /// Already at its de-energised (GRID) level.
    pub relay: SysfsOutput,
    pub leds: LedPair<SysfsOutput>,
    pub alarm: Beeper,
    pub display: Option<CharLcd<std::fs::File>>,
}

impl Board {
    // ---
    pub fn open(cfg: &Config) -> Result<Self> {
        // ---
        let gpio = SysfsGpio::new(SYSFS_GPIO_ROOT, cfg.gpio_sysfs_base);
        let pins = &cfg.pins;

        // De-energised level first, so the relay holds the GRID path from boot.
        let relay = gpio
            .output(pins.relay, !cfg.relay_active_high)
            .context("Relay line unavailable")?;

        let grid = gpio
            .input(pins.grid_sense, cfg.grid_active_high)
            .context("Grid sense line unavailable")?;
        let gas = gpio
            .input(pins.gas_alert, cfg.mq_active_high)
            .context("Gas sensor line unavailable")?;

        let leds = LedPair {
            green: gpio.output(pins.led_green, false)?,
            red: gpio.output(pins.led_red, false)?,
        };
        let buzzer = gpio.output(pins.buzzer, false)?;
        let alarm = Beeper::new(
            Box::new(buzzer),
            Box::new(leds.red.clone()),
            cfg.buzz_on,
            cfg.buzz_off,
        );

        let display = match CharLcd::open(&cfg.lcd_device) {
            Ok(lcd) => {
                tracing::info!("LCD initialised at {}", cfg.lcd_device);
                Some(lcd)
            }
            Err(e) => {
                tracing::warn!("{:#}", e);
                None
            }
        };

        Ok(Board {
            environment: IioDht22::new(&cfg.dht_iio_device),
            gas,
            grid,
            relay,
            leds,
            alarm,
            display,
        })
    }
}
