//! Configuration loader for the `serverroom-monitor` daemon.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

/// Parse an optional environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional boolean environment variable (`true`/`false`, any case).
macro_rules! parse_env_bool {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name) {
            Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                other => return Err(anyhow!("Invalid {}: {:?}", $var_name, other)),
            },
            Err(_) => $default,
        }
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// BCM line numbers of every GPIO the monitor drives or reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pins {
    pub grid_sense: u32,
    pub gas_alert: u32,
    pub relay: u32,
    pub led_green: u32,
    pub led_red: u32,
    pub buzzer: u32,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// REST base URL of the telemetry store.
    pub supabase_url: String,

    /// Service credential, sent as bearer token and `apikey`.
    pub supabase_service_key: String,

    pub device_id: String,

    /// Alarm thresholds (strictly greater trips).
    pub temp_high_c: f64,
    pub humid_high_pct: f64,

    pub sensor_read_interval: Duration,
    pub post_interval: Duration,
    pub grid_stable_delay: Duration,
    pub grid_sense_filter: Duration,
    pub buzz_on: Duration,
    pub buzz_off: Duration,

    pub grid_active_high: bool,
    pub relay_active_high: bool,
    pub mq_active_high: bool,

    pub pins: Pins,

    /// Added to BCM numbers for sysfs (gpiochip base).
    pub gpio_sysfs_base: u32,

    pub dht_iio_device: String,
    pub lcd_device: String,

    pub telemetry_max_attempts: u32,
    pub telemetry_queue_depth: usize,
    pub telemetry_timeout: Duration,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `SUPABASE_URL` – REST base URL
/// - `SUPABASE_SERVICE_KEY` – service credential
///
/// Everything else is optional; see the field docs and `.env.example`.
///
/// Returns an error if any required variable is missing or any value is invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let cfg = Config {
        supabase_url: require_env!("SUPABASE_URL"),
        supabase_service_key: require_env!("SUPABASE_SERVICE_KEY"),
        device_id: env::var("DEVICE_ID").unwrap_or_else(|_| "pi-serverroom-01".to_string()),

        temp_high_c: parse_env!("TEMP_HIGH_C", f64, 35.0),
        humid_high_pct: parse_env!("HUMID_HIGH_PCT", f64, 70.0),

        sensor_read_interval: Duration::from_secs(parse_env!("SENSOR_READ_INTERVAL_SEC", u64, 5)),
        post_interval: Duration::from_secs(parse_env!("POST_INTERVAL_SEC", u64, 30)),
        grid_stable_delay: Duration::from_secs(parse_env!("GRID_STABLE_DELAY_SEC", u64, 15)),
        grid_sense_filter: Duration::from_millis(parse_env!("GRID_SENSE_FILTER_MS", u64, 500)),
        buzz_on: Duration::from_millis(parse_env!("BUZZ_PATTERN_ON_MS", u64, 200)),
        buzz_off: Duration::from_millis(parse_env!("BUZZ_PATTERN_OFF_MS", u64, 800)),

        grid_active_high: parse_env_bool!("GRID_ACTIVE_HIGH", true),
        relay_active_high: parse_env_bool!("RELAY_ACTIVE_HIGH", true),
        mq_active_high: parse_env_bool!("MQ_ACTIVE_HIGH", true),

        pins: Pins {
            grid_sense: parse_env!("PIN_GRID_SENSE", u32, 24),
            gas_alert: parse_env!("PIN_MQ_DO", u32, 17),
            relay: parse_env!("PIN_RELAY", u32, 18),
            led_green: parse_env!("PIN_LED_GREEN", u32, 23),
            led_red: parse_env!("PIN_LED_RED", u32, 25),
            buzzer: parse_env!("PIN_BUZZER", u32, 12),
        },
        gpio_sysfs_base: parse_env!("GPIO_SYSFS_BASE", u32, 0),

        dht_iio_device: env::var("DHT_IIO_DEVICE")
            .unwrap_or_else(|_| "/sys/bus/iio/devices/iio:device0".to_string()),
        lcd_device: env::var("LCD_DEVICE").unwrap_or_else(|_| "/dev/lcd".to_string()),

        telemetry_max_attempts: parse_env!("TELEMETRY_MAX_ATTEMPTS", u32, 3),
        telemetry_queue_depth: parse_env!("TELEMETRY_QUEUE_DEPTH", usize, 4),
        telemetry_timeout: Duration::from_secs(parse_env!("TELEMETRY_TIMEOUT_SECS", u64, 10)),
    };

    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    // ---
    /// Reject values the control loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        // ---
        if !self.temp_high_c.is_finite() || !self.humid_high_pct.is_finite() {
            bail!("Alarm thresholds must be finite numbers");
        }
        if self.sensor_read_interval.is_zero() {
            bail!("SENSOR_READ_INTERVAL_SEC must be greater than zero");
        }
        if self.post_interval.is_zero() {
            bail!("POST_INTERVAL_SEC must be greater than zero");
        }
        if self.buzz_on.is_zero() && self.buzz_off.is_zero() {
            bail!("BUZZ_PATTERN_ON_MS and BUZZ_PATTERN_OFF_MS cannot both be zero");
        }
        if self.telemetry_max_attempts == 0 {
            bail!("TELEMETRY_MAX_ATTEMPTS must be at least 1");
        }
        if self.telemetry_queue_depth == 0 {
            bail!("TELEMETRY_QUEUE_DEPTH must be at least 1");
        }
        Ok(())
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the service credential while showing all other values.
    pub fn log_config(&self) {
        // ---
        let masked_key = mask_secret(&self.supabase_service_key);

        tracing::info!("Configuration loaded:");
        tracing::info!("  SUPABASE_URL         : {}", self.supabase_url);
        tracing::info!("  SUPABASE_SERVICE_KEY : {}", masked_key);
        tracing::info!("  DEVICE_ID            : {}", self.device_id);
        tracing::info!(
            "  THRESHOLDS           : {} C / {} %",
            self.temp_high_c,
            self.humid_high_pct
        );
        tracing::info!(
            "  INTERVALS            : read {:?}, post {:?}, grid stable {:?}, filter {:?}",
            self.sensor_read_interval,
            self.post_interval,
            self.grid_stable_delay,
            self.grid_sense_filter
        );
        tracing::info!(
            "  BUZZ PATTERN         : on {:?} / off {:?}",
            self.buzz_on,
            self.buzz_off
        );
        tracing::info!(
            "  POLARITY (grid/relay/mq active-high): {}/{}/{}",
            self.grid_active_high,
            self.relay_active_high,
            self.mq_active_high
        );
        tracing::info!(
            "  PINS                 : {:?} (sysfs base {})",
            self.pins,
            self.gpio_sysfs_base
        );
        tracing::info!("  DHT_IIO_DEVICE       : {}", self.dht_iio_device);
        tracing::info!("  LCD_DEVICE           : {}", self.lcd_device);
        tracing::info!(
            "  TELEMETRY            : {} attempts, queue {}, timeout {:?}",
            self.telemetry_max_attempts,
            self.telemetry_queue_depth,
            self.telemetry_timeout
        );
    }
}

/// Keep the first four characters of a credential, star the rest.
fn mask_secret(secret: &str) -> String {
    // ---
    let shown: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{shown}****")
    }
}
