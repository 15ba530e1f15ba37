//! Simple data models for the monitor: one cycle's environment reading and
//! the telemetry row shipped to the remote store.

use serde::Serialize;

// ---

/// Environment readings for a single control cycle.
///
/// Each field is independently absent when its acquisition failed. Never
/// cached across cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvironmentSample {
    // ---
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub gas_alert: bool,
}

/// Which path currently feeds the room, as reported downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerSource {
    Grid,
    Backup,
}

impl PowerSource {
    // ---
    pub fn as_str(self) -> &'static str {
        // ---
        match self {
            PowerSource::Grid => "GRID",
            PowerSource::Backup => "BACKUP",
        }
    }
}

impl std::fmt::Display for PowerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One telemetry row, serialized as the REST insert body.
///
/// Built once per dispatch and moved into the delivery path; dropped after
/// the last attempt whatever the outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySample {
    // ---
    pub device_id: String,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub gas_alert: bool,
    pub grid_present: bool,
    pub power_source: PowerSource,
    pub alarm_active: bool,
}

impl TelemetrySample {
    // ---
    pub fn new(
        device_id: &str,
        env: &EnvironmentSample,
        grid_present: bool,
        power_source: PowerSource,
        alarm_active: bool,
    ) -> Self {
        // ---
        TelemetrySample {
            device_id: device_id.to_string(),
            temperature_c: env.temperature_c,
            humidity_pct: env.humidity_pct,
            gas_alert: env.gas_alert,
            grid_present,
            power_source,
            alarm_active,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_shape() {
        // ---
        let env = EnvironmentSample {
            temperature_c: Some(24.5),
            humidity_pct: Some(41.0),
            gas_alert: false,
        };
        let sample = TelemetrySample::new("pi-test", &env, true, PowerSource::Grid, false);

        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(
            value,
            json!({
                "device_id": "pi-test",
                "temperature_c": 24.5,
                "humidity_pct": 41.0,
                "gas_alert": false,
                "grid_present": true,
                "power_source": "GRID",
                "alarm_active": false,
            })
        );
    }

    #[test]
    fn test_missing_readings_serialize_as_null() {
        // ---
        let env = EnvironmentSample {
            temperature_c: None,
            humidity_pct: None,
            gas_alert: true,
        };
        let sample = TelemetrySample::new("pi-test", &env, false, PowerSource::Backup, true);

        let value = serde_json::to_value(&sample).unwrap();
        assert!(value["temperature_c"].is_null());
        assert!(value["humidity_pct"].is_null());
        assert_eq!(value["power_source"], "BACKUP");
        assert_eq!(value["gas_alert"], true);
    }
}
