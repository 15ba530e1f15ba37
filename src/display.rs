//! Two-line, 16-column status readout.

// ---

pub const COLUMNS: usize = 16;

/// Pre-formatted lines, each exactly [`COLUMNS`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLines {
    pub top: String,
    pub bottom: String,
}

impl StatusLines {
    // ---
    /// `T:23.4C H:45%` / `GRID G:OK   A:OF`. Absent readings show dashes.
    pub fn new(
        temperature_c: Option<f64>,
        humidity_pct: Option<f64>,
        gas_alert: bool,
        grid_present: bool,
        alarm_active: bool,
    ) -> Self {
        // ---
        let t = temperature_c.map_or_else(|| "--.-".to_string(), |t| format!("{t:.1}"));
        let h = humidity_pct.map_or_else(|| "--".to_string(), |h| format!("{h:.0}"));

        let pwr = if grid_present { "GRID" } else { "BKUP" };
        let gas = if gas_alert { "ALRT" } else { "OK" };
        let alm = if alarm_active { "ON" } else { "OF" };

        StatusLines {
            top: fit(&format!("T:{t}C H:{h}%")),
            bottom: fit(&format!("{pwr} G:{gas:<4} A:{alm}")),
        }
    }
}

fn fit(line: &str) -> String {
    format!("{:<width$.width$}", line, width = COLUMNS)
}
