//! HD44780 16x2 display through the kernel `charlcd` driver (`/dev/lcd`).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::display::StatusLines;
use crate::ports::StatusDisplay;

// ---

/// Form feed: clear and home.
const CLEAR: &[u8] = b"\x0c";

pub struct CharLcd<W> {
    out: W,
}

impl CharLcd<File> {
    // ---
    /// Open the device node. Absence of the display is an ordinary outcome,
    /// reported as an error for the caller to turn into "no display".
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        // ---
        let path = path.as_ref();
        let out = OpenOptions::new()
            .write(true)
            .open(path)
            .with_context(|| format!("LCD not available at {}", path.display()))?;
        Ok(CharLcd { out })
    }
}

impl<W: Write> CharLcd<W> {
    pub fn new(out: W) -> Self {
        CharLcd { out }
    }
}

impl<W: Write> StatusDisplay for CharLcd<W> {
    // ---
    fn render(&mut self, lines: &StatusLines) -> Result<()> {
        // ---
        let frame = format!("\x1b[Lx0y0;{}\x1b[Lx0y1;{}", lines.top, lines.bottom);
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        // ---
        self.out.write_all(CLEAR)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_render_positions_both_lines() {
        // ---
        let mut lcd = CharLcd::new(Vec::new());
        let lines = StatusLines::new(Some(21.0), Some(40.0), false, true, false);
        lcd.render(&lines).unwrap();

        let written = String::from_utf8(lcd.out).unwrap();
        assert_eq!(
            written,
            "\x1b[Lx0y0;T:21.0C H:40%   \x1b[Lx0y1;GRID G:OK   A:OF"
        );
    }

    #[test]
    fn test_clear_sends_form_feed() {
        // ---
        let mut lcd = CharLcd::new(Vec::new());
        lcd.clear().unwrap();
        assert_eq!(lcd.out, b"\x0c");
    }

    #[test]
    fn test_missing_device_is_reported() {
        // ---
        assert!(CharLcd::open("/nonexistent/lcd").is_err());
    }
}
