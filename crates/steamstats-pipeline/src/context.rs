//! Per-run context

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// Start time and export timestamp shared by every record of one run
#[derive(Debug, Clone)]
pub struct RunContext {
    started: Instant,
    export_date: String,
    export_time: String,
}

impl RunContext {
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    pub fn at(timestamp: DateTime<Local>) -> Self {
        Self {
            started: Instant::now(),
            export_date: timestamp.format("%Y-%m-%d").to_string(),
            export_time: timestamp.format("%H:%M:%S").to_string(),
        }
    }

    pub fn export_date(&self) -> &str {
        &self.export_date
    }

    pub fn export_time(&self) -> &str {
        &self.export_time
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_format() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let ctx = RunContext::at(ts);
        assert_eq!(ctx.export_date(), "2024-03-09");
        assert_eq!(ctx.export_time(), "07:05:01");
    }
}
