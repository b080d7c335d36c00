//! Run statistics and reporting

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

/// Hits and misses of one source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub hits: usize,
    pub misses: usize,
}

impl SourceStats {
    pub fn record(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub requested: usize,
    pub exported: usize,
    /// No catalog data: no row written
    pub skipped: usize,
    pub duplicates: usize,
    /// Catalog records served by the batch endpoint
    pub batch_hits: usize,
    pub sources: BTreeMap<&'static str, SourceStats>,
    pub elapsed: Duration,
    pub interrupted: bool,
    pub output_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Default::default()
        }
    }

    pub fn record_source(&mut self, source: &'static str, hit: bool) {
        self.sources.entry(source).or_default().record(hit);
    }

    pub fn source(&self, source: &str) -> SourceStats {
        self.sources.get(source).copied().unwrap_or_default()
    }

    /// Identifiers not reached because of an interrupt
    pub fn remaining(&self) -> usize {
        self.requested
            .saturating_sub(self.exported + self.skipped + self.duplicates)
    }

    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Fetch")
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Hits").fg(Color::Cyan),
                Cell::new("Misses").fg(Color::Cyan),
            ]);

        table.add_row(vec![
            Cell::new("Exported").fg(Color::Green),
            Cell::new(fmt_num(self.exported)).fg(Color::Green),
            Cell::new(format!("{} skipped", fmt_num(self.skipped))),
        ]);
        table.add_row(vec![
            Cell::new("Batch lookups"),
            Cell::new(fmt_num(self.batch_hits)),
            Cell::new(""),
        ]);
        for (name, stats) in &self.sources {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(fmt_num(stats.hits)),
                Cell::new(fmt_num(stats.misses)),
            ]);
        }
        if self.duplicates > 0 {
            table.add_row(vec![
                Cell::new("Duplicates dropped").fg(Color::Yellow),
                Cell::new(fmt_num(self.duplicates)),
                Cell::new(""),
            ]);
        }
        if self.interrupted {
            table.add_row(vec![
                Cell::new("Interrupted").fg(Color::Red),
                Cell::new(format!("{} not processed", fmt_num(self.remaining()))),
                Cell::new(""),
            ]);
        }
        table.add_row(vec![
            Cell::new("Time"),
            Cell::new(format!("{:.1}s", self.elapsed.as_secs_f64())),
            Cell::new(""),
        ]);

        format!("\n{table}")
    }

    /// Minimal summary (non-TTY mode)
    pub fn log(&self) {
        log::info!(
            "Exported {}/{} identifiers ({} skipped) in {:.1}s",
            fmt_num(self.exported),
            fmt_num(self.requested),
            fmt_num(self.skipped),
            self.elapsed.as_secs_f64()
        );
        for (name, stats) in &self.sources {
            log::info!("  {name}: {} hits, {} misses", stats.hits, stats.misses);
        }
        if self.interrupted {
            log::warn!("Interrupted: {} identifiers not processed", self.remaining());
        }
        if let Some(path) = &self.output_path {
            log::info!("Output: {}", path.display());
        }
    }
}

/// Thousands separators
fn fmt_num(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_num_thousands() {
        assert_eq!(fmt_num(0), "0");
        assert_eq!(fmt_num(1000), "1,000");
        assert_eq!(fmt_num(1234567), "1,234,567");
    }

    #[test]
    fn source_stats_accumulate() {
        let mut s = RunSummary::new(3);
        s.record_source("deals", true);
        s.record_source("deals", false);
        s.record_source("deals", true);
        assert_eq!(s.source("deals"), SourceStats { hits: 2, misses: 1 });
        assert_eq!(s.source("other"), SourceStats::default());
    }

    #[test]
    fn remaining_after_interrupt() {
        let s = RunSummary {
            requested: 10,
            exported: 3,
            skipped: 1,
            interrupted: true,
            ..Default::default()
        };
        assert_eq!(s.remaining(), 6);
        assert!(s.format_table().contains("6 not processed"));
    }
}
