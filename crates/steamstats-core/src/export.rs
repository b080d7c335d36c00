//! Tab-separated output sinks

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::record::{AppId, MergedRecord};

/// Output columns, in order. Absent fields are written as empty cells.
pub const COLUMNS: &[&str] = &[
    "export_date",
    "export_time",
    "appid",
    "url",
    "name",
    "type",
    "required_age",
    "is_free",
    "developers",
    "publishers",
    "windows",
    "mac",
    "linux",
    "genres",
    "release_date",
    "num_reviews",
    "review_score",
    "review_score_desc",
    "total_positive",
    "total_negative",
    "total_reviews",
    "achievements_achieved",
    "achievements_total",
    "achievements_percentage",
    "playtime_forever",
    "playtime_windows",
    "playtime_mac",
    "playtime_linux",
    "itad_plain",
    "historical_low_price",
    "historical_low_currency",
    "historical_low_shop",
    "current_price",
    "current_price_currency",
    "current_price_shop",
    "howlongtobeat_name",
    "howlongtobeat_url",
    "howlongtobeat_main",
    "howlongtobeat_main_extra",
    "howlongtobeat_completionist",
    "opencritic_name",
    "opencritic_tier",
    "opencritic_median_score",
    "opencritic_reviews_number",
];

/// Make a value safe for a TSV cell
pub fn escape_cell(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

fn format_row(record: &MergedRecord, columns: &[&str]) -> String {
    let cells: Vec<String> = columns
        .iter()
        .map(|col| {
            record
                .get(col)
                .map(|v| escape_cell(&v.to_string()))
                .unwrap_or_default()
        })
        .collect();
    cells.join("\t")
}

/// Read the header line of an existing, non-empty file
fn existing_header(path: &Path) -> io::Result<Option<String>> {
    if !path.is_file() || fs::metadata(path)?.len() == 0 {
        return Ok(None);
    }
    let mut line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut line)?;
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Open `path` for appending rows: a new (or empty) file gets the header
/// first, an existing one only gets rows. Returns whether the header matched.
fn open_append(path: &Path, header: &str) -> io::Result<(BufWriter<File>, bool)> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let previous = existing_header(path)?;
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    let matches = match previous {
        None => {
            writeln!(writer, "{header}")?;
            true
        }
        Some(prev) => prev == header,
    };
    Ok((writer, matches))
}

/// Incremental TSV writer for merged records.
///
/// Rows are buffered and flushed every `flush_every` rows so an interrupted
/// run keeps everything written up to the last flush.
pub struct TsvSink {
    writer: BufWriter<File>,
    path: PathBuf,
    columns: Vec<&'static str>,
    flush_every: usize,
    pending: usize,
    row_count: usize,
}

impl std::fmt::Debug for TsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsvSink")
            .field("path", &self.path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl TsvSink {
    /// Create or append to `path` using the standard [`COLUMNS`]
    pub fn open(path: &Path, flush_every: usize) -> io::Result<Self> {
        Self::with_columns(path, COLUMNS, flush_every)
    }

    pub fn with_columns(path: &Path, columns: &[&'static str], flush_every: usize) -> io::Result<Self> {
        let header = columns.join("\t");
        let (writer, matches) = open_append(path, &header)?;
        if !matches {
            log::warn!(
                "{}: existing header differs from current columns, appending anyway",
                path.display()
            );
        }
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            columns: columns.to_vec(),
            flush_every: flush_every.max(1),
            pending: 0,
            row_count: 0,
        })
    }

    pub fn write_record(&mut self, record: &MergedRecord) -> io::Result<()> {
        writeln!(self.writer, "{}", format_row(record, &self.columns))?;
        self.row_count += 1;
        self.pending += 1;
        if self.pending >= self.flush_every {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.pending = 0;
        self.writer.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and return the number of rows written by this sink
    pub fn finish(mut self) -> io::Result<usize> {
        self.flush()?;
        Ok(self.row_count)
    }
}

/// Lowercase ASCII slug: alphanumerics kept, everything else collapsed to '-'
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut dash = false;
    for c in value.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if dash && !slug.is_empty() {
                slug.push('-');
            }
            dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            dash = true;
        }
    }
    slug
}

/// Per-identifier file name: `{appid}_{slug}.csv`, or `{appid}.csv`
pub fn record_filename(appid: AppId, name: Option<&str>) -> String {
    match name.map(slugify).filter(|s| !s.is_empty()) {
        Some(slug) => format!("{appid}_{slug}.csv"),
        None => format!("{appid}.csv"),
    }
}

/// Write one record to its own file under `dir` (create or append)
pub fn export_record(dir: &Path, record: &MergedRecord) -> io::Result<PathBuf> {
    let path = dir.join(record_filename(record.appid, record.name()));
    log::debug!("Writing {}", path.display());
    let mut sink = TsvSink::open(&path, 1)?;
    sink.write_record(record)?;
    sink.finish()?;
    Ok(path)
}

/// Write a plain table (header + rows) to `path`, replacing it
pub fn write_table(path: &Path, header: &[&str], rows: &[Vec<String>]) -> io::Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", header.join("\t"))?;
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        writeln!(writer, "{}", cells.join("\t"))?;
    }
    writer.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PartialRecord;
    use tempfile::TempDir;

    fn record(appid: AppId, name: &str) -> MergedRecord {
        let mut p = PartialRecord::new("catalog", appid);
        p.set("name", name);
        p.set("windows", true);
        MergedRecord::merge(appid, "2024-05-06", "07:08:09", [p])
    }

    #[test]
    fn new_file_gets_header_then_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut sink = TsvSink::open(&path, 10).unwrap();
        sink.write_record(&record(10, "Counter-Strike")).unwrap();
        assert_eq!(sink.finish().unwrap(), 1);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], COLUMNS.join("\t"));
        let cells: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(cells[0], "2024-05-06");
        assert_eq!(cells[2], "10");
        assert_eq!(cells[4], "Counter-Strike");
        assert_eq!(cells[10], "true");
        assert_eq!(cells[11], "");
    }

    #[test]
    fn existing_file_appends_without_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        TsvSink::open(&path, 1)
            .unwrap()
            .write_record(&record(10, "A"))
            .unwrap();
        let mut sink = TsvSink::open(&path, 1).unwrap();
        sink.write_record(&record(20, "B")).unwrap();
        sink.finish().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert_eq!(content.matches("export_date").count(), 1);
    }

    #[test]
    fn rows_flushed_incrementally() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut sink = TsvSink::open(&path, 2).unwrap();
        sink.write_record(&record(1, "a")).unwrap();
        sink.write_record(&record(2, "b")).unwrap();
        // Not finished: the two rows must already be on disk
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        drop(sink);
    }

    #[test]
    fn tabs_in_values_escaped() {
        assert_eq!(escape_cell("a\tb\nc"), "a b c");
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Half-Life 2: Episode One"), "half-life-2-episode-one");
        assert_eq!(slugify("  Portal  "), "portal");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn record_filename_fallback() {
        assert_eq!(record_filename(10, Some("Counter Strike")), "10_counter-strike.csv");
        assert_eq!(record_filename(10, Some("???")), "10.csv");
        assert_eq!(record_filename(10, None), "10.csv");
    }

    #[test]
    fn export_record_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = export_record(dir.path(), &record(70, "Half-Life")).unwrap();
        assert!(path.ends_with("70_half-life.csv"));
        assert_eq!(fs::read_to_string(path).unwrap().lines().count(), 2);
    }

    #[test]
    fn write_table_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.csv");
        write_table(&path, &["appid"], &[vec!["1".into()], vec!["2".into()]]).unwrap();
        write_table(&path, &["appid"], &[vec!["3".into()]]).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "appid\n3\n");
    }
}
