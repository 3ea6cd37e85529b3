//! Statistics table, scaling report and card result persistence.
//!
//! The statistics table is a headerless CSV file of
//! `worker_count,elapsed_seconds` rows. Rows are only ever appended, one
//! complete line per write. The card record and the chart are replaced
//! atomically through a temporary sibling file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bench::{StatisticsRecord, StatisticsSink};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed statistics row {line} in {}: {reason}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Malformed record in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Append-only table of benchmark timings.
#[derive(Debug, Clone)]
pub struct StatisticsTable {
    path: PathBuf,
}

impl StatisticsTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row and flushes it to disk.
    ///
    /// A failed append truncates the file back to its previous length, so a
    /// row is written fully or not at all.
    pub fn append(&self, record: &StatisticsRecord) -> Result<(), PersistenceError> {
        // `{}` on f64 prints the shortest string that parses back to the same value.
        let line = format!("{},{}\n", record.worker_count, record.elapsed_seconds);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PersistenceError::io(&self.path, e))?;
        append_row(&mut file, line.as_bytes()).map_err(|e| PersistenceError::io(&self.path, e))
    }

    /// Reads every row in file order.
    pub fn load(&self) -> Result<Vec<StatisticsRecord>, PersistenceError> {
        let text =
            fs::read_to_string(&self.path).map_err(|e| PersistenceError::io(&self.path, e))?;

        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                parse_row(line).map_err(|reason| PersistenceError::MalformedRow {
                    path: self.path.clone(),
                    line: i + 1,
                    reason,
                })
            })
            .collect()
    }

    /// Replays the table into a report.
    pub fn report(&self) -> Result<ScalingReport, PersistenceError> {
        Ok(ScalingReport::from_records(&self.load()?))
    }
}

impl StatisticsSink for StatisticsTable {
    fn append(&mut self, record: &StatisticsRecord) -> Result<(), PersistenceError> {
        StatisticsTable::append(self, record)
    }
}

fn append_row<F: RowFile>(file: &mut F, row: &[u8]) -> io::Result<()> {
    let len = file.len()?;
    let written = file.write_all(row).and_then(|()| file.sync_all());
    if written.is_err() {
        let _ = file.set_len(len);
    }
    written
}

/// File operations used by a table append.
trait RowFile: Write {
    fn len(&self) -> io::Result<u64>;
    fn set_len(&self, len: u64) -> io::Result<()>;
    fn sync_all(&self) -> io::Result<()>;
}

impl RowFile for File {
    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn set_len(&self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn sync_all(&self) -> io::Result<()> {
        File::sync_all(self)
    }
}

fn parse_row(line: &str) -> Result<StatisticsRecord, String> {
    let mut fields = line.split(',').map(str::trim);
    let (Some(workers), Some(seconds), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(format!("expected 2 fields in '{}'", line));
    };

    let worker_count: usize = workers
        .parse()
        .map_err(|_| format!("invalid worker count '{}'", workers))?;
    let elapsed_seconds: f64 = seconds
        .parse()
        .map_err(|_| format!("invalid elapsed time '{}'", seconds))?;

    if worker_count == 0 {
        return Err("worker count must be at least 1".into());
    }
    if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
        return Err(format!("elapsed time must be non-negative, got {}", seconds));
    }

    Ok(StatisticsRecord {
        worker_count,
        elapsed_seconds,
    })
}

/// Elapsed search time per worker count, ordered by worker count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalingReport(BTreeMap<usize, f64>);

impl ScalingReport {
    /// Builds a report from table rows; a later row replaces an earlier one
    /// for the same worker count.
    pub fn from_records(records: &[StatisticsRecord]) -> Self {
        Self(
            records
                .iter()
                .map(|r| (r.worker_count, r.elapsed_seconds))
                .collect(),
        )
    }

    pub fn get(&self, worker_count: usize) -> Option<f64> {
        self.0.get(&worker_count).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.0.iter().map(|(&w, &t)| (w, t))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest elapsed time in the report, or 0 when empty.
    pub fn max_elapsed(&self) -> f64 {
        self.0.values().copied().fold(0.0, f64::max)
    }

    /// Worker count with the smallest elapsed time.
    pub fn fastest(&self) -> Option<(usize, f64)> {
        self.iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// The result record written after a successful search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(deserialize_with = "crate::config::digit_string")]
    pub card_number: String,
}

impl CardRecord {
    pub fn new(card_number: impl Into<String>) -> Self {
        Self {
            card_number: card_number.into(),
        }
    }

    /// Writes the record as JSON, replacing any previous file atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(self).map_err(|source| PersistenceError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, &json)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| PersistenceError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Writes `contents` to a temporary sibling and renames it over `path`.
///
/// Either the old file or the complete new file is visible, never a
/// partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistenceError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| {
            PersistenceError::io(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?
        .to_string_lossy();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    let written = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(PersistenceError::io(path, e));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A fresh path under the system temp directory.
    pub(crate) fn temp_path(name: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("card_finder-{}-{}-{}", std::process::id(), n, name))
    }

    #[test]
    fn test_table_round_trip_is_exact() {
        let table = StatisticsTable::new(temp_path("stats.csv"));
        let records = vec![
            StatisticsRecord::new(1, 12.345678901234567),
            StatisticsRecord::new(2, 6.1),
            StatisticsRecord::new(3, 0.0),
            StatisticsRecord::new(4, 1e-9),
        ];
        for record in &records {
            table.append(record).unwrap();
        }

        assert_eq!(table.load().unwrap(), records);
        let _ = fs::remove_file(table.path());
    }

    /// In-memory file that accepts at most `capacity` bytes.
    struct ShortFile {
        data: std::cell::RefCell<Vec<u8>>,
        capacity: usize,
    }

    impl Write for ShortFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut data = self.data.borrow_mut();
            let n = buf.len().min(self.capacity.saturating_sub(data.len()));
            data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl RowFile for ShortFile {
        fn len(&self) -> io::Result<u64> {
            Ok(self.data.borrow().len() as u64)
        }

        fn set_len(&self, len: u64) -> io::Result<()> {
            self.data.borrow_mut().truncate(len as usize);
            Ok(())
        }

        fn sync_all(&self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_append_leaves_no_partial_row() {
        let mut file = ShortFile {
            data: std::cell::RefCell::new(b"1,2.5\n".to_vec()),
            capacity: 10,
        };

        assert!(append_row(&mut file, b"2,1.25\n").is_err());
        assert_eq!(file.data.borrow().as_slice(), b"1,2.5\n");

        file.capacity = 64;
        append_row(&mut file, b"2,1.25\n").unwrap();
        assert_eq!(file.data.borrow().as_slice(), b"1,2.5\n2,1.25\n");
    }

    #[test]
    fn test_report_keeps_last_row_per_worker_count() {
        let report = ScalingReport::from_records(&[
            StatisticsRecord::new(2, 5.0),
            StatisticsRecord::new(1, 9.0),
            StatisticsRecord::new(2, 4.0),
        ]);
        assert_eq!(report.len(), 2);
        assert_eq!(report.iter().collect::<Vec<_>>(), vec![(1, 9.0), (2, 4.0)]);
        assert_eq!(report.max_elapsed(), 9.0);
        assert_eq!(report.fastest(), Some((2, 4.0)));
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let path = temp_path("bad.csv");
        fs::write(&path, "1,2.5\n\n2,abc\n").unwrap();

        let err = StatisticsTable::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistenceError::MalformedRow { line: 3, .. }));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_parse_row_rejects_negative_time() {
        assert!(parse_row("1,-0.5").is_err());
        assert!(parse_row("0,1.0").is_err());
        assert!(parse_row("1,2,3").is_err());
        assert!(parse_row(" 3 , 1.5 ").is_ok());
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let table = StatisticsTable::new(temp_path("missing.csv"));
        assert!(matches!(table.load(), Err(PersistenceError::Io { .. })));
    }

    #[test]
    fn test_card_record_round_trip() {
        let path = temp_path("card.json");
        CardRecord::new("4111112222220000").save(&path).unwrap();

        assert_eq!(
            CardRecord::load(&path).unwrap(),
            CardRecord::new("4111112222220000")
        );
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_card_record_accepts_number() {
        let record: CardRecord = serde_json::from_str(r#"{"card_number": 4111112222220000}"#).unwrap();
        assert_eq!(record.card_number, "4111112222220000");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let path = temp_path("atomic.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let tmp = path.with_file_name(format!(
            ".{}.tmp",
            path.file_name().unwrap().to_string_lossy()
        ));
        assert!(!tmp.exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_write_into_missing_directory_fails() {
        let path = temp_path("no-such-dir").join("card.json");
        assert!(matches!(
            write_atomic(&path, b"x"),
            Err(PersistenceError::Io { .. })
        ));
        assert!(!path.exists());
    }
}
