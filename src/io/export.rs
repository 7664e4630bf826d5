//! Export the consolidated table to CSV and read it back.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! `Date,GHI,PR`, ISO dates, one row per date, ascending.
//!
//! Writes are all-or-nothing: content goes to a temporary file next to the
//! destination, which is then renamed over it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::domain::{ColumnNames, ConsolidatedRow, DateOrder, InputKind, MetricKind};
use crate::error::AppError;
use crate::io::ingest::{RowError, build_header_map, column_index, get_required, parse_date};
use crate::merge::dedup_rows;

/// Write consolidated rows to `path`, replacing any existing file.
pub fn write_consolidated_csv<'a, I>(path: &Path, rows: I) -> Result<usize, AppError>
where
    I: IntoIterator<Item = &'a ConsolidatedRow>,
{
    let mut written = 0usize;
    write_atomic(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        for row in rows {
            writer.serialize(row)?;
            written += 1;
        }
        writer.flush()
    })?;

    info!(path = %path.display(), rows = written, "Consolidated CSV written");
    Ok(written)
}

/// A previously exported table, re-read.
#[derive(Debug, Clone)]
pub struct ConsolidatedRead {
    pub rows: Vec<ConsolidatedRow>,
    pub row_errors: Vec<RowError>,
    pub duplicates: usize,
}

/// Read a `Date,GHI,PR` file back into sorted, date-unique rows.
///
/// Headers are matched like source headers (case-insensitive, BOM tolerant),
/// so a table re-saved by a spreadsheet still loads. Rows that fail to parse
/// or hold out-of-range values are skipped and reported, mirroring source
/// ingest. A file that cannot be opened or lacks a column is
/// `SourceUnavailable`.
pub fn read_consolidated_csv(path: &Path) -> Result<ConsolidatedRead, AppError> {
    let unavailable = |message: String| {
        warn!(path = %path.display(), %message, "Consolidated CSV unusable");
        AppError::SourceUnavailable {
            input: InputKind::Consolidated,
            root: path.to_path_buf(),
            skipped: 1,
        }
    };

    let file = File::open(path).map_err(|e| unavailable(format!("Failed to open: {e}")))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| unavailable(format!("Failed to read headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    let columns = ColumnNames::default();
    let idx = ColumnIdx {
        date: column_index(&header_map, &columns.date).map_err(&unavailable)?,
        ghi: column_index(&header_map, &columns.ghi).map_err(&unavailable)?,
        pr: column_index(&header_map, &columns.pr).map_err(&unavailable)?,
    };

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let line = i + 2;
        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, &idx, columns.date_order));
        match parsed {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError {
                file: path.to_path_buf(),
                line,
                message,
            }),
        }
    }

    if !row_errors.is_empty() {
        warn!(path = %path.display(), skipped_rows = row_errors.len(), "Malformed rows skipped");
    }

    let (rows, duplicates) = dedup_rows(rows);
    if duplicates > 0 {
        warn!(path = %path.display(), duplicates, "Duplicate dates resolved (last row wins)");
    }

    Ok(ConsolidatedRead {
        rows,
        row_errors,
        duplicates,
    })
}

struct ColumnIdx {
    date: usize,
    ghi: usize,
    pr: usize,
}

fn parse_row(record: &StringRecord, idx: &ColumnIdx, order: DateOrder) -> Result<ConsolidatedRow, String> {
    let date = parse_date(get_required(record, idx.date, "Date")?, order)?;
    let ghi = parse_value(record, idx.ghi, MetricKind::Ghi)?;
    let pr = parse_value(record, idx.pr, MetricKind::Pr)?;
    Ok(ConsolidatedRow { date, ghi, pr })
}

fn parse_value(record: &StringRecord, idx: usize, kind: MetricKind) -> Result<f64, String> {
    let raw = get_required(record, idx, kind.label())?;
    let value = raw
        .parse::<f64>()
        .map_err(|_| format!("Non-numeric {kind} value '{raw}'."))?;
    if !kind.accepts(value) {
        return Err(format!("Out-of-range {kind} value {value}."));
    }
    Ok(value)
}

/// Write through a temporary sibling file and rename it over `path`.
///
/// Any failure (missing parent, permissions, encoder error) leaves the
/// destination untouched and is reported as `WriteFailure`.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<(), AppError>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let dir: PathBuf = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| AppError::write_failure(path, e))?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write(&mut out).map_err(|e| AppError::write_failure(path, e))?;
        out.flush().map_err(|e| AppError::write_failure(path, e))?;
    }
    tmp.persist(path)
        .map_err(|e| AppError::write_failure(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_rows() -> Vec<ConsolidatedRow> {
        vec![
            ConsolidatedRow {
                date: d(2019, 7, 1),
                ghi: 3.256,
                pr: 69.575,
            },
            ConsolidatedRow {
                date: d(2019, 7, 2),
                ghi: 0.1,
                pr: 79.31,
            },
            ConsolidatedRow {
                date: d(2020, 2, 29),
                ghi: 6.0,
                pr: 100.0,
            },
        ]
    }

    #[test]
    fn writes_header_and_iso_dates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("processed_solar_data.csv");
        let n = write_consolidated_csv(&path, &sample_rows()[..1]).unwrap();
        assert_eq!(n, 1);

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Date,GHI,PR"));
        assert_eq!(lines.next(), Some("2019-07-01,3.256,69.575"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn export_then_read_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.csv");
        let rows = sample_rows();
        write_consolidated_csv(&path, &rows).unwrap();

        let back = read_consolidated_csv(&path).unwrap();
        assert_eq!(back.rows, rows);
        assert!(back.row_errors.is_empty());
        assert_eq!(back.duplicates, 0);
    }

    #[test]
    fn overwrites_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.csv");
        fs::write(&path, "stale content that is much longer than the new export\n".repeat(50)).unwrap();

        write_consolidated_csv(&path, &sample_rows()[..1]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn missing_parent_is_write_failure_and_leaves_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("no/such/dir/out.csv");
        let err = write_consolidated_csv(&path, &sample_rows()).unwrap_err();
        assert!(matches!(err, AppError::WriteFailure { .. }));
        assert_eq!(err.exit_code(), 4);
        assert!(!path.exists());
    }

    #[test]
    fn destination_is_a_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("taken");
        fs::create_dir(&path).unwrap();
        let err = write_consolidated_csv(&path, &sample_rows()).unwrap_err();
        assert!(matches!(err, AppError::WriteFailure { .. }));
        assert!(path.is_dir());
    }

    #[test]
    fn read_skips_bad_rows_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("in.csv");
        fs::write(
            &path,
            "Date,GHI,PR\n2020-01-02,4.0,71\n2020-01-01,3.0,70\nbad,1,1\n2020-01-03,-1,70\n2020-01-04,2,101\n",
        )
        .unwrap();

        let back = read_consolidated_csv(&path).unwrap();
        let dates: Vec<_> = back.rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2020, 1, 1), d(2020, 1, 2)]);
        assert_eq!(back.row_errors.len(), 3);
        assert_eq!(back.row_errors[0].line, 4);
    }

    #[test]
    fn read_accepts_resaved_headers() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("resaved.csv");
        fs::write(&path, "\u{feff}date,ghi , pr\n2020-01-01,3.5,71.25\n").unwrap();

        let back = read_consolidated_csv(&path).unwrap();
        assert_eq!(
            back.rows,
            vec![ConsolidatedRow {
                date: d(2020, 1, 1),
                ghi: 3.5,
                pr: 71.25,
            }]
        );
    }

    #[test]
    fn read_reorders_columns_by_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reordered.csv");
        fs::write(&path, "PR,Date,GHI\n70,2020-01-01,2.0\n").unwrap();

        let back = read_consolidated_csv(&path).unwrap();
        assert_eq!(back.rows[0].pr, 70.0);
        assert_eq!(back.rows[0].ghi, 2.0);
    }

    #[test]
    fn unusable_input_is_source_unavailable() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.csv");
        let err = read_consolidated_csv(&missing).unwrap_err();
        assert!(matches!(
            err,
            AppError::SourceUnavailable {
                input: InputKind::Consolidated,
                ..
            }
        ));
        assert_eq!(err.exit_code(), 2);

        let no_pr = tmp.path().join("no_pr.csv");
        fs::write(&no_pr, "Date,GHI\n2020-01-01,3.0\n").unwrap();
        assert!(matches!(
            read_consolidated_csv(&no_pr),
            Err(AppError::SourceUnavailable { .. })
        ));
    }
}
