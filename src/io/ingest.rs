//! Partition discovery and CSV ingest.
//!
//! This module is responsible for turning a tree of per-month telemetry files
//! into a flat list of `Reading`s for one metric.
//!
//! Design goals:
//! - **Explicit enumeration**: which files are read is decided by a `Loader`,
//!   never by pattern matching inside the parser
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (files are read in sorted path order)
//! - **Separation of concerns**: no merge logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{ColumnNames, DateOrder, InputKind, MetricKind, PartitionLayout, Reading};
use crate::error::AppError;

/// The files that hold one metric's data, in read order.
#[derive(Debug, Clone)]
pub struct PartitionSet {
    pub kind: MetricKind,
    /// Location reported in errors when nothing usable is found.
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Supplies partition files for a metric.
pub trait Loader {
    fn partitions(&self, kind: MetricKind) -> Result<PartitionSet, AppError>;
}

/// Enumerates `<root>/<metric dir>/<partition>/*.<extension>`.
///
/// Each partition is a year-month directory (e.g. `2019-07/`). Files sitting
/// directly in the metric directory are not partitions and are ignored.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
    layout: PartitionLayout,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>, layout: PartitionLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }
}

impl Loader for DirectoryLoader {
    fn partitions(&self, kind: MetricKind) -> Result<PartitionSet, AppError> {
        let metric_root = self.root.join(self.layout.metric_dir(kind));
        let mut files = Vec::new();

        let entries = match std::fs::read_dir(&metric_root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(kind = %kind, root = %metric_root.display(), error = %e, "Cannot list metric directory");
                return Ok(PartitionSet {
                    kind,
                    root: metric_root,
                    files,
                });
            }
        };

        let mut partitions: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        partitions.sort();

        for partition in &partitions {
            let listing = match std::fs::read_dir(partition) {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(partition = %partition.display(), error = %e, "Cannot list partition");
                    continue;
                }
            };
            let mut partition_files: Vec<PathBuf> = listing
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && has_extension(path, &self.layout.extension))
                .collect();
            partition_files.sort();
            debug!(partition = %partition.display(), files = partition_files.len(), "Partition listed");
            files.extend(partition_files);
        }

        Ok(PartitionSet {
            kind,
            root: metric_root,
            files,
        })
    }
}

/// A caller-provided list of files per metric.
#[derive(Debug, Clone, Default)]
pub struct ListLoader {
    pub pr: Vec<PathBuf>,
    pub ghi: Vec<PathBuf>,
}

impl Loader for ListLoader {
    fn partitions(&self, kind: MetricKind) -> Result<PartitionSet, AppError> {
        let files = match kind {
            MetricKind::Pr => self.pr.clone(),
            MetricKind::Ghi => self.ghi.clone(),
        };
        let root = files
            .first()
            .and_then(|f| f.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(PartitionSet { kind, root, files })
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

/// A file that could not be used at all.
#[derive(Debug, Clone)]
pub struct FileError {
    pub file: PathBuf,
    pub message: String,
}

/// Ingest output for one metric: readings plus what was skipped along the way.
#[derive(Debug, Clone)]
pub struct SourceData {
    pub kind: MetricKind,
    pub readings: Vec<Reading>,
    pub files_read: usize,
    pub skipped_files: Vec<FileError>,
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
}

/// Read every file of a partition set into `Reading`s.
///
/// Files that cannot be opened or lack a required column are skipped. Rows with
/// an unparseable date or an unusable value are skipped and recorded. Fails
/// with `SourceUnavailable` only if no file at all could be read.
pub fn read_source(set: &PartitionSet, columns: &ColumnNames) -> Result<SourceData, AppError> {
    let kind = set.kind;
    let mut data = SourceData {
        kind,
        readings: Vec::new(),
        files_read: 0,
        skipped_files: Vec::new(),
        rows_read: 0,
        row_errors: Vec::new(),
    };

    for path in &set.files {
        match read_file(path, kind, columns, &mut data) {
            Ok(()) => data.files_read += 1,
            Err(message) => {
                warn!(kind = %kind, file = %path.display(), %message, "Skipping source file");
                data.skipped_files.push(FileError {
                    file: path.clone(),
                    message,
                });
            }
        }
    }

    if data.files_read == 0 {
        return Err(AppError::SourceUnavailable {
            input: InputKind::Metric(kind),
            root: set.root.clone(),
            skipped: data.skipped_files.len(),
        });
    }

    if !data.row_errors.is_empty() {
        warn!(
            kind = %kind,
            skipped_rows = data.row_errors.len(),
            rows_read = data.rows_read,
            "Malformed rows skipped"
        );
    }
    info!(
        kind = %kind,
        files = data.files_read,
        records = data.readings.len(),
        "Source read"
    );

    Ok(data)
}

fn read_file(path: &Path, kind: MetricKind, columns: &ColumnNames, data: &mut SourceData) -> Result<(), String> {
    let file = File::open(path).map_err(|e| format!("Failed to open: {e}"))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| format!("Failed to read headers: {e}"))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = column_index(&header_map, &columns.date)?;
    let value_idx = column_index(&header_map, columns.value_column(kind))?;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line, and lines are 1-based.
        let line = idx + 2;
        data.rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_reading(&record, date_idx, value_idx, kind, columns.date_order));

        match parsed {
            Ok(reading) => data.readings.push(reading),
            Err(message) => {
                debug!(file = %path.display(), line, %message, "Malformed row");
                data.row_errors.push(RowError {
                    file: path.to_path_buf(),
                    line,
                    message,
                });
            }
        }
    }

    Ok(())
}

fn parse_reading(
    record: &StringRecord,
    date_idx: usize,
    value_idx: usize,
    kind: MetricKind,
    order: DateOrder,
) -> Result<Reading, String> {
    let date = parse_date(get_required(record, date_idx, "date")?, order)?;
    let raw = get_required(record, value_idx, kind.label())?;
    let value = raw
        .parse::<f64>()
        .map_err(|_| format!("Non-numeric {kind} value '{raw}'."))?;
    if !kind.accepts(value) {
        return Err(format!("Out-of-range {kind} value {value}."));
    }
    Ok(Reading { date, value, kind })
}

pub(crate) fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

pub(crate) fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

pub(crate) fn column_index(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, String> {
    header_map
        .get(&normalize_header_name(name))
        .copied()
        .ok_or_else(|| format!("Missing required column: `{name}`"))
}

pub(crate) fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

/// Parse a calendar date in one of the accepted formats.
///
/// ISO dates are preferred. Slash/dash dates with the year last are read
/// month-first unless `order` says otherwise; a midnight timestamp may be
/// attached to ISO dates.
pub(crate) fn parse_date(s: &str, order: DateOrder) -> Result<NaiveDate, String> {
    const ISO_FMTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    let year_last: [&str; 2] = match order {
        DateOrder::MonthFirst => ["%m/%d/%Y", "%m-%d-%Y"],
        DateOrder::DayFirst => ["%d/%m/%Y", "%d-%m-%Y"],
    };

    for fmt in ISO_FMTS.iter().chain(year_last.iter()) {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    let expected = match order {
        DateOrder::MonthFirst => "YYYY-MM-DD, MM/DD/YYYY, MM-DD-YYYY, YYYY/MM/DD",
        DateOrder::DayFirst => "YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD",
    };
    Err(format!("Invalid date '{s}'. Expected one of: {expected}."))
}
