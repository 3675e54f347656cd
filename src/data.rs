//! Loading of timestamped series from CSV files.

use crate::config::InputConfig;
use crate::series::TimeSeries;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use std::{fmt, fs::File, io::Read, mem, path::Path};

/// Cells read as missing values, compared case-insensitively.
const MISSING_MARKERS: [&str; 4] = ["na", "nan", "null", "none"];

/// Timestamp read from an input file.
///
/// All timestamps of a file are of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Stamp {
    /// Integer index.
    Index(i64),
    /// Calendar date in `YYYY-MM-DD` format.
    Date(NaiveDate),
}

impl Stamp {
    fn parse(cell: &str) -> Result<Self> {
        if let Ok(idx) = cell.parse::<i64>() {
            return Ok(Stamp::Index(idx));
        }
        let date = NaiveDate::parse_from_str(cell, "%Y-%m-%d")
            .with_context(|| format!("timestamp {cell:?} is neither an integer nor a date"))?;
        Ok(Stamp::Date(date))
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stamp::Index(idx) => write!(f, "{idx}"),
            Stamp::Date(date) => write!(f, "{date}"),
        }
    }
}

fn parse_val(cell: &str) -> Result<Option<f64>> {
    if cell.is_empty()
        || MISSING_MARKERS
            .iter()
            .any(|marker| cell.eq_ignore_ascii_case(marker))
    {
        return Ok(None);
    }
    let val = cell
        .parse::<f64>()
        .with_context(|| format!("value {cell:?} is not a number"))?;
    Ok(Some(val))
}

/// Read a series from CSV data with a header row.
///
/// # Errors
/// Returns an error if a column is absent, a cell cannot be parsed, the
/// timestamps mix kinds, or the timestamps are not strictly increasing.
pub fn read_series<R: Read>(reader: R, input: &InputConfig) -> Result<TimeSeries<Stamp>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().context("failed to read header")?.clone();
    let find_column = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .with_context(|| format!("column {name:?} not found in {headers:?}"))
    };
    let i_stamp = find_column(&input.timestamp_column)?;
    let i_val = find_column(&input.value_column)?;

    let mut stamps: Vec<Stamp> = Vec::new();
    let mut vals = Vec::new();
    for (i_row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read row {i_row}"))?;

        let stamp_cell = record.get(i_stamp).unwrap_or_default();
        let stamp = Stamp::parse(stamp_cell).with_context(|| format!("invalid row {i_row}"))?;
        if let Some(first) = stamps.first() {
            if mem::discriminant(first) != mem::discriminant(&stamp) {
                bail!("row {i_row} mixes timestamp kinds: {first} and {stamp}");
            }
        }

        let val_cell = record.get(i_val).unwrap_or_default();
        let val = parse_val(val_cell).with_context(|| format!("invalid row {i_row}"))?;

        stamps.push(stamp);
        vals.push(val);
    }

    TimeSeries::new(stamps, vals)
}

/// Load a series from a CSV file.
pub fn load_series<P: AsRef<Path>>(file: P, input: &InputConfig) -> Result<TimeSeries<Stamp>> {
    let file = file.as_ref();
    let reader = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let series = read_series(reader, input).with_context(|| format!("failed to read {file:?}"))?;
    log::info!("loaded {} points from {file:?}", series.len());
    Ok(series)
}
