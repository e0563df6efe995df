//! Wind-turbine time-series CSV reader (§4.4, §6).
//!
//! Accepts both the simplified `(timestamp, power_kw)` form and the legacy
//! 18-column SCADA form (`Patv` at column index 14).

use chrono::NaiveDateTime;
use log::warn;
use thiserror::Error;

/// A single cleaned `(timestamp, power_kw)` sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindSample {
    pub timestamp: NaiveDateTime,
    pub power_kw: f64,
}

/// Fatal, file-level wind-data errors.
#[derive(Debug, Error)]
pub enum WindDataError {
    #[error("could not open wind data file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("wind data file {path} has no valid rows after cleaning")]
    Empty { path: String },
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    None
}

/// SCADA `Patv` column index in the legacy 18-column form.
const SCADA_PATV_COLUMN: usize = 14;

/// Reads a wind CSV file, returning cleaned, strictly-increasing samples.
///
/// Per §7 `WindDataError` policy: this never fails on a per-row basis (bad
/// power values default to `0.0`, duplicate/non-monotonic timestamps are
/// dropped with a warning); it only returns `Err` if the file can't be
/// opened, or if zero usable rows remain after cleaning.
pub fn read_wind_csv(path: &str) -> Result<Vec<WindSample>, WindDataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| WindDataError::Io {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
        })?;

    let mut raw_samples = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let Ok(record) = record else {
            warn!("wind data row {row_idx} unreadable, skipping");
            continue;
        };
        let Some(sample) = parse_row(&record) else {
            warn!("wind data row {row_idx} has no parseable timestamp, skipping");
            continue;
        };
        raw_samples.push(sample);
    }

    raw_samples.sort_by_key(|s| s.timestamp);
    let mut cleaned: Vec<WindSample> = Vec::with_capacity(raw_samples.len());
    for sample in raw_samples {
        if let Some(last) = cleaned.last() {
            if sample.timestamp <= last.timestamp {
                warn!(
                    "wind data duplicate/non-monotonic timestamp {} dropped",
                    sample.timestamp
                );
                continue;
            }
        }
        cleaned.push(sample);
    }

    if cleaned.is_empty() {
        return Err(WindDataError::Empty { path: path.to_string() });
    }
    Ok(cleaned)
}

fn parse_row(record: &csv::StringRecord) -> Option<WindSample> {
    let timestamp = parse_timestamp(record.get(0)?)?;
    let power_kw = if record.len() >= 18 {
        // legacy SCADA form
        record
            .get(SCADA_PATV_COLUMN)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    } else {
        record
            .get(1)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    Some(WindSample { timestamp, power_kw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_simple_form_and_sorts() {
        let file = write_file(
            "timestamp,power_kw\n\
             2021-01-01 00:10:00,150\n\
             2021-01-01 00:00:00,100\n\
             2021-01-01 00:00:00,999\n",
        );
        let samples = read_wind_csv(file.path().to_str().unwrap()).unwrap();
        // duplicate timestamp dropped, remaining two strictly increasing
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].power_kw, 100.0);
        assert_eq!(samples[1].power_kw, 150.0);
    }

    #[test]
    fn missing_power_defaults_to_zero() {
        let file = write_file("timestamp,power_kw\n2021-01-01 00:00:00,not_a_number\n");
        let samples = read_wind_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(samples[0].power_kw, 0.0);
    }

    #[test]
    fn empty_after_cleaning_is_fatal() {
        let file = write_file("timestamp,power_kw\nnot_a_timestamp,100\n");
        let result = read_wind_csv(file.path().to_str().unwrap());
        assert!(matches!(result, Err(WindDataError::Empty { .. })));
    }

    #[test]
    fn legacy_scada_form_reads_patv_column() {
        let header = "a,b,c,d,e,f,g,h,i,j,k,l,m,n,Patv,p,q,r";
        let row1 = "2021-01-01 00:00:00,,,,,,,,,,,,,,123.4,,,";
        let row2 = "2021-01-01 00:10:00,,,,,,,,,,,,,,200.0,,,";
        let file = write_file(&format!("{header}\n{row1}\n{row2}\n"));
        let samples = read_wind_csv(file.path().to_str().unwrap()).unwrap();
        assert_eq!(samples[0].power_kw, 123.4);
        assert_eq!(samples[1].power_kw, 200.0);
    }
}
