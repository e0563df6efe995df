//! Workload CSV reader (§6): `cloudlet_id, arrival_time, length, pes_required, file_size, output_size`.

use log::warn;
use thiserror::Error;

use crate::descriptor::WorkloadDescriptor;

/// Fatal, file-level workload errors. Per-row problems are recoverable and
/// never surface as this type (§7 `WorkloadError` policy): they're logged
/// and the row is skipped.
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("could not open workload file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parses a workload CSV file, skipping malformed rows with a warning.
/// Rows are returned in file order (the feeder is responsible for sorting).
pub fn read_csv(path: &str) -> Result<Vec<WorkloadDescriptor>, WorkloadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| WorkloadError::Io {
        path: path.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
    })?;

    let mut out = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("workload row {row_idx} unreadable, skipping: {e}");
                continue;
            }
        };
        match parse_row(&record) {
            Some(d) => out.push(d),
            None => warn!("workload row {row_idx} malformed, skipping: {:?}", record),
        }
    }
    Ok(out)
}

fn parse_row(record: &csv::StringRecord) -> Option<WorkloadDescriptor> {
    if record.len() < 6 {
        return None;
    }
    Some(WorkloadDescriptor {
        id: record.get(0)?.trim().parse().ok()?,
        arrival_time: record.get(1)?.trim().parse().ok()?,
        length_mi: record.get(2)?.trim().parse().ok()?,
        cores_required: record.get(3)?.trim().parse().ok()?,
        input_kb: record.get(4)?.trim().parse().ok()?,
        output_kb: record.get(5)?.trim().parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_well_formed_rows_and_skips_bad_ones() {
        let mut file = tempfile_with_content(
            "cloudlet_id,arrival_time,length,pes_required,file_size,output_size\n\
             0,0.0,100000,2,100,50\n\
             1,1.5,bogus,2,100,50\n\
             2,2.0,50000,4,10,5\n",
        );
        let path = file.path().to_str().unwrap().to_string();
        file.flush().unwrap();
        let descriptors = read_csv(&path).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].id, 0);
        assert_eq!(descriptors[1].id, 2);
    }

    fn tempfile_with_content(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }
}
