use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes `records` as CSV with a header row derived from the record's field names.
///
/// An empty slice produces an empty document.
pub fn write_records<T: Serialize>(
    records: &[T],
    writer: impl Write,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_records_to_path<T: Serialize>(
    records: &[T],
    path: &Path,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_records(records, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::series::{ChartSample, TraceRecord};

    #[test]
    fn chart_samples_are_written_with_header() {
        let samples = vec![
            ChartSample {
                time: 0.0,
                mz: 1.0,
                mxy: 0.0,
            },
            ChartSample {
                time: 0.1,
                mz: 0.5,
                mxy: 0.25,
            },
        ];
        let mut buffer = Vec::new();
        write_records(&samples, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "time,mz,mxy");
        assert_eq!(lines[1], "0.0,1.0,0.0");
        assert_eq!(lines[2], "0.1,0.5,0.25");
    }

    #[test]
    fn trace_records_are_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        let records = vec![TraceRecord {
            tick: 1,
            time: 0.05,
            phase: "idle",
            b0_on: true,
            total_x: 0.0,
            total_y: 0.0,
            total_z: 1.0,
            water_x: 0.0,
            water_y: 0.0,
            water_z: 1.0,
            fat_x: 0.0,
            fat_y: 0.0,
            fat_z: 1.0,
        }];
        write_records_to_path(&records, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("tick,time,phase,b0_on,total_x"));
        assert!(content.contains("1,0.05,idle,true,0.0,0.0,1.0"));
    }

    #[test]
    fn empty_series_produces_empty_document() {
        let mut buffer = Vec::new();
        write_records::<ChartSample>(&[], &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn missing_directory_is_reported_as_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("chart.csv");
        let result = write_records_to_path::<ChartSample>(&[], &path);
        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}
