use chrono::NaiveDate;
use csv::ReaderBuilder;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use super::{DataSource, SeriesRequest, SourceError};
use crate::series::Observation;

/// Reads `<root>/<dataset>/<instrument>.csv`.
///
/// Each file has a header row with a date column (default `date`), the requested value
/// column (`request.field`) and optionally one column per filter dimension. A row is
/// kept when its date is inside the request range and every filter whose column exists
/// matches. Rows with an empty value cell are treated as missing observations.
///
/// ```text
/// date,tenor,deltaStrike,location,impliedVolatility
/// 2020-09-07,3m,DN,NYC,0.0712
/// 2020-09-08,3m,DN,NYC,0.0735
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    root: PathBuf,
    date_column: String,
    date_format: String,
}

impl CsvSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            date_column: "date".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }

    pub fn with_date_column(mut self, column: &str) -> Self {
        self.date_column = column.to_string();
        self
    }

    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    /// Path of the file backing `(dataset, instrument)`.
    pub fn path_for(&self, dataset: &str, instrument: &str) -> PathBuf {
        self.root.join(dataset).join(format!("{}.csv", instrument))
    }
}

impl DataSource for CsvSource {
    fn get_series(&self, request: &SeriesRequest) -> Result<Vec<Observation>, SourceError> {
        let path = self.path_for(&request.dataset, request.instrument.as_str());
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound {
                    dataset: request.dataset.clone(),
                    instrument: request.instrument.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers = reader.headers()?.clone();

        if !headers.iter().any(|h| h == self.date_column) {
            return Err(SourceError::InvalidData(format!(
                "{}: missing date column '{}'",
                path.display(),
                self.date_column
            )));
        }
        if !headers.iter().any(|h| h == request.field) {
            return Err(SourceError::InvalidData(format!(
                "{}: missing value column '{}'",
                path.display(),
                request.field
            )));
        }

        let active_filters: Vec<(&String, &String)> = request
            .filters
            .iter()
            .filter(|(column, _)| {
                let present = headers.iter().any(|h| h == column.as_str());
                if !present {
                    debug!("{}: no '{}' column, filter ignored", path.display(), column);
                }
                present
            })
            .collect();

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in reader.deserialize() {
            let record: HashMap<String, String> = record?;

            if !active_filters
                .iter()
                .all(|(column, wanted)| record.get(column.as_str()) == Some(*wanted))
            {
                continue;
            }

            let raw_date = record.get(&self.date_column).map(String::as_str).unwrap_or("");
            let date = NaiveDate::parse_from_str(raw_date.trim(), &self.date_format).map_err(|e| {
                SourceError::InvalidData(format!(
                    "{}: bad date '{}': {}",
                    path.display(),
                    raw_date,
                    e
                ))
            })?;
            if date < request.start || date > request.end {
                continue;
            }

            let raw_value = record.get(&request.field).map(|s| s.trim()).unwrap_or("");
            if raw_value.is_empty() {
                skipped += 1;
                continue;
            }
            let value: f64 = raw_value.parse().map_err(|_| {
                SourceError::InvalidData(format!(
                    "{}: bad {} value '{}' on {}",
                    path.display(),
                    request.field,
                    raw_value,
                    date
                ))
            })?;
            rows.push((date, value));
        }

        if skipped > 0 {
            warn!(
                "{}: {} rows without a {} value",
                path.display(),
                skipped,
                request.field
            );
        }

        Ok(rows)
    }
}
