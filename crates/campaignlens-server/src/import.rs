//! CSV import with column renaming.
//!
//! Accepts the canonical export format as well as the legacy SQL and
//! title-case spreadsheet headers; see `campaignlens_core::schema_map`.

use std::io::Read;

use serde::Serialize;
use thiserror::Error;

use campaignlens_core::record::MetricRecord;
use campaignlens_core::schema_map::{resolve_column, Field, RecordBuilder};

const REQUIRED: [Field; 3] = [Field::Date, Field::Channel, Field::Sessions];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    /// 1-based line number in the uploaded file.
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub records: Vec<MetricRecord>,
    pub rejected: Vec<RejectedRow>,
    /// Header cells that did not map to any field.
    pub ignored_columns: Vec<String>,
}

pub fn parse_csv<R: Read>(reader: R) -> Result<ImportOutcome, ImportError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut outcome = ImportOutcome::default();
    let mut mapping: Vec<Option<Field>> = Vec::new();
    for name in rdr.headers()?.iter() {
        let field = resolve_column(name);
        if field.is_none() {
            outcome.ignored_columns.push(name.to_string());
        }
        mapping.push(field);
    }
    for required in REQUIRED {
        if !mapping.contains(&Some(required)) {
            return Err(ImportError::MissingColumn(required.name()));
        }
    }

    for row in rdr.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                outcome.rejected.push(RejectedRow {
                    line: e.position().map(|p| p.line()).unwrap_or_default(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let mut builder = RecordBuilder::new();
        for (field, value) in mapping.iter().zip(row.iter()) {
            if let Some(field) = field {
                builder.set(*field, value);
            }
        }
        match builder.build() {
            Ok(record) => outcome.records.push(record),
            Err(e) => outcome.rejected.push(RejectedRow {
                line,
                reason: e.to_string(),
            }),
        }
    }
    Ok(outcome)
}
