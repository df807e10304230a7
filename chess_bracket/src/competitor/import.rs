//! CSV competitor import.
//!
//! Expected header: `nome,curso,telefone,periodo,dias_semana`. Rows that fail
//! to parse are reported as `line N: reason` and skipped; the remaining rows
//! are returned for registration.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::io::Read;

use super::models::NewCompetitor;
use crate::availability::{DaySet, Period};
use crate::bracket::errors::{BracketError, BracketResult};

const REQUIRED_COLUMNS: [&str; 5] = ["nome", "curso", "telefone", "periodo", "dias_semana"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    nome: String,
    curso: String,
    telefone: String,
    periodo: String,
    dias_semana: String,
}

impl CsvRow {
    fn into_competitor(self) -> BracketResult<NewCompetitor> {
        let period: Period = self.periodo.to_lowercase().parse()?;
        let days = DaySet::parse(&self.dias_semana)?;

        NewCompetitor {
            name: self.nome,
            course: self.curso,
            phone: self.telefone,
            period,
            days,
        }
        .validate()
    }
}

/// Rows accepted and rejected by the parser
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub competitors: Vec<NewCompetitor>,
    pub errors: Vec<String>,
}

/// Outcome reported to the caller after registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<String>,
}

/// Parse a CSV document into registration payloads
///
/// Fails only when the header itself is unusable.
pub fn parse_competitors<R: Read>(input: R) -> BracketResult<ParsedImport> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(BracketError::Validation(format!(
                "missing CSV column: {}",
                column
            )));
        }
    }

    let mut parsed = ParsedImport::default();
    for result in reader.records() {
        match result {
            Ok(record) => {
                let line = line_of(&record);
                match parse_record(&record, &headers) {
                    Ok(competitor) => parsed.competitors.push(competitor),
                    Err(e) => parsed.errors.push(format!("line {}: {}", line, e)),
                }
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                parsed.errors.push(format!("line {}: {}", line, e));
            }
        }
    }

    log::debug!(
        "Parsed competitor CSV: {} valid rows, {} rejected",
        parsed.competitors.len(),
        parsed.errors.len()
    );

    Ok(parsed)
}

fn parse_record(record: &StringRecord, headers: &StringRecord) -> BracketResult<NewCompetitor> {
    let row: CsvRow = record.deserialize(Some(headers))?;
    row.into_competitor()
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}
