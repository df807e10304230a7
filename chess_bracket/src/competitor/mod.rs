//! Competitor registry types and CSV import.

pub mod import;
pub mod models;

pub use import::{ImportReport, ParsedImport, parse_competitors};
pub use models::{Competitor, CompetitorFilter, CompetitorId, NewCompetitor};
