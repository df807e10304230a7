//! Competitor data models.

use serde::{Deserialize, Serialize};

use crate::availability::{Availability, DaySet, Period};
use crate::bracket::errors::{BracketError, BracketResult};

/// Competitor ID type
pub type CompetitorId = i64;

/// Registered competitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
    /// Course or cohort label
    pub course: String,
    pub phone: String,
    pub period: Period,
    pub days: DaySet,
}

impl Competitor {
    pub fn availability(&self) -> Availability {
        Availability::new(self.period, self.days.clone())
    }
}

/// Registration payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCompetitor {
    pub name: String,
    pub course: String,
    pub phone: String,
    pub period: Period,
    pub days: DaySet,
}

impl NewCompetitor {
    /// Trim text fields and reject records that can never be scheduled
    pub fn validate(mut self) -> BracketResult<Self> {
        self.name = self.name.trim().to_string();
        self.course = self.course.trim().to_string();
        self.phone = self.phone.trim().to_string();

        if self.name.is_empty() {
            return Err(BracketError::Validation("name must not be empty".to_string()));
        }
        if self.days.is_empty() {
            return Err(BracketError::Validation(
                "at least one weekday is required".to_string(),
            ));
        }

        Ok(self)
    }
}

/// Listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompetitorFilter {
    pub period: Option<Period>,
    /// Keeps competitors sharing at least one of these days
    pub days: Option<DaySet>,
}

impl CompetitorFilter {
    pub fn matches(&self, competitor: &Competitor) -> bool {
        if self.period.is_some_and(|period| competitor.period != period) {
            return false;
        }

        match &self.days {
            Some(days) if !days.is_empty() => competitor.days.intersects(days),
            _ => true,
        }
    }
}
