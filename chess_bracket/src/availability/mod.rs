//! Availability matching between competitors.
//!
//! Two competitors can meet for a game only if they share at least one
//! weekday and at least one part of the day. This module provides:
//! - Period and weekday parsing ([`Period`], [`DaySet`])
//! - The pairwise eligibility check ([`compatible`])
//! - A canonical grouping key used as a pairing fast path ([`availability_key`])
//!
//! ## Example
//!
//! ```
//! use chess_bracket::availability::{Availability, DaySet, Period, availability_key, compatible};
//!
//! let morning = Availability::new(Period::Morning, DaySet::parse("quarta e sexta").unwrap());
//! let full_day = Availability::new(Period::FullDay, DaySet::parse("sex").unwrap());
//!
//! assert!(compatible(&morning, &full_day));
//! assert_eq!(availability_key(&morning), "manha_qua-sex");
//! ```

pub mod days;

pub use days::{DaySet, Weekday};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Availability parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    #[error("Unknown weekday: {0}")]
    UnknownDay(String),

    #[error("Unknown period: {0}")]
    UnknownPeriod(String),
}

/// Part of the school day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayPart {
    Morning,
    Afternoon,
}

impl DayPart {
    pub fn token(&self) -> &'static str {
        match self {
            DayPart::Morning => "manha",
            DayPart::Afternoon => "tarde",
        }
    }
}

/// Registered study period of a competitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "manha")]
    Morning,
    #[serde(rename = "tarde")]
    Afternoon,
    /// Covers both morning and afternoon
    #[serde(rename = "integral")]
    FullDay,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Morning => "manha",
            Period::Afternoon => "tarde",
            Period::FullDay => "integral",
        }
    }
}

impl FromStr for Period {
    type Err = AvailabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manha" | "manhã" => Ok(Period::Morning),
            "tarde" => Ok(Period::Afternoon),
            "integral" => Ok(Period::FullDay),
            _ => Err(AvailabilityError::UnknownPeriod(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parts of the day covered by a period
pub fn period_set(period: Period) -> BTreeSet<DayPart> {
    match period {
        Period::Morning => BTreeSet::from([DayPart::Morning]),
        Period::Afternoon => BTreeSet::from([DayPart::Afternoon]),
        Period::FullDay => BTreeSet::from([DayPart::Morning, DayPart::Afternoon]),
    }
}

/// Parse a day representation into a day set
pub fn day_set(days: &str) -> Result<DaySet, AvailabilityError> {
    DaySet::parse(days)
}

/// Scheduling availability of one competitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub period: Period,
    pub days: DaySet,
}

impl Availability {
    pub fn new(period: Period, days: DaySet) -> Self {
        Self { period, days }
    }
}

/// Whether two competitors share a weekday and a part of the day.
///
/// Symmetric but not transitive.
pub fn compatible(a: &Availability, b: &Availability) -> bool {
    if !a.days.intersects(&b.days) {
        return false;
    }

    let parts_a = period_set(a.period);
    let parts_b = period_set(b.period);
    parts_a.intersection(&parts_b).next().is_some()
}

/// Canonical grouping key, e.g. `manha-tarde_qua-sex`.
///
/// Competitors with equal keys are always compatible (given a non-empty day
/// set); differing keys say nothing and still need [`compatible`].
pub fn availability_key(availability: &Availability) -> String {
    let periods: Vec<_> = period_set(availability.period)
        .iter()
        .map(DayPart::token)
        .collect();
    let days = availability.days.sorted_tokens();

    format!("{}_{}", periods.join("-"), days.join("-"))
}
