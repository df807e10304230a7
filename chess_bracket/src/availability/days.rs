//! Weekday tokens and the canonical day set of a competitor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::AvailabilityError;

/// A school weekday token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "seg")]
    Monday,
    #[serde(rename = "ter")]
    Tuesday,
    #[serde(rename = "qua")]
    Wednesday,
    #[serde(rename = "qui")]
    Thursday,
    #[serde(rename = "sex")]
    Friday,
    #[serde(rename = "sab")]
    Saturday,
    #[serde(rename = "dom")]
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Short token used in storage, keys and the API
    pub fn token(&self) -> &'static str {
        match self {
            Weekday::Monday => "seg",
            Weekday::Tuesday => "ter",
            Weekday::Wednesday => "qua",
            Weekday::Thursday => "qui",
            Weekday::Friday => "sex",
            Weekday::Saturday => "sab",
            Weekday::Sunday => "dom",
        }
    }
}

impl FromStr for Weekday {
    type Err = AvailabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        match token.as_str() {
            "seg" | "segunda" => Ok(Weekday::Monday),
            "ter" | "terca" | "terça" => Ok(Weekday::Tuesday),
            "qua" | "quarta" => Ok(Weekday::Wednesday),
            "qui" | "quinta" => Ok(Weekday::Thursday),
            "sex" | "sexta" => Ok(Weekday::Friday),
            "sab" | "sabado" | "sábado" => Ok(Weekday::Saturday),
            "dom" | "domingo" => Ok(Weekday::Sunday),
            _ => Err(AvailabilityError::UnknownDay(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Legacy fixed availability patterns accepted on input.
const PATTERNS: [(&str, &[Weekday]); 4] = [
    (
        "segunda a sexta",
        &[
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
        ],
    ),
    ("segunda e terca", &[Weekday::Monday, Weekday::Tuesday]),
    ("quarta e sexta", &[Weekday::Wednesday, Weekday::Friday]),
    ("sexta", &[Weekday::Friday]),
];

/// Set of weekdays a competitor can play on.
///
/// Serialized as the canonical comma-separated token list (`"seg,qua,sex"`),
/// deserialized from either that form or one of the legacy patterns
/// (`"segunda a sexta"`, `"segunda e terca"`, `"quarta e sexta"`, `"sexta"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DaySet(BTreeSet<Weekday>);

impl DaySet {
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Self {
        Self(days.into_iter().collect())
    }

    /// Parse a stored or submitted day representation.
    ///
    /// Empty input yields the empty set.
    pub fn parse(input: &str) -> Result<Self, AvailabilityError> {
        let normalized = input.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(Self::default());
        }

        if let Some((_, days)) = PATTERNS
            .iter()
            .find(|(pattern, _)| *pattern == normalized.as_str())
        {
            return Ok(Self::new(days.iter().copied()));
        }

        normalized
            .split(',')
            .filter(|token| !token.trim().is_empty())
            .map(Weekday::from_str)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.0.iter().copied()
    }

    pub fn intersects(&self, other: &DaySet) -> bool {
        self.0.intersection(&other.0).next().is_some()
    }

    /// Tokens sorted alphabetically, the order used by availability keys
    pub fn sorted_tokens(&self) -> Vec<&'static str> {
        let mut tokens: Vec<_> = self.0.iter().map(Weekday::token).collect();
        tokens.sort_unstable();
        tokens
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<_> = self.0.iter().map(Weekday::token).collect();
        f.write_str(&tokens.join(","))
    }
}

impl FromStr for DaySet {
    type Err = AvailabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DaySet {
    type Error = AvailabilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DaySet> for String {
    fn from(value: DaySet) -> Self {
        value.to_string()
    }
}
