//! Bracket error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{MatchId, Phase, TournamentId, TournamentStatus};
use crate::availability::AvailabilityError;
use crate::competitor::CompetitorId;

/// Broad classification used by callers to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PreconditionFailed,
    Conflict,
    Validation,
    Internal,
}

/// Bracket engine errors
#[derive(Debug, Error)]
pub enum BracketError {
    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Competitor not found: {0}")]
    CompetitorNotFound(CompetitorId),

    #[error("No {phase} match #{order} in this bracket")]
    SlotNotFound { phase: Phase, order: u32 },

    #[error("Tournament not in correct state: expected {expected:?}, got {actual:?}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    #[error("Insufficient competitors: need {needed}, have {current}")]
    InsufficientCompetitors { needed: usize, current: usize },

    #[error("Too many competitors: the bracket holds at most {max}, have {current}")]
    TooManyCompetitors { max: usize, current: usize },

    #[error("Competitors {0:?} have no compatible opponent; draw with force to pair them anyway")]
    IncompatibleSchedules(Vec<CompetitorId>),

    #[error("Match {0} has no scheduled date yet")]
    NotScheduled(MatchId),

    #[error("Match {match_id} is only scheduled for {scheduled_at}")]
    NotYetPlayed {
        match_id: MatchId,
        scheduled_at: DateTime<Utc>,
    },

    #[error("Match {0} is still waiting for an opponent")]
    AwaitingOpponent(MatchId),

    #[error("Competitor {winner} does not play in {phase} match #{order}")]
    InvalidWinner {
        phase: Phase,
        order: u32,
        winner: CompetitorId,
    },

    #[error("Result of {phase} match #{order} does not agree with its winner")]
    ResultMismatch { phase: Phase, order: u32 },

    #[error("{phase} match #{order} already has winner {existing}, refusing {requested}")]
    WinnerConflict {
        phase: Phase,
        order: u32,
        existing: CompetitorId,
        requested: CompetitorId,
    },

    #[error("Seat in {phase} match #{order} is already taken by competitor {occupant}")]
    SeatTaken {
        phase: Phase,
        order: u32,
        occupant: CompetitorId,
    },

    #[error("Duplicate {phase} match #{order} for tournament {tournament_id}")]
    DuplicateSlot {
        tournament_id: TournamentId,
        phase: Phase,
        order: u32,
    },

    #[error("Competitor {id} is referenced by {matches} match(es)")]
    CompetitorInUse { id: CompetitorId, matches: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid availability: {0}")]
    Availability(#[from] AvailabilityError),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Storage session already closed")]
    SessionClosed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl BracketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BracketError::TournamentNotFound(_)
            | BracketError::MatchNotFound(_)
            | BracketError::CompetitorNotFound(_)
            | BracketError::SlotNotFound { .. } => ErrorKind::NotFound,

            BracketError::InvalidState { .. }
            | BracketError::InsufficientCompetitors { .. }
            | BracketError::TooManyCompetitors { .. }
            | BracketError::IncompatibleSchedules(_)
            | BracketError::NotScheduled(_)
            | BracketError::NotYetPlayed { .. }
            | BracketError::AwaitingOpponent(_) => ErrorKind::PreconditionFailed,

            BracketError::WinnerConflict { .. }
            | BracketError::SeatTaken { .. }
            | BracketError::DuplicateSlot { .. }
            | BracketError::CompetitorInUse { .. } => ErrorKind::Conflict,

            BracketError::InvalidWinner { .. }
            | BracketError::ResultMismatch { .. }
            | BracketError::Validation(_)
            | BracketError::Availability(_) => ErrorKind::Validation,

            BracketError::CorruptRecord(_)
            | BracketError::SessionClosed
            | BracketError::Database(_)
            | BracketError::Migration(_)
            | BracketError::Csv(_) => ErrorKind::Internal,
        }
    }

    /// Get a client-safe error message
    ///
    /// Storage errors are reduced to a generic message so SQL details and
    /// connection strings never reach API responses.
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
