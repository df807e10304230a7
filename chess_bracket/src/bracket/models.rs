//! Tournament and match data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::competitor::CompetitorId;

/// Tournament ID type
pub type TournamentId = i64;

/// Match ID type
pub type MatchId = i64;

/// Largest pool the four-phase bracket can hold
pub const MAX_COMPETITORS: usize = 16;

/// Fewest competitors a draw accepts
pub const MIN_COMPETITORS: usize = 2;

/// Tournament status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentStatus {
    /// Created, not drawn yet
    #[serde(rename = "rascunho")]
    Draft,
    /// Bracket generated
    #[serde(rename = "sorteado")]
    Drawn,
    /// Reserved, never entered by the engine
    #[serde(rename = "em_andamento")]
    InProgress,
    /// Final decided
    #[serde(rename = "finalizado")]
    Finalized,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Draft => "rascunho",
            TournamentStatus::Drawn => "sorteado",
            TournamentStatus::InProgress => "em_andamento",
            TournamentStatus::Finalized => "finalizado",
        }
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rascunho" => Ok(TournamentStatus::Draft),
            "sorteado" => Ok(TournamentStatus::Drawn),
            "em_andamento" => Ok(TournamentStatus::InProgress),
            "finalizado" => Ok(TournamentStatus::Finalized),
            _ => Err(format!("Unknown tournament status: {}", s)),
        }
    }
}

/// Bracket phase, ordered along the advancement path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "oitavas")]
    RoundOf16,
    #[serde(rename = "quartas")]
    Quarterfinal,
    #[serde(rename = "semifinal")]
    Semifinal,
    #[serde(rename = "final")]
    Final,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::RoundOf16,
        Phase::Quarterfinal,
        Phase::Semifinal,
        Phase::Final,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::RoundOf16 => "oitavas",
            Phase::Quarterfinal => "quartas",
            Phase::Semifinal => "semifinal",
            Phase::Final => "final",
        }
    }

    /// Phase the winners of this phase move into
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::RoundOf16 => Some(Phase::Quarterfinal),
            Phase::Quarterfinal => Some(Phase::Semifinal),
            Phase::Semifinal => Some(Phase::Final),
            Phase::Final => None,
        }
    }

    /// Initial phase for a pool of `competitors`
    ///
    /// - up to 2: final
    /// - up to 4: semifinal
    /// - up to 8: quarterfinal
    /// - otherwise: round of 16
    pub fn initial_for(competitors: usize) -> Phase {
        match competitors {
            0..=2 => Phase::Final,
            3..=4 => Phase::Semifinal,
            5..=8 => Phase::Quarterfinal,
            _ => Phase::RoundOf16,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oitavas" => Ok(Phase::RoundOf16),
            "quartas" => Ok(Phase::Quarterfinal),
            "semifinal" => Ok(Phase::Semifinal),
            "final" => Ok(Phase::Final),
            _ => Err(format!("Unknown phase: {}", s)),
        }
    }
}

/// Match result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchResult {
    #[default]
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "j1")]
    Player1,
    #[serde(rename = "j2")]
    Player2,
    #[serde(rename = "empate")]
    Draw,
}

impl MatchResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchResult::Pending => "pendente",
            MatchResult::Player1 => "j1",
            MatchResult::Player2 => "j2",
            MatchResult::Draw => "empate",
        }
    }
}

impl FromStr for MatchResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(MatchResult::Pending),
            "j1" => Ok(MatchResult::Player1),
            "j2" => Ok(MatchResult::Player2),
            "empate" => Ok(MatchResult::Draw),
            _ => Err(format!("Unknown match result: {}", s)),
        }
    }
}

/// Tournament record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    /// Seed supplied to the draw, kept for audit
    pub seed: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Match record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub phase: Phase,
    /// 1-based position within the phase
    pub order: u32,
    pub player1: Option<CompetitorId>,
    /// `None` on a bye or while the seat waits for a winner
    pub player2: Option<CompetitorId>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub result: MatchResult,
    pub winner: Option<CompetitorId>,
    pub notes: Option<String>,
}

impl Match {
    /// Single-competitor match decided without play
    pub fn is_bye(&self) -> bool {
        self.player1.is_some() && self.player2.is_none() && self.winner == self.player1
    }
}

/// Match row to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub tournament_id: TournamentId,
    pub phase: Phase,
    pub order: u32,
    pub player1: Option<CompetitorId>,
    pub player2: Option<CompetitorId>,
    pub result: MatchResult,
    pub winner: Option<CompetitorId>,
}

/// Draw parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DrawOptions {
    /// Fixed seed for a reproducible draw
    pub seed: Option<i64>,
    /// Accept pairs whose schedules do not overlap
    #[serde(default)]
    pub force: bool,
}

/// Outcome of a draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawSummary {
    pub tournament_id: TournamentId,
    pub initial_phase: Phase,
    pub match_count: usize,
    pub bye_count: usize,
    pub forced_count: usize,
}

/// Field changes submitted for a match
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MatchUpdate {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub result: Option<MatchResult>,
    pub winner_id: Option<CompetitorId>,
    pub notes: Option<String>,
}

/// What a match update led to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultOutcome {
    /// Fields stored, no winner involved
    Updated,
    /// Winner seated in the next phase
    Advanced { next_match_id: MatchId },
    /// Final decided; `finalized` is set only by the call that closed the tournament
    Champion {
        champion_id: CompetitorId,
        finalized: bool,
    },
}

/// Match listing entry with competitor names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchView {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub phase: Phase,
    pub order: u32,
    pub player1_name: Option<String>,
    pub player2_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub result: MatchResult,
    pub winner_name: Option<String>,
    pub notes: Option<String>,
    pub is_bye: bool,
}

/// Public identity of the champion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Champion {
    pub id: CompetitorId,
    pub name: String,
    pub course: String,
}

/// Champion query answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChampionStatus {
    pub champion: Option<Champion>,
    pub finalized: bool,
}

impl ChampionStatus {
    pub fn undecided() -> Self {
        Self {
            champion: None,
            finalized: false,
        }
    }
}
