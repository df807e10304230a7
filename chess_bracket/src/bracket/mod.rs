//! Bracket engine for single-elimination tournaments.
//!
//! This module provides:
//! - Pairing of the competitor pool under schedule constraints ([`pairing`])
//! - The bracket tree and winner advancement ([`tree`])
//! - The transactional engine over a store ([`BracketManager`])
//! - CSV export of scheduled matches ([`export`])
//!
//! ## Example
//!
//! ```
//! use chess_bracket::availability::{DaySet, Period};
//! use chess_bracket::bracket::{BracketManager, DrawOptions, Phase};
//! use chess_bracket::competitor::NewCompetitor;
//! use chess_bracket::db::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = BracketManager::new(Arc::new(MemoryStore::new()));
//!
//!     for name in ["Ana", "Bruno", "Caio"] {
//!         manager
//!             .register_competitor(NewCompetitor {
//!                 name: name.to_string(),
//!                 course: "LOG T1".to_string(),
//!                 phone: String::new(),
//!                 period: Period::FullDay,
//!                 days: DaySet::parse("segunda a sexta")?,
//!             })
//!             .await?;
//!     }
//!
//!     let tournament = manager.create_tournament("Copa da Escola").await?;
//!     let summary = manager
//!         .execute_draw(tournament.id, DrawOptions { seed: Some(7), force: false })
//!         .await?;
//!
//!     assert_eq!(summary.initial_phase, Phase::Semifinal);
//!     assert_eq!(summary.bye_count, 1);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod export;
pub mod manager;
pub mod models;
pub mod pairing;
pub mod tree;

pub use errors::{BracketError, BracketResult, ErrorKind};
pub use export::{ScheduleRow, write_schedule_csv};
pub use manager::{BracketManager, DrawPlan, plan_draw};
pub use models::{
    Champion, ChampionStatus, DrawOptions, DrawSummary, MAX_COMPETITORS, MIN_COMPETITORS, Match,
    MatchId, MatchResult, MatchUpdate, MatchView, NewMatch, Phase, ResultOutcome, Tournament,
    TournamentId, TournamentStatus,
};
pub use pairing::{Pairing, create_pairs};
pub use tree::{Advancement, Bracket, BracketNode, Seat};
