//! # Chess Bracket
//!
//! A single-elimination bracket engine for school chess tournaments.
//!
//! Competitors register with the days and the part of the day they can play.
//! The draw pairs them so that opponents share a schedule, sizes the first
//! phase from the pool and hands out byes. Recorded results move winners
//! through the bracket until the final produces a champion.
//!
//! ## Architecture
//!
//! A tournament moves through three statuses:
//!
//! - **Draft** (`rascunho`): created, competitors can still register
//! - **Drawn** (`sorteado`): the initial phase exists, results are recorded
//! - **Finalized** (`finalizado`): the final is decided
//!
//! Matches live in four phases (`oitavas`, `quartas`, `semifinal`, `final`)
//! and are addressed by their 1-based order within the phase.
//!
//! ## Core Modules
//!
//! - [`availability`]: Schedule compatibility between competitors
//! - [`bracket`]: Pairing, bracket tree and the transactional engine
//! - [`competitor`]: Registry types and CSV import
//! - [`db`]: PostgreSQL pool, storage traits and stores

/// Schedule compatibility checks.
pub mod availability;

/// Pairing, advancement and the bracket engine.
pub mod bracket;
pub use bracket::{BracketError, BracketManager, BracketResult};

/// Competitor registry types.
pub mod competitor;

/// Persistence layer.
pub mod db;
