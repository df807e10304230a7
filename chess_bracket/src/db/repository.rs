//! Storage trait definitions for testability and dependency injection.
//!
//! Every engine operation opens one [`BracketSession`] through a
//! [`BracketStore`], works inside it and commits. A session dropped without
//! [`BracketSession::commit`] rolls back.

use async_trait::async_trait;

use crate::bracket::errors::BracketResult;
use crate::bracket::models::{
    Match, MatchId, NewMatch, Tournament, TournamentId, TournamentStatus,
};
use crate::competitor::{Competitor, CompetitorId, NewCompetitor};

/// Source of transactional sessions
#[async_trait]
pub trait BracketStore: Send + Sync {
    /// Start a new session
    async fn begin(&self) -> BracketResult<Box<dyn BracketSession>>;
}

/// One unit of work against the store
#[async_trait]
pub trait BracketSession: Send {
    /// Insert a competitor
    async fn insert_competitor(&mut self, competitor: &NewCompetitor) -> BracketResult<Competitor>;

    /// Find a competitor by ID
    async fn get_competitor(&mut self, id: CompetitorId) -> BracketResult<Option<Competitor>>;

    /// All competitors ordered by ID
    async fn list_competitors(&mut self) -> BracketResult<Vec<Competitor>>;

    /// Delete a competitor, returning whether a row was removed
    async fn delete_competitor(&mut self, id: CompetitorId) -> BracketResult<bool>;

    /// Number of matches referencing a competitor in any seat
    async fn count_competitor_matches(&mut self, id: CompetitorId) -> BracketResult<i64>;

    /// Insert a tournament in draft status
    async fn insert_tournament(&mut self, name: &str) -> BracketResult<Tournament>;

    /// Find a tournament by ID
    async fn get_tournament(&mut self, id: TournamentId) -> BracketResult<Option<Tournament>>;

    /// Find a tournament and hold it for the rest of the session
    async fn lock_tournament(&mut self, id: TournamentId) -> BracketResult<Option<Tournament>>;

    /// All tournaments, newest first
    async fn list_tournaments(&mut self) -> BracketResult<Vec<Tournament>>;

    /// Update status, recording `seed` when one is given
    async fn set_tournament_status(
        &mut self,
        id: TournamentId,
        status: TournamentStatus,
        seed: Option<i64>,
    ) -> BracketResult<()>;

    /// Find a match by ID
    async fn get_match(&mut self, id: MatchId) -> BracketResult<Option<Match>>;

    /// Matches of a tournament ordered by phase, then order
    async fn list_matches(&mut self, tournament_id: TournamentId) -> BracketResult<Vec<Match>>;

    /// Matches of one or all tournaments that have a scheduled date
    async fn list_scheduled_matches(
        &mut self,
        tournament_id: Option<TournamentId>,
    ) -> BracketResult<Vec<Match>>;

    /// Insert a match, failing on a duplicate `(tournament, phase, order)`
    async fn insert_match(&mut self, new_match: &NewMatch) -> BracketResult<MatchId>;

    /// Overwrite the mutable fields of a stored match
    async fn save_match(&mut self, m: &Match) -> BracketResult<()>;

    /// Make the session's writes durable
    async fn commit(&mut self) -> BracketResult<()>;
}
