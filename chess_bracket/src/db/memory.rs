//! In-memory bracket store.
//!
//! A session takes the store lock for its whole lifetime and works on a copy
//! of the state; `commit` swaps the copy in. Dropping an uncommitted session
//! leaves the store untouched.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::repository::{BracketSession, BracketStore};
use crate::bracket::errors::{BracketError, BracketResult};
use crate::bracket::models::{
    Match, MatchId, NewMatch, Tournament, TournamentId, TournamentStatus,
};
use crate::competitor::{Competitor, CompetitorId, NewCompetitor};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: i64,
    competitors: BTreeMap<CompetitorId, Competitor>,
    tournaments: BTreeMap<TournamentId, Tournament>,
    matches: BTreeMap<MatchId, Match>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store, used by tests and the `memory` backend
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BracketStore for MemoryStore {
    async fn begin(&self) -> BracketResult<Box<dyn BracketSession>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(MemorySession {
            guard: Some(guard),
            working,
        }))
    }
}

/// Session holding the store lock and a working copy
pub struct MemorySession {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    working: MemoryState,
}

impl MemorySession {
    fn state(&mut self) -> BracketResult<&mut MemoryState> {
        if self.guard.is_none() {
            return Err(BracketError::SessionClosed);
        }
        Ok(&mut self.working)
    }
}

fn sorted(mut matches: Vec<Match>) -> Vec<Match> {
    matches.sort_by_key(|m| (m.phase, m.order));
    matches
}

#[async_trait]
impl BracketSession for MemorySession {
    async fn insert_competitor(&mut self, competitor: &NewCompetitor) -> BracketResult<Competitor> {
        let state = self.state()?;
        let id = state.allocate_id();
        let stored = Competitor {
            id,
            name: competitor.name.clone(),
            course: competitor.course.clone(),
            phone: competitor.phone.clone(),
            period: competitor.period,
            days: competitor.days.clone(),
        };
        state.competitors.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_competitor(&mut self, id: CompetitorId) -> BracketResult<Option<Competitor>> {
        Ok(self.state()?.competitors.get(&id).cloned())
    }

    async fn list_competitors(&mut self) -> BracketResult<Vec<Competitor>> {
        Ok(self.state()?.competitors.values().cloned().collect())
    }

    async fn delete_competitor(&mut self, id: CompetitorId) -> BracketResult<bool> {
        Ok(self.state()?.competitors.remove(&id).is_some())
    }

    async fn count_competitor_matches(&mut self, id: CompetitorId) -> BracketResult<i64> {
        let count = self
            .state()?
            .matches
            .values()
            .filter(|m| m.player1 == Some(id) || m.player2 == Some(id) || m.winner == Some(id))
            .count();
        Ok(count as i64)
    }

    async fn insert_tournament(&mut self, name: &str) -> BracketResult<Tournament> {
        let state = self.state()?;
        let id = state.allocate_id();
        let tournament = Tournament {
            id,
            name: name.to_string(),
            status: TournamentStatus::Draft,
            seed: None,
            created_at: Utc::now(),
        };
        state.tournaments.insert(id, tournament.clone());
        Ok(tournament)
    }

    async fn get_tournament(&mut self, id: TournamentId) -> BracketResult<Option<Tournament>> {
        Ok(self.state()?.tournaments.get(&id).cloned())
    }

    async fn lock_tournament(&mut self, id: TournamentId) -> BracketResult<Option<Tournament>> {
        // The session already holds the store lock
        self.get_tournament(id).await
    }

    async fn list_tournaments(&mut self) -> BracketResult<Vec<Tournament>> {
        let mut tournaments: Vec<_> = self.state()?.tournaments.values().cloned().collect();
        tournaments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tournaments)
    }

    async fn set_tournament_status(
        &mut self,
        id: TournamentId,
        status: TournamentStatus,
        seed: Option<i64>,
    ) -> BracketResult<()> {
        let tournament = self
            .state()?
            .tournaments
            .get_mut(&id)
            .ok_or(BracketError::TournamentNotFound(id))?;

        tournament.status = status;
        if seed.is_some() {
            tournament.seed = seed;
        }
        Ok(())
    }

    async fn get_match(&mut self, id: MatchId) -> BracketResult<Option<Match>> {
        Ok(self.state()?.matches.get(&id).cloned())
    }

    async fn list_matches(&mut self, tournament_id: TournamentId) -> BracketResult<Vec<Match>> {
        let matches = self
            .state()?
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect();
        Ok(sorted(matches))
    }

    async fn list_scheduled_matches(
        &mut self,
        tournament_id: Option<TournamentId>,
    ) -> BracketResult<Vec<Match>> {
        let mut matches: Vec<_> = self
            .state()?
            .matches
            .values()
            .filter(|m| m.scheduled_at.is_some())
            .filter(|m| tournament_id.is_none_or(|id| m.tournament_id == id))
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.tournament_id, m.scheduled_at, m.id));
        Ok(matches)
    }

    async fn insert_match(&mut self, new_match: &NewMatch) -> BracketResult<MatchId> {
        let state = self.state()?;

        if !state.tournaments.contains_key(&new_match.tournament_id) {
            return Err(BracketError::TournamentNotFound(new_match.tournament_id));
        }
        let duplicate = state.matches.values().any(|m| {
            m.tournament_id == new_match.tournament_id
                && m.phase == new_match.phase
                && m.order == new_match.order
        });
        if duplicate {
            return Err(BracketError::DuplicateSlot {
                tournament_id: new_match.tournament_id,
                phase: new_match.phase,
                order: new_match.order,
            });
        }

        let id = state.allocate_id();
        state.matches.insert(
            id,
            Match {
                id,
                tournament_id: new_match.tournament_id,
                phase: new_match.phase,
                order: new_match.order,
                player1: new_match.player1,
                player2: new_match.player2,
                scheduled_at: None,
                location: None,
                result: new_match.result,
                winner: new_match.winner,
                notes: None,
            },
        );
        Ok(id)
    }

    async fn save_match(&mut self, m: &Match) -> BracketResult<()> {
        let stored = self
            .state()?
            .matches
            .get_mut(&m.id)
            .ok_or(BracketError::MatchNotFound(m.id))?;

        stored.player1 = m.player1;
        stored.player2 = m.player2;
        stored.scheduled_at = m.scheduled_at;
        stored.location = m.location.clone();
        stored.result = m.result;
        stored.winner = m.winner;
        stored.notes = m.notes.clone();
        Ok(())
    }

    async fn commit(&mut self) -> BracketResult<()> {
        let mut guard = self.guard.take().ok_or(BracketError::SessionClosed)?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}
