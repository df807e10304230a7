//! Bracket manager: registry, draw and result submission.
//!
//! Every public operation runs inside one store session. Draws and result
//! submissions lock the tournament first, load the bracket snapshot, apply
//! the pure step from [`super::tree`] and persist the change set before
//! committing.

use chrono::Utc;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use super::errors::{BracketError, BracketResult};
use super::export::{ScheduleRow, write_schedule_csv};
use super::models::{
    Champion, ChampionStatus, DrawOptions, DrawSummary, MAX_COMPETITORS, MIN_COMPETITORS, Match,
    MatchId, MatchResult, MatchUpdate, MatchView, NewMatch, Phase, ResultOutcome, Tournament,
    TournamentId, TournamentStatus,
};
use super::pairing::{Pairing, create_pairs};
use super::tree::{Advancement, Bracket};
use crate::competitor::{
    Competitor, CompetitorFilter, CompetitorId, ImportReport, NewCompetitor, parse_competitors,
};
use crate::db::{BracketSession, BracketStore};

/// Validated pairing plan for a draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawPlan {
    pub initial_phase: Phase,
    pub pairs: Vec<Pairing>,
}

impl DrawPlan {
    pub fn bye_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_bye()).count()
    }

    pub fn forced_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.forced).count()
    }
}

/// Check the pool size, pair it and size the initial phase
pub fn plan_draw(competitors: &[Competitor], options: DrawOptions) -> BracketResult<DrawPlan> {
    let current = competitors.len();
    if current < MIN_COMPETITORS {
        return Err(BracketError::InsufficientCompetitors {
            needed: MIN_COMPETITORS,
            current,
        });
    }
    if current > MAX_COMPETITORS {
        return Err(BracketError::TooManyCompetitors {
            max: MAX_COMPETITORS,
            current,
        });
    }

    let pairs = create_pairs(competitors, options.seed);

    if !options.force {
        let incompatible: Vec<CompetitorId> = pairs
            .iter()
            .filter(|p| p.forced)
            .flat_map(|p| std::iter::once(p.player).chain(p.opponent))
            .collect();
        if !incompatible.is_empty() {
            return Err(BracketError::IncompatibleSchedules(incompatible));
        }
    }

    Ok(DrawPlan {
        initial_phase: Phase::initial_for(current),
        pairs,
    })
}

/// Bracket engine entry point
#[derive(Clone)]
pub struct BracketManager {
    store: Arc<dyn BracketStore>,
}

impl BracketManager {
    /// Create a new manager over a store
    pub fn new(store: Arc<dyn BracketStore>) -> Self {
        Self { store }
    }

    /// Register a competitor
    pub async fn register_competitor(&self, competitor: NewCompetitor) -> BracketResult<Competitor> {
        let competitor = competitor.validate()?;

        let mut session = self.store.begin().await?;
        let stored = session.insert_competitor(&competitor).await?;
        session.commit().await?;

        log::info!("Registered competitor {} ({})", stored.id, stored.name);
        Ok(stored)
    }

    /// List competitors matching `filter`
    pub async fn list_competitors(&self, filter: &CompetitorFilter) -> BracketResult<Vec<Competitor>> {
        let mut session = self.store.begin().await?;
        let competitors = session.list_competitors().await?;

        Ok(competitors.into_iter().filter(|c| filter.matches(c)).collect())
    }

    /// Delete a competitor no match refers to
    pub async fn delete_competitor(&self, id: CompetitorId) -> BracketResult<()> {
        let mut session = self.store.begin().await?;

        if session.get_competitor(id).await?.is_none() {
            return Err(BracketError::CompetitorNotFound(id));
        }

        let matches = session.count_competitor_matches(id).await?;
        if matches > 0 {
            return Err(BracketError::CompetitorInUse { id, matches });
        }

        session.delete_competitor(id).await?;
        session.commit().await?;

        log::info!("Deleted competitor {}", id);
        Ok(())
    }

    /// Register every valid row of a CSV document
    pub async fn import_competitors<R: Read>(&self, input: R) -> BracketResult<ImportReport> {
        let parsed = parse_competitors(input)?;

        let mut session = self.store.begin().await?;
        for competitor in &parsed.competitors {
            session.insert_competitor(competitor).await?;
        }
        session.commit().await?;

        log::info!(
            "Imported {} competitors ({} rows rejected)",
            parsed.competitors.len(),
            parsed.errors.len()
        );

        Ok(ImportReport {
            imported: parsed.competitors.len(),
            errors: parsed.errors,
        })
    }

    /// Create a tournament in draft status
    pub async fn create_tournament(&self, name: &str) -> BracketResult<Tournament> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BracketError::Validation(
                "tournament name must not be empty".to_string(),
            ));
        }

        let mut session = self.store.begin().await?;
        let tournament = session.insert_tournament(name).await?;
        session.commit().await?;

        log::info!("Created tournament {} ({})", tournament.id, tournament.name);
        Ok(tournament)
    }

    /// All tournaments, newest first
    pub async fn list_tournaments(&self) -> BracketResult<Vec<Tournament>> {
        let mut session = self.store.begin().await?;
        session.list_tournaments().await
    }

    pub async fn get_tournament(&self, id: TournamentId) -> BracketResult<Tournament> {
        let mut session = self.store.begin().await?;
        session
            .get_tournament(id)
            .await?
            .ok_or(BracketError::TournamentNotFound(id))
    }

    /// Run the draw of a draft tournament.
    ///
    /// Pairs the registered pool, stores the initial phase, resolves byes and
    /// moves the tournament to drawn, all in one transaction.
    pub async fn execute_draw(
        &self,
        tournament_id: TournamentId,
        options: DrawOptions,
    ) -> BracketResult<DrawSummary> {
        let mut session = self.store.begin().await?;

        let tournament = session
            .lock_tournament(tournament_id)
            .await?
            .ok_or(BracketError::TournamentNotFound(tournament_id))?;
        if tournament.status != TournamentStatus::Draft {
            return Err(BracketError::InvalidState {
                expected: TournamentStatus::Draft,
                actual: tournament.status,
            });
        }

        let competitors = session.list_competitors().await?;
        let plan = plan_draw(&competitors, options)?;

        let mut bracket = Bracket::seed(tournament_id, plan.initial_phase, &plan.pairs);
        let bye_count = bracket.resolve_byes()?;

        persist(session.as_mut(), &bracket, &[]).await?;
        session
            .set_tournament_status(tournament_id, TournamentStatus::Drawn, options.seed)
            .await?;
        session.commit().await?;

        let summary = DrawSummary {
            tournament_id,
            initial_phase: plan.initial_phase,
            match_count: plan.pairs.len(),
            bye_count,
            forced_count: plan.forced_count(),
        };

        log::info!(
            "Draw for tournament {}: {} competitors, {} matches in {}, {} bye(s)",
            tournament_id,
            competitors.len(),
            summary.match_count,
            summary.initial_phase,
            summary.bye_count
        );

        Ok(summary)
    }

    /// Apply a match update and advance the winner, if one is given
    pub async fn update_match(
        &self,
        match_id: MatchId,
        update: MatchUpdate,
    ) -> BracketResult<ResultOutcome> {
        let mut session = self.store.begin().await?;

        let current = session
            .get_match(match_id)
            .await?
            .ok_or(BracketError::MatchNotFound(match_id))?;
        let tournament = session
            .lock_tournament(current.tournament_id)
            .await?
            .ok_or(BracketError::TournamentNotFound(current.tournament_id))?;

        // A different winner is left to the bracket, which reports the conflict
        if let (Some(result), Some(decided)) = (update.result, current.winner) {
            if update.winner_id.is_none_or(|w| w == decided) {
                check_result_agrees(&current, result, decided)?;
            }
        }

        let mut snapshot = session.list_matches(tournament.id).await?;
        let edited = {
            let m = snapshot
                .iter_mut()
                .find(|m| m.id == match_id)
                .ok_or(BracketError::MatchNotFound(match_id))?;
            apply_update(m, &update);
            m.clone()
        };

        let Some(winner) = update.winner_id else {
            session.save_match(&edited).await?;
            session.commit().await?;
            log::debug!("Updated match {}", match_id);
            return Ok(ResultOutcome::Updated);
        };

        check_result_preconditions(&edited, &tournament, winner)?;
        session.save_match(&edited).await?;

        let mut bracket = Bracket::from_matches(tournament.id, &snapshot)?;
        let advancement = bracket.record_winner(edited.phase, edited.order, winner)?;
        let ids = persist(session.as_mut(), &bracket, &snapshot).await?;

        let outcome = match advancement {
            Advancement::Champion(champion_id) => {
                let finalized = tournament.status != TournamentStatus::Finalized;
                if finalized {
                    session
                        .set_tournament_status(tournament.id, TournamentStatus::Finalized, None)
                        .await?;
                    log::info!(
                        "Tournament {} finalized, champion {}",
                        tournament.id,
                        champion_id
                    );
                }
                ResultOutcome::Champion {
                    champion_id,
                    finalized,
                }
            }
            Advancement::Advanced { phase, order } => {
                let next_match_id = ids
                    .get(&(phase, order))
                    .copied()
                    .or_else(|| bracket.node(phase, order).and_then(|n| n.id))
                    .ok_or(BracketError::SlotNotFound { phase, order })?;
                log::info!(
                    "Competitor {} advanced from match {} to {} match {}",
                    winner,
                    match_id,
                    phase,
                    next_match_id
                );
                ResultOutcome::Advanced { next_match_id }
            }
        };

        session.commit().await?;
        Ok(outcome)
    }

    /// Matches of a tournament with competitor names resolved
    pub async fn list_matches(&self, tournament_id: TournamentId) -> BracketResult<Vec<MatchView>> {
        let mut session = self.store.begin().await?;

        if session.get_tournament(tournament_id).await?.is_none() {
            return Err(BracketError::TournamentNotFound(tournament_id));
        }

        let matches = session.list_matches(tournament_id).await?;
        let competitors = competitor_index(session.list_competitors().await?);
        let name = |id: Option<CompetitorId>| {
            id.and_then(|id| competitors.get(&id)).map(|c| c.name.clone())
        };

        Ok(matches
            .iter()
            .map(|m| MatchView {
                id: m.id,
                tournament_id: m.tournament_id,
                phase: m.phase,
                order: m.order,
                player1_name: name(m.player1),
                player2_name: name(m.player2),
                scheduled_at: m.scheduled_at,
                location: m.location.clone(),
                result: m.result,
                winner_name: name(m.winner),
                notes: m.notes.clone(),
                is_bye: m.is_bye(),
            })
            .collect())
    }

    /// Champion of a finalized tournament
    pub async fn champion(&self, tournament_id: TournamentId) -> BracketResult<ChampionStatus> {
        let mut session = self.store.begin().await?;

        let tournament = session
            .get_tournament(tournament_id)
            .await?
            .ok_or(BracketError::TournamentNotFound(tournament_id))?;
        if tournament.status != TournamentStatus::Finalized {
            return Ok(ChampionStatus::undecided());
        }

        let matches = session.list_matches(tournament_id).await?;
        let champion_id = matches
            .iter()
            .find(|m| m.phase == Phase::Final)
            .and_then(|m| m.winner)
            .ok_or_else(|| {
                BracketError::CorruptRecord(format!(
                    "finalized tournament {} has no decided final",
                    tournament_id
                ))
            })?;

        let competitor = session
            .get_competitor(champion_id)
            .await?
            .ok_or(BracketError::CompetitorNotFound(champion_id))?;

        Ok(ChampionStatus {
            champion: Some(Champion {
                id: competitor.id,
                name: competitor.name,
                course: competitor.course,
            }),
            finalized: true,
        })
    }

    /// Scheduled matches of one or all tournaments as export rows
    pub async fn schedule_rows(
        &self,
        tournament_id: Option<TournamentId>,
    ) -> BracketResult<Vec<ScheduleRow>> {
        let mut session = self.store.begin().await?;

        if let Some(id) = tournament_id {
            if session.get_tournament(id).await?.is_none() {
                return Err(BracketError::TournamentNotFound(id));
            }
        }

        let matches = session.list_scheduled_matches(tournament_id).await?;
        let competitors = competitor_index(session.list_competitors().await?);

        Ok(matches
            .iter()
            .map(|m| ScheduleRow::new(m, &competitors))
            .collect())
    }

    /// Write the scheduled matches as CSV, returning the row count
    pub async fn export_schedule<W: Write>(
        &self,
        tournament_id: Option<TournamentId>,
        writer: W,
    ) -> BracketResult<usize> {
        let rows = self.schedule_rows(tournament_id).await?;
        let written = write_schedule_csv(writer, &rows)?;
        log::info!("Exported {} scheduled matches", written);
        Ok(written)
    }
}

fn competitor_index(competitors: Vec<Competitor>) -> HashMap<CompetitorId, Competitor> {
    competitors.into_iter().map(|c| (c.id, c)).collect()
}

fn apply_update(m: &mut Match, update: &MatchUpdate) {
    if let Some(scheduled_at) = update.scheduled_at {
        m.scheduled_at = Some(scheduled_at);
    }
    if let Some(location) = &update.location {
        m.location = Some(location.clone());
    }
    if let Some(result) = update.result {
        m.result = result;
    }
    if let Some(notes) = &update.notes {
        m.notes = Some(notes.clone());
    }
}

/// A decided match only accepts a result naming its winner's seat, or a draw
fn check_result_agrees(m: &Match, result: MatchResult, winner: CompetitorId) -> BracketResult<()> {
    let agrees = match result {
        MatchResult::Pending => false,
        MatchResult::Player1 => m.player1 == Some(winner),
        MatchResult::Player2 => m.player2 == Some(winner),
        MatchResult::Draw => true,
    };

    if agrees {
        Ok(())
    } else {
        Err(BracketError::ResultMismatch {
            phase: m.phase,
            order: m.order,
        })
    }
}

fn check_result_preconditions(
    m: &Match,
    tournament: &Tournament,
    winner: CompetitorId,
) -> BracketResult<()> {
    let scheduled_at = m.scheduled_at.ok_or(BracketError::NotScheduled(m.id))?;
    if scheduled_at > Utc::now() {
        return Err(BracketError::NotYetPlayed {
            match_id: m.id,
            scheduled_at,
        });
    }

    if m.winner.is_none() && (m.player1.is_none() || m.player2.is_none()) {
        return Err(BracketError::AwaitingOpponent(m.id));
    }

    if tournament.status == TournamentStatus::Finalized && m.winner != Some(winner) {
        return Err(BracketError::InvalidState {
            expected: TournamentStatus::Drawn,
            actual: tournament.status,
        });
    }

    Ok(())
}

/// Write the bracket's change set, returning the id of every touched slot
async fn persist<S: BracketSession + ?Sized>(
    session: &mut S,
    bracket: &Bracket,
    snapshot: &[Match],
) -> BracketResult<HashMap<(Phase, u32), MatchId>> {
    let stored: HashMap<MatchId, &Match> = snapshot.iter().map(|m| (m.id, m)).collect();
    let mut ids = HashMap::new();

    for node in bracket.changes() {
        let id = match node.id {
            Some(id) => {
                let mut m = stored
                    .get(&id)
                    .map(|m| (*m).clone())
                    .ok_or(BracketError::MatchNotFound(id))?;
                m.player1 = node.player1;
                m.player2 = node.player2;
                m.result = node.result;
                m.winner = node.winner;
                session.save_match(&m).await?;
                id
            }
            None => {
                session
                    .insert_match(&NewMatch {
                        tournament_id: bracket.tournament_id(),
                        phase: node.phase,
                        order: node.order,
                        player1: node.player1,
                        player2: node.player2,
                        result: node.result,
                        winner: node.winner,
                    })
                    .await?
            }
        };
        ids.insert((node.phase, node.order), id);
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{DaySet, Period};
    use crate::db::MemoryStore;
    use chrono::Duration;

    fn competitor(id: CompetitorId, period: Period, days: &str) -> Competitor {
        Competitor {
            id,
            name: format!("C{}", id),
            course: "1A".to_string(),
            phone: String::new(),
            period,
            days: DaySet::parse(days).unwrap(),
        }
    }

    fn new_competitor(name: &str) -> NewCompetitor {
        NewCompetitor {
            name: name.to_string(),
            course: "1A".to_string(),
            phone: "11 90000-0000".to_string(),
            period: Period::FullDay,
            days: DaySet::parse("segunda a sexta").unwrap(),
        }
    }

    fn played() -> MatchUpdate {
        MatchUpdate {
            scheduled_at: Some(Utc::now() - Duration::hours(1)),
            ..MatchUpdate::default()
        }
    }

    #[test]
    fn test_plan_rejects_pool_size() {
        let one = vec![competitor(1, Period::Morning, "sexta")];
        assert!(matches!(
            plan_draw(&one, DrawOptions::default()),
            Err(BracketError::InsufficientCompetitors { needed: 2, current: 1 })
        ));

        let many: Vec<_> = (1..=17)
            .map(|id| competitor(id, Period::Morning, "sexta"))
            .collect();
        assert!(matches!(
            plan_draw(&many, DrawOptions::default()),
            Err(BracketError::TooManyCompetitors { max: 16, current: 17 })
        ));
    }

    #[test]
    fn test_plan_requires_force_for_incompatible_pool() {
        let pool = vec![
            competitor(1, Period::Morning, "sexta"),
            competitor(2, Period::Afternoon, "segunda e terca"),
        ];

        let err = plan_draw(&pool, DrawOptions { seed: Some(1), force: false }).unwrap_err();
        assert!(matches!(err, BracketError::IncompatibleSchedules(ref ids) if ids.len() == 2));

        let plan = plan_draw(&pool, DrawOptions { seed: Some(1), force: true }).unwrap();
        assert_eq!(plan.forced_count(), 1);
        assert_eq!(plan.initial_phase, Phase::Final);
    }

    #[tokio::test]
    async fn test_draw_requires_draft() {
        let manager = BracketManager::new(Arc::new(MemoryStore::new()));
        manager.register_competitor(new_competitor("Ana")).await.unwrap();
        manager.register_competitor(new_competitor("Bia")).await.unwrap();
        let tournament = manager.create_tournament("Copa").await.unwrap();

        manager
            .execute_draw(tournament.id, DrawOptions::default())
            .await
            .unwrap();
        let err = manager
            .execute_draw(tournament.id, DrawOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BracketError::InvalidState {
                expected: TournamentStatus::Draft,
                actual: TournamentStatus::Drawn
            }
        ));
    }

    #[tokio::test]
    async fn test_update_without_winner_only_stores_fields() {
        let manager = BracketManager::new(Arc::new(MemoryStore::new()));
        manager.register_competitor(new_competitor("Ana")).await.unwrap();
        manager.register_competitor(new_competitor("Bia")).await.unwrap();
        let tournament = manager.create_tournament("Copa").await.unwrap();
        manager
            .execute_draw(tournament.id, DrawOptions::default())
            .await
            .unwrap();

        let final_match = manager.list_matches(tournament.id).await.unwrap().remove(0);
        let outcome = manager
            .update_match(
                final_match.id,
                MatchUpdate {
                    location: Some("Sala 3".to_string()),
                    notes: Some("Relógio digital".to_string()),
                    ..played()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, ResultOutcome::Updated);

        let view = manager.list_matches(tournament.id).await.unwrap().remove(0);
        assert_eq!(view.location.as_deref(), Some("Sala 3"));
        assert!(view.scheduled_at.is_some());
        assert_eq!(view.winner_name, None);
    }

    #[tokio::test]
    async fn test_future_match_cannot_be_decided() {
        let store = Arc::new(MemoryStore::new());
        let manager = BracketManager::new(store);
        let ana = manager.register_competitor(new_competitor("Ana")).await.unwrap();
        manager.register_competitor(new_competitor("Bia")).await.unwrap();
        let tournament = manager.create_tournament("Copa").await.unwrap();
        manager
            .execute_draw(tournament.id, DrawOptions::default())
            .await
            .unwrap();

        let final_match = manager.list_matches(tournament.id).await.unwrap().remove(0);
        let err = manager
            .update_match(
                final_match.id,
                MatchUpdate {
                    scheduled_at: Some(Utc::now() + Duration::days(2)),
                    winner_id: Some(ana.id),
                    ..MatchUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BracketError::NotYetPlayed { .. }));

        // Nothing was stored
        let view = manager.list_matches(tournament.id).await.unwrap().remove(0);
        assert!(view.scheduled_at.is_none());
    }
}
