//! PostgreSQL implementation of the bracket store.

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::repository::{BracketSession, BracketStore};
use crate::availability::{DaySet, Period};
use crate::bracket::errors::{BracketError, BracketResult};
use crate::bracket::models::{
    Match, MatchId, MatchResult, NewMatch, Phase, Tournament, TournamentId, TournamentStatus,
};
use crate::competitor::{Competitor, CompetitorId, NewCompetitor};

const MATCH_COLUMNS: &str = "id, tournament_id, phase, match_order, player1_id, player2_id, \
     scheduled_at, location, result, winner_id, notes";

/// PostgreSQL bracket store
#[derive(Clone)]
pub struct PgBracketStore {
    pool: PgPool,
}

impl PgBracketStore {
    /// Create a new store over a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BracketStore for PgBracketStore {
    async fn begin(&self) -> BracketResult<Box<dyn BracketSession>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgSession { tx: Some(tx) }))
    }
}

/// Session backed by one serializable transaction
pub struct PgSession {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgSession {
    fn conn(&mut self) -> BracketResult<&mut PgConnection> {
        self.tx.as_deref_mut().ok_or(BracketError::SessionClosed)
    }
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> BracketError {
    BracketError::CorruptRecord(format!("{}: {}", what, err))
}

fn competitor_from_row(row: &PgRow) -> BracketResult<Competitor> {
    let period: String = row.try_get("period")?;
    let days: String = row.try_get("days")?;

    Ok(Competitor {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        course: row.try_get("course")?,
        phone: row.try_get("phone")?,
        period: period.parse::<Period>().map_err(|e| corrupt("period", e))?,
        days: DaySet::parse(&days).map_err(|e| corrupt("days", e))?,
    })
}

fn tournament_from_row(row: &PgRow) -> BracketResult<Tournament> {
    let status: String = row.try_get("status")?;

    Ok(Tournament {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        status: status
            .parse::<TournamentStatus>()
            .map_err(|e| corrupt("status", e))?,
        seed: row.try_get("seed")?,
        created_at: row.try_get::<chrono::NaiveDateTime, _>("created_at")?.and_utc(),
    })
}

fn match_from_row(row: &PgRow) -> BracketResult<Match> {
    let phase: String = row.try_get("phase")?;
    let result: String = row.try_get("result")?;
    let order: i32 = row.try_get("match_order")?;

    Ok(Match {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        phase: phase.parse::<Phase>().map_err(|e| corrupt("phase", e))?,
        order: u32::try_from(order).map_err(|e| corrupt("match_order", e))?,
        player1: row.try_get("player1_id")?,
        player2: row.try_get("player2_id")?,
        scheduled_at: row
            .try_get::<Option<chrono::NaiveDateTime>, _>("scheduled_at")?
            .map(|dt| dt.and_utc()),
        location: row.try_get("location")?,
        result: result
            .parse::<MatchResult>()
            .map_err(|e| corrupt("result", e))?,
        winner: row.try_get("winner_id")?,
        notes: row.try_get("notes")?,
    })
}

fn sorted(mut matches: Vec<Match>) -> Vec<Match> {
    matches.sort_by_key(|m| (m.phase, m.order));
    matches
}

#[async_trait]
impl BracketSession for PgSession {
    async fn insert_competitor(&mut self, competitor: &NewCompetitor) -> BracketResult<Competitor> {
        let row = sqlx::query(
            r#"
            INSERT INTO competitors (name, course, phone, period, days)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, course, phone, period, days
            "#,
        )
        .bind(&competitor.name)
        .bind(&competitor.course)
        .bind(&competitor.phone)
        .bind(competitor.period.as_str())
        .bind(competitor.days.to_string())
        .fetch_one(self.conn()?)
        .await?;

        competitor_from_row(&row)
    }

    async fn get_competitor(&mut self, id: CompetitorId) -> BracketResult<Option<Competitor>> {
        let row = sqlx::query(
            "SELECT id, name, course, phone, period, days FROM competitors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;

        row.as_ref().map(competitor_from_row).transpose()
    }

    async fn list_competitors(&mut self) -> BracketResult<Vec<Competitor>> {
        let rows =
            sqlx::query("SELECT id, name, course, phone, period, days FROM competitors ORDER BY id")
                .fetch_all(self.conn()?)
                .await?;

        rows.iter().map(competitor_from_row).collect()
    }

    async fn delete_competitor(&mut self, id: CompetitorId) -> BracketResult<bool> {
        let result = sqlx::query("DELETE FROM competitors WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_competitor_matches(&mut self, id: CompetitorId) -> BracketResult<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count FROM matches
            WHERE player1_id = $1 OR player2_id = $1 OR winner_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(self.conn()?)
        .await?;

        Ok(row.try_get("count")?)
    }

    async fn insert_tournament(&mut self, name: &str) -> BracketResult<Tournament> {
        let row = sqlx::query(
            r#"
            INSERT INTO tournaments (name, status)
            VALUES ($1, $2)
            RETURNING id, name, status, seed, created_at
            "#,
        )
        .bind(name)
        .bind(TournamentStatus::Draft.as_str())
        .fetch_one(self.conn()?)
        .await?;

        tournament_from_row(&row)
    }

    async fn get_tournament(&mut self, id: TournamentId) -> BracketResult<Option<Tournament>> {
        let row =
            sqlx::query("SELECT id, name, status, seed, created_at FROM tournaments WHERE id = $1")
                .bind(id)
                .fetch_optional(self.conn()?)
                .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn lock_tournament(&mut self, id: TournamentId) -> BracketResult<Option<Tournament>> {
        let row = sqlx::query(
            "SELECT id, name, status, seed, created_at FROM tournaments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn list_tournaments(&mut self) -> BracketResult<Vec<Tournament>> {
        let rows = sqlx::query(
            "SELECT id, name, status, seed, created_at FROM tournaments ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.conn()?)
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    async fn set_tournament_status(
        &mut self,
        id: TournamentId,
        status: TournamentStatus,
        seed: Option<i64>,
    ) -> BracketResult<()> {
        let result = sqlx::query(
            "UPDATE tournaments SET status = $2, seed = COALESCE($3, seed) WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(seed)
        .execute(self.conn()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BracketError::TournamentNotFound(id));
        }
        Ok(())
    }

    async fn get_match(&mut self, id: MatchId) -> BracketResult<Option<Match>> {
        let sql = format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_matches(&mut self, tournament_id: TournamentId) -> BracketResult<Vec<Match>> {
        let sql = format!("SELECT {} FROM matches WHERE tournament_id = $1", MATCH_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(tournament_id)
            .fetch_all(self.conn()?)
            .await?;

        let matches = rows.iter().map(match_from_row).collect::<BracketResult<Vec<_>>>()?;
        Ok(sorted(matches))
    }

    async fn list_scheduled_matches(
        &mut self,
        tournament_id: Option<TournamentId>,
    ) -> BracketResult<Vec<Match>> {
        let sql = format!(
            r#"
            SELECT {} FROM matches
            WHERE scheduled_at IS NOT NULL AND ($1::BIGINT IS NULL OR tournament_id = $1)
            ORDER BY tournament_id, scheduled_at, id
            "#,
            MATCH_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(tournament_id)
            .fetch_all(self.conn()?)
            .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn insert_match(&mut self, new_match: &NewMatch) -> BracketResult<MatchId> {
        let order = i32::try_from(new_match.order)
            .map_err(|e| BracketError::Validation(format!("match order out of range: {}", e)))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO matches (tournament_id, phase, match_order, player1_id, player2_id, result, winner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(new_match.tournament_id)
        .bind(new_match.phase.as_str())
        .bind(order)
        .bind(new_match.player1)
        .bind(new_match.player2)
        .bind(new_match.result.as_str())
        .bind(new_match.winner)
        .fetch_one(self.conn()?)
        .await;

        match inserted {
            Ok(row) => Ok(row.try_get("id")?),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(BracketError::DuplicateSlot {
                    tournament_id: new_match.tournament_id,
                    phase: new_match.phase,
                    order: new_match.order,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save_match(&mut self, m: &Match) -> BracketResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE matches
            SET player1_id = $2, player2_id = $3, scheduled_at = $4, location = $5,
                result = $6, winner_id = $7, notes = $8
            WHERE id = $1
            "#,
        )
        .bind(m.id)
        .bind(m.player1)
        .bind(m.player2)
        .bind(m.scheduled_at.map(|dt| dt.naive_utc()))
        .bind(&m.location)
        .bind(m.result.as_str())
        .bind(m.winner)
        .bind(&m.notes)
        .execute(self.conn()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BracketError::MatchNotFound(m.id));
        }
        Ok(())
    }

    async fn commit(&mut self) -> BracketResult<()> {
        let tx = self.tx.take().ok_or(BracketError::SessionClosed)?;
        tx.commit().await?;
        Ok(())
    }
}
