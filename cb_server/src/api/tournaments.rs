//! Tournament handlers: creation, draw, match listing and champion.
//!
//! Draw a tournament with a fixed seed:
//! ```bash
//! curl -X POST "http://localhost:5000/api/torneios/1/sorteio?seed=42"
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chess_bracket::bracket::{
    ChampionStatus, DrawOptions, MatchId, MatchResult, MatchView, Phase, Tournament, TournamentId,
    TournamentStatus,
};
use chess_bracket::competitor::CompetitorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiResult;
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct TorneioCreate {
    pub nome: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TorneioResponse {
    pub id: TournamentId,
    pub nome: String,
    pub status: TournamentStatus,
    pub seed: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Tournament> for TorneioResponse {
    fn from(t: Tournament) -> Self {
        TorneioResponse {
            id: t.id,
            nome: t.name,
            status: t.status,
            seed: t.seed,
            created_at: t.created_at,
        }
    }
}

/// Query string of the draw endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SorteioQuery {
    pub seed: Option<i64>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SorteioResponse {
    pub success: bool,
    pub torneio_id: TournamentId,
    pub fase_inicial: Phase,
    pub num_partidas: usize,
    pub num_byes: usize,
    pub num_forcadas: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PartidaResponse {
    pub id: MatchId,
    pub torneio_id: TournamentId,
    pub fase: Phase,
    pub ordem: u32,
    pub jogador1_nome: Option<String>,
    pub jogador2_nome: Option<String>,
    pub data_hora: Option<DateTime<Utc>>,
    pub local: Option<String>,
    pub resultado: MatchResult,
    pub vencedor_nome: Option<String>,
    pub observacoes: Option<String>,
    pub is_bye: bool,
}

impl From<MatchView> for PartidaResponse {
    fn from(m: MatchView) -> Self {
        PartidaResponse {
            id: m.id,
            torneio_id: m.tournament_id,
            fase: m.phase,
            ordem: m.order,
            jogador1_nome: m.player1_name,
            jogador2_nome: m.player2_name,
            data_hora: m.scheduled_at,
            local: m.location,
            resultado: m.result,
            vencedor_nome: m.winner_name,
            observacoes: m.notes,
            is_bye: m.is_bye,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CampeaoDto {
    pub id: CompetitorId,
    pub nome: String,
    pub curso: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CampeaoResponse {
    pub campeao: Option<CampeaoDto>,
    pub finalizado: bool,
}

impl From<ChampionStatus> for CampeaoResponse {
    fn from(status: ChampionStatus) -> Self {
        CampeaoResponse {
            campeao: status.champion.map(|c| CampeaoDto {
                id: c.id,
                nome: c.name,
                curso: c.course,
            }),
            finalizado: status.finalized,
        }
    }
}

/// Create a tournament in draft status.
pub async fn create_tournament(
    State(state): State<AppState>,
    Json(body): Json<TorneioCreate>,
) -> ApiResult<(StatusCode, Json<TorneioResponse>)> {
    let tournament = state.manager.create_tournament(&body.nome).await?;
    Ok((StatusCode::CREATED, Json(tournament.into())))
}

/// List tournaments, newest first.
pub async fn list_tournaments(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TorneioResponse>>> {
    let tournaments = state.manager.list_tournaments().await?;
    Ok(Json(tournaments.into_iter().map(Into::into).collect()))
}

pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<TorneioResponse>> {
    let tournament = state.manager.get_tournament(tournament_id).await?;
    Ok(Json(tournament.into()))
}

/// Pair the registered competitors and generate the bracket.
///
/// Only draft tournaments can be drawn. Without `force`, a pool whose
/// leftover competitors share no schedule is rejected with `400`.
pub async fn draw_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Query(query): Query<SorteioQuery>,
) -> ApiResult<Json<SorteioResponse>> {
    let options = DrawOptions {
        seed: query.seed,
        force: query.force,
    };
    let summary = state.manager.execute_draw(tournament_id, options).await?;

    metrics::draws_total(summary.initial_phase.as_str());
    metrics::byes_total(summary.bye_count);
    logging::log_bracket_event(
        "draw",
        tournament_id,
        Some(summary.initial_phase.as_str()),
        &format!(
            "{} matches, {} byes, {} forced",
            summary.match_count, summary.bye_count, summary.forced_count
        ),
    );

    Ok(Json(SorteioResponse {
        success: true,
        torneio_id: summary.tournament_id,
        fase_inicial: summary.initial_phase,
        num_partidas: summary.match_count,
        num_byes: summary.bye_count,
        num_forcadas: summary.forced_count,
    }))
}

/// Matches of a tournament ordered by phase and position.
pub async fn list_matches(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Vec<PartidaResponse>>> {
    let matches = state.manager.list_matches(tournament_id).await?;
    Ok(Json(matches.into_iter().map(Into::into).collect()))
}

/// Champion of the tournament, `null` until the final is decided.
pub async fn get_champion(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<CampeaoResponse>> {
    let status = state.manager.champion(tournament_id).await?;
    Ok(Json(status.into()))
}
