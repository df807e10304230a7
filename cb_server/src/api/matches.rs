//! Match update handler.
//!
//! Schedule a match and record its winner in one call:
//! ```bash
//! curl -X PATCH http://localhost:5000/api/partidas/3 \
//!   -H "Content-Type: application/json" \
//!   -d '{"data_hora": "2025-03-14T10:00:00", "local": "Biblioteca", "vencedor_id": 5}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
};
use chess_bracket::bracket::{MatchId, MatchResult, MatchUpdate, ResultOutcome};
use chess_bracket::competitor::CompetitorId;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::AppState;
use super::error::ApiResult;
use crate::metrics;

#[derive(Debug, Default, Deserialize)]
pub struct PartidaUpdate {
    #[serde(default, deserialize_with = "deserialize_match_time")]
    pub data_hora: Option<DateTime<Utc>>,
    pub local: Option<String>,
    pub resultado: Option<MatchResult>,
    pub vencedor_id: Option<CompetitorId>,
    pub observacoes: Option<String>,
}

impl From<PartidaUpdate> for MatchUpdate {
    fn from(body: PartidaUpdate) -> Self {
        MatchUpdate {
            scheduled_at: body.data_hora,
            location: body.local,
            result: body.resultado,
            winner_id: body.vencedor_id,
            notes: body.observacoes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PartidaUpdateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxima_partida_id: Option<MatchId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campeao_id: Option<CompetitorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torneio_finalizado: Option<bool>,
}

impl From<ResultOutcome> for PartidaUpdateResponse {
    fn from(outcome: ResultOutcome) -> Self {
        let mut response = PartidaUpdateResponse {
            success: true,
            proxima_partida_id: None,
            campeao_id: None,
            torneio_finalizado: None,
        };

        match outcome {
            ResultOutcome::Updated => {}
            ResultOutcome::Advanced { next_match_id } => {
                response.proxima_partida_id = Some(next_match_id);
            }
            ResultOutcome::Champion { champion_id, .. } => {
                response.campeao_id = Some(champion_id);
                response.torneio_finalizado = Some(true);
            }
        }

        response
    }
}

/// Accepts RFC 3339 timestamps and offset-less local times, read as UTC
fn deserialize_match_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(time) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(time.with_timezone(&Utc)));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&raw, format).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid data_hora '{}'", raw)))
}

/// Update match fields and, when `vencedor_id` is present, advance the winner.
///
/// Responds `{success}`, `{success, proxima_partida_id}` or
/// `{success, campeao_id, torneio_finalizado}` once the final is decided.
pub async fn update_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Json(body): Json<PartidaUpdate>,
) -> ApiResult<Json<PartidaUpdateResponse>> {
    let records_winner = body.vencedor_id.is_some();
    let outcome = state.manager.update_match(match_id, body.into()).await?;

    if records_winner {
        metrics::results_recorded_total();
    }
    if let ResultOutcome::Champion {
        champion_id,
        finalized: true,
    } = outcome
    {
        metrics::tournaments_finalized_total();
        tracing::info!(
            match_id = match_id,
            champion_id = champion_id,
            "Tournament finalized"
        );
    }

    Ok(Json(outcome.into()))
}
