//! Competitor registry handlers.
//!
//! Register a competitor:
//! ```bash
//! curl -X POST http://localhost:5000/api/competidores \
//!   -H "Content-Type: application/json" \
//!   -d '{"nome": "Ana", "curso": "LOG T3", "telefone": "11 96543-2109",
//!        "periodo": "integral", "dias_semana": "segunda a sexta"}'
//! ```
//!
//! Import a CSV file (`nome,curso,telefone,periodo,dias_semana`):
//! ```bash
//! curl -X POST http://localhost:5000/api/importar --data-binary @competidores.csv
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chess_bracket::availability::{DaySet, Period};
use chess_bracket::bracket::BracketError;
use chess_bracket::competitor::{Competitor, CompetitorFilter, CompetitorId, NewCompetitor};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiResult;
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct CompetidorCreate {
    pub nome: String,
    pub curso: String,
    pub telefone: String,
    pub periodo: Period,
    pub dias_semana: DaySet,
}

impl From<CompetidorCreate> for NewCompetitor {
    fn from(body: CompetidorCreate) -> Self {
        NewCompetitor {
            name: body.nome,
            course: body.curso,
            phone: body.telefone,
            period: body.periodo,
            days: body.dias_semana,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompetidorResponse {
    pub id: CompetitorId,
    pub nome: String,
    pub curso: String,
    pub telefone: String,
    pub periodo: Period,
    pub dias_semana: DaySet,
}

impl From<Competitor> for CompetidorResponse {
    fn from(c: Competitor) -> Self {
        CompetidorResponse {
            id: c.id,
            nome: c.name,
            curso: c.course,
            telefone: c.phone,
            periodo: c.period,
            dias_semana: c.days,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CompetidorQuery {
    pub periodo: Option<String>,
    pub dias_semana: Option<String>,
}

impl CompetidorQuery {
    fn into_filter(self) -> Result<CompetitorFilter, BracketError> {
        let period = match self.periodo.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Some(p.parse::<Period>()?),
            _ => None,
        };
        let days = match self.dias_semana.as_deref() {
            Some(d) => Some(DaySet::parse(d)?),
            None => None,
        };

        Ok(CompetitorFilter { period, days })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub importados: usize,
    pub erros: Vec<String>,
}

/// Register a competitor.
///
/// Returns `201 Created`, or `422` when the name or weekdays are empty.
pub async fn create_competitor(
    State(state): State<AppState>,
    Json(body): Json<CompetidorCreate>,
) -> ApiResult<(StatusCode, Json<CompetidorResponse>)> {
    let competitor = state.manager.register_competitor(body.into()).await?;
    Ok((StatusCode::CREATED, Json(competitor.into())))
}

/// List competitors, optionally filtered by `periodo` and `dias_semana`.
///
/// The weekday filter keeps competitors sharing at least one listed day.
pub async fn list_competitors(
    State(state): State<AppState>,
    Query(query): Query<CompetidorQuery>,
) -> ApiResult<Json<Vec<CompetidorResponse>>> {
    let filter = query.into_filter()?;
    let competitors = state.manager.list_competitors(&filter).await?;

    Ok(Json(competitors.into_iter().map(Into::into).collect()))
}

/// Delete a competitor that no match refers to.
///
/// `404` when unknown, `409` when the competitor already plays in a bracket.
pub async fn delete_competitor(
    State(state): State<AppState>,
    Path(competitor_id): Path<CompetitorId>,
) -> ApiResult<Json<SuccessResponse>> {
    state.manager.delete_competitor(competitor_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Register every valid row of a CSV body.
///
/// Rejected rows are listed in `erros`; the valid ones are still stored.
pub async fn import_competitors(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<ImportResponse>> {
    let report = state.manager.import_competitors(body.as_bytes()).await?;
    metrics::competitors_imported_total(report.imported);

    Ok(Json(ImportResponse {
        importados: report.imported,
        erros: report.errors,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_into_filter() {
        let query = CompetidorQuery {
            periodo: Some("Tarde".to_string()),
            dias_semana: Some("quarta e sexta".to_string()),
        };

        let filter = query.into_filter().unwrap();
        assert_eq!(filter.period, Some(Period::Afternoon));
        assert_eq!(filter.days.unwrap().to_string(), "qua,sex");
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let filter = CompetidorQuery::default().into_filter().unwrap();
        assert_eq!(filter, CompetitorFilter::default());
    }

    #[test]
    fn test_unknown_period_rejected() {
        let query = CompetidorQuery {
            periodo: Some("noite".to_string()),
            dias_semana: None,
        };

        assert!(matches!(
            query.into_filter(),
            Err(BracketError::Availability(_))
        ));
    }
}
