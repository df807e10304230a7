//! CSV export of scheduled matches.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

use super::errors::BracketResult;
use super::models::{Match, MatchResult, Phase, TournamentId};
use crate::competitor::{Competitor, CompetitorId};

const BYE: &str = "BYE";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One exported match line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    #[serde(rename = "torneio_id")]
    pub tournament_id: TournamentId,
    #[serde(rename = "fase")]
    pub phase: Phase,
    #[serde(rename = "ordem")]
    pub order: u32,
    #[serde(rename = "jogador1_nome")]
    pub player1_name: String,
    #[serde(rename = "jogador1_telefone")]
    pub player1_phone: String,
    #[serde(rename = "jogador2_nome")]
    pub player2_name: String,
    #[serde(rename = "jogador2_telefone")]
    pub player2_phone: String,
    #[serde(rename = "data_hora")]
    pub scheduled_at: String,
    #[serde(rename = "local")]
    pub location: String,
    #[serde(rename = "resultado")]
    pub result: MatchResult,
    #[serde(rename = "vencedor_nome")]
    pub winner_name: String,
    #[serde(rename = "observacoes")]
    pub notes: String,
}

impl ScheduleRow {
    /// Build a row, resolving competitor names and phones
    pub fn new(m: &Match, competitors: &HashMap<CompetitorId, Competitor>) -> Self {
        let lookup = |id: Option<CompetitorId>| id.and_then(|id| competitors.get(&id));
        let player1 = lookup(m.player1);
        let player2 = lookup(m.player2);

        let (player2_name, player2_phone) = match (m.player2, player2) {
            (None, _) => (BYE.to_string(), String::new()),
            (Some(_), Some(c)) => (c.name.clone(), c.phone.clone()),
            (Some(_), None) => (String::new(), String::new()),
        };

        Self {
            tournament_id: m.tournament_id,
            phase: m.phase,
            order: m.order,
            player1_name: player1.map(|c| c.name.clone()).unwrap_or_default(),
            player1_phone: player1.map(|c| c.phone.clone()).unwrap_or_default(),
            player2_name,
            player2_phone,
            scheduled_at: m.scheduled_at.map(format_date).unwrap_or_default(),
            location: m.location.clone().unwrap_or_default(),
            result: m.result,
            winner_name: lookup(m.winner).map(|c| c.name.clone()).unwrap_or_default(),
            notes: m.notes.clone().unwrap_or_default(),
        }
    }
}

fn format_date(dt: DateTime<Utc>) -> String {
    dt.format(DATE_FORMAT).to_string()
}

/// Write rows as CSV with a header line
///
/// Returns the number of data rows written.
pub fn write_schedule_csv<W: Write>(writer: W, rows: &[ScheduleRow]) -> BracketResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{DaySet, Period};
    use chrono::TimeZone;

    fn competitor(id: CompetitorId, name: &str, phone: &str) -> Competitor {
        Competitor {
            id,
            name: name.to_string(),
            course: "1A".to_string(),
            phone: phone.to_string(),
            period: Period::Morning,
            days: DaySet::parse("sexta").unwrap(),
        }
    }

    #[test]
    fn test_export_with_bye_and_winner() {
        let competitors: HashMap<_, _> = [
            (1, competitor(1, "Ana", "111")),
            (2, competitor(2, "Bruno", "222")),
            (3, competitor(3, "Caio", "333")),
        ]
        .into_iter()
        .collect();

        let when = Utc.with_ymd_and_hms(2025, 3, 14, 10, 30, 0).unwrap();
        let played = Match {
            id: 1,
            tournament_id: 9,
            phase: Phase::Semifinal,
            order: 1,
            player1: Some(1),
            player2: Some(2),
            scheduled_at: Some(when),
            location: Some("Biblioteca".to_string()),
            result: MatchResult::Player2,
            winner: Some(2),
            notes: None,
        };
        let bye = Match {
            id: 2,
            order: 2,
            player1: Some(3),
            player2: None,
            location: None,
            result: MatchResult::Player1,
            winner: Some(3),
            ..played.clone()
        };

        let rows = vec![
            ScheduleRow::new(&played, &competitors),
            ScheduleRow::new(&bye, &competitors),
        ];
        let mut out = Vec::new();
        assert_eq!(write_schedule_csv(&mut out, &rows).unwrap(), 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "torneio_id,fase,ordem,jogador1_nome,jogador1_telefone,jogador2_nome,\
             jogador2_telefone,data_hora,local,resultado,vencedor_nome,observacoes"
        );
        assert_eq!(
            lines[1],
            "9,semifinal,1,Ana,111,Bruno,222,2025-03-14 10:30,Biblioteca,j2,Bruno,"
        );
        assert_eq!(lines[2], "9,semifinal,2,Caio,333,BYE,,2025-03-14 10:30,,j1,Caio,");
    }
}
