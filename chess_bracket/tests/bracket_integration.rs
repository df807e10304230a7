//! Integration tests for the bracket engine
//!
//! These tests run complete tournaments against the in-memory store, from
//! registration through the draw to the champion.

use chess_bracket::availability::{DaySet, Period};
use chess_bracket::bracket::{
    BracketError, BracketManager, DrawOptions, ErrorKind, MatchResult, MatchUpdate, MatchView,
    Phase, ResultOutcome, TournamentId, TournamentStatus,
};
use chess_bracket::competitor::{Competitor, CompetitorFilter, NewCompetitor};
use chess_bracket::db::MemoryStore;
use chrono::{Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

fn new_competitor(name: &str, period: Period, days: &str) -> NewCompetitor {
    NewCompetitor {
        name: name.to_string(),
        course: "LOG T1".to_string(),
        phone: "11 90000-0000".to_string(),
        period,
        days: DaySet::parse(days).unwrap(),
    }
}

/// Manager with `n` mutually compatible competitors and a draft tournament
async fn setup(n: usize) -> (BracketManager, TournamentId, HashMap<String, Competitor>) {
    let manager = BracketManager::new(Arc::new(MemoryStore::new()));

    let mut competitors = HashMap::new();
    for i in 1..=n {
        let name = format!("Player {:02}", i);
        let competitor = manager
            .register_competitor(new_competitor(&name, Period::FullDay, "segunda a sexta"))
            .await
            .unwrap();
        competitors.insert(name, competitor);
    }

    let tournament = manager.create_tournament("Copa Interna").await.unwrap();
    (manager, tournament.id, competitors)
}

fn find(views: &[MatchView], phase: Phase, order: u32) -> &MatchView {
    views
        .iter()
        .find(|m| m.phase == phase && m.order == order)
        .unwrap_or_else(|| panic!("no {} match #{}", phase, order))
}

fn id_of(competitors: &HashMap<String, Competitor>, name: &Option<String>) -> i64 {
    competitors[name.as_deref().unwrap()].id
}

fn result_update(winner_id: i64) -> MatchUpdate {
    MatchUpdate {
        scheduled_at: Some(Utc::now() - Duration::hours(2)),
        location: Some("Biblioteca".to_string()),
        winner_id: Some(winner_id),
        ..MatchUpdate::default()
    }
}

/// Every phase numbers its matches 1..=count with no gaps
fn assert_dense_orders(views: &[MatchView]) {
    let mut orders: BTreeMap<Phase, Vec<u32>> = BTreeMap::new();
    for m in views {
        orders.entry(m.phase).or_default().push(m.order);
    }
    for (phase, mut found) in orders {
        found.sort_unstable();
        let expected: Vec<u32> = (1..=found.len() as u32).collect();
        assert_eq!(found, expected, "{} orders are not dense", phase);
    }
}

fn phase_count(views: &[MatchView], phase: Phase) -> usize {
    views.iter().filter(|m| m.phase == phase).count()
}

/// Decide every ready match for player 1, one round at a time, until the
/// final has a winner. Returns the champion id.
async fn play_out(
    manager: &BracketManager,
    tournament_id: TournamentId,
    competitors: &HashMap<String, Competitor>,
) -> i64 {
    for _ in 0..8 {
        let views = manager.list_matches(tournament_id).await.unwrap();
        assert_dense_orders(&views);

        let ready: Vec<&MatchView> = views
            .iter()
            .filter(|m| m.winner_name.is_none())
            .filter(|m| m.player1_name.is_some() && m.player2_name.is_some())
            .collect();
        assert!(!ready.is_empty(), "bracket stalled without a champion");

        for m in ready {
            let winner = id_of(competitors, &m.player1_name);
            let outcome = manager.update_match(m.id, result_update(winner)).await.unwrap();
            if m.phase == Phase::Final {
                assert_eq!(
                    outcome,
                    ResultOutcome::Champion {
                        champion_id: winner,
                        finalized: true
                    }
                );
                let views = manager.list_matches(tournament_id).await.unwrap();
                assert_dense_orders(&views);
                return winner;
            }
            assert!(matches!(outcome, ResultOutcome::Advanced { .. }));
        }
    }
    panic!("no champion after every round was played");
}

#[tokio::test]
async fn test_two_competitors_play_the_final() {
    let (manager, tournament_id, competitors) = setup(2).await;

    let summary = manager
        .execute_draw(tournament_id, DrawOptions::default())
        .await
        .unwrap();
    assert_eq!(summary.initial_phase, Phase::Final);
    assert_eq!(summary.match_count, 1);
    assert_eq!(summary.bye_count, 0);

    let views = manager.list_matches(tournament_id).await.unwrap();
    assert_eq!(views.len(), 1);
    let final_match = find(&views, Phase::Final, 1);

    let winner = id_of(&competitors, &final_match.player2_name);
    let outcome = manager
        .update_match(final_match.id, result_update(winner))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ResultOutcome::Champion {
            champion_id: winner,
            finalized: true
        }
    );

    let tournament = manager.get_tournament(tournament_id).await.unwrap();
    assert_eq!(tournament.status, TournamentStatus::Finalized);

    let status = manager.champion(tournament_id).await.unwrap();
    assert!(status.finalized);
    let champion = status.champion.unwrap();
    assert_eq!(champion.id, winner);
    assert_eq!(champion.course, "LOG T1");

    let views = manager.list_matches(tournament_id).await.unwrap();
    assert_eq!(views[0].result, MatchResult::Player2);
}

#[tokio::test]
async fn test_seven_competitors_get_quarterfinal_with_bye() {
    let (manager, tournament_id, _) = setup(7).await;

    let summary = manager
        .execute_draw(tournament_id, DrawOptions { seed: Some(11), force: false })
        .await
        .unwrap();
    assert_eq!(summary.initial_phase, Phase::Quarterfinal);
    assert_eq!(summary.match_count, 4);
    assert_eq!(summary.bye_count, 1);

    let views = manager.list_matches(tournament_id).await.unwrap();
    let byes: Vec<_> = views
        .iter()
        .filter(|m| m.phase == Phase::Quarterfinal && m.is_bye)
        .collect();
    assert_eq!(byes.len(), 1);

    // The bye is decided and already seated one level up
    let bye = byes[0];
    assert_eq!(bye.result, MatchResult::Player1);
    assert_eq!(bye.winner_name, bye.player1_name);
    assert!(bye.player2_name.is_none());

    let index = bye.order - 1;
    let target = find(&views, Phase::Semifinal, index / 2 + 1);
    let seat = if index % 2 == 0 {
        &target.player1_name
    } else {
        &target.player2_name
    };
    assert_eq!(seat, &bye.player1_name);
}

#[tokio::test]
async fn test_full_bracket_routing_to_champion() {
    let (manager, tournament_id, competitors) = setup(8).await;
    manager
        .execute_draw(tournament_id, DrawOptions { seed: Some(3), force: false })
        .await
        .unwrap();

    // Player 1 of every quarterfinal wins
    let views = manager.list_matches(tournament_id).await.unwrap();
    let mut next_ids = Vec::new();
    for order in 1..=4 {
        let quarter = find(&views, Phase::Quarterfinal, order);
        let winner = id_of(&competitors, &quarter.player1_name);
        match manager.update_match(quarter.id, result_update(winner)).await.unwrap() {
            ResultOutcome::Advanced { next_match_id } => next_ids.push(next_match_id),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    // Orders 1 and 2 feed semifinal 1, orders 3 and 4 feed semifinal 2
    assert_eq!(next_ids[0], next_ids[1]);
    assert_eq!(next_ids[2], next_ids[3]);
    assert_ne!(next_ids[0], next_ids[2]);

    let views = manager.list_matches(tournament_id).await.unwrap();
    let semi1 = find(&views, Phase::Semifinal, 1);
    let semi2 = find(&views, Phase::Semifinal, 2);
    assert_eq!(semi1.id, next_ids[0]);
    assert_eq!(semi1.player1_name, find(&views, Phase::Quarterfinal, 1).player1_name);
    assert_eq!(semi1.player2_name, find(&views, Phase::Quarterfinal, 2).player1_name);
    assert_eq!(semi2.player1_name, find(&views, Phase::Quarterfinal, 3).player1_name);
    assert_eq!(semi2.player2_name, find(&views, Phase::Quarterfinal, 4).player1_name);

    let semi1_winner = id_of(&competitors, &semi1.player2_name);
    let semi2_winner = id_of(&competitors, &semi2.player1_name);
    manager.update_match(semi1.id, result_update(semi1_winner)).await.unwrap();
    manager.update_match(semi2.id, result_update(semi2_winner)).await.unwrap();

    let views = manager.list_matches(tournament_id).await.unwrap();
    let final_match = find(&views, Phase::Final, 1);
    assert_eq!(id_of(&competitors, &final_match.player1_name), semi1_winner);
    assert_eq!(id_of(&competitors, &final_match.player2_name), semi2_winner);

    let outcome = manager
        .update_match(final_match.id, result_update(semi2_winner))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ResultOutcome::Champion {
            champion_id: semi2_winner,
            finalized: true
        }
    );

    let status = manager.champion(tournament_id).await.unwrap();
    assert_eq!(status.champion.map(|c| c.id), Some(semi2_winner));
    assert_eq!(views.len(), 4 + 2 + 1);
}

#[tokio::test]
async fn test_five_competitors_walkover_reaches_final() {
    let (manager, tournament_id, _) = setup(5).await;
    let summary = manager
        .execute_draw(tournament_id, DrawOptions { seed: Some(5), force: false })
        .await
        .unwrap();
    assert_eq!(summary.initial_phase, Phase::Quarterfinal);
    assert_eq!(summary.match_count, 3);
    assert_eq!(summary.bye_count, 1);

    let views = manager.list_matches(tournament_id).await.unwrap();
    let bye = find(&views, Phase::Quarterfinal, 3);
    assert!(bye.is_bye);

    // Semifinal 2 can never get a second player, so the bye walks on
    let walkover = find(&views, Phase::Semifinal, 2);
    assert!(walkover.is_bye);
    assert_eq!(walkover.player1_name, bye.player1_name);

    let final_match = find(&views, Phase::Final, 1);
    assert_eq!(final_match.player2_name, bye.player1_name);
    assert!(final_match.player1_name.is_none());
}

#[tokio::test]
async fn test_unscheduled_match_cannot_be_decided() {
    let (manager, tournament_id, competitors) = setup(2).await;
    manager
        .execute_draw(tournament_id, DrawOptions::default())
        .await
        .unwrap();

    let views = manager.list_matches(tournament_id).await.unwrap();
    let final_match = find(&views, Phase::Final, 1);
    let winner = id_of(&competitors, &final_match.player1_name);

    let err = manager
        .update_match(
            final_match.id,
            MatchUpdate {
                winner_id: Some(winner),
                ..MatchUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::NotScheduled(_)));
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn test_half_filled_match_waits_for_opponent() {
    let (manager, tournament_id, competitors) = setup(4).await;
    manager
        .execute_draw(tournament_id, DrawOptions { seed: Some(9), force: false })
        .await
        .unwrap();

    let views = manager.list_matches(tournament_id).await.unwrap();
    let semi1 = find(&views, Phase::Semifinal, 1);
    let winner = id_of(&competitors, &semi1.player1_name);
    manager.update_match(semi1.id, result_update(winner)).await.unwrap();

    let views = manager.list_matches(tournament_id).await.unwrap();
    let final_match = find(&views, Phase::Final, 1);
    let err = manager
        .update_match(final_match.id, result_update(winner))
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::AwaitingOpponent(_)));
}

#[tokio::test]
async fn test_double_advancement() {
    let (manager, tournament_id, competitors) = setup(4).await;
    manager
        .execute_draw(tournament_id, DrawOptions { seed: Some(1), force: false })
        .await
        .unwrap();

    let views = manager.list_matches(tournament_id).await.unwrap();
    let semi = find(&views, Phase::Semifinal, 2);
    let first = id_of(&competitors, &semi.player1_name);
    let second = id_of(&competitors, &semi.player2_name);

    let outcome = manager.update_match(semi.id, result_update(first)).await.unwrap();

    // Same winner again changes nothing
    let again = manager.update_match(semi.id, result_update(first)).await.unwrap();
    assert_eq!(outcome, again);

    // A different winner is refused
    let err = manager
        .update_match(semi.id, result_update(second))
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::WinnerConflict { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let views = manager.list_matches(tournament_id).await.unwrap();
    assert_eq!(views.len(), 3);
    assert_eq!(
        find(&views, Phase::Final, 1).player2_name,
        find(&views, Phase::Semifinal, 2).player1_name
    );
}

#[tokio::test]
async fn test_explicit_result_must_match_winner() {
    let (manager, tournament_id, competitors) = setup(2).await;
    manager
        .execute_draw(tournament_id, DrawOptions::default())
        .await
        .unwrap();

    let views = manager.list_matches(tournament_id).await.unwrap();
    let final_match = find(&views, Phase::Final, 1);
    let player2 = id_of(&competitors, &final_match.player2_name);

    let err = manager
        .update_match(
            final_match.id,
            MatchUpdate {
                result: Some(MatchResult::Player1),
                ..result_update(player2)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::ResultMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let status = manager.champion(tournament_id).await.unwrap();
    assert!(!status.finalized);
    assert!(status.champion.is_none());
}

#[tokio::test]
async fn test_decided_match_keeps_its_result() {
    let (manager, tournament_id, competitors) = setup(2).await;
    manager
        .execute_draw(tournament_id, DrawOptions::default())
        .await
        .unwrap();

    let views = manager.list_matches(tournament_id).await.unwrap();
    let final_match = find(&views, Phase::Final, 1);
    let player1 = id_of(&competitors, &final_match.player1_name);
    manager
        .update_match(final_match.id, result_update(player1))
        .await
        .unwrap();

    // No winner in the request, but the result names the loser
    let err = manager
        .update_match(
            final_match.id,
            MatchUpdate {
                result: Some(MatchResult::Player2),
                ..MatchUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BracketError::ResultMismatch {
            phase: Phase::Final,
            order: 1
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = manager
        .update_match(
            final_match.id,
            MatchUpdate {
                result: Some(MatchResult::Pending),
                ..MatchUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::ResultMismatch { .. }));

    // Restating the winner's seat is a plain update
    let outcome = manager
        .update_match(
            final_match.id,
            MatchUpdate {
                result: Some(MatchResult::Player1),
                notes: Some("Xeque-mate no lance 31".to_string()),
                ..MatchUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome, ResultOutcome::Updated);

    let views = manager.list_matches(tournament_id).await.unwrap();
    let stored = find(&views, Phase::Final, 1);
    assert_eq!(stored.result, MatchResult::Player1);
    assert_eq!(stored.winner_name, stored.player1_name);
    assert_eq!(stored.notes.as_deref(), Some("Xeque-mate no lance 31"));

    let status = manager.champion(tournament_id).await.unwrap();
    assert!(status.finalized);
    assert_eq!(status.champion.map(|c| c.id), Some(player1));
}

#[tokio::test]
async fn test_bye_cannot_be_reset_to_pending() {
    let (manager, tournament_id, _) = setup(3).await;
    manager
        .execute_draw(tournament_id, DrawOptions { seed: Some(4), force: false })
        .await
        .unwrap();

    let views = manager.list_matches(tournament_id).await.unwrap();
    let bye = find(&views, Phase::Semifinal, 2);
    assert!(bye.is_bye);

    let err = manager
        .update_match(
            bye.id,
            MatchUpdate {
                result: Some(MatchResult::Pending),
                ..MatchUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::ResultMismatch { .. }));

    let views = manager.list_matches(tournament_id).await.unwrap();
    let bye = find(&views, Phase::Semifinal, 2);
    assert_eq!(bye.result, MatchResult::Player1);
    assert_eq!(bye.winner_name, bye.player1_name);
}

#[tokio::test]
async fn test_resubmitted_final_finalizes_once() {
    let (manager, tournament_id, competitors) = setup(2).await;
    manager
        .execute_draw(tournament_id, DrawOptions::default())
        .await
        .unwrap();

    let views = manager.list_matches(tournament_id).await.unwrap();
    let final_match = find(&views, Phase::Final, 1);
    let winner = id_of(&competitors, &final_match.player1_name);

    let first = manager
        .update_match(final_match.id, result_update(winner))
        .await
        .unwrap();
    assert_eq!(
        first,
        ResultOutcome::Champion {
            champion_id: winner,
            finalized: true
        }
    );

    let again = manager
        .update_match(final_match.id, result_update(winner))
        .await
        .unwrap();
    assert_eq!(
        again,
        ResultOutcome::Champion {
            champion_id: winner,
            finalized: false
        }
    );

    let tournament = manager.get_tournament(tournament_id).await.unwrap();
    assert_eq!(tournament.status, TournamentStatus::Finalized);
}

#[tokio::test]
async fn test_nine_competitors_play_round_of_16() {
    let (manager, tournament_id, competitors) = setup(9).await;
    let summary = manager
        .execute_draw(tournament_id, DrawOptions { seed: Some(9), force: false })
        .await
        .unwrap();
    assert_eq!(summary.initial_phase, Phase::RoundOf16);
    assert_eq!(summary.match_count, 5);
    assert_eq!(summary.bye_count, 1);

    let views = manager.list_matches(tournament_id).await.unwrap();
    assert_dense_orders(&views);

    // The lone bye in round of 16 #5 walks over quarterfinal #3 and
    // semifinal #2 straight into the final
    let bye = find(&views, Phase::RoundOf16, 5);
    assert!(bye.is_bye);
    let quarter = find(&views, Phase::Quarterfinal, 3);
    assert!(quarter.is_bye);
    assert_eq!(quarter.player1_name, bye.player1_name);
    let semi = find(&views, Phase::Semifinal, 2);
    assert!(semi.is_bye);
    assert_eq!(semi.player1_name, bye.player1_name);
    let final_match = find(&views, Phase::Final, 1);
    assert_eq!(final_match.player2_name, bye.player1_name);
    assert!(final_match.player1_name.is_none());

    let expected_champion = id_of(&competitors, &find(&views, Phase::RoundOf16, 1).player1_name);
    let champion = play_out(&manager, tournament_id, &competitors).await;
    assert_eq!(champion, expected_champion);

    let views = manager.list_matches(tournament_id).await.unwrap();
    assert_eq!(phase_count(&views, Phase::RoundOf16), 5);
    assert_eq!(phase_count(&views, Phase::Quarterfinal), 3);
    assert_eq!(phase_count(&views, Phase::Semifinal), 2);
    assert_eq!(phase_count(&views, Phase::Final), 1);
    assert!(views.iter().all(|m| m.winner_name.is_some()));

    let tournament = manager.get_tournament(tournament_id).await.unwrap();
    assert_eq!(tournament.status, TournamentStatus::Finalized);
    let status = manager.champion(tournament_id).await.unwrap();
    assert_eq!(status.champion.map(|c| c.id), Some(champion));
}

#[tokio::test]
async fn test_sixteen_competitors_play_to_champion() {
    let (manager, tournament_id, competitors) = setup(16).await;
    let summary = manager
        .execute_draw(tournament_id, DrawOptions { seed: Some(16), force: false })
        .await
        .unwrap();
    assert_eq!(summary.initial_phase, Phase::RoundOf16);
    assert_eq!(summary.match_count, 8);
    assert_eq!(summary.bye_count, 0);

    let views = manager.list_matches(tournament_id).await.unwrap();
    assert_dense_orders(&views);
    assert_eq!(views.len(), 8);
    assert!(views.iter().all(|m| !m.is_bye));

    let expected_champion = id_of(&competitors, &find(&views, Phase::RoundOf16, 1).player1_name);
    let champion = play_out(&manager, tournament_id, &competitors).await;
    assert_eq!(champion, expected_champion);

    let views = manager.list_matches(tournament_id).await.unwrap();
    assert_eq!(views.len(), 8 + 4 + 2 + 1);
    assert_eq!(phase_count(&views, Phase::Quarterfinal), 4);

    // Quarterfinal k holds the player-1 winners of round of 16 #2k-1 and #2k
    for order in 1..=4 {
        let quarter = find(&views, Phase::Quarterfinal, order);
        assert_eq!(
            quarter.player1_name,
            find(&views, Phase::RoundOf16, 2 * order - 1).player1_name
        );
        assert_eq!(
            quarter.player2_name,
            find(&views, Phase::RoundOf16, 2 * order).player1_name
        );
    }

    let status = manager.champion(tournament_id).await.unwrap();
    assert!(status.finalized);
    assert_eq!(status.champion.map(|c| c.id), Some(champion));
}

#[tokio::test]
async fn test_forced_mixed_pool_plays_to_finalized() {
    let manager = BracketManager::new(Arc::new(MemoryStore::new()));

    // Four single-day groups that share no schedule, visited as quarta,
    // quinta, segunda, terca
    let pool = [
        ("Quarta A", "quarta"),
        ("Quarta B", "quarta"),
        ("Quarta C", "quarta"),
        ("Quinta A", "quinta"),
        ("Segunda A", "segunda"),
        ("Terca A", "terca"),
        ("Terca B", "terca"),
        ("Terca C", "terca"),
        ("Terca D", "terca"),
    ];
    let mut competitors = HashMap::new();
    for (name, days) in pool {
        let competitor = manager
            .register_competitor(new_competitor(name, Period::Morning, days))
            .await
            .unwrap();
        competitors.insert(name.to_string(), competitor);
    }
    let tournament_id = manager.create_tournament("Copa Mista").await.unwrap().id;

    let err = manager
        .execute_draw(tournament_id, DrawOptions { seed: Some(21), force: false })
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::IncompatibleSchedules(_)));

    let summary = manager
        .execute_draw(tournament_id, DrawOptions { seed: Some(21), force: true })
        .await
        .unwrap();
    assert_eq!(summary.initial_phase, Phase::RoundOf16);
    assert_eq!(summary.match_count, 5);
    assert_eq!(summary.bye_count, 1);
    assert_eq!(summary.forced_count, 1);

    let views = manager.list_matches(tournament_id).await.unwrap();
    assert_dense_orders(&views);

    // The quarta leftover meets the quinta single; the segunda single sits
    // out mid-bracket and waits in quarterfinal #2
    let bye = find(&views, Phase::RoundOf16, 3);
    assert!(bye.is_bye);
    assert_eq!(bye.player1_name.as_deref(), Some("Segunda A"));
    assert_eq!(
        find(&views, Phase::Quarterfinal, 2).player1_name.as_deref(),
        Some("Segunda A")
    );
    assert_eq!(phase_count(&views, Phase::Quarterfinal), 2);
    assert_eq!(phase_count(&views, Phase::Semifinal), 0);

    let champion = play_out(&manager, tournament_id, &competitors).await;

    let views = manager.list_matches(tournament_id).await.unwrap();
    assert_eq!(phase_count(&views, Phase::Quarterfinal), 3);
    assert_eq!(phase_count(&views, Phase::Semifinal), 2);

    // Round of 16 #5 has no sibling and walks over quarterfinal #3 and
    // semifinal #2
    let last = find(&views, Phase::RoundOf16, 5);
    assert!(!last.is_bye);
    let quarter = find(&views, Phase::Quarterfinal, 3);
    assert!(quarter.is_bye);
    assert_eq!(quarter.player1_name, last.winner_name);
    let semi = find(&views, Phase::Semifinal, 2);
    assert!(semi.is_bye);
    assert_eq!(semi.player1_name, last.winner_name);
    assert_eq!(find(&views, Phase::Final, 1).player2_name, last.winner_name);

    let tournament = manager.get_tournament(tournament_id).await.unwrap();
    assert_eq!(tournament.status, TournamentStatus::Finalized);
    let status = manager.champion(tournament_id).await.unwrap();
    assert_eq!(status.champion.map(|c| c.id), Some(champion));
}

#[tokio::test]
async fn test_same_seed_same_pairs() {
    let (manager, first, _) = setup(10).await;
    let second = manager.create_tournament("Copa Reprise").await.unwrap().id;

    let options = DrawOptions { seed: Some(2025), force: false };
    manager.execute_draw(first, options).await.unwrap();
    manager.execute_draw(second, options).await.unwrap();

    let pairs = |views: Vec<MatchView>| -> Vec<_> {
        views
            .into_iter()
            .filter(|m| m.phase == Phase::RoundOf16)
            .map(|m| (m.order, m.player1_name, m.player2_name))
            .collect()
    };

    let first_pairs = pairs(manager.list_matches(first).await.unwrap());
    let second_pairs = pairs(manager.list_matches(second).await.unwrap());
    assert_eq!(first_pairs.len(), 5);
    assert_eq!(first_pairs, second_pairs);

    let tournament = manager.get_tournament(first).await.unwrap();
    assert_eq!(tournament.seed, Some(2025));
    assert_eq!(tournament.status, TournamentStatus::Drawn);
}

#[tokio::test]
async fn test_draw_rejections() {
    let (manager, tournament_id, _) = setup(1).await;
    let err = manager
        .execute_draw(tournament_id, DrawOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::InsufficientCompetitors { needed: 2, current: 1 }));

    let err = manager
        .execute_draw(999, DrawOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let (manager, tournament_id, _) = setup(17).await;
    let err = manager
        .execute_draw(tournament_id, DrawOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::TooManyCompetitors { .. }));

    // Rejected draws leave the tournament in draft
    let tournament = manager.get_tournament(tournament_id).await.unwrap();
    assert_eq!(tournament.status, TournamentStatus::Draft);
    assert!(manager.list_matches(tournament_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_incompatible_pool_needs_force() {
    let manager = BracketManager::new(Arc::new(MemoryStore::new()));
    manager
        .register_competitor(new_competitor("Ana", Period::Morning, "sexta"))
        .await
        .unwrap();
    manager
        .register_competitor(new_competitor("Bia", Period::Afternoon, "segunda e terca"))
        .await
        .unwrap();
    let tournament = manager.create_tournament("Copa").await.unwrap();

    let err = manager
        .execute_draw(tournament.id, DrawOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::IncompatibleSchedules(_)));

    let summary = manager
        .execute_draw(tournament.id, DrawOptions { seed: None, force: true })
        .await
        .unwrap();
    assert_eq!(summary.forced_count, 1);
}

#[tokio::test]
async fn test_competitor_registry() {
    let manager = BracketManager::new(Arc::new(MemoryStore::new()));
    let ana = manager
        .register_competitor(new_competitor("Ana", Period::Morning, "quarta e sexta"))
        .await
        .unwrap();
    manager
        .register_competitor(new_competitor("Bia", Period::Afternoon, "segunda e terca"))
        .await
        .unwrap();

    let filter = CompetitorFilter {
        period: None,
        days: Some(DaySet::parse("sex").unwrap()),
    };
    let found = manager.list_competitors(&filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ana.id);

    let err = manager
        .register_competitor(new_competitor("  ", Period::Morning, "sexta"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    manager.delete_competitor(ana.id).await.unwrap();
    let err = manager.delete_competitor(ana.id).await.unwrap_err();
    assert!(matches!(err, BracketError::CompetitorNotFound(_)));

    let all = manager.list_competitors(&CompetitorFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_competitor_in_bracket_cannot_be_deleted() {
    let (manager, tournament_id, competitors) = setup(2).await;
    manager
        .execute_draw(tournament_id, DrawOptions::default())
        .await
        .unwrap();

    let id = competitors["Player 01"].id;
    let err = manager.delete_competitor(id).await.unwrap_err();
    assert!(matches!(err, BracketError::CompetitorInUse { matches: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_import_and_export() {
    let manager = BracketManager::new(Arc::new(MemoryStore::new()));
    let csv = "nome,curso,telefone,periodo,dias_semana\n\
               Ana,LOG T1,111,manha,segunda a sexta\n\
               Bruno,DEV S4,222,integral,segunda a sexta\n\
               Caio,DEV S4,333,madrugada,sexta\n";

    let report = manager.import_competitors(csv.as_bytes()).await.unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("line 4:"));

    let tournament = manager.create_tournament("Copa").await.unwrap();
    manager
        .execute_draw(tournament.id, DrawOptions::default())
        .await
        .unwrap();

    // Nothing scheduled yet
    assert!(manager.schedule_rows(Some(tournament.id)).await.unwrap().is_empty());

    let final_match = manager.list_matches(tournament.id).await.unwrap().remove(0);
    manager
        .update_match(
            final_match.id,
            MatchUpdate {
                scheduled_at: Some(Utc::now() + Duration::days(1)),
                location: Some("Sala 12".to_string()),
                ..MatchUpdate::default()
            },
        )
        .await
        .unwrap();

    let mut out = Vec::new();
    let written = manager.export_schedule(None, &mut out).await.unwrap();
    assert_eq!(written, 1);

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("torneio_id,fase,ordem,"));
    assert!(text.contains(",final,1,"));
    assert!(text.contains("Sala 12"));
}

#[tokio::test]
async fn test_tournaments_listed_newest_first() {
    let manager = BracketManager::new(Arc::new(MemoryStore::new()));
    let first = manager.create_tournament("Primeira").await.unwrap();
    let second = manager.create_tournament("Segunda").await.unwrap();

    let listed = manager.list_tournaments().await.unwrap();
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
    assert!(listed.iter().all(|t| t.status == TournamentStatus::Draft));

    let err = manager.create_tournament("   ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
