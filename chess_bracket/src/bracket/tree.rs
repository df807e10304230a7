//! In-memory bracket of one tournament.
//!
//! A [`Bracket`] is a snapshot of a tournament's matches keyed by
//! `(phase, order)`. Recording a winner mutates the snapshot and marks every
//! touched node dirty; the caller persists [`Bracket::changes`] afterwards.
//!
//! Match `order` k of a phase feeds order `(k - 1) / 2 + 1` of the next phase,
//! as player 1 when `k - 1` is even and as player 2 otherwise.

use std::collections::BTreeMap;

use super::errors::{BracketError, BracketResult};
use super::models::{Match, MatchId, MatchResult, Phase, TournamentId};
use super::pairing::Pairing;
use crate::competitor::CompetitorId;

/// Seat within a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Player1,
    Player2,
}

impl Seat {
    fn for_index(index: u32) -> Self {
        if index % 2 == 0 {
            Seat::Player1
        } else {
            Seat::Player2
        }
    }

    /// Result implied by this seat winning
    pub fn result(self) -> MatchResult {
        match self {
            Seat::Player1 => MatchResult::Player1,
            Seat::Player2 => MatchResult::Player2,
        }
    }
}

/// One slot of the bracket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketNode {
    /// `None` until the node is stored
    pub id: Option<MatchId>,
    pub phase: Phase,
    pub order: u32,
    pub player1: Option<CompetitorId>,
    pub player2: Option<CompetitorId>,
    pub result: MatchResult,
    pub winner: Option<CompetitorId>,
    dirty: bool,
}

impl BracketNode {
    fn placeholder(phase: Phase, order: u32) -> Self {
        Self {
            id: None,
            phase,
            order,
            player1: None,
            player2: None,
            result: MatchResult::Pending,
            winner: None,
            dirty: true,
        }
    }

    fn from_match(m: &Match) -> Self {
        Self {
            id: Some(m.id),
            phase: m.phase,
            order: m.order,
            player1: m.player1,
            player2: m.player2,
            result: m.result,
            winner: m.winner,
            dirty: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn seat_of(&self, competitor: CompetitorId) -> Option<Seat> {
        if self.player1 == Some(competitor) {
            Some(Seat::Player1)
        } else if self.player2 == Some(competitor) {
            Some(Seat::Player2)
        } else {
            None
        }
    }

    pub fn occupant(&self, seat: Seat) -> Option<CompetitorId> {
        match seat {
            Seat::Player1 => self.player1,
            Seat::Player2 => self.player2,
        }
    }

    fn seat_competitor(&mut self, seat: Seat, competitor: CompetitorId) {
        match seat {
            Seat::Player1 => self.player1 = Some(competitor),
            Seat::Player2 => self.player2 = Some(competitor),
        }
        self.dirty = true;
    }

    fn decide(&mut self, winner: CompetitorId, seat: Seat) {
        if self.winner != Some(winner) {
            self.winner = Some(winner);
            self.dirty = true;
        }
        if self.result == MatchResult::Pending {
            self.result = seat.result();
            self.dirty = true;
        }
    }

    /// A single competitor with nobody to face
    pub fn is_bye(&self) -> bool {
        self.player1.is_some() && self.player2.is_none() && self.winner == self.player1
    }
}

/// Match counts per phase, derived from the initial phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BracketShape {
    initial: Phase,
    initial_matches: usize,
}

impl BracketShape {
    /// Number of matches `phase` ends up with
    fn match_count(&self, phase: Phase) -> usize {
        if phase < self.initial {
            return 0;
        }

        let mut count = self.initial_matches;
        let mut current = self.initial;
        while current < phase {
            count = count.div_ceil(2);
            match current.next() {
                Some(next) => current = next,
                None => break,
            }
        }
        count
    }
}

/// Where a recorded winner went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advancement {
    /// The final was decided
    Champion(CompetitorId),
    /// Winner seated in the next phase
    Advanced { phase: Phase, order: u32 },
}

/// Snapshot of a tournament bracket with pending changes
#[derive(Debug, Clone)]
pub struct Bracket {
    tournament_id: TournamentId,
    shape: BracketShape,
    nodes: BTreeMap<(Phase, u32), BracketNode>,
}

impl Bracket {
    /// Fresh bracket holding the initial phase built from `pairs`
    pub fn seed(tournament_id: TournamentId, phase: Phase, pairs: &[Pairing]) -> Self {
        let nodes = pairs
            .iter()
            .zip(1u32..)
            .map(|(pairing, order)| {
                let mut node = BracketNode::placeholder(phase, order);
                node.player1 = Some(pairing.player);
                node.player2 = pairing.opponent;
                ((phase, order), node)
            })
            .collect();

        Self {
            tournament_id,
            shape: BracketShape {
                initial: phase,
                initial_matches: pairs.len(),
            },
            nodes,
        }
    }

    /// Rebuild the bracket from stored matches
    pub fn from_matches(tournament_id: TournamentId, matches: &[Match]) -> BracketResult<Self> {
        let initial = matches
            .iter()
            .map(|m| m.phase)
            .min()
            .ok_or_else(|| {
                BracketError::CorruptRecord(format!("tournament {} has no matches", tournament_id))
            })?;

        let initial_matches = matches
            .iter()
            .filter(|m| m.phase == initial)
            .map(|m| m.order as usize)
            .max()
            .unwrap_or_default();

        let nodes = matches
            .iter()
            .map(|m| ((m.phase, m.order), BracketNode::from_match(m)))
            .collect();

        Ok(Self {
            tournament_id,
            shape: BracketShape {
                initial,
                initial_matches,
            },
            nodes,
        })
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    pub fn node(&self, phase: Phase, order: u32) -> Option<&BracketNode> {
        self.nodes.get(&(phase, order))
    }

    /// Look up a stored node by match id
    pub fn find(&self, match_id: MatchId) -> Option<&BracketNode> {
        self.nodes.values().find(|n| n.id == Some(match_id))
    }

    /// All nodes in phase order, then match order
    pub fn nodes(&self) -> impl Iterator<Item = &BracketNode> {
        self.nodes.values()
    }

    /// Nodes created or modified since the snapshot was taken
    pub fn changes(&self) -> impl Iterator<Item = &BracketNode> {
        self.nodes.values().filter(|n| n.dirty)
    }

    /// Decide every initial-phase bye and advance it.
    ///
    /// Returns the number of byes resolved.
    pub fn resolve_byes(&mut self) -> BracketResult<usize> {
        let initial = self.shape.initial;
        let byes: Vec<(u32, CompetitorId)> = self
            .nodes
            .values()
            .filter(|n| n.phase == initial && n.player2.is_none() && n.winner.is_none())
            .filter_map(|n| n.player1.map(|p| (n.order, p)))
            .collect();

        for &(order, player) in &byes {
            log::debug!("Bye for competitor {} in {} match #{}", player, initial, order);
            self.record_winner(initial, order, player)?;
        }

        Ok(byes.len())
    }

    /// Record `winner` for a match and move them into the next phase.
    ///
    /// Recording the same winner twice re-runs the advancement without
    /// changing anything. A match whose sibling feeder can never exist is a
    /// walkover and is decided immediately.
    pub fn record_winner(
        &mut self,
        phase: Phase,
        order: u32,
        winner: CompetitorId,
    ) -> BracketResult<Advancement> {
        let node = self
            .nodes
            .get_mut(&(phase, order))
            .ok_or(BracketError::SlotNotFound { phase, order })?;

        let seat = node
            .seat_of(winner)
            .ok_or(BracketError::InvalidWinner { phase, order, winner })?;

        if let Some(existing) = node.winner.filter(|&w| w != winner) {
            return Err(BracketError::WinnerConflict {
                phase,
                order,
                existing,
                requested: winner,
            });
        }

        if matches!(
            (node.result, seat),
            (MatchResult::Player1, Seat::Player2) | (MatchResult::Player2, Seat::Player1)
        ) {
            return Err(BracketError::ResultMismatch { phase, order });
        }

        node.decide(winner, seat);

        let Some(next) = phase.next() else {
            return Ok(Advancement::Champion(winner));
        };

        let index = order.saturating_sub(1);
        let target_order = index / 2 + 1;
        let target_seat = Seat::for_index(index);

        self.ensure_slot(next, target_order);
        let target = self
            .nodes
            .get_mut(&(next, target_order))
            .ok_or(BracketError::SlotNotFound {
                phase: next,
                order: target_order,
            })?;

        match target.occupant(target_seat) {
            Some(occupant) if occupant != winner => {
                return Err(BracketError::SeatTaken {
                    phase: next,
                    order: target_order,
                    occupant,
                });
            }
            Some(_) => {}
            None => target.seat_competitor(target_seat, winner),
        }

        let has_sibling = index % 2 == 1 || (index as usize + 1) < self.shape.match_count(phase);
        if !has_sibling {
            log::debug!(
                "Walkover for competitor {} in {} match #{}",
                winner,
                next,
                target_order
            );
            if let Advancement::Champion(champion) = self.record_winner(next, target_order, winner)? {
                return Ok(Advancement::Champion(champion));
            }
        }

        Ok(Advancement::Advanced {
            phase: next,
            order: target_order,
        })
    }

    /// Make sure `(phase, order)` exists, filling lower orders with placeholders
    fn ensure_slot(&mut self, phase: Phase, order: u32) {
        for o in 1..=order {
            self.nodes
                .entry((phase, o))
                .or_insert_with(|| BracketNode::placeholder(phase, o));
        }
    }
}
