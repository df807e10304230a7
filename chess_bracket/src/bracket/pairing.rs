//! Initial pairing of a competitor pool under schedule constraints.
//!
//! Competitors are grouped by availability key and paired inside each group
//! first. An odd member left over in a group looks for the first compatible
//! competitor in a globally shuffled order; failing that it gets a bye. When
//! more than one competitor is left without an opponent, the extras are paired
//! among themselves and flagged as forced.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::availability::{Availability, availability_key, compatible};
use crate::competitor::{Competitor, CompetitorId};

/// One initial pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pairing {
    pub player: CompetitorId,
    /// `None` means a bye
    pub opponent: Option<CompetitorId>,
    /// Set when the two schedules never overlap
    pub forced: bool,
}

impl Pairing {
    fn pair(player: CompetitorId, opponent: CompetitorId) -> Self {
        Self {
            player,
            opponent: Some(opponent),
            forced: false,
        }
    }

    fn bye(player: CompetitorId) -> Self {
        Self {
            player,
            opponent: None,
            forced: false,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.opponent.is_none()
    }
}

/// Pair a competitor pool.
///
/// The same seed and the same input ordering always yield the same pairs;
/// without a seed the generator draws from OS entropy.
pub fn create_pairs(competitors: &[Competitor], seed: Option<i64>) -> Vec<Pairing> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed as u64),
        None => StdRng::from_os_rng(),
    };
    pair_with_rng(competitors, &mut rng)
}

/// Pair a competitor pool with a caller-supplied generator
pub fn pair_with_rng<R: Rng + ?Sized>(competitors: &[Competitor], rng: &mut R) -> Vec<Pairing> {
    let availabilities: Vec<Availability> =
        competitors.iter().map(Competitor::availability).collect();

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, availability) in availabilities.iter().enumerate() {
        groups
            .entry(availability_key(availability))
            .or_default()
            .push(idx);
    }

    let mut global: Vec<usize> = (0..competitors.len()).collect();
    global.shuffle(rng);

    let mut processed = vec![false; competitors.len()];
    let mut pairs = Vec::with_capacity(competitors.len().div_ceil(2));

    for members in groups.into_values() {
        let mut members: Vec<usize> = members.into_iter().filter(|&i| !processed[i]).collect();
        members.shuffle(rng);

        for chunk in members.chunks(2) {
            match *chunk {
                [a, b] => {
                    processed[a] = true;
                    processed[b] = true;
                    pairs.push(Pairing::pair(competitors[a].id, competitors[b].id));
                }
                [leftover] => {
                    processed[leftover] = true;
                    let partner = global.iter().copied().find(|&j| {
                        j != leftover
                            && !processed[j]
                            && compatible(&availabilities[leftover], &availabilities[j])
                    });

                    match partner {
                        Some(j) => {
                            processed[j] = true;
                            pairs.push(Pairing::pair(competitors[leftover].id, competitors[j].id));
                        }
                        None => pairs.push(Pairing::bye(competitors[leftover].id)),
                    }
                }
                _ => {}
            }
        }
    }

    consolidate_byes(pairs, competitors, &availabilities)
}

/// Merge surplus byes pairwise so at most one remains
fn consolidate_byes(
    pairs: Vec<Pairing>,
    competitors: &[Competitor],
    availabilities: &[Availability],
) -> Vec<Pairing> {
    let position = |id: CompetitorId| competitors.iter().position(|c| c.id == id);

    let mut merged: Vec<Pairing> = Vec::with_capacity(pairs.len());
    let mut open_bye: Option<usize> = None;

    for pairing in pairs {
        if !pairing.is_bye() {
            merged.push(pairing);
            continue;
        }

        match open_bye.take() {
            Some(idx) => {
                let first = merged[idx].player;
                let forced = match (position(first), position(pairing.player)) {
                    (Some(a), Some(b)) => !compatible(&availabilities[a], &availabilities[b]),
                    _ => true,
                };
                if forced {
                    log::warn!(
                        "Competitors {} and {} share no schedule, pairing them anyway",
                        first,
                        pairing.player
                    );
                }
                merged[idx].opponent = Some(pairing.player);
                merged[idx].forced = forced;
            }
            None => {
                merged.push(pairing);
                open_bye = Some(merged.len() - 1);
            }
        }
    }

    merged
}
