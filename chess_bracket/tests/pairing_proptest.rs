/// Property-based tests for pairing and schedule compatibility using proptest
///
/// These tests verify the pairing guarantees and the compatibility relation
/// across randomly generated competitor pools.
use chess_bracket::availability::{Availability, DaySet, Period, Weekday, availability_key, compatible};
use chess_bracket::bracket::create_pairs;
use chess_bracket::competitor::Competitor;
use proptest::prelude::*;
use std::collections::HashSet;

// Strategy to generate a study period
fn period_strategy() -> impl Strategy<Value = Period> {
    prop_oneof![
        Just(Period::Morning),
        Just(Period::Afternoon),
        Just(Period::FullDay),
    ]
}

// Strategy to generate a non-empty weekday set
fn days_strategy() -> impl Strategy<Value = DaySet> {
    prop::sample::subsequence(Weekday::ALL.to_vec(), 1..=5).prop_map(DaySet::new)
}

fn availability_strategy() -> impl Strategy<Value = Availability> {
    (period_strategy(), days_strategy()).prop_map(|(period, days)| Availability::new(period, days))
}

// Strategy to generate a pool of 2..=16 competitors with unique IDs
fn pool_strategy() -> impl Strategy<Value = Vec<Competitor>> {
    prop::collection::vec(availability_strategy(), 2..=16).prop_map(|availabilities| {
        availabilities
            .into_iter()
            .zip(1i64..)
            .map(|(availability, id)| Competitor {
                id,
                name: format!("Competitor {}", id),
                course: "1A".to_string(),
                phone: String::new(),
                period: availability.period,
                days: availability.days,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn test_pairs_cover_every_competitor_once(pool in pool_strategy(), seed in any::<i64>()) {
        let pairs = create_pairs(&pool, Some(seed));

        prop_assert_eq!(pairs.len(), pool.len().div_ceil(2));

        let mut seen = HashSet::new();
        for pairing in &pairs {
            prop_assert!(seen.insert(pairing.player));
            if let Some(opponent) = pairing.opponent {
                prop_assert_ne!(opponent, pairing.player);
                prop_assert!(seen.insert(opponent));
            }
        }
        prop_assert_eq!(seen.len(), pool.len());
    }

    #[test]
    fn test_at_most_one_bye_only_for_odd_pools(pool in pool_strategy(), seed in any::<i64>()) {
        let pairs = create_pairs(&pool, Some(seed));
        let byes = pairs.iter().filter(|p| p.is_bye()).count();

        prop_assert_eq!(byes, pool.len() % 2);
    }

    #[test]
    fn test_seed_is_deterministic(pool in pool_strategy(), seed in any::<i64>()) {
        prop_assert_eq!(create_pairs(&pool, Some(seed)), create_pairs(&pool, Some(seed)));
    }

    #[test]
    fn test_unforced_pairs_are_compatible(pool in pool_strategy(), seed in any::<i64>()) {
        let pairs = create_pairs(&pool, Some(seed));
        let lookup = |id: i64| pool.iter().find(|c| c.id == id).map(Competitor::availability);

        for pairing in pairs.iter().filter(|p| !p.forced) {
            if let Some(opponent) = pairing.opponent {
                let a = lookup(pairing.player).unwrap();
                let b = lookup(opponent).unwrap();
                prop_assert!(compatible(&a, &b));
            }
        }
    }

    #[test]
    fn test_compatible_is_symmetric(a in availability_strategy(), b in availability_strategy()) {
        prop_assert_eq!(compatible(&a, &b), compatible(&b, &a));
    }

    #[test]
    fn test_compatible_needs_days_and_periods(a in availability_strategy(), b in availability_strategy()) {
        let shares_day = a.days.intersects(&b.days);
        let shares_part = a.period == b.period
            || a.period == Period::FullDay
            || b.period == Period::FullDay;

        prop_assert_eq!(compatible(&a, &b), shares_day && shares_part);
    }

    #[test]
    fn test_equal_keys_are_compatible(a in availability_strategy(), b in availability_strategy()) {
        if availability_key(&a) == availability_key(&b) {
            prop_assert!(compatible(&a, &b));
        }
    }
}
