use rand::seq::SliceRandom;
use rand::Rng;

use super::{require_exactly, Balancer, BalancerError, TeamSplit, SQUAD_SIZE, TEAM_SIZE};

/// Index assignment of ten players into two teams of five.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Assignment {
    pub team_a: Vec<usize>,
    pub team_b: Vec<usize>,
}

impl Assignment {
    fn from_team_a(team_a: Vec<usize>) -> Self {
        let team_b = (0..SQUAD_SIZE).filter(|index| !team_a.contains(index)).collect();
        Self { team_a, team_b }
    }

    /// Both sums are accumulated independently so mirrored assignments score identically.
    pub fn sums(&self, ratings: &[f64]) -> (f64, f64) {
        let sum = |indices: &[usize]| indices.iter().map(|&index| ratings[index]).sum::<f64>();
        (sum(&self.team_a), sum(&self.team_b))
    }

    pub fn score(&self, ratings: &[f64]) -> f64 {
        let (sum_a, sum_b) = self.sums(ratings);
        (sum_a - sum_b).abs()
    }

    pub fn to_split<S: AsRef<str>>(&self, players: &[S], ratings: &[f64]) -> TeamSplit {
        let names = |indices: &[usize]| {
            indices.iter().map(|&index| players[index].as_ref().to_owned()).collect::<Vec<_>>()
        };
        let (sum_a, sum_b) = self.sums(ratings);
        TeamSplit { team_a: names(&self.team_a), team_b: names(&self.team_b), sum_a, sum_b }
    }
}

/// `k`-subsets of `0..n` as ascending index lists, ordered by their bitmask value.
///
/// Index `i` maps to bit `i`, so a subset reaching later players always comes
/// after every subset confined to earlier ones.
pub(super) struct BitmaskCombinations {
    next: Option<u64>,
    limit: u64,
}

pub(super) fn bitmask_combinations(n: usize, k: usize) -> BitmaskCombinations {
    let first = (k > 0 && k <= n && n < 64).then(|| (1u64 << k) - 1);
    BitmaskCombinations { next: first, limit: 1u64 << n.min(63) }
}

impl Iterator for BitmaskCombinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let mask = self.next?;
        // Next larger integer with the same number of set bits.
        let lowest = mask & mask.wrapping_neg();
        let ripple = mask + lowest;
        let following = (((ripple ^ mask) >> 2) / lowest) | ripple;
        self.next = (following < self.limit).then_some(following);
        Some((0..64).filter(|&bit| mask & (1u64 << bit) != 0).collect())
    }
}

/// All C(10,5) = 252 assignments in ascending bitmask order of Team A.
pub(super) fn all_assignments() -> Vec<Assignment> {
    bitmask_combinations(SQUAD_SIZE, TEAM_SIZE).map(Assignment::from_team_a).collect()
}

/// The 126 distinct partitions, one per mirror pair.
///
/// Of two mirrored masks the smaller never holds the last player in Team A, so
/// these are the 5-subsets of the first nine players in the same order.
pub(super) fn canonical_assignments() -> Vec<Assignment> {
    bitmask_combinations(SQUAD_SIZE - 1, TEAM_SIZE).map(Assignment::from_team_a).collect()
}

/// First assignment with the lowest score, with its score.
pub(super) fn best_assignment<'a>(
    assignments: &'a [Assignment],
    ratings: &[f64],
) -> Option<(&'a Assignment, f64)> {
    let mut best: Option<(&Assignment, f64)> = None;
    for assignment in assignments {
        let score = assignment.score(ratings);
        if best.map_or(true, |(_, best_score)| score < best_score) {
            best = Some((assignment, score));
            if score == 0.0 {
                break;
            }
        }
    }
    best
}

impl Balancer {
    /// Best 5v5 split of exactly ten players.
    pub fn split_optimal<S: AsRef<str>>(&self, ten: &[S]) -> Result<TeamSplit, BalancerError> {
        require_exactly(ten.len(), SQUAD_SIZE)?;
        let ratings = self.ratings_for(ten);
        let assignments = all_assignments();
        let (assignment, _) = best_assignment(&assignments, &ratings)
            .ok_or(BalancerError::InvalidCount { expected: SQUAD_SIZE, actual: ten.len() })?;
        Ok(assignment.to_split(ten, &ratings))
    }

    /// Every distinct partition of ten players, fairest first.
    ///
    /// Ties keep enumeration order, so entry 0 is the split returned by
    /// [`Balancer::split_optimal`].
    pub fn ranked_splits<S: AsRef<str>>(&self, ten: &[S]) -> Result<Vec<TeamSplit>, BalancerError> {
        require_exactly(ten.len(), SQUAD_SIZE)?;
        let ratings = self.ratings_for(ten);
        let mut splits: Vec<TeamSplit> = canonical_assignments()
            .iter()
            .map(|assignment| assignment.to_split(ten, &ratings))
            .collect();
        splits.sort_by(|left, right| left.difference().total_cmp(&right.difference()));
        Ok(splits)
    }

    /// The `rank`-th fairest distinct partition (0 = best).
    pub fn ranked_split<S: AsRef<str>>(
        &self,
        ten: &[S],
        rank: usize,
    ) -> Result<TeamSplit, BalancerError> {
        let mut splits = self.ranked_splits(ten)?;
        let available = splits.len();
        if rank >= available {
            return Err(BalancerError::RankOutOfRange { rank, available });
        }
        Ok(splits.swap_remove(rank))
    }

    /// Shuffled 5v5 split with no fairness optimisation.
    pub fn split_random_with_rng<S, R>(&self, ten: &[S], rng: &mut R) -> Result<TeamSplit, BalancerError>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        require_exactly(ten.len(), SQUAD_SIZE)?;
        let mut order: Vec<usize> = (0..SQUAD_SIZE).collect();
        order.shuffle(rng);
        let shuffled: Vec<&str> = order.iter().map(|&index| ten[index].as_ref()).collect();
        let ratings = self.ratings_for(&shuffled);
        let assignment = Assignment::from_team_a((0..TEAM_SIZE).collect());
        Ok(assignment.to_split(&shuffled, &ratings))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{all_assignments, bitmask_combinations, canonical_assignments};
    use crate::balancer::{Balancer, BalancerError, BalancerSettings, TeamSplit};
    use crate::roster::RatingTable;

    fn balancer(ratings: &[(&str, f64)]) -> Balancer {
        let table: BTreeMap<String, f64> =
            ratings.iter().map(|(name, rating)| ((*name).to_owned(), *rating)).collect();
        Balancer::new(Arc::new(RatingTable::new(table, 5.0)), BalancerSettings::default())
    }

    fn names(ratings: &[(&str, f64)]) -> Vec<String> {
        ratings.iter().map(|(name, _)| (*name).to_owned()).collect()
    }

    fn partition(split: &TeamSplit) -> BTreeSet<BTreeSet<String>> {
        [split.team_a.iter().cloned().collect(), split.team_b.iter().cloned().collect()]
            .into_iter()
            .collect()
    }

    const MIXED: [(&str, f64); 10] = [
        ("Caria", 71.9),
        ("Tiago", 51.9),
        ("Filipe", 58.1),
        ("Francisco", 73.8),
        ("Gui", 66.9),
        ("João", 50.1),
        ("Miguel", 67.3),
        ("Pedro", 69.3),
        ("Rodrigo", 56.4),
        ("Salvador", 80.0),
    ];

    #[test]
    fn enumerations_have_expected_sizes() {
        assert_eq!(all_assignments().len(), 252);
        let canonical = canonical_assignments();
        assert_eq!(canonical.len(), 126);
        assert!(canonical.iter().all(|assignment| !assignment.team_a.contains(&9)));
        assert!(canonical.iter().all(|assignment| assignment.team_b.len() == 5));
    }

    #[test]
    fn combinations_follow_ascending_bitmasks() {
        let subsets: Vec<Vec<usize>> = bitmask_combinations(4, 2).collect();
        assert_eq!(
            subsets,
            vec![vec![0, 1], vec![0, 2], vec![1, 2], vec![0, 3], vec![1, 3], vec![2, 3]]
        );
        assert_eq!(bitmask_combinations(12, 10).count(), 66);
        assert_eq!(bitmask_combinations(3, 4).count(), 0);
    }

    #[test]
    fn ties_go_to_the_smallest_team_a_bitmask() {
        let ratings = [
            ("P0", 0.0),
            ("P1", 0.0),
            ("P2", 0.0),
            ("P3", 1.0),
            ("P4", 2.0),
            ("P5", 3.0),
            ("P6", 4.0),
            ("P7", 0.0),
            ("P8", 0.0),
            ("P9", 0.0),
        ];
        let balancer = balancer(&ratings);
        let players = names(&ratings);

        // {P0,P1,P2,P3,P6} also scores zero but its mask is larger.
        let split = balancer.split_optimal(&players).expect("ten players");
        assert_eq!(split.team_a, vec!["P0", "P1", "P2", "P4", "P5"]);
        assert_eq!(split.difference(), 0.0);

        let ranked = balancer.ranked_split(&players, 0).expect("rank zero");
        assert_eq!(ranked, split);
    }

    #[test]
    fn two_tier_ratings_cannot_balance_below_one_tier_step() {
        let ratings = [
            ("A", 10.0),
            ("B", 10.0),
            ("C", 10.0),
            ("D", 10.0),
            ("E", 10.0),
            ("F", 0.0),
            ("G", 0.0),
            ("H", 0.0),
            ("I", 0.0),
            ("J", 0.0),
        ];
        let split = balancer(&ratings).split_optimal(&names(&ratings)).expect("ten players");

        // Five tens over two teams of five always leave one team a ten ahead.
        assert_eq!(split.difference(), 10.0);
        assert_eq!(split.team_a.len(), 5);
        assert_eq!(split.team_b.len(), 5);
    }

    #[test]
    fn split_optimal_reaches_zero_when_a_perfect_split_exists() {
        let ratings = [
            ("A", 10.0),
            ("B", 10.0),
            ("C", 10.0),
            ("D", 10.0),
            ("E", 0.0),
            ("F", 0.0),
            ("G", 0.0),
            ("H", 0.0),
            ("I", 20.0),
            ("J", 20.0),
        ];
        let split = balancer(&ratings).split_optimal(&names(&ratings)).expect("ten players");

        assert_eq!(split.difference(), 0.0);
        assert_eq!(split.sum_a, 40.0);
        assert_eq!(split.sum_b, 40.0);
    }

    #[test]
    fn split_optimal_beats_or_ties_every_assignment() {
        let balancer = balancer(&MIXED);
        let players = names(&MIXED);
        let best = balancer.split_optimal(&players).expect("ten players").difference();

        let ratings: Vec<f64> = MIXED.iter().map(|(_, rating)| *rating).collect();
        for assignment in all_assignments() {
            assert!(best <= assignment.score(&ratings), "found a fairer assignment");
        }
    }

    #[test]
    fn split_optimal_is_deterministic_and_disjoint() {
        let balancer = balancer(&MIXED);
        let players = names(&MIXED);
        let first = balancer.split_optimal(&players).expect("ten players");
        let second = balancer.split_optimal(&players).expect("ten players");

        assert_eq!(first, second);
        let everyone: BTreeSet<&str> = first.players().collect();
        assert_eq!(everyone.len(), 10);
    }

    #[test]
    fn split_optimal_requires_exactly_ten() {
        let balancer = Balancer::default();
        let nine: Vec<String> = (0..9).map(|index| format!("P{index}")).collect();
        assert_eq!(
            balancer.split_optimal(&nine),
            Err(BalancerError::InvalidCount { expected: 10, actual: 9 })
        );
    }

    #[test]
    fn ranked_splits_are_distinct_and_sorted() {
        let balancer = balancer(&MIXED);
        let splits = balancer.ranked_splits(&names(&MIXED)).expect("ten players");

        assert_eq!(splits.len(), 126);
        let distinct: BTreeSet<_> = splits.iter().map(partition).collect();
        assert_eq!(distinct.len(), 126);
        assert!(splits.windows(2).all(|pair| pair[0].difference() <= pair[1].difference()));
    }

    #[test]
    fn rank_zero_matches_optimal_split() {
        let balancer = balancer(&MIXED);
        let players = names(&MIXED);

        let optimal = balancer.split_optimal(&players).expect("ten players");
        let ranked = balancer.ranked_split(&players, 0).expect("rank zero");
        assert_eq!(ranked.difference(), optimal.difference());
        assert_eq!(ranked, optimal);

        let second = balancer.ranked_split(&players, 1).expect("rank one");
        assert!(second.difference() >= optimal.difference());
    }

    #[test]
    fn rank_past_last_partition_is_rejected() {
        let balancer = balancer(&MIXED);
        assert_eq!(
            balancer.ranked_split(&names(&MIXED), 126),
            Err(BalancerError::RankOutOfRange { rank: 126, available: 126 })
        );
    }

    #[test]
    fn unknown_names_score_default_rating() {
        let balancer = Balancer::default();
        let guests: Vec<String> = (0..10).map(|index| format!("Guest {index}")).collect();
        let split = balancer.split_optimal(&guests).expect("ten players");

        assert_eq!(split.sum_a, 25.0);
        assert_eq!(split.sum_b, 25.0);
    }

    #[test]
    fn random_split_keeps_all_ten_players() {
        let balancer = balancer(&MIXED);
        let players = names(&MIXED);
        let mut rng = StdRng::seed_from_u64(7);
        let split = balancer.split_random_with_rng(&players, &mut rng).expect("ten players");

        let everyone: BTreeSet<&str> = split.players().collect();
        assert_eq!(everyone, players.iter().map(String::as_str).collect::<BTreeSet<_>>());
        assert_eq!(split.team_a.len(), 5);
        let expected_sum: f64 = split.team_a.iter().map(|name| balancer.rating_of(name)).sum();
        assert_eq!(split.sum_a, expected_sum);
    }
}
