use rand::seq::SliceRandom;
use rand::Rng;

use super::split::{all_assignments, best_assignment, bitmask_combinations, Assignment};
use super::{
    require_at_least, Balancer, BalancerError, BalancerSettings, SelectionResult, SplitQuality,
    SQUAD_SIZE,
};

impl Balancer {
    /// Picks the ten confirmed players that allow the fairest split.
    ///
    /// Up to `exhaustive_limit` players every ten-player subset is tried and the
    /// result is exact. Above it a bounded random search is used and the result
    /// is flagged [`SplitQuality::Approximate`].
    pub fn select_and_split_optimal<S: AsRef<str>>(
        &self,
        confirmed: &[S],
    ) -> Result<SelectionResult, BalancerError> {
        self.select_and_split_optimal_with_rng(confirmed, &mut rand::thread_rng())
    }

    pub fn select_and_split_optimal_with_rng<S, R>(
        &self,
        confirmed: &[S],
        rng: &mut R,
    ) -> Result<SelectionResult, BalancerError>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        require_at_least(confirmed.len(), SQUAD_SIZE)?;
        let ratings = self.ratings_for(confirmed);
        let assignments = all_assignments();

        let (chosen, quality): (Vec<usize>, SplitQuality) = if confirmed.len() == SQUAD_SIZE {
            ((0..SQUAD_SIZE).collect(), SplitQuality::Exact)
        } else if confirmed.len() <= self.settings.exhaustive_limit {
            (exhaustive_best_ten(&ratings, &assignments), SplitQuality::Exact)
        } else {
            (
                sampled_best_ten(&ratings, &assignments, &self.settings, rng),
                SplitQuality::Approximate,
            )
        };

        let ten: Vec<&str> = chosen.iter().map(|&index| confirmed[index].as_ref()).collect();
        let ten_ratings: Vec<f64> = chosen.iter().map(|&index| ratings[index]).collect();
        let (assignment, score) = best_assignment(&assignments, &ten_ratings)
            .ok_or(BalancerError::InvalidCount { expected: SQUAD_SIZE, actual: ten.len() })?;

        Ok(SelectionResult {
            split: assignment.to_split(&ten, &ten_ratings),
            substitutes: substitutes(confirmed, &chosen),
            score,
            quality,
            rank: None,
        })
    }

    /// Random ten, random split. Every call is independent.
    pub fn select_random<S: AsRef<str>>(
        &self,
        confirmed: &[S],
    ) -> Result<SelectionResult, BalancerError> {
        self.select_random_with_rng(confirmed, &mut rand::thread_rng())
    }

    pub fn select_random_with_rng<S, R>(
        &self,
        confirmed: &[S],
        rng: &mut R,
    ) -> Result<SelectionResult, BalancerError>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        require_at_least(confirmed.len(), SQUAD_SIZE)?;
        let mut pool: Vec<usize> = (0..confirmed.len()).collect();
        pool.shuffle(rng);
        let chosen = &pool[..SQUAD_SIZE];

        let ten: Vec<&str> = chosen.iter().map(|&index| confirmed[index].as_ref()).collect();
        let split = self.split_random_with_rng(&ten, rng)?;
        let score = split.difference();

        Ok(SelectionResult {
            split,
            substitutes: substitutes(confirmed, chosen),
            score,
            quality: SplitQuality::Random,
            rank: None,
        })
    }
}

fn exhaustive_best_ten(ratings: &[f64], assignments: &[Assignment]) -> Vec<usize> {
    let mut best: Option<(Vec<usize>, f64)> = None;
    let mut subset_ratings = Vec::with_capacity(SQUAD_SIZE);

    for subset in bitmask_combinations(ratings.len(), SQUAD_SIZE) {
        subset_ratings.clear();
        subset_ratings.extend(subset.iter().map(|&index| ratings[index]));
        let Some((_, score)) = best_assignment(assignments, &subset_ratings) else {
            continue;
        };

        if best.as_ref().map_or(true, |(_, best_score)| score < *best_score) {
            best = Some((subset, score));
            if score == 0.0 {
                break;
            }
        }
    }

    best.map(|(subset, _)| subset).unwrap_or_else(|| (0..SQUAD_SIZE).collect())
}

fn sampled_best_ten<R: Rng + ?Sized>(
    ratings: &[f64],
    assignments: &[Assignment],
    settings: &BalancerSettings,
    rng: &mut R,
) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..ratings.len()).collect();
    let mut best: Option<(Vec<usize>, f64)> = None;
    let mut subset_ratings = Vec::with_capacity(SQUAD_SIZE);

    for _ in 0..settings.random_samples {
        pool.shuffle(rng);
        let candidate = &pool[..SQUAD_SIZE];
        subset_ratings.clear();
        subset_ratings.extend(candidate.iter().map(|&index| ratings[index]));
        let Some((_, score)) = best_assignment(assignments, &subset_ratings) else {
            continue;
        };

        if best.as_ref().map_or(true, |(_, best_score)| score < *best_score) {
            best = Some((candidate.to_vec(), score));
            if score < settings.early_exit_threshold {
                break;
            }
        }
    }

    best.map(|(subset, _)| subset).unwrap_or_else(|| (0..SQUAD_SIZE).collect())
}

fn substitutes<S: AsRef<str>>(confirmed: &[S], chosen: &[usize]) -> Vec<String> {
    confirmed
        .iter()
        .enumerate()
        .filter(|(index, _)| !chosen.contains(index))
        .map(|(_, name)| name.as_ref().to_owned())
        .collect()
}
