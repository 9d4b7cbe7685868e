//! Parent selection strategies.

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::evaluation::FitnessMap;
use crate::models::Route;

fn default_tournament_size() -> usize {
    2
}

/// How parents are drawn from the population. Sampling is with replacement.
///
/// # Examples
///
/// ```
/// use evrp_ga::ga::Selection;
///
/// let s: Selection = serde_json::from_str(r#"{"method":"tournament"}"#).unwrap();
/// assert_eq!(s, Selection::Tournament { size: 2 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Selection {
    /// Probability proportional to fitness.
    Roulette,
    /// Best of `size` individuals drawn uniformly without replacement.
    Tournament {
        #[serde(default = "default_tournament_size")]
        size: usize,
    },
    /// Linear weights `N, N−1, …, 1` by descending fitness.
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Self::Tournament {
            size: default_tournament_size(),
        }
    }
}

impl Selection {
    /// Short name for logs and event records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Roulette => "roulette",
            Self::Tournament { .. } => "tournament",
            Self::Rank => "rank",
        }
    }

    /// Draws `n` parents. Returns an empty vector for an empty population.
    ///
    /// Routes missing from `fitness` count as fitness 0.
    pub fn select<R: Rng>(
        &self,
        population: &[Route],
        fitness: &FitnessMap,
        n: usize,
        rng: &mut R,
    ) -> Vec<Route> {
        if population.is_empty() {
            return Vec::new();
        }
        let scores: Vec<f64> = population.iter().map(|r| fitness.fitness_of(r)).collect();

        match *self {
            Self::Roulette => sample_weighted(population, &scores, n, rng),
            Self::Tournament { size } => {
                let k = size.clamp(1, population.len());
                (0..n)
                    .map(|_| {
                        let mut drawn = index::sample(rng, population.len(), k).into_iter();
                        let first = drawn.next().unwrap_or(0);
                        let best = drawn.fold(first, |b, i| if scores[i] > scores[b] { i } else { b });
                        population[best].clone()
                    })
                    .collect()
            }
            Self::Rank => {
                let mut order: Vec<usize> = (0..population.len()).collect();
                order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
                let ranked: Vec<Route> = order.iter().map(|&i| population[i].clone()).collect();
                let n_pop = ranked.len();
                let weights: Vec<f64> = (0..n_pop).map(|r| (n_pop - r) as f64).collect();
                sample_weighted(&ranked, &weights, n, rng)
            }
        }
    }
}

/// Samples `n` routes proportionally to `weights`; uniform when the weights
/// are unusable (all zero, negative, or non-finite).
fn sample_weighted<R: Rng>(routes: &[Route], weights: &[f64], n: usize, rng: &mut R) -> Vec<Route> {
    match WeightedIndex::new(weights) {
        Ok(dist) => (0..n).map(|_| routes[dist.sample(rng)].clone()).collect(),
        Err(_) => {
            log::debug!("selection weights unusable, sampling uniformly");
            (0..n)
                .map(|_| routes[rng.random_range(0..routes.len())].clone())
                .collect()
        }
    }
}
