//! Generational replacement strategies.

use serde::{Deserialize, Serialize};

use crate::evaluation::FitnessMap;
use crate::models::Route;

fn default_elite() -> usize {
    5
}

/// How the next population is assembled from the old one and the children.
///
/// The result always has the old population's size. Sorting is stable, so
/// equal fitness keeps first-occurrence order.
///
/// # Examples
///
/// ```
/// use evrp_ga::evaluation::FitnessMap;
/// use evrp_ga::ga::Replacement;
/// use evrp_ga::models::Route;
///
/// let old = vec![Route::new(vec![1, 2, 3, 1]), Route::new(vec![1, 3, 2, 1])];
/// let children = vec![Route::new(vec![1, 2, 1, 3, 1])];
/// let mut fitness = FitnessMap::new();
/// fitness.insert(old[0].clone(), 2.0);
/// fitness.insert(old[1].clone(), 1.0);
/// fitness.insert(children[0].clone(), 0.5);
///
/// let next = Replacement::Elitism { n_elite: 1 }.replace(&old, &children, &fitness, &fitness);
/// assert_eq!(next, vec![old[0].clone(), children[0].clone()]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Replacement {
    /// Children replace the population. Short broods are topped up with
    /// the best old individuals.
    Full,
    /// Keep the best `n_elite` old individuals, fill with the best children.
    Elitism {
        #[serde(default = "default_elite")]
        n_elite: usize,
    },
    /// Replace the worst old individuals with as many of the best children
    /// as are available, up to the population size.
    SteadyState,
}

impl Default for Replacement {
    fn default() -> Self {
        Self::Elitism {
            n_elite: default_elite(),
        }
    }
}

impl Replacement {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Elitism { .. } => "elitism",
            Self::SteadyState => "steady_state",
        }
    }

    /// Builds the next population.
    pub fn replace(
        &self,
        old: &[Route],
        children: &[Route],
        old_fitness: &FitnessMap,
        child_fitness: &FitnessMap,
    ) -> Vec<Route> {
        let size = old.len();
        let old_ranked = ranked(old, old_fitness);

        let (kept_old, best_children) = match *self {
            Self::Full => {
                let taken: Vec<&Route> = children.iter().take(size).collect();
                (size - taken.len(), taken)
            }
            Self::Elitism { n_elite } => {
                let elite = n_elite.min(size);
                let taken: Vec<&Route> = ranked(children, child_fitness)
                    .into_iter()
                    .take(size - elite)
                    .collect();
                (size - taken.len(), taken)
            }
            Self::SteadyState => {
                let n_replace = children.len().min(size);
                let taken: Vec<&Route> = ranked(children, child_fitness)
                    .into_iter()
                    .take(n_replace)
                    .collect();
                (size - n_replace, taken)
            }
        };

        let mut next: Vec<Route> = Vec::with_capacity(size);
        next.extend(old_ranked.into_iter().take(kept_old).cloned());
        next.extend(best_children.into_iter().cloned());
        next
    }
}

/// Routes by descending fitness; stable.
fn ranked<'a>(routes: &'a [Route], fitness: &FitnessMap) -> Vec<&'a Route> {
    let mut out: Vec<&Route> = routes.iter().collect();
    out.sort_by(|a, b| fitness.fitness_of(b).total_cmp(&fitness.fitness_of(a)));
    out
}
