//! Evolver configuration.

use serde::{Deserialize, Serialize};

use crate::evaluation::Evaluation;
use crate::models::ProblemInstance;
use crate::repair::RepairOptions;

use super::{Crossover, Mutation, Replacement, Selection};

/// Evaluations per stagnation generation in the default stopping rule.
const STAGNATION_DIVISOR: usize = 250;

/// Configuration errors. These abort a run before it starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be at least 2, got {0}")]
    PopulationTooSmall(usize),
    #[error("Crossover needs at least 2 parents, got {0}")]
    InsufficientParents(usize),
    #[error("Number of children must be positive")]
    ZeroChildren,
    #[error("Evaluation budget must be positive")]
    ZeroBudget,
    #[error("Stagnation limit must be positive")]
    ZeroStagnation,
    #[error("{name} rate must lie in [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("Tournament size must be positive")]
    TournamentSize,
    #[error("Elite count {n_elite} exceeds population size {population}")]
    ElitismExceedsPopulation { n_elite: usize, population: usize },
    #[error("Minimum trip count {min_trips} must lie in 1..={customers}")]
    InvalidMinTrips { min_trips: usize, customers: usize },
}

/// Parameters of an evolutionary run.
///
/// Every field has a default, so partial JSON configurations work.
///
/// # Examples
///
/// ```
/// use evrp_ga::ga::{EvolverConfig, Selection};
///
/// let config: EvolverConfig = serde_json::from_str(
///     r#"{ "population_size": 30, "selection": { "method": "roulette" }, "seed": 7 }"#,
/// )
/// .unwrap();
/// assert_eq!(config.population_size, 30);
/// assert_eq!(config.selection, Selection::Roulette);
/// assert_eq!(config.n_parents, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolverConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Parents drawn per generation.
    pub n_parents: usize,
    /// Children produced per generation.
    pub n_children: usize,
    /// Stop once this many individual evaluations were spent.
    pub max_evaluations: usize,
    /// Stop after this many generations without improvement.
    /// `None` means `max_evaluations / 250`, at least 1.
    pub max_stagnation: Option<usize>,
    pub evaluation: Evaluation,
    pub selection: Selection,
    pub crossover: Crossover,
    /// Probability that a parent pair is recombined instead of copied.
    pub crossover_rate: f64,
    pub mutation: Mutation,
    /// Probability that a child is mutated.
    pub mutation_rate: f64,
    pub replacement: Replacement,
    /// Minimum trips per route. `None` uses the instance's vehicle count.
    pub min_trips: Option<usize>,
    /// Whether station genes survive repair and appear in random routes.
    pub stations_allowed: bool,
    /// RNG seed. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            n_parents: 20,
            n_children: 80,
            max_evaluations: 125_000,
            max_stagnation: None,
            evaluation: Evaluation::penalized(),
            selection: Selection::Tournament { size: 5 },
            crossover: Crossover::TwoPoint,
            crossover_rate: 1.0,
            mutation: Mutation::Swap,
            mutation_rate: 0.9,
            replacement: Replacement::default(),
            min_trips: None,
            stations_allowed: false,
            seed: None,
        }
    }
}

impl EvolverConfig {
    /// Generations without improvement before the run stops.
    pub fn stagnation_limit(&self) -> usize {
        self.max_stagnation
            .unwrap_or((self.max_evaluations / STAGNATION_DIVISOR).max(1))
    }

    /// Minimum trip count for the given instance.
    pub fn min_trips_for(&self, instance: &ProblemInstance) -> usize {
        self.min_trips.unwrap_or(instance.vehicles())
    }

    /// Repair options for the given instance.
    pub fn repair_options(&self, instance: &ProblemInstance) -> RepairOptions {
        RepairOptions::new(self.min_trips_for(instance), self.stations_allowed)
    }

    /// Checks the configuration against an instance.
    pub fn validate(&self, instance: &ProblemInstance) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall(self.population_size));
        }
        if self.n_parents < 2 {
            return Err(ConfigError::InsufficientParents(self.n_parents));
        }
        if self.n_children == 0 {
            return Err(ConfigError::ZeroChildren);
        }
        if self.max_evaluations == 0 {
            return Err(ConfigError::ZeroBudget);
        }
        if self.max_stagnation == Some(0) {
            return Err(ConfigError::ZeroStagnation);
        }

        for (name, value) in [
            ("Crossover", self.crossover_rate),
            ("Mutation", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }

        if let Selection::Tournament { size: 0 } = self.selection {
            return Err(ConfigError::TournamentSize);
        }
        if let Replacement::Elitism { n_elite } = self.replacement {
            if n_elite > self.population_size {
                return Err(ConfigError::ElitismExceedsPopulation {
                    n_elite,
                    population: self.population_size,
                });
            }
        }

        let min_trips = self.min_trips_for(instance);
        let customers = instance.num_customers();
        if min_trips == 0 || min_trips > customers {
            return Err(ConfigError::InvalidMinTrips {
                min_trips,
                customers,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ProblemInstance {
        ProblemInstance::builder(4)
            .vehicles(2)
            .capacity(10)
            .energy(100.0, 1.0)
            .depot(0.0, 0.0)
            .customer(2, 1.0, 0.0, 1)
            .customer(3, 2.0, 0.0, 1)
            .customer(4, 3.0, 0.0, 1)
            .build()
            .expect("valid")
    }

    #[test]
    fn test_default_is_valid() {
        let inst = setup();
        assert!(EvolverConfig::default().validate(&inst).is_ok());
    }

    #[test]
    fn test_default_replacement_matches_operator_default() {
        assert_eq!(EvolverConfig::default().replacement, Replacement::default());
        let parsed: EvolverConfig =
            serde_json::from_str(r#"{ "replacement": { "method": "elitism" } }"#).expect("deserialize");
        assert_eq!(parsed.replacement, Replacement::Elitism { n_elite: 5 });
    }

    #[test]
    fn test_default_stagnation_limit() {
        let config = EvolverConfig {
            max_evaluations: 1000,
            ..Default::default()
        };
        assert_eq!(config.stagnation_limit(), 4);
        let tiny = EvolverConfig {
            max_evaluations: 10,
            ..Default::default()
        };
        assert_eq!(tiny.stagnation_limit(), 1);
    }

    #[test]
    fn test_min_trips_defaults_to_vehicles() {
        let inst = setup();
        assert_eq!(EvolverConfig::default().min_trips_for(&inst), 2);
        let config = EvolverConfig {
            min_trips: Some(3),
            ..Default::default()
        };
        assert_eq!(config.repair_options(&inst), RepairOptions::new(3, false));
    }

    #[test]
    fn test_rejects_bad_values() {
        let inst = setup();
        let cases = [
            (
                EvolverConfig {
                    population_size: 1,
                    ..Default::default()
                },
                ConfigError::PopulationTooSmall(1),
            ),
            (
                EvolverConfig {
                    n_parents: 1,
                    ..Default::default()
                },
                ConfigError::InsufficientParents(1),
            ),
            (
                EvolverConfig {
                    n_children: 0,
                    ..Default::default()
                },
                ConfigError::ZeroChildren,
            ),
            (
                EvolverConfig {
                    max_evaluations: 0,
                    ..Default::default()
                },
                ConfigError::ZeroBudget,
            ),
            (
                EvolverConfig {
                    mutation_rate: 1.5,
                    ..Default::default()
                },
                ConfigError::InvalidRate {
                    name: "Mutation",
                    value: 1.5,
                },
            ),
            (
                EvolverConfig {
                    selection: Selection::Tournament { size: 0 },
                    ..Default::default()
                },
                ConfigError::TournamentSize,
            ),
            (
                EvolverConfig {
                    replacement: Replacement::Elitism { n_elite: 101 },
                    ..Default::default()
                },
                ConfigError::ElitismExceedsPopulation {
                    n_elite: 101,
                    population: 100,
                },
            ),
            (
                EvolverConfig {
                    min_trips: Some(4),
                    ..Default::default()
                },
                ConfigError::InvalidMinTrips {
                    min_trips: 4,
                    customers: 3,
                },
            ),
        ];
        for (config, expected) in cases {
            assert_eq!(config.validate(&inst), Err(expected));
        }
    }

    #[test]
    fn test_nan_rate_rejected() {
        let inst = setup();
        let config = EvolverConfig {
            crossover_rate: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(&inst),
            Err(ConfigError::InvalidRate {
                name: "Crossover",
                ..
            })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = EvolverConfig {
            replacement: Replacement::SteadyState,
            crossover: Crossover::Order,
            seed: Some(3),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let back: EvolverConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}
