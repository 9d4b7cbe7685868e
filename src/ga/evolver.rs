//! Generational GA driver.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::evaluation::{route_distance, FitnessMap};
use crate::models::{ProblemInstance, Route};
use crate::repair::FeasibilityRepairer;

use super::config::{ConfigError, EvolverConfig};
use super::init::{random_route, singleton_route};

/// Random draws per initial individual before falling back to
/// [`singleton_route`].
const INIT_ATTEMPTS: usize = 10;

/// Where in a generation an improvement was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The evaluated population.
    Population,
    /// Freshly recombined children.
    Crossover,
    /// Mutated children.
    Mutation,
}

/// A new best distance, in the order found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementEvent {
    /// Evaluations spent when the improvement was found.
    pub evaluations: usize,
    pub best_distance: f64,
    pub phase: Phase,
    /// Active crossover method name.
    pub crossover: String,
    /// Active mutation method name.
    pub mutation: String,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The evaluation budget was spent.
    BudgetExhausted,
    /// Too many generations without improvement.
    Stagnated,
}

/// Outcome of [`Evolver::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best feasible route found, if any.
    pub best_route: Option<Route>,
    /// Its total distance, or infinity when no feasible route was seen.
    pub best_distance: f64,
    pub evaluations: usize,
    pub generations: usize,
    /// Best feasible distance of the population at the start of each
    /// generation.
    pub history: Vec<f64>,
    pub events: Vec<ImprovementEvent>,
    pub stop_reason: StopReason,
}

/// Genetic algorithm over repaired EVRP routes.
///
/// Each generation: population checkpoint, selection, recombination,
/// crossover checkpoint, mutation, mutation checkpoint, replacement, and
/// population evaluation. The run stops when the evaluation budget is spent
/// or the stagnation limit is reached. Only feasible routes can become the
/// best-known route.
///
/// # Examples
///
/// ```
/// use evrp_ga::ga::{Evolver, EvolverConfig};
/// use evrp_ga::models::ProblemInstance;
///
/// let instance = ProblemInstance::builder(5)
///     .vehicles(2)
///     .capacity(10)
///     .energy(100.0, 1.0)
///     .depot(0.0, 0.0)
///     .customer(2, 1.0, 0.0, 4)
///     .customer(3, 2.0, 0.0, 4)
///     .customer(4, 0.0, 1.0, 4)
///     .customer(5, 0.0, 2.0, 4)
///     .build()
///     .unwrap();
///
/// let config = EvolverConfig {
///     population_size: 10,
///     n_parents: 4,
///     n_children: 8,
///     max_evaluations: 200,
///     seed: Some(42),
///     ..Default::default()
/// };
/// let result = Evolver::new(&instance, config).unwrap().run();
/// assert!(result.best_route.is_some());
/// assert!(result.best_distance <= 12.0);
/// ```
pub struct Evolver<'a> {
    instance: &'a ProblemInstance,
    config: EvolverConfig,
    repairer: FeasibilityRepairer<'a>,
    rng: StdRng,
    population: Vec<Route>,
    fitness: FitnessMap,
    evaluations: usize,
    generations: usize,
    stagnation: usize,
    best: Option<(Route, f64)>,
    history: Vec<f64>,
    events: Vec<ImprovementEvent>,
    stop_reason: Option<StopReason>,
}

impl<'a> Evolver<'a> {
    /// Validates the configuration, creates and repairs the initial
    /// population, and evaluates it.
    pub fn new(instance: &'a ProblemInstance, config: EvolverConfig) -> Result<Self, ConfigError> {
        config.validate(instance)?;

        let options = config.repair_options(instance);
        let repairer = FeasibilityRepairer::new(instance, options);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let population: Vec<Route> = (0..config.population_size)
            .map(|_| initial_route(instance, &repairer, &mut rng))
            .collect();

        log::info!(
            "starting GA: population {}, budget {}, {} crossover, {} mutation",
            config.population_size,
            config.max_evaluations,
            config.crossover.name(),
            config.mutation.name()
        );

        let mut evolver = Self {
            instance,
            config,
            repairer,
            rng,
            population,
            fitness: FitnessMap::new(),
            evaluations: 0,
            generations: 0,
            stagnation: 0,
            best: None,
            history: Vec::new(),
            events: Vec::new(),
            stop_reason: None,
        };
        evolver.evaluate_population();
        evolver.check_stop();
        Ok(evolver)
    }

    /// Current population.
    pub fn population(&self) -> &[Route] {
        &self.population
    }

    /// Evaluations spent so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Completed generations.
    pub fn generations(&self) -> usize {
        self.generations
    }

    /// Best feasible route and its distance so far.
    pub fn best(&self) -> Option<(&Route, f64)> {
        self.best.as_ref().map(|(r, d)| (r, *d))
    }

    /// Returns `true` once a stopping condition was reached.
    pub fn is_finished(&self) -> bool {
        self.stop_reason.is_some()
    }

    /// Runs one generation. Does nothing once finished.
    pub fn step(&mut self) {
        if self.is_finished() {
            return;
        }

        let population = std::mem::take(&mut self.population);
        let current = self.checkpoint(&population, Phase::Population);
        self.history.push(current);

        let parents = self
            .config
            .selection
            .select(&population, &self.fitness, self.config.n_parents, &mut self.rng);
        let children = match self.config.crossover.recombine(
            &parents,
            &self.repairer,
            self.config.n_children,
            self.config.crossover_rate,
            &mut self.rng,
        ) {
            Ok(children) => children,
            Err(e) => {
                log::warn!("recombination skipped: {e}");
                parents
            }
        };
        self.checkpoint(&children, Phase::Crossover);

        let children = self.config.mutation.mutate(
            &children,
            &self.repairer,
            self.config.mutation_rate,
            &mut self.rng,
        );
        self.checkpoint(&children, Phase::Mutation);

        let child_fitness = self.config.evaluation.evaluate(
            &children,
            self.instance,
            self.repairer.options().min_trips,
        );
        self.population =
            self.config
                .replacement
                .replace(&population, &children, &self.fitness, &child_fitness);
        self.evaluate_population();

        self.generations += 1;
        self.stagnation += 1;
        log::debug!(
            "generation {}: evaluations {}, population best {:.3}, stagnation {}",
            self.generations,
            self.evaluations,
            current,
            self.stagnation
        );
        self.check_stop();
    }

    /// Runs until a stopping condition is reached.
    pub fn run(mut self) -> EvolutionResult {
        while !self.is_finished() {
            self.step();
        }
        let stop_reason = self.stop_reason.unwrap_or(StopReason::BudgetExhausted);
        let (best_route, best_distance) = match self.best {
            Some((route, distance)) => (Some(route), distance),
            None => (None, f64::INFINITY),
        };
        log::info!(
            "stopped ({stop_reason:?}) after {} generations and {} evaluations, best {best_distance:.3}",
            self.generations,
            self.evaluations
        );
        EvolutionResult {
            best_route,
            best_distance,
            evaluations: self.evaluations,
            generations: self.generations,
            history: self.history,
            events: self.events,
            stop_reason,
        }
    }

    fn evaluate_population(&mut self) {
        self.fitness = self.config.evaluation.evaluate(
            &self.population,
            self.instance,
            self.repairer.options().min_trips,
        );
        self.evaluations += self.population.len();
    }

    fn check_stop(&mut self) {
        let reason = if self.evaluations >= self.config.max_evaluations {
            StopReason::BudgetExhausted
        } else if self.stagnation >= self.config.stagnation_limit() {
            StopReason::Stagnated
        } else {
            return;
        };
        let population = std::mem::take(&mut self.population);
        self.checkpoint(&population, Phase::Population);
        self.population = population;
        self.stop_reason = Some(reason);
    }

    /// Records a strict improvement among the feasible `routes`; returns the
    /// best feasible distance among them.
    fn checkpoint(&mut self, routes: &[Route], phase: Phase) -> f64 {
        let mut local: Option<(&Route, f64)> = None;
        for route in routes.iter().filter(|r| self.repairer.is_feasible(r)) {
            let d = route_distance(route, self.instance);
            if local.is_none_or(|(_, best)| d < best) {
                local = Some((route, d));
            }
        }

        let Some((route, distance)) = local else {
            return f64::INFINITY;
        };
        if self.best.as_ref().is_none_or(|(_, best)| distance < *best) {
            log::info!(
                "new best {distance:.3} at {} evaluations ({phase:?})",
                self.evaluations
            );
            self.best = Some((route.clone(), distance));
            self.stagnation = 0;
            self.events.push(ImprovementEvent {
                evaluations: self.evaluations,
                best_distance: distance,
                phase,
                crossover: self.config.crossover.name().to_string(),
                mutation: self.config.mutation.name().to_string(),
            });
        }
        distance
    }
}

/// A repaired random route, redrawn until feasible.
fn initial_route(
    instance: &ProblemInstance,
    repairer: &FeasibilityRepairer<'_>,
    rng: &mut StdRng,
) -> Route {
    let options = repairer.options();
    for _ in 0..INIT_ATTEMPTS {
        let raw = random_route(instance, options.min_trips, options.stations_allowed, rng);
        let route = repairer.repair(&raw, &raw);
        if repairer.is_feasible(&route) {
            return route;
        }
    }

    log::debug!("random initial routes stay infeasible, starting from singleton trips");
    let fallback = singleton_route(instance);
    let route = repairer.repair(&fallback, &fallback);
    if !repairer.is_feasible(&route) {
        log::warn!("no feasible initial route found, admitting {:?}", route.nodes());
    }
    route
}
