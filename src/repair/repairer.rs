//! Full repair pipeline with template fallback.

use crate::evaluation::RouteChecker;
use crate::models::{ProblemInstance, Route};

use super::resource::repair_resources;
use super::structural::{repair_structure, RepairOptions};

/// Turns arbitrary candidate routes into feasible ones.
///
/// A feasible candidate is returned as-is. Otherwise structural repair runs
/// first, then resource repair. If the result is still infeasible the
/// template is used instead, repaired against itself when it too is
/// infeasible.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::{ProblemInstance, Route};
/// use evrp_ga::evaluation::is_feasible;
/// use evrp_ga::repair::{FeasibilityRepairer, RepairOptions};
///
/// let instance = ProblemInstance::builder(5)
///     .vehicles(2)
///     .capacity(10)
///     .energy(100.0, 1.0)
///     .depot(0.0, 0.0)
///     .customer(2, 1.0, 0.0, 4)
///     .customer(3, 2.0, 0.0, 4)
///     .customer(4, 3.0, 0.0, 4)
///     .customer(5, 4.0, 0.0, 4)
///     .build()
///     .unwrap();
///
/// let repairer = FeasibilityRepairer::new(&instance, RepairOptions::new(2, false));
/// let template = Route::new(vec![1, 2, 3, 4, 5, 1]);
/// let fixed = repairer.repair(&Route::new(vec![1, 5, 4, 3, 3, 1]), &template);
/// assert!(is_feasible(&fixed, &instance, 2));
/// ```
pub struct FeasibilityRepairer<'a> {
    instance: &'a ProblemInstance,
    checker: RouteChecker<'a>,
    options: RepairOptions,
}

impl<'a> FeasibilityRepairer<'a> {
    /// Creates a repairer for the given instance.
    pub fn new(instance: &'a ProblemInstance, options: RepairOptions) -> Self {
        Self {
            instance,
            checker: RouteChecker::new(instance),
            options,
        }
    }

    /// The instance routes are repaired for.
    pub fn instance(&self) -> &'a ProblemInstance {
        self.instance
    }

    /// The options every repair call uses.
    pub fn options(&self) -> RepairOptions {
        self.options
    }

    /// Returns `true` if the route passes every check under these options.
    pub fn is_feasible(&self, route: &Route) -> bool {
        self.checker.validate(route, self.options.min_trips).is_empty()
    }

    /// Repairs `candidate`, borrowing trip layout and missing customers from
    /// `template`.
    pub fn repair(&self, candidate: &Route, template: &Route) -> Route {
        if self.is_feasible(candidate) {
            return candidate.clone();
        }
        if let Some(route) = self.attempt(candidate, template) {
            return route;
        }

        log::warn!("repair failed, falling back to template");
        if self.is_feasible(template) {
            return template.clone();
        }
        match self.attempt(template, template) {
            Some(route) => route,
            None => {
                log::warn!("template is not repairable either, returning it unchanged");
                template.clone()
            }
        }
    }

    fn attempt(&self, candidate: &Route, template: &Route) -> Option<Route> {
        let shaped = repair_structure(candidate, template, self.instance, self.options);
        match repair_resources(shaped, self.instance) {
            Ok(route) if self.is_feasible(&route) => Some(route),
            Ok(route) => {
                log::debug!(
                    "repaired route still violates constraints: {:?}",
                    self.checker.validate(&route, self.options.min_trips)
                );
                None
            }
            Err(e) => {
                log::debug!("resource repair failed: {e}");
                None
            }
        }
    }
}

/// Repairs one candidate. See [`FeasibilityRepairer::repair`].
pub fn repair(
    candidate: &Route,
    template: &Route,
    instance: &ProblemInstance,
    options: RepairOptions,
) -> Route {
    FeasibilityRepairer::new(instance, options).repair(candidate, template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{is_feasible, route_distance};

    fn setup() -> ProblemInstance {
        ProblemInstance::builder(5)
            .vehicles(2)
            .capacity(10)
            .energy(100.0, 1.0)
            .depot(0.0, 0.0)
            .customer(2, 1.0, 0.0, 4)
            .customer(3, 2.0, 0.0, 4)
            .customer(4, 3.0, 0.0, 4)
            .customer(5, 4.0, 0.0, 4)
            .build()
            .expect("valid")
    }

    fn trip_loads(route: &Route, inst: &ProblemInstance) -> Vec<i32> {
        route
            .trips()
            .iter()
            .map(|t| t.iter().map(|&n| inst.demand(n)).sum())
            .collect()
    }

    #[test]
    fn test_splits_overloaded_trip() {
        let inst = setup();
        let route = Route::new(vec![1, 2, 3, 4, 5, 1]);
        let out = repair(&route, &route, &inst, RepairOptions::new(2, false));
        assert!(out.num_trips() >= 2);
        assert!(trip_loads(&out, &inst).iter().all(|&l| l <= 10));
        assert!(is_feasible(&out, &inst, 2));
    }

    #[test]
    fn test_feasible_candidate_unchanged() {
        let inst = setup();
        let route = Route::new(vec![1, 3, 2, 1, 5, 4, 1]);
        let template = Route::new(vec![1, 2, 3, 1, 4, 5, 1]);
        let out = repair(&route, &template, &inst, RepairOptions::new(2, false));
        assert_eq!(out, route);
    }

    #[test]
    fn test_idempotent() {
        let inst = setup();
        let opts = RepairOptions::new(2, false);
        let template = Route::new(vec![1, 2, 3, 1, 4, 5, 1]);
        let once = repair(&Route::new(vec![5, 5, 2, 1, 1]), &template, &inst, opts);
        let twice = repair(&once, &template, &inst, opts);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_zero_slack_single_trip() {
        // Round trip of exactly the battery range.
        let inst = ProblemInstance::builder(2)
            .capacity(10)
            .energy(10.0, 1.0)
            .depot(0.0, 0.0)
            .customer(2, 3.0, 4.0, 10)
            .station(3, 3.0, 0.0)
            .build()
            .expect("valid");
        let route = Route::new(vec![1, 2, 1]);
        let out = repair(&route, &route, &inst, RepairOptions::new(1, true));
        assert_eq!(out.nodes(), &[1, 2, 1]);
        assert!((route_distance(&out, &inst) - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_inserts_station_for_long_trip() {
        let inst = ProblemInstance::builder(3)
            .capacity(10)
            .energy(10.0, 1.0)
            .depot(0.0, 0.0)
            .customer(2, 4.0, 0.0, 1)
            .customer(3, 8.0, 0.0, 1)
            .station(4, 5.0, 0.0)
            .build()
            .expect("valid");
        let route = Route::new(vec![1, 2, 3, 1]);
        let out = repair(&route, &route, &inst, RepairOptions::new(1, false));
        assert!(out.nodes().contains(&4));
        assert!(is_feasible(&out, &inst, 1));
    }

    #[test]
    fn test_unrepairable_falls_back_to_template() {
        // Customer 3 is out of range from everything.
        let inst = ProblemInstance::builder(3)
            .capacity(10)
            .energy(5.0, 1.0)
            .depot(0.0, 0.0)
            .customer(2, 1.0, 0.0, 1)
            .customer(3, 50.0, 0.0, 1)
            .build()
            .expect("valid");
        let template = Route::new(vec![1, 3, 2, 1]);
        let out = repair(&Route::new(vec![1, 2, 1]), &template, &inst, RepairOptions::new(1, false));
        assert_eq!(out, template);
    }

    #[test]
    fn test_template_repaired_when_candidate_fails() {
        let inst = setup();
        let repairer = FeasibilityRepairer::new(&inst, RepairOptions::new(2, false));
        let template = Route::new(vec![1, 2, 3, 4, 5, 1]);
        let out = repairer.repair(&Route::new(vec![1, 2, 3, 4, 1]), &template);
        assert!(repairer.is_feasible(&out));
    }
}
