//! Crossover operators and the recombination loop.
//!
//! Operators work on the gene sequence (route without depot markers). A
//! child takes its originating parent's depot layout when the gene count
//! matches, and is then repaired with that parent as template.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::Route;
use crate::repair::FeasibilityRepairer;

use super::config::ConfigError;

/// Crossover operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Crossover {
    /// Swap the tails after one random cut.
    OnePoint,
    /// Swap the segment between two random cuts.
    TwoPoint,
    /// Swap each position with probability 1/2.
    Uniform,
    /// Order crossover (OX): a segment of one parent, the rest in the other
    /// parent's relative order.
    #[default]
    Order,
}

impl Crossover {
    /// Short name for logs and event records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OnePoint => "one_point",
            Self::TwoPoint => "two_point",
            Self::Uniform => "uniform",
            Self::Order => "order",
        }
    }

    /// Crosses two gene sequences into two children.
    ///
    /// Positional operators work over the shorter length; longer tails stay
    /// with their own parent. Children may contain duplicates, which repair
    /// removes.
    ///
    /// # Examples
    ///
    /// ```
    /// use evrp_ga::ga::Crossover;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    /// let (a, b) = Crossover::Order.cross(&[2, 3, 4, 5], &[5, 4, 3, 2], &mut rng);
    /// let mut a_sorted = a.clone();
    /// a_sorted.sort();
    /// assert_eq!(a_sorted, vec![2, 3, 4, 5]);
    /// assert_eq!(b.len(), 4);
    /// ```
    pub fn cross<R: Rng>(&self, p1: &[usize], p2: &[usize], rng: &mut R) -> (Vec<usize>, Vec<usize>) {
        let n = p1.len().min(p2.len());
        if n < 2 {
            return (p1.to_vec(), p2.to_vec());
        }
        match self {
            Self::OnePoint => {
                let cut = rng.random_range(1..n);
                swap_range(p1, p2, cut, n)
            }
            Self::TwoPoint => {
                let a = rng.random_range(0..n);
                let b = rng.random_range(0..n);
                let (lo, hi) = if a <= b { (a, b + 1) } else { (b, a + 1) };
                swap_range(p1, p2, lo, hi)
            }
            Self::Uniform => {
                let mut c1 = p1.to_vec();
                let mut c2 = p2.to_vec();
                for i in 0..n {
                    if rng.random_bool(0.5) {
                        std::mem::swap(&mut c1[i], &mut c2[i]);
                    }
                }
                (c1, c2)
            }
            Self::Order => {
                let a = rng.random_range(0..n);
                let b = rng.random_range(0..n);
                let (lo, hi) = if a <= b { (a, b + 1) } else { (b, a + 1) };
                (order_child(p1, p2, lo, hi), order_child(p2, p1, lo, hi))
            }
        }
    }

    /// Produces `n_children` feasible children from `parents`.
    ///
    /// Parents are paired in order (`0-1`, `2-3`, ...), cycling when more
    /// pairs are needed. With probability `1 − rate` a pair is copied through
    /// unchanged. Otherwise each child is repaired with its originating
    /// parent as template, and discarded if still infeasible. When too many
    /// children are discarded the shortfall is filled with parent copies.
    ///
    /// Returns [`ConfigError::InsufficientParents`] for fewer than two parents.
    pub fn recombine<R: Rng>(
        &self,
        parents: &[Route],
        repairer: &FeasibilityRepairer<'_>,
        n_children: usize,
        rate: f64,
        rng: &mut R,
    ) -> Result<Vec<Route>, ConfigError> {
        if parents.len() < 2 {
            return Err(ConfigError::InsufficientParents(parents.len()));
        }

        let max_pairs = n_children + parents.len();
        let mut children = Vec::with_capacity(n_children + 1);
        let mut pair = 0;

        while children.len() < n_children && pair < max_pairs {
            let p1 = &parents[(2 * pair) % parents.len()];
            let p2 = &parents[(2 * pair + 1) % parents.len()];
            pair += 1;

            if !rng.random_bool(rate.clamp(0.0, 1.0)) {
                children.push(p1.clone());
                children.push(p2.clone());
                continue;
            }

            let (g1, g2) = self.cross(&p1.genes(), &p2.genes(), rng);
            for (genes, template) in [(g1, p1), (g2, p2)] {
                let raw = reassemble(template, &genes);
                let child = repairer.repair(&raw, template);
                if repairer.is_feasible(&child) {
                    children.push(child);
                } else {
                    log::warn!("discarding infeasible {} child", self.name());
                }
            }
        }

        children.truncate(n_children);
        let mut fill = parents.iter().cycle();
        while children.len() < n_children {
            match fill.next() {
                Some(parent) => children.push(parent.clone()),
                None => break,
            }
        }
        Ok(children)
    }
}

fn swap_range(p1: &[usize], p2: &[usize], lo: usize, hi: usize) -> (Vec<usize>, Vec<usize>) {
    let mut c1 = p1.to_vec();
    let mut c2 = p2.to_vec();
    c1[lo..hi].copy_from_slice(&p2[lo..hi]);
    c2[lo..hi].copy_from_slice(&p1[lo..hi]);
    (c1, c2)
}

/// OX child: `donor[lo..hi]` in place, remaining slots filled with `other`'s
/// genes in order, skipping one occurrence per gene already in the segment.
fn order_child(donor: &[usize], other: &[usize], lo: usize, hi: usize) -> Vec<usize> {
    let segment = &donor[lo..hi];
    let mut taken: HashMap<usize, usize> = HashMap::new();
    for &g in segment {
        *taken.entry(g).or_insert(0) += 1;
    }
    let rest: Vec<usize> = other
        .iter()
        .copied()
        .filter(|g| match taken.get_mut(g) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .collect();

    let head = lo.min(rest.len());
    let mut child = Vec::with_capacity(rest.len() + segment.len());
    child.extend_from_slice(&rest[..head]);
    child.extend_from_slice(segment);
    child.extend_from_slice(&rest[head..]);
    child
}

/// Puts child genes back into the parent's depot layout.
fn reassemble(parent: &Route, genes: &[usize]) -> Route {
    if parent.gene_positions().len() == genes.len() {
        parent.with_genes(genes)
    } else {
        Route::from_trips(&[genes])
    }
}
