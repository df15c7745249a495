//! Sample augmentation: token perturbations and firing-rate re-draws.
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use crate::analysis::{self, DenseSolver, SpnAnalysis};
use crate::graph::{explore, ReachabilityGraph};
use crate::net::{Idx, IndexVec, PetriNet, PlaceId, Tokens, TransitionId};
use crate::sample::Sample;

/// Acceptance limits shared by the perturbation variants.
#[derive(Debug, Clone)]
pub struct VariationLimits {
    pub place_upper_bound: Tokens,
    pub marks_lower_limit: usize,
    pub marks_upper_limit: usize,
    pub min_firing_rate: u32,
    pub max_firing_rate: u32,
}

/// Draws one integer rate per transition, uniform over the inclusive range.
pub fn draw_firing_rates(
    transitions: usize,
    min_rate: u32,
    max_rate: u32,
    rng: &mut StdRng,
) -> IndexVec<TransitionId, f64> {
    IndexVec::from_vec(
        (0..transitions)
            .map(|_| rng.gen_range(min_rate..=max_rate) as f64)
            .collect(),
    )
}

/// Produces up to `count` token-perturbed variants of `base`.
///
/// Each attempt deep-copies the net, moves one initial token up or down (fair
/// coin, uniform place, bounded by the token ceiling), re-explores the
/// reachability graph and re-runs the analysis with a fresh rate vector.
/// Variants whose graph is unbounded, too small, or whose solve fails are
/// dropped.
pub fn token_perturbations(
    base: &PetriNet,
    limits: &VariationLimits,
    count: usize,
    rng: &mut StdRng,
    solver: &dyn DenseSolver,
) -> Vec<Sample> {
    let mut variants = Vec::new();
    for _ in 0..count {
        let mut net = base.clone();
        if rng.gen_bool(0.5) {
            let place = PlaceId::from_usize(rng.gen_range(0..net.places()));
            let tokens = net.initial_tokens(place);
            if tokens < limits.place_upper_bound {
                net.set_initial_tokens(place, tokens + 1);
            }
        } else {
            let place = PlaceId::from_usize(rng.gen_range(0..net.places()));
            let tokens = net.initial_tokens(place);
            if tokens > 0 {
                net.set_initial_tokens(place, tokens - 1);
            }
        }

        let graph = explore(&net, limits.place_upper_bound, limits.marks_upper_limit);
        if !graph.bounded || graph.num_vertices() < limits.marks_lower_limit {
            debug!("dropping perturbed variant: unbounded or too few markings");
            continue;
        }

        let rates = draw_firing_rates(
            net.transitions(),
            limits.min_firing_rate,
            limits.max_firing_rate,
            rng,
        );
        let analysis = match analysis::analyze(&graph, &rates, solver) {
            Ok(analysis) => analysis,
            Err(err) => {
                debug!("dropping perturbed variant: {err}");
                continue;
            }
        };
        variants.push(Sample {
            net,
            graph,
            firing_rates: rates,
            analysis,
        });
    }
    variants
}

/// Re-analyzes one graph under `count` fresh rate vectors.
///
/// The net and graph are untouched; only the CTMC solve is repeated. Draws
/// whose solve fails are dropped.
pub fn rate_variations(
    graph: &ReachabilityGraph,
    transitions: usize,
    count: usize,
    min_rate: u32,
    max_rate: u32,
    rng: &mut StdRng,
    solver: &dyn DenseSolver,
) -> Vec<(IndexVec<TransitionId, f64>, SpnAnalysis)> {
    let mut variations = Vec::new();
    for _ in 0..count {
        let rates = draw_firing_rates(transitions, min_rate, max_rate, rng);
        match analysis::analyze(graph, &rates, solver) {
            Ok(analysis) => variations.push((rates, analysis)),
            Err(err) => debug!("dropping rate variation: {err}"),
        }
    }
    variations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LuSolver;
    use rand::SeedableRng;

    fn cycle_net() -> PetriNet {
        let mut net = PetriNet::new(2, 2);
        net.set_pre(PlaceId::new(0), TransitionId::new(0), 1);
        net.set_post(PlaceId::new(1), TransitionId::new(0), 1);
        net.set_pre(PlaceId::new(1), TransitionId::new(1), 1);
        net.set_post(PlaceId::new(0), TransitionId::new(1), 1);
        net.set_initial_tokens(PlaceId::new(0), 1);
        net
    }

    fn limits() -> VariationLimits {
        VariationLimits {
            place_upper_bound: 5,
            marks_lower_limit: 2,
            marks_upper_limit: 100,
            min_firing_rate: 1,
            max_firing_rate: 10,
        }
    }

    #[test]
    fn rates_are_integers_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let rates = draw_firing_rates(50, 2, 6, &mut rng);
        for &rate in rates.iter() {
            assert!((2.0..=6.0).contains(&rate));
            assert_eq!(rate, rate.trunc());
        }
    }

    #[test]
    fn perturbed_variants_respect_acceptance_limits() {
        let mut rng = StdRng::seed_from_u64(9);
        let solver = LuSolver::default();
        let variants = token_perturbations(&cycle_net(), &limits(), 8, &mut rng, &solver);

        assert!(variants.len() <= 8);
        for variant in &variants {
            assert!(variant.graph.bounded);
            assert!(variant.graph.num_vertices() >= 2);
            let mass: f64 = variant.analysis.steady_state_probs.iter().sum();
            assert!((mass - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn perturbation_moves_at_most_one_token() {
        let base = cycle_net();
        let base_total: u32 = base.initial_marking().iter().sum();
        let mut rng = StdRng::seed_from_u64(13);
        let solver = LuSolver::default();

        for variant in token_perturbations(&base, &limits(), 10, &mut rng, &solver) {
            let total: u32 = variant.net.initial_marking().iter().sum();
            assert!(total.abs_diff(base_total) <= 1);
        }
    }

    #[test]
    fn rate_variations_keep_every_successful_solve() {
        let net = cycle_net();
        let graph = explore(&net, 5, 100);
        let mut rng = StdRng::seed_from_u64(3);
        let solver = LuSolver::default();

        let variations = rate_variations(&graph, net.transitions(), 6, 1, 10, &mut rng, &solver);
        assert_eq!(variations.len(), 6);
        for (rates, analysis) in &variations {
            assert_eq!(rates.len(), 2);
            let mass: f64 = analysis.steady_state_probs.iter().sum();
            assert!((mass - 1.0).abs() < 1e-6);
        }
    }
}
