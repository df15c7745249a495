//! Random construction of connected Petri nets.
//!
//! Construction runs in three phases: a connected spanning pass that touches
//! every place and transition at least once, pruning of excess arcs with
//! repair of missing ones, and random token seeding. The builder is fully
//! determined by the supplied RNG; reusing a seed reproduces the net.
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::net::{Idx, PetriNet, PlaceId, TransitionId};

#[derive(Clone, Copy)]
enum Node {
    Place(PlaceId),
    Transition(TransitionId),
}

/// Grows a connected bipartite net on `places x transitions` and seeds one
/// initial token at a uniformly chosen place.
pub fn generate_random_net(places: usize, transitions: usize, rng: &mut StdRng) -> PetriNet {
    let mut net = PetriNet::new(places, transitions);

    let first_place = PlaceId::from_usize(rng.gen_range(0..places));
    let first_transition = TransitionId::from_usize(rng.gen_range(0..transitions));
    connect(&mut net, first_place, first_transition, rng);

    let mut remaining: Vec<Node> = Vec::with_capacity(places + transitions - 2);
    remaining.extend(
        (0..places)
            .map(PlaceId::from_usize)
            .filter(|&p| p != first_place)
            .map(Node::Place),
    );
    remaining.extend(
        (0..transitions)
            .map(TransitionId::from_usize)
            .filter(|&t| t != first_transition)
            .map(Node::Transition),
    );
    remaining.shuffle(rng);

    let mut sub_places = vec![first_place];
    let mut sub_transitions = vec![first_transition];

    for node in remaining {
        match node {
            Node::Place(place) => {
                let partner = sub_transitions[rng.gen_range(0..sub_transitions.len())];
                connect(&mut net, place, partner, rng);
                sub_places.push(place);
            }
            Node::Transition(transition) => {
                let partner = sub_places[rng.gen_range(0..sub_places.len())];
                connect(&mut net, partner, transition, rng);
                sub_transitions.push(transition);
            }
        }
    }

    let seeded = PlaceId::from_usize(rng.gen_range(0..places));
    net.set_initial_tokens(seeded, 1);
    net
}

fn connect(net: &mut PetriNet, place: PlaceId, transition: TransitionId, rng: &mut StdRng) {
    if rng.gen_bool(0.5) {
        net.set_pre(place, transition, 1);
    } else {
        net.set_post(place, transition, 1);
    }
}

/// Deletes excess arcs, then repairs places and columns left without any.
pub fn prune(net: &mut PetriNet, rng: &mut StdRng) {
    delete_excess_arcs(net, rng);
    repair_missing_arcs(net, rng);
}

fn delete_excess_arcs(net: &mut PetriNet, rng: &mut StdRng) {
    let arc_cols = 2 * net.transitions();

    for p in 0..net.places() {
        let place = PlaceId::from_usize(p);
        if net.place_degree(place) < 3 {
            continue;
        }
        let mut cols = (0..arc_cols)
            .filter(|&col| net.arc(place, col) == 1)
            .collect_vec();
        cols.shuffle(rng);
        for &col in &cols[..cols.len() - 2] {
            net.set_arc(place, col, 0);
            if !no_isolated_rows_or_columns(net) {
                net.set_arc(place, col, 1);
            }
        }
    }

    for col in 0..arc_cols {
        if net.arc_column_total(col) < 3 {
            continue;
        }
        let mut rows = (0..net.places())
            .map(PlaceId::from_usize)
            .filter(|&place| net.arc(place, col) == 1)
            .collect_vec();
        rows.shuffle(rng);
        for &place in &rows[..rows.len() - 2] {
            net.set_arc(place, col, 0);
            if !no_isolated_rows_or_columns(net) {
                net.set_arc(place, col, 1);
            }
        }
    }
}

/// The purely local check used while pruning: a removal only counts as
/// disconnecting when it zeroes a whole place row or a whole arc column.
/// Splitting the bipartite graph into components is allowed.
fn no_isolated_rows_or_columns(net: &PetriNet) -> bool {
    if (0..net.places()).any(|p| net.place_degree(PlaceId::from_usize(p)) == 0) {
        return false;
    }
    (0..2 * net.transitions()).all(|col| net.arc_column_total(col) > 0)
}

fn repair_missing_arcs(net: &mut PetriNet, rng: &mut StdRng) {
    let transitions = net.transitions();

    for col in 0..2 * transitions {
        if net.arc_column_total(col) == 0 {
            let place = PlaceId::from_usize(rng.gen_range(0..net.places()));
            net.set_arc(place, col, 1);
        }
    }

    for p in 0..net.places() {
        let place = PlaceId::from_usize(p);
        let pre_total: u32 = net.pre().row(place).iter().sum();
        let post_total: u32 = net.post().row(place).iter().sum();
        if pre_total == 0 {
            let t = TransitionId::from_usize(rng.gen_range(0..transitions));
            net.set_pre(place, t, 1);
        }
        if post_total == 0 {
            let t = TransitionId::from_usize(rng.gen_range(0..transitions));
            net.set_post(place, t, 1);
        }
    }
}

/// Each place independently gains one extra initial token with probability 3/10.
pub fn add_random_tokens(net: &mut PetriNet, rng: &mut StdRng) {
    for p in 0..net.places() {
        let place = PlaceId::from_usize(p);
        if rng.gen_range(0..10) <= 2 {
            net.set_initial_tokens(place, net.initial_tokens(place) + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn build(places: usize, transitions: usize, seed: u64) -> PetriNet {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut net = generate_random_net(places, transitions, &mut rng);
        prune(&mut net, &mut rng);
        add_random_tokens(&mut net, &mut rng);
        net
    }

    #[test]
    fn same_seed_reproduces_the_net() {
        assert_eq!(build(6, 4, 7), build(6, 4, 7));
    }

    #[test]
    fn different_seeds_usually_differ() {
        assert_ne!(build(6, 4, 1), build(6, 4, 2));
    }

    #[test]
    fn every_node_is_touched_after_repair() {
        for seed in 0..20 {
            let net = build(5, 4, seed);
            for p in 0..net.places() {
                let place = PlaceId::from_usize(p);
                let pre: u32 = net.pre().row(place).iter().sum();
                let post: u32 = net.post().row(place).iter().sum();
                assert!(pre > 0, "place {p} has no pre arc (seed {seed})");
                assert!(post > 0, "place {p} has no post arc (seed {seed})");
            }
            for col in 0..2 * net.transitions() {
                assert!(
                    net.arc_column_total(col) > 0,
                    "column {col} is empty (seed {seed})"
                );
            }
        }
    }

    #[test]
    fn spanning_pass_seeds_exactly_one_token() {
        let mut rng = StdRng::seed_from_u64(11);
        let net = generate_random_net(5, 3, &mut rng);
        let total: u32 = net.initial_marking().iter().sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn minimal_shape_builds() {
        let net = build(1, 1, 3);
        assert_eq!(net.places(), 1);
        assert_eq!(net.transitions(), 1);
        assert!(net.place_degree(PlaceId::new(0)) > 0);
    }

    #[test]
    fn arc_entries_stay_zero_or_one() {
        for seed in 0..10 {
            let net = build(7, 5, seed);
            for p in 0..net.places() {
                let place = PlaceId::from_usize(p);
                for col in 0..2 * net.transitions() {
                    assert!(net.arc(place, col) <= 1);
                }
            }
        }
    }
}
