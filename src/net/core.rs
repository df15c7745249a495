//! P/T 网静态结构：关联矩阵、初始标识与访问器。
use std::fmt;

use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::Incidence;
use crate::net::index_vec::{Idx, IndexVec};

pub type Tokens = u32;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("matrix length {len} does not match {places} places x {width} columns")]
    MatrixShape {
        len: usize,
        places: usize,
        width: usize,
    },
    #[error("net must have at least one place and one transition")]
    EmptyShape,
}

/// A Petri net over `P` places and `T` transitions.
///
/// Structurally this is the `P x (2T + 1)` matrix of the serialized form:
/// columns `[0, T)` are the pre-matrix, `[T, 2T)` the post-matrix and column
/// `2T` the initial marking. Pre and post halves are stored as separate
/// [`Incidence`] matrices; the marking column is the `marking` vector, so the
/// two views cannot drift apart.
#[derive(Clone, PartialEq, Eq)]
pub struct PetriNet {
    pre: Incidence<Tokens>,
    post: Incidence<Tokens>,
    marking: IndexVec<PlaceId, Tokens>,
}

impl PetriNet {
    pub fn new(places: usize, transitions: usize) -> Self {
        Self {
            pre: Incidence::new(places, transitions, 0),
            post: Incidence::new(places, transitions, 0),
            marking: IndexVec::from_elem(0, places),
        }
    }

    pub fn places(&self) -> usize {
        self.marking.len()
    }

    pub fn transitions(&self) -> usize {
        self.pre.transitions()
    }

    pub fn pre(&self) -> &Incidence<Tokens> {
        &self.pre
    }

    pub fn post(&self) -> &Incidence<Tokens> {
        &self.post
    }

    pub fn pre_at(&self, place: PlaceId, transition: TransitionId) -> Tokens {
        *self.pre.get(place, transition)
    }

    pub fn post_at(&self, place: PlaceId, transition: TransitionId) -> Tokens {
        *self.post.get(place, transition)
    }

    pub fn set_pre(&mut self, place: PlaceId, transition: TransitionId, weight: Tokens) {
        self.pre.set(place, transition, weight);
    }

    pub fn set_post(&mut self, place: PlaceId, transition: TransitionId, weight: Tokens) {
        self.post.set(place, transition, weight);
    }

    /// Reads an arc entry by flat column index `col` in `[0, 2T)`.
    pub fn arc(&self, place: PlaceId, col: usize) -> Tokens {
        let t = self.transitions();
        if col < t {
            self.pre_at(place, TransitionId::from_usize(col))
        } else {
            self.post_at(place, TransitionId::from_usize(col - t))
        }
    }

    pub fn set_arc(&mut self, place: PlaceId, col: usize, weight: Tokens) {
        let t = self.transitions();
        if col < t {
            self.set_pre(place, TransitionId::from_usize(col), weight);
        } else {
            self.set_post(place, TransitionId::from_usize(col - t), weight);
        }
    }

    /// Total arc count of one place row across both matrix halves.
    pub fn place_degree(&self, place: PlaceId) -> u32 {
        self.pre.row(place).iter().sum::<u32>() + self.post.row(place).iter().sum::<u32>()
    }

    /// Total arc count of one flat column in `[0, 2T)`.
    pub fn arc_column_total(&self, col: usize) -> u32 {
        let t = self.transitions();
        if col < t {
            self.pre.column_total(TransitionId::from_usize(col))
        } else {
            self.post.column_total(TransitionId::from_usize(col - t))
        }
    }

    pub fn initial_marking(&self) -> &IndexVec<PlaceId, Tokens> {
        &self.marking
    }

    pub fn initial_tokens(&self, place: PlaceId) -> Tokens {
        self.marking[place]
    }

    pub fn set_initial_tokens(&mut self, place: PlaceId, tokens: Tokens) {
        self.marking[place] = tokens;
    }

    pub fn initial_marking_vec(&self) -> Marking {
        Marking(self.marking.clone())
    }

    /// The change matrix `post - pre`.
    pub fn change_matrix(&self) -> Incidence<i32> {
        self.post.difference(&self.pre)
    }

    /// Row-major flattening `[pre | post | marking]`, the serialized form.
    pub fn flatten(&self) -> Vec<Tokens> {
        let mut flat = Vec::with_capacity(self.places() * (2 * self.transitions() + 1));
        for (place, row) in self.pre.rows().iter_enumerated() {
            flat.extend(row.iter().copied());
            flat.extend(self.post.row(place).iter().copied());
            flat.push(self.marking[place]);
        }
        flat
    }

    /// Rebuilds a net from its flattened matrix.
    pub fn from_flat(places: usize, transitions: usize, flat: &[Tokens]) -> Result<Self, NetError> {
        if places == 0 || transitions == 0 {
            return Err(NetError::EmptyShape);
        }
        let width = 2 * transitions + 1;
        if flat.len() != places * width {
            return Err(NetError::MatrixShape {
                len: flat.len(),
                places,
                width,
            });
        }
        let mut net = Self::new(places, transitions);
        for p in 0..places {
            let place = PlaceId::from_usize(p);
            let row = &flat[p * width..(p + 1) * width];
            for t in 0..transitions {
                let transition = TransitionId::from_usize(t);
                net.set_pre(place, transition, row[t]);
                net.set_post(place, transition, row[t + transitions]);
            }
            net.set_initial_tokens(place, row[2 * transitions]);
        }
        Ok(net)
    }
}

impl fmt::Debug for PetriNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PetriNet")
            .field("pre", &self.pre)
            .field("post", &self.post)
            .field("marking", &self.marking)
            .finish()
    }
}

/// A per-place token count vector.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Marking(pub IndexVec<PlaceId, Tokens>);

impl Marking {
    pub fn new(tokens: IndexVec<PlaceId, Tokens>) -> Self {
        Self(tokens)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self, place: PlaceId) -> Tokens {
        self.0[place]
    }

    pub fn tokens_mut(&mut self, place: PlaceId) -> &mut Tokens {
        &mut self.0[place]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, &Tokens)> {
        self.0.iter_enumerated()
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (place, tokens) in self.iter() {
            map.entry(&place, tokens);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_interleaves_pre_post_marking() {
        let mut net = PetriNet::new(2, 1);
        net.set_pre(PlaceId::new(0), TransitionId::new(0), 1);
        net.set_post(PlaceId::new(1), TransitionId::new(0), 1);
        net.set_initial_tokens(PlaceId::new(0), 1);

        assert_eq!(net.flatten(), vec![1, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn from_flat_round_trips() {
        let mut net = PetriNet::new(3, 2);
        net.set_pre(PlaceId::new(0), TransitionId::new(1), 1);
        net.set_post(PlaceId::new(2), TransitionId::new(0), 1);
        net.set_initial_tokens(PlaceId::new(1), 2);

        let rebuilt = PetriNet::from_flat(3, 2, &net.flatten()).unwrap();
        assert_eq!(rebuilt, net);
    }

    #[test]
    fn from_flat_rejects_bad_shape() {
        assert!(matches!(
            PetriNet::from_flat(2, 1, &[0, 0]),
            Err(NetError::MatrixShape { .. })
        ));
        assert!(matches!(
            PetriNet::from_flat(0, 1, &[]),
            Err(NetError::EmptyShape)
        ));
    }

    #[test]
    fn arc_columns_address_both_halves() {
        let mut net = PetriNet::new(2, 2);
        net.set_arc(PlaceId::new(0), 1, 1); // pre column of t1
        net.set_arc(PlaceId::new(1), 2, 1); // post column of t0

        assert_eq!(net.pre_at(PlaceId::new(0), TransitionId::new(1)), 1);
        assert_eq!(net.post_at(PlaceId::new(1), TransitionId::new(0)), 1);
        assert_eq!(net.place_degree(PlaceId::new(0)), 1);
        assert_eq!(net.arc_column_total(2), 1);
    }
}
