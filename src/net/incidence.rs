//! 输入/输出弧关系的稠密关联矩阵封装.
use std::fmt;

use smallvec::SmallVec;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};

type SmallRow<T> = SmallVec<[T; 4]>;

/// A place-by-transition matrix with one row per place.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Incidence<T> {
    rows: IndexVec<PlaceId, SmallRow<T>>,
    cols: usize,
}

impl<T> Incidence<T>
where
    T: Clone,
{
    pub fn new(places: usize, transitions: usize, default: T) -> Self {
        let mut rows = IndexVec::new();
        for _ in 0..places {
            rows.push(SmallRow::from_elem(default.clone(), transitions));
        }
        Self {
            rows,
            cols: transitions,
        }
    }

    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        let cols = rows.first().map(|row| row.len()).unwrap_or_default();
        debug_assert!(rows.iter().all(|row| row.len() == cols));
        let rows = IndexVec::from_vec(
            rows.into_iter()
                .map(|row| row.into_iter().collect::<SmallRow<_>>())
                .collect(),
        );
        Self { rows, cols }
    }

    pub fn places(&self) -> usize {
        self.rows.len()
    }

    pub fn transitions(&self) -> usize {
        self.cols
    }

    pub fn set(&mut self, place: PlaceId, transition: TransitionId, value: T) {
        self.rows[place][transition.index()] = value;
    }

    pub fn get(&self, place: PlaceId, transition: TransitionId) -> &T {
        &self.rows[place][transition.index()]
    }

    pub fn get_mut(&mut self, place: PlaceId, transition: TransitionId) -> &mut T {
        &mut self.rows[place][transition.index()]
    }

    pub fn row(&self, place: PlaceId) -> &[T] {
        &self.rows[place]
    }

    pub fn rows(&self) -> &IndexVec<PlaceId, SmallRow<T>> {
        &self.rows
    }
}

impl<T> fmt::Debug for Incidence<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Incidence")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

impl Incidence<u32> {
    /// Entry-wise `self - other` as a signed matrix.
    pub fn difference(&self, other: &Self) -> Incidence<i32> {
        assert_eq!(self.places(), other.places());
        assert_eq!(self.transitions(), other.transitions());
        let mut rows = IndexVec::new();
        for (left, right) in self.rows.iter().zip(other.rows.iter()) {
            rows.push(
                left.iter()
                    .zip(right.iter())
                    .map(|(l, r)| *l as i32 - *r as i32)
                    .collect::<SmallRow<_>>(),
            );
        }
        Incidence {
            rows,
            cols: self.cols,
        }
    }

    pub fn column_total(&self, transition: TransitionId) -> u32 {
        self.rows.iter().map(|row| row[transition.index()]).sum()
    }
}
