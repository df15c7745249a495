//! Dense linear solving behind a narrow trait so the LU factorization can be
//! swapped for an iterative method later.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("system matrix is singular at pivot column {0}")]
    Singular(usize),
    #[error("dimension mismatch: {rows}x{cols} matrix with rhs of length {rhs}")]
    Shape {
        rows: usize,
        cols: usize,
        rhs: usize,
    },
}

/// Row-major dense matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let cols = rows.first().map(|row| row.len()).unwrap_or_default();
        debug_assert!(rows.iter().all(|row| row.len() == cols));
        let n = rows.len();
        Self {
            rows: n,
            cols,
            data: rows.into_iter().flatten().collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn at_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        &mut self.data[row * self.cols + col]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for col in 0..self.cols {
            self.data.swap(a * self.cols + col, b * self.cols + col);
        }
    }
}

pub trait DenseSolver {
    fn solve_dense(&self, a: &DenseMatrix, b: &[f64]) -> Result<Vec<f64>, SolveError>;
}

/// Gaussian elimination with partial pivoting.
#[derive(Debug, Clone)]
pub struct LuSolver {
    pub pivot_epsilon: f64,
}

impl Default for LuSolver {
    fn default() -> Self {
        Self {
            pivot_epsilon: 1e-12,
        }
    }
}

impl DenseSolver for LuSolver {
    fn solve_dense(&self, a: &DenseMatrix, b: &[f64]) -> Result<Vec<f64>, SolveError> {
        if a.rows() != a.cols() || b.len() != a.rows() {
            return Err(SolveError::Shape {
                rows: a.rows(),
                cols: a.cols(),
                rhs: b.len(),
            });
        }
        let n = a.rows();
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut m = a.clone();
        let mut rhs = b.to_vec();

        for col in 0..n {
            let mut pivot_row = col;
            let mut pivot_abs = m.at(col, col).abs();
            for row in col + 1..n {
                let candidate = m.at(row, col).abs();
                if candidate > pivot_abs {
                    pivot_row = row;
                    pivot_abs = candidate;
                }
            }
            if pivot_abs <= self.pivot_epsilon {
                return Err(SolveError::Singular(col));
            }
            m.swap_rows(col, pivot_row);
            rhs.swap(col, pivot_row);

            let pivot = m.at(col, col);
            for row in col + 1..n {
                let factor = m.at(row, col) / pivot;
                if factor == 0.0 {
                    continue;
                }
                for k in col..n {
                    let adjusted = m.at(row, k) - factor * m.at(col, k);
                    *m.at_mut(row, k) = adjusted;
                }
                rhs[row] -= factor * rhs[col];
            }
        }

        let mut x = vec![0.0; n];
        for row in (0..n).rev() {
            let mut sum = rhs[row];
            for k in row + 1..n {
                sum -= m.at(row, k) * x[k];
            }
            x[row] = sum / m.at(row, row);
        }
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_known_system() {
        let a = DenseMatrix::from_rows(vec![
            vec![2.0, 1.0, -1.0],
            vec![-3.0, -1.0, 2.0],
            vec![-2.0, 1.0, 2.0],
        ]);
        let b = [8.0, -11.0, -3.0];

        let x = LuSolver::default().solve_dense(&a, &b).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-9);
        assert!((x[1] - 3.0).abs() < 1e-9);
        assert!((x[2] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn pivoting_handles_zero_leading_entry() {
        let a = DenseMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        let b = [3.0, 4.0];

        let x = LuSolver::default().solve_dense(&a, &b).unwrap();
        assert!((x[0] - 4.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn singular_matrix_is_an_error() {
        let a = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 4.0]]);
        let b = [1.0, 2.0];

        assert!(matches!(
            LuSolver::default().solve_dense(&a, &b),
            Err(SolveError::Singular(_))
        ));
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let a = DenseMatrix::zeros(2, 3);
        assert!(matches!(
            LuSolver::default().solve_dense(&a, &[0.0, 0.0]),
            Err(SolveError::Shape { .. })
        ));
    }
}
