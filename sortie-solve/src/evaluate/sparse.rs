use ndarray::Array2;

/// The coordinates of every structural nonzero, known before any values.
///
/// Solvers that allocate their linear algebra up front take this once and
/// then receive only values through [`SparseJacobian`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsityPattern {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub shape: (usize, usize),
}

impl SparsityPattern {
    /// Returns the number of structural nonzeros.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.rows.len()
    }
}

/// A Jacobian in coordinate (COO) format.
///
/// Entries follow the order of the [`SparsityPattern`] they were assembled
/// against, so `values[k]` sits at `(rows[k], cols[k])`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseJacobian {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub values: Vec<f64>,
    pub shape: (usize, usize),
}

impl SparseJacobian {
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Returns the value at `(row, col)`, or zero if it is not a stored entry.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .filter(|&((&r, &c), _)| r == row && c == col)
            .map(|(_, &v)| v)
            .sum()
    }

    /// Expands into a dense matrix, summing any duplicate coordinates.
    #[must_use]
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros(self.shape);
        for ((&r, &c), &v) in self.rows.iter().zip(&self.cols).zip(&self.values) {
            dense[[r, c]] += v;
        }
        dense
    }
}
