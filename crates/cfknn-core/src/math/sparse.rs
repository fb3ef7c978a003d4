use ndarray::Array2;
use thiserror::Error;

use crate::math::vector::SparseRow;

/// Compressed sparse row matrix of `f64` with sorted column indices per row.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Empty matrix of the given shape.
    pub fn zeros(shape: (usize, usize)) -> Self {
        let (rows, cols) = shape;
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Assemble from `(row, col, value)` triplets.
    ///
    /// A coordinate that appears more than once keeps the value that came last
    /// in `triplets`.
    pub fn from_triplets(
        shape: (usize, usize),
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self, ShapeError> {
        let (rows, cols) = shape;
        for &(r, c, _) in triplets {
            if r >= rows || c >= cols {
                return Err(ShapeError {
                    rows,
                    cols,
                    row: r,
                    col: c,
                });
            }
        }

        // Stable sort keeps input order among equal coordinates.
        let mut order: Vec<usize> = (0..triplets.len()).collect();
        order.sort_by_key(|&i| (triplets[i].0, triplets[i].1));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for i in order {
            let (r, c, v) = triplets[i];
            if last == Some((r, c)) {
                if let Some(slot) = values.last_mut() {
                    *slot = v;
                }
                continue;
            }
            col_idx.push(c);
            values.push(v);
            row_ptr[r + 1] += 1;
            last = Some((r, c));
        }

        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Ok(Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row(&self, row: usize) -> SparseRow<'_> {
        let (start, end) = (self.row_ptr[row], self.row_ptr[row + 1]);
        SparseRow::new(&self.col_idx[start..end], &self.values[start..end])
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows {
            return None;
        }
        self.row(row).get(col)
    }

    /// Iterate stored entries as `(row, col, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.rows).flat_map(move |r| self.row(r).iter().map(move |(c, v)| (r, c, v)))
    }

    /// Transpose by counting sort on column indices; rows of the result stay
    /// sorted because the source is walked in row order.
    pub fn transpose(&self) -> CsrMatrix {
        let mut row_ptr = vec![0usize; self.cols + 1];
        for &c in &self.col_idx {
            row_ptr[c + 1] += 1;
        }
        for c in 0..self.cols {
            row_ptr[c + 1] += row_ptr[c];
        }

        let mut next = row_ptr.clone();
        let mut col_idx = vec![0usize; self.nnz()];
        let mut values = vec![0.0f64; self.nnz()];
        for r in 0..self.rows {
            for (c, v) in self.row(r).iter() {
                let dest = next[c];
                col_idx[dest] = r;
                values[dest] = v;
                next[c] += 1;
            }
        }

        CsrMatrix {
            rows: self.cols,
            cols: self.rows,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Materialise as a dense array with zeros for missing entries.
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::<f64>::zeros((self.rows, self.cols));
        for (r, c, v) in self.iter() {
            dense[(r, c)] = v;
        }
        dense
    }

    /// Copy with every row divided by its largest absolute value, so stored
    /// magnitudes lie in `[0, 1]`. All-zero rows are left as they are.
    pub fn scaled_by_row_max(&self) -> CsrMatrix {
        let mut scaled = self.clone();
        for r in 0..self.rows {
            let max = self.row(r).max_abs();
            if max > 0.0 {
                let (start, end) = (self.row_ptr[r], self.row_ptr[r + 1]);
                for v in &mut scaled.values[start..end] {
                    *v /= max;
                }
            }
        }
        scaled
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("entry ({row}, {col}) is outside a ({rows}, {cols}) matrix")]
pub struct ShapeError {
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
}
