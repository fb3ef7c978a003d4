/// Borrowed view of one sparse row: parallel slices of sorted column indices
/// and their values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseRow<'a> {
    indices: &'a [usize],
    values: &'a [f64],
}

impl<'a> SparseRow<'a> {
    pub fn new(indices: &'a [usize], values: &'a [f64]) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        Self { indices, values }
    }

    pub fn indices(&self) -> &'a [usize] {
        self.indices
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn get(&self, col: usize) -> Option<f64> {
        self.indices
            .binary_search(&col)
            .ok()
            .map(|pos| self.values[pos])
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Largest absolute stored value, 0 for an empty row.
    pub fn max_abs(&self) -> f64 {
        self.values.iter().fold(0.0f64, |m, v| m.max(v.abs()))
    }
}
