//! Dense node × level × time storage for compiled boundary values.

use serde::{Deserialize, Serialize};

/// Values for every (boundary node, vertical level, output time).
///
/// Storage is time-major, then node, then level, which is the record
/// order of the solver's boundary files: one contiguous block per time
/// step.
///
/// # Example
///
/// ```
/// use bctides::types::BoundaryArray;
///
/// let mut a = BoundaryArray::filled(2, 3, 4, 0.0);
/// a.set(1, 2, 3, 7.5);
/// assert_eq!(a.get(1, 2, 3), Some(7.5));
/// assert_eq!(a.time_slice(3).len(), 6);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryArray {
    n_nodes: usize,
    n_levels: usize,
    n_times: usize,
    data: Vec<f64>,
}

impl BoundaryArray {
    /// Array with every entry set to `value`.
    pub fn filled(n_nodes: usize, n_levels: usize, n_times: usize, value: f64) -> Self {
        Self {
            n_nodes,
            n_levels,
            n_times,
            data: vec![value; n_nodes * n_levels * n_times],
        }
    }

    /// Zero-filled array.
    pub fn zeros(n_nodes: usize, n_levels: usize, n_times: usize) -> Self {
        Self::filled(n_nodes, n_levels, n_times, 0.0)
    }

    /// Build from a function of (node, level, time).
    pub fn from_fn(
        n_nodes: usize,
        n_levels: usize,
        n_times: usize,
        mut f: impl FnMut(usize, usize, usize) -> f64,
    ) -> Self {
        let mut data = Vec::with_capacity(n_nodes * n_levels * n_times);
        for t in 0..n_times {
            for node in 0..n_nodes {
                for level in 0..n_levels {
                    data.push(f(node, level, t));
                }
            }
        }
        Self {
            n_nodes,
            n_levels,
            n_times,
            data,
        }
    }

    /// (nodes, levels, times)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n_nodes, self.n_levels, self.n_times)
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Number of vertical levels (1 for elevation).
    pub fn n_levels(&self) -> usize {
        self.n_levels
    }

    /// Number of output times.
    pub fn n_times(&self) -> usize {
        self.n_times
    }

    #[inline]
    fn offset(&self, node: usize, level: usize, time: usize) -> Option<usize> {
        (node < self.n_nodes && level < self.n_levels && time < self.n_times)
            .then(|| (time * self.n_nodes + node) * self.n_levels + level)
    }

    /// Value at (node, level, time).
    pub fn get(&self, node: usize, level: usize, time: usize) -> Option<f64> {
        self.offset(node, level, time).map(|i| self.data[i])
    }

    /// Overwrite a value; out-of-range indices are ignored.
    pub fn set(&mut self, node: usize, level: usize, time: usize, value: f64) {
        if let Some(i) = self.offset(node, level, time) {
            self.data[i] = value;
        }
    }

    /// All values of one time step (node-major, level-minor).
    pub fn time_slice(&self, time: usize) -> &[f64] {
        let block = self.n_nodes * self.n_levels;
        let start = (time * block).min(self.data.len());
        let end = (start + block).min(self.data.len());
        &self.data[start..end]
    }

    /// Raw storage.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Pointwise sum with an array of the same shape.
    ///
    /// Returns `None` on shape mismatch.
    pub fn try_add(&self, other: &BoundaryArray) -> Option<BoundaryArray> {
        if self.shape() != other.shape() {
            return None;
        }
        Some(Self {
            data: self.data.iter().zip(&other.data).map(|(a, b)| a + b).collect(),
            ..*self
        })
    }

    /// Mutable flat storage, same layout as [`values`](Self::values).
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Repeat a single-level array across `n_levels`.
    pub fn broadcast_levels(&self, n_levels: usize) -> BoundaryArray {
        if self.n_levels == n_levels {
            return self.clone();
        }
        Self::from_fn(self.n_nodes, n_levels, self.n_times, |node, _, t| {
            self.data[(t * self.n_nodes + node) * self.n_levels]
        })
    }

    /// Minimum and maximum over finite entries.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_time_major() {
        let a = BoundaryArray::from_fn(2, 2, 2, |n, l, t| (100 * t + 10 * n + l) as f64);
        assert_eq!(a.values(), &[0.0, 1.0, 10.0, 11.0, 100.0, 101.0, 110.0, 111.0]);
        assert_eq!(a.get(1, 0, 1), Some(110.0));
        assert_eq!(a.get(2, 0, 0), None);
    }

    #[test]
    fn test_try_add() {
        let a = BoundaryArray::filled(3, 1, 2, 1.5);
        let b = BoundaryArray::filled(3, 1, 2, 0.25);
        let sum = a.try_add(&b).unwrap();
        assert!(sum.values().iter().all(|&v| (v - 1.75).abs() < 1e-12));
        assert!(a.try_add(&BoundaryArray::zeros(3, 2, 2)).is_none());
    }

    #[test]
    fn test_broadcast_levels() {
        let a = BoundaryArray::from_fn(2, 1, 2, |n, _, t| (n + 10 * t) as f64);
        let b = a.broadcast_levels(3);
        assert_eq!(b.shape(), (2, 3, 2));
        assert_eq!(b.get(1, 2, 1), Some(11.0));
        assert_eq!(b.get(0, 1, 0), Some(0.0));
    }

    #[test]
    fn test_range_skips_nan() {
        let mut a = BoundaryArray::filled(2, 1, 1, 3.0);
        a.set(1, 0, 0, f64::NAN);
        assert_eq!(a.range(), Some((3.0, 3.0)));
    }
}
