use serde::{Deserialize, Serialize};

use crate::error::{ForestError, Result};

/// Row-major table of numeric feature vectors.
///
/// Every row has `n_features` finite values. The forest only ever borrows a
/// store; rows are never reordered or mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStore {
    data: Vec<f64>,
    n_rows: usize,
    n_features: usize,
}

impl SampleStore {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_features = rows.first().map_or(0, |row| row.len());
        let mut data = Vec::with_capacity(rows.len() * n_features);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_features {
                return Err(ForestError::InvalidInput {
                    row: i,
                    column: row.len().min(n_features),
                    reason: format!("expected {} values, got {}", n_features, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Self::from_flat(data, n_features)
    }

    pub fn from_flat(data: Vec<f64>, n_features: usize) -> Result<Self> {
        if n_features == 0 {
            if !data.is_empty() {
                return Err(ForestError::InvalidInput {
                    row: 0,
                    column: 0,
                    reason: "values given for zero features".to_string(),
                });
            }
            return Ok(Self::empty());
        }
        if data.len() % n_features != 0 {
            return Err(ForestError::InvalidInput {
                row: data.len() / n_features,
                column: data.len() % n_features,
                reason: format!("incomplete row for {} features", n_features),
            });
        }
        if let Some(position) = data.iter().position(|v| !v.is_finite()) {
            return Err(ForestError::InvalidInput {
                row: position / n_features,
                column: position % n_features,
                reason: format!("non-finite value {}", data[position]),
            });
        }
        Ok(Self {
            n_rows: data.len() / n_features,
            data,
            n_features,
        })
    }

    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            n_rows: 0,
            n_features: 0,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
    pub fn n_features(&self) -> usize {
        self.n_features
    }
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_features..(i + 1) * self.n_features]
    }

    #[inline]
    pub fn value(&self, i: usize, feature: usize) -> f64 {
        self.data[i * self.n_features + feature]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }
}

#[macro_export]
macro_rules! assert_eq_with_tol {
    ($left:expr, $right:expr, $tolerance:expr) => {
        let left = $left;
        let right = $right;
        let tolerance = $tolerance;

        if (left - right).abs() > tolerance {
            panic!(
                "assertion failed: `(left == right)` \
                \n   left: `{:?}`,\
                \n  right: `{:?}`,\
                \n  diff:  `{:?}`,\
                \n  max tolerance: `{:?}`",
                left,
                right,
                (left - right).abs(),
                tolerance
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let store = SampleStore::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(store.n_rows(), 2);
        assert_eq!(store.n_features(), 2);
        assert_eq!(store.row(1), &[3.0, 4.0]);
        assert_eq!(store.value(0, 1), 2.0);
        assert_eq!(store.rows().count(), 2);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = SampleStore::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, ForestError::InvalidInput { row: 1, .. }));
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = SampleStore::from_flat(vec![1.0, 2.0, f64::NAN, 4.0], 2).unwrap_err();
        assert!(matches!(
            err,
            ForestError::InvalidInput {
                row: 1,
                column: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_incomplete_flat_rejected() {
        assert!(SampleStore::from_flat(vec![1.0, 2.0, 3.0], 2).is_err());
    }

    #[test]
    fn test_empty() {
        let store = SampleStore::from_rows(Vec::new()).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.n_features(), 0);
    }
}
