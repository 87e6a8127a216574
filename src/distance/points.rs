//! Immutable point sets.
//!
//! A [`PointSet`] is the private copy of the n×d input matrix that every
//! distance operator owns. Values are stored column-major so that all values
//! of one feature are contiguous, which is the access pattern of both fast
//! query kernels.

use crate::error::{DistMatError, DistMatErrorKind};
use faer::MatRef;

/// An n×d set of points, n ≥ 1 and d ≥ 1, never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    /// Column-major values: feature `i` of point `k` lives at `i * n + k`.
    data: Vec<f64>,
    n: usize,
    d: usize,
}

impl PointSet {
    /// Builds a point set from a sequence of rows, one row per point.
    ///
    /// # Errors
    /// [`DistMatErrorKind::InvalidPoints`] if there are no rows, the rows
    /// have no features, or the rows do not all have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, DistMatError> {
        let n = rows.len();
        if n == 0 {
            return Err(invalid("the point set has no points"));
        }
        let d = rows[0].as_ref().len();
        if d == 0 {
            return Err(invalid("points must have at least one feature"));
        }
        if let Some((k, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.as_ref().len() != d)
        {
            return Err(invalid(&format!(
                "point {k} has {} features, expected {d}",
                row.as_ref().len()
            )));
        }

        let mut data = vec![0.0; n * d];
        for (k, row) in rows.iter().enumerate() {
            for (i, &value) in row.as_ref().iter().enumerate() {
                data[i * n + k] = value;
            }
        }
        Ok(Self { data, n, d })
    }

    /// Copies a dense `faer` matrix, one point per row.
    pub fn from_mat(points: MatRef<'_, f64>) -> Result<Self, DistMatError> {
        let (n, d) = (points.nrows(), points.ncols());
        if n == 0 || d == 0 {
            return Err(invalid(&format!("expected a non-empty matrix, got {n}x{d}")));
        }
        let mut data = Vec::with_capacity(n * d);
        for i in 0..d {
            for k in 0..n {
                data.push(points[(k, i)]);
            }
        }
        Ok(Self { data, n, d })
    }

    /// Number of points.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.n
    }

    /// Number of features per point.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.d
    }

    /// Feature `i` of point `k`.
    #[inline]
    pub fn value(&self, k: usize, i: usize) -> f64 {
        self.data[i * self.n + k]
    }

    /// All values of feature `i`, indexed by point.
    #[inline]
    pub fn feature(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// The whole column-major buffer.
    #[inline]
    pub(crate) fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// A zero-copy `faer` view of the points (n×d).
    pub fn as_mat(&self) -> MatRef<'_, f64> {
        MatRef::from_column_major_slice(&self.data, self.n, self.d)
    }
}

fn invalid(reason: &str) -> DistMatError {
    DistMatErrorKind::InvalidPoints(reason.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn test_from_rows_is_column_major() {
        let points = PointSet::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
        assert_eq!(points.nrows(), 3);
        assert_eq!(points.ncols(), 2);
        assert_eq!(points.feature(0), &[1.0, 3.0, 5.0]);
        assert_eq!(points.feature(1), &[2.0, 4.0, 6.0]);
        assert_eq!(points.value(2, 1), 6.0);
        assert_eq!(points.as_mat()[(1, 0)], 3.0);
    }

    #[test]
    fn test_from_mat_matches_from_rows() {
        let m = mat![[0.5, -1.0], [2.0, 7.0]];
        let from_mat = PointSet::from_mat(m.as_ref()).unwrap();
        let from_rows = PointSet::from_rows(&[vec![0.5, -1.0], vec![2.0, 7.0]]).unwrap();
        assert_eq!(from_mat, from_rows);
    }

    #[test]
    fn test_invalid_point_sets_are_rejected() {
        let empty: [[f64; 2]; 0] = [];
        assert!(PointSet::from_rows(&empty).is_err());

        let featureless: [[f64; 0]; 2] = [[], []];
        assert!(PointSet::from_rows(&featureless).is_err());

        let ragged = PointSet::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            ragged.kind(),
            &DistMatErrorKind::InvalidPoints("point 1 has 1 features, expected 2".to_string())
        );
    }
}
