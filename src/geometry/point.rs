//! Validated point storage.
//!
//! Input points arrive as a flat row-major buffer (`n_points * dims` reals).
//! [`PointBuffer`] owns the f64 working copy of that buffer and is the only
//! place coordinate validation happens: every downstream consumer may assume
//! finite coordinates and consistent row lengths.

use thiserror::Error;

use crate::geometry::traits::coordinate::{CoordinateConversionError, CoordinateScalar};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for point buffer construction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PointBufferError {
    /// The buffer length does not match `n_points * dims`.
    #[error(
        "Point buffer length mismatch: expected {expected} ({n_points} points x {dims} coordinates), got {actual}"
    )]
    LengthMismatch {
        /// Expected flat length.
        expected: usize,
        /// Actual flat length.
        actual: usize,
        /// Declared number of points.
        n_points: usize,
        /// Declared dimension.
        dims: usize,
    },
    /// The declared dimension is zero.
    #[error("Point dimension must be at least 1")]
    ZeroDimension,
    /// A coordinate failed validation or conversion.
    #[error(transparent)]
    InvalidCoordinate(#[from] CoordinateConversionError),
}

// =============================================================================
// POINT BUFFER
// =============================================================================

/// A validated, row-major set of d-dimensional points.
///
/// Construction converts the caller's scalar type to `f64` and rejects
/// NaN/infinite coordinates; the buffer is read-only afterwards.
///
/// # Examples
///
/// ```
/// use delaunay_lift::geometry::point::PointBuffer;
///
/// let square = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
/// let points = PointBuffer::from_flat(&square, 4, 2).unwrap();
/// assert_eq!(points.n_points(), 4);
/// assert_eq!(points.row(3), &[1.0, 1.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PointBuffer {
    coords: Vec<f64>,
    n_points: usize,
    dims: usize,
}

impl PointBuffer {
    /// Build a point buffer from a flat row-major slice.
    ///
    /// # Errors
    ///
    /// - [`PointBufferError::ZeroDimension`] if `dims == 0`.
    /// - [`PointBufferError::LengthMismatch`] if `data.len() != n_points * dims`.
    /// - [`PointBufferError::InvalidCoordinate`] if any coordinate is NaN,
    ///   infinite, or not representable as `f64`.
    pub fn from_flat<T: CoordinateScalar>(
        data: &[T],
        n_points: usize,
        dims: usize,
    ) -> Result<Self, PointBufferError> {
        if dims == 0 {
            return Err(PointBufferError::ZeroDimension);
        }
        let expected = n_points
            .checked_mul(dims)
            .ok_or(PointBufferError::LengthMismatch {
                expected: usize::MAX,
                actual: data.len(),
                n_points,
                dims,
            })?;
        if data.len() != expected {
            return Err(PointBufferError::LengthMismatch {
                expected,
                actual: data.len(),
                n_points,
                dims,
            });
        }

        let mut coords = Vec::with_capacity(expected);
        for (index, &value) in data.iter().enumerate() {
            let v = value.to_working(index)?;
            if !v.is_finite() {
                return Err(CoordinateConversionError::NonFinite {
                    coordinate_index: index,
                    coordinate_value: format!("{v}"),
                }
                .into());
            }
            coords.push(v);
        }

        Ok(Self {
            coords,
            n_points,
            dims,
        })
    }

    /// Number of points in the buffer.
    #[must_use]
    pub const fn n_points(&self) -> usize {
        self.n_points
    }

    /// Coordinate dimension of each point.
    #[must_use]
    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// Coordinates of point `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_points`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.coords[i * self.dims..(i + 1) * self.dims]
    }

    /// Iterator over point rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.coords.chunks_exact(self.dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flat_accepts_valid_square() {
        let data = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let buffer = PointBuffer::from_flat(&data, 4, 2).unwrap();
        assert_eq!(buffer.dims(), 2);
        assert_eq!(buffer.rows().count(), 4);
        assert_eq!(buffer.row(1), &[1.0, 0.0]);
    }

    #[test]
    fn from_flat_rejects_length_mismatch() {
        let data = [0.0, 0.0, 1.0];
        let err = PointBuffer::from_flat(&data, 2, 2).unwrap_err();
        assert!(matches!(
            err,
            PointBufferError::LengthMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn from_flat_rejects_zero_dimension() {
        let data: [f64; 0] = [];
        assert!(matches!(
            PointBuffer::from_flat(&data, 0, 0),
            Err(PointBufferError::ZeroDimension)
        ));
    }

    #[test]
    fn from_flat_rejects_nan() {
        let data = [0.0, f64::NAN, 1.0, 0.0];
        let err = PointBuffer::from_flat(&data, 2, 2).unwrap_err();
        assert!(matches!(
            err,
            PointBufferError::InvalidCoordinate(CoordinateConversionError::NonFinite {
                coordinate_index: 1,
                ..
            })
        ));
    }

    #[test]
    fn from_flat_rejects_infinity() {
        let data = [0.0, 0.0, f64::INFINITY, 0.0];
        assert!(PointBuffer::from_flat(&data, 2, 2).is_err());
    }

    #[test]
    fn from_flat_converts_f32() {
        let data = [0.5_f32, 0.25, -0.5, 1.0];
        let buffer = PointBuffer::from_flat(&data, 2, 2).unwrap();
        assert_eq!(buffer.row(0), &[0.5, 0.25]);
    }
}
