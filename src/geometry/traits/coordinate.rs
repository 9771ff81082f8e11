//! Coordinate scalar abstraction.
//!
//! This module contains the [`CoordinateScalar`] trait that unifies the
//! floating-point types accepted as input coordinates, together with the
//! error type reported when a coordinate cannot be carried into the f64
//! working representation used by the hull solver.

use std::fmt::Debug;
use std::iter::Sum;

use num_traits::Float;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error type for coordinate conversion failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoordinateConversionError {
    /// A coordinate is NaN or infinite.
    #[error("Non-finite coordinate at buffer index {coordinate_index}: {coordinate_value}")]
    NonFinite {
        /// Flat index of the offending coordinate in the input buffer.
        coordinate_index: usize,
        /// Display form of the offending value.
        coordinate_value: String,
    },
    /// A coordinate could not be represented as `f64`.
    #[error("Failed to convert coordinate at buffer index {coordinate_index} to f64")]
    ConversionFailed {
        /// Flat index of the offending coordinate in the input buffer.
        coordinate_index: usize,
    },
}

// =============================================================================
// COORDINATE SCALAR
// =============================================================================

/// Scalar types usable as input point coordinates.
///
/// Input buffers are generic over `T: CoordinateScalar` and converted to
/// `f64` once, at the boundary; all geometric predicates run on `f64`.
///
/// # Examples
///
/// ```
/// use delaunay_lift::geometry::traits::coordinate::CoordinateScalar;
///
/// fn within_tolerance<T: CoordinateScalar>(a: T, b: T) -> bool {
///     (a - b).abs() < T::default_tolerance()
/// }
///
/// assert!(within_tolerance(1.0_f64, 1.0 + 1e-16));
/// ```
pub trait CoordinateScalar: Float + Sum + Default + Debug + Copy + 'static {
    /// Returns the default comparison tolerance for this scalar type.
    ///
    /// - For `f32`: `1e-6` (appropriate for single precision)
    /// - For `f64`: `1e-15` (appropriate for double precision)
    fn default_tolerance() -> Self;

    /// Convert this scalar to the `f64` working representation.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateConversionError::ConversionFailed`] if the value
    /// cannot be represented as `f64`. `coordinate_index` identifies the
    /// position in the input buffer for diagnostics.
    fn to_working(self, coordinate_index: usize) -> Result<f64, CoordinateConversionError> {
        self.to_f64()
            .ok_or(CoordinateConversionError::ConversionFailed { coordinate_index })
    }
}

impl CoordinateScalar for f32 {
    fn default_tolerance() -> Self {
        1e-6
    }
}

impl CoordinateScalar for f64 {
    fn default_tolerance() -> Self {
        1e-15
    }
}
