//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the inclusive range `[min, max]`.
///
/// NaN values are mapped to `min`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    if value.is_nan() {
        return min;
    }

    value.max(min).min(max)
}

/// Return the arithmetic mean of the values, or `None` if there are none.
pub fn mean<T>(values: &[T]) -> Option<T>
where
    T: Float,
{
    if values.is_empty() {
        return None;
    }

    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);

    T::from(values.len()).map(|n| sum / n)
}

/// Returns true if the angle (in degrees, in the range [0, 360]) is within `tol_deg` of zero,
/// accounting for wrapping at 360 degrees.
pub fn is_near_zero_deg<T>(angle_deg: T, tol_deg: T) -> bool
where
    T: Float,
{
    let full = match T::from(360.0) {
        Some(f) => f,
        None => return false,
    };

    (angle_deg >= T::zero() && angle_deg <= tol_deg)
        || (angle_deg >= full - tol_deg && angle_deg <= full)
}
