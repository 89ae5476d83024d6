//! Mark aggregation and statistics engine.
//!
//! Everything under `calc` is a pure transformation of an in-memory
//! [`snapshot::Snapshot`]; nothing here does I/O or keeps state between calls.

pub mod aggregate;
pub mod anomaly;
pub mod error;
pub mod grading;
pub mod normalize;
pub mod ranking;
pub mod results;
pub mod snapshot;
pub mod stats;
pub mod summary;
pub mod weights;

pub use error::EngineError;

/// Half-up rounding to a whole number: `Int(x + 0.5)`.
pub fn round_whole(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    (x + 0.5).floor()
}

/// Half-up rounding to `decimals` places.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    round_whole(x * scale) / scale
}

/// Serde helper: report an internally precise value as a whole number.
pub(crate) fn serialize_whole<S>(x: &f64, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_f64(round_whole(*x))
}

/// Serde helper: report a value rounded to two decimals.
pub(crate) fn serialize_hundredths<S>(x: &f64, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_f64(round_to(*x, 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_whole_is_half_up() {
        assert_eq!(round_whole(37.5), 38.0);
        assert_eq!(round_whole(37.49), 37.0);
        assert_eq!(round_whole(-2.5), -2.0);
        assert_eq!(round_whole(f64::NAN), 0.0);
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to(-4.996, 2), -5.0);
        assert_eq!(round_to(2.346, 2), 2.35);
    }
}
