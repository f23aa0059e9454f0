//! # Thickness Derivation
//!
//! Converts the three raw depth series into non-overlapping layer thicknesses.
//! Every depth is measured from the base of the ice, so each layer is the
//! difference between its own depth and the depth of the layer beneath it:
//!
//! ```text
//! ice   = ice_depth
//! slush = slush_depth - ice_depth
//! snow  = snow_depth  - (slush_depth, else ice_depth, else 0)
//! ```
//!
//! Missing readings count as zero depth before any subtraction. A position with
//! ice but no slush therefore yields a negative slush thickness; it is kept as-is.

use crate::{GaultError, RawProfile, Thickness};
use log::debug;

/// Derive ice, slush and snow thickness for every position of `raw`.
///
/// Fails with [`GaultError::Config`] when any raw series differs in length from
/// the distance series; series are never truncated or padded.
///
/// # Example
/// ```
/// use gault_lib::{measurements, thickness};
///
/// let t = thickness::derive(&measurements::profile()).unwrap();
/// assert_eq!(t.ice[0], 33.0);
/// assert_eq!(t.slush[0], 8.0);
/// assert_eq!(t.snow[0], 19.0);
/// ```
pub fn derive(raw: &RawProfile) -> Result<Thickness, GaultError> {
    check_lengths(raw)?;

    let depth = |v: Option<f64>| v.unwrap_or(0.0);

    let ice: Vec<f64> = raw.ice.iter().map(|&v| depth(v)).collect();

    let slush: Vec<f64> = raw
        .slush
        .iter()
        .zip(&raw.ice)
        .map(|(&s, &i)| depth(s) - depth(i))
        .collect();

    let snow: Vec<f64> = raw
        .snow
        .iter()
        .zip(raw.slush.iter().zip(&raw.ice))
        .map(|(&snow, (&slush, &ice))| depth(snow) - depth(slush.or(ice)))
        .collect();

    debug!("Derived thickness for {} positions", ice.len());

    Ok(Thickness { ice, slush, snow })
}

fn check_lengths(raw: &RawProfile) -> Result<(), GaultError> {
    let n = raw.distance.len();
    for (name, len) in [
        ("ice", raw.ice.len()),
        ("slush", raw.slush.len()),
        ("snow", raw.snow.len()),
    ] {
        if len != n {
            return Err(GaultError::config(format!(
                "{name} series has {len} values but distance has {n}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurements;

    fn single(ice: Option<f64>, slush: Option<f64>, snow: Option<f64>) -> RawProfile {
        RawProfile {
            distance: vec![0.0],
            ice: vec![ice],
            slush: vec![slush],
            snow: vec![snow],
        }
    }

    #[test]
    fn test_first_position_of_sample() {
        let t = derive(&measurements::profile()).unwrap();
        assert_eq!(t.ice[0], 33.0);
        assert_eq!(t.slush[0], 8.0);
        assert_eq!(t.snow[0], 19.0);
    }

    #[test]
    fn test_position_without_ice_or_slush() {
        let t = derive(&measurements::profile()).unwrap();
        assert_eq!(t.ice[8], 0.0);
        assert_eq!(t.slush[8], 0.0);
        assert_eq!(t.snow[8], 23.0);
    }

    #[test]
    fn test_lengths_follow_input() {
        let raw = measurements::profile();
        let t = derive(&raw).unwrap();
        assert_eq!(t.len(), raw.len());
        assert_eq!(t.slush.len(), raw.len());
        assert_eq!(t.snow.len(), raw.len());
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let raw = measurements::profile();
        assert_eq!(derive(&raw).unwrap(), derive(&raw).unwrap());
    }

    #[test]
    fn test_missing_slush_with_ice_goes_negative() {
        let t = derive(&single(Some(30.0), None, Some(50.0))).unwrap();
        assert_eq!(t.slush[0], -30.0);
        // Snow falls back to the ice depth as its reference.
        assert_eq!(t.snow[0], 20.0);
    }

    #[test]
    fn test_missing_snow_counts_as_zero() {
        let t = derive(&single(Some(30.0), Some(35.0), None)).unwrap();
        assert_eq!(t.snow[0], -35.0);
        assert!(t.snow[0].is_finite());
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        let mut raw = measurements::profile();
        raw.slush.pop();
        let err = derive(&raw).unwrap_err();
        assert!(matches!(err, GaultError::Config(_)));
        assert!(err.to_string().contains("slush"));
    }

    #[test]
    fn test_short_distance_fails() {
        let mut raw = measurements::profile();
        raw.distance.truncate(5);
        assert!(matches!(derive(&raw), Err(GaultError::Config(_))));
    }

    #[test]
    fn test_total_is_full_column() {
        let t = derive(&measurements::profile()).unwrap();
        assert_eq!(t.total(0), 60.0);
        assert_eq!(t.total(8), 23.0);
        // Column height equals the snow depth reading wherever snow was measured.
        let raw = measurements::profile();
        for (i, snow) in raw.snow.iter().enumerate() {
            assert_eq!(Some(t.total(i)), *snow);
        }
    }

    #[test]
    fn test_sample_output_is_finite() {
        let t = derive(&measurements::profile()).unwrap();
        assert!(t
            .ice
            .iter()
            .chain(&t.slush)
            .chain(&t.snow)
            .all(|v| v.is_finite()));
    }
}
