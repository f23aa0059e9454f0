//! # Built-in Field Measurements
//!
//! Soundings from the Gault transect on 2025-01-31. They are used whenever no
//! configuration file is present.
//!
//! Positions 8 through 16 only have a snow reading; ice and slush are recorded as
//! not available there.

use crate::RawProfile;
use chrono::NaiveDate;

/// Marker for "no reading taken at this position"
const NA: Option<f64> = None;

/// Observation date of the built-in soundings
pub const DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 1, 31) {
    Some(date) => date,
    None => panic!("built-in observation date is not a calendar date"),
};

/// Offsets along the transect in meters
pub const DISTANCE: [f64; 19] = [
    0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 71.0, 71.4, 71.8, 72.2, 72.6, 73.0, 73.4, 73.8,
    74.2, 80.0, 90.0,
];

/// Depth to the top of the ice in centimeters
pub const ICE: [Option<f64>; 19] = [
    Some(33.0),
    Some(32.0),
    Some(31.0),
    Some(31.0),
    Some(33.0),
    Some(32.0),
    Some(31.0),
    Some(31.0),
    NA,
    NA,
    NA,
    NA,
    NA,
    NA,
    NA,
    NA,
    NA,
    Some(32.0),
    Some(31.0),
];

/// Depth to the top of the slush in centimeters
pub const SLUSH: [Option<f64>; 19] = [
    Some(41.0),
    Some(38.0),
    Some(38.0),
    Some(37.0),
    Some(37.0),
    Some(37.0),
    Some(36.0),
    Some(36.0),
    NA,
    NA,
    NA,
    NA,
    NA,
    NA,
    NA,
    NA,
    NA,
    Some(32.0),
    Some(36.0),
];

/// Depth to the snow surface in centimeters
pub const SNOW: [Option<f64>; 19] = [
    Some(60.0),
    Some(59.0),
    Some(55.0),
    Some(50.0),
    Some(54.0),
    Some(56.0),
    Some(52.0),
    Some(54.0),
    Some(23.0),
    Some(23.0),
    Some(21.0),
    Some(22.0),
    Some(23.0),
    Some(24.0),
    Some(24.0),
    Some(28.0),
    Some(20.0),
    Some(58.0),
    Some(55.0),
];

/// The built-in soundings as an owned profile.
pub fn profile() -> RawProfile {
    RawProfile {
        distance: DISTANCE.to_vec(),
        ice: ICE.to_vec(),
        slush: SLUSH.to_vec(),
        snow: SNOW.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_share_length() {
        let raw = profile();
        assert_eq!(raw.len(), 19);
        assert_eq!(raw.ice.len(), raw.len());
        assert_eq!(raw.slush.len(), raw.len());
        assert_eq!(raw.snow.len(), raw.len());
    }

    #[test]
    fn test_distance_is_non_decreasing() {
        assert!(DISTANCE.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_date_is_iso() {
        assert_eq!(DATE.to_string(), "2025-01-31");
    }

    #[test]
    fn test_snow_only_positions() {
        for i in 8..=16 {
            assert!(ICE[i].is_none());
            assert!(SLUSH[i].is_none());
            assert!(SNOW[i].is_some());
        }
    }
}
