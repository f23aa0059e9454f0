//! # Labeled Thickness Dataset
//!
//! Bundles the three derived series with the coordinates they share (observation
//! date and distance along the transect) into one read-only value. The renderer
//! and the snapshot writer both consume it; nothing mutates it after assembly.
//!
//! ## Snapshot Format
//! The dataset is persisted as a self-describing JSON document laid out like a
//! gridded dataset dump:
//!
//! ```json
//! {
//!   "dims": { "time": 1, "distance": 19 },
//!   "coords": {
//!     "time":     { "dims": ["time"], "data": ["2025-01-31"], "attrs": { "type": "YYYY-MM-DD" } },
//!     "distance": { "dims": ["time", "distance"], "data": [[0.0, ...]], "attrs": { "units": "meters" } }
//!   },
//!   "data_vars": {
//!     "ice_thickness": {
//!       "name": "ice thickness",
//!       "dims": ["time", "distance"],
//!       "data": [[33.0, ...]],
//!       "attrs": { "description": "From base of the ice", "units": "centimeters", "_FillValue": null }
//!     },
//!     ...
//!   },
//!   "attrs": { "source": "gault-profile" }
//! }
//! ```
//!
//! The fill value convention is NaN; JSON cannot carry NaN, so it is written as `null`.

use crate::{GaultError, Thickness};
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

pub const DATE_TYPE: &str = "YYYY-MM-DD";
pub const DISTANCE_UNITS: &str = "meters";
pub const THICKNESS_UNITS: &str = "centimeters";
pub const DESCRIPTION: &str = "From base of the ice";

const TIME_DIM: &str = "time";
const DISTANCE_DIM: &str = "distance";

/// One of the three derived variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Variable {
    Ice,
    Slush,
    Snow,
}

impl Variable {
    pub const ALL: [Variable; 3] = [Variable::Ice, Variable::Slush, Variable::Snow];

    /// Key used in the snapshot's `data_vars`.
    pub fn key(self) -> &'static str {
        match self {
            Variable::Ice => "ice_thickness",
            Variable::Slush => "slush_thickness",
            Variable::Snow => "snow_thickness",
        }
    }

    /// Human-readable name.
    pub fn long_name(self) -> &'static str {
        match self {
            Variable::Ice => "ice thickness",
            Variable::Slush => "slush thickness",
            Variable::Snow => "snow thickness",
        }
    }
}

/// Derived thicknesses plus their shared coordinates.
///
/// Fields are private: once [`Dataset::assemble`] returns, the values can only be read.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    date: NaiveDate,
    distance: Vec<f64>,
    thickness: Thickness,
}

impl Dataset {
    /// Wrap derived series and coordinates into a dataset.
    ///
    /// All three series must match the distance length. Any non-finite value is
    /// replaced with zero so the result never carries NaN.
    pub fn assemble(
        date: NaiveDate,
        distance: Vec<f64>,
        thickness: Thickness,
    ) -> Result<Self, GaultError> {
        let n = distance.len();
        for var in Variable::ALL {
            let len = series(&thickness, var).len();
            if len != n {
                return Err(GaultError::config(format!(
                    "{} has {len} values but distance has {n}",
                    var.key()
                )));
            }
        }

        let finite = |v: Vec<f64>| -> Vec<f64> {
            v.into_iter()
                .map(|x| if x.is_finite() { x } else { 0.0 })
                .collect()
        };
        let thickness = Thickness {
            ice: finite(thickness.ice),
            slush: finite(thickness.slush),
            snow: finite(thickness.snow),
        };

        debug!("Assembled dataset for {date} with {n} positions");

        Ok(Dataset {
            date,
            distance,
            thickness,
        })
    }

    /// Observation date as `YYYY-MM-DD`.
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Distance coordinate in meters.
    pub fn distance(&self) -> &[f64] {
        &self.distance
    }

    pub fn thickness(&self) -> &Thickness {
        &self.thickness
    }

    pub fn variable(&self, var: Variable) -> &[f64] {
        series(&self.thickness, var)
    }

    pub fn len(&self) -> usize {
        self.distance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }

    /// Build the serializable snapshot.
    pub fn to_snapshot(&self) -> Snapshot {
        let row_dims = vec![TIME_DIM.to_string(), DISTANCE_DIM.to_string()];

        let data_vars = Variable::ALL
            .iter()
            .map(|&var| {
                (
                    var.key().to_string(),
                    DataVar {
                        name: var.long_name().to_string(),
                        dims: row_dims.clone(),
                        data: vec![self.variable(var).to_vec()],
                        attrs: VarAttrs {
                            description: DESCRIPTION.to_string(),
                            units: THICKNESS_UNITS.to_string(),
                            fill_value: None,
                        },
                    },
                )
            })
            .collect();

        Snapshot {
            dims: BTreeMap::from([
                (TIME_DIM.to_string(), 1),
                (DISTANCE_DIM.to_string(), self.len()),
            ]),
            coords: Coords {
                time: TimeCoord {
                    dims: vec![TIME_DIM.to_string()],
                    data: vec![self.date],
                    attrs: TimeAttrs {
                        kind: DATE_TYPE.to_string(),
                    },
                },
                distance: DistanceCoord {
                    dims: row_dims,
                    data: vec![self.distance.clone()],
                    attrs: UnitAttrs {
                        units: DISTANCE_UNITS.to_string(),
                    },
                },
            },
            data_vars,
            attrs: BTreeMap::from([("source".to_string(), env!("CARGO_PKG_NAME").to_string())]),
        }
    }

    /// Rebuild a dataset from a snapshot (first time step only).
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, GaultError> {
        let date = snapshot
            .coords
            .time
            .data
            .first()
            .copied()
            .ok_or_else(|| GaultError::config("snapshot has no time coordinate"))?;
        let distance = snapshot
            .coords
            .distance
            .data
            .into_iter()
            .next()
            .ok_or_else(|| GaultError::config("snapshot has no distance coordinate"))?;

        let mut data_vars = snapshot.data_vars;
        let mut take = |var: Variable| -> Result<Vec<f64>, GaultError> {
            data_vars
                .remove(var.key())
                .and_then(|dv| dv.data.into_iter().next())
                .ok_or_else(|| GaultError::config(format!("snapshot is missing {}", var.key())))
        };
        let thickness = Thickness {
            ice: take(Variable::Ice)?,
            slush: take(Variable::Slush)?,
            snow: take(Variable::Snow)?,
        };

        Self::assemble(date, distance, thickness)
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GaultError> {
        let path = path.as_ref();
        let data = serde_json::to_vec_pretty(&self.to_snapshot())?;
        fs::write(path, data).map_err(|e| GaultError::io(path, e))?;
        info!("Dataset written to {}", path.display());
        Ok(())
    }

    /// Read a snapshot written by [`Dataset::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GaultError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| GaultError::io(path, e))?;
        let snapshot: Snapshot = serde_json::from_slice(&data)?;
        Self::from_snapshot(snapshot)
    }
}

fn series(thickness: &Thickness, var: Variable) -> &[f64] {
    match var {
        Variable::Ice => &thickness.ice,
        Variable::Slush => &thickness.slush,
        Variable::Snow => &thickness.snow,
    }
}

/// Serialized form of a [`Dataset`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub dims: BTreeMap<String, usize>,
    pub coords: Coords,
    pub data_vars: BTreeMap<String, DataVar>,
    pub attrs: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Coords {
    pub time: TimeCoord,
    pub distance: DistanceCoord,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeCoord {
    pub dims: Vec<String>,
    pub data: Vec<NaiveDate>,
    pub attrs: TimeAttrs,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeAttrs {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistanceCoord {
    pub dims: Vec<String>,
    pub data: Vec<Vec<f64>>,
    pub attrs: UnitAttrs,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitAttrs {
    pub units: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataVar {
    pub name: String,
    pub dims: Vec<String>,
    pub data: Vec<Vec<f64>>,
    pub attrs: VarAttrs,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VarAttrs {
    pub description: String,
    pub units: String,
    /// Always `None` (NaN convention, written as `null`)
    #[serde(rename = "_FillValue")]
    pub fill_value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{measurements, thickness};
    use tempfile::NamedTempFile;

    fn sample_dataset() -> Dataset {
        let raw = measurements::profile();
        let t = thickness::derive(&raw).unwrap();
        Dataset::assemble(measurements::DATE, raw.distance, t).unwrap()
    }

    #[test]
    fn test_distance_coordinate_matches_input() {
        let ds = sample_dataset();
        assert_eq!(ds.distance(), &measurements::DISTANCE[..]);
        assert_eq!(ds.len(), measurements::DISTANCE.len());
    }

    #[test]
    fn test_non_finite_values_become_zero() {
        let t = Thickness {
            ice: vec![f64::NAN, 1.0],
            slush: vec![2.0, f64::INFINITY],
            snow: vec![3.0, 4.0],
        };
        let ds = Dataset::assemble(measurements::DATE, vec![0.0, 1.0], t).unwrap();
        assert_eq!(ds.variable(Variable::Ice), &[0.0, 1.0]);
        assert_eq!(ds.variable(Variable::Slush), &[2.0, 0.0]);
    }

    #[test]
    fn test_assemble_rejects_length_mismatch() {
        let t = Thickness {
            ice: vec![1.0],
            slush: vec![1.0, 2.0],
            snow: vec![1.0, 2.0],
        };
        let err = Dataset::assemble(measurements::DATE, vec![0.0, 1.0], t).unwrap_err();
        assert!(matches!(err, GaultError::Config(_)));
    }

    #[test]
    fn test_snapshot_is_self_describing() {
        let json = serde_json::to_value(sample_dataset().to_snapshot()).unwrap();

        assert_eq!(json["coords"]["time"]["data"][0], "2025-01-31");
        assert_eq!(json["coords"]["time"]["attrs"]["type"], "YYYY-MM-DD");
        assert_eq!(json["coords"]["distance"]["attrs"]["units"], "meters");
        assert_eq!(json["dims"]["distance"], 19);

        for key in ["ice_thickness", "slush_thickness", "snow_thickness"] {
            let var = &json["data_vars"][key];
            assert_eq!(var["attrs"]["units"], "centimeters");
            assert_eq!(var["attrs"]["description"], "From base of the ice");
            assert!(var["attrs"]["_FillValue"].is_null());
            assert_eq!(var["data"][0].as_array().unwrap().len(), 19);
        }
        assert_eq!(json["data_vars"]["snow_thickness"]["data"][0][8], 23.0);
    }

    #[test]
    fn test_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let ds = sample_dataset();

        ds.save(temp_file.path()).unwrap();
        let loaded = Dataset::load(temp_file.path()).unwrap();

        assert_eq!(loaded, ds);
    }

    #[test]
    fn test_load_missing_variable_fails() {
        let mut snapshot = sample_dataset().to_snapshot();
        snapshot.data_vars.remove("slush_thickness");
        let err = Dataset::from_snapshot(snapshot).unwrap_err();
        assert!(err.to_string().contains("slush_thickness"));
    }

    #[test]
    fn test_save_under_regular_file_is_io_error() {
        let blocker = NamedTempFile::new().unwrap();
        let path = blocker.path().join("gault.json");

        let err = sample_dataset().save(&path).unwrap_err();

        match err {
            GaultError::Io { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Dataset::load("/nonexistent/gault.json").unwrap_err();
        assert!(matches!(err, GaultError::Io { .. }));
    }
}
