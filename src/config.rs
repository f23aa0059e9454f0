//! # Configuration Management
//!
//! This module loads the measurement set and chart options from `gault-config.toml`.
//! When the file is absent the built-in 2025-01-31 soundings are used. A file that
//! exists but does not validate is an error: no artifacts are written from a
//! half-understood configuration.
//!
//! ## Example
//! ```toml
//! [observation]
//! date = "2025-01-31"
//! distance = [0, 10, 20]
//! ice = [33, nan, 31]     # nan marks a missing reading
//! slush = [41, nan, 38]
//! snow = [60, 23, 55]
//!
//! [layout]
//! zoom_start = 1
//! zoom_end = -1
//! buoy_index = -1
//! north_direction = "right"
//!
//! [output]
//! directory = "out"
//! ```

use crate::layout::{resolve_index, NorthDirection};
use crate::{measurements, GaultError, RawProfile};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_PATH: &str = "gault-config.toml";

/// Application configuration loaded from gault-config.toml
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// The soundings for one observation date
    pub observation: ObservationConfig,
    /// Chart annotations and image size
    pub layout: LayoutConfig,
    /// Where artifacts are written
    pub output: OutputConfig,
}

/// Raw measurements for a single date
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservationConfig {
    /// Observation date, either a TOML date or a `"YYYY-MM-DD"` string
    #[serde(deserialize_with = "toml_date::deserialize")]
    pub date: NaiveDate,
    /// Offsets along the transect in meters
    pub distance: Vec<f64>,
    /// Ice depth in centimeters, `nan` where missing
    #[serde(with = "nan_as_missing")]
    pub ice: Vec<Option<f64>>,
    /// Slush depth in centimeters, `nan` where missing
    #[serde(with = "nan_as_missing")]
    pub slush: Vec<Option<f64>>,
    /// Snow depth in centimeters, `nan` where missing
    #[serde(with = "nan_as_missing")]
    pub snow: Vec<Option<f64>>,
}

/// Chart annotation positions and image size
///
/// Indices count from the start of the series; negative values count from the
/// end (-1 is the last position).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// First gap marker
    pub zoom_start: i64,
    /// Second gap marker
    pub zoom_end: i64,
    /// Position of the buoy marker
    pub buoy_index: i64,
    /// Edge of the chart that faces north; no arrow when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub north_direction: Option<NorthDirection>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

/// Output locations
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory; the plot goes into its `plots/` subdirectory
    pub directory: PathBuf,
    /// Plot file name prefix, followed by `_<date>.svg`
    pub plot_prefix: String,
    /// Dataset snapshot file name
    pub dataset_file: String,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        ObservationConfig {
            date: measurements::DATE,
            distance: measurements::DISTANCE.to_vec(),
            ice: measurements::ICE.to_vec(),
            slush: measurements::SLUSH.to_vec(),
            snow: measurements::SNOW.to_vec(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            zoom_start: 7,
            zoom_end: -2,
            buoy_index: -3,
            north_direction: None,
            width: 640,
            height: 480,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("."),
            plot_prefix: "gault".to_string(),
            dataset_file: "gault.json".to_string(),
        }
    }
}

impl OutputConfig {
    /// `<directory>/plots`
    pub fn plot_dir(&self) -> PathBuf {
        self.directory.join("plots")
    }

    /// `<directory>/plots/<prefix>_<YYYY-MM-DD>.svg`
    pub fn plot_path(&self, iso_date: &str) -> PathBuf {
        self.plot_dir()
            .join(format!("{}_{}.svg", self.plot_prefix, iso_date))
    }

    /// `<directory>/<dataset_file>`
    pub fn dataset_path(&self) -> PathBuf {
        self.directory.join(&self.dataset_file)
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to the built-in measurements only if the file does not exist
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, GaultError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = Self::from_toml_str(&contents)?;
                info!(
                    "Loaded configuration from {} for {}",
                    path.display(),
                    config.observation.date
                );
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "No config file at {}, using built-in measurements for {}",
                    path.display(),
                    measurements::DATE
                );
                Ok(Self::default())
            }
            Err(e) => Err(GaultError::io(path, e)),
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, GaultError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| GaultError::config(format!("invalid config file: {}", e.message())))?;
        config.validate()?;
        Ok(config)
    }

    /// Save current configuration as TOML
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), GaultError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| GaultError::config(format!("cannot encode config: {e}")))?;
        fs::write(path, contents).map_err(|e| GaultError::io(path, e))?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// The configured soundings as a profile for derivation
    pub fn raw_profile(&self) -> RawProfile {
        RawProfile {
            distance: self.observation.distance.clone(),
            ice: self.observation.ice.clone(),
            slush: self.observation.slush.clone(),
            snow: self.observation.snow.clone(),
        }
    }

    /// Check lengths, numeric ranges, and annotation indices.
    pub fn validate(&self) -> Result<(), GaultError> {
        let obs = &self.observation;
        let n = obs.distance.len();
        if n == 0 {
            return Err(GaultError::config("distance series is empty"));
        }

        for (name, series) in [("ice", &obs.ice), ("slush", &obs.slush), ("snow", &obs.snow)] {
            if series.len() != n {
                return Err(GaultError::config(format!(
                    "{name} series has {} values but distance has {n}",
                    series.len()
                )));
            }
            if let Some(i) = series.iter().position(|v| v.is_some_and(|x| !x.is_finite())) {
                return Err(GaultError::config(format!("{name}[{i}] is not a number")));
            }
        }

        for (i, &d) in obs.distance.iter().enumerate() {
            if !d.is_finite() {
                return Err(GaultError::config(format!("distance[{i}] is not a number")));
            }
            if d < 0.0 {
                return Err(GaultError::config(format!("distance[{i}] = {d} is negative")));
            }
        }
        if let Some(i) = obs.distance.windows(2).position(|w| w[1] < w[0]) {
            return Err(GaultError::config(format!(
                "distance decreases at position {}",
                i + 1
            )));
        }

        let layout = &self.layout;
        resolve_index("zoom_start", layout.zoom_start, n)?;
        resolve_index("zoom_end", layout.zoom_end, n)?;
        resolve_index("buoy_index", layout.buoy_index, n)?;

        if layout.width == 0 || layout.height == 0 {
            return Err(GaultError::config("image width and height must be positive"));
        }

        Ok(())
    }
}

/// Accepts `date = 2025-01-31` as well as `date = "2025-01-31"`.
mod toml_date {
    use chrono::NaiveDate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use toml::value::Datetime;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        match toml::Value::deserialize(d)? {
            toml::Value::String(s) => s.trim().parse().map_err(D::Error::custom),
            toml::Value::Datetime(dt) => from_datetime(&dt).map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "expected a date, found {}",
                other.type_str()
            ))),
        }
    }

    fn from_datetime(dt: &Datetime) -> Result<NaiveDate, String> {
        match (dt.date, dt.time) {
            (Some(date), None) => NaiveDate::from_ymd_opt(
                i32::from(date.year),
                u32::from(date.month),
                u32::from(date.day),
            )
            .ok_or_else(|| format!("{dt} is not a calendar date")),
            _ => Err(format!("expected a date without a time of day, found {dt}")),
        }
    }
}

/// Missing readings are `nan` in TOML and `None` in memory.
mod nan_as_missing {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Option<f64>], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(values.iter().map(|v| v.unwrap_or(f64::NAN)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Option<f64>>, D::Error> {
        let raw = Vec::<f64>::deserialize(d)?;
        Ok(raw
            .into_iter()
            .map(|v| if v.is_nan() { None } else { Some(v) })
            .collect())
    }
}
