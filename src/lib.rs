//! # Gault Transect Profile Library
//!
//! This library derives layer thicknesses (ice, slush, snow) from raw depth soundings
//! taken along a lake transect and renders them as a single stacked profile.
//!
//! ## Data Flow
//! 1. **Load**: read `gault-config.toml`, or fall back to the compiled-in
//!    [`measurements`] for 2025-01-31
//! 2. **Derive**: [`thickness::derive`] turns raw depths into non-overlapping thicknesses
//! 3. **Assemble**: [`dataset::Dataset`] wraps the thicknesses with date and distance metadata
//! 4. **Layout**: [`layout::ChartLayout`] computes bounds, ticks, buoy and gap markers
//! 5. **Render**: [`renderer::render_chart`] drives any [`canvas::Canvas`]
//! 6. **Emit**: an SVG profile under `plots/` and a JSON snapshot of the dataset
//!
//! ## Missing Readings
//! Raw depths are `Option<f64>`. A `None` means no reading was taken at that
//! position. Derived thicknesses are plain `f64`: a missing input counts as
//! zero depth, so nothing non-finite reaches the renderer or the snapshot.
//!
//! ## Core Types
//! - [`RawProfile`]: the four raw series for one observation date
//! - [`Thickness`]: the three derived series

// Module declarations
pub mod canvas;
pub mod config;
pub mod dataset;
pub mod error;
pub mod layout;
pub mod measurements;
pub mod renderer;
pub mod thickness;

pub use error::GaultError;

/// Raw soundings for one observation date, aligned by position.
///
/// Depths are in centimeters measured from the base of the ice; distances are
/// meters along the transect. All four vectors are expected to share one length,
/// which [`thickness::derive`] enforces.
///
/// # Example
/// ```
/// use gault_lib::RawProfile;
///
/// let raw = RawProfile {
///     distance: vec![0.0, 10.0],
///     ice: vec![Some(33.0), None],
///     slush: vec![Some(41.0), None],
///     snow: vec![Some(60.0), Some(23.0)],
/// };
///
/// assert_eq!(raw.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RawProfile {
    /// Offset along the transect in meters
    pub distance: Vec<f64>,
    /// Depth to the top of the ice in centimeters
    pub ice: Vec<Option<f64>>,
    /// Depth to the top of the slush in centimeters
    pub slush: Vec<Option<f64>>,
    /// Depth to the snow surface in centimeters
    pub snow: Vec<Option<f64>>,
}

impl RawProfile {
    /// Number of sounding positions (taken from the distance series).
    pub fn len(&self) -> usize {
        self.distance.len()
    }

    /// Whether the profile has no positions at all.
    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }
}

/// Derived layer thicknesses in centimeters.
///
/// Every element is a plain number; missing soundings were already replaced
/// with zero during derivation.
#[derive(Clone, Debug, PartialEq)]
pub struct Thickness {
    /// Solid ice layer
    pub ice: Vec<f64>,
    /// Slush layer above the ice
    pub slush: Vec<f64>,
    /// Dry snow above the slush (or ice)
    pub snow: Vec<f64>,
}

impl Thickness {
    pub fn len(&self) -> usize {
        self.ice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ice.is_empty()
    }

    /// Full column height (snow + slush + ice) at `index`.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn total(&self, index: usize) -> f64 {
        self.snow[index] + self.slush[index] + self.ice[index]
    }
}
