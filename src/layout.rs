//! # Chart Layout
//!
//! Pure geometry for the stacked profile: axis bounds, ticks, layer outlines,
//! buoy ellipse, gap markers and the compass arrow. Nothing here draws; the
//! renderer hands the result to a [`Canvas`](crate::canvas::Canvas).
//!
//! ## Coordinates
//! - **x**: array position (0..N-1). Physical distances only appear as tick labels.
//! - **y**: centimeters. The baseline is 0 and layers stack downward as negative
//!   offsets: snow from 0 to `-snow`, then slush, then ice underneath.
//!
//! ## Bounds
//! ```text
//! y_min = min(-(snow + slush + ice)) - 5
//! y_max = +3
//! ```
//!
//! ## Buoy Aspect Correction
//! The buoy is an ellipse in data space sized so it renders as a circle:
//! ```text
//! aspect   = ((-min_stack + 8) / x_max) / (plot_height_px / plot_width_px)
//! height   = width * aspect
//! ```

use crate::canvas::Tick;
use crate::config::LayoutConfig;
use crate::dataset::{Dataset, Variable};
use crate::GaultError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Space kept above the baseline for the buoy
pub const TOP_MARGIN: f64 = 3.0;
/// Space kept below the deepest layer
pub const BOTTOM_MARGIN: f64 = 5.0;
/// Buoy centre height above the baseline
pub const BUOY_HEIGHT: f64 = 1.0;
/// Buoy width in x units (array positions)
pub const BUOY_WIDTH: f64 = 0.5;
/// Spacing of the y ticks in centimeters
pub const Y_TICK_STEP: f64 = 10.0;
/// Every n-th position gets a distance label
pub const X_TICK_EVERY: usize = 2;

/// Which edge of the chart faces north.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NorthDirection {
    Top,
    Bottom,
    Left,
    Right,
}

impl NorthDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            NorthDirection::Top => "top",
            NorthDirection::Bottom => "bottom",
            NorthDirection::Left => "left",
            NorthDirection::Right => "right",
        }
    }
}

impl FromStr for NorthDirection {
    type Err = GaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(NorthDirection::Top),
            "bottom" => Ok(NorthDirection::Bottom),
            "left" => Ok(NorthDirection::Left),
            "right" => Ok(NorthDirection::Right),
            _ => Err(GaultError::config(format!(
                "unknown north direction `{s}` (expected top, bottom, left or right)"
            ))),
        }
    }
}

impl TryFrom<String> for NorthDirection {
    type Error = GaultError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NorthDirection> for String {
    fn from(value: NorthDirection) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NorthDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Annotation positions, indices may be negative (counted from the end).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
    pub zoom_start: i64,
    pub zoom_end: i64,
    pub buoy_index: i64,
    pub north_direction: Option<NorthDirection>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        (&LayoutConfig::default()).into()
    }
}

impl From<&LayoutConfig> for LayoutOptions {
    fn from(config: &LayoutConfig) -> Self {
        LayoutOptions {
            zoom_start: config.zoom_start,
            zoom_end: config.zoom_end,
            buoy_index: config.buoy_index,
            north_direction: config.north_direction,
        }
    }
}

/// Resolve a possibly negative index against a series of `len` positions.
///
/// `-1` is the last position. Anything outside `-len..len` is a configuration error.
pub fn resolve_index(name: &str, index: i64, len: usize) -> Result<usize, GaultError> {
    let n = len as i64;
    let resolved = if index < 0 { n + index } else { index };
    if (0..n).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err(GaultError::config(format!(
            "{name} = {index} is out of range for {len} positions"
        )))
    }
}

/// Aspect factor that turns a data-space circle of width `w` into height `w * aspect`.
pub fn aspect_ratio(min_stack: f64, x_max: f64, plot_area: (u32, u32)) -> f64 {
    let (width_px, height_px) = plot_area;
    let y_span = -min_stack + BOTTOM_MARGIN + TOP_MARGIN;
    let x_span = if x_max > 0.0 { x_max } else { 1.0 };
    let pixel_ratio = height_px.max(1) as f64 / width_px.max(1) as f64;
    (y_span / x_span) / pixel_ratio
}

/// Tick label for a distance in meters (`10`, `71.4`).
pub fn format_distance(meters: f64) -> String {
    format!("{meters}")
}

/// One filled layer between two outlines with the same x positions.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerBand {
    pub variable: Variable,
    pub upper: Vec<(f64, f64)>,
    pub lower: Vec<(f64, f64)>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuoyMarker {
    pub index: usize,
    pub center: (f64, f64),
    pub width: f64,
    pub height: f64,
}

/// Vertical dotted marker from the snow surface to the bottom of the chart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GapMarker {
    pub index: usize,
    pub x: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompassArrow {
    pub direction: NorthDirection,
    pub tail: (f64, f64),
    pub head: (f64, f64),
    pub label_at: (f64, f64),
}

/// Everything needed to draw the profile, in data coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartLayout {
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
    /// Drawn in order: snow, slush, ice
    pub layers: Vec<LayerBand>,
    pub buoy: BuoyMarker,
    pub gaps: [GapMarker; 2],
    pub compass: Option<CompassArrow>,
}

impl ChartLayout {
    /// Lay out `dataset` for a plotting area of `plot_area` = (width, height) pixels.
    ///
    /// Index options are resolved here, so an invalid index fails before any drawing.
    pub fn compute(
        dataset: &Dataset,
        options: &LayoutOptions,
        plot_area: (u32, u32),
    ) -> Result<Self, GaultError> {
        let n = dataset.len();
        if n == 0 {
            return Err(GaultError::config("cannot lay out an empty dataset"));
        }
        let buoy_index = resolve_index("buoy_index", options.buoy_index, n)?;
        let zoom_start = resolve_index("zoom_start", options.zoom_start, n)?;
        let zoom_end = resolve_index("zoom_end", options.zoom_end, n)?;

        let t = dataset.thickness();
        let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();

        // Outlines: 0 -> -snow -> -(snow+slush) -> -(snow+slush+ice)
        let snow_bottom: Vec<f64> = t.snow.iter().map(|s| -s).collect();
        let slush_bottom: Vec<f64> = snow_bottom
            .iter()
            .zip(&t.slush)
            .map(|(b, s)| b - s)
            .collect();
        let ice_bottom: Vec<f64> = (0..n).map(|i| -t.total(i)).collect();

        let min_stack = ice_bottom
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(f64::INFINITY, f64::min);
        let min_stack = if min_stack.is_finite() { min_stack } else { 0.0 };

        let x_max = if n > 1 { (n - 1) as f64 } else { 1.0 };
        let x_range = (0.0, x_max);
        let y_range = (min_stack - BOTTOM_MARGIN, TOP_MARGIN);

        let outline = |ys: &[f64]| -> Vec<(f64, f64)> {
            xs.iter().copied().zip(ys.iter().copied()).collect()
        };
        let baseline = vec![0.0; n];
        let layers = vec![
            LayerBand {
                variable: Variable::Snow,
                upper: outline(&baseline),
                lower: outline(&snow_bottom),
            },
            LayerBand {
                variable: Variable::Slush,
                upper: outline(&snow_bottom),
                lower: outline(&slush_bottom),
            },
            LayerBand {
                variable: Variable::Ice,
                upper: outline(&slush_bottom),
                lower: outline(&ice_bottom),
            },
        ];

        let aspect = aspect_ratio(min_stack, x_max, plot_area);
        let buoy = BuoyMarker {
            index: buoy_index,
            center: (buoy_index as f64, BUOY_HEIGHT),
            width: BUOY_WIDTH,
            height: BUOY_WIDTH * aspect,
        };

        let gap = |index: usize| GapMarker {
            index,
            x: index as f64,
            top: snow_bottom[index],
            bottom: y_range.0,
        };
        let gaps = [gap(zoom_start), gap(zoom_end)];

        let x_ticks = dataset
            .distance()
            .iter()
            .enumerate()
            .step_by(X_TICK_EVERY)
            .map(|(i, &d)| Tick {
                position: i as f64,
                label: format_distance(d),
            })
            .collect();

        let compass = options
            .north_direction
            .map(|direction| compass_arrow(direction, x_range, y_range));

        Ok(ChartLayout {
            title: dataset.iso_date(),
            x_label: "Distance [m]",
            y_label: "Thickness [cm]",
            x_range,
            y_range,
            x_ticks,
            y_ticks: y_ticks(y_range),
            layers,
            buoy,
            gaps,
            compass,
        })
    }
}

/// Multiples of [`Y_TICK_STEP`] inside `range`.
fn y_ticks(range: (f64, f64)) -> Vec<Tick> {
    let first = (range.0 / Y_TICK_STEP).ceil() as i64;
    let last = (range.1 / Y_TICK_STEP).floor() as i64;
    (first..=last)
        .map(|k| {
            let position = k as f64 * Y_TICK_STEP;
            Tick {
                position,
                label: format!("{position:.0}"),
            }
        })
        .collect()
}

/// Arrow in the upper right corner of the axes pointing toward the north edge.
fn compass_arrow(direction: NorthDirection, x: (f64, f64), y: (f64, f64)) -> CompassArrow {
    // Axes fractions: (tail, head, label)
    let (tail, head, label) = match direction {
        NorthDirection::Top => ((0.92, 0.62), (0.92, 0.82), (0.92, 0.90)),
        NorthDirection::Bottom => ((0.92, 0.82), (0.92, 0.62), (0.92, 0.54)),
        NorthDirection::Left => ((0.94, 0.72), (0.84, 0.72), (0.80, 0.72)),
        NorthDirection::Right => ((0.84, 0.72), (0.94, 0.72), (0.98, 0.72)),
    };
    let at = |(fx, fy): (f64, f64)| (x.0 + fx * (x.1 - x.0), y.0 + fy * (y.1 - y.0));
    CompassArrow {
        direction,
        tail: at(tail),
        head: at(head),
        label_at: at(label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{measurements, thickness, Thickness};

    const AREA: (u32, u32) = (470, 385);

    fn sample_dataset() -> Dataset {
        let raw = measurements::profile();
        let t = thickness::derive(&raw).unwrap();
        Dataset::assemble(measurements::DATE, raw.distance, t).unwrap()
    }

    fn sample_layout(options: LayoutOptions) -> ChartLayout {
        ChartLayout::compute(&sample_dataset(), &options, AREA).unwrap()
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index("i", 0, 19).unwrap(), 0);
        assert_eq!(resolve_index("i", 7, 19).unwrap(), 7);
        assert_eq!(resolve_index("i", -1, 19).unwrap(), 18);
        assert_eq!(resolve_index("i", -3, 19).unwrap(), 16);
        assert!(resolve_index("i", 19, 19).is_err());
        assert!(resolve_index("i", -20, 19).is_err());
    }

    #[test]
    fn test_parse_north_direction() {
        assert_eq!("top".parse::<NorthDirection>().unwrap(), NorthDirection::Top);
        assert_eq!(" Right ".parse::<NorthDirection>().unwrap(), NorthDirection::Right);
        assert_eq!("BOTTOM".parse::<NorthDirection>().unwrap(), NorthDirection::Bottom);
        let err = "north-east".parse::<NorthDirection>().unwrap_err();
        assert!(matches!(err, GaultError::Config(_)));
    }

    #[test]
    fn test_axis_bounds() {
        let layout = sample_layout(LayoutOptions::default());
        // Deepest column is the 60 cm snow depth at position 0.
        assert_eq!(layout.y_range, (-65.0, 3.0));
        assert_eq!(layout.x_range, (0.0, 18.0));
    }

    #[test]
    fn test_buoy_is_aspect_corrected() {
        let layout = sample_layout(LayoutOptions::default());
        let expected = (68.0 / 18.0) / (385.0 / 470.0);

        assert_eq!(layout.buoy.index, 16);
        assert_eq!(layout.buoy.center, (16.0, 1.0));
        assert_eq!(layout.buoy.width, 0.5);
        assert!((layout.buoy.height - 0.5 * expected).abs() < 1e-9);
    }

    #[test]
    fn test_aspect_ratio_follows_pixel_shape() {
        let wide = aspect_ratio(-60.0, 18.0, (800, 400));
        let tall = aspect_ratio(-60.0, 18.0, (400, 800));
        assert!((wide / tall - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_gap_markers() {
        let layout = sample_layout(LayoutOptions::default());
        let [start, end] = layout.gaps;

        assert_eq!(start.index, 7);
        assert_eq!(start.top, -18.0);
        assert_eq!(start.bottom, -65.0);
        assert_eq!(end.index, 17);
        assert_eq!(end.top, -26.0);
    }

    #[test]
    fn test_x_ticks_use_physical_distance() {
        let layout = sample_layout(LayoutOptions::default());
        let labels: Vec<&str> = layout.x_ticks.iter().map(|t| t.label.as_str()).collect();

        assert_eq!(layout.x_ticks.len(), 10);
        assert_eq!(labels[0], "0");
        assert_eq!(labels[1], "20");
        assert_eq!(labels[5], "71.8");
        assert_eq!(layout.x_ticks[5].position, 10.0);
    }

    #[test]
    fn test_y_ticks_inside_range() {
        let layout = sample_layout(LayoutOptions::default());
        let positions: Vec<f64> = layout.y_ticks.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![-60.0, -50.0, -40.0, -30.0, -20.0, -10.0, 0.0]);
        assert_eq!(layout.y_ticks[0].label, "-60");
    }

    #[test]
    fn test_layers_stack_downward() {
        let layout = sample_layout(LayoutOptions::default());
        let order: Vec<Variable> = layout.layers.iter().map(|l| l.variable).collect();
        assert_eq!(order, vec![Variable::Snow, Variable::Slush, Variable::Ice]);

        let snow = &layout.layers[0];
        let ice = &layout.layers[2];
        assert_eq!(snow.upper[0], (0.0, 0.0));
        assert_eq!(snow.lower[0], (0.0, -19.0));
        assert_eq!(layout.layers[1].lower[0], (0.0, -27.0));
        assert_eq!(ice.lower[0], (0.0, -60.0));
        // Snow-only position.
        assert_eq!(ice.lower[8], (8.0, -23.0));
    }

    #[test]
    fn test_title_is_iso_date() {
        assert_eq!(sample_layout(LayoutOptions::default()).title, "2025-01-31");
    }

    #[test]
    fn test_compass_arrow_points_north() {
        let mut options = LayoutOptions::default();
        assert!(sample_layout(options).compass.is_none());

        options.north_direction = Some(NorthDirection::Top);
        let up = sample_layout(options).compass.unwrap();
        assert!(up.head.1 > up.tail.1);
        assert_eq!(up.head.0, up.tail.0);

        options.north_direction = Some(NorthDirection::Left);
        let left = sample_layout(options).compass.unwrap();
        assert!(left.head.0 < left.tail.0);
        assert!(left.label_at.0 < left.head.0);
    }

    #[test]
    fn test_bad_index_is_config_error() {
        let options = LayoutOptions {
            zoom_start: 40,
            ..LayoutOptions::default()
        };
        let err = ChartLayout::compute(&sample_dataset(), &options, AREA).unwrap_err();
        assert!(matches!(err, GaultError::Config(_)));
    }

    #[test]
    fn test_single_position_does_not_divide_by_zero() {
        let t = Thickness {
            ice: vec![10.0],
            slush: vec![5.0],
            snow: vec![20.0],
        };
        let ds = Dataset::assemble(measurements::DATE, vec![0.0], t).unwrap();
        let options = LayoutOptions {
            zoom_start: 0,
            zoom_end: 0,
            buoy_index: 0,
            north_direction: None,
        };
        let layout = ChartLayout::compute(&ds, &options, AREA).unwrap();
        assert!(layout.buoy.height.is_finite());
        assert_eq!(layout.y_range, (-40.0, 3.0));
    }
}
