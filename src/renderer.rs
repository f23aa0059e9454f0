//! # Profile Rendering
//!
//! This module turns a [`ChartLayout`] into drawing calls on any [`Canvas`], and
//! provides an ASCII rendering of the same profile for development mode
//! (`--stdout`), so the chart can be checked without opening an image viewer.

use crate::canvas::{Canvas, LineStyle, Polyline, Rgb, Shape};
use crate::dataset::{Dataset, Variable};
use crate::layout::{ChartLayout, LayoutOptions};
use crate::GaultError;
use log::debug;
use std::path::Path;

/// xkcd "baby blue"
pub const SNOW_COLOR: Rgb = Rgb(0xa2, 0xcf, 0xfe);
/// xkcd "dark blue"
pub const SLUSH_COLOR: Rgb = Rgb(0x00, 0x03, 0x5b);
/// xkcd "bright blue"
pub const ICE_COLOR: Rgb = Rgb(0x01, 0x65, 0xfc);
pub const BUOY_COLOR: Rgb = Rgb(0xff, 0xa5, 0x00);

pub const GAP_LABEL: &str = "10 m gap";
pub const NORTH_LABEL: &str = "N";

fn layer_style(var: Variable) -> (Rgb, &'static str) {
    match var {
        Variable::Snow => (SNOW_COLOR, "snow"),
        Variable::Slush => (SLUSH_COLOR, "slush"),
        Variable::Ice => (ICE_COLOR, "ice"),
    }
}

/// Lay out `dataset` for `canvas`, draw it, and save to `path`.
///
/// The layout is computed before the first drawing call, so invalid options
/// never produce a partial image.
pub fn render_profile<C: Canvas>(
    dataset: &Dataset,
    options: &LayoutOptions,
    canvas: &mut C,
    path: &Path,
) -> Result<ChartLayout, GaultError> {
    let layout = ChartLayout::compute(dataset, options, canvas.plot_area())?;
    render_chart(&layout, canvas);
    canvas.save(path)?;
    Ok(layout)
}

/// Issue every drawing call for `layout`.
pub fn render_chart<C: Canvas + ?Sized>(layout: &ChartLayout, canvas: &mut C) {
    canvas.set_x_bounds(layout.x_range.0, layout.x_range.1);
    canvas.set_y_bounds(layout.y_range.0, layout.y_range.1);
    canvas.set_x_ticks(&layout.x_ticks);
    canvas.set_y_ticks(&layout.y_ticks);
    canvas.set_title(&layout.title);
    canvas.set_axis_labels(layout.x_label, layout.y_label);

    for band in &layout.layers {
        let (fill, label) = layer_style(band.variable);
        canvas.add_shape(
            Shape::Band {
                upper: band.upper.clone(),
                lower: band.lower.clone(),
                fill,
            },
            Some(label),
        );
    }

    canvas.add_shape(
        Shape::Ellipse {
            center: layout.buoy.center,
            width: layout.buoy.width,
            height: layout.buoy.height,
            fill: BUOY_COLOR,
        },
        Some("buoy"),
    );

    // Only the first gap marker gets a legend entry
    for (i, gap) in layout.gaps.iter().enumerate() {
        canvas.add_line(
            Polyline {
                points: vec![(gap.x, gap.top), (gap.x, gap.bottom)],
                color: Rgb::BLACK,
                style: LineStyle::Dotted,
            },
            (i == 0).then_some(GAP_LABEL),
        );
    }

    if let Some(arrow) = &layout.compass {
        canvas.add_shape(
            Shape::Arrow {
                tail: arrow.tail,
                head: arrow.head,
                color: Rgb::BLACK,
            },
            None,
        );
        canvas.add_text(NORTH_LABEL, arrow.label_at);
    }

    debug!(
        "Issued draw calls for {} ({} layers, compass: {})",
        layout.title,
        layout.layers.len(),
        layout.compass.is_some()
    );
}

/// Centimeters per ASCII row
const ROW_CM: f64 = 5.0;
/// Deeper profiles get taller rows instead of more of them
const MAX_ROWS: usize = 200;
/// Characters per position
const COLUMN_WIDTH: usize = 4;
const Y_AXIS_WIDTH: usize = 5;

/// Render the profile as text: one column per position, one row per 5 cm.
///
/// Profiles deeper than `MAX_ROWS` rows are scaled down to fit. `░` snow,
/// `▒` slush, `█` ice, `o` buoy, `:` gap markers below the layers.
pub fn ascii_profile(layout: &ChartLayout) -> String {
    let (y_min, y_max) = layout.y_range;
    let row_cm = ROW_CM.max((y_max - y_min) / MAX_ROWS as f64);
    let rows = ((y_max - y_min) / row_cm).ceil().clamp(1.0, MAX_ROWS as f64) as usize;
    let columns = layout.layers.first().map_or(0, |l| l.upper.len());

    let in_band = |band: usize, column: usize, v: f64| {
        let layer = &layout.layers[band];
        let (a, b) = (layer.upper[column].1, layer.lower[column].1);
        v <= a.max(b) && v >= a.min(b) && a != b
    };

    let width = Y_AXIS_WIDTH + columns * COLUMN_WIDTH;
    let mut out = format!("{:^width$}\n", layout.title);

    for row in 0..rows {
        let top = y_max - row as f64 * row_cm;
        let v = top - row_cm / 2.0;

        // Each 10 cm tick lands in exactly one row
        let tick = (top / 10.0).floor() * 10.0;
        if tick > top - row_cm {
            out.push_str(&format!("{tick:>4.0}"));
        } else {
            out.push_str("    ");
        }
        out.push('│');

        for column in 0..columns {
            let layer = (0..layout.layers.len()).find(|&b| in_band(b, column, v));
            let ch = match layer.map(|b| layout.layers[b].variable) {
                Some(Variable::Snow) => '░',
                Some(Variable::Slush) => '▒',
                Some(Variable::Ice) => '█',
                None if column == layout.buoy.index && v > 0.0 => 'o',
                None if layout
                    .gaps
                    .iter()
                    .any(|g| g.index == column && v < g.top && v >= g.bottom) =>
                {
                    ':'
                }
                None => ' ',
            };
            out.extend(std::iter::repeat(ch).take(COLUMN_WIDTH));
        }
        out.push('\n');
    }

    // Distance labels under every other column
    out.push_str(&" ".repeat(Y_AXIS_WIDTH));
    let mut cursor = 0;
    for tick in &layout.x_ticks {
        let start = tick.position as usize * COLUMN_WIDTH;
        if start >= cursor {
            out.push_str(&" ".repeat(start - cursor));
            out.push_str(&tick.label);
            cursor = start + tick.label.chars().count();
        }
    }
    out.push('\n');
    out.push_str(&format!("{:^width$}\n", layout.x_label));
    out
}

/// Render the profile to the terminal.
pub fn draw_ascii(dataset: &Dataset, options: &LayoutOptions) -> Result<(), GaultError> {
    // Terminal cells are roughly twice as tall as wide.
    let plot_area = ((dataset.len() * COLUMN_WIDTH) as u32, 2 * dataset.len() as u32);
    let layout = ChartLayout::compute(dataset, options, plot_area)?;
    print!("{}", ascii_profile(&layout));
    Ok(())
}
