//! # Drawing Surface
//!
//! The renderer only talks to the [`Canvas`] trait: set bounds and ticks, add shapes
//! and lines, then save. [`SvgCanvas`] is the production surface. It records the
//! calls and replays them into a plotters chart on the SVG backend; tests
//! substitute a recording canvas.
//!
//! ## SVG Page Layout
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              title (ISO date)                │  top margin
//! │ Thickness    ┌─────────────────────────────┐ │
//! │   [cm]       │                             │ │
//! │  legend   -y │        plotting area        │ │
//! │              │                             │ │
//! │              └─────────────────────────────┘ │
//! │                x tick labels                 │  x label area
//! │                Distance [m]                  │
//! └──────────────────────────────────────────────┘
//! ```
//! The left margin holds the y label and the legend, outside the axes.

use crate::GaultError;
use log::{debug, info};
use plotters::backend::SVGBackend;
use plotters::chart::{ChartBuilder, ChartContext, LabelAreaPosition, SeriesLabelPosition};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::combinators::{BindKeyPoints, WithKeyPoints};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::ranged1d::{KeyPointHint, NoDefaultFormatting, Ranged, ValueFormatter};
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, DrawingAreaErrorKind, IntoDrawingArea};
use plotters::element::{DashedPathElement, PathElement, Polygon, Rectangle, Text};
use plotters::series::{DashedLineSeries, LineSeries};
use plotters::style::{
    Color, FontDesc, FontFamily, FontStyle, RGBColor, ShapeStyle, TextStyle, BLACK, WHITE,
};
use plotters_backend::text_anchor::{HPos, Pos, VPos};
use plotters_backend::{BackendCoord, DrawingBackend};
use std::path::Path;

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }
}

/// Axis tick at a data position with its printed label.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dotted,
}

/// Filled primitives, all in data coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Region between an upper and a lower outline sharing x positions
    Band {
        upper: Vec<(f64, f64)>,
        lower: Vec<(f64, f64)>,
        fill: Rgb,
    },
    /// Axis-aligned ellipse; `width` and `height` are full diameters
    Ellipse {
        center: (f64, f64),
        width: f64,
        height: f64,
        fill: Rgb,
    },
    /// Straight arrow with a filled head at `head`
    Arrow {
        tail: (f64, f64),
        head: (f64, f64),
        color: Rgb,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    pub points: Vec<(f64, f64)>,
    pub color: Rgb,
    pub style: LineStyle,
}

/// Capabilities the renderer needs from a drawing surface.
pub trait Canvas {
    /// Pixel size (width, height) of the plotting area inside the axes.
    fn plot_area(&self) -> (u32, u32);

    fn set_x_bounds(&mut self, min: f64, max: f64);
    fn set_y_bounds(&mut self, min: f64, max: f64);
    fn set_x_ticks(&mut self, ticks: &[Tick]);
    fn set_y_ticks(&mut self, ticks: &[Tick]);
    fn set_title(&mut self, title: &str);
    fn set_axis_labels(&mut self, x: &str, y: &str);

    /// Add a filled shape; a `legend` label adds a patch entry to the legend.
    fn add_shape(&mut self, shape: Shape, legend: Option<&str>);
    /// Add a line; a `legend` label adds a line entry to the legend.
    fn add_line(&mut self, line: Polyline, legend: Option<&str>);
    /// Centered text at a data position.
    fn add_text(&mut self, text: &str, at: (f64, f64));

    fn save(&mut self, path: &Path) -> Result<(), GaultError>;
}

// Page margins in pixels, outside the chart's label areas
const MARGIN_LEFT: u32 = 100;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 40;
const Y_LABEL_AREA: u32 = 50;
const X_LABEL_AREA: u32 = 55;

const ELLIPSE_VERTICES: usize = 48;
const DOT_ON_PX: u32 = 2;
const DOT_OFF_PX: u32 = 3;
const ARROW_HEAD_PX: f64 = 9.0;

type ProfileCoord = Cartesian2d<TickAxis, TickAxis>;

/// `WithKeyPoints<RangedCoordf64>` lacks a `ValueFormatter<f64>` impl, which
/// `configure_mesh` requires; this wrapper delegates everything to it and
/// supplies one (labels come from the explicit label formatters anyway).
struct TickAxis(WithKeyPoints<RangedCoordf64>);

impl Ranged for TickAxis {
    type ValueType = f64;
    type FormatOption = NoDefaultFormatting;

    fn range(&self) -> std::ops::Range<f64> {
        self.0.range()
    }

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.0.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        self.0.key_points(hint)
    }

    fn axis_pixel_range(&self, limit: (i32, i32)) -> std::ops::Range<i32> {
        self.0.axis_pixel_range(limit)
    }
}

impl ValueFormatter<f64> for TickAxis {
    fn format(value: &f64) -> String {
        RangedCoordf64::format(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Item {
    Shape(Shape),
    Line(Polyline),
    Text(String, (f64, f64)),
}

/// Legend marker; entries are listed lines first, then patches, then bands.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Swatch {
    Line(Rgb, LineStyle),
    Patch(Rgb),
    Band(Rgb),
}

impl Swatch {
    fn group(self) -> u8 {
        match self {
            Swatch::Line(..) => 0,
            Swatch::Patch(_) => 1,
            Swatch::Band(_) => 2,
        }
    }
}

fn font(size: f64) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
}

fn text_style(size: f64, h: HPos, v: VPos) -> TextStyle<'static> {
    font(size).color(&BLACK).pos(Pos::new(h, v))
}

fn fill(color: Rgb) -> ShapeStyle {
    color.to_plotters().filled()
}

fn stroke(color: Rgb, width: u32) -> ShapeStyle {
    color.to_plotters().stroke_width(width)
}

fn ellipse_outline(center: (f64, f64), width: f64, height: f64) -> Vec<(f64, f64)> {
    (0..ELLIPSE_VERTICES)
        .map(|k| {
            let t = k as f64 / ELLIPSE_VERTICES as f64 * std::f64::consts::TAU;
            (
                center.0 + width / 2.0 * t.cos(),
                center.1 + height / 2.0 * t.sin(),
            )
        })
        .collect()
}

/// Printed label of the tick at `value`, empty when there is none.
fn tick_label(ticks: &[Tick], value: f64) -> String {
    ticks
        .iter()
        .find(|t| (t.position - value).abs() < 1e-9)
        .map(|t| t.label.clone())
        .unwrap_or_default()
}

/// Canvas that renders to an SVG file.
#[derive(Clone, Debug)]
pub struct SvgCanvas {
    width: u32,
    height: u32,
    x_bounds: (f64, f64),
    y_bounds: (f64, f64),
    x_ticks: Vec<Tick>,
    y_ticks: Vec<Tick>,
    title: String,
    x_label: String,
    y_label: String,
    items: Vec<Item>,
    legend: Vec<(String, Swatch)>,
}

impl SvgCanvas {
    /// New page of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        SvgCanvas {
            width,
            height,
            x_bounds: (0.0, 1.0),
            y_bounds: (0.0, 1.0),
            x_ticks: Vec::new(),
            y_ticks: Vec::new(),
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            items: Vec::new(),
            legend: Vec::new(),
        }
    }

    /// Legend entries in display order; insertion order within each group.
    fn legend_entries(&self) -> Vec<&(String, Swatch)> {
        let mut entries: Vec<_> = self.legend.iter().collect();
        entries.sort_by_key(|(_, swatch)| swatch.group());
        entries
    }

    fn build_chart<'a, DB: DrawingBackend>(
        &self,
        root: &'a DrawingArea<DB, Shift>,
    ) -> Result<ChartContext<'a, DB, ProfileCoord>, DrawingAreaErrorKind<DB::ErrorType>> {
        let positions = |ticks: &[Tick]| ticks.iter().map(|t| t.position).collect::<Vec<_>>();
        let x_spec = (self.x_bounds.0..self.x_bounds.1).with_key_points(positions(&self.x_ticks));
        let y_spec = (self.y_bounds.0..self.y_bounds.1).with_key_points(positions(&self.y_ticks));

        ChartBuilder::on(root)
            .margin_top(MARGIN_TOP)
            .margin_right(MARGIN_RIGHT)
            .margin_left(MARGIN_LEFT)
            .margin_bottom(0)
            .set_label_area_size(LabelAreaPosition::Left, Y_LABEL_AREA)
            .set_label_area_size(LabelAreaPosition::Bottom, X_LABEL_AREA)
            .build_cartesian_2d(TickAxis(x_spec), TickAxis(y_spec))
    }

    /// Draw the whole page onto `root` and flush it.
    pub fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;
        let mut chart = self.build_chart(root)?;

        let x_format = |v: &f64| tick_label(&self.x_ticks, *v);
        let y_format = |v: &f64| tick_label(&self.y_ticks, *v);
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(self.x_ticks.len().max(1))
            .y_labels(self.y_ticks.len().max(1))
            .x_label_formatter(&x_format)
            .y_label_formatter(&y_format)
            .label_style(font(12.0))
            .x_desc(self.x_label.as_str())
            .axis_desc_style(font(14.0))
            .draw()?;

        for item in &self.items {
            match item {
                Item::Shape(Shape::Band { upper, lower, fill: color }) => {
                    let outline: Vec<_> = upper.iter().chain(lower.iter().rev()).copied().collect();
                    chart.draw_series(std::iter::once(Polygon::new(outline, fill(*color))))?;
                }
                Item::Shape(Shape::Ellipse {
                    center,
                    width,
                    height,
                    fill: color,
                }) => {
                    let outline = ellipse_outline(*center, *width, *height);
                    chart.draw_series(std::iter::once(Polygon::new(outline, fill(*color))))?;
                }
                Item::Shape(Shape::Arrow { tail, head, color }) => {
                    let tail = chart.backend_coord(tail);
                    let head = chart.backend_coord(head);
                    draw_arrow(root, tail, head, *color)?;
                }
                Item::Line(line) => {
                    let points = line.points.clone();
                    match line.style {
                        LineStyle::Solid => {
                            chart.draw_series(LineSeries::new(points, stroke(line.color, 1)))?;
                        }
                        LineStyle::Dotted => {
                            chart.draw_series(DashedLineSeries::new(
                                points,
                                DOT_ON_PX,
                                DOT_OFF_PX,
                                stroke(line.color, 1),
                            ))?;
                        }
                    }
                }
                Item::Text(text, at) => {
                    let style = text_style(16.0, HPos::Center, VPos::Center);
                    chart.draw_series(std::iter::once(Text::new(text.clone(), *at, style)))?;
                }
            }
        }

        self.draw_legend(&mut chart)?;

        let (width, height) = (self.width as i32, self.height as i32);
        root.draw_text(
            &self.title,
            &text_style(16.0, HPos::Center, VPos::Center),
            (width / 2, MARGIN_TOP as i32 / 2),
        )?;
        // Unrotated, right-aligned near the top of the y axis
        let top = MARGIN_TOP as i32;
        let plot_height = height - top - X_LABEL_AREA as i32;
        root.draw_text(
            &self.y_label,
            &text_style(14.0, HPos::Right, VPos::Center),
            ((MARGIN_LEFT + Y_LABEL_AREA) as i32 - 30, top + plot_height / 10),
        )?;

        root.present()
    }

    /// Register one legend-only series per entry, then draw the legend box
    /// left of the axes with its top 35% down the plot.
    fn draw_legend<'a, DB: DrawingBackend + 'a>(
        &self,
        chart: &mut ChartContext<'a, DB, ProfileCoord>,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let entries = self.legend_entries();
        if entries.is_empty() {
            return Ok(());
        }

        for (label, swatch) in entries {
            let anno = chart.draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?;
            anno.label(label.as_str());
            match *swatch {
                Swatch::Line(color, LineStyle::Solid) => {
                    anno.legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 15, y)], stroke(color, 1))
                    });
                }
                Swatch::Line(color, LineStyle::Dotted) => {
                    anno.legend(move |(x, y)| {
                        DashedPathElement::new(
                            vec![(x, y), (x + 15, y)],
                            DOT_ON_PX,
                            DOT_OFF_PX,
                            stroke(color, 1),
                        )
                    });
                }
                Swatch::Patch(color) | Swatch::Band(color) => {
                    anno.legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 12, y + 5)], fill(color))
                    });
                }
            }
        }

        let (_, plot_height) = self.plot_area();
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::Coordinate(
                -((MARGIN_LEFT + Y_LABEL_AREA) as i32) + 5,
                (plot_height as f64 * 0.35) as i32,
            ))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK.mix(0.3))
            .label_font(font(12.0))
            .draw()
    }
}

/// Shaft plus filled head, in pixel coordinates of `root`.
fn draw_arrow<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    tail: BackendCoord,
    head: BackendCoord,
    color: Rgb,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (t, h) = (
        (tail.0 as f64, tail.1 as f64),
        (head.0 as f64, head.1 as f64),
    );
    let (dx, dy) = (h.0 - t.0, h.1 - t.1);
    let length = dx.hypot(dy).max(f64::EPSILON);
    let (ux, uy) = (dx / length, dy / length);
    let base = (h.0 - ux * ARROW_HEAD_PX, h.1 - uy * ARROW_HEAD_PX);
    let wing = ARROW_HEAD_PX / 2.0;
    let px = |(x, y): (f64, f64)| (x.round() as i32, y.round() as i32);

    root.draw(&PathElement::new(vec![tail, px(base)], stroke(color, 2)))?;
    root.draw(&Polygon::new(
        vec![
            head,
            px((base.0 - uy * wing, base.1 + ux * wing)),
            px((base.0 + uy * wing, base.1 - ux * wing)),
        ],
        fill(color),
    ))
}

impl Canvas for SvgCanvas {
    fn plot_area(&self) -> (u32, u32) {
        (
            self.width
                .saturating_sub(MARGIN_LEFT + MARGIN_RIGHT + Y_LABEL_AREA)
                .max(1),
            self.height
                .saturating_sub(MARGIN_TOP + X_LABEL_AREA)
                .max(1),
        )
    }

    fn set_x_bounds(&mut self, min: f64, max: f64) {
        self.x_bounds = (min, max);
    }

    fn set_y_bounds(&mut self, min: f64, max: f64) {
        self.y_bounds = (min, max);
    }

    fn set_x_ticks(&mut self, ticks: &[Tick]) {
        self.x_ticks = ticks.to_vec();
    }

    fn set_y_ticks(&mut self, ticks: &[Tick]) {
        self.y_ticks = ticks.to_vec();
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_axis_labels(&mut self, x: &str, y: &str) {
        self.x_label = x.to_string();
        self.y_label = y.to_string();
    }

    fn add_shape(&mut self, shape: Shape, legend: Option<&str>) {
        if let Some(label) = legend {
            let swatch = match &shape {
                Shape::Band { fill, .. } => Swatch::Band(*fill),
                Shape::Ellipse { fill, .. } => Swatch::Patch(*fill),
                Shape::Arrow { color, .. } => Swatch::Patch(*color),
            };
            self.legend.push((label.to_string(), swatch));
        }
        self.items.push(Item::Shape(shape));
    }

    fn add_line(&mut self, line: Polyline, legend: Option<&str>) {
        if let Some(label) = legend {
            self.legend
                .push((label.to_string(), Swatch::Line(line.color, line.style)));
        }
        self.items.push(Item::Line(line));
    }

    fn add_text(&mut self, text: &str, at: (f64, f64)) {
        self.items.push(Item::Text(text.to_string(), at));
    }

    fn save(&mut self, path: &Path) -> Result<(), GaultError> {
        debug!(
            "Rendering {} items to {}x{} SVG",
            self.items.len(),
            self.width,
            self.height
        );
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        self.draw(&root)
            .map_err(|e| GaultError::Render(format!("{}: {e}", path.display())))?;
        info!("Plot written to {}", path.display());
        Ok(())
    }
}
