//! Drawing of [`Figure`]s with plotters.
//!
//! One generic routine draws onto any plotters backend; the page uses the
//! SVG backend, the PDF report the bitmap backend.

use crate::chart::{padded_range, BoxGroup, Figure, FigureData, Rgb, ScatterPoint, Series, YearPoint};
use crate::error::RenderError;
use once_cell::sync::Lazy;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::register_font;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::{debug, error};

/// Canvas size of charts embedded in the page.
pub const PAGE_CHART_SIZE: (u32, u32) = (800, 480);
/// Canvas size of charts rasterized for the PDF (6x4 inches at 200 dpi).
pub const REPORT_CHART_SIZE: (u32, u32) = (1200, 800);

const FONT: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

static FONTS_READY: Lazy<bool> = Lazy::new(|| {
    let ok = [FontStyle::Normal, FontStyle::Bold]
        .into_iter()
        .all(|style| register_font(FONT, style, FONT_BYTES).is_ok());
    if !ok {
        error!("bundled font rejected by the glyph rasterizer");
    }
    ok
});

const MUTED: RGBColor = RGBColor(110, 110, 110);
const INK: RGBColor = RGBColor(40, 40, 40);

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Registers the bundled font with plotters. Safe to call repeatedly.
pub fn ensure_fonts() -> Result<(), RenderError> {
    if *FONTS_READY {
        Ok(())
    } else {
        Err(RenderError::Font)
    }
}

pub fn render_svg(figure: &Figure, size: (u32, u32)) -> Result<String, RenderError> {
    ensure_fonts()?;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_figure(&root, figure).map_err(|e| draw_error(figure, e))?;
        root.present().map_err(|e| draw_error(figure, e))?;
    }
    Ok(svg)
}

/// Draws `figure` into a PNG file at `path`.
pub fn render_png(figure: &Figure, path: &Path, size: (u32, u32)) -> Result<(), RenderError> {
    ensure_fonts()?;
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw_figure(&root, figure).map_err(|e| draw_error(figure, e))?;
    root.present().map_err(|e| draw_error(figure, e))?;
    debug!(chart = figure.spec.id, path = %path.display(), "chart rasterized");
    Ok(())
}

fn draw_error(figure: &Figure, err: impl std::fmt::Display) -> RenderError {
    RenderError::Draw {
        chart: figure.spec.id.to_string(),
        message: err.to_string(),
    }
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

/// Font and spacing sizes scaled to the canvas width.
#[derive(Debug, Clone, Copy)]
struct Metrics {
    title: i32,
    desc: i32,
    tick: i32,
    note: i32,
    margin: i32,
    x_area: i32,
    scale: f64,
}

impl Metrics {
    fn for_width(width: u32) -> Metrics {
        let scale = (width as f64 / 800.0).max(0.5);
        let px = |v: f64| (v * scale).round() as i32;
        Metrics {
            title: px(20.0),
            desc: px(14.0),
            tick: px(12.0),
            note: px(11.0),
            margin: px(14.0),
            x_area: px(48.0),
            scale,
        }
    }

    fn y_area_for(&self, labels: &[&str], canvas_width: u32) -> i32 {
        let longest = labels.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let wanted = (longest as f64 * 0.62 * self.tick as f64) as i32 + self.desc * 2 + 12;
        wanted.clamp((60.0 * self.scale) as i32, canvas_width as i32 / 3)
    }
}

fn draw_figure<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    let m = Metrics::for_width(root.dim_in_pixel().0);
    if let Some(message) = figure.placeholder() {
        return draw_placeholder(root, figure, &message, m);
    }
    match &figure.data {
        FigureData::Bars(_) => draw_bars(root, figure, m),
        FigureData::Scatter(points) => draw_scatter(root, figure, points, m),
        FigureData::Lines(series) => draw_lines(root, figure, series, m),
        FigureData::Boxes { groups, overlay } => draw_boxes(root, figure, groups, *overlay, m),
        FigureData::DualAxis { points, secondary_label } => {
            draw_dual_axis(root, figure, points, secondary_label, m)
        }
        FigureData::Unavailable(_) => Ok(()),
    }
}

fn draw_placeholder<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    message: &str,
    m: Metrics,
) -> DrawResult<DB> {
    let (w, h) = root.dim_in_pixel();
    let centre = Pos::new(HPos::Center, VPos::Center);
    root.draw(&Text::new(
        figure.spec.title.clone(),
        (w as i32 / 2, m.margin + m.title / 2),
        TextStyle::from((FONT, m.title).into_font()).pos(centre),
    ))?;
    root.draw(&Text::new(
        message.to_string(),
        (w as i32 / 2, h as i32 / 2),
        TextStyle::from((FONT, m.desc).into_font()).color(&MUTED).pos(centre),
    ))?;
    Ok(())
}

/// Label for a category axis tick; only integral positions name a category.
fn category_at(names: &[&str], v: f64) -> String {
    let r = v.round();
    if (v - r).abs() > 1e-6 || r < 0.0 {
        return String::new();
    }
    names.get(r as usize).map(|s| s.to_string()).unwrap_or_default()
}

fn value_tick(v: f64, percentage: bool) -> String {
    if percentage {
        format!("{:.0}%", v)
    } else if v.abs() >= 100.0 || v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

fn year_tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-6 {
        format!("{:.0}", v)
    } else {
        String::new()
    }
}

fn year_span(years: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = years.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if lo.is_finite() {
        (lo - 0.5, hi + 0.5)
    } else {
        (0.0, 1.0)
    }
}

fn draw_bars<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure, m: Metrics) -> DrawResult<DB> {
    let slots = figure.bar_slots();
    let n = slots.len();
    let mut names = vec![""; n];
    for (slot, bar) in &slots {
        names[*slot as usize] = bar.category.as_str();
    }
    let (lo, hi) = figure.value_range();
    let percentage = figure.spec.percentage_axis;

    let mut chart = ChartBuilder::on(root)
        .caption(figure.spec.title.as_str(), (FONT, m.title))
        .margin(m.margin)
        .x_label_area_size(m.x_area)
        .y_label_area_size(m.y_area_for(&names, root.dim_in_pixel().0))
        .build_cartesian_2d(lo..hi, -0.5f64..(n as f64 - 0.5))?;

    let y_fmt = |v: &f64| category_at(&names, *v);
    let x_fmt = |v: &f64| value_tick(*v, percentage);
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&y_fmt)
        .x_label_formatter(&x_fmt)
        .x_desc(figure.spec.x_label.as_str())
        .y_desc(figure.spec.y_label.as_str())
        .label_style((FONT, m.tick))
        .axis_desc_style((FONT, m.desc))
        .draw()?;

    chart.draw_series(slots.iter().map(|(slot, bar)| {
        Rectangle::new([(0.0, slot - 0.38), (bar.value, slot + 0.38)], rgb(bar.color).filled())
    }))?;

    let label_style = TextStyle::from((FONT, m.note).into_font()).pos(Pos::new(HPos::Left, VPos::Center));
    let pad = (hi - lo) * 0.01;
    chart.draw_series(slots.iter().filter_map(|(slot, bar)| {
        bar.label
            .as_ref()
            .map(|label| Text::new(label.clone(), (bar.value + pad, *slot), label_style.clone()))
    }))?;
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    points: &[ScatterPoint],
    m: Metrics,
) -> DrawResult<DB> {
    let (x_lo, x_hi) = padded_range(points.iter().map(|p| p.x));
    let (y_lo, y_hi) = figure.value_range();

    let mut chart = ChartBuilder::on(root)
        .caption(figure.spec.title.as_str(), (FONT, m.title))
        .margin(m.margin)
        .x_label_area_size(m.x_area)
        .y_label_area_size(m.x_area + m.desc)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    let x_fmt = |v: &f64| value_tick(*v, false);
    let y_fmt = |v: &f64| value_tick(*v, figure.spec.percentage_axis);
    chart
        .configure_mesh()
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(figure.spec.x_label.as_str())
        .y_desc(figure.spec.y_label.as_str())
        .label_style((FONT, m.tick))
        .axis_desc_style((FONT, m.desc))
        .draw()?;

    let n = points.len();
    let palette = figure.spec.palette;
    chart.draw_series(points.iter().enumerate().map(|(i, p)| {
        let radius = ((6.0 + 14.0 * p.size.clamp(0.0, 1.0)) * m.scale) as i32;
        Circle::new((p.x, p.y), radius, rgb(palette.color(i, n)).mix(0.75).filled())
    }))?;

    let label_style = TextStyle::from((FONT, m.note).into_font()).pos(Pos::new(HPos::Left, VPos::Bottom));
    let dx = (x_hi - x_lo) * 0.012;
    chart.draw_series(
        points
            .iter()
            .map(|p| Text::new(p.name.clone(), (p.x + dx, p.y), label_style.clone())),
    )?;
    Ok(())
}

fn draw_lines<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    series: &[Series],
    m: Metrics,
) -> DrawResult<DB> {
    let (x_lo, x_hi) = year_span(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)));
    let (y_lo, y_hi) = figure.value_range();

    let mut chart = ChartBuilder::on(root)
        .caption(figure.spec.title.as_str(), (FONT, m.title))
        .margin(m.margin)
        .x_label_area_size(m.x_area)
        .y_label_area_size(m.x_area + m.desc)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    let x_fmt = |v: &f64| year_tick(*v);
    let y_fmt = |v: &f64| value_tick(*v, figure.spec.percentage_axis);
    chart
        .configure_mesh()
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(figure.spec.x_label.as_str())
        .y_desc(figure.spec.y_label.as_str())
        .label_style((FONT, m.tick))
        .axis_desc_style((FONT, m.desc))
        .draw()?;

    let stroke = (2.0 * m.scale).round() as u32;
    for s in series {
        let color = rgb(s.color);
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(stroke)))?
            .label(s.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke)));
        chart.draw_series(
            s.points
                .iter()
                .map(|p| Circle::new(*p, (3.0 * m.scale) as i32, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font((FONT, m.tick))
        .background_style(WHITE.mix(0.85))
        .border_style(MUTED)
        .draw()?;
    Ok(())
}

fn draw_boxes<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    groups: &[BoxGroup],
    overlay: bool,
    m: Metrics,
) -> DrawResult<DB> {
    let n = groups.len();
    let names: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    let (y_lo, y_hi) = figure.value_range();

    let mut chart = ChartBuilder::on(root)
        .caption(figure.spec.title.as_str(), (FONT, m.title))
        .margin(m.margin)
        .x_label_area_size(m.x_area)
        .y_label_area_size(m.x_area + m.desc)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_lo..y_hi)?;

    let x_fmt = |v: &f64| category_at(&names, *v);
    let y_fmt = |v: &f64| value_tick(*v, figure.spec.percentage_axis);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(figure.spec.x_label.as_str())
        .y_desc(figure.spec.y_label.as_str())
        .label_style((FONT, m.tick))
        .axis_desc_style((FONT, m.desc))
        .draw()?;

    let half = 0.3;
    let cap = 0.12;
    let line = INK.stroke_width((1.5 * m.scale).round() as u32);
    let mut boxes = Vec::new();
    let mut outlines = Vec::new();
    let mut strokes = Vec::new();
    let mut dots = Vec::new();
    for (i, g) in groups.iter().enumerate() {
        let x = i as f64;
        let Some(s) = &g.stats else { continue };
        boxes.push(Rectangle::new([(x - half, s.q1), (x + half, s.q3)], rgb(g.color).mix(0.85).filled()));
        outlines.push(Rectangle::new([(x - half, s.q1), (x + half, s.q3)], line));
        strokes.push(PathElement::new(vec![(x - half, s.median), (x + half, s.median)], line));
        strokes.push(PathElement::new(vec![(x, s.q3), (x, s.upper_whisker)], line));
        strokes.push(PathElement::new(vec![(x, s.q1), (x, s.lower_whisker)], line));
        strokes.push(PathElement::new(vec![(x - cap, s.upper_whisker), (x + cap, s.upper_whisker)], line));
        strokes.push(PathElement::new(vec![(x - cap, s.lower_whisker), (x + cap, s.lower_whisker)], line));
        if overlay {
            for (dx, v) in g.jittered() {
                dots.push(Circle::new((x + dx, v), (2.5 * m.scale) as i32, INK.mix(0.45).filled()));
            }
        } else {
            for v in &s.outliers {
                dots.push(Circle::new((x, *v), (3.0 * m.scale) as i32, INK.stroke_width(1)));
            }
        }
    }
    chart.draw_series(boxes)?;
    chart.draw_series(outlines)?;
    chart.draw_series(strokes)?;
    chart.draw_series(dots)?;

    let label_style = TextStyle::from((FONT, m.note).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    let label_y = y_hi - (y_hi - y_lo) * 0.02;
    chart.draw_series(
        groups
            .iter()
            .enumerate()
            .map(|(i, g)| Text::new(g.label.clone(), (i as f64, label_y), label_style.clone())),
    )?;
    Ok(())
}

fn draw_dual_axis<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    points: &[YearPoint],
    secondary_label: &str,
    m: Metrics,
) -> DrawResult<DB> {
    let (x_lo, x_hi) = year_span(points.iter().map(|p| p.year as f64));
    let (y_lo, y_hi) = figure.value_range();
    let max_count = points.iter().map(|p| p.count).max().unwrap_or(0);
    let count_hi = (max_count as f64 * 1.2).max(1.0);

    let mut chart = ChartBuilder::on(root)
        .caption(figure.spec.title.as_str(), (FONT, m.title))
        .margin(m.margin)
        .x_label_area_size(m.x_area)
        .y_label_area_size(m.x_area + m.desc)
        .right_y_label_area_size(m.x_area + m.desc)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?
        .set_secondary_coord(x_lo..x_hi, 0f64..count_hi);

    let x_fmt = |v: &f64| year_tick(*v);
    let y_fmt = |v: &f64| value_tick(*v, figure.spec.percentage_axis);
    chart
        .configure_mesh()
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(figure.spec.x_label.as_str())
        .y_desc(figure.spec.y_label.as_str())
        .label_style((FONT, m.tick))
        .axis_desc_style((FONT, m.desc))
        .draw()?;

    let count_fmt = |v: &f64| format!("{:.0}", v);
    chart
        .configure_secondary_axes()
        .y_label_formatter(&count_fmt)
        .y_desc(secondary_label)
        .label_style((FONT, m.tick))
        .axis_desc_style((FONT, m.desc))
        .draw()?;

    let palette = figure.spec.palette;
    let bar_color = rgb(palette.color(3, 5));
    let line_color = rgb(palette.color(0, 5));

    chart.draw_secondary_series(points.iter().map(|p| {
        let x = p.year as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, p.count as f64)], bar_color.mix(0.35).filled())
    }))?;

    // Years without a success value break the line.
    let mut runs: Vec<Vec<(f64, f64)>> = vec![Vec::new()];
    for p in points {
        match p.value {
            Some(v) => {
                if let Some(run) = runs.last_mut() {
                    run.push((p.year as f64, v));
                }
            }
            None => runs.push(Vec::new()),
        }
    }
    let stroke = (2.0 * m.scale).round() as u32;
    for run in runs.into_iter().filter(|r| !r.is_empty()) {
        chart.draw_series(LineSeries::new(run, line_color.stroke_width(stroke)))?;
    }
    chart.draw_series(points.iter().filter_map(|p| {
        p.value
            .map(|v| Circle::new((p.year as f64, v), (3.0 * m.scale) as i32, line_color.filled()))
    }))?;
    Ok(())
}
