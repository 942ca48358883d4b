//! Backend-independent description of a chart.
//!
//! A [`Figure`] holds everything the renderer needs: the kind of chart, its
//! titles and palette, and the plotted values together with their text
//! labels. Labels are produced by the same constructor that creates the
//! bars or boxes so a bar and its label always come from one row.

use crate::aggregate::BoxStats;
use crate::types::NumericColumn;
use crate::util::{format_billions, format_int, format_percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Viridis,
    Magma,
    Plasma,
    Coolwarm,
    YlOrRd,
    YlGnBu,
    RdPu,
    Set2,
    Tab10,
}

impl Palette {
    fn stops(self) -> &'static [Rgb] {
        match self {
            Palette::Viridis => &[
                Rgb(0x44, 0x01, 0x54),
                Rgb(0x3b, 0x52, 0x8b),
                Rgb(0x21, 0x91, 0x8c),
                Rgb(0x5e, 0xc9, 0x62),
                Rgb(0xfd, 0xe7, 0x25),
            ],
            Palette::Magma => &[
                Rgb(0x3b, 0x0f, 0x70),
                Rgb(0x8c, 0x29, 0x81),
                Rgb(0xde, 0x49, 0x68),
                Rgb(0xfe, 0x9f, 0x6d),
            ],
            Palette::Plasma => &[
                Rgb(0x0d, 0x08, 0x87),
                Rgb(0x7e, 0x03, 0xa8),
                Rgb(0xcc, 0x47, 0x78),
                Rgb(0xf8, 0x95, 0x40),
                Rgb(0xf0, 0xf9, 0x21),
            ],
            Palette::Coolwarm => &[
                Rgb(0xb4, 0x04, 0x26),
                Rgb(0xf4, 0x9a, 0x7b),
                Rgb(0xdd, 0xdd, 0xdd),
                Rgb(0x8d, 0xb0, 0xfe),
                Rgb(0x3b, 0x4c, 0xc0),
            ],
            Palette::YlOrRd => &[
                Rgb(0xbd, 0x00, 0x26),
                Rgb(0xfc, 0x4e, 0x2a),
                Rgb(0xfe, 0xb2, 0x4c),
                Rgb(0xff, 0xed, 0xa0),
            ],
            Palette::YlGnBu => &[
                Rgb(0x08, 0x1d, 0x58),
                Rgb(0x22, 0x5e, 0xa8),
                Rgb(0x41, 0xb6, 0xc4),
                Rgb(0xc7, 0xe9, 0xb4),
            ],
            Palette::RdPu => &[
                Rgb(0x49, 0x00, 0x6a),
                Rgb(0xae, 0x01, 0x7e),
                Rgb(0xf7, 0x68, 0xa1),
                Rgb(0xfc, 0xc5, 0xc0),
            ],
            Palette::Set2 => &[
                Rgb(0x66, 0xc2, 0xa5),
                Rgb(0xfc, 0x8d, 0x62),
                Rgb(0x8d, 0xa0, 0xcb),
                Rgb(0xe7, 0x8a, 0xc3),
                Rgb(0xa6, 0xd8, 0x54),
                Rgb(0xff, 0xd9, 0x2f),
                Rgb(0xe5, 0xc4, 0x94),
                Rgb(0xb3, 0xb3, 0xb3),
            ],
            Palette::Tab10 => &[
                Rgb(0x1f, 0x77, 0xb4),
                Rgb(0xff, 0x7f, 0x0e),
                Rgb(0x2c, 0xa0, 0x2c),
                Rgb(0xd6, 0x27, 0x28),
                Rgb(0x94, 0x67, 0xbd),
                Rgb(0x8c, 0x56, 0x4b),
                Rgb(0xe3, 0x77, 0xc2),
                Rgb(0x7f, 0x7f, 0x7f),
                Rgb(0xbc, 0xbd, 0x22),
                Rgb(0x17, 0xbe, 0xcf),
            ],
        }
    }

    fn is_qualitative(self) -> bool {
        matches!(self, Palette::Set2 | Palette::Tab10)
    }

    /// Color for item `i` of `n`. Sequential palettes spread the items over
    /// the whole ramp; qualitative palettes cycle.
    pub fn color(self, i: usize, n: usize) -> Rgb {
        let stops = self.stops();
        if self.is_qualitative() {
            return stops[i % stops.len()];
        }
        if n <= 1 {
            return stops[0];
        }
        let t = (i.min(n - 1) as f64 / (n - 1) as f64) * (stops.len() - 1) as f64;
        let lo = t.floor() as usize;
        let hi = (lo + 1).min(stops.len() - 1);
        stops[lo].lerp(stops[hi], t - lo as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    HorizontalBar,
    Scatter,
    GroupedLine,
    BoxPlot,
    DualAxis,
}

/// How a value is printed next to its bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Hidden,
    Count,
    Percent,
    Billions,
}

impl ValueFormat {
    pub fn format(self, value: f64) -> Option<String> {
        match self {
            ValueFormat::Hidden => None,
            ValueFormat::Count => Some(format_int(value.round() as i64)),
            ValueFormat::Percent => Some(format_percent(value)),
            ValueFormat::Billions => Some(format_billions(value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    /// Stable slug, used for anchors and file names.
    pub id: &'static str,
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub palette: Palette,
    /// First row drawn in the top slot.
    pub invert_categories: bool,
    /// Value axis pinned to 0..100.
    pub percentage_axis: bool,
    pub value_format: ValueFormat,
    /// Spans the full page width instead of one grid column.
    pub wide: bool,
}

impl ChartSpec {
    pub fn new(id: &'static str, kind: ChartKind, title: impl Into<String>) -> Self {
        ChartSpec {
            id,
            kind,
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            palette: Palette::Viridis,
            invert_categories: kind == ChartKind::HorizontalBar,
            percentage_axis: false,
            value_format: ValueFormat::Hidden,
            wide: false,
        }
    }

    pub fn axes(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn percentage(mut self) -> Self {
        self.percentage_axis = true;
        self
    }

    pub fn labels(mut self, format: ValueFormat) -> Self {
        self.value_format = format;
        self
    }

    pub fn wide(mut self) -> Self {
        self.wide = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub category: String,
    pub value: f64,
    pub label: Option<String>,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Relative marker size in `0..=1`.
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Rgb,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxGroup {
    pub category: String,
    pub stats: Option<BoxStats>,
    pub values: Vec<f64>,
    pub label: String,
    pub color: Rgb,
}

impl BoxGroup {
    /// Raw points with a deterministic horizontal offset in `-0.15..=0.15`.
    pub fn jittered(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().enumerate().map(|(i, v)| {
            let step = ((i * 7) % 11) as f64 / 10.0;
            ((step - 0.5) * 0.3, *v)
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearPoint {
    pub year: i32,
    pub value: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FigureData {
    Bars(Vec<Bar>),
    Scatter(Vec<ScatterPoint>),
    Lines(Vec<Series>),
    Boxes { groups: Vec<BoxGroup>, overlay: bool },
    DualAxis { points: Vec<YearPoint>, secondary_label: String },
    Unavailable(NumericColumn),
}

/// What a renderer should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureState {
    Ready,
    NoData,
    Unavailable(NumericColumn),
}

pub const NO_DATA_MESSAGE: &str = "No data to display";

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub spec: ChartSpec,
    pub data: FigureData,
}

impl Figure {
    /// Bars from rows already in rank order.
    pub fn ranked_bars<I>(spec: ChartSpec, rows: I) -> Figure
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let rows: Vec<(String, f64)> = rows.into_iter().collect();
        let n = rows.len();
        let bars = rows
            .into_iter()
            .enumerate()
            .map(|(i, (category, value))| Bar {
                label: spec.value_format.format(value),
                color: spec.palette.color(i, n),
                category,
                value,
            })
            .collect();
        Figure {
            spec,
            data: FigureData::Bars(bars),
        }
    }

    pub fn scatter(spec: ChartSpec, points: Vec<ScatterPoint>) -> Figure {
        Figure {
            spec,
            data: FigureData::Scatter(points),
        }
    }

    pub fn lines<I>(spec: ChartSpec, series: I) -> Figure
    where
        I: IntoIterator<Item = (String, Vec<(f64, f64)>)>,
    {
        let series: Vec<_> = series.into_iter().collect();
        let n = series.len();
        let series = series
            .into_iter()
            .enumerate()
            .map(|(i, (name, points))| Series {
                name,
                color: spec.palette.color(i, n),
                points,
            })
            .collect();
        Figure {
            spec,
            data: FigureData::Lines(series),
        }
    }

    /// Box groups with their `n=` labels. `overlay` draws the raw points.
    pub fn boxes<I>(spec: ChartSpec, groups: I, overlay: bool) -> Figure
    where
        I: IntoIterator<Item = (String, Vec<f64>, Option<BoxStats>)>,
    {
        let groups: Vec<_> = groups.into_iter().collect();
        let n = groups.len();
        let groups = groups
            .into_iter()
            .enumerate()
            .map(|(i, (category, values, stats))| BoxGroup {
                label: format!("n={}", values.len()),
                color: spec.palette.color(i, n),
                category,
                stats,
                values,
            })
            .collect();
        Figure {
            spec,
            data: FigureData::Boxes { groups, overlay },
        }
    }

    pub fn dual_axis(spec: ChartSpec, points: Vec<YearPoint>, secondary_label: impl Into<String>) -> Figure {
        Figure {
            spec,
            data: FigureData::DualAxis {
                points,
                secondary_label: secondary_label.into(),
            },
        }
    }

    pub fn unavailable(spec: ChartSpec, column: NumericColumn) -> Figure {
        Figure {
            spec,
            data: FigureData::Unavailable(column),
        }
    }

    pub fn state(&self) -> FigureState {
        let empty = match &self.data {
            FigureData::Unavailable(column) => return FigureState::Unavailable(*column),
            FigureData::Bars(b) => b.is_empty(),
            FigureData::Scatter(p) => p.is_empty(),
            FigureData::Lines(s) => s.iter().all(|s| s.points.is_empty()),
            FigureData::Boxes { groups, .. } => groups.iter().all(|g| g.stats.is_none()),
            FigureData::DualAxis { points, .. } => points.is_empty(),
        };
        if empty {
            FigureState::NoData
        } else {
            FigureState::Ready
        }
    }

    /// Text shown instead of a chart, if any.
    pub fn placeholder(&self) -> Option<String> {
        match self.state() {
            FigureState::Ready => None,
            FigureState::NoData => Some(NO_DATA_MESSAGE.to_string()),
            FigureState::Unavailable(column) => {
                Some(format!("Column unavailable in this dataset: {}", column))
            }
        }
    }

    /// Bars paired with their vertical slot. Slot `n - 1` is the top of the
    /// plot, so with `invert_categories` the first row is drawn highest.
    pub fn bar_slots(&self) -> Vec<(f64, &Bar)> {
        let FigureData::Bars(bars) = &self.data else {
            return Vec::new();
        };
        let n = bars.len();
        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                let slot = if self.spec.invert_categories { n - 1 - i } else { i };
                (slot as f64, bar)
            })
            .collect()
    }

    /// Range of the value axis.
    pub fn value_range(&self) -> (f64, f64) {
        if self.spec.percentage_axis {
            return (0.0, 100.0);
        }
        let values: Vec<f64> = match &self.data {
            FigureData::Bars(b) => b.iter().map(|b| b.value).collect(),
            FigureData::Scatter(p) => p.iter().map(|p| p.y).collect(),
            FigureData::Lines(s) => s.iter().flat_map(|s| s.points.iter().map(|p| p.1)).collect(),
            FigureData::Boxes { groups, .. } => groups.iter().flat_map(|g| g.values.iter().copied()).collect(),
            FigureData::DualAxis { points, .. } => points.iter().filter_map(|p| p.value).collect(),
            FigureData::Unavailable(_) => Vec::new(),
        };
        padded_range(values.into_iter())
    }
}

/// `0..max` with headroom, extended below zero for negative data.
pub fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let hi = if hi <= 0.0 { 1.0 } else { hi * 1.1 };
    let lo = if lo < 0.0 { lo * 1.1 } else { 0.0 };
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_spec() -> ChartSpec {
        ChartSpec::new("t", ChartKind::HorizontalBar, "Test").labels(ValueFormat::Percent)
    }

    #[test]
    fn first_ranked_bar_is_drawn_on_top() {
        let fig = Figure::ranked_bars(
            bar_spec(),
            vec![("A".to_string(), 90.0), ("B".to_string(), 80.0), ("C".to_string(), 70.0)],
        );
        let slots = fig.bar_slots();
        let top = slots
            .iter()
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap();
        assert_eq!(top.1.category, "A");
        assert_eq!(top.0, 2.0);
    }

    #[test]
    fn percentage_axis_is_fixed() {
        let fig = Figure::ranked_bars(
            bar_spec().percentage(),
            vec![("A".to_string(), 60.0), ("B".to_string(), 40.0)],
        );
        assert_eq!(fig.value_range(), (0.0, 100.0));
    }

    #[test]
    fn labels_match_plotted_values() {
        let fig = Figure::ranked_bars(bar_spec(), vec![("A".to_string(), 73.44)]);
        let FigureData::Bars(bars) = &fig.data else {
            panic!("expected bars");
        };
        assert_eq!(bars[0].label.as_deref(), Some("73.4%"));
        assert_eq!(bars[0].value, 73.44);
    }

    #[test]
    fn box_labels_count_values() {
        let spec = ChartSpec::new("b", ChartKind::BoxPlot, "Box");
        let fig = Figure::boxes(
            spec,
            vec![("0-1B".to_string(), vec![1.0, 2.0, 3.0], BoxStats::from_values(&[1.0, 2.0, 3.0]))],
            true,
        );
        let FigureData::Boxes { groups, .. } = &fig.data else {
            panic!("expected boxes");
        };
        assert_eq!(groups[0].label, "n=3");
        assert!(groups[0].jittered().all(|(dx, _)| dx.abs() <= 0.15 + 1e-9));
    }

    #[test]
    fn empty_and_unavailable_states() {
        let empty = Figure::ranked_bars(bar_spec(), Vec::new());
        assert_eq!(empty.state(), FigureState::NoData);
        assert_eq!(empty.placeholder().as_deref(), Some(NO_DATA_MESSAGE));

        let missing = Figure::unavailable(bar_spec(), NumericColumn::Budget);
        assert_eq!(missing.state(), FigureState::Unavailable(NumericColumn::Budget));
        assert!(missing.placeholder().unwrap().contains("Budget (in Billion $)"));
    }

    #[test]
    fn padded_range_handles_edges() {
        assert_eq!(padded_range([].into_iter()), (0.0, 1.0));
        let (lo, hi) = padded_range([10.0, -2.0].into_iter());
        assert!((hi - 11.0).abs() < 1e-9);
        assert!((lo + 2.2).abs() < 1e-9);
    }

    #[test]
    fn sequential_palette_spans_ramp() {
        let first = Palette::Viridis.color(0, 5);
        let last = Palette::Viridis.color(4, 5);
        assert_eq!(first, Rgb(0x44, 0x01, 0x54));
        assert_eq!(last, Rgb(0xfd, 0xe7, 0x25));
        assert_eq!(Palette::Set2.color(8, 10), Palette::Set2.color(0, 10));
    }
}
