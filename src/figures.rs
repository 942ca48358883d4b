//! The charts of each dashboard section, built from an [`Analysis`].
//!
//! The page and the PDF both call [`section_figures`], so the two outputs
//! always show the same numbers in the same order.

use crate::chart::{ChartKind, ChartSpec, Figure, Palette, ScatterPoint, ValueFormat, YearPoint};
use crate::reports::{Analysis, Availability};
use crate::types::SuccessRow;
use std::collections::BTreeMap;

/// Datasets smaller than this get raw points drawn over the box plot.
pub const OVERLAY_MAX_RECORDS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Country,
    MissionType,
    Success,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Country, Section::MissionType, Section::Success];

    pub fn title(self) -> &'static str {
        match self {
            Section::Country => "Analysis by Country",
            Section::MissionType => "Analysis by Mission Type",
            Section::Success => "Success Rate Analysis",
        }
    }

    pub fn anchor(self) -> &'static str {
        match self {
            Section::Country => "country",
            Section::MissionType => "mission-type",
            Section::Success => "success",
        }
    }
}

pub fn section_figures(analysis: &Analysis, section: Section) -> Vec<Figure> {
    match section {
        Section::Country => vec![
            missions_per_country(analysis),
            budget_per_country(analysis),
            missions_vs_budget(analysis),
        ],
        Section::MissionType => vec![
            mission_types(analysis),
            budget_per_type(analysis),
            type_evolution(analysis),
        ],
        Section::Success => vec![
            success_by_country(analysis),
            success_by_type(analysis),
            success_by_bracket(analysis),
            success_evolution(analysis),
        ],
    }
}

fn gated<T>(source: &Availability<T>, spec: ChartSpec, build: impl FnOnce(ChartSpec, &T) -> Figure) -> Figure {
    match source {
        Availability::Ready(rows) => build(spec, rows),
        Availability::MissingColumn(column) => Figure::unavailable(spec, *column),
    }
}

fn missions_per_country(a: &Analysis) -> Figure {
    let spec = ChartSpec::new("missions-per-country", ChartKind::HorizontalBar, "Top 10 Countries by Number of Missions")
        .axes("Number of missions", "Country")
        .palette(Palette::Viridis)
        .labels(ValueFormat::Count);
    Figure::ranked_bars(
        spec,
        a.missions_per_country
            .iter()
            .map(|r| (r.country.clone(), r.missions as f64)),
    )
}

fn budget_per_country(a: &Analysis) -> Figure {
    let spec = ChartSpec::new("budget-per-country", ChartKind::HorizontalBar, "Top 10 Countries by Total Budget")
        .axes("Total budget (billion $)", "Country")
        .palette(Palette::Magma)
        .labels(ValueFormat::Billions);
    gated(&a.budget_per_country, spec, |spec, rows| {
        Figure::ranked_bars(spec, rows.iter().map(|r| (r.country.clone(), r.total_budget)))
    })
}

fn missions_vs_budget(a: &Analysis) -> Figure {
    let spec = ChartSpec::new(
        "missions-vs-budget",
        ChartKind::Scatter,
        "Missions vs. Average Budget (countries with 10+ missions)",
    )
    .axes("Number of missions", "Average budget (billion $)")
    .palette(Palette::Viridis)
    .wide();
    gated(&a.missions_vs_budget, spec, |spec, rows| {
        let max = rows.iter().map(|r| r.missions).max().unwrap_or(1).max(1) as f64;
        let points = rows
            .iter()
            .filter_map(|r| {
                Some(ScatterPoint {
                    name: r.country.clone(),
                    x: r.missions as f64,
                    y: r.mean_budget?,
                    size: r.missions as f64 / max,
                })
            })
            .collect();
        Figure::scatter(spec, points)
    })
}

fn mission_types(a: &Analysis) -> Figure {
    let spec = ChartSpec::new("mission-types", ChartKind::HorizontalBar, "Most Common Mission Types")
        .axes("Number of missions", "Mission type")
        .palette(Palette::YlOrRd)
        .labels(ValueFormat::Count);
    Figure::ranked_bars(
        spec,
        a.mission_types
            .iter()
            .map(|r| (r.mission_type.clone(), r.missions as f64)),
    )
}

fn budget_per_type(a: &Analysis) -> Figure {
    let spec = ChartSpec::new(
        "budget-per-type",
        ChartKind::HorizontalBar,
        "Average Budget by Mission Type (10+ budgeted missions)",
    )
    .axes("Average budget (billion $)", "Mission type")
    .palette(Palette::YlGnBu)
    .labels(ValueFormat::Billions);
    gated(&a.budget_per_type, spec, |spec, rows| {
        Figure::ranked_bars(
            spec,
            rows.iter()
                .filter_map(|r| Some((r.mission_type.clone(), r.mean_budget?))),
        )
    })
}

fn type_evolution(a: &Analysis) -> Figure {
    let spec = ChartSpec::new("type-evolution", ChartKind::GroupedLine, "Mission Types Over Time (top 5 types)")
        .axes("Year", "Number of missions")
        .palette(Palette::Tab10)
        .wide();
    let mut series: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
    for row in &a.type_evolution {
        series
            .entry(row.mission_type.as_str())
            .or_default()
            .push((row.year as f64, row.missions as f64));
    }
    Figure::lines(
        spec,
        series.into_iter().map(|(name, points)| (name.to_string(), points)),
    )
}

fn success_bars(rows: &[SuccessRow], spec: ChartSpec) -> Figure {
    Figure::ranked_bars(spec, rows.iter().map(|r| (r.group.clone(), r.mean_success)))
}

fn success_by_country(a: &Analysis) -> Figure {
    let spec = ChartSpec::new(
        "success-by-country",
        ChartKind::HorizontalBar,
        "Average Success Rate by Country (10+ missions)",
    )
    .axes("Average success rate (%)", "Country")
    .palette(Palette::Coolwarm)
    .percentage()
    .labels(ValueFormat::Percent);
    gated(&a.success_by_country, spec, |spec, rows| success_bars(rows, spec))
}

fn success_by_type(a: &Analysis) -> Figure {
    let spec = ChartSpec::new(
        "success-by-type",
        ChartKind::HorizontalBar,
        "Average Success Rate by Mission Type (5+ missions)",
    )
    .axes("Average success rate (%)", "Mission type")
    .palette(Palette::RdPu)
    .percentage()
    .labels(ValueFormat::Percent);
    gated(&a.success_by_type, spec, |spec, rows| success_bars(rows, spec))
}

fn success_by_bracket(a: &Analysis) -> Figure {
    let spec = ChartSpec::new("success-by-budget", ChartKind::BoxPlot, "Success Rate by Budget Bracket")
        .axes("Budget bracket", "Success rate (%)")
        .palette(Palette::Set2)
        .percentage()
        .wide();
    let overlay = a.summary.records < OVERLAY_MAX_RECORDS;
    gated(&a.success_by_bracket, spec, |spec, rows| {
        Figure::boxes(
            spec,
            rows.iter().map(|r| {
                (
                    r.bracket.label().to_string(),
                    r.values.clone(),
                    r.distribution.clone(),
                )
            }),
            overlay,
        )
    })
}

fn success_evolution(a: &Analysis) -> Figure {
    let spec = ChartSpec::new("success-evolution", ChartKind::DualAxis, "Success Rate and Mission Volume by Year")
        .axes("Year", "Average success rate (%)")
        .palette(Palette::Plasma)
        .percentage()
        .wide();
    gated(&a.success_evolution, spec, |spec, rows| {
        let points = rows
            .iter()
            .map(|r| YearPoint {
                year: r.year,
                value: r.mean_success,
                count: r.samples,
            })
            .collect();
        Figure::dual_axis(spec, points, "Missions with a success rate")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{FigureData, FigureState};
    use crate::loader::Schema;
    use crate::types::{MissionRecord, NumericColumn};

    fn rec(country: &str, success: f64) -> MissionRecord {
        MissionRecord {
            country: country.into(),
            mission_name: "m".into(),
            mission_type: "Probe".into(),
            year: Some(2000),
            budget: Some(3.0),
            success_rate: Some(success),
            duration: None,
        }
    }

    #[test]
    fn every_section_has_figures_with_unique_ids() {
        let analysis = Analysis::from_records(&[], &Schema::complete());
        let mut ids: Vec<&str> = Section::ALL
            .iter()
            .flat_map(|s| section_figures(&analysis, *s))
            .map(|f| f.spec.id)
            .collect();
        assert_eq!(ids.len(), 10);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn empty_dataset_yields_no_data_figures() {
        let analysis = Analysis::from_records(&[], &Schema::complete());
        for section in Section::ALL {
            for fig in section_figures(&analysis, section) {
                assert_eq!(fig.state(), FigureState::NoData, "{}", fig.spec.id);
            }
        }
    }

    #[test]
    fn success_bars_use_percentage_axis() {
        let mut records: Vec<_> = (0..10).map(|_| rec("A", 40.0)).collect();
        records.extend((0..10).map(|_| rec("B", 60.0)));
        let analysis = Analysis::from_records(&records, &Schema::complete());
        let fig = success_by_country(&analysis);
        assert_eq!(fig.value_range(), (0.0, 100.0));
        let top = fig.bar_slots().into_iter().max_by(|a, b| a.0.total_cmp(&b.0)).unwrap();
        assert_eq!(top.1.category, "B");
        assert_eq!(top.1.label.as_deref(), Some("60.0%"));
    }

    #[test]
    fn overlay_only_for_small_datasets() {
        let small: Vec<_> = (0..20).map(|_| rec("A", 50.0)).collect();
        let analysis = Analysis::from_records(&small, &Schema::complete());
        let FigureData::Boxes { overlay, .. } = success_by_bracket(&analysis).data else {
            panic!("expected boxes");
        };
        assert!(overlay);

        let large: Vec<_> = (0..250).map(|_| rec("A", 50.0)).collect();
        let analysis = Analysis::from_records(&large, &Schema::complete());
        let FigureData::Boxes { overlay, .. } = success_by_bracket(&analysis).data else {
            panic!("expected boxes");
        };
        assert!(!overlay);
    }

    #[test]
    fn missing_budget_column_marks_figures_unavailable() {
        let records: Vec<_> = (0..10).map(|_| rec("A", 50.0)).collect();
        let analysis = Analysis::from_records(&records, &Schema::with_columns([NumericColumn::SuccessRate]));
        let states: Vec<_> = section_figures(&analysis, Section::Country)
            .iter()
            .map(|f| f.state())
            .collect();
        assert_eq!(states[0], FigureState::Ready);
        assert_eq!(states[1], FigureState::Unavailable(NumericColumn::Budget));
        assert_eq!(states[2], FigureState::Unavailable(NumericColumn::Budget));
    }
}
