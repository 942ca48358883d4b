use crate::aggregate::{group_by, top_keys_by_frequency, BoxStats, Ranking, Summary};
use crate::loader::{Dataset, Schema};
use crate::types::{
    BracketSuccessRow, BudgetBracket, CountryBudgetRow, CountryCountRow, CountryVolumeRow,
    MissionRecord, NumericColumn, SuccessRow, SummaryStats, TypeBudgetRow, TypeCountRow,
    TypeYearRow, YearSuccessRow,
};
use crate::util::median;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const TOP_COUNTRIES: usize = 10;
pub const TOP_MISSION_TYPES: usize = 8;
pub const EVOLUTION_TYPES: usize = 5;
pub const TOP_SUCCESS_GROUPS: usize = 10;

pub const MIN_COUNTRY_MISSIONS: usize = 10;
pub const MIN_TYPE_BUDGET_SAMPLES: usize = 10;
pub const MIN_COUNTRY_SUCCESS_SAMPLES: usize = 10;
pub const MIN_TYPE_SUCCESS_SAMPLES: usize = 5;

/// Result of an aggregation that reads an optional column.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability<T> {
    Ready(T),
    MissingColumn(NumericColumn),
}

impl<T> Availability<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Availability::Ready(v) => Some(v),
            Availability::MissingColumn(_) => None,
        }
    }

    fn gate(schema: &Schema, needs: &[NumericColumn], compute: impl FnOnce() -> T) -> Self {
        match needs.iter().find(|c| !schema.has(**c)) {
            Some(missing) => Availability::MissingColumn(*missing),
            None => Availability::Ready(compute()),
        }
    }
}

fn by_country(r: &MissionRecord) -> Option<String> {
    Some(r.country.clone())
}

fn by_type(r: &MissionRecord) -> Option<String> {
    Some(r.mission_type.clone())
}

/// Missions per country, top 10 by count.
pub fn missions_per_country(records: &[MissionRecord]) -> Vec<CountryCountRow> {
    let rows = group_by(records, by_country)
        .into_iter()
        .map(|g| CountryCountRow {
            missions: g.len(),
            country: g.key,
        })
        .collect();
    Ranking::by(|r: &CountryCountRow| r.missions as f64)
        .limit(TOP_COUNTRIES)
        .apply(rows)
}

/// Total and mean budget per country, top 10 by total.
pub fn budget_per_country(records: &[MissionRecord]) -> Vec<CountryBudgetRow> {
    let rows = group_by(records, by_country)
        .into_iter()
        .map(|g| {
            let s = g.summarize(NumericColumn::Budget);
            CountryBudgetRow {
                country: g.key,
                total_budget: s.sum,
                mean_budget: s.mean,
                budget_samples: s.count,
            }
        })
        .collect();
    Ranking::by(|r: &CountryBudgetRow| r.total_budget)
        .limit(TOP_COUNTRIES)
        .apply(rows)
}

/// Mission volume against average budget for countries with at least ten
/// missions.
pub fn missions_vs_budget(records: &[MissionRecord]) -> Vec<CountryVolumeRow> {
    let rows = group_by(records, by_country)
        .into_iter()
        .map(|g| CountryVolumeRow {
            missions: g.len(),
            mean_budget: g.summarize(NumericColumn::Budget).mean,
            country: g.key,
        })
        .collect();
    Ranking::by(|r: &CountryVolumeRow| r.missions as f64)
        .min_samples(MIN_COUNTRY_MISSIONS, |r| r.missions)
        .apply(rows)
}

pub fn mission_type_distribution(records: &[MissionRecord]) -> Vec<TypeCountRow> {
    let rows = group_by(records, by_type)
        .into_iter()
        .map(|g| TypeCountRow {
            missions: g.len(),
            mission_type: g.key,
        })
        .collect();
    Ranking::by(|r: &TypeCountRow| r.missions as f64)
        .limit(TOP_MISSION_TYPES)
        .apply(rows)
}

pub fn budget_per_mission_type(records: &[MissionRecord]) -> Vec<TypeBudgetRow> {
    let rows = group_by(records, by_type)
        .into_iter()
        .map(|g| {
            let s = g.summarize(NumericColumn::Budget);
            TypeBudgetRow {
                mission_type: g.key,
                mean_budget: s.mean,
                budget_samples: s.count,
            }
        })
        .collect();
    Ranking::by(|r: &TypeBudgetRow| r.budget_samples as f64)
        .min_samples(MIN_TYPE_BUDGET_SAMPLES, |r| r.budget_samples)
        .apply(rows)
}

/// Yearly mission counts for the five most common mission types.
///
/// The top types are chosen over the whole dataset before grouping by year,
/// and only (year, type) pairs that occur are returned.
pub fn mission_type_evolution(records: &[MissionRecord]) -> Vec<TypeYearRow> {
    let top: BTreeSet<String> = top_keys_by_frequency(records, by_type, EVOLUTION_TYPES)
        .into_iter()
        .collect();
    group_by(records, |r| {
        let year = r.year?;
        top.contains(&r.mission_type)
            .then(|| (year, r.mission_type.clone()))
    })
    .into_iter()
    .map(|g| TypeYearRow {
        missions: g.len(),
        year: g.key.0,
        mission_type: g.key.1,
    })
    .collect()
}

fn success_ranking(
    records: &[MissionRecord],
    key: fn(&MissionRecord) -> Option<String>,
    min_samples: usize,
) -> Vec<SuccessRow> {
    let rows = group_by(records, key)
        .into_iter()
        .filter_map(|g| {
            let s = g.summarize(NumericColumn::SuccessRate);
            // A group with no success values has no mean to rank.
            s.mean.map(|mean| SuccessRow {
                group: g.key,
                mean_success: mean,
                samples: s.count,
            })
        })
        .collect();
    Ranking::by(|r: &SuccessRow| r.mean_success)
        .min_samples(min_samples, |r| r.samples)
        .limit(TOP_SUCCESS_GROUPS)
        .apply(rows)
}

pub fn success_by_country(records: &[MissionRecord]) -> Vec<SuccessRow> {
    success_ranking(records, by_country, MIN_COUNTRY_SUCCESS_SAMPLES)
}

pub fn success_by_mission_type(records: &[MissionRecord]) -> Vec<SuccessRow> {
    success_ranking(records, by_type, MIN_TYPE_SUCCESS_SAMPLES)
}

/// Success-rate distribution per budget bracket. All brackets are returned
/// in bracket order, empty ones with zero samples.
pub fn success_by_budget_bracket(records: &[MissionRecord]) -> Vec<BracketSuccessRow> {
    let mut groups: BTreeMap<BudgetBracket, Vec<f64>> = BudgetBracket::ALL
        .into_iter()
        .map(|b| (b, Vec::new()))
        .collect();
    for g in group_by(records, MissionRecord::budget_bracket) {
        groups.insert(g.key, g.values(NumericColumn::SuccessRate));
    }
    groups
        .into_iter()
        .map(|(bracket, values)| {
            let s = Summary::of(values.iter().copied().map(Some));
            BracketSuccessRow {
                bracket,
                samples: s.count,
                mean_success: s.mean,
                median_success: median(values.clone()),
                distribution: BoxStats::from_values(&values),
                values,
            }
        })
        .collect()
}

pub fn success_evolution(records: &[MissionRecord]) -> Vec<YearSuccessRow> {
    group_by(records, |r| r.year)
        .into_iter()
        .map(|g| {
            let s = g.summarize(NumericColumn::SuccessRate);
            YearSuccessRow {
                year: g.key,
                mean_success: s.mean,
                samples: s.count,
            }
        })
        .collect()
}

pub fn summary_stats(records: &[MissionRecord]) -> SummaryStats {
    let years = records.iter().filter_map(|r| r.year);
    let countries: BTreeSet<&str> = records.iter().map(|r| r.country.as_str()).collect();
    let types: BTreeSet<&str> = records.iter().map(|r| r.mission_type.as_str()).collect();
    SummaryStats {
        records: records.len(),
        first_year: years.clone().min(),
        last_year: years.max(),
        countries: countries.len(),
        mission_types: types.len(),
        mean_success_rate: Summary::of(records.iter().map(|r| r.success_rate)).mean,
        mean_budget: Summary::of(records.iter().map(|r| r.budget)).mean,
    }
}

/// Every aggregation of one dataset, computed once and shared by the page
/// and the PDF report.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub summary: SummaryStats,
    pub missions_per_country: Vec<CountryCountRow>,
    pub budget_per_country: Availability<Vec<CountryBudgetRow>>,
    pub missions_vs_budget: Availability<Vec<CountryVolumeRow>>,
    pub mission_types: Vec<TypeCountRow>,
    pub budget_per_type: Availability<Vec<TypeBudgetRow>>,
    pub type_evolution: Vec<TypeYearRow>,
    pub success_by_country: Availability<Vec<SuccessRow>>,
    pub success_by_type: Availability<Vec<SuccessRow>>,
    pub success_by_bracket: Availability<Vec<BracketSuccessRow>>,
    pub success_evolution: Availability<Vec<YearSuccessRow>>,
}

impl Analysis {
    pub fn compute(dataset: &Dataset) -> Analysis {
        Self::from_records(&dataset.records, &dataset.schema)
    }

    pub fn from_records(records: &[MissionRecord], schema: &Schema) -> Analysis {
        use NumericColumn::{Budget, SuccessRate};

        let analysis = Analysis {
            summary: summary_stats(records),
            missions_per_country: missions_per_country(records),
            budget_per_country: Availability::gate(schema, &[Budget], || budget_per_country(records)),
            missions_vs_budget: Availability::gate(schema, &[Budget], || missions_vs_budget(records)),
            mission_types: mission_type_distribution(records),
            budget_per_type: Availability::gate(schema, &[Budget], || budget_per_mission_type(records)),
            type_evolution: mission_type_evolution(records),
            success_by_country: Availability::gate(schema, &[SuccessRate], || success_by_country(records)),
            success_by_type: Availability::gate(schema, &[SuccessRate], || {
                success_by_mission_type(records)
            }),
            success_by_bracket: Availability::gate(schema, &[Budget, SuccessRate], || {
                success_by_budget_bracket(records)
            }),
            success_evolution: Availability::gate(schema, &[SuccessRate], || success_evolution(records)),
        };
        debug!(
            records = records.len(),
            countries = analysis.summary.countries,
            "analysis computed"
        );
        analysis
    }
}
