//! CSV, JSON and terminal-table output of aggregation results.

use crate::error::OutputError;
use crate::reports::{Analysis, Availability};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::{info, warn};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), OutputError> {
    let csv_err = |source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for r in rows {
        wtr.serialize(r).map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Markdown rendering of at most `max_rows` rows, or `(no rows)`.
pub fn table_markdown<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(report_no: usize, title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\nReport {}: {}", report_no, title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", table_markdown(rows, max_rows));
}

fn preview_available<T>(report_no: usize, title: &str, note: Option<&str>, rows: &Availability<Vec<T>>, max_rows: usize)
where
    T: Tabled + Clone,
{
    match rows {
        Availability::Ready(rows) => preview_table(report_no, title, note, rows, max_rows),
        Availability::MissingColumn(column) => {
            println!("\nReport {}: {}", report_no, title);
            println!("(column unavailable in this dataset: {})\n", column);
        }
    }
}

/// Print every aggregation as a markdown table.
pub fn print_analysis(analysis: &Analysis, max_rows: usize) {
    let a = analysis;
    preview_table(1, "Missions per Country", Some("top 10"), &a.missions_per_country, max_rows);
    preview_available(2, "Total Budget per Country", Some("top 10"), &a.budget_per_country, max_rows);
    preview_available(
        3,
        "Missions vs. Average Budget",
        Some("countries with 10+ missions"),
        &a.missions_vs_budget,
        max_rows,
    );
    preview_table(4, "Mission Type Distribution", Some("top 8"), &a.mission_types, max_rows);
    preview_available(
        5,
        "Average Budget per Mission Type",
        Some("types with 10+ budgeted missions"),
        &a.budget_per_type,
        max_rows,
    );
    preview_table(6, "Mission Types over Time", Some("top 5 types"), &a.type_evolution, max_rows);
    preview_available(
        7,
        "Success Rate by Country",
        Some("countries with 10+ missions"),
        &a.success_by_country,
        max_rows,
    );
    preview_available(
        8,
        "Success Rate by Mission Type",
        Some("types with 5+ missions"),
        &a.success_by_type,
        max_rows,
    );
    preview_available(9, "Success Rate by Budget Bracket", None, &a.success_by_bracket, max_rows);
    preview_available(10, "Success Rate by Year", None, &a.success_evolution, max_rows);
}

fn export_available<T: Serialize>(
    dir: &Path,
    name: &str,
    rows: &Availability<Vec<T>>,
    written: &mut Vec<PathBuf>,
) -> Result<(), OutputError> {
    match rows {
        Availability::Ready(rows) => {
            let path = dir.join(name);
            write_csv(&path, rows)?;
            written.push(path);
        }
        Availability::MissingColumn(column) => {
            warn!(file = name, %column, "skipping export, column unavailable");
        }
    }
    Ok(())
}

/// Write each aggregation as CSV plus `summary.json` into `dir`, creating
/// it if needed. Returns the written paths in order.
pub fn export_analysis(analysis: &Analysis, dir: &Path) -> Result<Vec<PathBuf>, OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let a = analysis;
    let mut written = Vec::new();

    for (name, result) in [
        ("missions_per_country.csv", write_csv(&dir.join("missions_per_country.csv"), &a.missions_per_country)),
        ("mission_types.csv", write_csv(&dir.join("mission_types.csv"), &a.mission_types)),
        ("mission_type_evolution.csv", write_csv(&dir.join("mission_type_evolution.csv"), &a.type_evolution)),
        ("summary.json", write_json(&dir.join("summary.json"), &a.summary)),
    ] {
        result?;
        written.push(dir.join(name));
    }

    export_available(dir, "budget_per_country.csv", &a.budget_per_country, &mut written)?;
    export_available(dir, "missions_vs_budget.csv", &a.missions_vs_budget, &mut written)?;
    export_available(dir, "budget_per_mission_type.csv", &a.budget_per_type, &mut written)?;
    export_available(dir, "success_by_country.csv", &a.success_by_country, &mut written)?;
    export_available(dir, "success_by_mission_type.csv", &a.success_by_type, &mut written)?;
    export_available(dir, "success_by_budget_bracket.csv", &a.success_by_bracket, &mut written)?;
    export_available(dir, "success_by_year.csv", &a.success_evolution, &mut written)?;

    info!(dir = %dir.display(), files = written.len(), "aggregations exported");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Schema;
    use crate::types::{CountryCountRow, MissionRecord, NumericColumn};

    fn records() -> Vec<MissionRecord> {
        (0..12)
            .map(|i| MissionRecord {
                country: if i < 10 { "USA" } else { "Japan" }.to_string(),
                mission_name: format!("M{i}"),
                mission_type: "Probe".to_string(),
                year: Some(2001),
                budget: Some(2.5),
                success_rate: Some(80.0),
                duration: None,
            })
            .collect()
    }

    #[test]
    fn markdown_preview_truncates() {
        let rows = vec![
            CountryCountRow { country: "USA".into(), missions: 1200 },
            CountryCountRow { country: "China".into(), missions: 7 },
        ];
        let md = table_markdown(&rows, 1);
        assert!(md.contains("| Country"));
        assert!(md.contains("1,200"));
        assert!(!md.contains("China"));
        assert_eq!(table_markdown::<CountryCountRow>(&[], 5), "(no rows)");
    }

    #[test]
    fn export_writes_every_table() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Analysis::from_records(&records(), &Schema::complete());
        let written = export_analysis(&analysis, dir.path()).unwrap();
        assert_eq!(written.len(), 11);

        let csv = std::fs::read_to_string(dir.path().join("missions_per_country.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Country,Missions"));
        assert_eq!(lines.next(), Some("USA,10"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(json["records"], 12);
    }

    #[test]
    fn export_skips_unavailable_tables() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = Analysis::from_records(&records(), &Schema::with_columns([NumericColumn::SuccessRate]));
        let written = export_analysis(&analysis, dir.path()).unwrap();
        assert!(!dir.path().join("budget_per_country.csv").exists());
        assert!(dir.path().join("success_by_country.csv").exists());
        assert_eq!(written.len(), 7);
    }
}
