#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::PathBuf;
use tempfile::TempDir;

pub const HEADER: &str =
    "Country,Mission Name,Mission Type,Year,Budget (in Billion $),Success Rate (%),Duration (in Days)";

/// One CSV line in the dataset's column order.
pub fn row(country: &str, name: &str, kind: &str, year: i32, budget: f64, success: f64) -> String {
    format!("{country},{name},{kind},{year},{budget},{success},120")
}

pub fn write_dataset(dir: &TempDir, name: &str, rows: &[String]) -> PathBuf {
    let mut body = String::from(HEADER);
    body.push('\n');
    for r in rows {
        let _ = writeln!(body, "{r}");
    }
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// 12 missions for CountryA with a mean success of 70 and 12 for CountryB
/// at 55, plus 5 for CountryC.
pub fn scenario_rows() -> Vec<String> {
    let a_rates = [90.0, 80.0, 70.0, 60.0, 50.0, 90.0, 80.0, 70.0, 60.0, 50.0, 100.0, 40.0];
    let mut rows = Vec::new();
    for (i, rate) in a_rates.iter().enumerate() {
        rows.push(row("CountryA", &format!("A-{i}"), "Crewed", 2000 + i as i32, 1.5 + i as f64, *rate));
    }
    for i in 0..12 {
        rows.push(row("CountryB", &format!("B-{i}"), "Probe", 2005 + i, 12.0, 55.0));
    }
    for i in 0..5 {
        rows.push(row("CountryC", &format!("C-{i}"), "Probe", 2010, 0.4, 99.0));
    }
    rows
}
