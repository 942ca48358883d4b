use crate::error::LoadError;
use crate::types::{MissionRecord, NumericColumn, RawRow, REQUIRED_COLUMNS};
use crate::util::{clean_text, parse_f64_safe, parse_year};
use csv::{ReaderBuilder, StringRecord, Trim};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Vocabulary used for mission-type labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelLocale {
    #[default]
    En,
    Pt,
}

impl LabelLocale {
    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            LabelLocale::En => &[("Crewed", "Manned"), ("Uncrewed", "Unmanned")],
            LabelLocale::Pt => &[("Manned", "Tripulada"), ("Unmanned", "Não tripulada")],
        }
    }

    /// Exact-match lookup; anything outside the table passes through.
    pub fn translate(self, mission_type: &str) -> String {
        self.table()
            .iter()
            .find(|(from, _)| *from == mission_type)
            .map(|(_, to)| (*to).to_string())
            .unwrap_or_else(|| mission_type.to_string())
    }
}

/// Which optional numeric columns the source file carried.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    present: BTreeSet<NumericColumn>,
}

impl Schema {
    pub fn with_columns(columns: impl IntoIterator<Item = NumericColumn>) -> Self {
        Schema {
            present: columns.into_iter().collect(),
        }
    }

    pub fn complete() -> Self {
        Self::with_columns(NumericColumn::ALL)
    }

    pub fn has(&self, column: NumericColumn) -> bool {
        self.present.contains(&column)
    }

    pub fn missing(&self) -> Vec<NumericColumn> {
        NumericColumn::ALL
            .into_iter()
            .filter(|c| !self.has(*c))
            .collect()
    }

    /// Validate a header row. Every absent required column is reported at once.
    fn from_headers(path: &Path, headers: &StringRecord) -> Result<Schema, LoadError> {
        let names: BTreeSet<&str> = headers.iter().map(str::trim).collect();
        let absent: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !names.contains(**c))
            .map(|c| c.to_string())
            .collect();
        if !absent.is_empty() {
            return Err(LoadError::MissingColumns {
                path: path.to_path_buf(),
                columns: absent,
            });
        }
        Ok(Schema::with_columns(
            NumericColumn::ALL
                .into_iter()
                .filter(|c| names.contains(c.header())),
        ))
    }
}

/// Identity of a loaded source file. A change in any field means the cached
/// dataset is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceIdentity {
    pub fn probe(path: &Path) -> Result<SourceIdentity, LoadError> {
        let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::SourceNotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::unreadable(path, e),
        })?;
        if !meta.is_file() {
            return Err(LoadError::unreadable(path, "not a regular file"));
        }
        Ok(SourceIdentity {
            path: path.to_path_buf(),
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub null_years: usize,
    /// Null count per present optional column.
    pub null_values: BTreeMap<NumericColumn, usize>,
    pub missing_columns: Vec<NumericColumn>,
    pub translated_types: usize,
}

/// The immutable record set of one source file.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<MissionRecord>,
    pub schema: Schema,
    pub source: SourceIdentity,
    pub report: LoadReport,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn load_dataset(path: &Path, locale: LabelLocale) -> Result<Dataset, LoadError> {
    let source = SourceIdentity::probe(path)?;
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| LoadError::unreadable(path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| LoadError::unreadable(path, e))?
        .clone();
    let schema = Schema::from_headers(path, &headers)?;

    let mut report = LoadReport {
        missing_columns: schema.missing(),
        ..LoadReport::default()
    };
    for column in NumericColumn::ALL {
        if schema.has(column) {
            report.null_values.insert(column, 0);
        }
    }

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        // Line 1 is the header.
        let row = result
            .map_err(|e| LoadError::unreadable(path, format!("row {}: {}", idx + 2, e)))?;
        let record = clean_row(row, locale, &mut report);
        records.push(record);
    }
    report.rows_read = records.len();

    if !report.missing_columns.is_empty() {
        warn!(
            path = %path.display(),
            missing = ?report.missing_columns,
            "optional columns absent; dependent aggregations are disabled"
        );
    }
    info!(
        path = %path.display(),
        rows = report.rows_read,
        null_years = report.null_years,
        "dataset loaded"
    );
    debug!(nulls = ?report.null_values, translated = report.translated_types, "coercion summary");

    Ok(Dataset {
        records,
        schema,
        source,
        report,
    })
}

fn clean_row(row: RawRow, locale: LabelLocale, report: &mut LoadReport) -> MissionRecord {
    let raw_type = clean_text(row.mission_type.as_deref()).unwrap_or_else(|| "Unspecified".to_string());
    let mission_type = locale.translate(&raw_type);
    if mission_type != raw_type {
        report.translated_types += 1;
    }

    let year = parse_year(row.year.as_deref());
    if year.is_none() {
        report.null_years += 1;
    }

    let mut numeric = |column: NumericColumn, raw: Option<&str>| {
        let value = parse_f64_safe(raw);
        if value.is_none() {
            if let Some(n) = report.null_values.get_mut(&column) {
                *n += 1;
            }
        }
        value
    };
    let budget = numeric(NumericColumn::Budget, row.budget.as_deref());
    let success_rate = numeric(NumericColumn::SuccessRate, row.success_rate.as_deref());
    let duration = numeric(NumericColumn::Duration, row.duration.as_deref());

    MissionRecord {
        country: clean_text(row.country.as_deref()).unwrap_or_else(|| "Unknown".to_string()),
        mission_name: clean_text(row.mission_name.as_deref()).unwrap_or_default(),
        mission_type,
        year,
        budget,
        success_rate,
        duration,
    }
}

/// Lazily loaded dataset, reused while the source file is unchanged.
///
/// Failed loads are not cached; the next `get` tries again.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    locale: LabelLocale,
    slot: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>, locale: LabelLocale) -> Self {
        DatasetCache {
            path: path.into(),
            locale,
            slot: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<Arc<Dataset>, LoadError> {
        let identity = SourceIdentity::probe(&self.path)?;
        let mut slot = self.slot.lock();
        if let Some(cached) = slot.as_ref() {
            if cached.source == identity {
                return Ok(Arc::clone(cached));
            }
            info!(path = %self.path.display(), "source changed; reloading dataset");
        }
        let dataset = Arc::new(load_dataset(&self.path, self.locale)?);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str =
        "Country,Mission Name,Mission Type,Year,Budget (in Billion $),Success Rate (%),Duration (in Days)";

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn translation_maps_known_labels_only() {
        assert_eq!(LabelLocale::En.translate("Crewed"), "Manned");
        assert_eq!(LabelLocale::En.translate("Uncrewed"), "Unmanned");
        assert_eq!(LabelLocale::En.translate("Probe"), "Probe");
        assert_eq!(LabelLocale::Pt.translate("Manned"), "Tripulada");
        assert_eq!(LabelLocale::Pt.translate("Unmanned"), "Não tripulada");
    }

    #[test]
    fn translation_is_idempotent() {
        for locale in [LabelLocale::En, LabelLocale::Pt] {
            for label in ["Crewed", "Uncrewed", "Manned", "Unmanned", "Probe", ""] {
                let once = locale.translate(label);
                assert_eq!(locale.translate(&once), once, "{locale:?} {label}");
            }
        }
    }

    #[test]
    fn loads_and_coerces_rows() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{HEADER}\nUSA,Apollo,Crewed,1969,25.4,100,8\nUSA,Probe X,Probe,N/A,12.5.3,,\"1,200\"\n"
        );
        let path = write_csv(&dir, "m.csv", &body);
        let ds = load_dataset(&path, LabelLocale::En).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.schema, Schema::complete());
        let first = &ds.records[0];
        assert_eq!(first.mission_type, "Manned");
        assert_eq!(first.year, Some(1969));
        assert_eq!(first.budget, Some(25.4));

        let second = &ds.records[1];
        assert_eq!(second.year, None);
        assert_eq!(second.budget, None);
        assert_eq!(second.success_rate, None);
        assert_eq!(second.duration, Some(1200.0));

        assert_eq!(ds.report.rows_read, 2);
        assert_eq!(ds.report.null_years, 1);
        assert_eq!(ds.report.null_values[&NumericColumn::Budget], 1);
        assert_eq!(ds.report.translated_types, 1);
    }

    #[test]
    fn budgets_with_misplaced_commas_are_null_and_exponents_parse() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{HEADER}\nBrazil,Amazonia,Uncrewed,2021,\"12,5\",90,30\nUSA,Juno,Uncrewed,2011,1.5e1,95,\"2,000\"\n"
        );
        let path = write_csv(&dir, "budgets.csv", &body);
        let ds = load_dataset(&path, LabelLocale::En).unwrap();

        let brazil = &ds.records[0];
        assert_eq!(brazil.budget, None);
        assert_eq!(brazil.budget_bracket(), None);

        let usa = &ds.records[1];
        assert_eq!(usa.budget, Some(15.0));
        assert_eq!(
            usa.budget_bracket(),
            Some(crate::types::BudgetBracket::From10To20)
        );
        assert_eq!(usa.duration, Some(2000.0));
        assert_eq!(ds.report.null_values[&NumericColumn::Budget], 1);
    }

    #[test]
    fn missing_required_columns_are_all_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "bad.csv", "Mission Name,Budget (in Billion $)\nX,1\n");
        match load_dataset(&path, LabelLocale::En) {
            Err(LoadError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["Country", "Mission Type", "Year"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_optional_columns_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "partial.csv",
            "Country,Mission Name,Mission Type,Year,Success Rate (%)\nUSA,A,Probe,2000,90\n",
        );
        let ds = load_dataset(&path, LabelLocale::En).unwrap();
        assert!(ds.schema.has(NumericColumn::SuccessRate));
        assert!(!ds.schema.has(NumericColumn::Budget));
        assert_eq!(
            ds.report.missing_columns,
            vec![NumericColumn::Budget, NumericColumn::Duration]
        );
        assert_eq!(ds.records[0].budget, None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(&dir.path().join("nope.csv"), LabelLocale::En).unwrap_err();
        assert!(matches!(err, LoadError::SourceNotFound { .. }));
    }

    #[test]
    fn header_only_file_is_an_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "empty.csv", &format!("{HEADER}\n"));
        let ds = load_dataset(&path, LabelLocale::En).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn cache_reuses_until_source_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "c.csv", &format!("{HEADER}\nUSA,A,Probe,2000,1,90,10\n"));
        let cache = DatasetCache::new(&path, LabelLocale::En);

        let a = cache.get().unwrap();
        let b = cache.get().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        write_csv(
            &dir,
            "c.csv",
            &format!("{HEADER}\nUSA,A,Probe,2000,1,90,10\nRussia,B,Probe,2001,2,80,20\n"),
        );
        let c = cache.get().unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.len(), 2);

        cache.invalidate();
        let d = cache.get().unwrap();
        assert!(!Arc::ptr_eq(&c, &d));
    }

    #[test]
    fn cache_does_not_keep_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.csv");
        let cache = DatasetCache::new(&path, LabelLocale::En);
        assert_eq!(cache.path(), path.as_path());
        let err = cache.get().unwrap_err();
        assert!(err.to_string().contains("late.csv"));

        write_csv(&dir, "late.csv", &format!("{HEADER}\nUSA,A,Probe,2000,1,90,10\n"));
        assert_eq!(cache.get().unwrap().len(), 1);
    }
}
