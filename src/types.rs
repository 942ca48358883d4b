use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tabled::Tabled;

use crate::aggregate::BoxStats;
use crate::util::{display_count, display_opt_pct, display_opt_billions, display_pct, display_billions};

pub const COL_COUNTRY: &str = "Country";
pub const COL_MISSION_NAME: &str = "Mission Name";
pub const COL_MISSION_TYPE: &str = "Mission Type";
pub const COL_YEAR: &str = "Year";
pub const COL_BUDGET: &str = "Budget (in Billion $)";
pub const COL_SUCCESS_RATE: &str = "Success Rate (%)";
pub const COL_DURATION: &str = "Duration (in Days)";

pub const REQUIRED_COLUMNS: [&str; 4] = [COL_COUNTRY, COL_MISSION_NAME, COL_MISSION_TYPE, COL_YEAR];

/// One CSV row exactly as read, every field kept as optional text.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Country", default)]
    pub country: Option<String>,
    #[serde(rename = "Mission Name", default)]
    pub mission_name: Option<String>,
    #[serde(rename = "Mission Type", default)]
    pub mission_type: Option<String>,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "Budget (in Billion $)", default)]
    pub budget: Option<String>,
    #[serde(rename = "Success Rate (%)", default)]
    pub success_rate: Option<String>,
    #[serde(rename = "Duration (in Days)", default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Mission Name")]
    pub mission_name: String,
    #[serde(rename = "Mission Type")]
    pub mission_type: String,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Budget (in Billion $)")]
    pub budget: Option<f64>,
    #[serde(rename = "Success Rate (%)")]
    pub success_rate: Option<f64>,
    #[serde(rename = "Duration (in Days)")]
    pub duration: Option<f64>,
}

impl MissionRecord {
    pub fn value(&self, column: NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::Budget => self.budget,
            NumericColumn::SuccessRate => self.success_rate,
            NumericColumn::Duration => self.duration,
        }
    }

    pub fn budget_bracket(&self) -> Option<BudgetBracket> {
        self.budget.and_then(BudgetBracket::from_budget)
    }
}

/// Optional numeric columns. Their absence disables the aggregations that
/// read them instead of failing the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NumericColumn {
    Budget,
    SuccessRate,
    Duration,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 3] = [
        NumericColumn::Budget,
        NumericColumn::SuccessRate,
        NumericColumn::Duration,
    ];

    pub fn header(self) -> &'static str {
        match self {
            NumericColumn::Budget => COL_BUDGET,
            NumericColumn::SuccessRate => COL_SUCCESS_RATE,
            NumericColumn::Duration => COL_DURATION,
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Ordinal budget category, in billions.
///
/// Brackets are lower-inclusive; 100 belongs to the last one. Anything
/// outside `[0, 100]` has no bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BudgetBracket {
    UpTo1,
    From1To2,
    From2To5,
    From5To10,
    From10To20,
    From20To50,
    From50To100,
}

impl BudgetBracket {
    pub const ALL: [BudgetBracket; 7] = [
        BudgetBracket::UpTo1,
        BudgetBracket::From1To2,
        BudgetBracket::From2To5,
        BudgetBracket::From5To10,
        BudgetBracket::From10To20,
        BudgetBracket::From20To50,
        BudgetBracket::From50To100,
    ];

    const EDGES: [f64; 8] = [0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0];

    pub fn from_budget(value: f64) -> Option<BudgetBracket> {
        if !(0.0..=100.0).contains(&value) {
            return None;
        }
        Self::ALL
            .iter()
            .copied()
            .rev()
            .find(|b| value >= b.bounds().0)
    }

    /// `(lower, upper)` in billions.
    pub fn bounds(self) -> (f64, f64) {
        let i = self as usize;
        (Self::EDGES[i], Self::EDGES[i + 1])
    }

    pub fn label(self) -> &'static str {
        match self {
            BudgetBracket::UpTo1 => "0-1B",
            BudgetBracket::From1To2 => "1-2B",
            BudgetBracket::From2To5 => "2-5B",
            BudgetBracket::From5To10 => "5-10B",
            BudgetBracket::From10To20 => "10-20B",
            BudgetBracket::From20To50 => "20-50B",
            BudgetBracket::From50To100 => "50-100B",
        }
    }
}

impl fmt::Display for BudgetBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for BudgetBracket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CountryCountRow {
    #[serde(rename = "Country")]
    #[tabled(rename = "Country")]
    pub country: String,
    #[serde(rename = "Missions")]
    #[tabled(rename = "Missions", display_with = "display_count")]
    pub missions: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CountryBudgetRow {
    #[serde(rename = "Country")]
    #[tabled(rename = "Country")]
    pub country: String,
    #[serde(rename = "TotalBudget")]
    #[tabled(rename = "TotalBudget", display_with = "display_billions")]
    pub total_budget: f64,
    #[serde(rename = "MeanBudget")]
    #[tabled(rename = "MeanBudget", display_with = "display_opt_billions")]
    pub mean_budget: Option<f64>,
    #[serde(rename = "BudgetSamples")]
    #[tabled(rename = "BudgetSamples")]
    pub budget_samples: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CountryVolumeRow {
    #[serde(rename = "Country")]
    #[tabled(rename = "Country")]
    pub country: String,
    #[serde(rename = "Missions")]
    #[tabled(rename = "Missions", display_with = "display_count")]
    pub missions: usize,
    #[serde(rename = "MeanBudget")]
    #[tabled(rename = "MeanBudget", display_with = "display_opt_billions")]
    pub mean_budget: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TypeCountRow {
    #[serde(rename = "MissionType")]
    #[tabled(rename = "MissionType")]
    pub mission_type: String,
    #[serde(rename = "Missions")]
    #[tabled(rename = "Missions", display_with = "display_count")]
    pub missions: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TypeBudgetRow {
    #[serde(rename = "MissionType")]
    #[tabled(rename = "MissionType")]
    pub mission_type: String,
    #[serde(rename = "MeanBudget")]
    #[tabled(rename = "MeanBudget", display_with = "display_opt_billions")]
    pub mean_budget: Option<f64>,
    #[serde(rename = "BudgetSamples")]
    #[tabled(rename = "BudgetSamples")]
    pub budget_samples: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TypeYearRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "MissionType")]
    #[tabled(rename = "MissionType")]
    pub mission_type: String,
    #[serde(rename = "Missions")]
    #[tabled(rename = "Missions", display_with = "display_count")]
    pub missions: usize,
}

/// Mean success rate of one group (a country or a mission type).
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct SuccessRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "MeanSuccessRate")]
    #[tabled(rename = "MeanSuccessRate", display_with = "display_pct")]
    pub mean_success: f64,
    #[serde(rename = "Samples")]
    #[tabled(rename = "Samples")]
    pub samples: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct BracketSuccessRow {
    #[serde(rename = "BudgetBracket")]
    #[tabled(rename = "BudgetBracket")]
    pub bracket: BudgetBracket,
    #[serde(rename = "Samples")]
    #[tabled(rename = "Samples")]
    pub samples: usize,
    #[serde(rename = "MeanSuccessRate")]
    #[tabled(rename = "MeanSuccessRate", display_with = "display_opt_pct")]
    pub mean_success: Option<f64>,
    #[serde(rename = "MedianSuccessRate")]
    #[tabled(rename = "MedianSuccessRate", display_with = "display_opt_pct")]
    pub median_success: Option<f64>,
    #[serde(skip)]
    #[tabled(skip)]
    pub distribution: Option<BoxStats>,
    #[serde(skip)]
    #[tabled(skip)]
    pub values: Vec<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct YearSuccessRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "MeanSuccessRate")]
    #[tabled(rename = "MeanSuccessRate", display_with = "display_opt_pct")]
    pub mean_success: Option<f64>,
    #[serde(rename = "Samples")]
    #[tabled(rename = "Samples")]
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub records: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub countries: usize,
    pub mission_types: usize,
    pub mean_success_rate: Option<f64>,
    pub mean_budget: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bracket_boundaries_are_lower_inclusive() {
        assert_eq!(BudgetBracket::from_budget(0.0), Some(BudgetBracket::UpTo1));
        assert_eq!(BudgetBracket::from_budget(0.999), Some(BudgetBracket::UpTo1));
        assert_eq!(BudgetBracket::from_budget(1.0), Some(BudgetBracket::From1To2));
        assert_eq!(BudgetBracket::from_budget(50.0), Some(BudgetBracket::From50To100));
        assert_eq!(BudgetBracket::from_budget(100.0), Some(BudgetBracket::From50To100));
    }

    #[test]
    fn out_of_range_budgets_have_no_bracket() {
        assert_eq!(BudgetBracket::from_budget(-0.5), None);
        assert_eq!(BudgetBracket::from_budget(100.01), None);
        assert_eq!(BudgetBracket::from_budget(f64::NAN), None);
    }

    #[test]
    fn record_without_budget_has_no_bracket() {
        let record = MissionRecord {
            country: "A".into(),
            mission_name: "M".into(),
            mission_type: "Manned".into(),
            year: Some(2000),
            budget: None,
            success_rate: Some(90.0),
            duration: None,
        };
        assert_eq!(record.budget_bracket(), None);
    }

    #[test]
    fn bracket_labels_follow_order() {
        let labels: Vec<_> = BudgetBracket::ALL.iter().map(|b| b.label()).collect();
        assert_eq!(
            labels,
            ["0-1B", "1-2B", "2-5B", "5-10B", "10-20B", "20-50B", "50-100B"]
        );
    }

    proptest! {
        #[test]
        fn bracket_contains_its_value(value in 0.0f64..=100.0) {
            let bracket = BudgetBracket::from_budget(value).unwrap();
            let (lo, hi) = bracket.bounds();
            prop_assert!(value >= lo);
            if bracket == BudgetBracket::From50To100 {
                prop_assert!(value <= hi);
            } else {
                prop_assert!(value < hi);
            }
        }
    }
}
