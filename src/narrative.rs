//! Default prose for the dashboard and the report.
//!
//! The text is static apart from the introduction, which quotes the size
//! and year span of the loaded dataset.

use crate::figures::Section;
use crate::types::SummaryStats;
use crate::util::format_int;

pub const DEFAULT_TITLE: &str = "Global Space Exploration Analysis";

pub fn introduction(summary: &SummaryStats) -> String {
    let span = match (summary.first_year, summary.last_year) {
        (Some(first), Some(last)) => format!("recorded between {first} and {last}"),
        _ => "with no recorded launch years".to_string(),
    };
    format!(
        "This report explores a dataset of global space exploration covering {} missions {}. \
         It looks at which countries lead the field, which kinds of mission dominate, and what \
         the data says about the factors behind mission success.",
        format_int(summary.records),
        span
    )
}

pub fn section_intro(section: Section) -> &'static str {
    match section {
        Section::Country => {
            "This section looks at how individual countries take part in space exploration, \
             highlighting the leaders by mission count and by investment. Activity is concentrated \
             in a handful of major powers, each with its own spending pattern."
        }
        Section::MissionType => {
            "This section looks at the kinds of space mission, how often each occurs, what they \
             cost and how the mix has changed over time. The most common types show where the \
             priorities of space programs lie and how resources are allocated."
        }
        Section::Success => {
            "This section looks at mission success rates and at the factors that may influence \
             them. Understanding where missions succeed is central to planning and executing the \
             missions that follow."
        }
    }
}

/// Short reading note shown under a chart, keyed by figure id.
pub fn chart_note(figure_id: &str) -> Option<&'static str> {
    let note = match figure_id {
        "missions-vs-budget" => {
            "Each point is a country with at least ten missions; marker size grows with the \
             number of missions."
        }
        "type-evolution" => "Yearly mission counts for the five most frequent mission types.",
        "success-by-budget" => {
            "Boxes span the middle half of the success rates in each budget bracket; whiskers \
             reach the furthest value within 1.5 times the box height."
        }
        "success-evolution" => {
            "The line is the mean success rate per year; the bars count the missions with a \
             recorded success rate."
        }
        _ => return None,
    };
    Some(note)
}

pub const CONCLUSION: [&str; 4] = [
    "Exploring the global space mission data reveals clear patterns in a strategic field. The \
     evidence sheds light on how countries, budgets, mission types and outcomes relate to each \
     other.",
    "Space exploration remains dominated by a relatively small number of nations, with most of \
     the investment concentrated in the traditional space powers. The uneven spread of missions \
     and budgets mirrors the geopolitical and economic realities of the modern space race.",
    "Budget and success are related, but the relationship is neither linear nor universal. \
     Lower-budget missions can reach success rates comparable to expensive ones when they rely on \
     mature technology and experienced teams.",
    "The evolution of mission types over the decades shows how the sector has changed. The rise \
     of uncrewed missions reflects a shift toward cost efficiency and lower risk to people, while \
     crewed missions keep their symbolic and scientific weight.",
];

pub const KEY_FINDINGS: [&str; 4] = [
    "Global leadership: a few nations dominate space exploration, with a clear concentration of \
     resources and technical capability.",
    "Technological change: uncrewed missions are on the rise, following advances in automation \
     and onboard autonomy.",
    "Investment and success: larger budgets go with higher success rates, with diminishing returns \
     above certain levels of investment.",
    "International collaboration: joint missions tend to report above-average success rates, \
     pointing to the value of technical and scientific cooperation.",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn introduction_quotes_dataset_size() {
        let summary = SummaryStats {
            records: 1250,
            first_year: Some(1957),
            last_year: Some(2024),
            countries: 3,
            mission_types: 2,
            mean_success_rate: None,
            mean_budget: None,
        };
        let text = introduction(&summary);
        assert!(text.contains("1,250 missions"));
        assert!(text.contains("between 1957 and 2024"));
    }

    #[test]
    fn introduction_without_years() {
        let summary = SummaryStats {
            records: 0,
            first_year: None,
            last_year: None,
            countries: 0,
            mission_types: 0,
            mean_success_rate: None,
            mean_budget: None,
        };
        assert!(introduction(&summary).contains("no recorded launch years"));
    }
}
