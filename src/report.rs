//! Report formatting for layouts, verifications and uniformity runs.
//!
//! Pure functions: (data, OutputFormat) → String.
//! No I/O, no side effects.

use serde::Serialize;

use crate::stats::UniformityReport;
use crate::types::{Catalog, OutputFormat, RoundLayout, VerificationResult, grid_columns};

// ============================================================================
// LAYOUT
// ============================================================================

#[derive(Serialize)]
struct SlotView<'a> {
    slot: usize,
    item: usize,
    source: &'a str,
    label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_target: Option<bool>,
}

/// Format a round layout. Target flags are only shown when `reveal` is set.
pub fn format_layout(
    layout: &RoundLayout,
    catalog: &Catalog,
    reveal: bool,
    format: OutputFormat,
) -> String {
    let views: Vec<SlotView> = layout
        .slots()
        .iter()
        .enumerate()
        .filter_map(|(slot, entry)| {
            let item = catalog.get(entry.item)?;
            Some(SlotView {
                slot,
                item: item.id.index(),
                source: &item.source,
                label: &item.label,
                is_target: reveal.then_some(entry.is_target),
            })
        })
        .collect();

    match format {
        OutputFormat::Human => format_layout_human(&views),
        OutputFormat::Json => to_json(&views),
    }
}

fn format_layout_human(views: &[SlotView]) -> String {
    let columns = grid_columns(views.len());
    let width = views.iter().map(|v| v.label.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for row in views.chunks(columns) {
        let cells: Vec<String> = row
            .iter()
            .map(|v| {
                let marker = match v.is_target {
                    Some(true) => "*",
                    Some(false) | None => " ",
                };
                format!("[{}]{} {:<width$}", v.slot, marker, v.label, width = width)
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }

    if views.iter().any(|v| v.is_target.is_some()) {
        out.push_str("\n* = target\n");
    }
    out
}

// ============================================================================
// VERIFICATION
// ============================================================================

/// Format the outcome of a verification.
pub fn format_verification(result: &VerificationResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => {
            let tally = result.tally();
            let headline = if result.is_success() {
                "PASSED: selection matches every target"
            } else {
                "FAILED: selection does not match"
            };
            format!(
                "{}\n  correct: {}/{}\n  wrong:   {}\n  missed:  {}\n",
                headline, tally.correct, tally.target_count, tally.wrong, tally.missed
            )
        }
        OutputFormat::Json => to_json(result),
    }
}

// ============================================================================
// UNIFORMITY
// ============================================================================

#[derive(Serialize)]
struct UniformityView<'a> {
    #[serde(flatten)]
    report: &'a UniformityReport,
    chi_square: crate::stats::ChiSquare,
    max_relative_deviation: f64,
    uniform: bool,
}

/// Format a shuffle uniformity report.
pub fn format_uniformity(report: &UniformityReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_uniformity_human(report),
        OutputFormat::Json => to_json(&UniformityView {
            report,
            chi_square: report.chi_square(),
            max_relative_deviation: report.max_relative_deviation(),
            uniform: report.is_uniform(),
        }),
    }
}

fn format_uniformity_human(report: &UniformityReport) -> String {
    let chi = report.chi_square();
    let mut out = String::new();

    out.push_str("=== Slot × Item Occurrences ===\n");
    out.push_str("slot ");
    for item in 0..report.item_count {
        out.push_str(&format!("{:>8}", item));
    }
    out.push('\n');
    for (slot, row) in report.occurrences.iter().enumerate() {
        out.push_str(&format!("{:>4} ", slot));
        for count in row {
            out.push_str(&format!("{:>8}", count));
        }
        out.push('\n');
    }
    out.push('\n');

    out.push_str("=== Summary ===\n");
    out.push_str(&format!("Rounds:               {}\n", report.rounds));
    out.push_str(&format!(
        "Items / targets:      {} / {}\n",
        report.item_count, report.target_count
    ));
    out.push_str(&format!("Expected per cell:    {:.1}\n", report.expected_per_cell()));
    out.push_str(&format!(
        "Max deviation:        {:.2}%\n",
        report.max_relative_deviation() * 100.0
    ));
    out.push_str(&format!(
        "Chi-square:           {:.2} (df {}, critical {:.2} at p=0.001)\n",
        chi.statistic, chi.degrees_of_freedom, chi.critical_value
    ));
    out.push_str(&format!(
        "Target invariant:     {} violations\n",
        report.invariant_violations
    ));
    let verdict = if report.rounds == 0 {
        "no rounds drawn"
    } else if report.is_uniform() {
        "uniform"
    } else {
        "BIASED"
    };
    out.push_str(&format!("Verdict:              {}\n", verdict));

    out
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::PuzzleRound;
    use crate::stats::tally_layouts;
    use crate::types::SelectionTally;

    fn catalog() -> Catalog {
        Catalog::with_targets(
            (1..=9).map(|n| format!("images/image{}.jpg", n)),
            |i, _| i < 4,
        )
        .unwrap()
    }

    #[test]
    fn human_layout_is_three_by_three() {
        let round = PuzzleRound::seeded(catalog(), 1);
        let out = format_layout(round.layout(), round.catalog(), false, OutputFormat::Human);
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("[0]"));
        assert!(out.contains("[8]"));
        assert!(!out.contains('*'), "targets must stay hidden");
    }

    #[test]
    fn human_layout_reveals_targets_on_request() {
        let round = PuzzleRound::seeded(catalog(), 1);
        let out = format_layout(round.layout(), round.catalog(), true, OutputFormat::Human);
        // 4 markers plus the legend
        assert_eq!(out.matches('*').count(), 5);
        assert!(out.contains("* = target"));
    }

    #[test]
    fn json_layout_hides_targets_unless_revealed() {
        let round = PuzzleRound::seeded(catalog(), 2);

        let hidden = format_layout(round.layout(), round.catalog(), false, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&hidden).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 9);
        assert!(parsed[0].get("is_target").is_none());

        let shown = format_layout(round.layout(), round.catalog(), true, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&shown).unwrap();
        let targets = parsed
            .as_array()
            .unwrap()
            .iter()
            .filter(|v| v["is_target"] == true)
            .count();
        assert_eq!(targets, 4);
    }

    #[test]
    fn json_layout_slot_matches_item() {
        let round = PuzzleRound::seeded(catalog(), 3);
        let out = format_layout(round.layout(), round.catalog(), false, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        let first = round.item_at(0).unwrap();
        assert_eq!(parsed[0]["item"], first.id.index());
        assert_eq!(parsed[0]["source"], first.source.as_str());
    }

    #[test]
    fn verification_human_shows_counts() {
        let result = VerificationResult::Failed(SelectionTally {
            correct: 3,
            wrong: 1,
            missed: 1,
            target_count: 4,
        });
        let out = format_verification(&result, OutputFormat::Human);
        assert!(out.starts_with("FAILED"));
        assert!(out.contains("correct: 3/4"));
        assert!(out.contains("wrong:   1"));
    }

    #[test]
    fn verification_json_is_tagged() {
        let result = VerificationResult::Passed(SelectionTally {
            correct: 4,
            wrong: 0,
            missed: 0,
            target_count: 4,
        });
        let out = format_verification(&result, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["outcome"], "passed");
    }

    #[test]
    fn uniformity_human_has_matrix_and_verdict() {
        let report = tally_layouts(&catalog(), 9_000, 4);
        let out = format_uniformity(&report, OutputFormat::Human);
        assert!(out.contains("=== Slot × Item Occurrences ==="));
        assert!(out.contains("Rounds:               9000"));
        assert!(out.contains("df 64"));
    }

    #[test]
    fn uniformity_human_without_rounds_has_no_verdict() {
        let report = tally_layouts(&catalog(), 0, 4);
        let text = format_uniformity(&report, OutputFormat::Human);
        assert!(text.contains("no rounds drawn"));
        assert!(!text.contains("uniform\n"));
    }

    #[test]
    fn uniformity_json_includes_statistics() {
        let report = tally_layouts(&catalog(), 2_000, 5);
        let out = format_uniformity(&report, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["rounds"], 2_000);
        assert_eq!(parsed["chi_square"]["degrees_of_freedom"], 64);
        assert_eq!(parsed["occurrences"].as_array().unwrap().len(), 9);
        assert!(parsed["uniform"].is_boolean());
    }
}
