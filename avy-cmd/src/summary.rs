//! Text report of a reconciled run.

use crate::pipeline::Reconciled;
use avy_data::statistics::{compare_levels, main_problem_distribution, summarize_levels};
use std::fmt::Write;

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

/// Render counts, the main-problem distribution per source and the
/// forecast-vs-observation level agreement.
pub fn render_summary(result: &Reconciled) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} forecasts, {} observations, {} problems, {} rejected records",
        result.forecasts.len(),
        result.observations.len(),
        result.problem_count(),
        result.rejected
    );

    for (label, dangers) in [
        ("Forecast", &result.forecasts),
        ("Observation", &result.observations),
    ] {
        let _ = writeln!(out, "\n{} main problems", label);
        let counts = main_problem_distribution(dangers);
        if counts.is_empty() {
            let _ = writeln!(out, "  none");
        }
        for count in counts {
            let category = count
                .category
                .map_or("Unclassified", |category| category.label());
            let _ = writeln!(
                out,
                "  {:>5} {:<28} {:<24} {}",
                count.region_id, count.region_name, category, count.count
            );
        }
    }

    let comparisons = compare_levels(&result.forecasts, &result.observations);
    let summary = summarize_levels(&comparisons);
    let _ = writeln!(out, "\nDanger level agreement");
    let _ = writeln!(out, "  compared           {}", summary.compared);
    let _ = writeln!(
        out,
        "  agreed             {} ({:.1}%)",
        summary.agreed,
        percent(summary.agreed, summary.compared)
    );
    let _ = writeln!(
        out,
        "  forecast too low   {} ({:.1}%)",
        summary.forecast_too_low,
        percent(summary.forecast_too_low, summary.compared)
    );
    let _ = writeln!(
        out,
        "  forecast too high  {} ({:.1}%)",
        summary.forecast_too_high,
        percent(summary.forecast_too_high, summary.compared)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let text = render_summary(&Reconciled::default());
        assert!(text.starts_with("0 forecasts, 0 observations, 0 problems, 0 rejected records"));
        assert!(text.contains("Forecast main problems\n  none"));
        assert!(text.contains("agreed             0 (0.0%)"));
    }
}
