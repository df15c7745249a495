//! Aggregate statistics over accepted samples and the HTML summary.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::sample::Sample;

/// Per-sample aggregates kept for the report.
#[derive(Debug, Clone, Copy)]
pub struct SampleStat {
    pub places: usize,
    pub transitions: usize,
    /// Sum of the per-place average markings.
    pub total_average_marking: f64,
    /// Sum of the steady-state probabilities, ~1 for a healthy solve.
    pub probability_mass: f64,
}

impl SampleStat {
    pub fn of(sample: &Sample) -> Self {
        Self {
            places: sample.net.places(),
            transitions: sample.net.transitions(),
            total_average_marking: sample.analysis.average_markings.iter().sum(),
            probability_mass: sample.analysis.steady_state_probs.iter().sum(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetStats {
    pub num_samples: usize,
    pub avg_places: f64,
    pub avg_transitions: f64,
    pub avg_markings: f64,
    pub avg_steady_state_probs: f64,
}

pub fn calculate_stats(results: &[SampleStat]) -> DatasetStats {
    if results.is_empty() {
        return DatasetStats::default();
    }
    let n = results.len() as f64;
    DatasetStats {
        num_samples: results.len(),
        avg_places: results.iter().map(|s| s.places as f64).sum::<f64>() / n,
        avg_transitions: results.iter().map(|s| s.transitions as f64).sum::<f64>() / n,
        avg_markings: results.iter().map(|s| s.total_average_marking).sum::<f64>() / n,
        avg_steady_state_probs: results.iter().map(|s| s.probability_mass).sum::<f64>() / n,
    }
}

pub fn render_html(stats: &DatasetStats) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>SPN Dataset Statistics</title>
    <style>
        body {{ font-family: sans-serif; }}
        table {{ border-collapse: collapse; }}
        th, td {{ border: 1px solid #ddd; padding: 8px; }}
        th {{ background-color: #f2f2f2; }}
    </style>
</head>
<body>
    <h1>SPN Dataset Statistics</h1>
    <table>
        <tr><th>Statistic</th><th>Value</th></tr>
        <tr><td>Number of samples</td><td>{num_samples}</td></tr>
        <tr><td>Average number of places</td><td>{avg_places}</td></tr>
        <tr><td>Average number of transitions</td><td>{avg_transitions}</td></tr>
        <tr><td>Average number of markings</td><td>{avg_markings}</td></tr>
        <tr><td>Average sum of steady state probabilities</td><td>{avg_probs}</td></tr>
    </table>
</body>
</html>
"#,
        num_samples = stats.num_samples,
        avg_places = stats.avg_places,
        avg_transitions = stats.avg_transitions,
        avg_markings = stats.avg_markings,
        avg_probs = stats.avg_steady_state_probs,
    )
}

pub fn write_report(path: &Path, stats: &DatasetStats) -> Result<()> {
    fs::write(path, render_html(stats))
        .with_context(|| format!("failed to write report {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(places: usize, transitions: usize, marking: f64, mass: f64) -> SampleStat {
        SampleStat {
            places,
            transitions,
            total_average_marking: marking,
            probability_mass: mass,
        }
    }

    #[test]
    fn averages_over_all_samples() {
        let stats = calculate_stats(&[stat(2, 1, 1.0, 1.0), stat(4, 3, 3.0, 1.0)]);
        assert_eq!(stats.num_samples, 2);
        assert!((stats.avg_places - 3.0).abs() < 1e-12);
        assert!((stats.avg_transitions - 2.0).abs() < 1e-12);
        assert!((stats.avg_markings - 2.0).abs() < 1e-12);
        assert!((stats.avg_steady_state_probs - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_results_yield_zeroed_stats() {
        assert_eq!(calculate_stats(&[]), DatasetStats::default());
    }

    #[test]
    fn html_contains_every_statistic() {
        let html = render_html(&calculate_stats(&[stat(3, 2, 1.5, 1.0)]));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<td>3</td>"));
        assert!(html.contains("<td>1.5</td>"));
        assert!(html.contains("Average sum of steady state probabilities"));
    }
}
