//! Monthly baselines.
//!
//! The baseline of a metric is the mean of its normalized values across all
//! of a sheet's blocks in the same reference-year month as the latest date.
//! Identifier metrics are never aggregated, and samples that do not
//! normalize count toward neither the sum nor the count. A metric with no
//! samples has no baseline.

use kpi_grid::{DateBlock, DateLabel, MetricKind, normalize};
use serde::Serialize;

/// Baseline for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricAverage {
    /// Metric name.
    pub metric: &'static str,
    /// Mean of the month's samples.
    pub average: f64,
    /// Number of samples that normalized.
    pub samples: usize,
}

/// A sheet's baselines for one month, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyBaseline {
    /// Month the baseline covers.
    pub month: u32,
    /// Metrics with at least one sample.
    pub averages: Vec<MetricAverage>,
}

impl MonthlyBaseline {
    /// Computes the baseline of `blocks` for the month of `latest`.
    #[must_use]
    pub fn compute(blocks: &[DateBlock], latest: DateLabel) -> Self {
        let in_month: Vec<&DateBlock> = blocks
            .iter()
            .filter(|b| b.label.same_month(&latest))
            .collect();

        let mut sums: Vec<(&'static str, f64, usize)> = kpi_grid::METRICS
            .iter()
            .filter(|m| m.kind != MetricKind::Identifier)
            .map(|m| (m.name, 0.0, 0))
            .collect();

        for block in &in_month {
            for (name, sum, count) in &mut sums {
                if let Some(value) = normalize(block.metrics.get(name)) {
                    *sum += value;
                    *count += 1;
                }
            }
        }

        let averages = sums
            .into_iter()
            .filter(|(_, _, count)| *count > 0)
            .map(|(metric, sum, samples)| MetricAverage {
                metric,
                average: sum / samples as f64,
                samples,
            })
            .collect();

        Self {
            month: latest.month(),
            averages,
        }
    }

    /// Baseline for a metric, if it had samples.
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<&MetricAverage> {
        self.averages.iter().find(|a| a.metric == metric)
    }
}
