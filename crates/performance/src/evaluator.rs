//! Recomputes engagement rates for every variation that has been sent
//! and re-selects winners per template. Winner status is recomputed from
//! scratch on each run: a variation that stops meeting the bar loses the
//! mark, so a stale early lead cannot lock in a winner forever.

use outreach_core::types::EmailVariation;
use outreach_store::OutreachStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A variation needs this many sends before its rates are trusted.
pub const MIN_SENDS_FOR_WINNER: u64 = 30;

/// Absolute reply-rate floor for winner status.
pub const MIN_REPLY_RATE: f64 = 0.05;

/// A winner must beat the template's pooled average by this factor.
pub const WINNER_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EvaluationReport {
    pub variations_updated: usize,
    pub winners_marked: usize,
    pub winners_unmarked: usize,
}

/// Winner criteria against a template's pooled average reply rate. The
/// pool includes the candidate itself, so a lone variation can only win
/// on a zero average. The comparisons carry a small tolerance so a rate
/// sitting exactly on the bar (e.g. 15% against a 10% average) is not
/// rejected over a final-bit rounding difference.
pub fn meets_winner_bar(times_sent: u64, reply_rate: f64, template_avg: f64) -> bool {
    const EPS: f64 = 1e-9;
    times_sent >= MIN_SENDS_FOR_WINNER
        && reply_rate + EPS >= MIN_REPLY_RATE
        && reply_rate + EPS >= WINNER_MULTIPLIER * template_avg
}

fn reply_rate(v: &EmailVariation) -> f64 {
    if v.times_sent == 0 {
        0.0
    } else {
        v.times_replied as f64 / v.times_sent as f64
    }
}

pub struct PerformanceEvaluator {
    store: Arc<OutreachStore>,
}

impl PerformanceEvaluator {
    pub fn new(store: Arc<OutreachStore>) -> Self {
        Self { store }
    }

    /// One full evaluation pass over every variation with send history.
    pub fn run_once(&self) -> EvaluationReport {
        let mut report = EvaluationReport::default();

        let variations = self.store.variations_with_sends();
        let mut by_template: HashMap<Uuid, Vec<EmailVariation>> = HashMap::new();
        for v in variations {
            let sent = v.times_sent as f64;
            self.store.update_variation_rates(
                v.id,
                v.times_opened as f64 / sent,
                v.times_clicked as f64 / sent,
                v.times_replied as f64 / sent,
            );
            report.variations_updated += 1;
            by_template.entry(v.template_id).or_default().push(v);
        }

        for (template_id, group) in by_template {
            // Pooled benchmark: total replies over total sends across the
            // sufficient-data variations, so a high-volume variation
            // weighs more than a lucky small one.
            let (pool_replied, pool_sent) = group
                .iter()
                .filter(|v| v.times_sent >= MIN_SENDS_FOR_WINNER)
                .fold((0u64, 0u64), |(r, s), v| {
                    (r + v.times_replied, s + v.times_sent)
                });
            // No variation has reached the volume threshold yet: winner
            // selection for this template is skipped outright, leaving
            // any existing marks untouched.
            if pool_sent == 0 {
                continue;
            }
            let template_avg = pool_replied as f64 / pool_sent as f64;

            for v in &group {
                let should_win = meets_winner_bar(v.times_sent, reply_rate(v), template_avg);
                if should_win == v.is_winner {
                    continue;
                }
                self.store.set_winner(v.id, should_win);
                if should_win {
                    info!(
                        variation_id = %v.id,
                        template_id = %template_id,
                        reply_rate = reply_rate(v),
                        "variation marked as winner"
                    );
                    report.winners_marked += 1;
                } else {
                    info!(variation_id = %v.id, "variation no longer qualifies as winner");
                    report.winners_unmarked += 1;
                }
            }
        }

        metrics::counter!("performance.evaluations").increment(1);
        metrics::counter!("performance.winners_marked")
            .increment(report.winners_marked as u64);
        report
    }
}
