//! Per-company pipeline metrics.

use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

use pipelens_ingest::{TableView, dates::days_between};
use pipelens_shared::{EventRow, FilterCriteria};

use crate::filter;
use crate::group::{by_company, distinct_candidates};

/// `num / den` as a percentage, or 0 when `den` is 0.
pub fn percent(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64 * 100.0
    }
}

/// [`percent`] clamped to `[0, 100]`. Not rounded: thresholds compare the exact rate.
pub fn bounded_percent(num: usize, den: usize) -> f64 {
    percent(num, den).clamp(0.0, 100.0)
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Serialize a rate rounded to one decimal.
pub(crate) fn rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round1(*value))
}

/// Metrics for one company, recomputed on every call.
///
/// Rates hold the exact value and are rounded only when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyMetrics {
    pub company: String,
    /// Distinct candidates put forward.
    pub recommendations: usize,
    pub submissions: usize,
    /// Rows with a submission date and a status.
    pub documents_returned: usize,
    /// Rows with an interview date.
    pub interviews_in_progress: usize,
    #[serde(serialize_with = "rounded")]
    pub document_pass_rate: f64,
    pub first_round_interviews: usize,
    pub first_round_passed: usize,
    #[serde(serialize_with = "rounded")]
    pub first_round_pass_rate: f64,
    pub final_interviews: usize,
    pub offers: usize,
    /// Offers over recommendations.
    #[serde(serialize_with = "rounded")]
    pub offer_rate: f64,
    /// Mean days from submission to offer, truncated. 0 with no samples.
    pub avg_cycle_days: i64,
}

impl CompanyMetrics {
    /// Composite score used for top-N selection.
    pub fn score(&self) -> f64 {
        self.offers as f64 * 0.7 + self.offer_rate * 0.3
    }

    fn from_rows(company: &str, rows: &[&EventRow]) -> Self {
        let count = |keep: &dyn Fn(&EventRow) -> bool| rows.iter().filter(|r| keep(**r)).count();

        let recommendations = distinct_candidates(rows.iter().copied(), |_| true);
        let submissions = count(&|r| r.submitted_at.is_some());
        let documents_returned = count(&|r| r.submitted_at.is_some() && r.status.is_some());
        let interviews_in_progress = count(&|r| r.interviewed());
        let first_round_interviews = count(&|r| r.interviewed() && r.interview_round == Some(1));
        let first_round_passed = count(&|r| {
            r.interviewed() && (r.interview_round.is_some_and(|n| n > 1) || r.is_final())
        });
        let final_interviews = count(&|r| r.interviewed() && r.is_final());
        let offers = count(&|r| r.offered());

        Self {
            company: company.to_string(),
            recommendations,
            submissions,
            documents_returned,
            interviews_in_progress,
            document_pass_rate: bounded_percent(interviews_in_progress, submissions),
            first_round_interviews,
            first_round_passed,
            first_round_pass_rate: bounded_percent(first_round_passed, first_round_interviews),
            final_interviews,
            offers,
            offer_rate: bounded_percent(offers, recommendations),
            avg_cycle_days: avg_cycle_days(rows),
        }
    }
}

fn avg_cycle_days(rows: &[&EventRow]) -> i64 {
    let samples: Vec<i64> = rows
        .iter()
        .filter_map(|r| Some(days_between(r.submitted_at?, r.offered_at?)))
        .collect();
    if samples.is_empty() {
        return 0;
    }
    let mean = samples.iter().sum::<i64>() as f64 / samples.len() as f64;
    mean.trunc() as i64
}

/// Metrics for every company in an already-filtered view, in first-appearance order.
pub fn metrics_for(view: &TableView<'_>) -> Vec<CompanyMetrics> {
    by_company(view)
        .iter()
        .map(|(company, rows)| CompanyMetrics::from_rows(company, rows))
        .collect()
}

/// Filter, then compute one metrics row per remaining company.
///
/// Empty input yields an empty list.
#[instrument(skip_all, fields(rows = view.len()))]
pub fn company_metrics(view: &TableView<'_>, criteria: &FilterCriteria) -> Vec<CompanyMetrics> {
    let filtered = filter::apply(view, criteria);
    let metrics = metrics_for(&filtered);
    debug!(kept = filtered.len(), companies = metrics.len(), "company metrics");
    metrics
}

// ---------------------------------------------------------------------------
// KPI summary
// ---------------------------------------------------------------------------

/// Headline numbers across a metrics set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub companies: usize,
    pub total_recommendations: usize,
    pub total_submissions: usize,
    pub total_offers: usize,
    /// Unweighted mean of the per-company offer rates.
    pub mean_offer_rate: f64,
}

impl KpiSummary {
    pub fn from_metrics(metrics: &[CompanyMetrics]) -> Self {
        if metrics.is_empty() {
            return Self::default();
        }
        let mean = metrics.iter().map(|m| m.offer_rate).sum::<f64>() / metrics.len() as f64;
        Self {
            companies: metrics.len(),
            total_recommendations: metrics.iter().map(|m| m.recommendations).sum(),
            total_submissions: metrics.iter().map(|m| m.submissions).sum(),
            total_offers: metrics.iter().map(|m| m.offers).sum(),
            mean_offer_rate: round1(mean),
        }
    }
}
