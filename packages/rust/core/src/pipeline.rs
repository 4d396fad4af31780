//! End-to-end analysis: filter → metrics → funnel → rules → specialized
//! aggregations → trend, collected into one serializable [`Analysis`].

use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument};

use pipelens_ingest::{EventTable, OptionalColumn};
use pipelens_shared::{DefaultsConfig, FilterCriteria, Result};

use crate::filter;
use crate::funnel::{self, Funnel};
use crate::metrics::{self, CompanyMetrics, KpiSummary};
use crate::ranking::{self, RankedCompany, SortOrder, SortPreset};
use crate::rules::{self, Alert, Insights, Recommendation};
use crate::specialized::{
    self, AdvisorActivity, IntroductionRate, LeadTime, RecommendationDepth, ScoutPerformance,
};
use crate::trend::{self, TrendPoint};

/// Knobs for [`analyze`].
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Companies kept by the score ranking.
    pub top_n: usize,
    /// Ordering of the metrics rows.
    pub sort: SortPreset,
    /// Overrides the preset's default direction.
    pub order: Option<SortOrder>,
    /// Restrict the funnel to one company.
    pub funnel_company: Option<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            sort: SortPreset::default(),
            order: None,
            funnel_company: None,
        }
    }
}

impl AnalysisOptions {
    /// Options from the `[defaults]` config section.
    pub fn from_defaults(defaults: &DefaultsConfig) -> Result<Self> {
        Ok(Self {
            top_n: defaults.top_n,
            sort: defaults.sort.parse()?,
            ..Self::default()
        })
    }
}

/// The five optional-column aggregations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecializedReport {
    pub introduction_by_company: Vec<IntroductionRate>,
    pub introduction_by_job: Vec<IntroductionRate>,
    pub recommendation_depth: Option<RecommendationDepth>,
    pub lead_time: Vec<LeadTime>,
    pub advisor_interviews: Vec<AdvisorActivity>,
    pub scout_performance: Vec<ScoutPerformance>,
}

/// Everything derived from one (table, criteria) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub criteria: FilterCriteria,
    /// SHA-256 of the source file, when loaded from bytes.
    pub fingerprint: Option<String>,
    /// Rows surviving the filter.
    pub rows: usize,
    pub metrics: Vec<CompanyMetrics>,
    pub kpis: KpiSummary,
    pub top: Vec<RankedCompany>,
    pub funnel: Funnel,
    pub alerts: Vec<Alert>,
    pub recommendations: Vec<Recommendation>,
    pub insights: Insights,
    pub specialized: SpecializedReport,
    pub trend: Vec<TrendPoint>,
    /// Optional columns no alias matched; their sections are empty.
    pub unresolved_columns: Vec<OptionalColumn>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Run every aggregation over `table` under `criteria`.
///
/// Pure: the same inputs always produce the same report.
#[instrument(skip_all, fields(rows = table.len()))]
pub fn analyze(table: &EventTable, criteria: &FilterCriteria, options: &AnalysisOptions) -> Analysis {
    let start = Instant::now();
    let view = table.view();
    let filtered = filter::apply(&view, criteria);

    // Rules see first-appearance order so their output does not depend on
    // the display sort.
    let company_rows = metrics::metrics_for(&filtered);
    let kpis = KpiSummary::from_metrics(&company_rows);
    let top = ranking::rank_by_score(&company_rows, options.top_n);
    let alerts = rules::alerts(&company_rows);
    let recommendations = rules::recommendations(&company_rows);
    let insights = rules::insights(&company_rows);
    let funnel = funnel::compute(&filtered, options.funnel_company.as_deref());

    let specialized = SpecializedReport {
        introduction_by_company: specialized::introduction_by_company(&view, criteria),
        introduction_by_job: specialized::introduction_by_job(&view, criteria),
        recommendation_depth: specialized::recommendation_depth(&view, criteria),
        lead_time: specialized::lead_time(&view, criteria),
        advisor_interviews: specialized::advisor_interviews(&view, criteria),
        scout_performance: specialized::scout_performance(&view, criteria),
    };
    let trend = trend::monthly_trend(&view, criteria);

    let mut sorted = company_rows;
    ranking::sort_metrics(&mut sorted, options.sort, options.order);

    let analysis = Analysis {
        criteria: criteria.clone(),
        fingerprint: table.fingerprint().map(str::to_string),
        rows: filtered.len(),
        metrics: sorted,
        kpis,
        top,
        funnel,
        alerts,
        recommendations,
        insights,
        specialized,
        trend,
        unresolved_columns: table.resolved().unresolved(),
    };

    info!(
        kept = analysis.rows,
        companies = analysis.metrics.len(),
        alerts = analysis.alerts.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "analysis complete"
    );
    analysis
}
