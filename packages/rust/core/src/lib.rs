//! Aggregation engine for recruiting-pipeline data.
//!
//! Every function here is a pure function of a loaded table and a set of
//! filter criteria. Nothing is cached between calls and nothing mutates the
//! table, so aggregations can be re-run on every interaction.

pub mod filter;
pub mod funnel;
mod group;
pub mod metrics;
pub mod pipeline;
pub mod ranking;
pub mod rules;
pub mod session;
pub mod specialized;
pub mod trend;

#[cfg(test)]
mod testutil;

pub use funnel::{Funnel, FunnelStage, StagePassRate};
pub use metrics::{CompanyMetrics, KpiSummary, company_metrics};
pub use pipeline::{Analysis, AnalysisOptions, SpecializedReport, analyze};
pub use ranking::{RankedCompany, SortOrder, SortPreset};
pub use rules::{Alert, AlertKind, Insights, Priority, Recommendation, RecommendationKind};
pub use session::{ChatExchange, Session, SessionEvent, SessionId};
pub use trend::{TrendPoint, available_months, monthly_trend};
