//! Rule evaluation over company metrics: alerts, improvement
//! recommendations, and headline insights.
//!
//! Every rule runs against every company independently; one firing never
//! suppresses another.

use serde::Serialize;

use crate::metrics::{CompanyMetrics, percent, round1, rounded};
use crate::ranking::top_by_offer_rate;

const LOW_OFFER_RATE: f64 = 5.0;
const SLOW_CYCLE_DAYS: i64 = 60;
const DOC_RATE_MIN_SUBMISSIONS: usize = 5;
const LOW_DOC_RATE: f64 = 10.0;
const HIGH_OFFER_RATE: f64 = 30.0;
const HIGH_OFFER_MIN_OFFERS: usize = 2;

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Alert priority. Ordered so that sorting puts high first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowOfferRate,
    SlowCycle,
    LowDocumentPassRate,
    StrongPerformer,
    DataAnomaly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub priority: Priority,
    pub kind: AlertKind,
    pub company: String,
    pub message: String,
}

type AlertRule = fn(&CompanyMetrics) -> Option<(Priority, AlertKind, String)>;

fn low_offer_rate(m: &CompanyMetrics) -> Option<(Priority, AlertKind, String)> {
    (m.offer_rate < LOW_OFFER_RATE).then(|| {
        (
            Priority::High,
            AlertKind::LowOfferRate,
            format!("offer rate {:.1}% is below {LOW_OFFER_RATE}%", m.offer_rate),
        )
    })
}

fn slow_cycle(m: &CompanyMetrics) -> Option<(Priority, AlertKind, String)> {
    (m.avg_cycle_days > SLOW_CYCLE_DAYS).then(|| {
        (
            Priority::Medium,
            AlertKind::SlowCycle,
            format!("average cycle of {} days exceeds {SLOW_CYCLE_DAYS}", m.avg_cycle_days),
        )
    })
}

fn low_document_pass_rate(m: &CompanyMetrics) -> Option<(Priority, AlertKind, String)> {
    (m.submissions > DOC_RATE_MIN_SUBMISSIONS && m.document_pass_rate < LOW_DOC_RATE).then(|| {
        (
            Priority::Medium,
            AlertKind::LowDocumentPassRate,
            format!(
                "document pass rate {:.1}% over {} submissions",
                m.document_pass_rate, m.submissions
            ),
        )
    })
}

fn strong_performer(m: &CompanyMetrics) -> Option<(Priority, AlertKind, String)> {
    (m.offer_rate > HIGH_OFFER_RATE && m.offers > HIGH_OFFER_MIN_OFFERS).then(|| {
        (
            Priority::Low,
            AlertKind::StrongPerformer,
            format!("{} offers at {:.1}%", m.offers, m.offer_rate),
        )
    })
}

// More first-round interviews than submissions points at bad source data.
fn data_anomaly(m: &CompanyMetrics) -> Option<(Priority, AlertKind, String)> {
    (m.first_round_interviews > m.submissions).then(|| {
        (
            Priority::Low,
            AlertKind::DataAnomaly,
            format!(
                "{} first-round interviews but only {} submissions",
                m.first_round_interviews, m.submissions
            ),
        )
    })
}

const ALERT_RULES: [AlertRule; 5] = [
    low_offer_rate,
    slow_cycle,
    low_document_pass_rate,
    strong_performer,
    data_anomaly,
];

/// Evaluate every alert rule, rule by rule across companies, then order by
/// priority. The sort is stable, so rule order breaks ties.
pub fn alerts(metrics: &[CompanyMetrics]) -> Vec<Alert> {
    let mut out: Vec<Alert> = ALERT_RULES
        .iter()
        .flat_map(|rule| {
            metrics.iter().filter_map(move |m| {
                rule(m).map(|(priority, kind, message)| Alert {
                    priority,
                    kind,
                    company: m.company.clone(),
                    message,
                })
            })
        })
        .collect();
    out.sort_by_key(|a| a.priority.rank());
    out
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

const DOC_IMPROVEMENT_BELOW: f64 = 20.0;
const COACHING_BELOW: f64 = 30.0;
const SPEED_UP_ABOVE: i64 = 45;
const REPLICATE_TOP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ImproveDocuments,
    InterviewCoaching,
    SpeedUpProcess,
    ReplicateSuccess,
}

impl RecommendationKind {
    pub fn title(self) -> &'static str {
        match self {
            Self::ImproveDocuments => "Improve application documents",
            Self::InterviewCoaching => "Strengthen interview coaching",
            Self::SpeedUpProcess => "Speed up the selection process",
            Self::ReplicateSuccess => "Replicate what works",
        }
    }

    pub fn actions(self) -> &'static [&'static str] {
        match self {
            Self::ImproveDocuments => &[
                "Review resumes against each requisition before submission",
                "Share rejection reasons from past screenings with candidates",
                "Highlight quantified achievements in the career summary",
                "Confirm hiring criteria with the client before referring",
            ],
            Self::InterviewCoaching => &[
                "Run a mock interview before every first round",
                "Brief candidates on the company's interview format",
                "Collect interviewer feedback after each round",
                "Prepare answers for role-specific technical questions",
            ],
            Self::SpeedUpProcess => &[
                "Agree on a feedback deadline with the client",
                "Propose interview slots within three business days",
                "Follow up on pending screening results weekly",
                "Combine interview rounds where the client allows it",
            ],
            Self::ReplicateSuccess => &[
                "Document the referral approach used with these companies",
                "Share their hiring criteria across the team",
                "Prioritize similar candidates for open requisitions",
                "Deepen the relationship with their hiring managers",
            ],
        }
    }
}

/// One improvement bucket with the companies it targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: &'static str,
    pub actions: &'static [&'static str],
    pub companies: Vec<String>,
}

impl Recommendation {
    fn new(kind: RecommendationKind, companies: Vec<String>) -> Self {
        Self {
            kind,
            title: kind.title(),
            actions: kind.actions(),
            companies,
        }
    }
}

fn names_where(metrics: &[CompanyMetrics], keep: impl Fn(&CompanyMetrics) -> bool) -> Vec<String> {
    metrics
        .iter()
        .filter(|m| keep(m))
        .map(|m| m.company.clone())
        .collect()
}

/// Build the recommendation buckets that have at least one target company.
pub fn recommendations(metrics: &[CompanyMetrics]) -> Vec<Recommendation> {
    let buckets = [
        (
            RecommendationKind::ImproveDocuments,
            names_where(metrics, |m| m.document_pass_rate < DOC_IMPROVEMENT_BELOW),
        ),
        (
            RecommendationKind::InterviewCoaching,
            names_where(metrics, |m| m.first_round_pass_rate < COACHING_BELOW),
        ),
        (
            RecommendationKind::SpeedUpProcess,
            names_where(metrics, |m| m.avg_cycle_days > SPEED_UP_ABOVE),
        ),
        (
            RecommendationKind::ReplicateSuccess,
            top_by_offer_rate(metrics, REPLICATE_TOP)
                .into_iter()
                .map(|m| m.company.clone())
                .collect(),
        ),
    ];

    buckets
        .into_iter()
        .filter(|(_, companies)| !companies.is_empty())
        .map(|(kind, companies)| Recommendation::new(kind, companies))
        .collect()
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

const INSIGHT_LOW_OFFER_RATE: f64 = 10.0;
const INSIGHT_SLOW_CYCLE_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPerformer {
    pub company: String,
    #[serde(serialize_with = "rounded")]
    pub offer_rate: f64,
}

/// Headline observations over the whole metrics set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insights {
    pub best_performer: Option<BestPerformer>,
    /// Companies with an offer rate under 10%.
    pub low_offer_rate_companies: usize,
    /// Companies averaging more than 30 days to offer.
    pub slow_cycle_companies: usize,
    pub total_submissions: usize,
    pub total_offers: usize,
    /// Total offers over total submissions.
    pub overall_offer_rate: f64,
}

pub fn insights(metrics: &[CompanyMetrics]) -> Insights {
    // First company with the maximum rate wins ties.
    let best_performer = metrics
        .iter()
        .fold(None::<&CompanyMetrics>, |best, m| match best {
            Some(b) if b.offer_rate >= m.offer_rate => Some(b),
            _ => Some(m),
        })
        .map(|m| BestPerformer {
            company: m.company.clone(),
            offer_rate: m.offer_rate,
        });

    let total_submissions = metrics.iter().map(|m| m.submissions).sum();
    let total_offers = metrics.iter().map(|m| m.offers).sum();

    Insights {
        best_performer,
        low_offer_rate_companies: metrics
            .iter()
            .filter(|m| m.offer_rate < INSIGHT_LOW_OFFER_RATE)
            .count(),
        slow_cycle_companies: metrics
            .iter()
            .filter(|m| m.avg_cycle_days > INSIGHT_SLOW_CYCLE_DAYS)
            .count(),
        total_submissions,
        total_offers,
        overall_offer_rate: round1(percent(total_offers, total_submissions)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::metrics_for;
    use crate::testutil::{at, table};
    use pipelens_shared::EventRow;

    fn metrics(company: &str) -> CompanyMetrics {
        CompanyMetrics {
            company: company.into(),
            recommendations: 10,
            submissions: 5,
            documents_returned: 5,
            interviews_in_progress: 3,
            document_pass_rate: 60.0,
            first_round_interviews: 3,
            first_round_passed: 2,
            first_round_pass_rate: 66.7,
            final_interviews: 1,
            offers: 1,
            offer_rate: 10.0,
            avg_cycle_days: 20,
        }
    }

    #[test]
    fn quiet_company_raises_nothing() {
        assert!(alerts(&[metrics("Acme")]).is_empty());
    }

    #[test]
    fn alerts_sorted_by_priority_stably() {
        let strong = CompanyMetrics {
            offers: 4,
            offer_rate: 40.0,
            ..metrics("Strong")
        };
        let slow = CompanyMetrics {
            avg_cycle_days: 75,
            ..metrics("Slow")
        };
        let weak = CompanyMetrics {
            offer_rate: 2.0,
            submissions: 8,
            document_pass_rate: 5.0,
            ..metrics("Weak")
        };
        let odd = CompanyMetrics {
            first_round_interviews: 9,
            ..metrics("Odd")
        };

        let got: Vec<(Priority, AlertKind, String)> = alerts(&[strong, slow, weak, odd])
            .into_iter()
            .map(|a| (a.priority, a.kind, a.company))
            .collect();
        let expected = [
            (Priority::High, AlertKind::LowOfferRate, "Weak"),
            (Priority::Medium, AlertKind::SlowCycle, "Slow"),
            (Priority::Medium, AlertKind::LowDocumentPassRate, "Weak"),
            (Priority::Low, AlertKind::StrongPerformer, "Strong"),
            (Priority::Low, AlertKind::DataAnomaly, "Odd"),
        ]
        .map(|(p, k, c)| (p, k, c.to_string()));
        assert_eq!(got, expected);
    }

    #[test]
    fn offer_rate_just_under_threshold_alerts() {
        // 5 offers over 101 candidates: 4.95%.
        let rows: Vec<EventRow> = (0..101)
            .map(|i| {
                let row = EventRow::new(format!("c{i}"), "Acme");
                if i < 5 { row.with_offer(at(2024, 1, 5)) } else { row }
            })
            .collect();
        let t = table(rows);
        let metrics = metrics_for(&t.view());
        let got = alerts(&metrics);
        assert!(got.iter().any(|a| a.kind == AlertKind::LowOfferRate));
        assert_eq!(insights(&metrics).low_offer_rate_companies, 1);
    }

    #[test]
    fn document_pass_rate_just_under_bucket_boundary() {
        // 99 interviews over 496 submissions: 19.96%.
        let rows: Vec<EventRow> = (0..496)
            .map(|i| {
                let row = EventRow::new(format!("c{i}"), "Acme").with_submitted(at(2024, 1, 1));
                if i < 99 { row.with_interview(at(2024, 1, 10), 1) } else { row }
            })
            .collect();
        let t = table(rows);
        let metrics = metrics_for(&t.view());
        assert!(metrics[0].document_pass_rate < 20.0);
        let docs = recommendations(&metrics)
            .into_iter()
            .find(|r| r.kind == RecommendationKind::ImproveDocuments)
            .expect("improve-documents bucket");
        assert_eq!(docs.companies, ["Acme"]);
    }

    #[test]
    fn anomaly_fires_even_without_submissions() {
        let m = CompanyMetrics {
            submissions: 0,
            first_round_interviews: 1,
            ..metrics("Acme")
        };
        assert!(alerts(&[m]).iter().any(|a| a.kind == AlertKind::DataAnomaly));
    }

    #[test]
    fn recommendation_buckets() {
        let docs = CompanyMetrics {
            document_pass_rate: 10.0,
            ..metrics("Docs")
        };
        let coach = CompanyMetrics {
            first_round_pass_rate: 20.0,
            offer_rate: 25.0,
            ..metrics("Coach")
        };
        let slow = CompanyMetrics {
            avg_cycle_days: 50,
            offer_rate: 30.0,
            ..metrics("Slow")
        };
        let recs = recommendations(&[docs, coach, slow, metrics("Plain")]);

        let kinds: Vec<RecommendationKind> = recs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            [
                RecommendationKind::ImproveDocuments,
                RecommendationKind::InterviewCoaching,
                RecommendationKind::SpeedUpProcess,
                RecommendationKind::ReplicateSuccess,
            ]
        );
        assert_eq!(recs[0].companies, ["Docs"]);
        assert_eq!(recs[3].companies, ["Slow", "Coach", "Docs"]);
        assert!(recs.iter().all(|r| r.actions.len() == 4));
    }

    #[test]
    fn no_metrics_no_recommendations() {
        assert!(recommendations(&[]).is_empty());
    }

    #[test]
    fn insights_totals_and_best() {
        let a = CompanyMetrics {
            offer_rate: 40.0,
            offers: 4,
            submissions: 10,
            avg_cycle_days: 35,
            ..metrics("A")
        };
        let b = CompanyMetrics {
            offer_rate: 40.0,
            offers: 2,
            submissions: 10,
            ..metrics("B")
        };
        let c = CompanyMetrics {
            offer_rate: 5.0,
            offers: 0,
            ..metrics("C")
        };
        let got = insights(&[a, b, c]);
        assert_eq!(got.best_performer.map(|b| b.company), Some("A".into()));
        assert_eq!(got.low_offer_rate_companies, 1);
        assert_eq!(got.slow_cycle_companies, 1);
        assert_eq!(got.total_submissions, 25);
        assert_eq!(got.total_offers, 6);
        assert_eq!(got.overall_offer_rate, 24.0);
        assert_eq!(insights(&[]), Insights::default());
    }
}
