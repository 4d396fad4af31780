//! Seven-stage recruiting funnel.
//!
//! Stage counts come from independent predicates, so they overlap: a row in
//! a third-round interview counts toward both the first-interview and the
//! second-plus stages. Counts are therefore not guaranteed to decrease from
//! one stage to the next, and a stage pass rate can exceed 100%.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};

use pipelens_ingest::TableView;
use pipelens_shared::EventRow;

use crate::group::distinct_candidates;
use crate::metrics::{percent, round1};

/// Funnel stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Referral,
    Submission,
    DocumentPass,
    FirstInterview,
    SecondPlusInterview,
    FinalInterview,
    Offer,
}

impl FunnelStage {
    pub const ALL: [FunnelStage; 7] = [
        Self::Referral,
        Self::Submission,
        Self::DocumentPass,
        Self::FirstInterview,
        Self::SecondPlusInterview,
        Self::FinalInterview,
        Self::Offer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Referral => "referral",
            Self::Submission => "submission",
            Self::DocumentPass => "document pass",
            Self::FirstInterview => "first interview",
            Self::SecondPlusInterview => "second+ interview",
            Self::FinalInterview => "final interview",
            Self::Offer => "offer",
        }
    }

    /// Whether a single row counts toward this stage. Referral is counted
    /// over distinct candidates instead.
    fn admits(self, row: &EventRow) -> bool {
        match self {
            Self::Referral => true,
            Self::Submission => row.submitted_at.is_some(),
            Self::DocumentPass => row.interviewed(),
            Self::FirstInterview => row.interviewed() && row.interview_round.is_some_and(|n| n >= 1),
            Self::SecondPlusInterview => {
                row.interviewed() && row.interview_round.is_some_and(|n| n > 1)
            }
            Self::FinalInterview => row.interviewed() && row.is_final(),
            Self::Offer => row.offered(),
        }
    }

    fn count(self, rows: &TableView<'_>) -> usize {
        match self {
            Self::Referral => distinct_candidates(rows.iter(), |_| true),
            stage => rows.iter().filter(|r| stage.admits(r)).count(),
        }
    }
}

/// Conversion between two adjacent stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagePassRate {
    pub from: FunnelStage,
    pub to: FunnelStage,
    /// `to / from` in percent, one decimal.
    pub rate: f64,
}

/// Funnel counts for one company or for the whole view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Funnel {
    /// `None` for the aggregate funnel.
    pub company: Option<String>,
    /// Nonzero stage counts. Zero stages are omitted.
    pub counts: BTreeMap<FunnelStage, usize>,
    /// Pass rates for adjacent stage pairs where both stages are nonzero.
    pub pass_rates: Vec<StagePassRate>,
}

impl Funnel {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, stage: FunnelStage) -> usize {
        self.counts.get(&stage).copied().unwrap_or(0)
    }
}

/// Compute the funnel, optionally restricted to one company first.
#[instrument(skip(view), fields(rows = view.len()))]
pub fn compute(view: &TableView<'_>, company: Option<&str>) -> Funnel {
    let scoped = match company {
        Some(name) => view.for_company(name),
        None => view.clone(),
    };

    let raw: Vec<(FunnelStage, usize)> = FunnelStage::ALL
        .into_iter()
        .map(|stage| (stage, stage.count(&scoped)))
        .collect();

    let pass_rates = raw
        .windows(2)
        .filter_map(|pair| {
            let (from, upstream) = pair[0];
            let (to, downstream) = pair[1];
            (upstream > 0 && downstream > 0).then(|| StagePassRate {
                from,
                to,
                rate: round1(percent(downstream, upstream)),
            })
        })
        .collect();

    let counts: BTreeMap<FunnelStage, usize> =
        raw.into_iter().filter(|(_, n)| *n > 0).collect();
    debug!(stages = counts.len(), "funnel computed");

    Funnel {
        company: company.map(str::to_string),
        counts,
        pass_rates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{acme_rows, at, table};

    #[test]
    fn stages_overlap_and_zero_stages_drop() {
        let t = table(vec![
            EventRow::new("c1", "Acme")
                .with_submitted(at(2024, 1, 1))
                .with_interview(at(2024, 1, 8), 3),
            EventRow::new("c2", "Acme")
                .with_submitted(at(2024, 1, 2))
                .with_interview(at(2024, 1, 9), 1),
            EventRow::new("c3", "Acme").with_submitted(at(2024, 1, 3)),
        ]);
        let funnel = compute(&t.view(), None);

        assert_eq!(funnel.count(FunnelStage::Referral), 3);
        assert_eq!(funnel.count(FunnelStage::Submission), 3);
        assert_eq!(funnel.count(FunnelStage::DocumentPass), 2);
        // c1 counts in both interview stages.
        assert_eq!(funnel.count(FunnelStage::FirstInterview), 2);
        assert_eq!(funnel.count(FunnelStage::SecondPlusInterview), 1);
        assert!(!funnel.counts.contains_key(&FunnelStage::FinalInterview));
        assert!(!funnel.counts.contains_key(&FunnelStage::Offer));
    }

    #[test]
    fn pass_rates_need_both_endpoints() {
        let t = table(vec![
            EventRow::new("c1", "Acme")
                .with_submitted(at(2024, 1, 1))
                .with_interview(at(2024, 1, 8), 1),
            EventRow::new("c2", "Acme").with_submitted(at(2024, 1, 2)),
            EventRow::new("c3", "Acme").with_offer(at(2024, 2, 1)),
        ]);
        let funnel = compute(&t.view(), None);
        let pairs: Vec<(FunnelStage, FunnelStage)> =
            funnel.pass_rates.iter().map(|p| (p.from, p.to)).collect();
        assert_eq!(
            pairs,
            [
                (FunnelStage::Referral, FunnelStage::Submission),
                (FunnelStage::Submission, FunnelStage::DocumentPass),
                (FunnelStage::DocumentPass, FunnelStage::FirstInterview),
            ]
        );
        assert_eq!(funnel.pass_rates[0].rate, 66.7);
        assert_eq!(funnel.pass_rates[1].rate, 50.0);
    }

    #[test]
    fn per_company_scope() {
        let mut rows = acme_rows();
        rows.push(EventRow::new("g1", "Globex").with_offer(at(2024, 2, 1)));
        let t = table(rows);
        let funnel = compute(&t.view(), Some("Acme"));
        assert_eq!(funnel.company.as_deref(), Some("Acme"));
        assert_eq!(funnel.count(FunnelStage::Referral), 3);
        assert_eq!(funnel.count(FunnelStage::Offer), 1);
        assert!(compute(&t.view(), Some("Initech")).is_empty());
    }

    #[test]
    fn offers_bounded_by_rows_only() {
        // More offers than first interviews is allowed.
        let t = table(vec![
            EventRow::new("c1", "Acme").with_offer(at(2024, 1, 5)),
            EventRow::new("c2", "Acme").with_offer(at(2024, 1, 6)),
        ]);
        let view = t.view();
        let funnel = compute(&view, None);
        assert!(funnel.count(FunnelStage::Offer) <= view.len());
        assert_eq!(funnel.count(FunnelStage::FirstInterview), 0);
    }

    #[test]
    fn stage_keys_serialize_in_order() {
        let t = table(acme_rows());
        let json = serde_json::to_string(&compute(&t.view(), None).counts).expect("json");
        assert_eq!(json, r#"{"referral":3,"submission":2,"offer":1}"#);
    }
}
