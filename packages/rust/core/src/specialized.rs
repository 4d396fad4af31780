//! Aggregations that depend on optional columns.
//!
//! Each one filters first, then degrades to an empty result when its
//! column was not resolved at load time or nothing survives the filter.
//! The job breakdown degrades to company rows instead.
//! Callers tell "no data" apart from "zero" by the emptiness of the result.

use serde::Serialize;
use tracing::{debug, instrument};

use pipelens_ingest::{OptionalColumn, TableView, dates::days_between};
use pipelens_shared::{EventRow, FilterCriteria};

use crate::filter;
use crate::group::{Group, by_company, distinct_candidates, group_by};
use crate::metrics::{percent, round1};

/// Distinct candidates referred within a group.
///
/// Uses the application-approval date when that column resolved and yields a
/// nonzero count; otherwise every distinct candidate counts.
fn referrals(rows: &[&EventRow], approval_resolved: bool) -> usize {
    let rows = rows.iter().copied();
    if approval_resolved {
        let approved = distinct_candidates(rows.clone(), |r| r.extra.approved_at.is_some());
        if approved > 0 {
            return approved;
        }
    }
    distinct_candidates(rows, |_| true)
}

fn contracts(rows: &[&EventRow]) -> usize {
    distinct_candidates(rows.iter().copied(), EventRow::offered)
}

// ---------------------------------------------------------------------------
// Introduction → contract rate
// ---------------------------------------------------------------------------

/// Referral-to-contract conversion for one company or job requisition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntroductionRate {
    pub key: String,
    pub referrals: usize,
    pub contracts: usize,
    pub rate: f64,
}

fn introduction_rows(groups: Vec<Group<'_>>, approval_resolved: bool) -> Vec<IntroductionRate> {
    groups
        .into_iter()
        .map(|(key, rows)| {
            let referrals = referrals(&rows, approval_resolved);
            let contracts = contracts(&rows);
            IntroductionRate {
                key: key.to_string(),
                referrals,
                contracts,
                rate: round1(percent(contracts, referrals)),
            }
        })
        .collect()
}

/// Introduction rate per company.
#[instrument(skip_all)]
pub fn introduction_by_company(
    view: &TableView<'_>,
    criteria: &FilterCriteria,
) -> Vec<IntroductionRate> {
    let filtered = filter::apply(view, criteria);
    let approval = filtered.resolved().has(OptionalColumn::ApplicationApproved);
    introduction_rows(by_company(&filtered), approval)
}

/// Introduction rate per job requisition.
///
/// Without a job id column this falls back to company-level rows, keyed by
/// company name.
#[instrument(skip_all)]
pub fn introduction_by_job(
    view: &TableView<'_>,
    criteria: &FilterCriteria,
) -> Vec<IntroductionRate> {
    if !view.resolved().has(OptionalColumn::JobId) {
        debug!("no job id column, grouping by company");
        return introduction_by_company(view, criteria);
    }
    let filtered = filter::apply(view, criteria);
    let approval = filtered.resolved().has(OptionalColumn::ApplicationApproved);
    let groups = group_by(&filtered, |row| row.extra.job_id.as_deref());
    introduction_rows(groups, approval)
}

// ---------------------------------------------------------------------------
// Recommendations per candidate
// ---------------------------------------------------------------------------

/// Rows per distinct candidate within one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDepth {
    pub company: String,
    pub rows: usize,
    pub candidates: usize,
    pub per_candidate: f64,
}

/// How many times candidates are put forward, on average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationDepth {
    pub rows: usize,
    pub candidates: usize,
    pub per_candidate: f64,
    pub by_company: Vec<CompanyDepth>,
}

fn ratio(rows: usize, candidates: usize) -> f64 {
    if candidates == 0 {
        0.0
    } else {
        round1(rows as f64 / candidates as f64)
    }
}

/// Average recommendations per candidate. `None` when nothing survives the filter.
#[instrument(skip_all)]
pub fn recommendation_depth(
    view: &TableView<'_>,
    criteria: &FilterCriteria,
) -> Option<RecommendationDepth> {
    let filtered = filter::apply(view, criteria);
    if filtered.is_empty() {
        return None;
    }

    let candidates = distinct_candidates(filtered.iter(), |_| true);
    let by_company = by_company(&filtered)
        .into_iter()
        .map(|(company, rows)| {
            let distinct = distinct_candidates(rows.iter().copied(), |_| true);
            CompanyDepth {
                company: company.to_string(),
                rows: rows.len(),
                candidates: distinct,
                per_candidate: ratio(rows.len(), distinct),
            }
        })
        .collect();

    Some(RecommendationDepth {
        rows: filtered.len(),
        candidates,
        per_candidate: ratio(filtered.len(), candidates),
        by_company,
    })
}

// ---------------------------------------------------------------------------
// Meeting → submission lead time
// ---------------------------------------------------------------------------

/// Mean days from the internal candidate meeting to document submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadTime {
    pub company: String,
    pub samples: usize,
    pub mean_days: f64,
}

/// Lead time per company. Empty without a meeting-date column.
///
/// Only rows carrying both dates contribute; companies without such rows
/// are omitted.
#[instrument(skip_all)]
pub fn lead_time(view: &TableView<'_>, criteria: &FilterCriteria) -> Vec<LeadTime> {
    if !view.resolved().has(OptionalColumn::MeetingDate) {
        debug!("no meeting date column");
        return Vec::new();
    }
    let filtered = filter::apply(view, criteria);

    by_company(&filtered)
        .into_iter()
        .filter_map(|(company, rows)| {
            let days: Vec<i64> = rows
                .iter()
                .filter_map(|r| Some(days_between(r.extra.meeting_at?, r.submitted_at?)))
                .collect();
            if days.is_empty() {
                return None;
            }
            let mean = days.iter().sum::<i64>() as f64 / days.len() as f64;
            Some(LeadTime {
                company: company.to_string(),
                samples: days.len(),
                mean_days: round1(mean),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Case-advisor activity
// ---------------------------------------------------------------------------

/// Candidates and companies handled by one case advisor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorActivity {
    pub advisor: String,
    pub candidates: usize,
    pub companies: usize,
}

/// Activity per case advisor. Empty without a case-advisor column.
#[instrument(skip_all)]
pub fn advisor_interviews(view: &TableView<'_>, criteria: &FilterCriteria) -> Vec<AdvisorActivity> {
    if !view.resolved().has(OptionalColumn::CaseAdvisor) {
        debug!("no case advisor column");
        return Vec::new();
    }
    let filtered = filter::apply(view, criteria);

    group_by(&filtered, |row| row.extra.case_advisor.as_deref())
        .into_iter()
        .map(|(advisor, rows)| {
            let companies = rows
                .iter()
                .filter(|r| !r.company.is_empty())
                .map(|r| r.company.as_str())
                .collect::<std::collections::HashSet<_>>()
                .len();
            AdvisorActivity {
                advisor: advisor.to_string(),
                candidates: distinct_candidates(rows.iter().copied(), |_| true),
                companies,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scout performance
// ---------------------------------------------------------------------------

/// Sourcing outcome for one scout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoutPerformance {
    pub scout: String,
    pub referrals: usize,
    pub submissions: usize,
    pub submission_rate: f64,
    pub contracts: usize,
    pub contract_rate: f64,
}

/// Performance per scout. Empty without a scout column.
#[instrument(skip_all)]
pub fn scout_performance(
    view: &TableView<'_>,
    criteria: &FilterCriteria,
) -> Vec<ScoutPerformance> {
    if !view.resolved().has(OptionalColumn::Scout) {
        debug!("no scout column");
        return Vec::new();
    }
    let filtered = filter::apply(view, criteria);
    let approval = filtered.resolved().has(OptionalColumn::ApplicationApproved);

    group_by(&filtered, |row| row.extra.scout.as_deref())
        .into_iter()
        .map(|(scout, rows)| {
            let referrals = referrals(&rows, approval);
            let submissions =
                distinct_candidates(rows.iter().copied(), |r| r.submitted_at.is_some());
            let contracts = contracts(&rows);
            ScoutPerformance {
                scout: scout.to_string(),
                referrals,
                submissions,
                submission_rate: round1(percent(submissions, referrals)),
                contracts,
                contract_rate: round1(percent(contracts, referrals)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{acme_rows, at, table, table_with_optional};
    use pipelens_shared::OptionalFields;

    fn staffed(candidate: &str, company: &str, advisor: &str, scout: &str) -> EventRow {
        EventRow::new(candidate, company).with_extra(OptionalFields {
            job_id: Some(format!("J-{company}")),
            case_advisor: Some(advisor.into()),
            scout: Some(scout.into()),
            meeting_at: None,
            approved_at: None,
        })
    }

    #[test]
    fn missing_columns_degrade_to_empty() {
        let t = table(acme_rows());
        let view = t.view();
        let all = FilterCriteria::all();
        assert!(lead_time(&view, &all).is_empty());
        assert!(advisor_interviews(&view, &all).is_empty());
        assert!(scout_performance(&view, &all).is_empty());
        // Company-level aggregations still work.
        assert_eq!(introduction_by_company(&view, &all).len(), 1);
        assert!(recommendation_depth(&view, &all).is_some());
    }

    #[test]
    fn introduction_falls_back_to_distinct_candidates() {
        let t = table(acme_rows());
        let rates = introduction_by_company(&t.view(), &FilterCriteria::all());
        assert_eq!(rates[0].key, "Acme");
        assert_eq!(rates[0].referrals, 3);
        assert_eq!(rates[0].contracts, 1);
        assert_eq!(rates[0].rate, 33.3);
    }

    #[test]
    fn introduction_by_job_groups_by_company_without_job_ids() {
        let t = table(acme_rows());
        let all = FilterCriteria::all();
        let by_job = introduction_by_job(&t.view(), &all);
        assert_eq!(by_job, introduction_by_company(&t.view(), &all));
        assert_eq!(by_job[0].key, "Acme");
    }

    #[test]
    fn introduction_uses_approval_dates_when_present() {
        let mut approved = staffed("c1", "Acme", "佐藤", "田中");
        approved.extra.approved_at = Some(at(2024, 1, 3));
        approved.offered_at = Some(at(2024, 1, 20));
        let t = table_with_optional(vec![
            approved,
            staffed("c2", "Acme", "佐藤", "田中"),
            staffed("c3", "Globex", "鈴木", "山本"),
        ]);
        let rates = introduction_by_company(&t.view(), &FilterCriteria::all());
        assert_eq!(rates[0].referrals, 1);
        assert_eq!(rates[0].rate, 100.0);
        // No approvals at Globex: falls back to every candidate.
        assert_eq!(rates[1].referrals, 1);
        assert_eq!(rates[1].rate, 0.0);

        let by_job = introduction_by_job(&t.view(), &FilterCriteria::all());
        let keys: Vec<&str> = by_job.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["J-Acme", "J-Globex"]);
    }

    #[test]
    fn depth_globally_and_per_company() {
        let t = table(vec![
            EventRow::new("c1", "Acme"),
            EventRow::new("c1", "Globex"),
            EventRow::new("c2", "Acme"),
            EventRow::new("c1", "Acme"),
        ]);
        let depth = recommendation_depth(&t.view(), &FilterCriteria::all()).expect("rows");
        assert_eq!(depth.rows, 4);
        assert_eq!(depth.candidates, 2);
        assert_eq!(depth.per_candidate, 2.0);
        assert_eq!(depth.by_company[0].company, "Acme");
        assert_eq!(depth.by_company[0].per_candidate, 1.5);

        let none = FilterCriteria::from_tokens(&["Initech"], &[] as &[&str]).expect("criteria");
        assert!(recommendation_depth(&t.view(), &none).is_none());
    }

    #[test]
    fn lead_time_means_per_company() {
        let mut a = staffed("c1", "Acme", "佐藤", "田中").with_submitted(at(2024, 1, 10));
        a.extra.meeting_at = Some(at(2024, 1, 1));
        let mut b = staffed("c2", "Acme", "佐藤", "田中").with_submitted(at(2024, 1, 6));
        b.extra.meeting_at = Some(at(2024, 1, 1));
        // Meeting date without a submission is skipped.
        let mut c = staffed("c3", "Globex", "鈴木", "山本");
        c.extra.meeting_at = Some(at(2024, 1, 1));
        let t = table_with_optional(vec![a, b, c]);

        let lead = lead_time(&t.view(), &FilterCriteria::all());
        assert_eq!(
            lead,
            vec![LeadTime {
                company: "Acme".into(),
                samples: 2,
                mean_days: 7.0,
            }]
        );
    }

    #[test]
    fn advisor_counts_distinct_candidates_and_companies() {
        let t = table_with_optional(vec![
            staffed("c1", "Acme", "佐藤", "田中"),
            staffed("c1", "Globex", "佐藤", "田中"),
            staffed("c2", "Acme", "佐藤", "山本"),
            staffed("c3", "Acme", "鈴木", "山本"),
        ]);
        let activity = advisor_interviews(&t.view(), &FilterCriteria::all());
        assert_eq!(
            activity[0],
            AdvisorActivity {
                advisor: "佐藤".into(),
                candidates: 2,
                companies: 2,
            }
        );
        assert_eq!(activity[1].candidates, 1);
    }

    #[test]
    fn scout_rates() {
        let t = table_with_optional(vec![
            staffed("c1", "Acme", "佐藤", "田中")
                .with_submitted(at(2024, 1, 2))
                .with_offer(at(2024, 1, 30)),
            staffed("c2", "Acme", "佐藤", "田中").with_submitted(at(2024, 1, 3)),
            staffed("c3", "Acme", "佐藤", "田中"),
            staffed("c4", "Acme", "佐藤", "田中"),
        ]);
        let scouts = scout_performance(&t.view(), &FilterCriteria::all());
        assert_eq!(scouts.len(), 1);
        let s = &scouts[0];
        assert_eq!(s.referrals, 4);
        assert_eq!(s.submissions, 2);
        assert_eq!(s.submission_rate, 50.0);
        assert_eq!(s.contracts, 1);
        assert_eq!(s.contract_rate, 25.0);
    }

    #[test]
    fn filter_applies_before_grouping() {
        let t = table_with_optional(vec![
            staffed("c1", "Acme", "佐藤", "田中"),
            staffed("c2", "Globex", "鈴木", "山本"),
        ]);
        let criteria = FilterCriteria::from_tokens(&["Globex"], &[] as &[&str]).expect("criteria");
        let activity = advisor_interviews(&t.view(), &criteria);
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].advisor, "鈴木");
    }
}
