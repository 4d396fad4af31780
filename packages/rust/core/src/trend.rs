//! Month-level views: which months the data covers, and per-company
//! monthly submission and offer counts.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use pipelens_ingest::TableView;
use pipelens_shared::{FilterCriteria, YearMonth};

/// Every month touched by any lifecycle date, newest first.
pub fn available_months(view: &TableView<'_>) -> Vec<YearMonth> {
    let months: BTreeSet<YearMonth> = view
        .iter()
        .flat_map(|row| row.lifecycle_dates())
        .flatten()
        .map(|at| YearMonth::of(&at))
        .collect();
    months.into_iter().rev().collect()
}

/// Submissions and offers for one company in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub month: YearMonth,
    pub company: String,
    pub submissions: usize,
    pub offers: usize,
}

/// Monthly submission and offer counts per company, oldest month first.
///
/// Only the company filter applies: the trend exists to show months the
/// month filter would hide. Within a month, companies keep first-appearance
/// order.
pub fn monthly_trend(view: &TableView<'_>, criteria: &FilterCriteria) -> Vec<TrendPoint> {
    let scoped = view.filter(|row| criteria.companies.contains(&row.company));

    let mut order: HashMap<&str, usize> = HashMap::new();
    let mut buckets: BTreeMap<(YearMonth, usize), TrendPoint> = BTreeMap::new();

    for row in scoped.iter().filter(|r| !r.company.is_empty()) {
        let next = order.len();
        let position = *order.entry(row.company.as_str()).or_insert(next);
        let mut bump = |month: YearMonth, submission: bool| {
            let point = buckets
                .entry((month, position))
                .or_insert_with(|| TrendPoint {
                    month,
                    company: row.company.clone(),
                    submissions: 0,
                    offers: 0,
                });
            if submission {
                point.submissions += 1;
            } else {
                point.offers += 1;
            }
        };
        if let Some(at) = row.submitted_at {
            bump(YearMonth::of(&at), true);
        }
        if let Some(at) = row.offered_at {
            bump(YearMonth::of(&at), false);
        }
    }

    buckets.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{at, table};
    use pipelens_shared::EventRow;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).expect("month")
    }

    fn rows() -> Vec<EventRow> {
        vec![
            EventRow::new("c1", "Globex")
                .with_submitted(at(2024, 1, 10))
                .with_offer(at(2024, 2, 20)),
            EventRow::new("c2", "Acme").with_submitted(at(2024, 1, 15)),
            EventRow::new("c3", "Acme")
                .with_submitted(at(2023, 12, 1))
                .with_interview(at(2024, 3, 1), 1),
            EventRow::new("c4", "Acme"),
        ]
    }

    #[test]
    fn months_newest_first_across_all_dates() {
        let t = table(rows());
        assert_eq!(
            available_months(&t.view()),
            [ym(2024, 3), ym(2024, 2), ym(2024, 1), ym(2023, 12)]
        );
    }

    #[test]
    fn trend_counts_per_month_and_company() {
        let t = table(rows());
        let trend = monthly_trend(&t.view(), &FilterCriteria::all());
        let flat: Vec<(String, &str, usize, usize)> = trend
            .iter()
            .map(|p| (p.month.to_string(), p.company.as_str(), p.submissions, p.offers))
            .collect();
        assert_eq!(
            flat,
            [
                ("2023-12".to_string(), "Acme", 1, 0),
                ("2024-01".to_string(), "Globex", 1, 0),
                ("2024-01".to_string(), "Acme", 1, 0),
                ("2024-02".to_string(), "Globex", 0, 1),
            ]
        );
    }

    #[test]
    fn trend_ignores_month_filter_but_not_company_filter() {
        let t = table(rows());
        let criteria = FilterCriteria::from_tokens(&["Globex"], &["2023-12"]).expect("criteria");
        let trend = monthly_trend(&t.view(), &criteria);
        assert_eq!(trend.len(), 2);
        assert!(trend.iter().all(|p| p.company == "Globex"));
    }
}
