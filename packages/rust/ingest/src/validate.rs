//! Data-quality checks run while a table is loaded.
//!
//! Nothing here aborts a load. Bad cells are nulled in the normalized row
//! and counted; the counts surface as advisory [`DataWarning`]s.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::warn;

use pipelens_shared::EventRow;

/// Points deducted from the quality score per warning.
const WARNING_PENALTY: u32 = 10;

/// One advisory finding about the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    /// Non-empty date cells that no known layout could read.
    InvalidDates { column: String, count: usize },
    /// Interview round cells that are negative or not a whole number.
    InvalidInterviewRound { count: usize },
    /// Final-interview flag cells outside {0, 1}.
    InvalidFinalFlag { count: usize },
    /// Records identical to an earlier record.
    DuplicateRows { count: usize },
}

impl std::fmt::Display for DataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDates { column, count } => {
                write!(f, "{column}: {count} unparsable date value(s)")
            }
            Self::InvalidInterviewRound { count } => {
                write!(f, "{count} row(s) with a negative or non-numeric interview round")
            }
            Self::InvalidFinalFlag { count } => {
                write!(f, "{count} row(s) with a final-interview flag other than 0 or 1")
            }
            Self::DuplicateRows { count } => write!(f, "{count} duplicate row(s)"),
        }
    }
}

/// Share of rows carrying each lifecycle date, in percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Completeness {
    pub submitted: f64,
    pub interviewed: f64,
    pub offered: f64,
}

impl Completeness {
    pub fn mean(&self) -> f64 {
        (self.submitted + self.interviewed + self.offered) / 3.0
    }
}

/// Dataset-level counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStatistics {
    pub total_rows: usize,
    pub unique_candidates: usize,
    pub unique_companies: usize,
    pub completeness: Completeness,
}

/// Advisory report produced alongside every loaded table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub warnings: Vec<DataWarning>,
    pub statistics: DatasetStatistics,
    /// Duplicate records as a percentage of all rows.
    pub duplicate_rate: f64,
    /// 100 minus 10 per warning, floored at 0.
    pub quality_score: u32,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Running counts collected while source records are normalized.
#[derive(Debug, Default)]
pub(crate) struct QualityTally {
    invalid_dates: BTreeMap<String, usize>,
    invalid_rounds: usize,
    invalid_flags: usize,
    duplicates: usize,
    seen: HashSet<Vec<String>>,
}

impl QualityTally {
    pub(crate) fn invalid_date(&mut self, column: &str) {
        *self.invalid_dates.entry(column.to_string()).or_default() += 1;
    }

    pub(crate) fn invalid_round(&mut self) {
        self.invalid_rounds += 1;
    }

    pub(crate) fn invalid_flag(&mut self) {
        self.invalid_flags += 1;
    }

    /// Record a raw record; counts it if an identical one was seen before.
    pub(crate) fn observe_record<'r>(&mut self, fields: impl Iterator<Item = &'r str>) {
        let key: Vec<String> = fields.map(str::to_string).collect();
        if !self.seen.insert(key) {
            self.duplicates += 1;
        }
    }

    /// Close the tally into a report over the normalized rows.
    pub(crate) fn finish(self, date_columns: &[&str], rows: &[EventRow]) -> DataQualityReport {
        let mut warnings = Vec::new();

        // Report date columns in schema order rather than map order.
        for column in date_columns {
            if let Some(&count) = self.invalid_dates.get(*column) {
                warnings.push(DataWarning::InvalidDates {
                    column: (*column).to_string(),
                    count,
                });
            }
        }
        for (column, &count) in &self.invalid_dates {
            if !date_columns.contains(&column.as_str()) {
                warnings.push(DataWarning::InvalidDates {
                    column: column.clone(),
                    count,
                });
            }
        }
        if self.invalid_rounds > 0 {
            warnings.push(DataWarning::InvalidInterviewRound {
                count: self.invalid_rounds,
            });
        }
        if self.invalid_flags > 0 {
            warnings.push(DataWarning::InvalidFinalFlag {
                count: self.invalid_flags,
            });
        }
        if self.duplicates > 0 {
            warnings.push(DataWarning::DuplicateRows {
                count: self.duplicates,
            });
        }

        for warning in &warnings {
            warn!(%warning, "data quality");
        }

        let statistics = statistics(rows);
        let duplicate_rate = share(self.duplicates, statistics.total_rows);
        let penalty = (warnings.len() as u32).saturating_mul(WARNING_PENALTY);

        DataQualityReport {
            warnings,
            statistics,
            duplicate_rate,
            quality_score: 100u32.saturating_sub(penalty),
        }
    }
}

fn share(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn statistics(rows: &[EventRow]) -> DatasetStatistics {
    let total_rows = rows.len();
    let unique_candidates = rows
        .iter()
        .filter(|r| !r.candidate_id.is_empty())
        .map(|r| r.candidate_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let unique_companies = rows
        .iter()
        .filter(|r| !r.company.is_empty())
        .map(|r| r.company.as_str())
        .collect::<HashSet<_>>()
        .len();

    let count = |f: fn(&EventRow) -> bool| rows.iter().filter(|r| f(r)).count();
    let completeness = Completeness {
        submitted: share(count(|r| r.submitted_at.is_some()), total_rows),
        interviewed: share(count(|r| r.interviewed_at.is_some()), total_rows),
        offered: share(count(|r| r.offered_at.is_some()), total_rows),
    };

    DatasetStatistics {
        total_rows,
        unique_candidates,
        unique_companies,
        completeness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    #[test]
    fn clean_tally_scores_100() {
        let rows = vec![EventRow::new("c1", "Acme").with_submitted(day(1))];
        let report = QualityTally::default().finish(&["submitted"], &rows);
        assert!(report.is_clean());
        assert_eq!(report.quality_score, 100);
        assert_eq!(report.statistics.total_rows, 1);
        assert!((report.statistics.completeness.submitted - 100.0).abs() < 1e-9);
        assert!(report.statistics.completeness.offered.abs() < 1e-9);
    }

    #[test]
    fn warnings_in_stable_order_and_score_penalized() {
        let mut tally = QualityTally::default();
        tally.invalid_date("offered");
        tally.invalid_date("submitted");
        tally.invalid_date("submitted");
        tally.invalid_flag();
        tally.observe_record(["c1", "Acme"].into_iter());
        tally.observe_record(["c1", "Acme"].into_iter());

        let rows = vec![EventRow::new("c1", "Acme"), EventRow::new("c1", "Acme")];
        let report = tally.finish(&["submitted", "interviewed", "offered"], &rows);

        assert_eq!(
            report.warnings,
            vec![
                DataWarning::InvalidDates {
                    column: "submitted".into(),
                    count: 2
                },
                DataWarning::InvalidDates {
                    column: "offered".into(),
                    count: 1
                },
                DataWarning::InvalidFinalFlag { count: 1 },
                DataWarning::DuplicateRows { count: 1 },
            ]
        );
        assert_eq!(report.quality_score, 60);
        assert!((report.duplicate_rate - 50.0).abs() < 1e-9);
        assert_eq!(report.statistics.unique_candidates, 1);
    }

    #[test]
    fn score_floors_at_zero() {
        let mut tally = QualityTally::default();
        for i in 0..12 {
            tally.invalid_date(&format!("col{i}"));
        }
        let report = tally.finish(&[], &[]);
        assert_eq!(report.quality_score, 0);
        assert_eq!(report.duplicate_rate, 0.0);
    }

    #[test]
    fn warning_display() {
        let w = DataWarning::InvalidDates {
            column: "進捗：内定日".into(),
            count: 3,
        };
        assert_eq!(w.to_string(), "進捗：内定日: 3 unparsable date value(s)");
    }
}
