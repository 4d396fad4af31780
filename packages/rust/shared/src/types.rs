//! Core domain types for recruiting-pipeline analysis.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PipelensError, Result};

/// Token that disables a filter dimension wherever it appears in a selection.
pub const ALL_SENTINEL: &str = "ALL";

// ---------------------------------------------------------------------------
// EventRow
// ---------------------------------------------------------------------------

/// One candidate × company application event, normalized from a source row.
///
/// Immutable once loaded. Dates that failed to parse and out-of-range
/// interview rounds or flags are already `None` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    /// Candidate identifier. Not unique per row.
    pub candidate_id: String,
    /// Company the candidate was put forward to.
    pub company: String,
    /// Document submission timestamp.
    pub submitted_at: Option<NaiveDateTime>,
    /// Interview timestamp.
    pub interviewed_at: Option<NaiveDateTime>,
    /// Interview round number (0 = not yet interviewed).
    pub interview_round: Option<u32>,
    /// Final-interview flag.
    pub final_interview: Option<bool>,
    /// Offer timestamp.
    pub offered_at: Option<NaiveDateTime>,
    /// Free-text progress status.
    pub status: Option<String>,
    /// Values of optional columns, when the input carries them.
    #[serde(default)]
    pub extra: OptionalFields,
}

/// Values read from optional columns located by alias resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionalFields {
    /// Job requisition identifier.
    pub job_id: Option<String>,
    /// Case-advisor (CA) managing the candidate.
    pub case_advisor: Option<String>,
    /// Scout who sourced the candidate.
    pub scout: Option<String>,
    /// Internal candidate meeting date.
    pub meeting_at: Option<NaiveDateTime>,
    /// Date the candidate approved the application.
    pub approved_at: Option<NaiveDateTime>,
}

impl EventRow {
    /// A row with only its identity fields set.
    pub fn new(candidate_id: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            company: company.into(),
            submitted_at: None,
            interviewed_at: None,
            interview_round: None,
            final_interview: None,
            offered_at: None,
            status: None,
            extra: OptionalFields::default(),
        }
    }

    pub fn with_submitted(mut self, at: NaiveDateTime) -> Self {
        self.submitted_at = Some(at);
        self
    }

    pub fn with_interview(mut self, at: NaiveDateTime, round: u32) -> Self {
        self.interviewed_at = Some(at);
        self.interview_round = Some(round);
        self
    }

    pub fn with_final_interview(mut self, flag: bool) -> Self {
        self.final_interview = Some(flag);
        self
    }

    pub fn with_offer(mut self, at: NaiveDateTime) -> Self {
        self.offered_at = Some(at);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_extra(mut self, extra: OptionalFields) -> Self {
        self.extra = extra;
        self
    }

    /// Submission, interview, and offer dates, in lifecycle order.
    pub fn lifecycle_dates(&self) -> [Option<NaiveDateTime>; 3] {
        [self.submitted_at, self.interviewed_at, self.offered_at]
    }

    /// Interview date present.
    pub fn interviewed(&self) -> bool {
        self.interviewed_at.is_some()
    }

    /// Final-interview flag is set to 1.
    pub fn is_final(&self) -> bool {
        self.final_interview == Some(true)
    }

    /// Offer date present.
    pub fn offered(&self) -> bool {
        self.offered_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// YearMonth
// ---------------------------------------------------------------------------

/// A calendar month, parsed from `YYYY-M` or `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

static YEAR_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{4})-(\d{1,2})\s*$").expect("year-month regex"));

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(PipelensError::validation(format!(
                "month {month} out of range in {year}-{month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// The month a timestamp falls in.
    pub fn of(at: &NaiveDateTime) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// Whether the timestamp falls in this month.
    pub fn contains(&self, at: &NaiveDateTime) -> bool {
        at.year() == self.year && at.month() == self.month
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for YearMonth {
    type Err = PipelensError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let caps = YEAR_MONTH_RE.captures(s).ok_or_else(|| {
            PipelensError::validation(format!("invalid month token '{s}': expected YYYY-M"))
        })?;
        let year: i32 = caps[1]
            .parse()
            .map_err(|_| PipelensError::validation(format!("invalid year in '{s}'")))?;
        let month: u32 = caps[2]
            .parse()
            .map_err(|_| PipelensError::validation(format!("invalid month in '{s}'")))?;
        Self::new(year, month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Selection / FilterCriteria
// ---------------------------------------------------------------------------

/// A filter dimension: either everything, or an explicit allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection<T: Ord> {
    All,
    Only(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: Ord> Selection<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Whether `value` passes this dimension.
    pub fn contains(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(value),
        }
    }
}

fn has_sentinel<S: AsRef<str>>(tokens: &[S]) -> bool {
    tokens.iter().any(|t| t.as_ref().trim() == ALL_SENTINEL)
}

impl Selection<String> {
    /// Company selection from raw tokens. Empty or containing `ALL` selects everything.
    pub fn companies<S: AsRef<str>>(tokens: &[S]) -> Self {
        if tokens.is_empty() || has_sentinel(tokens) {
            return Self::All;
        }
        Self::Only(tokens.iter().map(|t| t.as_ref().to_string()).collect())
    }
}

impl Selection<YearMonth> {
    /// Month selection from raw `YYYY-M` tokens. Empty or containing `ALL` selects everything.
    pub fn months<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        if tokens.is_empty() || has_sentinel(tokens) {
            return Ok(Self::All);
        }
        let set = tokens
            .iter()
            .map(|t| t.as_ref().parse::<YearMonth>())
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self::Only(set))
    }
}

/// Company and month filters applied before every aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub companies: Selection<String>,
    pub months: Selection<YearMonth>,
}

impl FilterCriteria {
    /// No filtering on either dimension.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build criteria from raw UI/CLI tokens.
    pub fn from_tokens<C: AsRef<str>, M: AsRef<str>>(companies: &[C], months: &[M]) -> Result<Self> {
        Ok(Self {
            companies: Selection::companies(companies),
            months: Selection::months(months)?,
        })
    }
}
