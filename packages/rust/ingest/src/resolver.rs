//! Column resolution across inconsistently named exports.
//!
//! Optional columns are located once per load by walking a priority-ordered
//! alias list; the result is cached on the [`EventTable`](crate::EventTable)
//! so aggregators never search headers themselves.

use serde::Serialize;
use tracing::debug;

use pipelens_shared::ColumnAliases;

/// Return the first candidate name present in `columns`.
///
/// Candidate order is priority order. Absence is not an error.
pub fn resolve<'a, S: AsRef<str>>(columns: &[String], candidates: &'a [S]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|candidate| candidate.as_ref())
        .find(|name| columns.iter().any(|c| c.as_str() == *name))
}

/// An optional column consumed by one of the specialized aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalColumn {
    JobId,
    CaseAdvisor,
    Scout,
    MeetingDate,
    ApplicationApproved,
}

impl OptionalColumn {
    pub const ALL: [OptionalColumn; 5] = [
        Self::JobId,
        Self::CaseAdvisor,
        Self::Scout,
        Self::MeetingDate,
        Self::ApplicationApproved,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::JobId => "job requisition id",
            Self::CaseAdvisor => "case advisor",
            Self::Scout => "scout",
            Self::MeetingDate => "meeting date",
            Self::ApplicationApproved => "application approval date",
        }
    }
}

/// Source column names chosen for each optional column, if any matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedColumns {
    pub job_id: Option<String>,
    pub case_advisor: Option<String>,
    pub scout: Option<String>,
    pub meeting_date: Option<String>,
    pub application_approved: Option<String>,
}

impl ResolvedColumns {
    /// Resolve every optional column against the input header.
    pub fn resolve(columns: &[String], aliases: &ColumnAliases) -> Self {
        let pick = |candidates: &[String]| resolve(columns, candidates).map(str::to_string);
        let resolved = Self {
            job_id: pick(&aliases.job_id),
            case_advisor: pick(&aliases.case_advisor),
            scout: pick(&aliases.scout),
            meeting_date: pick(&aliases.meeting_date),
            application_approved: pick(&aliases.application_approved),
        };
        debug!(?resolved, "optional columns resolved");
        resolved
    }

    /// The source column backing `column`, if one was found.
    pub fn get(&self, column: OptionalColumn) -> Option<&str> {
        match column {
            OptionalColumn::JobId => self.job_id.as_deref(),
            OptionalColumn::CaseAdvisor => self.case_advisor.as_deref(),
            OptionalColumn::Scout => self.scout.as_deref(),
            OptionalColumn::MeetingDate => self.meeting_date.as_deref(),
            OptionalColumn::ApplicationApproved => self.application_approved.as_deref(),
        }
    }

    pub fn has(&self, column: OptionalColumn) -> bool {
        self.get(column).is_some()
    }

    /// Optional columns no alias matched.
    pub fn unresolved(&self) -> Vec<OptionalColumn> {
        OptionalColumn::ALL
            .into_iter()
            .filter(|c| !self.has(*c))
            .collect()
    }
}
