//! Interactive session state.
//!
//! A [`Session`] holds the user's current filter selection and chat history.
//! It is a plain value: each interaction hands the current session and an
//! event to [`Session::handle`] and keeps the returned session. Aggregations
//! never read it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use pipelens_shared::{FilterCriteria, Result, Selection};

/// A UUID v7 session identifier (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// One question and answer from the assistant panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub question: String,
    pub answer: String,
    pub at: DateTime<Utc>,
}

/// Something the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SelectCompanies(Vec<String>),
    /// Raw `YYYY-M` tokens; `ALL` clears the month filter.
    SelectMonths(Vec<String>),
    RunAnalysis,
    RecordExchange {
        question: String,
        answer: String,
        at: DateTime<Utc>,
    },
    ClearHistory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub criteria: FilterCriteria,
    /// Set once an analysis has run for the current criteria.
    pub analysis_run: bool,
    pub history: Vec<ChatExchange>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            criteria: FilterCriteria::all(),
            analysis_run: false,
            history: Vec::new(),
        }
    }

    /// Apply one event and return the resulting session.
    ///
    /// Changing either filter clears `analysis_run`. A bad month token is
    /// rejected and leaves the caller's session as it was.
    pub fn handle(&self, event: SessionEvent) -> Result<Session> {
        let mut next = self.clone();
        match event {
            SessionEvent::SelectCompanies(tokens) => {
                next.criteria.companies = Selection::companies(&tokens);
                next.analysis_run = false;
            }
            SessionEvent::SelectMonths(tokens) => {
                next.criteria.months = Selection::months(&tokens)?;
                next.analysis_run = false;
            }
            SessionEvent::RunAnalysis => next.analysis_run = true,
            SessionEvent::RecordExchange {
                question,
                answer,
                at,
            } => next.history.push(ChatExchange {
                question,
                answer,
                at,
            }),
            SessionEvent::ClearHistory => next.history.clear(),
        }
        debug!(session = %next.id, history = next.history.len(), "session updated");
        Ok(next)
    }
}
