//! Row builders shared by the unit tests.

use chrono::{NaiveDate, NaiveDateTime};

use pipelens_ingest::{EventTable, ResolvedColumns};
use pipelens_shared::EventRow;

pub(crate) fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

/// A table with no optional columns resolved.
pub(crate) fn table(rows: Vec<EventRow>) -> EventTable {
    EventTable::from_rows(rows, ResolvedColumns::default())
}

/// A table with every optional column resolved.
pub(crate) fn table_with_optional(rows: Vec<EventRow>) -> EventTable {
    let resolved = ResolvedColumns {
        job_id: Some("求人：求人ID".into()),
        case_advisor: Some("求職者：担当者".into()),
        scout: Some("スカウト担当者".into()),
        meeting_date: Some("求職者：面談日".into()),
        application_approved: Some("進捗：応募承諾日".into()),
    };
    EventTable::from_rows(rows, resolved)
}

/// The three-row Acme example: one offered five days after submission,
/// one submitted only, one with no dates.
pub(crate) fn acme_rows() -> Vec<EventRow> {
    vec![
        EventRow::new("a1", "Acme")
            .with_submitted(at(2024, 2, 1))
            .with_offer(at(2024, 2, 6)),
        EventRow::new("a2", "Acme").with_submitted(at(2024, 2, 2)),
        EventRow::new("a3", "Acme"),
    ]
}
