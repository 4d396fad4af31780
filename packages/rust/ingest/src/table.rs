//! Normalized event table and borrowed views over it.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use tracing::debug;

use pipelens_shared::{
    AppConfig, ColumnAliases, ColumnsConfig, EventRow, OptionalFields, PipelensError, Result,
};

use crate::dates::{is_null_token, parse_timestamp};
use crate::resolver::ResolvedColumns;
use crate::validate::{DataQualityReport, QualityTally};

/// Column names used when reading a CSV export.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub columns: ColumnsConfig,
    pub aliases: ColumnAliases,
}

impl From<&AppConfig> for IngestOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            aliases: config.aliases.clone(),
        }
    }
}

/// The loaded, normalized input. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct EventTable {
    columns: Vec<String>,
    rows: Vec<EventRow>,
    resolved: ResolvedColumns,
    fingerprint: Option<String>,
}

impl EventTable {
    /// Build a table from already-normalized rows.
    pub fn from_rows(rows: Vec<EventRow>, resolved: ResolvedColumns) -> Self {
        Self {
            columns: Vec::new(),
            rows,
            resolved,
            fingerprint: None,
        }
    }

    /// Source header, trimmed. Empty for tables built in memory.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[EventRow] {
        &self.rows
    }

    pub fn resolved(&self) -> &ResolvedColumns {
        &self.resolved
    }

    /// SHA-256 of the source bytes, hex encoded.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A view over every row.
    pub fn view(&self) -> TableView<'_> {
        TableView {
            resolved: &self.resolved,
            rows: self.rows.iter().collect(),
        }
    }
}

/// A borrowed subset of an [`EventTable`].
///
/// Filtering produces a new view; the underlying rows are shared.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    resolved: &'a ResolvedColumns,
    rows: Vec<&'a EventRow>,
}

impl<'a> TableView<'a> {
    pub fn rows(&self) -> &[&'a EventRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a EventRow> + '_ {
        self.rows.iter().copied()
    }

    pub fn resolved(&self) -> &'a ResolvedColumns {
        self.resolved
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep the rows matching `keep`.
    pub fn filter(&self, keep: impl Fn(&EventRow) -> bool) -> TableView<'a> {
        TableView {
            resolved: self.resolved,
            rows: self.rows.iter().copied().filter(|row| keep(row)).collect(),
        }
    }

    /// Rows for one company.
    pub fn for_company(&self, company: &str) -> TableView<'a> {
        self.filter(|row| row.company == company)
    }
}

/// Hex SHA-256 of the raw input.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// CSV reading
// ---------------------------------------------------------------------------

/// Header positions for the required columns.
struct RequiredIndex {
    candidate_id: usize,
    company: usize,
    submitted_at: usize,
    interviewed_at: usize,
    interview_round: usize,
    final_interview: usize,
    offered_at: usize,
    status: usize,
}

/// Header positions for the optional columns that resolved.
#[derive(Default)]
struct OptionalIndex {
    job_id: Option<usize>,
    case_advisor: Option<usize>,
    scout: Option<usize>,
    meeting_date: Option<usize>,
    application_approved: Option<usize>,
}

fn normalize_header(raw: &StringRecord) -> Vec<String> {
    raw.iter()
        .map(|name| name.trim_start_matches('\u{feff}').trim().to_string())
        .collect()
}

fn required_index(header: &[String], columns: &ColumnsConfig) -> Result<RequiredIndex> {
    let positions: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let missing: Vec<&str> = columns
        .required()
        .into_iter()
        .filter(|name| !positions.contains_key(name))
        .collect();
    if !missing.is_empty() {
        return Err(PipelensError::schema(missing));
    }

    let at = |name: &str| positions.get(name).copied().unwrap_or_default();
    Ok(RequiredIndex {
        candidate_id: at(columns.candidate_id.as_str()),
        company: at(columns.company.as_str()),
        submitted_at: at(columns.submitted_at.as_str()),
        interviewed_at: at(columns.interviewed_at.as_str()),
        interview_round: at(columns.interview_round.as_str()),
        final_interview: at(columns.final_interview.as_str()),
        offered_at: at(columns.offered_at.as_str()),
        status: at(columns.status.as_str()),
    })
}

fn optional_index(header: &[String], resolved: &ResolvedColumns) -> OptionalIndex {
    let at = |name: &Option<String>| {
        name.as_deref()
            .and_then(|n| header.iter().position(|h| h == n))
    };
    OptionalIndex {
        job_id: at(&resolved.job_id),
        case_advisor: at(&resolved.case_advisor),
        scout: at(&resolved.scout),
        meeting_date: at(&resolved.meeting_date),
        application_approved: at(&resolved.application_approved),
    }
}

/// Interview round: a non-negative whole number, possibly written as a float.
fn parse_round(raw: &str) -> std::result::Result<Option<u32>, ()> {
    if is_null_token(raw) {
        return Ok(None);
    }
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => {
            Ok(Some(v as u32))
        }
        _ => Err(()),
    }
}

/// Final-interview flag: 0 or 1, tolerating `1.0` and `true`/`false`.
fn parse_flag(raw: &str) -> std::result::Result<Option<bool>, ()> {
    if is_null_token(raw) {
        return Ok(None);
    }
    let s = raw.trim();
    if s.eq_ignore_ascii_case("true") {
        return Ok(Some(true));
    }
    if s.eq_ignore_ascii_case("false") {
        return Ok(Some(false));
    }
    match s.parse::<f64>() {
        Ok(v) if v == 0.0 => Ok(Some(false)),
        Ok(v) if v == 1.0 => Ok(Some(true)),
        _ => Err(()),
    }
}

fn text(raw: &str) -> Option<String> {
    if is_null_token(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}

/// Reads one record into a row, tallying anything that had to be nulled.
struct RowReader<'h> {
    header: &'h [String],
    required: RequiredIndex,
    optional: OptionalIndex,
}

impl RowReader<'_> {
    fn cell<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
        record.get(idx).unwrap_or("")
    }

    fn date(
        &self,
        record: &StringRecord,
        idx: usize,
        tally: &mut QualityTally,
    ) -> Option<chrono::NaiveDateTime> {
        let raw = Self::cell(record, idx);
        if is_null_token(raw) {
            return None;
        }
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            tally.invalid_date(&self.header[idx]);
        }
        parsed
    }

    fn optional_text(record: &StringRecord, idx: Option<usize>) -> Option<String> {
        idx.and_then(|i| text(Self::cell(record, i)))
    }

    fn read(&self, record: &StringRecord, tally: &mut QualityTally) -> EventRow {
        let req = &self.required;

        let interview_round = parse_round(Self::cell(record, req.interview_round))
            .unwrap_or_else(|()| {
                tally.invalid_round();
                None
            });
        let final_interview = parse_flag(Self::cell(record, req.final_interview))
            .unwrap_or_else(|()| {
                tally.invalid_flag();
                None
            });

        let extra = OptionalFields {
            job_id: Self::optional_text(record, self.optional.job_id),
            case_advisor: Self::optional_text(record, self.optional.case_advisor),
            scout: Self::optional_text(record, self.optional.scout),
            meeting_at: self
                .optional
                .meeting_date
                .and_then(|i| self.date(record, i, tally)),
            approved_at: self
                .optional
                .application_approved
                .and_then(|i| self.date(record, i, tally)),
        };

        EventRow {
            candidate_id: text(Self::cell(record, req.candidate_id)).unwrap_or_default(),
            company: text(Self::cell(record, req.company)).unwrap_or_default(),
            submitted_at: self.date(record, req.submitted_at, tally),
            interviewed_at: self.date(record, req.interviewed_at, tally),
            interview_round,
            final_interview,
            offered_at: self.date(record, req.offered_at, tally),
            status: text(Self::cell(record, req.status)),
            extra,
        }
    }
}

/// Parse CSV bytes into a table and its quality report.
pub(crate) fn read_csv(
    bytes: &[u8],
    options: &IngestOptions,
) -> Result<(EventTable, DataQualityReport)> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);

    let header = normalize_header(reader.headers()?);
    let required = required_index(&header, &options.columns)?;
    let resolved = ResolvedColumns::resolve(&header, &options.aliases);
    let optional = optional_index(&header, &resolved);
    let row_reader = RowReader {
        header: &header,
        required,
        optional,
    };

    let mut tally = QualityTally::default();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        tally.observe_record(record.iter());
        rows.push(row_reader.read(&record, &mut tally));
    }

    if rows.is_empty() {
        return Err(PipelensError::EmptyDataset);
    }
    debug!(rows = rows.len(), columns = header.len(), "csv parsed");

    let date_columns = [
        options.columns.submitted_at.as_str(),
        options.columns.interviewed_at.as_str(),
        options.columns.offered_at.as_str(),
    ];
    let report = tally.finish(&date_columns, &rows);

    let table = EventTable {
        columns: header,
        rows,
        resolved,
        fingerprint: Some(fingerprint(bytes)),
    };
    Ok((table, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_parsing() {
        assert_eq!(parse_round("2"), Ok(Some(2)));
        assert_eq!(parse_round("3.0"), Ok(Some(3)));
        assert_eq!(parse_round(""), Ok(None));
        assert_eq!(parse_round("nan"), Ok(None));
        assert_eq!(parse_round("-1"), Err(()));
        assert_eq!(parse_round("1.5"), Err(()));
        assert_eq!(parse_round("two"), Err(()));
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(parse_flag("1"), Ok(Some(true)));
        assert_eq!(parse_flag("0.0"), Ok(Some(false)));
        assert_eq!(parse_flag("TRUE"), Ok(Some(true)));
        assert_eq!(parse_flag(" "), Ok(None));
        assert_eq!(parse_flag("2"), Err(()));
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = fingerprint(b"abc");
        assert_eq!(a.len(), 64);
        assert_eq!(a, fingerprint(b"abc"));
        assert_ne!(a, fingerprint(b"abd"));
    }

    #[test]
    fn bom_and_padding_stripped_from_header() {
        let csv = "\u{feff}求職者：求職者ID , 企業：企業名,進捗：書類提出日,進捗：面接日,進捗：面接回数,進捗：最終面接フラグ,進捗：内定日,進捗：ステータス\nC1,Acme,,,,,,\n";
        let (table, _) = read_csv(csv.as_bytes(), &IngestOptions::default()).expect("load");
        assert_eq!(table.columns()[0], "求職者：求職者ID");
        assert_eq!(table.columns()[1], "企業：企業名");
        assert_eq!(table.rows()[0].company, "Acme");
    }

    #[test]
    fn view_filters_without_copying_rows() {
        let table = EventTable::from_rows(
            vec![
                EventRow::new("c1", "Acme"),
                EventRow::new("c2", "Globex"),
                EventRow::new("c3", "Acme"),
            ],
            ResolvedColumns::default(),
        );
        let view = table.view();
        assert_eq!(view.len(), 3);
        let acme = view.for_company("Acme");
        assert_eq!(acme.len(), 2);
        assert!(std::ptr::eq(acme.rows()[0], &table.rows()[0]));
        assert!(view.for_company("Initech").is_empty());
    }
}
