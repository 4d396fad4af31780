//! Company and month filtering applied ahead of every aggregation.

use pipelens_ingest::TableView;
use pipelens_shared::{EventRow, FilterCriteria, Selection, YearMonth};

/// Whether any of the row's lifecycle dates falls in a selected month.
///
/// Rows with no parseable lifecycle date never match an active month filter.
fn in_months(row: &EventRow, months: &Selection<YearMonth>) -> bool {
    match months {
        Selection::All => true,
        Selection::Only(set) => row
            .lifecycle_dates()
            .iter()
            .flatten()
            .any(|at| set.iter().any(|ym| ym.contains(at))),
    }
}

/// Whether a row passes both filter dimensions.
pub fn matches(row: &EventRow, criteria: &FilterCriteria) -> bool {
    criteria.companies.contains(&row.company) && in_months(row, &criteria.months)
}

/// Narrow `view` to the rows passing `criteria`. The input view is untouched.
pub fn apply<'a>(view: &TableView<'a>, criteria: &FilterCriteria) -> TableView<'a> {
    if criteria.companies.is_all() && criteria.months.is_all() {
        return view.clone();
    }
    view.filter(|row| matches(row, criteria))
}
