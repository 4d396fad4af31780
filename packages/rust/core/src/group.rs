//! Grouping helpers shared by the aggregators.

use std::collections::{HashMap, HashSet};

use pipelens_ingest::TableView;
use pipelens_shared::EventRow;

/// Rows sharing one key, in input order.
pub(crate) type Group<'a> = (&'a str, Vec<&'a EventRow>);

/// Group rows by `key`, keeping groups in order of first appearance.
///
/// Rows whose key is absent or blank are skipped.
pub(crate) fn group_by<'a>(
    view: &TableView<'a>,
    key: impl Fn(&'a EventRow) -> Option<&'a str>,
) -> Vec<Group<'a>> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<Group<'a>> = Vec::new();

    for row in view.iter() {
        let Some(k) = key(row).filter(|k| !k.trim().is_empty()) else {
            continue;
        };
        match index.get(k) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(k, groups.len());
                groups.push((k, vec![row]));
            }
        }
    }
    groups
}

/// Group rows by company name.
pub(crate) fn by_company<'a>(view: &TableView<'a>) -> Vec<Group<'a>> {
    group_by(view, |row| Some(row.company.as_str()))
}

/// Distinct non-empty candidate ids among `rows` that satisfy `keep`.
pub(crate) fn distinct_candidates<'a, I>(rows: I, keep: impl Fn(&EventRow) -> bool) -> usize
where
    I: IntoIterator<Item = &'a EventRow>,
{
    rows.into_iter()
        .filter(|row| !row.candidate_id.is_empty() && keep(row))
        .map(|row| row.candidate_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}
