//! Crontab text <-> snapshot mapping.
//!
//! A `#id` comment names the next schedule line. Lines without a pending id
//! are numbered from 1 in order of appearance.

use crate::entry::EntryId;
use indexmap::IndexMap;

/// Entries of one crontab read, keyed by id, in file order
pub type Snapshot = IndexMap<EntryId, String>;

/// Marker prefix `crontab -l` prints when the user has no crontab
pub const NO_CRONTAB_PREFIX: &str = "no";

/// True when the lines are the store's "no crontab for user" answer
pub fn is_no_crontab<S: AsRef<str>>(lines: &[S]) -> bool {
    lines
        .iter()
        .map(|l| l.as_ref().trim())
        .find(|l| !l.is_empty())
        .is_some_and(|l| l.starts_with(NO_CRONTAB_PREFIX))
}

pub fn parse_crontab<I, S>(lines: I) -> Snapshot
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Snapshot::new();
    let mut index = 0usize;
    let mut pending_id: Option<String> = None;
    let mut first = true;

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if first && line.starts_with(NO_CRONTAB_PREFIX) {
            return Snapshot::new();
        }
        first = false;

        if let Some(comment) = line.strip_prefix('#') {
            // a bare `#` names nothing
            let comment = comment.trim();
            pending_id = (!comment.is_empty()).then(|| comment.to_string());
            continue;
        }

        let id = match pending_id.take() {
            Some(id) => EntryId(id),
            None => {
                index += 1;
                EntryId::from(index)
            }
        };
        entries.insert(id, line.to_string());
    }

    log::debug!("parsed {} crontab entries", entries.len());
    entries
}

/// Lines to install: `#id` followed by the entry, per entry
pub fn render_crontab(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .iter()
        .flat_map(|(id, line)| [format!("#{}", id), line.clone()])
        .collect()
}
