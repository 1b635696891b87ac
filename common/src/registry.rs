use crate::crontab::Snapshot;
use crate::entry::{Entry, EntryId};
use crate::error::Result;
use crate::schedule::Definition;
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// Pending additions and removals of one session
#[derive(Debug, Default)]
pub struct EntryRegistry {
    adds: IndexMap<EntryId, Entry>,
    removals: IndexSet<EntryId>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an entry; replaces a pending add and cancels a pending removal
    /// of the same id. Nothing is staged when the definition is invalid.
    pub fn add(&mut self, id: impl Into<EntryId>, definition: &Definition) -> Result<&Entry> {
        let entry = Entry::new(id, definition)?;
        Ok(self.stage(entry))
    }

    pub(crate) fn stage(&mut self, entry: Entry) -> &Entry {
        log::debug!("staging add of '{}': {}", entry.id(), entry);
        self.removals.shift_remove(entry.id());
        let (index, _) = self.adds.insert_full(entry.id().clone(), entry);
        &self.adds[index]
    }

    pub fn remove(&mut self, id: impl Into<EntryId>) -> Result<()> {
        let id = id.into().checked()?;
        log::debug!("staging removal of '{}'", id);
        self.adds.shift_remove(&id);
        self.removals.insert(id);
        Ok(())
    }

    pub fn rollback(&mut self) {
        self.adds.clear();
        self.removals.clear();
    }

    pub fn is_dirty(&self) -> bool {
        !self.adds.is_empty() || !self.removals.is_empty()
    }

    pub fn pending_adds(&self) -> impl Iterator<Item = &Entry> {
        self.adds.values()
    }

    pub fn pending_removals(&self) -> impl Iterator<Item = &EntryId> {
        self.removals.iter()
    }

    /// Apply the pending changes to a snapshot: removals first, then adds
    /// overwrite in place or append.
    pub fn merge(&self, mut current: Snapshot) -> Snapshot {
        current.retain(|id, _| !self.removals.contains(id));
        // lines come back trimmed from the store, so store them that way
        for (id, entry) in &self.adds {
            current.insert(id.clone(), entry.raw().trim().to_string());
        }
        current
    }

    pub fn review(&self) -> Review {
        Review {
            adds: self
                .adds
                .iter()
                .map(|(id, entry)| (id.clone(), entry.raw().to_string()))
                .collect(),
            removals: self.removals.iter().cloned().collect(),
        }
    }
}

/// Summary of what a commit would change
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Review {
    pub adds: Vec<(EntryId, String)>,
    pub removals: Vec<EntryId>,
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "To be added:")?;
        for (id, line) in &self.adds {
            writeln!(f, "  #{} {}", id, line)?;
        }
        writeln!(f, "To be removed:")?;
        for id in &self.removals {
            writeln!(f, "  #{}", id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crontab::parse_crontab;

    #[test]
    fn test_add_cancels_removal_and_remove_evicts_add() {
        let mut reg = EntryRegistry::new();
        assert!(!reg.is_dirty());

        reg.remove("agent1").unwrap();
        reg.add("agent1", &"1 * * * * a".into()).unwrap();
        assert_eq!(reg.pending_removals().count(), 0);
        assert_eq!(reg.pending_adds().count(), 1);

        reg.remove("agent1").unwrap();
        assert_eq!(reg.pending_adds().count(), 0);
        assert_eq!(reg.pending_removals().collect::<Vec<_>>(), [&EntryId::from("agent1")]);
        assert!(reg.is_dirty());
    }

    #[test]
    fn test_readd_overwrites() {
        let mut reg = EntryRegistry::new();
        reg.add("a", &"1 * * * * first".into()).unwrap();
        let entry = reg.add("a", &"2 * * * * second".into()).unwrap();
        assert_eq!(entry.raw(), "2 * * * * second");
        assert_eq!(reg.pending_adds().count(), 1);
    }

    #[test]
    fn test_invalid_add_stages_nothing() {
        let mut reg = EntryRegistry::new();
        reg.remove("a").unwrap();
        assert!(reg.add("a", &"1-85 2 * * * echo 123".into()).is_err());
        assert_eq!(reg.pending_adds().count(), 0);
        assert_eq!(reg.pending_removals().count(), 1);
    }

    #[test]
    fn test_merge() {
        let current = parse_crontab(["#keep", "1 * * * * keep", "#gone", "2 * * * * gone", "#mod", "3 * * * * old"]);
        let mut reg = EntryRegistry::new();
        reg.add("mod", &"4 * * * * new".into()).unwrap();
        reg.add("fresh", &"5 * * * * fresh".into()).unwrap();
        reg.remove("gone").unwrap();

        let merged = reg.merge(current);
        let pairs: Vec<(&str, &str)> = merged.iter().map(|(k, v)| (k.0.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            [("keep", "1 * * * * keep"), ("mod", "4 * * * * new"), ("fresh", "5 * * * * fresh")]
        );
    }

    #[test]
    fn test_rollback_and_review() {
        let mut reg = EntryRegistry::new();
        reg.add("agent1", &"5,35 0-23/2 * * * \"echo 123\" ".into()).unwrap();
        reg.remove("agent2").unwrap();

        let review = reg.review();
        assert_eq!(review.adds[0].1, "5,35 0-23/2 * * * \"echo 123\"");
        assert_eq!(review.removals, vec![EntryId::from("agent2")]);
        assert!(review.to_string().contains("#agent2"));

        reg.rollback();
        assert!(!reg.is_dirty());
        assert_eq!(reg.merge(Snapshot::new()), Snapshot::new());
    }

    #[test]
    fn test_remove_trims_and_rejects_multiline_ids() {
        let mut reg = EntryRegistry::new();
        reg.add("a", &"1 * * * * a".into()).unwrap();
        reg.remove(" a ").unwrap();
        assert_eq!(reg.pending_adds().count(), 0);
        assert_eq!(reg.pending_removals().collect::<Vec<_>>(), [&EntryId::from("a")]);

        assert!(reg.remove("b\n1 * * * * b").is_err());
        assert_eq!(reg.pending_removals().count(), 1);
    }
}
