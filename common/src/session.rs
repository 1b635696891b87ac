use crate::crontab::{self, Snapshot};
use crate::entry::{Entry, EntryId};
use crate::error::{CronError, Result};
use crate::registry::{EntryRegistry, Review};
use crate::schedule::Definition;
use crate::store::CrontabStore;
use std::io::BufRead;
use std::time::{Duration, Instant};

/// How long a commit waits for the written crontab to be readable back.
///
/// The cron subsystem may not serve a just-installed crontab on the next
/// read. After writing, the session re-reads every `poll_interval` until the
/// content matches or `settle_timeout` runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consistency {
    pub settle_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for Consistency {
    fn default() -> Self {
        Self {
            settle_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// A batch of changes against one user's crontab.
///
/// Changes are staged with [`add`](Self::add) and [`remove`](Self::remove)
/// and only reach the store on [`commit`](Self::commit).
pub struct CrontabSession<S: CrontabStore> {
    store: S,
    registry: EntryRegistry,
    consistency: Consistency,
}

impl<S: CrontabStore> CrontabSession<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            registry: EntryRegistry::new(),
            consistency: Consistency::default(),
        }
    }

    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add(&mut self, id: impl Into<EntryId>, definition: &Definition) -> Result<&Entry> {
        self.registry.add(id, definition)
    }

    pub fn remove(&mut self, id: impl Into<EntryId>) -> Result<()> {
        self.registry.remove(id)
    }

    /// Drop all staged changes
    pub fn rollback(&mut self) {
        self.registry.rollback()
    }

    pub fn is_dirty(&self) -> bool {
        self.registry.is_dirty()
    }

    pub fn review(&self) -> Review {
        self.registry.review()
    }

    /// Literal crontab lines, empty when the user has none
    pub fn list_raw(&self) -> Result<Vec<String>> {
        let lines = self.store.read()?;
        if crontab::is_no_crontab(&lines) {
            return Ok(Vec::new());
        }
        Ok(lines)
    }

    /// Current entries by id
    pub fn list(&self) -> Result<Snapshot> {
        Ok(crontab::parse_crontab(self.store.read()?))
    }

    /// Stage every line of a crontab text as an add.
    ///
    /// Lines are keyed the same way `list` keys them. If any line is not a
    /// valid schedule, nothing is staged.
    pub fn import_from<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        let lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;
        let parsed = crontab::parse_crontab(lines);

        let entries = parsed
            .into_iter()
            .map(|(id, line)| {
                Entry::new(id.clone(), &Definition::Text(line)).map_err(|source| CronError::Import {
                    id: id.0,
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<Entry>>>()?;

        let count = entries.len();
        for entry in entries {
            self.registry.stage(entry);
        }
        log::info!("imported {} entries", count);
        Ok(count)
    }

    /// Merge staged changes into the current crontab and install it.
    ///
    /// On failure nothing is cleared, so the same session can commit again.
    pub fn commit(&mut self) -> Result<Snapshot> {
        let merged = self.registry.merge(self.list()?);
        self.store.write(&crontab::render_crontab(&merged))?;
        self.await_visible(&merged);

        let review = self.registry.review();
        log::info!(
            "committed crontab: {} added, {} removed, {} entries total",
            review.adds.len(),
            review.removals.len(),
            merged.len()
        );
        self.registry.rollback();
        Ok(merged)
    }

    fn await_visible(&self, expected: &Snapshot) -> bool {
        let start = Instant::now();
        loop {
            match self.list() {
                Ok(current) if current == *expected => return true,
                Ok(_) => log::debug!("crontab not yet visible after write"),
                Err(e) => log::debug!("read-back after write failed: {}", e),
            }
            if start.elapsed() >= self.consistency.settle_timeout {
                log::warn!(
                    "written crontab not visible after {:?}; later reads may be stale",
                    self.consistency.settle_timeout
                );
                return false;
            }
            std::thread::sleep(self.consistency.poll_interval);
        }
    }
}

/// Add one entry and commit right away
pub fn add_entry<S: CrontabStore>(store: &S, id: impl Into<EntryId>, definition: &Definition) -> Result<Entry> {
    let mut session = CrontabSession::new(store);
    let entry = session.add(id, definition)?.clone();
    session.commit()?;
    Ok(entry)
}

/// Remove one entry and commit right away
pub fn remove_entry<S: CrontabStore>(store: &S, id: impl Into<EntryId>) -> Result<Snapshot> {
    let mut session = CrontabSession::new(store);
    session.remove(id)?;
    session.commit()
}

pub fn list_entries<S: CrontabStore>(store: &S) -> Result<Snapshot> {
    CrontabSession::new(store).list()
}
