//! In-memory crontab for testing

use super::CrontabStore;
use crate::error::{CronError, Result};
use std::sync::{Arc, Mutex};

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Read,
    Write(Vec<String>),
}

#[derive(Debug, Default)]
struct MemoryState {
    lines: Option<Vec<String>>,
    previous: Option<Vec<String>>,
    stale_reads: usize,
    fail_writes: bool,
    calls: Vec<StoreCall>,
}

/// Crontab kept in memory. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCrontab {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCrontab {
    /// A user without a crontab
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lines<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        let store = Self::new();
        store.lock().lines = Some(lines.into_iter().map(Into::into).collect());
        store
    }

    /// Make the next `count` reads after a write return the content it replaced
    pub fn set_stale_reads(&self, count: usize) {
        self.lock().stale_reads = count;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Current content, `None` when no crontab is installed
    pub fn lines(&self) -> Option<Vec<String>> {
        self.lock().lines.clone()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn writes(&self) -> usize {
        self.lock().calls.iter().filter(|c| matches!(c, StoreCall::Write(_))).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CrontabStore for MemoryCrontab {
    fn read(&self) -> Result<Vec<String>> {
        let mut state = self.lock();
        state.calls.push(StoreCall::Read);

        let visible = if state.previous.is_some() && state.stale_reads > 0 {
            state.stale_reads -= 1;
            state.previous.clone()
        } else {
            state.lines.clone()
        };
        Ok(visible.unwrap_or_else(|| vec!["no crontab for tester".to_string()]))
    }

    fn write(&self, lines: &[String]) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(StoreCall::Write(lines.to_vec()));
        if state.fail_writes {
            return Err(CronError::store("write", "installer exited with status 1"));
        }
        state.previous = Some(state.lines.take().unwrap_or_default());
        state.lines = Some(lines.to_vec());
        Ok(())
    }
}
