//! Access to the installed crontab

mod system;

pub use system::SystemCrontab;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod memory;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryCrontab, StoreCall};

use crate::error::Result;

/// Reads and replaces one user's crontab
pub trait CrontabStore {
    /// Literal crontab lines; the first starts with "no" when there is none
    fn read(&self) -> Result<Vec<String>>;

    /// Replace the whole crontab with `lines`
    fn write(&self, lines: &[String]) -> Result<()>;
}

impl<S: CrontabStore + ?Sized> CrontabStore for &S {
    fn read(&self) -> Result<Vec<String>> {
        (**self).read()
    }

    fn write(&self, lines: &[String]) -> Result<()> {
        (**self).write(lines)
    }
}
