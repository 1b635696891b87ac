pub mod crontab;
pub mod entry;
pub mod error;
pub mod field;
pub mod registry;
pub mod schedule;
pub mod session;
pub mod store;

pub use crontab::{parse_crontab, render_crontab, Snapshot};
pub use entry::{Entry, EntryId};
pub use error::{CronError, Result};
pub use field::{expand, FieldKind};
pub use registry::{EntryRegistry, Review};
pub use schedule::{Definition, FieldValue, ScheduleRecord};
pub use session::{add_entry, list_entries, remove_entry, Consistency, CrontabSession};
pub use store::{CrontabStore, SystemCrontab};

#[cfg(any(test, feature = "test-support"))]
pub use store::{MemoryCrontab, StoreCall};

pub const DEFAULT_CRONTAB_PROGRAM: &str = "crontab";

// Config locations; the user path is resolved against $HOME
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cronedit/config.yaml";
pub const USER_CONFIG_PATH: &str = ".config/cronedit/config.yaml";
pub const LOG_ENV_VAR: &str = "CRONEDIT_LOG";
