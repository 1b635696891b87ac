use crate::error::{CronError, Result};
use crate::field::FieldKind;
use crate::schedule::{Definition, ScheduleRecord};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a crontab entry, taken from its `#id` comment or its position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    /// Trim the id and check it fits on its `#id` comment line
    pub fn checked(self) -> Result<Self> {
        let id = self.0.trim();
        let reason = if id.is_empty() {
            "empty"
        } else if id.contains(['\n', '\r']) {
            "contains a line break"
        } else {
            return Ok(EntryId(id.to_string()));
        };
        Err(CronError::Id { id: self.0, reason })
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for EntryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        EntryId(s.to_string())
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        EntryId(s)
    }
}

impl From<usize> for EntryId {
    fn from(index: usize) -> Self {
        EntryId(index.to_string())
    }
}

/// A named crontab line, kept both as written and as parsed fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    id: EntryId,
    raw: String,
    record: ScheduleRecord,
}

impl Entry {
    pub fn new(id: impl Into<EntryId>, definition: &Definition) -> Result<Self> {
        let id = id.into().checked()?;
        let (raw, record) = definition.resolve()?;
        Ok(Self {
            id,
            raw,
            record,
        })
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    /// The line as it will be written to the crontab
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn record(&self) -> &ScheduleRecord {
        &self.record
    }

    /// Look up a column by name; `command` returns the command
    pub fn field(&self, name: &str) -> Option<&str> {
        match FieldKind::from_name(name) {
            Some(kind) => Some(self.record.field(kind)),
            None if name == "command" => Some(&self.record.command),
            None => None,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
