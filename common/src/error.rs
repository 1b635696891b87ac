use thiserror::Error;

/// Errors raised while parsing schedules or talking to the crontab store
#[derive(Debug, Error)]
pub enum CronError {
    /// A bound falls outside the field's numeric domain
    #[error("{field}: out of range ({value} for {low}-{high})")]
    Range {
        field: &'static str,
        value: u32,
        low: u32,
        high: u32,
    },

    /// A field token is not a number, a range or a step
    #[error("{field}: invalid expression '{token}': {reason}")]
    Field {
        field: &'static str,
        token: String,
        reason: String,
    },

    /// A schedule line without five timing fields
    #[error("expected five timing fields followed by a command, got '{0}'")]
    Parse(String),

    /// An entry id that cannot be written as a single `#id` comment line
    #[error("invalid entry id '{}': {reason}", .id.escape_debug())]
    Id { id: String, reason: &'static str },

    /// A structured definition with keys outside the known field names
    #[error("wrong definition, invalid keys: {}", .0.join(", "))]
    Config(Vec<String>),

    /// An imported line that is not a valid schedule
    #[error("entry '{id}': {source}")]
    Import {
        id: String,
        source: Box<CronError>,
    },

    #[error("crontab {op} failed: {message}")]
    Store { op: &'static str, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CronError {
    pub(crate) fn store(op: &'static str, message: impl Into<String>) -> Self {
        CronError::Store {
            op,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CronError>;
