use crate::error::{CronError, Result};
use crate::field::FieldKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const WILDCARD: &str = "*";

/// Structured form of one crontab line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub minute: String,
    pub hour: String,
    pub day: String,
    pub month: String,
    pub weekday: String,
    pub command: String,
}

impl Default for ScheduleRecord {
    fn default() -> Self {
        Self {
            minute: WILDCARD.to_string(),
            hour: WILDCARD.to_string(),
            day: WILDCARD.to_string(),
            month: WILDCARD.to_string(),
            weekday: WILDCARD.to_string(),
            command: String::new(),
        }
    }
}

impl ScheduleRecord {
    /// Parse a crontab line: five timing fields, then the command
    pub fn decode(line: &str) -> Result<Self> {
        if line.contains(['\n', '\r']) {
            return Err(CronError::Parse(line.to_string()));
        }

        let mut rest = line.trim_start();
        let mut tokens = Vec::with_capacity(5);
        for _ in 0..5 {
            if rest.is_empty() {
                return Err(CronError::Parse(line.to_string()));
            }
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            tokens.push(&rest[..end]);
            rest = rest[end..].trim_start();
        }

        let mut record = ScheduleRecord {
            command: rest.trim_end().to_string(),
            ..Default::default()
        };
        for (kind, token) in FieldKind::ALL.into_iter().zip(tokens) {
            *record.field_mut(kind) = kind.expand(token)?;
        }
        Ok(record)
    }

    /// Tab separated line, fields in crontab order
    pub fn encode(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.minute, self.hour, self.day, self.month, self.weekday, self.command
        )
    }

    pub fn field(&self, kind: FieldKind) -> &str {
        match kind {
            FieldKind::Minute => &self.minute,
            FieldKind::Hour => &self.hour,
            FieldKind::Day => &self.day,
            FieldKind::Month => &self.month,
            FieldKind::Weekday => &self.weekday,
        }
    }

    fn field_mut(&mut self, kind: FieldKind) -> &mut String {
        match kind {
            FieldKind::Minute => &mut self.minute,
            FieldKind::Hour => &mut self.hour,
            FieldKind::Day => &mut self.day,
            FieldKind::Month => &mut self.month,
            FieldKind::Weekday => &mut self.weekday,
        }
    }
}

impl fmt::Display for ScheduleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// A value in a structured definition; manifests may write `minute: 5`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(u32),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Number(n)
    }
}

/// How a caller describes an entry: a crontab line or named fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Definition {
    Text(String),
    Fields(BTreeMap<String, FieldValue>),
}

impl Definition {
    pub fn fields<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Definition::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Resolve into the raw line and its record.
    ///
    /// Text keeps the caller's line (trimmed) as the raw form. Fields are
    /// validated, unset ones default to `*`, and the raw form is the encoded
    /// record. Supplied fields are stored canonically except a bare `*`.
    pub fn resolve(&self) -> Result<(String, ScheduleRecord)> {
        match self {
            Definition::Text(line) => {
                let line = line.trim();
                let record = ScheduleRecord::decode(line)?;
                Ok((line.to_string(), record))
            }
            Definition::Fields(map) => {
                let wrong: Vec<String> = map
                    .keys()
                    .filter(|k| k.as_str() != "command" && FieldKind::from_name(k).is_none())
                    .cloned()
                    .collect();
                if !wrong.is_empty() {
                    return Err(CronError::Config(wrong));
                }

                let mut record = ScheduleRecord::default();
                for (key, value) in map {
                    let value = value.to_string();
                    match FieldKind::from_name(key) {
                        Some(_) if value.trim() == WILDCARD => {}
                        Some(kind) => *record.field_mut(kind) = kind.expand(value.trim())?,
                        None => record.command = value,
                    }
                }

                let raw = record.encode();
                if raw.contains(['\n', '\r']) {
                    return Err(CronError::Parse(raw));
                }
                Ok((raw, record))
            }
        }
    }
}

impl From<&str> for Definition {
    fn from(s: &str) -> Self {
        Definition::Text(s.to_string())
    }
}

impl From<String> for Definition {
    fn from(s: String) -> Self {
        Definition::Text(s)
    }
}

impl Default for Definition {
    fn default() -> Self {
        Definition::Fields(BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        let r = ScheduleRecord::decode("5,35 0-23/2 * * * echo 123").unwrap();
        assert_eq!(r.minute, "5,35");
        assert_eq!(r.hour, "0,2,4,6,8,10,12,14,16,18,20,22");
        assert_eq!(
            r.day,
            "1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18,19,20,21,22,23,24,25,26,27,28,29,30,31"
        );
        assert_eq!(r.month, "1,2,3,4,5,6,7,8,9,10,11,12");
        assert_eq!(r.weekday, "0,1,2,3,4,5,6");
        assert_eq!(r.command, "echo 123");
    }

    #[test]
    fn test_decode_keeps_inner_whitespace_of_command() {
        let r = ScheduleRecord::decode("  0 2 * * mon   echo  \"a  b\"  ").unwrap();
        assert_eq!(r.weekday, "1");
        assert_eq!(r.command, "echo  \"a  b\"");

        let r = ScheduleRecord::decode("0\t2\t*\t*\t*").unwrap();
        assert_eq!(r.command, "");
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            ScheduleRecord::decode("1-85 2 * * * echo 123"),
            Err(CronError::Range { .. })
        ));
        assert!(matches!(ScheduleRecord::decode("1 2 * *"), Err(CronError::Parse(_))));
        assert!(matches!(ScheduleRecord::decode(""), Err(CronError::Parse(_))));
        assert!(matches!(
            ScheduleRecord::decode("1 2 * * * a\n3 4 * * * b"),
            Err(CronError::Parse(_))
        ));
    }

    #[test]
    fn test_encode_default() {
        assert_eq!(ScheduleRecord::default().encode(), "*\t*\t*\t*\t*\t");
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let record = ScheduleRecord {
            minute: "5,35".into(),
            hour: "0,12".into(),
            day: "1,15".into(),
            month: "6".into(),
            weekday: "1,2,3".into(),
            command: "echo \"x y\"".into(),
        };
        assert_eq!(ScheduleRecord::decode(&record.encode()).unwrap(), record);

        let canonical = ScheduleRecord::decode("*/20 3 * 2 sun /bin/true").unwrap();
        assert_eq!(ScheduleRecord::decode(&canonical.encode()).unwrap(), canonical);
    }

    #[test]
    fn test_resolve_fields() {
        let def = Definition::fields([("minute", FieldValue::from(5)), ("command", "echo 42".into())]);
        let (raw, record) = def.resolve().unwrap();
        assert_eq!(raw, "5\t*\t*\t*\t*\techo 42");
        assert_eq!(record.minute, "5");
        assert_eq!(record.hour, WILDCARD);

        let (raw, _) = Definition::default().resolve().unwrap();
        assert_eq!(raw, "*\t*\t*\t*\t*\t");

        let (raw, _) = Definition::fields([("hour", "0-6/3"), ("weekday", "Sat")]).resolve().unwrap();
        assert_eq!(raw, "*\t0,3,6\t*\t*\t6\t");
    }

    #[test]
    fn test_resolve_rejects_unknown_keys() {
        let def = Definition::fields([
            ("minuteZ", FieldValue::from(5)),
            ("command", "echo 42".into()),
            ("hours", "1".into()),
        ]);
        match def.resolve() {
            Err(CronError::Config(keys)) => assert_eq!(keys, vec!["hours", "minuteZ"]),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_validates_field_values() {
        let def = Definition::fields([("hour", "25")]);
        assert!(matches!(def.resolve(), Err(CronError::Range { field: "hour", .. })));
    }

    #[test]
    fn test_resolve_text_keeps_raw_line() {
        let (raw, record) = Definition::from(" 5,35 0-23/2 * * * echo 123 ").resolve().unwrap();
        assert_eq!(raw, "5,35 0-23/2 * * * echo 123");
        assert_eq!(record.minute, "5,35");
    }

    #[test]
    fn test_definition_from_yaml_like_json() {
        let text: Definition = serde_json::from_str("\"0 2 * * * echo agent2\"").unwrap();
        assert_eq!(text, Definition::from("0 2 * * * echo agent2"));

        let fields: Definition = serde_json::from_str(r#"{"minute": 5, "command": "echo 42"}"#).unwrap();
        assert_eq!(
            fields,
            Definition::fields([("minute", FieldValue::from(5)), ("command", "echo 42".into())])
        );
    }
}
