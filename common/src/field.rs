use crate::error::{CronError, Result};
use std::collections::HashSet;
use std::fmt;

const WEEKDAYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// One of the five timing columns of a crontab line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Minute,
    Hour,
    Day,
    Month,
    Weekday,
}

impl FieldKind {
    /// Columns in crontab order
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Minute,
        FieldKind::Hour,
        FieldKind::Day,
        FieldKind::Month,
        FieldKind::Weekday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Minute => "minute",
            FieldKind::Hour => "hour",
            FieldKind::Day => "day",
            FieldKind::Month => "month",
            FieldKind::Weekday => "weekday",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Inclusive numeric domain of the column
    pub fn domain(&self) -> (u32, u32) {
        match self {
            FieldKind::Minute => (0, 59),
            FieldKind::Hour => (0, 23),
            FieldKind::Day => (1, 31),
            FieldKind::Month => (1, 12),
            FieldKind::Weekday => (0, 6),
        }
    }

    /// Expand an expression for this column, resolving weekday names first
    pub fn expand(&self, expression: &str) -> Result<String> {
        let (low, high) = self.domain();
        match self {
            FieldKind::Weekday => expand_named(self.name(), &substitute_weekdays(expression), low, high),
            _ => expand_named(self.name(), expression, low, high),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expand a comma list of values, ranges and steps into the canonical
/// comma separated list of values within `[low, high]`.
///
/// Steps are counted from `low`, not from the start of the sub-range:
/// `10-20/7` over `0-59` yields `14`, not `10,17`. Existing crontabs rely on
/// this, so it stays.
///
/// Duplicates across sub-terms are dropped, keeping the first occurrence and
/// the sub-term order: `30,0-59/30` yields `30,0`.
pub fn expand(expression: &str, low: u32, high: u32) -> Result<String> {
    expand_named("field", expression, low, high)
}

fn expand_named(field: &'static str, expression: &str, low: u32, high: u32) -> Result<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();

    for term in expression.split(',') {
        for value in expand_term(field, term.trim(), low, high)? {
            if seen.insert(value) {
                values.push(value.to_string());
            }
        }
    }

    if values.is_empty() {
        return Err(CronError::Field {
            field,
            token: expression.to_string(),
            reason: "selects no values".to_string(),
        });
    }

    log::debug!("expanded {} '{}' to {} values", field, expression, values.len());
    Ok(values.join(","))
}

fn expand_term(field: &'static str, term: &str, low: u32, high: u32) -> Result<Vec<u32>> {
    let invalid = |reason: &str| CronError::Field {
        field,
        token: term.to_string(),
        reason: reason.to_string(),
    };

    let (range, step) = match term.split_once('/') {
        Some((range, step)) => {
            let step: u32 = step.parse().map_err(|_| invalid("step is not a number"))?;
            if step == 0 {
                return Err(invalid("step must be positive"));
            }
            (range, step)
        }
        None => (term, 1),
    };

    let number = |s: &str| -> Result<u32> {
        if s.is_empty() {
            return Err(invalid("missing value"));
        }
        s.parse().map_err(|_| invalid("not a number"))
    };
    let out_of_range = |value: u32| CronError::Range { field, value, low, high };

    let (first, last) = match range.split_once('-') {
        None if range == "*" => (low, high),
        None => {
            let value = number(range)?;
            if value < low || value > high {
                return Err(out_of_range(value));
            }
            (value, value)
        }
        Some((f, l)) => {
            let (first, last) = (number(f)?, number(l)?);
            if first < low {
                return Err(out_of_range(first));
            }
            if last > high {
                return Err(out_of_range(last));
            }
            if first > last {
                return Err(invalid("range start is after its end"));
            }
            (first, last)
        }
    };

    Ok((first..=last).filter(|v| (v - low) % step == 0).collect())
}

fn substitute_weekdays(expression: &str) -> String {
    let mut out = expression.to_ascii_lowercase();
    for (index, name) in WEEKDAYS.iter().enumerate() {
        out = out.replace(name, &index.to_string());
    }
    out
}
