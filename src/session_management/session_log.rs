use std::fmt;

use chrono::{DateTime, Utc};
use log::warn;

/// One processed frame, as it appears in the compiled session log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub current_in_count: u64,
    pub labels: Vec<String>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}    Current-Count: {}  ->  [",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.current_in_count,
        )?;
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_quoted(f, label)?;
        }
        f.write_str("]")
    }
}

/// Single-quoted label; double quotes only when the label itself holds a
/// single quote and no double quote.
fn write_quoted(f: &mut fmt::Formatter<'_>, label: &str) -> fmt::Result {
    let quote = if label.contains('\'') && !label.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{}", quote)?;
    for c in label.chars() {
        if c == quote || c == '\\' {
            write!(f, "\\")?;
        }
        write!(f, "{}", c)?;
    }
    write!(f, "{}", quote)
}

/// Append-only event log of one session.
///
/// The first `compile` freezes the text; later calls return the same text.
#[derive(Debug, Default)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
    compiled: Option<String>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: LogEntry) {
        if self.compiled.is_some() {
            warn!("Dropping log entry appended after compilation");
            return;
        }
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn compile(&mut self) -> String {
        self.compiled
            .get_or_insert_with(|| {
                self.entries
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .clone()
    }
}
