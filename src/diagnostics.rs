use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticEvent {
    pub level: Level,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

/// Per-build accumulator. Layout code records what it degraded or skipped
/// here instead of logging inline; the finished value is returned with the
/// PDF bytes.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    events: Vec<DiagnosticEvent>,
    counters: BTreeMap<String, u64>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, code: &str, message: impl Into<String>) {
        self.push(Level::Info, code, message.into(), None);
    }

    pub fn warn(&mut self, code: &str, message: impl Into<String>) {
        self.push(Level::Warn, code, message.into(), None);
    }

    pub fn warn_on_page(&mut self, code: &str, page: usize, message: impl Into<String>) {
        self.push(Level::Warn, code, message.into(), Some(page));
    }

    fn push(&mut self, level: Level, code: &str, message: String, page: Option<usize>) {
        self.events.push(DiagnosticEvent {
            level,
            code: code.to_string(),
            message,
            page,
        });
    }

    pub fn increment(&mut self, key: &str, amount: u64) {
        let entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.events.iter().any(|e| e.code == code)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticEvent> {
        self.events.iter().filter(|e| e.level == Level::Warn)
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.events.extend(other.events);
        for (key, value) in other.counters {
            self.increment(&key, value);
        }
    }

    /// One JSON object per event, then a summary line carrying the counters.
    pub fn to_jsonl(&self, context: &str) -> String {
        let mut out = String::new();
        for event in &self.events {
            if let Ok(line) = serde_json::to_string(event) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        let summary = serde_json::json!({
            "type": "build.summary",
            "context": context,
            "counts": self.counters,
        });
        out.push_str(&summary.to_string());
        out.push('\n');
        out
    }
}

/// Append-only JSONL file shared by every build of one engine.
#[derive(Clone)]
pub(crate) struct DiagnosticsSink {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl DiagnosticsSink {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn append(&self, diagnostics: &Diagnostics, context: &str) {
        if let Ok(mut writer) = self.inner.lock() {
            let _ = writer.write_all(diagnostics.to_jsonl(context).as_bytes());
            let _ = writer.flush();
        }
    }
}
