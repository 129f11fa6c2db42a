//! Decision journal.
//!
//! Every executed decision (training, event option, race) is appended to a CSV
//! file, opening the file per write so a crash never loses earlier rows.

use anyhow::{Context, Result};
use chrono::Local;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const CSV_HEADER: &str = "timestamp,kind,choice,weight,detail";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionKind {
    Training,
    EventOption,
    Race,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionKind::Training => write!(f, "training"),
            DecisionKind::EventOption => write!(f, "event_option"),
            DecisionKind::Race => write!(f, "race"),
        }
    }
}

pub struct DecisionJournal {
    path: Option<PathBuf>,
}

impl DecisionJournal {
    /// Opens `<dir>/decisions.csv`, writing the header if the file is new or empty.
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).context("Failed to create journal directory")?;
        let path = dir.join("decisions.csv");
        init_csv(&path)?;
        Ok(Self { path: Some(path) })
    }

    /// A journal that records nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Appends one row. Write failures are logged and otherwise ignored.
    pub fn record(&self, kind: DecisionKind, choice: &str, weight: i32, detail: &str) {
        let Some(path) = &self.path else { return };
        if let Err(e) = append_row(path, kind, choice, weight, detail) {
            crate::log(&format!("Failed to write decision journal: {:#}", e));
        }
    }
}

fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing journal")?;
        if BufReader::new(file).lines().next().is_some() {
            return Ok(());
        }
    }
    let mut file = File::create(path).context("Failed to create journal")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write journal header")?;
    Ok(())
}

fn append_row(path: &Path, kind: DecisionKind, choice: &str, weight: i32, detail: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open journal for append")?;

    let line = format!(
        "{},{},{},{},{}",
        Local::now().format("%Y-%m-%dT%H:%M:%S"),
        kind,
        escape(choice),
        weight,
        escape(detail),
    );
    writeln!(file, "{}", line).context("Failed to write journal row")?;
    Ok(())
}

/// Quotes a field containing a separator, quote or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
