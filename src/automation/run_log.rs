//! Operator-facing run log.
//!
//! Append-only. Each line carries the elapsed run time. Lines are kept for the
//! final report and mirrored to stdout and a per-run file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub struct RunLog {
    started: Instant,
    lines: Vec<String>,
    file: Option<PathBuf>,
    echo: bool,
}

impl RunLog {
    /// Log mirrored to stdout and `path`.
    pub fn to_file(path: &Path) -> Self {
        Self {
            started: Instant::now(),
            lines: Vec::new(),
            file: Some(path.to_path_buf()),
            echo: true,
        }
    }

    /// In-memory only.
    pub fn in_memory() -> Self {
        Self {
            started: Instant::now(),
            lines: Vec::new(),
            file: None,
            echo: false,
        }
    }

    pub fn print(&mut self, message: &str) {
        let line = format_line(self.started.elapsed(), message);
        if self.echo {
            println!("{}", line);
        }
        if let Some(path) = &self.file {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", line);
            }
        }
        self.lines.push(line);
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    /// Tally of everything printed so far, for the closing report.
    pub fn summary(&self) -> String {
        let tagged = |tag: &str| self.lines.iter().filter(|l| l.contains(tag)).count();
        format!(
            "{} lines logged, warnings: {}, errors: {}",
            self.lines.len(),
            tagged("[WARNING]"),
            tagged("[ERROR]")
        )
    }
}

/// Prefixes `message` with `HH:MM:SS`, keeping a leading blank line in front.
fn format_line(elapsed: Duration, message: &str) -> String {
    let secs = elapsed.as_secs();
    let stamp = format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60);
    match message.strip_prefix('\n') {
        Some(rest) => format!("\n{} {}", stamp, rest),
        None => format!("{} {}", stamp, message),
    }
}
