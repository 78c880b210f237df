//! Timestamped benchmark output and the optional JSON report.

use std::{
    fmt::Display,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;

use crate::bench::{BenchmarkSummary, IterationRecord};
use crate::config::Profile;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Writes the human-readable benchmark log, one `[timestamp] message` per line.
pub struct Reporter<W> {
    out: W,
}

impl Reporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn line(&mut self, message: impl Display) -> io::Result<()> {
        let now = format_timestamp(&Local::now().naive_local());
        writeln!(self.out, "[{now}] {message}")
    }

    pub fn started(&mut self, label: impl Display) -> io::Result<()> {
        self.line(label)
    }

    pub fn finished(&mut self, label: impl Display, elapsed_secs: f64) -> io::Result<()> {
        self.line(format_args!(
            "FINISHED: {label} - {elapsed_secs:.2} seconds elapsed."
        ))
    }

    /// A line without timestamp.
    pub fn plain(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.out, "{message}")
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub profile: String,
    pub started_at: DateTime<Local>,
    pub session: &'static str,
    pub iterations: Vec<IterationRecord>,
    pub average_secs: f64,
    pub min_secs: f64,
    pub max_secs: f64,
}

impl BenchmarkReport {
    pub fn new(profile: &Profile, summary: &BenchmarkSummary) -> Self {
        Self {
            profile: profile.name.clone(),
            started_at: summary.started_at,
            session: profile.browser.session.as_str(),
            iterations: summary.records.clone(),
            average_secs: summary.average_secs().unwrap_or_default(),
            min_secs: summary.min_secs().unwrap_or_default(),
            max_secs: summary.max_secs().unwrap_or_default(),
        }
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(path)
    }
}
