use std::{io::Write, time::Instant};

use anyhow::{ensure, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    browser::{NavigationOutcome, Navigator},
    cas::{extract_form_action, ticket_from_body, Credentials, TicketSource},
    config::Profile,
    report::Reporter,
};

#[derive(Clone, Debug, Serialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub elapsed_secs: f64,
    pub tgt_secs: f64,
    pub st_secs: f64,
    pub navigation_secs: f64,
    pub navigated: bool,
}

#[derive(Clone, Debug)]
pub struct BenchmarkSummary {
    pub started_at: DateTime<Local>,
    pub records: Vec<IterationRecord>,
}

impl BenchmarkSummary {
    pub fn average_secs(&self) -> Option<f64> {
        mean(self.records.iter().map(|record| record.elapsed_secs))
    }

    pub fn min_secs(&self) -> Option<f64> {
        self.records
            .iter()
            .map(|record| record.elapsed_secs)
            .reduce(f64::min)
    }

    pub fn max_secs(&self) -> Option<f64> {
        self.records
            .iter()
            .map(|record| record.elapsed_secs)
            .reduce(f64::max)
    }
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_u32), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Runs the TGT -> ST -> browser redirect flow a fixed number of times.
///
/// The navigator is the long-lived browser session; every iteration reuses it.
pub struct Benchmark<'p, T, N> {
    profile: &'p Profile,
    tickets: T,
    navigator: N,
}

impl<'p, T: TicketSource, N: Navigator> Benchmark<'p, T, N> {
    pub fn new(profile: &'p Profile, tickets: T, navigator: N) -> Self {
        Self {
            profile,
            tickets,
            navigator,
        }
    }

    pub fn tickets(&self) -> &T {
        &self.tickets
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub async fn run<W: Write>(
        &mut self,
        credentials: &Credentials,
        iterations: u32,
        reporter: &mut Reporter<W>,
    ) -> Result<BenchmarkSummary> {
        ensure!(iterations > 0, "at least one iteration is required");

        let started_at = Local::now();
        let mut records = Vec::with_capacity(iterations as usize);
        for iteration in 1..=iterations {
            reporter.line(format_args!("Starting iteration #{iteration}"))?;
            let record = self.iterate(iteration, credentials, reporter).await?;
            reporter.finished(format_args!("iteration #{iteration}"), record.elapsed_secs)?;
            reporter.blank()?;
            records.push(record);
        }

        let summary = BenchmarkSummary {
            started_at,
            records,
        };
        let average = summary.average_secs().unwrap_or_default();
        info!(iterations, average_secs = average, "benchmark complete");
        reporter.plain(format_args!(
            "Average time after {iterations} iterations: {average:.2} seconds."
        ))?;
        Ok(summary)
    }

    async fn iterate<W: Write>(
        &mut self,
        iteration: u32,
        credentials: &Credentials,
        reporter: &mut Reporter<W>,
    ) -> Result<IterationRecord> {
        let iteration_start = Instant::now();

        reporter.started("Fetching TGT")?;
        let start = Instant::now();
        let tgt_response = self.tickets.ticket_granting_ticket(credentials).await?;
        let tgt_secs = start.elapsed().as_secs_f64();
        reporter.finished("Fetching TGT", tgt_secs)?;

        let service_ticket_url = extract_form_action(&tgt_response)?;

        reporter.started("Fetching ST")?;
        let start = Instant::now();
        let st_response = self.tickets.service_ticket(&service_ticket_url).await?;
        let st_secs = start.elapsed().as_secs_f64();
        reporter.finished("Fetching ST", st_secs)?;

        let login_url = self.profile.login_url(&ticket_from_body(&st_response));

        reporter.started(format_args!("Navigating to {login_url}"))?;
        let start = Instant::now();
        let navigator = &mut self.navigator;
        let outcome = blocking(|| navigator.navigate(&login_url));
        let navigation_secs = start.elapsed().as_secs_f64();
        reporter.finished(format_args!("Navigating to {login_url}"), navigation_secs)?;

        let navigated = outcome.succeeded();
        match outcome {
            NavigationOutcome::Loaded { .. } => {
                reporter.line("User successfully redirected to the target application.")?
            }
            NavigationOutcome::EmptyTitle => {
                warn!(iteration, "page loaded with an empty title");
                reporter.line("Navigation failed.")?
            }
            NavigationOutcome::Failed { reason } => {
                warn!(iteration, %reason, "navigation error");
                reporter.line("Navigation failed.")?
            }
        }

        Ok(IterationRecord {
            iteration,
            elapsed_secs: iteration_start.elapsed().as_secs_f64(),
            tgt_secs,
            st_secs,
            navigation_secs,
            navigated,
        })
    }
}

/// Runs a blocking browser call without stalling the runtime's other workers.
fn blocking<R>(f: impl FnOnce() -> R) -> R {
    use tokio::runtime::{Handle, RuntimeFlavor};

    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}
