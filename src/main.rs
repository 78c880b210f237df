use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use casbench::{
    bench::Benchmark,
    browser::ChromeNavigator,
    cas::CasClient,
    cli::Cli,
    report::{BenchmarkReport, Reporter},
};

fn init_tracing(level: &str, verbose: bool) {
    let default = if verbose {
        "casbench=debug".to_string()
    } else {
        format!("casbench={level}")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let profile = cli.resolve_profile()?;
    init_tracing(&profile.logging.level, cli.verbose);
    info!(profile = %profile.name, iterations = cli.iterations, "starting CAS benchmark");

    let mut reporter = Reporter::stdout();
    let tickets = CasClient::new(&profile.cas)?;

    reporter.started("Initializing Chrome")?;
    let start = Instant::now();
    let navigator = ChromeNavigator::launch(&profile.browser)?;
    reporter.finished("Initializing Chrome", start.elapsed().as_secs_f64())?;
    reporter.blank()?;

    // The browser session lives inside the benchmark and is released when it drops.
    let mut benchmark = Benchmark::new(&profile, tickets, navigator);
    let summary = benchmark
        .run(&cli.credentials(), cli.iterations, &mut reporter)
        .await?;

    if let Some(path) = &cli.report {
        let written = BenchmarkReport::new(&profile, &summary).write(path)?;
        info!(path = %written.display(), "wrote benchmark report");
    }
    Ok(())
}
