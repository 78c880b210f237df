pub mod bench;
pub mod browser;
pub mod cas;
pub mod cli;
pub mod config;
pub mod report;

pub use bench::{Benchmark, BenchmarkSummary, IterationRecord};
pub use config::Profile;
