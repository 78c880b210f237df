use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::{
    cas::Credentials,
    config::{CredentialEncoding, Profile, ProfileLoader, SessionMode},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Benchmark the CAS single-sign-on login flow")]
pub struct Cli {
    /// A username used to sign in with CAS
    #[arg(short, long)]
    pub username: String,

    /// A password used to sign in with CAS
    #[arg(short, long)]
    pub password: String,

    /// Number of times the login flow is run
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub iterations: u32,

    /// YAML profile overriding the built-in endpoints and browser settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Share one browser session across iterations or isolate each one
    #[arg(long, value_enum)]
    pub session: Option<SessionMode>,

    /// Form-encode the credentials instead of sending them verbatim
    #[arg(long)]
    pub encode_credentials: bool,

    /// File receiving Chrome's own log output
    #[arg(long)]
    pub browser_log: Option<PathBuf>,

    /// Write a JSON report of every iteration to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Built-in defaults, then the profile file, then command-line flags.
    pub fn resolve_profile(&self) -> Result<Profile> {
        let mut profile = match &self.config {
            Some(path) => ProfileLoader::new(".").load(path)?,
            None => Profile::default(),
        };
        if let Some(session) = self.session {
            profile.browser.session = session;
        }
        if self.encode_credentials {
            profile.cas.credential_encoding = CredentialEncoding::Form;
        }
        if let Some(path) = &self.browser_log {
            profile.browser.log_path = path.clone();
        }
        Ok(profile)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterations_default_to_one() {
        let cli = Cli::try_parse_from(["casbench", "-u", "jdoe", "-p", "secret"]).unwrap();
        assert_eq!(cli.iterations, 1);
        assert_eq!(cli.username, "jdoe");
        assert_eq!(cli.password, "secret");
    }

    #[test]
    fn long_flags_are_accepted() {
        let cli = Cli::try_parse_from([
            "casbench",
            "--username",
            "jdoe",
            "--password",
            "secret",
            "--iterations",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.iterations, 5);
    }

    #[test]
    fn missing_credentials_are_rejected() {
        assert!(Cli::try_parse_from(["casbench", "-u", "jdoe"]).is_err());
        assert!(Cli::try_parse_from(["casbench", "-p", "secret"]).is_err());
    }

    #[test]
    fn invalid_iteration_counts_are_rejected() {
        for bad in ["0", "-3", "two", "1.5"] {
            let result = Cli::try_parse_from(["casbench", "-u", "a", "-p", "b", "-i", bad]);
            assert!(result.is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn flags_override_profile() {
        let cli = Cli::try_parse_from([
            "casbench",
            "-u",
            "a",
            "-p",
            "b",
            "--session",
            "fresh",
            "--encode-credentials",
            "--browser-log",
            "logs/chrome.log",
        ])
        .unwrap();
        let profile = cli.resolve_profile().unwrap();
        assert_eq!(profile.browser.session, SessionMode::Fresh);
        assert_eq!(profile.cas.credential_encoding, CredentialEncoding::Form);
        assert_eq!(profile.browser.log_path, PathBuf::from("logs/chrome.log"));
    }

    #[test]
    fn defaults_without_profile() {
        let cli = Cli::try_parse_from(["casbench", "-u", "a", "-p", "b"]).unwrap();
        let profile = cli.resolve_profile().unwrap();
        assert_eq!(profile.browser.session, SessionMode::Shared);
        assert_eq!(profile.cas.credential_encoding, CredentialEncoding::Raw);
    }
}
