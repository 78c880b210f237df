use std::{fs, path::PathBuf};

use chrono::Local;

use casbench::{
    bench::{BenchmarkSummary, IterationRecord},
    config::{CredentialEncoding, Profile, ProfileLoader, SessionMode},
    report::BenchmarkReport,
};

fn profile_loader() -> ProfileLoader {
    ProfileLoader::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn bundled_profile_matches_defaults() {
    let profile = profile_loader()
        .load(PathBuf::from("profiles/apu.yaml"))
        .expect("profile parses");
    let defaults = Profile::default();
    assert_eq!(profile.name, defaults.name);
    assert_eq!(profile.cas.tickets_url, defaults.cas.tickets_url);
    assert_eq!(profile.cas.service_url, defaults.cas.service_url);
    assert_eq!(profile.app.login_url, defaults.app.login_url);
    assert_eq!(profile.browser.log_path, defaults.browser.log_path);
    assert_eq!(profile.browser.session, SessionMode::Shared);
    assert_eq!(profile.cas.credential_encoding, CredentialEncoding::Raw);
}

#[test]
fn loader_reports_missing_and_invalid_files() {
    let dir = tempfile::tempdir().unwrap();
    let loader = ProfileLoader::new(dir.path());

    let err = loader.load("missing.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read profile file"));

    fs::write(dir.path().join("broken.yaml"), "cas: [unterminated").unwrap();
    let err = loader.load("broken.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse"));

    fs::write(
        dir.path().join("invalid.yaml"),
        "app:\n  login_url: https://example.edu/login\n",
    )
    .unwrap();
    let err = loader.load("invalid.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("{ticket} placeholder"));
}

#[test]
fn loader_accepts_partial_profile() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("staging.yaml"),
        "name: staging\ncas:\n  tickets_url: https://cas-test.example.edu/cas/v1/tickets\n  credential_encoding: form\nbrowser:\n  session: fresh\n",
    )
    .unwrap();

    let profile = ProfileLoader::new(dir.path()).load("staging.yaml").unwrap();
    assert_eq!(profile.name, "staging");
    assert_eq!(profile.cas.credential_encoding, CredentialEncoding::Form);
    assert_eq!(profile.browser.session, SessionMode::Fresh);
    assert_eq!(
        profile.cas.service_url,
        "https://home.apu.edu/app/profile/logintoapp"
    );
}

fn record(iteration: u32, elapsed_secs: f64, navigated: bool) -> IterationRecord {
    IterationRecord {
        iteration,
        elapsed_secs,
        tgt_secs: elapsed_secs / 4.0,
        st_secs: elapsed_secs / 4.0,
        navigation_secs: elapsed_secs / 2.0,
        navigated,
    }
}

#[test]
fn report_is_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("run.json");
    let summary = BenchmarkSummary {
        started_at: Local::now(),
        records: vec![record(1, 1.0, true), record(2, 3.0, false)],
    };

    let written = BenchmarkReport::new(&Profile::default(), &summary)
        .write(&path)
        .unwrap();
    assert_eq!(written, path);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["profile"], "apu");
    assert_eq!(json["session"], "shared");
    assert_eq!(json["average_secs"], 2.0);
    assert_eq!(json["min_secs"], 1.0);
    assert_eq!(json["max_secs"], 3.0);
    assert_eq!(json["iterations"].as_array().unwrap().len(), 2);
    assert_eq!(json["iterations"][1]["iteration"], 2);
    assert_eq!(json["iterations"][1]["navigated"], false);
}
