//! Headless Chrome session used to follow the service-ticket login redirect.

use std::{
    ffi::{OsStr, OsString},
    sync::Arc,
};

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use tracing::debug;

use crate::config::{BrowserConfig, SessionMode};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The page finished loading with a non-empty title.
    Loaded { title: String },
    EmptyTitle,
    Failed { reason: String },
}

impl NavigationOutcome {
    pub fn from_title(title: Result<String>) -> Self {
        match title {
            Ok(title) if title.is_empty() => NavigationOutcome::EmptyTitle,
            Ok(title) => NavigationOutcome::Loaded { title },
            Err(err) => NavigationOutcome::Failed {
                reason: format!("{err:#}"),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, NavigationOutcome::Loaded { .. })
    }
}

/// Something that can load a URL and report whether the page rendered.
pub trait Navigator {
    fn navigate(&mut self, url: &str) -> NavigationOutcome;
}

pub struct ChromeNavigator {
    browser: Browser,
    session: SessionMode,
    shared_tab: Option<Arc<Tab>>,
}

impl ChromeNavigator {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let log_file = OsString::from(format!("--log-file={}", config.log_path.display()));
        let mut builder = LaunchOptionsBuilder::default();
        builder
            .headless(config.headless)
            .sandbox(config.sandbox)
            .args(vec![
                OsStr::new("--enable-logging"),
                OsStr::new("--v=1"),
                log_file.as_os_str(),
            ]);
        let options = builder
            .build()
            .context("unable to construct headless Chrome launch options")?;

        debug!(
            headless = config.headless,
            sandbox = config.sandbox,
            log_path = %config.log_path.display(),
            session = config.session.as_str(),
            "launching Chrome"
        );
        let browser = Browser::new(options).context("failed to launch Chromium/Chrome")?;

        let shared_tab = match config.session {
            SessionMode::Shared => Some(browser.new_tab().context("failed to open browser tab")?),
            SessionMode::Fresh => None,
        };

        Ok(Self {
            browser,
            session: config.session,
            shared_tab,
        })
    }

    fn load_isolated(&self, url: &str) -> Result<String> {
        let context = self
            .browser
            .new_context()
            .context("failed to create browser context")?;
        let tab = context.new_tab().context("failed to open browser tab")?;
        let title = load(&tab, url);
        if let Err(err) = tab.close(true) {
            debug!(error = %err, "failed to close tab");
        }
        title
    }
}

impl Navigator for ChromeNavigator {
    fn navigate(&mut self, url: &str) -> NavigationOutcome {
        let title = match (self.session, &self.shared_tab) {
            (SessionMode::Shared, Some(tab)) => load(tab, url),
            _ => self.load_isolated(url),
        };
        NavigationOutcome::from_title(title)
    }
}

fn load(tab: &Tab, url: &str) -> Result<String> {
    tab.navigate_to(url)
        .with_context(|| format!("failed to navigate to {url}"))?;
    tab.wait_until_navigated()
        .with_context(|| format!("navigation did not complete for {url}"))?;
    tab.get_title().context("failed to read page title")
}
