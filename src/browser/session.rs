use crate::browser::config::{ConnectionOptions, LaunchOptions};
use crate::dom::{DomTree, Mutation};
use crate::error::{AutofillError, Result};
use crate::quiz::page::QuizPage;
use headless_chrome::{Browser, Tab};
use log::{debug, warn};
use serde::Deserialize;
use std::{ffi::OsStr, sync::Arc, time::Duration};

const SNAPSHOT_JS: &str = include_str!("snapshot_dom.js");
const COMMIT_JS: &str = include_str!("commit_mutations.js");

/// What the commit script reports for one batch
#[derive(Debug, Default, Deserialize)]
struct CommitReport {
    applied: usize,
    #[serde(default)]
    missing: Vec<String>,
}

/// Split a journal into batches separated by step markers
///
/// Each batch is paired with whether a step marker closed it.
fn step_batches(journal: Vec<Mutation>) -> Vec<(Vec<Mutation>, bool)> {
    let mut batches = Vec::new();
    let mut current = Vec::new();
    for mutation in journal {
        if let Mutation::Step { .. } = mutation {
            batches.push((std::mem::take(&mut current), true));
        } else {
            current.push(mutation);
        }
    }
    if !current.is_empty() {
        batches.push((current, false));
    }
    batches
}

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Quiz platforms may refuse automated browsers
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Keep the browser alive while the user works through a quiz
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }
        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }
        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| AutofillError::LaunchFailed(e.to_string()))?;

        browser
            .new_tab()
            .map_err(|e| AutofillError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect(options.ws_url).map_err(|e| AutofillError::ConnectionFailed(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    /// Get the active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| AutofillError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    fn tab_matches(tab: &Tab, expression: &str) -> bool {
        match tab.evaluate(expression, false) {
            Ok(remote_object) => remote_object.value.and_then(|v| v.as_bool()).unwrap_or(false),
            Err(e) => {
                debug!("Failed to check tab status: {}", e);
                false
            }
        }
    }

    /// Get the currently active tab by checking the document visibility and focus state
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        let focused = tabs
            .iter()
            .find(|tab| Self::tab_matches(tab, "document.visibilityState === 'visible' && document.hasFocus()"));
        let visible = || {
            tabs.iter()
                .find(|tab| Self::tab_matches(tab, "document.visibilityState === 'visible'"))
        };

        focused
            .or_else(visible)
            .or_else(|| tabs.last())
            .cloned()
            .ok_or_else(|| AutofillError::TabOperationFailed("No active tab found".to_string()))
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate to a URL using the active tab
    pub fn navigate(&self, url: &str) -> Result<()> {
        self.tab()?
            .navigate_to(url)
            .map_err(|e| AutofillError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        Ok(())
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab()?
            .wait_until_navigated()
            .map_err(|e| AutofillError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Evaluate a script that returns a JSON string
    fn evaluate_json(&self, tab: &Tab, script: &str) -> Result<String> {
        let result = tab
            .evaluate(script, false)
            .map_err(|e| AutofillError::EvaluationFailed(e.to_string()))?;

        let value = result
            .value
            .ok_or_else(|| AutofillError::EvaluationFailed("Script returned no value".to_string()))?;

        serde_json::from_value(value)
            .map_err(|e| AutofillError::EvaluationFailed(format!("Script did not return a JSON string: {}", e)))
    }

    /// Snapshot the active tab's DOM
    pub fn snapshot_dom(&self) -> Result<DomTree> {
        let tab = self.tab()?;
        let json = self
            .evaluate_json(&tab, SNAPSHOT_JS)
            .map_err(|e| AutofillError::DomParseFailed(format!("Failed to execute DOM snapshot script: {}", e)))?;

        let tree = DomTree::from_json(&json)?;
        debug!("Snapshot holds {} elements", tree.count_elements());
        Ok(tree)
    }

    /// Replay a tree's journal in the active tab, pausing at each step marker
    pub fn commit_journal(&self, tree: &mut DomTree, step_delay: Duration) -> Result<usize> {
        let journal = tree.take_journal();
        if journal.is_empty() {
            return Ok(0);
        }
        let tab = self.tab()?;

        let mut applied = 0;
        for (batch, paced) in step_batches(journal) {
            if !batch.is_empty() {
                let payload = serde_json::to_string(&batch)?;
                let script = format!("({})({})", COMMIT_JS.trim(), payload);
                let json = self.evaluate_json(&tab, &script)?;
                let report: CommitReport = serde_json::from_str(&json)?;

                if !report.missing.is_empty() {
                    warn!("{} page nodes vanished before replay: {:?}", report.missing.len(), report.missing);
                }
                applied += report.applied;
            }
            if paced && !step_delay.is_zero() {
                std::thread::sleep(step_delay);
            }
        }

        debug!("Replayed {} mutations into the page", applied);
        Ok(applied)
    }

    /// Close all tabs
    pub fn close(&self) -> Result<()> {
        // The browser process ends when the Browser is dropped
        let tabs = self.get_tabs()?;
        for tab in tabs {
            let _ = tab.close(false);
        }
        Ok(())
    }
}

impl QuizPage for BrowserSession {
    fn url(&self) -> Result<String> {
        Ok(self.tab()?.get_url())
    }

    fn snapshot(&self) -> Result<DomTree> {
        self.snapshot_dom()
    }

    fn commit(&self, tree: &mut DomTree, step_delay: Duration) -> Result<usize> {
        self.commit_journal(tree, step_delay)
    }

    fn navigate(&self, url: &str) -> Result<()> {
        BrowserSession::navigate(self, url)?;
        self.wait_for_navigation()
    }
}
