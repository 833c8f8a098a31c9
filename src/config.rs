use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the preset directory
pub const DATA_DIR_ENV: &str = "QUIZ_AUTOFILL_DATA_DIR";

/// Environment variable overriding the pause between replayed steps, in milliseconds
pub const STEP_DELAY_ENV: &str = "QUIZ_AUTOFILL_STEP_DELAY_MS";

/// Environment variable selecting a visible browser window
pub const HEADED_ENV: &str = "QUIZ_AUTOFILL_HEADED";

/// Runtime settings shared by the binaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutofillConfig {
    /// Directory holding the preset store and exports
    pub data_dir: PathBuf,

    /// Pause after each filled field while replaying into a live page
    pub step_delay: Duration,

    pub headless: bool,
}

impl Default for AutofillConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./quiz-presets"),
            step_delay: Duration::from_millis(7),
            headless: true,
        }
    }
}

impl AutofillConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(STEP_DELAY_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.step_delay = Duration::from_millis(ms),
                Err(e) => log::warn!("Ignoring {}={}: {}", STEP_DELAY_ENV, raw, e),
            }
        }

        if let Some(raw) = lookup(HEADED_ENV) {
            let headed = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
            config.headless = !headed;
        }

        config
    }

    /// Set the data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the step delay
    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Directory for export files
    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AutofillConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./quiz-presets"));
        assert_eq!(config.step_delay, Duration::from_millis(7));
        assert!(config.headless);
    }

    #[test]
    fn test_environment_overrides() {
        let vars = HashMap::from([
            (DATA_DIR_ENV, "/tmp/presets"),
            (STEP_DELAY_ENV, "25"),
            (HEADED_ENV, "true"),
        ]);
        let config = AutofillConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/presets"));
        assert_eq!(config.step_delay, Duration::from_millis(25));
        assert!(!config.headless);
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/presets/exports"));
    }

    #[test]
    fn test_bad_delay_keeps_default() {
        let config = AutofillConfig::from_lookup(|key| (key == STEP_DELAY_ENV).then(|| "fast".to_string()));
        assert_eq!(config.step_delay, Duration::from_millis(7));
    }

    #[test]
    fn test_builder() {
        let config = AutofillConfig::new()
            .data_dir("/data")
            .step_delay(Duration::ZERO)
            .headless(false);
        assert_eq!(config.data_dir, PathBuf::from("/data"));
        assert_eq!(config.step_delay, Duration::ZERO);
        assert!(!config.headless);
    }
}
