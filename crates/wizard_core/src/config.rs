use std::{collections::BTreeMap, time::Duration};

use serde::Deserialize;
use shared::domain::{PaymentMethod, SubmissionMode};
use thiserror::Error;

pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[cfg(feature = "native")]
    #[error("failed to load wizard settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("failed to parse wizard settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid wizard settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WizardSettings {
    pub endpoint: String,
    pub mode: SubmissionMode,
    /// Largest accepted upload in bytes; 0 turns the check off.
    pub max_file_bytes: u64,
    pub success_fade_ms: u64,
    pub generic_error_message: String,
    pub network_error_message: String,
    pub request_timeout_secs: u64,
    pub payment_sections: BTreeMap<String, String>,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            endpoint: "/api/submit-contact".into(),
            mode: SubmissionMode::Asynchronous,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            success_fade_ms: 300,
            generic_error_message: GENERIC_ERROR_MESSAGE.into(),
            network_error_message: NETWORK_ERROR_MESSAGE.into(),
            request_timeout_secs: 30,
            payment_sections: PaymentMethod::ALL
                .into_iter()
                .map(|method| (method.as_str().to_string(), method.section_id().to_string()))
                .collect(),
        }
    }
}

impl WizardSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self, SettingsError> {
        let settings: WizardSettings = toml::from_str(raw)?;
        settings.validated()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_mode(mut self, mode: SubmissionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    pub fn file_limit(&self) -> Option<u64> {
        (self.max_file_bytes > 0).then_some(self.max_file_bytes)
    }

    pub fn success_fade(&self) -> Option<Duration> {
        (self.success_fade_ms > 0).then(|| Duration::from_millis(self.success_fade_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validated(self) -> Result<Self, SettingsError> {
        if self.endpoint.trim().is_empty() {
            return Err(SettingsError::Invalid("endpoint must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(self)
    }
}

/// Reads `wizard.toml` from the working directory (if present) and applies
/// `WIZARD__*` environment overrides.
#[cfg(feature = "native")]
pub fn load_settings() -> Result<WizardSettings, SettingsError> {
    load_settings_from(std::path::Path::new("wizard.toml"))
}

#[cfg(feature = "native")]
pub fn load_settings_from(path: &std::path::Path) -> Result<WizardSettings, SettingsError> {
    let settings: WizardSettings = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("WIZARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;
    settings.validated()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
