//! Bridge to the host process that owns game data.
//!
//! The host process is the source of truth for game records, user settings
//! and the one-shot onboarding flags. The view state reaches it only through
//! the [`Bridge`] trait, so it can be driven by the real process, by the
//! JSON data directory in [`JsonDirBridge`], or by a scripted stand-in in tests.

mod fs;
#[cfg(test)]
pub mod testing;

pub use fs::JsonDirBridge;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors reported across the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Installer failed: {0}")]
    Installer(String),

    #[error("Task failed: {0}")]
    Task(String),
}

/// User settings held by the host process.
///
/// Only the keys the library view reads are modelled; anything else in the
/// settings document is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Directory games are downloaded into
    #[serde(default)]
    pub download_directory: Option<String>,
    /// Whether the animated background is enabled
    #[serde(default)]
    pub background_motion: bool,
}

impl Settings {
    /// A blank directory string counts as unset.
    pub fn directory_configured(&self) -> bool {
        self.download_directory
            .as_deref()
            .is_some_and(|dir| !dir.trim().is_empty())
    }
}

/// Result of a dependency installation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl InstallReport {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Query/command capability of the host process.
///
/// Game fetches return the raw JSON payload. Shape validation is the
/// reconciler's job, since a malformed payload must not clear the view.
pub trait Bridge: Send + Sync + 'static {
    /// Full list of games tracked by the host downloader
    fn fetch_managed_games(&self) -> impl Future<Output = Result<Value, BridgeError>> + Send;

    /// Full list of user-imported games
    fn fetch_custom_games(&self) -> impl Future<Output = Result<Value, BridgeError>> + Send;

    fn fetch_settings(&self) -> impl Future<Output = Result<Settings, BridgeError>> + Send;

    /// Whether this is the first launch on this machine
    fn is_first_run(&self) -> impl Future<Output = Result<bool, BridgeError>> + Send;

    fn has_acknowledged_dev_warning(
        &self,
    ) -> impl Future<Output = Result<bool, BridgeError>> + Send;

    fn acknowledge_dev_warning(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Clear the first-run flag once onboarding has been walked through
    fn acknowledge_first_run(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Install the shared runtime dependencies games need.
    ///
    /// A single best-effort attempt. Installer failures may come back either
    /// as `Err` or as a report with `success == false`.
    fn install_dependencies(
        &self,
    ) -> impl Future<Output = Result<InstallReport, BridgeError>> + Send;

    fn open_external_url(&self, url: &str) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_directory_configured() {
        let mut settings = Settings::default();
        assert!(!settings.directory_configured());

        settings.download_directory = Some("   ".to_string());
        assert!(!settings.directory_configured());

        settings.download_directory = Some("/games".to_string());
        assert!(settings.directory_configured());
    }

    #[test]
    fn test_settings_ignores_unknown_keys() {
        let settings: Settings = serde_json::from_str(
            r#"{"downloadDirectory": "D:/Games", "backgroundMotion": true, "theme": "purple"}"#,
        )
        .unwrap();

        assert_eq!(settings.download_directory.as_deref(), Some("D:/Games"));
        assert!(settings.background_motion);
    }

    #[test]
    fn test_settings_null_directory() {
        let settings: Settings =
            serde_json::from_str(r#"{"downloadDirectory": null}"#).unwrap();
        assert!(!settings.directory_configured());
        assert!(!settings.background_motion);
    }
}
