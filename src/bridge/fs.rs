//! Bridge backed by JSON files in a data directory.
//!
//! Layout:
//! - `games.json` - games tracked by the downloader
//! - `custom_games.json` - user-imported games
//! - `settings.json` - user settings
//! - `launcher_state.json` - one-shot onboarding flags
//!
//! Missing files read as an empty list or defaults, which is what a fresh
//! install looks like.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{Bridge, BridgeError, InstallReport, Settings};

const MANAGED_GAMES_FILE: &str = "games.json";
const CUSTOM_GAMES_FILE: &str = "custom_games.json";
const SETTINGS_FILE: &str = "settings.json";
const STATE_FILE: &str = "launcher_state.json";

/// One-shot flags persisted between launches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LauncherState {
    #[serde(default = "default_true")]
    is_new: bool,
    #[serde(default)]
    dev_warning_acknowledged: bool,
}

impl Default for LauncherState {
    fn default() -> Self {
        Self {
            is_new: true,
            dev_warning_acknowledged: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Bridge reading the host process's data directory
#[derive(Debug, Clone)]
pub struct JsonDirBridge {
    root: PathBuf,
    /// Program and arguments used to install dependencies
    installer: Vec<String>,
    /// Held across read-modify-write of the launcher state file
    state_lock: Arc<Mutex<()>>,
}

impl JsonDirBridge {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            installer: Vec::new(),
            state_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Set the command run by [`Bridge::install_dependencies`]
    pub fn with_installer(mut self, command: Vec<String>) -> Self {
        self.installer = command;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read_value(&self, file: &str, missing: Value) -> Result<Value, BridgeError> {
        let path = self.root.join(file);
        if !tokio::fs::try_exists(&path).await? {
            tracing::trace!("{} missing, using default", path.display());
            return Ok(missing);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn read_state(&self) -> Result<LauncherState, BridgeError> {
        let value = self.read_value(STATE_FILE, Value::Null).await?;
        if value.is_null() {
            return Ok(LauncherState::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn write_state(&self, state: &LauncherState) -> Result<(), BridgeError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let content = serde_json::to_string_pretty(state)?;
        tokio::fs::write(self.root.join(STATE_FILE), content).await?;
        Ok(())
    }

    /// Apply `change` to the launcher state, writing only if it changed it
    async fn update_state(
        &self,
        change: impl FnOnce(&mut LauncherState) -> bool,
    ) -> Result<(), BridgeError> {
        let _guard = self.state_lock.lock().await;
        let mut state = self.read_state().await?;
        if !change(&mut state) {
            return Ok(());
        }
        self.write_state(&state).await
    }
}

impl Bridge for JsonDirBridge {
    async fn fetch_managed_games(&self) -> Result<Value, BridgeError> {
        self.read_value(MANAGED_GAMES_FILE, Value::Array(Vec::new()))
            .await
    }

    async fn fetch_custom_games(&self) -> Result<Value, BridgeError> {
        self.read_value(CUSTOM_GAMES_FILE, Value::Array(Vec::new()))
            .await
    }

    async fn fetch_settings(&self) -> Result<Settings, BridgeError> {
        let value = self.read_value(SETTINGS_FILE, Value::Null).await?;
        if value.is_null() {
            return Ok(Settings::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn is_first_run(&self) -> Result<bool, BridgeError> {
        Ok(self.read_state().await?.is_new)
    }

    async fn has_acknowledged_dev_warning(&self) -> Result<bool, BridgeError> {
        Ok(self.read_state().await?.dev_warning_acknowledged)
    }

    async fn acknowledge_dev_warning(&self) -> Result<(), BridgeError> {
        self.update_state(|state| {
            !std::mem::replace(&mut state.dev_warning_acknowledged, true)
        })
        .await
    }

    async fn acknowledge_first_run(&self) -> Result<(), BridgeError> {
        self.update_state(|state| std::mem::replace(&mut state.is_new, false))
            .await
    }

    async fn install_dependencies(&self) -> Result<InstallReport, BridgeError> {
        let Some((program, args)) = self.installer.split_first() else {
            return Ok(InstallReport::failed("No dependency installer configured"));
        };

        tracing::info!("Running dependency installer: {}", program);
        let status = tokio::process::Command::new(program)
            .args(args)
            .status()
            .await
            .map_err(|e| BridgeError::Installer(format!("{}: {}", program, e)))?;

        if status.success() {
            Ok(InstallReport {
                success: true,
                message: "All dependencies installed".to_string(),
            })
        } else {
            Ok(InstallReport::failed(format!("Installer exited with {}", status)))
        }
    }

    async fn open_external_url(&self, url: &str) -> Result<(), BridgeError> {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || open::that(url))
            .await
            .map_err(|e| BridgeError::Task(e.to_string()))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_files_read_as_fresh_install() {
        let dir = TempDir::new().unwrap();
        let bridge = JsonDirBridge::new(dir.path());

        assert_eq!(bridge.fetch_managed_games().await.unwrap(), serde_json::json!([]));
        assert_eq!(bridge.fetch_custom_games().await.unwrap(), serde_json::json!([]));
        assert_eq!(bridge.fetch_settings().await.unwrap(), Settings::default());
        assert!(bridge.is_first_run().await.unwrap());
        assert!(!bridge.has_acknowledged_dev_warning().await.unwrap());
    }

    #[tokio::test]
    async fn test_games_payload_is_returned_unvalidated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANAGED_GAMES_FILE), r#"{"not": "a list"}"#).unwrap();
        let bridge = JsonDirBridge::new(dir.path());

        let value = bridge.fetch_managed_games().await.unwrap();
        assert!(value.is_object());
    }

    #[tokio::test]
    async fn test_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CUSTOM_GAMES_FILE), "[{").unwrap();
        let bridge = JsonDirBridge::new(dir.path());

        let result = bridge.fetch_custom_games().await;
        assert!(matches!(result, Err(BridgeError::Json(_))));
    }

    #[tokio::test]
    async fn test_acknowledgements_persist() {
        let dir = TempDir::new().unwrap();
        let bridge = JsonDirBridge::new(dir.path());

        bridge.acknowledge_dev_warning().await.unwrap();
        bridge.acknowledge_first_run().await.unwrap();

        let reopened = JsonDirBridge::new(dir.path());
        assert!(reopened.has_acknowledged_dev_warning().await.unwrap());
        assert!(!reopened.is_first_run().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_acknowledgements_both_persist() {
        for _ in 0..25 {
            let dir = TempDir::new().unwrap();
            let bridge = Arc::new(JsonDirBridge::new(dir.path()));

            let dev = tokio::spawn({
                let bridge = Arc::clone(&bridge);
                async move { bridge.acknowledge_dev_warning().await }
            });
            let first_run = tokio::spawn({
                let bridge = Arc::clone(&bridge);
                async move { bridge.acknowledge_first_run().await }
            });
            dev.await.unwrap().unwrap();
            first_run.await.unwrap().unwrap();

            let reopened = JsonDirBridge::new(dir.path());
            assert!(reopened.has_acknowledged_dev_warning().await.unwrap());
            assert!(!reopened.is_first_run().await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_settings_from_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"downloadDirectory": "/mnt/games", "backgroundMotion": true}"#,
        )
        .unwrap();
        let bridge = JsonDirBridge::new(dir.path());

        let settings = bridge.fetch_settings().await.unwrap();
        assert!(settings.directory_configured());
        assert!(settings.background_motion);
    }

    #[tokio::test]
    async fn test_install_without_installer_reports_failure() {
        let dir = TempDir::new().unwrap();
        let bridge = JsonDirBridge::new(dir.path());

        let report = bridge.install_dependencies().await.unwrap();
        assert!(!report.success);
        assert!(report.message.contains("No dependency installer"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_reports_exit_status() {
        let dir = TempDir::new().unwrap();

        let ok = JsonDirBridge::new(dir.path()).with_installer(vec!["true".to_string()]);
        assert!(ok.install_dependencies().await.unwrap().success);

        let failing = JsonDirBridge::new(dir.path()).with_installer(vec!["false".to_string()]);
        assert!(!failing.install_dependencies().await.unwrap().success);
    }
}
