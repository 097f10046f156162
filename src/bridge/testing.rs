//! Scripted in-memory bridge for tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use super::{Bridge, BridgeError, InstallReport, Settings};

/// One scripted reply: resolves after `delay` with `result`
#[derive(Debug, Clone)]
pub struct Reply {
    pub delay: Duration,
    pub result: Result<Value, String>,
}

impl Reply {
    pub fn ok(value: Value) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(message.to_string()),
        }
    }

    pub fn after(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }
}

#[derive(Debug)]
struct Script {
    queue: VecDeque<Reply>,
    fallback: Reply,
    calls: usize,
}

impl Script {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: Reply::ok(Value::Array(Vec::new())),
            calls: 0,
        }
    }

    fn next(&mut self) -> Reply {
        self.calls += 1;
        self.queue
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Bridge whose replies are queued up front.
///
/// Each fetch pops the next queued reply for its source, falling back to a
/// fixed reply once the queue is empty. Commands are recorded by name.
#[derive(Debug)]
pub struct ScriptedBridge {
    managed: Mutex<Script>,
    custom: Mutex<Script>,
    settings: Mutex<Result<Settings, String>>,
    first_run: Result<bool, String>,
    dev_warning_acknowledged: Result<bool, String>,
    install: Reply,
    commands: Mutex<Vec<String>>,
}

impl Default for ScriptedBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBridge {
    /// Returning user with empty library and no download directory
    pub fn new() -> Self {
        Self {
            managed: Mutex::new(Script::new()),
            custom: Mutex::new(Script::new()),
            settings: Mutex::new(Ok(Settings::default())),
            first_run: Ok(false),
            dev_warning_acknowledged: Ok(true),
            install: Reply::ok(serde_json::json!({"success": true, "message": "done"})),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn managed(self, fallback: Reply) -> Self {
        self.managed.lock().unwrap().fallback = fallback;
        self
    }

    pub fn custom(self, fallback: Reply) -> Self {
        self.custom.lock().unwrap().fallback = fallback;
        self
    }

    pub fn queue_managed(self, reply: Reply) -> Self {
        self.managed.lock().unwrap().queue.push_back(reply);
        self
    }

    pub fn queue_custom(self, reply: Reply) -> Self {
        self.custom.lock().unwrap().queue.push_back(reply);
        self
    }

    pub fn flags(mut self, dev_warning_acknowledged: bool, first_run: bool) -> Self {
        self.dev_warning_acknowledged = Ok(dev_warning_acknowledged);
        self.first_run = Ok(first_run);
        self
    }

    pub fn failing_flags(mut self) -> Self {
        self.dev_warning_acknowledged = Err("flag store offline".to_string());
        self.first_run = Err("flag store offline".to_string());
        self
    }

    pub fn download_directory(self, dir: Option<&str>) -> Self {
        self.set_download_directory(dir);
        self
    }

    pub fn background_motion(self, enabled: bool) -> Self {
        if let Ok(settings) = self.settings.lock().unwrap().as_mut() {
            settings.background_motion = enabled;
        }
        self
    }

    pub fn install_reply(mut self, reply: Reply) -> Self {
        self.install = reply;
        self
    }

    pub fn set_download_directory(&self, dir: Option<&str>) {
        *self.settings.lock().unwrap() = Ok(Settings {
            download_directory: dir.map(str::to_string),
            background_motion: false,
        });
    }

    pub fn fail_settings(&self) {
        *self.settings.lock().unwrap() = Err("settings unavailable".to_string());
    }

    pub fn managed_calls(&self) -> usize {
        self.managed.lock().unwrap().calls
    }

    pub fn custom_calls(&self) -> usize {
        self.custom.lock().unwrap().calls
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn record(&self, command: &str) {
        self.commands.lock().unwrap().push(command.to_string());
    }
}

async fn resolve(reply: Reply) -> Result<Value, BridgeError> {
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    reply.result.map_err(BridgeError::Unavailable)
}

impl Bridge for ScriptedBridge {
    async fn fetch_managed_games(&self) -> Result<Value, BridgeError> {
        let reply = self.managed.lock().unwrap().next();
        resolve(reply).await
    }

    async fn fetch_custom_games(&self) -> Result<Value, BridgeError> {
        let reply = self.custom.lock().unwrap().next();
        resolve(reply).await
    }

    async fn fetch_settings(&self) -> Result<Settings, BridgeError> {
        let settings = self.settings.lock().unwrap().clone();
        settings.map_err(BridgeError::Unavailable)
    }

    async fn is_first_run(&self) -> Result<bool, BridgeError> {
        self.first_run.clone().map_err(BridgeError::Unavailable)
    }

    async fn has_acknowledged_dev_warning(&self) -> Result<bool, BridgeError> {
        self.dev_warning_acknowledged
            .clone()
            .map_err(BridgeError::Unavailable)
    }

    async fn acknowledge_dev_warning(&self) -> Result<(), BridgeError> {
        self.record("acknowledge_dev_warning");
        Ok(())
    }

    async fn acknowledge_first_run(&self) -> Result<(), BridgeError> {
        self.record("acknowledge_first_run");
        Ok(())
    }

    async fn install_dependencies(&self) -> Result<InstallReport, BridgeError> {
        self.record("install_dependencies");
        let value = resolve(self.install.clone()).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn open_external_url(&self, url: &str) -> Result<(), BridgeError> {
        self.record(&format!("open {}", url));
        Ok(())
    }
}
