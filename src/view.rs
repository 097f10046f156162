//! Library view model.
//!
//! [`LibraryView`] owns the reconciled library, the onboarding sequence, the
//! add-game gate and the poll timers feeding them. The render layer calls
//! [`LibraryView::poll`] once per frame to apply whatever fetches completed
//! since the last frame, then reads state or takes a [`ViewModel`] snapshot.
//!
//! All mutation happens on the owner's task. Fetch results only reach the
//! state through the inbox drained by `poll`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::{JoinError, JoinHandle};

use crate::bridge::{Bridge, BridgeError, InstallReport, Settings};
use crate::config::Config;
use crate::game::GameRecord;
use crate::library::{CategorizedGames, Category, DEFAULT_PAGE_SIZE};
use crate::poller::{DEFAULT_POLL_INTERVAL, FetchOutcome, PollTimers};
use crate::state::{
    AddGameGate, Effect, GateFlags, LibraryState, Onboarding, OnboardingEvent, OnboardingState,
    StateEvent,
};
use crate::task::{PollResult, join_task, poll_task};

/// Construction options for [`LibraryView`]
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub poll_interval: Duration,
    /// Fixed for the lifetime of the view
    pub page_size: usize,
    pub extension_url: String,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ViewOptions {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.library.poll_interval_ms),
            page_size: config.library.page_size,
            extension_url: config.onboarding.extension_url.clone(),
        }
    }
}

type InstallTask = JoinHandle<Result<InstallReport, BridgeError>>;

/// View state for the library screen and the onboarding modals
pub struct LibraryView<B: Bridge> {
    bridge: Arc<B>,
    options: ViewOptions,
    library: LibraryState,
    /// Resolved on first activation, kept for the rest of the session
    onboarding: Option<Onboarding>,
    gate: AddGameGate,
    background_motion: bool,
    /// Bumped on every activate/deactivate so stale results can be told apart
    generation: u64,
    inbox: Option<UnboundedReceiver<FetchOutcome>>,
    timers: Option<PollTimers>,
    install_task: Option<InstallTask>,
    /// Fire-and-forget host commands, kept so callers can wait on them
    effect_tasks: Vec<JoinHandle<()>>,
}

impl<B: Bridge> LibraryView<B> {
    pub fn new(bridge: Arc<B>, options: ViewOptions) -> Self {
        let page_size = if options.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            options.page_size
        };
        let poll_interval = if options.poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            options.poll_interval
        };

        Self {
            bridge,
            library: LibraryState::new(page_size),
            options: ViewOptions {
                poll_interval,
                page_size,
                ..options
            },
            onboarding: None,
            gate: AddGameGate::default(),
            background_motion: false,
            generation: 0,
            inbox: None,
            timers: None,
            install_task: None,
            effect_tasks: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.timers.is_some()
    }

    /// Read the host flags, resolve onboarding and start polling.
    ///
    /// Onboarding is resolved only on the first activation; later
    /// activations keep the sequence where it is.
    pub async fn activate(&mut self) -> Vec<StateEvent> {
        let mut events = Vec::new();
        if self.is_active() {
            tracing::warn!("Library view is already active");
            return events;
        }

        let settings = match self.bridge.fetch_settings().await {
            Ok(settings) => Some(settings),
            Err(e) => {
                let msg = format!("Error fetching settings: {}", e);
                events.push(StateEvent::LogError(msg));
                None
            }
        };
        if let Some(settings) = &settings {
            self.background_motion = settings.background_motion;
        }

        if self.onboarding.is_none() {
            let flags = self.read_flags(settings.as_ref(), &mut events).await;
            let onboarding = Onboarding::resolve(flags);
            if onboarding.state().is_modal() {
                events.push(StateEvent::OnboardingChanged {
                    from: OnboardingState::Idle,
                    to: onboarding.state(),
                });
            }
            self.onboarding = Some(onboarding);
        }

        self.generation += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.inbox = Some(rx);
        self.timers = Some(PollTimers::start(
            Arc::clone(&self.bridge),
            self.options.poll_interval,
            self.generation,
            tx,
        ));

        tracing::info!("Library view activated");
        events
    }

    /// Stop polling. Fetches still in flight are discarded when they land.
    pub fn deactivate(&mut self) {
        if let Some(mut timers) = self.timers.take() {
            timers.cancel();
        }
        if self.inbox.take().is_some() {
            tracing::info!("Library view deactivated");
        }
        self.generation += 1;
    }

    /// Unreadable flags fall back to showing the warning and skipping the
    /// first-run screens.
    async fn read_flags(
        &self,
        settings: Option<&Settings>,
        events: &mut Vec<StateEvent>,
    ) -> GateFlags {
        let (first_run, acknowledged) = tokio::join!(
            self.bridge.is_first_run(),
            self.bridge.has_acknowledged_dev_warning()
        );

        let is_new = first_run.unwrap_or_else(|e| {
            let msg = format!("Error checking first run: {}", e);
            events.push(StateEvent::LogError(msg));
            false
        });
        let dev_warning_acknowledged = acknowledged.unwrap_or_else(|e| {
            let msg = format!("Error checking development warning: {}", e);
            events.push(StateEvent::LogError(msg));
            false
        });

        GateFlags {
            directory_configured: settings.is_some_and(Settings::directory_configured),
            is_new,
            dev_warning_acknowledged,
        }
    }

    /// Apply every completed fetch and settle a finished install.
    pub fn poll(&mut self) -> Vec<StateEvent> {
        let mut events = Vec::new();

        while let Some(outcome) = self.inbox.as_mut().and_then(|inbox| inbox.try_recv().ok()) {
            events.extend(self.apply_outcome(outcome));
        }

        match poll_task(&mut self.install_task) {
            PollResult::Complete(result) => events.extend(self.settle_install_result(result)),
            PollResult::Pending | PollResult::NoTask => {}
        }

        events
    }

    /// Wait for the next fetch to land, then poll.
    ///
    /// Returns `None` while the view is inactive.
    pub async fn next_update(&mut self) -> Option<Vec<StateEvent>> {
        let outcome = self.inbox.as_mut()?.recv().await?;
        let mut events = self.apply_outcome(outcome);
        events.extend(self.poll());
        Some(events)
    }

    /// Wait for a running dependency install to finish and settle it.
    pub async fn settle_install(&mut self) -> Vec<StateEvent> {
        match join_task(&mut self.install_task).await {
            Some(result) => self.settle_install_result(result),
            None => Vec::new(),
        }
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) -> Vec<StateEvent> {
        if outcome.generation != self.generation {
            tracing::debug!(
                "Discarding {} response from generation {}",
                outcome.source,
                outcome.generation
            );
            return Vec::new();
        }
        self.library
            .apply(outcome.source, outcome.tick, outcome.result)
    }

    fn settle_install_result(
        &mut self,
        result: Result<Result<InstallReport, BridgeError>, JoinError>,
    ) -> Vec<StateEvent> {
        let mut events = Vec::new();
        match result {
            Ok(Ok(report)) if report.success => {
                tracing::info!("All installations complete");
                events.push(StateEvent::LogInfo(format!(
                    "Dependencies installed: {}",
                    report.message
                )));
            }
            Ok(Ok(report)) => {
                let msg = format!("Dependency installation failed: {}", report.message);
                events.push(StateEvent::LogError(msg));
            }
            Ok(Err(e)) => {
                let msg = format!("Error installing dependencies: {}", e);
                events.push(StateEvent::LogError(msg));
            }
            Err(e) => {
                let msg = format!("Dependency install task panicked: {}", e);
                events.push(StateEvent::LogError(msg));
            }
        }
        events.extend(self.handle(OnboardingEvent::InstallationSettled));
        events
    }

    // Onboarding

    /// Feed a user event to the onboarding sequence
    pub fn handle(&mut self, event: OnboardingEvent) -> Vec<StateEvent> {
        let Some(onboarding) = self.onboarding.as_mut() else {
            tracing::debug!("Ignoring {:?} before activation", event);
            return Vec::new();
        };
        let Some(transition) = onboarding.handle(event) else {
            return Vec::new();
        };

        for effect in &transition.effects {
            self.run_effect(*effect);
        }

        vec![StateEvent::OnboardingChanged {
            from: transition.from,
            to: transition.to,
        }]
    }

    pub fn acknowledge_dev_warning(&mut self) -> Vec<StateEvent> {
        self.handle(OnboardingEvent::Acknowledge)
    }

    pub fn welcome_next(&mut self) -> Vec<StateEvent> {
        self.handle(OnboardingEvent::Next)
    }

    pub fn skip_extension(&mut self) -> Vec<StateEvent> {
        self.handle(OnboardingEvent::SkipExtension)
    }

    pub fn accept_extension(&mut self) -> Vec<StateEvent> {
        self.handle(OnboardingEvent::AcceptExtension)
    }

    pub fn start_exploring(&mut self) -> Vec<StateEvent> {
        self.handle(OnboardingEvent::StartExploring)
    }

    pub fn install_dependencies(&mut self) -> Vec<StateEvent> {
        self.handle(OnboardingEvent::InstallDependencies)
    }

    fn run_effect(&mut self, effect: Effect) {
        let bridge = Arc::clone(&self.bridge);
        match effect {
            Effect::AcknowledgeDevWarning => {
                self.spawn_effect(async move {
                    if let Err(e) = bridge.acknowledge_dev_warning().await {
                        tracing::warn!("Failed to acknowledge development warning: {}", e);
                    }
                });
            }
            Effect::AcknowledgeFirstRun => {
                self.spawn_effect(async move {
                    if let Err(e) = bridge.acknowledge_first_run().await {
                        tracing::warn!("Failed to clear first-run flag: {}", e);
                    }
                });
            }
            Effect::OpenExtensionPage => {
                let url = self.options.extension_url.clone();
                self.spawn_effect(async move {
                    if let Err(e) = bridge.open_external_url(&url).await {
                        tracing::warn!("Failed to open {}: {}", url, e);
                    }
                });
            }
            Effect::InstallDependencies => {
                if self.install_task.is_some() {
                    tracing::warn!("Dependency install already running");
                    return;
                }
                tracing::info!("Installing dependencies");
                self.install_task = Some(tokio::spawn(async move {
                    bridge.install_dependencies().await
                }));
            }
        }
    }

    fn spawn_effect<F>(&mut self, effect: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.effect_tasks.retain(|task| !task.is_finished());
        self.effect_tasks.push(tokio::spawn(effect));
    }

    /// Wait for acknowledgements and other host commands sent so far.
    ///
    /// The UI never needs this; short-lived callers do before exiting.
    pub async fn flush_effects(&mut self) {
        for task in self.effect_tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!("Host command task failed: {}", e);
            }
        }
    }

    pub fn onboarding_state(&self) -> OnboardingState {
        self.onboarding
            .as_ref()
            .map_or(OnboardingState::Idle, Onboarding::state)
    }

    /// Flags read at first activation
    pub fn flags(&self) -> Option<GateFlags> {
        self.onboarding.as_ref().map(Onboarding::flags)
    }

    // Add-game gate

    /// Open or close the add-game dialog, or show the directory modal.
    ///
    /// Settings are read fresh since the directory can change at any time.
    pub async fn request_add_game(&mut self) -> Vec<StateEvent> {
        let mut events = Vec::new();
        let configured = match self.bridge.fetch_settings().await {
            Ok(settings) => settings.directory_configured(),
            Err(e) => {
                let msg = format!("Error reading download directory: {}", e);
                events.push(StateEvent::LogError(msg));
                false
            }
        };

        events.push(StateEvent::AddGame(self.gate.request(configured)));
        events
    }

    pub fn dismiss_directory_modal(&mut self) -> bool {
        self.gate.dismiss_directory_modal()
    }

    pub fn close_add_game_dialog(&mut self) {
        self.gate.close_dialog();
    }

    pub fn add_game_dialog_open(&self) -> bool {
        self.gate.dialog_open()
    }

    pub fn directory_missing_modal_open(&self) -> bool {
        self.gate.directory_modal_open()
    }

    // Library

    pub fn library(&self) -> &LibraryState {
        &self.library
    }

    pub fn games(&self) -> &CategorizedGames {
        self.library.games()
    }

    pub fn is_empty(&self) -> bool {
        self.library.is_empty()
    }

    pub fn current_page(&self) -> usize {
        self.library.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.library.total_pages()
    }

    pub fn displayed(&self) -> &[GameRecord] {
        self.library.displayed()
    }

    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.library.go_to_page(page)
    }

    pub fn background_motion(&self) -> bool {
        self.background_motion
    }

    /// Everything the render layer needs for one frame
    pub fn snapshot(&self) -> ViewModel {
        let games = self.games();
        ViewModel {
            installed: games.installed.clone(),
            downloading: games.downloading.clone(),
            custom: games.custom.clone(),
            paged_category: self.library.paged_category(),
            displayed: self.displayed().to_vec(),
            current_page: self.current_page(),
            total_pages: self.total_pages(),
            page_size: self.library.page_size(),
            is_empty: self.is_empty(),
            onboarding: self.onboarding_state(),
            add_game_dialog_open: self.add_game_dialog_open(),
            directory_missing_modal_open: self.directory_missing_modal_open(),
            background_motion: self.background_motion,
        }
    }
}

/// Snapshot of the view for rendering
#[derive(Debug, Clone, Serialize)]
pub struct ViewModel {
    pub installed: Vec<GameRecord>,
    pub downloading: Vec<GameRecord>,
    pub custom: Vec<GameRecord>,
    pub paged_category: Category,
    pub displayed: Vec<GameRecord>,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub is_empty: bool,
    pub onboarding: OnboardingState,
    pub add_game_dialog_open: bool,
    pub directory_missing_modal_open: bool,
    pub background_motion: bool,
}

impl fmt::Display for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty {
            writeln!(f, "Your library is empty. Add a game to get started.")?;
        } else if !self.displayed.is_empty() {
            writeln!(
                f,
                "{} games (page {} of {})",
                self.paged_category, self.current_page, self.total_pages
            )?;
            for game in &self.displayed {
                writeln!(f, "  {:<8} {}", game.id, game.display_name())?;
            }
        }

        if !self.downloading.is_empty() {
            writeln!(f, "Downloads ({})", self.downloading.len())?;
            for game in &self.downloading {
                match game.progress_percent() {
                    Some(percent) => {
                        writeln!(f, "  {:<8} {} ({:.1}%)", game.id, game.display_name(), percent)?
                    }
                    None => writeln!(f, "  {:<8} {}", game.id, game.display_name())?,
                }
            }
        }

        if self.onboarding.is_modal() {
            writeln!(f, "Onboarding: {}", self.onboarding.title())?;
        }
        if self.add_game_dialog_open {
            writeln!(f, "Add game dialog: open")?;
        }
        if self.directory_missing_modal_open {
            writeln!(f, "Download directory required")?;
        }
        Ok(())
    }
}
