//! Library reconciliation state

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::bridge::BridgeError;
use crate::game::{self, GameRecord};
use crate::library::{CategorizedGames, Category, Pagination, partition_managed};
use crate::poller::FetchSource;
use crate::state::StateEvent;

/// Bookkeeping for one fetch source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceStatus {
    /// Fetches that came back, successful or not
    pub completed: u64,
    /// Fetches whose payload replaced the category
    pub applied: u64,
    pub failures: u64,
    /// When the last payload was applied
    pub last_applied: Option<DateTime<Utc>>,
    /// Tick number of the last applied fetch
    pub last_tick: Option<u64>,
}

/// Reconciled library state.
///
/// Every payload fully replaces the categories of its source. Failed or
/// malformed fetches leave the previous state in place.
#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    games: CategorizedGames,
    pagination: Pagination,
    managed: SourceStatus,
    custom: SourceStatus,
}

impl LibraryState {
    pub fn new(page_size: usize) -> Self {
        Self {
            pagination: Pagination::new(page_size),
            ..Default::default()
        }
    }

    pub fn games(&self) -> &CategorizedGames {
        &self.games
    }

    pub fn status(&self, source: FetchSource) -> &SourceStatus {
        match source {
            FetchSource::Managed => &self.managed,
            FetchSource::Custom => &self.custom,
        }
    }

    /// Whether at least one fetch of `source` has come back
    pub fn has_reported(&self, source: FetchSource) -> bool {
        self.status(source).completed > 0
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn paged_category(&self) -> Category {
        self.games.paged_category()
    }

    pub fn current_page(&self) -> usize {
        self.pagination.current_page()
    }

    pub fn page_size(&self) -> usize {
        self.pagination.page_size()
    }

    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages(self.games.paged().len())
    }

    /// Records on the current page of the paged category
    pub fn displayed(&self) -> &[GameRecord] {
        self.pagination.slice(self.games.paged())
    }

    /// Jump to a page, clamped to the available range
    pub fn go_to_page(&mut self, page: usize) -> usize {
        let count = self.games.paged().len();
        let page = self.pagination.go_to(page, count);
        tracing::trace!("Library page {} of {}", page, self.total_pages());
        page
    }

    /// Apply one completed fetch
    pub fn apply(
        &mut self,
        source: FetchSource,
        tick: u64,
        result: Result<Value, BridgeError>,
    ) -> Vec<StateEvent> {
        let mut events = Vec::new();
        let status = match source {
            FetchSource::Managed => &mut self.managed,
            FetchSource::Custom => &mut self.custom,
        };
        status.completed += 1;

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                status.failures += 1;
                let msg = format!("Error fetching {}: {}", source, e);
                events.push(StateEvent::LogError(msg));
                return events;
            }
        };

        let records = match game::parse_payload(payload) {
            Ok(records) => records,
            Err(e) => {
                status.failures += 1;
                let msg = format!("Invalid {} payload: {}", source, e);
                events.push(StateEvent::LogError(msg));
                return events;
            }
        };

        status.applied += 1;
        status.last_applied = Some(Utc::now());
        status.last_tick = Some(tick);

        let changed = match source {
            FetchSource::Managed => {
                let (installed, downloading) = partition_managed(records);
                let changed =
                    installed != self.games.installed || downloading != self.games.downloading;
                self.games.installed = installed;
                self.games.downloading = downloading;
                changed
            }
            FetchSource::Custom => {
                let changed = records != self.games.custom;
                self.games.custom = records;
                changed
            }
        };

        self.pagination.clamp(self.games.paged().len());

        if changed {
            tracing::debug!(
                "Library updated from {}: {} installed, {} downloading, {} custom",
                source,
                self.games.installed.len(),
                self.games.downloading.len(),
                self.games.custom.len()
            );
            events.push(StateEvent::LibraryChanged);
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(records: &[GameRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.to_string()).collect()
    }

    fn managed_ok(state: &mut LibraryState, payload: Value) -> Vec<StateEvent> {
        state.apply(FetchSource::Managed, 1, Ok(payload))
    }

    #[test]
    fn test_reconcile_scenario() {
        let mut state = LibraryState::new(6);
        let events = managed_ok(
            &mut state,
            json!([{"id": 1}, {"id": 2, "downloadingData": {"downloading": true}}]),
        );
        assert_eq!(events, vec![StateEvent::LibraryChanged]);
        state.apply(FetchSource::Custom, 1, Ok(json!([])));

        assert_eq!(ids(&state.games().installed), vec!["1"]);
        assert_eq!(ids(&state.games().downloading), vec!["2"]);
        assert!(state.games().custom.is_empty());
        assert!(!state.is_empty());
        assert_eq!(state.total_pages(), 1);
        assert_eq!(state.paged_category(), Category::Installed);
    }

    #[test]
    fn test_malformed_payload_keeps_previous_state() {
        let mut state = LibraryState::new(6);
        managed_ok(&mut state, json!([{"id": 1}, {"id": 2}]));
        let before = state.games().clone();

        let events = managed_ok(&mut state, json!({"error": "busy"}));
        assert_eq!(state.games(), &before);
        assert!(matches!(events.as_slice(), [StateEvent::LogError(_)]));

        let status = state.status(FetchSource::Managed);
        assert_eq!(status.completed, 2);
        assert_eq!(status.applied, 1);
        assert_eq!(status.failures, 1);
    }

    #[test]
    fn test_bridge_error_keeps_previous_state() {
        let mut state = LibraryState::new(6);
        state.apply(FetchSource::Custom, 1, Ok(json!([{"id": 9}])));
        let before = state.games().clone();

        let events = state.apply(
            FetchSource::Custom,
            2,
            Err(BridgeError::Unavailable("bridge gone".to_string())),
        );
        assert_eq!(state.games(), &before);
        assert!(matches!(events.as_slice(), [StateEvent::LogError(msg)] if msg.contains("bridge gone")));
    }

    #[test]
    fn test_unchanged_payload_emits_nothing() {
        let mut state = LibraryState::new(6);
        managed_ok(&mut state, json!([{"id": 1}]));
        let events = managed_ok(&mut state, json!([{"id": 1}]));
        assert!(events.is_empty());
        assert_eq!(state.status(FetchSource::Managed).applied, 2);
    }

    #[test]
    fn test_sources_replace_only_their_categories() {
        let mut state = LibraryState::new(6);
        managed_ok(&mut state, json!([{"id": 1}]));
        state.apply(FetchSource::Custom, 1, Ok(json!([{"id": 50}, {"id": 51}])));

        managed_ok(&mut state, json!([]));
        assert!(state.games().installed.is_empty());
        assert_eq!(ids(&state.games().custom), vec!["50", "51"]);
        assert_eq!(state.paged_category(), Category::Custom);
        assert!(!state.is_empty());
    }

    #[test]
    fn test_page_clamped_when_library_shrinks() {
        let mut state = LibraryState::new(6);
        let many: Vec<_> = (0..14).map(|i| json!({"id": i})).collect();
        managed_ok(&mut state, Value::Array(many));
        assert_eq!(state.total_pages(), 3);
        assert_eq!(state.go_to_page(3), 3);
        assert_eq!(state.displayed().len(), 2);

        managed_ok(&mut state, json!([{"id": 0}, {"id": 1}]));
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.displayed().len(), 2);
    }

    #[test]
    fn test_go_to_page_beyond_range() {
        let mut state = LibraryState::new(6);
        assert_eq!(state.go_to_page(4), 1);
        assert!(state.displayed().is_empty());
        assert_eq!(state.total_pages(), 0);
    }
}
