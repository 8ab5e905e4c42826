//! Search orchestration: one fetch per submit, state kept for a renderer.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::{
    error::SearchError,
    model::{UiState, WeatherResult},
    recent::RecentSearches,
    service::WeatherService,
    storage::KeyValueStorage,
};

/// Owns the search screen state and the recent-search list.
///
/// All methods take `&self`, so submits may overlap. Each submit takes a
/// sequence number; a response whose number is no longer the latest is
/// dropped without touching state or the recent list.
#[derive(Debug)]
pub struct SearchController<S> {
    service: Box<dyn WeatherService>,
    recent: Mutex<RecentSearches<S>>,
    state: watch::Sender<UiState>,
    latest: AtomicU64,
}

impl<S: KeyValueStorage> SearchController<S> {
    /// Build a controller, loading recent searches from `storage` once.
    pub fn new(service: Box<dyn WeatherService>, storage: S) -> Self {
        let (state, _) = watch::channel(UiState::default());
        Self {
            service,
            recent: Mutex::new(RecentSearches::load(storage)),
            state,
            latest: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> UiState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    pub async fn recent_searches(&self) -> Vec<String> {
        self.recent.lock().await.entries().to_vec()
    }

    pub fn set_query(&self, text: &str) {
        self.state.send_if_modified(|s| {
            if s.query == text {
                return false;
            }
            s.query = text.to_string();
            true
        });
    }

    /// Search for whatever is currently in the query text.
    pub async fn submit(&self) -> Result<WeatherResult, SearchError> {
        let query = self.state.borrow().query.clone();
        self.submit_search(&query).await
    }

    /// Re-run a recent search, putting it back in the query text first.
    pub async fn select_recent(&self, city: &str) -> Result<WeatherResult, SearchError> {
        self.set_query(city);
        self.submit_search(city).await
    }

    pub async fn submit_search(&self, city: &str) -> Result<WeatherResult, SearchError> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if city.trim().is_empty() {
            let err = SearchError::EmptyInput;
            let message = err.to_string();
            self.state.send_modify(|s| {
                s.error = Some(message);
                s.weather = None;
                s.fetched_at = None;
                s.is_loading = false;
            });
            return Err(err);
        }

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let outcome = self.service.current(city).await;

        let applied = self.state.send_if_modified(|s| {
            if self.latest.load(Ordering::SeqCst) != ticket {
                return false;
            }
            match &outcome {
                Ok(weather) => {
                    s.weather = Some(weather.clone());
                    s.fetched_at = Some(Utc::now());
                    s.error = None;
                }
                Err(err) => {
                    s.error = Some(err.to_string());
                    s.weather = None;
                    s.fetched_at = None;
                }
            }
            s.is_loading = false;
            true
        });

        if !applied {
            debug!(city, ticket, "discarding stale weather response");
            return outcome;
        }

        match &outcome {
            Ok(weather) => {
                info!(city, temperature = ?weather.temperature, "weather updated");
                if let Err(e) = self.recent.lock().await.record(city) {
                    warn!(error = %e, "failed to persist recent searches");
                }
            }
            Err(err) => {
                info!(city, error = %err, "weather search failed");
            }
        }

        outcome
    }
}
