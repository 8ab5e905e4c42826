use anyhow::{Context, Result};
use tracing::warn;

use crate::storage::KeyValueStorage;

/// Storage key the list is persisted under.
pub const STORAGE_KEY: &str = "recentSearches";

/// Maximum number of cities remembered.
pub const MAX_RECENT: usize = 5;

/// Most-recent-first list of successfully searched cities, mirrored to
/// storage on every change.
#[derive(Debug)]
pub struct RecentSearches<S> {
    storage: S,
    entries: Vec<String>,
}

impl<S: KeyValueStorage> RecentSearches<S> {
    /// Rehydrate from storage. A missing or unreadable value starts empty.
    pub fn load(storage: S) -> Self {
        let entries = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => parse_entries(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read recent searches, starting empty");
                Vec::new()
            }
        };

        Self { storage, entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Move `city` to the front (adding it if new), drop anything past
    /// [`MAX_RECENT`] and persist.
    pub fn record(&mut self, city: &str) -> Result<()> {
        let mut updated = Vec::with_capacity(MAX_RECENT);
        updated.push(city.to_string());
        updated.extend(self.entries.iter().filter(|c| *c != city).cloned());
        updated.truncate(MAX_RECENT);

        self.entries = updated;

        let json =
            serde_json::to_string(&self.entries).context("Failed to serialize recent searches")?;
        self.storage.set(STORAGE_KEY, &json)
    }
}

fn parse_entries(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(mut entries) => {
            // Anything hand-edited past the cap or with repeats is normalized
            // on the way in.
            let mut seen = Vec::with_capacity(entries.len());
            entries.retain(|c| {
                if seen.contains(c) {
                    false
                } else {
                    seen.push(c.clone());
                    true
                }
            });
            entries.truncate(MAX_RECENT);
            entries
        }
        Err(e) => {
            warn!(error = %e, "stored recent searches are not a string list, starting empty");
            Vec::new()
        }
    }
}
