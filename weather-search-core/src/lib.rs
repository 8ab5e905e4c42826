//! Core library for the `weather-search` tool.
//!
//! This crate defines:
//! - The search controller (one fetch per submit, renderer-facing state)
//! - The recent-search list and the key/value storage it persists to
//! - The HTTP client for the weather API
//! - Configuration handling
//!
//! It is used by `weather-search-cli`, but any front end can drive the
//! controller and render its [`UiState`].

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod recent;
pub mod service;
pub mod storage;

pub use config::Config;
pub use controller::SearchController;
pub use error::SearchError;
pub use model::{UiState, WeatherResult};
pub use recent::RecentSearches;
pub use service::{HttpWeatherService, WeatherService};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
