use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::{
    error::SearchError,
    model::{ServiceErrorBody, WeatherResult},
};

/// Characters `encodeURIComponent` leaves alone; everything else is escaped,
/// so a space goes out as `%20` rather than `+`.
const CITY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Source of current weather for a city.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    async fn current(&self, city: &str) -> Result<WeatherResult, SearchError>;
}

/// Talks to `{base_url}/weather/current?city=...` over HTTP.
///
/// No timeout and no retries: a request either completes or fails.
#[derive(Debug, Clone)]
pub struct HttpWeatherService {
    base_url: String,
    http: Client,
}

impl HttpWeatherService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn current_url(&self, city: &str) -> String {
        format!(
            "{}/weather/current?city={}",
            self.base_url,
            utf8_percent_encode(city, CITY_COMPONENT)
        )
    }
}

#[async_trait]
impl WeatherService for HttpWeatherService {
    async fn current(&self, city: &str) -> Result<WeatherResult, SearchError> {
        let url = self.current_url(city);
        debug!(%url, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "weather service request failed");
                SearchError::transport(&self.base_url, e)
            })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| SearchError::transport(&self.base_url, e))?;

        if !status.is_success() {
            debug!(%status, body = %truncate_body(&body), "weather service returned an error");
            return Err(SearchError::Service {
                status,
                message: ServiceErrorBody::message_from(&body),
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, body = %truncate_body(&body), "unparsable weather response");
            SearchError::transport(&self.base_url, e)
        })?;

        if !value.is_object() {
            // Valid JSON, just not a weather object: nothing to show, but the
            // exchange succeeded.
            warn!(body = %truncate_body(&body), "weather response is not an object");
            return Ok(WeatherResult::default());
        }

        serde_json::from_value(value).map_err(|e| SearchError::transport(&self.base_url, e))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
