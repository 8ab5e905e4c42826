use reqwest::StatusCode;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message shown when a non-success response carries no usable `message`.
pub const GENERIC_FAILURE: &str = "Failed to fetch weather data";

/// Ways a search can fail. None of them are fatal: the controller turns each
/// into the user-visible error message via `Display`.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Please enter a city name")]
    EmptyInput,

    #[error("{}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Service {
        status: StatusCode,
        message: Option<String>,
    },

    #[error(
        "Unable to connect to weather service. Make sure the weather API is running at {endpoint}."
    )]
    Transport {
        endpoint: String,
        #[source]
        source: BoxError,
    },
}

impl SearchError {
    /// Transport failure against `endpoint`, keeping the cause for logs.
    pub fn transport(endpoint: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }
}
