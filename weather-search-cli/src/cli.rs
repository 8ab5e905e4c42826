use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Select, Text};
use std::process::ExitCode;
use tracing::debug;
use weather_search_core::{
    Config, FileStorage, HttpWeatherService, SearchController, SearchError, WeatherResult,
};

use crate::render;

type Controller = SearchController<FileStorage>;

/// Label of the first entry in the interactive menu.
const NEW_SEARCH: &str = "New search...";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-search", version, about = "Current weather by city")]
pub struct Cli {
    /// Weather API base URL for this run, overriding the config file.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Defaults to `interactive`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the weather API base URL.
    Configure,

    /// Show current weather for a city.
    Search {
        /// City name.
        city: String,
    },

    /// List recent searches, most recent first.
    Recent,

    /// Prompt for cities until cancelled.
    Interactive,
}

impl Cli {
    /// Runs the command. A failed search is shown on screen and reported
    /// through the exit code; other failures come back as errors.
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command.unwrap_or(Command::Interactive) {
            Command::Configure => configure().map(|()| ExitCode::SUCCESS),
            Command::Search { city } => {
                let controller = build_controller(self.base_url.as_deref())?;
                match search_once(&controller, &city).await {
                    Ok(screen) => {
                        println!("{screen}");
                        Ok(ExitCode::SUCCESS)
                    }
                    Err(screen) => {
                        eprintln!("{screen}");
                        Ok(ExitCode::FAILURE)
                    }
                }
            }
            Command::Recent => {
                let controller = build_controller(self.base_url.as_deref())?;
                println!("{}", render::recent_list(&controller.recent_searches().await));
                Ok(ExitCode::SUCCESS)
            }
            Command::Interactive => {
                let controller = build_controller(self.base_url.as_deref())?;
                interactive(&controller).await.map(|()| ExitCode::SUCCESS)
            }
        }
    }
}

fn build_controller(base_url: Option<&str>) -> anyhow::Result<Controller> {
    let mut config = Config::load()?;
    if let Some(url) = base_url {
        config.set_base_url(url)?;
    }
    debug!(base_url = %config.base_url, "using weather service");

    let storage = config.storage()?;
    Ok(SearchController::new(
        Box::new(HttpWeatherService::new(config.base_url.as_str())),
        storage,
    ))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let url = Text::new("Weather API base URL:")
        .with_default(&config.base_url)
        .prompt()
        .context("Failed to read base URL")?;
    config.set_base_url(&url)?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// One search; the rendered screen either way, `Err` when the search failed.
async fn search_once(controller: &Controller, city: &str) -> Result<String, String> {
    controller.set_query(city);
    let outcome = submit_with_loading(controller, None).await;
    let screen = render::screen(&controller.state());

    match outcome {
        Ok(_) => Ok(screen),
        Err(e) => {
            debug!(error = ?e, "search failed");
            Err(screen)
        }
    }
}

/// Whether the next submit will actually go out to the service.
fn sends_request(controller: &Controller, recent: Option<&str>) -> bool {
    match recent {
        Some(city) => !city.trim().is_empty(),
        None => !controller.state().query.trim().is_empty(),
    }
}

/// Print the loading line, then run either a recent-city search or a plain
/// submit of the current query.
async fn submit_with_loading(
    controller: &Controller,
    recent: Option<&str>,
) -> Result<WeatherResult, SearchError> {
    if sends_request(controller, recent) {
        println!("Fetching weather data...");
    }

    match recent {
        Some(city) => controller.select_recent(city).await,
        None => controller.submit().await,
    }
}

async fn interactive(controller: &Controller) -> anyhow::Result<()> {
    println!("{}", render::screen(&controller.state()));

    loop {
        let recent = controller.recent_searches().await;

        let picked = if recent.is_empty() {
            None
        } else {
            let mut options = vec![NEW_SEARCH.to_string()];
            options.extend(recent);
            match Select::new("Search:", options).prompt() {
                Ok(choice) if choice == NEW_SEARCH => None,
                Ok(choice) => Some(choice),
                Err(e) if is_cancel(&e) => break,
                Err(e) => return Err(e).context("Failed to read selection"),
            }
        };

        // Errors are shown on screen; the loop keeps going.
        let _ = match picked {
            Some(city) => submit_with_loading(controller, Some(&city)).await,
            None => {
                let query = controller.state().query;
                let text = match Text::new("City:")
                    .with_placeholder("Enter city name...")
                    .with_initial_value(&query)
                    .prompt()
                {
                    Ok(text) => text,
                    Err(e) if is_cancel(&e) => break,
                    Err(e) => return Err(e).context("Failed to read city name"),
                };
                controller.set_query(&text);
                submit_with_loading(controller, None).await
            }
        };

        println!("{}\n", render::screen(&controller.state()));
    }

    Ok(())
}

fn is_cancel(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn controller_at(base_url: &str, dir: &tempfile::TempDir) -> Controller {
        SearchController::new(
            Box::new(HttpWeatherService::new(base_url)),
            FileStorage::new(dir.path().join("storage.json")),
        )
    }

    #[tokio::test]
    async fn search_once_renders_card_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "Paris",
                "temperature": 18.6,
                "description": "clear sky"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let controller = controller_at(&server.uri(), &dir);

        let screen = search_once(&controller, "Paris").await.expect("search succeeds");
        assert!(screen.starts_with("Paris\n"));
        assert!(screen.contains("19°C"));
    }

    #[tokio::test]
    async fn search_once_renders_service_error_block() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "message": "city not found" })),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let controller = controller_at(&server.uri(), &dir);

        let screen = search_once(&controller, "Nowhere").await.unwrap_err();
        assert_eq!(screen, "Error:\n  city not found");
    }

    #[tokio::test]
    async fn search_once_renders_transport_error_without_cause_chain() {
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        let dir = tempfile::tempdir().expect("tempdir");
        let controller = controller_at(&uri, &dir);

        let screen = search_once(&controller, "Paris").await.unwrap_err();
        assert!(screen.starts_with("Error:\n  Unable to connect to weather service."));
        assert!(!screen.contains("Caused by"));
        assert_eq!(screen.lines().count(), 2);
    }

    #[test]
    fn loading_line_only_for_real_requests() {
        let dir = tempfile::tempdir().expect("tempdir");
        let controller = controller_at("http://localhost:8080", &dir);

        assert!(!sends_request(&controller, None));
        controller.set_query("   ");
        assert!(!sends_request(&controller, None));
        controller.set_query("Paris");
        assert!(sends_request(&controller, None));

        assert!(sends_request(&controller, Some("Rome")));
        assert!(!sends_request(&controller, Some(" ")));
    }
}
