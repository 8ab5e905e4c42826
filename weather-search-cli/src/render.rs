use chrono::Local;
use std::fmt::Write;
use weather_search_core::UiState;

const HOW_TO_USE: &str = "How to use:
  1. Make sure the weather service is running (default http://localhost:8080)
  2. Enter a city name at the prompt
  3. Press Enter to get current weather information";

/// Text for the current screen: the error, the weather card, or usage help.
pub fn screen(state: &UiState) -> String {
    if state.is_loading {
        return "Fetching weather data...".to_string();
    }

    if let Some(error) = &state.error {
        return format!("Error:\n  {error}");
    }

    let Some(weather) = &state.weather else {
        return HOW_TO_USE.to_string();
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", weather.city);
    let _ = writeln!(out, "  {}", weather.temperature_label());
    let _ = writeln!(out, "  {}", weather.description);
    let _ = write!(out, "  Temperature in Celsius");
    if let Some(at) = state.fetched_at {
        let _ = write!(out, ", fetched at {}", at.with_timezone(&Local).format("%H:%M:%S"));
    }
    out
}

pub fn recent_list(recent: &[String]) -> String {
    if recent.is_empty() {
        return "No recent searches yet.".to_string();
    }

    let mut out = String::from("Recent searches:");
    for (i, city) in recent.iter().enumerate() {
        let _ = write!(out, "\n  {}. {city}", i + 1);
    }
    out
}
