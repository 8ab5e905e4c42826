use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Current weather for a single city, as returned by the weather service.
///
/// Parsing is lenient: a missing, `null` or non-numeric `temperature` becomes
/// `None` instead of failing the whole response. A success body that is
/// JSON but not an object yields the empty default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_temperature")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

impl WeatherResult {
    /// Marker shown in place of a temperature the service did not provide.
    pub const MISSING_TEMPERATURE: &'static str = "N/A";

    /// Temperature rounded to the nearest degree, halves rounding up.
    pub fn rounded_temperature(&self) -> Option<i64> {
        self.temperature.map(round_half_up)
    }

    /// `"19"` or `"N/A"`.
    pub fn temperature_display(&self) -> String {
        match self.rounded_temperature() {
            Some(t) => t.to_string(),
            None => Self::MISSING_TEMPERATURE.to_string(),
        }
    }

    /// `"19°C"` or `"N/A°C"`.
    pub fn temperature_label(&self) -> String {
        format!("{}°C", self.temperature_display())
    }
}

/// Body of a non-success response. Only `message` is looked at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ServiceErrorBody {
    /// Extract a non-empty `message` from a raw body, if there is one.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ServiceErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
    }
}

/// Everything a renderer needs to draw the search screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub query: String,
    pub is_loading: bool,
    pub error: Option<String>,
    pub weather: Option<WeatherResult>,
    /// When `weather` was last replaced.
    pub fetched_at: Option<DateTime<Utc>>,
}

fn round_half_up(t: f64) -> i64 {
    let floor = t.floor();
    let rounded = if t - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

fn lenient_temperature<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|t| t.is_finite()))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> WeatherResult {
        serde_json::from_str(json).expect("weather result should parse")
    }

    #[test]
    fn parses_full_response() {
        let w = parse(r#"{"city":"Paris","temperature":18.6,"description":"clear sky"}"#);

        assert_eq!(w.city, "Paris");
        assert_eq!(w.temperature, Some(18.6));
        assert_eq!(w.description, "clear sky");
        assert_eq!(w.temperature_label(), "19°C");
    }

    #[test]
    fn missing_temperature_renders_marker() {
        let w = parse(r#"{"city":"Oslo","description":"snow"}"#);
        assert_eq!(w.temperature, None);
        assert_eq!(w.temperature_display(), "N/A");
        assert_eq!(w.temperature_label(), "N/A°C");
    }

    #[test]
    fn non_numeric_temperature_renders_marker() {
        let w = parse(r#"{"city":"Oslo","temperature":"cold","description":"snow"}"#);
        assert_eq!(w.temperature_display(), "N/A");

        let w = parse(r#"{"city":"Oslo","temperature":null,"description":"snow"}"#);
        assert_eq!(w.temperature_display(), "N/A");

        // numeric strings are not numbers either
        let w = parse(r#"{"city":"Oslo","temperature":"12","description":"snow"}"#);
        assert_eq!(w.temperature_display(), "N/A");
    }

    #[test]
    fn rounding_matches_half_up() {
        let with = |t: f64| WeatherResult {
            city: String::new(),
            temperature: Some(t),
            description: String::new(),
        };

        assert_eq!(with(18.6).rounded_temperature(), Some(19));
        assert_eq!(with(18.4).rounded_temperature(), Some(18));
        assert_eq!(with(2.5).rounded_temperature(), Some(3));
        assert_eq!(with(-2.5).rounded_temperature(), Some(-2));
        assert_eq!(with(-2.6).rounded_temperature(), Some(-3));
        assert_eq!(with(0.0).rounded_temperature(), Some(0));
    }

    #[test]
    fn null_city_and_description_become_empty() {
        let w = parse(r#"{"city":null,"temperature":3}"#);
        assert_eq!(w.city, "");
        assert_eq!(w.description, "");
        assert_eq!(w.temperature_label(), "3°C");
    }

    #[test]
    fn error_body_message_extraction() {
        assert_eq!(
            ServiceErrorBody::message_from(r#"{"message":"city not found"}"#),
            Some("city not found".to_string())
        );
        assert_eq!(ServiceErrorBody::message_from(r#"{"message":""}"#), None);
        assert_eq!(ServiceErrorBody::message_from(r#"{"error":"nope"}"#), None);
        assert_eq!(ServiceErrorBody::message_from("<html>bad gateway</html>"), None);
    }
}
