//! Page and terminal rendering of readings and alerts.

use rainwatch_core::{AlertLevel, Alerts, FetchError, WeatherReading};
use serde::Serialize;
use tera::{Context, Tera};

pub const DEFAULT_CITY: &str = "Mumbai";

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

const FETCH_FAILED: &str = "Could not fetch weather data. Check city name or try again.";

#[derive(Debug, Serialize)]
pub struct ReadingView {
    pub city: String,
    pub condition: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub cloudiness_pct: u8,
    pub updated_at: String,
}

impl From<&WeatherReading> for ReadingView {
    fn from(reading: &WeatherReading) -> Self {
        Self {
            city: reading.city.clone(),
            condition: reading.condition_title(),
            temperature_c: reading.temperature_c,
            humidity_pct: reading.humidity_pct,
            wind_speed_mps: reading.wind_speed_mps,
            cloudiness_pct: reading.cloudiness_pct,
            updated_at: reading.observed_at_display(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BadgeView {
    pub label: &'static str,
    pub level: &'static str,
    pub emoji: &'static str,
    pub text: &'static str,
}

impl BadgeView {
    fn new(label: &'static str, level: AlertLevel) -> Self {
        Self {
            label,
            level: level.as_str(),
            emoji: level.emoji(),
            text: level.label(),
        }
    }
}

/// Everything the page template needs.
#[derive(Debug, Default, Serialize)]
pub struct PageView {
    pub city: String,
    pub reading: Option<ReadingView>,
    pub alerts: Vec<BadgeView>,
    pub errors: Vec<String>,
}

impl PageView {
    pub fn form(city: &str) -> Self {
        Self {
            city: city.to_string(),
            ..Self::default()
        }
    }

    pub fn with_reading(city: &str, reading: &WeatherReading, alerts: Alerts) -> Self {
        Self {
            city: city.to_string(),
            reading: Some(ReadingView::from(reading)),
            alerts: vec![
                BadgeView::new("Rain Alert", alerts.rain),
                BadgeView::new("Flood Alert", alerts.flood),
            ],
            errors: Vec::new(),
        }
    }

    pub fn with_error(city: &str, err: &FetchError) -> Self {
        let mut errors = vec![error_message(err)];
        if matches!(err, FetchError::Api { .. }) || err.is_fatal() {
            errors.push(FETCH_FAILED.to_string());
        }

        Self {
            city: city.to_string(),
            errors,
            ..Self::default()
        }
    }
}

/// Error text including the underlying cause, if any.
pub fn error_message(err: &FetchError) -> String {
    match std::error::Error::source(err) {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}

pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template("index.html", INDEX_TEMPLATE)?;
    Ok(tera)
}

pub fn render_page(tera: &Tera, page: &PageView) -> Result<String, tera::Error> {
    let context = Context::from_serialize(page)?;
    tera.render("index.html", &context)
}

/// Plain-text rendering for the terminal.
pub fn render_text(reading: &WeatherReading, alerts: &Alerts) -> String {
    format!(
        "📍 Weather in {city}\n\
         Condition:   {condition}\n\
         Temperature: {temp} °C\n\
         Humidity:    {humidity}%\n\
         Wind Speed:  {wind} m/s\n\
         Cloudiness:  {clouds}%\n\
         Updated at:  {updated}\n\
         \n\
         🚨 Alerts\n\
         Rain Alert:  {rain_emoji} {rain}\n\
         Flood Alert: {flood_emoji} {flood}\n",
        city = reading.city,
        condition = reading.condition_title(),
        temp = reading.temperature_c,
        humidity = reading.humidity_pct,
        wind = reading.wind_speed_mps,
        clouds = reading.cloudiness_pct,
        updated = reading.observed_at_display(),
        rain_emoji = alerts.rain.emoji(),
        rain = alerts.rain,
        flood_emoji = alerts.flood.emoji(),
        flood = alerts.flood,
    )
}

#[cfg(test)]
pub(crate) fn sample_reading(rain_1h_mm: Option<f64>) -> WeatherReading {
    WeatherReading {
        city: "Mumbai".to_string(),
        condition: "moderate rain".to_string(),
        temperature_c: 27.4,
        humidity_pct: 90,
        wind_speed_mps: 5.1,
        cloudiness_pct: 100,
        rain_1h_mm,
        observed_at: chrono::DateTime::from_timestamp(1_720_000_000, 0).expect("valid timestamp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainwatch_core::{ApiKey, KeySource, OpenWeatherProvider, WeatherProvider, classify};

    #[test]
    fn form_page_prefills_city() {
        let tera = templates().unwrap();
        let html = render_page(&tera, &PageView::form(DEFAULT_CITY)).unwrap();

        assert!(html.contains(r#"name="city""#));
        assert!(html.contains(r#"value="Mumbai""#));
        assert!(!html.contains("Rain Alert"));
    }

    #[test]
    fn reading_page_shows_fields_and_badges() {
        let reading = sample_reading(Some(15.0));
        let alerts = classify(&reading);
        let tera = templates().unwrap();

        let html = render_page(&tera, &PageView::with_reading("Mumbai", &reading, alerts)).unwrap();

        assert!(html.contains("Moderate Rain"));
        assert!(html.contains("27.4 °C"));
        assert!(html.contains("90%"));
        assert!(html.contains("5.1 m/s"));
        assert!(html.contains("100%"));
        assert!(html.contains("2024-07-03 09:46:40 UTC"));
        assert!(html.contains("Rain Alert"));
        assert!(html.contains("Flood Alert"));
        assert_eq!(html.matches("🟡 Moderate").count(), 2);
    }

    #[test]
    fn api_error_page_lists_both_messages() {
        let err = FetchError::Api {
            status: 404,
            body: "city not found".into(),
        };
        let page = PageView::with_error("Atlantis", &err);

        assert_eq!(page.errors.len(), 2);
        assert_eq!(page.errors[0], "API error 404: city not found");
        assert_eq!(page.errors[1], FETCH_FAILED);
    }

    #[test]
    fn missing_key_page_has_single_message() {
        let page = PageView::with_error("Mumbai", &FetchError::MissingApiKey);
        assert_eq!(page.errors.len(), 1);
        assert!(page.errors[0].contains("API key not found"));
    }

    #[tokio::test]
    async fn unreachable_api_message_hides_api_key() {
        let provider = OpenWeatherProvider::with_base_url(
            Some(ApiKey::new("SUPER_SECRET_KEY", KeySource::Environment)),
            "http://127.0.0.1:1",
        );
        let err = provider.current("Mumbai").await.unwrap_err();
        assert!(err.is_fatal());

        let message = error_message(&err);
        assert!(message.starts_with("Failed to reach the weather API"));
        assert!(!message.contains("SUPER_SECRET_KEY"), "key leaked in: {message}");

        let page = PageView::with_error("Mumbai", &err);
        assert!(page.errors.iter().all(|e| !e.contains("SUPER_SECRET_KEY")));
    }

    #[test]
    fn user_input_is_escaped() {
        let tera = templates().unwrap();
        let html = render_page(&tera, &PageView::with_error("<b>x</b>", &FetchError::MissingApiKey)).unwrap();

        assert!(!html.contains("<b>x"));
        assert!(html.contains("&lt;b&gt;x"));
    }

    #[test]
    fn text_rendering_uses_fixed_labels() {
        let reading = WeatherReading {
            humidity_pct: 80,
            ..sample_reading(Some(50.0))
        };
        let text = render_text(&reading, &classify(&reading));

        assert!(text.contains("📍 Weather in Mumbai"));
        assert!(text.contains("Rain Alert:  🔴 Severe"));
        assert!(text.contains("Flood Alert: 🟢 Safe"));
        assert!(text.contains("Updated at:  2024-07-03 09:46:40 UTC"));
    }
}
