use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{config::ApiKey, model::WeatherReading};

use super::{FetchError, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<ApiKey>,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: Option<ApiKey>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: Option<ApiKey>, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    pub async fn fetch_current(&self, city: &str) -> Result<WeatherReading, FetchError> {
        let Some(api_key) = self.api_key.as_ref() else {
            tracing::warn!("no OpenWeather API key configured, skipping request");
            return Err(FetchError::MissingApiKey);
        };

        let city = city.trim();
        if city.is_empty() {
            return Err(FetchError::EmptyCity);
        }

        let url = format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'));
        tracing::debug!(%city, %url, key_source = %api_key.source(), "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(FetchError::transport)?;

        let status = res.status();
        let body = res.text().await.map_err(FetchError::transport)?;

        if status != StatusCode::OK {
            tracing::warn!(
                %city,
                status = status.as_u16(),
                body = %truncate_body(&body),
                "OpenWeather request failed"
            );
            return Err(FetchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        let reading = parsed.into_reading(city)?;

        tracing::info!(
            %city,
            temperature_c = reading.temperature_c,
            humidity_pct = reading.humidity_pct,
            rain_1h_mm = ?reading.rain_1h_mm,
            "fetched current weather"
        );

        Ok(reading)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    clouds: OwClouds,
    #[serde(default)]
    rain: Option<OwRain>,
}

impl OwCurrentResponse {
    fn into_reading(self, city: &str) -> Result<WeatherReading, FetchError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or(FetchError::MissingField("weather[0].description"))?;

        let observed_at =
            DateTime::from_timestamp(self.dt, 0).ok_or(FetchError::InvalidTimestamp(self.dt))?;

        Ok(WeatherReading {
            city: city.to_string(),
            condition,
            temperature_c: self.main.temp,
            humidity_pct: self.main.humidity,
            wind_speed_mps: self.wind.speed,
            cloudiness_pct: self.clouds.all,
            rain_1h_mm: self.rain.map(|r| r.one_hour.unwrap_or(0.0)),
            observed_at,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn current(&self, city: &str) -> Result<WeatherReading, FetchError> {
        self.fetch_current(city).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
