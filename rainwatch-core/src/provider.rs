use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::model::WeatherReading;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Why a fetch produced no reading.
///
/// The first three variants are "no data" outcomes to show to the user; the
/// rest are fatal and mean something is broken between us and the API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("API key not found. Set OPENWEATHER_API_KEY in `.env` or add it to the secrets store.")]
    MissingApiKey,

    #[error("Please enter a city name.")]
    EmptyCity,

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Built with [`FetchError::transport`] so the request URL, which
    /// carries the API key, never ends up in the message.
    #[error("Failed to reach the weather API")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to parse weather API response")]
    Decode(#[from] serde_json::Error),

    #[error("Weather API response is missing `{0}`")]
    MissingField(&'static str),

    #[error("Weather API returned an invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

impl FetchError {
    pub fn transport(err: reqwest::Error) -> Self {
        FetchError::Transport(err.without_url())
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            FetchError::MissingApiKey | FetchError::EmptyCity | FetchError::Api { .. }
        )
    }

    /// Upstream HTTP status, for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Source of current weather readings.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Whether an API key is available; without one every fetch is a no-op.
    fn has_api_key(&self) -> bool;

    async fn current(&self, city: &str) -> Result<WeatherReading, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_errors_are_not_fatal() {
        assert!(!FetchError::MissingApiKey.is_fatal());
        assert!(!FetchError::EmptyCity.is_fatal());
        assert!(
            !FetchError::Api {
                status: 404,
                body: "{}".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn broken_responses_are_fatal() {
        assert!(FetchError::MissingField("weather[0].description").is_fatal());
        assert!(FetchError::InvalidTimestamp(i64::MAX).is_fatal());

        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(FetchError::from(decode).is_fatal());
    }

    #[test]
    fn api_error_shows_status_and_body() {
        let err = FetchError::Api {
            status: 401,
            body: r#"{"cod":401,"message":"Invalid API key"}"#.into(),
        };

        assert_eq!(err.status(), Some(401));
        assert_eq!(
            err.to_string(),
            r#"API error 401: {"cod":401,"message":"Invalid API key"}"#
        );
    }
}
