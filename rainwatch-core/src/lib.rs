//! Core library for `rainwatch`.
//!
//! This crate defines:
//! - API key resolution (environment first, then the secrets store)
//! - The current-weather provider abstraction and its OpenWeather implementation
//! - Rain and flood alert classification
//!
//! It is used by `rainwatch-web`, but has no dependency on any UI.

pub mod alert;
pub mod config;
pub mod model;
pub mod provider;

pub use alert::{AlertLevel, Alerts, classify};
pub use config::{API_KEY_ENV, ApiKey, KeySource, Secrets, load_api_key, resolve_api_key};
pub use model::WeatherReading;
pub use provider::{FetchError, OpenWeatherProvider, WeatherProvider};
