use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One snapshot of current weather for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub city: String,
    pub condition: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub cloudiness_pct: u8,
    /// `Some` whenever the provider reported a rain block, even if it had no
    /// hourly volume (the volume then defaults to 0 mm).
    pub rain_1h_mm: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

impl WeatherReading {
    /// Rain volume over the last hour in mm, 0 when nothing was reported.
    pub fn rain_volume_1h(&self) -> f64 {
        self.rain_1h_mm.unwrap_or(0.0)
    }

    pub fn has_rain_data(&self) -> bool {
        self.rain_1h_mm.is_some()
    }

    /// Condition with every word capitalized, e.g. "light rain" -> "Light Rain".
    pub fn condition_title(&self) -> String {
        title_case(&self.condition)
    }

    /// Observation time formatted for display, always in UTC.
    pub fn observed_at_display(&self) -> String {
        self.observed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;

    for ch in s.chars() {
        if ch.is_alphabetic() {
            if word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(ch);
            word_start = true;
        }
    }

    out
}

#[cfg(test)]
pub(crate) fn sample_reading() -> WeatherReading {
    WeatherReading {
        city: "Mumbai".to_string(),
        condition: "moderate rain".to_string(),
        temperature_c: 27.4,
        humidity_pct: 90,
        wind_speed_mps: 5.1,
        cloudiness_pct: 100,
        rain_1h_mm: None,
        observed_at: DateTime::from_timestamp(1_720_000_000, 0).expect("valid timestamp"),
    }
}
