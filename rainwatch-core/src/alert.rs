//! Rain and flood severity classification.
//!
//! Everything here is pure: a [`WeatherReading`] goes in, an [`Alerts`] pair
//! comes out.

use serde::{Deserialize, Serialize};

use crate::model::WeatherReading;

/// Hourly rain volume (mm) above which the rain alert is at least Yellow.
pub const RAIN_MODERATE_MM: f64 = 10.0;
/// Hourly rain volume (mm) above which the rain alert is Red.
pub const RAIN_SEVERE_MM: f64 = 30.0;
/// Relative humidity (%) above which rain can escalate into a flood alert.
pub const FLOOD_HUMIDITY_PCT: u8 = 85;

/// Severity level, ordered `Green < Yellow < Red`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    Green,
    Yellow,
    Red,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Green => "green",
            AlertLevel::Yellow => "yellow",
            AlertLevel::Red => "red",
        }
    }

    /// Fixed display text for the badge.
    pub fn label(&self) -> &'static str {
        match self {
            AlertLevel::Green => "Safe",
            AlertLevel::Yellow => "Moderate",
            AlertLevel::Red => "Severe",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertLevel::Green => "🟢",
            AlertLevel::Yellow => "🟡",
            AlertLevel::Red => "🔴",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alerts {
    pub rain: AlertLevel,
    pub flood: AlertLevel,
}

pub fn rain_alert(rain_volume_1h_mm: f64) -> AlertLevel {
    if rain_volume_1h_mm > RAIN_SEVERE_MM {
        AlertLevel::Red
    } else if rain_volume_1h_mm > RAIN_MODERATE_MM {
        AlertLevel::Yellow
    } else {
        AlertLevel::Green
    }
}

/// Flood risk follows the rain alert, but only when the air is saturated and
/// the provider actually reported rain. It never exceeds `rain`.
pub fn flood_alert(rain: AlertLevel, humidity_pct: u8, has_rain_data: bool) -> AlertLevel {
    if humidity_pct > FLOOD_HUMIDITY_PCT && has_rain_data {
        rain
    } else {
        AlertLevel::Green
    }
}

pub fn classify(reading: &WeatherReading) -> Alerts {
    let rain = rain_alert(reading.rain_volume_1h());
    let flood = flood_alert(rain, reading.humidity_pct, reading.has_rain_data());

    Alerts { rain, flood }
}
