use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WeatherError;

/// Cache keys store coordinates in micro-degrees (about 0.1 m of precision).
const KEY_SCALE: f64 = 1_000_000.0;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Cache key, or `InvalidRequest` for values with no fixed-precision form
    /// (NaN, infinities, or magnitudes that overflow micro-degrees).
    pub fn key(&self) -> Result<CoordinateKey, WeatherError> {
        CoordinateKey::try_from(*self)
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Fixed-precision identity of a [`Coordinate`], used as the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordinateKey {
    lat_micro: i64,
    lon_micro: i64,
}

impl TryFrom<Coordinate> for CoordinateKey {
    type Error = WeatherError;

    fn try_from(c: Coordinate) -> Result<Self, Self::Error> {
        match (to_micro(c.latitude), to_micro(c.longitude)) {
            (Some(lat_micro), Some(lon_micro)) => Ok(Self { lat_micro, lon_micro }),
            _ => Err(WeatherError::InvalidRequest(format!(
                "coordinate ({}, {}) has no cache key",
                c.latitude, c.longitude
            ))),
        }
    }
}

/// Degrees to rounded micro-degrees, refusing values a plain `as` cast would
/// saturate (NaN becomes 0, overflow clamps), since those would collide.
fn to_micro(degrees: f64) -> Option<i64> {
    let scaled = (degrees * KEY_SCALE).round();
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    (scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64)
        .then_some(scaled as i64)
}

/// One entry of a forward or reverse geocoding response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl GeocodeResult {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Human-readable name for a coordinate, as shown for a dropped map pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceName {
    pub city: String,
    pub country: String,
}

impl PlaceName {
    pub const UNKNOWN: &'static str = "Unknown";
}

impl From<GeocodeResult> for PlaceName {
    fn from(r: GeocodeResult) -> Self {
        Self {
            city: r.name.unwrap_or_else(|| Self::UNKNOWN.to_string()),
            country: r.country.unwrap_or_else(|| Self::UNKNOWN.to_string()),
        }
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// Root of a one-call response: current conditions plus hourly forecast.
///
/// Field names follow the upstream JSON so the same type decodes the wire
/// format and serializes back to it unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    /// Shift from UTC in seconds for the requested location.
    pub timezone_offset: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Degrees Celsius (requests use metric units).
    pub temp: f64,
    pub feels_like: f64,
    pub uvi: f64,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Unix seconds.
    pub sunrise: i64,
    /// Unix seconds.
    pub sunset: i64,
    pub weather: Vec<ConditionDetail>,
}

impl CurrentConditions {
    pub fn primary(&self) -> Option<&ConditionDetail> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// Unix seconds at the start of the hour.
    pub dt: i64,
    pub temp: f64,
    /// Probability of precipitation, 0.0 to 1.0.
    pub pop: f64,
    pub weather: Vec<ConditionDetail>,
}

impl HourlyEntry {
    pub fn primary(&self) -> Option<&ConditionDetail> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDetail {
    pub description: String,
    /// Raw upstream icon code such as `10d`; see [`crate::icon`].
    pub icon: String,
}

impl WeatherSnapshot {
    /// The location's UTC offset, or `None` if upstream sent an out-of-range value.
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.timezone_offset)
    }

    /// Convert a unix timestamp into the location's local time.
    pub fn local_time(&self, epoch_secs: i64) -> Option<DateTime<FixedOffset>> {
        let offset = self.offset()?;
        DateTime::from_timestamp(epoch_secs, 0).map(|utc| utc.with_timezone(&offset))
    }

    /// Wall-clock rendering like `6:05 AM`, in the location's local time.
    pub fn format_clock(&self, epoch_secs: i64) -> String {
        self.local_time(epoch_secs)
            .map(|t| t.format("%-I:%M %p").to_string())
            .unwrap_or_else(|| "--:--".to_string())
    }

    /// The first `n` hourly entries (fewer if upstream sent fewer).
    pub fn next_hours(&self, n: usize) -> &[HourlyEntry] {
        &self.hourly[..n.min(self.hourly.len())]
    }
}

/// A saved city, persisted by [`crate::favorites::FavoritesStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl FavoriteEntry {
    pub fn new(city: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            city: city.into(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
