//! Errors returned by geocoding and weather lookups.

use thiserror::Error;

/// Failure of a single geocoding or weather request.
///
/// Every network or decode failure surfaces as one of these variants; nothing
/// is swallowed after logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// The request could not be built (empty place name, unparsable endpoint).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Geocoding returned an empty result list.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Upstream answered with a non-success status or an empty body.
    #[error("No data: {0}")]
    NoData(String),

    /// The body was present but did not decode into the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl WeatherError {
    /// Whether another attempt at the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable(_))
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(msg) => format!("Invalid request: {msg}"),
            Self::NetworkUnavailable(_) => "Network error. Check your connection.".to_string(),
            Self::LocationNotFound(place) => format!("No location found for '{place}'"),
            Self::NoData(_) => "The weather service returned no data.".to_string(),
            Self::MalformedResponse(_) => {
                "The weather service returned data in an unexpected format.".to_string()
            }
        }
    }
}
