use crate::{
    Config,
    error::WeatherError,
    model::{Coordinate, GeocodeResult, PlaceName, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Upstream source of geocoding and weather data.
///
/// Implementations perform exactly one logical request per call (plus any
/// transport retries) and never cache.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Forward-geocode a place name to its best match.
    async fn geocode(&self, place: &str) -> Result<GeocodeResult, WeatherError>;

    /// Name the place at a coordinate.
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<PlaceName, WeatherError>;

    /// Current conditions and hourly forecast for a coordinate.
    async fn one_call(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, WeatherError>;
}

/// Construct the OpenWeatherMap provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.resolved_api_key()?;
    let provider = OpenWeatherProvider::from_config(api_key, config)?;
    Ok(Arc::new(provider))
}
