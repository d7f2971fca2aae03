//! Core library for the `cityweather` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Forward/reverse geocoding and one-call weather requests against OpenWeatherMap
//! - A per-session memo cache of weather snapshots keyed by coordinate
//! - The favorites list persisted on disk
//!
//! It is used by `cityweather-cli`, but can also be driven by other front ends.

pub mod cache;
pub mod config;
pub mod error;
pub mod favorites;
pub mod icon;
pub mod model;
pub mod provider;
pub mod retry;
pub mod session;

pub use config::Config;
pub use error::WeatherError;
pub use favorites::FavoritesStore;
pub use model::{
    ConditionDetail, Coordinate, CoordinateKey, CurrentConditions, FavoriteEntry, GeocodeResult,
    HourlyEntry, PlaceName, WeatherSnapshot,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use retry::RetryPolicy;
pub use session::{Published, WeatherSession};
