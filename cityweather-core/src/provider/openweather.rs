use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::instrument;

use crate::{
    Config,
    error::WeatherError,
    model::{Coordinate, GeocodeResult, PlaceName, WeatherSnapshot},
    retry::{RetryPolicy, with_retry},
};

use super::WeatherProvider;

/// Sections of the one-call response the client never reads.
const ONECALL_EXCLUDE: &str = "minutely,daily,alerts";
const UNITS: &str = "metric";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    geo_endpoint: String,
    onecall_endpoint: String,
    retry: RetryPolicy,
}

impl OpenWeatherProvider {
    /// Provider against the public endpoints with default timeout and retry.
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Self::from_config(api_key, &Config::default())
    }

    /// Provider using the endpoints, timeout and retry settings from `config`.
    pub fn from_config(api_key: String, config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            http,
            geo_endpoint: config.geo_endpoint.trim_end_matches('/').to_string(),
            onecall_endpoint: config.onecall_endpoint.clone(),
            retry: config.retry_policy(),
        })
    }

    fn url(endpoint: &str, params: &[(&str, &str)]) -> Result<Url, WeatherError> {
        Url::parse_with_params(endpoint, params)
            .map_err(|e| WeatherError::InvalidRequest(format!("bad endpoint '{endpoint}': {e}")))
    }

    fn geocode_url(&self, place: &str) -> Result<Url, WeatherError> {
        Self::url(
            &format!("{}/direct", self.geo_endpoint),
            &[("q", place), ("limit", "1"), ("appid", self.api_key.as_str())],
        )
    }

    fn reverse_geocode_url(&self, coordinate: Coordinate) -> Result<Url, WeatherError> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();
        Self::url(
            &format!("{}/reverse", self.geo_endpoint),
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("limit", "1"),
                ("appid", self.api_key.as_str()),
            ],
        )
    }

    fn onecall_url(&self, coordinate: Coordinate) -> Result<Url, WeatherError> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();
        Self::url(
            &self.onecall_endpoint,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("exclude", ONECALL_EXCLUDE),
                ("appid", self.api_key.as_str()),
                ("units", UNITS),
            ],
        )
    }

    /// GET `url` with retries and return the non-empty body of a 2xx response.
    async fn get_body(&self, url: Url, what: &str) -> Result<String, WeatherError> {
        with_retry(&self.retry, what, || self.get_body_once(url.clone(), what)).await
    }

    async fn get_body_once(&self, url: Url, what: &str) -> Result<String, WeatherError> {
        // The query carries the API key, so only the path is logged.
        tracing::debug!("GET {} ({what})", url.path());

        let res = self.http.get(url).send().await.map_err(|e| {
            WeatherError::NetworkUnavailable(format!("{what} request failed: {}", e.without_url()))
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::NetworkUnavailable(format!(
                "Failed to read {what} response body: {}",
                e.without_url()
            ))
        })?;

        if !status.is_success() {
            return Err(WeatherError::NoData(format!(
                "{what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        if body.trim().is_empty() {
            return Err(WeatherError::NoData(format!("{what} response body was empty")));
        }

        Ok(body)
    }

    async fn geocode_list(&self, url: Url, what: &str) -> Result<Vec<GeocodeResult>, WeatherError> {
        let body = self.get_body(url, what).await?;

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::MalformedResponse(format!("Failed to parse {what} JSON: {e}"))
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self), level = "debug")]
    async fn geocode(&self, place: &str) -> Result<GeocodeResult, WeatherError> {
        let results = self
            .geocode_list(self.geocode_url(place)?, "geocoding")
            .await?;

        results
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::LocationNotFound(place.to_string()))
    }

    #[instrument(skip(self), level = "debug")]
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<PlaceName, WeatherError> {
        let results = self
            .geocode_list(self.reverse_geocode_url(coordinate)?, "reverse geocoding")
            .await?;

        results
            .into_iter()
            .next()
            .map(PlaceName::from)
            .ok_or_else(|| WeatherError::LocationNotFound(coordinate.to_string()))
    }

    #[instrument(skip(self), level = "debug")]
    async fn one_call(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, WeatherError> {
        let body = self.get_body(self.onecall_url(coordinate)?, "weather").await?;

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::MalformedResponse(format!("Failed to parse weather JSON: {e}"))
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_GEO_ENDPOINT, DEFAULT_ONECALL_ENDPOINT};

    fn provider(geo: &str, onecall: &str) -> OpenWeatherProvider {
        let config = Config {
            geo_endpoint: geo.to_string(),
            onecall_endpoint: onecall.to_string(),
            ..Config::default()
        };
        OpenWeatherProvider::from_config("SECRET".into(), &config).unwrap()
    }

    #[test]
    fn new_uses_public_endpoints() {
        let p = OpenWeatherProvider::new("KEY".into()).unwrap();
        assert_eq!(p.geo_endpoint, DEFAULT_GEO_ENDPOINT);
        assert_eq!(p.onecall_endpoint, DEFAULT_ONECALL_ENDPOINT);
        assert_eq!(p.retry, RetryPolicy::default());
    }

    #[test]
    fn geocode_url_encodes_place_and_ends_with_api_key() {
        let p = provider("https://geo.example/1.0/", "https://wx.example/onecall");
        assert_eq!(
            p.geocode_url("São Paulo").unwrap().as_str(),
            "https://geo.example/1.0/direct?q=S%C3%A3o+Paulo&limit=1&appid=SECRET"
        );
    }

    #[test]
    fn reverse_geocode_url_orders_coordinate_first() {
        let p = provider("https://geo.example/1.0", "https://wx.example/onecall");
        assert_eq!(
            p.reverse_geocode_url(Coordinate::new(-33.8688, 151.2093))
                .unwrap()
                .as_str(),
            "https://geo.example/1.0/reverse?lat=-33.8688&lon=151.2093&limit=1&appid=SECRET"
        );
    }

    #[test]
    fn onecall_url_puts_api_key_before_units() {
        let p = provider("https://geo.example/1.0", "https://wx.example/onecall");
        assert_eq!(
            p.onecall_url(Coordinate::new(-33.8688, 151.2093))
                .unwrap()
                .as_str(),
            "https://wx.example/onecall?lat=-33.8688&lon=151.2093\
             &exclude=minutely%2Cdaily%2Calerts&appid=SECRET&units=metric"
        );
    }

    #[test]
    fn geo_endpoint_trailing_slash_is_trimmed() {
        let p = provider("https://geo.example/1.0/", "https://wx.example/onecall");
        assert_eq!(p.geo_endpoint, "https://geo.example/1.0");
    }

    #[test]
    fn unparsable_endpoint_is_invalid_request() {
        let p = provider("not a url", "also not a url");
        let err = p.geocode_url("x").unwrap_err();
        assert!(matches!(err, WeatherError::InvalidRequest(_)));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let t = truncate_body(&long);
        assert!(t.ends_with("..."));
        assert_eq!(t.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
