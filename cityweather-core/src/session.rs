//! Weather lookups for one user session.
//!
//! [`WeatherSession`] sits between callers and a [`WeatherProvider`]:
//! geocoding passes straight through, weather lookups are memoized per
//! coordinate for the session's lifetime, and each successful lookup is
//! published on a watch channel for observers that only care about the
//! latest result.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use futures::future::join_all;
use tokio::sync::watch;
use tracing::instrument;

use crate::{
    Config,
    cache::SnapshotCache,
    error::WeatherError,
    model::{Coordinate, FavoriteEntry, PlaceName, WeatherSnapshot},
    provider::{WeatherProvider, provider_from_config},
};

/// The value most recently shown to observers.
#[derive(Debug, Clone)]
pub struct Published {
    /// Issue order of the `fetch_weather` call that produced this value.
    pub seq: u64,
    pub coordinate: Coordinate,
    pub snapshot: Arc<WeatherSnapshot>,
}

#[derive(Debug)]
pub struct WeatherSession {
    provider: Arc<dyn WeatherProvider>,
    cache: SnapshotCache,
    issued: AtomicU64,
    latest: watch::Sender<Option<Published>>,
}

impl WeatherSession {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            provider,
            cache: SnapshotCache::new(),
            issued: AtomicU64::new(0),
            latest,
        }
    }

    /// Session backed by the OpenWeatherMap provider described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(provider_from_config(config)?))
    }

    /// Resolve a place name to a coordinate.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_location(&self, place: &str) -> Result<Coordinate, WeatherError> {
        let place = place.trim();
        if place.is_empty() {
            return Err(WeatherError::InvalidRequest("place name is empty".to_string()));
        }

        let result = self.provider.geocode(place).await.inspect_err(|e| {
            tracing::warn!("Geocoding '{place}' failed: {e}");
        })?;

        let coordinate = result.coordinate();
        tracing::debug!("Resolved '{place}' to {coordinate}");
        Ok(coordinate)
    }

    /// Weather for a coordinate, served from the cache when possible.
    ///
    /// A miss performs one upstream request; only a decoded snapshot is
    /// cached. Two overlapping misses for the same coordinate both reach the
    /// network and the later write wins. NaN and infinite coordinates are
    /// rejected with `InvalidRequest`; finite out-of-range values go upstream.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Arc<WeatherSnapshot>, WeatherError> {
        let coordinate = Coordinate::new(latitude, longitude);
        if !coordinate.is_finite() {
            return Err(WeatherError::InvalidRequest(format!(
                "coordinate ({latitude}, {longitude}) is not a finite number"
            )));
        }
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(snapshot) = self.cache.get(coordinate) {
            tracing::debug!("Cache hit for {coordinate}");
            self.publish(seq, coordinate, Arc::clone(&snapshot));
            return Ok(snapshot);
        }

        tracing::debug!("Cache miss for {coordinate}, fetching");
        let snapshot = self.provider.one_call(coordinate).await.inspect_err(|e| {
            tracing::warn!("Weather fetch for {coordinate} failed: {e}");
        })?;

        let snapshot = self.cache.insert(coordinate, snapshot);
        self.publish(seq, coordinate, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Geocode a place and fetch its weather. A failed lookup fetches nothing.
    pub async fn search_city(
        &self,
        place: &str,
    ) -> Result<(Coordinate, Arc<WeatherSnapshot>), WeatherError> {
        let coordinate = self.fetch_location(place).await?;
        let snapshot = self
            .fetch_weather(coordinate.latitude, coordinate.longitude)
            .await?;
        Ok((coordinate, snapshot))
    }

    /// Name the place at a coordinate (map pins). Not cached.
    pub async fn place_name(&self, coordinate: Coordinate) -> Result<PlaceName, WeatherError> {
        self.provider.reverse_geocode(coordinate).await
    }

    /// Fetch weather for every favorite concurrently, one lookup per entry.
    ///
    /// Results are in input order. Entries already cached cost no request.
    pub async fn refresh_favorites(
        &self,
        favorites: &[FavoriteEntry],
    ) -> Vec<Result<Arc<WeatherSnapshot>, WeatherError>> {
        tracing::info!("Refreshing weather for {} favorites", favorites.len());
        join_all(
            favorites
                .iter()
                .map(|f| self.fetch_weather(f.latitude, f.longitude)),
        )
        .await
    }

    /// Cached snapshot for a coordinate, without any network access.
    pub fn cached(&self, coordinate: Coordinate) -> Option<Arc<WeatherSnapshot>> {
        self.cache.get(coordinate)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// The latest published value.
    pub fn latest(&self) -> Option<Published> {
        self.latest.borrow().clone()
    }

    /// Observe published values as they change.
    pub fn subscribe(&self) -> watch::Receiver<Option<Published>> {
        self.latest.subscribe()
    }

    /// Sequence number of the most recently issued `fetch_weather` call.
    ///
    /// If this is greater than [`Published::seq`], a newer request is still
    /// in flight or has failed.
    pub fn latest_issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Replace the published value unless a newer request already published.
    fn publish(&self, seq: u64, coordinate: Coordinate, snapshot: Arc<WeatherSnapshot>) {
        let replaced = self.latest.send_if_modified(|slot| {
            if slot.as_ref().is_some_and(|p| p.seq > seq) {
                return false;
            }
            *slot = Some(Published {
                seq,
                coordinate,
                snapshot,
            });
            true
        });

        if !replaced {
            tracing::debug!("Result #{seq} for {coordinate} superseded by a newer request");
        }
    }
}
