//! Session-lifetime memo of weather snapshots by coordinate.
//!
//! Entries are never evicted or refreshed. A key is populated only after a
//! response decoded successfully. Coordinates without a [`CoordinateKey`]
//! are never cached.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::{Coordinate, CoordinateKey, WeatherSnapshot};

#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: RwLock<HashMap<CoordinateKey, Arc<WeatherSnapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, coordinate: Coordinate) -> Option<Arc<WeatherSnapshot>> {
        let key = coordinate.key().ok()?;
        self.entries.read().get(&key).cloned()
    }

    pub fn contains(&self, coordinate: Coordinate) -> bool {
        coordinate
            .key()
            .is_ok_and(|key| self.entries.read().contains_key(&key))
    }

    /// Store a snapshot, replacing any previous entry for the same key.
    /// Unkeyable coordinates are handed back without being stored.
    pub fn insert(&self, coordinate: Coordinate, snapshot: WeatherSnapshot) -> Arc<WeatherSnapshot> {
        let snapshot = Arc::new(snapshot);
        match coordinate.key() {
            Ok(key) => {
                self.entries.write().insert(key, Arc::clone(&snapshot));
            }
            Err(e) => tracing::debug!("Not caching snapshot: {e}"),
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CurrentConditions;

    fn snapshot(temp: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            current: CurrentConditions {
                temp,
                feels_like: temp,
                uvi: 0.0,
                humidity: 50,
                sunrise: 0,
                sunset: 0,
                weather: vec![],
            },
            hourly: vec![],
            timezone_offset: 0,
        }
    }

    #[test]
    fn empty_cache_misses() {
        let cache = SnapshotCache::new();
        assert!(cache.is_empty());
        assert!(cache.get(Coordinate::new(1.0, 2.0)).is_none());
    }

    #[test]
    fn insert_then_get_returns_same_allocation() {
        let cache = SnapshotCache::new();
        let c = Coordinate::new(-33.8688, 151.2093);
        let stored = cache.insert(c, snapshot(22.5));

        let hit = cache.get(c).expect("cached");
        assert!(Arc::ptr_eq(&stored, &hit));
        assert!(cache.contains(c));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn second_insert_for_same_key_wins() {
        let cache = SnapshotCache::new();
        let c = Coordinate::new(48.8566, 2.3522);
        cache.insert(c, snapshot(10.0));
        cache.insert(c, snapshot(11.0));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(c).map(|s| s.current.temp), Some(11.0));
    }

    #[test]
    fn unkeyable_coordinates_are_never_stored() {
        let cache = SnapshotCache::new();
        cache.insert(Coordinate::new(0.0, 0.0), snapshot(27.0));
        cache.insert(Coordinate::new(1e13, 0.0), snapshot(1.0));

        assert_eq!(cache.len(), 1);
        assert!(cache.get(Coordinate::new(f64::NAN, f64::NAN)).is_none());
        assert!(cache.get(Coordinate::new(5e13, 0.0)).is_none());
        assert!(!cache.contains(Coordinate::new(1e13, 0.0)));
    }

    #[test]
    fn distinct_coordinates_do_not_collide() {
        let cache = SnapshotCache::new();
        cache.insert(Coordinate::new(1.0, 2.0), snapshot(1.0));
        cache.insert(Coordinate::new(2.0, 1.0), snapshot(2.0));
        assert_eq!(cache.len(), 2);
    }
}
