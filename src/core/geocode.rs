//! Reverse geocoding of punch locations.
//!
//! The provider itself lives outside the crate; it is plugged in through
//! [`Geocoder`]. Lookups never run inside a write transaction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

pub trait Geocoder: Send + Sync {
    /// Address for a coordinate, `None` when unknown or unavailable.
    fn fetch_address(&self, lat: f64, lon: f64) -> Option<String>;
}

/// Used when no provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGeocoder;

impl Geocoder for NoopGeocoder {
    fn fetch_address(&self, _lat: f64, _lon: f64) -> Option<String> {
        None
    }
}

impl<G: Geocoder + ?Sized> Geocoder for Arc<G> {
    fn fetch_address(&self, lat: f64, lon: f64) -> Option<String> {
        (**self).fetch_address(lat, lon)
    }
}

/// Memoises answers per coordinate rounded to 5 decimals (about 1 m).
pub struct CachedGeocoder<G> {
    inner: G,
    cache: Mutex<HashMap<(i64, i64), Option<String>>>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn key(lat: f64, lon: f64) -> (i64, i64) {
        ((lat * 1e5).round() as i64, (lon * 1e5).round() as i64)
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    fn fetch_address(&self, lat: f64, lon: f64) -> Option<String> {
        let key = Self::key(lat, lon);
        if let Ok(cache) = self.cache.lock()
            && let Some(hit) = cache.get(&key)
        {
            debug!(lat, lon, "geocode cache hit");
            return hit.clone();
        }

        let value = self.inner.fetch_address(lat, lon);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, value.clone());
        }
        value
    }
}

/// Gives up on the inner provider after `timeout` and answers `None`.
///
/// The lookup runs on its own thread; a late answer is dropped.
pub struct TimeoutGeocoder<G> {
    inner: Arc<G>,
    timeout: Duration,
}

impl<G: Geocoder + 'static> TimeoutGeocoder<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }
}

impl<G: Geocoder + 'static> Geocoder for TimeoutGeocoder<G> {
    fn fetch_address(&self, lat: f64, lon: f64) -> Option<String> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            // receiver may be gone after a timeout
            let _ = tx.send(inner.fetch_address(lat, lon));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(address) => address,
            Err(_) => {
                warn!(
                    lat,
                    lon,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "geocoding timed out"
                );
                None
            }
        }
    }
}
