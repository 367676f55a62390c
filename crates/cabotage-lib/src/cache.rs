//! Persistent memoization of routing and geocoding lookups.
//!
//! [`RouteCache`] is a `get_or_fetch` capability keyed by origin,
//! destination and profile. [`SqliteRouteCache`] stores payloads as JSON in
//! SQLite so entries survive restarts, and collapses concurrent requests for
//! the same key into a single fetch. [`CachedRouter`] and [`CachedResolver`]
//! put the cache in front of a routing client and an address resolver.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Condvar, Mutex};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::{Location, Point};
use crate::routing::{AddressResolver, RouteProfile, RouteResponse, RoutingClient};

/// Profile component used for geocoding keys.
pub const GEOCODE_PROFILE: &str = "geocode";

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Identifies one cached lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub origin: String,
    pub destination: String,
    pub profile: String,
    digest: String,
}

impl CacheKey {
    /// Build a key; components are trimmed, whitespace-collapsed and lower-cased.
    pub fn new(origin: &str, destination: &str, profile: &str) -> Self {
        let origin = normalize_component(origin);
        let destination = normalize_component(destination);
        let profile = normalize_component(profile);

        let mut hasher = Sha256::new();
        hasher.update(origin.as_bytes());
        hasher.update([0u8]);
        hasher.update(destination.as_bytes());
        hasher.update([0u8]);
        hasher.update(profile.as_bytes());
        let digest = hex::encode(hasher.finalize());

        Self {
            origin,
            destination,
            profile,
            digest,
        }
    }

    /// Key for a road route between two points.
    pub fn for_route(origin: &Point, destination: &Point, profile: RouteProfile) -> Self {
        Self::new(
            &origin.coordinates.cache_repr(),
            &destination.coordinates.cache_repr(),
            profile.as_str(),
        )
    }

    /// Key for a geocoding query.
    pub fn for_geocode(query: &str) -> Self {
        Self::new(query, "", GEOCODE_PROFILE)
    }

    /// Hex SHA-256 of the normalized components.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

fn normalize_component(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Successful and failed calls to the fetch function.
    pub fetches: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Memoizing store for expensive lookups.
pub trait RouteCache: Send + Sync {
    /// Return the fresh entry for `key`, or run `fetch`, persist its result and
    /// return it. A failing `fetch` writes nothing.
    fn get_or_fetch(
        &self,
        key: &CacheKey,
        fetch: &mut dyn FnMut() -> Result<serde_json::Value>,
    ) -> Result<serde_json::Value>;

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// Typed wrapper over [`RouteCache::get_or_fetch`].
pub fn get_or_fetch_as<T, F>(cache: &dyn RouteCache, key: &CacheKey, fetch: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T>,
{
    let mut fetch = Some(fetch);
    let mut erased = || -> Result<serde_json::Value> {
        let f = fetch.take().ok_or_else(|| Error::CachePayload {
            key: key.digest().to_string(),
            message: "fetch invoked more than once".to_string(),
        })?;
        Ok(serde_json::to_value(f()?)?)
    };
    let value = cache.get_or_fetch(key, &mut erased)?;
    serde_json::from_value(value).map_err(|err| Error::CachePayload {
        key: key.digest().to_string(),
        message: err.to_string(),
    })
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS route_cache (
    key         TEXT PRIMARY KEY,
    origin      TEXT NOT NULL,
    destination TEXT NOT NULL,
    profile     TEXT NOT NULL,
    payload     TEXT NOT NULL,
    created_at  INTEGER NOT NULL
);
";

/// SQLite-backed [`RouteCache`].
pub struct SqliteRouteCache {
    conn: Mutex<Connection>,
    ttl: Option<Duration>,
    in_flight: Mutex<HashSet<String>>,
    slot_released: Condvar,
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteRouteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRouteCache")
            .field("path", &self.path)
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Releases an in-flight slot when dropped, including on error paths.
struct SlotGuard<'a> {
    cache: &'a SqliteRouteCache,
    digest: String,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.cache.in_flight.lock().remove(&self.digest);
        self.cache.slot_released.notify_all();
    }
}

impl SqliteRouteCache {
    /// Open (creating if needed) a cache database at `path`.
    pub fn open(path: &Path, ttl: Option<Duration>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let mut cache = Self::with_connection(conn, ttl)?;
        cache.path = Some(path.to_path_buf());
        info!(path = %path.display(), entries = cache.len()?, "opened route cache");
        Ok(cache)
    }

    /// Volatile cache for tests and one-off runs.
    pub fn open_in_memory(ttl: Option<Duration>) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, ttl)
    }

    fn with_connection(conn: Connection, ttl: Option<Duration>) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ttl,
            in_flight: Mutex::new(HashSet::new()),
            slot_released: Condvar::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM route_cache", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Fresh payload for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Result<Option<serde_json::Value>> {
        let row: Option<(String, i64)> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT payload, created_at FROM route_cache WHERE key = ?1",
                params![key.digest()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
        };

        let Some((payload, created_at)) = row else {
            return Ok(None);
        };
        if !self.is_fresh(created_at) {
            debug!(key = key.digest(), "cache entry expired");
            return Ok(None);
        }
        match serde_json::from_str(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key = key.digest(), error = %err, "discarding unreadable cache entry");
                Ok(None)
            }
        }
    }

    /// Insert or replace the entry for `key`.
    pub fn put(&self, key: &CacheKey, payload: &serde_json::Value) -> Result<()> {
        self.store(key, payload).map(|_| ())
    }

    /// Persist `payload` and return the exact text written.
    fn store(&self, key: &CacheKey, payload: &serde_json::Value) -> Result<String> {
        let payload = serde_json::to_string(payload)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO route_cache (key, origin, destination, profile, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                created_at = excluded.created_at",
            params![
                key.digest(),
                key.origin,
                key.destination,
                key.profile,
                payload,
                Utc::now().timestamp()
            ],
        )?;
        Ok(payload)
    }

    /// Delete entries older than the TTL. Returns the number removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let Some(ttl) = self.ttl else {
            return Ok(0);
        };
        let cutoff = Utc::now().timestamp() - ttl.as_secs() as i64;
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM route_cache WHERE created_at < ?1",
            params![cutoff],
        )?;
        Ok(removed)
    }

    fn is_fresh(&self, created_at: i64) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => Utc::now().timestamp() - created_at < ttl.as_secs() as i64,
        }
    }

    fn acquire_slot(&self, key: &CacheKey) -> SlotGuard<'_> {
        let digest = key.digest().to_string();
        let mut in_flight = self.in_flight.lock();
        while in_flight.contains(&digest) {
            debug!(key = %digest, "waiting for in-flight fetch");
            self.slot_released.wait(&mut in_flight);
        }
        in_flight.insert(digest.clone());
        SlotGuard {
            cache: self,
            digest,
        }
    }
}

impl RouteCache for SqliteRouteCache {
    fn get_or_fetch(
        &self,
        key: &CacheKey,
        fetch: &mut dyn FnMut() -> Result<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        if let Some(value) = self.get(key)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = key.digest(), profile = %key.profile, "cache hit");
            return Ok(value);
        }

        let _slot = self.acquire_slot(key);

        // Another caller may have filled the entry while we waited.
        if let Some(value) = self.get(key)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = key.digest(), "cache hit after wait");
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        self.fetches.fetch_add(1, Ordering::Relaxed);
        debug!(
            key = key.digest(),
            origin = %key.origin,
            destination = %key.destination,
            profile = %key.profile,
            "cache miss; fetching"
        );
        let value = fetch()?;
        let stored = self.store(key, &value)?;
        // Hand back what a later hit will read, so cold and warm agree bit for bit.
        Ok(serde_json::from_str(&stored)?)
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }
}

/// Routing client that consults a [`RouteCache`] before the inner client.
pub struct CachedRouter<R> {
    inner: R,
    cache: Arc<dyn RouteCache>,
}

impl<R: RoutingClient> CachedRouter<R> {
    pub fn new(inner: R, cache: Arc<dyn RouteCache>) -> Self {
        Self { inner, cache }
    }
}

impl<R: RoutingClient> RoutingClient for CachedRouter<R> {
    fn route(
        &self,
        origin: &Point,
        destination: &Point,
        profile: RouteProfile,
    ) -> Result<RouteResponse> {
        let key = CacheKey::for_route(origin, destination, profile);
        get_or_fetch_as(self.cache.as_ref(), &key, || {
            self.inner.route(origin, destination, profile)
        })
    }
}

/// Address resolver that caches geocoded text and postal codes. Coordinates
/// bypass the cache.
pub struct CachedResolver<R> {
    inner: R,
    cache: Arc<dyn RouteCache>,
}

impl<R: AddressResolver> CachedResolver<R> {
    pub fn new(inner: R, cache: Arc<dyn RouteCache>) -> Self {
        Self { inner, cache }
    }
}

impl<R: AddressResolver> AddressResolver for CachedResolver<R> {
    fn resolve(&self, location: &Location) -> Result<Point> {
        match location {
            Location::Coordinates(_) => self.inner.resolve(location),
            Location::PostalCode(_) | Location::Text(_) => {
                let key = CacheKey::for_geocode(&location.cache_repr());
                get_or_fetch_as(self.cache.as_ref(), &key, || self.inner.resolve(location))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_normalizes_components() {
        let a = CacheKey::new("  Recife,   PE ", "-23.5,-46.6", "driving-hgv");
        let b = CacheKey::new("recife, pe", "-23.5,-46.6", "DRIVING-HGV");
        assert_eq!(a, b);
        assert_eq!(a.digest().len(), 64);
        assert_ne!(a.digest(), CacheKey::new("recife, pe", "-23.5,-46.6", "driving-car").digest());
    }

    #[test]
    fn expired_entries_are_refetched() {
        let cache = SqliteRouteCache::open_in_memory(Some(Duration::from_secs(0))).unwrap();
        let key = CacheKey::new("a", "b", "driving-hgv");
        let mut calls = 0;
        for _ in 0..2 {
            let value = cache
                .get_or_fetch(&key, &mut || {
                    calls += 1;
                    Ok(serde_json::json!({"distance_km": 1.0}))
                })
                .unwrap();
            assert_eq!(value["distance_km"], 1.0);
        }
        assert_eq!(calls, 2);
        assert_eq!(cache.len().unwrap(), 1);
    }
}
