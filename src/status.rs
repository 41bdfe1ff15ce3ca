//! Status cache: most-recently-observed status per device, with a
//! freshness lease so routing does not hammer slow hardware.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::{Control as ControlTrait, DeviceStatus, Error, Registry};

/// How long a successful status observation stays fresh.
pub const STATUS_TTL: Duration = Duration::from_secs(30);

/// How long one device gets to answer a status query before it is
/// declared offline for this round.
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

struct CacheEntry {
    status: DeviceStatus,
    fetched_at: Instant,
    /// Whether the backing query succeeded. A failed observation is
    /// served to concurrent readers but carries no freshness lease, so
    /// the next read retries the device.
    ok: bool,
}

/// Caches per-device status on top of a [Registry].
///
/// Reads within the TTL are served from memory; a miss or an expired
/// entry triggers one query against the device. A device that fails or
/// times out is reported offline rather than erroring the read.
pub struct StatusCache {
    registry: Arc<Registry>,
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl StatusCache {
    /// A cache over the given registry with the default TTL.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_ttl(registry, STATUS_TTL)
    }

    /// A cache with an explicit TTL.
    pub fn with_ttl(registry: Arc<Registry>, ttl: Duration) -> Self {
        Self {
            registry,
            entries: DashMap::new(),
            ttl,
        }
    }

    /// The registry this cache reads from.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The status of one device, from cache when fresh.
    ///
    /// Fails only with [Error::UnknownDevice]; an unreachable device
    /// yields an offline status, not an error.
    pub async fn get_status(&self, id: &str) -> Result<DeviceStatus, Error> {
        if let Some(entry) = self.entries.get(id) {
            if entry.ok && entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.status.clone());
            }
        }
        self.refresh(id).await
    }

    /// The status of every registered device, polled concurrently.
    /// Order follows [Registry::list_devices].
    pub async fn get_all_statuses(&self) -> Vec<(String, DeviceStatus)> {
        let ids = self.registry.list_devices();
        let lookups = ids.iter().map(|id| self.get_status(id));
        let statuses = futures::future::join_all(lookups).await;

        ids.into_iter()
            .zip(statuses)
            // Every id came from the registry, so lookups cannot fail.
            .filter_map(|(id, status)| status.ok().map(|s| (id, s)))
            .collect()
    }

    /// Drop the cached entry for a device, forcing the next read to hit
    /// the hardware.
    pub fn invalidate(&self, id: &str) {
        self.entries.remove(id);
    }

    async fn refresh(&self, id: &str) -> Result<DeviceStatus, Error> {
        let driver = self.registry.get_driver(id)?;

        let queried = {
            let mut driver = driver.lock().await;
            tokio::time::timeout(QUERY_TIMEOUT, driver.status()).await
        };

        let (status, ok) = match queried {
            Ok(Ok(status)) => (status, true),
            Ok(Err(err)) => {
                tracing::warn!(device = id, error = %err, "status query failed");
                (DeviceStatus::offline(), false)
            }
            Err(_) => {
                tracing::warn!(device = id, "status query timed out");
                (DeviceStatus::offline(), false)
            }
        };

        self.entries.insert(
            id.to_owned(),
            CacheEntry {
                status: status.clone(),
                fetched_at: Instant::now(),
                ok,
            },
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AnyDriver, DeviceCapabilities, DeviceClass, DeviceState, JobMode, Volume,
    };

    fn test_registry() -> Registry {
        let mut registry = Registry::from_config(&crate::Config::default());
        registry.insert(
            "bench".to_owned(),
            crate::noop::Noop::new(crate::noop::Config {
                capabilities: DeviceCapabilities {
                    class: DeviceClass::Noop,
                    modes: vec![JobMode::AdditivePrint],
                    envelope: Volume {
                        width: 100.0,
                        depth: 100.0,
                        height: 100.0,
                    },
                    quality_tier: 1,
                },
            })
            .into(),
        );
        registry
    }

    fn status_queries(driver: &AnyDriver) -> usize {
        match driver {
            AnyDriver::Noop(noop) => noop.history.iter().filter(|op| **op == "status").count(),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_is_served_from_cache() {
        let registry = Arc::new(test_registry());
        let cache = StatusCache::new(registry.clone());

        let first = cache.get_status("bench").await.unwrap();
        assert_eq!(first.state, DeviceState::Idle);
        let second = cache.get_status("bench").await.unwrap();
        assert_eq!(second.state, DeviceState::Idle);

        let driver = registry.get_driver("bench").unwrap();
        assert_eq!(status_queries(&*driver.lock().await), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let registry = Arc::new(test_registry());
        let cache = StatusCache::with_ttl(registry.clone(), Duration::from_millis(0));

        cache.get_status("bench").await.unwrap();
        cache.get_status("bench").await.unwrap();

        let driver = registry.get_driver("bench").unwrap();
        assert_eq!(status_queries(&*driver.lock().await), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_requery() {
        let registry = Arc::new(test_registry());
        let cache = StatusCache::new(registry.clone());

        cache.get_status("bench").await.unwrap();
        cache.invalidate("bench");
        cache.get_status("bench").await.unwrap();

        let driver = registry.get_driver("bench").unwrap();
        assert_eq!(status_queries(&*driver.lock().await), 2);
    }

    #[tokio::test]
    async fn test_unknown_device_errors() {
        let cache = StatusCache::new(Arc::new(test_registry()));
        let err = cache.get_status("ghost").await.unwrap_err();
        assert!(matches!(err, Error::UnknownDevice(_)));
    }

    #[tokio::test]
    async fn test_all_statuses_covers_fleet() {
        let registry = Arc::new(test_registry());
        let cache = StatusCache::new(registry);

        let statuses = cache.get_all_statuses().await;
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].0, "bench");
        assert!(statuses[0].1.online);
    }
}
