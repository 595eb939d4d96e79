//! Process-wide host name to address cache.
//!
//! Lookups are remembered for the life of the process. There is no
//! eviction; entries are a host name and an address.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::sync::Mutex;

use forg_types::error::{ForgError, Result};

/// Cache of resolved host addresses, shared between transports.
#[derive(Debug, Default)]
pub struct HostCache {
    entries: Mutex<HashMap<String, IpAddr>>,
}

impl HostCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached address for `host`, if any.
    pub fn get(&self, host: &str) -> Option<IpAddr> {
        self.lock().get(host).copied()
    }

    /// Record an address for `host`.
    pub fn insert(&self, host: &str, addr: IpAddr) {
        self.lock().insert(host.to_string(), addr);
    }

    /// Number of cached hosts.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Resolve `host:port`, consulting the cache first and populating it
    /// on a miss.
    pub fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr> {
        if let Some(ip) = self.get(host) {
            log::debug!("Host cache hit for {host}: {ip}");
            return Ok(SocketAddr::new(ip, port));
        }

        log::debug!("Looking up {host}");
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| ForgError::Connection(format!("Cannot lookup {host}: {e}")))?
            .next()
            .ok_or_else(|| ForgError::Connection(format!("no addresses for {host}:{port}")))?;

        self.insert(host, addr.ip());
        Ok(addr)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, IpAddr>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn empty_by_default() {
        let cache = HostCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("gopher.floodgap.com").is_none());
    }

    #[test]
    fn resolve_uses_cached_entry() {
        let cache = HostCache::new();
        // Not a resolvable name: only the cache can answer.
        cache.insert("no-such-host.invalid", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)));
        let addr = cache.resolve("no-such-host.invalid", 7070).unwrap();
        assert_eq!(addr, "10.0.0.7:7070".parse().unwrap());
    }

    #[test]
    fn resolve_populates_cache() {
        let cache = HostCache::new();
        let addr = cache.resolve("127.0.0.1", 70).unwrap();
        assert_eq!(addr.port(), 70);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("127.0.0.1"), Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    }

    #[test]
    fn lookup_failure_is_connection_error() {
        let cache = HostCache::new();
        let err = cache.resolve("definitely-not-a-host.invalid", 70).unwrap_err();
        assert!(matches!(err, ForgError::Connection(_)));
        assert!(cache.is_empty());
    }
}
