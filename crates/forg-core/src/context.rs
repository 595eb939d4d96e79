//! Shared client state passed to every component at construction.

use std::sync::Arc;

use forg_net::{HostCache, StopFlag, Transport, TransportConfig};
use forg_types::ForgConfig;

use crate::cache::DiskCache;
use crate::connection::GopherConnection;

/// Options, the host address cache and the stop flag.
///
/// Clones share the host cache and the stop flag.
#[derive(Debug, Clone, Default)]
pub struct ForgContext {
    pub config: ForgConfig,
    pub hosts: Arc<HostCache>,
    pub stop: StopFlag,
}

impl ForgContext {
    pub fn new(config: ForgConfig) -> Self {
        Self {
            config,
            hosts: Arc::new(HostCache::new()),
            stop: StopFlag::new(),
        }
    }

    /// A transport sharing this context's host cache and stop flag.
    pub fn transport(&self) -> Transport {
        Transport::new(
            Arc::clone(&self.hosts),
            self.stop.clone(),
            TransportConfig::from_config(&self.config),
        )
    }

    pub fn connection(&self) -> GopherConnection {
        GopherConnection::new(self.transport(), &self.config)
    }

    pub fn cache(&self) -> DiskCache {
        DiskCache::new(self.config.cache_directory.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn clones_share_hosts_and_stop_flag() {
        let ctx = ForgContext::new(ForgConfig::default());
        let other = ctx.clone();
        other.hosts.insert("example.org", IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(ctx.hosts.len(), 1);

        let transport = ctx.transport();
        other.stop.stop();
        assert!(!transport.stop_flag().may_continue());
    }

    #[test]
    fn cache_uses_configured_root() {
        let config = ForgConfig {
            cache_directory: "/tmp/forg-test-cache".into(),
            ..ForgConfig::default()
        };
        let ctx = ForgContext::new(config);
        assert_eq!(ctx.cache().root(), std::path::Path::new("/tmp/forg-test-cache"));
    }
}
