use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a single peer process.
///
/// Every peer sharing a network must point at the same `registry_path`.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Shared registry snapshot (JSON array of peers).
    pub registry_path: PathBuf,
    /// Host used to bind this peer and to address every other peer.
    pub host: String,
    /// First port scanned at startup (inclusive).
    pub port_range_start: u16,
    /// Last port scanned at startup (inclusive).
    pub port_range_end: u16,
    /// Lower bound of the seller/manager period (inclusive).
    pub role_interval_min_ms: u64,
    /// Upper bound of the seller/manager period (exclusive).
    pub role_interval_max_ms: u64,
    /// Period of the server heartbeat log.
    pub server_heartbeat_ms: u64,
    /// Per-request probe timeout. `None` keeps the transport default.
    pub probe_timeout_ms: Option<u64>,
    /// Run an election when no server entry exists instead of skipping the cycle.
    pub elect_on_missing_server: bool,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("servers.json"),
            host: "127.0.0.1".to_string(),
            port_range_start: 3000,
            port_range_end: 3100,
            role_interval_min_ms: 15_000,
            role_interval_max_ms: 18_000,
            server_heartbeat_ms: 20_000,
            probe_timeout_ms: None,
            elect_on_missing_server: false,
        }
    }
}

impl PeerConfig {
    pub fn new(registry_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
            ..Default::default()
        }
    }

    pub fn with_port_range(mut self, start: u16, end: u16) -> Self {
        self.port_range_start = start;
        self.port_range_end = end;
        self
    }

    pub fn with_role_interval(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.role_interval_min_ms = min_ms;
        self.role_interval_max_ms = max_ms;
        self
    }

    pub fn with_probe_timeout(mut self, timeout_ms: u64) -> Self {
        self.probe_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn port_range(&self) -> RangeInclusive<u16> {
        self.port_range_start..=self.port_range_end
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_ms.map(Duration::from_millis)
    }

    /// Base URL of the peer listening on `port`.
    pub fn peer_url(&self, port: u16) -> String {
        format!("http://{}:{}", self.host, port)
    }
}
