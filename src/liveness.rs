use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use crate::config::PeerConfig;
use crate::error::Result;
use crate::registry::Peer;

/// Remote endpoint a probe targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /ping`
    Health,
    /// `GET /elect`, which promotes the receiver as a side effect.
    Promotion,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Health => "/ping",
            Endpoint::Promotion => "/elect",
        }
    }
}

/// Outcome of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Reachable,
    Unreachable,
}

impl Liveness {
    pub fn is_reachable(self) -> bool {
        self == Liveness::Reachable
    }
}

/// Issues one remote call against a peer and classifies the result.
pub trait Prober: Send + Sync {
    fn probe(&self, peer: &Peer, endpoint: Endpoint) -> impl Future<Output = Liveness> + Send;
}

/// HTTP prober used by real peers.
///
/// One attempt, no retry. Any transport failure or non-2xx status is
/// `Unreachable`; any 2xx response is `Reachable` whatever its body.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    host: String,
}

impl HttpProber {
    pub fn new(host: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            host: host.into(),
        })
    }

    pub fn from_config(config: &PeerConfig) -> Result<Self> {
        Self::new(config.host.clone(), config.probe_timeout())
    }

    fn url(&self, peer: &Peer, endpoint: Endpoint) -> String {
        format!("http://{}:{}{}", self.host, peer.port, endpoint.path())
    }
}

impl Prober for HttpProber {
    async fn probe(&self, peer: &Peer, endpoint: Endpoint) -> Liveness {
        let url = self.url(peer, endpoint);
        let result = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => Liveness::Reachable,
            Err(e) => {
                tracing::debug!(peer_id = %peer.id, url = %url, error = %e, "Probe failed");
                Liveness::Unreachable
            }
        }
    }
}
