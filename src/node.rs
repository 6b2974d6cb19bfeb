use std::collections::HashSet;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::config::PeerConfig;
use crate::error::{MeshError, Result};
use crate::ledger::{Ledger, LedgerClient};
use crate::liveness::HttpProber;
use crate::registry::{Peer, Registry, Role};
use crate::scheduler::RoleScheduler;

/// Everything one peer's components need, passed explicitly to each of them.
pub struct PeerContext {
    config: PeerConfig,
    identity: RwLock<Peer>,
    registry: Registry,
    prober: HttpProber,
    ledger: RwLock<Ledger>,
    ledger_client: LedgerClient,
    scheduler: RoleScheduler,
    promotion: Mutex<()>,
}

impl PeerContext {
    pub fn new(config: PeerConfig, identity: Peer) -> Result<Self> {
        let prober = HttpProber::from_config(&config)?;
        let ledger_client = LedgerClient::new(config.host.clone(), config.probe_timeout())?;
        Ok(Self {
            registry: Registry::new(config.registry_path.clone()),
            identity: RwLock::new(identity),
            prober,
            ledger: RwLock::new(Ledger::new()),
            ledger_client,
            scheduler: RoleScheduler::new(),
            promotion: Mutex::new(()),
            config,
        })
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    /// This peer's current registry entry.
    pub async fn identity(&self) -> Peer {
        self.identity.read().await.clone()
    }

    pub async fn role(&self) -> Role {
        self.identity.read().await.role
    }

    pub(crate) async fn set_identity(&self, peer: Peer) {
        *self.identity.write().await = peer;
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn prober(&self) -> &HttpProber {
        &self.prober
    }

    pub fn ledger(&self) -> &RwLock<Ledger> {
        &self.ledger
    }

    pub fn ledger_client(&self) -> &LedgerClient {
        &self.ledger_client
    }

    pub fn scheduler(&self) -> &RoleScheduler {
        &self.scheduler
    }

    /// Held for the whole of a promotion so concurrent `/elect` calls apply
    /// one after the other.
    pub(crate) fn promotion_lock(&self) -> &Mutex<()> {
        &self.promotion
    }
}

/// A running peer process: a bound listener plus its context.
pub struct PeerNode {
    ctx: Arc<PeerContext>,
    listener: TcpListener,
}

impl PeerNode {
    /// Bring a peer up.
    ///
    /// 1. Claims the first port in the configured range that no registry
    ///    entry holds and that can be bound
    /// 2. Picks the initial role (`role`, or seller/manager at random)
    /// 3. Registers itself at the end of the registry
    /// 4. Installs the role task
    ///
    /// # Errors
    ///
    /// [`MeshError::NoFreePort`] when the whole range is taken; registry
    /// errors are propagated.
    pub async fn start(config: PeerConfig, role: Option<Role>) -> Result<Self> {
        let listener = claim_port(&config, &Registry::new(config.registry_path.clone())).await?;
        let port = listener.local_addr()?.port();
        let role = role.unwrap_or_else(|| Role::random_client(&mut rand::thread_rng()));
        let me = Peer::new(Peer::generate_name(), role, port);

        let ctx = Arc::new(PeerContext::new(config, me.clone())?);
        ctx.registry().append(me.clone()).await?;
        ctx.scheduler().switch_to(role, ctx.clone()).await;

        tracing::info!(peer_id = %me.id, role = %me.role, port, "Peer registered");
        Ok(Self { ctx, listener })
    }

    pub fn context(&self) -> Arc<PeerContext> {
        self.ctx.clone()
    }

    pub fn port(&self) -> Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Serve the peer's HTTP surface until `shutdown` fires, then stop the
    /// role task. The registry entry is left in place; other peers evict it
    /// once it stops answering.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let app = api::router(self.ctx.clone());
        let addr = self.listener.local_addr()?;
        tracing::info!(addr = %addr, "Serving peer endpoints");

        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        if let Some(role) = self.ctx.scheduler().cancel().await {
            tracing::info!(role = %role, "Role task stopped");
        }
        Ok(())
    }
}

async fn claim_port(config: &PeerConfig, registry: &Registry) -> Result<TcpListener> {
    let taken: HashSet<u16> = registry.list().await?.iter().map(|p| p.port).collect();

    for port in config.port_range() {
        if taken.contains(&port) {
            continue;
        }
        match TcpListener::bind((config.host.as_str(), port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                tracing::debug!(port, error = %e, "Port not bindable, trying next");
            }
        }
    }

    Err(MeshError::NoFreePort {
        start: config.port_range_start,
        end: config.port_range_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[tokio::test]
    async fn claim_port_skips_registered_ports() {
        let dir = tempfile::tempdir().unwrap();
        let port = free_port();
        let config = PeerConfig::new(dir.path().join("servers.json"))
            .with_port_range(port, port.saturating_add(20));
        let registry = Registry::new(config.registry_path.clone());
        registry
            .append(Peer::new("taken", Role::Seller, port))
            .await
            .unwrap();

        let listener = claim_port(&config, &registry).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn claim_port_fails_when_range_is_registered() {
        let dir = tempfile::tempdir().unwrap();
        let port = free_port();
        let config =
            PeerConfig::new(dir.path().join("servers.json")).with_port_range(port, port);
        let registry = Registry::new(config.registry_path.clone());
        registry
            .append(Peer::new("taken", Role::Manager, port))
            .await
            .unwrap();

        let err = claim_port(&config, &registry).await.unwrap_err();
        assert!(matches!(err, MeshError::NoFreePort { start, end } if start == port && end == port));
    }
}
