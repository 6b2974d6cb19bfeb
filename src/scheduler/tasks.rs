use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::election::{elect_new_server, ElectionOutcome};
use crate::error::Result;
use crate::ledger::{fake, LedgerQuery, QueryAnswer, QueryKind, Sale};
use crate::liveness::{Endpoint, Prober};
use crate::node::PeerContext;
use crate::registry::{Peer, Role};
use crate::scheduler::timer::random_role_interval;

/// What one seller/manager cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No server entry; nothing was done.
    NoServer,
    /// The server (or its absence) triggered an election.
    Failover(ElectionOutcome),
    /// Seller recorded a sale on the server.
    Submitted(Sale),
    /// Manager ran one query.
    Queried {
        query: LedgerQuery,
        answer: QueryAnswer,
    },
    /// Manager drew a query it could not parameterize this time.
    QuerySkipped(QueryKind),
}

pub(crate) async fn run(role: Role, ctx: Arc<PeerContext>, cancel: CancellationToken) {
    match role {
        Role::Server => server_loop(&ctx, &cancel).await,
        Role::Seller | Role::Manager => client_loop(role, &ctx, &cancel).await,
    }
}

async fn server_loop(ctx: &PeerContext, cancel: &CancellationToken) {
    let period = Duration::from_millis(ctx.config().server_heartbeat_ms.max(1));
    let mut heartbeat = interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let sales = ctx.ledger().read().await.len();
    tracing::info!(sales, "Ledger open");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = heartbeat.tick() => {
                let me = ctx.identity().await;
                let sales = ctx.ledger().read().await.len();
                tracing::info!(peer_id = %me.id, port = me.port, sales, "Server heartbeat");
            }
        }
    }
}

async fn client_loop(role: Role, ctx: &PeerContext, cancel: &CancellationToken) {
    let config = ctx.config();
    let period = random_role_interval(config.role_interval_min_ms, config.role_interval_max_ms);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::debug!(role = %role, period_ms = period.as_millis() as u64, "Client loop started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // A promotion cancels this task mid-cycle, including an election
        // that is waiting on this very peer's promotion endpoint.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = run_cycle(role, ctx) => match result {
                Ok(outcome) => tracing::debug!(role = %role, outcome = ?outcome, "Cycle done"),
                Err(e) => tracing::warn!(role = %role, error = %e, "Cycle failed"),
            },
        }
    }
}

/// One seller/manager cycle: find the server, check it, then either fail
/// over or make this role's ledger call.
pub async fn run_cycle(role: Role, ctx: &PeerContext) -> Result<CycleOutcome> {
    let server = match ctx.registry().find_server().await? {
        Some(server) => server,
        None if ctx.config().elect_on_missing_server => {
            tracing::info!("No server registered, electing one");
            let outcome = elect_new_server(ctx.registry(), ctx.prober()).await?;
            return Ok(CycleOutcome::Failover(outcome));
        }
        None => {
            tracing::debug!("No server registered, skipping cycle");
            return Ok(CycleOutcome::NoServer);
        }
    };

    if !ctx
        .prober()
        .probe(&server, Endpoint::Health)
        .await
        .is_reachable()
    {
        tracing::warn!(peer_id = %server.id, port = server.port, "Server is down");
        ctx.registry().remove_by_id(&server.id).await?;
        let outcome = elect_new_server(ctx.registry(), ctx.prober()).await?;
        return Ok(CycleOutcome::Failover(outcome));
    }

    match role {
        Role::Seller => submit_sale(ctx, &server).await,
        Role::Manager => run_query(ctx, &server).await,
        Role::Server => Ok(CycleOutcome::NoServer),
    }
}

async fn submit_sale(ctx: &PeerContext, server: &Peer) -> Result<CycleOutcome> {
    let me = ctx.identity().await;
    let sale = fake::sale(&me.id, &mut rand::thread_rng());
    tracing::info!(
        product = %sale.product,
        price = sale.price,
        date = %sale.date,
        "Recording sale"
    );
    ctx.ledger_client().submit_sale(server.port, &sale).await?;
    Ok(CycleOutcome::Submitted(sale))
}

async fn run_query(ctx: &PeerContext, server: &Peer) -> Result<CycleOutcome> {
    let sellers: Vec<String> = ctx
        .registry()
        .list()
        .await?
        .into_iter()
        .filter(|peer| peer.role == Role::Seller)
        .map(|peer| peer.id)
        .collect();

    let (kind, query) = {
        let mut rng = rand::thread_rng();
        let kind = QueryKind::random(&mut rng);
        (kind, LedgerQuery::for_kind(kind, &sellers, &mut rng))
    };
    let Some(query) = query else {
        tracing::debug!(kind = ?kind, "No seller registered, skipping query");
        return Ok(CycleOutcome::QuerySkipped(kind));
    };

    let answer = ctx.ledger_client().query(server.port, &query).await?;
    tracing::info!(query = ?query, answer = ?answer, "Ledger query answered");
    Ok(CycleOutcome::Queried { query, answer })
}
