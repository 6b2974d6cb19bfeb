//! Server failover.
//!
//! There are no terms, votes or quorum here: the first candidate in registry
//! order that answers its promotion endpoint becomes the server, and every
//! candidate probed before it that did not answer is evicted for good.
//!
//! Nothing prevents two peers from running an election at the same time, so
//! two servers can end up in the registry. Lookups take the first one.

use std::sync::Arc;

use crate::error::Result;
use crate::liveness::{Endpoint, Prober};
use crate::node::PeerContext;
use crate::registry::{Peer, Registry, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElectionOutcome {
    /// The winner's registry entry as read right after it accepted promotion.
    Elected(Peer),
    /// Every candidate was unreachable and has been evicted.
    Exhausted,
}

/// Walk the registry in order and promote the first candidate that answers.
pub async fn elect_new_server<P: Prober>(registry: &Registry, prober: &P) -> Result<ElectionOutcome> {
    let candidates = registry.list().await?;
    tracing::info!(candidates = candidates.len(), "Electing server");

    for candidate in candidates {
        if prober
            .probe(&candidate, Endpoint::Promotion)
            .await
            .is_reachable()
        {
            // The winner rewrote its own entry; report it by port since its id changed.
            let winner = registry
                .list()
                .await?
                .into_iter()
                .find(|peer| peer.port == candidate.port)
                .unwrap_or(candidate);
            tracing::info!(peer_id = %winner.id, port = winner.port, "Server elected");
            return Ok(ElectionOutcome::Elected(winner));
        }

        tracing::warn!(peer_id = %candidate.id, port = candidate.port, "Candidate down, evicting");
        registry.remove_by_id(&candidate.id).await?;
    }

    tracing::warn!("Election exhausted, no server available");
    Ok(ElectionOutcome::Exhausted)
}

/// Turn this peer into the server.
///
/// Cancels the current role task, takes a fresh identity, rewrites this
/// peer's registry entry in place and installs the server task. Promotions
/// of one peer never overlap, so its identity and its entry stay in step.
pub async fn promote(ctx: &Arc<PeerContext>) -> Result<Peer> {
    let _promoting = ctx.promotion_lock().lock().await;

    if let Some(previous) = ctx.scheduler().cancel().await {
        tracing::debug!(role = %previous, "Cancelled role task for promotion");
    }

    let current = ctx.identity().await;
    let promoted = current.promoted();

    if !ctx.registry().replace(&current.id, promoted.clone()).await? {
        tracing::warn!(
            peer_id = %current.id,
            "Own registry entry is gone; serving without being listed"
        );
    }
    ctx.set_identity(promoted.clone()).await;
    ctx.scheduler().switch_to(Role::Server, ctx.clone()).await;

    tracing::info!(
        old_id = %current.id,
        peer_id = %promoted.id,
        port = promoted.port,
        "Promoted to server"
    );
    Ok(promoted)
}
