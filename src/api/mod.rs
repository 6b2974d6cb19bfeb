//! HTTP surface of a peer.
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /ping` | liveness, answers `pong` |
//! | `GET /elect` | promotion, always answers `ok` |
//! | ledger routes | see [`ledger`]; only while this peer is the server |

pub mod ledger;

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::election;
use crate::node::PeerContext;

pub fn router(ctx: Arc<PeerContext>) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/elect", get(elect_handler))
        .merge(ledger::routes(ctx.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn ping_handler() -> &'static str {
    "pong"
}

/// Promotion faults are logged and swallowed; the caller always sees
/// success and stops its election here.
///
/// The promotion runs on its own task. When the caller is this peer's own
/// role task, promotion cancels it, the connection drops with it, and the
/// handler future goes away; the promotion must still finish.
async fn elect_handler(State(ctx): State<Arc<PeerContext>>) -> &'static str {
    let promotion = tokio::spawn(async move { election::promote(&ctx).await });
    match promotion.await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Promotion failed"),
        Err(e) => tracing::error!(error = %e, "Promotion task aborted"),
    }
    "ok"
}
