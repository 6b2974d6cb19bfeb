//! Ledger routes, mounted on every peer but answering only on the server.
//!
//! | Method/Path | Success | Failure |
//! |---|---|---|
//! | `POST /create` | 201 | 400 missing field, unknown product or bad date |
//! | `GET /total/seller/:id` | 200 `{count}` | 400 empty id |
//! | `GET /total/product/:id` | 200 `{count}` | 400 empty id |
//! | `GET /total/range/:start/:end` | 200 `{count}` | 400 missing or non `YYYY-MM-DD` bound |
//! | `GET /best/seller` | 200 `{name, count}` or `null` | |
//! | `GET /best/product` | 200 `{product, count}` or `null` | |

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::ledger::{is_catalog_product, CountResponse, Sale};
use crate::node::PeerContext;
use crate::registry::Role;

pub fn routes(ctx: Arc<PeerContext>) -> Router<Arc<PeerContext>> {
    Router::new()
        .route("/create", post(create_handler))
        .route("/total/seller/:id", get(total_seller_handler))
        .route("/total/product/:id", get(total_product_handler))
        .route("/total/range/:start/:end", get(total_range_handler))
        .route("/best/seller", get(best_seller_handler))
        .route("/best/product", get(best_product_handler))
        .route_layer(middleware::from_fn_with_state(ctx, require_server))
}

async fn require_server(
    State(ctx): State<Arc<PeerContext>>,
    request: Request,
    next: Next,
) -> Response {
    if ctx.role().await != Role::Server {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

/// Body of `POST /create`. Every field is optional here so that a missing
/// one maps to 400 instead of the extractor's 422.
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub name: Option<String>,
    pub product: Option<String>,
    pub price: Option<u32>,
    pub date: Option<String>,
}

fn bad_request(message: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, message).into_response()
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` taken at midnight UTC.
fn parse_sale_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    parse_day(raw).map(|day| day.and_time(NaiveTime::MIN).and_utc())
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

async fn create_handler(
    State(ctx): State<Arc<PeerContext>>,
    payload: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return bad_request("Missing fields");
    };

    let (Some(name), Some(product), Some(price), Some(date)) = (
        present(&request.name),
        present(&request.product),
        request.price,
        present(&request.date),
    ) else {
        return bad_request("Missing fields");
    };

    tracing::info!(seller = %name, product, "Seller recording a sale");

    if !is_catalog_product(product) {
        return bad_request("Invalid product");
    }
    let Some(date) = parse_sale_date(date) else {
        return bad_request("Invalid date");
    };

    ctx.ledger().write().await.record(Sale {
        name: name.to_string(),
        product: product.to_string(),
        price,
        date,
    });

    (StatusCode::CREATED, "Created").into_response()
}

async fn total_seller_handler(
    State(ctx): State<Arc<PeerContext>>,
    Path(id): Path<String>,
) -> Response {
    if id.trim().is_empty() {
        return bad_request("Missing fields");
    }
    tracing::info!(seller = %id, "Manager querying total by seller");
    let count = ctx.ledger().read().await.total_by_seller(&id);
    Json(CountResponse { count }).into_response()
}

async fn total_product_handler(
    State(ctx): State<Arc<PeerContext>>,
    Path(id): Path<String>,
) -> Response {
    if id.trim().is_empty() {
        return bad_request("Missing fields");
    }
    tracing::info!(product = %id, "Manager querying total by product");
    let count = ctx.ledger().read().await.total_by_product(&id);
    Json(CountResponse { count }).into_response()
}

async fn total_range_handler(
    State(ctx): State<Arc<PeerContext>>,
    Path((start, end)): Path<(String, String)>,
) -> Response {
    if start.trim().is_empty() || end.trim().is_empty() {
        return bad_request("Missing fields");
    }
    let (Some(from), Some(to)) = (parse_day(&start), parse_day(&end)) else {
        return bad_request("Invalid date");
    };
    tracing::info!(%from, %to, "Manager querying total by date range");
    let count = ctx.ledger().read().await.total_in_range(from, to);
    Json(CountResponse { count }).into_response()
}

async fn best_seller_handler(State(ctx): State<Arc<PeerContext>>) -> Response {
    tracing::info!("Manager querying best seller");
    Json(ctx.ledger().read().await.best_seller()).into_response()
}

async fn best_product_handler(State(ctx): State<Arc<PeerContext>>) -> Response {
    tracing::info!("Manager querying best product");
    Json(ctx.ledger().read().await.best_product()).into_response()
}
