use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::application::projector::{OrderResponse, SimpleOrderResponse};
use crate::domain::errors::DomainError;
use crate::domain::fetch::{FetchStrategy, OrderFilter, Page, StrategyRequest};
use crate::domain::model::OrderStatus;
use crate::errors::AppError;
use crate::infrastructure::order_store::{read_snapshot, read_write};

use super::{AppState, CreatedResponse};

pub const QUERY_COUNT_HEADER: &str = "x-query-count";
pub const STRATEGY_HEADER: &str = "x-fetch-strategy";

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersParams {
    pub strategy: Option<FetchStrategy>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<OrderStatus>,
    pub member_name: Option<String>,
}

impl ListOrdersParams {
    fn filter(&self) -> OrderFilter {
        OrderFilter {
            order_id: None,
            status: self.status,
            member_name: self.member_name.clone(),
        }
    }

    /// A page only when the caller asked for one; `limit` is clamped to
    /// `max_page_size`.
    fn page(&self, max_page_size: i64) -> Option<Page> {
        if self.offset.is_none() && self.limit.is_none() {
            return None;
        }
        let limit = self.limit.unwrap_or(max_page_size).min(max_page_size);
        Some(Page::new(self.offset.unwrap_or(0), limit))
    }
}

#[derive(Debug, Deserialize)]
pub struct StrategyParam {
    pub strategy: Option<FetchStrategy>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub member_id: Uuid,
    pub item_id: Uuid,
    pub count: i32,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/orders
///
/// Reads orders with their member, delivery and order items through the
/// chosen fetch strategy. All queries run in one read-only transaction; the
/// number issued is returned in the `x-query-count` header.
#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("strategy" = Option<FetchStrategy>, Query, description = "Fetch strategy (default from configuration)"),
        ("offset" = Option<i64>, Query, description = "Orders to skip"),
        ("limit" = Option<i64>, Query, description = "Maximum orders to return, clamped to MAX_PAGE_SIZE"),
        ("status" = Option<OrderStatus>, Query, description = "Only orders in this status"),
        ("member_name" = Option<String>, Query, description = "Substring of the member name"),
    ),
    responses(
        (status = 200, description = "Orders read", body = Vec<OrderResponse>),
        (status = 400, description = "Strategy cannot serve the request, e.g. paging a collection fetch-join"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let mut request = StrategyRequest::new(params.strategy.unwrap_or(state.default_strategy))
        .with_filter(params.filter());
    if let Some(page) = params.page(state.max_page_size) {
        request = request.with_page(page);
    }
    request.validate().map_err(DomainError::from)?;

    let outcome = web::block(move || {
        let mut conn = state.pool.get()?;
        read_snapshot(&mut conn, |store| state.queries.find_orders(store, &request))
    })
    .await??;

    Ok(HttpResponse::Ok()
        .insert_header((QUERY_COUNT_HEADER, outcome.query_count.to_string()))
        .insert_header((STRATEGY_HEADER, outcome.strategy.name()))
        .json(outcome.orders))
}

/// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("strategy" = Option<FetchStrategy>, Query, description = "Fetch strategy (default from configuration)"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<StrategyParam>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let strategy = query.strategy.unwrap_or(state.default_strategy);

    let order = web::block(move || {
        let mut conn = state.pool.get()?;
        read_snapshot(&mut conn, |store| {
            state.queries.find_order(store, order_id, strategy)
        })
    })
    .await??;

    match order {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(AppError::NotFound),
    }
}

/// GET /api/simple-orders
///
/// Orders with member name and delivery address only.
#[utoipa::path(
    get,
    path = "/api/simple-orders",
    params(
        ("offset" = Option<i64>, Query, description = "Orders to skip"),
        ("limit" = Option<i64>, Query, description = "Maximum orders to return"),
        ("status" = Option<OrderStatus>, Query, description = "Only orders in this status"),
        ("member_name" = Option<String>, Query, description = "Substring of the member name"),
    ),
    responses(
        (status = 200, description = "Orders read", body = Vec<SimpleOrderResponse>),
        (status = 400, description = "Invalid page"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_simple_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let filter = params.filter();
    let page = params.page(state.max_page_size);
    if let Some(page) = &page {
        page.validate().map_err(DomainError::from)?;
    }

    let orders = web::block(move || {
        let mut conn = state.pool.get()?;
        read_snapshot(&mut conn, |store| {
            state.queries.find_simple_orders(store, &filter, page.as_ref())
        })
    })
    .await??;

    Ok(HttpResponse::Ok().json(orders))
}

/// POST /api/orders
///
/// Orders `count` units of one item at its current price. Stock removal and
/// the order insert commit together.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = CreatedResponse),
        (status = 400, description = "Invalid count or not enough stock"),
        (status = 404, description = "Member or item not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let id = web::block(move || {
        let mut conn = state.pool.get()?;
        read_write(&mut conn, |store| {
            OrderService::new(store).place_order(body.member_id, body.item_id, body.count)
        })
    })
    .await??;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// POST /api/orders/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 204, description = "Order cancelled and stock restored"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already cancelled or delivered"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    web::block(move || {
        let mut conn = state.pool.get()?;
        read_write(&mut conn, |store| OrderService::new(store).cancel_order(order_id))
    })
    .await??;

    Ok(HttpResponse::NoContent().finish())
}
