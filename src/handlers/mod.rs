pub mod items;
pub mod members;
pub mod orders;

use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::application::order_query_service::OrderQueryService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::domain::fetch::FetchStrategy;

/// Shared by every worker; cloned per worker by actix.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub queries: OrderQueryService,
    pub max_page_size: i64,
    pub default_strategy: FetchStrategy,
}

impl AppState {
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        Self {
            pool,
            queries: OrderQueryService::new(config.batch_fetch_size),
            max_page_size: config.max_page_size,
            default_strategy: config.default_strategy,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::list_orders,
        orders::get_order,
        orders::list_simple_orders,
        orders::create_order,
        orders::cancel_order,
        members::create_member,
        members::list_members,
        members::get_member,
        members::update_member,
        items::create_item,
        items::list_items,
        items::get_item,
        items::update_item,
    ),
    components(schemas(
        CreatedResponse,
        crate::application::projector::OrderResponse,
        crate::application::projector::OrderItemResponse,
        crate::application::projector::SimpleOrderResponse,
        FetchStrategy,
        crate::domain::model::Address,
        crate::domain::model::OrderStatus,
        crate::domain::model::ItemKind,
        orders::CreateOrderRequest,
        members::CreateMemberRequest,
        members::UpdateMemberRequest,
        members::MemberResponse,
        items::CreateItemRequest,
        items::UpdateItemRequest,
        items::ItemResponse,
    )),
    tags(
        (name = "orders", description = "Order graph reads and order placement"),
        (name = "members", description = "Members"),
        (name = "items", description = "Catalogue items"),
    )
)]
pub struct ApiDoc;
