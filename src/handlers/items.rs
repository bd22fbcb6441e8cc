use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::catalog_service::CatalogService;
use crate::domain::errors::DomainError;
use crate::domain::model::{Item, ItemKind};
use crate::domain::ports::ItemRepository;
use crate::errors::AppError;
use crate::infrastructure::order_store::{read_snapshot, read_write};

use super::{AppState, CreatedResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    pub name: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "10000.00"
    pub price: String,
    pub stock_quantity: i32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl CreateItemRequest {
    fn into_item(self) -> Result<Item, DomainError> {
        let price = parse_price(&self.price)?;
        Item::new(self.name, price, self.stock_quantity, self.kind)
    }
}

/// Name, price and stock replace the stored values; the item kind is fixed.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub name: String,
    pub price: String,
    pub stock_quantity: i32,
}

fn parse_price(price: &str) -> Result<BigDecimal, DomainError> {
    BigDecimal::from_str(price)
        .map_err(|e| DomainError::InvalidInput(format!("invalid price '{price}': {e}")))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub price: String,
    pub stock_quantity: i32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        ItemResponse {
            id: item.id,
            name: item.name,
            price: item.price.with_scale(2).to_string(),
            stock_quantity: item.stock_quantity,
            kind: item.kind,
        }
    }
}

/// POST /api/items
#[utoipa::path(
    post,
    path = "/api/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = CreatedResponse),
        (status = 400, description = "Invalid price or stock"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "items"
)]
pub async fn create_item(
    state: web::Data<AppState>,
    body: web::Json<CreateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let item = body.into_inner().into_item()?;

    let id = web::block(move || {
        let mut conn = state.pool.get()?;
        read_write(&mut conn, |store| {
            store.insert_item(&item)?;
            Ok(item.id)
        })
    })
    .await??;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// GET /api/items
#[utoipa::path(
    get,
    path = "/api/items",
    responses(
        (status = 200, description = "All items by name", body = Vec<ItemResponse>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "items"
)]
pub async fn list_items(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let items = web::block(move || {
        let mut conn = state.pool.get()?;
        read_snapshot(&mut conn, |store| store.find_all_items())
    })
    .await??;

    let items: Vec<ItemResponse> = items.into_iter().map(ItemResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/items/{id}
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item UUID"),
    ),
    responses(
        (status = 200, description = "Item found", body = ItemResponse),
        (status = 404, description = "Item not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "items"
)]
pub async fn get_item(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let item = web::block(move || {
        let mut conn = state.pool.get()?;
        read_snapshot(&mut conn, |store| CatalogService::new(store).item(id))
    })
    .await??;

    Ok(HttpResponse::Ok().json(ItemResponse::from(item)))
}

/// PUT /api/items/{id}
#[utoipa::path(
    put,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item UUID"),
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item changed", body = ItemResponse),
        (status = 400, description = "Invalid name, price or stock"),
        (status = 404, description = "Item not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "items"
)]
pub async fn update_item(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let price = parse_price(&body.price)?;

    let item = web::block(move || {
        let mut conn = state.pool.get()?;
        read_write(&mut conn, |store| {
            CatalogService::new(store).change_item(id, &body.name, price, body.stock_quantity)
        })
    })
    .await??;

    Ok(HttpResponse::Ok().json(ItemResponse::from(item)))
}
