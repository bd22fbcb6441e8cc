use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::model::{Address, Delivery, Item, ItemKind, Member, OrderItem};
use crate::domain::projection::{OrderFlatRow, OrderItemQueryDto, OrderQueryDto, OrderRecord};
use crate::schema::{deliveries, items, members, order_items, orders};

// ── Entity rows ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MemberRow {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            id: row.id,
            name: row.name,
            address: Address::new(row.city, row.street, row.zipcode),
        }
    }
}

impl From<&Member> for MemberRow {
    fn from(member: &Member) -> Self {
        MemberRow {
            id: member.id,
            name: member.name.clone(),
            city: member.address.city.clone(),
            street: member.address.street.clone(),
            zipcode: member.address.zipcode.clone(),
        }
    }
}

/// Single-table item row; the variant columns of the other `dtype`s are null.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ItemRow {
    pub id: Uuid,
    pub dtype: String,
    pub name: String,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub artist: Option<String>,
    pub etc: Option<String>,
    pub director: Option<String>,
    pub actor: Option<String>,
}

impl TryFrom<ItemRow> for Item {
    type Error = DomainError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let kind = match row.dtype.as_str() {
            "B" => ItemKind::Book {
                author: row.author.unwrap_or_default(),
                isbn: row.isbn.unwrap_or_default(),
            },
            "A" => ItemKind::Album {
                artist: row.artist.unwrap_or_default(),
                etc: row.etc.unwrap_or_default(),
            },
            "M" => ItemKind::Movie {
                director: row.director.unwrap_or_default(),
                actor: row.actor.unwrap_or_default(),
            },
            other => {
                return Err(DomainError::Storage(format!(
                    "item {} has unknown dtype '{other}'",
                    row.id
                )))
            }
        };
        Ok(Item {
            id: row.id,
            name: row.name,
            price: row.price,
            stock_quantity: row.stock_quantity,
            kind,
        })
    }
}

impl From<&Item> for ItemRow {
    fn from(item: &Item) -> Self {
        let mut row = ItemRow {
            id: item.id,
            dtype: item.kind.dtype().to_string(),
            name: item.name.clone(),
            price: item.price.clone(),
            stock_quantity: item.stock_quantity,
            author: None,
            isbn: None,
            artist: None,
            etc: None,
            director: None,
            actor: None,
        };
        match &item.kind {
            ItemKind::Book { author, isbn } => {
                row.author = Some(author.clone());
                row.isbn = Some(isbn.clone());
            }
            ItemKind::Album { artist, etc } => {
                row.artist = Some(artist.clone());
                row.etc = Some(etc.clone());
            }
            ItemKind::Movie { director, actor } => {
                row.director = Some(director.clone());
                row.actor = Some(actor.clone());
            }
        }
        row
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = deliveries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryRow {
    pub id: Uuid,
    pub city: String,
    pub street: String,
    pub zipcode: String,
    pub status: String,
}

impl TryFrom<DeliveryRow> for Delivery {
    type Error = DomainError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        Ok(Delivery {
            id: row.id,
            status: row.status.parse()?,
            address: Address::new(row.city, row.street, row.zipcode),
        })
    }
}

impl From<&Delivery> for DeliveryRow {
    fn from(delivery: &Delivery) -> Self {
        DeliveryRow {
            id: delivery.id,
            city: delivery.address.city.clone(),
            street: delivery.address.street.clone(),
            zipcode: delivery.address.zipcode.clone(),
            status: delivery.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub member_id: Uuid,
    pub delivery_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub status: String,
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(OrderRecord {
            id: row.id,
            member_id: row.member_id,
            delivery_id: row.delivery_id,
            order_date: row.order_date,
            status: row.status.parse()?,
        })
    }
}

#[derive(
    Debug, Clone, Queryable, Selectable, Identifiable, Insertable, Associations,
)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub line_no: i32,
    pub order_price: BigDecimal,
    pub quantity: i32,
    pub status: String,
}

impl OrderItemRow {
    pub fn new(order_id: Uuid, line_no: i32, order_item: &OrderItem) -> Self {
        OrderItemRow {
            id: order_item.id,
            order_id,
            item_id: order_item.item_id,
            line_no,
            order_price: order_item.order_price.clone(),
            quantity: order_item.count,
            status: order_item.status.as_str().to_string(),
        }
    }
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = DomainError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            id: row.id,
            item_id: row.item_id,
            order_price: row.order_price,
            count: row.quantity,
            status: row.status.parse()?,
        })
    }
}

// ── Projection rows ──────────────────────────────────────────────────────────

/// `(orders.id, members.name, orders.order_date, orders.status, delivery address)`
#[derive(Debug, Queryable)]
pub struct OrderQueryRow {
    pub order_id: Uuid,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl TryFrom<OrderQueryRow> for OrderQueryDto {
    type Error = DomainError;

    fn try_from(row: OrderQueryRow) -> Result<Self, Self::Error> {
        Ok(OrderQueryDto {
            order_id: row.order_id,
            name: row.name,
            order_date: row.order_date,
            order_status: row.status.parse()?,
            address: Address::new(row.city, row.street, row.zipcode),
            order_items: Vec::new(),
        })
    }
}

/// `(order_items.order_id, items.name, order_items.order_price, order_items.quantity)`
#[derive(Debug, Queryable)]
pub struct OrderItemQueryRow {
    pub order_id: Uuid,
    pub item_name: String,
    pub order_price: BigDecimal,
    pub quantity: i32,
}

impl From<OrderItemQueryRow> for OrderItemQueryDto {
    fn from(row: OrderItemQueryRow) -> Self {
        OrderItemQueryDto {
            order_id: row.order_id,
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.quantity,
        }
    }
}

/// An [`OrderQueryRow`] followed by the columns of an [`OrderItemQueryRow`]
/// without its order id.
#[derive(Debug, Queryable)]
pub struct OrderFlatQueryRow {
    pub order_id: Uuid,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub city: String,
    pub street: String,
    pub zipcode: String,
    pub item_name: String,
    pub order_price: BigDecimal,
    pub quantity: i32,
}

impl TryFrom<OrderFlatQueryRow> for OrderFlatRow {
    type Error = DomainError;

    fn try_from(row: OrderFlatQueryRow) -> Result<Self, Self::Error> {
        Ok(OrderFlatRow {
            order_id: row.order_id,
            name: row.name,
            order_date: row.order_date,
            order_status: row.status.parse()?,
            address: Address::new(row.city, row.street, row.zipcode),
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.quantity,
        })
    }
}
