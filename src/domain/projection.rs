//! Read-side shapes: entity-graph rows, the resolved order graph, and the
//! column projections. All of them live for one request only.

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::model::{Address, Delivery, Item, Member, OrderItem, OrderStatus};

/// Order columns as read by an entity query, associations as foreign keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: Uuid,
    pub member_id: Uuid,
    pub delivery_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub order_item: OrderItem,
    pub item: Item,
}

impl OrderLine {
    pub fn total_price(&self) -> BigDecimal {
        self.order_item.total_price()
    }
}

/// One row of an entity-graph query.
///
/// `member` and `delivery` are `Some` only when the fetch plan joined them;
/// `line` is `Some` only when the plan joined the order items, in which case
/// the order columns repeat once per order item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderGraphRow {
    pub order: OrderRecord,
    pub member: Option<Member>,
    pub delivery: Option<Delivery>,
    pub line: Option<OrderLine>,
}

/// A fully resolved order. Reading any field never reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderGraph {
    pub id: Uuid,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub member: Member,
    pub delivery: Delivery,
    pub lines: Vec<OrderLine>,
}

impl OrderGraph {
    pub fn total_price(&self) -> BigDecimal {
        self.lines
            .iter()
            .map(OrderLine::total_price)
            .fold(BigDecimal::zero(), |acc, p| acc + p)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemQueryDto {
    /// Grouping key only.
    #[serde(skip_serializing)]
    pub order_id: Uuid,
    pub item_name: String,
    pub order_price: BigDecimal,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderQueryDto {
    pub order_id: Uuid,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemQueryDto>,
}

/// One (order × order item) row with every order column repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFlatRow {
    pub order_id: Uuid,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
    pub item_name: String,
    pub order_price: BigDecimal,
    pub count: i32,
}

impl OrderFlatRow {
    /// Splits the row into its order-level projection (with no items) and
    /// its item-level projection.
    pub fn into_parts(self) -> (OrderQueryDto, OrderItemQueryDto) {
        let item = OrderItemQueryDto {
            order_id: self.order_id,
            item_name: self.item_name,
            order_price: self.order_price,
            count: self.count,
        };
        let order = OrderQueryDto {
            order_id: self.order_id,
            name: self.name,
            order_date: self.order_date,
            order_status: self.order_status,
            address: self.address,
            order_items: Vec::new(),
        };
        (order, item)
    }
}
