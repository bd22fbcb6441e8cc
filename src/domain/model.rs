use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

// ── Value types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl Address {
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Order,
    Cancel,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Order => "ORDER",
            OrderStatus::Cancel => "CANCEL",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDER" => Ok(OrderStatus::Order),
            "CANCEL" => Ok(OrderStatus::Cancel),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Ready,
    Comp,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Ready => "READY",
            DeliveryStatus::Comp => "COMP",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READY" => Ok(DeliveryStatus::Ready),
            "COMP" => Ok(DeliveryStatus::Comp),
            other => Err(DomainError::InvalidInput(format!(
                "unknown delivery status '{other}'"
            ))),
        }
    }
}

// ── Entities ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub address: Address,
}

impl Member {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address,
        }
    }
}

/// Owned by exactly one [`Order`]; never outlives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: Uuid,
    pub address: Address,
    pub status: DeliveryStatus,
}

impl Delivery {
    pub fn ready(address: Address) -> Self {
        Self {
            id: Uuid::new_v4(),
            address,
            status: DeliveryStatus::Ready,
        }
    }
}

/// Variant-specific item fields, stored single-table under a `dtype` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Book { author: String, isbn: String },
    Album { artist: String, etc: String },
    Movie { director: String, actor: String },
}

impl ItemKind {
    pub fn dtype(&self) -> &'static str {
        match self {
            ItemKind::Book { .. } => "B",
            ItemKind::Album { .. } => "A",
            ItemKind::Movie { .. } => "M",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub kind: ItemKind,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        price: BigDecimal,
        stock_quantity: i32,
        kind: ItemKind,
    ) -> Result<Self, DomainError> {
        if price < BigDecimal::zero() {
            return Err(DomainError::invalid_price(&price));
        }
        if stock_quantity < 0 {
            return Err(DomainError::InvalidInput(format!(
                "stock quantity must not be negative, got {stock_quantity}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price,
            stock_quantity,
            kind,
        })
    }

    /// Replaces name, price and stock, validated the same way as [`Item::new`].
    pub fn change(
        &mut self,
        name: impl Into<String>,
        price: BigDecimal,
        stock_quantity: i32,
    ) -> Result<(), DomainError> {
        let changed = Item::new(name, price, stock_quantity, self.kind.clone())?;
        self.name = changed.name;
        self.price = changed.price;
        self.stock_quantity = changed.stock_quantity;
        Ok(())
    }

    pub fn add_stock(&mut self, quantity: i32) {
        self.stock_quantity += quantity;
    }

    pub fn remove_stock(&mut self, quantity: i32) -> Result<(), DomainError> {
        let rest = self.stock_quantity - quantity;
        if rest < 0 {
            return Err(DomainError::not_enough_stock(quantity, self.stock_quantity));
        }
        self.stock_quantity = rest;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: Uuid,
    pub item_id: Uuid,
    /// Item price at the time the order was placed, not the live price.
    pub order_price: BigDecimal,
    pub count: i32,
    pub status: OrderStatus,
}

impl OrderItem {
    /// Snapshots `order_price` and takes `count` units out of the item's stock.
    pub fn create(item: &mut Item, order_price: BigDecimal, count: i32) -> Result<Self, DomainError> {
        if count <= 0 {
            return Err(DomainError::InvalidInput(format!(
                "order count must be positive, got {count}"
            )));
        }
        if order_price < BigDecimal::zero() {
            return Err(DomainError::invalid_price(&order_price));
        }
        item.remove_stock(count)?;
        Ok(Self {
            id: Uuid::new_v4(),
            item_id: item.id,
            order_price,
            count,
            status: OrderStatus::Order,
        })
    }

    pub fn total_price(&self) -> BigDecimal {
        &self.order_price * BigDecimal::from(self.count)
    }
}

/// The order aggregate. Owns its delivery and order items; the member is
/// referenced by id only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: Uuid,
    pub member_id: Uuid,
    pub delivery: Delivery,
    pub order_items: Vec<OrderItem>,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    pub fn create(
        member: &Member,
        delivery: Delivery,
        order_items: Vec<OrderItem>,
    ) -> Result<Self, DomainError> {
        if order_items.is_empty() {
            return Err(DomainError::InvalidInput(
                "an order needs at least one order item".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            member_id: member.id,
            delivery,
            order_items,
            order_date: now(),
            status: OrderStatus::Order,
        })
    }

    /// Cancels the order and every order item, or nothing at all. An order
    /// is cancelled at most once.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status == OrderStatus::Cancel {
            return Err(DomainError::InvariantViolation(format!(
                "order {} is already cancelled",
                self.id
            )));
        }
        if self.delivery.status == DeliveryStatus::Comp {
            return Err(DomainError::InvariantViolation(format!(
                "order {} is already delivered and cannot be cancelled",
                self.id
            )));
        }
        self.status = OrderStatus::Cancel;
        for order_item in &mut self.order_items {
            order_item.status = OrderStatus::Cancel;
        }
        Ok(())
    }

    pub fn total_price(&self) -> BigDecimal {
        self.order_items
            .iter()
            .map(OrderItem::total_price)
            .fold(BigDecimal::zero(), |acc, p| acc + p)
    }
}

/// Current time at the precision Postgres stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Member {
        Member::new("member1", Address::new("Seoul", "River", "123-123"))
    }

    fn book(price: i64, stock: i32) -> Item {
        Item::new(
            "JPA",
            BigDecimal::from(price),
            stock,
            ItemKind::Book {
                author: "kim".to_string(),
                isbn: "1234".to_string(),
            },
        )
        .expect("valid item")
    }

    fn order_with(lines: &[(i64, i32)]) -> Order {
        let member = member();
        let items = lines
            .iter()
            .map(|&(price, count)| {
                let mut item = book(price, 10);
                OrderItem::create(&mut item, BigDecimal::from(price), count).expect("in stock")
            })
            .collect();
        Order::create(&member, Delivery::ready(member.address.clone()), items)
            .expect("valid order")
    }

    #[test]
    fn create_order_starts_in_order_status() {
        let order = order_with(&[(10000, 2)]);
        assert_eq!(order.status, OrderStatus::Order);
        assert_eq!(order.order_items.len(), 1);
        assert_eq!(order.delivery.status, DeliveryStatus::Ready);
    }

    #[test]
    fn total_price_sums_unit_price_times_count() {
        let order = order_with(&[(10000, 2), (5000, 1)]);
        assert_eq!(order.total_price(), BigDecimal::from(25000));
    }

    #[test]
    fn order_item_snapshots_price_and_removes_stock() {
        let mut item = book(10000, 10);
        let price = item.price.clone();
        let line = OrderItem::create(&mut item, price, 2).expect("in stock");
        item.price = BigDecimal::from(99);
        assert_eq!(line.order_price, BigDecimal::from(10000));
        assert_eq!(item.stock_quantity, 8);
    }

    #[test]
    fn order_item_over_stock_fails_and_keeps_stock() {
        let mut item = book(10000, 10);
        let err = OrderItem::create(&mut item, BigDecimal::from(10000), 11).unwrap_err();
        assert!(matches!(
            err,
            DomainError::NotEnoughStock {
                requested: 11,
                available: 10
            }
        ));
        assert_eq!(item.stock_quantity, 10);
    }

    #[test]
    fn order_item_rejects_non_positive_count() {
        let mut item = book(10000, 10);
        assert!(matches!(
            OrderItem::create(&mut item, BigDecimal::from(10000), 0),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn order_requires_an_order_item() {
        let member = member();
        let result = Order::create(&member, Delivery::ready(member.address.clone()), vec![]);
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn cancel_marks_order_and_every_order_item() {
        let mut order = order_with(&[(10000, 2), (5000, 1)]);
        order.cancel().expect("cancel");
        assert_eq!(order.status, OrderStatus::Cancel);
        assert!(order
            .order_items
            .iter()
            .all(|oi| oi.status == OrderStatus::Cancel));
    }

    #[test]
    fn cancel_after_completed_delivery_changes_nothing() {
        let mut order = order_with(&[(10000, 2), (5000, 1)]);
        order.delivery.status = DeliveryStatus::Comp;
        let before = order.clone();

        let err = order.cancel().unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(order, before);
    }

    #[test]
    fn cancel_twice_is_refused_and_changes_nothing() {
        let mut order = order_with(&[(10000, 2)]);
        order.cancel().expect("first cancel");
        let before = order.clone();

        let err = order.cancel().unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(order, before);
    }

    #[test]
    fn change_replaces_name_price_and_stock() {
        let mut item = book(10000, 10);
        let id = item.id;

        item.change("JPA 2nd", BigDecimal::from(12000), 7).expect("valid change");

        assert_eq!(item.id, id);
        assert_eq!(item.name, "JPA 2nd");
        assert_eq!(item.price, BigDecimal::from(12000));
        assert_eq!(item.stock_quantity, 7);
    }

    #[test]
    fn invalid_change_keeps_the_item() {
        let mut item = book(10000, 10);
        let before = item.clone();

        assert!(item.change("JPA", BigDecimal::from(-1), 7).is_err());
        assert!(item.change("JPA", BigDecimal::from(1), -7).is_err());
        assert_eq!(item, before);
    }

    #[test]
    fn status_strings_round_trip_through_from_str() {
        assert_eq!("CANCEL".parse::<OrderStatus>().unwrap(), OrderStatus::Cancel);
        assert_eq!("COMP".parse::<DeliveryStatus>().unwrap(), DeliveryStatus::Comp);
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn now_has_microsecond_precision() {
        assert_eq!(now().timestamp_subsec_nanos() % 1000, 0);
    }
}
