use uuid::Uuid;

use super::errors::DomainError;
use super::fetch::{FetchPlan, OrderFilter, Page};
use super::model::{Delivery, Item, Member, Order, OrderItem};
use super::projection::{OrderFlatRow, OrderGraphRow, OrderItemQueryDto, OrderLine, OrderQueryDto};

/// Read access to the order graph. Every method issues exactly one query
/// against the connection the store was opened on.
pub trait OrderStore {
    /// Entity-graph query. Callers validate `plan` against `page` first.
    fn run_entity_query(
        &mut self,
        plan: &FetchPlan,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderGraphRow>, DomainError>;

    fn find_member(&mut self, id: Uuid) -> Result<Option<Member>, DomainError>;

    fn find_delivery(&mut self, id: Uuid) -> Result<Option<Delivery>, DomainError>;

    /// Order items of one order, in insertion order.
    fn find_order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError>;

    fn find_item(&mut self, id: Uuid) -> Result<Option<Item>, DomainError>;

    /// Order items with their items for every order in `order_ids`, keyed by
    /// owning order id.
    fn find_order_lines_in(
        &mut self,
        order_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, OrderLine)>, DomainError>;

    /// Order-level projection with the to-one associations joined.
    fn run_root_projection(
        &mut self,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderQueryDto>, DomainError>;

    fn run_item_projection(&mut self, order_id: Uuid)
        -> Result<Vec<OrderItemQueryDto>, DomainError>;

    fn run_item_projection_in(
        &mut self,
        order_ids: &[Uuid],
    ) -> Result<Vec<OrderItemQueryDto>, DomainError>;

    /// One row per (order × order item), order columns repeated.
    fn run_flat_query(&mut self, filter: &OrderFilter) -> Result<Vec<OrderFlatRow>, DomainError>;

    /// Queries issued through this store so far.
    fn query_count(&self) -> usize;
}

pub trait OrderRepository {
    /// Persists a new aggregate: delivery, order and order items.
    fn insert_order(&mut self, order: &Order) -> Result<(), DomainError>;

    /// Loads the aggregate with its delivery and order items.
    fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError>;

    /// Like [`OrderRepository::find_order`], holding a row lock on the order
    /// until the surrounding transaction ends.
    fn find_order_for_update(&mut self, id: Uuid) -> Result<Option<Order>, DomainError>;

    /// Writes the order status and every order item status.
    fn update_order_status(&mut self, order: &Order) -> Result<(), DomainError>;
}

pub trait MemberRepository {
    fn insert_member(&mut self, member: &Member) -> Result<(), DomainError>;

    fn find_member_by_id(&mut self, id: Uuid) -> Result<Option<Member>, DomainError>;

    fn find_all_members(&mut self) -> Result<Vec<Member>, DomainError>;

    fn update_member_name(&mut self, id: Uuid, name: &str) -> Result<(), DomainError>;
}

pub trait ItemRepository {
    fn insert_item(&mut self, item: &Item) -> Result<(), DomainError>;

    fn find_item_by_id(&mut self, id: Uuid) -> Result<Option<Item>, DomainError>;

    /// Loads the item holding a row lock until the surrounding transaction
    /// ends. Stock changes read through this.
    fn find_item_for_update(&mut self, id: Uuid) -> Result<Option<Item>, DomainError>;

    fn find_all_items(&mut self) -> Result<Vec<Item>, DomainError>;

    fn update_stock(&mut self, item: &Item) -> Result<(), DomainError>;

    /// Writes name, price and stock.
    fn update_item(&mut self, item: &Item) -> Result<(), DomainError>;
}

impl<T: OrderRepository + ?Sized> OrderRepository for &mut T {
    fn insert_order(&mut self, order: &Order) -> Result<(), DomainError> {
        (**self).insert_order(order)
    }

    fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        (**self).find_order(id)
    }

    fn find_order_for_update(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        (**self).find_order_for_update(id)
    }

    fn update_order_status(&mut self, order: &Order) -> Result<(), DomainError> {
        (**self).update_order_status(order)
    }
}

impl<T: MemberRepository + ?Sized> MemberRepository for &mut T {
    fn insert_member(&mut self, member: &Member) -> Result<(), DomainError> {
        (**self).insert_member(member)
    }

    fn find_member_by_id(&mut self, id: Uuid) -> Result<Option<Member>, DomainError> {
        (**self).find_member_by_id(id)
    }

    fn find_all_members(&mut self) -> Result<Vec<Member>, DomainError> {
        (**self).find_all_members()
    }

    fn update_member_name(&mut self, id: Uuid, name: &str) -> Result<(), DomainError> {
        (**self).update_member_name(id, name)
    }
}

impl<T: ItemRepository + ?Sized> ItemRepository for &mut T {
    fn insert_item(&mut self, item: &Item) -> Result<(), DomainError> {
        (**self).insert_item(item)
    }

    fn find_item_by_id(&mut self, id: Uuid) -> Result<Option<Item>, DomainError> {
        (**self).find_item_by_id(id)
    }

    fn find_item_for_update(&mut self, id: Uuid) -> Result<Option<Item>, DomainError> {
        (**self).find_item_for_update(id)
    }

    fn find_all_items(&mut self) -> Result<Vec<Item>, DomainError> {
        (**self).find_all_items()
    }

    fn update_stock(&mut self, item: &Item) -> Result<(), DomainError> {
        (**self).update_stock(item)
    }

    fn update_item(&mut self, item: &Item) -> Result<(), DomainError> {
        (**self).update_item(item)
    }
}
