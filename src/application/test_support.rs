//! In-memory store for unit tests. Counts queries the way the diesel store
//! does and can be told to fail.

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::fetch::{FetchPlan, OrderFilter, Page, ToOne};
use crate::domain::model::{Address, Delivery, Item, ItemKind, Member, Order, OrderItem};
use crate::domain::ports::{ItemRepository, MemberRepository, OrderRepository, OrderStore};
use crate::domain::projection::{
    OrderFlatRow, OrderGraphRow, OrderItemQueryDto, OrderLine, OrderQueryDto, OrderRecord,
};

#[derive(Debug, Default)]
pub(crate) struct InMemoryStore {
    members: Vec<Member>,
    items: Vec<Item>,
    orders: Vec<Order>,
    queries: usize,
    locked_reads: usize,
    fail_after: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_member(&mut self, name: &str) -> Uuid {
        let member = Member::new(name, Address::new("Seoul", name, "123-123"));
        let id = member.id;
        self.members.push(member);
        id
    }

    pub fn seed_item(&mut self, name: &str, price: i64, stock: i32) -> Uuid {
        let item = Item::new(
            name,
            BigDecimal::from(price),
            stock,
            ItemKind::Book {
                author: "author".to_string(),
                isbn: "isbn".to_string(),
            },
        )
        .expect("valid item");
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Places an order of `(item id, count)` lines at the items' current price.
    pub fn seed_order_for(&mut self, member_id: Uuid, lines: &[(Uuid, i32)]) -> Uuid {
        let member = self.member(member_id).cloned().expect("seeded member");
        let order_items = lines
            .iter()
            .map(|&(item_id, count)| {
                let item = self
                    .items
                    .iter_mut()
                    .find(|i| i.id == item_id)
                    .expect("seeded item");
                let price = item.price.clone();
                OrderItem::create(item, price, count).expect("in stock")
            })
            .collect();
        let order = Order::create(&member, Delivery::ready(member.address.clone()), order_items)
            .expect("valid order");
        let id = order.id;
        self.orders.push(order);
        id
    }

    /// Seeds a member, one item per line, and an order over them.
    pub fn seed_order(&mut self, member_name: &str, lines: &[(&str, i64, i32)]) -> Uuid {
        let member_id = self.seed_member(member_name);
        let lines: Vec<(Uuid, i32)> = lines
            .iter()
            .map(|&(name, price, count)| (self.seed_item(name, price, 100), count))
            .collect();
        self.seed_order_for(member_id, &lines)
    }

    /// Fails every query once the counter passes `n`.
    pub fn fail_after(&mut self, n: usize) {
        self.fail_after = Some(n);
    }

    /// Lookups made through the `*_for_update` methods.
    pub fn locked_reads(&self) -> usize {
        self.locked_reads
    }

    pub fn member_by_id(&self, id: Uuid) -> Option<&Member> {
        self.member(id)
    }

    pub fn reset_query_count(&mut self) {
        self.queries = 0;
    }

    pub fn order(&self, id: Uuid) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn order_mut(&mut self, id: Uuid) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == id)
    }

    pub fn item(&self, id: Uuid) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    fn member(&self, id: Uuid) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    fn query(&mut self) -> Result<(), DomainError> {
        self.queries += 1;
        match self.fail_after {
            Some(limit) if self.queries > limit => {
                Err(DomainError::Storage("connection reset".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn matching(&self, filter: &OrderFilter, page: Option<&Page>) -> Vec<&Order> {
        let (skip, take) = page.map_or((0, usize::MAX), |p| (p.offset as usize, p.limit as usize));
        self.orders
            .iter()
            .filter(|o| filter.order_id.map_or(true, |id| o.id == id))
            .filter(|o| filter.status.map_or(true, |status| o.status == status))
            .filter(|o| {
                filter.member_name.as_deref().map_or(true, |name| {
                    self.member(o.member_id)
                        .is_some_and(|m| m.name.contains(name))
                })
            })
            .skip(skip)
            .take(take)
            .collect()
    }

    fn line(&self, order_item: &OrderItem) -> OrderLine {
        OrderLine {
            order_item: order_item.clone(),
            item: self.item(order_item.item_id).cloned().expect("seeded item"),
        }
    }

    fn root_dto(&self, order: &Order) -> OrderQueryDto {
        OrderQueryDto {
            order_id: order.id,
            name: self.member(order.member_id).expect("seeded member").name.clone(),
            order_date: order.order_date,
            order_status: order.status,
            address: order.delivery.address.clone(),
            order_items: Vec::new(),
        }
    }

    fn item_dtos(&self, order: &Order) -> Vec<OrderItemQueryDto> {
        order
            .order_items
            .iter()
            .map(|oi| OrderItemQueryDto {
                order_id: order.id,
                item_name: self.item(oi.item_id).expect("seeded item").name.clone(),
                order_price: oi.order_price.clone(),
                count: oi.count,
            })
            .collect()
    }
}

/// Runs an unfiltered entity query.
pub(crate) fn graph_rows(store: &mut InMemoryStore, plan: &FetchPlan) -> Vec<OrderGraphRow> {
    store
        .run_entity_query(plan, &OrderFilter::default(), None)
        .expect("in-memory query")
}

impl OrderStore for InMemoryStore {
    fn run_entity_query(
        &mut self,
        plan: &FetchPlan,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderGraphRow>, DomainError> {
        self.query()?;
        let mut rows = Vec::new();
        for order in self.matching(filter, page) {
            let row = OrderGraphRow {
                order: OrderRecord {
                    id: order.id,
                    member_id: order.member_id,
                    delivery_id: order.delivery.id,
                    order_date: order.order_date,
                    status: order.status,
                },
                member: if plan.fetches(ToOne::Member) {
                    self.member(order.member_id).cloned()
                } else {
                    None
                },
                delivery: plan
                    .fetches(ToOne::Delivery)
                    .then(|| order.delivery.clone()),
                line: None,
            };
            if plan.collection().is_some() {
                for order_item in &order.order_items {
                    rows.push(OrderGraphRow {
                        line: Some(self.line(order_item)),
                        ..row.clone()
                    });
                }
            } else {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn find_member(&mut self, id: Uuid) -> Result<Option<Member>, DomainError> {
        self.query()?;
        Ok(self.member(id).cloned())
    }

    fn find_delivery(&mut self, id: Uuid) -> Result<Option<Delivery>, DomainError> {
        self.query()?;
        Ok(self
            .orders
            .iter()
            .map(|o| &o.delivery)
            .find(|d| d.id == id)
            .cloned())
    }

    fn find_order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError> {
        self.query()?;
        Ok(self
            .order(order_id)
            .map(|o| o.order_items.clone())
            .unwrap_or_default())
    }

    fn find_item(&mut self, id: Uuid) -> Result<Option<Item>, DomainError> {
        self.query()?;
        Ok(self.item(id).cloned())
    }

    fn find_order_lines_in(
        &mut self,
        order_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, OrderLine)>, DomainError> {
        self.query()?;
        Ok(self
            .orders
            .iter()
            .filter(|o| order_ids.contains(&o.id))
            .flat_map(|o| o.order_items.iter().map(move |oi| (o.id, oi)))
            .map(|(order_id, oi)| (order_id, self.line(oi)))
            .collect())
    }

    fn run_root_projection(
        &mut self,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderQueryDto>, DomainError> {
        self.query()?;
        Ok(self
            .matching(filter, page)
            .into_iter()
            .map(|o| self.root_dto(o))
            .collect())
    }

    fn run_item_projection(
        &mut self,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemQueryDto>, DomainError> {
        self.query()?;
        Ok(self
            .order(order_id)
            .map(|o| self.item_dtos(o))
            .unwrap_or_default())
    }

    fn run_item_projection_in(
        &mut self,
        order_ids: &[Uuid],
    ) -> Result<Vec<OrderItemQueryDto>, DomainError> {
        self.query()?;
        Ok(self
            .orders
            .iter()
            .filter(|o| order_ids.contains(&o.id))
            .flat_map(|o| self.item_dtos(o))
            .collect())
    }

    fn run_flat_query(&mut self, filter: &OrderFilter) -> Result<Vec<OrderFlatRow>, DomainError> {
        self.query()?;
        let mut rows = Vec::new();
        for order in self.matching(filter, None) {
            let root = self.root_dto(order);
            for item in self.item_dtos(order) {
                rows.push(OrderFlatRow {
                    order_id: root.order_id,
                    name: root.name.clone(),
                    order_date: root.order_date,
                    order_status: root.order_status,
                    address: root.address.clone(),
                    item_name: item.item_name,
                    order_price: item.order_price,
                    count: item.count,
                });
            }
        }
        Ok(rows)
    }

    fn query_count(&self) -> usize {
        self.queries
    }
}

impl OrderRepository for InMemoryStore {
    fn insert_order(&mut self, order: &Order) -> Result<(), DomainError> {
        self.query()?;
        self.orders.push(order.clone());
        Ok(())
    }

    fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.query()?;
        Ok(self.order(id).cloned())
    }

    fn find_order_for_update(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.locked_reads += 1;
        self.find_order(id)
    }

    fn update_order_status(&mut self, order: &Order) -> Result<(), DomainError> {
        self.query()?;
        let stored = self.order_mut(order.id).ok_or(DomainError::NotFound)?;
        stored.status = order.status;
        for (stored_item, item) in stored.order_items.iter_mut().zip(&order.order_items) {
            stored_item.status = item.status;
        }
        Ok(())
    }
}

impl MemberRepository for InMemoryStore {
    fn insert_member(&mut self, member: &Member) -> Result<(), DomainError> {
        self.query()?;
        self.members.push(member.clone());
        Ok(())
    }

    fn find_member_by_id(&mut self, id: Uuid) -> Result<Option<Member>, DomainError> {
        self.query()?;
        Ok(self.member(id).cloned())
    }

    fn find_all_members(&mut self) -> Result<Vec<Member>, DomainError> {
        self.query()?;
        Ok(self.members.clone())
    }

    fn update_member_name(&mut self, id: Uuid, name: &str) -> Result<(), DomainError> {
        self.query()?;
        let stored = self
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DomainError::NotFound)?;
        stored.name = name.to_string();
        Ok(())
    }
}

impl ItemRepository for InMemoryStore {
    fn insert_item(&mut self, item: &Item) -> Result<(), DomainError> {
        self.query()?;
        self.items.push(item.clone());
        Ok(())
    }

    fn find_item_by_id(&mut self, id: Uuid) -> Result<Option<Item>, DomainError> {
        self.query()?;
        Ok(self.item(id).cloned())
    }

    fn find_item_for_update(&mut self, id: Uuid) -> Result<Option<Item>, DomainError> {
        self.locked_reads += 1;
        self.find_item_by_id(id)
    }

    fn find_all_items(&mut self) -> Result<Vec<Item>, DomainError> {
        self.query()?;
        Ok(self.items.clone())
    }

    fn update_stock(&mut self, item: &Item) -> Result<(), DomainError> {
        self.query()?;
        let stored = self
            .items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or(DomainError::NotFound)?;
        stored.stock_quantity = item.stock_quantity;
        Ok(())
    }

    fn update_item(&mut self, item: &Item) -> Result<(), DomainError> {
        self.query()?;
        let stored = self
            .items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or(DomainError::NotFound)?;
        stored.name = item.name.clone();
        stored.price = item.price.clone();
        stored.stock_quantity = item.stock_quantity;
        Ok(())
    }
}
