use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::fetch::{FetchPlan, OrderFilter, Page, ToOne};
use crate::domain::model::{Delivery, Item, Member, Order, OrderItem};
use crate::domain::ports::{ItemRepository, MemberRepository, OrderRepository, OrderStore};
use crate::domain::projection::{
    OrderFlatRow, OrderGraphRow, OrderItemQueryDto, OrderLine, OrderQueryDto, OrderRecord,
};
use crate::schema::{deliveries, items, members, order_items, orders};

use super::models::{
    DeliveryRow, ItemRow, MemberRow, OrderFlatQueryRow, OrderItemQueryRow, OrderItemRow,
    OrderQueryRow, OrderRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

// ── Transactions ─────────────────────────────────────────────────────────────

/// Runs `f` against a store inside one read-only, repeatable-read
/// transaction, so every query of a strategy sees the same snapshot.
pub fn read_snapshot<T, F>(conn: &mut PgConnection, f: F) -> Result<T, DomainError>
where
    F: FnOnce(&mut PgStore<'_>) -> Result<T, DomainError>,
{
    conn.build_transaction()
        .read_only()
        .repeatable_read()
        .run(|conn| f(&mut PgStore::new(conn)))
}

/// Runs `f` against a store inside one read-write transaction.
pub fn read_write<T, F>(conn: &mut PgConnection, f: F) -> Result<T, DomainError>
where
    F: FnOnce(&mut PgStore<'_>) -> Result<T, DomainError>,
{
    conn.transaction(|conn| f(&mut PgStore::new(conn)))
}

// ── Filtering ────────────────────────────────────────────────────────────────

/// Escapes `LIKE` wildcards so a member name matches literally.
fn like_pattern(name: &str) -> String {
    let escaped = name
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Applies an [`OrderFilter`] to a boxed query rooted at `orders`. Queries
/// that already join `members` filter on the joined column; the others
/// go through a sub-select.
macro_rules! filter_orders {
    (@common $query:expr, $filter:expr) => {{
        let mut query = $query;
        if let Some(id) = $filter.order_id {
            query = query.filter(orders::id.eq(id));
        }
        if let Some(status) = $filter.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        query
    }};
    ($query:expr, $filter:expr, joined) => {{
        let mut query = filter_orders!(@common $query, $filter);
        if let Some(name) = $filter.member_name.as_deref() {
            query = query.filter(members::name.like(like_pattern(name)));
        }
        query
    }};
    ($query:expr, $filter:expr, subselect) => {{
        let mut query = filter_orders!(@common $query, $filter);
        if let Some(name) = $filter.member_name.as_deref() {
            query = query.filter(
                orders::member_id.eq_any(
                    members::table
                        .filter(members::name.like(like_pattern(name)))
                        .select(members::id),
                ),
            );
        }
        query
    }};
}

macro_rules! paginate {
    ($query:expr, $page:expr) => {{
        let mut query = $query;
        if let Some(page) = $page {
            query = query.offset(page.offset).limit(page.limit);
        }
        query
    }};
}

// ── Store ────────────────────────────────────────────────────────────────────

/// Diesel-backed store over one borrowed connection. Every trait method
/// issues exactly one statement and bumps the query counter.
pub struct PgStore<'c> {
    conn: &'c mut PgConnection,
    queries: usize,
}

impl<'c> PgStore<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn, queries: 0 }
    }

    fn conn(&mut self) -> &mut PgConnection {
        self.queries += 1;
        &mut *self.conn
    }

    fn load_order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError> {
        order_items::table
            .filter(order_items::order_id.eq(order_id))
            .order(order_items::line_no.asc())
            .select(OrderItemRow::as_select())
            .load(self.conn())?
            .into_iter()
            .map(OrderItem::try_from)
            .collect()
    }

    fn load_aggregate(&mut self, row: OrderRow) -> Result<Order, DomainError> {
        let delivery = self.find_delivery(row.delivery_id)?.ok_or_else(|| {
            DomainError::Storage(format!("order {} has no delivery", row.id))
        })?;
        let order_items = self.load_order_items(row.id)?;

        Ok(Order {
            id: row.id,
            member_id: row.member_id,
            delivery,
            order_items,
            order_date: row.order_date,
            status: row.status.parse()?,
        })
    }

    fn root_rows(
        &mut self,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderGraphRow>, DomainError> {
        let source = orders::table.select(OrderRow::as_select()).into_boxed();
        let query = filter_orders!(source, filter, subselect);
        let rows: Vec<OrderRow> = paginate!(query, page)
            .order_by((orders::order_date.asc(), orders::id.asc()))
            .load(self.conn())?;

        rows.into_iter()
            .map(|order| {
                Ok(OrderGraphRow {
                    order: order.try_into()?,
                    member: None,
                    delivery: None,
                    line: None,
                })
            })
            .collect()
    }

    // Both to-one associations are joined; the plan decides which are kept.
    fn to_one_rows(
        &mut self,
        plan: &FetchPlan,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderGraphRow>, DomainError> {
        let source = orders::table
            .inner_join(members::table)
            .inner_join(deliveries::table)
            .select((
                OrderRow::as_select(),
                MemberRow::as_select(),
                DeliveryRow::as_select(),
            ))
            .into_boxed();
        let query = filter_orders!(source, filter, joined);
        let rows: Vec<(OrderRow, MemberRow, DeliveryRow)> = paginate!(query, page)
            .order_by((orders::order_date.asc(), orders::id.asc()))
            .load(self.conn())?;

        rows.into_iter()
            .map(|(order, member, delivery)| graph_row(plan, order, member, delivery, None))
            .collect()
    }

    fn collection_rows(
        &mut self,
        plan: &FetchPlan,
        filter: &OrderFilter,
    ) -> Result<Vec<OrderGraphRow>, DomainError> {
        let source = orders::table
            .inner_join(members::table)
            .inner_join(deliveries::table)
            .inner_join(order_items::table.inner_join(items::table))
            .select((
                OrderRow::as_select(),
                MemberRow::as_select(),
                DeliveryRow::as_select(),
                OrderItemRow::as_select(),
                ItemRow::as_select(),
            ))
            .into_boxed();
        let rows: Vec<(OrderRow, MemberRow, DeliveryRow, OrderItemRow, ItemRow)> =
            filter_orders!(source, filter, joined)
                .order_by((
                    orders::order_date.asc(),
                    orders::id.asc(),
                    order_items::line_no.asc(),
                ))
                .load(self.conn())?;

        rows.into_iter()
            .map(|(order, member, delivery, order_item, item)| {
                let line = OrderLine {
                    order_item: order_item.try_into()?,
                    item: item.try_into()?,
                };
                graph_row(plan, order, member, delivery, Some(line))
            })
            .collect()
    }
}

fn graph_row(
    plan: &FetchPlan,
    order: OrderRow,
    member: MemberRow,
    delivery: DeliveryRow,
    line: Option<OrderLine>,
) -> Result<OrderGraphRow, DomainError> {
    let delivery = if plan.fetches(ToOne::Delivery) {
        Some(delivery.try_into()?)
    } else {
        None
    };
    Ok(OrderGraphRow {
        order: OrderRecord::try_from(order)?,
        member: plan.fetches(ToOne::Member).then(|| member.into()),
        delivery,
        line,
    })
}

impl OrderStore for PgStore<'_> {
    fn run_entity_query(
        &mut self,
        plan: &FetchPlan,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderGraphRow>, DomainError> {
        let joins_to_one = plan.fetches(ToOne::Member) || plan.fetches(ToOne::Delivery);
        match (plan.collection(), joins_to_one) {
            (Some(_), _) => self.collection_rows(plan, filter),
            (None, true) => self.to_one_rows(plan, filter, page),
            (None, false) => self.root_rows(filter, page),
        }
    }

    fn find_member(&mut self, id: Uuid) -> Result<Option<Member>, DomainError> {
        Ok(members::table
            .find(id)
            .select(MemberRow::as_select())
            .first(self.conn())
            .optional()?
            .map(Member::from))
    }

    fn find_delivery(&mut self, id: Uuid) -> Result<Option<Delivery>, DomainError> {
        deliveries::table
            .find(id)
            .select(DeliveryRow::as_select())
            .first(self.conn())
            .optional()?
            .map(Delivery::try_from)
            .transpose()
    }

    fn find_order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError> {
        self.load_order_items(order_id)
    }

    fn find_item(&mut self, id: Uuid) -> Result<Option<Item>, DomainError> {
        self.find_item_by_id(id)
    }

    fn find_order_lines_in(
        &mut self,
        order_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, OrderLine)>, DomainError> {
        let rows: Vec<(OrderItemRow, ItemRow)> = order_items::table
            .inner_join(items::table)
            .filter(order_items::order_id.eq_any(order_ids.to_vec()))
            .order_by((order_items::order_id.asc(), order_items::line_no.asc()))
            .select((OrderItemRow::as_select(), ItemRow::as_select()))
            .load(self.conn())?;

        rows.into_iter()
            .map(|(order_item, item)| {
                let order_id = order_item.order_id;
                let line = OrderLine {
                    order_item: order_item.try_into()?,
                    item: item.try_into()?,
                };
                Ok((order_id, line))
            })
            .collect()
    }

    fn run_root_projection(
        &mut self,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderQueryDto>, DomainError> {
        let source = orders::table
            .inner_join(members::table)
            .inner_join(deliveries::table)
            .select((
                orders::id,
                members::name,
                orders::order_date,
                orders::status,
                deliveries::city,
                deliveries::street,
                deliveries::zipcode,
            ))
            .into_boxed();
        let query = filter_orders!(source, filter, joined);
        let rows: Vec<OrderQueryRow> = paginate!(query, page)
            .order_by((orders::order_date.asc(), orders::id.asc()))
            .load(self.conn())?;

        rows.into_iter().map(OrderQueryDto::try_from).collect()
    }

    fn run_item_projection(
        &mut self,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemQueryDto>, DomainError> {
        let rows: Vec<OrderItemQueryRow> = order_items::table
            .inner_join(items::table)
            .filter(order_items::order_id.eq(order_id))
            .order_by(order_items::line_no.asc())
            .select((
                order_items::order_id,
                items::name,
                order_items::order_price,
                order_items::quantity,
            ))
            .load(self.conn())?;

        Ok(rows.into_iter().map(OrderItemQueryDto::from).collect())
    }

    fn run_item_projection_in(
        &mut self,
        order_ids: &[Uuid],
    ) -> Result<Vec<OrderItemQueryDto>, DomainError> {
        let rows: Vec<OrderItemQueryRow> = order_items::table
            .inner_join(items::table)
            .filter(order_items::order_id.eq_any(order_ids.to_vec()))
            .order_by((order_items::order_id.asc(), order_items::line_no.asc()))
            .select((
                order_items::order_id,
                items::name,
                order_items::order_price,
                order_items::quantity,
            ))
            .load(self.conn())?;

        Ok(rows.into_iter().map(OrderItemQueryDto::from).collect())
    }

    fn run_flat_query(&mut self, filter: &OrderFilter) -> Result<Vec<OrderFlatRow>, DomainError> {
        let source = orders::table
            .inner_join(members::table)
            .inner_join(deliveries::table)
            .inner_join(order_items::table.inner_join(items::table))
            .select((
                orders::id,
                members::name,
                orders::order_date,
                orders::status,
                deliveries::city,
                deliveries::street,
                deliveries::zipcode,
                items::name,
                order_items::order_price,
                order_items::quantity,
            ))
            .into_boxed();
        let rows: Vec<OrderFlatQueryRow> = filter_orders!(source, filter, joined)
            .order_by((
                orders::order_date.asc(),
                orders::id.asc(),
                order_items::line_no.asc(),
            ))
            .load(self.conn())?;

        rows.into_iter().map(OrderFlatRow::try_from).collect()
    }

    fn query_count(&self) -> usize {
        self.queries
    }
}

// ── Write side ───────────────────────────────────────────────────────────────

impl OrderRepository for PgStore<'_> {
    fn insert_order(&mut self, order: &Order) -> Result<(), DomainError> {
        diesel::insert_into(deliveries::table)
            .values(&DeliveryRow::from(&order.delivery))
            .execute(self.conn())?;

        diesel::insert_into(orders::table)
            .values(&OrderRow {
                id: order.id,
                member_id: order.member_id,
                delivery_id: order.delivery.id,
                order_date: order.order_date,
                status: order.status.as_str().to_string(),
            })
            .execute(self.conn())?;

        let lines: Vec<OrderItemRow> = order
            .order_items
            .iter()
            .zip(0..)
            .map(|(order_item, line_no)| OrderItemRow::new(order.id, line_no, order_item))
            .collect();
        diesel::insert_into(order_items::table)
            .values(&lines)
            .execute(self.conn())?;
        Ok(())
    }

    fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let row = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(self.conn())
            .optional()?;
        row.map(|row| self.load_aggregate(row)).transpose()
    }

    fn find_order_for_update(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let row = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .for_update()
            .first(self.conn())
            .optional()?;
        row.map(|row| self.load_aggregate(row)).transpose()
    }

    fn update_order_status(&mut self, order: &Order) -> Result<(), DomainError> {
        let updated = diesel::update(orders::table.find(order.id))
            .set(orders::status.eq(order.status.as_str()))
            .execute(self.conn())?;
        if updated == 0 {
            return Err(DomainError::NotFound);
        }
        for order_item in &order.order_items {
            diesel::update(order_items::table.find(order_item.id))
                .set(order_items::status.eq(order_item.status.as_str()))
                .execute(self.conn())?;
        }
        Ok(())
    }
}

impl MemberRepository for PgStore<'_> {
    fn insert_member(&mut self, member: &Member) -> Result<(), DomainError> {
        diesel::insert_into(members::table)
            .values(&MemberRow::from(member))
            .execute(self.conn())?;
        Ok(())
    }

    fn find_member_by_id(&mut self, id: Uuid) -> Result<Option<Member>, DomainError> {
        self.find_member(id)
    }

    fn find_all_members(&mut self) -> Result<Vec<Member>, DomainError> {
        Ok(members::table
            .order_by((members::name.asc(), members::id.asc()))
            .select(MemberRow::as_select())
            .load(self.conn())?
            .into_iter()
            .map(Member::from)
            .collect())
    }

    fn update_member_name(&mut self, id: Uuid, name: &str) -> Result<(), DomainError> {
        let updated = diesel::update(members::table.find(id))
            .set(members::name.eq(name))
            .execute(self.conn())?;
        if updated == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }
}

impl ItemRepository for PgStore<'_> {
    fn insert_item(&mut self, item: &Item) -> Result<(), DomainError> {
        diesel::insert_into(items::table)
            .values(&ItemRow::from(item))
            .execute(self.conn())?;
        Ok(())
    }

    fn find_item_by_id(&mut self, id: Uuid) -> Result<Option<Item>, DomainError> {
        items::table
            .find(id)
            .select(ItemRow::as_select())
            .first(self.conn())
            .optional()?
            .map(Item::try_from)
            .transpose()
    }

    fn find_item_for_update(&mut self, id: Uuid) -> Result<Option<Item>, DomainError> {
        items::table
            .find(id)
            .select(ItemRow::as_select())
            .for_update()
            .first(self.conn())
            .optional()?
            .map(Item::try_from)
            .transpose()
    }

    fn find_all_items(&mut self) -> Result<Vec<Item>, DomainError> {
        items::table
            .order_by((items::name.asc(), items::id.asc()))
            .select(ItemRow::as_select())
            .load(self.conn())?
            .into_iter()
            .map(Item::try_from)
            .collect()
    }

    fn update_stock(&mut self, item: &Item) -> Result<(), DomainError> {
        let updated = diesel::update(items::table.find(item.id))
            .set(items::stock_quantity.eq(item.stock_quantity))
            .execute(self.conn())?;
        if updated == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    fn update_item(&mut self, item: &Item) -> Result<(), DomainError> {
        let updated = diesel::update(items::table.find(item.id))
            .set((
                items::name.eq(&item.name),
                items::price.eq(&item.price),
                items::stock_quantity.eq(item.stock_quantity),
            ))
            .execute(self.conn())?;
        if updated == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }
}
