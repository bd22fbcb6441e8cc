use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::model::{Address, OrderStatus};
use crate::domain::projection::{OrderFlatRow, OrderQueryDto};

/// How flat rows are assigned to an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupBy {
    /// Rows with the same order id form one order. The order-level fields of
    /// the first row win.
    #[default]
    OrderId,
    /// Rows form one order only when every order-level field is equal. A
    /// single differing field splits one order into several groups.
    OrderFields,
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum GroupKey {
    Id(Uuid),
    Fields {
        order_id: Uuid,
        name: String,
        order_date: DateTime<Utc>,
        order_status: OrderStatus,
        address: Address,
    },
}

impl GroupBy {
    fn key_of(&self, order: &OrderQueryDto) -> GroupKey {
        match self {
            GroupBy::OrderId => GroupKey::Id(order.order_id),
            GroupBy::OrderFields => GroupKey::Fields {
                order_id: order.order_id,
                name: order.name.clone(),
                order_date: order.order_date,
                order_status: order.order_status,
                address: order.address.clone(),
            },
        }
    }
}

/// Regroups denormalized (order × order item) rows into orders with nested
/// items. Orders come out in first-seen order, items in row order.
pub fn group_flat_rows(rows: Vec<OrderFlatRow>, group_by: GroupBy) -> Vec<OrderQueryDto> {
    let mut groups: Vec<OrderQueryDto> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();

    for row in rows {
        let (order, item) = row.into_parts();
        let key = group_by.key_of(&order);
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                groups.push(order);
                index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].order_items.push(item);
    }

    groups
}
