use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::fetch::FetchPlan;
use crate::domain::model::{Delivery, Member};
use crate::domain::projection::{OrderGraph, OrderGraphRow, OrderLine, OrderRecord};

/// An order root rebuilt from entity rows. Associations the fetch plan did
/// not resolve stay `None` until a later step fills them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledOrder {
    pub order: OrderRecord,
    pub member: Option<Member>,
    pub delivery: Option<Delivery>,
    pub lines: Option<Vec<OrderLine>>,
}

impl AssembledOrder {
    fn from_row(row: &OrderGraphRow, joins_collection: bool) -> Self {
        Self {
            order: row.order.clone(),
            member: row.member.clone(),
            delivery: row.delivery.clone(),
            lines: joins_collection.then(Vec::new),
        }
    }

    pub fn id(&self) -> Uuid {
        self.order.id
    }

    /// Converts into a fully resolved graph. Fails instead of loading
    /// whatever is still missing.
    pub fn into_graph(self) -> Result<OrderGraph, DomainError> {
        let id = self.order.id;
        Ok(OrderGraph {
            id,
            order_date: self.order.order_date,
            status: self.order.status,
            member: self.member.ok_or_else(|| unresolved(id, "member"))?,
            delivery: self.delivery.ok_or_else(|| unresolved(id, "delivery"))?,
            lines: self.lines.ok_or_else(|| unresolved(id, "order items"))?,
        })
    }
}

fn unresolved(order_id: Uuid, association: &str) -> DomainError {
    DomainError::Storage(format!(
        "association not resolved: {association} of order {order_id}"
    ))
}

/// Rebuilds order roots from entity-graph rows.
///
/// DISTINCT is applied here, in memory, not by the storage query: storage
/// returns joined rows unchanged and this function drops repeated roots.
///
/// Rows sharing an order id collapse into one root through a request-scoped
/// identity map, and each joined order line is attached in row order. With
/// a distinct plan every root is returned once, in first-seen order;
/// otherwise one root is returned per row, so a collection join yields each
/// order once per order item.
pub fn assemble(rows: Vec<OrderGraphRow>, plan: &FetchPlan) -> Vec<AssembledOrder> {
    let joins_collection = plan.collection().is_some();
    let mut roots: Vec<AssembledOrder> = Vec::new();
    let mut identity: HashMap<Uuid, usize> = HashMap::new();
    let mut row_roots: Vec<usize> = Vec::with_capacity(rows.len());

    for row in rows {
        let slot = *identity.entry(row.order.id).or_insert_with(|| {
            roots.push(AssembledOrder::from_row(&row, joins_collection));
            roots.len() - 1
        });
        if let (Some(line), Some(lines)) = (row.line, roots[slot].lines.as_mut()) {
            lines.push(line);
        }
        row_roots.push(slot);
    }

    if plan.is_distinct() {
        roots
    } else {
        row_roots.into_iter().map(|slot| roots[slot].clone()).collect()
    }
}
