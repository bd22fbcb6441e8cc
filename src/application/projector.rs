//! Maps whatever a read strategy produced into the outward response shape.
//! Everything here is pure: inputs are already resolved.

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::model::{Address, OrderStatus};
use crate::domain::projection::{OrderGraph, OrderItemQueryDto, OrderLine, OrderQueryDto};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub item_name: String,
    /// Unit price at order time, e.g. "10000.00"
    pub order_price: String,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemResponse>,
    pub total_price: String,
}

/// Order without its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SimpleOrderResponse {
    pub order_id: Uuid,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
}

pub fn project_graph(graph: &OrderGraph) -> OrderResponse {
    OrderResponse {
        order_id: graph.id,
        name: graph.member.name.clone(),
        order_date: graph.order_date,
        order_status: graph.status,
        address: graph.delivery.address.clone(),
        order_items: graph.lines.iter().map(project_line).collect(),
        total_price: money(&graph.total_price()),
    }
}

fn project_line(line: &OrderLine) -> OrderItemResponse {
    OrderItemResponse {
        item_name: line.item.name.clone(),
        order_price: money(&line.order_item.order_price),
        count: line.order_item.count,
    }
}

pub fn project_query_dto(dto: &OrderQueryDto) -> OrderResponse {
    let total = dto
        .order_items
        .iter()
        .map(|i| &i.order_price * BigDecimal::from(i.count))
        .fold(BigDecimal::zero(), |acc, p| acc + p);
    OrderResponse {
        order_id: dto.order_id,
        name: dto.name.clone(),
        order_date: dto.order_date,
        order_status: dto.order_status,
        address: dto.address.clone(),
        order_items: dto.order_items.iter().map(project_item_dto).collect(),
        total_price: money(&total),
    }
}

fn project_item_dto(dto: &OrderItemQueryDto) -> OrderItemResponse {
    OrderItemResponse {
        item_name: dto.item_name.clone(),
        order_price: money(&dto.order_price),
        count: dto.count,
    }
}

pub fn project_simple(dto: &OrderQueryDto) -> SimpleOrderResponse {
    SimpleOrderResponse {
        order_id: dto.order_id,
        name: dto.name.clone(),
        order_date: dto.order_date,
        order_status: dto.order_status,
        address: dto.address.clone(),
    }
}

fn money(value: &BigDecimal) -> String {
    value.with_scale(2).to_string()
}
