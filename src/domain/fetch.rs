use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::{DomainError, FetchPlanError};
use super::model::OrderStatus;

/// To-one associations of an order. Joining them never multiplies rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToOne {
    Member,
    Delivery,
}

/// One-to-many associations of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Order items, each with its item fetch-joined.
    OrderItems,
}

/// Which associations an entity-graph query resolves in the same round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPlan {
    to_one: Vec<ToOne>,
    collections: Vec<Collection>,
    distinct: bool,
}

impl FetchPlan {
    /// Order rows only; every association is left unresolved.
    pub fn root_only() -> Self {
        Self::default()
    }

    pub fn with_to_one() -> Self {
        Self::root_only()
            .join(ToOne::Member)
            .join(ToOne::Delivery)
    }

    pub fn full_graph() -> Self {
        Self::with_to_one()
            .join_collection(Collection::OrderItems)
            .distinct()
    }

    pub fn join(mut self, association: ToOne) -> Self {
        if !self.to_one.contains(&association) {
            self.to_one.push(association);
        }
        self
    }

    pub fn join_collection(mut self, collection: Collection) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn fetches(&self, association: ToOne) -> bool {
        self.to_one.contains(&association)
    }

    pub fn collection(&self) -> Option<Collection> {
        self.collections.first().copied()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Rejects plans whose result would be silently wrong.
    ///
    /// Two collection joins multiply rows by the product of both collection
    /// sizes, and a collection join makes offset/limit count joined rows
    /// instead of orders.
    pub fn validate(&self, page: Option<&Page>) -> Result<(), FetchPlanError> {
        if self.collections.len() > 1 {
            return Err(FetchPlanError::MultipleCollectionJoins);
        }
        if let Some(page) = page {
            page.validate()?;
            if !self.collections.is_empty() {
                return Err(FetchPlanError::PaginatedCollectionJoin);
            }
        }
        if !self.collections.is_empty() && !self.distinct {
            return Err(FetchPlanError::CollectionJoinWithoutDistinct);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    pub fn validate(&self) -> Result<(), FetchPlanError> {
        if self.limit <= 0 || self.offset < 0 {
            return Err(FetchPlanError::InvalidPage);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub order_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    /// Substring match on the member name.
    pub member_name: Option<String>,
}

impl OrderFilter {
    pub fn by_id(order_id: Uuid) -> Self {
        Self {
            order_id: Some(order_id),
            ..Self::default()
        }
    }
}

/// The six ways of reading the order graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStrategy {
    /// Entities, member/delivery/order items fetch-joined, distinct roots.
    EntityFetchJoin,
    /// Entities, to-one fetch-joined and paged; order items batch-loaded.
    EntityPagedBatch,
    /// Entities, every association loaded per parent (N+1).
    EntityLazy,
    /// Root projection, then one item projection per order (N+1).
    ProjectionPerParent,
    /// Root projection, then item projections batched with `IN`.
    ProjectionBatch,
    /// One denormalized query, regrouped in memory.
    FlatProjection,
}

impl FetchStrategy {
    pub const ALL: [FetchStrategy; 6] = [
        FetchStrategy::EntityFetchJoin,
        FetchStrategy::EntityPagedBatch,
        FetchStrategy::EntityLazy,
        FetchStrategy::ProjectionPerParent,
        FetchStrategy::ProjectionBatch,
        FetchStrategy::FlatProjection,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FetchStrategy::EntityFetchJoin => "entity-fetch-join",
            FetchStrategy::EntityPagedBatch => "entity-paged-batch",
            FetchStrategy::EntityLazy => "entity-lazy",
            FetchStrategy::ProjectionPerParent => "projection-per-parent",
            FetchStrategy::ProjectionBatch => "projection-batch",
            FetchStrategy::FlatProjection => "flat-projection",
        }
    }

    /// Strategies whose root query joins a collection cannot page on orders.
    pub fn supports_pagination(&self) -> bool {
        !matches!(
            self,
            FetchStrategy::EntityFetchJoin | FetchStrategy::FlatProjection
        )
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FetchStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FetchStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown fetch strategy '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyRequest {
    pub strategy: FetchStrategy,
    pub filter: OrderFilter,
    pub page: Option<Page>,
}

impl StrategyRequest {
    pub fn new(strategy: FetchStrategy) -> Self {
        Self {
            strategy,
            filter: OrderFilter::default(),
            page: None,
        }
    }

    pub fn with_filter(mut self, filter: OrderFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    pub fn validate(&self) -> Result<(), FetchPlanError> {
        if let Some(page) = &self.page {
            if !self.strategy.supports_pagination() {
                return Err(FetchPlanError::PaginationUnsupported(self.strategy));
            }
            page.validate()?;
        }
        Ok(())
    }
}
