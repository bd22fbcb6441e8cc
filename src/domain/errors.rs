use bigdecimal::BigDecimal;
use thiserror::Error;

use super::fetch::FetchStrategy;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid fetch plan: {0}")]
    InvalidFetchPlan(#[from] FetchPlanError),
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    #[error("Not enough stock: requested {requested}, available {available}")]
    NotEnoughStock { requested: i32, available: i32 },
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Rejections raised before any query is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchPlanError {
    #[error("at most one one-to-many collection may be fetch-joined per query")]
    MultipleCollectionJoins,
    #[error("a one-to-many fetch-join cannot be paginated")]
    PaginatedCollectionJoin,
    #[error("a one-to-many fetch-join requires a distinct root step")]
    CollectionJoinWithoutDistinct,
    #[error("strategy {0} does not accept pagination")]
    PaginationUnsupported(FetchStrategy),
    #[error("page limit must be greater than zero")]
    InvalidPage,
}

impl DomainError {
    pub fn not_enough_stock(requested: i32, available: i32) -> Self {
        DomainError::NotEnoughStock {
            requested,
            available,
        }
    }

    pub fn invalid_price(price: &BigDecimal) -> Self {
        DomainError::InvalidInput(format!("price must not be negative, got {price}"))
    }
}
