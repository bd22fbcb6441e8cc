pub mod assembler;
pub mod batch_loader;
pub mod catalog_service;
pub mod flat_grouper;
pub mod identity_map;
pub mod order_query_service;
pub mod order_service;
pub mod projector;

#[cfg(test)]
pub(crate) mod test_support;
