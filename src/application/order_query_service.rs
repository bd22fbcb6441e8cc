use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::fetch::{FetchPlan, FetchStrategy, OrderFilter, Page, StrategyRequest};
use crate::domain::ports::OrderStore;
use crate::domain::projection::{OrderItemQueryDto, OrderLine, OrderQueryDto};

use super::assembler::{assemble, AssembledOrder};
use super::batch_loader::BatchLoader;
use super::flat_grouper::{group_flat_rows, GroupBy};
use super::identity_map::IdentityMap;
use super::projector::{
    project_graph, project_query_dto, project_simple, OrderResponse, SimpleOrderResponse,
};

/// Orders read by one strategy, with the number of queries it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOutcome {
    pub strategy: FetchStrategy,
    pub orders: Vec<OrderResponse>,
    pub query_count: usize,
}

/// Reads the order graph with one of the [`FetchStrategy`] variants. Each
/// strategy resolves exactly the associations it names up front; the
/// projector never triggers a load.
#[derive(Debug, Clone)]
pub struct OrderQueryService {
    loader: BatchLoader,
    group_by: GroupBy,
}

impl OrderQueryService {
    pub fn new(batch_size: usize) -> Self {
        Self {
            loader: BatchLoader::new(batch_size),
            group_by: GroupBy::default(),
        }
    }

    pub fn with_grouping(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    /// Validates the request, then runs the strategy. An invalid request
    /// fails before the store sees any query.
    pub fn find_orders<S: OrderStore>(
        &self,
        store: &mut S,
        request: &StrategyRequest,
    ) -> Result<StrategyOutcome, DomainError> {
        request.validate()?;
        let started_at = store.query_count();
        let filter = &request.filter;
        let page = request.page.as_ref();

        let orders = match request.strategy {
            FetchStrategy::EntityFetchJoin => self.entity_fetch_join(store, filter)?,
            FetchStrategy::EntityPagedBatch => self.entity_paged_batch(store, filter, page)?,
            FetchStrategy::EntityLazy => self.entity_lazy(store, filter, page)?,
            FetchStrategy::ProjectionPerParent => {
                self.projection_per_parent(store, filter, page)?
            }
            FetchStrategy::ProjectionBatch => self.projection_batch(store, filter, page)?,
            FetchStrategy::FlatProjection => self.flat_projection(store, filter)?,
        };

        let query_count = store.query_count() - started_at;
        log::debug!(
            "strategy {} returned {} orders with {} queries",
            request.strategy,
            orders.len(),
            query_count
        );
        Ok(StrategyOutcome {
            strategy: request.strategy,
            orders,
            query_count,
        })
    }

    /// A single order, or `None` when the id matches no row.
    pub fn find_order<S: OrderStore>(
        &self,
        store: &mut S,
        order_id: Uuid,
        strategy: FetchStrategy,
    ) -> Result<Option<OrderResponse>, DomainError> {
        let request = StrategyRequest::new(strategy).with_filter(OrderFilter::by_id(order_id));
        let outcome = self.find_orders(store, &request)?;
        Ok(outcome.orders.into_iter().next())
    }

    /// Orders with their to-one associations only.
    pub fn find_simple_orders<S: OrderStore>(
        &self,
        store: &mut S,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<SimpleOrderResponse>, DomainError> {
        if let Some(page) = page {
            page.validate()?;
        }
        let roots = store.run_root_projection(filter, page)?;
        Ok(roots.iter().map(project_simple).collect())
    }

    /// One query: member, delivery and order items fetch-joined, roots made
    /// distinct by the assembler.
    fn entity_fetch_join<S: OrderStore>(
        &self,
        store: &mut S,
        filter: &OrderFilter,
    ) -> Result<Vec<OrderResponse>, DomainError> {
        let plan = FetchPlan::full_graph();
        plan.validate(None)?;
        let rows = store.run_entity_query(&plan, filter, None)?;
        project_roots(assemble(rows, &plan))
    }

    /// To-one associations fetch-joined and paged, order lines batch-loaded.
    fn entity_paged_batch<S: OrderStore>(
        &self,
        store: &mut S,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderResponse>, DomainError> {
        let plan = FetchPlan::with_to_one();
        plan.validate(page)?;
        let rows = store.run_entity_query(&plan, filter, page)?;
        let mut roots = assemble(rows, &plan);

        let order_ids: Vec<Uuid> = roots.iter().map(AssembledOrder::id).collect();
        let mut lines = self.loader.resolve(
            &order_ids,
            |ids| store.find_order_lines_in(ids),
            |(order_id, _): &(Uuid, OrderLine)| *order_id,
        )?;
        for root in &mut roots {
            let resolved = lines.take(&root.id()).into_iter().map(|(_, line)| line);
            root.lines = Some(resolved.collect());
        }
        project_roots(roots)
    }

    /// Order rows first, then every association loaded explicitly per
    /// order. Members and items shared between orders are loaded once per
    /// request through the identity map.
    fn entity_lazy<S: OrderStore>(
        &self,
        store: &mut S,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderResponse>, DomainError> {
        let plan = FetchPlan::root_only();
        plan.validate(page)?;
        let rows = store.run_entity_query(&plan, filter, page)?;
        let mut roots = assemble(rows, &plan);
        let mut identity = IdentityMap::new();

        for root in &mut roots {
            let order_id = root.id();
            let member = identity
                .get_or_load(root.order.member_id, |id| store.find_member(id))?
                .ok_or_else(|| dangling(order_id, "member", root.order.member_id))?;
            let delivery = identity
                .get_or_load(root.order.delivery_id, |id| store.find_delivery(id))?
                .ok_or_else(|| dangling(order_id, "delivery", root.order.delivery_id))?;

            let mut lines = Vec::new();
            for order_item in store.find_order_items(order_id)? {
                let item_id = order_item.item_id;
                let item = identity
                    .get_or_load(item_id, |id| store.find_item(id))?
                    .ok_or_else(|| dangling(order_id, "item", item_id))?;
                lines.push(OrderLine { order_item, item });
            }

            root.member = Some(member);
            root.delivery = Some(delivery);
            root.lines = Some(lines);
        }
        project_roots(roots)
    }

    /// Root projection, then one item projection per order: 1 + N queries.
    fn projection_per_parent<S: OrderStore>(
        &self,
        store: &mut S,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderResponse>, DomainError> {
        let mut roots = store.run_root_projection(filter, page)?;
        for root in &mut roots {
            root.order_items = store.run_item_projection(root.order_id)?;
        }
        Ok(roots.iter().map(project_query_dto).collect())
    }

    /// Root projection, then item projections for all orders with `IN`:
    /// two queries while the orders fit in one batch.
    fn projection_batch<S: OrderStore>(
        &self,
        store: &mut S,
        filter: &OrderFilter,
        page: Option<&Page>,
    ) -> Result<Vec<OrderResponse>, DomainError> {
        let mut roots = store.run_root_projection(filter, page)?;
        let order_ids: Vec<Uuid> = roots.iter().map(|o| o.order_id).collect();
        let mut items = self.loader.resolve(
            &order_ids,
            |ids| store.run_item_projection_in(ids),
            |item: &OrderItemQueryDto| item.order_id,
        )?;
        for root in &mut roots {
            root.order_items = items.take(&root.order_id);
        }
        Ok(roots.iter().map(project_query_dto).collect())
    }

    /// One denormalized query. Fewer round trips than the batch strategy,
    /// but every order column travels once per order item.
    fn flat_projection<S: OrderStore>(
        &self,
        store: &mut S,
        filter: &OrderFilter,
    ) -> Result<Vec<OrderResponse>, DomainError> {
        let rows = store.run_flat_query(filter)?;
        let grouped: Vec<OrderQueryDto> = group_flat_rows(rows, self.group_by);
        Ok(grouped.iter().map(project_query_dto).collect())
    }
}

fn project_roots(roots: Vec<AssembledOrder>) -> Result<Vec<OrderResponse>, DomainError> {
    roots
        .into_iter()
        .map(|root| root.into_graph().map(|graph| project_graph(&graph)))
        .collect()
}

fn dangling(order_id: Uuid, association: &str, target: Uuid) -> DomainError {
    DomainError::Storage(format!(
        "order {order_id} references missing {association} {target}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::InMemoryStore;
    use crate::domain::errors::FetchPlanError;
    use crate::domain::model::OrderStatus;

    fn service() -> OrderQueryService {
        OrderQueryService::new(100)
    }

    fn run(store: &mut InMemoryStore, strategy: FetchStrategy) -> StrategyOutcome {
        service()
            .find_orders(store, &StrategyRequest::new(strategy))
            .unwrap()
    }

    fn seeded() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.seed_order("member1", &[("JPA1 BOOK", 10000, 2), ("JPA2 BOOK", 5000, 1)]);
        store.seed_order("member2", &[("SPRING1 BOOK", 20000, 3), ("SPRING2 BOOK", 40000, 4)]);
        store.seed_order("member3", &[("RUST BOOK", 30000, 1)]);
        store
    }

    #[test]
    fn every_strategy_produces_the_same_orders() {
        let mut store = seeded();
        let expected = run(&mut store, FetchStrategy::EntityFetchJoin).orders;
        assert_eq!(expected.len(), 3);

        for strategy in FetchStrategy::ALL {
            let outcome = run(&mut store, strategy);
            assert_eq!(outcome.orders, expected, "strategy {strategy}");
        }
    }

    #[test]
    fn total_price_is_identical_under_every_strategy() {
        let mut store = InMemoryStore::new();
        store.seed_order("member1", &[("A", 10000, 2), ("B", 5000, 1)]);

        for strategy in FetchStrategy::ALL {
            let outcome = run(&mut store, strategy);
            assert_eq!(outcome.orders.len(), 1);
            assert_eq!(outcome.orders[0].total_price, "25000.00", "strategy {strategy}");
            assert_eq!(outcome.orders[0].order_items.len(), 2);
        }
    }

    #[test]
    fn query_counts_follow_each_strategy_shape() {
        let mut store = seeded();
        let n = 3;

        assert_eq!(run(&mut store, FetchStrategy::EntityFetchJoin).query_count, 1);
        assert_eq!(run(&mut store, FetchStrategy::EntityPagedBatch).query_count, 2);
        assert_eq!(run(&mut store, FetchStrategy::ProjectionPerParent).query_count, 1 + n);
        assert_eq!(run(&mut store, FetchStrategy::ProjectionBatch).query_count, 2);
        assert_eq!(run(&mut store, FetchStrategy::FlatProjection).query_count, 1);
        // root + (member + delivery + order items) per order + one per distinct item
        assert_eq!(run(&mut store, FetchStrategy::EntityLazy).query_count, 1 + 3 * n + 5);
    }

    #[test]
    fn batch_strategy_stays_at_two_queries_as_orders_grow() {
        for orders in [1, 10, 50] {
            let mut store = InMemoryStore::new();
            for i in 0..orders {
                store.seed_order(&format!("member{i}"), &[("A", 100, 1)]);
            }
            assert_eq!(run(&mut store, FetchStrategy::ProjectionBatch).query_count, 2);
            assert_eq!(
                run(&mut store, FetchStrategy::ProjectionPerParent).query_count,
                1 + orders
            );
        }
    }

    #[test]
    fn batch_size_bounds_each_in_query() {
        let mut store = InMemoryStore::new();
        for i in 0..5 {
            store.seed_order(&format!("member{i}"), &[("A", 100, 1)]);
        }
        let service = OrderQueryService::new(2);

        for strategy in [FetchStrategy::ProjectionBatch, FetchStrategy::EntityPagedBatch] {
            let outcome = service
                .find_orders(&mut store, &StrategyRequest::new(strategy))
                .unwrap();
            assert_eq!(outcome.query_count, 1 + 3, "strategy {strategy}");
            assert_eq!(outcome.orders.len(), 5);
        }
    }

    #[test]
    fn lazy_strategy_loads_shared_member_and_item_once() {
        let mut store = InMemoryStore::new();
        let member = store.seed_member("member1");
        let item = store.seed_item("A", 100, 100);
        store.seed_order_for(member, &[(item, 1)]);
        store.seed_order_for(member, &[(item, 2)]);

        let outcome = run(&mut store, FetchStrategy::EntityLazy);

        // root + member + item + (delivery + order items) per order
        assert_eq!(outcome.query_count, 1 + 1 + 1 + 2 * 2);
        assert_eq!(outcome.orders.len(), 2);
    }

    #[test]
    fn paging_a_collection_join_fails_before_any_query() {
        let mut store = seeded();
        for strategy in [FetchStrategy::EntityFetchJoin, FetchStrategy::FlatProjection] {
            let request = StrategyRequest::new(strategy).with_page(Page::new(0, 10));

            let err = service().find_orders(&mut store, &request).unwrap_err();

            assert!(matches!(
                err,
                DomainError::InvalidFetchPlan(FetchPlanError::PaginationUnsupported(s)) if s == strategy
            ));
        }
        assert_eq!(store.query_count(), 0);
    }

    #[test]
    fn pageable_strategies_page_on_orders() {
        let mut store = seeded();
        let all = run(&mut store, FetchStrategy::ProjectionBatch).orders;

        for strategy in FetchStrategy::ALL.into_iter().filter(FetchStrategy::supports_pagination) {
            let request = StrategyRequest::new(strategy).with_page(Page::new(1, 1));
            let outcome = service().find_orders(&mut store, &request).unwrap();
            assert_eq!(outcome.orders, all[1..2].to_vec(), "strategy {strategy}");
        }
    }

    #[test]
    fn filters_apply_to_every_strategy() {
        let mut store = seeded();
        let filter = OrderFilter {
            member_name: Some("member2".to_string()),
            ..OrderFilter::default()
        };

        for strategy in FetchStrategy::ALL {
            let request = StrategyRequest::new(strategy).with_filter(filter.clone());
            let outcome = service().find_orders(&mut store, &request).unwrap();
            assert_eq!(outcome.orders.len(), 1, "strategy {strategy}");
            assert_eq!(outcome.orders[0].name, "member2");
        }

        let cancelled = OrderFilter {
            status: Some(OrderStatus::Cancel),
            ..OrderFilter::default()
        };
        let request = StrategyRequest::new(FetchStrategy::FlatProjection).with_filter(cancelled);
        assert!(service().find_orders(&mut store, &request).unwrap().orders.is_empty());
    }

    #[test]
    fn unknown_order_is_a_miss_not_an_error() {
        let mut store = seeded();
        for strategy in FetchStrategy::ALL {
            let found = service()
                .find_order(&mut store, Uuid::new_v4(), strategy)
                .unwrap();
            assert!(found.is_none(), "strategy {strategy}");
        }
    }

    #[test]
    fn find_order_returns_the_requested_order() {
        let mut store = seeded();
        let id = store.seed_order("member9", &[("A", 100, 1)]);
        let found = service()
            .find_order(&mut store, id, FetchStrategy::EntityLazy)
            .unwrap()
            .unwrap();
        assert_eq!(found.order_id, id);
        assert_eq!(found.name, "member9");
    }

    #[test]
    fn storage_failures_propagate_unchanged() {
        let mut store = seeded();
        store.fail_after(1);

        for strategy in [
            FetchStrategy::EntityPagedBatch,
            FetchStrategy::EntityLazy,
            FetchStrategy::ProjectionPerParent,
            FetchStrategy::ProjectionBatch,
        ] {
            store.reset_query_count();
            let err = service()
                .find_orders(&mut store, &StrategyRequest::new(strategy))
                .unwrap_err();
            assert!(matches!(err, DomainError::Storage(_)), "strategy {strategy}");
        }
    }

    #[test]
    fn single_query_strategies_fail_on_their_only_query() {
        let mut store = seeded();
        store.fail_after(0);

        for strategy in [FetchStrategy::EntityFetchJoin, FetchStrategy::FlatProjection] {
            store.reset_query_count();
            let err = service()
                .find_orders(&mut store, &StrategyRequest::new(strategy))
                .unwrap_err();
            assert!(matches!(err, DomainError::Storage(_)), "strategy {strategy}");
            assert_eq!(store.query_count(), 1, "strategy {strategy}");
        }
    }

    #[test]
    fn simple_orders_skip_items_in_one_query() {
        let mut store = seeded();
        let simple = service()
            .find_simple_orders(&mut store, &OrderFilter::default(), Some(&Page::new(0, 2)))
            .unwrap();
        assert_eq!(simple.len(), 2);
        assert_eq!(store.query_count(), 1);
    }

    #[test]
    fn field_grouping_matches_id_grouping_on_consistent_data() {
        let mut store = seeded();
        let by_id = run(&mut store, FetchStrategy::FlatProjection).orders;
        let by_fields = service()
            .with_grouping(GroupBy::OrderFields)
            .find_orders(&mut store, &StrategyRequest::new(FetchStrategy::FlatProjection))
            .unwrap()
            .orders;
        assert_eq!(by_id, by_fields);
    }
}
