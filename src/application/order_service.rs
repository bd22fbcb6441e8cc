use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::model::{Delivery, Order, OrderItem};
use crate::domain::ports::{ItemRepository, MemberRepository, OrderRepository};

/// Places and cancels orders. The caller owns the transaction the store
/// runs in.
pub struct OrderService<R> {
    repo: R,
}

impl<R> OrderService<R>
where
    R: OrderRepository + MemberRepository + ItemRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Orders `count` units of one item at its current price, delivered to
    /// the member's address.
    pub fn place_order(
        &mut self,
        member_id: Uuid,
        item_id: Uuid,
        count: i32,
    ) -> Result<Uuid, DomainError> {
        let member = self
            .repo
            .find_member_by_id(member_id)?
            .ok_or(DomainError::NotFound)?;
        let mut item = self
            .repo
            .find_item_for_update(item_id)?
            .ok_or(DomainError::NotFound)?;

        let order_price = item.price.clone();
        let order_item = OrderItem::create(&mut item, order_price, count)?;
        let delivery = Delivery::ready(member.address.clone());
        let order = Order::create(&member, delivery, vec![order_item])?;

        self.repo.insert_order(&order)?;
        self.repo.update_stock(&item)?;

        log::info!(
            "order {} placed by member {} ({} x {})",
            order.id,
            member.id,
            count,
            item.name
        );
        Ok(order.id)
    }

    /// Cancels the order and returns the ordered units to stock. Nothing is
    /// written when the aggregate refuses the cancellation, including a
    /// second cancel of the same order.
    pub fn cancel_order(&mut self, order_id: Uuid) -> Result<(), DomainError> {
        let mut order = self
            .repo
            .find_order_for_update(order_id)?
            .ok_or(DomainError::NotFound)?;
        order.cancel()?;

        self.repo.update_order_status(&order)?;
        for order_item in &order.order_items {
            let mut item = self
                .repo
                .find_item_for_update(order_item.item_id)?
                .ok_or(DomainError::NotFound)?;
            item.add_stock(order_item.count);
            self.repo.update_stock(&item)?;
        }

        log::info!("order {} cancelled", order_id);
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.repo
    }
}
