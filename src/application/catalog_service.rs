use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::model::{Item, Member};
use crate::domain::ports::{ItemRepository, MemberRepository};

/// Member and item maintenance. The caller owns the transaction.
pub struct CatalogService<R> {
    repo: R,
}

impl<R> CatalogService<R>
where
    R: MemberRepository + ItemRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn member(&mut self, id: Uuid) -> Result<Member, DomainError> {
        self.repo
            .find_member_by_id(id)?
            .ok_or(DomainError::NotFound)
    }

    /// Renames the member and returns it as stored.
    pub fn rename_member(&mut self, id: Uuid, name: &str) -> Result<Member, DomainError> {
        require_name(name)?;
        self.repo.update_member_name(id, name)?;
        let member = self.member(id)?;
        log::info!("member {} renamed", id);
        Ok(member)
    }

    pub fn item(&mut self, id: Uuid) -> Result<Item, DomainError> {
        self.repo.find_item_by_id(id)?.ok_or(DomainError::NotFound)
    }

    /// Replaces name, price and stock. The item row stays locked until the
    /// transaction ends, so concurrent orders see either the old or the new
    /// stock.
    pub fn change_item(
        &mut self,
        id: Uuid,
        name: &str,
        price: BigDecimal,
        stock_quantity: i32,
    ) -> Result<Item, DomainError> {
        require_name(name)?;
        let mut item = self
            .repo
            .find_item_for_update(id)?
            .ok_or(DomainError::NotFound)?;
        item.change(name, price, stock_quantity)?;
        self.repo.update_item(&item)?;
        log::info!("item {} changed", id);
        Ok(item)
    }

    pub fn into_inner(self) -> R {
        self.repo
    }
}

pub fn require_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidInput("name must not be blank".to_string()));
    }
    Ok(())
}
