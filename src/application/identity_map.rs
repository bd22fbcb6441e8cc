use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::model::{Delivery, Item, Member};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Member,
    Delivery,
    Item,
}

#[derive(Debug, Clone)]
pub enum CachedEntity {
    Member(Member),
    Delivery(Delivery),
    Item(Item),
}

/// Entities that can be cached in an [`IdentityMap`].
pub trait Cached: Clone {
    const KIND: EntityKind;

    fn wrap(self) -> CachedEntity;

    fn unwrap(entity: &CachedEntity) -> Option<&Self>;
}

impl Cached for Member {
    const KIND: EntityKind = EntityKind::Member;

    fn wrap(self) -> CachedEntity {
        CachedEntity::Member(self)
    }

    fn unwrap(entity: &CachedEntity) -> Option<&Self> {
        match entity {
            CachedEntity::Member(m) => Some(m),
            _ => None,
        }
    }
}

impl Cached for Delivery {
    const KIND: EntityKind = EntityKind::Delivery;

    fn wrap(self) -> CachedEntity {
        CachedEntity::Delivery(self)
    }

    fn unwrap(entity: &CachedEntity) -> Option<&Self> {
        match entity {
            CachedEntity::Delivery(d) => Some(d),
            _ => None,
        }
    }
}

impl Cached for Item {
    const KIND: EntityKind = EntityKind::Item;

    fn wrap(self) -> CachedEntity {
        CachedEntity::Item(self)
    }

    fn unwrap(entity: &CachedEntity) -> Option<&Self> {
        match entity {
            CachedEntity::Item(i) => Some(i),
            _ => None,
        }
    }
}

/// Request-scoped cache keyed by (entity kind, id). Created per request and
/// dropped with it; never shared between requests.
#[derive(Debug, Default)]
pub struct IdentityMap {
    entries: HashMap<(EntityKind, Uuid), CachedEntity>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entity or calls `load`. Misses are not cached.
    pub fn get_or_load<T, F>(&mut self, id: Uuid, load: F) -> Result<Option<T>, DomainError>
    where
        T: Cached,
        F: FnOnce(Uuid) -> Result<Option<T>, DomainError>,
    {
        if let Some(entity) = self.entries.get(&(T::KIND, id)).and_then(T::unwrap) {
            return Ok(Some(entity.clone()));
        }
        let loaded = load(id)?;
        if let Some(entity) = &loaded {
            self.entries.insert((T::KIND, id), entity.clone().wrap());
        }
        Ok(loaded)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
