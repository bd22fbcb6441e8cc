use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::domain::errors::DomainError;

/// Resolves a one-to-many collection for many parents with `IN` queries
/// instead of one query per parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLoader {
    batch_size: usize,
}

impl BatchLoader {
    /// `batch_size` bounds the number of parent ids per `IN` query.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of `fetch` calls `resolve` makes for `parent_count` distinct ids.
    pub fn batches_for(&self, parent_count: usize) -> usize {
        parent_count.div_ceil(self.batch_size)
    }

    /// Calls `fetch` once per chunk of distinct parent ids and groups the
    /// returned children by `key_of`. Children keep the order `fetch`
    /// returned them in.
    pub fn resolve<K, C, F, G>(
        &self,
        parent_ids: &[K],
        mut fetch: F,
        key_of: G,
    ) -> Result<ChildMap<K, C>, DomainError>
    where
        K: Eq + Hash + Clone,
        F: FnMut(&[K]) -> Result<Vec<C>, DomainError>,
        G: Fn(&C) -> K,
    {
        let ids = distinct_in_order(parent_ids);
        let mut children: HashMap<K, Vec<C>> = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(self.batch_size) {
            for child in fetch(chunk)? {
                children.entry(key_of(&child)).or_default().push(child);
            }
        }

        Ok(ChildMap { children })
    }
}

fn distinct_in_order<K: Eq + Hash + Clone>(ids: &[K]) -> Vec<K> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().filter(|id| seen.insert(*id)).cloned().collect()
}

/// Children grouped by parent id. A parent without children maps to an
/// empty sequence.
#[derive(Debug)]
pub struct ChildMap<K, C> {
    children: HashMap<K, Vec<C>>,
}

impl<K: Eq + Hash, C> ChildMap<K, C> {
    pub fn get(&self, parent_id: &K) -> &[C] {
        self.children
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Moves a parent's children out of the map.
    pub fn take(&mut self, parent_id: &K) -> Vec<C> {
        self.children.remove(parent_id).unwrap_or_default()
    }
}
