//! Ordered item collection enforcing single ownership.
//!
//! Mutation goes through [`StudyList`](crate::list::StudyList), which marks
//! itself modified and notifies subscribers for every change reported here.

use crate::error::{Result, StudyError};
use crate::item::Item;
use crate::list::ListId;

/// Describes one mutation of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    Inserted(usize),
    Removed(usize),
    Replaced(usize),
    Updated(usize),
    Cleared,
}

/// Items of one list in insertion order.
#[derive(Debug, Clone)]
pub struct ItemRegistry {
    owner: ListId,
    items: Vec<Item>,
}

impl ItemRegistry {
    pub(crate) fn new(owner: ListId) -> Self {
        Self {
            owner,
            items: Vec::new(),
        }
    }

    pub fn owner(&self) -> ListId {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Item] {
        &self.items
    }

    /// Sum of all item weights.
    pub fn total_weight(&self) -> f64 {
        self.items.iter().map(Item::weight).sum()
    }

    pub(crate) fn insert(&mut self, index: usize, mut item: Item) -> Result<ItemChange> {
        if index > self.items.len() {
            return Err(self.out_of_range(index));
        }
        if let Some(owner) = item.owner() {
            return Err(self.conflict(&item, owner));
        }
        item.set_owner(Some(self.owner));
        self.items.insert(index, item);
        Ok(ItemChange::Inserted(index))
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<Item> {
        if index >= self.items.len() {
            return Err(self.out_of_range(index));
        }
        let mut item = self.items.remove(index);
        item.set_owner(None);
        Ok(item)
    }

    /// Swap in `item` at `index`, returning the released previous item.
    pub(crate) fn replace(&mut self, index: usize, mut item: Item) -> Result<Item> {
        if index >= self.items.len() {
            return Err(self.out_of_range(index));
        }
        if let Some(owner) = item.owner() {
            return Err(self.conflict(&item, owner));
        }
        item.set_owner(Some(self.owner));
        let mut previous = std::mem::replace(&mut self.items[index], item);
        previous.set_owner(None);
        Ok(previous)
    }

    pub(crate) fn clear(&mut self) -> Vec<Item> {
        let mut released = std::mem::take(&mut self.items);
        for item in &mut released {
            item.set_owner(None);
        }
        released
    }

    /// Apply `edit` to one item. Ownership survives even if the closure
    /// overwrites the whole record.
    pub(crate) fn update<F>(&mut self, index: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Item),
    {
        let len = self.items.len();
        let owner = self.owner;
        let item = self
            .items
            .get_mut(index)
            .ok_or(StudyError::IndexOutOfRange { index, len })?;
        edit(item);
        item.set_owner(Some(owner));
        Ok(())
    }

    pub(crate) fn for_each_mut(&mut self, mut f: impl FnMut(&mut Item)) {
        for item in &mut self.items {
            f(item);
        }
    }

    fn conflict(&self, item: &Item, owner: ListId) -> StudyError {
        tracing::warn!(
            phrase = %item.phrase,
            %owner,
            list = %self.owner,
            "rejected item owned by another list"
        );
        StudyError::OwnershipConflict { owner }
    }

    fn out_of_range(&self, index: usize) -> StudyError {
        StudyError::IndexOutOfRange {
            index,
            len: self.items.len(),
        }
    }
}

impl<'a> IntoIterator for &'a ItemRegistry {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
