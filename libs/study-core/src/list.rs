//! Study list: named item collection with hint flags and change notification.

use crate::error::{Result, StudyError};
use crate::item::Item;
use crate::registry::{ItemChange, ItemRegistry};
use std::fmt;
use uuid::Uuid;

/// Identity of a study list, used as the ownership tag on its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(Uuid);

impl ListId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Change notification delivered to list subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
    Renamed,
    FlagsChanged,
    Items(ItemChange),
    StatisticsReset,
    Loaded,
    Saved,
}

/// Handle returned by [`StudyList::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ListEvent)>;

/// Named, ordered list of items plus presentation flags.
pub struct StudyList {
    id: ListId,
    name: String,
    hint_readings: bool,
    hint_example: bool,
    show_reversed_cards: bool,
    items: ItemRegistry,
    modified: bool,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl StudyList {
    /// Create an empty, unmodified list.
    pub fn new(name: impl Into<String>) -> Self {
        let id = ListId::new();
        Self {
            id,
            name: name.into(),
            hint_readings: false,
            hint_example: false,
            show_reversed_cards: false,
            items: ItemRegistry::new(id),
            modified: false,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hint_readings(&self) -> bool {
        self.hint_readings
    }

    pub fn hint_example(&self) -> bool {
        self.hint_example
    }

    pub fn show_reversed_cards(&self) -> bool {
        self.show_reversed_cards
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn items(&self) -> &ItemRegistry {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name != self.name {
            self.name = name;
            self.touch(ListEvent::Renamed);
        }
    }

    pub fn set_hint_readings(&mut self, value: bool) {
        if value != self.hint_readings {
            self.hint_readings = value;
            self.touch(ListEvent::FlagsChanged);
        }
    }

    pub fn set_hint_example(&mut self, value: bool) {
        if value != self.hint_example {
            self.hint_example = value;
            self.touch(ListEvent::FlagsChanged);
        }
    }

    pub fn set_show_reversed_cards(&mut self, value: bool) {
        if value != self.show_reversed_cards {
            self.show_reversed_cards = value;
            self.touch(ListEvent::FlagsChanged);
        }
    }

    /// Insert an unowned item at `index`.
    pub fn insert_item(&mut self, index: usize, item: Item) -> Result<()> {
        let change = self.items.insert(index, item)?;
        self.touch(ListEvent::Items(change));
        Ok(())
    }

    /// Append an unowned item, returning its index.
    pub fn push_item(&mut self, item: Item) -> Result<usize> {
        let index = self.items.len();
        self.insert_item(index, item)?;
        Ok(index)
    }

    /// Append several items. Nothing is inserted if any of them is owned.
    pub fn extend_items(&mut self, items: impl IntoIterator<Item = Item>) -> Result<usize> {
        let items: Vec<Item> = items.into_iter().collect();
        if let Some(owner) = items.iter().find_map(Item::owner) {
            tracing::warn!(%owner, list = %self.id, "rejected batch containing an owned item");
            return Err(StudyError::OwnershipConflict { owner });
        }
        let count = items.len();
        for item in items {
            self.push_item(item)?;
        }
        Ok(count)
    }

    /// Remove an item; the returned item is unowned.
    pub fn remove_item(&mut self, index: usize) -> Result<Item> {
        let item = self.items.remove(index)?;
        self.touch(ListEvent::Items(ItemChange::Removed(index)));
        Ok(item)
    }

    /// Replace the item at `index`, returning the released one.
    pub fn replace_item(&mut self, index: usize, item: Item) -> Result<Item> {
        let previous = self.items.replace(index, item)?;
        self.touch(ListEvent::Items(ItemChange::Replaced(index)));
        Ok(previous)
    }

    /// Remove every item; the returned items are unowned.
    pub fn clear_items(&mut self) -> Vec<Item> {
        let released = self.items.clear();
        self.touch(ListEvent::Items(ItemChange::Cleared));
        released
    }

    /// Edit the fields of one item in place.
    pub fn edit_item<F>(&mut self, index: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Item),
    {
        self.items.update(index, edit)?;
        self.touch(ListEvent::Items(ItemChange::Updated(index)));
        Ok(())
    }

    /// Count one answer for the item at `index`.
    pub fn record_answer(&mut self, index: usize, correct: bool) -> Result<()> {
        self.edit_item(index, |item| item.record(correct))
    }

    /// Zero the counters of every item.
    pub fn reset_statistics(&mut self) {
        self.items.for_each_mut(Item::reset_counts);
        self.touch(ListEvent::StatisticsReset);
    }

    /// Correct answers over presentations across the whole list.
    pub fn correct_rate(&self) -> f64 {
        let (shown, correct) = self.items.iter().fold((0u64, 0u64), |(s, c), item| {
            (
                s + u64::from(item.shown_count()),
                c + u64::from(item.correct_count()),
            )
        });
        if shown == 0 {
            0.0
        } else {
            correct as f64 / shown as f64
        }
    }

    /// Register a callback invoked after every change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ListEvent) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a callback. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Clear the modified flag after a successful load or save.
    pub(crate) fn mark_clean(&mut self, event: ListEvent) {
        self.modified = false;
        self.notify(event);
    }

    fn touch(&mut self, event: ListEvent) {
        self.modified = true;
        tracing::trace!(list = %self.id, ?event, "list modified");
        self.notify(event);
    }

    fn notify(&mut self, event: ListEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

impl fmt::Debug for StudyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudyList")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("hint_readings", &self.hint_readings)
            .field("hint_example", &self.hint_example)
            .field("show_reversed_cards", &self.show_reversed_cards)
            .field("items", &self.items)
            .field("modified", &self.modified)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(list: &mut StudyList) -> (SubscriptionId, Rc<RefCell<Vec<ListEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let id = list.subscribe(move |event| sink.borrow_mut().push(*event));
        (id, events)
    }

    #[test]
    fn new_list_is_clean() {
        let list = StudyList::new("JLPT N5");
        assert!(!list.is_modified());
        assert!(list.is_empty());
    }

    #[test]
    fn insert_marks_modified_and_notifies() {
        let mut list = StudyList::new("verbs");
        let (_, events) = recorder(&mut list);
        list.push_item(Item::new("食べる", "to eat")).unwrap();
        assert!(list.is_modified());
        assert_eq!(*events.borrow(), [ListEvent::Items(ItemChange::Inserted(0))]);
    }

    #[test]
    fn rejected_insert_leaves_list_untouched() {
        let mut source = StudyList::new("a");
        source.push_item(Item::new("食べる", "to eat")).unwrap();
        let owned = source.item(0).unwrap().clone();

        let mut target = StudyList::new("b");
        let (_, events) = recorder(&mut target);
        assert!(target.insert_item(0, owned).is_err());
        assert!(!target.is_modified());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn setting_same_value_is_not_a_change() {
        let mut list = StudyList::new("verbs");
        list.set_name("verbs");
        list.set_hint_readings(false);
        assert!(!list.is_modified());

        list.set_show_reversed_cards(true);
        assert!(list.is_modified());
        assert!(list.show_reversed_cards());
    }

    #[test]
    fn clear_notifies_once() {
        let mut list = StudyList::new("verbs");
        list.push_item(Item::new("a", "1")).unwrap();
        list.push_item(Item::new("b", "2")).unwrap();
        let (_, events) = recorder(&mut list);
        let released = list.clear_items();
        assert_eq!(released.len(), 2);
        assert_eq!(*events.borrow(), [ListEvent::Items(ItemChange::Cleared)]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut list = StudyList::new("verbs");
        let (id, events) = recorder(&mut list);
        assert!(list.unsubscribe(id));
        assert!(!list.unsubscribe(id));
        list.set_name("nouns");
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn record_answer_touches_only_target_item() {
        let mut list = StudyList::new("verbs");
        list.push_item(Item::new("a", "1")).unwrap();
        list.push_item(Item::new("b", "2")).unwrap();
        list.record_answer(1, true).unwrap();
        list.record_answer(1, false).unwrap();

        assert_eq!(list.item(0).unwrap().shown_count(), 0);
        assert_eq!(list.item(1).unwrap().shown_count(), 2);
        assert_eq!(list.item(1).unwrap().correct_count(), 1);
        assert_eq!(list.correct_rate(), 0.5);
    }

    #[test]
    fn extend_is_all_or_nothing() {
        let mut other = StudyList::new("other");
        other.push_item(Item::new("x", "y")).unwrap();
        let owned = other.item(0).unwrap().clone();

        let mut list = StudyList::new("verbs");
        let result = list.extend_items(vec![Item::new("a", "1"), owned]);
        assert!(matches!(result, Err(StudyError::OwnershipConflict { .. })));
        assert!(list.is_empty());

        assert_eq!(list.extend_items(vec![Item::new("a", "1"), Item::new("b", "2")]).unwrap(), 2);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn reset_statistics_zeros_counters() {
        let mut list = StudyList::new("verbs");
        list.push_item(Item::new("a", "1").with_counts(4, 3)).unwrap();
        let (_, events) = recorder(&mut list);
        list.reset_statistics();
        assert_eq!(list.item(0).unwrap().shown_count(), 0);
        assert_eq!(*events.borrow(), [ListEvent::StatisticsReset]);
    }

    #[test]
    fn mark_clean_clears_flag() {
        let mut list = StudyList::new("verbs");
        list.set_name("nouns");
        list.mark_clean(ListEvent::Saved);
        assert!(!list.is_modified());
    }
}
