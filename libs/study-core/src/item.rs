//! A single flashcard record and its performance counters.

use crate::error::ItemField;
use crate::list::ListId;
use serde::{Deserialize, Serialize};

/// Weight of an item that was never answered correctly.
pub const MAX_WEIGHT: f64 = 1.1;

/// Weight of an item that was always answered correctly.
pub const MIN_WEIGHT: f64 = 0.1;

/// Flashcard record: phrase, optional reading, meanings, optional example pair.
///
/// The `owner` tag is set while the item sits in a list's registry and is
/// never serialized. Cloning an owned item produces another owned item; use
/// [`Item::detached`] to copy the record into a different list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord")]
pub struct Item {
    pub phrase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readings: Option<String>,
    pub meanings: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_dest: Option<String>,
    shown_count: u32,
    correct_count: u32,
    #[serde(skip)]
    owner: Option<ListId>,
}

impl Item {
    /// Create an unowned item with zeroed counters.
    pub fn new(phrase: impl Into<String>, meanings: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            readings: None,
            meanings: meanings.into(),
            example_source: None,
            example_dest: None,
            shown_count: 0,
            correct_count: 0,
            owner: None,
        }
    }

    pub fn with_readings(mut self, readings: impl Into<String>) -> Self {
        self.readings = Some(readings.into());
        self
    }

    pub fn with_example(mut self, source: impl Into<String>, dest: impl Into<String>) -> Self {
        self.example_source = Some(source.into());
        self.example_dest = Some(dest.into());
        self
    }

    /// Set both counters. `correct` is clamped to `shown`.
    pub fn with_counts(mut self, shown: u32, correct: u32) -> Self {
        self.shown_count = shown;
        self.correct_count = correct.min(shown);
        self
    }

    pub fn shown_count(&self) -> u32 {
        self.shown_count
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    /// Fraction of correct answers, 0.0 for an item never shown.
    pub fn correct_rate(&self) -> f64 {
        if self.shown_count == 0 {
            0.0
        } else {
            f64::from(self.correct_count) / f64::from(self.shown_count)
        }
    }

    /// Draw weight in `[MIN_WEIGHT, MAX_WEIGHT]`, decreasing with the correct rate.
    pub fn weight(&self) -> f64 {
        MAX_WEIGHT - self.correct_rate()
    }

    /// Count one presentation of this item.
    pub fn record(&mut self, correct: bool) {
        self.shown_count = self.shown_count.saturating_add(1);
        if correct && self.correct_count < self.shown_count {
            self.correct_count += 1;
        }
    }

    pub fn reset_counts(&mut self) {
        self.shown_count = 0;
        self.correct_count = 0;
    }

    /// Check the fields required before the item can be persisted.
    pub fn validate(&self) -> std::result::Result<(), ItemField> {
        if self.phrase.trim().is_empty() {
            return Err(ItemField::Phrase);
        }
        if self.meanings.trim().is_empty() {
            return Err(ItemField::Meanings);
        }
        Ok(())
    }

    /// List currently holding this item, if any.
    pub fn owner(&self) -> Option<ListId> {
        self.owner
    }

    /// Copy of the record with no owner.
    pub fn detached(&self) -> Self {
        Self {
            owner: None,
            ..self.clone()
        }
    }

    pub(crate) fn set_owner(&mut self, owner: Option<ListId>) {
        self.owner = owner;
    }
}

/// Unchecked wire form of [`Item`].
#[derive(Deserialize)]
struct ItemRecord {
    phrase: String,
    #[serde(default)]
    readings: Option<String>,
    meanings: String,
    #[serde(default)]
    example_source: Option<String>,
    #[serde(default)]
    example_dest: Option<String>,
    #[serde(default)]
    shown_count: u32,
    #[serde(default)]
    correct_count: u32,
}

impl TryFrom<ItemRecord> for Item {
    type Error = String;

    fn try_from(record: ItemRecord) -> std::result::Result<Self, Self::Error> {
        if record.correct_count > record.shown_count {
            return Err(format!(
                "correct_count {} exceeds shown_count {}",
                record.correct_count, record.shown_count
            ));
        }
        Ok(Self {
            phrase: record.phrase,
            readings: record.readings,
            meanings: record.meanings,
            example_source: record.example_source,
            example_dest: record.example_dest,
            shown_count: record.shown_count,
            correct_count: record.correct_count,
            owner: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with(shown: u32, correct: u32) -> Item {
        Item::new("猫", "cat").with_counts(shown, correct)
    }

    #[test]
    fn unseen_item_has_zero_rate_and_max_weight() {
        let item = item_with(0, 0);
        assert_eq!(item.correct_rate(), 0.0);
        assert!((item.weight() - MAX_WEIGHT).abs() < 1e-12);
    }

    #[test]
    fn perfect_item_keeps_floor_weight() {
        let item = item_with(7, 7);
        assert_eq!(item.correct_rate(), 1.0);
        assert!((item.weight() - MIN_WEIGHT).abs() < 1e-12);
    }

    #[test]
    fn weight_stays_in_range_and_decreases_with_rate() {
        let mut previous = f64::INFINITY;
        for correct in 0..=10 {
            let weight = item_with(10, correct).weight();
            assert!(weight >= MIN_WEIGHT - 1e-12 && weight <= MAX_WEIGHT + 1e-12);
            assert!(weight < previous);
            previous = weight;
        }
    }

    #[test]
    fn record_updates_counters() {
        let mut item = item_with(0, 0);
        item.record(true);
        item.record(false);
        assert_eq!(item.shown_count(), 2);
        assert_eq!(item.correct_count(), 1);
        assert_eq!(item.correct_rate(), 0.5);
    }

    #[test]
    fn with_counts_clamps_correct_to_shown() {
        let item = item_with(2, 5);
        assert_eq!(item.correct_count(), 2);
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert_eq!(Item::new(" ", "cat").validate(), Err(ItemField::Phrase));
        assert_eq!(Item::new("猫", "").validate(), Err(ItemField::Meanings));
        assert_eq!(Item::new("猫", "cat").validate(), Ok(()));
    }

    #[test]
    fn detached_copy_has_no_owner() {
        let mut item = item_with(3, 1);
        item.set_owner(Some(ListId::new()));
        let copy = item.detached();
        assert!(copy.owner().is_none());
        assert_eq!(copy.shown_count(), 3);
        assert_eq!(copy.phrase, item.phrase);
    }

    #[test]
    fn deserialize_rejects_correct_above_shown() {
        let json = r#"{"phrase":"a","meanings":"b","shown_count":1,"correct_count":5}"#;
        assert!(serde_json::from_str::<Item>(json).is_err());
    }

    #[test]
    fn deserialize_builds_unowned_item() {
        let json = r#"{"phrase":"猫","meanings":"cat","readings":"ねこ","shown_count":4,"correct_count":3}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item, Item::new("猫", "cat").with_readings("ねこ").with_counts(4, 3));
        assert_eq!(item.owner(), None);
        assert!(item.weight() >= MIN_WEIGHT);
    }
}
