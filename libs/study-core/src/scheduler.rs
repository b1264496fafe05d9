//! Card scheduler.
//!
//! Traversal runs in three phases:
//! - `FirstPass`: every item once, in shuffled order, phrase side up
//! - `ReversedPass`: every item once more, reshuffled, meaning side up
//!   (only when the list shows reversed cards)
//! - `Random`: weighted draws forever, biased toward poorly known items
//!
//! The scheduler holds item indices only; every call takes the list it was
//! built for.

use crate::error::{Result, StudyError};
use crate::item::Item;
use crate::list::StudyList;
use crate::random::{shuffle, RandomSource};
use serde::{Deserialize, Serialize};

/// Traversal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    FirstPass,
    ReversedPass,
    Random,
}

/// Prompt side of the current card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub reversed: bool,
}

/// Counterpart fields revealed for the current card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Chooses which item of a list to present next.
#[derive(Debug)]
pub struct CardScheduler<R> {
    rng: R,
    order: Vec<usize>,
    cursor: usize,
    phase: Phase,
    current: usize,
    reversed: bool,
    answer_shown: bool,
    total_weight: f64,
}

impl<R: RandomSource> CardScheduler<R> {
    /// Build a scheduler over the current items of `list`.
    pub fn new(list: &StudyList, mut rng: R) -> Result<Self> {
        let n = list.len();
        if n == 0 {
            return Err(StudyError::InvalidState(
                "cannot schedule an empty list".to_string(),
            ));
        }

        let mut order: Vec<usize> = (0..n).collect();
        shuffle(&mut order, &mut rng);
        let current = order[0];

        tracing::debug!(items = n, "starting first pass");

        Ok(Self {
            rng,
            order,
            cursor: 0,
            phase: Phase::FirstPass,
            current,
            reversed: false,
            answer_shown: false,
            total_weight: list.items().total_weight(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the current item in the list.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn is_answer_shown(&self) -> bool {
        self.answer_shown
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Number of items the scheduler was built over.
    pub fn item_count(&self) -> usize {
        self.order.len()
    }

    /// Prompt for the current item, honouring the list's hint flags.
    pub fn current_card(&self, list: &StudyList) -> Result<Card> {
        let item = self.current_item(list)?;
        let card = if self.reversed {
            Card {
                text: item.meanings.clone(),
                readings: None,
                example: hint(list.hint_example(), &item.example_dest),
                reversed: true,
            }
        } else {
            Card {
                text: item.phrase.clone(),
                readings: hint(list.hint_readings(), &item.readings),
                example: hint(list.hint_example(), &item.example_source),
                reversed: false,
            }
        };
        Ok(card)
    }

    /// Reveal the side not shown by the prompt. Returns `None` if the answer
    /// is already showing.
    pub fn reveal_answer(&mut self, list: &StudyList) -> Result<Option<Answer>> {
        if self.answer_shown {
            return Ok(None);
        }
        let item = self.current_item(list)?;
        let answer = if self.reversed {
            Answer {
                text: item.phrase.clone(),
                readings: item.readings.clone(),
                example: item.example_source.clone(),
            }
        } else {
            Answer {
                text: item.meanings.clone(),
                readings: if list.hint_readings() {
                    None
                } else {
                    item.readings.clone()
                },
                example: item.example_dest.clone(),
            }
        };
        self.answer_shown = true;
        Ok(Some(answer))
    }

    /// Count the answer for the current item and move to the next card.
    pub fn record_answer(&mut self, list: &mut StudyList, correct: bool) -> Result<()> {
        let before = self
            .current_item(list)
            .map_err(|_| StudyError::InvalidState("no current card to answer".to_string()))?
            .weight();
        list.record_answer(self.current, correct)?;
        let after = self.current_item(list)?.weight();
        self.total_weight += after - before;
        self.advance(list)
    }

    /// Move to the next card without recording an answer.
    pub fn advance(&mut self, list: &StudyList) -> Result<()> {
        let n = self.order.len();
        match self.phase {
            Phase::FirstPass => {
                self.cursor += 1;
                if self.cursor == n {
                    self.cursor = 0;
                    if list.show_reversed_cards() {
                        shuffle(&mut self.order, &mut self.rng);
                        self.phase = Phase::ReversedPass;
                        self.reversed = true;
                        self.current = self.order[0];
                        tracing::debug!("starting reversed pass");
                    } else {
                        self.enter_random(list)?;
                    }
                } else {
                    self.current = self.order[self.cursor];
                }
            }
            Phase::ReversedPass => {
                self.cursor += 1;
                if self.cursor == n {
                    self.cursor = 0;
                    self.enter_random(list)?;
                } else {
                    self.current = self.order[self.cursor];
                }
            }
            Phase::Random => self.draw(list)?,
        }
        self.answer_shown = false;
        Ok(())
    }

    fn enter_random(&mut self, list: &StudyList) -> Result<()> {
        self.phase = Phase::Random;
        tracing::debug!(total_weight = self.total_weight, "starting weighted draws");
        self.draw(list)
    }

    /// Weighted draw that never repeats the previous item when another exists.
    fn draw(&mut self, list: &StudyList) -> Result<()> {
        let n = self.order.len();
        let previous = self.current;
        let position = loop {
            let position = self.pick(list)?;
            if n == 1 || self.order[position] != previous {
                break position;
            }
        };
        self.cursor = position;
        self.current = self.order[position];
        self.reversed = list.show_reversed_cards() && self.rng.next_index(2) == 1;
        tracing::trace!(index = self.current, reversed = self.reversed, "drew card");
        Ok(())
    }

    /// Walk the order from the cursor, consuming weight until the drawn
    /// value is used up. Wraps around to absorb rounding drift in the total.
    fn pick(&mut self, list: &StudyList) -> Result<usize> {
        let n = self.order.len();
        let mut value = self.rng.next_unit() * self.total_weight;
        let mut position = self.cursor;
        loop {
            let index = self.order[position];
            let weight = list
                .item(index)
                .map(Item::weight)
                .ok_or_else(|| stale_index(index, list.len()))?;
            value -= weight;
            if value <= 0.0 {
                return Ok(position);
            }
            position = (position + 1) % n;
        }
    }

    fn current_item<'a>(&self, list: &'a StudyList) -> Result<&'a Item> {
        list.item(self.current)
            .ok_or_else(|| stale_index(self.current, list.len()))
    }
}

fn hint(enabled: bool, value: &Option<String>) -> Option<String> {
    if enabled {
        value.clone()
    } else {
        None
    }
}

fn stale_index(index: usize, len: usize) -> StudyError {
    StudyError::InvalidState(format!(
        "scheduled item {index} is not in the list ({len} items)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::StdRandom;
    use std::collections::{HashSet, VecDeque};

    /// Identity shuffle and a fixed queue of unit draws.
    struct Scripted {
        units: VecDeque<f64>,
    }

    impl Scripted {
        fn new(units: &[f64]) -> Self {
            Self {
                units: units.iter().copied().collect(),
            }
        }
    }

    impl RandomSource for Scripted {
        fn next_index(&mut self, _bound: usize) -> usize {
            0
        }

        fn next_unit(&mut self) -> f64 {
            self.units.pop_front().unwrap_or(0.5)
        }
    }

    fn list_of(n: usize) -> StudyList {
        let mut list = StudyList::new("test");
        for i in 0..n {
            list.push_item(Item::new(format!("phrase {i}"), format!("meaning {i}")))
                .unwrap();
        }
        list
    }

    #[test]
    fn reject_empty_list() {
        let list = StudyList::new("empty");
        let result = CardScheduler::new(&list, StdRandom::seeded(1));
        assert!(matches!(result, Err(StudyError::InvalidState(_))));
    }

    #[test]
    fn first_pass_visits_each_item_once_then_goes_random() {
        let mut list = list_of(3);
        let mut sched = CardScheduler::new(&list, StdRandom::seeded(11)).unwrap();

        let mut seen = HashSet::new();
        for _ in 0..3 {
            assert_eq!(sched.phase(), Phase::FirstPass);
            assert!(!sched.is_reversed());
            assert!(seen.insert(sched.current_index()));
            sched.record_answer(&mut list, true).unwrap();
        }
        assert_eq!(seen, HashSet::from([0, 1, 2]));
        assert_eq!(sched.phase(), Phase::Random);
    }

    #[test]
    fn reversed_pass_follows_first_pass() {
        let mut list = list_of(4);
        list.set_show_reversed_cards(true);
        let mut sched = CardScheduler::new(&list, StdRandom::seeded(5)).unwrap();

        for _ in 0..4 {
            assert_eq!(sched.phase(), Phase::FirstPass);
            sched.record_answer(&mut list, false).unwrap();
        }
        let mut seen = HashSet::new();
        for _ in 0..4 {
            assert_eq!(sched.phase(), Phase::ReversedPass);
            assert!(sched.is_reversed());
            assert!(seen.insert(sched.current_index()));
            sched.record_answer(&mut list, false).unwrap();
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(sched.phase(), Phase::Random);
    }

    #[test]
    fn random_phase_never_repeats_consecutively() {
        let mut list = list_of(4);
        let mut sched = CardScheduler::new(&list, StdRandom::seeded(99)).unwrap();
        for _ in 0..4 {
            sched.advance(&list).unwrap();
        }
        assert_eq!(sched.phase(), Phase::Random);

        let mut previous = sched.current_index();
        for i in 0..500 {
            sched.record_answer(&mut list, i % 3 == 0).unwrap();
            assert_ne!(sched.current_index(), previous);
            previous = sched.current_index();
        }
    }

    #[test]
    fn single_item_repeats_without_retry() {
        let mut list = list_of(1);
        let mut sched = CardScheduler::new(&list, StdRandom::seeded(2)).unwrap();
        for _ in 0..10 {
            sched.record_answer(&mut list, true).unwrap();
            assert_eq!(sched.current_index(), 0);
        }
        assert_eq!(sched.phase(), Phase::Random);
        assert_eq!(list.item(0).unwrap().shown_count(), 10);
    }

    #[test]
    fn weighted_draw_walks_from_cursor_and_wraps() {
        let list = list_of(3);
        // 0.5 * 3.3 lands on position 1; 0.1 hits the previous item and is
        // rejected; 0.9 runs past the end and wraps to position 0.
        let mut sched = CardScheduler::new(&list, Scripted::new(&[0.5, 0.1, 0.9])).unwrap();
        assert_eq!(sched.current_index(), 0);
        sched.advance(&list).unwrap();
        sched.advance(&list).unwrap();
        assert_eq!(sched.current_index(), 2);

        sched.advance(&list).unwrap();
        assert_eq!(sched.phase(), Phase::Random);
        assert_eq!(sched.current_index(), 1);

        sched.advance(&list).unwrap();
        assert_eq!(sched.current_index(), 0);
    }

    #[test]
    fn well_known_items_are_drawn_less() {
        let mut list = list_of(3);
        list.edit_item(0, |item| *item = item.detached().with_counts(10, 10))
            .unwrap();
        let mut sched = CardScheduler::new(&list, StdRandom::seeded(2024)).unwrap();
        for _ in 0..3 {
            sched.advance(&list).unwrap();
        }

        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            counts[sched.current_index()] += 1;
            sched.advance(&list).unwrap();
        }
        assert!(counts[0] * 2 < counts[1]);
        assert!(counts[0] * 2 < counts[2]);
    }

    #[test]
    fn record_answer_keeps_total_weight_in_sync() {
        let mut list = list_of(3);
        let mut sched = CardScheduler::new(&list, StdRandom::seeded(8)).unwrap();
        assert!((sched.total_weight() - 3.3).abs() < 1e-9);

        let first = sched.current_index();
        sched.record_answer(&mut list, true).unwrap();
        assert_eq!(list.item(first).unwrap().correct_count(), 1);
        assert!((sched.total_weight() - 2.3).abs() < 1e-9);
        assert!((sched.total_weight() - list.items().total_weight()).abs() < 1e-9);
    }

    #[test]
    fn record_answer_only_touches_current_item() {
        let mut list = list_of(3);
        let mut sched = CardScheduler::new(&list, StdRandom::seeded(4)).unwrap();
        let current = sched.current_index();
        sched.record_answer(&mut list, false).unwrap();

        for (index, item) in list.items().iter().enumerate() {
            let expected = u32::from(index == current);
            assert_eq!(item.shown_count(), expected);
            assert_eq!(item.correct_count(), 0);
        }
    }

    #[test]
    fn hints_follow_list_flags() {
        let mut list = StudyList::new("hints");
        list.push_item(
            Item::new("猫", "cat")
                .with_readings("ねこ")
                .with_example("猫がいる", "There is a cat"),
        )
        .unwrap();
        let sched = CardScheduler::new(&list, StdRandom::seeded(1)).unwrap();

        let card = sched.current_card(&list).unwrap();
        assert_eq!(card.text, "猫");
        assert_eq!(card.readings, None);
        assert_eq!(card.example, None);

        list.set_hint_readings(true);
        list.set_hint_example(true);
        let card = sched.current_card(&list).unwrap();
        assert_eq!(card.readings.as_deref(), Some("ねこ"));
        assert_eq!(card.example.as_deref(), Some("猫がいる"));
    }

    #[test]
    fn reversed_card_shows_meanings_without_readings() {
        let mut list = StudyList::new("reversed");
        list.set_show_reversed_cards(true);
        list.set_hint_readings(true);
        list.push_item(Item::new("猫", "cat").with_readings("ねこ"))
            .unwrap();
        let mut sched = CardScheduler::new(&list, StdRandom::seeded(1)).unwrap();
        sched.advance(&list).unwrap();
        assert_eq!(sched.phase(), Phase::ReversedPass);

        let card = sched.current_card(&list).unwrap();
        assert!(card.reversed);
        assert_eq!(card.text, "cat");
        assert_eq!(card.readings, None);

        let answer = sched.reveal_answer(&list).unwrap().unwrap();
        assert_eq!(answer.text, "猫");
        assert_eq!(answer.readings.as_deref(), Some("ねこ"));
    }

    #[test]
    fn reveal_is_idempotent_until_next_card() {
        let mut list = list_of(2);
        let mut sched = CardScheduler::new(&list, StdRandom::seeded(3)).unwrap();
        let current = sched.current_index();

        let answer = sched.reveal_answer(&list).unwrap().unwrap();
        assert_eq!(answer.text, format!("meaning {current}"));
        assert!(sched.is_answer_shown());
        assert_eq!(sched.reveal_answer(&list).unwrap(), None);

        sched.record_answer(&mut list, true).unwrap();
        assert!(!sched.is_answer_shown());
        assert!(sched.reveal_answer(&list).unwrap().is_some());
    }

    #[test]
    fn shrunken_list_is_an_invalid_state() {
        let mut list = list_of(2);
        let mut sched = CardScheduler::new(&list, StdRandom::seeded(3)).unwrap();
        list.clear_items();
        assert!(matches!(
            sched.current_card(&list),
            Err(StudyError::InvalidState(_))
        ));
        assert!(matches!(
            sched.record_answer(&mut list, true),
            Err(StudyError::InvalidState(_))
        ));
    }
}
