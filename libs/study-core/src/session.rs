//! Study session: drives a scheduler over a borrowed list.

use crate::error::Result;
use crate::list::StudyList;
use crate::random::RandomSource;
use crate::scheduler::{Answer, Card, CardScheduler, Phase};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Progress of a session so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub list_name: String,
    pub started_at: DateTime<Utc>,
    pub answered: u32,
    pub correct: u32,
    pub skipped: u32,
    pub phase: Phase,
}

impl SessionSummary {
    /// Correct answers over answers given in this session.
    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.answered)
        }
    }
}

/// One study session. The list cannot be restructured while the session
/// holds it, so scheduled indices stay valid.
pub struct StudySession<'a, R> {
    list: &'a mut StudyList,
    scheduler: CardScheduler<R>,
    started_at: DateTime<Utc>,
    answered: u32,
    correct: u32,
    skipped: u32,
}

impl<'a, R: RandomSource> StudySession<'a, R> {
    /// Start a session. Fails with `InvalidState` on an empty list.
    pub fn start(list: &'a mut StudyList, rng: R) -> Result<Self> {
        let scheduler = CardScheduler::new(list, rng)?;
        tracing::info!(list = list.name(), items = list.len(), "study session started");
        Ok(Self {
            list,
            scheduler,
            started_at: Utc::now(),
            answered: 0,
            correct: 0,
            skipped: 0,
        })
    }

    pub fn list(&self) -> &StudyList {
        self.list
    }

    pub fn scheduler(&self) -> &CardScheduler<R> {
        &self.scheduler
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    pub fn current_card(&self) -> Result<Card> {
        self.scheduler.current_card(self.list)
    }

    pub fn reveal_answer(&mut self) -> Result<Option<Answer>> {
        self.scheduler.reveal_answer(self.list)
    }

    /// Record the answer to the current card and move on.
    pub fn answer(&mut self, correct: bool) -> Result<()> {
        self.scheduler.record_answer(self.list, correct)?;
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
        Ok(())
    }

    /// Move on without counting the current card.
    pub fn skip(&mut self) -> Result<()> {
        self.scheduler.advance(self.list)?;
        self.skipped += 1;
        Ok(())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            list_name: self.list.name().to_string(),
            started_at: self.started_at,
            answered: self.answered,
            correct: self.correct,
            skipped: self.skipped,
            phase: self.scheduler.phase(),
        }
    }

    /// End the session, releasing the list.
    pub fn finish(self) -> SessionSummary {
        let summary = self.summary();
        tracing::info!(
            answered = summary.answered,
            correct = summary.correct,
            "study session finished"
        );
        summary
    }
}
