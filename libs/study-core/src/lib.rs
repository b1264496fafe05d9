//! Flashcard study engine.
//!
//! Provides:
//! - Study list model with single-owner item registry and change notification
//! - Card scheduler (first pass, reversed pass, accuracy-weighted random draws)
//! - Versioned XML persistence for study lists
//! - Tab-separated bulk import
//! - Study session controller

pub mod codec;
pub mod error;
pub mod import;
pub mod item;
pub mod list;
pub mod random;
pub mod registry;
pub mod scheduler;
pub mod session;

pub use error::{ItemField, Result, StudyError};
pub use item::Item;
pub use list::{ListEvent, ListId, StudyList, SubscriptionId};
pub use random::{RandomSource, StdRandom};
pub use registry::{ItemChange, ItemRegistry};
pub use scheduler::{Answer, Card, CardScheduler, Phase};
pub use session::{SessionSummary, StudySession};
