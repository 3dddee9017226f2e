//! Slide decks and narration scripts.

pub mod narration;
pub mod slides;
