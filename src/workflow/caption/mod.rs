//! Personalized caption generation: history reduction, prompt assembly, heuristic scoring.

pub mod pattern;
pub mod prompt;
pub mod scores;

pub use pattern::UserPattern;
pub use scores::CaptionScores;
