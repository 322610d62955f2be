//! Models module for the SDK
//!
//! Defines the Learnosity-side entities produced and consumed by the
//! conversion operations: items, the closed question-type set and
//! validation objects.

pub mod item;
pub mod question;
pub mod validation;

pub use item::Item;
pub use question::{
    AssociationQuestion, AudioPlayerFeature, ChoiceOption, LongTextQuestion, McqQuestion,
    OrderListQuestion, Question, QuestionData, SharedPassageFeature, ShortTextQuestion,
};
pub use validation::{ScoringType, ValidResponse, Validation};
