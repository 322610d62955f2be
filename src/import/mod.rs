//! Import functionality
//!
//! Maps parsed QTI assessment items to Learnosity items and questions:
//! the per-type interaction mappers, the scoring analysis of
//! response-processing rule trees, and the item orchestrator that ties
//! them together.

pub mod interactions;
pub mod item;
pub mod scoring;
pub mod validation;

pub use item::{map_assessment_item, question_span};
pub use scoring::{BranchScoring, CorrectOutcome, ScoringData, ScoringResult};
pub use validation::{InteractionValidationBuilder, MAX_CONDITION_DEPTH};
