//! QTI / Learnosity SDK - Bidirectional assessment-item conversion
//!
//! Provides unified interfaces for:
//! - Importing QTI v2.1 assessment items as Learnosity items and questions
//! - Exporting Learnosity items, questions and question data as QTI XML
//! - Translating scoring semantics between response processing and
//!   validation objects
//! - Best-effort degradation: unsupported content becomes diagnostics and
//!   partial output, never a panic

pub mod convert;
pub mod diagnostics;
pub mod export;
pub mod import;
pub mod models;
pub mod qti;
pub mod registry;

// Re-export commonly used types
pub use convert::{
    ConvertError, Converter, LearnosityToQtiResult, MappingError, QtiToLearnosityResult,
};
pub use diagnostics::Diagnostics;
pub use export::{ExportOutcome, ExportedInteraction, SideArtifact, write_item};
pub use import::{InteractionValidationBuilder, ScoringData, ScoringResult, map_assessment_item};
pub use registry::{ExportMapperFn, ImportMapperFn, MapperEntry, MapperRegistry};

// Re-export models
pub use models::{
    AssociationQuestion, AudioPlayerFeature, ChoiceOption, Item, LongTextQuestion, McqQuestion,
    OrderListQuestion, Question, QuestionData, ScoringType, SharedPassageFeature,
    ShortTextQuestion, ValidResponse, Validation,
};

// Re-export the QTI object model used at the extension seams
pub use qti::{AssessmentItem, Interaction, ParseError, parse_assessment_item};
