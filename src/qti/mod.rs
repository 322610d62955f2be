//! QTI v2.1 object-model adapter
//!
//! Typed access to the parts of a QTI assessment item this SDK translates:
//! response/outcome declarations, response-processing rule trees and
//! interaction nodes, plus the `quick-xml` based parser and marshaller.
//!
//! The rest of the crate never touches raw XML; it consumes and produces
//! these types only.

pub mod marshal;
pub mod parse;
pub mod rules;
pub mod state;

pub use marshal::{ItemProcessing, MarshalError};
pub use parse::{
    AssessmentItem, Interaction, InteractionChoice, MediaObject, ParseError,
    interaction_placeholder, parse_assessment_item,
};
pub use rules::{
    ConditionBranch, Guard, MATCH_CORRECT_TEMPLATE_URI, MAP_RESPONSE_TEMPLATE_URI,
    OutcomeExpression, ResponseCondition, ResponseProcessing, ResponseProcessingTemplate,
    ResponseRule, SetOutcomeValue,
};
pub use state::{
    BaseType, Cardinality, MapEntry, Mapping, OutcomeDeclaration, OutcomeDeclarations, QtiValue,
    ResponseDeclaration,
};
