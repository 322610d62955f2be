//! Conversion facade
//!
//! The top-level entry points for whole-document conversion, plus the two
//! checked error kinds that cross the SDK boundary: a mapping failure
//! (unsupported or malformed input unit) and an invalid-document failure
//! (the document is rejected wholesale).
//!
//! Everything else that can go wrong during conversion is downgraded to a
//! diagnostic so the SDK keeps producing best-effort partial output.

pub mod converter;
pub mod preprocess;

use once_cell::sync::Lazy;
use regex::Regex;

pub use converter::{Converter, LearnosityToQtiResult, QtiToLearnosityResult};

/// Failure to map one interaction/question unit.
///
/// Caught at the orchestrator boundary: the unit degrades to
/// "unavailable" and processing continues with its siblings.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MappingError {
    #[error("Unsupported question/interaction type `{0}`")]
    UnsupportedType(String),
    #[error("Mapping failure: {0}")]
    Invalid(String),
}

/// Error crossing the conversion boundary.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The input could not be mapped at all (e.g. unrecognizable JSON
    /// shape).
    #[error("Mapping failure: {0}")]
    Mapping(String),
    /// The document was rejected wholesale. Schema-location details are
    /// stripped from the message before it crosses the boundary.
    #[error("The document could not be validated as a QTI assessment item: {0}")]
    InvalidQti(String),
}

impl From<crate::qti::ParseError> for ConvertError {
    fn from(err: crate::qti::ParseError) -> Self {
        ConvertError::InvalidQti(sanitize_schema_message(&err.to_string()))
    }
}

static LOCATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9+.-]*://\S+|(?:/[\w.-]+){2,}").unwrap());

/// Strip schema locations (URLs, filesystem paths) from a validation
/// failure message.
pub(crate) fn sanitize_schema_message(message: &str) -> String {
    let stripped = LOCATION_PATTERN.replace_all(message, "<schema location>");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
