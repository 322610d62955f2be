//! Learnosity validation objects
//!
//! The declarative JSON representation of a question's scoring rules:
//! a scoring type, one valid response and any number of scored
//! alternatives.

use serde::{Deserialize, Serialize};

/// How a validation object scores a submitted response.
///
/// The two modes are mutually exclusive and derived during conversion:
/// `ExactMatch` from correct-response/match semantics, `PartialMatch` from
/// map-response semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringType {
    #[serde(rename = "exactMatch")]
    ExactMatch,
    #[serde(rename = "partialMatch")]
    PartialMatch,
}

/// One scored response: the score awarded and the value that earns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidResponse {
    pub score: f64,
    pub value: serde_json::Value,
}

/// A question's validation object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub scoring_type: ScoringType,
    pub valid_response: ValidResponse,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_responses: Vec<ValidResponse>,
}

impl Validation {
    /// An exact-match validation with a single valid response.
    pub fn exact_match(score: f64, value: serde_json::Value) -> Self {
        Self {
            scoring_type: ScoringType::ExactMatch,
            valid_response: ValidResponse { score, value },
            alt_responses: Vec::new(),
        }
    }

    /// A partial-match validation with a single valid response.
    pub fn partial_match(score: f64, value: serde_json::Value) -> Self {
        Self {
            scoring_type: ScoringType::PartialMatch,
            valid_response: ValidResponse { score, value },
            alt_responses: Vec::new(),
        }
    }

    /// All responses in declaration order, the valid response first.
    pub fn all_responses(&self) -> impl Iterator<Item = &ValidResponse> {
        std::iter::once(&self.valid_response).chain(self.alt_responses.iter())
    }
}
