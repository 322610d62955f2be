//! Validation export
//!
//! Translates Learnosity validation objects back into QTI scoring
//! declarations: correct-response values, mapping tables and
//! response-processing rules.
//!
//! Every builder emits an explicit rule tree; the standard template URI is
//! attached when the tree carries exactly the template's semantics, so the
//! item writer can fall back to the compact `template` attribute form.

use serde_json::Value;

use crate::convert::MappingError;
use crate::export::InteractionProcessing;
use crate::qti::{
    ConditionBranch, Guard, MAP_RESPONSE_TEMPLATE_URI, MATCH_CORRECT_TEMPLATE_URI, MapEntry,
    Mapping, OutcomeExpression, QtiValue, ResponseCondition, ResponseRule, SetOutcomeValue,
};

fn assign_score(expression: OutcomeExpression) -> ResponseRule {
    ResponseRule::SetOutcomeValue(SetOutcomeValue {
        identifier: "SCORE".to_string(),
        expression,
    })
}

fn score_literal(score: f64) -> OutcomeExpression {
    OutcomeExpression::BaseValue(QtiValue::Float(score))
}

/// Rules equivalent to the `match_correct` template, with a configurable
/// awarded score. The template URI is attached only for the unit score the
/// template itself implies.
pub fn match_correct_processing(response_id: &str, score: f64) -> InteractionProcessing {
    let rules = vec![ResponseRule::Condition(ResponseCondition {
        response_if: ConditionBranch {
            guard: Guard::Match {
                response: response_id.to_string(),
                correct: response_id.to_string(),
            },
            rules: vec![assign_score(score_literal(score))],
        },
        else_ifs: vec![],
        response_else: Some(ConditionBranch {
            guard: Guard::None,
            rules: vec![assign_score(score_literal(0.0))],
        }),
    })];
    InteractionProcessing {
        template_uri: (score == 1.0).then_some(MATCH_CORRECT_TEMPLATE_URI),
        rules,
    }
}

/// Rules comparing the response against each literal answer in turn, each
/// awarding its own score.
pub fn equal_answers_processing(
    response_id: &str,
    answers: &[(f64, QtiValue)],
) -> InteractionProcessing {
    let mut branches = answers.iter().map(|(score, answer)| ConditionBranch {
        guard: Guard::Equal {
            response: response_id.to_string(),
            value: answer.clone(),
        },
        rules: vec![assign_score(score_literal(*score))],
    });

    let response_if = branches.next().unwrap_or(ConditionBranch {
        guard: Guard::None,
        rules: vec![assign_score(score_literal(0.0))],
    });
    let rules = vec![ResponseRule::Condition(ResponseCondition {
        response_if,
        else_ifs: branches.collect(),
        response_else: Some(ConditionBranch {
            guard: Guard::None,
            rules: vec![assign_score(score_literal(0.0))],
        }),
    })];
    InteractionProcessing {
        template_uri: None,
        rules,
    }
}

/// Rules equivalent to the `map_response` template: unattempted scores
/// zero, everything else scores through the mapping table.
pub fn map_response_processing(response_id: &str) -> InteractionProcessing {
    let rules = vec![ResponseRule::Condition(ResponseCondition {
        response_if: ConditionBranch {
            guard: Guard::IsNull {
                variable: response_id.to_string(),
            },
            rules: vec![assign_score(score_literal(0.0))],
        },
        else_ifs: vec![],
        response_else: Some(ConditionBranch {
            guard: Guard::None,
            rules: vec![assign_score(OutcomeExpression::MapResponse(None))],
        }),
    })];
    InteractionProcessing {
        template_uri: Some(MAP_RESPONSE_TEMPLATE_URI),
        rules,
    }
}

/// Interpret a validation value as a list of identifiers.
pub fn identifier_values(value: &Value) -> Result<Vec<QtiValue>, MappingError> {
    string_items(value).map(|items| {
        items
            .into_iter()
            .map(QtiValue::Identifier)
            .collect()
    })
}

/// Interpret a validation value as a list of `source target` pairs.
pub fn pair_values(value: &Value) -> Result<Vec<QtiValue>, MappingError> {
    let items = string_items(value)?;
    items
        .into_iter()
        .map(|item| {
            let mut parts = item.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(a), Some(b)) => Ok(QtiValue::DirectedPair(a.to_string(), b.to_string())),
                _ => Err(MappingError::Invalid(format!(
                    "association value `{item}` is not a `source target` pair"
                ))),
            }
        })
        .collect()
}

fn string_items(value: &Value) -> Result<Vec<String>, MappingError> {
    let Value::Array(items) = value else {
        return Err(MappingError::Invalid(
            "validation value must be an array".to_string(),
        ));
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(MappingError::Invalid(format!(
                "validation value entry `{other}` is not scalar"
            ))),
        })
        .collect()
}

/// A mapping table spreading `total` evenly across the given keys, so
/// summing the positive entries yields the question score again.
pub fn spread_mapping(keys: Vec<QtiValue>, total: f64) -> Mapping {
    let share = if keys.is_empty() {
        0.0
    } else {
        total / keys.len() as f64
    };
    Mapping {
        default_value: 0.0,
        entries: keys
            .into_iter()
            .map(|key| MapEntry {
                map_key: key,
                mapped_value: share,
                case_sensitive: false,
            })
            .collect(),
    }
}
