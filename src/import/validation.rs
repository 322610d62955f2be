//! Validation building for imported interactions
//!
//! Each interaction type implements [`InteractionValidationBuilder`]; the
//! default `build_validation` dispatches on the declared response-processing
//! template and catches mapping failures so an unsupported scoring setup
//! degrades to "no validation" with a diagnostic instead of failing the
//! interaction.
//!
//! Inline (builtin) rule trees are reduced to per-interaction
//! [`ScoringData`] facts by a recursive walk before the type-specific
//! builder shapes them into a validation object.

use crate::convert::MappingError;
use crate::diagnostics::Diagnostics;
use crate::import::scoring::{BranchScoring, CorrectOutcome, ScoringData, ScoringResult};
use crate::models::{ScoringType, Validation};
use crate::qti::{
    ConditionBranch, Guard, OutcomeDeclarations, OutcomeExpression, QtiValue, ResponseCondition,
    ResponseDeclaration, ResponseProcessing, ResponseProcessingTemplate, ResponseRule,
    SetOutcomeValue,
};

/// Maximum `responseCondition` nesting depth the rule-tree walk accepts.
/// Beyond this the tree is treated as unanalyzable.
pub const MAX_CONDITION_DEPTH: usize = 32;

/// Builds a question validation object from one interaction's scoring
/// declarations.
///
/// Implementations override the template hooks their type supports; the
/// default hooks log and yield no validation.
pub trait InteractionValidationBuilder {
    /// The response declaration governing this interaction, if the item
    /// declares one.
    fn response_declaration(&self) -> Option<&ResponseDeclaration>;

    /// The item's outcome declarations, for `<variable>` resolution.
    fn outcome_declarations(&self) -> &OutcomeDeclarations;

    /// Build validation for `match_correct` semantics. `scores` carries
    /// facts extracted from an inline rule tree, when one was walked.
    fn match_correct_validation(
        &self,
        scores: Option<&ScoringResult>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        let _ = scores;
        diagnostics.log(
            "This interaction type does not support the match_correct response processing template",
        );
        Ok(None)
    }

    /// Build validation for `map_response` semantics.
    fn map_response_validation(
        &self,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        diagnostics.log(
            "This interaction type does not support the map_response response processing template",
        );
        Ok(None)
    }

    /// Build the validation object for this interaction, never failing.
    ///
    /// Mapping errors raised by the template hooks are logged and turned
    /// into an absent validation.
    fn build_validation(
        &self,
        template: &ResponseProcessingTemplate,
        diagnostics: &mut Diagnostics,
    ) -> Option<Validation> {
        match self.dispatch_template(template, diagnostics) {
            Ok(validation) => validation,
            Err(err) => {
                diagnostics.log(format!("Validation is not available: {err}"));
                None
            }
        }
    }

    /// Template dispatch; separated from `build_validation` so the error
    /// path stays in one place.
    fn dispatch_template(
        &self,
        template: &ResponseProcessingTemplate,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        match template {
            ResponseProcessingTemplate::MatchCorrect => {
                self.match_correct_validation(None, diagnostics)
            }
            ResponseProcessingTemplate::MapResponse
            | ResponseProcessingTemplate::Cc2MapResponse => {
                self.map_response_validation(diagnostics)
            }
            ResponseProcessingTemplate::Builtin(processing) => {
                let walker = RuleTreeWalker {
                    response_declaration: self.response_declaration(),
                    outcome_declarations: self.outcome_declarations(),
                };
                match walker.walk(processing, diagnostics) {
                    Some(scores) if !scores.is_empty() => {
                        self.match_correct_validation(Some(&scores), diagnostics)
                    }
                    Some(_) => {
                        diagnostics.log(
                            "Custom response processing contained no recognizable scoring rules; validation is not available",
                        );
                        Ok(None)
                    }
                    // Depth guard tripped; already logged.
                    None => Ok(None),
                }
            }
            ResponseProcessingTemplate::None => self.no_template_validation(diagnostics),
        }
    }

    /// Fall back on the response declaration when no processing is
    /// declared: a mapping table implies mapped scoring, correct-response
    /// values imply exact matching.
    fn no_template_validation(
        &self,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        if let Some(declaration) = self.response_declaration() {
            let has_mapping = declaration
                .mapping
                .as_ref()
                .is_some_and(|m| !m.entries.is_empty());
            if has_mapping {
                diagnostics.log(
                    "Response processing is not set; assuming mapped scoring from the declared mapping table",
                );
                return self.map_response_validation(diagnostics);
            }
            if !declaration.correct_response.is_empty() {
                diagnostics.log(
                    "Response processing is not set; assuming exact matching on the declared correct response",
                );
                return self.match_correct_validation(None, diagnostics);
            }
        }
        diagnostics.log("No response processing detected; validation is not available");
        Ok(None)
    }

    /// The scoring facts addressed to this interaction, if a rule-tree
    /// walk produced any.
    fn scores_for_interaction<'a>(&self, scores: &'a ScoringResult) -> Option<&'a ScoringData> {
        let id = self.response_declaration().map(|d| d.identifier.as_str())?;
        scores.for_interaction(id)
    }
}

/// Score and scoring mode implied by walked scoring facts.
///
/// The score defaults to 1; a mapped score or a correct-branch outcome
/// overrides it when non-zero. Mapped scoring selects partial matching.
pub fn scoring_settings(data: Option<&ScoringData>) -> (f64, ScoringType) {
    let mut score = 1.0;
    let mut scoring_type = ScoringType::ExactMatch;
    if let Some(data) = data {
        if let Some(mapped) = data.score {
            if mapped != 0.0 {
                score = mapped;
            }
        }
        if let Some(CorrectOutcome::Score(value)) = data.correct.first() {
            if let Some(awarded) = value.as_f64() {
                if awarded != 0.0 {
                    score = awarded;
                }
            }
        }
        if data.scoring_type == Some(BranchScoring::Partial) {
            scoring_type = ScoringType::PartialMatch;
        }
    }
    (score, scoring_type)
}

/// Literal answers discovered in `<equal>` branches, with their awarded
/// scores, in document order.
pub fn scored_answers(data: &ScoringData) -> Vec<(f64, QtiValue)> {
    data.correct
        .iter()
        .filter_map(|outcome| match outcome {
            CorrectOutcome::ScoredAnswer { score, answer } => {
                Some((score.as_f64().unwrap_or(1.0), answer.clone()))
            }
            CorrectOutcome::Score(_) => None,
        })
        .collect()
}

struct DepthExceeded;

/// Reduces a builtin rule tree to per-interaction scoring facts.
struct RuleTreeWalker<'a> {
    response_declaration: Option<&'a ResponseDeclaration>,
    outcome_declarations: &'a OutcomeDeclarations,
}

/// Outcome values resolved from a branch's assignment rules.
#[derive(Default)]
struct OutcomeValues {
    values: Vec<QtiValue>,
    mapped_score: Option<f64>,
    map_response: bool,
}

impl RuleTreeWalker<'_> {
    /// Walk the whole tree. Returns `None` when the nesting depth guard
    /// trips, meaning the tree is unanalyzable.
    fn walk(
        &self,
        processing: &ResponseProcessing,
        diagnostics: &mut Diagnostics,
    ) -> Option<ScoringResult> {
        let mut result = ScoringResult::default();
        for rule in &processing.rules {
            match rule {
                ResponseRule::Condition(condition) => {
                    if self
                        .process_condition(&mut result, condition, 0, diagnostics)
                        .is_err()
                    {
                        return None;
                    }
                }
                ResponseRule::SetOutcomeValue(_) => {
                    diagnostics
                        .log("Skipping a top level setOutcomeValue rule in response processing");
                }
                ResponseRule::Unsupported(name) => {
                    diagnostics.log(format!(
                        "Unsupported response processing rule `{name}`; skipped"
                    ));
                }
            }
        }
        Some(result)
    }

    /// Process one condition. The first branch to establish an interaction
    /// identifier fixes the slot for every later keyless branch of the same
    /// condition, so a guardless `else` lands with the `if` it belongs to.
    fn process_condition(
        &self,
        result: &mut ScoringResult,
        condition: &ResponseCondition,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), DepthExceeded> {
        if depth >= MAX_CONDITION_DEPTH {
            diagnostics.log(format!(
                "Response condition nesting exceeds the supported depth of {MAX_CONDITION_DEPTH}; validation is not available"
            ));
            return Err(DepthExceeded);
        }

        let mut interaction_id: Option<String> = None;
        let mut branches: Vec<&ConditionBranch> = Vec::with_capacity(2 + condition.else_ifs.len());
        branches.push(&condition.response_if);
        branches.extend(condition.else_ifs.iter());
        branches.extend(condition.response_else.iter());

        for branch in branches {
            let (branch_id, data) = self.process_branch(result, branch, depth, diagnostics)?;
            if interaction_id.is_none() {
                interaction_id = branch_id;
            }
            result.merge_branch(interaction_id.as_deref(), data);
        }
        Ok(())
    }

    /// Classify one branch by its guard and resolve the outcome values its
    /// assignment rules produce. Nested conditions recurse into `result`
    /// under their own identifiers.
    fn process_branch(
        &self,
        result: &mut ScoringResult,
        branch: &ConditionBranch,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<(Option<String>, ScoringData), DepthExceeded> {
        let mut assignments: Vec<&SetOutcomeValue> = Vec::new();
        for rule in &branch.rules {
            match rule {
                ResponseRule::SetOutcomeValue(assignment) => assignments.push(assignment),
                ResponseRule::Condition(nested) => {
                    self.process_condition(result, nested, depth + 1, diagnostics)?;
                }
                ResponseRule::Unsupported(name) => {
                    diagnostics.log(format!(
                        "Unsupported response rule `{name}` inside a condition branch; skipped"
                    ));
                }
            }
        }

        let mut data = ScoringData::default();
        let mut interaction_id = None;

        match &branch.guard {
            Guard::IsNull { variable } => {
                interaction_id = Some(variable.clone());
                if assignments.len() > 1 {
                    diagnostics.log("Expected a single outcome assignment for an isNull branch");
                }
                let outcome = self.outcome_values(&assignments, diagnostics);
                data.unattempted = outcome.values.into_iter().next();
            }
            Guard::Match { response, .. } => {
                interaction_id = Some(response.clone());
                if assignments.len() > 1 {
                    diagnostics.log("Expected a single outcome assignment for a match branch");
                }
                let outcome = self.outcome_values(&assignments, diagnostics);
                if let Some(value) = outcome.values.into_iter().next() {
                    data.correct.push(CorrectOutcome::Score(value));
                }
                data.scoring_type = Some(BranchScoring::Match);
            }
            Guard::Equal { response, value } => {
                interaction_id = Some(response.clone());
                let outcome = self.outcome_values(&assignments, diagnostics);
                let score = outcome
                    .values
                    .into_iter()
                    .next()
                    .unwrap_or(QtiValue::Float(0.0));
                data.correct.push(CorrectOutcome::ScoredAnswer {
                    score,
                    answer: value.clone(),
                });
                data.scoring_type = Some(BranchScoring::Match);
            }
            Guard::None => {
                let outcome = self.outcome_values(&assignments, diagnostics);
                if outcome.map_response {
                    data.scoring_type = Some(BranchScoring::Partial);
                    data.score = outcome.mapped_score;
                } else {
                    data.incorrect = Some(
                        outcome
                            .values
                            .into_iter()
                            .next()
                            .unwrap_or(QtiValue::Float(0.0)),
                    );
                }
            }
            Guard::Unsupported(name) => {
                diagnostics.log(format!(
                    "Unsupported condition expression `{name}`; branch skipped"
                ));
            }
        }

        Ok((interaction_id, data))
    }

    /// Resolve the values assigned by a branch's `setOutcomeValue` rules.
    fn outcome_values(
        &self,
        assignments: &[&SetOutcomeValue],
        diagnostics: &mut Diagnostics,
    ) -> OutcomeValues {
        let mut outcome = OutcomeValues::default();
        for assignment in assignments {
            match &assignment.expression {
                OutcomeExpression::BaseValue(value) => outcome.values.push(value.clone()),
                OutcomeExpression::Variable(identifier) => {
                    let Some(declaration) = self.outcome_declarations.get(identifier) else {
                        diagnostics.log(format!(
                            "No outcomeDeclaration found for variable `{identifier}`; skipped"
                        ));
                        continue;
                    };
                    if let Some(value) = declaration.default_values.first() {
                        outcome.values.push(value.clone());
                    }
                }
                OutcomeExpression::MapResponse(identifier) => {
                    outcome.map_response = true;
                    outcome.mapped_score =
                        self.mapped_score(identifier.as_deref(), diagnostics);
                }
                OutcomeExpression::Unsupported(name) => {
                    diagnostics.log(format!(
                        "Unrecognized expression `{name}` inside setOutcomeValue; skipped"
                    ));
                }
            }
        }
        outcome
    }

    /// The score a `mapResponse` expression yields: the first strictly
    /// positive mapped value in the declaration's document order. When no
    /// entry is positive the last entry's value is kept.
    fn mapped_score(
        &self,
        identifier: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> Option<f64> {
        let declaration = self.response_declaration?;
        if let Some(id) = identifier {
            if id != declaration.identifier {
                diagnostics.log(format!(
                    "mapResponse refers to `{id}` which is not the governing response declaration"
                ));
            }
        }
        let mapping = declaration.mapping.as_ref()?;
        let mut score = None;
        for entry in &mapping.entries {
            score = Some(entry.mapped_value);
            if entry.mapped_value > 0.0 {
                break;
            }
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qti::{BaseType, Cardinality, MapEntry, Mapping};
    use std::collections::HashMap;

    fn declaration_with_mapping(values: &[f64]) -> ResponseDeclaration {
        let mut declaration =
            ResponseDeclaration::new("RESPONSE", Cardinality::Single, BaseType::Identifier);
        declaration.mapping = Some(Mapping {
            default_value: 0.0,
            entries: values
                .iter()
                .enumerate()
                .map(|(i, v)| MapEntry {
                    map_key: QtiValue::Identifier(format!("K{i}")),
                    mapped_value: *v,
                    case_sensitive: false,
                })
                .collect(),
        });
        declaration
    }

    fn set_score(expression: OutcomeExpression) -> ResponseRule {
        ResponseRule::SetOutcomeValue(SetOutcomeValue {
            identifier: "SCORE".to_string(),
            expression,
        })
    }

    fn walker<'a>(
        declaration: Option<&'a ResponseDeclaration>,
        outcomes: &'a OutcomeDeclarations,
    ) -> RuleTreeWalker<'a> {
        RuleTreeWalker {
            response_declaration: declaration,
            outcome_declarations: outcomes,
        }
    }

    #[test]
    fn test_map_response_takes_first_positive_mapped_value() {
        let declaration = declaration_with_mapping(&[0.5, 2.0, -1.0]);
        let outcomes = HashMap::new();
        let mut diagnostics = Diagnostics::new();

        let processing = ResponseProcessing {
            rules: vec![ResponseRule::Condition(ResponseCondition {
                response_if: ConditionBranch {
                    guard: Guard::None,
                    rules: vec![set_score(OutcomeExpression::MapResponse(None))],
                },
                else_ifs: vec![],
                response_else: None,
            })],
        };

        let result = walker(Some(&declaration), &outcomes)
            .walk(&processing, &mut diagnostics)
            .unwrap();
        let data = result.for_interaction("RESPONSE").unwrap();
        assert_eq!(data.score, Some(0.5));
        assert_eq!(data.scoring_type, Some(BranchScoring::Partial));
    }

    #[test]
    fn test_map_response_keeps_last_value_when_none_positive() {
        let declaration = declaration_with_mapping(&[-0.5, -1.0]);
        let outcomes = HashMap::new();
        let mut diagnostics = Diagnostics::new();

        let score = walker(Some(&declaration), &outcomes).mapped_score(None, &mut diagnostics);
        assert_eq!(score, Some(-1.0));
    }

    #[test]
    fn test_is_null_branch_records_unattempted_only() {
        let outcomes = HashMap::new();
        let mut diagnostics = Diagnostics::new();

        let processing = ResponseProcessing {
            rules: vec![ResponseRule::Condition(ResponseCondition {
                response_if: ConditionBranch {
                    guard: Guard::IsNull {
                        variable: "RESPONSE".to_string(),
                    },
                    rules: vec![set_score(OutcomeExpression::BaseValue(QtiValue::Float(
                        0.0,
                    )))],
                },
                else_ifs: vec![],
                response_else: None,
            })],
        };

        let result = walker(None, &outcomes)
            .walk(&processing, &mut diagnostics)
            .unwrap();
        let data = result.for_interaction("RESPONSE").unwrap();
        assert_eq!(data.unattempted, Some(QtiValue::Float(0.0)));
        assert!(data.correct.is_empty());
        assert!(data.incorrect.is_none());
    }

    #[test]
    fn test_first_branch_identifier_keys_the_guardless_else() {
        let outcomes = HashMap::new();
        let mut diagnostics = Diagnostics::new();

        let processing = ResponseProcessing {
            rules: vec![ResponseRule::Condition(ResponseCondition {
                response_if: ConditionBranch {
                    guard: Guard::Match {
                        response: "RESPONSE_1".to_string(),
                        correct: "RESPONSE_1".to_string(),
                    },
                    rules: vec![set_score(OutcomeExpression::BaseValue(QtiValue::Float(
                        2.0,
                    )))],
                },
                else_ifs: vec![ConditionBranch {
                    guard: Guard::Equal {
                        response: "RESPONSE_1".to_string(),
                        value: QtiValue::String("cat".to_string()),
                    },
                    rules: vec![set_score(OutcomeExpression::BaseValue(QtiValue::Float(
                        1.0,
                    )))],
                }],
                response_else: Some(ConditionBranch {
                    guard: Guard::None,
                    rules: vec![set_score(OutcomeExpression::BaseValue(QtiValue::Float(
                        0.0,
                    )))],
                }),
            })],
        };

        let result = walker(None, &outcomes)
            .walk(&processing, &mut diagnostics)
            .unwrap();

        assert!(result.global().is_empty());
        let data = result.for_interaction("RESPONSE_1").unwrap();
        assert_eq!(data.correct.len(), 2);
        assert_eq!(data.incorrect, Some(QtiValue::Float(0.0)));
        assert!(matches!(
            data.correct[1],
            CorrectOutcome::ScoredAnswer { .. }
        ));
    }

    #[test]
    fn test_variable_reference_resolves_outcome_default() {
        let mut outcomes = OutcomeDeclarations::new();
        outcomes.insert(
            "MAXSCORE".to_string(),
            crate::qti::OutcomeDeclaration {
                identifier: "MAXSCORE".to_string(),
                default_values: vec![QtiValue::Float(3.0)],
            },
        );
        let mut diagnostics = Diagnostics::new();

        let assignment = SetOutcomeValue {
            identifier: "SCORE".to_string(),
            expression: OutcomeExpression::Variable("MAXSCORE".to_string()),
        };
        let outcome =
            walker(None, &outcomes).outcome_values(&[&assignment], &mut diagnostics);
        assert_eq!(outcome.values, vec![QtiValue::Float(3.0)]);
    }

    #[test]
    fn test_missing_variable_declaration_is_skipped_with_diagnostic() {
        let outcomes = HashMap::new();
        let mut diagnostics = Diagnostics::new();

        let assignment = SetOutcomeValue {
            identifier: "SCORE".to_string(),
            expression: OutcomeExpression::Variable("MISSING".to_string()),
        };
        let outcome =
            walker(None, &outcomes).outcome_values(&[&assignment], &mut diagnostics);
        assert!(outcome.values.is_empty());
        assert!(diagnostics.messages().iter().any(|m| m.contains("MISSING")));
    }

    #[test]
    fn test_nesting_depth_guard_rejects_pathological_trees() {
        let outcomes = HashMap::new();
        let mut diagnostics = Diagnostics::new();

        let mut condition = ResponseCondition {
            response_if: ConditionBranch {
                guard: Guard::None,
                rules: vec![],
            },
            else_ifs: vec![],
            response_else: None,
        };
        for _ in 0..(MAX_CONDITION_DEPTH + 1) {
            condition = ResponseCondition {
                response_if: ConditionBranch {
                    guard: Guard::None,
                    rules: vec![ResponseRule::Condition(condition)],
                },
                else_ifs: vec![],
                response_else: None,
            };
        }
        let processing = ResponseProcessing {
            rules: vec![ResponseRule::Condition(condition)],
        };

        let result = walker(None, &outcomes).walk(&processing, &mut diagnostics);
        assert!(result.is_none());
        assert!(
            diagnostics
                .messages()
                .iter()
                .any(|m| m.contains("nesting exceeds"))
        );
    }

    #[test]
    fn test_scoring_settings_defaults() {
        let (score, scoring_type) = scoring_settings(None);
        assert_eq!(score, 1.0);
        assert_eq!(scoring_type, ScoringType::ExactMatch);

        let data = ScoringData {
            score: Some(0.5),
            scoring_type: Some(BranchScoring::Partial),
            ..Default::default()
        };
        let (score, scoring_type) = scoring_settings(Some(&data));
        assert_eq!(score, 0.5);
        assert_eq!(scoring_type, ScoringType::PartialMatch);
    }
}
