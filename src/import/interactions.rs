//! Per-type interaction import mappers
//!
//! One mapper per registered question type. Each mapper shapes the
//! interaction node into its question payload and delegates scoring to its
//! [`InteractionValidationBuilder`] implementation.

use serde_json::Value;

use crate::convert::MappingError;
use crate::diagnostics::Diagnostics;
use crate::import::validation::{InteractionValidationBuilder, scored_answers, scoring_settings};
use crate::models::{
    AssociationQuestion, AudioPlayerFeature, ChoiceOption, LongTextQuestion, McqQuestion,
    OrderListQuestion, QuestionData, ShortTextQuestion, ValidResponse, Validation,
};
use crate::qti::{
    AssessmentItem, Cardinality, Interaction, InteractionChoice, OutcomeDeclarations,
    ResponseDeclaration, ResponseProcessingTemplate,
};

fn choice_options(choices: &[InteractionChoice]) -> Vec<ChoiceOption> {
    choices
        .iter()
        .map(|choice| ChoiceOption {
            label: choice.content.clone(),
            value: choice.identifier.clone(),
        })
        .collect()
}

fn required_declaration<'a>(
    declaration: Option<&'a ResponseDeclaration>,
    element: &str,
) -> Result<&'a ResponseDeclaration, MappingError> {
    declaration.ok_or_else(|| {
        MappingError::Invalid(format!("`{element}` has no matching responseDeclaration"))
    })
}

/// Choice interactions map to `mcq`.
pub fn import_mcq(
    interaction: &Interaction,
    document: &AssessmentItem,
    diagnostics: &mut Diagnostics,
) -> Result<QuestionData, MappingError> {
    let declaration = document.response_declaration(&interaction.response_identifier);
    let builder = ChoiceValidationBuilder {
        declaration,
        outcomes: &document.outcome_declarations,
    };
    let validation = builder.build_validation(&document.response_processing, diagnostics);

    let multiple_responses = declaration
        .map(|d| d.cardinality == Cardinality::Multiple)
        .unwrap_or(false)
        || interaction.max_choices.is_some_and(|max| max != 1);

    Ok(QuestionData::Mcq(McqQuestion {
        stimulus: interaction.prompt.clone().unwrap_or_default(),
        options: choice_options(&interaction.choices),
        multiple_responses,
        shuffle_options: interaction.shuffle,
        validation,
    }))
}

/// Text-entry interactions map to `shorttext`.
pub fn import_short_text(
    interaction: &Interaction,
    document: &AssessmentItem,
    diagnostics: &mut Diagnostics,
) -> Result<QuestionData, MappingError> {
    let declaration = document.response_declaration(&interaction.response_identifier);
    let builder = TextValidationBuilder {
        declaration,
        outcomes: &document.outcome_declarations,
    };
    let validation = builder.build_validation(&document.response_processing, diagnostics);

    let case_sensitive = declaration
        .and_then(|d| d.mapping.as_ref())
        .is_some_and(|mapping| mapping.entries.iter().any(|entry| entry.case_sensitive));

    Ok(QuestionData::ShortText(ShortTextQuestion {
        stimulus: interaction.prompt.clone().unwrap_or_default(),
        max_length: interaction.expected_length,
        case_sensitive,
        validation,
    }))
}

/// Extended-text interactions map to `longtextV2`, which is never
/// auto-scored.
pub fn import_long_text(
    interaction: &Interaction,
    document: &AssessmentItem,
    diagnostics: &mut Diagnostics,
) -> Result<QuestionData, MappingError> {
    if !matches!(document.response_processing, ResponseProcessingTemplate::None) {
        diagnostics
            .log("longtextV2 questions are scored by hand; response processing is ignored");
    }
    Ok(QuestionData::LongText(LongTextQuestion {
        stimulus: interaction.prompt.clone().unwrap_or_default(),
    }))
}

/// Order interactions map to `orderlist`.
pub fn import_order_list(
    interaction: &Interaction,
    document: &AssessmentItem,
    diagnostics: &mut Diagnostics,
) -> Result<QuestionData, MappingError> {
    let declaration = document.response_declaration(&interaction.response_identifier);
    let builder = OrderValidationBuilder {
        declaration,
        outcomes: &document.outcome_declarations,
    };
    let validation = builder.build_validation(&document.response_processing, diagnostics);

    Ok(QuestionData::OrderList(OrderListQuestion {
        stimulus: interaction.prompt.clone().unwrap_or_default(),
        list: choice_options(&interaction.choices),
        shuffle_options: interaction.shuffle,
        validation,
    }))
}

/// Match interactions map to `association`.
pub fn import_association(
    interaction: &Interaction,
    document: &AssessmentItem,
    diagnostics: &mut Diagnostics,
) -> Result<QuestionData, MappingError> {
    if interaction.match_sets.len() < 2 {
        return Err(MappingError::Invalid(
            "`matchInteraction` requires two simpleMatchSet children".to_string(),
        ));
    }

    let declaration = document.response_declaration(&interaction.response_identifier);
    let builder = AssociationValidationBuilder {
        declaration,
        outcomes: &document.outcome_declarations,
    };
    let validation = builder.build_validation(&document.response_processing, diagnostics);

    Ok(QuestionData::Association(AssociationQuestion {
        stimulus: interaction.prompt.clone().unwrap_or_default(),
        stimulus_list: choice_options(&interaction.match_sets[0]),
        possible_responses: choice_options(&interaction.match_sets[1]),
        duplicate_responses: false,
        validation,
    }))
}

/// Media interactions carrying audio map to the `audioplayer` feature.
pub fn import_audio_player(
    interaction: &Interaction,
    _document: &AssessmentItem,
    diagnostics: &mut Diagnostics,
) -> Result<QuestionData, MappingError> {
    let object = interaction.object.as_ref().ok_or_else(|| {
        MappingError::Invalid("`mediaInteraction` has no <object> child".to_string())
    })?;
    if !object.media_type.starts_with("audio") {
        diagnostics.log(format!(
            "mediaInteraction object type `{}` is not audio; mapping to audioplayer anyway",
            object.media_type
        ));
    }
    Ok(QuestionData::AudioPlayer(AudioPlayerFeature {
        src: object.data.clone(),
    }))
}

/// Shared passages only exist on the Learnosity side; no QTI interaction
/// produces one.
pub fn import_shared_passage(
    interaction: &Interaction,
    _document: &AssessmentItem,
    _diagnostics: &mut Diagnostics,
) -> Result<QuestionData, MappingError> {
    Err(MappingError::UnsupportedType(format!(
        "`{}` cannot be imported as a shared passage",
        interaction.element
    )))
}

struct ChoiceValidationBuilder<'a> {
    declaration: Option<&'a ResponseDeclaration>,
    outcomes: &'a OutcomeDeclarations,
}

impl InteractionValidationBuilder for ChoiceValidationBuilder<'_> {
    fn response_declaration(&self) -> Option<&ResponseDeclaration> {
        self.declaration
    }

    fn outcome_declarations(&self) -> &OutcomeDeclarations {
        self.outcomes
    }

    fn match_correct_validation(
        &self,
        scores: Option<&crate::import::scoring::ScoringResult>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        let declaration = required_declaration(self.declaration, "choiceInteraction")?;
        if declaration.correct_response.is_empty() {
            diagnostics.log("No correctResponse declared; validation is not available");
            return Ok(None);
        }
        let values: Vec<Value> = declaration
            .correct_response
            .iter()
            .map(|v| v.to_json())
            .collect();
        let data = scores.and_then(|s| self.scores_for_interaction(s));
        let (score, _) = scoring_settings(data);
        Ok(Some(Validation::exact_match(score, Value::Array(values))))
    }

    fn map_response_validation(
        &self,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        let declaration = required_declaration(self.declaration, "choiceInteraction")?;
        let Some(mapping) = declaration.mapping.as_ref() else {
            return Err(MappingError::Invalid(
                "map_response scoring requires a mapping table".to_string(),
            ));
        };
        // Positively mapped choices form the valid set; their mapped
        // values add up to the question score.
        let mut values = Vec::new();
        let mut score = 0.0;
        for entry in &mapping.entries {
            if entry.mapped_value > 0.0 {
                values.push(entry.map_key.to_json());
                score += entry.mapped_value;
            }
        }
        if values.is_empty() {
            diagnostics.log("Mapping table has no positive entries; validation is not available");
            return Ok(None);
        }
        Ok(Some(Validation::partial_match(score, Value::Array(values))))
    }
}

struct TextValidationBuilder<'a> {
    declaration: Option<&'a ResponseDeclaration>,
    outcomes: &'a OutcomeDeclarations,
}

impl InteractionValidationBuilder for TextValidationBuilder<'_> {
    fn response_declaration(&self) -> Option<&ResponseDeclaration> {
        self.declaration
    }

    fn outcome_declarations(&self) -> &OutcomeDeclarations {
        self.outcomes
    }

    fn match_correct_validation(
        &self,
        scores: Option<&crate::import::scoring::ScoringResult>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        let data = scores.and_then(|s| self.scores_for_interaction(s));
        let (score, scoring_type) = scoring_settings(data);

        // Literal answers from equal-comparison branches come first, then
        // the declared correct responses, all in document order.
        let mut responses: Vec<ValidResponse> = Vec::new();
        if let Some(data) = data {
            for (answer_score, answer) in scored_answers(data) {
                responses.push(ValidResponse {
                    score: if answer_score != 0.0 {
                        answer_score
                    } else {
                        score
                    },
                    value: answer.to_json(),
                });
            }
        }
        if let Some(declaration) = self.declaration {
            for value in &declaration.correct_response {
                responses.push(ValidResponse {
                    score,
                    value: value.to_json(),
                });
            }
        }
        if responses.is_empty() {
            diagnostics.log("No correct answers declared; validation is not available");
            return Ok(None);
        }

        let valid_response = responses.remove(0);
        Ok(Some(Validation {
            scoring_type,
            valid_response,
            alt_responses: responses,
        }))
    }

    fn map_response_validation(
        &self,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        let declaration = required_declaration(self.declaration, "textEntryInteraction")?;
        let Some(mapping) = declaration.mapping.as_ref() else {
            return Err(MappingError::Invalid(
                "map_response scoring requires a mapping table".to_string(),
            ));
        };
        if mapping.entries.is_empty() {
            diagnostics.log("Mapping table is empty; validation is not available");
            return Ok(None);
        }
        // Each map entry is an exact alternative with its own score.
        let mut responses: Vec<ValidResponse> = mapping
            .entries
            .iter()
            .map(|entry| ValidResponse {
                score: entry.mapped_value,
                value: entry.map_key.to_json(),
            })
            .collect();
        let valid_response = responses.remove(0);
        Ok(Some(Validation {
            scoring_type: crate::models::ScoringType::ExactMatch,
            valid_response,
            alt_responses: responses,
        }))
    }
}

struct OrderValidationBuilder<'a> {
    declaration: Option<&'a ResponseDeclaration>,
    outcomes: &'a OutcomeDeclarations,
}

impl InteractionValidationBuilder for OrderValidationBuilder<'_> {
    fn response_declaration(&self) -> Option<&ResponseDeclaration> {
        self.declaration
    }

    fn outcome_declarations(&self) -> &OutcomeDeclarations {
        self.outcomes
    }

    fn match_correct_validation(
        &self,
        scores: Option<&crate::import::scoring::ScoringResult>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        let declaration = required_declaration(self.declaration, "orderInteraction")?;
        if declaration.correct_response.is_empty() {
            diagnostics.log("No correctResponse declared; validation is not available");
            return Ok(None);
        }
        let values: Vec<Value> = declaration
            .correct_response
            .iter()
            .map(|v| v.to_json())
            .collect();
        let data = scores.and_then(|s| self.scores_for_interaction(s));
        let (score, _) = scoring_settings(data);
        Ok(Some(Validation::exact_match(score, Value::Array(values))))
    }
}

struct AssociationValidationBuilder<'a> {
    declaration: Option<&'a ResponseDeclaration>,
    outcomes: &'a OutcomeDeclarations,
}

impl InteractionValidationBuilder for AssociationValidationBuilder<'_> {
    fn response_declaration(&self) -> Option<&ResponseDeclaration> {
        self.declaration
    }

    fn outcome_declarations(&self) -> &OutcomeDeclarations {
        self.outcomes
    }

    fn match_correct_validation(
        &self,
        scores: Option<&crate::import::scoring::ScoringResult>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        let declaration = required_declaration(self.declaration, "matchInteraction")?;
        if declaration.correct_response.is_empty() {
            diagnostics.log("No correctResponse declared; validation is not available");
            return Ok(None);
        }
        // Association answers are the declared pairs in "source target"
        // lexical form.
        let values: Vec<Value> = declaration
            .correct_response
            .iter()
            .map(|v| Value::String(v.lexical()))
            .collect();
        let data = scores.and_then(|s| self.scores_for_interaction(s));
        let (score, _) = scoring_settings(data);
        Ok(Some(Validation::exact_match(score, Value::Array(values))))
    }

    fn map_response_validation(
        &self,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<Validation>, MappingError> {
        let declaration = required_declaration(self.declaration, "matchInteraction")?;
        let Some(mapping) = declaration.mapping.as_ref() else {
            return Err(MappingError::Invalid(
                "map_response scoring requires a mapping table".to_string(),
            ));
        };
        let mut values = Vec::new();
        let mut score = 0.0;
        for entry in &mapping.entries {
            if entry.mapped_value > 0.0 {
                values.push(Value::String(entry.map_key.lexical()));
                score += entry.mapped_value;
            }
        }
        if values.is_empty() {
            diagnostics.log("Mapping table has no positive entries; validation is not available");
            return Ok(None);
        }
        Ok(Some(Validation::partial_match(score, Value::Array(values))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoringType;
    use crate::qti::{BaseType, MapEntry, Mapping, QtiValue};

    fn document_with(declaration: ResponseDeclaration) -> AssessmentItem {
        let mut document = AssessmentItem {
            identifier: "item-1".to_string(),
            response_processing: ResponseProcessingTemplate::MatchCorrect,
            ..Default::default()
        };
        document
            .response_declarations
            .insert(declaration.identifier.clone(), declaration);
        document
    }

    fn choice_interaction() -> Interaction {
        Interaction {
            element: "choiceInteraction".to_string(),
            response_identifier: "RESPONSE".to_string(),
            max_choices: Some(1),
            choices: vec![
                InteractionChoice {
                    identifier: "A".to_string(),
                    content: "Alpha".to_string(),
                },
                InteractionChoice {
                    identifier: "B".to_string(),
                    content: "Beta".to_string(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_mcq_match_correct_scores_declared_identifiers() {
        let mut declaration =
            ResponseDeclaration::new("RESPONSE", Cardinality::Single, BaseType::Identifier);
        declaration
            .correct_response
            .push(QtiValue::Identifier("B".to_string()));
        let document = document_with(declaration);
        let mut diagnostics = Diagnostics::new();

        let data = import_mcq(&choice_interaction(), &document, &mut diagnostics).unwrap();
        let QuestionData::Mcq(question) = data else {
            panic!("expected mcq");
        };
        let validation = question.validation.unwrap();
        assert_eq!(validation.scoring_type, ScoringType::ExactMatch);
        assert_eq!(validation.valid_response.score, 1.0);
        assert_eq!(validation.valid_response.value, serde_json::json!(["B"]));
        assert!(!question.multiple_responses);
    }

    #[test]
    fn test_short_text_mapping_entries_become_alternatives() {
        let mut declaration =
            ResponseDeclaration::new("RESPONSE", Cardinality::Single, BaseType::String);
        declaration.mapping = Some(Mapping {
            default_value: 0.0,
            entries: vec![
                MapEntry {
                    map_key: QtiValue::String("york".to_string()),
                    mapped_value: 1.0,
                    case_sensitive: false,
                },
                MapEntry {
                    map_key: QtiValue::String("York".to_string()),
                    mapped_value: 0.5,
                    case_sensitive: true,
                },
            ],
        });
        let mut document = document_with(declaration);
        document.response_processing = ResponseProcessingTemplate::MapResponse;
        let mut diagnostics = Diagnostics::new();

        let interaction = Interaction {
            element: "textEntryInteraction".to_string(),
            response_identifier: "RESPONSE".to_string(),
            expected_length: Some(15),
            ..Default::default()
        };
        let data = import_short_text(&interaction, &document, &mut diagnostics).unwrap();
        let QuestionData::ShortText(question) = data else {
            panic!("expected shorttext");
        };
        assert_eq!(question.max_length, Some(15));
        assert!(question.case_sensitive);

        let validation = question.validation.unwrap();
        assert_eq!(validation.valid_response.value, serde_json::json!("york"));
        assert_eq!(validation.alt_responses.len(), 1);
        assert_eq!(validation.alt_responses[0].score, 0.5);
    }

    #[test]
    fn test_association_requires_two_match_sets() {
        let document = AssessmentItem::default();
        let mut diagnostics = Diagnostics::new();

        let interaction = Interaction {
            element: "matchInteraction".to_string(),
            response_identifier: "RESPONSE".to_string(),
            match_sets: vec![vec![]],
            ..Default::default()
        };
        let err = import_association(&interaction, &document, &mut diagnostics).unwrap_err();
        assert!(err.to_string().contains("simpleMatchSet"));
    }

    #[test]
    fn test_audio_player_requires_object() {
        let document = AssessmentItem::default();
        let mut diagnostics = Diagnostics::new();

        let interaction = Interaction {
            element: "mediaInteraction".to_string(),
            response_identifier: "RESPONSE".to_string(),
            ..Default::default()
        };
        assert!(import_audio_player(&interaction, &document, &mut diagnostics).is_err());
    }

    #[test]
    fn test_missing_declaration_degrades_to_no_validation() {
        let document = AssessmentItem {
            response_processing: ResponseProcessingTemplate::MatchCorrect,
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();

        let data = import_mcq(&choice_interaction(), &document, &mut diagnostics).unwrap();
        let QuestionData::Mcq(question) = data else {
            panic!("expected mcq");
        };
        assert!(question.validation.is_none());
        assert!(!diagnostics.is_empty());
    }
}
