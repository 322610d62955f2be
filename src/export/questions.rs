//! Per-type question export writers
//!
//! One writer per registered question type. Each writer produces the
//! interaction XML fragment together with the response declaration and
//! processing rules its validation object implies.

use crate::convert::MappingError;
use crate::diagnostics::Diagnostics;
use crate::export::validation::{
    equal_answers_processing, identifier_values, map_response_processing,
    match_correct_processing, pair_values, spread_mapping,
};
use crate::export::{ExportedInteraction, SideArtifact};
use crate::models::{Question, QuestionData, ScoringType, Validation};
use crate::qti::marshal::{
    choice_interaction_xml, extended_text_interaction_xml, match_interaction_xml,
    media_interaction_xml, text_entry_interaction_xml,
};
use crate::qti::{BaseType, Cardinality, MarshalError, QtiValue, ResponseDeclaration};

fn wrong_payload(question: &Question, expected: &str) -> MappingError {
    MappingError::Invalid(format!(
        "question `{}` is registered as `{expected}` but carries a different payload",
        question.reference
    ))
}

fn marshal_failure(err: MarshalError) -> MappingError {
    MappingError::Invalid(err.to_string())
}

fn stimulus_paragraph(stimulus: &str) -> String {
    if stimulus.is_empty() {
        String::new()
    } else {
        format!("<p>{stimulus}</p>")
    }
}

fn prompt(stimulus: &str) -> Option<&str> {
    (!stimulus.is_empty()).then_some(stimulus)
}

fn option_pairs(options: &[crate::models::ChoiceOption]) -> Vec<(String, String)> {
    options
        .iter()
        .map(|option| (option.value.clone(), option.label.clone()))
        .collect()
}

/// `mcq` exports as a `<choiceInteraction>`.
pub fn export_mcq(
    question: &Question,
    response_id: &str,
    diagnostics: &mut Diagnostics,
) -> Result<ExportedInteraction, MappingError> {
    let QuestionData::Mcq(q) = &question.data else {
        return Err(wrong_payload(question, "mcq"));
    };

    let cardinality = if q.multiple_responses {
        Cardinality::Multiple
    } else {
        Cardinality::Single
    };
    let mut declaration = ResponseDeclaration::new(response_id, cardinality, BaseType::Identifier);

    let processing = match &q.validation {
        None => None,
        Some(validation) => match validation.scoring_type {
            ScoringType::ExactMatch => {
                declaration.correct_response = identifier_values(&validation.valid_response.value)?;
                if !validation.alt_responses.is_empty() {
                    diagnostics.log(
                        "Alternative correct choice sets cannot be expressed in QTI; only the valid response is kept",
                    );
                }
                Some(match_correct_processing(
                    response_id,
                    validation.valid_response.score,
                ))
            }
            ScoringType::PartialMatch => {
                let keys = identifier_values(&validation.valid_response.value)?;
                if !validation.alt_responses.is_empty() {
                    diagnostics.log(
                        "Alternative choice sets cannot be folded into a QTI mapping; only the valid response is kept",
                    );
                }
                declaration.mapping =
                    Some(spread_mapping(keys, validation.valid_response.score));
                Some(map_response_processing(response_id))
            }
        },
    };

    let max_choices = if q.multiple_responses { 0 } else { 1 };
    let xml = choice_interaction_xml(
        "choiceInteraction",
        response_id,
        q.shuffle_options,
        Some(max_choices),
        prompt(&q.stimulus),
        &option_pairs(&q.options),
    )
    .map_err(marshal_failure)?;

    Ok(ExportedInteraction {
        interaction_xml: xml,
        response_declaration: Some(declaration),
        processing,
        artifact: None,
    })
}

/// `shorttext` exports as a `<textEntryInteraction>`.
pub fn export_short_text(
    question: &Question,
    response_id: &str,
    _diagnostics: &mut Diagnostics,
) -> Result<ExportedInteraction, MappingError> {
    let QuestionData::ShortText(q) = &question.data else {
        return Err(wrong_payload(question, "shorttext"));
    };

    let mut declaration =
        ResponseDeclaration::new(response_id, Cardinality::Single, BaseType::String);

    let processing = match &q.validation {
        None => None,
        Some(validation) => match validation.scoring_type {
            ScoringType::ExactMatch => Some(exact_text_processing(
                response_id,
                validation,
                &mut declaration,
            )?),
            ScoringType::PartialMatch => {
                declaration.mapping = Some(text_mapping(validation, q.case_sensitive)?);
                Some(map_response_processing(response_id))
            }
        },
    };

    let entry =
        text_entry_interaction_xml(response_id, q.max_length).map_err(marshal_failure)?;
    let xml = format!("{}{}", stimulus_paragraph(&q.stimulus), entry);

    Ok(ExportedInteraction {
        interaction_xml: xml,
        response_declaration: Some(declaration),
        processing,
        artifact: None,
    })
}

/// A single answer keeps the declared-correct-response form; several
/// differently scored answers need one equal-comparison branch each.
fn exact_text_processing(
    response_id: &str,
    validation: &Validation,
    declaration: &mut ResponseDeclaration,
) -> Result<crate::export::InteractionProcessing, MappingError> {
    if validation.alt_responses.is_empty() {
        declaration.correct_response =
            vec![text_answer(&validation.valid_response.value)?];
        return Ok(match_correct_processing(
            response_id,
            validation.valid_response.score,
        ));
    }
    let answers = validation
        .all_responses()
        .map(|response| Ok((response.score, text_answer(&response.value)?)))
        .collect::<Result<Vec<_>, MappingError>>()?;
    Ok(equal_answers_processing(response_id, &answers))
}

fn text_mapping(
    validation: &Validation,
    case_sensitive: bool,
) -> Result<crate::qti::Mapping, MappingError> {
    let entries = validation
        .all_responses()
        .map(|response| {
            Ok(crate::qti::MapEntry {
                map_key: text_answer(&response.value)?,
                mapped_value: response.score,
                case_sensitive,
            })
        })
        .collect::<Result<Vec<_>, MappingError>>()?;
    Ok(crate::qti::Mapping {
        default_value: 0.0,
        entries,
    })
}

fn text_answer(value: &serde_json::Value) -> Result<QtiValue, MappingError> {
    match value {
        serde_json::Value::String(s) => Ok(QtiValue::String(s.clone())),
        serde_json::Value::Number(n) => Ok(QtiValue::String(n.to_string())),
        other => Err(MappingError::Invalid(format!(
            "shorttext answer `{other}` is not scalar"
        ))),
    }
}

/// `longtextV2` exports as an `<extendedTextInteraction>`; hand-scored, so
/// no processing is emitted.
pub fn export_long_text(
    question: &Question,
    response_id: &str,
    _diagnostics: &mut Diagnostics,
) -> Result<ExportedInteraction, MappingError> {
    let QuestionData::LongText(q) = &question.data else {
        return Err(wrong_payload(question, "longtextV2"));
    };

    let interaction = extended_text_interaction_xml(response_id).map_err(marshal_failure)?;
    Ok(ExportedInteraction {
        interaction_xml: format!("{}{}", stimulus_paragraph(&q.stimulus), interaction),
        response_declaration: Some(ResponseDeclaration::new(
            response_id,
            Cardinality::Single,
            BaseType::String,
        )),
        processing: None,
        artifact: None,
    })
}

/// `orderlist` exports as an `<orderInteraction>`.
pub fn export_order_list(
    question: &Question,
    response_id: &str,
    diagnostics: &mut Diagnostics,
) -> Result<ExportedInteraction, MappingError> {
    let QuestionData::OrderList(q) = &question.data else {
        return Err(wrong_payload(question, "orderlist"));
    };

    let mut declaration =
        ResponseDeclaration::new(response_id, Cardinality::Ordered, BaseType::Identifier);
    let processing = match &q.validation {
        None => None,
        Some(validation) => {
            if validation.scoring_type == ScoringType::PartialMatch {
                diagnostics.log(
                    "Partial scoring for orderlist cannot be expressed in QTI; exporting exact order matching",
                );
            }
            declaration.correct_response = identifier_values(&validation.valid_response.value)?;
            Some(match_correct_processing(
                response_id,
                validation.valid_response.score,
            ))
        }
    };

    let xml = choice_interaction_xml(
        "orderInteraction",
        response_id,
        q.shuffle_options,
        None,
        prompt(&q.stimulus),
        &option_pairs(&q.list),
    )
    .map_err(marshal_failure)?;

    Ok(ExportedInteraction {
        interaction_xml: xml,
        response_declaration: Some(declaration),
        processing,
        artifact: None,
    })
}

/// `association` exports as a `<matchInteraction>`.
pub fn export_association(
    question: &Question,
    response_id: &str,
    diagnostics: &mut Diagnostics,
) -> Result<ExportedInteraction, MappingError> {
    let QuestionData::Association(q) = &question.data else {
        return Err(wrong_payload(question, "association"));
    };

    let mut declaration =
        ResponseDeclaration::new(response_id, Cardinality::Multiple, BaseType::DirectedPair);
    let processing = match &q.validation {
        None => None,
        Some(validation) => match validation.scoring_type {
            ScoringType::ExactMatch => {
                declaration.correct_response = pair_values(&validation.valid_response.value)?;
                Some(match_correct_processing(
                    response_id,
                    validation.valid_response.score,
                ))
            }
            ScoringType::PartialMatch => {
                let keys = pair_values(&validation.valid_response.value)?;
                let mut mapping = spread_mapping(keys, validation.valid_response.score);
                // A single-pair alternative is one extra scored key; anything
                // wider has no mapping-table equivalent.
                for alt in &validation.alt_responses {
                    match pair_values(&alt.value) {
                        Ok(pairs) if pairs.len() == 1 => {
                            mapping.entries.extend(pairs.into_iter().map(|map_key| {
                                crate::qti::MapEntry {
                                    map_key,
                                    mapped_value: alt.score,
                                    case_sensitive: false,
                                }
                            }));
                        }
                        _ => diagnostics.log(format!(
                            "Alternative pairing set for `{}` cannot be folded into a QTI mapping and is dropped",
                            question.reference
                        )),
                    }
                }
                declaration.mapping = Some(mapping);
                Some(map_response_processing(response_id))
            }
        },
    };

    let sets = vec![
        option_pairs(&q.stimulus_list),
        option_pairs(&q.possible_responses),
    ];
    let xml = match_interaction_xml(
        response_id,
        false,
        q.stimulus_list.len() as u32,
        &sets,
    )
    .map_err(marshal_failure)?;

    let mut fragment = stimulus_paragraph(&q.stimulus);
    fragment.push_str(&xml);

    Ok(ExportedInteraction {
        interaction_xml: fragment,
        response_declaration: Some(declaration),
        processing,
        artifact: None,
    })
}

/// `audioplayer` exports as a `<mediaInteraction>` wrapping the audio
/// object.
pub fn export_audio_player(
    question: &Question,
    response_id: &str,
    _diagnostics: &mut Diagnostics,
) -> Result<ExportedInteraction, MappingError> {
    let QuestionData::AudioPlayer(q) = &question.data else {
        return Err(wrong_payload(question, "audioplayer"));
    };

    let xml = media_interaction_xml(response_id, &q.src, "audio/mpeg").map_err(marshal_failure)?;
    Ok(ExportedInteraction {
        interaction_xml: xml,
        response_declaration: Some(ResponseDeclaration::new(
            response_id,
            Cardinality::Single,
            BaseType::String,
        )),
        processing: None,
        artifact: None,
    })
}

/// `sharedpassage` exports as an object reference in the body plus a side
/// HTML file carrying the passage content.
pub fn export_shared_passage(
    question: &Question,
    _response_id: &str,
    _diagnostics: &mut Diagnostics,
) -> Result<ExportedInteraction, MappingError> {
    let QuestionData::SharedPassage(q) = &question.data else {
        return Err(wrong_payload(question, "sharedpassage"));
    };

    let name = format!("{}.html", question.reference);
    let mut exported = ExportedInteraction::fragment(format!(
        r#"<div class="learnosity-shared-passage"><object type="text/html" data="{name}"/></div>"#
    ));
    exported.artifact = Some(SideArtifact {
        name,
        content: q.content.clone(),
    });
    Ok(exported)
}
