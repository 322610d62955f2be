//! Learnosity item export orchestrator
//!
//! Assembles one QTI assessment item from a Learnosity item and its
//! questions. Each question is attempted exactly once; a failing question
//! is reported in the outcome's message list and skipped, leaving its
//! siblings in the document.

use std::collections::HashSet;

use crate::convert::MappingError;
use crate::diagnostics::Diagnostics;
use crate::export::{InteractionProcessing, SideArtifact};
use crate::import::item::question_span;
use crate::models::Item;
use crate::qti::marshal::{ItemProcessing, assessment_item_xml};
use crate::qti::{ResponseDeclaration, ResponseProcessing};
use crate::registry::MapperRegistry;

/// Result of exporting one item.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    /// The assessment-item XML document.
    pub xml: String,
    /// Per-question failures; the document excludes the named questions.
    pub messages: Vec<String>,
    /// Side files referenced from the document, e.g. passage HTML.
    pub artifacts: Vec<SideArtifact>,
}

/// Export a Learnosity item as a QTI assessment item.
///
/// Only a failure to marshal the final document is an error; per-question
/// failures are reported through [`ExportOutcome::messages`].
pub fn write_item(
    item: &Item,
    registry: &MapperRegistry,
    diagnostics: &mut Diagnostics,
) -> Result<ExportOutcome, MappingError> {
    let mut content = item.content.clone();
    let mut messages = Vec::new();
    let mut artifacts = Vec::new();
    let mut declarations: Vec<ResponseDeclaration> = Vec::new();
    let mut processing: Vec<InteractionProcessing> = Vec::new();
    let mut used_identifiers = HashSet::new();

    for (index, question) in item.questions.iter().enumerate() {
        let span = question_span(&question.reference);
        let tag = question.type_tag();
        let Some(entry) = registry.resolve(tag) else {
            messages.push(format!(
                "Question `{}` has type `{tag}` with no registered mapper; skipped",
                question.reference
            ));
            content = content.replace(&span, "");
            continue;
        };

        let response_id = response_identifier(&question.reference, index, &mut used_identifiers);
        match (entry.export)(question, &response_id, diagnostics) {
            Ok(exported) => {
                if content.contains(&span) {
                    content = content.replace(&span, &exported.interaction_xml);
                } else {
                    content.push_str(&exported.interaction_xml);
                }
                declarations.extend(exported.response_declaration);
                processing.extend(exported.processing);
                artifacts.extend(exported.artifact);
            }
            Err(err) => {
                messages.push(format!(
                    "Question `{}` was not exported: {err}",
                    question.reference
                ));
                content = content.replace(&span, "");
            }
        }
    }

    let item_processing = merge_processing(processing);
    let xml = assessment_item_xml(
        &item.reference,
        &item.title,
        &declarations,
        &content,
        item_processing.as_ref(),
    )
    .map_err(|err| MappingError::Invalid(err.to_string()))?;

    Ok(ExportOutcome {
        xml,
        messages,
        artifacts,
    })
}

/// The response identifier a question's interaction uses: the reference
/// suffix when it looks like one, otherwise a generated identifier. Always
/// unique within the item.
fn response_identifier(
    reference: &str,
    index: usize,
    used: &mut HashSet<String>,
) -> String {
    let candidate = reference
        .rsplit_once('_')
        .map(|(_, suffix)| suffix)
        .filter(|suffix| {
            !suffix.is_empty()
                && suffix.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && suffix.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_string);

    let mut identifier = candidate.unwrap_or_else(|| {
        if index == 0 {
            "RESPONSE".to_string()
        } else {
            format!("RESPONSE_{index}")
        }
    });
    while !used.insert(identifier.clone()) {
        identifier = format!("{identifier}_{index}");
    }
    identifier
}

/// Merge per-question processing. A single template-shaped contribution
/// keeps the compact `template` attribute form; anything else becomes one
/// explicit rule tree.
fn merge_processing(contributions: Vec<InteractionProcessing>) -> Option<ItemProcessing> {
    match contributions.len() {
        0 => None,
        1 => {
            let contribution = contributions.into_iter().next()?;
            match contribution.template_uri {
                Some(uri) => Some(ItemProcessing::Template(uri.to_string())),
                None => Some(ItemProcessing::Rules(ResponseProcessing {
                    rules: contribution.rules,
                })),
            }
        }
        _ => {
            let rules = contributions
                .into_iter()
                .flat_map(|contribution| contribution.rules)
                .collect();
            Some(ItemProcessing::Rules(ResponseProcessing { rules }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChoiceOption, McqQuestion, Question, QuestionData, Validation,
    };

    fn mcq_question(reference: &str) -> Question {
        Question::new(
            reference,
            QuestionData::Mcq(McqQuestion {
                options: vec![ChoiceOption {
                    label: "Alpha".to_string(),
                    value: "A".to_string(),
                }],
                validation: Some(Validation::exact_match(1.0, serde_json::json!(["A"]))),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_single_template_question_keeps_template_attribute() {
        let mut item = Item::new("item-1");
        item.questions.push(mcq_question("item-1_R1"));
        let registry = MapperRegistry::builtin();
        let mut diagnostics = Diagnostics::new();

        let outcome = write_item(&item, &registry, &mut diagnostics).unwrap();
        assert!(outcome.messages.is_empty());
        assert!(outcome.xml.contains("rptemplates/match_correct"));
        assert!(outcome.xml.contains(r#"responseIdentifier="R1""#));
    }

    #[test]
    fn test_reference_suffix_restores_response_identifier() {
        let mut used = HashSet::new();
        assert_eq!(response_identifier("item-1_R1", 0, &mut used), "R1");
        assert_eq!(response_identifier("noseparator", 1, &mut used), "RESPONSE_1");
        // A colliding suffix is disambiguated.
        assert_eq!(response_identifier("item-2_R1", 2, &mut used), "R1_2");
    }

    #[test]
    fn test_unregistered_type_is_reported_and_siblings_survive() {
        let mut registry = MapperRegistry::new();
        let builtin = MapperRegistry::builtin();
        registry.register("mcq", *builtin.resolve("mcq").unwrap());

        let mut item = Item::new("item-1");
        item.questions.push(mcq_question("item-1_R1"));
        item.questions.push(Question::new(
            "item-1_R2",
            QuestionData::LongText(Default::default()),
        ));
        let mut diagnostics = Diagnostics::new();

        let outcome = write_item(&item, &registry, &mut diagnostics).unwrap();
        assert_eq!(outcome.messages.len(), 1);
        assert!(outcome.messages[0].contains("longtextV2"));
        assert!(outcome.xml.contains("choiceInteraction"));
        assert!(!outcome.xml.contains("extendedTextInteraction"));
    }
}
