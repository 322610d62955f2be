//! QTI item import orchestrator
//!
//! Maps a parsed assessment item to a Learnosity item with its questions.
//! Every interaction is attempted exactly once; a failing interaction is
//! recorded and dropped from the content while its siblings are mapped
//! normally, so the caller always gets a partial item rather than nothing.

use crate::convert::MappingError;
use crate::diagnostics::Diagnostics;
use crate::models::{Item, Question};
use crate::qti::{AssessmentItem, interaction_placeholder};
use crate::registry::MapperRegistry;

/// The span written into the item content where a mapped question sits.
pub fn question_span(reference: &str) -> String {
    format!(r#"<span class="learnosity-response question-{reference}"></span>"#)
}

/// Map a parsed assessment item to a Learnosity item.
///
/// Returns the (possibly partial) item together with the mapping errors of
/// any interactions that could not be converted.
pub fn map_assessment_item(
    document: &AssessmentItem,
    registry: &MapperRegistry,
    diagnostics: &mut Diagnostics,
) -> (Item, Vec<MappingError>) {
    let mut item = Item::new(document.identifier.clone());
    item.title = document.title.clone();
    let mut content = document.body_html.clone();
    let mut errors = Vec::new();

    for interaction in &document.interactions {
        let placeholder = interaction_placeholder(&interaction.response_identifier);
        let reference = format!("{}_{}", document.identifier, interaction.response_identifier);

        let outcome = match registry.tag_for_interaction(interaction) {
            None => Err(MappingError::UnsupportedType(interaction.element.clone())),
            Some(tag) => match registry.resolve(tag) {
                Some(entry) => (entry.import)(interaction, document, diagnostics),
                None => Err(MappingError::UnsupportedType(tag.to_string())),
            },
        };

        match outcome {
            Ok(data) => {
                content = content.replace(&placeholder, &question_span(&reference));
                item.questions.push(Question::new(reference, data));
            }
            Err(err) => {
                diagnostics.log(format!(
                    "Interaction `{}` was not mapped: {err}",
                    interaction.response_identifier
                ));
                content = content.replace(&placeholder, "");
                errors.push(err);
            }
        }
    }

    item.content = content;
    (item, errors)
}
