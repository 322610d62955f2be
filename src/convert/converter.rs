//! Bidirectional QTI / Learnosity converter
//!
//! The stateful facade over the import and export orchestrators. Each
//! conversion call starts with a clean diagnostic channel; the messages
//! accumulated during the call stay readable until the next one.

use serde_json::Value;

use crate::convert::preprocess::preprocess_item_json;
use crate::convert::{ConvertError, MappingError};
use crate::diagnostics::Diagnostics;
use crate::export::{SideArtifact, write_item};
use crate::import::{map_assessment_item, question_span};
use crate::models::{Item, Question, QuestionData};
use crate::qti::parse_assessment_item;
use crate::registry::MapperRegistry;

/// Result of converting a QTI assessment item to Learnosity entities.
#[derive(Debug, Clone)]
pub struct QtiToLearnosityResult {
    /// The mapped item, partial when some interactions failed.
    pub item: Item,
    /// One message per interaction that could not be mapped.
    pub errors: Vec<MappingError>,
}

impl QtiToLearnosityResult {
    /// The item JSON shape, without question bodies.
    pub fn item_json(&self) -> Value {
        self.item.to_item_json()
    }

    /// The question JSON shapes, in document order.
    pub fn questions_json(&self) -> Vec<Value> {
        self.item
            .questions
            .iter()
            .filter_map(|question| serde_json::to_value(question).ok())
            .collect()
    }
}

/// Result of converting Learnosity JSON to a QTI assessment item.
#[derive(Debug, Clone)]
pub struct LearnosityToQtiResult {
    pub xml: String,
    /// Per-question export failures.
    pub messages: Vec<String>,
    /// Side files referenced from the XML.
    pub artifacts: Vec<SideArtifact>,
}

/// The conversion facade.
pub struct Converter {
    registry: MapperRegistry,
    diagnostics: Diagnostics,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// A converter over the built-in question types.
    pub fn new() -> Self {
        Self::with_registry(MapperRegistry::builtin())
    }

    /// A converter over a caller-supplied registry.
    pub fn with_registry(registry: MapperRegistry) -> Self {
        Self {
            registry,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Diagnostics collected by the most recent conversion call.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn registry(&self) -> &MapperRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MapperRegistry {
        &mut self.registry
    }

    /// Convert a QTI v2.1 assessment-item document to a Learnosity item.
    ///
    /// A document that cannot be parsed as an assessment item fails
    /// wholesale; unconvertible interactions degrade to entries in the
    /// result's error list.
    pub fn convert_qti_item_to_learnosity(
        &mut self,
        xml: &str,
    ) -> Result<QtiToLearnosityResult, ConvertError> {
        self.diagnostics.clear();
        tracing::debug!("converting QTI assessment item to Learnosity");

        let document = parse_assessment_item(xml)?;
        let (item, errors) = map_assessment_item(&document, &self.registry, &mut self.diagnostics);
        Ok(QtiToLearnosityResult { item, errors })
    }

    /// Convert Learnosity JSON (an item, a question, or bare question
    /// data) to a QTI assessment item.
    pub fn convert_learnosity_to_qti_item(
        &mut self,
        json: &Value,
    ) -> Result<LearnosityToQtiResult, ConvertError> {
        self.diagnostics.clear();
        tracing::debug!("converting Learnosity JSON to QTI assessment item");

        let mut json = json.clone();
        preprocess_item_json(&mut json);
        let item = self.item_from_json(json)?;

        let outcome = write_item(&item, &self.registry, &mut self.diagnostics)
            .map_err(|err| ConvertError::Mapping(err.to_string()))?;

        // Produced XML is fed back through the parser as a sanity check;
        // a failure here is reported, not raised.
        if let Err(err) = parse_assessment_item(&outcome.xml) {
            self.diagnostics
                .log(format!("Produced XML does not parse back cleanly: {err}"));
        }

        Ok(LearnosityToQtiResult {
            xml: outcome.xml,
            messages: outcome.messages,
            artifacts: outcome.artifacts,
        })
    }

    /// Accept the three JSON shapes the Learnosity side produces, wrapping
    /// bare questions in a single-question item.
    fn item_from_json(&self, json: Value) -> Result<Item, ConvertError> {
        match guess_json_kind(&json)? {
            JsonKind::Item => serde_json::from_value(json)
                .map_err(|err| ConvertError::Mapping(format!("invalid item JSON: {err}"))),
            JsonKind::Question => {
                let question: Question = serde_json::from_value(json)
                    .map_err(|err| ConvertError::Mapping(format!("invalid question JSON: {err}")))?;
                Ok(single_question_item(question))
            }
            JsonKind::QuestionData => {
                let data: QuestionData = serde_json::from_value(json).map_err(|err| {
                    ConvertError::Mapping(format!("invalid question data JSON: {err}"))
                })?;
                Ok(single_question_item(Question::new("question", data)))
            }
        }
    }
}

fn single_question_item(question: Question) -> Item {
    let mut item = Item::new(question.reference.clone());
    item.content = question_span(&question.reference);
    item.questions.push(question);
    item
}

enum JsonKind {
    Item,
    Question,
    QuestionData,
}

fn guess_json_kind(value: &Value) -> Result<JsonKind, ConvertError> {
    let Some(object) = value.as_object() else {
        return Err(ConvertError::Mapping(
            "expected a JSON object".to_string(),
        ));
    };
    if object.contains_key("data") && object.contains_key("reference") {
        Ok(JsonKind::Question)
    } else if object.contains_key("type") {
        Ok(JsonKind::QuestionData)
    } else if object.contains_key("reference")
        || object.contains_key("content")
        || object.contains_key("questions")
    {
        Ok(JsonKind::Item)
    } else {
        Err(ConvertError::Mapping(
            "unrecognizable Learnosity JSON shape".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_kind_guessing() {
        assert!(matches!(
            guess_json_kind(&serde_json::json!({"reference": "q", "data": {"type": "mcq"}})),
            Ok(JsonKind::Question)
        ));
        assert!(matches!(
            guess_json_kind(&serde_json::json!({"type": "mcq", "options": []})),
            Ok(JsonKind::QuestionData)
        ));
        assert!(matches!(
            guess_json_kind(&serde_json::json!({"reference": "item-1", "content": ""})),
            Ok(JsonKind::Item)
        ));
        assert!(guess_json_kind(&serde_json::json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_diagnostics_reset_between_calls() {
        let mut converter = Converter::new();
        let json = serde_json::json!({
            "reference": "q-1",
            "data": {"type": "longtextV2", "stimulus": "Write &nbsp;an essay"},
        });

        converter.convert_learnosity_to_qti_item(&json).unwrap();
        let first_run = converter.diagnostics().len();

        converter.convert_learnosity_to_qti_item(&json).unwrap();
        assert_eq!(converter.diagnostics().len(), first_run);
    }
}
