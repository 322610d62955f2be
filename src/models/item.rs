//! Learnosity item entity
//!
//! An item is the ordered collection of question/feature entities produced
//! from one assessment document, plus its content template and metadata.
//! The item owns its entities exclusively.

use serde::{Deserialize, Serialize};

use crate::models::question::Question;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Item {
    pub reference: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Item content markup; question positions are marked with
    /// `learnosity-response` spans referencing the question.
    #[serde(default)]
    pub content: String,
    /// Questions and features in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Question>,
}

impl Item {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Default::default()
        }
    }

    /// References of the owned questions, in order.
    pub fn question_references(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.reference.clone()).collect()
    }

    /// The item JSON shape: item metadata plus question references, without
    /// the question bodies (those are emitted separately).
    pub fn to_item_json(&self) -> serde_json::Value {
        serde_json::json!({
            "reference": self.reference,
            "title": self.title,
            "content": self.content,
            "questionReferences": self.question_references(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{AudioPlayerFeature, QuestionData};

    #[test]
    fn test_item_json_lists_question_references() {
        let mut item = Item::new("item-1");
        item.questions.push(Question::new(
            "item-1_R1",
            QuestionData::AudioPlayer(AudioPlayerFeature {
                src: "a.mp3".to_string(),
            }),
        ));

        let json = item.to_item_json();
        assert_eq!(json["reference"], "item-1");
        assert_eq!(json["questionReferences"][0], "item-1_R1");
        assert!(json.get("questions").is_none());
    }
}
