//! Learnosity question entities
//!
//! A `Question` is a tagged variant over the closed set of question types
//! this SDK converts. Each variant carries its type-specific fields plus at
//! most one validation object.

use serde::{Deserialize, Serialize};

use crate::models::validation::Validation;

/// One question or feature widget, as referenced from an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub reference: String,
    pub data: QuestionData,
}

impl Question {
    pub fn new(reference: impl Into<String>, data: QuestionData) -> Self {
        Self {
            reference: reference.into(),
            data,
        }
    }

    /// The question's type tag, e.g. `mcq`.
    pub fn type_tag(&self) -> &'static str {
        self.data.type_tag()
    }

    pub fn validation(&self) -> Option<&Validation> {
        self.data.validation()
    }
}

/// Type-tagged question payload (the `data` object of the Learnosity JSON
/// question shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuestionData {
    #[serde(rename = "mcq")]
    Mcq(McqQuestion),
    #[serde(rename = "shorttext")]
    ShortText(ShortTextQuestion),
    #[serde(rename = "longtextV2")]
    LongText(LongTextQuestion),
    #[serde(rename = "orderlist")]
    OrderList(OrderListQuestion),
    #[serde(rename = "association")]
    Association(AssociationQuestion),
    #[serde(rename = "audioplayer")]
    AudioPlayer(AudioPlayerFeature),
    #[serde(rename = "sharedpassage")]
    SharedPassage(SharedPassageFeature),
}

impl QuestionData {
    pub fn type_tag(&self) -> &'static str {
        match self {
            QuestionData::Mcq(_) => "mcq",
            QuestionData::ShortText(_) => "shorttext",
            QuestionData::LongText(_) => "longtextV2",
            QuestionData::OrderList(_) => "orderlist",
            QuestionData::Association(_) => "association",
            QuestionData::AudioPlayer(_) => "audioplayer",
            QuestionData::SharedPassage(_) => "sharedpassage",
        }
    }

    /// The validation object, for types that score.
    pub fn validation(&self) -> Option<&Validation> {
        match self {
            QuestionData::Mcq(q) => q.validation.as_ref(),
            QuestionData::ShortText(q) => q.validation.as_ref(),
            QuestionData::OrderList(q) => q.validation.as_ref(),
            QuestionData::Association(q) => q.validation.as_ref(),
            // Long-form text and feature widgets are not auto-scored.
            QuestionData::LongText(_)
            | QuestionData::AudioPlayer(_)
            | QuestionData::SharedPassage(_) => None,
        }
    }
}

/// A labelled option: `label` is display content, `value` the stable
/// identifier used in validation values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

/// Multiple-choice question.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct McqQuestion {
    #[serde(default)]
    pub stimulus: String,
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub multiple_responses: bool,
    #[serde(default)]
    pub shuffle_options: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

/// Single-line text entry question.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShortTextQuestion {
    #[serde(default)]
    pub stimulus: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

/// Extended free-text question; scored by hand, carries no validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LongTextQuestion {
    #[serde(default)]
    pub stimulus: String,
}

/// Ordering question.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderListQuestion {
    #[serde(default)]
    pub stimulus: String,
    pub list: Vec<ChoiceOption>,
    #[serde(default)]
    pub shuffle_options: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

/// Association (matching) question: each stimulus entry is matched against
/// a possible response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssociationQuestion {
    #[serde(default)]
    pub stimulus: String,
    pub stimulus_list: Vec<ChoiceOption>,
    pub possible_responses: Vec<ChoiceOption>,
    #[serde(default)]
    pub duplicate_responses: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

/// Audio playback feature; presentational, never scored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioPlayerFeature {
    pub src: String,
}

/// Shared reading passage feature. On export the passage HTML is emitted
/// as a side file referenced from the item body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SharedPassageFeature {
    pub content: String,
}
