//! Question-type mapper registry
//!
//! Maps Learnosity question-type tags to their import/export mapper pair.
//! Both orchestrators resolve through the registry, so an unregistered
//! type degrades in one place: the unit is skipped with a recorded error
//! and its siblings are unaffected.

use std::collections::HashMap;

use crate::convert::MappingError;
use crate::diagnostics::Diagnostics;
use crate::export::ExportedInteraction;
use crate::models::{Question, QuestionData};
use crate::qti::{AssessmentItem, Interaction};
use crate::{export, import};

/// Imports one interaction into a question payload.
pub type ImportMapperFn =
    fn(&Interaction, &AssessmentItem, &mut Diagnostics) -> Result<QuestionData, MappingError>;

/// Exports one question as an interaction fragment. The second argument is
/// the response identifier the fragment must use.
pub type ExportMapperFn =
    fn(&Question, &str, &mut Diagnostics) -> Result<ExportedInteraction, MappingError>;

/// Import/export mapper pair for one question type.
#[derive(Clone, Copy)]
pub struct MapperEntry {
    pub import: ImportMapperFn,
    pub export: ExportMapperFn,
}

/// Registry of question-type mappers, keyed by type tag.
#[derive(Default)]
pub struct MapperRegistry {
    entries: HashMap<String, MapperEntry>,
}

impl MapperRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in question type.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            "mcq",
            MapperEntry {
                import: import::interactions::import_mcq,
                export: export::questions::export_mcq,
            },
        );
        registry.register(
            "shorttext",
            MapperEntry {
                import: import::interactions::import_short_text,
                export: export::questions::export_short_text,
            },
        );
        registry.register(
            "longtextV2",
            MapperEntry {
                import: import::interactions::import_long_text,
                export: export::questions::export_long_text,
            },
        );
        registry.register(
            "orderlist",
            MapperEntry {
                import: import::interactions::import_order_list,
                export: export::questions::export_order_list,
            },
        );
        registry.register(
            "association",
            MapperEntry {
                import: import::interactions::import_association,
                export: export::questions::export_association,
            },
        );
        registry.register(
            "audioplayer",
            MapperEntry {
                import: import::interactions::import_audio_player,
                export: export::questions::export_audio_player,
            },
        );
        registry.register(
            "sharedpassage",
            MapperEntry {
                import: import::interactions::import_shared_passage,
                export: export::questions::export_shared_passage,
            },
        );
        registry
    }

    /// Register (or replace) the mapper pair for a type tag.
    pub fn register(&mut self, tag: impl Into<String>, entry: MapperEntry) {
        self.entries.insert(tag.into(), entry);
    }

    pub fn resolve(&self, tag: &str) -> Option<&MapperEntry> {
        self.entries.get(tag)
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// The type tag governing an interaction. A `class` attribute token
    /// naming a registered tag overrides the element-name guess.
    pub fn tag_for_interaction(&self, interaction: &Interaction) -> Option<&str> {
        if let Some(hint) = &interaction.class_hint {
            for token in hint.split_whitespace() {
                if let Some((tag, _)) = self.entries.get_key_value(token) {
                    return Some(tag.as_str());
                }
            }
        }
        let guess = element_tag(&interaction.element)?;
        self.entries
            .get_key_value(guess)
            .map(|(tag, _)| tag.as_str())
    }
}

/// Default tag for a QTI interaction element name.
fn element_tag(element: &str) -> Option<&'static str> {
    match element {
        "choiceInteraction" => Some("mcq"),
        "textEntryInteraction" => Some("shorttext"),
        "extendedTextInteraction" => Some("longtextV2"),
        "orderInteraction" => Some("orderlist"),
        "matchInteraction" => Some("association"),
        "mediaInteraction" => Some("audioplayer"),
        _ => None,
    }
}
