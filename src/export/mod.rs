//! Export functionality
//!
//! Builds QTI v2.1 assessment items from Learnosity items and questions.
//! Each registered question type contributes an interaction fragment, its
//! response declaration and its response-processing rules; the item writer
//! assembles them into one document.

pub mod item;
pub mod questions;
pub mod validation;

use crate::qti::{ResponseDeclaration, ResponseRule};

pub use item::{ExportOutcome, write_item};

/// Everything one question contributes to the exported item.
#[derive(Debug, Clone)]
pub struct ExportedInteraction {
    /// The interaction (or feature) XML fragment placed in the item body.
    pub interaction_xml: String,
    pub response_declaration: Option<ResponseDeclaration>,
    pub processing: Option<InteractionProcessing>,
    /// Side file written next to the item, e.g. extracted passage HTML.
    pub artifact: Option<SideArtifact>,
}

impl ExportedInteraction {
    /// A presentational fragment with no scoring contribution.
    pub fn fragment(interaction_xml: impl Into<String>) -> Self {
        Self {
            interaction_xml: interaction_xml.into(),
            response_declaration: None,
            processing: None,
            artifact: None,
        }
    }
}

/// Response-processing contribution of one exported question.
///
/// `rules` always carries an explicit rule tree equivalent to the
/// question's validation. `template_uri` is set when that tree is exactly
/// a standard template's semantics, so single-question items can keep the
/// compact template form.
#[derive(Debug, Clone)]
pub struct InteractionProcessing {
    pub template_uri: Option<&'static str>,
    pub rules: Vec<ResponseRule>,
}

/// A side file produced during export.
#[derive(Debug, Clone, PartialEq)]
pub struct SideArtifact {
    pub name: String,
    pub content: String,
}
