//! QTI marshaller
//!
//! `quick-xml` writer producing assessment-item XML from the typed object
//! model: response declarations, response-processing rule trees and the
//! interaction fragments the per-type question writers assemble.
//!
//! Pre-rendered inner markup (stimulus HTML, choice content) is injected
//! as already-escaped text; everything structural goes through the writer.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};

use crate::qti::rules::{
    ConditionBranch, Guard, OutcomeExpression, ResponseCondition, ResponseProcessing,
    ResponseRule, SetOutcomeValue,
};
use crate::qti::state::{QtiValue, ResponseDeclaration};

/// Error during marshalling.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    #[error("XML writing error: {0}")]
    Xml(String),
}

const QTI_NAMESPACE: &str = "http://www.imsglobal.org/xsd/imsqti_v2p1";

/// The `<responseProcessing>` content of an exported item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemProcessing {
    /// Named standard template, emitted as a `template` attribute.
    Template(String),
    /// Explicit rule tree.
    Rules(ResponseProcessing),
}

type XmlWriter = Writer<Vec<u8>>;

fn finish(writer: XmlWriter) -> Result<String, MarshalError> {
    String::from_utf8(writer.into_inner()).map_err(|e| MarshalError::Xml(e.to_string()))
}

fn write_err(e: impl std::fmt::Display) -> MarshalError {
    MarshalError::Xml(e.to_string())
}

/// Marshal a complete `<assessmentItem>` document.
///
/// `body_inner_xml` is the item body markup with interaction fragments
/// already spliced in; it is written through verbatim.
pub fn assessment_item_xml(
    identifier: &str,
    title: &str,
    response_declarations: &[ResponseDeclaration],
    body_inner_xml: &str,
    processing: Option<&ItemProcessing>,
) -> Result<String, MarshalError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_err)?;

    let mut root = BytesStart::new("assessmentItem");
    root.push_attribute(("xmlns", QTI_NAMESPACE));
    root.push_attribute(("identifier", identifier));
    root.push_attribute(("title", title));
    root.push_attribute(("adaptive", "false"));
    root.push_attribute(("timeDependent", "false"));
    writer.write_event(Event::Start(root)).map_err(write_err)?;

    for declaration in response_declarations {
        write_response_declaration(&mut writer, declaration)?;
    }

    // Standard scored-outcome declaration.
    let mut outcome = BytesStart::new("outcomeDeclaration");
    outcome.push_attribute(("identifier", "SCORE"));
    outcome.push_attribute(("cardinality", "single"));
    outcome.push_attribute(("baseType", "float"));
    writer.write_event(Event::Empty(outcome)).map_err(write_err)?;

    writer
        .write_event(Event::Start(BytesStart::new("itemBody")))
        .map_err(write_err)?;
    writer
        .write_event(Event::Text(BytesText::from_escaped(body_inner_xml)))
        .map_err(write_err)?;
    writer
        .write_event(Event::End(BytesStart::new("itemBody").to_end()))
        .map_err(write_err)?;

    if let Some(processing) = processing {
        write_item_processing(&mut writer, processing)?;
    }

    writer
        .write_event(Event::End(BytesStart::new("assessmentItem").to_end()))
        .map_err(write_err)?;
    finish(writer)
}

fn write_item_processing(
    writer: &mut XmlWriter,
    processing: &ItemProcessing,
) -> Result<(), MarshalError> {
    match processing {
        ItemProcessing::Template(uri) => {
            let mut e = BytesStart::new("responseProcessing");
            e.push_attribute(("template", uri.as_str()));
            writer.write_event(Event::Empty(e)).map_err(write_err)
        }
        ItemProcessing::Rules(rules) => {
            writer
                .write_event(Event::Start(BytesStart::new("responseProcessing")))
                .map_err(write_err)?;
            for rule in &rules.rules {
                write_response_rule(writer, rule)?;
            }
            writer
                .write_event(Event::End(BytesStart::new("responseProcessing").to_end()))
                .map_err(write_err)
        }
    }
}

/// Marshal a standalone `<responseDeclaration>` fragment.
pub fn response_declaration_xml(declaration: &ResponseDeclaration) -> Result<String, MarshalError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_response_declaration(&mut writer, declaration)?;
    finish(writer)
}

fn write_response_declaration(
    writer: &mut XmlWriter,
    declaration: &ResponseDeclaration,
) -> Result<(), MarshalError> {
    let mut e = BytesStart::new("responseDeclaration");
    e.push_attribute(("identifier", declaration.identifier.as_str()));
    e.push_attribute(("cardinality", declaration.cardinality.as_str()));
    e.push_attribute(("baseType", declaration.base_type.as_str()));

    let is_empty = declaration.correct_response.is_empty() && declaration.mapping.is_none();
    if is_empty {
        return writer.write_event(Event::Empty(e)).map_err(write_err);
    }
    writer.write_event(Event::Start(e)).map_err(write_err)?;

    if !declaration.correct_response.is_empty() {
        writer
            .write_event(Event::Start(BytesStart::new("correctResponse")))
            .map_err(write_err)?;
        for value in &declaration.correct_response {
            write_value(writer, value)?;
        }
        writer
            .write_event(Event::End(BytesStart::new("correctResponse").to_end()))
            .map_err(write_err)?;
    }

    if let Some(mapping) = &declaration.mapping {
        let mut m = BytesStart::new("mapping");
        m.push_attribute(("defaultValue", QtiValue::Float(mapping.default_value).lexical().as_str()));
        writer.write_event(Event::Start(m)).map_err(write_err)?;
        for entry in &mapping.entries {
            let mut me = BytesStart::new("mapEntry");
            me.push_attribute(("mapKey", entry.map_key.lexical().as_str()));
            me.push_attribute((
                "mappedValue",
                QtiValue::Float(entry.mapped_value).lexical().as_str(),
            ));
            me.push_attribute((
                "caseSensitive",
                if entry.case_sensitive { "true" } else { "false" },
            ));
            writer.write_event(Event::Empty(me)).map_err(write_err)?;
        }
        writer
            .write_event(Event::End(BytesStart::new("mapping").to_end()))
            .map_err(write_err)?;
    }

    writer
        .write_event(Event::End(BytesStart::new("responseDeclaration").to_end()))
        .map_err(write_err)
}

fn write_value(writer: &mut XmlWriter, value: &QtiValue) -> Result<(), MarshalError> {
    writer
        .write_event(Event::Start(BytesStart::new("value")))
        .map_err(write_err)?;
    writer
        .write_event(Event::Text(BytesText::new(&value.lexical())))
        .map_err(write_err)?;
    writer
        .write_event(Event::End(BytesStart::new("value").to_end()))
        .map_err(write_err)
}

fn write_response_rule(writer: &mut XmlWriter, rule: &ResponseRule) -> Result<(), MarshalError> {
    match rule {
        ResponseRule::Condition(condition) => write_response_condition(writer, condition),
        ResponseRule::SetOutcomeValue(assignment) => write_set_outcome_value(writer, assignment),
        // Unsupported rules never originate from the export builders.
        ResponseRule::Unsupported(name) => Err(MarshalError::Xml(format!(
            "cannot marshal unsupported response rule `{}`",
            name
        ))),
    }
}

fn write_response_condition(
    writer: &mut XmlWriter,
    condition: &ResponseCondition,
) -> Result<(), MarshalError> {
    writer
        .write_event(Event::Start(BytesStart::new("responseCondition")))
        .map_err(write_err)?;
    write_condition_branch(writer, "responseIf", &condition.response_if)?;
    for branch in &condition.else_ifs {
        write_condition_branch(writer, "responseElseIf", branch)?;
    }
    if let Some(branch) = &condition.response_else {
        write_condition_branch(writer, "responseElse", branch)?;
    }
    writer
        .write_event(Event::End(BytesStart::new("responseCondition").to_end()))
        .map_err(write_err)
}

fn write_condition_branch(
    writer: &mut XmlWriter,
    element: &str,
    branch: &ConditionBranch,
) -> Result<(), MarshalError> {
    writer
        .write_event(Event::Start(BytesStart::new(element)))
        .map_err(write_err)?;
    write_guard(writer, &branch.guard)?;
    for rule in &branch.rules {
        write_response_rule(writer, rule)?;
    }
    writer
        .write_event(Event::End(BytesStart::new(element).to_end()))
        .map_err(write_err)
}

fn write_guard(writer: &mut XmlWriter, guard: &Guard) -> Result<(), MarshalError> {
    match guard {
        Guard::IsNull { variable } => {
            writer
                .write_event(Event::Start(BytesStart::new("isNull")))
                .map_err(write_err)?;
            write_variable_ref(writer, "variable", variable)?;
            writer
                .write_event(Event::End(BytesStart::new("isNull").to_end()))
                .map_err(write_err)
        }
        Guard::Match { response, correct } => {
            writer
                .write_event(Event::Start(BytesStart::new("match")))
                .map_err(write_err)?;
            write_variable_ref(writer, "variable", response)?;
            write_variable_ref(writer, "correct", correct)?;
            writer
                .write_event(Event::End(BytesStart::new("match").to_end()))
                .map_err(write_err)
        }
        Guard::Equal { response, value } => {
            let mut e = BytesStart::new("equal");
            e.push_attribute(("toleranceMode", "exact"));
            writer.write_event(Event::Start(e)).map_err(write_err)?;
            write_variable_ref(writer, "variable", response)?;
            write_base_value(writer, value)?;
            writer
                .write_event(Event::End(BytesStart::new("equal").to_end()))
                .map_err(write_err)
        }
        Guard::None => Ok(()),
        Guard::Unsupported(name) => Err(MarshalError::Xml(format!(
            "cannot marshal unsupported guard expression `{}`",
            name
        ))),
    }
}

fn write_variable_ref(
    writer: &mut XmlWriter,
    element: &str,
    identifier: &str,
) -> Result<(), MarshalError> {
    let mut e = BytesStart::new(element);
    e.push_attribute(("identifier", identifier));
    writer.write_event(Event::Empty(e)).map_err(write_err)
}

fn write_base_value(writer: &mut XmlWriter, value: &QtiValue) -> Result<(), MarshalError> {
    let base_type = match value {
        QtiValue::Identifier(_) => "identifier",
        QtiValue::String(_) => "string",
        QtiValue::Integer(_) => "integer",
        QtiValue::Float(_) => "float",
        QtiValue::Boolean(_) => "boolean",
        QtiValue::DirectedPair(_, _) => "directedPair",
        QtiValue::Pair(_, _) => "pair",
    };
    let mut e = BytesStart::new("baseValue");
    e.push_attribute(("baseType", base_type));
    writer.write_event(Event::Start(e)).map_err(write_err)?;
    writer
        .write_event(Event::Text(BytesText::new(&value.lexical())))
        .map_err(write_err)?;
    writer
        .write_event(Event::End(BytesStart::new("baseValue").to_end()))
        .map_err(write_err)
}

fn write_set_outcome_value(
    writer: &mut XmlWriter,
    assignment: &SetOutcomeValue,
) -> Result<(), MarshalError> {
    let mut e = BytesStart::new("setOutcomeValue");
    e.push_attribute(("identifier", assignment.identifier.as_str()));
    writer.write_event(Event::Start(e)).map_err(write_err)?;
    match &assignment.expression {
        OutcomeExpression::BaseValue(value) => write_base_value(writer, value)?,
        OutcomeExpression::Variable(identifier) => {
            write_variable_ref(writer, "variable", identifier)?;
        }
        OutcomeExpression::MapResponse(identifier) => {
            let mut m = BytesStart::new("mapResponse");
            if let Some(identifier) = identifier {
                m.push_attribute(("identifier", identifier.as_str()));
            }
            writer.write_event(Event::Empty(m)).map_err(write_err)?;
        }
        OutcomeExpression::Unsupported(name) => {
            return Err(MarshalError::Xml(format!(
                "cannot marshal unsupported outcome expression `{}`",
                name
            )));
        }
    }
    writer
        .write_event(Event::End(BytesStart::new("setOutcomeValue").to_end()))
        .map_err(write_err)
}

// ---------------------------------------------------------------------------
// Interaction fragments
// ---------------------------------------------------------------------------

/// Marshal a `<choiceInteraction>` (or `<orderInteraction>`) fragment.
pub fn choice_interaction_xml(
    element: &str,
    response_identifier: &str,
    shuffle: bool,
    max_choices: Option<u32>,
    prompt: Option<&str>,
    choices: &[(String, String)],
) -> Result<String, MarshalError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut e = BytesStart::new(element);
    e.push_attribute(("responseIdentifier", response_identifier));
    e.push_attribute(("shuffle", if shuffle { "true" } else { "false" }));
    if let Some(max_choices) = max_choices {
        e.push_attribute(("maxChoices", max_choices.to_string().as_str()));
    }
    writer.write_event(Event::Start(e)).map_err(write_err)?;

    if let Some(prompt) = prompt {
        writer
            .write_event(Event::Start(BytesStart::new("prompt")))
            .map_err(write_err)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped(prompt)))
            .map_err(write_err)?;
        writer
            .write_event(Event::End(BytesStart::new("prompt").to_end()))
            .map_err(write_err)?;
    }

    for (identifier, content) in choices {
        let mut c = BytesStart::new("simpleChoice");
        c.push_attribute(("identifier", identifier.as_str()));
        writer.write_event(Event::Start(c)).map_err(write_err)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped(content.as_str())))
            .map_err(write_err)?;
        writer
            .write_event(Event::End(BytesStart::new("simpleChoice").to_end()))
            .map_err(write_err)?;
    }

    writer
        .write_event(Event::End(BytesStart::new(element).to_end()))
        .map_err(write_err)?;
    finish(writer)
}

/// Marshal a `<textEntryInteraction>` fragment.
pub fn text_entry_interaction_xml(
    response_identifier: &str,
    expected_length: Option<u32>,
) -> Result<String, MarshalError> {
    let mut writer = Writer::new(Vec::new());
    let mut e = BytesStart::new("textEntryInteraction");
    e.push_attribute(("responseIdentifier", response_identifier));
    if let Some(expected_length) = expected_length {
        e.push_attribute(("expectedLength", expected_length.to_string().as_str()));
    }
    writer.write_event(Event::Empty(e)).map_err(write_err)?;
    finish(writer)
}

/// Marshal an `<extendedTextInteraction>` fragment.
pub fn extended_text_interaction_xml(response_identifier: &str) -> Result<String, MarshalError> {
    let mut writer = Writer::new(Vec::new());
    let mut e = BytesStart::new("extendedTextInteraction");
    e.push_attribute(("responseIdentifier", response_identifier));
    writer.write_event(Event::Empty(e)).map_err(write_err)?;
    finish(writer)
}

/// Marshal a `<matchInteraction>` fragment from two associable choice sets.
pub fn match_interaction_xml(
    response_identifier: &str,
    shuffle: bool,
    max_associations: u32,
    sets: &[Vec<(String, String)>],
) -> Result<String, MarshalError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut e = BytesStart::new("matchInteraction");
    e.push_attribute(("responseIdentifier", response_identifier));
    e.push_attribute(("shuffle", if shuffle { "true" } else { "false" }));
    e.push_attribute(("maxAssociations", max_associations.to_string().as_str()));
    writer.write_event(Event::Start(e)).map_err(write_err)?;

    for set in sets {
        writer
            .write_event(Event::Start(BytesStart::new("simpleMatchSet")))
            .map_err(write_err)?;
        for (identifier, content) in set {
            let mut c = BytesStart::new("simpleAssociableChoice");
            c.push_attribute(("identifier", identifier.as_str()));
            c.push_attribute(("matchMax", "1"));
            writer.write_event(Event::Start(c)).map_err(write_err)?;
            writer
                .write_event(Event::Text(BytesText::from_escaped(content.as_str())))
                .map_err(write_err)?;
            writer
                .write_event(Event::End(BytesStart::new("simpleAssociableChoice").to_end()))
                .map_err(write_err)?;
        }
        writer
            .write_event(Event::End(BytesStart::new("simpleMatchSet").to_end()))
            .map_err(write_err)?;
    }

    writer
        .write_event(Event::End(BytesStart::new("matchInteraction").to_end()))
        .map_err(write_err)?;
    finish(writer)
}

/// Marshal a `<mediaInteraction>` fragment wrapping a media object.
pub fn media_interaction_xml(
    response_identifier: &str,
    src: &str,
    media_type: &str,
) -> Result<String, MarshalError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut e = BytesStart::new("mediaInteraction");
    e.push_attribute(("responseIdentifier", response_identifier));
    e.push_attribute(("autostart", "true"));
    e.push_attribute(("minPlays", "1"));
    e.push_attribute(("maxPlays", "1"));
    e.push_attribute(("loop", "true"));
    writer.write_event(Event::Start(e)).map_err(write_err)?;

    let mut object = BytesStart::new("object");
    object.push_attribute(("data", src));
    object.push_attribute(("type", media_type));
    writer.write_event(Event::Empty(object)).map_err(write_err)?;

    writer
        .write_event(Event::End(BytesStart::new("mediaInteraction").to_end()))
        .map_err(write_err)?;
    finish(writer)
}
