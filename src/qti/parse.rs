//! QTI assessment item parser
//!
//! Event-based `quick-xml` reader producing the typed object model consumed
//! by the import side: declarations, interaction nodes, the item body (with
//! interaction placeholders) and the response-processing rule tree.
//!
//! Parsing is namespace-agnostic (local element names only) and
//! best-effort: content outside the supported subset is carried through as
//! `Unsupported` variants for the analyzer to log and skip. Only structural
//! failures (malformed XML, or a document that is not an assessment item)
//! reject the document wholesale.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::qti::rules::{
    ConditionBranch, Guard, OutcomeExpression, ResponseCondition, ResponseProcessing,
    ResponseProcessingTemplate, ResponseRule, SetOutcomeValue,
};
use crate::qti::state::{
    BaseType, Cardinality, MapEntry, Mapping, OutcomeDeclaration, OutcomeDeclarations, QtiValue,
    ResponseDeclaration,
};

/// Error during QTI parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("XML parsing error: {0}")]
    Xml(String),
    #[error("The document could not be validated against the QTI item schema: {0}")]
    Schema(String),
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        ParseError::Xml(err.to_string())
    }
}

/// A parsed `<assessmentItem>` document.
#[derive(Debug, Clone, Default)]
pub struct AssessmentItem {
    pub identifier: String,
    pub title: String,
    /// Item body markup with each interaction replaced by an
    /// `{{interaction:<responseIdentifier>}}` placeholder.
    pub body_html: String,
    /// Interaction nodes in document order.
    pub interactions: Vec<Interaction>,
    pub response_declarations: HashMap<String, ResponseDeclaration>,
    pub outcome_declarations: OutcomeDeclarations,
    pub response_processing: ResponseProcessingTemplate,
}

impl AssessmentItem {
    /// The response declaration governing an interaction, if declared.
    pub fn response_declaration(&self, identifier: &str) -> Option<&ResponseDeclaration> {
        self.response_declarations.get(identifier)
    }
}

/// One interaction node extracted from the item body.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    /// Local element name, e.g. `choiceInteraction`.
    pub element: String,
    pub response_identifier: String,
    /// The `class` attribute, used as an explicit type hint when it names a
    /// registered question type.
    pub class_hint: Option<String>,
    pub prompt: Option<String>,
    pub max_choices: Option<u32>,
    pub shuffle: bool,
    pub expected_length: Option<u32>,
    /// `simpleChoice` children (choice and order interactions).
    pub choices: Vec<InteractionChoice>,
    /// `simpleMatchSet` children (match interactions), in document order.
    pub match_sets: Vec<Vec<InteractionChoice>>,
    /// `<object>` child (media interactions).
    pub object: Option<MediaObject>,
}

/// One selectable choice inside an interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionChoice {
    pub identifier: String,
    pub content: String,
}

/// Media payload of a `mediaInteraction`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaObject {
    pub data: String,
    pub media_type: String,
}

/// The placeholder written into the item body where an interaction sat.
pub fn interaction_placeholder(response_identifier: &str) -> String {
    format!("{{{{interaction:{}}}}}", response_identifier)
}

/// Parse a QTI v2.1 `<assessmentItem>` document.
pub fn parse_assessment_item(xml: &str) -> Result<AssessmentItem, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Locate the root element.
    let root = loop {
        match reader.read_event()? {
            Event::Start(e) => break e.into_owned(),
            Event::Empty(e) => break e.into_owned(),
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            Event::Text(t) if t.as_ref().iter().all(|b| b.is_ascii_whitespace()) => continue,
            Event::Eof => {
                return Err(ParseError::Schema("no root element found".to_string()));
            }
            other => {
                return Err(ParseError::Schema(format!(
                    "unexpected content before root element: {:?}",
                    other
                )));
            }
        }
    };

    if root.local_name().as_ref() != b"assessmentItem" {
        return Err(ParseError::Schema(format!(
            "root element is `{}`, expected `assessmentItem`",
            String::from_utf8_lossy(root.name().as_ref())
        )));
    }

    let mut item = AssessmentItem {
        identifier: attr(&root, "identifier").ok_or_else(|| {
            ParseError::Schema("assessmentItem is missing its `identifier` attribute".to_string())
        })?,
        title: attr(&root, "title").unwrap_or_default(),
        ..Default::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"responseDeclaration" => {
                    let declaration = parse_response_declaration(&mut reader, &e, false)?;
                    item.response_declarations
                        .insert(declaration.identifier.clone(), declaration);
                }
                b"outcomeDeclaration" => {
                    let declaration = parse_outcome_declaration(&mut reader, &e, false)?;
                    item.outcome_declarations
                        .insert(declaration.identifier.clone(), declaration);
                }
                b"itemBody" => {
                    let (body_html, interactions) = parse_item_body(&mut reader)?;
                    item.body_html = body_html;
                    item.interactions = interactions;
                }
                b"responseProcessing" => {
                    item.response_processing = parse_response_processing(&mut reader, &e, false)?;
                }
                _ => skip_subtree(&mut reader, &e)?,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"responseDeclaration" => {
                    let declaration = parse_response_declaration(&mut reader, &e, true)?;
                    item.response_declarations
                        .insert(declaration.identifier.clone(), declaration);
                }
                b"outcomeDeclaration" => {
                    let declaration = parse_outcome_declaration(&mut reader, &e, true)?;
                    item.outcome_declarations
                        .insert(declaration.identifier.clone(), declaration);
                }
                b"responseProcessing" => {
                    item.response_processing = parse_response_processing(&mut reader, &e, true)?;
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"assessmentItem" => break,
            Event::Eof => {
                return Err(ParseError::Xml(
                    "unexpected end of document inside assessmentItem".to_string(),
                ));
            }
            _ => continue,
        }
    }

    Ok(item)
}

/// Read an attribute as an owned string.
fn attr(e: &BytesStart, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Skip the subtree of an already-consumed start element.
fn skip_subtree(reader: &mut Reader<&[u8]>, e: &BytesStart) -> Result<(), ParseError> {
    reader.read_to_end(e.name())?;
    Ok(())
}

fn parse_response_declaration(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart,
    is_empty: bool,
) -> Result<ResponseDeclaration, ParseError> {
    let identifier = attr(e, "identifier").ok_or_else(|| {
        ParseError::Schema("responseDeclaration is missing its `identifier` attribute".to_string())
    })?;
    let cardinality = attr(e, "cardinality")
        .as_deref()
        .and_then(Cardinality::from_attr)
        .unwrap_or(Cardinality::Single);
    let base_type = attr(e, "baseType")
        .as_deref()
        .and_then(BaseType::from_attr)
        .unwrap_or(BaseType::Identifier);

    let mut declaration = ResponseDeclaration::new(identifier, cardinality, base_type);
    if is_empty {
        return Ok(declaration);
    }

    loop {
        match reader.read_event()? {
            Event::Start(child) => match child.local_name().as_ref() {
                b"correctResponse" => {
                    declaration.correct_response = parse_values(reader, b"correctResponse", base_type)?;
                }
                b"mapping" => {
                    declaration.mapping = Some(parse_mapping(reader, &child, base_type)?);
                }
                _ => skip_subtree(reader, &child)?,
            },
            Event::Empty(child) => {
                if child.local_name().as_ref() == b"mapping" {
                    declaration.mapping = Some(Mapping {
                        default_value: attr(&child, "defaultValue")
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0.0),
                        entries: Vec::new(),
                    });
                }
            }
            Event::End(end) if end.local_name().as_ref() == b"responseDeclaration" => break,
            Event::Eof => {
                return Err(ParseError::Xml(
                    "unexpected end of document inside responseDeclaration".to_string(),
                ));
            }
            _ => continue,
        }
    }

    Ok(declaration)
}

/// Parse the `<value>` children of an already-entered container element.
fn parse_values(
    reader: &mut Reader<&[u8]>,
    container: &[u8],
    base_type: BaseType,
) -> Result<Vec<QtiValue>, ParseError> {
    let mut values = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(child) if child.local_name().as_ref() == b"value" => {
                let text = reader.read_text(child.name())?;
                values.push(QtiValue::from_typed(base_type, &text));
            }
            Event::Start(child) => skip_subtree(reader, &child)?,
            Event::End(end) if end.local_name().as_ref() == container => break,
            Event::Eof => {
                return Err(ParseError::Xml(format!(
                    "unexpected end of document inside {}",
                    String::from_utf8_lossy(container)
                )));
            }
            _ => continue,
        }
    }
    Ok(values)
}

fn parse_mapping(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart,
    base_type: BaseType,
) -> Result<Mapping, ParseError> {
    let mut mapping = Mapping {
        default_value: attr(e, "defaultValue")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0),
        entries: Vec::new(),
    };

    loop {
        match reader.read_event()? {
            Event::Start(child) | Event::Empty(child)
                if child.local_name().as_ref() == b"mapEntry" =>
            {
                let map_key = attr(&child, "mapKey")
                    .map(|k| QtiValue::from_typed(base_type, &k))
                    .unwrap_or(QtiValue::String(String::new()));
                let mapped_value = attr(&child, "mappedValue")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.0);
                let case_sensitive = attr(&child, "caseSensitive")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false);
                mapping.entries.push(MapEntry {
                    map_key,
                    mapped_value,
                    case_sensitive,
                });
            }
            Event::Start(child) => skip_subtree(reader, &child)?,
            Event::End(end) if end.local_name().as_ref() == b"mapping" => break,
            Event::Eof => {
                return Err(ParseError::Xml(
                    "unexpected end of document inside mapping".to_string(),
                ));
            }
            _ => continue,
        }
    }

    Ok(mapping)
}

fn parse_outcome_declaration(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart,
    is_empty: bool,
) -> Result<OutcomeDeclaration, ParseError> {
    let identifier = attr(e, "identifier").ok_or_else(|| {
        ParseError::Schema("outcomeDeclaration is missing its `identifier` attribute".to_string())
    })?;
    let base_type = attr(e, "baseType")
        .as_deref()
        .and_then(BaseType::from_attr)
        .unwrap_or(BaseType::Float);

    let mut declaration = OutcomeDeclaration {
        identifier,
        default_values: Vec::new(),
    };
    if is_empty {
        return Ok(declaration);
    }

    loop {
        match reader.read_event()? {
            Event::Start(child) => match child.local_name().as_ref() {
                b"defaultValue" => {
                    declaration.default_values = parse_values(reader, b"defaultValue", base_type)?;
                }
                _ => skip_subtree(reader, &child)?,
            },
            Event::End(end) if end.local_name().as_ref() == b"outcomeDeclaration" => break,
            Event::Eof => {
                return Err(ParseError::Xml(
                    "unexpected end of document inside outcomeDeclaration".to_string(),
                ));
            }
            _ => continue,
        }
    }

    Ok(declaration)
}

/// Walk the item body, collecting interaction nodes and reconstructing the
/// surrounding markup with placeholders where interactions sat.
fn parse_item_body(
    reader: &mut Reader<&[u8]>,
) -> Result<(String, Vec<Interaction>), ParseError> {
    let mut body = String::new();
    let mut interactions = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if is_interaction_element(e.local_name().as_ref()) {
                    let interaction = parse_interaction(reader, &e, false)?;
                    body.push_str(&interaction_placeholder(&interaction.response_identifier));
                    interactions.push(interaction);
                } else {
                    body.push_str(&start_tag_markup(&e, false));
                }
            }
            Event::Empty(e) => {
                if is_interaction_element(e.local_name().as_ref()) {
                    let interaction = parse_interaction(reader, &e, true)?;
                    body.push_str(&interaction_placeholder(&interaction.response_identifier));
                    interactions.push(interaction);
                } else {
                    body.push_str(&start_tag_markup(&e, true));
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"itemBody" {
                    break;
                }
                body.push_str(&format!(
                    "</{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                ));
            }
            // Keep text in its escaped form so it can be re-embedded as-is.
            Event::Text(t) => body.push_str(&String::from_utf8_lossy(t.as_ref())),
            Event::CData(t) => body.push_str(&String::from_utf8_lossy(t.as_ref())),
            Event::Eof => {
                return Err(ParseError::Xml(
                    "unexpected end of document inside itemBody".to_string(),
                ));
            }
            _ => continue,
        }
    }

    Ok((body, interactions))
}

fn is_interaction_element(local_name: &[u8]) -> bool {
    local_name.ends_with(b"Interaction")
}

/// Serialize a start tag back to markup, attributes included.
fn start_tag_markup(e: &BytesStart, self_closing: bool) -> String {
    let mut out = format!("<{}", String::from_utf8_lossy(e.name().as_ref()));
    for a in e.attributes().flatten() {
        out.push_str(&format!(
            " {}=\"{}\"",
            String::from_utf8_lossy(a.key.as_ref()),
            String::from_utf8_lossy(&a.value)
        ));
    }
    out.push_str(if self_closing { "/>" } else { ">" });
    out
}

fn parse_interaction(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart,
    is_empty: bool,
) -> Result<Interaction, ParseError> {
    let mut interaction = Interaction {
        element: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
        response_identifier: attr(e, "responseIdentifier").unwrap_or_default(),
        class_hint: attr(e, "class"),
        max_choices: attr(e, "maxChoices").and_then(|v| v.parse().ok()),
        shuffle: attr(e, "shuffle").map(|v| v == "true").unwrap_or(false),
        expected_length: attr(e, "expectedLength").and_then(|v| v.parse().ok()),
        ..Default::default()
    };
    if is_empty {
        return Ok(interaction);
    }

    let end_name = interaction.element.clone();
    loop {
        match reader.read_event()? {
            Event::Start(child) => match child.local_name().as_ref() {
                b"prompt" => {
                    interaction.prompt = Some(reader.read_text(child.name())?.into_owned());
                }
                b"simpleChoice" => {
                    interaction.choices.push(InteractionChoice {
                        identifier: attr(&child, "identifier").unwrap_or_default(),
                        content: reader.read_text(child.name())?.into_owned(),
                    });
                }
                b"simpleMatchSet" => {
                    interaction
                        .match_sets
                        .push(parse_match_set(reader)?);
                }
                b"object" => {
                    interaction.object = Some(MediaObject {
                        data: attr(&child, "data").unwrap_or_default(),
                        media_type: attr(&child, "type").unwrap_or_default(),
                    });
                    skip_subtree(reader, &child)?;
                }
                _ => skip_subtree(reader, &child)?,
            },
            Event::Empty(child) if child.local_name().as_ref() == b"object" => {
                interaction.object = Some(MediaObject {
                    data: attr(&child, "data").unwrap_or_default(),
                    media_type: attr(&child, "type").unwrap_or_default(),
                });
            }
            Event::End(end) if end.local_name().as_ref() == end_name.as_bytes() => break,
            Event::Eof => {
                return Err(ParseError::Xml(format!(
                    "unexpected end of document inside {}",
                    end_name
                )));
            }
            _ => continue,
        }
    }

    Ok(interaction)
}

fn parse_match_set(reader: &mut Reader<&[u8]>) -> Result<Vec<InteractionChoice>, ParseError> {
    let mut choices = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(child) if child.local_name().as_ref() == b"simpleAssociableChoice" => {
                choices.push(InteractionChoice {
                    identifier: attr(&child, "identifier").unwrap_or_default(),
                    content: reader.read_text(child.name())?.into_owned(),
                });
            }
            Event::Start(child) => skip_subtree(reader, &child)?,
            Event::End(end) if end.local_name().as_ref() == b"simpleMatchSet" => break,
            Event::Eof => {
                return Err(ParseError::Xml(
                    "unexpected end of document inside simpleMatchSet".to_string(),
                ));
            }
            _ => continue,
        }
    }
    Ok(choices)
}

fn parse_response_processing(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart,
    is_empty: bool,
) -> Result<ResponseProcessingTemplate, ParseError> {
    if let Some(uri) = attr(e, "template") {
        if !is_empty {
            skip_subtree(reader, e)?;
        }
        return Ok(ResponseProcessingTemplate::from_template_uri(&uri));
    }
    if is_empty {
        return Ok(ResponseProcessingTemplate::None);
    }

    let mut rules = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(child) => rules.push(parse_response_rule(reader, &child, false)?),
            Event::Empty(child) => rules.push(parse_response_rule(reader, &child, true)?),
            Event::End(end) if end.local_name().as_ref() == b"responseProcessing" => break,
            Event::Eof => {
                return Err(ParseError::Xml(
                    "unexpected end of document inside responseProcessing".to_string(),
                ));
            }
            _ => continue,
        }
    }

    if rules.is_empty() {
        Ok(ResponseProcessingTemplate::None)
    } else {
        Ok(ResponseProcessingTemplate::Builtin(ResponseProcessing {
            rules,
        }))
    }
}

fn parse_response_rule(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart,
    is_empty: bool,
) -> Result<ResponseRule, ParseError> {
    match e.local_name().as_ref() {
        b"responseCondition" if !is_empty => {
            Ok(ResponseRule::Condition(parse_response_condition(reader)?))
        }
        b"setOutcomeValue" => Ok(ResponseRule::SetOutcomeValue(parse_set_outcome_value(
            reader, e, is_empty,
        )?)),
        other => {
            let name = String::from_utf8_lossy(other).into_owned();
            if !is_empty {
                skip_subtree(reader, e)?;
            }
            Ok(ResponseRule::Unsupported(name))
        }
    }
}

fn parse_response_condition(
    reader: &mut Reader<&[u8]>,
) -> Result<ResponseCondition, ParseError> {
    let mut response_if = None;
    let mut else_ifs = Vec::new();
    let mut response_else = None;

    loop {
        match reader.read_event()? {
            Event::Start(child) => match child.local_name().as_ref() {
                b"responseIf" => {
                    response_if = Some(parse_condition_branch(reader, b"responseIf", true)?);
                }
                b"responseElseIf" => {
                    else_ifs.push(parse_condition_branch(reader, b"responseElseIf", true)?);
                }
                b"responseElse" => {
                    response_else = Some(parse_condition_branch(reader, b"responseElse", false)?);
                }
                _ => skip_subtree(reader, &child)?,
            },
            Event::End(end) if end.local_name().as_ref() == b"responseCondition" => break,
            Event::Eof => {
                return Err(ParseError::Xml(
                    "unexpected end of document inside responseCondition".to_string(),
                ));
            }
            _ => continue,
        }
    }

    let response_if = response_if.ok_or_else(|| {
        ParseError::Schema("responseCondition is missing its responseIf branch".to_string())
    })?;

    Ok(ResponseCondition {
        response_if,
        else_ifs,
        response_else,
    })
}

/// Parse one condition branch. Guarded branches (`responseIf`,
/// `responseElseIf`) open with their guard expression; `responseElse`
/// carries rules only.
fn parse_condition_branch(
    reader: &mut Reader<&[u8]>,
    container: &[u8],
    has_guard: bool,
) -> Result<ConditionBranch, ParseError> {
    let mut guard = if has_guard { None } else { Some(Guard::None) };
    let mut rules = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(child) => {
                if guard.is_none() {
                    guard = Some(parse_guard(reader, &child, false)?);
                } else {
                    rules.push(parse_response_rule(reader, &child, false)?);
                }
            }
            Event::Empty(child) => {
                if guard.is_none() {
                    guard = Some(parse_guard(reader, &child, true)?);
                } else {
                    rules.push(parse_response_rule(reader, &child, true)?);
                }
            }
            Event::End(end) if end.local_name().as_ref() == container => break,
            Event::Eof => {
                return Err(ParseError::Xml(format!(
                    "unexpected end of document inside {}",
                    String::from_utf8_lossy(container)
                )));
            }
            _ => continue,
        }
    }

    Ok(ConditionBranch {
        guard: guard.unwrap_or(Guard::None),
        rules,
    })
}

fn parse_guard(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart,
    is_empty: bool,
) -> Result<Guard, ParseError> {
    match e.local_name().as_ref() {
        b"isNull" if !is_empty => {
            let operands = parse_operands(reader, b"isNull")?;
            Ok(Guard::IsNull {
                variable: operands
                    .into_iter()
                    .next()
                    .map(|op| op.identifier)
                    .unwrap_or_default(),
            })
        }
        b"match" if !is_empty => {
            let mut operands = parse_operands(reader, b"match")?.into_iter();
            Ok(Guard::Match {
                response: operands.next().map(|op| op.identifier).unwrap_or_default(),
                correct: operands.next().map(|op| op.identifier).unwrap_or_default(),
            })
        }
        b"equal" if !is_empty => {
            let operands = parse_operands(reader, b"equal")?;
            let mut response = String::new();
            let mut value = None;
            for op in operands {
                if op.element == "baseValue" {
                    value = op.value;
                } else if response.is_empty() {
                    response = op.identifier;
                }
            }
            Ok(Guard::Equal {
                response,
                value: value.unwrap_or(QtiValue::String(String::new())),
            })
        }
        other => {
            let name = String::from_utf8_lossy(other).into_owned();
            if !is_empty {
                skip_subtree(reader, e)?;
            }
            Ok(Guard::Unsupported(name))
        }
    }
}

/// A sub-expression operand of a guard: `variable`, `correct` or
/// `baseValue`.
struct Operand {
    element: String,
    identifier: String,
    value: Option<QtiValue>,
}

fn parse_operands(
    reader: &mut Reader<&[u8]>,
    container: &[u8],
) -> Result<Vec<Operand>, ParseError> {
    let mut operands = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Empty(child) => operands.push(Operand {
                element: String::from_utf8_lossy(child.local_name().as_ref()).into_owned(),
                identifier: attr(&child, "identifier").unwrap_or_default(),
                value: None,
            }),
            Event::Start(child) => {
                let element = String::from_utf8_lossy(child.local_name().as_ref()).into_owned();
                let identifier = attr(&child, "identifier").unwrap_or_default();
                let value = if element == "baseValue" {
                    let base_type = attr(&child, "baseType")
                        .as_deref()
                        .and_then(BaseType::from_attr)
                        .unwrap_or(BaseType::String);
                    let text = reader.read_text(child.name())?;
                    Some(QtiValue::from_typed(base_type, &text))
                } else {
                    skip_subtree(reader, &child)?;
                    None
                };
                operands.push(Operand {
                    element,
                    identifier,
                    value,
                });
            }
            Event::End(end) if end.local_name().as_ref() == container => break,
            Event::Eof => {
                return Err(ParseError::Xml(format!(
                    "unexpected end of document inside {}",
                    String::from_utf8_lossy(container)
                )));
            }
            _ => continue,
        }
    }
    Ok(operands)
}

fn parse_set_outcome_value(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart,
    is_empty: bool,
) -> Result<SetOutcomeValue, ParseError> {
    let identifier = attr(e, "identifier").unwrap_or_default();
    let mut expression = OutcomeExpression::Unsupported("missing expression".to_string());
    if is_empty {
        return Ok(SetOutcomeValue {
            identifier,
            expression,
        });
    }

    loop {
        match reader.read_event()? {
            Event::Start(child) => match child.local_name().as_ref() {
                b"baseValue" => {
                    let base_type = attr(&child, "baseType")
                        .as_deref()
                        .and_then(BaseType::from_attr)
                        .unwrap_or(BaseType::String);
                    let text = reader.read_text(child.name())?;
                    expression = OutcomeExpression::BaseValue(QtiValue::from_typed(base_type, &text));
                }
                b"variable" => {
                    expression =
                        OutcomeExpression::Variable(attr(&child, "identifier").unwrap_or_default());
                    skip_subtree(reader, &child)?;
                }
                b"mapResponse" => {
                    expression = OutcomeExpression::MapResponse(attr(&child, "identifier"));
                    skip_subtree(reader, &child)?;
                }
                other => {
                    expression =
                        OutcomeExpression::Unsupported(String::from_utf8_lossy(other).into_owned());
                    skip_subtree(reader, &child)?;
                }
            },
            Event::Empty(child) => match child.local_name().as_ref() {
                b"variable" => {
                    expression =
                        OutcomeExpression::Variable(attr(&child, "identifier").unwrap_or_default());
                }
                b"mapResponse" => {
                    expression = OutcomeExpression::MapResponse(attr(&child, "identifier"));
                }
                other => {
                    expression =
                        OutcomeExpression::Unsupported(String::from_utf8_lossy(other).into_owned());
                }
            },
            Event::End(end) if end.local_name().as_ref() == b"setOutcomeValue" => break,
            Event::Eof => {
                return Err(ParseError::Xml(
                    "unexpected end of document inside setOutcomeValue".to_string(),
                ));
            }
            _ => continue,
        }
    }

    Ok(SetOutcomeValue {
        identifier,
        expression,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_ITEM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<assessmentItem xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1" identifier="item-1" title="Example">
  <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
    <correctResponse>
      <value>A</value>
    </correctResponse>
  </responseDeclaration>
  <outcomeDeclaration identifier="SCORE" cardinality="single" baseType="float">
    <defaultValue><value>0</value></defaultValue>
  </outcomeDeclaration>
  <itemBody>
    <p>Pick one.</p>
    <choiceInteraction responseIdentifier="RESPONSE" maxChoices="1">
      <prompt>Which letter?</prompt>
      <simpleChoice identifier="A">Letter A</simpleChoice>
      <simpleChoice identifier="B">Letter B</simpleChoice>
    </choiceInteraction>
  </itemBody>
  <responseProcessing template="http://www.imsglobal.org/question/qti_v2p1/rptemplates/match_correct"/>
</assessmentItem>"#;

    #[test]
    fn test_parse_minimal_item() {
        let item = parse_assessment_item(MINIMAL_ITEM).unwrap();

        assert_eq!(item.identifier, "item-1");
        assert_eq!(item.title, "Example");
        assert_eq!(item.interactions.len(), 1);
        assert_eq!(
            item.response_processing,
            crate::qti::rules::ResponseProcessingTemplate::MatchCorrect
        );

        let interaction = &item.interactions[0];
        assert_eq!(interaction.element, "choiceInteraction");
        assert_eq!(interaction.response_identifier, "RESPONSE");
        assert_eq!(interaction.choices.len(), 2);
        assert_eq!(interaction.prompt.as_deref(), Some("Which letter?"));

        let declaration = item.response_declaration("RESPONSE").unwrap();
        assert_eq!(
            declaration.correct_response,
            vec![QtiValue::Identifier("A".to_string())]
        );

        assert!(item.body_html.contains("{{interaction:RESPONSE}}"));
        assert!(item.body_html.contains("Pick one."));
    }

    #[test]
    fn test_parse_builtin_rule_tree() {
        let xml = r#"<assessmentItem identifier="i" title="t">
  <itemBody><p>x</p></itemBody>
  <responseProcessing>
    <responseCondition>
      <responseIf>
        <isNull><variable identifier="RESPONSE"/></isNull>
        <setOutcomeValue identifier="SCORE">
          <baseValue baseType="float">0</baseValue>
        </setOutcomeValue>
      </responseIf>
      <responseElse>
        <setOutcomeValue identifier="SCORE">
          <mapResponse identifier="RESPONSE"/>
        </setOutcomeValue>
      </responseElse>
    </responseCondition>
  </responseProcessing>
</assessmentItem>"#;

        let item = parse_assessment_item(xml).unwrap();
        let processing = item.response_processing.builtin().unwrap();
        assert_eq!(processing.rules.len(), 1);

        let ResponseRule::Condition(condition) = &processing.rules[0] else {
            panic!("expected a responseCondition");
        };
        assert_eq!(
            condition.response_if.guard,
            Guard::IsNull {
                variable: "RESPONSE".to_string()
            }
        );
        let branch_else = condition.response_else.as_ref().unwrap();
        assert_eq!(branch_else.guard, Guard::None);
        assert_eq!(
            branch_else.rules,
            vec![ResponseRule::SetOutcomeValue(SetOutcomeValue {
                identifier: "SCORE".to_string(),
                expression: OutcomeExpression::MapResponse(Some("RESPONSE".to_string())),
            })]
        );
    }

    #[test]
    fn test_non_item_document_is_rejected() {
        let err = parse_assessment_item("<questestinterop/>").unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)));
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        let err = parse_assessment_item("<assessmentItem identifier=\"i\"><itemBody>").unwrap_err();
        assert!(matches!(err, ParseError::Xml(_)));
    }
}
