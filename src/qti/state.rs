//! QTI state model
//!
//! Typed representations of the state-bearing parts of an assessment item:
//! response declarations (correct responses and score mappings) and outcome
//! declarations (scored variables and their defaults).

use std::collections::HashMap;

/// QTI base types supported by this SDK.
///
/// This is the subset of base types the registered interaction types
/// declare; anything else is carried through `Unsupported` so a document
/// using one still parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Identifier,
    String,
    Integer,
    Float,
    Boolean,
    DirectedPair,
    Pair,
}

impl BaseType {
    /// The lexical form used in QTI XML attributes.
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Identifier => "identifier",
            BaseType::String => "string",
            BaseType::Integer => "integer",
            BaseType::Float => "float",
            BaseType::Boolean => "boolean",
            BaseType::DirectedPair => "directedPair",
            BaseType::Pair => "pair",
        }
    }

    /// Parse a QTI `baseType` attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "identifier" => Some(BaseType::Identifier),
            "string" => Some(BaseType::String),
            "integer" => Some(BaseType::Integer),
            "float" => Some(BaseType::Float),
            "boolean" => Some(BaseType::Boolean),
            "directedPair" => Some(BaseType::DirectedPair),
            "pair" => Some(BaseType::Pair),
            _ => None,
        }
    }
}

/// QTI response variable cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Multiple,
    Ordered,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Single => "single",
            Cardinality::Multiple => "multiple",
            Cardinality::Ordered => "ordered",
        }
    }

    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "single" => Some(Cardinality::Single),
            "multiple" => Some(Cardinality::Multiple),
            "ordered" => Some(Cardinality::Ordered),
            _ => None,
        }
    }
}

/// A typed QTI value, as found in `<value>` elements and `<baseValue>`
/// expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum QtiValue {
    Identifier(String),
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Ordered pair of identifiers, e.g. a match-interaction association.
    DirectedPair(String, String),
    Pair(String, String),
}

impl QtiValue {
    /// Interpret raw element text according to the declared base type.
    ///
    /// Values that fail to parse as the declared type fall back to a string
    /// value; a malformed value is a content problem, not a parse failure.
    pub fn from_typed(base_type: BaseType, raw: &str) -> Self {
        let raw = raw.trim();
        match base_type {
            BaseType::Identifier => QtiValue::Identifier(raw.to_string()),
            BaseType::String => QtiValue::String(raw.to_string()),
            BaseType::Integer => raw
                .parse::<i64>()
                .map(QtiValue::Integer)
                .unwrap_or_else(|_| QtiValue::String(raw.to_string())),
            BaseType::Float => raw
                .parse::<f64>()
                .map(QtiValue::Float)
                .unwrap_or_else(|_| QtiValue::String(raw.to_string())),
            BaseType::Boolean => match raw {
                "true" | "1" => QtiValue::Boolean(true),
                "false" | "0" => QtiValue::Boolean(false),
                _ => QtiValue::String(raw.to_string()),
            },
            BaseType::DirectedPair | BaseType::Pair => {
                let mut parts = raw.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some(a), Some(b)) if base_type == BaseType::DirectedPair => {
                        QtiValue::DirectedPair(a.to_string(), b.to_string())
                    }
                    (Some(a), Some(b)) => QtiValue::Pair(a.to_string(), b.to_string()),
                    _ => QtiValue::String(raw.to_string()),
                }
            }
        }
    }

    /// Numeric view of the value, where one exists.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            QtiValue::Integer(n) => Some(*n as f64),
            QtiValue::Float(f) => Some(*f),
            QtiValue::String(s) | QtiValue::Identifier(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// The lexical form used when marshalling back to XML.
    pub fn lexical(&self) -> String {
        match self {
            QtiValue::Identifier(s) | QtiValue::String(s) => s.clone(),
            QtiValue::Integer(n) => n.to_string(),
            QtiValue::Float(f) => format_float(*f),
            QtiValue::Boolean(b) => b.to_string(),
            QtiValue::DirectedPair(a, b) | QtiValue::Pair(a, b) => format!("{} {}", a, b),
        }
    }

    /// JSON form used in Learnosity validation values.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            QtiValue::Identifier(s) | QtiValue::String(s) => serde_json::Value::String(s.clone()),
            QtiValue::Integer(n) => serde_json::json!(n),
            QtiValue::Float(f) => serde_json::json!(f),
            QtiValue::Boolean(b) => serde_json::json!(b),
            QtiValue::DirectedPair(a, b) | QtiValue::Pair(a, b) => {
                serde_json::Value::String(format!("{} {}", a, b))
            }
        }
    }
}

/// Render a float the way QTI documents carry scores: integral values
/// without a trailing fraction.
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// One `<mapEntry>` of a response mapping table.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub map_key: QtiValue,
    pub mapped_value: f64,
    pub case_sensitive: bool,
}

/// A `<mapping>` table translating response values into scores.
///
/// Entries keep document order; score extraction depends on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    pub default_value: f64,
    pub entries: Vec<MapEntry>,
}

/// A `<responseDeclaration>`: the expected shape of one interaction's
/// response, optionally with its correct answer or score-mapping table.
#[derive(Debug, Clone)]
pub struct ResponseDeclaration {
    pub identifier: String,
    pub cardinality: Cardinality,
    pub base_type: BaseType,
    pub correct_response: Vec<QtiValue>,
    pub mapping: Option<Mapping>,
}

impl ResponseDeclaration {
    pub fn new(identifier: impl Into<String>, cardinality: Cardinality, base_type: BaseType) -> Self {
        Self {
            identifier: identifier.into(),
            cardinality,
            base_type,
            correct_response: Vec::new(),
            mapping: None,
        }
    }
}

/// An `<outcomeDeclaration>`: a derived/scored variable and its default.
#[derive(Debug, Clone)]
pub struct OutcomeDeclaration {
    pub identifier: String,
    pub default_values: Vec<QtiValue>,
}

/// Outcome declarations of an item, keyed by identifier.
pub type OutcomeDeclarations = HashMap<String, OutcomeDeclaration>;
