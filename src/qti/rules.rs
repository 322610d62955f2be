//! QTI response-processing rule trees
//!
//! Closed tagged-variant model of the response-processing subset this SDK
//! translates. Guard and outcome-expression shapes that fall outside the
//! subset are carried as `Unsupported` variants so the import analyzer can
//! log and skip them instead of failing the whole item.

use crate::qti::state::QtiValue;

/// URI of the standard `match_correct` response-processing template.
pub const MATCH_CORRECT_TEMPLATE_URI: &str =
    "http://www.imsglobal.org/question/qti_v2p1/rptemplates/match_correct";

/// URI of the standard `map_response` response-processing template.
pub const MAP_RESPONSE_TEMPLATE_URI: &str =
    "http://www.imsglobal.org/question/qti_v2p1/rptemplates/map_response";

/// A `<responseProcessing>` block: an ordered list of top-level rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseProcessing {
    pub rules: Vec<ResponseRule>,
}

/// One top-level or branch-level response rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseRule {
    Condition(ResponseCondition),
    SetOutcomeValue(SetOutcomeValue),
    /// Rule element outside the supported subset; element name kept for
    /// diagnostics.
    Unsupported(String),
}

/// A `<responseCondition>`: a mandatory `if`, any number of `elseIf`
/// branches in document order, and an optional `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCondition {
    pub response_if: ConditionBranch,
    pub else_ifs: Vec<ConditionBranch>,
    pub response_else: Option<ConditionBranch>,
}

/// One branch of a response condition: a guard expression (absent on
/// `else`) and the ordered rules executed when the guard holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionBranch {
    pub guard: Guard,
    pub rules: Vec<ResponseRule>,
}

/// Guard expression of a condition branch.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// `<isNull><variable/></isNull>`: the unattempted case.
    IsNull { variable: String },
    /// `<match><variable/><correct/></match>`: exact-match correct case.
    Match { response: String, correct: String },
    /// `<equal><variable/><baseValue/></equal>`: literal-answer case.
    Equal { response: String, value: QtiValue },
    /// No guard: the `else` branch.
    None,
    /// Expression outside the supported subset; element name kept for
    /// diagnostics.
    Unsupported(String),
}

/// A `<setOutcomeValue>` assignment rule.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOutcomeValue {
    /// Outcome variable being assigned, e.g. `SCORE`.
    pub identifier: String,
    pub expression: OutcomeExpression,
}

/// Expression assigned by a `<setOutcomeValue>` rule.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeExpression {
    /// `<baseValue>` literal.
    BaseValue(QtiValue),
    /// `<variable>` reference to an outcome declaration.
    Variable(String),
    /// `<mapResponse>` against a response declaration's mapping table.
    /// The identifier is optional; when absent the governing interaction's
    /// own declaration applies.
    MapResponse(Option<String>),
    Unsupported(String),
}

/// The response-processing strategy declared by an item.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseProcessingTemplate {
    MatchCorrect,
    MapResponse,
    /// IMS Common Cartridge variant of the map_response template.
    Cc2MapResponse,
    /// Inline (custom) response-processing rules.
    Builtin(ResponseProcessing),
    /// No response processing declared at all.
    #[default]
    None,
}

impl ResponseProcessingTemplate {
    /// Classify a `template` attribute URI.
    ///
    /// Matching is on the final path segment so vendor-hosted copies of the
    /// standard templates still resolve.
    pub fn from_template_uri(uri: &str) -> Self {
        let name = uri.rsplit('/').next().unwrap_or(uri);
        match name {
            "match_correct" => ResponseProcessingTemplate::MatchCorrect,
            "map_response" => ResponseProcessingTemplate::MapResponse,
            "cc2_map_response" => ResponseProcessingTemplate::Cc2MapResponse,
            _ => ResponseProcessingTemplate::None,
        }
    }

    /// The inline rules, when this is a builtin template.
    pub fn builtin(&self) -> Option<&ResponseProcessing> {
        match self {
            ResponseProcessingTemplate::Builtin(processing) => Some(processing),
            _ => None,
        }
    }
}
