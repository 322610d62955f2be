//! Scoring facts collected from response-processing rule trees
//!
//! Walking a built-in rule tree yields per-interaction scoring facts
//! rather than a validation object directly; each interaction's
//! validation builder then reads its own slot. Facts from branches with
//! no interaction identifier land in a global slot.

use crate::qti::QtiValue;

/// Scoring mode implied by the guards seen in a condition branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchScoring {
    /// Exact comparison against declared correct values.
    Match,
    /// Mapped scoring over a response mapping.
    Partial,
}

/// One entry of the correct-outcome list.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectOutcome {
    /// A branch awarded this score for matching the declared correct
    /// response.
    Score(QtiValue),
    /// A branch compared against a literal answer and awarded this score
    /// for it.
    ScoredAnswer { score: QtiValue, answer: QtiValue },
}

/// Scoring facts accumulated for one slot (interaction or global).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringData {
    /// Outcomes awarded by correct branches, in document order.
    pub correct: Vec<CorrectOutcome>,
    /// Outcome assigned by a guardless branch without mapped scoring.
    pub incorrect: Option<QtiValue>,
    /// Outcome assigned when the response is null (unattempted).
    pub unattempted: Option<QtiValue>,
    /// Scoring mode; the first branch to establish one wins.
    pub scoring_type: Option<BranchScoring>,
    /// Mapped score resolved from a `mapResponse` expression.
    pub score: Option<f64>,
}

impl ScoringData {
    pub fn is_empty(&self) -> bool {
        self.correct.is_empty()
            && self.incorrect.is_none()
            && self.unattempted.is_none()
            && self.scoring_type.is_none()
            && self.score.is_none()
    }

    /// Append another branch's facts: lists concatenate, scalar slots
    /// keep their first value.
    pub fn append(&mut self, other: ScoringData) {
        self.correct.extend(other.correct);
        if self.incorrect.is_none() {
            self.incorrect = other.incorrect;
        }
        if self.unattempted.is_none() {
            self.unattempted = other.unattempted;
        }
        if self.scoring_type.is_none() {
            self.scoring_type = other.scoring_type;
        }
        if self.score.is_none() {
            self.score = other.score;
        }
    }
}

/// Scoring facts for a whole rule tree, keyed by interaction identifier
/// with one extra global slot for keyless branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringResult {
    global: ScoringData,
    interactions: Vec<(String, ScoringData)>,
}

impl ScoringResult {
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.interactions.iter().all(|(_, data)| data.is_empty())
    }

    /// Merge one branch's facts into the slot for `interaction_id`, or
    /// into the global slot when no identifier was established.
    pub fn merge_branch(&mut self, interaction_id: Option<&str>, data: ScoringData) {
        match interaction_id {
            None => self.global.append(data),
            Some(id) => {
                if let Some((_, slot)) = self.interactions.iter_mut().find(|(key, _)| key == id) {
                    slot.append(data);
                } else {
                    self.interactions.push((id.to_string(), data));
                }
            }
        }
    }

    pub fn global(&self) -> &ScoringData {
        &self.global
    }

    /// Facts keyed to a specific interaction, falling back to the global
    /// slot when no keyed facts exist.
    pub fn for_interaction(&self, id: &str) -> Option<&ScoringData> {
        let keyed = self
            .interactions
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, data)| data);
        keyed.or_else(|| (!self.global.is_empty()).then_some(&self.global))
    }
}
