//! Finding questions on a page and resolving their identifiers
//!
//! Identifier detection is a fixed, ordered table of [`IdRule`]s; the first
//! rule that yields digits wins. A manual [`QuestionOverride`] beats every rule.

use crate::dom::{DomTree, NodeId};
use crate::error::Result;
use crate::quiz::model::QuestionId;
use crate::text::digits_only;
use log::{debug, info};
use regex::Regex;
use std::sync::LazyLock;

/// Class shared by every question container
pub const QUESTION_CLASS: &str = "que";

/// Class marking a question still awaiting an answer
pub const ACTIVE_CLASS: &str = "notyetanswered";

/// Classes of the dedicated question-number element, any of which may match
const NUMBER_CLASSES: [&str; 5] = ["rui-qno", "qno", "number", "qn", "question-number"];

static DOM_ID_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-(\d+)$").expect("static pattern"));
static QUESTION_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Question\s+(\d+)").expect("static pattern"));
static Q_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Q(\d+)").expect("static pattern"));

/// One question-number detection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRule {
    /// Digits of a dedicated number element inside the question
    NumberElement,
    /// Trailing `-<digits>` of the container's DOM id
    DomIdSuffix,
    /// `Question <digits>` in the question text
    QuestionWord,
    /// `Q<digits>` in the question text
    QPrefix,
}

impl IdRule {
    /// Detection order; the first hit wins
    pub const ORDER: [IdRule; 4] = [
        IdRule::NumberElement,
        IdRule::DomIdSuffix,
        IdRule::QuestionWord,
        IdRule::QPrefix,
    ];

    /// Digits found by this rule, if any
    pub fn apply(self, tree: &DomTree, question: NodeId) -> Option<String> {
        let digits = match self {
            IdRule::NumberElement => tree
                .find_first(question, |e| NUMBER_CLASSES.iter().any(|c| e.has_class(c)))
                .map(|number| digits_only(&tree.text_content(number))),
            IdRule::DomIdSuffix => tree
                .element(question)
                .id()
                .and_then(|id| DOM_ID_SUFFIX.captures(id))
                .map(|caps| caps[1].to_string()),
            IdRule::QuestionWord => first_capture(&QUESTION_WORD, &tree.text_content(question)),
            IdRule::QPrefix => first_capture(&Q_PREFIX, &tree.text_content(question)),
        };
        digits.filter(|d| !d.is_empty())
    }
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern.captures(text).map(|caps| caps[1].to_string())
}

/// Where a resolved identifier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    Override,
    Rule(IdRule),
}

/// A question identifier and the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    pub id: QuestionId,
    pub source: IdSource,
}

/// Manual question-number correction
///
/// Starts unset, is set from user input containing at least one digit, and
/// stays set until cleared. Lives for one page session, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QuestionOverride {
    #[default]
    None,
    Set(QuestionId),
}

impl QuestionOverride {
    /// Set the override from user input such as `Q30` or `30`
    pub fn set(&mut self, input: &str) -> Result<QuestionId> {
        let id = QuestionId::parse(input)?;
        info!("Question number manually set to {}", id);
        *self = QuestionOverride::Set(id.clone());
        Ok(id)
    }

    /// Return to automatic detection
    pub fn clear(&mut self) {
        if self.is_set() {
            info!("Manual question number cleared");
        }
        *self = QuestionOverride::None;
    }

    /// The override, if set
    pub fn current(&self) -> Option<&QuestionId> {
        match self {
            QuestionOverride::Set(id) => Some(id),
            QuestionOverride::None => None,
        }
    }

    /// Whether an override is set
    pub fn is_set(&self) -> bool {
        matches!(self, QuestionOverride::Set(_))
    }
}

/// The question awaiting an answer, if the page has one
pub fn locate_active_question(tree: &DomTree) -> Option<NodeId> {
    tree.find_first(tree.root(), |e| e.has_class(QUESTION_CLASS) && e.has_class(ACTIVE_CLASS))
}

/// Every question container in document order
pub fn question_containers(tree: &DomTree) -> Vec<NodeId> {
    tree.find_all(tree.root(), |e| e.has_class(QUESTION_CLASS))
}

/// Run the detection rules in order, ignoring any override
pub fn detect_question_id(tree: &DomTree, question: NodeId) -> Option<ResolvedId> {
    IdRule::ORDER.iter().find_map(|&rule| {
        let digits = rule.apply(tree, question)?;
        let id = QuestionId::from_digits(&digits)?;
        debug!("Question number {} detected by {:?}", id, rule);
        Some(ResolvedId {
            id,
            source: IdSource::Rule(rule),
        })
    })
}

/// Resolve a question's identifier; a set override always wins
pub fn resolve_question_id(
    tree: &DomTree,
    question: NodeId,
    question_override: &QuestionOverride,
) -> Option<ResolvedId> {
    if let Some(id) = question_override.current() {
        return Some(ResolvedId {
            id: id.clone(),
            source: IdSource::Override,
        });
    }
    detect_question_id(tree, question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutofillError;
    use crate::dom::parse_document;

    fn first_question(tree: &DomTree) -> NodeId {
        question_containers(tree)[0]
    }

    #[test]
    fn test_locate_active_question() {
        let tree = parse_document(
            r#"<div class="que ddwtos complete" id="q-1"></div>
               <div class="que multianswer notyetanswered" id="q-2"></div>
               <div class="que notyetanswered" id="q-3"></div>"#,
        );
        let active = locate_active_question(&tree).unwrap();
        assert_eq!(tree.element(active).id().map(String::as_str), Some("q-2"));
        assert_eq!(question_containers(&tree).len(), 3);
    }

    #[test]
    fn test_no_active_question() {
        let tree = parse_document(r#"<div class="que complete"></div>"#);
        assert!(locate_active_question(&tree).is_none());
    }

    #[test]
    fn test_number_element_wins() {
        let tree = parse_document(
            r#"<div class="que" id="question-88-4"><h3>Question <span class="qno">12</span></h3> Q99</div>"#,
        );
        let resolved = detect_question_id(&tree, first_question(&tree)).unwrap();
        assert_eq!(resolved.id.as_str(), "Q12");
        assert_eq!(resolved.source, IdSource::Rule(IdRule::NumberElement));
    }

    #[test]
    fn test_dom_id_suffix() {
        let tree = parse_document(r#"<div class="que" id="question-88-4">Question 7</div>"#);
        let resolved = detect_question_id(&tree, first_question(&tree)).unwrap();
        assert_eq!(resolved.id.as_str(), "Q4");
        assert_eq!(resolved.source, IdSource::Rule(IdRule::DomIdSuffix));
    }

    #[test]
    fn test_empty_number_element_falls_through() {
        let tree = parse_document(r#"<div class="que"><span class="qno">-</span>question   7</div>"#);
        let resolved = detect_question_id(&tree, first_question(&tree)).unwrap();
        assert_eq!(resolved.id.as_str(), "Q7");
        assert_eq!(resolved.source, IdSource::Rule(IdRule::QuestionWord));
    }

    #[test]
    fn test_q_prefix() {
        let tree = parse_document(r#"<div class="que">See q15 below</div>"#);
        let resolved = detect_question_id(&tree, first_question(&tree)).unwrap();
        assert_eq!(resolved.id.as_str(), "Q15");
        assert_eq!(resolved.source, IdSource::Rule(IdRule::QPrefix));
    }

    #[test]
    fn test_nothing_detected() {
        let tree = parse_document(r#"<div class="que">No number here</div>"#);
        assert!(detect_question_id(&tree, first_question(&tree)).is_none());
    }

    #[test]
    fn test_override_always_wins() {
        let tree = parse_document(r#"<div class="que"><span class="qno">12</span></div>"#);
        let question = first_question(&tree);

        let mut question_override = QuestionOverride::default();
        assert_eq!(
            resolve_question_id(&tree, question, &question_override).unwrap().id.as_str(),
            "Q12"
        );

        assert_eq!(question_override.set("q30").unwrap().as_str(), "Q30");
        let resolved = resolve_question_id(&tree, question, &question_override).unwrap();
        assert_eq!(resolved.id.as_str(), "Q30");
        assert_eq!(resolved.source, IdSource::Override);

        let bare = parse_document(r#"<div class="que">nothing</div>"#);
        assert_eq!(
            resolve_question_id(&bare, first_question(&bare), &question_override).unwrap().id.as_str(),
            "Q30"
        );

        question_override.clear();
        assert!(!question_override.is_set());
        assert_eq!(
            resolve_question_id(&tree, question, &question_override).unwrap().id.as_str(),
            "Q12"
        );
    }

    #[test]
    fn test_override_rejects_input_without_digits() {
        let mut question_override = QuestionOverride::Set(QuestionId::parse("5").unwrap());
        assert!(matches!(
            question_override.set("abc"),
            Err(AutofillError::InvalidQuestionNumber(_))
        ));
        assert_eq!(question_override.current().map(QuestionId::as_str), Some("Q5"));
    }
}
