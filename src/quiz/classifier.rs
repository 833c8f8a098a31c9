//! Question type detection
//!
//! Marker classes on the container decide first. Without one, structural rules
//! run in the fixed order of [`ClassRule::STRUCTURE`].

use crate::dom::{DomTree, ElementNode, NodeId};
use crate::quiz::model::QuestionType;
use log::debug;

/// Marker of a sub-answer field in name or id
pub(crate) const SUB_MARKER: &str = "_sub";

/// Class of the container grouping one sub-answer
pub(crate) const SUBQUESTION_CLASS: &str = "subquestion";

/// One classification rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRule {
    /// Container carries the type's marker class
    MarkerClass(QuestionType),
    /// Draggable choices or drop zones inside
    DragTargets,
    /// Inputs inside `.subquestion` or named with `_sub`
    SubAnswerFields,
    /// Radio or checkbox inputs inside
    ChoiceInputs,
}

impl ClassRule {
    /// Marker classes, checked before any structure
    pub const MARKERS: [ClassRule; 3] = [
        ClassRule::MarkerClass(QuestionType::Ddwtos),
        ClassRule::MarkerClass(QuestionType::MultiAnswer),
        ClassRule::MarkerClass(QuestionType::AnswersSelect),
    ];

    /// Structural fallbacks in precedence order
    pub const STRUCTURE: [ClassRule; 3] = [
        ClassRule::DragTargets,
        ClassRule::SubAnswerFields,
        ClassRule::ChoiceInputs,
    ];

    /// Type this rule yields
    pub fn question_type(self) -> QuestionType {
        match self {
            ClassRule::MarkerClass(question_type) => question_type,
            ClassRule::DragTargets => QuestionType::Ddwtos,
            ClassRule::SubAnswerFields => QuestionType::MultiAnswer,
            ClassRule::ChoiceInputs => QuestionType::AnswersSelect,
        }
    }

    /// Whether the rule fires on the question
    pub fn matches(self, tree: &DomTree, question: NodeId) -> bool {
        match self {
            ClassRule::MarkerClass(question_type) => tree.element(question).has_class(question_type.as_str()),
            ClassRule::DragTargets => tree
                .find_first(question, |e| e.has_class("draghome") || e.has_class("drop"))
                .is_some(),
            ClassRule::SubAnswerFields => tree
                .find_all(question, |e| e.is_tag("input"))
                .into_iter()
                .any(|input| {
                    tree.closest(input, |e| e.has_class(SUBQUESTION_CLASS)).is_some()
                        || has_sub_name(tree.element(input))
                }),
            ClassRule::ChoiceInputs => tree.find_first(question, ElementNode::is_choice_input).is_some(),
        }
    }
}

fn has_sub_name(element: &ElementNode) -> bool {
    element.name().is_some_and(|name| name.contains(SUB_MARKER))
}

/// Classification result with the rule that decided it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub question_type: QuestionType,
    /// `None` when nothing matched and the type is unknown
    pub rule: Option<ClassRule>,
}

/// Classify a question container
pub fn classify(tree: &DomTree, question: NodeId) -> Classification {
    let rule = ClassRule::MARKERS
        .iter()
        .chain(ClassRule::STRUCTURE.iter())
        .copied()
        .find(|rule| rule.matches(tree, question));

    let question_type = rule.map(ClassRule::question_type).unwrap_or(QuestionType::Unknown);
    debug!("Question classified as {} by {:?}", question_type, rule);
    Classification { question_type, rule }
}

/// Shorthand for the type alone
pub fn question_type(tree: &DomTree, question: NodeId) -> QuestionType {
    classify(tree, question).question_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;
    use crate::quiz::locator::question_containers;

    fn classify_html(html: &str) -> Classification {
        let tree = parse_document(html);
        let question = question_containers(&tree)[0];
        classify(&tree, question)
    }

    #[test]
    fn test_marker_classes_first() {
        let result = classify_html(r#"<div class="que multianswer"><input type="radio"><span class="drop"></span></div>"#);
        assert_eq!(result.question_type, QuestionType::MultiAnswer);
        assert_eq!(result.rule, Some(ClassRule::MarkerClass(QuestionType::MultiAnswer)));

        let result = classify_html(r#"<div class="que answersselect"></div>"#);
        assert_eq!(result.question_type, QuestionType::AnswersSelect);
    }

    #[test]
    fn test_drag_targets_before_sub_fields() {
        let result = classify_html(
            r#"<div class="que"><span class="drop place1"></span><input type="text" name="q1:1_sub1_answer"></div>"#,
        );
        assert_eq!(result.question_type, QuestionType::Ddwtos);
        assert_eq!(result.rule, Some(ClassRule::DragTargets));
    }

    #[test]
    fn test_sub_fields() {
        let by_name = classify_html(r#"<div class="que"><input type="text" name="q3:2_sub1_answer"><input type="radio"></div>"#);
        assert_eq!(by_name.question_type, QuestionType::MultiAnswer);

        let by_container = classify_html(r#"<div class="que"><span class="subquestion"><input type="text"></span></div>"#);
        assert_eq!(by_container.rule, Some(ClassRule::SubAnswerFields));
    }

    #[test]
    fn test_choice_inputs() {
        let result = classify_html(r#"<div class="que"><input type="checkbox" name="q1:choice0"></div>"#);
        assert_eq!(result.question_type, QuestionType::AnswersSelect);
    }

    #[test]
    fn test_unknown() {
        let result = classify_html(r#"<div class="que essay"><textarea></textarea></div>"#);
        assert_eq!(result.question_type, QuestionType::Unknown);
        assert_eq!(result.rule, None);
    }
}
