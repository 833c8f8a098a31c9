//! Reading answers out of question markup
//!
//! Review pages show each question with its answer filled in. [`extract`] turns
//! one question into an [`AnswerRecord`]; [`extract_answers_from_review`] runs
//! it over every question on the page and files the results under a quiz.

use crate::dom::{DomTree, ElementNode, NodeId};
use crate::error::{AutofillError, Result};
use crate::quiz::classifier::{self, SUB_MARKER, SUBQUESTION_CLASS};
use crate::quiz::locator::{detect_question_id, question_containers};
use crate::quiz::matching::{choice_number, inside_drop_zone, is_draggable, is_drop_zone, place_number};
use crate::quiz::model::{AnswerRecord, PresetStore, QuestionId, QuestionType};
use crate::text::{clean_collapsed, clean_text};
use indexmap::IndexMap;
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static PLACE_ID_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_p(\d+)$").expect("static pattern"));

/// Sub-index patterns, most specific first
static SUB_INDEX: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)_sub(?:question_)?(\d+)_").expect("static pattern"),
        Regex::new(r"(?i)_sub(\d+)").expect("static pattern"),
        Regex::new(r"(?i)sub(\d+)").expect("static pattern"),
    ]
});

/// Extract the answer shown in a question
pub fn extract(tree: &DomTree, question: NodeId, question_type: QuestionType, captured_at: i64) -> Result<AnswerRecord> {
    match question_type {
        QuestionType::Ddwtos => extract_drag_drop(tree, question, captured_at),
        QuestionType::MultiAnswer => extract_multi_answer(tree, question, captured_at),
        QuestionType::AnswersSelect => extract_selected(tree, question, captured_at),
        QuestionType::Unknown => Ok(extract_raw_inputs(tree, question, captured_at)),
    }
}

fn extract_drag_drop(tree: &DomTree, question: NodeId, captured_at: i64) -> Result<AnswerRecord> {
    let hidden_inputs = tree.find_all(question, |e| e.is_tag("input") && e.has_class("placeinput"));

    let mut placed: Vec<(Option<u32>, String)> = if hidden_inputs.is_empty() {
        read_drop_zones(tree, question)?
    } else {
        hidden_inputs
            .into_iter()
            .filter_map(|input| {
                let element = tree.element(input);
                let value = clean_text(element.value.as_deref().unwrap_or(""));
                if value.is_empty() {
                    return None;
                }
                Some((hidden_input_place(element), choice_display_text(tree, question, &value)))
            })
            .collect()
    };

    placed.sort_by_key(|(place, _)| place.unwrap_or(u32::MAX));

    let mut mapping = IndexMap::new();
    for (place, text) in &placed {
        if let Some(place) = place {
            mapping.insert(place.to_string(), text.clone());
        }
    }
    let parts = placed.into_iter().map(|(_, text)| text).collect();
    Ok(AnswerRecord::drag_drop(mapping, parts, captured_at))
}

fn hidden_input_place(element: &ElementNode) -> Option<u32> {
    place_number(element).or_else(|| {
        element
            .id()
            .and_then(|id| PLACE_ID_SUFFIX.captures(id))
            .and_then(|caps| caps[1].parse().ok())
    })
}

fn choice_display_text(tree: &DomTree, question: NodeId, choice: &str) -> String {
    let candidates = tree.find_all(question, |e| {
        e.has_class("draghome") && choice_number(e).as_deref() == Some(choice)
    });
    candidates
        .iter()
        .copied()
        .find(|&node| !inside_drop_zone(tree, node, question))
        .or_else(|| candidates.first().copied())
        .map(|node| clean_text(&tree.text_content(node)))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| choice.to_string())
}

fn read_drop_zones(tree: &DomTree, question: NodeId) -> Result<Vec<(Option<u32>, String)>> {
    let zones = tree.find_all(question, is_drop_zone);
    if zones.is_empty() {
        return Err(AutofillError::ElementNotFound(
            "no place inputs or drop zones in drag-drop question".to_string(),
        ));
    }

    Ok(zones
        .into_iter()
        .enumerate()
        .filter_map(|(index, zone)| {
            let place = place_number(tree.element(zone)).unwrap_or(index as u32 + 1);
            let occupant = tree.find_first(zone, is_draggable).unwrap_or(zone);
            let text = clean_text(&tree.text_content(occupant));
            (!text.is_empty()).then_some((Some(place), text))
        })
        .collect())
}

/// Sub-index encoded in a field's name (or id when the name is empty)
pub fn sub_index(element: &ElementNode) -> Option<u32> {
    let name_or_id = element
        .name()
        .filter(|name| !name.is_empty())
        .or_else(|| element.id())?;
    SUB_INDEX
        .iter()
        .find_map(|pattern| pattern.captures(name_or_id))
        .and_then(|caps| caps[1].parse().ok())
}

/// Answer fields of a multi-part question, in sub-index order
///
/// Only text inputs, textareas and selects are answer fields; radios and
/// checkboxes never are. Those inside `.subquestion` or named with `_sub`
/// count; without any, every one in the question does. Fields with no
/// sub-index take their 1-based position, and ties keep document order.
pub fn sub_answer_fields(tree: &DomTree, question: NodeId) -> Vec<NodeId> {
    let is_sub_field = |node: NodeId| {
        let element = tree.element(node);
        let marked = |value: Option<&String>| value.is_some_and(|v| v.contains(SUB_MARKER));
        tree.closest(node, |e| e.has_class(SUBQUESTION_CLASS))
            .is_some_and(|sub| tree.is_inside(sub, question))
            || marked(element.name())
            || marked(element.id())
    };

    let entries = tree.find_all(question, ElementNode::is_text_entry);
    let sub_fields: Vec<NodeId> = entries.iter().copied().filter(|&node| is_sub_field(node)).collect();
    let fields = if sub_fields.is_empty() { entries } else { sub_fields };

    let mut indexed: Vec<(u32, NodeId)> = fields
        .into_iter()
        .enumerate()
        .map(|(position, node)| (sub_index(tree.element(node)).unwrap_or(position as u32 + 1), node))
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, node)| node).collect()
}

fn field_value(tree: &DomTree, field: NodeId) -> String {
    let element = tree.element(field);

    if element.is_tag("select") {
        let option_text = tree
            .selected_option(field)
            .map(|option| clean_text(&tree.text_content(option)))
            .filter(|text| !text.is_empty());
        return option_text.unwrap_or_else(|| clean_text(element.value.as_deref().unwrap_or("")));
    }

    let live = element.value.as_deref().map(str::trim).unwrap_or("");
    if !live.is_empty() {
        return clean_text(live);
    }
    let initial = element.get_attribute("data-initial-value").map(|v| v.trim()).unwrap_or("");
    if !initial.is_empty() {
        return clean_text(initial);
    }
    tree.closest(field, |e| e.has_class(SUBQUESTION_CLASS))
        .or_else(|| tree.parent(field))
        .map(|container| clean_text(&tree.text_content(container)))
        .unwrap_or_default()
}

fn extract_multi_answer(tree: &DomTree, question: NodeId, captured_at: i64) -> Result<AnswerRecord> {
    let fields = sub_answer_fields(tree, question);
    if fields.is_empty() {
        return Err(AutofillError::ElementNotFound("no answer fields in multi-part question".to_string()));
    }
    let parts = fields.into_iter().map(|field| field_value(tree, field)).collect();
    Ok(AnswerRecord::multi_answer(parts, captured_at))
}

/// Radio and checkbox inputs of a question in document order
pub fn choice_inputs(tree: &DomTree, question: NodeId) -> Vec<NodeId> {
    tree.find_all(question, ElementNode::is_choice_input)
}

/// Label text of a radio or checkbox
///
/// Looks for `#<id>_label` anywhere in the document, then an element inside the
/// question labelled by that id, then falls back to the input's parent.
pub fn option_label(tree: &DomTree, question: NodeId, input: NodeId) -> String {
    let label = tree.element(input).id().and_then(|id| {
        let label_id = format!("{}_label", id);
        tree.element_by_id(&label_id).or_else(|| {
            tree.find_first(question, |e| {
                e.get_attribute("aria-labelledby").map(String::as_str) == Some(label_id.as_str())
            })
        })
    });
    label
        .or_else(|| tree.parent(input))
        .map(|node| clean_collapsed(&tree.text_content(node)))
        .unwrap_or_default()
}

fn extract_selected(tree: &DomTree, question: NodeId, captured_at: i64) -> Result<AnswerRecord> {
    let inputs = choice_inputs(tree, question);
    if inputs.is_empty() {
        return Err(AutofillError::ElementNotFound("no radio or checkbox inputs in question".to_string()));
    }

    let selected = inputs
        .into_iter()
        .filter(|&input| tree.element(input).checked)
        .filter_map(|input| {
            let label = option_label(tree, question, input);
            let text = if label.is_empty() {
                clean_text(tree.element(input).value.as_deref().unwrap_or(""))
            } else {
                label
            };
            (!text.is_empty()).then_some(text)
        })
        .collect();
    Ok(AnswerRecord::selected(selected, captured_at))
}

fn extract_raw_inputs(tree: &DomTree, question: NodeId, captured_at: i64) -> AnswerRecord {
    let inputs = tree
        .find_all(question, ElementNode::is_form_control)
        .into_iter()
        .filter_map(|node| {
            let value = clean_text(tree.element(node).value.as_deref().unwrap_or(""));
            (!value.is_empty()).then_some(value)
        })
        .collect();
    AnswerRecord::raw_inputs(inputs, captured_at)
}

/// A question the batch did not store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedQuestion {
    /// `None` when the number could not be detected
    pub question: Option<QuestionId>,
    pub reason: String,
}

/// Result of extracting a whole review page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub quiz: String,
    pub extracted: Vec<QuestionId>,
    pub skipped: Vec<SkippedQuestion>,
}

impl ExtractionReport {
    pub fn extracted_count(&self) -> usize {
        self.extracted.len()
    }
}

/// Extract every question on a review page into `store` under `quiz`
///
/// Existing answers for the same question ids are overwritten. Questions whose
/// number cannot be detected, whose extraction fails, or that hold no answer are
/// skipped and listed in the report. The caller persists the store.
pub fn extract_answers_from_review(tree: &DomTree, store: &mut PresetStore, quiz: &str, now: i64) -> ExtractionReport {
    let questions = question_containers(tree);
    info!("Extracting answers from {} questions for quiz: {}", questions.len(), quiz);

    let mut report = ExtractionReport {
        quiz: quiz.to_string(),
        ..Default::default()
    };
    for question in questions {
        let Some(resolved) = detect_question_id(tree, question) else {
            debug!("Skipping question without a detectable number");
            report.skipped.push(SkippedQuestion {
                question: None,
                reason: AutofillError::QuestionIdNotDetected.to_string(),
            });
            continue;
        };
        let id = resolved.id;
        let question_type = classifier::question_type(tree, question);
        debug!("Processing {} (type: {})", id, question_type);

        match extract(tree, question, question_type, now) {
            Ok(record) if record.is_empty() => {
                debug!("No answer data found for {}", id);
                report.skipped.push(SkippedQuestion {
                    question: Some(id),
                    reason: "no answer data".to_string(),
                });
            }
            Ok(record) => {
                debug!("Extracted {}: {}", id, record.text);
                store.upsert_question(quiz, id.clone(), record, now);
                report.extracted.push(id);
            }
            Err(e) => {
                let error = AutofillError::ExtractionFailed {
                    question: id.to_string(),
                    reason: e.to_string(),
                };
                warn!("{}", error);
                report.skipped.push(SkippedQuestion {
                    question: Some(id),
                    reason: error.to_string(),
                });
            }
        }
    }

    if let Some(preset) = store.get_mut(quiz) {
        preset.updated_at = Some(now);
    }

    info!("Extracted {} answers for \"{}\"", report.extracted_count(), quiz);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;
    use crate::quiz::model::Structured;

    fn first_question(tree: &DomTree) -> NodeId {
        question_containers(tree)[0]
    }

    #[test]
    fn test_drag_drop_from_hidden_inputs() {
        let tree = parse_document(
            r#"<div class="que ddwtos" id="question-3-1">
                 <span class="drop place2"></span><span class="drop place1"></span>
                 <span class="draghome choice1">alpha</span>
                 <span class="draghome choice2">beta</span>
                 <input type="hidden" class="placeinput place2" value="1">
                 <input type="hidden" class="placeinput" id="q3_p1" value="2">
               </div>"#,
        );
        let record = extract(&tree, first_question(&tree), QuestionType::Ddwtos, 1).unwrap();

        assert_eq!(record.text, "beta || alpha");
        assert_eq!(record.parts, Some(vec!["beta".to_string(), "alpha".to_string()]));
        match record.structured {
            Structured::DragDrop { mapping, .. } => {
                assert_eq!(mapping.get("1").map(String::as_str), Some("beta"));
                assert_eq!(mapping.get("2").map(String::as_str), Some("alpha"));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_drag_drop_from_visible_zones() {
        let tree = parse_document(
            r#"<div class="que ddwtos">
                 <span class="drop place1"><span class="draghome choice3">gamma</span></span>
                 <span class="drop place2"><span class="draghome dragplaceholder">x</span><span class="draghome choice1">alpha</span></span>
                 <span class="drop place3"></span>
               </div>"#,
        );
        let record = extract(&tree, first_question(&tree), QuestionType::Ddwtos, 1).unwrap();
        assert_eq!(record.text, "gamma || alpha");
    }

    #[test]
    fn test_drag_drop_without_targets_fails() {
        let tree = parse_document(r#"<div class="que ddwtos"><p>empty</p></div>"#);
        assert!(extract(&tree, first_question(&tree), QuestionType::Ddwtos, 1).is_err());
    }

    #[test]
    fn test_multi_answer_sorted_by_sub_index() {
        let tree = parse_document(
            r#"<div class="que multianswer">
                 <span class="subquestion"><input type="text" name="q5:1_sub2_answer" value=" second "></span>
                 <span class="subquestion"><select name="q5:1_sub1_answer">
                   <option value="">Choose</option><option value="1" selected>first</option>
                 </select></span>
                 <span class="subquestion"><input type="text" name="q5:1_sub3_answer" data-initial-value="third"></span>
                 <input type="hidden" name="q5:1_sub4_sequencecheck" value="1">
               </div>"#,
        );
        let record = extract(&tree, first_question(&tree), QuestionType::MultiAnswer, 1).unwrap();
        assert_eq!(record.text, "first || second || third");
        assert_eq!(record.structured, Structured::Parts {
            parts: vec!["first".into(), "second".into(), "third".into()]
        });
    }

    #[test]
    fn test_multi_answer_fallback_fields() {
        let tree = parse_document(
            r#"<div class="que multianswer">
                 <input type="text" name="a" value="one"><textarea name="b">two</textarea>
               </div>"#,
        );
        let record = extract(&tree, first_question(&tree), QuestionType::MultiAnswer, 1).unwrap();
        assert_eq!(record.parts, Some(vec!["one".to_string(), "two".to_string()]));
    }

    #[test]
    fn test_multi_answer_skips_choice_sub_questions() {
        let tree = parse_document(
            r#"<div class="que multianswer">
                 <span class="subquestion"><input type="text" name="q6:1_sub1_answer" value="hello"></span>
                 <span class="subquestion">
                   <input type="radio" name="q6:1_sub2_answer" id="r0" value="0" checked><label id="r0_label">Red</label>
                   <input type="radio" name="q6:1_sub2_answer" id="r1" value="1"><label id="r1_label">Blue</label>
                 </span>
                 <span class="subquestion"><input type="text" name="q6:1_sub3_answer" value="world"></span>
               </div>"#,
        );
        let question = first_question(&tree);
        assert_eq!(sub_answer_fields(&tree, question).len(), 2);

        let record = extract(&tree, question, QuestionType::MultiAnswer, 1).unwrap();
        assert_eq!(record.text, "hello || world");
    }

    #[test]
    fn test_multi_answer_all_empty() {
        let tree = parse_document(
            r#"<div class="que multianswer"><input type="text" name="q1:1_sub1_answer" value=""></div>"#,
        );
        let record = extract(&tree, first_question(&tree), QuestionType::MultiAnswer, 1).unwrap();
        assert!(record.is_empty());
        assert_eq!(record.parts, Some(vec![]));
    }

    #[test]
    fn test_sub_index_patterns() {
        let with = |name: &str| ElementNode::new("input").with_attribute("name", name);
        assert_eq!(sub_index(&with("q1:2_subquestion_7_answer")), Some(7));
        assert_eq!(sub_index(&with("q1:2_sub3_answer")), Some(3));
        assert_eq!(sub_index(&with("q1:2_SUB4")), Some(4));
        assert_eq!(sub_index(&with("field_sub5x")), Some(5));
        assert_eq!(sub_index(&with("answer")), None);
        let by_id = ElementNode::new("input").with_attribute("id", "sub9");
        assert_eq!(sub_index(&by_id), Some(9));
    }

    #[test]
    fn test_selected_labels() {
        let tree = parse_document(
            r#"<div class="que multichoice">
                 <div class="answer">
                   <div><input type="radio" name="q2:1_answer" id="q2_a0" value="0"><div id="q2_a0_label">Paris</div></div>
                   <div><input type="radio" name="q2:1_answer" id="q2_a1" value="1" checked><div id="q2_a1_label">  London
                     Bridge </div></div>
                   <div><input type="checkbox" id="q2_a2" value="2" checked><span aria-labelledby="q2_a2_label">Berlin</span></div>
                   <label><input type="checkbox" value="3" checked> Madrid</label>
                 </div>
               </div>"#,
        );
        let record = extract(&tree, first_question(&tree), QuestionType::AnswersSelect, 1).unwrap();
        assert_eq!(record.structured, Structured::Selected {
            selected: vec!["London Bridge".into(), "Berlin".into(), "Madrid".into()]
        });
        assert_eq!(record.text, "London Bridge || Berlin || Madrid");
        assert_eq!(record.parts, None);
    }

    #[test]
    fn test_unknown_collects_raw_values() {
        let tree = parse_document(
            r#"<div class="que essay"><input type="text" value="a"><textarea> long text </textarea><input value=""></div>"#,
        );
        let record = extract(&tree, first_question(&tree), QuestionType::Unknown, 1).unwrap();
        assert_eq!(record.structured, Structured::Inputs {
            inputs: vec!["a".into(), "long text".into()]
        });
    }

    #[test]
    fn test_batch_skips_and_continues() {
        let tree = parse_document(
            r#"<div class="que multianswer" id="question-1-1">
                 <input type="text" name="q1:1_sub1_answer" value="done">
               </div>
               <div class="que ddwtos" id="question-1-2"><p>broken</p></div>
               <div class="que essay"><p>no number</p></div>
               <div class="que multichoice" id="question-1-4"><input type="radio" id="r"><label>unanswered</label></div>"#,
        );
        let mut store = PresetStore::new();
        let report = extract_answers_from_review(&tree, &mut store, "Week 1", 100);

        assert_eq!(report.extracted.iter().map(QuestionId::as_str).collect::<Vec<_>>(), vec!["Q1"]);
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(report.skipped[1].question, None);

        let preset = store.get("Week 1").unwrap();
        assert_eq!(preset.questions.len(), 1);
        assert_eq!(preset.updated_at, Some(100));
    }

    #[test]
    fn test_batch_with_nothing_leaves_no_preset() {
        let tree = parse_document(r#"<div class="que essay" id="question-1-1"></div>"#);
        let mut store = PresetStore::new();
        let report = extract_answers_from_review(&tree, &mut store, "Empty", 1);
        assert_eq!(report.extracted_count(), 0);
        assert!(store.get("Empty").is_none());
    }
}
