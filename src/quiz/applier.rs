//! Writing answers back into a live question
//!
//! All checks that can fail run before the first mutation, so a failed apply
//! leaves the page untouched. Each filled field is followed by a step marker
//! carrying the progress percentage; the page adapter paces replay on those.

use crate::dom::{DomEvent, DomTree, NodeId};
use crate::error::{AutofillError, Result};
use crate::quiz::extractor::{choice_inputs, option_label, sub_answer_fields};
use crate::quiz::matching::{MatchedBy, available_choices, drop_zones, find_text, resolve_choice};
use crate::quiz::model::QuestionType;
use crate::quiz::placement::{PlacementOutcome, place_choice};
use crate::text::{answer_tokens, clean_text, is_numeric, split_parts};
use indexmap::IndexMap;
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static EXPLICIT_PLACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)place(\d+)\s*[:=]\s*(\d+)").expect("static pattern"));

/// Receives progress percentages while an answer is applied
pub trait Progress {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> Progress for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Progress sink that ignores everything
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100 + total / 2) / total).min(100) as u8
}

fn step(tree: &mut DomTree, progress: &mut dyn Progress, done: usize, total: usize) {
    let value = percent(done, total);
    tree.mark_step(value);
    progress.report(value);
}

/// How drag-drop tokens were paired with drop zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DragDropMode {
    /// `place<N>:<choice>` pairs
    Explicit,
    /// One token per zone
    Positional,
    /// Tokens consumed in order until tokens or zones run out
    Sequential,
}

/// One drop zone handled by the applier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceResult {
    pub place: u32,
    pub token: Option<String>,
    pub matched_by: MatchedBy,
    pub placement: Option<PlacementOutcome>,
}

/// One multi-part field handled by the applier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldResult {
    pub index: usize,
    pub value: String,
    pub matched_by: MatchedBy,
}

/// What applying an answer did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApplyOutcome {
    DragDrop {
        mode: DragDropMode,
        places: Vec<PlaceResult>,
        total_zones: usize,
    },
    MultiAnswer {
        fields: Vec<FieldResult>,
        total_fields: usize,
    },
    Choice {
        label: Option<String>,
        index: Option<usize>,
        matched_by: MatchedBy,
    },
}

impl ApplyOutcome {
    /// Fields, zones or options actually filled
    pub fn applied_count(&self) -> usize {
        match self {
            ApplyOutcome::DragDrop { places, .. } => places
                .iter()
                .filter(|p| p.placement.as_ref().is_some_and(PlacementOutcome::applied))
                .count(),
            ApplyOutcome::MultiAnswer { fields, .. } => fields.len(),
            ApplyOutcome::Choice { index, .. } => usize::from(index.is_some()),
        }
    }

    /// Place number to placed display text
    pub fn mapping(&self) -> IndexMap<String, String> {
        match self {
            ApplyOutcome::DragDrop { places, .. } => places
                .iter()
                .filter_map(|p| {
                    p.placement
                        .as_ref()
                        .map(|placement| (p.place.to_string(), placement.display_text.clone()))
                })
                .collect(),
            _ => IndexMap::new(),
        }
    }

    /// Status line for the user
    pub fn summary(&self) -> String {
        match self {
            ApplyOutcome::DragDrop { mode: DragDropMode::Explicit, .. } => {
                format!("Applied explicit mapping to hidden inputs ({} places)", self.applied_count())
            }
            ApplyOutcome::DragDrop { mode: DragDropMode::Positional, total_zones, .. } => {
                format!("Mapped tokens to drop zones: applied {}/{}", self.applied_count(), total_zones)
            }
            ApplyOutcome::DragDrop { mode: DragDropMode::Sequential, total_zones, .. } => {
                format!("Filled drop zones in order: applied {}/{}", self.applied_count(), total_zones)
            }
            ApplyOutcome::MultiAnswer { total_fields, .. } => {
                format!("Multi answers applied: {}/{}", self.applied_count(), total_fields)
            }
            ApplyOutcome::Choice { label, matched_by, .. } => match (label, matched_by) {
                (_, MatchedBy::None) => "No matching option found for multiple-choice".to_string(),
                (Some(label), rule) => format!("Selected option '{}' by {}", label, rule.as_str()),
                (None, rule) => format!("Selected option by {}", rule.as_str()),
            },
        }
    }
}

/// Apply pasted answer text to a question of the given type
pub fn apply(
    tree: &mut DomTree,
    question: NodeId,
    question_type: QuestionType,
    pasted: &str,
    progress: &mut dyn Progress,
) -> Result<ApplyOutcome> {
    let outcome = match question_type {
        QuestionType::Ddwtos => apply_drag_drop(tree, question, pasted, progress),
        QuestionType::MultiAnswer => apply_multi_answer(tree, question, pasted, progress),
        QuestionType::AnswersSelect => apply_choice(tree, question, pasted, progress),
        QuestionType::Unknown => Err(AutofillError::UnsupportedQuestionType),
    }?;
    info!("{}", outcome.summary());
    Ok(outcome)
}

/// `place<N>:<choice>` pairs in the text, later pairs overriding earlier ones
pub fn explicit_mapping(text: &str) -> BTreeMap<u32, String> {
    EXPLICIT_PLACE
        .captures_iter(text)
        .filter_map(|caps| {
            let place = caps[1].parse().ok()?;
            Some((place, caps[2].to_string()))
        })
        .collect()
}

/// Fill drop zones from pasted text
pub fn apply_drag_drop(
    tree: &mut DomTree,
    question: NodeId,
    pasted: &str,
    progress: &mut dyn Progress,
) -> Result<ApplyOutcome> {
    let zones = drop_zones(tree, question);
    if zones.is_empty() {
        return Err(AutofillError::ElementNotFound("No drop spans found in active question".to_string()));
    }
    let total = zones.len();

    let explicit = explicit_mapping(pasted);
    if !explicit.is_empty() {
        debug!("Explicit place mapping: {:?}", explicit);
        let mut places = Vec::new();
        let mut applied = 0;
        for zone in &zones {
            let Some(choice) = explicit.get(&zone.place) else {
                continue;
            };
            let placement = place_logged(tree, question, zone.place, choice);
            if placement.as_ref().is_some_and(PlacementOutcome::applied) {
                applied += 1;
            }
            places.push(PlaceResult {
                place: zone.place,
                token: Some(format!("place{}:{}", zone.place, choice)),
                matched_by: MatchedBy::Literal,
                placement,
            });
            step(tree, progress, applied, total);
        }
        return Ok(ApplyOutcome::DragDrop {
            mode: DragDropMode::Explicit,
            places,
            total_zones: total,
        });
    }

    let tokens = answer_tokens(pasted);
    if tokens.is_empty() {
        return Err(AutofillError::NoAnswerTokens("Paste text empty".to_string()));
    }

    let mode = if tokens.len() == total {
        DragDropMode::Positional
    } else {
        DragDropMode::Sequential
    };
    debug!("{} tokens for {} drop zones, {:?} mode", tokens.len(), total, mode);

    let choices = available_choices(tree, question);
    let mut places = Vec::new();
    for (i, (zone, token)) in zones.iter().zip(tokens.iter()).enumerate() {
        let resolution = resolve_choice(&choices, token);
        let placement = match &resolution.choice {
            Some(choice) => place_logged(tree, question, zone.place, choice),
            None => {
                warn!("No choice matches '{}' for place {}", token, zone.place);
                None
            }
        };
        places.push(PlaceResult {
            place: zone.place,
            token: Some(clean_text(token)),
            matched_by: resolution.matched_by,
            placement,
        });
        step(tree, progress, i + 1, total);
    }

    Ok(ApplyOutcome::DragDrop {
        mode,
        places,
        total_zones: total,
    })
}

fn place_logged(tree: &mut DomTree, question: NodeId, place: u32, choice: &str) -> Option<PlacementOutcome> {
    match place_choice(tree, question, place, choice) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!("Placing choice {} in place {} failed: {}", choice, place, e);
            None
        }
    }
}

/// Fill multi-part fields from `" || "`-separated text
pub fn apply_multi_answer(
    tree: &mut DomTree,
    question: NodeId,
    pasted: &str,
    progress: &mut dyn Progress,
) -> Result<ApplyOutcome> {
    let parts = split_parts(pasted);
    if parts.is_empty() {
        return Err(AutofillError::NoAnswerTokens(
            "No pieces detected (use \" || \" to separate)".to_string(),
        ));
    }

    let inputs = sub_answer_fields(tree, question);
    if inputs.is_empty() {
        return Err(AutofillError::ElementNotFound("No text inputs found in question".to_string()));
    }
    let total = inputs.len();

    let mut fields = Vec::new();
    for (i, (&input, part)) in inputs.iter().zip(parts.iter()).enumerate() {
        let matched_by = if tree.element(input).is_tag("select") {
            let matched_by = select_matching_option(tree, input, part);
            tree.dispatch(input, DomEvent::Change);
            matched_by
        } else {
            tree.set_value(input, part.as_str());
            tree.dispatch(input, DomEvent::Input);
            tree.dispatch(input, DomEvent::Change);
            MatchedBy::Value
        };
        fields.push(FieldResult {
            index: i,
            value: part.clone(),
            matched_by,
        });
        step(tree, progress, i + 1, total);
    }

    Ok(ApplyOutcome::MultiAnswer {
        fields,
        total_fields: total,
    })
}

/// Select the option whose text, then value, equals `wanted` ignoring case
fn select_matching_option(tree: &mut DomTree, select: NodeId, wanted: &str) -> MatchedBy {
    let wanted = wanted.to_lowercase();
    let options = tree.options(select);

    let by_text = options
        .iter()
        .copied()
        .find(|&o| clean_text(&tree.text_content(o)).to_lowercase() == wanted);
    let hit = by_text.map(|o| (o, MatchedBy::Exact)).or_else(|| {
        options
            .iter()
            .copied()
            .find(|&o| tree.option_value(o).to_lowercase() == wanted)
            .map(|o| (o, MatchedBy::Value))
    });

    match hit {
        Some((option, matched_by)) => {
            tree.select_option(select, option);
            matched_by
        }
        None => {
            warn!("No option matches '{}'", wanted);
            MatchedBy::None
        }
    }
}

/// Check the one option matching the pasted text
///
/// Tries exact label, label substring, 1-based position, then raw value. At most
/// one option is checked.
pub fn apply_choice(
    tree: &mut DomTree,
    question: NodeId,
    pasted: &str,
    progress: &mut dyn Progress,
) -> Result<ApplyOutcome> {
    let answer = clean_text(pasted);
    if answer.is_empty() {
        return Err(AutofillError::NoAnswerTokens("Paste text empty".to_string()));
    }

    let inputs = choice_inputs(tree, question);
    if inputs.is_empty() {
        return Err(AutofillError::ElementNotFound("No radio/checkbox inputs found".to_string()));
    }

    let labels: Vec<String> = inputs.iter().map(|&input| option_label(tree, question, input)).collect();

    let hit = find_text(&labels, &answer)
        .or_else(|| {
            is_numeric(&answer)
                .then(|| answer.parse::<usize>().ok())
                .flatten()
                .filter(|&n| n >= 1 && n <= inputs.len())
                .map(|n| (n - 1, MatchedBy::Index))
        })
        .or_else(|| {
            let wanted = answer.to_lowercase();
            inputs
                .iter()
                .position(|&input| tree.element(input).value.as_deref().unwrap_or("").to_lowercase() == wanted)
                .map(|i| (i, MatchedBy::Value))
        });

    let Some((index, matched_by)) = hit else {
        return Ok(ApplyOutcome::Choice {
            label: None,
            index: None,
            matched_by: MatchedBy::None,
        });
    };

    let input = inputs[index];
    tree.set_checked(input, true);
    tree.dispatch(input, DomEvent::Change);
    step(tree, progress, 1, 1);
    debug!("Checked option {} ('{}') by {:?}", index + 1, labels[index], matched_by);

    Ok(ApplyOutcome::Choice {
        label: Some(labels[index].clone()).filter(|l| !l.is_empty()),
        index: Some(index),
        matched_by,
    })
}
