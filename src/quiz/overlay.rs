//! Type-to-fill inputs over drop zones
//!
//! Each drop zone of a drag-drop question gets a small text input. Confirming
//! typed text resolves it to a choice and places it with the same routine the
//! applier uses.

use crate::dom::{DomTree, ElementNode, NodeId};
use crate::error::{AutofillError, Result};
use crate::quiz::locator::QUESTION_CLASS;
use crate::quiz::matching::{ChoiceResolution, MatchedBy, available_choices, is_drop_zone, place_number, resolve_choice};
use crate::quiz::model::QuestionType;
use crate::quiz::placement::{PlacementOutcome, place_choice};
use crate::text::clean_text;
use log::{debug, info};
use serde::Serialize;

/// Marker attribute set on instrumented zones
pub const ATTACHED_ATTR: &str = "data-ttf-attached";

/// Class of the inline input
pub const INLINE_INPUT_CLASS: &str = "ttf-inline";

/// A drop zone carrying an inline input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineZone {
    pub question: NodeId,
    pub zone: NodeId,
    pub place: Option<u32>,
    pub input: Option<NodeId>,
}

fn is_drag_drop_question(element: &ElementNode) -> bool {
    element.has_class(QUESTION_CLASS) && element.has_class(QuestionType::Ddwtos.as_str())
}

fn is_attached(element: &ElementNode) -> bool {
    element.get_attribute(ATTACHED_ATTR).map(String::as_str) == Some("1")
}

/// Attach inputs to every drop zone not yet instrumented; returns the new ones
pub fn attach_overlay(tree: &mut DomTree) -> Vec<InlineZone> {
    let mut attached = Vec::new();

    for question in tree.find_all(tree.root(), is_drag_drop_question) {
        for zone in tree.find_all(question, is_drop_zone) {
            if is_attached(tree.element(zone)) {
                continue;
            }
            tree.clear_children(zone);
            let input = tree.append_element(
                zone,
                ElementNode::new("input")
                    .with_attribute("type", "text")
                    .with_attribute("class", INLINE_INPUT_CLASS)
                    .with_value(""),
            );
            tree.set_attribute(zone, ATTACHED_ATTR, "1");

            attached.push(InlineZone {
                question,
                zone,
                place: place_number(tree.element(zone)),
                input: Some(input),
            });
        }
    }

    if !attached.is_empty() {
        info!("Attached inline inputs to {} drop zones", attached.len());
    }
    attached
}

/// Every instrumented drop zone on the page
pub fn inline_zones(tree: &DomTree) -> Vec<InlineZone> {
    tree.find_all(tree.root(), is_drag_drop_question)
        .into_iter()
        .flat_map(|question| {
            tree.find_all(question, |e| is_drop_zone(e) && is_attached(e))
                .into_iter()
                .map(move |zone| InlineZone {
                    question,
                    zone,
                    place: place_number(tree.element(zone)),
                    input: tree.find_first(zone, |e| e.has_class(INLINE_INPUT_CLASS)),
                })
        })
        .collect()
}

/// Keys that confirm typed text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmKey {
    Enter,
    Tab,
    Space,
}

impl ConfirmKey {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Enter" => Some(ConfirmKey::Enter),
            "Tab" => Some(ConfirmKey::Tab),
            " " | "Space" | "Spacebar" => Some(ConfirmKey::Space),
            _ => None,
        }
    }
}

/// Result of confirming typed text in one zone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneFill {
    pub place: u32,
    pub typed: String,
    pub matched_by: MatchedBy,
    pub placement: Option<PlacementOutcome>,
}

/// Resolve typed text in a zone and place the matching choice
///
/// Empty text does nothing. The inline input is cleared after an attempt.
pub fn confirm_zone_input(tree: &mut DomTree, zone: NodeId, typed: &str) -> Result<Option<ZoneFill>> {
    let typed = clean_text(typed);
    if typed.is_empty() {
        return Ok(None);
    }

    let question = tree
        .closest(zone, is_drag_drop_question)
        .or_else(|| tree.closest(zone, |e| e.has_class(QUESTION_CLASS)))
        .ok_or_else(|| AutofillError::ElementNotFound("question around drop zone".to_string()))?;
    let place = place_number(tree.element(zone))
        .ok_or_else(|| AutofillError::ElementNotFound("place number of drop zone".to_string()))?;

    let choices = available_choices(tree, question);
    let ChoiceResolution { choice, matched_by } = resolve_choice(&choices, &typed);

    let placement = match choice {
        Some(choice) => Some(place_choice(tree, question, place, &choice)?),
        None => {
            debug!("No choice matches typed text '{}' for place {}", typed, place);
            None
        }
    };

    if let Some(input) = tree.find_first(zone, |e| e.has_class(INLINE_INPUT_CLASS)) {
        tree.set_value(input, "");
    }

    Ok(Some(ZoneFill {
        place,
        typed,
        matched_by,
        placement,
    }))
}

/// Handle a key press in a zone's inline input
pub fn handle_key(tree: &mut DomTree, zone: NodeId, key: &str, typed: &str) -> Result<Option<ZoneFill>> {
    match ConfirmKey::from_key(key) {
        Some(_) => confirm_zone_input(tree, zone, typed),
        None => Ok(None),
    }
}
