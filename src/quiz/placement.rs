//! Drag-drop placement without dragging
//!
//! The hidden place input carries the graded answer. The drop zone gets a
//! visual copy of the choice so the page looks answered. Both the applier and
//! the inline overlay place choices through [`place_choice`].

use crate::dom::{DomEvent, DomTree, ElementNode, NodeId};
use crate::error::{AutofillError, Result};
use crate::quiz::matching::{choice_number, inside_drop_zone, is_draggable, is_drop_zone, place_number};
use crate::text::clean_text;
use log::{debug, warn};
use serde::Serialize;

/// Class added to placed copies and to the choices they came from
pub const PLACED_CLASS: &str = "ttf-placed";

/// What placing one choice did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementOutcome {
    pub place: u32,
    pub choice: String,
    pub display_text: String,
    pub hidden_input_set: bool,
    pub zone_updated: bool,
}

impl PlacementOutcome {
    /// Something on the page now carries the choice
    pub fn applied(&self) -> bool {
        self.hidden_input_set || self.zone_updated
    }
}

/// Hidden input holding the choice for a place
pub fn find_place_input(tree: &DomTree, question: NodeId, place: u32) -> Option<NodeId> {
    let place_class = format!("place{}", place);
    tree.find_first(question, |e| {
        e.is_tag("input") && e.has_class("placeinput") && e.has_class(&place_class)
    })
    .or_else(|| {
        let underscored = format!("place_{}", place);
        let name_marker = format!(":{}_", place);
        tree.find_first(question, |e| {
            if !e.is_tag("input") {
                return false;
            }
            let attr = |key: &str| e.get_attribute(key).map(String::as_str).unwrap_or("");
            let haystack = format!("{} {} {}", attr("class"), attr("name"), attr("id")).to_lowercase();
            haystack.contains(&place_class)
                || haystack.contains(&underscored)
                || attr("name").to_lowercase().contains(&name_marker)
        })
    })
}

/// Draggable choice with a given number, outside any drop zone
pub fn find_source_choice(tree: &DomTree, question: NodeId, choice: &str) -> Option<NodeId> {
    let is_choice = |node: NodeId| {
        let element = tree.element(node);
        element.has_class("draghome") && choice_number(element).as_deref() == Some(choice)
    };
    let candidates = tree.find_all(question, |e| e.has_class("draghome"));

    candidates
        .iter()
        .copied()
        .filter(|&node| is_choice(node) && !inside_drop_zone(tree, node, question))
        .find(|&node| is_draggable(tree.element(node)))
        .or_else(|| {
            candidates
                .iter()
                .copied()
                .find(|&node| is_choice(node) && !inside_drop_zone(tree, node, question))
        })
}

/// Drop zone for a place
pub fn find_drop_zone(tree: &DomTree, question: NodeId, place: u32) -> Option<NodeId> {
    tree.find_first(question, |e| is_drop_zone(e) && place_number(e) == Some(place))
}

/// Put choice `choice` into place `place`
///
/// Sets the hidden input and dispatches `change` on it, then swaps the zone's
/// visible content for a copy of the source choice, hides the source, and
/// fires `change`, `drop` and `ddwtos:drop` on the zone plus `change` on the
/// question. Fails only when neither the input nor the zone exists.
pub fn place_choice(tree: &mut DomTree, question: NodeId, place: u32, choice: &str) -> Result<PlacementOutcome> {
    let hidden_input = find_place_input(tree, question, place);
    if let Some(input) = hidden_input {
        tree.set_value(input, choice);
        tree.dispatch(input, DomEvent::Change);
    } else {
        warn!("Hidden place input not found for place {}", place);
    }

    let source = find_source_choice(tree, question, choice);
    let display_text = source
        .map(|node| clean_text(&tree.text_content(node)))
        .unwrap_or_else(|| choice.to_string());

    let Some(zone) = find_drop_zone(tree, question, place) else {
        warn!(
            "Drop zone not found for place {} (hidden input set: {})",
            place,
            hidden_input.is_some()
        );
        if hidden_input.is_none() {
            return Err(AutofillError::ElementNotFound(format!(
                "No hidden input or drop zone for place {}",
                place
            )));
        }
        return Ok(PlacementOutcome {
            place,
            choice: choice.to_string(),
            display_text,
            hidden_input_set: true,
            zone_updated: false,
        });
    };

    if let Some(existing) = tree.find_first(zone, is_draggable) {
        tree.remove(existing);
    }

    match source {
        Some(source) => {
            let placed = tree.append_clone(source, zone);
            tree.remove_class(placed, "dragplaceholder");
            tree.add_class(placed, PLACED_CLASS);
            tree.set_visible(placed, true);
            if tree.element(placed).get_attribute("data-choice").is_none() {
                tree.set_attribute(placed, "data-choice", choice);
            }
            tree.set_visible(source, false);
            tree.add_class(source, PLACED_CLASS);
        }
        None => {
            let placed = ElementNode::new("div")
                .with_attribute("class", format!("draghome {}", PLACED_CLASS))
                .with_attribute("data-choice", choice)
                .with_text(display_text.clone());
            tree.append_element(zone, placed);
        }
    }

    tree.dispatch(zone, DomEvent::Change);
    tree.dispatch(zone, DomEvent::Drop);
    tree.dispatch(
        zone,
        DomEvent::Custom {
            name: "ddwtos:drop".to_string(),
            detail: serde_json::json!({ "place": place, "choice": choice }),
        },
    );
    tree.dispatch(question, DomEvent::Change);

    debug!("Placed choice {} ('{}') in place {}", choice, display_text, place);
    Ok(PlacementOutcome {
        place,
        choice: choice.to_string(),
        display_text,
        hidden_input_set: hidden_input.is_some(),
        zone_updated: true,
    })
}
