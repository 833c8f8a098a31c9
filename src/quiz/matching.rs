//! Matching pasted or typed text against what a question offers
//!
//! Every lookup reports which rule fired through [`MatchedBy`], so callers and
//! tests can tell an exact hit from a substring guess or a numeric fallback.

use crate::dom::{DomTree, ElementNode, NodeId};
use crate::text::{clean_text, is_numeric};
use log::debug;
use serde::Serialize;

/// Rule that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    /// Case-insensitive equality with the display text
    Exact,
    /// Display text contains the token
    Substring,
    /// Token read as a 1-based option position
    Index,
    /// Token equals the raw control value
    Value,
    /// Token read as a choice number
    Literal,
    None,
}

impl MatchedBy {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchedBy::Exact => "exact",
            MatchedBy::Substring => "substring",
            MatchedBy::Index => "index",
            MatchedBy::Value => "value",
            MatchedBy::Literal => "literal",
            MatchedBy::None => "none",
        }
    }

    pub fn is_match(self) -> bool {
        self != MatchedBy::None
    }
}

/// Find a candidate by exact case-insensitive text, then by substring
///
/// Returns the position of the first hit. Empty candidates and an empty needle
/// never match.
pub fn find_text<S: AsRef<str>>(candidates: &[S], needle: &str) -> Option<(usize, MatchedBy)> {
    let needle = clean_text(needle).to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let lowered: Vec<String> = candidates.iter().map(|c| c.as_ref().to_lowercase()).collect();

    lowered
        .iter()
        .position(|c| !c.is_empty() && *c == needle)
        .map(|i| (i, MatchedBy::Exact))
        .or_else(|| {
            lowered
                .iter()
                .position(|c| !c.is_empty() && c.contains(&needle))
                .map(|i| (i, MatchedBy::Substring))
        })
}

/// Number of a place from a `place<N>` class
pub fn place_number(element: &ElementNode) -> Option<u32> {
    numbered_class(element, "place")
}

/// Number of a draggable choice from its `choice<N>` class, else `data-choice`
pub fn choice_number(element: &ElementNode) -> Option<String> {
    numbered_class(element, "choice")
        .map(|n| n.to_string())
        .or_else(|| element.get_attribute("data-choice").cloned().filter(|c| is_numeric(c)))
}

fn numbered_class(element: &ElementNode, prefix: &str) -> Option<u32> {
    element
        .classes()
        .filter_map(|class| class.strip_prefix(prefix))
        .find(|rest| is_numeric(rest))
        .and_then(|digits| digits.parse().ok())
}

/// `span.drop`
pub fn is_drop_zone(element: &ElementNode) -> bool {
    element.is_tag("span") && element.has_class("drop")
}

/// Draggable choice, placeholder copies excluded
pub fn is_draggable(element: &ElementNode) -> bool {
    element.has_class("draghome") && !element.has_class("dragplaceholder")
}

/// Whether a node sits inside a drop zone of the question
pub fn inside_drop_zone(tree: &DomTree, node: NodeId, question: NodeId) -> bool {
    tree.parent(node)
        .and_then(|parent| tree.closest(parent, is_drop_zone))
        .is_some_and(|zone| tree.is_inside(zone, question))
}

/// A drop zone and its place number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropZone {
    pub node: NodeId,
    pub place: u32,
}

/// Numbered drop zones of a question, ascending by place
pub fn drop_zones(tree: &DomTree, question: NodeId) -> Vec<DropZone> {
    let mut zones: Vec<DropZone> = tree
        .find_all(question, is_drop_zone)
        .into_iter()
        .filter_map(|node| place_number(tree.element(node)).map(|place| DropZone { node, place }))
        .collect();
    zones.sort_by_key(|zone| zone.place);
    zones
}

/// A draggable choice still available in the choice pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub node: NodeId,
    pub number: String,
    pub text: String,
}

/// Numbered choices outside any drop zone, deduplicated by case-insensitive text
///
/// The first choice with a given text wins.
pub fn available_choices(tree: &DomTree, question: NodeId) -> Vec<Choice> {
    let mut choices: Vec<Choice> = Vec::new();
    for node in tree.find_all(question, is_draggable) {
        if inside_drop_zone(tree, node, question) {
            continue;
        }
        let Some(number) = choice_number(tree.element(node)) else {
            continue;
        };
        let text = clean_text(&tree.text_content(node));
        if choices.iter().any(|c| c.text.to_lowercase() == text.to_lowercase()) {
            continue;
        }
        choices.push(Choice { node, number, text });
    }
    choices
}

/// Outcome of resolving a token to a choice number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceResolution {
    pub choice: Option<String>,
    pub matched_by: MatchedBy,
}

/// Resolve a token: exact text, then substring, then a numeric literal
pub fn resolve_choice(choices: &[Choice], token: &str) -> ChoiceResolution {
    let texts: Vec<&str> = choices.iter().map(|c| c.text.as_str()).collect();
    let token = clean_text(token);

    let resolution = match find_text(&texts, &token) {
        Some((index, matched_by)) => ChoiceResolution {
            choice: Some(choices[index].number.clone()),
            matched_by,
        },
        None if is_numeric(&token) => ChoiceResolution {
            choice: Some(token.clone()),
            matched_by: MatchedBy::Literal,
        },
        None => ChoiceResolution {
            choice: None,
            matched_by: MatchedBy::None,
        },
    };
    debug!("Token '{}' resolved to choice {:?} by {:?}", token, resolution.choice, resolution.matched_by);
    resolution
}
