use crate::dom::element::ElementNode;
use serde::{Deserialize, Serialize};

/// Synthetic event dispatched at an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomEvent {
    Input,
    Change,
    Drop,
    /// CustomEvent with a JSON detail payload
    Custom {
        name: String,
        detail: serde_json::Value,
    },
}

impl DomEvent {
    /// Event name as the page sees it
    pub fn name(&self) -> &str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::Drop => "drop",
            DomEvent::Custom { name, .. } => name,
        }
    }
}

/// One recorded change to the page, addressed by node key
///
/// Keys are the `data-ttf-node` markers the snapshot script stamps on live
/// elements, or freshly minted keys for nodes created by the engine. The
/// journal is replayed in order against the live page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    SetValue {
        node: String,
        value: String,
    },
    SetChecked {
        node: String,
        checked: bool,
    },
    SetAttribute {
        node: String,
        name: String,
        value: String,
    },
    AddClass {
        node: String,
        class: String,
    },
    RemoveClass {
        node: String,
        class: String,
    },
    SetVisible {
        node: String,
        visible: bool,
    },
    Remove {
        node: String,
    },
    ClearChildren {
        node: String,
    },
    /// Deep clone `source` into `parent`; `keys` label the clone's elements in preorder
    AppendClone {
        source: String,
        parent: String,
        keys: Vec<String>,
    },
    /// Build `element` under `parent`; `keys` label the new elements in preorder
    AppendElement {
        parent: String,
        element: ElementNode,
        keys: Vec<String>,
    },
    Dispatch {
        node: String,
        event: DomEvent,
    },
    /// Boundary between paced steps, carrying the progress percentage reached
    Step {
        progress: u8,
    },
}

impl Mutation {
    /// Key of the node the mutation targets, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Mutation::SetValue { node, .. }
            | Mutation::SetChecked { node, .. }
            | Mutation::SetAttribute { node, .. }
            | Mutation::AddClass { node, .. }
            | Mutation::RemoveClass { node, .. }
            | Mutation::SetVisible { node, .. }
            | Mutation::Remove { node }
            | Mutation::ClearChildren { node }
            | Mutation::Dispatch { node, .. } => Some(node),
            Mutation::AppendClone { parent, .. } | Mutation::AppendElement { parent, .. } => Some(parent),
            Mutation::Step { .. } => None,
        }
    }

    /// Whether this entry changes the page (steps and nothing else do not)
    pub fn is_effect(&self) -> bool {
        !matches!(self, Mutation::Step { .. })
    }
}
