use crate::dom::element::ElementNode;
use crate::dom::mutation::{DomEvent, Mutation};
use crate::error::{AutofillError, Result};
use crate::text::clean_text;

/// Attribute the snapshot script stamps on every live element
pub const NODE_KEY_ATTR: &str = "data-ttf-node";

/// Stable handle to a node in a [`DomTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    /// Node data; its `children` vector stays empty, structure lives in `children` below
    element: ElementNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    key: String,
}

/// Mutable DOM tree of a page snapshot
///
/// Reads go through predicate queries; every write is applied to the tree and
/// recorded in a journal so it can be replayed against the live page.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
    root: NodeId,
    journal: Vec<Mutation>,
}

impl DomTree {
    /// Build a tree from a snapshot root
    pub fn new(root: ElementNode) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            journal: Vec::new(),
        };
        tree.root = tree.insert_subtree(root, None, false);
        tree
    }

    /// Build a tree from the JSON produced by the snapshot script
    pub fn from_json(json: &str) -> Result<Self> {
        let mut root: ElementNode = serde_json::from_str(json)
            .map_err(|e| AutofillError::DomParseFailed(format!("Failed to parse DOM JSON: {}", e)))?;
        root.simplify();
        Ok(Self::new(root))
    }

    fn insert_subtree(&mut self, mut element: ElementNode, parent: Option<NodeId>, fresh: bool) -> NodeId {
        let children = std::mem::take(&mut element.children);
        let id = NodeId(self.nodes.len());

        let key = if fresh {
            let key = format!("new-{}", id.0);
            if !element.is_text() {
                element.add_attribute(NODE_KEY_ATTR, key.clone());
            }
            key
        } else {
            element
                .get_attribute(NODE_KEY_ATTR)
                .cloned()
                .unwrap_or_else(|| format!("n{}", id.0))
        };

        self.nodes.push(Node {
            element,
            parent,
            children: Vec::new(),
            key,
        });

        for child in children {
            let child_id = self.insert_subtree(child, Some(id), fresh);
            self.nodes[id.0].children.push(child_id);
        }

        id
    }

    /// Root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node data
    pub fn element(&self, id: NodeId) -> &ElementNode {
        &self.nodes[id.0].element
    }

    /// Parent node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Children in document order, text nodes included
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Key addressing the node in the live page
    pub fn node_key(&self, id: NodeId) -> &str {
        &self.nodes[id.0].key
    }

    /// Look a node up by its key
    pub fn find_by_key(&self, key: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.key == key).map(NodeId)
    }

    /// Whether `id` is still reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.closest_any(id) == self.root
    }

    fn closest_any(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
        }
        current
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id.0].children {
            if !self.nodes[child.0].element.is_text() {
                out.push(child);
            }
            self.collect_descendants(child, out);
        }
    }

    /// Element descendants of `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    /// All element descendants matching a predicate
    pub fn find_all<F>(&self, scope: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&ElementNode) -> bool,
    {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| predicate(self.element(id)))
            .collect()
    }

    /// First element descendant matching a predicate
    pub fn find_first<F>(&self, scope: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&ElementNode) -> bool,
    {
        self.descendants(scope)
            .into_iter()
            .find(|&id| predicate(self.element(id)))
    }

    /// Nearest element, starting at `id` itself, matching a predicate
    pub fn closest<F>(&self, id: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&ElementNode) -> bool,
    {
        let mut current = Some(id);
        while let Some(node) = current {
            let element = self.element(node);
            if !element.is_text() && predicate(element) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Whether `id` sits strictly inside `ancestor`
    pub fn is_inside(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Document-wide lookup by DOM id
    pub fn element_by_id(&self, dom_id: &str) -> Option<NodeId> {
        if self.element(self.root).id().map(String::as_str) == Some(dom_id) {
            return Some(self.root);
        }
        self.find_first(self.root, |e| e.id().map(String::as_str) == Some(dom_id))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        if let Some(text) = node.element.text_content.as_deref() {
            if node.element.is_text() {
                out.push_str(text);
            }
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    /// Option elements of a select
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.find_all(select, |e| e.is_tag("option"))
    }

    /// Selected option of a select; the first option when none is flagged
    pub fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let options = self.options(select);
        options
            .iter()
            .copied()
            .find(|&o| self.element(o).selected)
            .or_else(|| options.first().copied())
    }

    /// Submitted value of an option: its `value` attribute, else its text
    pub fn option_value(&self, option: NodeId) -> String {
        self.element(option)
            .get_attribute("value")
            .cloned()
            .unwrap_or_else(|| clean_text(&self.text_content(option)))
    }

    /// Rebuild the nested snapshot form of a subtree
    pub fn to_element(&self, id: NodeId) -> ElementNode {
        let node = &self.nodes[id.0];
        let mut element = node.element.clone();
        element.children = node.children.iter().map(|&c| self.to_element(c)).collect();
        element
    }

    /// Convert the DOM tree to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_element(self.root))
            .map_err(|e| AutofillError::DomParseFailed(format!("Failed to serialize DOM to JSON: {}", e)))
    }

    /// Count attached elements, root included
    pub fn count_elements(&self) -> usize {
        1 + self.descendants(self.root).len()
    }

    fn record(&mut self, mutation: Mutation) {
        self.journal.push(mutation);
    }

    fn key(&self, id: NodeId) -> String {
        self.nodes[id.0].key.clone()
    }

    /// Set the live value of a form control
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        let value = value.into();
        self.nodes[id.0].element.value = Some(value.clone());
        let node = self.key(id);
        self.record(Mutation::SetValue { node, value });
    }

    /// Set the checked state; checking a radio unchecks the rest of its group
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        let element = self.element(id);
        if checked && element.input_type().as_deref() == Some("radio") {
            if let Some(name) = element.name().cloned() {
                let group = self.find_all(self.root, |e| {
                    e.input_type().as_deref() == Some("radio") && e.name() == Some(&name)
                });
                for other in group {
                    self.nodes[other.0].element.checked = false;
                }
            }
        }
        self.nodes[id.0].element.checked = checked;
        let node = self.key(id);
        self.record(Mutation::SetChecked { node, checked });
    }

    /// Select one option of a select and update the select's value
    pub fn select_option(&mut self, select: NodeId, option: NodeId) {
        for other in self.options(select) {
            self.nodes[other.0].element.selected = other == option;
        }
        let value = self.option_value(option);
        self.set_value(select, value);
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        self.nodes[id.0].element.add_attribute(name, value.clone());
        let node = self.key(id);
        self.record(Mutation::SetAttribute {
            node,
            name: name.to_string(),
            value,
        });
    }

    /// Add a class if missing
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let element = &mut self.nodes[id.0].element;
        if element.has_class(class) {
            return;
        }
        let classes = match element.get_attribute("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        element.add_attribute("class", classes);
        let node = self.key(id);
        self.record(Mutation::AddClass {
            node,
            class: class.to_string(),
        });
    }

    /// Remove a class if present
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let element = &mut self.nodes[id.0].element;
        if !element.has_class(class) {
            return;
        }
        let classes = element
            .classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        element.add_attribute("class", classes);
        let node = self.key(id);
        self.record(Mutation::RemoveClass {
            node,
            class: class.to_string(),
        });
    }

    /// Show or hide an element
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes[id.0].element.is_visible = visible;
        let node = self.key(id);
        self.record(Mutation::SetVisible { node, visible });
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Remove a node from the tree
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        let node = self.key(id);
        self.record(Mutation::Remove { node });
    }

    /// Remove every child of a node
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
        let node = self.key(id);
        self.record(Mutation::ClearChildren { node });
    }

    fn element_keys(&self, id: NodeId) -> Vec<String> {
        std::iter::once(id)
            .chain(self.descendants(id))
            .map(|n| self.key(n))
            .collect()
    }

    fn strip_keys(element: &mut ElementNode) {
        element.attributes.remove(NODE_KEY_ATTR);
        for child in &mut element.children {
            Self::strip_keys(child);
        }
    }

    /// Deep-clone `source` as the last child of `parent`
    pub fn append_clone(&mut self, source: NodeId, parent: NodeId) -> NodeId {
        let mut copy = self.to_element(source);
        Self::strip_keys(&mut copy);
        let id = self.insert_subtree(copy, Some(parent), true);
        self.nodes[parent.0].children.push(id);

        let keys = self.element_keys(id);
        let source = self.key(source);
        let parent = self.key(parent);
        self.record(Mutation::AppendClone { source, parent, keys });
        id
    }

    /// Append a new element subtree as the last child of `parent`
    pub fn append_element(&mut self, parent: NodeId, element: ElementNode) -> NodeId {
        let id = self.insert_subtree(element, Some(parent), true);
        self.nodes[parent.0].children.push(id);

        let keys = self.element_keys(id);
        let mut element = self.to_element(id);
        Self::strip_keys(&mut element);
        let parent = self.key(parent);
        self.record(Mutation::AppendElement { parent, element, keys });
        id
    }

    /// Dispatch a synthetic event at an element
    pub fn dispatch(&mut self, id: NodeId, event: DomEvent) {
        let node = self.key(id);
        self.record(Mutation::Dispatch { node, event });
    }

    /// Record a step boundary for paced replay
    pub fn mark_step(&mut self, progress: u8) {
        self.record(Mutation::Step { progress });
    }

    /// Recorded mutations since the snapshot (or the last take)
    pub fn journal(&self) -> &[Mutation] {
        &self.journal
    }

    /// Drain the journal
    pub fn take_journal(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.journal)
    }

    /// Whether anything besides step markers was recorded
    pub fn has_changes(&self) -> bool {
        self.journal.iter().any(Mutation::is_effect)
    }

    /// Events dispatched at a node, in order
    pub fn dispatched(&self, id: NodeId) -> Vec<&DomEvent> {
        let key = self.node_key(id);
        self.journal
            .iter()
            .filter_map(|m| match m {
                Mutation::Dispatch { node, event } if node == key => Some(event),
                _ => None,
            })
            .collect()
    }
}
