//! Static HTML to DOM tree conversion
//!
//! Used for saved pages and fixtures. Live form state is derived from markup
//! the way a freshly loaded page would expose it.

use crate::dom::element::ElementNode;
use crate::dom::tree::DomTree;
use scraper::{ElementRef, Html, Node};

/// Parse an HTML document into a snapshot root
pub fn parse_html(html: &str) -> ElementNode {
    let document = Html::parse_document(html);
    let mut root = convert_element(document.root_element());
    root.simplify();
    apply_form_state(&mut root);
    root
}

/// Parse an HTML document into a [`DomTree`]
pub fn parse_document(html: &str) -> DomTree {
    DomTree::new(parse_html(html))
}

fn convert_element(element: ElementRef<'_>) -> ElementNode {
    let value = element.value();
    let mut node = ElementNode::new(value.name());

    for (key, attr) in value.attrs() {
        node.add_attribute(key, attr);
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => node.add_child(ElementNode::text(&*text.text)),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    node.add_child(convert_element(child_element));
                }
            }
            _ => {}
        }
    }

    node
}

fn is_hidden_by_markup(node: &ElementNode) -> bool {
    if node.get_attribute("hidden").is_some() {
        return true;
    }
    node.get_attribute("style")
        .map(|style| {
            let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
            let compact = compact.to_ascii_lowercase();
            compact.contains("display:none") || compact.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

fn subtree_text(node: &ElementNode) -> String {
    if node.is_text() {
        return node.text_content.clone().unwrap_or_default();
    }
    node.children.iter().map(subtree_text).collect()
}

fn apply_form_state(node: &mut ElementNode) {
    node.is_visible = !is_hidden_by_markup(node);

    if node.is_tag("input") {
        node.value = Some(node.get_attribute("value").cloned().unwrap_or_default());
        node.checked = node.get_attribute("checked").is_some();
    } else if node.is_tag("textarea") {
        node.value = Some(subtree_text(node));
    } else if node.is_tag("option") {
        node.selected = node.get_attribute("selected").is_some();
    }

    for child in &mut node.children {
        apply_form_state(child);
    }

    if node.is_tag("select") {
        let options: Vec<&ElementNode> = collect_options(node);
        let chosen = options
            .iter()
            .find(|o| o.selected)
            .or_else(|| options.first())
            .map(|o| {
                o.get_attribute("value")
                    .cloned()
                    .unwrap_or_else(|| subtree_text(o).trim().to_string())
            });
        node.value = chosen;
    }
}

fn collect_options(node: &ElementNode) -> Vec<&ElementNode> {
    let mut out = Vec::new();
    for child in &node.children {
        if child.is_tag("option") {
            out.push(child);
        } else if child.is_tag("optgroup") {
            out.extend(collect_options(child));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structure() {
        let tree = parse_document(
            r#"<html><head><title>Quiz</title><script>var x = 1;</script></head>
            <body><div class="que multianswer" id="question-9-2"><span class="qno">2</span></div></body></html>"#,
        );

        let question = tree.find_first(tree.root(), |e| e.has_class("que")).unwrap();
        assert_eq!(tree.element(question).id().map(String::as_str), Some("question-9-2"));
        assert!(tree.find_first(tree.root(), |e| e.is_tag("script")).is_none());

        let title = tree.find_first(tree.root(), |e| e.is_tag("title")).unwrap();
        assert_eq!(tree.text_content(title), "Quiz");
    }

    #[test]
    fn test_form_state_from_markup() {
        let tree = parse_document(
            r#"<body>
            <input type="text" id="t" value="paris">
            <input type="radio" id="r" checked>
            <textarea id="ta">long answer</textarea>
            <select id="s"><option value="a">A</option><option value="b" selected>B</option></select>
            <span id="h" style="display: none">gone</span>
            </body>"#,
        );

        let value_of = |id: &str| tree.element(tree.element_by_id(id).unwrap()).value.clone();
        assert_eq!(value_of("t").as_deref(), Some("paris"));
        assert_eq!(value_of("ta").as_deref(), Some("long answer"));
        assert_eq!(value_of("s").as_deref(), Some("b"));
        assert!(tree.element(tree.element_by_id("r").unwrap()).checked);
        assert!(!tree.element(tree.element_by_id("h").unwrap()).is_visible);
    }

    #[test]
    fn test_select_defaults_to_first_option() {
        let tree = parse_document(r#"<select id="s"><option>First</option><option>Second</option></select>"#);
        let select = tree.element_by_id("s").unwrap();
        assert_eq!(tree.element(select).value.as_deref(), Some("First"));
    }
}
