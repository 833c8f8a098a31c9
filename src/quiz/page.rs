//! The page the engine works on
//!
//! [`QuizPage`] hides where the DOM comes from. The browser session snapshots a
//! live tab and replays journals into it; [`StaticPage`] keeps a parsed HTML
//! document in memory for saved pages and tests.

use crate::dom::{DomTree, Mutation, parse_document};
use crate::error::{AutofillError, Result};
use crate::text::{clean_collapsed, truncate_chars};
use log::debug;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Longest quiz name taken from a page
pub const MAX_QUIZ_NAME_CHARS: usize = 80;

/// Source of page snapshots and sink for their mutation journals
pub trait QuizPage: Send + Sync {
    /// Current page URL
    fn url(&self) -> Result<String>;

    /// Fresh DOM snapshot
    fn snapshot(&self) -> Result<DomTree>;

    /// Replay the tree's journal into the page, pausing `step_delay` at every
    /// step marker; returns the number of replayed mutations
    fn commit(&self, tree: &mut DomTree, step_delay: Duration) -> Result<usize>;

    /// Load another URL and wait for it
    fn navigate(&self, url: &str) -> Result<()> {
        Err(AutofillError::NavigationFailed(format!("Cannot open {} on this page", url)))
    }
}

/// In-memory page built from static HTML
pub struct StaticPage {
    url: String,
    tree: Mutex<DomTree>,
    committed: Mutex<Vec<Mutation>>,
}

impl StaticPage {
    /// Parse `html` as the document served at `url`
    pub fn new(url: impl Into<String>, html: &str) -> Self {
        Self {
            url: url.into(),
            tree: Mutex::new(parse_document(html)),
            committed: Mutex::new(Vec::new()),
        }
    }

    /// Every mutation committed so far, in order
    pub fn committed(&self) -> Result<Vec<Mutation>> {
        self.committed
            .lock()
            .map(|journal| journal.clone())
            .map_err(|e| AutofillError::Storage(format!("Page state poisoned: {}", e)))
    }

    /// Serialized page state after all commits
    pub fn to_json(&self) -> Result<String> {
        self.snapshot()?.to_json()
    }
}

impl QuizPage for StaticPage {
    fn url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    fn snapshot(&self) -> Result<DomTree> {
        self.tree
            .lock()
            .map(|tree| tree.clone())
            .map_err(|e| AutofillError::Storage(format!("Page state poisoned: {}", e)))
    }

    fn commit(&self, tree: &mut DomTree, _step_delay: Duration) -> Result<usize> {
        let journal = tree.take_journal();
        let count = journal.iter().filter(|m| m.is_effect()).count();

        let mut state = self
            .tree
            .lock()
            .map_err(|e| AutofillError::Storage(format!("Page state poisoned: {}", e)))?;
        *state = tree.clone();
        self.committed
            .lock()
            .map_err(|e| AutofillError::Storage(format!("Page state poisoned: {}", e)))?
            .extend(journal);

        debug!("Committed {} mutations to static page", count);
        Ok(count)
    }
}

/// Kind of quiz platform page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    /// Attempt page where answers are entered
    Quiz,
    /// Post-submission page showing the answers
    Review,
    Unknown,
}

/// What the URL says about the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContext {
    pub page_type: PageType,
    pub host: String,
    pub attempt_id: Option<String>,
    pub cmid: Option<String>,
    pub url: String,
}

impl PageContext {
    /// Parse a page URL
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| AutofillError::NavigationFailed(format!("Invalid URL {}: {}", url, e)))?;

        let page_type = if url.contains("/mod/quiz/attempt.php") {
            PageType::Quiz
        } else if url.contains("/mod/quiz/review.php") {
            PageType::Review
        } else {
            PageType::Unknown
        };

        let param = |key: &str| {
            parsed
                .query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        };

        Ok(Self {
            page_type,
            host: parsed.host_str().unwrap_or("local").to_string(),
            attempt_id: param("attempt"),
            cmid: param("cmid"),
            url: url.to_string(),
        })
    }
}

/// Quiz name shown in the page header, else the document title
///
/// The header is the first element in document order that is a
/// `.page-header-headings h1`, a `.page-header .page-title`, an
/// `h1.rui-main-content-title--h1` or any `h1`.
pub fn detect_quiz_name(tree: &DomTree) -> Option<String> {
    let root = tree.root();
    let header = tree.descendants(root).into_iter().find(|&node| {
        let element = tree.element(node);
        let within = |class: &str| {
            tree.parent(node)
                .and_then(|parent| tree.closest(parent, |e| e.has_class(class)))
                .is_some()
        };
        (element.is_tag("h1") && within("page-header-headings"))
            || (element.has_class("page-title") && within("page-header"))
            || (element.is_tag("h1") && element.has_class("rui-main-content-title--h1"))
            || element.is_tag("h1")
    });

    let normalize = |text: String| truncate_chars(&clean_collapsed(&text), MAX_QUIZ_NAME_CHARS);
    let from_header = header.map(|node| normalize(tree.text_content(node)));

    let name = from_header.filter(|name| !name.is_empty()).or_else(|| {
        tree.find_first(root, |e| e.is_tag("title"))
            .map(|title| normalize(tree.text_content(title)))
            .filter(|name| !name.is_empty())
    });
    debug!("Detected page quiz name: {:?}", name);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomEvent;

    #[test]
    fn test_page_context() {
        let context = PageContext::from_url("https://lms.example.edu/mod/quiz/review.php?attempt=123&cmid=45").unwrap();
        assert_eq!(context.page_type, PageType::Review);
        assert_eq!(context.host, "lms.example.edu");
        assert_eq!(context.attempt_id.as_deref(), Some("123"));
        assert_eq!(context.cmid.as_deref(), Some("45"));

        let quiz = PageContext::from_url("https://lms.example.edu/mod/quiz/attempt.php?attempt=9&page=2").unwrap();
        assert_eq!(quiz.page_type, PageType::Quiz);
        assert_eq!(quiz.cmid, None);

        let other = PageContext::from_url("https://lms.example.edu/course/view.php?id=2").unwrap();
        assert_eq!(other.page_type, PageType::Unknown);

        assert!(PageContext::from_url("not a url").is_err());
    }

    #[test]
    fn test_quiz_name_from_header() {
        let tree = parse_document(
            r#"<html><head><title>Ignored</title></head><body>
               <div class="page-header-headings"><h1>  Ethics&nbsp;Week   3 </h1></div>
               </body></html>"#,
        );
        assert_eq!(detect_quiz_name(&tree).as_deref(), Some("Ethics Week 3"));
    }

    #[test]
    fn test_quiz_name_page_title_class() {
        let tree = parse_document(
            r#"<div class="page-header"><div class="page-title">Final exam</div></div><h1>Later heading</h1>"#,
        );
        assert_eq!(detect_quiz_name(&tree).as_deref(), Some("Final exam"));
    }

    #[test]
    fn test_quiz_name_falls_back_to_title() {
        let long = "x".repeat(120);
        let tree = parse_document(&format!("<html><head><title>{}</title></head><body></body></html>", long));
        assert_eq!(detect_quiz_name(&tree).map(|n| n.chars().count()), Some(MAX_QUIZ_NAME_CHARS));

        let empty = parse_document("<html><head></head><body><p>nothing</p></body></html>");
        assert_eq!(detect_quiz_name(&empty), None);
    }

    #[test]
    fn test_static_page_commit() {
        let page = StaticPage::new("https://lms.example.edu/mod/quiz/attempt.php", r#"<input id="a" value="">"#);
        let mut tree = page.snapshot().unwrap();
        let input = tree.element_by_id("a").unwrap();
        tree.set_value(input, "hello");
        tree.dispatch(input, DomEvent::Input);
        tree.mark_step(100);

        assert_eq!(page.commit(&mut tree, Duration::ZERO).unwrap(), 2);
        assert!(tree.journal().is_empty());
        assert_eq!(page.committed().unwrap().len(), 3);

        let again = page.snapshot().unwrap();
        let input = again.element_by_id("a").unwrap();
        assert_eq!(again.element(input).value.as_deref(), Some("hello"));
    }
}
