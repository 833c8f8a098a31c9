use quiz_autofill::quiz::{QuizPage, QuizSession};
use quiz_autofill::store::MemoryStore;
use quiz_autofill::tools::{ToolContext, ToolRegistry};
use quiz_autofill::{AutofillConfig, BrowserSession, LaunchOptions};
use serde_json::json;
use std::time::Duration;

const DRAG_PAGE: &str = r#"<html><body>
<div class="que ddwtos notyetanswered" id="question-4-2">
  <span class="drop place1"></span><span class="drop place2"></span>
  <span class="draghome choice1">cat</span><span class="draghome choice2">mat</span>
  <input type="hidden" class="placeinput place1" id="p1" value="">
  <input type="hidden" class="placeinput place2" id="p2" value="">
</div>
</body></html>"#;

fn data_url(html: &str) -> String {
    format!("data:text/html,{}", urlencoding::encode(html))
}

fn open(html: &str) -> BrowserSession {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    QuizPage::navigate(&session, &data_url(html)).expect("Failed to navigate");
    session
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_snapshot_keys_every_element() {
    let session = open(DRAG_PAGE);
    let tree = session.snapshot().expect("Failed to snapshot");

    let zones = tree.find_all(tree.root(), |e| e.has_class("drop"));
    assert_eq!(zones.len(), 2);
    for zone in zones {
        assert!(tree.node_key(zone).starts_with('n'));
    }
}

#[test]
#[ignore]
fn test_apply_replays_into_page() {
    let session = open(DRAG_PAGE);
    let store = MemoryStore::new();
    let config = AutofillConfig::new().step_delay(Duration::from_millis(1));
    let registry = ToolRegistry::with_defaults();
    let mut quiz_session = QuizSession::new();
    let mut context = ToolContext::new(&session, &mut quiz_session, &store, &config);

    let result = registry
        .execute("apply_answers", json!({"text": "mat cat"}), &mut context)
        .unwrap();
    assert!(result.success, "{:?}", result.error);

    let values = session
        .tab()
        .unwrap()
        .evaluate("document.getElementById('p1').value + ',' + document.getElementById('p2').value", false)
        .unwrap()
        .value
        .unwrap();
    assert_eq!(values, json!("2,1"));

    // The placed copies are visible in the zones after a fresh snapshot
    let tree = session.snapshot().unwrap();
    let placed = tree.find_all(tree.root(), |e| e.has_class("ttf-placed") && e.has_class("choice2"));
    assert!(!placed.is_empty());
}

#[test]
#[ignore]
fn test_overlay_survives_resnapshot() {
    let session = open(DRAG_PAGE);
    let store = MemoryStore::new();
    let config = AutofillConfig::new().step_delay(Duration::ZERO);
    let registry = ToolRegistry::with_defaults();
    let mut quiz_session = QuizSession::new();
    let mut context = ToolContext::new(&session, &mut quiz_session, &store, &config);

    let attached = registry.execute("attach_overlay", json!({}), &mut context).unwrap();
    assert_eq!(attached.data.unwrap()["attached"], 2);

    let filled = registry
        .execute("fill_zone", json!({"place": 1, "text": "cat"}), &mut context)
        .unwrap();
    assert!(filled.success, "{:?}", filled.error);

    let again = registry.execute("attach_overlay", json!({}), &mut context).unwrap();
    assert_eq!(again.data.unwrap()["attached"], 0);
}
