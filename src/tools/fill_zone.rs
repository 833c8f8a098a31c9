use crate::dom::NodeId;
use crate::error::{AutofillError, Result};
use crate::quiz::locator::locate_active_question;
use crate::quiz::overlay::{ConfirmKey, InlineZone, attach_overlay, confirm_zone_input, inline_zones};
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the fill_zone tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FillZoneParams {
    /// Place number of the drop zone
    pub place: u32,

    /// Text typed into the zone: a choice number or (part of) its text
    pub text: String,

    /// Key that confirms the text (default: Enter)
    #[serde(default)]
    pub key: Option<String>,
}

/// Type into one drop zone's inline input and confirm it
#[derive(Default)]
pub struct FillZoneTool;

fn pick_zone(zones: &[InlineZone], active: Option<NodeId>, place: u32) -> Option<InlineZone> {
    let in_question = |question: NodeId| {
        zones
            .iter()
            .find(|zone| zone.question == question && zone.place == Some(place))
            .copied()
    };
    active
        .and_then(in_question)
        .or_else(|| zones.iter().find(|zone| zone.place == Some(place)).copied())
}

impl Tool for FillZoneTool {
    type Params = FillZoneParams;

    fn name(&self) -> &str {
        "fill_zone"
    }

    fn execute_typed(&self, params: FillZoneParams, context: &mut ToolContext) -> Result<ToolResult> {
        let key = params.key.as_deref().unwrap_or("Enter");
        if ConfirmKey::from_key(key).is_none() {
            return Ok(ToolResult::failure(format!("'{}' does not confirm typed text", key)));
        }

        let mut tree = context.snapshot()?;
        attach_overlay(&mut tree);

        let zone = pick_zone(&inline_zones(&tree), locate_active_question(&tree), params.place)
            .ok_or_else(|| AutofillError::ElementNotFound(format!("drop zone for place {}", params.place)))?;

        let fill = confirm_zone_input(&mut tree, zone.zone, &params.text)?;
        context.commit(&mut tree)?;

        let Some(fill) = fill else {
            return Ok(ToolResult::failure("Nothing typed"));
        };
        let data = serde_json::to_value(&fill)?;
        if fill.placement.is_none() {
            return Ok(ToolResult::failure_with(
                format!("No choice matches '{}' for place {}", fill.typed, fill.place),
                data,
            ));
        }
        Ok(ToolResult::success_with(data))
    }
}

#[cfg(test)]
mod tests {
    use crate::quiz::page::QuizPage;
    use crate::quiz::placement::find_place_input;
    use crate::tools::test_support::*;
    use serde_json::json;

    const PAGE: &str = r#"
        <div class="que ddwtos correct">
          <span class="drop place1"></span>
          <span class="draghome choice1">sun</span>
          <input type="hidden" class="placeinput place1" value="">
        </div>
        <div class="que ddwtos notyetanswered">
          <span class="drop place1"></span><span class="drop place2"></span>
          <span class="draghome choice1">cat</span>
          <span class="draghome choice2">mat</span>
          <input type="hidden" class="placeinput place1" value="">
          <input type="hidden" class="placeinput place2" value="">
        </div>"#;

    #[test]
    fn test_fill_in_active_question() {
        let mut harness = Harness::new(ATTEMPT_URL, PAGE);
        let result = harness.run("fill_zone", json!({"place": 2, "text": "ma", "key": "Tab"}));
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.data.unwrap()["placement"]["display_text"], "mat");

        let tree = harness.page.snapshot().unwrap();
        let questions = tree.find_all(tree.root(), |e| e.has_class("que"));
        let input = find_place_input(&tree, questions[1], 2).unwrap();
        assert_eq!(tree.element(input).value.as_deref(), Some("2"));
        let untouched = find_place_input(&tree, questions[0], 1).unwrap();
        assert_eq!(tree.element(untouched).value.as_deref(), Some(""));
    }

    #[test]
    fn test_fill_failures() {
        let mut harness = Harness::new(ATTEMPT_URL, PAGE);
        let unmatched = harness.run("fill_zone", json!({"place": 1, "text": "dog"}));
        assert_eq!(unmatched.error.as_deref(), Some("No choice matches 'dog' for place 1"));

        let bad_key = harness.run("fill_zone", json!({"place": 1, "text": "cat", "key": "x"}));
        assert!(!bad_key.success);

        let no_zone = harness.run("fill_zone", json!({"place": 7, "text": "cat"}));
        assert_eq!(no_zone.error.as_deref(), Some("Element not found: drop zone for place 7"));
    }
}
