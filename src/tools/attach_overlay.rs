use crate::error::Result;
use crate::quiz::overlay::{attach_overlay, inline_zones};
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the attach_overlay tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AttachOverlayParams {}

/// Put a type-to-fill input into every drag-drop zone on the page
#[derive(Default)]
pub struct AttachOverlayTool;

impl Tool for AttachOverlayTool {
    type Params = AttachOverlayParams;

    fn name(&self) -> &str {
        "attach_overlay"
    }

    fn execute_typed(&self, _params: AttachOverlayParams, context: &mut ToolContext) -> Result<ToolResult> {
        let mut tree = context.snapshot()?;
        let attached = attach_overlay(&mut tree);
        context.commit(&mut tree)?;

        let places: Vec<Option<u32>> = attached.iter().map(|zone| zone.place).collect();
        Ok(ToolResult::success_with(serde_json::json!({
            "attached": attached.len(),
            "total": inline_zones(&tree).len(),
            "places": places,
        })))
    }
}
