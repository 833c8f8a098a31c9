use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the auto_load tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AutoLoadParams {}

/// Look up the stored answer text for the active question
#[derive(Default)]
pub struct AutoLoadTool;

impl Tool for AutoLoadTool {
    type Params = AutoLoadParams;

    fn name(&self) -> &str {
        "auto_load"
    }

    fn execute_typed(&self, _params: AutoLoadParams, context: &mut ToolContext) -> Result<ToolResult> {
        let repository = context.repository()?;
        context.restore_active_quiz(&repository)?;

        let tree = context.snapshot()?;
        let presets = repository.load_or_empty();
        let loaded = context.session.auto_load(&tree, &presets)?;
        context.persist_active_quiz(&repository)?;

        Ok(ToolResult::success_with(serde_json::json!({
            "message": format!("Loaded {} from \"{}\"", loaded.question, loaded.quiz),
            "quiz": loaded.quiz,
            "question": loaded.question,
            "question_type": loaded.question_type,
            "text": loaded.text,
        })))
    }
}
