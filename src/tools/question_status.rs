use crate::error::Result;
use crate::quiz::classifier;
use crate::quiz::locator::locate_active_question;
use crate::quiz::page::detect_quiz_name;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the question_status tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct QuestionStatusParams {}

/// Report the active question, its number and whether a preset exists
#[derive(Default)]
pub struct QuestionStatusTool;

impl Tool for QuestionStatusTool {
    type Params = QuestionStatusParams;

    fn name(&self) -> &str {
        "question_status"
    }

    fn execute_typed(&self, _params: QuestionStatusParams, context: &mut ToolContext) -> Result<ToolResult> {
        let page = context.page_context()?;
        let repository = context.repository()?;
        context.restore_active_quiz(&repository)?;

        let tree = context.snapshot()?;
        let presets = repository.load_or_empty();
        let status = context.session.status(&tree, &presets);
        let question_type = locate_active_question(&tree).map(|question| classifier::question_type(&tree, question));

        Ok(ToolResult::success_with(serde_json::json!({
            "message": status.message(),
            "status": status,
            "question_type": question_type,
            "page_type": page.page_type,
            "page_quiz_name": detect_quiz_name(&tree),
            "active_quiz": context.session.active_quiz(),
        })))
    }
}
