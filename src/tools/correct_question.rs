use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the correct_question tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CorrectQuestionParams {
    /// Correct question number such as "Q30" or "30"
    #[serde(default)]
    pub question: Option<String>,

    /// Return to automatic detection instead
    #[serde(default)]
    pub clear: bool,
}

/// Manually set or clear the active question's number
#[derive(Default)]
pub struct CorrectQuestionTool;

impl Tool for CorrectQuestionTool {
    type Params = CorrectQuestionParams;

    fn name(&self) -> &str {
        "correct_question"
    }

    fn execute_typed(&self, params: CorrectQuestionParams, context: &mut ToolContext) -> Result<ToolResult> {
        let message = match (params.clear, params.question.as_deref()) {
            (true, _) | (false, None) => {
                context.session.clear_correction();
                "Manual question number cleared".to_string()
            }
            (false, Some(question)) => {
                let id = context.session.correct_question(question)?;
                format!("Question number set to {}", id)
            }
        };

        Ok(ToolResult::success_with(serde_json::json!({
            "message": message,
            "override": context.session.question_override().current(),
        })))
    }
}
