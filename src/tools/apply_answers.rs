use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the apply_answers tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ApplyAnswersParams {
    /// Answer text as pasted by the user; when blank the stored preset is loaded
    #[serde(default)]
    pub text: Option<String>,
}

/// Fill the active question from answer text
#[derive(Default)]
pub struct ApplyAnswersTool;

impl Tool for ApplyAnswersTool {
    type Params = ApplyAnswersParams;

    fn name(&self) -> &str {
        "apply_answers"
    }

    fn execute_typed(&self, params: ApplyAnswersParams, context: &mut ToolContext) -> Result<ToolResult> {
        let repository = context.repository()?;
        context.restore_active_quiz(&repository)?;

        let mut tree = context.snapshot()?;
        let presets = repository.load_or_empty();
        let text = params.text.unwrap_or_default();

        let mut progress_steps = Vec::new();
        let mut progress = |percent: u8| progress_steps.push(percent);
        let applied = context.session.apply(&mut tree, &presets, &text, &mut progress)?;

        let replayed = context.commit(&mut tree)?;
        if applied.loaded.is_some() {
            context.persist_active_quiz(&repository)?;
        }

        let summary = applied.outcome.summary();
        let data = serde_json::json!({
            "message": summary,
            "question_type": applied.question_type,
            "loaded": applied.loaded,
            "outcome": applied.outcome,
            "mapping": applied.outcome.mapping(),
            "progress": progress_steps,
            "replayed": replayed,
        });

        if applied.outcome.applied_count() == 0 {
            return Ok(ToolResult::failure_with(summary, data));
        }
        Ok(ToolResult::success_with(data))
    }
}
