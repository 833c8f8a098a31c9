use crate::error::Result;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the save_answer tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SaveAnswerParams {
    /// Question number such as "Q12" or "12"
    pub question: String,

    /// Answer text in paste-box format
    pub text: String,

    /// Quiz to save into (default: the active quiz)
    #[serde(default)]
    pub quiz: Option<String>,
}

/// Store hand-entered answer text for one question
#[derive(Default)]
pub struct SaveAnswerTool;

impl Tool for SaveAnswerTool {
    type Params = SaveAnswerParams;

    fn name(&self) -> &str {
        "save_answer"
    }

    fn execute_typed(&self, params: SaveAnswerParams, context: &mut ToolContext) -> Result<ToolResult> {
        let repository = context.repository()?;
        context.restore_active_quiz(&repository)?;
        let now = context.now();

        let session = &mut *context.session;
        let (quiz, question) = repository.update(|presets| {
            session.save_manual(presets, params.quiz.as_deref(), &params.question, &params.text, now)
        })?;
        context.persist_active_quiz(&repository)?;

        Ok(ToolResult::success_with(serde_json::json!({
            "message": format!("Saved {} in \"{}\"", question, quiz),
            "quiz": quiz,
            "question": question,
        })))
    }
}
