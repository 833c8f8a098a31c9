use crate::error::{AutofillError, Result};
use crate::quiz::model::{DeleteOutcome, QuestionId};
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the delete_preset tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DeletePresetParams {
    /// Quiz to delete from (default: the active quiz)
    #[serde(default)]
    pub quiz: Option<String>,

    /// Single question to delete; without it the whole quiz goes
    #[serde(default)]
    pub question: Option<String>,
}

/// Delete one stored answer or a whole quiz
#[derive(Default)]
pub struct DeletePresetTool;

impl Tool for DeletePresetTool {
    type Params = DeletePresetParams;

    fn name(&self) -> &str {
        "delete_preset"
    }

    fn execute_typed(&self, params: DeletePresetParams, context: &mut ToolContext) -> Result<ToolResult> {
        let repository = context.repository()?;
        context.restore_active_quiz(&repository)?;

        let quiz = params
            .quiz
            .or_else(|| context.session.active_quiz().map(str::to_string))
            .ok_or(AutofillError::QuizNameMissing)?;
        let question = params.question.as_deref().map(QuestionId::parse).transpose()?;

        let (outcome, message) = repository.update(|presets| match &question {
            Some(id) => {
                let outcome = presets.delete_question(&quiz, id)?;
                Ok((outcome, format!("Deleted {} from \"{}\"", id, quiz)))
            }
            None => {
                presets.delete_quiz(&quiz)?;
                Ok((DeleteOutcome::QuizRemoved, format!("Deleted quiz \"{}\"", quiz)))
            }
        })?;

        let quiz_removed = outcome == DeleteOutcome::QuizRemoved;
        if quiz_removed && context.session.active_quiz() == Some(quiz.as_str()) {
            context.session.set_active_quiz(None);
            context.persist_active_quiz(&repository)?;
        }

        Ok(ToolResult::success_with(serde_json::json!({
            "message": message,
            "quiz": quiz,
            "question": question,
            "quiz_removed": quiz_removed,
        })))
    }
}
