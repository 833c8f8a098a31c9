use crate::error::Result;
use crate::store::transfer::parse_import;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;

/// Parameters for the import_presets tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImportPresetsParams {
    /// Path of an exported preset file
    pub path: String,
}

/// Load an exported preset file, replacing the quiz of the same name
#[derive(Default)]
pub struct ImportPresetsTool;

impl Tool for ImportPresetsTool {
    type Params = ImportPresetsParams;

    fn name(&self) -> &str {
        "import_presets"
    }

    fn execute_typed(&self, params: ImportPresetsParams, context: &mut ToolContext) -> Result<ToolResult> {
        let json = fs::read_to_string(&params.path)?;
        let imported = parse_import(&json, context.now())?;
        let questions = imported.preset.questions.len();

        let repository = context.repository()?;
        let quiz = repository.update(|presets| Ok(imported.merge_into(presets)))?;
        context.session.set_active_quiz(Some(quiz.clone()));
        context.persist_active_quiz(&repository)?;

        Ok(ToolResult::success_with(serde_json::json!({
            "message": format!("Imported \"{}\" with {} questions", quiz, questions),
            "quiz": quiz,
            "questions": questions,
        })))
    }
}
