use crate::error::{AutofillError, Result};
use crate::store::transfer::{ExportDocument, export_all, export_quiz};
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parameters for the export_presets tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExportPresetsParams {
    /// Quiz to export (default: the active quiz)
    #[serde(default)]
    pub quiz: Option<String>,

    /// Export every stored quiz, one file each
    #[serde(default)]
    pub all: bool,

    /// Target directory (default: the exports folder of the data directory)
    #[serde(default)]
    pub dir: Option<String>,
}

/// Write quiz presets to portable JSON files
#[derive(Default)]
pub struct ExportPresetsTool;

impl Tool for ExportPresetsTool {
    type Params = ExportPresetsParams;

    fn name(&self) -> &str {
        "export_presets"
    }

    fn execute_typed(&self, params: ExportPresetsParams, context: &mut ToolContext) -> Result<ToolResult> {
        let repository = context.repository()?;
        context.restore_active_quiz(&repository)?;
        let presets = repository.load()?;
        let now = context.now();

        let documents: Vec<ExportDocument> = if params.all {
            export_all(&presets, now)
        } else {
            let quiz = params
                .quiz
                .as_deref()
                .or(context.session.active_quiz())
                .ok_or(AutofillError::QuizNameMissing)?;
            vec![export_quiz(&presets, quiz, now)?]
        };

        if documents.is_empty() {
            return Ok(ToolResult::failure("No presets to export"));
        }

        let dir = params
            .dir
            .map(PathBuf::from)
            .unwrap_or_else(|| context.config.export_dir());

        let mut files = Vec::with_capacity(documents.len());
        for document in &documents {
            let path = document.write_to(&dir)?;
            files.push(serde_json::json!({
                "quiz": document.quiz,
                "questions": document.question_count(),
                "path": path.display().to_string(),
            }));
        }

        Ok(ToolResult::success_with(serde_json::json!({
            "message": format!("Exported {} quiz preset(s) to {}", files.len(), dir.display()),
            "files": files,
        })))
    }
}
