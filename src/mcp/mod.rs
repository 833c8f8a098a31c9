//! MCP (Model Context Protocol) server for quiz autofill
//!
//! Each MCP tool forwards to the tool of the same name in the registry.

pub mod handler;
pub use handler::QuizServer;

use crate::tools::ToolContext;
use crate::tools::ToolResult as InternalToolResult;
use crate::tools::{
    apply_answers::ApplyAnswersParams, correct_question::CorrectQuestionParams, delete_preset::DeletePresetParams,
    export_presets::ExportPresetsParams, extract_answers::ExtractAnswersParams, fill_zone::FillZoneParams,
    import_presets::ImportPresetsParams, list_presets::ListPresetsParams, navigate::NavigateParams,
    save_answer::SaveAnswerParams,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    tool, tool_router,
};
use serde::Serialize;

/// Convert internal ToolResult to MCP CallToolResult
fn convert_result(result: InternalToolResult) -> Result<CallToolResult, McpError> {
    if result.success {
        let text = match result.data {
            Some(data) => serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string()),
            None => "Success".to_string(),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    } else {
        let error_msg = result.error.unwrap_or_else(|| "Unknown error".to_string());
        Err(McpError::internal_error(error_msg, result.data))
    }
}

impl QuizServer {
    fn run(&self, name: &str, params: impl Serialize) -> Result<CallToolResult, McpError> {
        let params = serde_json::to_value(params).map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| McpError::internal_error(format!("Session state poisoned: {}", e), None))?;
        let mut context = ToolContext::new(self.page.as_ref(), &mut *session, self.store.as_ref(), &self.config);

        let result = self
            .registry
            .execute(name, params, &mut context)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        convert_result(result)
    }
}

#[tool_router]
impl QuizServer {
    #[tool(description = "Open a quiz attempt or review page")]
    fn navigate(&self, params: Parameters<NavigateParams>) -> Result<CallToolResult, McpError> {
        self.run("navigate", params.0)
    }

    #[tool(description = "Show the active question, its detected number and whether a stored answer exists")]
    fn question_status(&self) -> Result<CallToolResult, McpError> {
        self.run("question_status", serde_json::json!({}))
    }

    #[tool(description = "Store every answer shown on the current review page")]
    fn extract_answers(&self, params: Parameters<ExtractAnswersParams>) -> Result<CallToolResult, McpError> {
        self.run("extract_answers", params.0)
    }

    #[tool(description = "Look up the stored answer text for the active question")]
    fn auto_load(&self) -> Result<CallToolResult, McpError> {
        self.run("auto_load", serde_json::json!({}))
    }

    #[tool(description = "Fill the active question from answer text, or from its stored answer when no text is given")]
    fn apply_answers(&self, params: Parameters<ApplyAnswersParams>) -> Result<CallToolResult, McpError> {
        self.run("apply_answers", params.0)
    }

    #[tool(description = "Store answer text for one question by hand")]
    fn save_answer(&self, params: Parameters<SaveAnswerParams>) -> Result<CallToolResult, McpError> {
        self.run("save_answer", params.0)
    }

    #[tool(description = "Override or clear the detected question number")]
    fn correct_question(&self, params: Parameters<CorrectQuestionParams>) -> Result<CallToolResult, McpError> {
        self.run("correct_question", params.0)
    }

    #[tool(description = "Write stored quiz answers to portable JSON files")]
    fn export_presets(&self, params: Parameters<ExportPresetsParams>) -> Result<CallToolResult, McpError> {
        self.run("export_presets", params.0)
    }

    #[tool(description = "Load an exported preset file, replacing the quiz of the same name")]
    fn import_presets(&self, params: Parameters<ImportPresetsParams>) -> Result<CallToolResult, McpError> {
        self.run("import_presets", params.0)
    }

    #[tool(description = "Delete one stored answer, or a whole quiz")]
    fn delete_preset(&self, params: Parameters<DeletePresetParams>) -> Result<CallToolResult, McpError> {
        self.run("delete_preset", params.0)
    }

    #[tool(description = "List stored quizzes, or the stored answers of one quiz")]
    fn list_presets(&self, params: Parameters<ListPresetsParams>) -> Result<CallToolResult, McpError> {
        self.run("list_presets", params.0)
    }

    #[tool(description = "Add a type-to-fill input to every drag-and-drop zone on the page")]
    fn attach_overlay(&self) -> Result<CallToolResult, McpError> {
        self.run("attach_overlay", serde_json::json!({}))
    }

    #[tool(description = "Type text into a drop zone's inline input and confirm it")]
    fn fill_zone(&self, params: Parameters<FillZoneParams>) -> Result<CallToolResult, McpError> {
        self.run("fill_zone", params.0)
    }
}
