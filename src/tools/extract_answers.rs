use crate::error::Result;
use crate::quiz::page::PageType;
use crate::tools::{Tool, ToolContext, ToolResult};
use log::{info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the extract_answers tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExtractAnswersParams {
    /// Quiz to store the answers under (default: the quiz name shown on the page)
    #[serde(default)]
    pub quiz: Option<String>,
}

/// Store every answer shown on a review page
#[derive(Default)]
pub struct ExtractAnswersTool;

impl Tool for ExtractAnswersTool {
    type Params = ExtractAnswersParams;

    fn name(&self) -> &str {
        "extract_answers"
    }

    fn execute_typed(&self, params: ExtractAnswersParams, context: &mut ToolContext) -> Result<ToolResult> {
        let page = context.page_context()?;
        if page.page_type != PageType::Review {
            warn!("Extracting answers from a {:?} page", page.page_type);
        }

        let repository = context.repository()?;
        let tree = context.snapshot()?;
        let now = context.now();

        let session = &mut *context.session;
        let report = repository.update(|presets| session.extract(&tree, presets, params.quiz.as_deref(), now))?;
        context.persist_active_quiz(&repository)?;

        info!(
            "Imported {} answers into \"{}\" ({} skipped)",
            report.extracted_count(),
            report.quiz,
            report.skipped.len()
        );

        let data = serde_json::to_value(&report)?;
        if report.extracted.is_empty() {
            return Ok(ToolResult::failure_with("No answers found on this page", data));
        }
        Ok(ToolResult::success_with(data))
    }
}
