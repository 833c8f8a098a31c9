//! Typed commands over the quiz engine
//!
//! Each user-facing command is a [`Tool`] with JSON parameters. Tools run
//! against a [`ToolContext`] holding the page, the session state, the preset
//! storage and the runtime configuration. Engine failures come back as
//! unsuccessful [`ToolResult`]s carrying the status message for the user.

pub mod apply_answers;
pub mod attach_overlay;
pub mod auto_load;
pub mod correct_question;
pub mod delete_preset;
pub mod export_presets;
pub mod extract_answers;
pub mod fill_zone;
pub mod import_presets;
pub mod list_presets;
pub mod navigate;
pub mod question_status;
pub mod save_answer;

use crate::config::AutofillConfig;
use crate::dom::DomTree;
use crate::error::{AutofillError, Result};
use crate::quiz::page::{PageContext, QuizPage};
use crate::quiz::session::QuizSession;
use crate::store::{KeyValueStore, PresetRepository, now_millis};
use indexmap::IndexMap;
use log::{debug, warn};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a tool run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Successful result without data
    pub fn success() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    /// Successful result with data
    pub fn success_with(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed result with a status message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Failed result that still carries data
    pub fn failure_with(error: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error.into()),
        }
    }
}

/// Everything a tool works on
pub struct ToolContext<'a> {
    pub page: &'a dyn QuizPage,
    pub session: &'a mut QuizSession,
    pub store: &'a dyn KeyValueStore,
    pub config: &'a AutofillConfig,
}

impl<'a> ToolContext<'a> {
    pub fn new(
        page: &'a dyn QuizPage,
        session: &'a mut QuizSession,
        store: &'a dyn KeyValueStore,
        config: &'a AutofillConfig,
    ) -> Self {
        Self {
            page,
            session,
            store,
            config,
        }
    }

    /// What the page URL says about the page
    pub fn page_context(&self) -> Result<PageContext> {
        PageContext::from_url(&self.page.url()?)
    }

    /// Presets of the page's host
    pub fn repository(&self) -> Result<PresetRepository<'a>> {
        let host = self.page_context()?.host;
        Ok(PresetRepository::new(self.store, host))
    }

    /// Fresh snapshot of the page
    pub fn snapshot(&self) -> Result<DomTree> {
        self.page.snapshot()
    }

    /// Replay the tree's changes into the page
    pub fn commit(&self, tree: &mut DomTree) -> Result<usize> {
        if !tree.has_changes() {
            tree.take_journal();
            return Ok(0);
        }
        self.page.commit(tree, self.config.step_delay)
    }

    /// Current time in epoch milliseconds
    pub fn now(&self) -> i64 {
        now_millis()
    }

    /// Pick up the quiz selected in an earlier run when none is active
    pub fn restore_active_quiz(&mut self, repository: &PresetRepository<'_>) -> Result<()> {
        if self.session.active_quiz().is_none() {
            if let Some(quiz) = repository.selected_quiz()? {
                debug!("Restored selected quiz \"{}\"", quiz);
                self.session.set_active_quiz(Some(quiz));
            }
        }
        Ok(())
    }

    /// Remember the active quiz for later runs
    pub fn persist_active_quiz(&self, repository: &PresetRepository<'_>) -> Result<()> {
        repository.set_selected_quiz(self.session.active_quiz())
    }
}

/// A command with typed parameters
pub trait Tool: Send + Sync {
    type Params: DeserializeOwned + JsonSchema;

    /// Registry name
    fn name(&self) -> &str;

    /// JSON schema of the parameters
    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schemars::schema_for!(Self::Params)).unwrap_or(Value::Null)
    }

    /// Run with parsed parameters
    fn execute_typed(&self, params: Self::Params, context: &mut ToolContext) -> Result<ToolResult>;
}

/// Object-safe view of a [`Tool`]
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;

    fn parameters_schema(&self) -> Value;

    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult>;
}

impl<T: Tool> DynTool for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn parameters_schema(&self) -> Value {
        Tool::parameters_schema(self)
    }

    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        let params = serde_json::from_value(params).map_err(|e| AutofillError::InvalidParams {
            tool: Tool::name(self).to_string(),
            reason: e.to_string(),
        })?;
        self.execute_typed(params, context)
    }
}

/// Tools by name
pub struct ToolRegistry {
    tools: IndexMap<String, Box<dyn DynTool>>,
}

impl ToolRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self { tools: IndexMap::new() }
    }

    /// Registry with every built-in command
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(navigate::NavigateTool);
        registry.register(question_status::QuestionStatusTool);
        registry.register(extract_answers::ExtractAnswersTool);
        registry.register(auto_load::AutoLoadTool);
        registry.register(apply_answers::ApplyAnswersTool);
        registry.register(save_answer::SaveAnswerTool);
        registry.register(correct_question::CorrectQuestionTool);
        registry.register(export_presets::ExportPresetsTool);
        registry.register(import_presets::ImportPresetsTool);
        registry.register(delete_preset::DeletePresetTool);
        registry.register(list_presets::ListPresetsTool);
        registry.register(attach_overlay::AttachOverlayTool);
        registry.register(fill_zone::FillZoneTool);
        registry
    }

    /// Add or replace a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(Tool::name(&tool).to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn DynTool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name
    ///
    /// Unknown tools and malformed parameters are errors. Failures inside the
    /// tool become an unsuccessful result with the error message.
    pub fn execute(&self, name: &str, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| AutofillError::ToolNotFound(name.to_string()))?;

        match tool.execute(params, context) {
            Ok(result) => Ok(result),
            Err(e @ AutofillError::InvalidParams { .. }) => Err(e),
            Err(e) => {
                if e.is_detection_failure() {
                    debug!("{} stopped: {}", name, e);
                } else {
                    warn!("{} failed: {}", name, e);
                }
                Ok(ToolResult::failure(e.to_string()))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
