use crate::browser::{BrowserSession, ConnectionOptions, LaunchOptions};
use crate::config::AutofillConfig;
use crate::error::Result as AutofillResult;
use crate::quiz::page::QuizPage;
use crate::quiz::session::QuizSession;
use crate::store::FileStore;
use crate::tools::ToolRegistry;
use log::info;
use rmcp::{
    ServerHandler, tool_handler,
    handler::server::router::tool::ToolRouter,
    model::{ServerCapabilities, ServerInfo},
};
use std::sync::{Arc, Mutex};

const INSTRUCTIONS: &str = "Quiz answer memory. Open a quiz review page and call extract_answers to \
store its answers, then open the attempt page and call apply_answers to fill the active question. \
question_status shows which question is active and whether a stored answer exists.";

/// MCP server over one page, one quiz session and a file-backed preset store
pub struct QuizServer {
    pub(super) page: Arc<dyn QuizPage>,
    pub(super) session: Mutex<QuizSession>,
    pub(super) store: Arc<FileStore>,
    pub(super) config: AutofillConfig,
    pub(super) registry: ToolRegistry,
    tool_router: ToolRouter<Self>,
}

impl QuizServer {
    pub fn new(page: Arc<dyn QuizPage>, config: AutofillConfig) -> Self {
        let store = Arc::new(FileStore::new(config.data_dir.clone()));
        Self {
            page,
            session: Mutex::new(QuizSession::new()),
            store,
            config,
            registry: ToolRegistry::with_defaults(),
            tool_router: Self::tool_router(),
        }
    }

    /// Launch a browser and serve it
    pub fn with_options(options: LaunchOptions, config: AutofillConfig) -> AutofillResult<Self> {
        let session = BrowserSession::launch(options)?;
        info!("Presets stored in {}", config.data_dir.display());
        Ok(Self::new(Arc::new(session), config))
    }

    /// Attach to a running browser and serve it
    pub fn with_connection(options: ConnectionOptions, config: AutofillConfig) -> AutofillResult<Self> {
        let session = BrowserSession::connect(options)?;
        Ok(Self::new(Arc::new(session), config))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AutofillConfig {
        &self.config
    }
}

#[tool_handler]
impl ServerHandler for QuizServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::page::StaticPage;

    #[test]
    fn test_router_lists_every_registry_tool() {
        let dir = tempfile::tempdir().unwrap();
        let page = StaticPage::new("https://lms.example.edu/mod/quiz/attempt.php?attempt=1", "<div></div>");
        let server = QuizServer::new(Arc::new(page), AutofillConfig::new().data_dir(dir.path()));

        let mut routed: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        let mut registered: Vec<String> = server.registry().names().map(str::to_string).collect();
        routed.sort();
        registered.sort();
        assert_eq!(routed, registered);
    }
}
