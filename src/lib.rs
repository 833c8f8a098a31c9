//! # quiz-autofill
//!
//! Remembers the answers shown on LMS quiz review pages and replays them into
//! later attempts of the same quiz, driving Chrome through the DevTools Protocol.
//!
//! ## Features
//!
//! - **Extraction**: every question of a review page becomes a stored answer,
//!   keyed by quiz name and question number
//! - **Replay**: drag-and-drop, multi-blank and choice questions are filled from
//!   pasted text or from the stored answer, with the page's own events fired
//! - **Presets**: per-site JSON storage with export and import files
//! - **MCP Server**: the same tools for AI agents over stdio or HTTP
//!
//! ## Running the MCP Server
//!
//! ```bash
//! cargo run --features mcp-server --bin mcp-server -- --headed
//! ```
//!
//! ## Library Usage
//!
//! The engine runs on DOM snapshots, so it works the same on a live tab and on
//! a saved page:
//!
//! ```rust
//! use quiz_autofill::config::AutofillConfig;
//! use quiz_autofill::quiz::{QuizSession, StaticPage};
//! use quiz_autofill::store::MemoryStore;
//! use quiz_autofill::tools::{ToolContext, ToolRegistry};
//! use serde_json::json;
//!
//! # fn main() -> quiz_autofill::Result<()> {
//! let page = StaticPage::new(
//!     "https://lms.example.edu/mod/quiz/attempt.php?attempt=3",
//!     r#"<div class="que answersselect notyetanswered" id="question-3-1">
//!          <input type="radio" id="a" name="q"><label id="a_label">Paris</label>
//!        </div>"#,
//! );
//! let store = MemoryStore::new();
//! let config = AutofillConfig::default();
//! let mut session = QuizSession::new();
//! let registry = ToolRegistry::with_defaults();
//!
//! let mut context = ToolContext::new(&page, &mut session, &store, &config);
//! let result = registry.execute("apply_answers", json!({"text": "Paris"}), &mut context)?;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: Chrome session, DOM snapshots and journal replay
//! - [`dom`]: DOM tree with journaled mutations
//! - [`quiz`]: question detection, extraction and replay
//! - [`store`]: preset persistence, export and import
//! - [`tools`]: named commands shared by the CLI and the MCP server
//! - [`mcp`]: Model Context Protocol server (requires `mcp-handler` feature)

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod quiz;
pub mod store;
pub mod text;
pub mod tools;

#[cfg(feature = "mcp-handler")]
pub mod mcp;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use config::AutofillConfig;
pub use dom::{DomTree, ElementNode, Mutation};
pub use error::{AutofillError, Result};
pub use quiz::{QuizPage, QuizSession, StaticPage};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use tools::{Tool, ToolContext, ToolRegistry, ToolResult};

#[cfg(feature = "mcp-handler")]
pub use mcp::QuizServer;
#[cfg(feature = "mcp-handler")]
pub use rmcp::ServiceExt;
