use crate::error::{AutofillError, Result};
use crate::quiz::page::PageType;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Add the scheme a pasted LMS address usually lacks
fn normalize_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(AutofillError::NavigationFailed("Empty URL".to_string()));
    }

    let has_scheme = ["http://", "https://", "file://", "data:", "about:"]
        .iter()
        .any(|scheme| trimmed.starts_with(scheme));
    if has_scheme {
        return Ok(trimmed.to_string());
    }

    // Local test servers rarely speak TLS
    if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
        return Ok(format!("http://{}", trimmed));
    }

    Ok(format!("https://{}", trimmed))
}

/// Parameters for the navigate tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NavigateParams {
    /// Quiz attempt or review page URL
    pub url: String,
}

/// Open a quiz page in the browser
#[derive(Default)]
pub struct NavigateTool;

impl Tool for NavigateTool {
    type Params = NavigateParams;

    fn name(&self) -> &str {
        "navigate"
    }

    fn execute_typed(&self, params: NavigateParams, context: &mut ToolContext) -> Result<ToolResult> {
        let url = normalize_url(&params.url)?;
        context.page.navigate(&url)?;

        let page = context.page_context()?;
        if page.page_type == PageType::Unknown {
            log::info!("Opened {} (not a quiz attempt or review page)", page.url);
        }

        Ok(ToolResult::success_with(serde_json::json!({
            "url": page.url,
            "page_type": page.page_type,
            "host": page.host,
        })))
    }
}
