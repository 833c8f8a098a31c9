//! Quiz autofill MCP server
//!
//! Exposes the quiz tools to MCP clients over stdio or streamable HTTP.

use clap::{Parser, ValueEnum};
use log::info;
use quiz_autofill::browser::{ConnectionOptions, LaunchOptions};
use quiz_autofill::config::AutofillConfig;
use quiz_autofill::mcp::QuizServer;
use rmcp::transport::streamable_http_server::{StreamableHttpService, session::local::LocalSessionManager};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    /// Standard input/output transport (default)
    Stdio,
    /// HTTP streamable transport
    Http,
}

#[derive(Parser)]
#[command(name = "quiz-autofill-mcp")]
#[command(version)]
#[command(about = "Quiz answer memory MCP server", long_about = None)]
struct Cli {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<PathBuf>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Directory holding stored presets
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Transport type to use
    #[arg(long, short = 't', value_enum, default_value = "stdio")]
    transport: Transport,

    /// Port for HTTP transport (default: 3000)
    #[arg(long, short = 'p', default_value = "3000")]
    port: u16,

    /// HTTP streamable endpoint path (default: /mcp)
    #[arg(long, default_value = "/mcp")]
    http_path: String,
}

impl Cli {
    fn config(&self) -> AutofillConfig {
        let mut config = AutofillConfig::from_env();
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if self.headed {
            config.headless = false;
        }
        config
    }

    fn launch_options(&self, config: &AutofillConfig) -> LaunchOptions {
        let mut options = LaunchOptions::new().headless(config.headless);
        if let Some(path) = &self.executable_path {
            options = options.chrome_path(path);
        }
        if let Some(dir) = &self.user_data_dir {
            options = options.user_data_dir(dir);
        }
        options
    }
}

fn build_server(
    ws_endpoint: Option<&str>,
    options: &LaunchOptions,
    config: &AutofillConfig,
) -> quiz_autofill::Result<QuizServer> {
    match ws_endpoint {
        Some(url) => QuizServer::with_connection(ConnectionOptions::new(url), config.clone()),
        None => QuizServer::with_options(options.clone(), config.clone()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();
    let options = cli.launch_options(&config);

    info!("Quiz autofill MCP server v{}", env!("CARGO_PKG_VERSION"));
    info!("Browser mode: {}", if options.headless { "headless" } else { "headed" });
    info!("Preset directory: {}", config.data_dir.display());
    if let Some(endpoint) = &cli.ws_endpoint {
        info!("WebSocket endpoint: {}", endpoint);
    }

    match cli.transport {
        Transport::Stdio => {
            info!("Transport: stdio");
            let service = build_server(cli.ws_endpoint.as_deref(), &options, &config)?;
            let server = service.serve(stdio()).await?;
            let quit_reason = server.waiting().await?;
            info!("Server quit with reason: {:?}", quit_reason);
            // Let the browser shut down before the runtime goes away
            tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
        }
        Transport::Http => {
            let bind_addr = format!("127.0.0.1:{}", cli.port);
            let ws_endpoint = cli.ws_endpoint.clone();

            let service_factory = move || {
                build_server(ws_endpoint.as_deref(), &options, &config).map_err(std::io::Error::other)
            };

            let http_service = StreamableHttpService::new(
                service_factory,
                LocalSessionManager::default().into(),
                Default::default(),
            );

            let router = axum::Router::new().nest_service(&cli.http_path, http_service);

            info!("Ready to accept MCP connections at http://{}{}", bind_addr, cli.http_path);

            let listener = tokio::net::TcpListener::bind(bind_addr).await?;
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
