//! Quiz autofill command line
//!
//! Runs one quiz tool against a live Chrome tab or a saved HTML page and
//! prints the result as JSON.

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use quiz_autofill::browser::{BrowserSession, ConnectionOptions, LaunchOptions};
use quiz_autofill::config::AutofillConfig;
use quiz_autofill::quiz::{QuizPage, QuizSession, StaticPage};
use quiz_autofill::store::FileStore;
use quiz_autofill::tools::{ToolContext, ToolRegistry};
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quiz-autofill")]
#[command(version)]
#[command(about = "Remember quiz review answers and replay them into quiz attempts", long_about = None)]
struct Cli {
    /// Page to open; with --html, the address the saved page came from
    #[arg(long, global = true, value_name = "URL")]
    url: Option<String>,

    /// Work on a saved HTML page instead of a browser
    #[arg(long, global = true, value_name = "FILE")]
    html: Option<PathBuf>,

    /// Write the saved page's state as JSON after the command (with --html)
    #[arg(long, global = true, value_name = "FILE")]
    dump_state: Option<PathBuf>,

    /// Attach to a running browser through its DevTools WebSocket
    #[arg(long, global = true, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, global = true, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Directory holding stored presets
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Use this question number instead of the detected one
    #[arg(long, global = true, value_name = "N")]
    correct: Option<String>,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H', global = true)]
    headed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the active question and whether a stored answer exists
    Status,
    /// Store every answer shown on a review page
    Extract(QuizArg),
    /// Print the stored answer text for the active question
    Load,
    /// Fill the active question from text, or from its stored answer
    Apply {
        /// Answer text as typed into the paste box
        text: Option<String>,
    },
    /// Store answer text for one question
    Save {
        question: String,
        text: String,
        #[arg(long)]
        quiz: Option<String>,
    },
    /// Override or clear the question number
    Correct {
        question: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    /// Write stored quizzes to JSON files
    Export {
        #[arg(long)]
        quiz: Option<String>,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Load an exported preset file
    Import { path: PathBuf },
    /// Delete a stored answer, or a whole quiz
    Delete {
        #[arg(long)]
        quiz: Option<String>,
        #[arg(long)]
        question: Option<String>,
    },
    /// List stored quizzes, or the answers of one quiz
    List(QuizArg),
    /// Add type-to-fill inputs to drag-and-drop zones
    Overlay,
    /// Type into one drop zone and confirm
    Fill {
        place: u32,
        text: String,
        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(Args, Debug)]
struct QuizArg {
    /// Quiz name
    #[arg(long)]
    quiz: Option<String>,
}

impl Command {
    fn tool_call(&self) -> (&'static str, Value) {
        match self {
            Command::Status => ("question_status", json!({})),
            Command::Extract(arg) => ("extract_answers", json!({ "quiz": arg.quiz })),
            Command::Load => ("auto_load", json!({})),
            Command::Apply { text } => ("apply_answers", json!({ "text": text })),
            Command::Save { question, text, quiz } => {
                ("save_answer", json!({ "question": question, "text": text, "quiz": quiz }))
            }
            Command::Correct { question, clear } => ("correct_question", json!({ "question": question, "clear": clear })),
            Command::Export { quiz, all, dir } => (
                "export_presets",
                json!({ "quiz": quiz, "all": all, "dir": dir.as_ref().map(|d| d.display().to_string()) }),
            ),
            Command::Import { path } => ("import_presets", json!({ "path": path.display().to_string() })),
            Command::Delete { quiz, question } => ("delete_preset", json!({ "quiz": quiz, "question": question })),
            Command::List(arg) => ("list_presets", json!({ "quiz": arg.quiz })),
            Command::Overlay => ("attach_overlay", json!({})),
            Command::Fill { place, text, key } => ("fill_zone", json!({ "place": place, "text": text, "key": key })),
        }
    }
}

enum Page {
    Static(StaticPage),
    Browser(BrowserSession),
}

impl Page {
    fn open(cli: &Cli, config: &AutofillConfig) -> anyhow::Result<Self> {
        if let Some(path) = &cli.html {
            let html = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            let url = match &cli.url {
                Some(url) => url.clone(),
                None => {
                    let absolute = fs::canonicalize(path)?;
                    url::Url::from_file_path(&absolute)
                        .map(String::from)
                        .unwrap_or_else(|_| format!("file://{}", absolute.display()))
                }
            };
            debug!("Static page {} as {}", path.display(), url);
            return Ok(Page::Static(StaticPage::new(url, &html)));
        }

        let session = match &cli.ws_endpoint {
            Some(endpoint) => BrowserSession::connect(ConnectionOptions::new(endpoint))?,
            None => {
                let mut options = LaunchOptions::new().headless(config.headless);
                if let Some(dir) = &cli.user_data_dir {
                    options = options.user_data_dir(dir);
                }
                BrowserSession::launch(options)?
            }
        };
        Ok(Page::Browser(session))
    }

    fn as_quiz_page(&self) -> &dyn QuizPage {
        match self {
            Page::Static(page) => page,
            Page::Browser(session) => session,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = AutofillConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.headed {
        config.headless = false;
    }

    let page = Page::open(&cli, &config)?;
    let store = FileStore::new(config.data_dir.clone());
    let registry = ToolRegistry::with_defaults();
    let mut session = QuizSession::new();
    if let Some(question) = &cli.correct {
        session.correct_question(question)?;
    }

    let mut context = ToolContext::new(page.as_quiz_page(), &mut session, &store, &config);

    if let (Page::Browser(_), Some(url)) = (&page, &cli.url) {
        let opened = registry.execute("navigate", json!({ "url": url }), &mut context)?;
        if !opened.success {
            bail!(opened.error.unwrap_or_else(|| format!("Failed to open {}", url)));
        }
    }

    let (tool, params) = cli.command.tool_call();
    info!("Running {}", tool);
    let result = registry.execute(tool, params, &mut context)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let (Page::Static(static_page), Some(path)) = (&page, &cli.dump_state) {
        fs::write(path, static_page.to_json()?)?;
        info!("Page state written to {}", path.display());
    }

    if !result.success {
        bail!(result.error.unwrap_or_else(|| format!("{} failed", tool)));
    }
    Ok(())
}
