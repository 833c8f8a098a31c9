//! Portable preset files
//!
//! One quiz per document:
//!
//! ```json
//! { "__loremipsum_preset_export__": 1, "version": 1, "exportedAt": 1700000000000,
//!   "quiz": "Week 3", "data": { "questions": { "Q1": { ... } } } }
//! ```

use crate::error::{AutofillError, Result};
use crate::quiz::model::{AnswerRecord, PresetStore, QuestionId, QuizPreset};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Field marking a document as a preset export
pub const EXPORT_MARKER: &str = "__loremipsum_preset_export__";

pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    #[serde(default)]
    pub questions: IndexMap<QuestionId, AnswerRecord>,
}

/// Export file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(rename = "__loremipsum_preset_export__")]
    pub marker: u8,
    pub version: u32,
    pub exported_at: i64,
    pub quiz: String,
    pub data: ExportData,
}

impl ExportDocument {
    pub fn new(quiz: impl Into<String>, preset: &QuizPreset, exported_at: i64) -> Self {
        Self {
            marker: 1,
            version: EXPORT_VERSION,
            exported_at,
            quiz: quiz.into(),
            data: ExportData {
                questions: preset.questions.clone(),
            },
        }
    }

    pub fn question_count(&self) -> usize {
        self.data.questions.len()
    }

    pub fn file_name(&self) -> String {
        export_file_name(&self.quiz, self.exported_at)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document into `dir` under its file name
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_json_pretty()?)?;
        info!("Exported \"{}\" with {} questions to {}", self.quiz, self.question_count(), path.display());
        Ok(path)
    }
}

/// Export one quiz of the store
pub fn export_quiz(store: &PresetStore, quiz: &str, exported_at: i64) -> Result<ExportDocument> {
    let preset = store
        .get(quiz)
        .ok_or_else(|| AutofillError::QuizNotFound(quiz.to_string()))?;
    Ok(ExportDocument::new(quiz, preset, exported_at))
}

/// Export every quiz of the store, one document each
pub fn export_all(store: &PresetStore, exported_at: i64) -> Vec<ExportDocument> {
    store
        .iter()
        .map(|(quiz, preset)| ExportDocument::new(quiz, preset, exported_at))
        .collect()
}

/// `quiz-presets-<quiz>-<YYYY-MM-DDTHH-MM-SS>.json`, non-alphanumerics of the name as `_`
pub fn export_file_name(quiz: &str, exported_at: i64) -> String {
    let safe_name: String = quiz
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let stamp = DateTime::<Utc>::from_timestamp_millis(exported_at)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .format("%Y-%m-%dT%H-%M-%S");
    format!("quiz-presets-{}-{}.json", safe_name, stamp)
}

/// A validated import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedQuiz {
    pub quiz: String,
    pub preset: QuizPreset,
}

impl ImportedQuiz {
    /// Replace any preset of the same name; returns the quiz name
    pub fn merge_into(self, store: &mut PresetStore) -> String {
        info!("Imported quiz \"{}\" with {} questions", self.quiz, self.preset.questions.len());
        store.replace_quiz(&self.quiz, self.preset);
        self.quiz
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Validate an export document
///
/// The marker, a non-empty quiz name and a `data` object are required.
/// `createdAt` comes from `exportedAt` when present, `updatedAt` is `now`.
pub fn parse_import(json: &str, now: i64) -> Result<ImportedQuiz> {
    let document: Value =
        serde_json::from_str(json).map_err(|e| AutofillError::InvalidImport(format!("not JSON: {}", e)))?;

    if !document.get(EXPORT_MARKER).is_some_and(is_truthy) {
        return Err(AutofillError::InvalidImport("missing export marker".to_string()));
    }
    let quiz = document
        .get("quiz")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|quiz| !quiz.is_empty())
        .ok_or_else(|| AutofillError::InvalidImport("missing quiz name".to_string()))?;
    let data = document
        .get("data")
        .filter(|data| data.is_object())
        .ok_or_else(|| AutofillError::InvalidImport("missing data".to_string()))?;

    let questions = match data.get("questions") {
        None | Some(Value::Null) => IndexMap::new(),
        Some(questions) => serde_json::from_value(questions.clone())
            .map_err(|e| AutofillError::InvalidImport(format!("bad questions: {}", e)))?,
    };

    Ok(ImportedQuiz {
        quiz: quiz.to_string(),
        preset: QuizPreset {
            questions,
            created_at: Some(document.get("exportedAt").and_then(Value::as_i64).unwrap_or(now)),
            updated_at: Some(now),
        },
    })
}
