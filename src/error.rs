use thiserror::Error;

/// Errors produced by the quiz autofill engine and its browser adapter
#[derive(Debug, Error)]
pub enum AutofillError {
    /// Failed to launch the browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Failed to connect to an existing browser
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// Navigation or tab handling failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Tab could not be created, found, or closed
    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    /// JavaScript evaluation in the page failed
    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    /// The page snapshot could not be turned into a DOM tree
    #[error("Failed to parse DOM: {0}")]
    DomParseFailed(String),

    /// An element the operation depends on is missing
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// No question awaiting an answer on the page
    #[error("No active question found")]
    NoActiveQuestion,

    /// None of the id detection rules matched
    #[error("Could not detect question number")]
    QuestionIdNotDetected,

    /// Manual question correction without any digits
    #[error("Invalid question format '{0}'. Use 'Q30' or '30'")]
    InvalidQuestionNumber(String),

    /// Question type the operation cannot handle
    #[error("Unknown question type, cannot apply")]
    UnsupportedQuestionType,

    /// Nothing usable in the pasted answer text
    #[error("No answer tokens: {0}")]
    NoAnswerTokens(String),

    /// Extraction of a single question failed
    #[error("Failed to extract {question}: {reason}")]
    ExtractionFailed { question: String, reason: String },

    /// Persisted presets exist but cannot be parsed
    #[error("Stored presets under '{key}' are unreadable: {reason}")]
    CorruptStore { key: String, reason: String },

    /// Reading or writing the key-value store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// An import document failed validation
    #[error("Invalid preset file format: {0}")]
    InvalidImport(String),

    /// Quiz preset missing from the store
    #[error("Quiz preset not found: {0}")]
    QuizNotFound(String),

    /// Question preset missing from a quiz
    #[error("No preset found for {question} in \"{quiz}\"")]
    PresetNotFound { quiz: String, question: String },

    /// Quiz name could not be determined
    #[error("Quiz name not found on page")]
    QuizNameMissing,

    /// Tool lookup failed
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool parameters did not deserialize
    #[error("Invalid parameters for tool '{tool}': {reason}")]
    InvalidParams { tool: String, reason: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AutofillError>;

impl AutofillError {
    /// Whether the error describes page state (nothing to act on) rather than a fault
    pub fn is_detection_failure(&self) -> bool {
        matches!(
            self,
            AutofillError::NoActiveQuestion
                | AutofillError::QuestionIdNotDetected
                | AutofillError::ElementNotFound(_)
                | AutofillError::NoAnswerTokens(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AutofillError::InvalidQuestionNumber("abc".to_string());
        assert_eq!(err.to_string(), "Invalid question format 'abc'. Use 'Q30' or '30'");

        let err = AutofillError::PresetNotFound {
            quiz: "Ethics".to_string(),
            question: "Q4".to_string(),
        };
        assert_eq!(err.to_string(), "No preset found for Q4 in \"Ethics\"");
    }

    #[test]
    fn test_detection_failures() {
        assert!(AutofillError::NoActiveQuestion.is_detection_failure());
        assert!(AutofillError::QuestionIdNotDetected.is_detection_failure());
        assert!(!AutofillError::Storage("disk".to_string()).is_detection_failure());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: AutofillError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, AutofillError::Json(_)));
    }
}
