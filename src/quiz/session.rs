//! Per-page session state
//!
//! [`QuizSession`] owns the manual question-number override and the active
//! quiz. Every operation takes the DOM snapshot and the preset store it works
//! on, so the session never touches the page or the disk itself.

use crate::dom::{DomTree, NodeId};
use crate::error::{AutofillError, Result};
use crate::quiz::applier::{self, ApplyOutcome, Progress};
use crate::quiz::classifier;
use crate::quiz::extractor::{ExtractionReport, extract_answers_from_review};
use crate::quiz::locator::{IdSource, QuestionOverride, ResolvedId, locate_active_question, resolve_question_id};
use crate::quiz::model::{AnswerRecord, PresetStore, QuestionId, QuestionType};
use crate::quiz::page::detect_quiz_name;
use crate::text::clean_text;
use log::{debug, info};
use serde::Serialize;

/// What the quiz page shows right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuestionStatus {
    NoActiveQuestion,
    NotDetected,
    Detected {
        id: QuestionId,
        manually_corrected: bool,
        /// Quiz holding a preset for this question
        preset_in: Option<String>,
    },
}

impl QuestionStatus {
    /// Status line for the user
    pub fn message(&self) -> String {
        match self {
            QuestionStatus::NoActiveQuestion => "No active question found".to_string(),
            QuestionStatus::NotDetected => "Question number not detected".to_string(),
            QuestionStatus::Detected {
                id,
                manually_corrected,
                preset_in,
            } => {
                let mut line = format!("Question {} detected", id);
                if *manually_corrected {
                    line.push_str(" (manually corrected)");
                }
                if let Some(quiz) = preset_in {
                    line.push_str(&format!(", preset available in \"{}\"", quiz));
                }
                line
            }
        }
    }
}

/// Answer text looked up for the active question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedAnswer {
    pub quiz: String,
    pub question: QuestionId,
    pub question_type: QuestionType,
    pub text: String,
}

/// Result of applying an answer to the active question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedAnswer {
    pub question_type: QuestionType,
    /// Set when the text came from the store instead of the caller
    pub loaded: Option<LoadedAnswer>,
    pub outcome: ApplyOutcome,
}

/// Session state of one quiz page
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    question_override: QuestionOverride,
    active_quiz: Option<String>,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a quiz already selected
    pub fn with_active_quiz(mut self, quiz: impl Into<String>) -> Self {
        self.active_quiz = Some(quiz.into());
        self
    }

    pub fn active_quiz(&self) -> Option<&str> {
        self.active_quiz.as_deref()
    }

    pub fn set_active_quiz(&mut self, quiz: Option<String>) {
        if self.active_quiz != quiz {
            debug!("Active quiz: {:?}", quiz);
        }
        self.active_quiz = quiz;
    }

    pub fn question_override(&self) -> &QuestionOverride {
        &self.question_override
    }

    /// Manually correct the question number
    pub fn correct_question(&mut self, input: &str) -> Result<QuestionId> {
        self.question_override.set(input)
    }

    /// Drop the manual correction
    pub fn clear_correction(&mut self) {
        self.question_override.clear();
    }

    /// Quiz to look answers up in first: the active one, else the page's name
    pub fn preferred_quiz(&self, tree: &DomTree) -> Option<String> {
        self.active_quiz.clone().or_else(|| detect_quiz_name(tree))
    }

    /// The active question and its resolved id
    pub fn active_question(&self, tree: &DomTree) -> Result<(NodeId, ResolvedId)> {
        let question = locate_active_question(tree).ok_or(AutofillError::NoActiveQuestion)?;
        let resolved =
            resolve_question_id(tree, question, &self.question_override).ok_or(AutofillError::QuestionIdNotDetected)?;
        Ok((question, resolved))
    }

    /// Current question status
    pub fn status(&self, tree: &DomTree, store: &PresetStore) -> QuestionStatus {
        let Some(question) = locate_active_question(tree) else {
            return QuestionStatus::NoActiveQuestion;
        };
        let Some(resolved) = resolve_question_id(tree, question, &self.question_override) else {
            return QuestionStatus::NotDetected;
        };

        let preferred = self.preferred_quiz(tree);
        let preset_in = store
            .find_question(preferred.as_deref(), &resolved.id)
            .map(|hit| hit.quiz.to_string());

        QuestionStatus::Detected {
            id: resolved.id,
            manually_corrected: resolved.source == IdSource::Override,
            preset_in,
        }
    }

    /// Look up the stored answer for the active question
    ///
    /// The active quiz is searched first, then every stored quiz. A hit in
    /// another quiz makes that quiz active.
    pub fn auto_load(&mut self, tree: &DomTree, store: &PresetStore) -> Result<LoadedAnswer> {
        let (_, resolved) = self.active_question(tree)?;
        let preferred = self.preferred_quiz(tree);

        let hit = store
            .find_question(preferred.as_deref(), &resolved.id)
            .ok_or_else(|| AutofillError::PresetNotFound {
                quiz: preferred.clone().unwrap_or_default(),
                question: resolved.id.to_string(),
            })?;

        let loaded = LoadedAnswer {
            quiz: hit.quiz.to_string(),
            question: resolved.id,
            question_type: hit.record.question_type,
            text: hit.record.paste_text(),
        };

        if self.active_quiz.as_deref() != Some(loaded.quiz.as_str()) {
            info!("Preset for {} found in quiz \"{}\"", loaded.question, loaded.quiz);
            self.active_quiz = Some(loaded.quiz.clone());
        }
        Ok(loaded)
    }

    /// Apply `pasted` to the active question, auto-loading when it is blank
    pub fn apply(
        &mut self,
        tree: &mut DomTree,
        store: &PresetStore,
        pasted: &str,
        progress: &mut dyn Progress,
    ) -> Result<AppliedAnswer> {
        let question = locate_active_question(tree).ok_or(AutofillError::NoActiveQuestion)?;
        let question_type = classifier::question_type(tree, question);

        let (text, loaded) = if clean_text(pasted).is_empty() {
            let loaded = self.auto_load(tree, store)?;
            (loaded.text.clone(), Some(loaded))
        } else {
            (pasted.to_string(), None)
        };
        if clean_text(&text).is_empty() {
            return Err(AutofillError::NoAnswerTokens("answer text is empty".to_string()));
        }

        let outcome = applier::apply(tree, question, question_type, &text, progress)?;
        Ok(AppliedAnswer {
            question_type,
            loaded,
            outcome,
        })
    }

    /// Extract a review page into `quiz`, else into the quiz named by the page
    ///
    /// The target quiz becomes active.
    pub fn extract(
        &mut self,
        tree: &DomTree,
        store: &mut PresetStore,
        quiz: Option<&str>,
        now: i64,
    ) -> Result<ExtractionReport> {
        let quiz = quiz
            .map(clean_text)
            .filter(|name| !name.is_empty())
            .or_else(|| detect_quiz_name(tree))
            .ok_or(AutofillError::QuizNameMissing)?;

        let report = extract_answers_from_review(tree, store, &quiz, now);
        self.active_quiz = Some(quiz);
        Ok(report)
    }

    /// Store hand-pasted text for one question
    ///
    /// The quiz defaults to the active one. The type is inferred from the text.
    pub fn save_manual(
        &mut self,
        store: &mut PresetStore,
        quiz: Option<&str>,
        question: &str,
        text: &str,
        now: i64,
    ) -> Result<(String, QuestionId)> {
        let quiz = quiz
            .map(clean_text)
            .filter(|name| !name.is_empty())
            .or_else(|| self.active_quiz.clone())
            .ok_or(AutofillError::QuizNameMissing)?;
        let id = QuestionId::parse(question)?;
        let text = clean_text(text);
        if text.is_empty() {
            return Err(AutofillError::NoAnswerTokens("answer text is empty".to_string()));
        }

        let record = AnswerRecord::manual(text, now);
        info!("Saving {} answer for {} in \"{}\"", record.question_type, id, quiz);
        store.upsert_question(&quiz, id.clone(), record, now);
        self.active_quiz = Some(quiz.clone());
        Ok((quiz, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;
    use crate::quiz::applier::NoProgress;

    const QUIZ_PAGE: &str = r#"
        <html><head><title>Week 3 quiz</title></head><body>
        <div class="que answersselect notyetanswered" id="question-7-4">
          <input type="radio" name="q4" id="a1" value="0"><label for="a1" id="a1_label">Paris</label>
          <input type="radio" name="q4" id="a2" value="1"><label for="a2" id="a2_label">London</label>
        </div></body></html>"#;

    fn store_with(quiz: &str, id: &str, text: &str) -> PresetStore {
        let mut store = PresetStore::new();
        store.upsert_question(quiz, QuestionId::parse(id).unwrap(), AnswerRecord::manual(text, 1), 1);
        store
    }

    #[test]
    fn test_status_transitions() {
        let tree = parse_document(QUIZ_PAGE);
        let mut session = QuizSession::new();
        let store = store_with("Other quiz", "Q4", "London");

        assert_eq!(
            session.status(&tree, &store),
            QuestionStatus::Detected {
                id: QuestionId::parse("Q4").unwrap(),
                manually_corrected: false,
                preset_in: Some("Other quiz".to_string()),
            }
        );

        session.correct_question("q 12").unwrap();
        let status = session.status(&tree, &store);
        assert_eq!(status.message(), "Question Q12 detected (manually corrected)");

        session.clear_correction();
        assert!(!session.question_override().is_set());

        let empty = parse_document("<div class=\"que\">answered</div>");
        assert_eq!(session.status(&empty, &store), QuestionStatus::NoActiveQuestion);

        let unnumbered = parse_document("<div class=\"que notyetanswered\">pick one</div>");
        assert_eq!(session.status(&unnumbered, &store), QuestionStatus::NotDetected);
    }

    #[test]
    fn test_invalid_correction_keeps_state() {
        let mut session = QuizSession::new();
        session.correct_question("30").unwrap();
        assert!(session.correct_question("abc").is_err());
        assert_eq!(session.question_override().current().map(QuestionId::as_str), Some("Q30"));
    }

    #[test]
    fn test_auto_load_switches_quiz() {
        let tree = parse_document(QUIZ_PAGE);
        let mut session = QuizSession::new().with_active_quiz("Current");
        let store = store_with("Archive", "Q4", "London");

        let loaded = session.auto_load(&tree, &store).unwrap();
        assert_eq!(loaded.quiz, "Archive");
        assert_eq!(loaded.text, "London");
        assert_eq!(session.active_quiz(), Some("Archive"));

        let missing = PresetStore::new();
        let err = session.auto_load(&tree, &missing).unwrap_err();
        assert!(matches!(err, AutofillError::PresetNotFound { .. }));
    }

    #[test]
    fn test_apply_with_blank_text_auto_loads() {
        let mut tree = parse_document(QUIZ_PAGE);
        let mut session = QuizSession::new();
        let store = store_with("Week 3 quiz", "Q4", "London");

        let applied = session.apply(&mut tree, &store, "  ", &mut NoProgress).unwrap();
        assert_eq!(applied.loaded.map(|l| l.quiz).as_deref(), Some("Week 3 quiz"));
        assert_eq!(applied.outcome.applied_count(), 1);

        let london = tree.element_by_id("a2").unwrap();
        assert!(tree.element(london).checked);
    }

    #[test]
    fn test_apply_without_active_question() {
        let mut tree = parse_document("<div class=\"que\"></div>");
        let mut session = QuizSession::new();
        let err = session
            .apply(&mut tree, &PresetStore::new(), "London", &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, AutofillError::NoActiveQuestion));
        assert!(tree.journal().is_empty());
    }

    #[test]
    fn test_save_manual() {
        let mut session = QuizSession::new();
        let mut store = PresetStore::new();

        assert!(matches!(
            session.save_manual(&mut store, None, "Q1", "x", 5),
            Err(AutofillError::QuizNameMissing)
        ));

        let (quiz, id) = session.save_manual(&mut store, Some("Ethics"), "7", "a || b", 5).unwrap();
        assert_eq!((quiz.as_str(), id.as_str()), ("Ethics", "Q7"));
        let record = &store.get("Ethics").unwrap().questions[&id];
        assert_eq!(record.question_type, QuestionType::MultiAnswer);

        session.save_manual(&mut store, None, "Q8", "Paris", 6).unwrap();
        assert_eq!(store.get("Ethics").unwrap().questions.len(), 2);
        assert!(session.save_manual(&mut store, None, "Q9", "   ", 6).is_err());
    }

    #[test]
    fn test_extract_uses_page_name() {
        let tree = parse_document(
            r#"<h1>Final</h1>
               <div class="que answersselect" id="question-1-2">
                 <input type="radio" id="r1" checked><label id="r1_label">Yes</label>
               </div>"#,
        );
        let mut session = QuizSession::new();
        let mut store = PresetStore::new();
        let report = session.extract(&tree, &mut store, None, 10).unwrap();
        assert_eq!(report.quiz, "Final");
        assert_eq!(report.extracted_count(), 1);
        assert_eq!(session.active_quiz(), Some("Final"));
    }
}
