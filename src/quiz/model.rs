use crate::error::{AutofillError, Result};
use crate::text::{digits_only, join_parts};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Question identifier of the form `Q<digits>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuestionId(String);

impl QuestionId {
    /// Build from a run of digits; `None` if `digits` is empty or not numeric
    pub fn from_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self(format!("Q{}", digits)))
    }

    /// Parse user input such as `Q30`, `30` or `question 30` using its first digit run
    pub fn parse(input: &str) -> Result<Self> {
        let digits: String = input
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        Self::from_digits(&digits).ok_or_else(|| AutofillError::InvalidQuestionNumber(input.trim().to_string()))
    }

    /// The identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric part, used for ordering
    pub fn number(&self) -> u64 {
        digits_only(&self.0).parse().unwrap_or(0)
    }
}

impl TryFrom<String> for QuestionId {
    type Error = AutofillError;

    /// Accepts only the stored form `Q<digits>`
    fn try_from(value: String) -> Result<Self> {
        value
            .strip_prefix('Q')
            .and_then(Self::from_digits)
            .ok_or(AutofillError::InvalidQuestionNumber(value))
    }
}

impl From<QuestionId> for String {
    fn from(id: QuestionId) -> Self {
        id.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Question archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Drag the word into the sentence
    Ddwtos,
    /// Several blanks or selects
    #[serde(rename = "multianswer")]
    MultiAnswer,
    /// Single or multiple choice
    #[serde(rename = "answersselect")]
    AnswersSelect,
    #[default]
    #[serde(other)]
    Unknown,
}

impl QuestionType {
    /// Marker class on the question container, and the serialized name
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Ddwtos => "ddwtos",
            QuestionType::MultiAnswer => "multianswer",
            QuestionType::AnswersSelect => "answersselect",
            QuestionType::Unknown => "unknown",
        }
    }

    /// Guess the type of hand-pasted answer text
    pub fn infer_from_text(text: &str) -> Self {
        if text.contains("||") {
            QuestionType::MultiAnswer
        } else if text.split_whitespace().count() == 1 {
            QuestionType::AnswersSelect
        } else {
            QuestionType::Ddwtos
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-dependent answer payload
///
/// Variants are distinguished by their fields, so the order matters when reading:
/// the most specific shapes come first and the empty payload last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Structured {
    /// Drop zone number to display text, plus texts in place order
    DragDrop {
        mapping: IndexMap<String, String>,
        #[serde(default)]
        parts: Vec<String>,
    },
    /// Labels of the checked options
    Selected { selected: Vec<String> },
    /// Single-choice label
    SelectedText {
        #[serde(rename = "selectedText")]
        selected_text: String,
        #[serde(rename = "selectedIndex", default, skip_serializing_if = "Option::is_none")]
        selected_index: Option<i64>,
    },
    /// Sub-answer values in sub-index order
    Parts { parts: Vec<String> },
    /// Raw control values of an unclassified question
    Inputs { inputs: Vec<String> },
    Empty {},
}

impl Default for Structured {
    fn default() -> Self {
        Structured::Empty {}
    }
}

/// Stored answer for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,

    /// Canonical serialization: parts joined with `" || "`
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<String>>,

    #[serde(default)]
    pub structured: Structured,

    /// Epoch milliseconds
    #[serde(default, alias = "savedAt")]
    pub captured_at: i64,
}

impl AnswerRecord {
    /// Drag-drop answer from place mapping and ordered display texts
    pub fn drag_drop(mapping: IndexMap<String, String>, parts: Vec<String>, captured_at: i64) -> Self {
        Self {
            question_type: QuestionType::Ddwtos,
            text: join_parts(&parts),
            parts: Some(parts.clone()),
            structured: Structured::DragDrop { mapping, parts },
            captured_at,
        }
    }

    /// Multi-part answer; all-empty parts collapse to an empty record
    pub fn multi_answer(parts: Vec<String>, captured_at: i64) -> Self {
        let parts = if parts.iter().all(|p| p.is_empty()) { Vec::new() } else { parts };
        Self {
            question_type: QuestionType::MultiAnswer,
            text: join_parts(&parts),
            parts: Some(parts.clone()),
            structured: Structured::Parts { parts },
            captured_at,
        }
    }

    /// Choice answer from the checked labels
    pub fn selected(selected: Vec<String>, captured_at: i64) -> Self {
        Self {
            question_type: QuestionType::AnswersSelect,
            text: join_parts(&selected),
            parts: None,
            structured: Structured::Selected { selected },
            captured_at,
        }
    }

    /// Raw control values of an unclassified question
    pub fn raw_inputs(inputs: Vec<String>, captured_at: i64) -> Self {
        Self {
            question_type: QuestionType::Unknown,
            text: join_parts(&inputs),
            parts: None,
            structured: Structured::Inputs { inputs },
            captured_at,
        }
    }

    /// Hand-pasted answer text
    pub fn manual(text: impl Into<String>, captured_at: i64) -> Self {
        let text = text.into();
        Self {
            question_type: QuestionType::infer_from_text(&text),
            text,
            parts: None,
            structured: Structured::default(),
            captured_at,
        }
    }

    /// Nothing worth storing
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.parts.as_ref().is_none_or(|p| p.is_empty())
    }

    /// Text to put in the paste box for this answer
    pub fn paste_text(&self) -> String {
        let joined_parts = || self.parts.as_deref().map(join_parts).unwrap_or_default();
        match (self.question_type, &self.structured) {
            (QuestionType::MultiAnswer, Structured::Parts { parts }) => join_parts(parts),
            (QuestionType::MultiAnswer, _) if self.parts.is_some() => joined_parts(),
            (QuestionType::Ddwtos, _) if self.text.is_empty() => joined_parts(),
            (QuestionType::AnswersSelect, Structured::SelectedText { selected_text, .. })
                if self.text.is_empty() =>
            {
                selected_text.clone()
            }
            _ if self.text.is_empty() => joined_parts(),
            _ => self.text.clone(),
        }
    }

    /// Same answer content, ignoring the capture time
    pub fn same_answer(&self, other: &AnswerRecord) -> bool {
        self.question_type == other.question_type
            && self.text == other.text
            && self.parts == other.parts
            && self.structured == other.structured
    }
}

/// Saved answers of one quiz
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizPreset {
    #[serde(default)]
    pub questions: IndexMap<QuestionId, AnswerRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl QuizPreset {
    /// Empty preset created now
    pub fn new(now: i64) -> Self {
        Self {
            questions: IndexMap::new(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Question ids ordered by number
    pub fn sorted_question_ids(&self) -> Vec<&QuestionId> {
        let mut ids: Vec<&QuestionId> = self.questions.keys().collect();
        ids.sort_by_key(|id| id.number());
        ids
    }
}

/// What a question deletion did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    QuestionRemoved,
    /// The question was the last one, so the quiz went with it
    QuizRemoved,
}

/// A stored answer found by lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetHit<'a> {
    pub quiz: &'a str,
    pub record: &'a AnswerRecord,
}

/// All quiz presets of one site host, keyed by exact quiz name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetStore {
    quizzes: IndexMap<String, QuizPreset>,
}

impl PresetStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of quizzes
    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    /// Whether there are no quizzes
    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }

    /// Quiz names in insertion order
    pub fn quiz_names(&self) -> impl Iterator<Item = &str> {
        self.quizzes.keys().map(String::as_str)
    }

    /// Iterate over (name, preset)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QuizPreset)> {
        self.quizzes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Preset by exact name
    pub fn get(&self, quiz: &str) -> Option<&QuizPreset> {
        self.quizzes.get(quiz)
    }

    /// Mutable preset by exact name
    pub fn get_mut(&mut self, quiz: &str) -> Option<&mut QuizPreset> {
        self.quizzes.get_mut(quiz)
    }

    /// Preset by exact name, created if missing
    pub fn ensure_quiz(&mut self, quiz: &str, now: i64) -> &mut QuizPreset {
        self.quizzes
            .entry(quiz.to_string())
            .or_insert_with(|| QuizPreset::new(now))
    }

    /// Insert or overwrite one answer and bump `updatedAt`
    pub fn upsert_question(&mut self, quiz: &str, id: QuestionId, record: AnswerRecord, now: i64) {
        let preset = self.ensure_quiz(quiz, now);
        preset.questions.insert(id, record);
        preset.updated_at = Some(now);
    }

    /// Replace a quiz preset in full
    pub fn replace_quiz(&mut self, quiz: &str, preset: QuizPreset) {
        self.quizzes.insert(quiz.to_string(), preset);
    }

    /// Delete one question; a quiz left without questions is deleted too
    pub fn delete_question(&mut self, quiz: &str, id: &QuestionId) -> Result<DeleteOutcome> {
        let preset = self
            .quizzes
            .get_mut(quiz)
            .ok_or_else(|| AutofillError::QuizNotFound(quiz.to_string()))?;

        if preset.questions.shift_remove(id).is_none() {
            return Err(AutofillError::PresetNotFound {
                quiz: quiz.to_string(),
                question: id.to_string(),
            });
        }

        if preset.questions.is_empty() {
            self.quizzes.shift_remove(quiz);
            return Ok(DeleteOutcome::QuizRemoved);
        }
        Ok(DeleteOutcome::QuestionRemoved)
    }

    /// Delete a whole quiz
    pub fn delete_quiz(&mut self, quiz: &str) -> Result<QuizPreset> {
        self.quizzes
            .shift_remove(quiz)
            .ok_or_else(|| AutofillError::QuizNotFound(quiz.to_string()))
    }

    /// Look a question up in the preferred quiz first, then in every quiz in order
    pub fn find_question(&self, preferred: Option<&str>, id: &QuestionId) -> Option<PresetHit<'_>> {
        let in_quiz = |name: &str| {
            self.quizzes
                .get_key_value(name)
                .and_then(|(quiz, preset)| preset.questions.get(id).map(|record| PresetHit { quiz, record }))
        };

        preferred.and_then(in_quiz).or_else(|| {
            self.quizzes.iter().find_map(|(quiz, preset)| {
                preset.questions.get(id).map(|record| PresetHit { quiz, record })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(n: u32) -> QuestionId {
        QuestionId::from_digits(&n.to_string()).unwrap()
    }

    #[test]
    fn test_question_id_parsing() {
        assert_eq!(QuestionId::parse("Q30").unwrap().as_str(), "Q30");
        assert_eq!(QuestionId::parse(" 7 ").unwrap().as_str(), "Q7");
        assert_eq!(QuestionId::parse("question 12b3").unwrap().as_str(), "Q12");
        assert!(matches!(
            QuestionId::parse("abc"),
            Err(AutofillError::InvalidQuestionNumber(_))
        ));
        assert!(QuestionId::from_digits("1a").is_none());
        assert_eq!(qid(42).number(), 42);
    }

    #[test]
    fn test_question_id_keys_are_validated_on_load() {
        let ok: IndexMap<QuestionId, u8> = serde_json::from_str(r#"{"Q3": 1, "Q12": 2}"#).unwrap();
        assert_eq!(ok.keys().map(QuestionId::number).collect::<Vec<_>>(), vec![3, 12]);
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"Q3":1,"Q12":2}"#);

        for bad in [r#"{"foo": 1}"#, r#"{"Q": 1}"#, r#"{"12": 1}"#, r#"{"Q1a": 1}"#] {
            assert!(serde_json::from_str::<IndexMap<QuestionId, u8>>(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_question_type_serde() {
        assert_eq!(serde_json::to_string(&QuestionType::MultiAnswer).unwrap(), "\"multianswer\"");
        assert_eq!(serde_json::to_string(&QuestionType::Ddwtos).unwrap(), "\"ddwtos\"");
        let parsed: QuestionType = serde_json::from_str("\"gapselect\"").unwrap();
        assert_eq!(parsed, QuestionType::Unknown);
    }

    #[test]
    fn test_infer_from_text() {
        assert_eq!(QuestionType::infer_from_text("a || b"), QuestionType::MultiAnswer);
        assert_eq!(QuestionType::infer_from_text("London"), QuestionType::AnswersSelect);
        assert_eq!(QuestionType::infer_from_text("alpha beta"), QuestionType::Ddwtos);
    }

    #[test]
    fn test_text_is_joined_parts() {
        let mut mapping = IndexMap::new();
        mapping.insert("1".to_string(), "alpha".to_string());
        mapping.insert("2".to_string(), "beta".to_string());
        let record = AnswerRecord::drag_drop(mapping, vec!["alpha".into(), "beta".into()], 1);
        assert_eq!(record.text, join_parts(record.parts.as_deref().unwrap()));

        let record = AnswerRecord::multi_answer(vec!["x".into(), "".into(), "z".into()], 1);
        assert_eq!(record.text, "x ||  || z");

        let empty = AnswerRecord::multi_answer(vec!["".into(), "".into()], 1);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_record_wire_format() {
        let record = AnswerRecord::selected(vec!["Paris".into()], 1_700_000_000_000);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "answersselect");
        assert_eq!(json["capturedAt"], 1_700_000_000_000i64);
        assert_eq!(json["structured"]["selected"][0], "Paris");
        assert!(json.get("parts").is_none());
    }

    #[test]
    fn test_structured_shapes() {
        let drag: Structured = serde_json::from_str(r#"{"mapping":{"1":"a"},"places":[1]}"#).unwrap();
        assert!(matches!(drag, Structured::DragDrop { ref parts, .. } if parts.is_empty()));

        let single: Structured = serde_json::from_str(r#"{"selectedIndex":1,"selectedText":"London"}"#).unwrap();
        assert!(matches!(single, Structured::SelectedText { ref selected_text, .. } if selected_text == "London"));

        let parts: Structured = serde_json::from_str(r#"{"parts":["a","b"]}"#).unwrap();
        assert!(matches!(parts, Structured::Parts { .. }));

        let empty: Structured = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Structured::default());
    }

    #[test]
    fn test_manual_record_reads_saved_at() {
        let record: AnswerRecord =
            serde_json::from_str(r#"{"type":"multianswer","text":"a || b","savedAt":5}"#).unwrap();
        assert_eq!(record.captured_at, 5);
        assert_eq!(record.structured, Structured::default());
        assert_eq!(record.paste_text(), "a || b");
    }

    #[test]
    fn test_paste_text() {
        let multi = AnswerRecord::multi_answer(vec!["one".into(), "two".into()], 0);
        assert_eq!(multi.paste_text(), "one || two");

        let single = AnswerRecord {
            question_type: QuestionType::AnswersSelect,
            text: String::new(),
            parts: None,
            structured: Structured::SelectedText {
                selected_text: "London".into(),
                selected_index: Some(1),
            },
            captured_at: 0,
        };
        assert_eq!(single.paste_text(), "London");
    }

    #[test]
    fn test_delete_last_question_removes_quiz() {
        let mut store = PresetStore::new();
        store.upsert_question("Ethics", qid(1), AnswerRecord::manual("a", 1), 1);
        store.upsert_question("Ethics", qid(2), AnswerRecord::manual("b", 2), 2);

        assert_eq!(store.delete_question("Ethics", &qid(1)).unwrap(), DeleteOutcome::QuestionRemoved);
        assert_eq!(store.delete_question("Ethics", &qid(2)).unwrap(), DeleteOutcome::QuizRemoved);
        assert!(store.get("Ethics").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_missing() {
        let mut store = PresetStore::new();
        assert!(matches!(store.delete_quiz("Nope"), Err(AutofillError::QuizNotFound(_))));
        store.upsert_question("Ethics", qid(1), AnswerRecord::manual("a", 1), 1);
        assert!(matches!(
            store.delete_question("Ethics", &qid(9)),
            Err(AutofillError::PresetNotFound { .. })
        ));
    }

    #[test]
    fn test_quiz_names_are_exact() {
        let mut store = PresetStore::new();
        store.upsert_question("Ethics", qid(1), AnswerRecord::manual("a", 1), 1);
        store.upsert_question("ethics", qid(1), AnswerRecord::manual("b", 1), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.quiz_names().collect::<Vec<_>>(), vec!["Ethics", "ethics"]);
    }

    #[test]
    fn test_upsert_timestamps() {
        let mut store = PresetStore::new();
        store.upsert_question("Ethics", qid(1), AnswerRecord::manual("a", 10), 10);
        store.upsert_question("Ethics", qid(1), AnswerRecord::manual("b", 20), 20);

        let preset = store.get("Ethics").unwrap();
        assert_eq!(preset.created_at, Some(10));
        assert_eq!(preset.updated_at, Some(20));
        assert_eq!(preset.questions.len(), 1);
        assert_eq!(preset.questions[&qid(1)].text, "b");
    }

    #[test]
    fn test_find_question_prefers_quiz() {
        let mut store = PresetStore::new();
        store.upsert_question("First", qid(3), AnswerRecord::manual("first", 1), 1);
        store.upsert_question("Second", qid(3), AnswerRecord::manual("second", 1), 1);

        let hit = store.find_question(Some("Second"), &qid(3)).unwrap();
        assert_eq!(hit.quiz, "Second");
        assert_eq!(hit.record.text, "second");

        let hit = store.find_question(Some("Missing"), &qid(3)).unwrap();
        assert_eq!(hit.quiz, "First");

        assert!(store.find_question(None, &qid(4)).is_none());
    }

    #[test]
    fn test_sorted_question_ids() {
        let mut preset = QuizPreset::new(0);
        for n in [10, 2, 1] {
            preset.questions.insert(qid(n), AnswerRecord::manual("x", 0));
        }
        let ids: Vec<&str> = preset.sorted_question_ids().into_iter().map(QuestionId::as_str).collect();
        assert_eq!(ids, vec!["Q1", "Q2", "Q10"]);
    }
}
