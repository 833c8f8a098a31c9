//! Quiz engine
//!
//! Everything here works on a [`DomTree`](crate::dom::DomTree) snapshot:
//! - locator: active question and question number detection
//! - classifier: question type detection
//! - extractor: answers out of review pages
//! - matching / placement: choice resolution and drag-drop placement
//! - applier: answers into attempt pages
//! - overlay: type-to-fill inputs over drop zones
//! - session: override and active-quiz state tying the above together
//! - page: the [`QuizPage`] seam between the engine and a real page

pub mod applier;
pub mod classifier;
pub mod extractor;
pub mod locator;
pub mod matching;
pub mod model;
pub mod overlay;
pub mod page;
pub mod placement;
pub mod session;

pub use applier::{ApplyOutcome, NoProgress, Progress};
pub use extractor::ExtractionReport;
pub use locator::{QuestionOverride, locate_active_question};
pub use matching::MatchedBy;
pub use model::{AnswerRecord, PresetStore, QuestionId, QuestionType, QuizPreset};
pub use page::{PageContext, PageType, QuizPage, StaticPage, detect_quiz_name};
pub use session::{QuestionStatus, QuizSession};
