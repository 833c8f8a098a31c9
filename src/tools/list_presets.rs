use crate::error::{AutofillError, Result};
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the list_presets tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListPresetsParams {
    /// Show the stored answers of this quiz instead of the quiz list
    #[serde(default)]
    pub quiz: Option<String>,
}

/// List stored quizzes, or the answers of one quiz
#[derive(Default)]
pub struct ListPresetsTool;

impl Tool for ListPresetsTool {
    type Params = ListPresetsParams;

    fn name(&self) -> &str {
        "list_presets"
    }

    fn execute_typed(&self, params: ListPresetsParams, context: &mut ToolContext) -> Result<ToolResult> {
        let repository = context.repository()?;
        context.restore_active_quiz(&repository)?;
        let presets = repository.load()?;

        if let Some(quiz) = params.quiz {
            let preset = presets
                .get(&quiz)
                .ok_or_else(|| AutofillError::QuizNotFound(quiz.clone()))?;
            let questions: Vec<_> = preset
                .sorted_question_ids()
                .into_iter()
                .map(|id| {
                    let record = &preset.questions[id];
                    serde_json::json!({
                        "question": id,
                        "type": record.question_type,
                        "text": record.paste_text(),
                    })
                })
                .collect();

            return Ok(ToolResult::success_with(serde_json::json!({
                "quiz": quiz,
                "created_at": preset.created_at,
                "updated_at": preset.updated_at,
                "questions": questions,
            })));
        }

        let quizzes: Vec<_> = presets
            .iter()
            .map(|(name, preset)| {
                serde_json::json!({
                    "quiz": name,
                    "count": preset.questions.len(),
                    "questions": preset.sorted_question_ids(),
                })
            })
            .collect();

        Ok(ToolResult::success_with(serde_json::json!({
            "host": repository.host(),
            "active_quiz": context.session.active_quiz(),
            "quizzes": quizzes,
        })))
    }
}

#[cfg(test)]
mod tests {
    use crate::quiz::model::{AnswerRecord, QuestionId};
    use crate::tools::test_support::*;
    use serde_json::json;

    #[test]
    fn test_list_quizzes_and_answers() {
        let mut harness = Harness::new(ATTEMPT_URL, "<div></div>");
        harness
            .repository()
            .update(|presets| {
                for (id, text) in [("Q10", "Rome"), ("Q2", "duty || reason")] {
                    presets.upsert_question("Week 1", QuestionId::parse(id).unwrap(), AnswerRecord::manual(text, 1), 1);
                }
                Ok(())
            })
            .unwrap();

        let all = harness.run("list_presets", json!({})).data.unwrap();
        assert_eq!(all["host"], "lms.example.edu");
        assert_eq!(all["quizzes"][0]["count"], 2);
        assert_eq!(all["quizzes"][0]["questions"], json!(["Q2", "Q10"]));

        let one = harness.run("list_presets", json!({"quiz": "Week 1"})).data.unwrap();
        assert_eq!(one["questions"][0]["type"], "multianswer");
        assert_eq!(one["questions"][1]["text"], "Rome");

        let missing = harness.run("list_presets", json!({"quiz": "Week 9"}));
        assert!(!missing.success);
    }
}
