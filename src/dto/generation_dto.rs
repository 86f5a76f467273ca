use crate::models::question::{GeneratedQuestion, QuestionType};
use crate::services::distribution::TopicDistribution;
use crate::services::runner_service::RunProgress;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DistributionPayload {
    pub course_id: Uuid,
    #[validate(range(min = 1, message = "Total questions must be at least 1"))]
    pub total_questions: i64,
}

#[derive(Debug, Serialize)]
pub struct DistributionResponse {
    pub distribution: Vec<TopicDistribution>,
    pub total_questions: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuestionPayload {
    pub exam_id: Uuid,
    pub course_id: Uuid,
    pub topic_id: Uuid,
    pub question_type: QuestionType,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveQuestionPayload {
    pub topic_id: Uuid,
    #[validate(length(min = 1))]
    pub question_statement: String,
    pub options: Option<Vec<String>>,
    #[validate(length(min = 1))]
    pub answer: String,
    #[validate(length(min = 1))]
    pub solution: String,
    pub question_type: QuestionType,
    pub part_id: Option<Uuid>,
    pub slot_id: Option<Uuid>,
    #[serde(default = "default_correct_marks")]
    pub correct_marks: Decimal,
    #[serde(default = "default_incorrect_marks")]
    pub incorrect_marks: Decimal,
    #[serde(default = "default_skipped_marks")]
    pub skipped_marks: Decimal,
    #[serde(default = "default_time_minutes")]
    pub time_minutes: Decimal,
}

impl SaveQuestionPayload {
    pub fn into_question(self) -> (GeneratedQuestion, QuestionMetadata) {
        let question = GeneratedQuestion {
            question_statement: self.question_statement,
            options: self.options,
            answer: self.answer,
            solution: self.solution,
            question_type: self.question_type,
        };
        let metadata = QuestionMetadata {
            topic_id: self.topic_id,
            part_id: self.part_id,
            slot_id: self.slot_id,
            correct_marks: self.correct_marks,
            incorrect_marks: self.incorrect_marks,
            skipped_marks: self.skipped_marks,
            time_minutes: self.time_minutes,
        };
        (question, metadata)
    }
}

#[derive(Debug, Clone)]
pub struct QuestionMetadata {
    pub topic_id: Uuid,
    pub part_id: Option<Uuid>,
    pub slot_id: Option<Uuid>,
    pub correct_marks: Decimal,
    pub incorrect_marks: Decimal,
    pub skipped_marks: Decimal,
    pub time_minutes: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SaveQuestionsResponse {
    pub saved: usize,
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AutoGeneratePayload {
    pub exam_id: Uuid,
    pub course_id: Uuid,
    #[validate(range(min = 1, message = "Total questions must be at least 1"))]
    pub total_questions: i64,
    // Falls back to MCQ, matching the historical batch behavior.
    #[serde(default)]
    pub question_type: Option<QuestionType>,
    pub part_id: Option<Uuid>,
    pub slot_id: Option<Uuid>,
    #[serde(default = "default_correct_marks")]
    pub correct_marks: Decimal,
    #[serde(default = "default_incorrect_marks")]
    pub incorrect_marks: Decimal,
    #[serde(default = "default_skipped_marks")]
    pub skipped_marks: Decimal,
    #[serde(default = "default_time_minutes")]
    pub time_minutes: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PyqRunPayload {
    pub exam_id: Uuid,
    pub course_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RunStatusResponse {
    pub running: bool,
    pub paused: bool,
    #[serde(flatten)]
    pub progress: RunProgress,
}

fn default_correct_marks() -> Decimal {
    Decimal::from(4)
}

fn default_incorrect_marks() -> Decimal {
    Decimal::from(-1)
}

fn default_skipped_marks() -> Decimal {
    Decimal::ZERO
}

fn default_time_minutes() -> Decimal {
    Decimal::from(2)
}
