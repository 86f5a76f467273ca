use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuestionType {
    Mcq,
    Msq,
    Nat,
    Sub,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::Msq => "MSQ",
            QuestionType::Nat => "NAT",
            QuestionType::Sub => "SUB",
        }
    }

    pub fn has_options(&self) -> bool {
        matches!(self, QuestionType::Mcq | QuestionType::Msq)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MCQ" => Ok(QuestionType::Mcq),
            "MSQ" => Ok(QuestionType::Msq),
            "NAT" => Ok(QuestionType::Nat),
            "SUB" => Ok(QuestionType::Sub),
            other => Err(format!("Unknown question type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question_statement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub answer: String,
    pub solution: String,
    pub question_type: QuestionType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PyqSolution {
    pub answer: String,
    pub solution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionContext {
    pub exam_name: String,
    pub course_name: String,
    pub subject_name: String,
    pub topic_name: String,
}

// Historical question missing its answer/solution, read from questions_topic_wise.
// Options are stored as a JSON-encoded TEXT column.
#[derive(Debug, Clone, FromRow)]
pub struct PyqQuestion {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub question_statement: String,
    pub question_type: String,
    pub options: Option<String>,
}
