use crate::error::Result;
use crate::models::question::{GeneratedQuestion, PyqQuestion};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

// A reviewed question ready to be written to new_questions, together with
// its part/slot tags and marking scheme.
#[derive(Debug, Clone)]
pub struct NewQuestionRecord {
    pub topic_id: Uuid,
    pub question: GeneratedQuestion,
    pub part_id: Option<Uuid>,
    pub slot_id: Option<Uuid>,
    pub correct_marks: Decimal,
    pub incorrect_marks: Decimal,
    pub skipped_marks: Decimal,
    pub time_minutes: Decimal,
}

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Historical question statements for a topic, quoted into prompts as
    /// style/difficulty inspiration.
    pub async fn existing_statements(&self, topic_id: Uuid) -> Result<Vec<String>> {
        let statements = sqlx::query_scalar::<_, String>(
            "SELECT question_statement FROM questions_topic_wise WHERE topic_id = $1",
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(statements)
    }

    /// Statements already generated for a topic in earlier runs, quoted into
    /// prompts to steer the model away from duplicates.
    pub async fn generated_statements(&self, topic_id: Uuid) -> Result<Vec<String>> {
        let statements = sqlx::query_scalar::<_, String>(
            "SELECT question_statement FROM new_questions WHERE topic_id = $1",
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(statements)
    }

    pub async fn insert_generated(&self, record: &NewQuestionRecord) -> Result<Uuid> {
        let options_json = record
            .question
            .options
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let row = sqlx::query(
            r#"
            INSERT INTO new_questions (
                topic_id, question_statement, options, answer, solution, question_type,
                part_id, slot_id, correct_marks, incorrect_marks, skipped_marks, time_minutes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(record.topic_id)
        .bind(&record.question.question_statement)
        .bind(options_json)
        .bind(&record.question.answer)
        .bind(&record.question.solution)
        .bind(record.question.question_type.as_str())
        .bind(record.part_id)
        .bind(record.slot_id)
        .bind(record.correct_marks)
        .bind(record.incorrect_marks)
        .bind(record.skipped_marks)
        .bind(record.time_minutes)
        .fetch_one(&self.pool)
        .await?;

        let id: Uuid = row.try_get("id")?;
        Ok(id)
    }

    /// Historical questions still missing both answer and solution.
    pub async fn unanswered_pyqs(&self) -> Result<Vec<PyqQuestion>> {
        let pyqs = sqlx::query_as::<_, PyqQuestion>(
            r#"
            SELECT id, topic_id, question_statement, question_type, options
            FROM questions_topic_wise
            WHERE answer IS NULL AND solution IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(pyqs)
    }

    pub async fn save_pyq_solution(&self, id: Uuid, answer: &str, solution: &str) -> Result<()> {
        sqlx::query(
            "UPDATE questions_topic_wise SET answer = $2, solution = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(answer)
        .bind(solution)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
