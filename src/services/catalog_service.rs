use crate::error::Result;
use crate::models::hierarchy::{Chapter, Course, Exam, Part, Slot, Subject, Topic, Unit};
use crate::models::question::QuestionContext;
use crate::services::distribution::TopicWeight;
use sqlx::PgPool;
use uuid::Uuid;

// Read side of the exam hierarchy. Queries use the runtime sqlx API so the
// crate builds without a live database.
#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_exams(&self) -> Result<Vec<Exam>> {
        let exams = sqlx::query_as::<_, Exam>(
            "SELECT id, name, created_at FROM exams ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(exams)
    }

    pub async fn list_courses(&self, exam_id: Uuid) -> Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT id, exam_id, name, created_at FROM courses WHERE exam_id = $1 ORDER BY name",
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    pub async fn list_subjects(&self, course_id: Uuid) -> Result<Vec<Subject>> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT id, course_id, name, created_at FROM subjects WHERE course_id = $1 ORDER BY name",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }

    pub async fn list_units(&self, subject_id: Uuid) -> Result<Vec<Unit>> {
        let units = sqlx::query_as::<_, Unit>(
            "SELECT id, subject_id, name, created_at FROM units WHERE subject_id = $1 ORDER BY name",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(units)
    }

    pub async fn list_chapters(&self, unit_id: Uuid) -> Result<Vec<Chapter>> {
        let chapters = sqlx::query_as::<_, Chapter>(
            "SELECT id, unit_id, name, created_at FROM chapters WHERE unit_id = $1 ORDER BY name",
        )
        .bind(unit_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(chapters)
    }

    pub async fn list_topics(&self, chapter_id: Uuid) -> Result<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>(
            "SELECT id, chapter_id, name, weightage, created_at FROM topics WHERE chapter_id = $1 ORDER BY name",
        )
        .bind(chapter_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(topics)
    }

    pub async fn list_parts(&self, course_id: Uuid) -> Result<Vec<Part>> {
        let parts = sqlx::query_as::<_, Part>(
            "SELECT id, course_id, name, created_at FROM parts WHERE course_id = $1 ORDER BY name",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(parts)
    }

    pub async fn list_slots(&self, course_id: Uuid) -> Result<Vec<Slot>> {
        let slots = sqlx::query_as::<_, Slot>(
            "SELECT id, course_id, name, created_at FROM slots WHERE course_id = $1 ORDER BY name",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(slots)
    }

    /// Every topic under a course, flattened across the
    /// subject/unit/chapter levels, with NULL weightage read as zero.
    pub async fn course_topics(&self, course_id: Uuid) -> Result<Vec<TopicWeight>> {
        let rows = sqlx::query_as::<_, (Uuid, String, Option<f64>)>(
            r#"
            SELECT t.id, t.name, t.weightage
            FROM topics t
            JOIN chapters ch ON ch.id = t.chapter_id
            JOIN units u     ON u.id = ch.unit_id
            JOIN subjects s  ON s.id = u.subject_id
            WHERE s.course_id = $1
            ORDER BY s.name, u.name, ch.name, t.name
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, weightage)| TopicWeight {
                id,
                name,
                weightage: weightage.unwrap_or(0.0),
            })
            .collect())
    }

    /// Resolves the prompt context for a topic: subject and topic names come
    /// from the hierarchy walk, exam and course names from the caller's
    /// selection. None when any link of the chain is missing.
    pub async fn question_context(
        &self,
        exam_id: Uuid,
        course_id: Uuid,
        topic_id: Uuid,
    ) -> Result<Option<QuestionContext>> {
        let context = sqlx::query_as::<_, QuestionContext>(
            r#"
            SELECT e.name  AS exam_name,
                   co.name AS course_name,
                   s.name  AS subject_name,
                   t.name  AS topic_name
            FROM topics t
            JOIN chapters ch ON ch.id = t.chapter_id
            JOIN units u     ON u.id = ch.unit_id
            JOIN subjects s  ON s.id = u.subject_id
            JOIN courses co  ON co.id = $2
            JOIN exams e     ON e.id = $1
            WHERE t.id = $3
            "#,
        )
        .bind(exam_id)
        .bind(course_id)
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(context)
    }
}
