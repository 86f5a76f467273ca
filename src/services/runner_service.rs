use crate::dto::generation_dto::{
    AutoGeneratePayload, DistributionResponse, PyqRunPayload, RunStatusResponse,
};
use crate::error::{Error, Result};
use crate::models::question::{PyqQuestion, QuestionContext, QuestionType};
use crate::services::catalog_service::CatalogService;
use crate::services::distribution::{
    calculate_question_distribution, total_questions_from_distribution, TopicDistribution,
};
use crate::services::gemini_service::GeminiService;
use crate::services::question_service::{NewQuestionRecord, QuestionService};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunProgress {
    pub questions_generated: u64,
    pub pyq_solutions: u64,
    pub total_questions: u64,
    pub current_topic: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct RunnerState {
    running: AtomicBool,
    paused: AtomicBool,
    progress: Mutex<RunProgress>,
}

/// Drives batch generation and PYQ backfill runs in a background task.
///
/// The pause flag is cooperative: it is read only between iterations, so a
/// generate or solve call that has already started (including its internal
/// validation retries) always runs to completion. Per-item failures are
/// logged and skipped so a run degrades instead of aborting.
#[derive(Clone)]
pub struct GenerationRunner {
    state: Arc<RunnerState>,
    catalog: CatalogService,
    questions: QuestionService,
    gemini: GeminiService,
}

impl GenerationRunner {
    pub fn new(catalog: CatalogService, questions: QuestionService, gemini: GeminiService) -> Self {
        Self {
            state: Arc::new(RunnerState::default()),
            catalog,
            questions,
            gemini,
        }
    }

    pub async fn start_auto(&self, payload: AutoGeneratePayload) -> Result<DistributionResponse> {
        self.claim_run()?;

        let plan = match self.build_plan(payload.course_id, payload.total_questions).await {
            Ok(plan) => plan,
            Err(e) => {
                self.release_run();
                return Err(e);
            }
        };
        if plan.is_empty() {
            self.release_run();
            return Err(Error::NotFound(
                "No topics found for this course".to_string(),
            ));
        }

        let total_questions = total_questions_from_distribution(&plan);
        self.reset_progress(total_questions.max(0) as u64);

        let runner = self.clone();
        let run_plan = plan.clone();
        tokio::spawn(async move {
            runner.run_auto(run_plan, payload).await;
            runner.release_run();
            tracing::info!("auto generation run finished");
        });

        Ok(DistributionResponse {
            distribution: plan,
            total_questions,
        })
    }

    pub async fn start_pyq(&self, payload: PyqRunPayload) -> Result<usize> {
        self.claim_run()?;

        let pyqs = match self.questions.unanswered_pyqs().await {
            Ok(pyqs) => pyqs,
            Err(e) => {
                self.release_run();
                return Err(e);
            }
        };
        if pyqs.is_empty() {
            self.release_run();
            return Err(Error::NotFound(
                "No PYQs found without answers/solutions".to_string(),
            ));
        }

        let queued = pyqs.len();
        self.reset_progress(queued as u64);

        let runner = self.clone();
        tokio::spawn(async move {
            runner.run_pyq(pyqs, payload).await;
            runner.release_run();
            tracing::info!("PYQ solution run finished");
        });

        Ok(queued)
    }

    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::SeqCst);
    }

    pub fn status(&self) -> RunStatusResponse {
        RunStatusResponse {
            running: self.state.running.load(Ordering::SeqCst),
            paused: self.state.paused.load(Ordering::SeqCst),
            progress: self.state.progress.lock().unwrap().clone(),
        }
    }

    pub async fn preview_distribution(
        &self,
        course_id: Uuid,
        total_questions: i64,
    ) -> Result<DistributionResponse> {
        let plan = self.build_plan(course_id, total_questions).await?;
        let total_questions = total_questions_from_distribution(&plan);
        Ok(DistributionResponse {
            distribution: plan,
            total_questions,
        })
    }

    async fn build_plan(
        &self,
        course_id: Uuid,
        total_questions: i64,
    ) -> Result<Vec<TopicDistribution>> {
        let topics = self.catalog.course_topics(course_id).await?;
        Ok(calculate_question_distribution(&topics, total_questions))
    }

    async fn run_auto(&self, plan: Vec<TopicDistribution>, payload: AutoGeneratePayload) {
        let question_type = payload.question_type.unwrap_or(QuestionType::Mcq);

        for dist in &plan {
            if self.state.paused.load(Ordering::SeqCst) {
                break;
            }

            let context = match self
                .catalog
                .question_context(payload.exam_id, payload.course_id, dist.topic_id)
                .await
            {
                Ok(Some(context)) => context,
                Ok(None) => {
                    tracing::warn!(topic = %dist.topic_name, "no context for topic, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = ?e, topic = %dist.topic_name, "failed to resolve topic context, skipping");
                    continue;
                }
            };

            self.set_current_topic(Some(dist.topic_name.clone()));

            // Historical excerpts are loaded once per topic; the
            // already-generated list is re-read per slot so every prompt sees
            // the questions persisted just before it.
            let existing = match self.questions.existing_statements(dist.topic_id).await {
                Ok(statements) => statements,
                Err(e) => {
                    tracing::warn!(error = ?e, topic = %dist.topic_name, "could not load existing questions");
                    Vec::new()
                }
            };

            for _ in 0..dist.questions_to_generate {
                if self.state.paused.load(Ordering::SeqCst) {
                    break;
                }

                match self
                    .generate_slot(dist, question_type, &existing, &context, &payload)
                    .await
                {
                    Ok(()) => {
                        let mut progress = self.state.progress.lock().unwrap();
                        progress.questions_generated += 1;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, topic = %dist.topic_name, "question generation failed, skipping");
                        self.record_error(&e);
                    }
                }
            }
        }

        self.set_current_topic(None);
    }

    async fn generate_slot(
        &self,
        dist: &TopicDistribution,
        question_type: QuestionType,
        existing: &[String],
        context: &QuestionContext,
        payload: &AutoGeneratePayload,
    ) -> Result<()> {
        let already_generated = self.questions.generated_statements(dist.topic_id).await?;

        let question = self
            .gemini
            .generate_question(
                question_type,
                dist.topic_id,
                existing,
                &already_generated,
                context,
            )
            .await?;

        let record = NewQuestionRecord {
            topic_id: dist.topic_id,
            question,
            part_id: payload.part_id,
            slot_id: payload.slot_id,
            correct_marks: payload.correct_marks,
            incorrect_marks: payload.incorrect_marks,
            skipped_marks: payload.skipped_marks,
            time_minutes: payload.time_minutes,
        };
        self.questions.insert_generated(&record).await?;
        Ok(())
    }

    async fn run_pyq(&self, pyqs: Vec<PyqQuestion>, payload: PyqRunPayload) {
        for pyq in &pyqs {
            if self.state.paused.load(Ordering::SeqCst) {
                break;
            }

            match self.solve_one(pyq, &payload).await {
                Ok(()) => {
                    let mut progress = self.state.progress.lock().unwrap();
                    progress.pyq_solutions += 1;
                }
                Err(e) => {
                    tracing::error!(error = ?e, pyq_id = %pyq.id, "PYQ solution generation failed, skipping");
                    self.record_error(&e);
                }
            }
        }
    }

    async fn solve_one(&self, pyq: &PyqQuestion, payload: &PyqRunPayload) -> Result<()> {
        let context = self
            .catalog
            .question_context(payload.exam_id, payload.course_id, pyq.topic_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No context for topic {}", pyq.topic_id)))?;

        let question_type: QuestionType = pyq.question_type.parse().map_err(Error::BadRequest)?;
        let options: Option<Vec<String>> = pyq
            .options
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        let solution = self
            .gemini
            .solve_pyq(
                &pyq.question_statement,
                question_type,
                options.as_deref(),
                &context,
            )
            .await?;

        self.questions
            .save_pyq_solution(pyq.id, &solution.answer, &solution.solution)
            .await?;
        Ok(())
    }

    fn claim_run(&self) -> Result<()> {
        self.state
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::BadRequest("A generation run is already in progress".to_string()))?;
        Ok(())
    }

    fn release_run(&self) {
        self.state.running.store(false, Ordering::SeqCst);
    }

    fn reset_progress(&self, total_questions: u64) {
        self.state.paused.store(false, Ordering::SeqCst);
        let mut progress = self.state.progress.lock().unwrap();
        *progress = RunProgress {
            total_questions,
            ..RunProgress::default()
        };
    }

    fn set_current_topic(&self, topic: Option<String>) {
        self.state.progress.lock().unwrap().current_topic = topic;
    }

    fn record_error(&self, error: &Error) {
        self.state.progress.lock().unwrap().last_error = Some(error.to_string());
    }
}
