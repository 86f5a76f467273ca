use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::generation_dto::{
        AutoGeneratePayload, DistributionPayload, GenerateQuestionPayload, PyqRunPayload,
        SaveQuestionPayload, SaveQuestionsResponse,
    },
    error::{Error, Result},
    services::question_service::NewQuestionRecord,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/generation/distribution",
    request_body = DistributionPayload,
    responses(
        (status = 200, description = "Per-topic question quotas"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn preview_distribution(
    State(state): State<AppState>,
    Json(payload): Json<DistributionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state
        .runner
        .preview_distribution(payload.course_id, payload.total_questions)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/generation/question",
    request_body = GenerateQuestionPayload,
    responses(
        (status = 200, description = "A freshly generated question, not yet persisted"),
        (status = 404, description = "Unknown topic"),
        (status = 502, description = "Generation backend unavailable")
    )
)]
#[axum::debug_handler]
pub async fn generate_question(
    State(state): State<AppState>,
    Json(payload): Json<GenerateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let context = state
        .catalog_service
        .question_context(payload.exam_id, payload.course_id, payload.topic_id)
        .await?
        .ok_or_else(|| Error::NotFound("Could not load context information".to_string()))?;

    let existing = state
        .question_service
        .existing_statements(payload.topic_id)
        .await?;
    let already_generated = state
        .question_service
        .generated_statements(payload.topic_id)
        .await?;

    let question = state
        .gemini_service
        .generate_question(
            payload.question_type,
            payload.topic_id,
            &existing,
            &already_generated,
            &context,
        )
        .await?;

    Ok(Json(question))
}

#[utoipa::path(
    post,
    path = "/api/generation/questions",
    request_body = Vec<SaveQuestionPayload>,
    responses(
        (status = 201, description = "Questions persisted", body = Json<SaveQuestionsResponse>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn save_questions(
    State(state): State<AppState>,
    Json(payload): Json<Vec<SaveQuestionPayload>>,
) -> Result<impl IntoResponse> {
    if payload.is_empty() {
        return Err(Error::BadRequest("No questions to save".to_string()));
    }

    let mut ids = Vec::with_capacity(payload.len());
    for item in payload {
        item.validate()?;
        let (question, metadata) = item.into_question();
        let record = NewQuestionRecord {
            topic_id: metadata.topic_id,
            question,
            part_id: metadata.part_id,
            slot_id: metadata.slot_id,
            correct_marks: metadata.correct_marks,
            incorrect_marks: metadata.incorrect_marks,
            skipped_marks: metadata.skipped_marks,
            time_minutes: metadata.time_minutes,
        };
        let id = state.question_service.insert_generated(&record).await?;
        ids.push(id);
    }

    let response = SaveQuestionsResponse {
        saved: ids.len(),
        ids,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/generation/auto",
    request_body = AutoGeneratePayload,
    responses(
        (status = 202, description = "Batch run started; body carries the distribution plan"),
        (status = 400, description = "Invalid payload or a run is already in progress"),
        (status = 404, description = "No topics found for the course")
    )
)]
#[axum::debug_handler]
pub async fn start_auto_generation(
    State(state): State<AppState>,
    Json(payload): Json<AutoGeneratePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.runner.start_auto(payload).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/generation/auto/pause",
    responses(
        (status = 200, description = "Pause requested; takes effect at the next iteration boundary")
    )
)]
#[axum::debug_handler]
pub async fn pause_generation(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.runner.pause();
    Ok(Json(state.runner.status()))
}

#[utoipa::path(
    get,
    path = "/api/generation/status",
    responses(
        (status = 200, description = "Current run state and counters")
    )
)]
#[axum::debug_handler]
pub async fn generation_status(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.runner.status()))
}

#[utoipa::path(
    post,
    path = "/api/generation/pyq",
    request_body = PyqRunPayload,
    responses(
        (status = 202, description = "Solution backfill run started"),
        (status = 404, description = "No unanswered PYQs to solve")
    )
)]
#[axum::debug_handler]
pub async fn start_pyq_solutions(
    State(state): State<AppState>,
    Json(payload): Json<PyqRunPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let queued = state.runner.start_pyq(payload).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "queued": queued }))))
}
