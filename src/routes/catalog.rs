use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{error::Result, AppState};

#[utoipa::path(
    get,
    path = "/api/catalog/exams",
    responses(
        (status = 200, description = "List of exams")
    )
)]
#[axum::debug_handler]
pub async fn list_exams(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let exams = state.catalog_service.list_exams().await?;
    Ok(Json(exams))
}

#[utoipa::path(
    get,
    path = "/api/catalog/exams/{id}/courses",
    params(
        ("id" = Uuid, Path, description = "Exam ID")
    ),
    responses(
        (status = 200, description = "Courses of an exam")
    )
)]
#[axum::debug_handler]
pub async fn list_courses(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let courses = state.catalog_service.list_courses(id).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/catalog/courses/{id}/subjects",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Subjects of a course")
    )
)]
#[axum::debug_handler]
pub async fn list_subjects(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let subjects = state.catalog_service.list_subjects(id).await?;
    Ok(Json(subjects))
}

#[utoipa::path(
    get,
    path = "/api/catalog/subjects/{id}/units",
    params(
        ("id" = Uuid, Path, description = "Subject ID")
    ),
    responses(
        (status = 200, description = "Units of a subject")
    )
)]
#[axum::debug_handler]
pub async fn list_units(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let units = state.catalog_service.list_units(id).await?;
    Ok(Json(units))
}

#[utoipa::path(
    get,
    path = "/api/catalog/units/{id}/chapters",
    params(
        ("id" = Uuid, Path, description = "Unit ID")
    ),
    responses(
        (status = 200, description = "Chapters of a unit")
    )
)]
#[axum::debug_handler]
pub async fn list_chapters(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let chapters = state.catalog_service.list_chapters(id).await?;
    Ok(Json(chapters))
}

#[utoipa::path(
    get,
    path = "/api/catalog/chapters/{id}/topics",
    params(
        ("id" = Uuid, Path, description = "Chapter ID")
    ),
    responses(
        (status = 200, description = "Topics of a chapter")
    )
)]
#[axum::debug_handler]
pub async fn list_topics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let topics = state.catalog_service.list_topics(id).await?;
    Ok(Json(topics))
}

#[utoipa::path(
    get,
    path = "/api/catalog/courses/{id}/parts",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Parts of a course")
    )
)]
#[axum::debug_handler]
pub async fn list_parts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let parts = state.catalog_service.list_parts(id).await?;
    Ok(Json(parts))
}

#[utoipa::path(
    get,
    path = "/api/catalog/courses/{id}/slots",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Slots of a course")
    )
)]
#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let slots = state.catalog_service.list_slots(id).await?;
    Ok(Json(slots))
}

#[utoipa::path(
    get,
    path = "/api/catalog/courses/{id}/topics",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "All topics under a course with weightages")
    )
)]
#[axum::debug_handler]
pub async fn list_course_topics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let topics = state.catalog_service.course_topics(id).await?;
    let body: Vec<serde_json::Value> = topics
        .into_iter()
        .map(|t| {
            serde_json::json!({
                "id": t.id,
                "name": t.name,
                "weightage": t.weightage,
            })
        })
        .collect();
    Ok(Json(body))
}
