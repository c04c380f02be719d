use axum::{Extension, Json, Router, extract::State, routing::get};
use db::models::{record::Record, task::Task};
use db::types::{TaskStatus, VisitStatus};
use serde_json::{Value, json};
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    http::auth::{CurrentUser, require_admin},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reports/calls", get(calls_report))
        .route("/api/reports/tasks", get(tasks_report))
}

fn rate(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

async fn calls_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_admin(&user)?;
    let db = &state.db.conn;
    let total_records = Record::count_all(db).await?;
    let responses = Record::count_responded(db, None).await?;
    let visited = Record::count_visit(db, None, VisitStatus::Visited).await?;
    let confirmed = Record::count_visit(db, None, VisitStatus::Confirmed).await?;
    let declined = Record::count_visit(db, None, VisitStatus::Declined).await?;
    Ok(Json(ApiResponse::success(json!({
        "total_records": total_records,
        "responses": responses,
        "visited": visited,
        "confirmed": confirmed,
        "declined": declined,
        "visits_done": visited + confirmed,
        "response_rate": rate(responses, total_records),
        "conversion_rate": rate(confirmed, responses),
    }))))
}

async fn tasks_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_admin(&user)?;
    let db = &state.db.conn;
    let total = Task::count_all(db).await?;
    let pending = Task::count_by_status(db, None, TaskStatus::Pending).await?;
    let in_progress = Task::count_by_status(db, None, TaskStatus::InProgress).await?;
    let completed = Task::count_by_status(db, None, TaskStatus::Completed).await?;
    let overdue = Task::count_by_status(db, None, TaskStatus::Overdue).await?;
    Ok(Json(ApiResponse::success(json!({
        "total_tasks": total,
        "pending": pending,
        "in_progress": in_progress,
        "completed": completed,
        "overdue": overdue,
        "completion_rate": rate(completed, total),
    }))))
}
