use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, Duration, Utc};
use db::models::{
    task::{CreateTask, Task, TaskError, UpdateTask},
    user::User,
};
use db::types::TaskStatus;
use serde::Deserialize;
use serde_json::{Value, json};
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    http::auth::{CurrentUser, require_admin, require_caller},
};

const RECENT_TASK_LIMIT: u64 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", post(create_task).get(list_tasks))
        .route("/api/tasks/self", post(create_self_task))
        .route(
            "/api/tasks/{id}",
            axum::routing::patch(update_task).delete(delete_task),
        )
        .route("/api/caller/tasks", get(caller_tasks).post(create_caller_task))
        .route("/api/caller/tasks/{id}", axum::routing::patch(update_caller_task))
        .route("/api/admin/caller-tasks", get(admin_caller_tasks))
        .route(
            "/api/admin/custom-users-progress",
            get(custom_users_progress),
        )
        .route("/api/dashboard/custom", get(custom_dashboard))
}

async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateTask>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    require_admin(&user)?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    User::find_by_id(&state.db.conn, payload.assigned_to)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignee not found".to_string()))?;
    let task = Task::create(&state.db.conn, &payload, user.id).await?;
    tracing::info!(task_id = task.id, assigned_to = task.assigned_to, "task created");
    Ok(Json(ApiResponse::success(task)))
}

/// Admins see every task; everyone else sees their own.
async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let db = &state.db.conn;
    let tasks = if user.role.is_admin() {
        Task::find_all(db).await?
    } else {
        Task::find_by_assignee(db, user.id).await?
    };
    let assignee_ids: Vec<i64> = tasks.iter().map(|t| t.assigned_to).collect();
    let names = User::names_by_ids(db, &assignee_ids).await?;
    let rows: Vec<Value> = tasks
        .iter()
        .map(|task| {
            json!({
                "task": task,
                "assignee_name": names.get(&task.assigned_to),
            })
        })
        .collect();
    Ok(Json(ApiResponse::success(json!({ "tasks": rows }))))
}

fn authorize_task_edit(user: &User, task: &Task, payload: &UpdateTask) -> Result<(), ApiError> {
    if user.role.is_admin() {
        return Ok(());
    }
    if task.assigned_to != user.id {
        return Err(ApiError::Forbidden(
            "Task belongs to another user".to_string(),
        ));
    }
    // Assignees track their own progress; shape changes stay with admins.
    if payload.title.is_some() || payload.assigned_to.is_some() || payload.deadline.is_some() {
        return Err(ApiError::Forbidden(
            "Only admins may retitle or reassign tasks".to_string(),
        ));
    }
    Ok(())
}

async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTask>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    let task = Task::find_by_id(&state.db.conn, id)
        .await?
        .ok_or(ApiError::Task(TaskError::TaskNotFound))?;
    authorize_task_edit(&user, &task, &payload)?;
    if let Some(assigned_to) = payload.assigned_to {
        User::find_by_id(&state.db.conn, assigned_to)
            .await?
            .ok_or_else(|| ApiError::NotFound("Assignee not found".to_string()))?;
    }
    let updated = Task::update(&state.db.conn, id, &payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let task = Task::find_by_id(&state.db.conn, id)
        .await?
        .ok_or(ApiError::Task(TaskError::TaskNotFound))?;
    if !user.role.is_admin() && task.assigned_to != user.id {
        return Err(ApiError::Forbidden(
            "Task belongs to another user".to_string(),
        ));
    }
    Task::delete(&state.db.conn, id).await?;
    Ok(Json(ApiResponse::success_with_message((), "Task deleted")))
}

#[derive(Debug, Deserialize)]
struct SelfTaskRequest {
    title: String,
    description: Option<String>,
    deadline: Option<DateTime<Utc>>,
}

async fn create_self_assigned(
    state: &AppState,
    user: &User,
    payload: SelfTaskRequest,
) -> Result<Task, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    let task = Task::create(
        &state.db.conn,
        &CreateTask {
            title: payload.title,
            description: payload.description,
            assigned_to: user.id,
            deadline: payload.deadline,
        },
        user.id,
    )
    .await?;
    Ok(task)
}

/// Custom-role users plan their own work.
async fn create_self_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<SelfTaskRequest>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    let task = create_self_assigned(&state, &user, payload).await?;
    Ok(Json(ApiResponse::success(task)))
}

async fn caller_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<Task>>>, ApiError> {
    require_caller(&user)?;
    let tasks = Task::find_by_assignee(&state.db.conn, user.id).await?;
    Ok(Json(ApiResponse::success(tasks)))
}

async fn create_caller_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<SelfTaskRequest>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    require_caller(&user)?;
    let task = create_self_assigned(&state, &user, payload).await?;
    Ok(Json(ApiResponse::success(task)))
}

async fn update_caller_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTask>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    require_caller(&user)?;
    let task = Task::find_by_id(&state.db.conn, id)
        .await?
        .ok_or(ApiError::Task(TaskError::TaskNotFound))?;
    authorize_task_edit(&user, &task, &payload)?;
    let updated = Task::update(&state.db.conn, id, &payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Every caller's tasks with assignee info, for the admin board.
async fn admin_caller_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_admin(&user)?;
    let db = &state.db.conn;
    let callers = User::find_callers(db).await?;
    let caller_ids: Vec<i64> = callers.iter().map(|c| c.id).collect();
    let tasks = Task::find_by_assignees(db, &caller_ids).await?;
    let names = User::names_by_ids(db, &caller_ids).await?;
    let rows: Vec<Value> = tasks
        .iter()
        .map(|task| {
            json!({
                "task": task,
                "assignee_name": names.get(&task.assigned_to),
            })
        })
        .collect();
    Ok(Json(ApiResponse::success(json!({ "tasks": rows }))))
}

/// Task statistics per custom-role user.
async fn custom_users_progress(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_admin(&user)?;
    let db = &state.db.conn;
    let now = Utc::now();
    let users = User::find_custom_users(db).await?;
    let mut progress = Vec::with_capacity(users.len());
    for custom in &users {
        let total = Task::count_for_assignee(db, custom.id).await?;
        let completed =
            Task::count_by_status(db, Some(custom.id), TaskStatus::Completed).await?;
        let overdue = Task::count_overdue_by_deadline(db, custom.id, now).await?;
        let avg_progress = Task::average_progress(db, custom.id).await?.unwrap_or(0.0);
        let recent = Task::recent_active(db, custom.id, RECENT_TASK_LIMIT).await?;
        progress.push(json!({
            "user_id": custom.id,
            "name": custom.name,
            "role": custom.role,
            "total_tasks": total,
            "completed_tasks": completed,
            "overdue_tasks": overdue,
            "average_progress": avg_progress,
            "recent_tasks": recent,
        }));
    }
    Ok(Json(ApiResponse::success(json!({ "users": progress }))))
}

/// Dashboard for custom-role users: their own tasks and counters.
async fn custom_dashboard(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let db = &state.db.conn;
    let now = Utc::now();
    let today_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now);

    let tasks = Task::find_by_assignee(db, user.id).await?;
    let overdue = Task::count_overdue_by_deadline(db, user.id, now).await?;
    let completed_today =
        Task::count_completed_between(db, user.id, today_start, today_start + Duration::days(1))
            .await?;
    let pending = Task::count_by_status(db, Some(user.id), TaskStatus::Pending).await?;
    let in_progress = Task::count_by_status(db, Some(user.id), TaskStatus::InProgress).await?;
    let completed = Task::count_by_status(db, Some(user.id), TaskStatus::Completed).await?;

    Ok(Json(ApiResponse::success(json!({
        "tasks": tasks,
        "overdue": overdue,
        "completed_today": completed_today,
        "status_breakdown": {
            "pending": pending,
            "in_progress": in_progress,
            "completed": completed,
        },
    }))))
}
