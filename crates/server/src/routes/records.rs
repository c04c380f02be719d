use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use db::TransactionTrait;
use db::models::{
    admission::Admission,
    record::{Record, RecordPage, UpdateRecord},
};
use db::types::VisitStatus;
use serde::Deserialize;
use serde_json::{Value, json};
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    http::auth::{CurrentUser, require_admin, require_caller},
    middleware::model_loaders::load_record_middleware,
};

const CALLER_PAGE_SIZE: u64 = 50;
const NOTIFICATION_LIMIT: u64 = 10;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/records/{id}",
            patch(update_record)
                .layer(from_fn_with_state(state.clone(), load_record_middleware)),
        )
        .route("/api/caller/records", get(caller_records))
        .route("/api/caller/visit-notifications", get(visit_notifications))
        .route("/api/admin/clear-records", post(clear_records))
}

#[derive(Debug, Deserialize)]
struct CallerRecordsQuery {
    page: Option<u64>,
    search: Option<String>,
}

async fn caller_records(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<CallerRecordsQuery>,
) -> Result<Json<ApiResponse<RecordPage>>, ApiError> {
    require_caller(&user)?;
    let page = query.page.unwrap_or(1).max(1);
    let records = Record::page_for_caller(
        &state.db.conn,
        user.id,
        page,
        CALLER_PAGE_SIZE,
        query.search.as_deref(),
    )
    .await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn update_record(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(record): Extension<Record>,
    Json(payload): Json<UpdateRecord>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    if !user.role.is_admin() {
        require_caller(&user)?;
        if record.caller_id != Some(user.id) {
            return Err(ApiError::Forbidden(
                "Record belongs to another caller".to_string(),
            ));
        }
        if payload.hidden_from_caller.is_some() {
            return Err(ApiError::Forbidden(
                "Only admins may change record visibility".to_string(),
            ));
        }
    }
    let updated = Record::update_fields(&state.db.conn, record.id, &payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Recent visited and confirmed records for the caller, plus their funnel
/// counters.
async fn visit_notifications(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_caller(&user)?;
    let db = &state.db.conn;
    let recent = Record::recent_by_visit(
        db,
        user.id,
        &[VisitStatus::Visited, VisitStatus::Confirmed],
        NOTIFICATION_LIMIT,
    )
    .await?;
    let responses = Record::count_responded(db, Some(user.id)).await?;
    let visited = Record::count_visit(db, Some(user.id), VisitStatus::Visited).await?;
    let confirmed = Record::count_visit(db, Some(user.id), VisitStatus::Confirmed).await?;
    Ok(Json(ApiResponse::success(json!({
        "recent": recent,
        "stats": {
            "responses": responses,
            "visited": visited,
            "confirmed": confirmed,
            "visits_done": visited + confirmed,
        },
    }))))
}

/// Wipes the distribution state: admissions first, then the records they
/// point at.
async fn clear_records(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_admin(&user)?;
    let txn = state.db.conn.begin().await?;
    let admissions_deleted = Admission::delete_all(&txn).await?;
    let records_deleted = Record::delete_all(&txn).await?;
    txn.commit().await?;
    tracing::info!(records_deleted, admissions_deleted, "records cleared");
    Ok(Json(ApiResponse::success_with_message(
        json!({
            "records_deleted": records_deleted,
            "admissions_deleted": admissions_deleted,
        }),
        "All records cleared",
    )))
}
