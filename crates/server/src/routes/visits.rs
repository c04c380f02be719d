use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    routing::{get, patch},
};
use chrono::{Duration, NaiveDate, Utc};
use db::models::{record::Record, user::User};
use db::types::VisitStatus;
use serde::Deserialize;
use serde_json::{Value, json};
use services::services::funnel;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    http::auth::{CurrentUser, require_admin},
    middleware::model_loaders::load_record_middleware,
};

const VISIT_PAGE_SIZE: u64 = 15;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/visit/{id}",
            patch(set_visit)
                .layer(from_fn_with_state(state.clone(), load_record_middleware)),
        )
        .route("/api/admin/visits", get(pending_visits))
        .route("/api/admin/visited-records", get(visited_records))
        .route("/api/admin/visit-stats", get(visit_stats))
        .route("/api/admin/progress", get(daily_progress))
}

#[derive(Debug, Deserialize)]
struct SetVisitRequest {
    status: VisitStatus,
}

async fn set_visit(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(record): Extension<Record>,
    Json(payload): Json<SetVisitRequest>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    require_admin(&user)?;
    let updated =
        funnel::set_visit_status(&state.db.conn, record.id, payload.status, user.id).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[derive(Debug, Deserialize)]
struct VisitPageQuery {
    page: Option<u64>,
    search_name: Option<String>,
    search_phone: Option<String>,
}

async fn funnel_page_response(
    state: &AppState,
    visit: VisitStatus,
    query: VisitPageQuery,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let db = &state.db.conn;
    let page = query.page.unwrap_or(1).max(1);
    let result = Record::funnel_page(
        db,
        visit,
        page,
        VISIT_PAGE_SIZE,
        query.search_name.as_deref(),
        query.search_phone.as_deref(),
    )
    .await?;

    let caller_ids: Vec<i64> = result.records.iter().filter_map(|r| r.caller_id).collect();
    let names = User::names_by_ids(db, &caller_ids).await?;
    let records: Vec<Value> = result
        .records
        .iter()
        .map(|record| {
            let caller_name = record
                .caller_id
                .and_then(|id| names.get(&id).cloned())
                .unwrap_or_else(|| "Unknown".to_string());
            json!({
                "record": record,
                "caller_name": caller_name,
            })
        })
        .collect();

    Ok(Json(ApiResponse::success(json!({
        "records": records,
        "total_items": result.total_items,
        "total_pages": result.total_pages,
        "page": result.page,
    }))))
}

/// Responded records still awaiting a visit decision.
async fn pending_visits(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<VisitPageQuery>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_admin(&user)?;
    funnel_page_response(&state, VisitStatus::Pending, query).await
}

async fn visited_records(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<VisitPageQuery>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_admin(&user)?;
    funnel_page_response(&state, VisitStatus::Visited, query).await
}

async fn caller_stats(
    state: &AppState,
    caller_id: Option<i64>,
) -> Result<Value, ApiError> {
    let db = &state.db.conn;
    let responses = Record::count_responded(db, caller_id).await?;
    let visited = Record::count_visit(db, caller_id, VisitStatus::Visited).await?;
    let confirmed = Record::count_visit(db, caller_id, VisitStatus::Confirmed).await?;
    let declined = Record::count_visit(db, caller_id, VisitStatus::Declined).await?;
    let pending = Record::count_pending_responded(db, caller_id).await?;
    let visits_done = visited + confirmed;
    let conversion_rate = if responses > 0 {
        confirmed as f64 / responses as f64 * 100.0
    } else {
        0.0
    };
    Ok(json!({
        "responses": responses,
        "visited": visited,
        "confirmed": confirmed,
        "declined": declined,
        "pending": pending,
        "visits_done": visits_done,
        "conversion_rate": conversion_rate,
    }))
}

/// Funnel counters per caller plus the overall totals.
async fn visit_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_admin(&user)?;
    let callers = User::find_callers(&state.db.conn).await?;
    let mut per_caller = Vec::with_capacity(callers.len());
    for caller in &callers {
        let stats = caller_stats(&state, Some(caller.id)).await?;
        per_caller.push(json!({
            "caller_id": caller.id,
            "caller_name": caller.name,
            "stats": stats,
        }));
    }
    let overall = caller_stats(&state, None).await?;
    Ok(Json(ApiResponse::success(json!({
        "callers": per_caller,
        "overall": overall,
    }))))
}

#[derive(Debug, Deserialize)]
struct ProgressQuery {
    date: Option<String>,
}

/// Responses each caller recorded on the given day (default today) against
/// their total assignment.
async fn daily_progress(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_admin(&user)?;
    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest(format!("Invalid date: {raw}")))?,
        None => Utc::now().date_naive(),
    };
    let start = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid date: {date}")))?
        .and_utc();
    let end = start + Duration::days(1);

    let db = &state.db.conn;
    let callers = User::find_callers(db).await?;
    let mut progress = Vec::with_capacity(callers.len());
    for caller in &callers {
        let responses_today =
            Record::count_responded_between(db, caller.id, start, end).await?;
        let total_assigned = Record::count_by_caller(db, caller.id).await?;
        progress.push(json!({
            "caller_id": caller.id,
            "caller_name": caller.name,
            "responses_today": responses_today,
            "total_assigned": total_assigned,
        }));
    }
    Ok(Json(ApiResponse::success(json!({
        "date": date.to_string(),
        "callers": progress,
    }))))
}
