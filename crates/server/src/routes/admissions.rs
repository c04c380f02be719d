use std::collections::HashMap;

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::get,
};
use db::models::{
    admission::Admission, certified_admission::CertifiedAdmission,
    other_admission::OtherAdmission, record::Record, user::User,
};
use db::types::AdmissionType;
use serde_json::{Value, json};
use services::services::funnel::{self, EnrollmentDetail};
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    http::auth::{CurrentUser, require_admin},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/other-admission/{id}",
            axum::routing::post(create_enrollment)
                .put(update_enrollment)
                .delete(delete_enrollment),
        )
        .route("/api/admin/other-admissions-list", get(list_enrollments))
        .route(
            "/api/admin/certified-office-assistant",
            get(list_certified),
        )
        .route("/api/admin/admissions", get(list_admissions))
}

/// `{id}` is the record id here; the enrollment row gets its own id.
async fn create_enrollment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(record_id): Path<i64>,
    Json(detail): Json<EnrollmentDetail>,
) -> Result<Json<ApiResponse<OtherAdmission>>, ApiError> {
    require_admin(&user)?;
    let admission =
        funnel::record_enrollment(&state.db.conn, record_id, detail, user.id).await?;
    Ok(Json(ApiResponse::success_with_message(
        admission,
        "Enrollment recorded",
    )))
}

/// `{id}` is the enrollment row id for update and delete.
async fn update_enrollment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(admission_id): Path<i64>,
    Json(detail): Json<EnrollmentDetail>,
) -> Result<Json<ApiResponse<OtherAdmission>>, ApiError> {
    require_admin(&user)?;
    let admission = funnel::update_enrollment(&state.db.conn, admission_id, detail).await?;
    Ok(Json(ApiResponse::success(admission)))
}

async fn delete_enrollment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(admission_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_admin(&user)?;
    funnel::delete_enrollment(&state.db.conn, admission_id).await?;
    Ok(Json(ApiResponse::success_with_message((), "Enrollment deleted")))
}

async fn list_enrollments(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<OtherAdmission>>>, ApiError> {
    require_admin(&user)?;
    let admissions = OtherAdmission::find_all_desc(&state.db.conn).await?;
    Ok(Json(ApiResponse::success(admissions)))
}

async fn list_certified(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<CertifiedAdmission>>>, ApiError> {
    require_admin(&user)?;
    let admissions = CertifiedAdmission::find_all_desc(&state.db.conn).await?;
    Ok(Json(ApiResponse::success(admissions)))
}

/// Legacy admission markers joined back to their records and callers, split
/// into confirmed and enrollment buckets.
async fn list_admissions(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    require_admin(&user)?;
    let db = &state.db.conn;

    let admissions = Admission::find_all_desc(db).await?;
    let record_ids: Vec<i64> = admissions.iter().map(|a| a.record_id).collect();
    let records: HashMap<i64, Record> = Record::find_by_ids(db, &record_ids)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();
    let caller_ids: Vec<i64> = records.values().filter_map(|r| r.caller_id).collect();
    let caller_names = User::names_by_ids(db, &caller_ids).await?;

    let mut confirmed = Vec::new();
    let mut other = Vec::new();
    let mut total_fees_sum = 0.0;
    for admission in &admissions {
        let record = records.get(&admission.record_id);
        let caller_name = record
            .and_then(|r| r.caller_id)
            .and_then(|id| caller_names.get(&id).cloned())
            .unwrap_or_else(|| "Unknown".to_string());
        let row = json!({
            "id": admission.id,
            "record_id": admission.record_id,
            "phone_number": record.map(|r| r.phone_number.clone()),
            "name": record.and_then(|r| r.name.clone()),
            "caller_name": caller_name,
            "admission_type": admission.admission_type,
            "discount_rate": admission.discount_rate,
            "total_fees": admission.total_fees,
            "enrolled_course": admission.enrolled_course,
            "created_at": admission.created_at,
        });
        match admission.admission_type {
            AdmissionType::Confirmed => confirmed.push(row),
            AdmissionType::Other => {
                total_fees_sum += admission.total_fees.unwrap_or(0.0);
                other.push(row);
            }
        }
    }

    let confirmed_count = confirmed.len();
    let other_count = other.len();
    Ok(Json(ApiResponse::success(json!({
        "confirmed": confirmed,
        "other": other,
        "totals": {
            "confirmed_count": confirmed_count,
            "other_count": other_count,
            "total_fees": total_fees_sum,
        },
    }))))
}
