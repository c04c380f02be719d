use axum::{
    Extension, Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use services::services::distributor::{self, BatchSummary, SheetUpload};
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    http::auth::{CurrentUser, require_admin},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/upload", post(upload))
}

/// Accepts one or more contact sheets and hands the batch to the
/// distributor. Per-file failures come back in the summary, not as an error.
async fn upload(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<BatchSummary>>, ApiError> {
    require_admin(&user)?;

    let mut sheets = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        sheets.push(SheetUpload {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    if sheets.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let file_count = sheets.len();
    let summary = distributor::distribute(&state.db.conn, sheets).await?;
    tracing::info!(
        files = file_count,
        added = summary.total_added,
        skipped = summary.total_skipped,
        "upload distributed"
    );
    Ok(Json(ApiResponse::success(summary)))
}
