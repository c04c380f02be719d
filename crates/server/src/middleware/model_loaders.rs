use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::models::record::Record;

use crate::{AppState, error::ApiError};

/// Loads the record named by the `{id}` path segment and stashes it as an
/// extension, so handlers downstream get a 404 for free.
pub async fn load_record_middleware(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let record = Record::find_by_id(&state.db.conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;
    request.extensions_mut().insert(record);
    Ok(next.run(request).await)
}
