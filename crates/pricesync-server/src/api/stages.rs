use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use pricesync_core::{PipelineStage, StageStatus};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct StageItem {
    stage: PipelineStage,
    status: StageStatus,
    updated_at: Option<DateTime<Utc>>,
}

pub(super) async fn list_pipeline_stages(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<StageItem>>>, ApiError> {
    let report = pricesync_db::stage_report(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = report
        .into_iter()
        .map(|row| StageItem {
            stage: row.stage,
            status: row.status,
            updated_at: row.updated_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
