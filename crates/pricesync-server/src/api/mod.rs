mod stages;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &pricesync_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/pipeline/stages", get(stages::list_pipeline_stages))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match pricesync_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use pricesync_core::PipelineStage;
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str, request_id: Option<&str>) -> (StatusCode, String, serde_json::Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).expect("request"))
            .await
            .expect("response");

        let status = response.status();
        let id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).expect("json parse")
        };
        (status, id, json)
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let not_found = ApiError::new("req-1", "not_found", "missing").into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        let internal = ApiError::new("req-2", "internal_error", "boom").into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_ok_and_echoes_request_id(pool: sqlx::PgPool) {
        let app = build_app(AppState { pool });
        let (status, id, json) = get_json(app, "/api/v1/health", Some("req-abc")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(id, "req-abc");
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["meta"]["request_id"], "req-abc");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn stages_lists_every_stage_with_status(pool: sqlx::PgPool) {
        pricesync_db::mark_stage_completed(&pool, PipelineStage::ChainTableInit)
            .await
            .expect("mark");
        pricesync_db::mark_stage_not_completed(&pool, PipelineStage::PriceUpdate)
            .await
            .expect("reset");

        let app = build_app(AppState { pool });
        let (status, id, json) = get_json(app, "/api/v1/pipeline/stages", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(!id.is_empty(), "a request id is generated");
        let rows = json["data"].as_array().expect("data array");
        assert_eq!(rows.len(), PipelineStage::ALL.len());

        let status_of = |stage: &str| {
            rows.iter()
                .find(|r| r["stage"] == stage)
                .map(|r| r["status"].clone())
                .expect("stage present")
        };
        assert_eq!(status_of("CHAIN_TABLE_INIT"), "completed");
        assert_eq!(status_of("PRICE_UPDATE"), "failed");
        assert_eq!(status_of("INITIAL_LOAD"), "not_started");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn unknown_route_is_not_found(pool: sqlx::PgPool) {
        let app = build_app(AppState { pool });
        let (status, id, _) = get_json(app, "/api/v1/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!id.is_empty());
    }
}
