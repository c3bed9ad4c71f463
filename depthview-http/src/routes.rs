use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use depthview_core::{FrameError, FrameQuery, FrameService};
use depthview_types::FrameView;

#[derive(Clone)]
struct AppState {
    service: Arc<FrameService>,
}

#[derive(Debug, Deserialize)]
struct FramesParams {
    depth_min: f64,
    depth_max: f64,
    colormap: String,
}

/// Error body shared by every failure the API reports.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub name: String,
    pub message: String,
    pub status_code: u16,
}

enum ApiError {
    Frame(FrameError),
    BadParams(QueryRejection),
}

impl From<FrameError> for ApiError {
    fn from(e: FrameError) -> Self {
        ApiError::Frame(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::Frame(FrameError::Store(e)) => {
                error!("frame store failure: {e}");
                ErrorBody {
                    name: "InternalError".into(),
                    message: "internal error".into(),
                    status_code: 500,
                }
            }
            ApiError::Frame(e) => ErrorBody {
                name: e.name().into(),
                message: e.to_string(),
                status_code: e.status_code(),
            },
            ApiError::BadParams(rejection) => ErrorBody {
                name: "InvalidQuery".into(),
                message: rejection.body_text(),
                status_code: 400,
            },
        };
        let status = StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

pub fn app(service: Arc<FrameService>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/frames", get(get_frames))
        .route("/frames/", get(get_frames))
        .with_state(AppState { service })
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn get_frames(
    State(state): State<AppState>,
    params: Result<Query<FramesParams>, QueryRejection>,
) -> Result<Json<Vec<FrameView>>, ApiError> {
    let Query(params) = params.map_err(ApiError::BadParams)?;
    let query = FrameQuery::parse(params.depth_min, params.depth_max, &params.colormap)?;
    let views = state.service.retrieve(&query).await?;
    Ok(Json(views))
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use depthview_core::Colormap;
    use depthview_store::{FrameStore, InMemoryFrameStore, InsertOutcome, StoreError};
    use depthview_types::FrameRecord;
    use tower::ServiceExt;

    /// In-memory store that counts range scans.
    struct CountingStore {
        inner: InMemoryFrameStore,
        finds: AtomicUsize,
    }

    #[async_trait]
    impl FrameStore for CountingStore {
        async fn find(&self, depth_min: f64, depth_max: f64) -> Result<Vec<FrameRecord>, StoreError> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            self.inner.find(depth_min, depth_max).await
        }

        async fn insert(&self, record: FrameRecord) -> Result<InsertOutcome, StoreError> {
            self.inner.insert(record).await
        }

        async fn count(&self) -> Result<u64, StoreError> {
            self.inner.count().await
        }
    }

    fn test_app(records: Vec<FrameRecord>) -> Router {
        let store = Arc::new(InMemoryFrameStore::with_records(records));
        app(Arc::new(FrameService::new(store)))
    }

    fn counting_app() -> (Router, Arc<CountingStore>) {
        let store = Arc::new(CountingStore {
            inner: InMemoryFrameStore::with_records(records()),
            finds: AtomicUsize::new(0),
        });
        (app(Arc::new(FrameService::new(store.clone()))), store)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn records() -> Vec<FrameRecord> {
        vec![
            FrameRecord::new(9050.0, vec![1.0, 2.0]),
            FrameRecord::new(9200.0, vec![0.0, 255.0]),
            FrameRecord::new(9400.0, vec![3.0, 4.0]),
        ]
    }

    #[tokio::test]
    async fn healthz_ok() {
        let (status, body) = get(test_app(Vec::new()), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn frames_in_range_are_colormapped() {
        let (status, body) = get(
            test_app(records()),
            "/frames?depth_min=9100&depth_max=9300&colormap=viridis",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let views: Vec<FrameView> = serde_json::from_slice(&body).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].depth, 9200.0);
        assert_eq!(
            views[0].frame,
            vec![Colormap::Viridis.map_value(0.0), Colormap::Viridis.map_value(255.0)]
        );
        assert_eq!(views[0].frame[0], [68, 1, 84]);
    }

    #[tokio::test]
    async fn trailing_slash_route_works() {
        let (status, _) = get(
            test_app(records()),
            "/frames/?depth_min=9000&depth_max=9546&colormap=magma",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn out_of_bounds_is_400_with_error_body() {
        let (status, body) = get(
            test_app(records()),
            "/frames?depth_min=8000&depth_max=9500&colormap=viridis",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.name, "RangeOutOfBounds");
        assert_eq!(err.status_code, 400);
    }

    #[tokio::test]
    async fn inverted_range_is_400() {
        let (status, body) = get(
            test_app(records()),
            "/frames?depth_min=9500&depth_max=9100&colormap=viridis",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.name, "InvertedRange");
    }

    #[tokio::test]
    async fn empty_range_is_404() {
        let (status, body) = get(
            test_app(records()),
            "/frames?depth_min=9250&depth_max=9300&colormap=plasma",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            err,
            ErrorBody {
                name: "NoFramesFound".into(),
                message: "No Frames found between 9250 and 9300".into(),
                status_code: 404,
            }
        );
    }

    #[tokio::test]
    async fn unknown_colormap_is_400() {
        let (status, body) = get(
            test_app(records()),
            "/frames?depth_min=9100&depth_max=9300&colormap=jet",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.name, "UnknownColormap");
    }

    #[tokio::test]
    async fn missing_param_is_400() {
        let (status, body) = get(test_app(records()), "/frames?depth_min=9100").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.name, "InvalidQuery");
    }

    #[tokio::test]
    async fn rejected_requests_never_scan_the_store() {
        for uri in [
            "/frames?depth_min=8000&depth_max=9500&colormap=viridis",
            "/frames?depth_min=9500&depth_max=9100&colormap=viridis",
            "/frames?depth_min=9100&depth_max=9300&colormap=jet",
        ] {
            let (app, store) = counting_app();
            let (status, _) = get(app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(store.finds.load(Ordering::SeqCst), 0, "{uri}");
        }
    }

    #[tokio::test]
    async fn accepted_request_scans_once() {
        let (app, store) = counting_app();
        let (status, _) = get(app, "/frames?depth_min=9100&depth_max=9300&colormap=viridis").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.finds.load(Ordering::SeqCst), 1);
    }
}
