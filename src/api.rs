use crate::document::DocId;
use crate::engine::{SearchEngine, SearchHit, SearchMode, SearchOptions};
use crate::error::Error;
use crate::index::IndexStats;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ========== Request/Response Types ==========

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub mode: Option<SearchMode>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: SearchMode,
    pub results: Vec<RankedHit>,
}

#[derive(Debug, Serialize)]
pub struct RankedHit {
    pub rank: usize,
    #[serde(flatten)]
    pub hit: SearchHit,
}

#[derive(Debug, Serialize)]
pub struct TermScoreResponse {
    pub term: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<DocId>,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

// ========== Error Handling ==========

pub struct AppError(Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0 {
            Error::InvalidTerm { .. } | Error::InvalidParameters { .. } => StatusCode::BAD_REQUEST,
            Error::CacheUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            tracing::error!("API error: {}", message);
        } else {
            tracing::debug!("rejected request: {}", message);
        }

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

// ========== Handlers ==========

async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success("OK"))
}

async fn search(
    State(engine): State<Arc<SearchEngine>>,
    Query(req): Query<SearchRequest>,
) -> Result<impl IntoResponse, AppError> {
    let defaults = SearchOptions::default();
    let options = SearchOptions {
        mode: req.mode.unwrap_or(defaults.mode),
        limit: req.limit.unwrap_or(defaults.limit),
    };

    let results = engine
        .search(&req.query, &options)?
        .into_iter()
        .enumerate()
        .map(|(i, hit)| RankedHit { rank: i + 1, hit })
        .collect();

    Ok(Json(ApiResponse::success(SearchResponse {
        query: req.query,
        mode: options.mode,
        results,
    })))
}

async fn term_frequency(
    State(engine): State<Arc<SearchEngine>>,
    Path((doc_id, term)): Path<(DocId, String)>,
) -> Result<impl IntoResponse, AppError> {
    let value = engine.term_frequency(doc_id, &term)? as f64;
    Ok(Json(ApiResponse::success(TermScoreResponse {
        term,
        doc_id: Some(doc_id),
        value,
    })))
}

async fn bm25_term_weight(
    State(engine): State<Arc<SearchEngine>>,
    Path((doc_id, term)): Path<(DocId, String)>,
) -> Result<impl IntoResponse, AppError> {
    let value = engine.bm25_term_weight(doc_id, &term)?;
    Ok(Json(ApiResponse::success(TermScoreResponse {
        term,
        doc_id: Some(doc_id),
        value,
    })))
}

async fn idf(
    State(engine): State<Arc<SearchEngine>>,
    Path(term): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let value = engine.idf(&term)?;
    Ok(Json(ApiResponse::success(TermScoreResponse {
        term,
        doc_id: None,
        value,
    })))
}

async fn bm25_idf(
    State(engine): State<Arc<SearchEngine>>,
    Path(term): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let value = engine.bm25_idf(&term)?;
    Ok(Json(ApiResponse::success(TermScoreResponse {
        term,
        doc_id: None,
        value,
    })))
}

async fn get_stats(State(engine): State<Arc<SearchEngine>>) -> Json<ApiResponse<IndexStats>> {
    Json(ApiResponse::success(engine.stats()))
}

// ========== Router ==========

pub fn create_router(engine: Arc<SearchEngine>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/search", get(search))
        .route("/tf/:doc_id/:term", get(term_frequency))
        .route("/bm25tf/:doc_id/:term", get(bm25_term_weight))
        .route("/idf/:term", get(idf))
        .route("/bm25idf/:term", get(bm25_idf))
        .route("/stats", get(get_stats))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(engine)
}
