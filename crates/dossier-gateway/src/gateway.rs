//! Main Gateway implementation
//!
//! Each request runs a single pipeline stage; nothing is kept between calls.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dossier_core::{
    pipeline::{analyze_report, generate_report},
    render, GenerationClient, Normalizer, PipelineRequest, RenderedBlocks, ValidationError,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::api::{
    AnalyzeRequest, AnalyzeResponse, ErrorResponse, GenerateRequest, GenerateResponse,
    NormalizeRequest, NormalizeResponse, RenderRequest, ANALYZE_FAILURE_MESSAGE,
    GENERATE_SUCCESS_MESSAGE, INTERNAL_ERROR_MESSAGE, INVALID_MARKDOWN_MESSAGE,
};
use crate::config::GatewayConfig;
use crate::{GatewayError, Result};

/// Gateway state shared across handlers
#[derive(Clone)]
pub struct GatewayState {
    pub config: GatewayConfig,
    pub generator: GenerationClient,
    pub normalizer: Arc<Normalizer>,
}

impl GatewayState {
    pub fn new(config: GatewayConfig, generator: GenerationClient) -> Self {
        Self {
            config,
            generator,
            normalizer: Arc::new(Normalizer::default()),
        }
    }
}

/// Main Gateway
pub struct Gateway {
    state: Arc<GatewayState>,
}

impl Gateway {
    /// Create a new gateway around a generation client
    pub fn new(config: GatewayConfig, generator: GenerationClient) -> Self {
        let state = Arc::new(GatewayState::new(config, generator));
        Self { state }
    }

    /// Get gateway state
    pub fn state(&self) -> Arc<GatewayState> {
        self.state.clone()
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        let api = Router::new()
            .route("/generate-md", post(Self::handle_generate))
            .route("/analyze", post(Self::handle_analyze))
            .route("/gemini", post(Self::handle_analyze))
            .route("/normalize", post(Self::handle_normalize))
            .route("/render", post(Self::handle_render));

        Router::new()
            .route("/", get(Self::handle_index))
            .route("/health", get(Self::handle_health))
            .nest("/api", api)
            .layer(RequestBodyLimitLayer::new(self.state.config.max_body_bytes))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the gateway server and run until Ctrl+C
    pub async fn start(&self) -> Result<()> {
        let addr = self.state.config.socket_addr()?;
        let router = self.build_router();

        tracing::info!(
            provider = self.state.generator.provider_name(),
            "Dossier Gateway starting on {}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    // HTTP handlers

    async fn handle_index() -> &'static str {
        "Dossier report generation service"
    }

    async fn handle_health() -> impl IntoResponse {
        Json(serde_json::json!({
            "status": "healthy",
            "version": crate::VERSION
        }))
    }

    async fn handle_generate(
        State(state): State<Arc<GatewayState>>,
        payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
    ) -> Response {
        let Json(body) = match payload {
            Ok(body) => body,
            Err(rejection) => return malformed_body(rejection),
        };

        let request = match body.company().map(PipelineRequest::new) {
            Some(Ok(request)) => request,
            _ => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    ValidationError::MissingField("company").to_string(),
                )
            }
        };

        match generate_report(&state.generator, &request).await {
            Ok(markdown) => Json(GenerateResponse {
                message: GENERATE_SUCCESS_MESSAGE.to_string(),
                markdown,
            })
            .into_response(),
            Err(e) => {
                tracing::warn!(subject = request.subject(), error = %e, "Report generation failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        }
    }

    async fn handle_analyze(
        State(state): State<Arc<GatewayState>>,
        payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
    ) -> Response {
        let markdown = match &payload {
            Ok(Json(body)) => body.markdown(),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return (StatusCode::PAYLOAD_TOO_LARGE, Json(AnalyzeResponse::error(rejection.body_text())))
                    .into_response()
            }
            Err(_) => None,
        };
        let Some(markdown) = markdown else {
            return (
                StatusCode::BAD_REQUEST,
                Json(AnalyzeResponse::error(INVALID_MARKDOWN_MESSAGE)),
            )
                .into_response();
        };

        match analyze_report(&state.generator, markdown).await {
            Ok(output) => Json(AnalyzeResponse::success(output)).into_response(),
            Err(e) => {
                tracing::warn!(error = %e, "Analysis failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(AnalyzeResponse::error(ANALYZE_FAILURE_MESSAGE)),
                )
                    .into_response()
            }
        }
    }

    async fn handle_normalize(
        State(state): State<Arc<GatewayState>>,
        payload: std::result::Result<Json<NormalizeRequest>, JsonRejection>,
    ) -> Response {
        match payload {
            Ok(Json(body)) => {
                Json(NormalizeResponse::from(state.normalizer.normalize(&body.input))).into_response()
            }
            Err(rejection) => malformed_body(rejection),
        }
    }

    async fn handle_render(
        payload: std::result::Result<Json<RenderRequest>, JsonRejection>,
    ) -> Response {
        match payload {
            Ok(Json(body)) => {
                let blocks: RenderedBlocks = render(&body.markdown);
                Json(blocks).into_response()
            }
            Err(rejection) => malformed_body(rejection),
        }
    }
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// 400 for bodies that are not the expected JSON; oversized bodies keep 413.
fn malformed_body(rejection: JsonRejection) -> Response {
    let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::BAD_REQUEST
    };
    tracing::debug!(status = %status, "Rejected request body: {}", rejection.body_text());
    error_response(
        status,
        ValidationError::MalformedBody(rejection.body_text()).to_string(),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Gateway shutdown initiated");
}
