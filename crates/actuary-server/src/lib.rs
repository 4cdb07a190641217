//! HTTP actuary server.
//!
//! Exposes the pipeline stages as JSON endpoints. One oracle feed and one
//! trainable model live for the lifetime of the server, so consensus history
//! and training progress accumulate across requests.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use actuary_core::{
    ActuaryConfig, ActuaryError, ConsensusPredictionRecord, DivergenceMetrics, HarmonicsReport,
    Oracle, OracleFeed, PredictiveModel, ProjectionMetrics, QuantumPrediction, RevenueProjection,
    RevenueProjector, ScenarioResult, SensitivityEntry, TensorHarmonicsProcessor,
};

/// Shared server state.
struct AppState {
    harmonics: TensorHarmonicsProcessor,
    model: Mutex<PredictiveModel>,
    feed: OracleFeed,
    projector: RevenueProjector,
}

impl AppState {
    fn new(config: ActuaryConfig) -> actuary_core::Result<Self> {
        config.validate()?;
        Ok(Self {
            harmonics: TensorHarmonicsProcessor::new(config.harmonics)?,
            model: Mutex::new(PredictiveModel::new(config.model)?),
            feed: OracleFeed::new(config.oracle)?,
            projector: RevenueProjector::new(config.projection)?,
        })
    }
}

#[derive(Deserialize)]
struct HarmonicsRequest {
    tensor: Vec<f64>,
}

#[derive(Deserialize)]
struct PredictRequest {
    features: Vec<f64>,
}

#[derive(Deserialize)]
struct TrainRequest {
    features: Vec<f64>,
    target: f64,
    /// Passes over the single sample (default: 1).
    epochs: Option<usize>,
}

#[derive(Serialize)]
struct TrainResponse {
    losses: Vec<f64>,
    prediction: QuantumPrediction,
}

#[derive(Deserialize)]
struct ConsensusRequest {
    market_data: Vec<f64>,
}

#[derive(Deserialize)]
struct ActualRequest {
    actual: f64,
}

#[derive(Serialize)]
struct ActualResponse {
    success: bool,
    oracles: Vec<Oracle>,
}

#[derive(Deserialize)]
struct ProjectionRequest {
    #[serde(flatten)]
    metrics: ProjectionMetrics,
    /// Include ±step sensitivity analysis.
    #[serde(default)]
    sensitivity: bool,
}

#[derive(Serialize)]
struct ProjectionResponse {
    projection: RevenueProjection,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensitivity: Option<Vec<SensitivityEntry>>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    oracles: usize,
    predictions: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

/// Pipeline error rendered as a JSON body with a matching status code.
struct ApiError(ActuaryError);

impl From<ActuaryError> for ApiError {
    fn from(err: ActuaryError) -> Self {
        Self(err)
    }
}

trait JsonWithStatus<T> {
    fn with_status(self, status: StatusCode) -> (StatusCode, Json<T>);
}

impl<T> JsonWithStatus<T> for Json<T> {
    fn with_status(self, status: StatusCode) -> (StatusCode, Json<T>) {
        (status, self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_input_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        log::warn!("request failed ({status}): {}", self.0);
        Json(ErrorResponse {
            success: false,
            error: self.0.to_string(),
        })
        .with_status(status)
        .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn handle_harmonics(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HarmonicsRequest>,
) -> ApiResult<HarmonicsReport> {
    Ok(Json(state.harmonics.process(&req.tensor)?))
}

async fn handle_predict(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> ApiResult<QuantumPrediction> {
    let model = state.model.lock().await;
    Ok(Json(model.predict(&req.features)?))
}

async fn handle_train(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrainRequest>,
) -> ApiResult<TrainResponse> {
    let epochs = req.epochs.unwrap_or(1).clamp(1, 1000);
    // Parameter-shift training is CPU bound; keep it off the async workers.
    let response = tokio::task::spawn_blocking(move || {
        let mut model = state.model.blocking_lock();
        let losses = model.fit(&[(req.features.clone(), req.target)], epochs)?;
        let prediction = model.predict(&req.features)?;
        Ok::<_, ActuaryError>(TrainResponse { losses, prediction })
    })
    .await
    .map_err(|e| ActuaryError::Io(std::io::Error::other(e)))??;
    Ok(Json(response))
}

async fn handle_consensus(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConsensusRequest>,
) -> ApiResult<ConsensusPredictionRecord> {
    Ok(Json(state.feed.predict(&req.market_data)?))
}

async fn handle_actual(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActualRequest>,
) -> ApiResult<ActualResponse> {
    state.feed.update_accuracy(req.actual)?;
    Ok(Json(ActualResponse {
        success: true,
        oracles: state.feed.oracles(),
    }))
}

async fn handle_divergence(State(state): State<Arc<AppState>>) -> Json<DivergenceMetrics> {
    Json(state.feed.get_divergence_metrics())
}

async fn handle_projection(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProjectionRequest>,
) -> ApiResult<ProjectionResponse> {
    let projection = state.projector.project(&req.metrics)?;
    let sensitivity = if req.sensitivity {
        Some(state.projector.sensitivity(&req.metrics)?)
    } else {
        None
    };
    Ok(Json(ProjectionResponse {
        projection,
        sensitivity,
    }))
}

async fn handle_scenarios(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ScenarioResult>> {
    Ok(Json(state.projector.scenario_sweep()?))
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: actuary_core::VERSION.to_string(),
        oracles: state.feed.config().n_oracles,
        predictions: state.feed.history().len(),
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let tensor_len = state.harmonics.config().tensor_len;
    Json(serde_json::json!({
        "name": "Actuary Server",
        "version": actuary_core::VERSION,
        "endpoints": {
            "/": "This API index",
            "/health": "Health check",
            "/api/v1/harmonics": {
                "method": "POST",
                "body": format!("{{\"tensor\": [{tensor_len} numbers]}}"),
            },
            "/api/v1/predict": { "method": "POST", "body": "{\"features\": [numbers]}" },
            "/api/v1/train": {
                "method": "POST",
                "body": "{\"features\": [numbers], \"target\": number, \"epochs\": n}",
            },
            "/api/v1/consensus": { "method": "POST", "body": "{\"market_data\": [numbers]}" },
            "/api/v1/consensus/actual": { "method": "POST", "body": "{\"actual\": number}" },
            "/api/v1/divergence": { "method": "GET" },
            "/api/v1/projection": {
                "method": "POST",
                "body": "{\"active_brands\", \"avg_brand_value\", \"market_multiplier\", \"risk_adjustment\", \"sensitivity\"?}",
            },
            "/api/v1/scenarios": { "method": "GET" },
        }
    }))
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/v1/harmonics", post(handle_harmonics))
        .route("/api/v1/predict", post(handle_predict))
        .route("/api/v1/train", post(handle_train))
        .route("/api/v1/consensus", post(handle_consensus))
        .route("/api/v1/consensus/actual", post(handle_actual))
        .route("/api/v1/divergence", get(handle_divergence))
        .route("/api/v1/projection", post(handle_projection))
        .route("/api/v1/scenarios", get(handle_scenarios))
        .with_state(state)
}

/// Build the axum router over freshly constructed pipeline stages.
pub fn build_router(config: ActuaryConfig) -> actuary_core::Result<Router> {
    Ok(router(Arc::new(AppState::new(config)?)))
}

/// Run the HTTP actuary server until the listener fails.
pub async fn run_server(config: ActuaryConfig, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(config).map_err(std::io::Error::other)?;
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("actuary server listening on {addr}");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actuary_core::{ModelConfig, OracleFeedConfig, RotationGate, Scenario};

    fn state() -> Arc<AppState> {
        Arc::new(
            AppState::new(ActuaryConfig {
                model: ModelConfig {
                    n_qubits: 3,
                    circuit_depth: 2,
                    rotation: RotationGate::Ry,
                    seed: Some(1),
                    ..Default::default()
                },
                oracle: OracleFeedConfig {
                    seed: Some(1),
                    ..Default::default()
                },
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn input_errors_map_to_bad_request() {
        let resp = ApiError(ActuaryError::Dimension {
            expected: 40,
            actual: 3,
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError(ActuaryError::from(std::io::Error::other("disk"))).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn router_builds_with_defaults() {
        assert!(build_router(ActuaryConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn harmonics_rejects_short_tensor() {
        let result = handle_harmonics(
            State(state()),
            Json(HarmonicsRequest {
                tensor: vec![1.0; 10],
            }),
        )
        .await;
        let Err(err) = result else {
            panic!("short tensor accepted");
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn harmonics_scores_valid_tensor() {
        let tensor = (0..40).map(|i| (i as f64).cos()).collect();
        let Json(report) = handle_harmonics(State(state()), Json(HarmonicsRequest { tensor }))
            .await
            .ok()
            .unwrap();
        assert!((0.0..=100.0).contains(&report.aggregate.total_risk_score));
    }

    #[tokio::test]
    async fn consensus_then_actual_updates_history() {
        let state = state();
        let Json(record) = handle_consensus(
            State(state.clone()),
            Json(ConsensusRequest {
                market_data: vec![0.3, 0.5, 0.7],
            }),
        )
        .await
        .ok()
        .unwrap();
        assert_eq!(record.raw_predictions.len(), 10);

        let Json(resp) = handle_actual(State(state.clone()), Json(ActualRequest { actual: 0.5 }))
            .await
            .ok()
            .unwrap();
        assert!(resp.success);
        assert_eq!(resp.oracles.len(), 10);

        let Json(metrics) = handle_divergence(State(state.clone())).await;
        assert_eq!(metrics.samples, 1);
        let Json(health) = handle_health(State(state)).await;
        assert_eq!(health.predictions, 1);
    }

    #[tokio::test]
    async fn train_returns_one_loss_per_epoch() {
        let Json(resp) = handle_train(
            State(state()),
            Json(TrainRequest {
                features: vec![0.2, 0.8],
                target: 0.6,
                epochs: Some(3),
            }),
        )
        .await
        .ok()
        .unwrap();
        assert_eq!(resp.losses.len(), 3);
        assert!(resp.prediction.confidence <= 0.99);
    }

    #[tokio::test]
    async fn training_leaves_runtime_free_for_other_requests() {
        let state = state();
        let training = tokio::spawn(handle_train(
            State(state.clone()),
            Json(TrainRequest {
                features: vec![0.1, 0.4, 0.9],
                target: 0.3,
                epochs: Some(200),
            }),
        ));

        let Json(record) = handle_consensus(
            State(state.clone()),
            Json(ConsensusRequest {
                market_data: vec![0.5; 4],
            }),
        )
        .await
        .ok()
        .unwrap();
        assert_eq!(record.raw_predictions.len(), 10);

        let Json(resp) = training.await.unwrap().ok().unwrap();
        assert_eq!(resp.losses.len(), 200);
        assert_eq!(state.model.lock().await.training_history().len(), 100);
    }

    #[tokio::test]
    async fn projection_with_sensitivity() {
        let Json(resp) = handle_projection(
            State(state()),
            Json(ProjectionRequest {
                metrics: Scenario::Base.metrics(),
                sensitivity: true,
            }),
        )
        .await
        .ok()
        .unwrap();
        assert!((resp.projection.base_revenue - 1.44e9).abs() < 1e-3);
        assert_eq!(resp.sensitivity.map(|s| s.len()), Some(4));
    }

    #[tokio::test]
    async fn negative_projection_input_is_bad_request() {
        let mut metrics = Scenario::Base.metrics();
        metrics.avg_brand_value = -5.0;
        let result = handle_projection(
            State(state()),
            Json(ProjectionRequest {
                metrics,
                sensitivity: false,
            }),
        )
        .await;
        let Err(err) = result else {
            panic!("negative input accepted");
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn scenarios_lists_four_presets() {
        let Json(results) = handle_scenarios(State(state())).await.ok().unwrap();
        assert_eq!(results.len(), 4);
    }
}
