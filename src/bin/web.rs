use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use fare_app::{ArtifactLoader, Fare, FlightQuery, ModelHandle, Predictor};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, serde::Serialize)]
struct PredictResponse {
    prediction: Fare,
}

#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    model: &'static str,
}

struct AppState {
    model: ModelHandle,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.model.kind(),
    })
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(query): Json<FlightQuery>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let as_of = chrono::Local::now().date_naive();
    match state.model.predict(&query, as_of) {
        Ok(prediction) => {
            tracing::debug!(?query, %prediction, "predicted fare");
            Ok(Json(PredictResponse { prediction }))
        }
        Err(e) => {
            tracing::debug!(?query, error = %e, "rejected fare query");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    fare_app::init_tracing();

    let loader = ArtifactLoader::from_env();
    let model = loader.load().with_context(|| {
        format!(
            "Failed to load fare model from {}",
            loader.config().model_path().display()
        )
    })?;

    let state = Arc::new(AppState { model });
    let app = router(state);

    let port = match std::env::var("PORT") {
        Ok(port) => port.parse::<u16>().with_context(|| format!("Invalid PORT '{}'", port))?,
        Err(_) => 5000,
    };
    let addr = std::net::SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)), port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "serving /predict");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
