//! Flight fare model loading.
//!
//! The model artifact lives at `MODEL_PATH` (default `/app/model.pkl`) and is
//! read once at startup:
//!
//! ```no_run
//! use fare_app::{load_model, LoaderConfig};
//!
//! let model = load_model(&LoaderConfig::from_env())?;
//! # Ok::<(), fare_app::LoadError>(())
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod features;
pub mod loader;
pub mod models;

pub use config::{LoaderConfig, DEFAULT_MODEL_PATH, MODEL_PATH_ENV};
pub use error::{DecodeError, LoadError, PredictError};
pub use features::FlightQuery;
pub use loader::{load_model, ArtifactLoader};
pub use models::{Fare, FareModel, ModelHandle, Predictor};

/// Install the `tracing` subscriber used by the binaries. `RUST_LOG`
/// overrides the default `info` filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
