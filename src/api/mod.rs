//! HTTP API: `POST /predict` and `GET /health`.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use handlers::{AppState, HealthResponse, PredictRequest};
pub use server::{router, PredictionServer, ServerError};
