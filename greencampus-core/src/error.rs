use chrono::{DateTime, Utc};
use greencampus_dependencies::axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use greencampus_validator::ValidatorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GreenCampusError {
    #[error("Database Error: {0}")]
    Database(#[from] greencampus_models::ModelError),
    #[error("SQLx Error: {0}")]
    SQLx(#[from] sqlx::Error),
    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] greencampus_dependencies::reqwest::Error),
    #[error("Configuration Error: {0}")]
    Envy(#[from] envy::Error),
    #[error(transparent)]
    Validator(#[from] ValidatorError),
    #[error("Mission {0:?} not found")]
    MissionNotFound(String),
    #[error("User {0:?} not found")]
    UserNotFound(String),
    #[error("Mission {mission_id:?} is cooling down until {retry_at}")]
    CooldownActive {
        mission_id: String,
        retry_at: DateTime<Utc>,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not logged in")]
    NoSession,
    #[error("Other Error: {0:?}")]
    Other(String),
}

pub type GreenCampusResult<T> = std::result::Result<T, GreenCampusError>;

impl GreenCampusError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GreenCampusError::MissionNotFound(_) | GreenCampusError::UserNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            GreenCampusError::CooldownActive { .. } => StatusCode::TOO_MANY_REQUESTS,
            GreenCampusError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GreenCampusError::NoSession => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GreenCampusError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            GreenCampusError::CooldownActive { retry_at, .. } => serde_json::json!({
                "error": self.to_string(),
                "retry_at": retry_at,
            }),
            _ if status.is_server_error() => {
                error!("Error presented to user: {:?}", self);
                serde_json::json!({ "error": "Internal Error" })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
