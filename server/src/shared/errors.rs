use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::modules::chat::{
    ApplicationError, DispatchError, DispatchErrorKind, MessageId, ProviderError,
    ProviderErrorKind, RepositoryError, SessionId, TurnStage, UnsupportedReason,
};
use crate::modules::config::ConfigError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Storage error: {0}")]
    StorageError(#[from] RepositoryError),

    #[error("Provider setup error: {0}")]
    ProviderSetup(#[from] ProviderError),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<ApplicationError> for AppError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::SessionNotFound(id) => AppError::SessionNotFound(id),
            ApplicationError::ValidationError(msg) => AppError::Validation(msg),
            ApplicationError::Dispatch(e) => AppError::Dispatch(e),
            ApplicationError::RepositoryError(RepositoryError::NotFound(id)) => {
                AppError::SessionNotFound(id)
            }
            ApplicationError::RepositoryError(e) => AppError::StorageError(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// 解析路径中的会话 ID
pub fn parse_session_id(raw: &str) -> AppResult<SessionId> {
    SessionId::parse(raw).map_err(|_| AppError::Validation(format!("Invalid session id: {}", raw)))
}

/// 错误响应体 `{"error": {...}}`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<TurnStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message_id: Option<MessageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_error_kind: Option<ProviderErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnsupportedReason>,
}

impl ErrorBody {
    fn new(kind: &'static str, message: String) -> Self {
        Self {
            kind,
            message,
            stage: None,
            session_id: None,
            user_message_id: None,
            provider_error_kind: None,
            reason: None,
        }
    }
}

fn provider_status(kind: ProviderErrorKind) -> StatusCode {
    match kind {
        ProviderErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ProviderErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ProviderErrorKind::InvalidResponse | ProviderErrorKind::Unknown => StatusCode::BAD_GATEWAY,
    }
}

impl AppError {
    /// HTTP 状态码及响应体
    pub fn to_body(&self) -> (StatusCode, ErrorBody) {
        let message = self.to_string();
        match self {
            AppError::SessionNotFound(_) => (StatusCode::NOT_FOUND, ErrorBody::new("NotFound", message)),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorBody::new("Validation", message)),
            AppError::StorageError(_) | AppError::IoError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("StorageError", message),
            ),
            AppError::ConfigError(_) | AppError::ProviderSetup(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal", message),
            ),
            AppError::Dispatch(e) => {
                let (status, kind, provider_error_kind, reason) = match &e.kind {
                    DispatchErrorKind::NotFound => (StatusCode::NOT_FOUND, "NotFound", None, None),
                    DispatchErrorKind::UnsupportedModel { reason, .. } => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "UnsupportedModel",
                        None,
                        Some(reason.clone()),
                    ),
                    DispatchErrorKind::Provider(p) => {
                        (provider_status(p.kind), "ProviderError", Some(p.kind), None)
                    }
                    DispatchErrorKind::Storage(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "StorageError", None, None)
                    }
                    DispatchErrorKind::Cancelled => (StatusCode::CONFLICT, "Cancelled", None, None),
                };

                let body = ErrorBody {
                    stage: Some(e.stage),
                    session_id: e.session_id,
                    user_message_id: e.user_message_id,
                    provider_error_kind,
                    reason,
                    ..ErrorBody::new(kind, message)
                };
                (status, body)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_body();
        if status.is_server_error() {
            tracing::error!("[http] {}", self);
        } else {
            tracing::debug!("[http] {}", self);
        }
        (status, Json(ErrorEnvelope { error: body })).into_response()
    }
}
