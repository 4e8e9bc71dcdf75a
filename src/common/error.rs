// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::LazyLock;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

static DEFAULT_I18N: LazyLock<I18nStore> = LazyLock::new(I18nStore::load);

/// Os únicos tipos de erro que chegam ao cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ErrorKind {
    AuthError,
    MissingFields,
    NotFound,
    ExternalServiceError,
    DefaultServerError,
}

// Nosso tipo de erro. Cada variante pertence a exatamente um ErrorKind.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Token inválido ou ausente")]
    InvalidToken,

    // Não é membro/admin da empresa, ou tentou agir sobre si mesmo
    #[error("Usuário não autorizado: {0}")]
    Unauthorized(String),

    #[error("Campos obrigatórios ausentes: {0}")]
    MissingFields(String),

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Recurso não encontrado: {0}")]
    NotFound(String),

    #[error("Falha no serviço externo {service}: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    #[error("Ação não permitida: {0}")]
    BlockedAction(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::ExternalService {
            service: "http",
            message: e.to_string(),
        }
    }
}

impl AppError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        AppError::Unauthorized(reason.into())
    }

    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        AppError::ExternalService {
            service,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidToken | AppError::Unauthorized(_) => ErrorKind::AuthError,
            AppError::MissingFields(_) | AppError::ValidationError(_) => ErrorKind::MissingFields,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::ExternalService { .. } => ErrorKind::ExternalServiceError,
            AppError::BlockedAction(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => ErrorKind::DefaultServerError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::MissingFields(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            AppError::BlockedAction(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            AppError::InvalidToken => "error.invalid_token",
            AppError::Unauthorized(_) => "error.unauthorized",
            AppError::MissingFields(_) => "error.missing_fields",
            AppError::ValidationError(_) => "error.validation",
            AppError::NotFound(_) => "error.not_found",
            AppError::ExternalService { .. } => "error.external_service",
            AppError::BlockedAction(_) => "error.blocked_action",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "error.default_server",
        }
    }

    /// Converte para a resposta HTTP, já traduzida. Mensagens de provedores
    /// externos e do banco ficam apenas no log.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let kind = self.kind();
        let error = i18n.translate(&locale.0, self.message_key());

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::MissingFields(fields) => Some(json!({ "fields": fields })),
            AppError::NotFound(resource) => Some(json!({ "resource": resource })),
            _ => None,
        };

        match &self {
            AppError::ExternalService { .. } => tracing::warn!("Falha em serviço externo: {}", self),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                tracing::error!("Erro Interno do Servidor: {}", self)
            }
            AppError::Unauthorized(reason) => tracing::debug!("Acesso negado: {}", reason),
            _ => {}
        }

        ApiError {
            status,
            error,
            kind,
            details,
        }
    }
}

// Usado pelo middleware, onde ainda não temos o Locale em mãos.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &DEFAULT_I18N)
            .into_response()
    }
}

/// O erro já normalizado que vai para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub kind: ErrorKind,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "kind": self.kind,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}
