// src/middleware/extract.rs

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

// Json, Path e Query do axum respondem texto puro (422/400) quando falham.
// Estes embrulhos devolvem o mesmo ApiError traduzido do resto da API.

/// Corpo JSON. Corpo ilegível, campo ausente ou de tipo errado vira `MissingFields("body")`.
#[derive(Debug)]
pub struct AppJson<T>(pub T);

/// Segmentos do caminho. Um UUID malformado vira `MissingFields("path")`.
#[derive(Debug)]
pub struct AppPath<T>(pub T);

#[derive(Debug)]
pub struct AppQuery<T>(pub T);

fn rejected(app_state: &AppState, locale: &Locale, part: &str, reason: &str) -> ApiError {
    tracing::debug!("Requisição rejeitada ({}): {}", part, reason);
    AppError::MissingFields(part.to_string()).to_api_error(locale, &app_state.i18n_store)
}

impl<T> FromRequest<AppState> for AppJson<T>
where
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(req.headers());

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(rejected(state, &locale, "body", &rejection.body_text())),
        }
    }
}

impl<T> FromRequestParts<AppState> for AppPath<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(AppPath(value)),
            Err(rejection) => {
                let locale = Locale::from_headers(&parts.headers);
                Err(rejected(state, &locale, "path", &rejection.body_text()))
            }
        }
    }
}

impl<T> FromRequestParts<AppState> for AppQuery<T>
where
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(rejection) => {
                let locale = Locale::from_headers(&parts.headers);
                Err(rejected(state, &locale, "query", &rejection.body_text()))
            }
        }
    }
}
