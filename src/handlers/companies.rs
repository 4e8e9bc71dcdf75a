// src/handlers/companies.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::{AppJson, AppPath},
        i18n::Locale,
    },
    models::company::Company,
};

// ---
// Payloads
// ---

// Campos opcionais aqui para que a ausência vire MissingFields, e não 422
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[schema(example = "Acme")]
    pub name: Option<String>,

    // E-mails a convidar como admin
    pub admins: Option<Vec<String>>,

    #[serde(alias = "basic_users")]
    pub basic_users: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsPayload {
    /// Empresa parcial; só `tipLevels` e `customTip` são considerados.
    #[schema(value_type = Object)]
    pub company: Map<String, Value>,

    /// Quais campos de `company` aplicar.
    pub fields: Vec<String>,
}

// ---
// Handlers
// ---

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Company),
        (status = 400, description = "Campos obrigatórios ausentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    // Corpo ilegível ou listas que não são listas já saem como MissingFields
    AppJson(payload): AppJson<CreateCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let name = payload
        .name
        .ok_or_else(|| to_api(AppError::MissingFields("name".into())))?;
    let admins = payload
        .admins
        .ok_or_else(|| to_api(AppError::MissingFields("admins".into())))?;
    let basic_users = payload
        .basic_users
        .ok_or_else(|| to_api(AppError::MissingFields("basicUsers".into())))?;

    let company = app_state
        .company_service
        .create_company(&name, &admins, &basic_users, &user.0.id)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    responses(
        (status = 200, description = "Empresas do usuário (admin ou membro)", body = Vec<Company>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let companies = app_state
        .company_service
        .list_companies(&user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(companies))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses(
        (status = 200, description = "Empresa", body = Company),
        (status = 403, description = "Sem acesso à empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .company_service
        .get_company(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

#[utoipa::path(
    put,
    path = "/api/companies/{company_id}/settings",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    request_body = UpdateSettingsPayload,
    responses(
        (status = 200, description = "Configurações atualizadas", body = Company),
        (status = 403, description = "Apenas admins")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateSettingsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .company_service
        .update_settings(company_id, &payload.company, &payload.fields, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}
