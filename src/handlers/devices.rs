// src/handlers/devices.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::{AppJson, AppPath},
        i18n::Locale,
    },
    models::device::{Device, NewDevice},
};

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/devices",
    tag = "Devices",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    request_body = NewDevice,
    responses(
        (status = 201, description = "Dispositivo registrado", body = Device),
        (status = 400, description = "Campos inválidos"),
        (status = 403, description = "Apenas admins")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_device(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
    AppJson(payload): AppJson<NewDevice>,
) -> Result<impl IntoResponse, ApiError> {
    // A validação dos campos acontece no serviço, depois do gate
    let device = app_state
        .device_service
        .create_device(company_id, &payload, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(device)))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/devices",
    tag = "Devices",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Dispositivos da empresa", body = Vec<Device>)),
    security(("api_jwt" = []))
)]
pub async fn list_devices(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let devices = app_state
        .device_service
        .list_devices(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(devices))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/devices/{device_id}",
    tag = "Devices",
    params(
        ("company_id" = Uuid, Path, description = "ID da Empresa"),
        ("device_id" = Uuid, Path, description = "ID do Dispositivo")
    ),
    responses(
        (status = 200, description = "Dispositivo", body = Device),
        (status = 404, description = "Não existe nesta empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_device(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath((company_id, device_id)): AppPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let device = app_state
        .device_service
        .get_device(company_id, device_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(device))
}
