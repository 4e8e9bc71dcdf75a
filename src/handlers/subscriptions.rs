// src/handlers/subscriptions.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::{AppJson, AppPath},
        i18n::Locale,
    },
    models::billing::{Subscription, SubscriptionType},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartSubscriptionPayload {
    #[schema(example = "price_1OabcD")]
    pub price_id: String,

    // Gravado em metadata.type na assinatura nova
    pub subscription_type: Option<SubscriptionType>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopSubscriptionPayload {
    pub price_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PauseSubscriptionPayload {
    pub subscription_type: SubscriptionType,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HadTrialResponse {
    pub had_trial: bool,
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/subscriptions",
    tag = "Subscriptions",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Assinaturas correntes", body = Vec<Subscription>)),
    security(("api_jwt" = []))
)]
pub async fn list_subscriptions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let subscriptions = app_state
        .billing_service
        .list_subscriptions(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(subscriptions))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/subscriptions/had-trial",
    tag = "Subscriptions",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Se alguma assinatura já teve período de teste", body = HadTrialResponse)),
    security(("api_jwt" = []))
)]
pub async fn had_trial(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let had_trial = app_state
        .billing_service
        .had_trial(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(HadTrialResponse { had_trial }))
}

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/subscriptions/start",
    tag = "Subscriptions",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    request_body = StartSubscriptionPayload,
    responses(
        (status = 204, description = "Assinatura criada ou item adicionado"),
        (status = 400, description = "Sem método de pagamento e sem direito a teste")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
    AppJson(payload): AppJson<StartSubscriptionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .billing_service
        .start_subscription(company_id, &payload.price_id, payload.subscription_type, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/subscriptions/stop",
    tag = "Subscriptions",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    request_body = StopSubscriptionPayload,
    responses((status = 204, description = "Preço encerrado (no-op se não assinado)")),
    security(("api_jwt" = []))
)]
pub async fn stop_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
    AppJson(payload): AppJson<StopSubscriptionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .billing_service
        .stop_subscription(company_id, &payload.price_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/subscriptions/pause",
    tag = "Subscriptions",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    request_body = PauseSubscriptionPayload,
    responses(
        (status = 204, description = "Fatura proporcional emitida; cancela no fim do ciclo"),
        (status = 404, description = "Nenhuma assinatura do app")
    ),
    security(("api_jwt" = []))
)]
pub async fn pause_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
    AppJson(payload): AppJson<PauseSubscriptionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .billing_service
        .pause_subscription(company_id, payload.subscription_type, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
