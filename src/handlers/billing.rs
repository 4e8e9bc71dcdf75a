// src/handlers/billing.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::{AppJson, AppPath, AppQuery},
        i18n::Locale,
    },
    models::billing::{Account, BillingStatus, PaymentMethod, Price, Product},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountPayload {
    // Para onde o onboarding volta (e recomeça, se expirar)
    #[validate(url(message = "URL de retorno inválida."))]
    pub return_url: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RedirectQuery {
    #[validate(url(message = "URL de retorno inválida."))]
    pub redirect_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachPaymentMethodPayload {
    #[schema(example = "pm_1NqQ2b")]
    pub payment_method_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkResponse {
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    pub public_key: String,
}

// ---
// Conta conectada
// ---

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/billing/account",
    tag = "Billing",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    request_body = CreateAccountPayload,
    responses((status = 201, description = "Conta criada; link de onboarding", body = LinkResponse)),
    security(("api_jwt" = []))
)]
pub async fn create_account(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CreateAccountPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let url = app_state
        .billing_service
        .create_account(company_id, &payload.return_url, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(LinkResponse { url })))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/billing/account",
    tag = "Billing",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Conta conectada, ou null", body = Option<Account>)),
    security(("api_jwt" = []))
)]
pub async fn get_account(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let account = app_state
        .billing_service
        .account(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(account))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/billing/status",
    tag = "Billing",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Estado de cobrança derivado", body = BillingStatus)),
    security(("api_jwt" = []))
)]
pub async fn get_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .billing_service
        .status(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(status))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/billing/update-link",
    tag = "Billing",
    params(("company_id" = Uuid, Path, description = "ID da Empresa"), RedirectQuery),
    responses((status = 200, description = "Link para completar o onboarding", body = LinkResponse)),
    security(("api_jwt" = []))
)]
pub async fn get_update_link(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<RedirectQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let url = app_state
        .billing_service
        .update_link(company_id, &query.redirect_url, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(LinkResponse { url }))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/billing/dashboard-link",
    tag = "Billing",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Link de login no painel do processador", body = LinkResponse)),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard_link(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let url = app_state
        .billing_service
        .dashboard_link(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(LinkResponse { url }))
}

// ---
// Método de pagamento
// ---

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/billing/payment-method",
    tag = "Billing",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Método padrão, ou null", body = Option<PaymentMethod>)),
    security(("api_jwt" = []))
)]
pub async fn get_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let method = app_state
        .billing_service
        .payment_method(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(method))
}

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/billing/payment-method",
    tag = "Billing",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    request_body = AttachPaymentMethodPayload,
    responses((status = 204, description = "Método anexado; os anteriores foram removidos")),
    security(("api_jwt" = []))
)]
pub async fn attach_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
    AppJson(payload): AppJson<AttachPaymentMethodPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .billing_service
        .attach_payment_method(company_id, &payload.payment_method_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/billing/payment-method",
    tag = "Billing",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 204, description = "Assinaturas canceladas e método removido")),
    security(("api_jwt" = []))
)]
pub async fn remove_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .billing_service
        .remove_payment_method(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Públicos (sem empresa)
// ---

#[utoipa::path(
    get,
    path = "/api/billing/public-key",
    tag = "Billing",
    responses((status = 200, description = "Chave publicável do processador", body = PublicKeyResponse))
)]
pub async fn get_public_key(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(PublicKeyResponse {
        public_key: app_state.stripe_public_key.clone(),
    })
}

#[utoipa::path(
    get,
    path = "/api/billing/prices",
    tag = "Billing",
    responses((status = 200, description = "Preços ativos", body = Vec<Price>))
)]
pub async fn list_prices(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let prices = app_state
        .billing_service
        .prices()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(prices))
}

#[utoipa::path(
    get,
    path = "/api/billing/products",
    tag = "Billing",
    responses((status = 200, description = "Produtos ativos com o preço padrão", body = Vec<Product>))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .billing_service
        .products()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}
