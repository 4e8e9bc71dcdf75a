// src/handlers/users.rs

use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::{AppJson, AppPath},
        i18n::Locale,
    },
    models::{
        company::{Company, CompanyUsers, Role, RoleChange},
        identity::UserProfile,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddUserPayload {
    #[validate(email(message = "E-mail inválido."))]
    #[schema(example = "ana@acme.com")]
    pub email: String,

    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddUserResponse {
    // null quando o e-mail ainda não é de um usuário e foi convidado
    pub user: Option<UserProfile>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveUsersPayload {
    pub user_ids: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/users",
    tag = "Users",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Membros e convites pendentes", body = CompanyUsers)),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .company_service
        .list_users(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/users",
    tag = "Users",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    request_body = AddUserPayload,
    responses((status = 200, description = "Usuário adicionado ou convidado", body = AddUserResponse)),
    security(("api_jwt" = []))
)]
pub async fn add_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
    AppJson(payload): AppJson<AddUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let added = app_state
        .company_service
        .add_user(company_id, &payload.email, payload.role, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AddUserResponse {
        user: added.as_ref().map(UserProfile::from),
    }))
}

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/users/remove",
    tag = "Users",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    request_body = RemoveUsersPayload,
    responses((status = 200, description = "Usuários removidos", body = Company)),
    security(("api_jwt" = []))
)]
pub async fn remove_users(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
    AppJson(payload): AppJson<RemoveUsersPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .company_service
        .remove_users(company_id, &payload.user_ids, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

async fn change_role(
    app_state: AppState,
    locale: Locale,
    user: AuthenticatedUser,
    company_id: Uuid,
    target_id: String,
    direction: RoleChange,
) -> Result<Json<Company>, ApiError> {
    let company = app_state
        .company_service
        .change_user_role(company_id, &target_id, direction, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/users/{user_id}/promote",
    tag = "Users",
    params(
        ("company_id" = Uuid, Path, description = "ID da Empresa"),
        ("user_id" = String, Path, description = "ID do usuário no provedor de identidade")
    ),
    responses((status = 200, description = "Usuário promovido a admin", body = Company)),
    security(("api_jwt" = []))
)]
pub async fn promote_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath((company_id, target_id)): AppPath<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    change_role(app_state, locale, user, company_id, target_id, RoleChange::Up).await
}

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/users/{user_id}/demote",
    tag = "Users",
    params(
        ("company_id" = Uuid, Path, description = "ID da Empresa"),
        ("user_id" = String, Path, description = "ID do usuário no provedor de identidade")
    ),
    responses((status = 200, description = "Usuário rebaixado a membro", body = Company)),
    security(("api_jwt" = []))
)]
pub async fn demote_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath((company_id, target_id)): AppPath<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    change_role(app_state, locale, user, company_id, target_id, RoleChange::Down).await
}

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/invites/sync",
    tag = "Users",
    params(("company_id" = Uuid, Path, description = "ID da Empresa")),
    responses((status = 200, description = "Convites aceitos viram membros", body = Company)),
    security(("api_jwt" = []))
)]
pub async fn sync_invites(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(company_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .company_service
        .sync_invites(company_id, &user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}
