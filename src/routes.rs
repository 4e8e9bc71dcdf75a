// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

/// Monta o router completo. `main` e os testes usam o mesmo.
pub fn app_router(app_state: AppState) -> Router {
    // Tudo que é de uma empresa fica sob /api/companies/{company_id}
    let company_routes = Router::new()
        .route("/settings", put(handlers::companies::update_settings))
        // Usuários e convites
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::add_user),
        )
        .route("/users/remove", post(handlers::users::remove_users))
        .route("/users/{user_id}/promote", post(handlers::users::promote_user))
        .route("/users/{user_id}/demote", post(handlers::users::demote_user))
        .route("/invites/sync", post(handlers::users::sync_invites))
        // Dispositivos
        .route(
            "/devices",
            get(handlers::devices::list_devices).post(handlers::devices::create_device),
        )
        .route("/devices/{device_id}", get(handlers::devices::get_device))
        // Cobrança
        .route(
            "/billing/account",
            get(handlers::billing::get_account).post(handlers::billing::create_account),
        )
        .route("/billing/status", get(handlers::billing::get_status))
        .route("/billing/update-link", get(handlers::billing::get_update_link))
        .route("/billing/dashboard-link", get(handlers::billing::get_dashboard_link))
        .route(
            "/billing/payment-method",
            get(handlers::billing::get_payment_method)
                .post(handlers::billing::attach_payment_method)
                .delete(handlers::billing::remove_payment_method),
        )
        // Assinaturas
        .route("/subscriptions", get(handlers::subscriptions::list_subscriptions))
        .route("/subscriptions/had-trial", get(handlers::subscriptions::had_trial))
        .route("/subscriptions/start", post(handlers::subscriptions::start_subscription))
        .route("/subscriptions/stop", post(handlers::subscriptions::stop_subscription))
        .route("/subscriptions/pause", post(handlers::subscriptions::pause_subscription));

    let protected_routes = Router::new()
        .route(
            "/companies",
            get(handlers::companies::list_companies).post(handlers::companies::create_company),
        )
        .route("/companies/{company_id}", get(handlers::companies::get_company))
        .nest("/companies/{company_id}", company_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let public_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/billing/public-key", get(handlers::billing::get_public_key))
        .route("/billing/prices", get(handlers::billing::list_prices))
        .route("/billing/products", get(handlers::billing::list_products));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", protected_routes.merge(public_routes))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
