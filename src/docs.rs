// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common::error::ErrorKind;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Companies ---
        handlers::companies::create_company,
        handlers::companies::list_companies,
        handlers::companies::get_company,
        handlers::companies::update_settings,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::add_user,
        handlers::users::remove_users,
        handlers::users::promote_user,
        handlers::users::demote_user,
        handlers::users::sync_invites,

        // --- Devices ---
        handlers::devices::create_device,
        handlers::devices::list_devices,
        handlers::devices::get_device,

        // --- Billing ---
        handlers::billing::create_account,
        handlers::billing::get_account,
        handlers::billing::get_status,
        handlers::billing::get_update_link,
        handlers::billing::get_dashboard_link,
        handlers::billing::get_payment_method,
        handlers::billing::attach_payment_method,
        handlers::billing::remove_payment_method,
        handlers::billing::get_public_key,
        handlers::billing::list_prices,
        handlers::billing::list_products,

        // --- Subscriptions ---
        handlers::subscriptions::list_subscriptions,
        handlers::subscriptions::had_trial,
        handlers::subscriptions::start_subscription,
        handlers::subscriptions::stop_subscription,
        handlers::subscriptions::pause_subscription,
    ),
    components(
        schemas(
            ErrorKind,

            // --- Companies ---
            models::company::Role,
            models::company::RoleChange,
            models::company::Invites,
            models::company::Company,
            models::company::CompanyUser,
            models::company::CompanyUsers,
            handlers::companies::CreateCompanyPayload,
            handlers::companies::UpdateSettingsPayload,
            handlers::users::AddUserPayload,
            handlers::users::AddUserResponse,
            models::identity::UserProfile,
            handlers::users::RemoveUsersPayload,

            // --- Devices ---
            models::device::DeviceStatus,
            models::device::Device,
            models::device::NewDevice,

            // --- Billing ---
            models::billing::Account,
            models::billing::AccountRequirements,
            models::billing::AccountState,
            models::billing::BillingStatus,
            models::billing::PaymentMethod,
            models::billing::Card,
            models::billing::Price,
            models::billing::Recurring,
            models::billing::Product,
            models::billing::Subscription,
            models::billing::SubscriptionItem,
            models::billing::SubscriptionStatus,
            models::billing::SubscriptionType,
            handlers::billing::CreateAccountPayload,
            handlers::billing::AttachPaymentMethodPayload,
            handlers::billing::LinkResponse,
            handlers::billing::PublicKeyResponse,
            handlers::subscriptions::StartSubscriptionPayload,
            handlers::subscriptions::StopSubscriptionPayload,
            handlers::subscriptions::PauseSubscriptionPayload,
            handlers::subscriptions::HadTrialResponse,
        )
    ),
    tags(
        (name = "Companies", description = "Empresas e configurações"),
        (name = "Users", description = "Membros, papéis e convites"),
        (name = "Devices", description = "Dispositivos de gorjeta"),
        (name = "Billing", description = "Conta conectada e método de pagamento"),
        (name = "Subscriptions", description = "Assinaturas da empresa")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
