// src/config.rs

use anyhow::{anyhow, Context};
use sqlx::PgPool;
use std::{env, sync::Arc, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::{CompanyStore, DeviceStore, PgCompanyStore, PgDeviceStore},
    services::{
        BillingService, ClerkClient, CompanyService, DeviceService, IdentityProvider,
        PaymentProcessor, SessionVerifier, StripeClient, TrialConfig,
    },
};

// Como os tokens de sessão são verificados
#[derive(Clone)]
pub enum SessionKey {
    RsaPem(String),
    Secret(String),
}

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub clerk_secret_key: String,
    pub clerk_api_url: String,
    pub session_key: SessionKey,
    pub stripe_secret: String,
    pub stripe_public: String,
    pub stripe_api_url: String,
    pub trial: TrialConfig,
    pub http_timeout: Duration,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("{} deve ser definida", name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parsed<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(name, default)
        .parse::<T>()
        .with_context(|| format!("{} tem um valor inválido", name))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let session_key = match (env::var("CLERK_JWT_KEY"), env::var("SESSION_JWT_SECRET")) {
            (Ok(pem), _) if !pem.trim().is_empty() => SessionKey::RsaPem(pem.replace("\\n", "\n")),
            (_, Ok(secret)) if !secret.trim().is_empty() => SessionKey::Secret(secret),
            _ => return Err(anyhow!("CLERK_JWT_KEY ou SESSION_JWT_SECRET deve ser definida")),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", "5")?,
            bind_addr: optional("BIND_ADDR", "0.0.0.0:3000"),
            clerk_secret_key: required("CLERK_SECRET_KEY")?,
            clerk_api_url: optional("CLERK_API_URL", "https://api.clerk.com/v1"),
            session_key,
            stripe_secret: required("STRIPE_SECRET")?,
            stripe_public: required("STRIPE_PUBLIC")?,
            stripe_api_url: optional("STRIPE_API_URL", "https://api.stripe.com/v1"),
            trial: TrialConfig {
                enabled: optional("TRIAL_PERIOD", "No") == "Yes",
                days: parsed("TRIAL_PERIOD_DAYS", "0")?,
            },
            http_timeout: Duration::from_secs(parsed("HTTP_TIMEOUT_SECS", "15")?),
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub session_verifier: SessionVerifier,
    pub company_service: CompanyService,
    pub device_service: DeviceService,
    pub billing_service: BillingService,
    pub i18n_store: I18nStore,
    pub stripe_public_key: String,
}

impl AppState {
    /// Monta o gráfico de dependências de produção.
    pub fn new(config: &Config, pool: PgPool) -> anyhow::Result<Self> {
        let session_verifier = match &config.session_key {
            SessionKey::RsaPem(pem) => SessionVerifier::from_rsa_pem(pem)?,
            SessionKey::Secret(secret) => SessionVerifier::from_secret(secret),
        };

        let companies: Arc<dyn CompanyStore> = Arc::new(PgCompanyStore::new(pool.clone()));
        let devices: Arc<dyn DeviceStore> = Arc::new(PgDeviceStore::new(pool));
        let identity: Arc<dyn IdentityProvider> = Arc::new(ClerkClient::new(
            &config.clerk_api_url,
            &config.clerk_secret_key,
            config.http_timeout,
        )?);
        let payments: Arc<dyn PaymentProcessor> = Arc::new(StripeClient::new(
            &config.stripe_api_url,
            &config.stripe_secret,
            config.http_timeout,
        )?);

        Ok(Self::from_parts(
            session_verifier,
            companies,
            devices,
            identity,
            payments,
            config.trial,
            config.stripe_public.clone(),
        ))
    }

    /// Monta o estado a partir de implementações quaisquer (usado nos testes).
    pub fn from_parts(
        session_verifier: SessionVerifier,
        companies: Arc<dyn CompanyStore>,
        devices: Arc<dyn DeviceStore>,
        identity: Arc<dyn IdentityProvider>,
        payments: Arc<dyn PaymentProcessor>,
        trial: TrialConfig,
        stripe_public_key: String,
    ) -> Self {
        Self {
            session_verifier,
            company_service: CompanyService::new(companies.clone(), identity.clone(), payments.clone()),
            device_service: DeviceService::new(companies.clone(), devices),
            billing_service: BillingService::new(companies, identity, payments, trial),
            i18n_store: I18nStore::load(),
            stripe_public_key,
        }
    }
}
