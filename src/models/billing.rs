// src/models/billing.rs
//
// Objetos do processador de pagamentos (API REST do Stripe). Os campos
// seguem o JSON do Stripe; só mapeamos o que a aplicação usa.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

// Resposta de listagem do Stripe: { "object": "list", "data": [...] }
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StripeList<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> Default for StripeList<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            has_more: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InvoiceSettings {
    #[serde(default)]
    pub default_payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: String,
    // Clientes apagados voltam só com { id, deleted: true }
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub invoice_settings: Option<InvoiceSettings>,
}

impl Customer {
    pub fn default_payment_method(&self) -> Option<&str> {
        self.invoice_settings
            .as_ref()
            .and_then(|s| s.default_payment_method.as_deref())
    }
}

// ---
// Conta conectada (recebedor dos pagamentos)
// ---
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AccountRequirements {
    #[serde(default)]
    pub currently_due: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub payouts_enabled: bool,
    #[serde(default)]
    pub details_submitted: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub requirements: Option<AccountRequirements>,
}

// Parâmetros de criação de uma conta express
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub business_name: String,
    pub email: String,
    pub company_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountLink {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginLink {
    pub url: String,
}

// ---
// Métodos de pagamento
// ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Card {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default)]
    pub exp_month: Option<u32>,
    #[serde(default)]
    pub exp_year: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub card: Option<Card>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetupIntent {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

// ---
// Catálogo
// ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Recurring {
    pub interval: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Price {
    pub id: String,
    // Sem expand, o produto vem só como ID
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub unit_amount: Option<i64>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub recurring: Option<Recurring>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
    // Pedimos sempre `expand[]=data.default_price`
    #[serde(default)]
    pub default_price: Option<Price>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

// ---
// Assinaturas
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    Incomplete,
    IncompleteExpired,
    PastDue,
    Canceled,
    Unpaid,
    Paused,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionItem {
    pub id: String,
    pub price: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    pub id: String,
    pub customer: String,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    // Timestamp unix; presente se a assinatura já teve período de teste
    #[serde(default)]
    pub trial_start: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub default_payment_method: Option<String>,
    #[serde(default)]
    pub items: StripeList<SubscriptionItem>,
}

impl Subscription {
    pub fn has_price(&self, price_id: &str) -> bool {
        self.items.data.iter().any(|item| item.price.id == price_id)
    }

    pub fn is_app(&self) -> bool {
        self.metadata.get("type").map(String::as_str) == Some(SubscriptionType::App.as_str())
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        )
    }
}

/// O produto que a assinatura representa (metadata `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    App,
    Device,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::App => "app",
            SubscriptionType::Device => "device",
        }
    }
}

// Filtro de listagem de assinaturas
#[derive(Debug, Clone, Default)]
pub struct SubscriptionQuery {
    pub customer: String,
    // "all" inclui canceladas; None = apenas as correntes
    pub status: Option<&'static str>,
    pub price: Option<String>,
}

impl SubscriptionQuery {
    pub fn current(customer: &str) -> Self {
        Self {
            customer: customer.to_string(),
            ..Default::default()
        }
    }

    pub fn history(customer: &str) -> Self {
        Self {
            customer: customer.to_string(),
            status: Some("all"),
            ..Default::default()
        }
    }

    pub fn with_price(customer: &str, price_id: &str) -> Self {
        Self {
            customer: customer.to_string(),
            price: Some(price_id.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub customer: String,
    pub price_id: String,
    pub trial_period_days: Option<u32>,
    // Timestamp unix (sempre o dia 1 do mês seguinte)
    pub billing_cycle_anchor: i64,
    pub subscription_type: Option<SubscriptionType>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CancelOptions {
    pub invoice_now: bool,
    pub prorate: bool,
}

// ---
// Faturas
// ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub customer: String,
    pub subscription: String,
    pub description: String,
}

// ---
// Estado de cobrança derivado (não é salvo). São eixos independentes.
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AccountState {
    NoAccount,
    Onboarding,
    Active,
}

impl AccountState {
    pub fn of(account: Option<&Account>) -> Self {
        match account {
            None => AccountState::NoAccount,
            Some(a) if a.charges_enabled && a.payouts_enabled => AccountState::Active,
            Some(_) => AccountState::Onboarding,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingStatus {
    pub account_state: AccountState,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    // Quantos campos o Stripe ainda exige no onboarding
    pub missing_fields: usize,
    pub payment_method_present: bool,
    pub subscriptions_active: bool,
}

impl BillingStatus {
    pub fn derive(
        account: Option<&Account>,
        customer: &Customer,
        subscriptions: &[Subscription],
    ) -> Self {
        let missing_fields = account
            .and_then(|a| a.requirements.as_ref())
            .map(|r| r.currently_due.len())
            .unwrap_or(0);

        Self {
            account_state: AccountState::of(account),
            charges_enabled: account.is_some_and(|a| a.charges_enabled),
            payouts_enabled: account.is_some_and(|a| a.payouts_enabled),
            missing_fields,
            payment_method_present: !customer.deleted && customer.default_payment_method().is_some(),
            subscriptions_active: !subscriptions.is_empty()
                && subscriptions.iter().all(Subscription::is_running),
        }
    }
}
