// src/services/stripe.rs
//
// Cliente do processador de pagamentos (API REST do Stripe). Requisições
// em form-urlencoded, com a notação de colchetes do Stripe para objetos.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::billing::{
        Account, AccountLink, CancelOptions, Customer, Invoice, LoginLink, NewAccount, NewInvoice,
        NewSubscription, PaymentMethod, Price, Product, SetupIntent, StripeList, Subscription,
        SubscriptionItem, SubscriptionQuery,
    },
};

const SERVICE: &str = "stripe";

/// As primitivas do processador que o orquestrador de cobrança usa.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    // --- Clientes ---
    async fn create_customer(
        &self,
        email: Option<&str>,
        name: &str,
        company_id: Uuid,
    ) -> Result<Customer, AppError>;
    async fn get_customer(&self, customer_id: &str) -> Result<Customer, AppError>;
    async fn delete_customer(&self, customer_id: &str) -> Result<(), AppError>;
    async fn set_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<Customer, AppError>;

    // --- Contas conectadas ---
    async fn create_account(&self, new: &NewAccount) -> Result<Account, AppError>;
    async fn get_account(&self, account_id: &str) -> Result<Account, AppError>;
    async fn delete_account(&self, account_id: &str) -> Result<(), AppError>;
    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, AppError>;
    async fn create_login_link(&self, account_id: &str) -> Result<LoginLink, AppError>;

    // --- Métodos de pagamento ---
    async fn list_payment_methods(&self, customer_id: &str) -> Result<Vec<PaymentMethod>, AppError>;
    async fn get_customer_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, AppError>;
    async fn create_setup_intent(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<SetupIntent, AppError>;
    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<PaymentMethod, AppError>;

    // --- Assinaturas ---
    async fn list_subscriptions(&self, query: &SubscriptionQuery) -> Result<Vec<Subscription>, AppError>;
    async fn create_subscription(&self, new: &NewSubscription) -> Result<Subscription, AppError>;
    async fn set_subscription_payment_method(
        &self,
        subscription_id: &str,
        payment_method_id: &str,
    ) -> Result<Subscription, AppError>;
    async fn cancel_subscription_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, AppError>;
    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        options: CancelOptions,
    ) -> Result<Subscription, AppError>;
    async fn add_subscription_item(
        &self,
        subscription_id: &str,
        price_id: &str,
    ) -> Result<SubscriptionItem, AppError>;
    async fn delete_subscription_item(&self, item_id: &str) -> Result<(), AppError>;

    // --- Faturas ---
    async fn list_invoices(
        &self,
        subscription_id: &str,
        status: &str,
    ) -> Result<Vec<Invoice>, AppError>;
    async fn create_invoice(&self, new: &NewInvoice) -> Result<Invoice, AppError>;
    async fn finalize_invoice(&self, invoice_id: &str) -> Result<Invoice, AppError>;

    // --- Catálogo ---
    async fn list_prices(&self) -> Result<Vec<Price>, AppError>;
    async fn list_products(&self) -> Result<Vec<Product>, AppError>;
}

type Params = Vec<(String, String)>;

fn param(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

// Resposta de DELETE: { id, object, deleted: true }
#[derive(Deserialize)]
struct Deleted {
    #[allow(dead_code)]
    id: String,
}

// Maior página que o Stripe aceita
const PAGE_SIZE: u32 = 100;

// Itens de listagem; o id do último é o cursor da próxima página
trait Listed: DeserializeOwned + Send {
    fn cursor(&self) -> &str;
}

impl Listed for PaymentMethod {
    fn cursor(&self) -> &str {
        &self.id
    }
}

impl Listed for Subscription {
    fn cursor(&self) -> &str {
        &self.id
    }
}

impl Listed for Price {
    fn cursor(&self) -> &str {
        &self.id
    }
}

impl Listed for Product {
    fn cursor(&self) -> &str {
        &self.id
    }
}

#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(base_url: &str, secret_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = request.bearer_auth(&self.secret_key).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<StripeErrorBody>(&body) {
                Ok(parsed) => format!(
                    "{} ({}): {}",
                    status,
                    parsed.error.kind.unwrap_or_default(),
                    parsed.error.message.unwrap_or_default()
                ),
                Err(_) => format!("{}: {}", status, body),
            };
            return Err(AppError::external(SERVICE, message));
        }

        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &Params) -> Result<T, AppError> {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    /// GET de listagem seguindo `has_more` até a última página.
    async fn get_all<T: Listed>(&self, path: &str, query: &Params) -> Result<Vec<T>, AppError> {
        let mut items: Vec<T> = Vec::new();
        loop {
            let mut params = query.clone();
            params.push(param("limit", PAGE_SIZE));
            if let Some(last) = items.last() {
                params.push(param("starting_after", last.cursor()));
            }

            let page: StripeList<T> = self.get(path, &params).await?;
            let has_more = page.has_more && !page.data.is_empty();
            items.extend(page.data);
            if !has_more {
                return Ok(items);
            }
        }
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, form: &Params) -> Result<T, AppError> {
        self.send(self.http.post(self.url(path)).form(form)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str, query: &Params) -> Result<T, AppError> {
        self.send(self.http.delete(self.url(path)).query(query)).await
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_customer(
        &self,
        email: Option<&str>,
        name: &str,
        company_id: Uuid,
    ) -> Result<Customer, AppError> {
        let mut form = vec![
            param("name", name),
            param("metadata[tip_driver_id]", company_id),
        ];
        if let Some(email) = email {
            form.push(param("email", email));
        }
        self.post("/customers", &form).await
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Customer, AppError> {
        self.get(&format!("/customers/{}", customer_id), &Params::new()).await
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<(), AppError> {
        let _: Deleted = self.delete(&format!("/customers/{}", customer_id), &Params::new()).await?;
        Ok(())
    }

    async fn set_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<Customer, AppError> {
        let form = vec![param("invoice_settings[default_payment_method]", payment_method_id)];
        self.post(&format!("/customers/{}", customer_id), &form).await
    }

    async fn create_account(&self, new: &NewAccount) -> Result<Account, AppError> {
        let form = vec![
            param("type", "express"),
            param("business_type", "company"),
            param("business_profile[name]", &new.business_name),
            param("business_profile[support_email]", &new.email),
            param("country", "US"),
            param("email", &new.email),
            param("capabilities[card_payments][requested]", true),
            param("capabilities[transfers][requested]", true),
            param("metadata[companyId]", &new.company_id),
            param("settings[payouts][schedule][interval]", "weekly"),
            param("settings[payouts][schedule][weekly_anchor]", "monday"),
            param("settings[payouts][debit_negative_balances]", false),
        ];
        self.post("/accounts", &form).await
    }

    async fn get_account(&self, account_id: &str) -> Result<Account, AppError> {
        self.get(&format!("/accounts/{}", account_id), &Params::new()).await
    }

    async fn delete_account(&self, account_id: &str) -> Result<(), AppError> {
        let _: Deleted = self.delete(&format!("/accounts/{}", account_id), &Params::new()).await?;
        Ok(())
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, AppError> {
        let form = vec![
            param("account", account_id),
            param("type", "account_onboarding"),
            param("refresh_url", refresh_url),
            param("return_url", return_url),
        ];
        self.post("/account_links", &form).await
    }

    async fn create_login_link(&self, account_id: &str) -> Result<LoginLink, AppError> {
        self.post(&format!("/accounts/{}/login_links", account_id), &Params::new()).await
    }

    async fn list_payment_methods(&self, customer_id: &str) -> Result<Vec<PaymentMethod>, AppError> {
        self.get_all(&format!("/customers/{}/payment_methods", customer_id), &Params::new())
            .await
    }

    async fn get_customer_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, AppError> {
        self.get(
            &format!("/customers/{}/payment_methods/{}", customer_id, payment_method_id),
            &Params::new(),
        )
        .await
    }

    async fn create_setup_intent(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<SetupIntent, AppError> {
        let form = vec![
            param("customer", customer_id),
            param("payment_method", payment_method_id),
            param("confirm", true),
            param("automatic_payment_methods[enabled]", true),
            param("automatic_payment_methods[allow_redirects]", "never"),
        ];
        self.post("/setup_intents", &form).await
    }

    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<PaymentMethod, AppError> {
        self.post(&format!("/payment_methods/{}/detach", payment_method_id), &Params::new())
            .await
    }

    async fn list_subscriptions(&self, query: &SubscriptionQuery) -> Result<Vec<Subscription>, AppError> {
        let mut params = vec![param("customer", &query.customer)];
        if let Some(status) = query.status {
            params.push(param("status", status));
        }
        if let Some(price) = &query.price {
            params.push(param("price", price));
        }

        self.get_all("/subscriptions", &params).await
    }

    async fn create_subscription(&self, new: &NewSubscription) -> Result<Subscription, AppError> {
        let mut form = vec![
            param("customer", &new.customer),
            param("collection_method", "charge_automatically"),
            param("items[0][price]", &new.price_id),
            param("billing_cycle_anchor", new.billing_cycle_anchor),
        ];
        if let Some(days) = new.trial_period_days {
            form.push(param("trial_period_days", days));
            form.push(param(
                "trial_settings[end_behavior][missing_payment_method]",
                "cancel",
            ));
        }
        if let Some(kind) = new.subscription_type {
            form.push(param("metadata[type]", kind.as_str()));
        }
        self.post("/subscriptions", &form).await
    }

    async fn set_subscription_payment_method(
        &self,
        subscription_id: &str,
        payment_method_id: &str,
    ) -> Result<Subscription, AppError> {
        let form = vec![param("default_payment_method", payment_method_id)];
        self.post(&format!("/subscriptions/{}", subscription_id), &form).await
    }

    async fn cancel_subscription_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, AppError> {
        let form = vec![param("cancel_at_period_end", true)];
        self.post(&format!("/subscriptions/{}", subscription_id), &form).await
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        options: CancelOptions,
    ) -> Result<Subscription, AppError> {
        let mut params = vec![param("invoice_now", options.invoice_now)];
        if options.prorate {
            params.push(param("prorate", true));
        }
        self.delete(&format!("/subscriptions/{}", subscription_id), &params).await
    }

    async fn add_subscription_item(
        &self,
        subscription_id: &str,
        price_id: &str,
    ) -> Result<SubscriptionItem, AppError> {
        let form = vec![param("subscription", subscription_id), param("price", price_id)];
        self.post("/subscription_items", &form).await
    }

    async fn delete_subscription_item(&self, item_id: &str) -> Result<(), AppError> {
        let params = vec![
            param("proration_behavior", "always_invoice"),
            param("clear_usage", true),
        ];
        let _: Deleted = self.delete(&format!("/subscription_items/{}", item_id), &params).await?;
        Ok(())
    }

    async fn list_invoices(
        &self,
        subscription_id: &str,
        status: &str,
    ) -> Result<Vec<Invoice>, AppError> {
        let params = vec![param("subscription", subscription_id), param("status", status)];
        let list: StripeList<Invoice> = self.get("/invoices", &params).await?;
        Ok(list.data)
    }

    async fn create_invoice(&self, new: &NewInvoice) -> Result<Invoice, AppError> {
        let form = vec![
            param("customer", &new.customer),
            param("subscription", &new.subscription),
            param("description", &new.description),
            param("auto_advance", true),
            param("collection_method", "charge_automatically"),
        ];
        self.post("/invoices", &form).await
    }

    async fn finalize_invoice(&self, invoice_id: &str) -> Result<Invoice, AppError> {
        self.post(&format!("/invoices/{}/finalize", invoice_id), &Params::new()).await
    }

    async fn list_prices(&self) -> Result<Vec<Price>, AppError> {
        self.get_all("/prices", &vec![param("active", true)]).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let params = vec![param("active", true), param("expand[]", "data.default_price")];
        self.get_all("/products", &params).await
    }
}
