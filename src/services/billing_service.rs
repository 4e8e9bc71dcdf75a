// src/services/billing_service.rs
//
// Orquestração de cobrança: conta conectada, método de pagamento e
// assinaturas da empresa no processador de pagamentos.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CompanyStore,
    models::{
        billing::{
            Account, BillingStatus, CancelOptions, Customer, NewAccount, NewInvoice, NewSubscription,
            PaymentMethod, Price, Product, Subscription, SubscriptionQuery, SubscriptionStatus,
            SubscriptionType,
        },
        company::{Access, Company},
    },
    services::{
        authorization::CompanyGate, clerk::IdentityProvider, stripe::PaymentProcessor,
    },
};

const PRORATED_INVOICE_DESCRIPTION: &str = "Prorated invoice for premium app subscription";

/// Período de teste das novas assinaturas.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrialConfig {
    pub enabled: bool,
    pub days: u32,
}

/// Âncora de cobrança: dia 1 do mês seguinte, meia-noite UTC.
pub fn next_billing_anchor(now: DateTime<Utc>) -> Result<i64, AppError> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };

    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .map(|anchor| anchor.timestamp())
        .ok_or_else(|| {
            AppError::InternalServerError(anyhow::anyhow!(
                "Data de âncora inválida: {}-{}",
                year,
                month
            ))
        })
}

#[derive(Clone)]
pub struct BillingService {
    gate: CompanyGate,
    store: Arc<dyn CompanyStore>,
    identity: Arc<dyn IdentityProvider>,
    payments: Arc<dyn PaymentProcessor>,
    trial: TrialConfig,
}

impl BillingService {
    pub fn new(
        store: Arc<dyn CompanyStore>,
        identity: Arc<dyn IdentityProvider>,
        payments: Arc<dyn PaymentProcessor>,
        trial: TrialConfig,
    ) -> Self {
        Self {
            gate: CompanyGate::new(store.clone()),
            store,
            identity,
            payments,
            trial,
        }
    }

    async fn admin(&self, company_id: Uuid, caller_id: &str) -> Result<Company, AppError> {
        self.gate.authorize(company_id, caller_id, Access::Admin).await
    }

    // Cliente apagado no processador equivale a cliente inexistente
    async fn live_customer(&self, company: &Company) -> Result<Customer, AppError> {
        let customer = self.payments.get_customer(&company.stripe_customer_id).await?;
        if customer.deleted {
            return Err(AppError::NotFound(format!("customer {}", customer.id)));
        }
        Ok(customer)
    }

    // ---
    // Conta conectada
    // ---

    /// Cria a conta express, grava o `stripe_id` e devolve o link de onboarding.
    /// Se a empresa já tem conta, só devolve um link novo para ela.
    pub async fn create_account(
        &self,
        company_id: Uuid,
        return_url: &str,
        caller_id: &str,
    ) -> Result<String, AppError> {
        let company = self.admin(company_id, caller_id).await?;

        if company.name.trim().is_empty() {
            return Err(AppError::MissingFields("name".into()));
        }
        if return_url.trim().is_empty() {
            return Err(AppError::MissingFields("returnUrl".into()));
        }

        if let Some(account_id) = company.stripe_id.as_deref() {
            tracing::info!(company_id = %company_id, account_id = %account_id, "Conta conectada já existe");
            let link = self
                .payments
                .create_account_link(account_id, return_url, return_url)
                .await?;
            return Ok(link.url);
        }

        let email = self
            .identity
            .get_user(caller_id)
            .await?
            .and_then(|user| user.primary_email().map(str::to_string))
            .unwrap_or_default();

        let account = self
            .payments
            .create_account(&NewAccount {
                business_name: company.name.clone(),
                email,
                company_id: company_id.to_string(),
            })
            .await?;

        if let Err(e) = self.store.set_stripe_account(company_id, &account.id).await {
            if let Err(cleanup) = self.payments.delete_account(&account.id).await {
                tracing::error!(
                    company_id = %company_id,
                    account_id = %account.id,
                    "Falha ao remover conta órfã: {}",
                    cleanup
                );
            }
            return Err(e);
        }

        tracing::info!(
            company_id = %company_id,
            caller_id = %caller_id,
            account_id = %account.id,
            "Conta conectada criada"
        );

        let link = self
            .payments
            .create_account_link(&account.id, return_url, return_url)
            .await?;
        Ok(link.url)
    }

    pub async fn update_link(
        &self,
        company_id: Uuid,
        redirect_url: &str,
        caller_id: &str,
    ) -> Result<String, AppError> {
        let company = self.admin(company_id, caller_id).await?;
        let account_id = company
            .stripe_id
            .as_deref()
            .ok_or_else(|| AppError::unauthorized("company has no connected account"))?;

        let link = self
            .payments
            .create_account_link(account_id, redirect_url, redirect_url)
            .await?;
        Ok(link.url)
    }

    pub async fn dashboard_link(&self, company_id: Uuid, caller_id: &str) -> Result<String, AppError> {
        let company = self.admin(company_id, caller_id).await?;
        let account_id = company
            .stripe_id
            .as_deref()
            .ok_or_else(|| AppError::unauthorized("company has no connected account"))?;

        Ok(self.payments.create_login_link(account_id).await?.url)
    }

    /// `None` enquanto a empresa não tem conta conectada.
    pub async fn account(&self, company_id: Uuid, caller_id: &str) -> Result<Option<Account>, AppError> {
        let company = self.admin(company_id, caller_id).await?;
        match company.stripe_id.as_deref() {
            Some(account_id) => Ok(Some(self.payments.get_account(account_id).await?)),
            None => Ok(None),
        }
    }

    pub async fn status(&self, company_id: Uuid, caller_id: &str) -> Result<BillingStatus, AppError> {
        let company = self.admin(company_id, caller_id).await?;

        let account = match company.stripe_id.as_deref() {
            Some(account_id) => Some(self.payments.get_account(account_id).await?),
            None => None,
        };
        let customer = self.payments.get_customer(&company.stripe_customer_id).await?;
        let subscriptions = if customer.deleted {
            Vec::new()
        } else {
            self.payments
                .list_subscriptions(&SubscriptionQuery::current(&customer.id))
                .await?
        };

        Ok(BillingStatus::derive(account.as_ref(), &customer, &subscriptions))
    }

    // ---
    // Método de pagamento
    // ---

    pub async fn payment_method(
        &self,
        company_id: Uuid,
        caller_id: &str,
    ) -> Result<Option<PaymentMethod>, AppError> {
        let company = self.admin(company_id, caller_id).await?;

        let customer = self.payments.get_customer(&company.stripe_customer_id).await?;
        if customer.deleted {
            return Ok(None);
        }
        match customer.default_payment_method() {
            Some(method_id) => Ok(Some(
                self.payments
                    .get_customer_payment_method(&customer.id, method_id)
                    .await?,
            )),
            None => Ok(None),
        }
    }

    /// Depois disto, o único método do cliente é `payment_method_id`.
    pub async fn attach_payment_method(
        &self,
        company_id: Uuid,
        payment_method_id: &str,
        caller_id: &str,
    ) -> Result<(), AppError> {
        let company = self.admin(company_id, caller_id).await?;
        if payment_method_id.trim().is_empty() {
            return Err(AppError::MissingFields("paymentMethodId".into()));
        }
        let customer_id = company.stripe_customer_id.as_str();

        let previous = self.payments.list_payment_methods(customer_id).await?;

        self.payments
            .create_setup_intent(customer_id, payment_method_id)
            .await?;

        let subscriptions = self
            .payments
            .list_subscriptions(&SubscriptionQuery::current(customer_id))
            .await?;
        for subscription in &subscriptions {
            self.payments
                .set_subscription_payment_method(&subscription.id, payment_method_id)
                .await?;
        }

        self.payments
            .set_default_payment_method(customer_id, payment_method_id)
            .await?;

        for method in previous.iter().filter(|m| m.id != payment_method_id) {
            self.payments.detach_payment_method(&method.id).await?;
        }

        tracing::info!(company_id = %company_id, caller_id = %caller_id, "Método de pagamento trocado");
        Ok(())
    }

    /// Cancela as assinaturas (faturando agora) e desanexa o método padrão.
    pub async fn remove_payment_method(&self, company_id: Uuid, caller_id: &str) -> Result<(), AppError> {
        let company = self.admin(company_id, caller_id).await?;
        let customer_id = company.stripe_customer_id.as_str();

        let subscriptions = self
            .payments
            .list_subscriptions(&SubscriptionQuery::current(customer_id))
            .await?;
        for subscription in &subscriptions {
            self.payments
                .cancel_subscription(
                    &subscription.id,
                    CancelOptions {
                        invoice_now: true,
                        prorate: false,
                    },
                )
                .await?;

            let drafts = self.payments.list_invoices(&subscription.id, "draft").await?;
            for invoice in &drafts {
                self.payments.finalize_invoice(&invoice.id).await?;
            }
        }

        let customer = self.payments.get_customer(customer_id).await?;
        if customer.deleted {
            return Ok(());
        }
        if let Some(method_id) = customer.default_payment_method() {
            self.payments.detach_payment_method(method_id).await?;
        }

        tracing::info!(
            company_id = %company_id,
            caller_id = %caller_id,
            "Método de pagamento removido; {} assinatura(s) cancelada(s)",
            subscriptions.len()
        );
        Ok(())
    }

    // ---
    // Assinaturas
    // ---

    pub async fn list_subscriptions(
        &self,
        company_id: Uuid,
        caller_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let company = self.admin(company_id, caller_id).await?;
        self.payments
            .list_subscriptions(&SubscriptionQuery::current(&company.stripe_customer_id))
            .await
    }

    pub async fn had_trial(&self, company_id: Uuid, caller_id: &str) -> Result<bool, AppError> {
        let company = self.admin(company_id, caller_id).await?;
        self.customer_had_trial(&company.stripe_customer_id).await
    }

    async fn customer_had_trial(&self, customer_id: &str) -> Result<bool, AppError> {
        let history = self
            .payments
            .list_subscriptions(&SubscriptionQuery::history(customer_id))
            .await?;
        Ok(history.iter().any(|s| s.trial_start.is_some()))
    }

    /// Uma única assinatura por cliente; preços novos viram itens dela.
    pub async fn start_subscription(
        &self,
        company_id: Uuid,
        price_id: &str,
        subscription_type: Option<SubscriptionType>,
        caller_id: &str,
    ) -> Result<(), AppError> {
        let company = self.admin(company_id, caller_id).await?;
        if price_id.trim().is_empty() {
            return Err(AppError::MissingFields("priceId".into()));
        }

        let customer = self.live_customer(&company).await?;
        let has_payment_method = customer.default_payment_method().is_some();

        let current = self
            .payments
            .list_subscriptions(&SubscriptionQuery::current(&customer.id))
            .await?;

        match current.first() {
            None => {
                let trial_eligible =
                    self.trial.enabled && !self.customer_had_trial(&customer.id).await?;
                if !has_payment_method && !trial_eligible {
                    return Err(AppError::MissingFields("paymentMethod".into()));
                }

                let subscription = self
                    .payments
                    .create_subscription(&NewSubscription {
                        customer: customer.id.clone(),
                        price_id: price_id.to_string(),
                        trial_period_days: trial_eligible.then_some(self.trial.days),
                        billing_cycle_anchor: next_billing_anchor(Utc::now())?,
                        subscription_type,
                    })
                    .await?;

                tracing::info!(
                    company_id = %company_id,
                    caller_id = %caller_id,
                    subscription_id = %subscription.id,
                    trial = trial_eligible,
                    "Assinatura criada"
                );
            }
            Some(subscription) => {
                if !has_payment_method {
                    return Err(AppError::MissingFields("paymentMethod".into()));
                }
                if subscription.has_price(price_id) {
                    tracing::debug!(company_id = %company_id, "Preço já assinado: {}", price_id);
                    return Ok(());
                }

                self.payments
                    .add_subscription_item(&subscription.id, price_id)
                    .await?;
                tracing::info!(
                    company_id = %company_id,
                    caller_id = %caller_id,
                    subscription_id = %subscription.id,
                    "Item adicionado à assinatura"
                );
            }
        }

        Ok(())
    }

    /// Item único: cancela a assinatura. Vários itens: remove só o do preço.
    pub async fn stop_subscription(
        &self,
        company_id: Uuid,
        price_id: &str,
        caller_id: &str,
    ) -> Result<(), AppError> {
        let company = self.admin(company_id, caller_id).await?;
        if price_id.trim().is_empty() {
            return Err(AppError::MissingFields("priceId".into()));
        }

        let customer = self.live_customer(&company).await?;
        let subscriptions = self
            .payments
            .list_subscriptions(&SubscriptionQuery::with_price(&customer.id, price_id))
            .await?;

        for subscription in subscriptions.iter().filter(|s| s.has_price(price_id)) {
            if subscription.items.data.len() <= 1 {
                self.payments
                    .cancel_subscription(
                        &subscription.id,
                        CancelOptions {
                            invoice_now: true,
                            prorate: true,
                        },
                    )
                    .await?;
            } else {
                for item in subscription
                    .items
                    .data
                    .iter()
                    .filter(|item| item.price.id == price_id)
                {
                    self.payments.delete_subscription_item(&item.id).await?;
                }
            }
        }

        tracing::info!(company_id = %company_id, caller_id = %caller_id, "Preço {} encerrado", price_id);
        Ok(())
    }

    /// Fatura o período proporcional e cancela no fim do ciclo. Só "app".
    pub async fn pause_subscription(
        &self,
        company_id: Uuid,
        subscription_type: SubscriptionType,
        caller_id: &str,
    ) -> Result<(), AppError> {
        let company = self.admin(company_id, caller_id).await?;
        if subscription_type != SubscriptionType::App {
            return Err(AppError::BlockedAction(format!(
                "{} subscriptions cannot be paused",
                subscription_type.as_str()
            )));
        }

        let subscriptions = self
            .payments
            .list_subscriptions(&SubscriptionQuery::current(&company.stripe_customer_id))
            .await?;
        let subscription = subscriptions
            .iter()
            .find(|s| s.status != SubscriptionStatus::Canceled && s.is_app())
            .ok_or_else(|| AppError::NotFound("app subscription".into()))?;

        self.payments
            .create_invoice(&NewInvoice {
                customer: subscription.customer.clone(),
                subscription: subscription.id.clone(),
                description: PRORATED_INVOICE_DESCRIPTION.to_string(),
            })
            .await?;
        self.payments
            .cancel_subscription_at_period_end(&subscription.id)
            .await?;

        tracing::info!(
            company_id = %company_id,
            caller_id = %caller_id,
            subscription_id = %subscription.id,
            "Assinatura do app pausada"
        );
        Ok(())
    }

    // ---
    // Catálogo (sem empresa)
    // ---

    pub async fn prices(&self) -> Result<Vec<Price>, AppError> {
        self.payments.list_prices().await
    }

    pub async fn products(&self) -> Result<Vec<Product>, AppError> {
        self.payments.list_products().await
    }
}
