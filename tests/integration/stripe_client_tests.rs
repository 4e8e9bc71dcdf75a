//! Cliente HTTP do Stripe contra um servidor wiremock.

use std::time::Duration;

use serde_json::json;
use uuid::Uuid;
use wiremock::{
    matchers::{
        bearer_token, body_string_contains, method, path, query_param, query_param_is_missing,
    },
    Mock, MockServer, ResponseTemplate,
};

use tip_driver::{
    common::error::AppError,
    models::billing::{
        CancelOptions, NewAccount, NewSubscription, SubscriptionQuery, SubscriptionStatus,
        SubscriptionType,
    },
    services::{PaymentProcessor, StripeClient},
};

const SECRET: &str = "sk_test_tipdriver";

async fn client(server: &MockServer) -> StripeClient {
    StripeClient::new(&server.uri(), SECRET, Duration::from_secs(5)).unwrap()
}

fn subscription_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "object": "subscription",
        "customer": "cus_1",
        "status": status,
        "metadata": { "type": "app" },
        "trial_start": null,
        "cancel_at_period_end": false,
        "items": {
            "object": "list",
            "data": [{ "id": "si_1", "price": { "id": "price_app", "active": true } }],
            "has_more": false
        }
    })
}

#[tokio::test]
async fn create_customer_sends_a_form_with_the_company_metadata() {
    let server = MockServer::start().await;
    let company_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/customers"))
        .and(bearer_token(SECRET))
        .and(body_string_contains("name=Acme"))
        .and(body_string_contains(format!("metadata%5Btip_driver_id%5D={}", company_id)))
        .and(body_string_contains("email=owner%40acme.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_123",
            "object": "customer",
            "email": "owner@acme.com",
            "name": "Acme",
            "invoice_settings": { "default_payment_method": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let customer = client(&server)
        .await
        .create_customer(Some("owner@acme.com"), "Acme", company_id)
        .await
        .unwrap();

    assert_eq!(customer.id, "cus_123");
    assert!(!customer.deleted);
    assert_eq!(customer.default_payment_method(), None);
}

#[tokio::test]
async fn deleted_customer_is_flagged() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customers/cus_gone"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "cus_gone", "object": "customer", "deleted": true })),
        )
        .mount(&server)
        .await;

    let customer = client(&server).await.get_customer("cus_gone").await.unwrap();

    assert!(customer.deleted);
}

#[tokio::test]
async fn api_errors_become_external_service_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customers/cus_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "message": "No such customer: 'cus_missing'"
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server).await.get_customer("cus_missing").await.unwrap_err();

    match err {
        AppError::ExternalService { service, message } => {
            assert_eq!(service, "stripe");
            assert!(message.contains("invalid_request_error"));
            assert!(message.contains("No such customer"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn trial_subscription_carries_trial_and_type_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/subscriptions"))
        .and(body_string_contains("customer=cus_1"))
        .and(body_string_contains("items%5B0%5D%5Bprice%5D=price_app"))
        .and(body_string_contains("billing_cycle_anchor=1717200000"))
        .and(body_string_contains("trial_period_days=14"))
        .and(body_string_contains(
            "trial_settings%5Bend_behavior%5D%5Bmissing_payment_method%5D=cancel",
        ))
        .and(body_string_contains("metadata%5Btype%5D=app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscription_json("sub_1", "trialing")))
        .expect(1)
        .mount(&server)
        .await;

    let subscription = client(&server)
        .await
        .create_subscription(&NewSubscription {
            customer: "cus_1".into(),
            price_id: "price_app".into(),
            trial_period_days: Some(14),
            billing_cycle_anchor: 1_717_200_000,
            subscription_type: Some(SubscriptionType::App),
        })
        .await
        .unwrap();

    assert_eq!(subscription.status, SubscriptionStatus::Trialing);
    assert!(subscription.is_app());
    assert!(subscription.has_price("price_app"));
}

#[tokio::test]
async fn history_listing_asks_for_every_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .and(query_param("customer", "cus_1"))
        .and(query_param("status", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [subscription_json("sub_1", "canceled"), subscription_json("sub_2", "some_new_status")],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let subscriptions = client(&server)
        .await
        .list_subscriptions(&SubscriptionQuery::history("cus_1"))
        .await
        .unwrap();

    assert_eq!(subscriptions.len(), 2);
    assert_eq!(subscriptions[0].status, SubscriptionStatus::Canceled);
    // Status desconhecidos não quebram a desserialização
    assert_eq!(subscriptions[1].status, SubscriptionStatus::Unknown);
}

#[tokio::test]
async fn cancel_sends_invoice_options_in_the_query() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/subscriptions/sub_1"))
        .and(query_param("invoice_now", "true"))
        .and(query_param("prorate", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscription_json("sub_1", "canceled")))
        .expect(1)
        .mount(&server)
        .await;

    let canceled = client(&server)
        .await
        .cancel_subscription(
            "sub_1",
            CancelOptions {
                invoice_now: true,
                prorate: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(canceled.status, SubscriptionStatus::Canceled);
}

#[tokio::test]
async fn removing_an_item_invoices_the_proration() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/subscription_items/si_2"))
        .and(query_param("proration_behavior", "always_invoice"))
        .and(query_param("clear_usage", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "si_2",
            "object": "subscription_item",
            "deleted": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .await
        .delete_subscription_item("si_2")
        .await
        .unwrap();
}

#[tokio::test]
async fn products_expand_their_default_price() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("active", "true"))
        .and(query_param("expand[]", "data.default_price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{
                "id": "prod_app",
                "name": "Tip Driver App",
                "active": true,
                "default_price": { "id": "price_app", "active": true, "currency": "usd", "unit_amount": 1500 }
            }],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let products = client(&server).await.list_products().await.unwrap();

    assert_eq!(products.len(), 1);
    let price = products[0].default_price.as_ref().unwrap();
    assert_eq!(price.id, "price_app");
    assert_eq!(price.unit_amount, Some(1500));
}

#[tokio::test]
async fn express_account_is_created_with_weekly_payouts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accounts"))
        .and(body_string_contains("type=express"))
        .and(body_string_contains("business_profile%5Bname%5D=Acme"))
        .and(body_string_contains("settings%5Bpayouts%5D%5Bschedule%5D%5Binterval%5D=weekly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "acct_1",
            "object": "account",
            "charges_enabled": false,
            "payouts_enabled": false,
            "requirements": { "currently_due": ["external_account", "tos_acceptance.date"] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let account = client(&server)
        .await
        .create_account(&NewAccount {
            business_name: "Acme".into(),
            email: "admin@acme.com".into(),
            company_id: Uuid::new_v4().to_string(),
        })
        .await
        .unwrap();

    assert_eq!(account.id, "acct_1");
    assert_eq!(account.requirements.unwrap().currently_due.len(), 2);
}

fn card_json(id: &str) -> serde_json::Value {
    json!({ "id": id, "object": "payment_method", "type": "card", "customer": "cus_1" })
}

#[tokio::test]
async fn payment_methods_are_read_across_every_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customers/cus_1/payment_methods"))
        .and(query_param("limit", "100"))
        .and(query_param_is_missing("starting_after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [card_json("pm_1"), card_json("pm_2")],
            "has_more": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/customers/cus_1/payment_methods"))
        .and(query_param("limit", "100"))
        .and(query_param("starting_after", "pm_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [card_json("pm_3")],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let methods = client(&server).await.list_payment_methods("cus_1").await.unwrap();

    let ids: Vec<&str> = methods.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["pm_1", "pm_2", "pm_3"]);
}

#[tokio::test]
async fn subscription_listing_follows_the_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .and(query_param("customer", "cus_1"))
        .and(query_param_is_missing("starting_after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [subscription_json("sub_1", "active")],
            "has_more": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .and(query_param("starting_after", "sub_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [subscription_json("sub_2", "trialing")],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let subscriptions = client(&server)
        .await
        .list_subscriptions(&SubscriptionQuery::current("cus_1"))
        .await
        .unwrap();

    assert_eq!(subscriptions.len(), 2);
    assert_eq!(subscriptions[1].status, SubscriptionStatus::Trialing);
}
