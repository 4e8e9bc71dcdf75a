//! Superfície HTTP: autenticação, gate de acesso, erros e dispositivos.

use axum::{body::Body, http::Request, http::StatusCode};
use rstest::rstest;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use tip_driver::models::{
    billing::{Price, Product},
    company::Company,
    device::Device,
};

use crate::common::{expired_token, price, signed_token, token_for, TestApp, TEST_PUBLIC_KEY};

#[tokio::test]
async fn health_endpoint_is_public() {
    let app = TestApp::new();
    let response = app.get_public("/api/health").await;

    response.assert_ok();
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new();
    let response = app.get_public("/api-docs/openapi.json").await;

    response.assert_ok();
    let doc: Value = response.json();
    assert!(doc["paths"].get("/api/companies").is_some());
    assert!(doc["paths"].get("/api/companies/{company_id}/subscriptions/start").is_some());
}

#[tokio::test]
async fn public_key_does_not_need_a_session() {
    let app = TestApp::new();
    let response = app.get_public("/api/billing/public-key").await;

    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["publicKey"], TEST_PUBLIC_KEY);
}

#[tokio::test]
async fn catalog_is_listed_without_a_session() {
    let app = TestApp::new();
    let mut basic = price("price_basic");
    basic.nickname = Some("Basic".into());
    app.stripe.seed_catalog(
        vec![basic.clone()],
        vec![Product {
            id: "prod_app".into(),
            name: "Tip Driver App".into(),
            description: None,
            active: true,
            default_price: Some(basic),
            metadata: Default::default(),
        }],
    );

    let prices: Vec<Price> = app.get_public("/api/billing/prices").await.assert_ok().json();
    let products: Vec<Product> = app.get_public("/api/billing/products").await.assert_ok().json();

    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0].id, "price_basic");
    assert_eq!(
        products[0].default_price.as_ref().map(|p| p.id.as_str()),
        Some("price_basic")
    );
}

// ---
// Autenticação
// ---

#[tokio::test]
async fn missing_token_is_rejected() {
    let app = TestApp::new();
    let response = app.get_public("/api/companies").await;

    response.assert_unauthorized();
    assert_eq!(response.error_kind(), "AuthError");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = TestApp::new();
    let response = app.get("/api/companies", &expired_token("user_1")).await;

    response.assert_unauthorized();
}

#[tokio::test]
async fn token_signed_with_another_key_is_rejected() {
    let app = TestApp::new();
    let token = signed_token("user_1", chrono::Utc::now().timestamp() + 600, "other-secret");
    let response = app.get("/api/companies", &token).await;

    response.assert_unauthorized();
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = TestApp::new();
    let response = app.get("/api/companies", "not-a-jwt").await;

    response.assert_unauthorized();
    assert_eq!(response.error_kind(), "AuthError");
}

// ---
// Empresas
// ---

#[tokio::test]
async fn creating_a_company_makes_the_caller_its_only_admin() {
    let app = TestApp::new();
    let token = app.user("user_owner", "owner@acme.com");

    let response = app
        .post_json(
            "/api/companies",
            &token,
            json!({ "name": "Acme", "admins": [], "basicUsers": [] }),
        )
        .await;

    response.assert_created();
    let company: Company = response.json();
    assert_eq!(company.name, "Acme");
    assert_eq!(company.admins, vec!["user_owner".to_string()]);
    assert!(company.basic_users.is_empty());
    assert!(company.stripe_id.is_none());
    assert_eq!(
        company.tip_levels,
        vec![Decimal::from(2), Decimal::from(5), Decimal::from(10)]
    );
    assert!(!company.custom_tip);

    // O cliente no processador existe e está vinculado
    let customer = app.stripe.customer(&company.stripe_customer_id);
    assert!(!customer.deleted);
    assert_eq!(customer.email.as_deref(), Some("owner@acme.com"));
}

#[rstest]
#[case::missing_name(json!({ "admins": [], "basicUsers": [] }))]
#[case::blank_name(json!({ "name": "   ", "admins": [], "basicUsers": [] }))]
#[case::missing_admins(json!({ "name": "Acme", "basicUsers": [] }))]
#[case::missing_basic_users(json!({ "name": "Acme", "admins": [] }))]
#[case::admins_not_a_list(json!({ "name": "Acme", "admins": "a@x.com", "basicUsers": [] }))]
#[tokio::test]
async fn incomplete_company_payload_is_missing_fields(#[case] body: Value) {
    let app = TestApp::new();
    let token = app.user("user_owner", "owner@acme.com");

    let response = app.post_json("/api/companies", &token, body).await;

    response.assert_bad_request();
    assert_eq!(response.error_kind(), "MissingFields");
    assert_eq!(app.companies.count(), 0);
    assert_eq!(app.stripe.customer_count(), 0);
}

#[tokio::test]
async fn unknown_creator_cannot_create_a_company() {
    let app = TestApp::new();
    // Token válido, mas o provedor de identidade não conhece o usuário
    let token = token_for("user_ghost");

    let response = app
        .post_json("/api/companies", &token, json!({ "name": "Acme", "admins": [], "basicUsers": [] }))
        .await;

    response.assert_forbidden();
    assert_eq!(app.stripe.customer_count(), 0);
}

#[tokio::test]
async fn list_returns_only_the_callers_companies() {
    let app = TestApp::new();
    app.seed_company("Mine", &["user_a"], &[]);
    app.seed_company("Shared", &["user_b"], &["user_a"]);
    app.seed_company("Theirs", &["user_b"], &[]);

    let companies: Vec<Company> = app
        .get("/api/companies", &token_for("user_a"))
        .await
        .assert_ok()
        .json();

    let mut names: Vec<String> = companies.into_iter().map(|c| c.name).collect();
    names.sort();
    assert_eq!(names, vec!["Mine".to_string(), "Shared".to_string()]);
}

#[rstest]
#[case::admin("user_admin", StatusCode::OK)]
#[case::member("user_member", StatusCode::OK)]
#[case::outsider("user_outsider", StatusCode::FORBIDDEN)]
#[tokio::test]
async fn reading_a_company_requires_membership(#[case] caller: &str, #[case] expected: StatusCode) {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &["user_member"]);

    let response = app
        .get(&format!("/api/companies/{}", company.id), &token_for(caller))
        .await;

    response.assert_status(expected);
}

#[tokio::test]
async fn nil_company_id_is_unauthorized() {
    let app = TestApp::new();
    app.seed_company("Acme", &["user_admin"], &[]);

    let response = app
        .get(&format!("/api/companies/{}", Uuid::nil()), &token_for("user_admin"))
        .await;

    response.assert_forbidden();
    assert_eq!(response.error_kind(), "AuthError");
}

#[tokio::test]
async fn errors_follow_accept_language() {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &[]);

    let response = app
        .request(
            Request::builder()
                .method("GET")
                .uri(format!("/api/companies/{}", company.id))
                .header("Authorization", format!("Bearer {}", token_for("user_outsider")))
                .header("Accept-Language", "pt-BR,pt;q=0.9,en;q=0.8")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    response.assert_forbidden();
    let body: Value = response.json();
    assert_eq!(body["error"], "Usuário não autorizado");
    assert_eq!(body["kind"], "AuthError");
}

#[tokio::test]
async fn unsupported_language_falls_back_to_english() {
    let app = TestApp::new();
    let token = app.user("user_owner", "owner@acme.com");

    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/companies")
                .header("Authorization", format!("Bearer {}", token))
                .header("Content-Type", "application/json")
                .header("Accept-Language", "de-DE")
                .body(Body::from(json!({ "admins": [], "basicUsers": [] }).to_string()))
                .unwrap(),
        )
        .await;

    response.assert_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn provider_messages_never_reach_the_client() {
    let app = TestApp::new();
    // Empresa cujo cliente não existe no processador
    let company = app.companies.seed("Orphan", &["user_admin"], &[]);

    let response = app
        .get(
            &format!("/api/companies/{}/billing/status", company.id),
            &token_for("user_admin"),
        )
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(response.error_kind(), "ExternalServiceError");
    assert!(!response.text().contains("No such object"));
    assert!(!response.text().contains(&company.stripe_customer_id));
}

// ---
// Configurações
// ---

#[tokio::test]
async fn admin_updates_tip_settings() {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &[]);

    let response = app
        .put_json(
            &format!("/api/companies/{}/settings", company.id),
            &token_for("user_admin"),
            json!({
                "company": { "tipLevels": [3, 6, 12], "customTip": true, "name": "Renamed" },
                "fields": ["tipLevels", "customTip", "name"]
            }),
        )
        .await;

    response.assert_ok();
    let updated: Company = response.json();
    assert_eq!(
        updated.tip_levels,
        vec![Decimal::from(3), Decimal::from(6), Decimal::from(12)]
    );
    assert!(updated.custom_tip);
    // Campos fora da lista permitida são ignorados
    assert_eq!(updated.name, "Acme");
}

#[tokio::test]
async fn member_cannot_update_settings() {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &["user_member"]);

    let response = app
        .put_json(
            &format!("/api/companies/{}/settings", company.id),
            &token_for("user_member"),
            json!({ "company": { "customTip": true }, "fields": ["customTip"] }),
        )
        .await;

    response.assert_forbidden();
    assert!(!app.companies.get(company.id).custom_tip);
}

#[rstest]
#[case::negative_level(json!({ "tipLevels": [5, -1] }), "tipLevels")]
#[case::level_not_a_number(json!({ "tipLevels": ["five"] }), "tipLevels")]
#[case::custom_tip_not_bool(json!({ "customTip": "yes" }), "customTip")]
#[case::listed_but_absent(json!({}), "customTip")]
#[tokio::test]
async fn invalid_settings_are_rejected(#[case] partial: Value, #[case] field: &str) {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &[]);

    let response = app
        .put_json(
            &format!("/api/companies/{}/settings", company.id),
            &token_for("user_admin"),
            json!({ "company": partial, "fields": [field] }),
        )
        .await;

    response.assert_bad_request();
    assert_eq!(response.error_kind(), "MissingFields");
    assert_eq!(app.companies.get(company.id).tip_levels.len(), 3);
}

// ---
// Dispositivos
// ---

fn device_body(name: &str, ip: &str) -> Value {
    json!({ "name": name, "deviceId": "A1B2-C3D4", "ipAddress": ip })
}

#[tokio::test]
async fn admin_registers_and_members_read_devices() {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &["user_member"]);
    let base = format!("/api/companies/{}/devices", company.id);

    let created: Device = app
        .post_json(&base, &token_for("user_admin"), device_body("Balcão 1", "192.168.0.12"))
        .await
        .assert_created()
        .json();
    assert_eq!(created.company_id, company.id);
    assert_eq!(created.status.as_str(), "active");

    let listed: Vec<Device> = app.get(&base, &token_for("user_member")).await.assert_ok().json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);

    let fetched: Device = app
        .get(&format!("{}/{}", base, created.id), &token_for("user_member"))
        .await
        .assert_ok()
        .json();
    assert_eq!(fetched.name, "Balcão 1");

    // A empresa passa a listar o dispositivo
    assert_eq!(app.companies.get(company.id).devices, vec![created.id]);
}

#[tokio::test]
async fn member_cannot_register_a_device() {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &["user_member"]);

    let response = app
        .post_json(
            &format!("/api/companies/{}/devices", company.id),
            &token_for("user_member"),
            device_body("Balcão 1", "192.168.0.12"),
        )
        .await;

    response.assert_forbidden();
    assert!(app.companies.get(company.id).devices.is_empty());
}

#[rstest]
#[case::blank_name(device_body("", "10.0.0.1"))]
#[case::bad_ip(device_body("Balcão 1", "not-an-ip"))]
#[tokio::test]
async fn invalid_device_is_rejected(#[case] body: Value) {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &[]);

    let response = app
        .post_json(
            &format!("/api/companies/{}/devices", company.id),
            &token_for("user_admin"),
            body,
        )
        .await;

    response.assert_bad_request();
    assert_eq!(response.error_kind(), "MissingFields");
}

#[tokio::test]
async fn device_of_another_company_is_not_found() {
    let app = TestApp::new();
    let acme = app.seed_company("Acme", &["user_admin"], &[]);
    let other = app.seed_company("Other", &["user_admin"], &[]);

    let created: Device = app
        .post_json(
            &format!("/api/companies/{}/devices", other.id),
            &token_for("user_admin"),
            device_body("Balcão 9", "10.0.0.9"),
        )
        .await
        .assert_created()
        .json();

    let response = app
        .get(
            &format!("/api/companies/{}/devices/{}", acme.id, created.id),
            &token_for("user_admin"),
        )
        .await;

    response.assert_not_found();
    assert_eq!(response.error_kind(), "NotFound");
}

// ---
// Corpos, caminhos e queries malformados
// ---

#[rstest]
#[case::settings("PUT", "settings", json!({ "company": { "customTip": true } }))]
#[case::add_user("POST", "users", json!({ "email": "ana@acme.com" }))]
#[case::add_user_unknown_role("POST", "users", json!({ "email": "ana@acme.com", "role": "Owner" }))]
#[case::remove_users("POST", "users/remove", json!({ "userIds": "user_b" }))]
#[case::device("POST", "devices", json!({ "name": "Balcão 1" }))]
#[case::connected_account("POST", "billing/account", json!({}))]
#[case::payment_method("POST", "billing/payment-method", json!({ "paymentMethodId": 42 }))]
#[case::start("POST", "subscriptions/start", json!({}))]
#[case::stop("POST", "subscriptions/stop", json!({ "price": "price_app" }))]
#[case::pause("POST", "subscriptions/pause", json!({ "subscriptionType": "gold" }))]
#[tokio::test]
async fn unreadable_bodies_are_missing_fields(
    #[case] method: &str,
    #[case] route: &str,
    #[case] body: Value,
) {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &[]);

    let response = app
        .request(
            Request::builder()
                .method(method)
                .uri(format!("/api/companies/{}/{}", company.id, route))
                .header("Authorization", format!("Bearer {}", token_for("user_admin")))
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await;

    response.assert_bad_request();
    let error: Value = response.json();
    assert_eq!(error["kind"], "MissingFields");
    assert_eq!(error["details"]["fields"], "body");
    // Nada do texto interno do serde chega ao cliente
    assert!(!response.text().contains("deserialize"));
    assert!(app.stripe.calls().is_empty());
}

#[tokio::test]
async fn body_that_is_not_json_is_missing_fields() {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &[]);

    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri(format!("/api/companies/{}/devices", company.id))
                .header("Authorization", format!("Bearer {}", token_for("user_admin")))
                .header("Content-Type", "application/json")
                .body(Body::from("{ name: Balcão"))
                .unwrap(),
        )
        .await;

    response.assert_bad_request();
    assert_eq!(response.error_kind(), "MissingFields");
    assert!(app.companies.get(company.id).devices.is_empty());
}

#[rstest]
#[case::company("/api/companies/not-a-uuid")]
#[case::company_users("/api/companies/not-a-uuid/users")]
#[case::subscriptions("/api/companies/not-a-uuid/subscriptions")]
#[tokio::test]
async fn malformed_company_id_is_missing_fields(#[case] uri: &str) {
    let app = TestApp::new();

    let response = app.get(uri, &token_for("user_admin")).await;

    response.assert_bad_request();
    let error: Value = response.json();
    assert_eq!(error["kind"], "MissingFields");
    assert_eq!(error["details"]["fields"], "path");
}

#[tokio::test]
async fn malformed_device_id_is_missing_fields() {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &[]);

    let response = app
        .get(
            &format!("/api/companies/{}/devices/nope", company.id),
            &token_for("user_admin"),
        )
        .await;

    response.assert_bad_request();
    assert_eq!(response.error_kind(), "MissingFields");
}

#[tokio::test]
async fn update_link_without_redirect_is_missing_fields() {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &[]);

    let response = app
        .get(
            &format!("/api/companies/{}/billing/update-link", company.id),
            &token_for("user_admin"),
        )
        .await;

    response.assert_bad_request();
    let error: Value = response.json();
    assert_eq!(error["kind"], "MissingFields");
    assert_eq!(error["details"]["fields"], "query");
}

#[tokio::test]
async fn rejected_body_follows_accept_language() {
    let app = TestApp::new();
    let company = app.seed_company("Acme", &["user_admin"], &[]);

    let pt = app
        .request(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/companies/{}/settings", company.id))
                .header("Authorization", format!("Bearer {}", token_for("user_admin")))
                .header("Content-Type", "application/json")
                .header("Accept-Language", "pt-BR")
                .body(Body::from(json!({ "company": {} }).to_string()))
                .unwrap(),
        )
        .await;
    let en = app
        .put_json(
            &format!("/api/companies/{}/settings", company.id),
            &token_for("user_admin"),
            json!({ "company": {} }),
        )
        .await;

    pt.assert_bad_request();
    en.assert_bad_request();
    let pt_error: Value = pt.json();
    let en_error: Value = en.json();
    assert_eq!(pt_error["kind"], "MissingFields");
    assert_ne!(pt_error["error"], en_error["error"]);
}
