//! Aplicação de teste
//!
//! Monta o router real sobre os stores em memória e os fakes de Clerk e
//! Stripe. Os tokens de sessão são assinados com HS256 e um segredo fixo.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::de::DeserializeOwned;
use tower::ServiceExt;

use tip_driver::{
    app_router,
    models::company::Company,
    services::{SessionVerifier, TrialConfig},
    AppState,
};

use super::mocks::{FakeIdentity, FakeStripe, MemoryCompanyStore, MemoryDeviceStore};

pub const TEST_SECRET: &str = "tip-driver-test-secret";
pub const TEST_PUBLIC_KEY: &str = "pk_test_tipdriver";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub companies: Arc<MemoryCompanyStore>,
    pub devices: Arc<MemoryDeviceStore>,
    pub identity: Arc<FakeIdentity>,
    pub stripe: Arc<FakeStripe>,
}

impl TestApp {
    /// Período de teste habilitado (14 dias), como no ambiente padrão.
    pub fn new() -> Self {
        Self::with_trial(TrialConfig {
            enabled: true,
            days: 14,
        })
    }

    pub fn with_trial(trial: TrialConfig) -> Self {
        let companies = MemoryCompanyStore::new();
        let devices = MemoryDeviceStore::new(companies.clone());
        let identity = FakeIdentity::new();
        let stripe = FakeStripe::new();

        let state = AppState::from_parts(
            SessionVerifier::from_secret(TEST_SECRET),
            companies.clone(),
            devices.clone(),
            identity.clone(),
            stripe.clone(),
            trial,
            TEST_PUBLIC_KEY.to_string(),
        );
        let router = app_router(state.clone());

        Self {
            router,
            state,
            companies,
            devices,
            identity,
            stripe,
        }
    }

    /// Usuário conhecido pelo provedor de identidade, com um token válido.
    pub fn user(&self, id: &str, email: &str) -> String {
        self.identity.add_user(id, email);
        token_for(id)
    }

    /// Empresa já existente, com o cliente correspondente no processador.
    pub fn seed_company(&self, name: &str, admins: &[&str], basic_users: &[&str]) -> Company {
        let company = self.companies.seed(name, admins, basic_users);
        self.stripe.seed_customer(&company.stripe_customer_id);
        company
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// GET sem cabeçalho de autorização
    pub async fn get_public(&self, uri: &str) -> TestResponse {
        self.request(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, token: &str, body: serde_json::Value) -> TestResponse {
        self.send_json("POST", uri, token, body).await
    }

    pub async fn put_json(&self, uri: &str, token: &str, body: serde_json::Value) -> TestResponse {
        self.send_json("PUT", uri, token, body).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn send_json(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        body: serde_json::Value,
    ) -> TestResponse {
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Authorization", format!("Bearer {}", token))
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body")
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Token HS256 válido por uma hora para `user_id`.
pub fn token_for(user_id: &str) -> String {
    signed_token(user_id, Utc::now().timestamp() + 3600, TEST_SECRET)
}

pub fn expired_token(user_id: &str) -> String {
    signed_token(user_id, Utc::now().timestamp() - 3600, TEST_SECRET)
}

pub fn signed_token(user_id: &str, exp: i64, secret: &str) -> String {
    let claims = serde_json::json!({
        "sub": user_id,
        "exp": exp,
        "iat": Utc::now().timestamp(),
        "sid": "sess_test",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign token")
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("Invalid JSON ({}): {}", e, self.text()))
    }

    /// `kind` do corpo de erro
    pub fn error_kind(&self) -> String {
        self.json::<serde_json::Value>()["kind"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(self.status, expected, "Unexpected status; body: {}", self.text());
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_created(&self) -> &Self {
        self.assert_status(StatusCode::CREATED)
    }

    pub fn assert_no_content(&self) -> &Self {
        self.assert_status(StatusCode::NO_CONTENT)
    }

    pub fn assert_bad_request(&self) -> &Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    pub fn assert_forbidden(&self) -> &Self {
        self.assert_status(StatusCode::FORBIDDEN)
    }

    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }
}
