// src/services/clerk.rs
//
// Cliente do provedor de identidade (Backend API do Clerk).

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::time::Duration;

use crate::{
    common::error::AppError,
    models::identity::{IdentityUser, Invitation},
};

const SERVICE: &str = "clerk";

/// O que a aplicação precisa do provedor de identidade.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<IdentityUser>, AppError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<IdentityUser>, AppError>;

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<IdentityUser>, AppError>;

    /// Convites pendentes.
    async fn list_invitations(&self) -> Result<Vec<Invitation>, AppError>;

    async fn create_invitation(&self, email: &str) -> Result<Invitation, AppError>;

    async fn revoke_invitation(&self, invitation_id: &str) -> Result<Invitation, AppError>;
}

#[derive(Clone)]
pub struct ClerkClient {
    http: Client,
    base_url: String,
    secret_key: String,
}

impl ClerkClient {
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
}

// Versões novas da API embrulham listas em { data, total_count }
#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Plain(Vec<T>),
    Paginated { data: Vec<T> },
}

impl<T> ListResponse<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Plain(items) => items,
            ListResponse::Paginated { data } => data,
        }
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::external(SERVICE, format!("{}: {}", status, body)));
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn get_user(&self, user_id: &str) -> Result<Option<IdentityUser>, AppError> {
        let response = self
            .http
            .get(self.url(&format!("/users/{}", user_id)))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse(response).await.map(Some)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<IdentityUser>, AppError> {
        let response = self
            .http
            .get(self.url("/users"))
            .bearer_auth(&self.secret_key)
            .query(&[("email_address", email)])
            .send()
            .await?;

        let users: ListResponse<IdentityUser> = parse(response).await?;
        Ok(users.into_vec().into_iter().next())
    }

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<IdentityUser>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: Vec<(&str, &str)> = user_ids.iter().map(|id| ("user_id", id.as_str())).collect();
        query.push(("limit", "500"));

        let response = self
            .http
            .get(self.url("/users"))
            .bearer_auth(&self.secret_key)
            .query(&query)
            .send()
            .await?;

        let users: ListResponse<IdentityUser> = parse(response).await?;
        Ok(users.into_vec())
    }

    async fn list_invitations(&self) -> Result<Vec<Invitation>, AppError> {
        let response = self
            .http
            .get(self.url("/invitations"))
            .bearer_auth(&self.secret_key)
            .query(&[("status", "pending")])
            .send()
            .await?;

        let invitations: ListResponse<Invitation> = parse(response).await?;
        Ok(invitations.into_vec())
    }

    async fn create_invitation(&self, email: &str) -> Result<Invitation, AppError> {
        let response = self
            .http
            .post(self.url("/invitations"))
            .bearer_auth(&self.secret_key)
            .json(&json!({ "email_address": email }))
            .send()
            .await?;

        parse(response).await
    }

    async fn revoke_invitation(&self, invitation_id: &str) -> Result<Invitation, AppError> {
        let response = self
            .http
            .post(self.url(&format!("/invitations/{}/revoke", invitation_id)))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        parse(response).await
    }
}
