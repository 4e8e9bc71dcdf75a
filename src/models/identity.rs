// src/models/identity.rs
//
// Objetos do provedor de identidade (Backend API do Clerk). Os nomes dos
// campos seguem o JSON do provedor.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub id: String,
    pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: String,

    #[serde(default)]
    pub primary_email_address_id: Option<String>,

    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    // Milissegundos desde a época
    #[serde(default)]
    pub last_sign_in_at: Option<i64>,

    #[serde(default)]
    pub public_metadata: serde_json::Map<String, serde_json::Value>,
}

impl IdentityUser {
    pub fn primary_email(&self) -> Option<&str> {
        let primary_id = self.primary_email_address_id.as_deref()?;
        self.email_addresses
            .iter()
            .find(|e| e.id == primary_id)
            .map(|e| e.email_address.as_str())
    }

    /// Todos os e-mails do usuário, normalizados.
    pub fn emails(&self) -> impl Iterator<Item = String> + '_ {
        self.email_addresses
            .iter()
            .map(|e| e.email_address.trim().to_lowercase())
    }

    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.primary_email().unwrap_or_default().to_string()
        } else {
            name
        }
    }

    // Usuários marcados com `validated: false` ainda não aceitaram o convite
    pub fn is_validated(&self) -> bool {
        !matches!(
            self.public_metadata.get("validated"),
            Some(serde_json::Value::Bool(false))
        ) && !matches!(
            self.public_metadata.get("validated"),
            Some(serde_json::Value::String(s)) if s == "false"
        )
    }
}

/// O que a API devolve de um usuário do provedor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[schema(example = "user_2abc")]
    pub id: String,
    pub email: Option<String>,
    // Nome completo, ou o e-mail quando não há nome
    pub name: String,
    pub last_sign_in_at: Option<i64>,
}

impl From<&IdentityUser> for UserProfile {
    fn from(user: &IdentityUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.primary_email().map(str::to_string),
            name: user.display_name(),
            last_sign_in_at: user.last_sign_in_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub email_address: String,
    pub status: String,
}

impl Invitation {
    pub fn is_pending_for(&self, email: &str) -> bool {
        self.status == "pending" && self.email_address.eq_ignore_ascii_case(email)
    }
}
