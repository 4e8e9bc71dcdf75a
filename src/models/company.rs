// src/models/company.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Os dois papéis de um membro da empresa. "Admin" é o papel elevado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Admin,
    User,
}

// O nível de acesso exigido pelo Authorization Gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Admin ou usuário básico
    Member,
    Admin,
}

// Direção da troca de papel: "up" promove, "down" rebaixa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleChange {
    Up,
    Down,
}

impl RoleChange {
    pub fn target_role(self) -> Role {
        match self {
            RoleChange::Up => Role::Admin,
            RoleChange::Down => Role::User,
        }
    }
}

// ---
// Convites pendentes (e-mails), separados por papel
// ---
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invites {
    pub admins: Vec<String>,
    pub basic_users: Vec<String>,
}

impl Invites {
    pub fn for_role(&self, role: Role) -> &[String] {
        match role {
            Role::Admin => &self.admins,
            Role::User => &self.basic_users,
        }
    }
}

// ---
// Company (o "Tenant")
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,

    #[schema(example = "Acme")]
    pub name: String,

    // IDs externos (provedor de identidade)
    pub admins: Vec<String>,
    pub basic_users: Vec<String>,

    pub invites: Invites,

    // Conta conectada no processador de pagamentos (ausente até o onboarding)
    pub stripe_id: Option<String>,

    // Cliente no processador de pagamentos, criado junto com a empresa
    #[schema(example = "cus_Q1w2e3r4")]
    pub stripe_customer_id: String,

    #[schema(value_type = Vec<f64>)]
    pub tip_levels: Vec<Decimal>,

    pub custom_tip: bool,

    // IDs dos dispositivos que pertencem à empresa
    pub devices: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn role_of(&self, user_id: &str) -> Option<Role> {
        if self.admins.iter().any(|id| id == user_id) {
            Some(Role::Admin)
        } else if self.basic_users.iter().any(|id| id == user_id) {
            Some(Role::User)
        } else {
            None
        }
    }

    /// A regra do Authorization Gate, sem o banco.
    pub fn permits(&self, user_id: &str, access: Access) -> bool {
        match (self.role_of(user_id), access) {
            (Some(Role::Admin), _) => true,
            (Some(Role::User), Access::Member) => true,
            _ => false,
        }
    }
}

// Linha "achatada" como vem do Postgres (convites em duas colunas)
#[derive(Debug, FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub name: String,
    pub admins: Vec<String>,
    pub basic_users: Vec<String>,
    pub invite_admins: Vec<String>,
    pub invite_basic_users: Vec<String>,
    pub stripe_id: Option<String>,
    pub stripe_customer_id: String,
    pub tip_levels: Vec<Decimal>,
    pub custom_tip: bool,
    pub devices: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            admins: row.admins,
            basic_users: row.basic_users,
            invites: Invites {
                admins: row.invite_admins,
                basic_users: row.invite_basic_users,
            },
            stripe_id: row.stripe_id,
            stripe_customer_id: row.stripe_customer_id,
            tip_levels: row.tip_levels,
            custom_tip: row.custom_tip,
            devices: row.devices,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// O que o serviço entrega ao repositório para criar uma empresa
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub id: Uuid,
    pub name: String,
    pub creator_id: String,
    pub stripe_customer_id: String,
    pub invites: Invites,
}

/// Campos que o endpoint de configurações pode alterar. Nada além disso.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub tip_levels: Option<Vec<Decimal>>,
    pub custom_tip: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.tip_levels.is_none() && self.custom_tip.is_none()
    }
}

// ---
// Usuários da empresa (para a tela de usuários)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUser {
    pub id: String,
    pub email: String,
    // Milissegundos desde a época; 0 se nunca entrou
    pub last_sign_in_at: i64,
    pub role: Role,
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUsers {
    pub users: Vec<CompanyUser>,
    pub invites: Invites,
}
