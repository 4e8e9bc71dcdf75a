// src/models/device.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Deleted,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "active",
            DeviceStatus::Deleted => "deleted",
        }
    }
}

// A coluna é TEXT com CHECK; a conversão acontece aqui.
impl TryFrom<String> for DeviceStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(DeviceStatus::Active),
            "deleted" => Ok(DeviceStatus::Deleted),
            other => Err(format!("Status de dispositivo desconhecido: {}", other)),
        }
    }
}

// ---
// Device (o terminal de gorjetas)
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: Uuid,

    // A empresa dona do dispositivo
    pub company_id: Uuid,

    #[schema(example = "Balcão 1")]
    pub name: String,

    #[schema(example = "A1B2-C3D4")]
    pub device_id: String,

    #[schema(example = "192.168.0.12")]
    pub ip_address: String,

    #[sqlx(try_from = "String")]
    pub status: DeviceStatus,

    // Atualizado pelo próprio dispositivo, fora deste serviço
    pub last_used: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Payload de criação (o status nasce sempre "active")
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    #[validate(length(min = 1, message = "O nome do dispositivo é obrigatório."))]
    pub name: String,

    #[validate(length(min = 1, message = "O identificador do dispositivo é obrigatório."))]
    pub device_id: String,

    #[validate(ip(message = "Endereço IP inválido."))]
    pub ip_address: String,
}
