// src/db/device_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::device::{Device, DeviceStatus, NewDevice},
};

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn create_device(&self, company_id: Uuid, new: &NewDevice) -> Result<Device, AppError>;

    async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<Device>, AppError>;

    /// Só encontra o dispositivo se ele pertencer à empresa informada.
    async fn find_for_company(
        &self,
        company_id: Uuid,
        device_id: Uuid,
    ) -> Result<Option<Device>, AppError>;
}

#[derive(Clone)]
pub struct PgDeviceStore {
    pool: PgPool,
}

impl PgDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceStore for PgDeviceStore {
    async fn create_device(&self, company_id: Uuid, new: &NewDevice) -> Result<Device, AppError> {
        let device = sqlx::query_as::<_, Device>(
            r#"
            INSERT INTO devices (id, company_id, name, device_id, ip_address, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(Uuid::new_v4())
            .bind(company_id)
            .bind(&new.name)
            .bind(&new.device_id)
            .bind(&new.ip_address)
            .bind(DeviceStatus::Active.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(device)
    }

    async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<Device>, AppError> {
        let devices = sqlx::query_as::<_, Device>(
            "SELECT * FROM devices WHERE company_id = $1 ORDER BY created_at",
        )
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(devices)
    }

    async fn find_for_company(
        &self,
        company_id: Uuid,
        device_id: Uuid,
    ) -> Result<Option<Device>, AppError> {
        let device = sqlx::query_as::<_, Device>(
            "SELECT * FROM devices WHERE id = $1 AND company_id = $2",
        )
            .bind(device_id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(device)
    }
}
