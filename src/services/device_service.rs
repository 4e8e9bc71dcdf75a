// src/services/device_service.rs

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{CompanyStore, DeviceStore},
    models::{
        company::Access,
        device::{Device, NewDevice},
    },
    services::authorization::CompanyGate,
};

#[derive(Clone)]
pub struct DeviceService {
    gate: CompanyGate,
    devices: Arc<dyn DeviceStore>,
}

impl DeviceService {
    pub fn new(companies: Arc<dyn CompanyStore>, devices: Arc<dyn DeviceStore>) -> Self {
        Self {
            gate: CompanyGate::new(companies),
            devices,
        }
    }

    /// Só admins registram dispositivos.
    pub async fn create_device(
        &self,
        company_id: Uuid,
        new: &NewDevice,
        caller_id: &str,
    ) -> Result<Device, AppError> {
        self.gate.authorize(company_id, caller_id, Access::Admin).await?;
        new.validate()?;

        let device = self.devices.create_device(company_id, new).await?;
        tracing::info!(
            company_id = %company_id,
            caller_id = %caller_id,
            device = %device.id,
            "Dispositivo registrado"
        );
        Ok(device)
    }

    pub async fn list_devices(&self, company_id: Uuid, caller_id: &str) -> Result<Vec<Device>, AppError> {
        self.gate.authorize(company_id, caller_id, Access::Member).await?;
        self.devices.list_for_company(company_id).await
    }

    pub async fn get_device(
        &self,
        company_id: Uuid,
        device_id: Uuid,
        caller_id: &str,
    ) -> Result<Device, AppError> {
        self.gate.authorize(company_id, caller_id, Access::Member).await?;
        self.devices
            .find_for_company(company_id, device_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("device {}", device_id)))
    }
}
