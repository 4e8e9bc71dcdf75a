// src/services/authorization.rs

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CompanyStore,
    models::company::{Access, Company},
};

/// O Authorization Gate. Nenhuma operação sobre uma empresa muda estado
/// sem passar por aqui antes.
#[derive(Clone)]
pub struct CompanyGate {
    store: Arc<dyn CompanyStore>,
}

impl CompanyGate {
    pub fn new(store: Arc<dyn CompanyStore>) -> Self {
        Self { store }
    }

    /// Resolve a empresa se `caller_id` tem o acesso pedido. Empresa
    /// inexistente e empresa alheia dão o mesmo erro.
    pub async fn authorize(
        &self,
        company_id: Uuid,
        caller_id: &str,
        access: Access,
    ) -> Result<Company, AppError> {
        if company_id.is_nil() || caller_id.trim().is_empty() {
            return Err(AppError::unauthorized("missing company or caller id"));
        }

        self.store
            .find_for_member(company_id, caller_id, access)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(format!(
                    "{} has no {:?} access to company {}",
                    caller_id, access, company_id
                ))
            })
    }
}
