// src/db.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::config::Config;

pub mod company_repo;
pub use company_repo::{CompanyStore, PgCompanyStore};
pub mod device_repo;
pub use device_repo::{DeviceStore, PgDeviceStore};

/// Abre a pool de conexões. Quem chama é dono dela e a fecha no shutdown.
pub async fn connect_pool(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(pool)
}
