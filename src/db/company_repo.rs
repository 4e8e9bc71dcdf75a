// src/db/company_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::company::{Access, Company, CompanyRow, NewCompany, Role, SettingsPatch},
};

// Colunas de uma empresa, com os IDs dos dispositivos agregados.
// Sempre lidas a partir de um alias `c` (tabela ou CTE).
const COMPANY_COLUMNS: &str = r#"
    c.id, c.name, c.admins, c.basic_users, c.invite_admins, c.invite_basic_users,
    c.stripe_id, c.stripe_customer_id, c.tip_levels, c.custom_tip,
    ARRAY(
        SELECT d.id FROM devices d WHERE d.company_id = c.id ORDER BY d.created_at
    ) AS devices,
    c.created_at, c.updated_at
"#;

/// Persistência das empresas. Toda escrita de associação é um único UPDATE,
/// atômico por linha.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn create_company(&self, new: &NewCompany) -> Result<Company, AppError>;

    /// A consulta do Authorization Gate: id E associação, numa só igualdade.
    async fn find_for_member(
        &self,
        company_id: Uuid,
        user_id: &str,
        access: Access,
    ) -> Result<Option<Company>, AppError>;

    async fn find_by_id(&self, company_id: Uuid) -> Result<Option<Company>, AppError>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Company>, AppError>;

    async fn update_settings(
        &self,
        company_id: Uuid,
        patch: &SettingsPatch,
    ) -> Result<Company, AppError>;

    async fn set_stripe_account(
        &self,
        company_id: Uuid,
        stripe_id: &str,
    ) -> Result<Company, AppError>;

    /// Move o usuário para o conjunto de `role` (saindo do outro) e, se
    /// informado, tira o e-mail das duas listas de convite.
    async fn move_member(
        &self,
        company_id: Uuid,
        user_id: &str,
        role: Role,
        accepted_email: Option<&str>,
    ) -> Result<Company, AppError>;

    async fn remove_members(
        &self,
        company_id: Uuid,
        user_ids: &[String],
    ) -> Result<Company, AppError>;

    async fn add_invite(
        &self,
        company_id: Uuid,
        email: &str,
        role: Role,
    ) -> Result<Company, AppError>;
}

#[derive(Clone)]
pub struct PgCompanyStore {
    pool: PgPool,
}

impl PgCompanyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // UPDATE ... RETURNING * dentro de uma CTE, para devolver a empresa completa
    fn updating(set_clause: &str) -> String {
        format!(
            r#"
            WITH c AS (
                UPDATE companies
                SET {set_clause}, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {COMPANY_COLUMNS} FROM c
            "#
        )
    }
}

fn found(row: Option<CompanyRow>, company_id: Uuid) -> Result<Company, AppError> {
    row.map(Company::from)
        .ok_or_else(|| AppError::NotFound(format!("company {}", company_id)))
}

#[async_trait]
impl CompanyStore for PgCompanyStore {
    async fn create_company(&self, new: &NewCompany) -> Result<Company, AppError> {
        let sql = format!(
            r#"
            WITH c AS (
                INSERT INTO companies
                    (id, name, admins, invite_admins, invite_basic_users, stripe_customer_id)
                VALUES ($1, $2, ARRAY[$3::TEXT], $4, $5, $6)
                RETURNING *
            )
            SELECT {COMPANY_COLUMNS} FROM c
            "#
        );

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(new.id)
            .bind(&new.name)
            .bind(&new.creator_id)
            .bind(&new.invites.admins)
            .bind(&new.invites.basic_users)
            .bind(&new.stripe_customer_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn find_for_member(
        &self,
        company_id: Uuid,
        user_id: &str,
        access: Access,
    ) -> Result<Option<Company>, AppError> {
        let sql = format!(
            r#"
            SELECT {COMPANY_COLUMNS}
            FROM companies c
            WHERE c.id = $1
              AND ($2 = ANY(c.admins) OR (NOT $3 AND $2 = ANY(c.basic_users)))
            "#
        );

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(company_id)
            .bind(user_id)
            .bind(access == Access::Admin)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Company::from))
    }

    async fn find_by_id(&self, company_id: Uuid) -> Result<Option<Company>, AppError> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies c WHERE c.id = $1");

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Company::from))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Company>, AppError> {
        let sql = format!(
            r#"
            SELECT {COMPANY_COLUMNS}
            FROM companies c
            WHERE $1 = ANY(c.admins) OR $1 = ANY(c.basic_users)
            ORDER BY c.created_at
            "#
        );

        let rows = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Company::from).collect())
    }

    async fn update_settings(
        &self,
        company_id: Uuid,
        patch: &SettingsPatch,
    ) -> Result<Company, AppError> {
        let sql = Self::updating(
            "tip_levels = COALESCE($2, tip_levels), custom_tip = COALESCE($3, custom_tip)",
        );

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(company_id)
            .bind(patch.tip_levels.as_ref())
            .bind(patch.custom_tip)
            .fetch_optional(&self.pool)
            .await?;

        found(row, company_id)
    }

    async fn set_stripe_account(
        &self,
        company_id: Uuid,
        stripe_id: &str,
    ) -> Result<Company, AppError> {
        let sql = Self::updating("stripe_id = $2");

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(company_id)
            .bind(stripe_id)
            .fetch_optional(&self.pool)
            .await?;

        found(row, company_id)
    }

    async fn move_member(
        &self,
        company_id: Uuid,
        user_id: &str,
        role: Role,
        accepted_email: Option<&str>,
    ) -> Result<Company, AppError> {
        // $3 = vai para admins? A saída de um conjunto e a entrada no outro
        // acontecem no mesmo statement.
        let sql = Self::updating(
            r#"
            admins = CASE
                WHEN $3 THEN
                    CASE WHEN $2 = ANY(admins) THEN admins ELSE array_append(admins, $2) END
                ELSE array_remove(admins, $2)
            END,
            basic_users = CASE
                WHEN $3 THEN array_remove(basic_users, $2)
                ELSE
                    CASE WHEN $2 = ANY(basic_users) THEN basic_users ELSE array_append(basic_users, $2) END
            END,
            invite_admins = array_remove(invite_admins, $4::TEXT),
            invite_basic_users = array_remove(invite_basic_users, $4::TEXT)
            "#,
        );

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(company_id)
            .bind(user_id)
            .bind(role == Role::Admin)
            .bind(accepted_email)
            .fetch_optional(&self.pool)
            .await?;

        found(row, company_id)
    }

    async fn remove_members(
        &self,
        company_id: Uuid,
        user_ids: &[String],
    ) -> Result<Company, AppError> {
        // Mantém a ordem original dos que ficam
        let sql = Self::updating(
            r#"
            admins = ARRAY(
                SELECT a FROM unnest(admins) WITH ORDINALITY AS t(a, i)
                WHERE NOT (a = ANY($2)) ORDER BY i
            ),
            basic_users = ARRAY(
                SELECT b FROM unnest(basic_users) WITH ORDINALITY AS t(b, i)
                WHERE NOT (b = ANY($2)) ORDER BY i
            )
            "#,
        );

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(company_id)
            .bind(user_ids)
            .fetch_optional(&self.pool)
            .await?;

        found(row, company_id)
    }

    async fn add_invite(
        &self,
        company_id: Uuid,
        email: &str,
        role: Role,
    ) -> Result<Company, AppError> {
        let sql = Self::updating(
            r#"
            invite_admins = CASE
                WHEN $3 AND NOT ($2 = ANY(invite_admins)) THEN array_append(invite_admins, $2)
                ELSE invite_admins
            END,
            invite_basic_users = CASE
                WHEN NOT $3 AND NOT ($2 = ANY(invite_basic_users)) THEN array_append(invite_basic_users, $2)
                ELSE invite_basic_users
            END
            "#,
        );

        let row = sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(company_id)
            .bind(email)
            .bind(role == Role::Admin)
            .fetch_optional(&self.pool)
            .await?;

        found(row, company_id)
    }
}
