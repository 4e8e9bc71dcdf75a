// src/services/company_service.rs

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CompanyStore,
    models::{
        company::{
            Access, Company, CompanyUser, CompanyUsers, Invites, NewCompany, Role, RoleChange,
            SettingsPatch,
        },
        identity::IdentityUser,
    },
    services::{
        authorization::CompanyGate, clerk::IdentityProvider, stripe::PaymentProcessor,
    },
};

/// Normaliza as duas listas de convite: trim, minúsculas, sem duplicados,
/// sem os e-mails do próprio criador. Um e-mail nas duas listas fica só como admin.
pub fn plan_invites(admins: &[String], basic_users: &[String], creator_emails: &[String]) -> Invites {
    fn normalized<'a>(list: &'a [String]) -> impl Iterator<Item = String> + 'a {
        list.iter()
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
    }

    let creator: Vec<String> = creator_emails.iter().map(|e| e.trim().to_lowercase()).collect();

    let mut invites = Invites::default();
    for email in normalized(admins) {
        if !creator.contains(&email) && !invites.admins.contains(&email) {
            invites.admins.push(email);
        }
    }
    for email in normalized(basic_users) {
        if !creator.contains(&email)
            && !invites.admins.contains(&email)
            && !invites.basic_users.contains(&email)
        {
            invites.basic_users.push(email);
        }
    }
    invites
}

/// Monta o patch de configurações a partir do objeto parcial e da lista de
/// campos. Só `tip_levels` e `custom_tip` passam; o resto é ignorado.
pub fn settings_patch(partial: &Map<String, Value>, fields: &[String]) -> Result<SettingsPatch, AppError> {
    let mut patch = SettingsPatch::default();

    for field in fields {
        match field.as_str() {
            "tip_levels" | "tipLevels" => {
                let value = partial
                    .get("tipLevels")
                    .or_else(|| partial.get("tip_levels"))
                    .ok_or_else(|| AppError::MissingFields("tipLevels".into()))?;

                let levels: Vec<Decimal> = serde_json::from_value(value.clone())
                    .map_err(|_| AppError::MissingFields("tipLevels".into()))?;
                if levels.iter().any(|level| *level <= Decimal::ZERO) {
                    return Err(AppError::MissingFields("tipLevels".into()));
                }
                patch.tip_levels = Some(levels);
            }
            "custom_tip" | "customTip" => {
                let value = partial
                    .get("customTip")
                    .or_else(|| partial.get("custom_tip"))
                    .and_then(Value::as_bool)
                    .ok_or_else(|| AppError::MissingFields("customTip".into()))?;
                patch.custom_tip = Some(value);
            }
            _ => {}
        }
    }

    Ok(patch)
}

#[derive(Clone)]
pub struct CompanyService {
    gate: CompanyGate,
    store: Arc<dyn CompanyStore>,
    identity: Arc<dyn IdentityProvider>,
    payments: Arc<dyn PaymentProcessor>,
}

impl CompanyService {
    pub fn new(
        store: Arc<dyn CompanyStore>,
        identity: Arc<dyn IdentityProvider>,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            gate: CompanyGate::new(store.clone()),
            store,
            identity,
            payments,
        }
    }

    /// Cria a empresa com o criador como único admin, o cliente no
    /// processador de pagamentos e os convites iniciais.
    pub async fn create_company(
        &self,
        name: &str,
        admin_emails: &[String],
        basic_emails: &[String],
        creator_id: &str,
    ) -> Result<Company, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::MissingFields("name".into()));
        }
        if creator_id.trim().is_empty() {
            return Err(AppError::unauthorized("missing caller id"));
        }

        let creator = self
            .identity
            .get_user(creator_id)
            .await?
            .ok_or_else(|| AppError::unauthorized(format!("unknown user {}", creator_id)))?;
        let creator_emails: Vec<String> = creator.emails().collect();
        let invites = plan_invites(admin_emails, basic_emails, &creator_emails);

        let company_id = Uuid::new_v4();
        let customer = self
            .payments
            .create_customer(creator.primary_email(), name, company_id)
            .await?;

        let new_company = NewCompany {
            id: company_id,
            name: name.to_string(),
            creator_id: creator_id.to_string(),
            stripe_customer_id: customer.id.clone(),
            invites: invites.clone(),
        };

        if let Err(e) = self.store.create_company(&new_company).await {
            // Sem a empresa, o cliente fica órfão
            if let Err(cleanup) = self.payments.delete_customer(&customer.id).await {
                tracing::error!(
                    company_id = %company_id,
                    customer_id = %customer.id,
                    "Falha ao remover cliente órfão: {}",
                    cleanup
                );
            }
            return Err(e);
        }

        tracing::info!(company_id = %company_id, caller_id = %creator_id, "Empresa criada");

        for (emails, role) in [(&invites.admins, Role::Admin), (&invites.basic_users, Role::User)] {
            for email in emails {
                if let Err(e) = self.onboard_email(company_id, email, role).await {
                    tracing::warn!(company_id = %company_id, email = %email, "Falha ao convidar: {}", e);
                }
            }
        }

        self.store
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("company {}", company_id)))
    }

    pub async fn list_companies(&self, caller_id: &str) -> Result<Vec<Company>, AppError> {
        if caller_id.trim().is_empty() {
            return Err(AppError::unauthorized("missing caller id"));
        }
        self.store.list_for_user(caller_id).await
    }

    pub async fn get_company(&self, company_id: Uuid, caller_id: &str) -> Result<Company, AppError> {
        self.gate.authorize(company_id, caller_id, Access::Member).await
    }

    pub async fn update_settings(
        &self,
        company_id: Uuid,
        partial: &Map<String, Value>,
        fields: &[String],
        caller_id: &str,
    ) -> Result<Company, AppError> {
        let company = self.gate.authorize(company_id, caller_id, Access::Admin).await?;

        let patch = settings_patch(partial, fields)?;
        if patch.is_empty() {
            return Ok(company);
        }

        let updated = self.store.update_settings(company_id, &patch).await?;
        tracing::info!(company_id = %company_id, caller_id = %caller_id, "Configurações atualizadas");
        Ok(updated)
    }

    pub async fn change_user_role(
        &self,
        company_id: Uuid,
        target_user_id: &str,
        direction: RoleChange,
        caller_id: &str,
    ) -> Result<Company, AppError> {
        self.gate.authorize(company_id, caller_id, Access::Admin).await?;

        if target_user_id == caller_id {
            return Err(AppError::unauthorized("cannot change own role"));
        }
        if target_user_id.trim().is_empty() {
            return Err(AppError::MissingFields("userId".into()));
        }

        let company = self
            .store
            .move_member(company_id, target_user_id, direction.target_role(), None)
            .await?;

        tracing::info!(
            company_id = %company_id,
            caller_id = %caller_id,
            target = %target_user_id,
            "Papel alterado ({:?})",
            direction
        );
        Ok(company)
    }

    pub async fn remove_users(
        &self,
        company_id: Uuid,
        target_user_ids: &[String],
        caller_id: &str,
    ) -> Result<Company, AppError> {
        let company = self.gate.authorize(company_id, caller_id, Access::Admin).await?;

        let targets: Vec<String> = target_user_ids
            .iter()
            .filter(|id| id.as_str() != caller_id)
            .cloned()
            .collect();
        if targets.is_empty() {
            return Ok(company);
        }

        let company = self.store.remove_members(company_id, &targets).await?;
        tracing::info!(
            company_id = %company_id,
            caller_id = %caller_id,
            "{} usuário(s) removido(s)",
            targets.len()
        );
        Ok(company)
    }

    /// Usuário existente entra direto no papel; senão, recebe um convite.
    pub async fn add_user(
        &self,
        company_id: Uuid,
        email: &str,
        role: Role,
        caller_id: &str,
    ) -> Result<Option<IdentityUser>, AppError> {
        self.gate.authorize(company_id, caller_id, Access::Admin).await?;

        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AppError::MissingFields("email".into()));
        }

        match self.identity.get_user_by_email(&email).await? {
            // Sem troca do próprio papel por este caminho
            Some(user) if user.id == caller_id => Ok(Some(user)),
            Some(user) => {
                self.store
                    .move_member(company_id, &user.id, role, Some(&email))
                    .await?;
                tracing::info!(company_id = %company_id, caller_id = %caller_id, user_id = %user.id, "Usuário adicionado");
                Ok(Some(user))
            }
            None => {
                self.invite(&email).await?;
                self.store.add_invite(company_id, &email, role).await?;
                tracing::info!(company_id = %company_id, caller_id = %caller_id, "Convite enviado");
                Ok(None)
            }
        }
    }

    pub async fn list_users(&self, company_id: Uuid, caller_id: &str) -> Result<CompanyUsers, AppError> {
        let company = self.gate.authorize(company_id, caller_id, Access::Member).await?;

        let member_ids: Vec<String> = company
            .admins
            .iter()
            .chain(company.basic_users.iter())
            .cloned()
            .collect();
        let identities = self.identity.get_users(&member_ids).await?;

        // Na ordem dos conjuntos (admins primeiro)
        let users = member_ids
            .iter()
            .filter_map(|id| identities.iter().find(|u| &u.id == id))
            .filter_map(|user| {
                company.role_of(&user.id).map(|role| CompanyUser {
                    id: user.id.clone(),
                    email: user.primary_email().unwrap_or_default().to_string(),
                    last_sign_in_at: user.last_sign_in_at.unwrap_or(0),
                    role,
                    accepted: user.is_validated(),
                })
            })
            .collect();

        Ok(CompanyUsers {
            users,
            invites: company.invites,
        })
    }

    /// Convites cujo e-mail já virou usuário passam para o conjunto do papel.
    pub async fn sync_invites(&self, company_id: Uuid, caller_id: &str) -> Result<Company, AppError> {
        let company = self.gate.authorize(company_id, caller_id, Access::Admin).await?;

        for role in [Role::Admin, Role::User] {
            for email in company.invites.for_role(role) {
                match self.identity.get_user_by_email(email).await {
                    Ok(Some(user)) => {
                        if let Err(e) = self
                            .store
                            .move_member(company_id, &user.id, role, Some(email))
                            .await
                        {
                            tracing::warn!(company_id = %company_id, email = %email, "Falha ao sincronizar convite: {}", e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(company_id = %company_id, email = %email, "Falha ao sincronizar convite: {}", e);
                    }
                }
            }
        }

        self.store
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("company {}", company_id)))
    }

    // ---
    // Convites
    // ---

    // Usuário existente entra no conjunto do papel; senão, é convidado
    async fn onboard_email(&self, company_id: Uuid, email: &str, role: Role) -> Result<(), AppError> {
        match self.identity.get_user_by_email(email).await? {
            Some(user) => {
                self.store
                    .move_member(company_id, &user.id, role, Some(email))
                    .await?;
            }
            None => self.invite(email).await?,
        }
        Ok(())
    }

    // Revoga convites pendentes do e-mail e emite um novo
    async fn invite(&self, email: &str) -> Result<(), AppError> {
        let invitations = self.identity.list_invitations().await?;
        for invitation in invitations.iter().filter(|i| i.is_pending_for(email)) {
            self.identity.revoke_invitation(&invitation.id).await?;
        }
        self.identity.create_invitation(email).await?;
        Ok(())
    }
}
