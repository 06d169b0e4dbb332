use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, AccountStatus, EngineError, Principal, ResultEngine, Role, accounts,
    credentials::{hash_password, validate_password_strength, verify_password},
    util::{normalize_email, normalize_optional_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Check an email/password pair and return the account behind it.
    ///
    /// Unknown emails and wrong passwords are indistinguishable
    /// (`InvalidCredential`). Inactive or unregistered accounts are refused
    /// with `Forbidden`, except super-admins.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<Account> {
        let email = normalize_email(email)
            .map_err(|_| EngineError::InvalidCredential("invalid email or password".to_string()))?;
        let model = with_tx!(self, |db_tx| {
            accounts::Entity::find()
                .filter(accounts::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await
                .map_err(EngineError::from)
        })?;

        let Some(model) = model else {
            tracing::debug!("login refused: unknown email");
            return Err(EngineError::InvalidCredential(
                "invalid email or password".to_string(),
            ));
        };
        if !verify_password(password, &model.password_hash)? {
            tracing::debug!("login refused: wrong password for {}", model.id);
            return Err(EngineError::InvalidCredential(
                "invalid email or password".to_string(),
            ));
        }

        let account = Account::try_from(model)?;
        if account.role != Role::SuperAdmin {
            if account.status != AccountStatus::Active {
                return Err(EngineError::Forbidden("account is inactive".to_string()));
            }
            if !account.is_registered {
                return Err(EngineError::Forbidden(
                    "account registration is not complete".to_string(),
                ));
            }
        }
        Ok(account)
    }

    /// Create a registered, active account directly.
    ///
    /// Used to bootstrap the first super-admin; everyone else joins through an
    /// invite.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
        role: Role,
    ) -> ResultEngine<Account> {
        let email = normalize_email(email)?;
        validate_password_strength(password)?;
        let password_hash = hash_password(password)?;
        let name = normalize_optional_text(name);

        with_tx!(self, |db_tx| {
            let exists = accounts::Entity::find()
                .filter(accounts::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(email));
            }

            let model = accounts::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                email: ActiveValue::Set(email),
                password_hash: ActiveValue::Set(password_hash),
                name: ActiveValue::Set(name),
                role: ActiveValue::Set(role.as_str().to_string()),
                status: ActiveValue::Set(AccountStatus::Active.as_str().to_string()),
                is_registered: ActiveValue::Set(true),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!("created {} account {}", role.as_str(), model.id);
            Account::try_from(model)
        })
    }

    /// Return an account by id.
    ///
    /// Authorization: the account itself or an administrator.
    pub async fn account(&self, principal: &Principal, account_id: Uuid) -> ResultEngine<Account> {
        if !principal.can_act_for(account_id) {
            return Err(EngineError::KeyNotFound("account not exists".to_string()));
        }
        with_tx!(self, |db_tx| {
            let model = accounts::Entity::find_by_id(account_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
            Account::try_from(model)
        })
    }

    /// Activate or deactivate an account.
    ///
    /// Only a super-admin may change another super-admin.
    pub async fn set_account_status(
        &self,
        principal: &Principal,
        account_id: Uuid,
        status: AccountStatus,
    ) -> ResultEngine<Account> {
        self.require_admin(principal)?;
        with_tx!(self, |db_tx| {
            let model = accounts::Entity::find_by_id(account_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
            let role = Role::try_from(model.role.as_str())?;
            if role == Role::SuperAdmin && principal.role != Role::SuperAdmin {
                return Err(EngineError::Forbidden(
                    "only a super admin can change a super admin".to_string(),
                ));
            }

            let mut active: accounts::ActiveModel = model.into();
            active.status = ActiveValue::Set(status.as_str().to_string());
            let updated = active.update(&db_tx).await?;

            tracing::info!(
                "admin {} set account {account_id} {}",
                principal.account_id,
                status.as_str()
            );
            Account::try_from(updated)
        })
    }
}
