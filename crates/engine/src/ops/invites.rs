use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Account, AccountStatus, EngineError, Invite, IssuedInvite, Principal, RegisterCmd,
    ResultEngine, Role, accounts,
    credentials::{
        generate_invite_token, generate_temp_password, hash_password, validate_password_strength,
        verify_password,
    },
    invites::{self, expiry_from},
    util::{normalize_email, normalize_required_text},
};

use super::{Engine, with_tx};

const MIN_NAME_LENGTH: usize = 2;

impl Engine {
    /// Invite someone by email.
    ///
    /// The token and the temporary password are returned in plaintext here
    /// and nowhere else; only the password hash is stored.
    ///
    /// Authorization: administrators only. Super-admins cannot be invited.
    pub async fn issue_invite(
        &self,
        principal: &Principal,
        email: &str,
        role: Role,
    ) -> ResultEngine<IssuedInvite> {
        self.require_admin(principal)?;
        if !role.is_invitable() {
            return Err(EngineError::InvalidArgument(format!(
                "role {} cannot be invited",
                role.as_str()
            )));
        }
        let email = normalize_email(email)?;
        let token = generate_invite_token();
        let temp_password = generate_temp_password();
        let temp_password_hash = hash_password(&temp_password)?;

        let now = Utc::now();
        let expires_at = expiry_from(now);
        with_tx!(self, |db_tx| {
            let unused = invites::Entity::find()
                .filter(invites::Column::Email.eq(email.clone()))
                .filter(invites::Column::Used.eq(false))
                .all(&db_tx)
                .await?;
            for model in unused {
                if Invite::try_from(model)?.is_active(now) {
                    return Err(EngineError::ExistingKey(format!(
                        "an active invite already exists for {email}"
                    )));
                }
            }

            invites::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                email: ActiveValue::Set(email.clone()),
                role: ActiveValue::Set(role.as_str().to_string()),
                token: ActiveValue::Set(token.clone()),
                temp_password_hash: ActiveValue::Set(temp_password_hash),
                used: ActiveValue::Set(false),
                expires_at: ActiveValue::Set(expires_at),
                created_by: ActiveValue::Set(principal.account_id.to_string()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                "admin {} invited {email} as {}",
                principal.account_id,
                role.as_str()
            );
            Ok(IssuedInvite {
                email,
                role,
                token,
                temp_password,
                expires_at,
            })
        })
    }

    /// Every invite, newest first.
    pub async fn invites(&self, principal: &Principal) -> ResultEngine<Vec<Invite>> {
        self.require_admin(principal)?;
        with_tx!(self, |db_tx| {
            let models = invites::Entity::find()
                .order_by_desc(invites::Column::CreatedAt)
                .order_by_desc(invites::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Invite::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Revoke an invite by its token.
    pub async fn delete_invite(&self, principal: &Principal, token: &str) -> ResultEngine<()> {
        self.require_admin(principal)?;
        with_tx!(self, |db_tx| {
            let result = invites::Entity::delete_many()
                .filter(invites::Column::Token.eq(token.trim().to_string()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("invite not exists".to_string()));
            }
            tracing::info!("admin {} revoked an invite", principal.account_id);
            Ok(())
        })
    }

    /// Complete a registration with an invite.
    ///
    /// The account takes the role of the invite and becomes registered and
    /// active; an existing account for the same email is updated in place.
    /// The invite is consumed in the same transaction.
    pub async fn register(&self, cmd: RegisterCmd) -> ResultEngine<Account> {
        let email = normalize_email(&cmd.email)?;
        let token = cmd.token.trim().to_string();
        validate_password_strength(&cmd.new_password)?;
        let name = normalize_required_text(&cmd.name, "name")?;
        if name.chars().count() < MIN_NAME_LENGTH {
            return Err(EngineError::InvalidArgument(format!(
                "name must be at least {MIN_NAME_LENGTH} characters long"
            )));
        }
        let password_hash = hash_password(&cmd.new_password)?;

        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let invite = invites::Entity::find()
                .filter(invites::Column::Email.eq(email.clone()))
                .filter(invites::Column::Token.eq(token.clone()))
                .filter(invites::Column::Used.eq(false))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("invite not exists".to_string()))?;
            if now >= invite.expires_at {
                return Err(EngineError::Expired("invite has expired".to_string()));
            }
            if !verify_password(&cmd.temp_password, &invite.temp_password_hash)? {
                return Err(EngineError::InvalidCredential(
                    "invalid temporary password".to_string(),
                ));
            }
            let invited_role = Role::try_from(invite.role.as_str())?;

            let existing = accounts::Entity::find()
                .filter(accounts::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?;
            let model = match existing {
                Some(model) => {
                    let current = Role::try_from(model.role.as_str())?;
                    let role = if current == Role::SuperAdmin {
                        current
                    } else {
                        invited_role
                    };
                    let mut active: accounts::ActiveModel = model.into();
                    active.password_hash = ActiveValue::Set(password_hash);
                    active.name = ActiveValue::Set(Some(name));
                    active.role = ActiveValue::Set(role.as_str().to_string());
                    active.status = ActiveValue::Set(AccountStatus::Active.as_str().to_string());
                    active.is_registered = ActiveValue::Set(true);
                    active.update(&db_tx).await?
                }
                None => {
                    accounts::ActiveModel {
                        id: ActiveValue::Set(Uuid::new_v4().to_string()),
                        email: ActiveValue::Set(email.clone()),
                        password_hash: ActiveValue::Set(password_hash),
                        name: ActiveValue::Set(Some(name)),
                        role: ActiveValue::Set(invited_role.as_str().to_string()),
                        status: ActiveValue::Set(AccountStatus::Active.as_str().to_string()),
                        is_registered: ActiveValue::Set(true),
                        created_at: ActiveValue::Set(now),
                    }
                    .insert(&db_tx)
                    .await?
                }
            };

            let consumed = invites::Entity::update_many()
                .col_expr(invites::Column::Used, Expr::value(true))
                .filter(invites::Column::Id.eq(invite.id.clone()))
                .filter(invites::Column::Used.eq(false))
                .exec(&db_tx)
                .await?;
            if consumed.rows_affected != 1 {
                return Err(EngineError::InvalidState(
                    "invite was already used".to_string(),
                ));
            }

            tracing::info!("account {} registered through an invite", model.id);
            Account::try_from(model)
        })
    }
}
