//! Invite tokens: single-use, time-boxed registration credentials.

use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Role, util::parse_uuid};

/// How long an invite stays valid.
pub const INVITE_TTL_HOURS: i64 = 24;

/// Stored invite; the temporary password only exists as a hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invite {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub token: String,
    pub used: bool,
    pub expires_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Invite {
    /// Unused and not yet expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}

/// Result of issuing an invite: the only place the plaintext secrets appear.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedInvite {
    pub email: String,
    pub role: Role,
    pub token: String,
    pub temp_password: String,
    pub expires_at: DateTime<Utc>,
}

pub(crate) fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(INVITE_TTL_HOURS)
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invite_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email: String,
    pub role: String,
    #[sea_orm(unique)]
    pub token: String,
    pub temp_password_hash: String,
    pub used: bool,
    pub expires_at: DateTimeUtc,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Invite {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "invite")?,
            email: model.email,
            role: Role::try_from(model.role.as_str())?,
            token: model.token,
            used: model.used,
            expires_at: model.expires_at,
            created_by: parse_uuid(&model.created_by, "account")?,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(used: bool, expires_at: DateTime<Utc>) -> Invite {
        Invite {
            id: Uuid::new_v4(),
            email: "bob@example.com".to_string(),
            role: Role::User,
            token: "t".to_string(),
            used,
            expires_at,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn active_means_unused_and_unexpired() {
        let now = Utc::now();
        assert!(invite(false, expiry_from(now)).is_active(now));
        assert!(!invite(true, expiry_from(now)).is_active(now));
        assert!(!invite(false, now).is_active(now));
        assert!(!invite(false, now - Duration::minutes(1)).is_active(now));
    }

    #[test]
    fn invites_last_a_day() {
        let now = Utc::now();
        assert_eq!(expiry_from(now) - now, Duration::hours(24));
    }
}
