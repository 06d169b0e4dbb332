mod common;

use chrono::{Duration, Utc};
use common::TestEnv;
use engine::{AccountStatus, EngineError, IssuedInvite, Principal, RegisterCmd, Role};
use sea_orm::{ConnectionTrait, Statement};

fn registration(invite: &IssuedInvite) -> RegisterCmd {
    RegisterCmd {
        email: invite.email.clone(),
        token: invite.token.clone(),
        temp_password: invite.temp_password.clone(),
        new_password: "s3cret!".to_string(),
        name: "Carla Rossi".to_string(),
    }
}

async fn invite(env: &TestEnv, admin: &Principal, email: &str, role: Role) -> IssuedInvite {
    env.engine.issue_invite(admin, email, role).await.unwrap()
}

#[tokio::test]
async fn issued_invite_carries_one_time_secrets() {
    let env = TestEnv::new().await;
    let admin = env.admin().await;

    let issued = invite(&env, &admin, "  Carla@Example.COM ", Role::User).await;
    assert_eq!(issued.email, "carla@example.com");
    assert_eq!(issued.token.len(), 40);
    assert!(issued.token.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(issued.temp_password.len(), 8);
    assert!(issued.expires_at > Utc::now() + Duration::hours(23));

    let listed = env.engine.invites(&admin).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].token, issued.token);
    assert!(!listed[0].used);
}

#[tokio::test]
async fn only_one_active_invite_per_email() {
    let env = TestEnv::new().await;
    let admin = env.admin().await;
    invite(&env, &admin, "carla@example.com", Role::User).await;

    let err = env
        .engine
        .issue_invite(&admin, "CARLA@example.com", Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert_eq!(env.count("invite_tokens").await, 1);
}

#[tokio::test]
async fn invites_are_admin_only_and_never_super_admin() {
    let env = TestEnv::new().await;
    let admin = env.admin().await;
    let alice = env.user("alice@example.com").await;

    let err = env
        .engine
        .issue_invite(&alice, "carla@example.com", Role::User)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = env
        .engine
        .issue_invite(&admin, "carla@example.com", Role::SuperAdmin)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    let err = env
        .engine
        .issue_invite(&admin, "not-an-email", Role::User)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
}

#[tokio::test]
async fn register_binds_the_invited_role_and_consumes_the_invite() {
    let env = TestEnv::new().await;
    let admin = env.admin().await;
    let issued = invite(&env, &admin, "carla@example.com", Role::Admin).await;

    let account = env.engine.register(registration(&issued)).await.unwrap();
    assert_eq!(account.email, "carla@example.com");
    assert_eq!(account.role, Role::Admin);
    assert_eq!(account.status, AccountStatus::Active);
    assert!(account.is_registered);
    assert_eq!(account.name.as_deref(), Some("Carla Rossi"));

    let logged_in = env
        .engine
        .authenticate("carla@example.com", "s3cret!")
        .await
        .unwrap();
    assert_eq!(logged_in.id, account.id);

    let err = env.engine.register(registration(&issued)).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let invites = env.engine.invites(&admin).await.unwrap();
    assert!(invites[0].used);

    // a consumed invite no longer blocks a new one
    invite(&env, &admin, "carla@example.com", Role::User).await;
}

#[tokio::test]
async fn register_checks_every_credential() {
    let env = TestEnv::new().await;
    let admin = env.admin().await;
    let issued = invite(&env, &admin, "carla@example.com", Role::User).await;

    let mut cmd = registration(&issued);
    cmd.token = "f".repeat(40);
    let err = env.engine.register(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let mut cmd = registration(&issued);
    cmd.email = "someone@example.com".to_string();
    let err = env.engine.register(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let mut cmd = registration(&issued);
    cmd.temp_password = "wrong123".to_string();
    let err = env.engine.register(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredential(_)));

    let mut cmd = registration(&issued);
    cmd.new_password = "12345".to_string();
    let err = env.engine.register(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    let mut cmd = registration(&issued);
    cmd.name = " C ".to_string();
    let err = env.engine.register(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    // nothing above consumed the invite
    env.engine.register(registration(&issued)).await.unwrap();
    assert_eq!(env.count("accounts").await, 2);
}

#[tokio::test]
async fn expired_invite_is_refused() {
    let env = TestEnv::new().await;
    let admin = env.admin().await;
    let issued = invite(&env, &admin, "carla@example.com", Role::User).await;

    let backend = env.db.get_database_backend();
    env.db
        .execute(Statement::from_sql_and_values(
            backend,
            "UPDATE invite_tokens SET expires_at = ? WHERE token = ?",
            vec![
                (Utc::now() - Duration::minutes(1)).into(),
                issued.token.clone().into(),
            ],
        ))
        .await
        .unwrap();

    let err = env.engine.register(registration(&issued)).await.unwrap_err();
    assert!(matches!(err, EngineError::Expired(_)));
    assert_eq!(env.count("accounts").await, 1);

    // an expired invite does not block a fresh one
    invite(&env, &admin, "carla@example.com", Role::User).await;
}

#[tokio::test]
async fn delete_invite_by_token() {
    let env = TestEnv::new().await;
    let admin = env.admin().await;
    let issued = invite(&env, &admin, "carla@example.com", Role::User).await;

    env.engine.delete_invite(&admin, &issued.token).await.unwrap();
    assert!(env.engine.invites(&admin).await.unwrap().is_empty());

    let err = env
        .engine
        .delete_invite(&admin, &issued.token)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn authenticate_rules() {
    let env = TestEnv::new().await;
    let admin = env.admin().await;
    let alice = env.user("alice@example.com").await;
    let root = env.account("root@example.com", Role::SuperAdmin).await;

    let err = env
        .engine
        .authenticate("alice@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredential(_)));
    let err = env
        .engine
        .authenticate("nobody@example.com", "password")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredential(_)));

    let account = env
        .engine
        .authenticate(" ALICE@example.com", "password")
        .await
        .unwrap();
    assert_eq!(account.id, alice.account_id);

    env.engine
        .set_account_status(&admin, alice.account_id, AccountStatus::Inactive)
        .await
        .unwrap();
    let err = env
        .engine
        .authenticate("alice@example.com", "password")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // an admin cannot touch a super admin, a super admin can
    let err = env
        .engine
        .set_account_status(&admin, root.account_id, AccountStatus::Inactive)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    env.engine
        .set_account_status(&root, root.account_id, AccountStatus::Inactive)
        .await
        .unwrap();
    let account = env
        .engine
        .authenticate("root@example.com", "password")
        .await
        .unwrap();
    assert_eq!(account.role, Role::SuperAdmin);
    assert_eq!(account.status, AccountStatus::Inactive);
}

#[tokio::test]
async fn duplicate_accounts_are_refused() {
    let env = TestEnv::new().await;
    env.user("alice@example.com").await;

    let err = env
        .engine
        .create_account("Alice@Example.com", "password", None, Role::User)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}
