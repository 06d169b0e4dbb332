mod common;

use common::TestEnv;
use engine::{
    ApprovalTarget, EngineError, ExpenseCategory, ExpenseNew, ExpenseStatus, JourneyNew,
    JourneyStatus, Money, Principal, VarianceDecision, ZERO_EXPECTED_VARIANCE,
};
use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

async fn journey_with_claim(env: &TestEnv, owner: &Principal, distance_km: f64, minor: i64) -> Uuid {
    let journey = env
        .engine
        .create_journey(owner, JourneyNew::new("Visit", "A", "B", distance_km, 60))
        .await
        .unwrap();
    env.engine
        .create_expense(
            owner,
            ExpenseNew::new(Money::new(minor), ExpenseCategory::Fuel).journey(journey.id),
        )
        .await
        .unwrap()
        .id
}

async fn status_of(env: &TestEnv, owner: &Principal, id: Uuid) -> ExpenseStatus {
    env.engine.expense(owner, id).await.unwrap().status
}

#[tokio::test]
async fn bulk_sweep_decides_by_variance() {
    let env = TestEnv::new().await;
    let alice = env.user("alice@example.com").await;
    let admin = env.admin().await;

    // 100 km at 2.00/km: expected 200.00
    let under = journey_with_claim(&env, &alice, 100.0, 19_000).await;
    let over = journey_with_claim(&env, &alice, 100.0, 25_000).await;
    let loose = env
        .engine
        .create_expense(&alice, ExpenseNew::new(Money::new(500), ExpenseCategory::Food))
        .await
        .unwrap()
        .id;

    let report = env
        .engine
        .bulk_approve_by_variance(&admin, None)
        .await
        .unwrap();
    assert_eq!(report.variance_percent, 10.0);
    assert_eq!(report.approved, 1);
    assert_eq!(report.rejected, 2);
    assert_eq!(report.details.len(), 3);

    let under_item = report.details.iter().find(|d| d.expense_id == under).unwrap();
    assert_eq!(under_item.expected, Money::new(20_000));
    assert_eq!(under_item.variance, -5.0);
    assert_eq!(under_item.decision, VarianceDecision::Approved);

    let over_item = report.details.iter().find(|d| d.expense_id == over).unwrap();
    assert_eq!(over_item.variance, 25.0);
    assert_eq!(over_item.decision, VarianceDecision::Rejected);

    let loose_item = report.details.iter().find(|d| d.expense_id == loose).unwrap();
    assert_eq!(loose_item.journey_id, None);
    assert_eq!(loose_item.expected, Money::ZERO);
    assert_eq!(loose_item.variance, ZERO_EXPECTED_VARIANCE);
    assert_eq!(loose_item.decision, VarianceDecision::Rejected);

    assert_eq!(status_of(&env, &alice, under).await, ExpenseStatus::Approved);
    assert_eq!(status_of(&env, &alice, over).await, ExpenseStatus::Rejected);
    assert_eq!(status_of(&env, &alice, loose).await, ExpenseStatus::Rejected);
    assert_eq!(env.count("bulk_approvals").await, 1);

    let again = env
        .engine
        .bulk_approve_by_variance(&admin, None)
        .await
        .unwrap();
    assert_eq!(again.approved + again.rejected, 0);
    assert!(again.details.is_empty());
    assert_eq!(env.count("bulk_approvals").await, 2);
}

#[tokio::test]
async fn tolerance_boundary_is_inclusive() {
    let env = TestEnv::new().await;
    let alice = env.user("alice@example.com").await;
    let admin = env.admin().await;
    // expected 100.00, claimed 110.00: exactly +10%
    let at_ten = journey_with_claim(&env, &alice, 50.0, 11_000).await;

    let report = env
        .engine
        .bulk_approve_by_variance(&admin, Some(9.0))
        .await
        .unwrap();
    assert_eq!(report.rejected, 1);
    assert_eq!(status_of(&env, &alice, at_ten).await, ExpenseStatus::Rejected);

    let other = journey_with_claim(&env, &alice, 50.0, 11_000).await;
    let report = env
        .engine
        .bulk_approve_by_variance(&admin, Some(-10.0))
        .await
        .unwrap();
    assert_eq!(report.variance_percent, 10.0);
    assert_eq!(report.approved, 1);
    assert_eq!(status_of(&env, &alice, other).await, ExpenseStatus::Approved);
}

#[tokio::test]
async fn exact_tolerance_ties_approve() {
    let env = TestEnv::new().await;
    let alice = env.user("alice@example.com").await;
    let admin = env.admin().await;
    // expected 100.00, claimed 107.00: 7% apart, not representable exactly in f64
    let tie = journey_with_claim(&env, &alice, 50.0, 10_700).await;
    let over = journey_with_claim(&env, &alice, 50.0, 10_701).await;

    let report = env
        .engine
        .bulk_approve_by_variance(&admin, Some(7.0))
        .await
        .unwrap();
    let tie_item = report.details.iter().find(|d| d.expense_id == tie).unwrap();
    assert_eq!(tie_item.variance, 7.0);
    assert_eq!(tie_item.decision, VarianceDecision::Approved);
    assert_eq!(report.approved, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(status_of(&env, &alice, tie).await, ExpenseStatus::Approved);
    assert_eq!(status_of(&env, &alice, over).await, ExpenseStatus::Rejected);
}

#[tokio::test]
async fn failed_update_rolls_back_the_whole_sweep() {
    let env = TestEnv::new().await;
    let alice = env.user("alice@example.com").await;
    let admin = env.admin().await;
    let first = journey_with_claim(&env, &alice, 50.0, 10_000).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let failing = journey_with_claim(&env, &alice, 50.0, 777).await;

    env.db
        .execute(Statement::from_string(
            env.db.get_database_backend(),
            "CREATE TRIGGER fail_expense_update BEFORE UPDATE ON expenses \
             WHEN NEW.amount_minor = 777 \
             BEGIN SELECT RAISE(ABORT, 'update refused'); END;"
                .to_string(),
        ))
        .await
        .unwrap();

    let err = env
        .engine
        .bulk_approve_by_variance(&admin, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));

    assert_eq!(status_of(&env, &alice, first).await, ExpenseStatus::Pending);
    assert_eq!(status_of(&env, &alice, failing).await, ExpenseStatus::Pending);
    assert_eq!(env.count("bulk_approvals").await, 0);
}

#[tokio::test]
async fn invalid_tolerance_changes_nothing() {
    let env = TestEnv::new().await;
    let alice = env.user("alice@example.com").await;
    let admin = env.admin().await;
    let id = journey_with_claim(&env, &alice, 10.0, 2_000).await;

    for bad in [f64::NAN, f64::INFINITY] {
        let err = env
            .engine
            .bulk_approve_by_variance(&admin, Some(bad))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }
    assert_eq!(status_of(&env, &alice, id).await, ExpenseStatus::Pending);
    assert_eq!(env.count("bulk_approvals").await, 0);
}

#[tokio::test]
async fn reviews_require_an_admin() {
    let env = TestEnv::new().await;
    let alice = env.user("alice@example.com").await;
    let id = journey_with_claim(&env, &alice, 10.0, 2_000).await;

    let err = env
        .engine
        .bulk_approve_by_variance(&alice, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = env
        .engine
        .approve_single(&alice, ApprovalTarget::Expense, id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = env.engine.pending_approvals(&alice).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    assert_eq!(status_of(&env, &alice, id).await, ExpenseStatus::Pending);
}

#[tokio::test]
async fn single_review_is_one_way() {
    let env = TestEnv::new().await;
    let alice = env.user("alice@example.com").await;
    let admin = env.admin().await;
    let id = journey_with_claim(&env, &alice, 10.0, 2_000).await;

    env.engine
        .approve_single(&admin, ApprovalTarget::Expense, id)
        .await
        .unwrap();
    assert_eq!(status_of(&env, &alice, id).await, ExpenseStatus::Approved);

    let err = env
        .engine
        .reject_single(&admin, ApprovalTarget::Expense, id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    let err = env
        .engine
        .approve_single(&admin, ApprovalTarget::Expense, id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let err = env
        .engine
        .approve_single(&admin, ApprovalTarget::Expense, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn journeys_are_reviewed_independently() {
    let env = TestEnv::new().await;
    let alice = env.user("alice@example.com").await;
    let admin = env.admin().await;
    let expense_id = journey_with_claim(&env, &alice, 10.0, 2_000).await;
    let journey_id = env
        .engine
        .expense(&alice, expense_id)
        .await
        .unwrap()
        .journey_id
        .unwrap();

    env.engine
        .reject_single(&admin, ApprovalTarget::Journey, journey_id)
        .await
        .unwrap();
    let journey = env.engine.journey(&alice, journey_id).await.unwrap();
    assert_eq!(journey.status, JourneyStatus::Rejected);
    assert_eq!(status_of(&env, &alice, expense_id).await, ExpenseStatus::Pending);

    env.engine
        .approve_single(&admin, ApprovalTarget::Journey, journey_id)
        .await
        .unwrap();
    let journey = env.engine.journey(&alice, journey_id).await.unwrap();
    assert_eq!(journey.status, JourneyStatus::Approved);

    let err = env
        .engine
        .approve_single(&admin, ApprovalTarget::Journey, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[test]
fn approval_target_parsing() {
    assert_eq!(
        ApprovalTarget::try_from("Expense").unwrap(),
        ApprovalTarget::Expense
    );
    assert_eq!(
        ApprovalTarget::try_from("journey").unwrap(),
        ApprovalTarget::Journey
    );
    assert!(matches!(
        ApprovalTarget::try_from("trip"),
        Err(EngineError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn pending_approvals_lists_reviewable_expenses_newest_first() {
    let env = TestEnv::new().await;
    let alice = env.user("alice@example.com").await;
    let admin = env.admin().await;

    let first = journey_with_claim(&env, &alice, 10.0, 2_000).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = journey_with_claim(&env, &alice, 20.0, 4_000).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let decided = journey_with_claim(&env, &alice, 30.0, 6_000).await;
    env.engine
        .approve_single(&admin, ApprovalTarget::Expense, decided)
        .await
        .unwrap();

    let pending = env.engine.pending_approvals(&admin).await.unwrap();
    let ids: Vec<Uuid> = pending.iter().map(|p| p.expense.id).collect();
    assert_eq!(ids, vec![second, first]);

    let journey = pending[0].journey.as_ref().unwrap();
    assert_eq!(journey.distance_km, 20.0);
    assert_eq!(journey.expense_ids, vec![second]);
}
