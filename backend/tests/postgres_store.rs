//! Runs against a real database only when `TEST_DATABASE_URL` is set.

use chrono::NaiveDate;
use sqlx::PgPool;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

use selfservice_backend::{
    authz::{AuthorityPolicy, PgAuthorityPolicy, SELF_SERVICE_ADMIN},
    directory::{EmployeeDirectory, PgEmployeeDirectory},
    models::request::{NewRequest, RequestAction, RequestStatus, RequestType},
    repositories::{PgRequestStore, RequestListFilters},
    types::UserId,
    workflow::{audit, ActorRole, WorkflowEngine, WorkflowError},
};

mod support;

async fn integration_guard() -> tokio::sync::MutexGuard<'static, ()> {
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD.get_or_init(|| Mutex::new(())).lock().await
}

async fn reset(pool: &PgPool) {
    sqlx::query(
        "TRUNCATE request_audit_logs, self_service_requests, approval_delegations, \
         user_permissions, employees",
    )
    .execute(pool)
    .await
    .expect("truncate tables");
}

async fn seed_employee(pool: &PgPool, role: &str, manager_id: Option<UserId>) -> UserId {
    let id = UserId::new();
    sqlx::query("INSERT INTO employees (id, full_name, role, manager_id) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(format!("Employee {id}"))
        .bind(role)
        .bind(manager_id)
        .execute(pool)
        .await
        .expect("insert employee");
    id
}

fn engine(pool: &PgPool) -> WorkflowEngine {
    WorkflowEngine::new(
        Arc::new(PgRequestStore::new(pool.clone())),
        Arc::new(PgEmployeeDirectory::new(pool.clone())),
        Arc::new(PgAuthorityPolicy::new(pool.clone())),
    )
}

fn leave() -> NewRequest {
    NewRequest {
        request_type: RequestType::Leave,
        start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 6, 3),
        request_data: Some(serde_json::json!({"half_day": false})),
        notes: Some("family trip".into()),
        leave_policy_id: Some("annual".into()),
    }
}

#[tokio::test]
async fn postgres_full_approval_round_trip() {
    let _guard = integration_guard().await;
    let Some(pool) = support::test_pool().await else {
        return;
    };
    reset(&pool).await;

    let manager = seed_employee(&pool, "employee", None).await;
    let employee = seed_employee(&pool, "employee", Some(manager)).await;
    let admin = seed_employee(&pool, "admin", None).await;
    let engine = engine(&pool);

    let request = engine.submit(employee, leave()).await.expect("submit");
    assert_eq!(request.status, RequestStatus::PendingManager);
    assert_eq!(request.manager_id, Some(manager));

    engine.approve(request.id, manager).await.expect("manager approve");
    let approved = engine.approve(request.id, admin).await.expect("admin approve");
    assert_eq!(approved.status, RequestStatus::Approved);

    let stored = engine.get(request.id).await.expect("reload");
    assert_eq!(stored.status, RequestStatus::Approved);
    assert_eq!(stored.request_data.0, serde_json::json!({"half_day": false}));
    assert!(stored.check_consistency().is_ok());

    let trail = engine.audit_trail(request.id).await.expect("audit trail");
    let actions: Vec<_> = trail.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![RequestAction::Submit, RequestAction::Approve, RequestAction::Approve]
    );
    assert_eq!(trail.len(), audit::reconstruct(&stored).len());

    let err = engine.cancel(request.id, employee).await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

    let all = engine
        .list_for_actor(admin, ActorRole::Admin, &RequestListFilters::default())
        .await
        .expect("admin list");
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn postgres_concurrent_decisions_have_one_winner() {
    let _guard = integration_guard().await;
    let Some(pool) = support::test_pool().await else {
        return;
    };
    reset(&pool).await;

    let employee = seed_employee(&pool, "employee", None).await;
    let admin = seed_employee(&pool, "admin", None).await;
    let engine = Arc::new(engine(&pool));
    let request = engine.submit(employee, leave()).await.expect("submit");

    let approve = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.approve(request.id, admin).await })
    };
    let reject = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.reject(request.id, admin, "budget freeze").await })
    };
    let results = [approve.await.unwrap(), reject.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(engine.audit_trail(request.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn postgres_directory_and_authority() {
    let _guard = integration_guard().await;
    let Some(pool) = support::test_pool().await else {
        return;
    };
    reset(&pool).await;

    let manager = seed_employee(&pool, "employee", None).await;
    let employee = seed_employee(&pool, "employee", Some(manager)).await;
    let delegate = seed_employee(&pool, "employee", None).await;

    let directory = PgEmployeeDirectory::new(pool.clone());
    let record = directory.resolve_employee(employee).await.expect("resolve");
    assert!(record.active);
    assert_eq!(record.manager_id, Some(manager));
    assert!(directory.resolve_employee(UserId::new()).await.is_err());

    let authority = PgAuthorityPolicy::new(pool.clone());
    assert!(!authority.is_admin(delegate).await.unwrap());
    sqlx::query("INSERT INTO user_permissions (user_id, permission_name) VALUES ($1, $2)")
        .bind(delegate)
        .bind(SELF_SERVICE_ADMIN)
        .execute(&pool)
        .await
        .expect("grant permission");
    assert!(authority.is_admin(delegate).await.unwrap());

    assert!(!authority.may_act_for_manager(delegate, manager).await.unwrap());
    sqlx::query("INSERT INTO approval_delegations (delegate_id, manager_id) VALUES ($1, $2)")
        .bind(delegate)
        .bind(manager)
        .execute(&pool)
        .await
        .expect("insert delegation");
    assert!(authority.may_act_for_manager(delegate, manager).await.unwrap());
    assert_eq!(
        authority.represented_managers(delegate).await.unwrap(),
        vec![delegate, manager]
    );

    let request = engine(&pool).submit(employee, leave()).await.expect("submit");
    let queue = engine(&pool)
        .list_for_actor(delegate, ActorRole::Manager, &RequestListFilters::default())
        .await
        .expect("delegate queue");
    assert_eq!(queue.iter().map(|r| r.id).collect::<Vec<_>>(), vec![request.id]);

    sqlx::query("UPDATE employees SET is_active = false WHERE id = $1")
        .bind(delegate)
        .execute(&pool)
        .await
        .expect("deactivate delegate");
    assert!(!authority.is_admin(delegate).await.unwrap());
    assert!(!authority.may_act_for_manager(delegate, manager).await.unwrap());
    assert_eq!(authority.represented_managers(delegate).await.unwrap(), vec![delegate]);
}
