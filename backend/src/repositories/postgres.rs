//! Postgres implementation of `RequestStore`.
//!
//! Transitions lock the request row (`SELECT ... FOR UPDATE`), re-check the
//! status, write the stamps with a status-guarded `UPDATE` and append the
//! audit row, all in one transaction.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::request::{CommitOutcome, RequestListFilters, RequestScope, RequestStore};
use super::transaction::{begin_transaction, commit_transaction, rollback_transaction};
use crate::models::audit_log::TransitionRecord;
use crate::models::request::SelfServiceRequest;
use crate::types::RequestId;
use crate::workflow::transition::Transition;

const REQUEST_TABLE: &str = "self_service_requests";
const AUDIT_TABLE: &str = "request_audit_logs";

const REQUEST_COLUMNS: &str = "id, employee_id, request_type, leave_policy_id, status, \
     start_date, end_date, request_data, notes, manager_id, \
     manager_approved_at, manager_approved_by, admin_approved_at, admin_approved_by, \
     rejected_at, rejected_by, rejection_reason, cancelled_at, created_at, updated_at";

const AUDIT_COLUMNS: &str =
    "request_id, action, from_status, to_status, actor_id, occurred_at, reason";

/// Starts the WHERE clause on first use, then joins with AND.
fn push_clause(builder: &mut QueryBuilder<'_, Postgres>, has_clause: &mut bool) {
    builder.push(if *has_clause { " AND " } else { " WHERE " });
    *has_clause = true;
}

#[derive(Debug, Clone)]
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_audit_entry(
    conn: &mut sqlx::PgConnection,
    entry: &TransitionRecord,
) -> anyhow::Result<()> {
    let query = format!(
        "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        AUDIT_TABLE, AUDIT_COLUMNS
    );
    sqlx::query(&query)
        .bind(entry.request_id)
        .bind(entry.action)
        .bind(entry.from_status)
        .bind(entry.to_status)
        .bind(entry.actor_id)
        .bind(entry.occurred_at)
        .bind(&entry.reason)
        .execute(conn)
        .await
        .context("insert audit entry")?;
    Ok(())
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn insert(
        &self,
        request: &SelfServiceRequest,
        submitted: &TransitionRecord,
    ) -> anyhow::Result<()> {
        let mut tx = begin_transaction(&self.pool).await?;
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
             $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
            REQUEST_TABLE, REQUEST_COLUMNS
        );
        sqlx::query(&query)
            .bind(request.id)
            .bind(request.employee_id)
            .bind(request.request_type)
            .bind(&request.leave_policy_id)
            .bind(request.status)
            .bind(request.start_date)
            .bind(request.end_date)
            .bind(&request.request_data)
            .bind(&request.notes)
            .bind(request.manager_id)
            .bind(request.manager_approved_at)
            .bind(request.manager_approved_by)
            .bind(request.admin_approved_at)
            .bind(request.admin_approved_by)
            .bind(request.rejected_at)
            .bind(request.rejected_by)
            .bind(&request.rejection_reason)
            .bind(request.cancelled_at)
            .bind(request.created_at)
            .bind(request.updated_at)
            .execute(&mut *tx)
            .await
            .context("insert self-service request")?;
        insert_audit_entry(&mut tx, submitted).await?;
        commit_transaction(tx).await
    }

    async fn find_by_id(&self, id: RequestId) -> anyhow::Result<Option<SelfServiceRequest>> {
        let query = format!(
            "SELECT {} FROM {} WHERE id = $1",
            REQUEST_COLUMNS, REQUEST_TABLE
        );
        let row = sqlx::query_as::<_, SelfServiceRequest>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("fetch self-service request")?;
        Ok(row)
    }

    async fn commit_transition(&self, transition: &Transition) -> anyhow::Result<CommitOutcome> {
        let mut tx = begin_transaction(&self.pool).await?;

        let select = format!(
            "SELECT {} FROM {} WHERE id = $1 FOR UPDATE",
            REQUEST_COLUMNS, REQUEST_TABLE
        );
        let current = sqlx::query_as::<_, SelfServiceRequest>(&select)
            .bind(transition.request_id)
            .fetch_optional(&mut *tx)
            .await
            .context("lock self-service request")?;

        let current = match current {
            Some(current) if current.status == transition.from => current,
            Some(current) => {
                rollback_transaction(tx).await?;
                return Ok(CommitOutcome::Stale(current));
            }
            None => {
                rollback_transaction(tx).await?;
                return Ok(CommitOutcome::Missing);
            }
        };

        let mut updated = current;
        transition.apply_to(&mut updated);
        if let Err(msg) = updated.check_consistency() {
            rollback_transaction(tx).await?;
            return Err(anyhow!("refusing to store request {}: {}", updated.id, msg));
        }

        let update = format!(
            "UPDATE {} SET status = $2, manager_approved_at = $3, manager_approved_by = $4, \
             admin_approved_at = $5, admin_approved_by = $6, rejected_at = $7, rejected_by = $8, \
             rejection_reason = $9, cancelled_at = $10, updated_at = $11 \
             WHERE id = $1 AND status = $12",
            REQUEST_TABLE
        );
        let result = sqlx::query(&update)
            .bind(updated.id)
            .bind(updated.status)
            .bind(updated.manager_approved_at)
            .bind(updated.manager_approved_by)
            .bind(updated.admin_approved_at)
            .bind(updated.admin_approved_by)
            .bind(updated.rejected_at)
            .bind(updated.rejected_by)
            .bind(&updated.rejection_reason)
            .bind(updated.cancelled_at)
            .bind(updated.updated_at)
            .bind(transition.from)
            .execute(&mut *tx)
            .await
            .context("update self-service request")?;
        if result.rows_affected() != 1 {
            rollback_transaction(tx).await?;
            return Err(anyhow!(
                "status guard matched {} rows for locked request {}",
                result.rows_affected(),
                updated.id
            ));
        }

        insert_audit_entry(&mut tx, &transition.record()).await?;
        commit_transaction(tx).await?;
        Ok(CommitOutcome::Applied(updated))
    }

    async fn list(
        &self,
        scope: RequestScope,
        filters: &RequestListFilters,
    ) -> anyhow::Result<Vec<SelfServiceRequest>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM {}",
            REQUEST_COLUMNS, REQUEST_TABLE
        ));
        let mut has_clause = false;
        match scope {
            RequestScope::Employee(id) => {
                push_clause(&mut builder, &mut has_clause);
                builder.push("employee_id = ").push_bind(id);
            }
            RequestScope::Managers(ids) => {
                let ids: Vec<String> = ids.into_iter().map(String::from).collect();
                push_clause(&mut builder, &mut has_clause);
                builder.push("manager_id = ANY(").push_bind(ids).push(")");
            }
            RequestScope::All => {}
        }
        if let Some(status) = filters.status {
            push_clause(&mut builder, &mut has_clause);
            builder.push("status = ").push_bind(status);
        }
        if let Some(request_type) = filters.request_type {
            push_clause(&mut builder, &mut has_clause);
            builder.push("request_type = ").push_bind(request_type);
        }
        if let Some(from) = filters.from {
            push_clause(&mut builder, &mut has_clause);
            builder.push("end_date >= ").push_bind(from);
        }
        if let Some(to) = filters.to {
            push_clause(&mut builder, &mut has_clause);
            builder.push("start_date <= ").push_bind(to);
        }

        let page = filters.pagination();
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = builder
            .build_query_as::<SelfServiceRequest>()
            .fetch_all(&self.pool)
            .await
            .context("list self-service requests")?;
        Ok(rows)
    }

    async fn audit_trail(&self, id: RequestId) -> anyhow::Result<Vec<TransitionRecord>> {
        let query = format!(
            "SELECT {} FROM {} WHERE request_id = $1 ORDER BY id ASC",
            AUDIT_COLUMNS, AUDIT_TABLE
        );
        let rows = sqlx::query_as::<_, TransitionRecord>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .context("fetch request audit trail")?;
        Ok(rows)
    }
}
