use async_trait::async_trait;
use sqlx::PgPool;

use super::AuthorityPolicy;
use crate::types::UserId;

/// Permission granting admin-stage authority without the admin role.
pub const SELF_SERVICE_ADMIN: &str = "self_service_admin";

/// Authority backed by `employees.role`, `user_permissions` and
/// `approval_delegations`.
#[derive(Debug, Clone)]
pub struct PgAuthorityPolicy {
    pool: PgPool,
}

impl PgAuthorityPolicy {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorityPolicy for PgAuthorityPolicy {
    async fn is_admin(&self, actor_id: UserId) -> anyhow::Result<bool> {
        let exists: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM employees WHERE id = $1 AND is_active AND LOWER(role) = 'admin' \
             UNION ALL \
             SELECT 1 FROM user_permissions p JOIN employees e ON e.id = p.user_id \
             WHERE p.user_id = $1 AND p.permission_name = $2 AND e.is_active \
             LIMIT 1",
        )
        .bind(actor_id)
        .bind(SELF_SERVICE_ADMIN)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exists.is_some())
    }

    async fn may_act_for_manager(
        &self,
        actor_id: UserId,
        manager_id: UserId,
    ) -> anyhow::Result<bool> {
        if actor_id == manager_id {
            return Ok(true);
        }
        let exists: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM approval_delegations d JOIN employees e ON e.id = d.delegate_id \
             WHERE d.delegate_id = $1 AND d.manager_id = $2 AND e.is_active \
             AND (d.expires_at IS NULL OR d.expires_at > NOW())",
        )
        .bind(actor_id)
        .bind(manager_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exists.is_some())
    }

    async fn represented_managers(&self, actor_id: UserId) -> anyhow::Result<Vec<UserId>> {
        let delegators: Vec<(UserId,)> = sqlx::query_as(
            "SELECT d.manager_id FROM approval_delegations d \
             JOIN employees e ON e.id = d.delegate_id \
             WHERE d.delegate_id = $1 AND d.manager_id <> $1 AND e.is_active \
             AND (d.expires_at IS NULL OR d.expires_at > NOW()) \
             ORDER BY d.manager_id",
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(std::iter::once(actor_id)
            .chain(delegators.into_iter().map(|(id,)| id))
            .collect())
    }
}
