//! Capability checks supplied to the workflow engine.
//!
//! The engine never decides on its own who holds admin authority or who may
//! act on a manager's behalf; it asks an [`AuthorityPolicy`].

use async_trait::async_trait;

use crate::types::UserId;

pub mod memory;
pub mod postgres;

pub use memory::StaticAuthority;
pub use postgres::{PgAuthorityPolicy, SELF_SERVICE_ADMIN};

#[async_trait]
pub trait AuthorityPolicy: Send + Sync {
    /// Whether `actor_id` may decide requests awaiting the admin stage.
    async fn is_admin(&self, actor_id: UserId) -> anyhow::Result<bool>;

    /// Whether `actor_id` may decide a request frozen to `manager_id`.
    /// The manager always may; delegation is up to the implementation.
    async fn may_act_for_manager(
        &self,
        actor_id: UserId,
        manager_id: UserId,
    ) -> anyhow::Result<bool> {
        Ok(actor_id == manager_id)
    }

    /// Managers whose queues `actor_id` may work: the actor plus every
    /// manager that currently delegates to them.
    async fn represented_managers(&self, actor_id: UserId) -> anyhow::Result<Vec<UserId>> {
        Ok(vec![actor_id])
    }
}
