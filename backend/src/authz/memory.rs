use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::AuthorityPolicy;
use crate::types::UserId;

/// Fixed admin set and delegation table, for tests and local runs.
#[derive(Debug, Default)]
pub struct StaticAuthority {
    admins: RwLock<HashSet<UserId>>,
    // delegate -> managers it may act for
    delegations: RwLock<HashMap<UserId, HashSet<UserId>>>,
}

impl StaticAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admins(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: RwLock::new(admins.into_iter().collect()),
            delegations: RwLock::default(),
        }
    }

    pub async fn grant_admin(&self, actor_id: UserId) {
        self.admins.write().await.insert(actor_id);
    }

    pub async fn revoke_admin(&self, actor_id: UserId) {
        self.admins.write().await.remove(&actor_id);
    }

    pub async fn delegate(&self, manager_id: UserId, delegate_id: UserId) {
        self.delegations
            .write()
            .await
            .entry(delegate_id)
            .or_default()
            .insert(manager_id);
    }
}

#[async_trait]
impl AuthorityPolicy for StaticAuthority {
    async fn is_admin(&self, actor_id: UserId) -> anyhow::Result<bool> {
        Ok(self.admins.read().await.contains(&actor_id))
    }

    async fn may_act_for_manager(
        &self,
        actor_id: UserId,
        manager_id: UserId,
    ) -> anyhow::Result<bool> {
        if actor_id == manager_id {
            return Ok(true);
        }
        Ok(self
            .delegations
            .read()
            .await
            .get(&actor_id)
            .is_some_and(|managers| managers.contains(&manager_id)))
    }

    async fn represented_managers(&self, actor_id: UserId) -> anyhow::Result<Vec<UserId>> {
        let mut managers = vec![actor_id];
        if let Some(delegated) = self.delegations.read().await.get(&actor_id) {
            managers.extend(delegated.iter().copied().filter(|id| *id != actor_id));
        }
        Ok(managers)
    }
}
