//! In-memory implementation of `RequestStore`.
//!
//! Each request lives behind its own mutex, so transitions on one request are
//! serialized while different requests proceed independently. The outer map
//! lock is only held to look up or insert a slot. State is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::request::{CommitOutcome, RequestListFilters, RequestScope, RequestStore};
use crate::models::audit_log::TransitionRecord;
use crate::models::request::SelfServiceRequest;
use crate::types::RequestId;
use crate::workflow::transition::Transition;

#[derive(Debug)]
struct StoredRequest {
    request: SelfServiceRequest,
    trail: Vec<TransitionRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<RequestId, Arc<Mutex<StoredRequest>>>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: RequestId) -> Option<Arc<Mutex<StoredRequest>>> {
        self.requests.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn insert(
        &self,
        request: &SelfServiceRequest,
        submitted: &TransitionRecord,
    ) -> anyhow::Result<()> {
        let mut requests = self.requests.write().await;
        if requests.contains_key(&request.id) {
            bail!("request {} already exists", request.id);
        }
        requests.insert(
            request.id,
            Arc::new(Mutex::new(StoredRequest {
                request: request.clone(),
                trail: vec![submitted.clone()],
            })),
        );
        Ok(())
    }

    async fn find_by_id(&self, id: RequestId) -> anyhow::Result<Option<SelfServiceRequest>> {
        match self.slot(id).await {
            Some(slot) => Ok(Some(slot.lock().await.request.clone())),
            None => Ok(None),
        }
    }

    async fn commit_transition(&self, transition: &Transition) -> anyhow::Result<CommitOutcome> {
        let Some(slot) = self.slot(transition.request_id).await else {
            return Ok(CommitOutcome::Missing);
        };
        let mut stored = slot.lock().await;
        if stored.request.status != transition.from {
            return Ok(CommitOutcome::Stale(stored.request.clone()));
        }

        let mut updated = stored.request.clone();
        transition.apply_to(&mut updated);
        updated
            .check_consistency()
            .map_err(|msg| anyhow!("refusing to store request {}: {}", updated.id, msg))?;

        stored.request = updated.clone();
        stored.trail.push(transition.record());
        Ok(CommitOutcome::Applied(updated))
    }

    async fn list(
        &self,
        scope: RequestScope,
        filters: &RequestListFilters,
    ) -> anyhow::Result<Vec<SelfServiceRequest>> {
        let slots: Vec<_> = self.requests.read().await.values().cloned().collect();
        let mut matched = Vec::new();
        for slot in slots {
            let stored = slot.lock().await;
            if scope.contains(&stored.request) && filters.matches(&stored.request) {
                matched.push(stored.request.clone());
            }
        }
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let page = filters.pagination();
        Ok(matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn audit_trail(&self, id: RequestId) -> anyhow::Result<Vec<TransitionRecord>> {
        match self.slot(id).await {
            Some(slot) => Ok(slot.lock().await.trail.clone()),
            None => Ok(Vec::new()),
        }
    }
}
