//! 控制台会话
//!
//! One `ConsoleSession` lives from login to logout. It owns everything that
//! is per-session: the resource client, the single onboarding flow with its
//! outstanding remote calls, and which tabs have been shown already.

use std::collections::HashSet;
use std::fmt;

use cloudsync_client::{
    DEFAULT_OBJECT_SET_ID, ObjectQuery, ObjectSet, ResourceClient, SetPayload, User,
};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::onboarding::{Effect, OnboardingEvent, OnboardingWorkflow};
use crate::views::{SetsView, StoresView, Tab, TabView, TasksView};

/// Input for a new object set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewObjectSet {
    pub name: String,
    pub payload: SetPayload,
}

/// Per-session console state.
pub struct ConsoleSession {
    client: ResourceClient,
    onboarding: OnboardingWorkflow,
    /// Remote calls issued by the onboarding flow, resolving to their completion events
    in_flight: FuturesUnordered<BoxFuture<'static, OnboardingEvent>>,
    shown: HashSet<Tab>,
}

impl fmt::Debug for ConsoleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSession")
            .field("client", &self.client)
            .field("onboarding", &self.onboarding)
            .field("in_flight", &self.in_flight.len())
            .field("shown", &self.shown)
            .finish()
    }
}

impl ConsoleSession {
    pub fn new(client: ResourceClient) -> Self {
        log::debug!("Console session opened at {}", client.gateway().base_url());
        Self {
            client,
            onboarding: OnboardingWorkflow::new(),
            in_flight: FuturesUnordered::new(),
            shown: HashSet::new(),
        }
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    /// Read-only view of the onboarding flow; drive it with [`Self::onboard`].
    pub fn onboarding(&self) -> &OnboardingWorkflow {
        &self.onboarding
    }

    /// End the session. Unresolved onboarding calls are dropped.
    pub fn logout(self) {
        log::info!(
            "Console session closed ({} pending responses discarded)",
            self.in_flight.len()
        );
    }

    // ===== Tabs =====

    /// Load a tab's data the first time it is shown; `None` afterwards.
    ///
    /// A failed load does not count as shown.
    pub async fn show_tab(&mut self, tab: Tab) -> CoreResult<Option<TabView>> {
        if self.shown.contains(&tab) {
            return Ok(None);
        }

        let view = match tab {
            Tab::Tasks => TabView::Tasks(self.refresh_tasks().await?),
            Tab::ObjectSets => TabView::ObjectSets(self.refresh_sets().await?),
            Tab::ObjectStores => TabView::ObjectStores(self.refresh_stores().await?),
        };
        self.shown.insert(tab);
        Ok(Some(view))
    }

    pub async fn refresh_tasks(&self) -> CoreResult<TasksView> {
        let (tasks, logs) = futures::try_join!(
            self.client.list_tasks(None),
            self.client.list_task_logs(None)
        )?;
        Ok(TasksView::new(tasks, logs))
    }

    pub async fn refresh_sets(&self) -> CoreResult<SetsView> {
        let sets = self.client.list_object_sets(None).await?;
        Ok(SetsView::new(&sets))
    }

    pub async fn refresh_stores(&self) -> CoreResult<StoresView> {
        let stores = self.client.list_object_stores(None).await?;
        Ok(StoresView::new(&stores))
    }

    // ===== Object sets / stores =====

    pub async fn create_object_set(&self, new_set: NewObjectSet) -> CoreResult<SetsView> {
        if new_set.name.trim().is_empty() {
            return Err(CoreError::MissingField("name"));
        }
        let set = ObjectSet::new(new_set.name.trim(), &new_set.payload)?;
        self.client.create_object_set(&set, None).await?;
        log::info!("Object set '{}' created", set.name);
        self.refresh_sets().await
    }

    /// Delete a set; the built-in set is refused before any request is made.
    pub async fn delete_object_set(&self, id: &str) -> CoreResult<SetsView> {
        if id == DEFAULT_OBJECT_SET_ID {
            return Err(CoreError::DefaultSetProtected);
        }
        self.client.delete_object_set(id, None).await?;
        log::info!("Object set {id} deleted");
        self.refresh_sets().await
    }

    pub async fn forget_object_store(&self, id: &str) -> CoreResult<StoresView> {
        self.client.delete_object_store(id, None).await?;
        log::info!("Object store {id} forgotten");
        self.refresh_stores().await
    }

    pub async fn current_user(&self) -> CoreResult<User> {
        Ok(self.client.get_current_user(None).await?)
    }

    pub async fn query_store_objects(
        &self,
        store_id: &str,
        query: &ObjectQuery,
    ) -> CoreResult<Vec<Value>> {
        Ok(self.client.query_object_store(store_id, query, None).await?)
    }

    // ===== Onboarding =====

    /// Feed one event to the onboarding flow and carry out its effects.
    ///
    /// Remote calls are issued and left in flight; their completions come back
    /// through [`Self::next_response`]. Returns the rebuilt store list when the
    /// flow just created a store. A failed list refresh after a successful
    /// save is logged and yields `None`.
    pub async fn onboard(&mut self, event: OnboardingEvent) -> CoreResult<Option<StoresView>> {
        let effects = self.onboarding.dispatch(event)?;

        let mut refreshed = None;
        for effect in effects {
            match effect {
                Effect::Remote(call) => {
                    log::debug!("Issuing onboarding call {:?}", call.ticket());
                    self.in_flight
                        .push(call.perform(self.client.clone()).boxed());
                }
                // 存储已保存，刷新失败不影响结果
                Effect::RefreshStores => match self.refresh_stores().await {
                    Ok(view) => refreshed = Some(view),
                    Err(e) => {
                        log::warn!("Object store saved, but the store list could not be refreshed: {e}");
                    }
                },
            }
        }
        Ok(refreshed)
    }

    pub fn has_pending_responses(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Wait for the next onboarding call to resolve and apply it.
    ///
    /// `None` when nothing is in flight. Responses the flow no longer waits
    /// for (after a cancel or a newer selection) are applied as no-ops.
    pub async fn next_response(&mut self) -> Option<CoreResult<Option<StoresView>>> {
        let event = self.in_flight.next().await?;
        Some(self.onboard(event).await)
    }
}
