// Copyright 2025 Cowboy AI, LLC.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value as Json};

use super::store::{InMemoryStateStore, StateRecord, StateStore, StateTransaction};
use super::{EntityRef, StateEnum, StateEvent};
use crate::errors::{DomainError, DomainResult};
use crate::events::{EventPublisher, Notification, NullEventPublisher};
use crate::support::dot;

/// Hooks run inside a transition's unit of work
#[async_trait]
pub trait FlowHandler<S: StateEnum>: Send + Sync {
    /// Called with the state being left and the transition's extra data, before the write
    async fn on_exit(&self, _state: &S, _data: &Map<String, Json>, _owner: &EntityRef) -> DomainResult<()> {
        Ok(())
    }

    /// Called with the state being entered and the transition's extra data, after the write is staged
    async fn on_enter(&self, _state: &S, _data: &Map<String, Json>, _owner: &EntityRef) -> DomainResult<()> {
        Ok(())
    }
}

/// Store and publisher shared by every state manager
#[derive(Clone)]
pub struct StateServices {
    store: Arc<dyn StateStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl std::fmt::Debug for StateServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateServices").finish_non_exhaustive()
    }
}

impl StateServices {
    /// Services over `store`, announcing through `publisher`
    pub fn new(store: Arc<dyn StateStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// In-memory store, notifications dropped
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStateStore::new()), Arc::new(NullEventPublisher))
    }

    /// The record store
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// The notification sink
    pub fn publisher(&self) -> &Arc<dyn EventPublisher> {
        &self.publisher
    }

    /// Manager for `owner` with states of type `S`
    pub fn manager<S: StateEnum>(&self, owner: EntityRef) -> StateManager<S> {
        StateManager::new(owner, self.clone())
    }
}

/// State of one entity
///
/// Data operations lazily create the record on first write. Transitions run
/// exit hook, write, enter hook and commit as one unit of work; the
/// `StateChanged` notification is published after commit, and any failure
/// publishes `TransitionFailed` before it is returned.
pub struct StateManager<S: StateEnum> {
    owner: EntityRef,
    services: StateServices,
    flow: Option<Arc<dyn FlowHandler<S>>>,
    _state: PhantomData<fn() -> S>,
}

impl<S: StateEnum> std::fmt::Debug for StateManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("owner", &self.owner)
            .field("state", &S::NAME)
            .field("flow", &self.flow.is_some())
            .finish()
    }
}

impl<S: StateEnum> StateManager<S> {
    /// Manager for `owner`
    pub fn new(owner: EntityRef, services: StateServices) -> Self {
        Self {
            owner,
            services,
            flow: None,
            _state: PhantomData,
        }
    }

    /// Attach a flow handler
    pub fn use_flow(mut self, flow: Arc<dyn FlowHandler<S>>) -> Self {
        self.flow = Some(flow);
        self
    }

    /// Owning entity
    pub fn owner(&self) -> &EntityRef {
        &self.owner
    }

    async fn record(&self) -> DomainResult<Option<StateRecord>> {
        self.services.store.load(&self.owner).await
    }

    async fn record_or_new(&self) -> DomainResult<StateRecord> {
        Ok(self
            .record()
            .await?
            .unwrap_or_else(|| StateRecord::new(self.owner.clone())))
    }

    async fn write(&self, mut record: StateRecord) -> DomainResult<()> {
        record.touch();
        self.services.store.save(record).await
    }

    /// Write `value` at the dot path `key`
    pub async fn set(&self, key: &str, value: impl Into<Json> + Send) -> DomainResult<()> {
        let mut record = self.record_or_new().await?;
        dot::set_in(&mut record.data, key, value.into());
        self.write(record).await
    }

    /// Value at `key`, or `default`
    pub async fn get(&self, key: &str, default: Json) -> DomainResult<Json> {
        Ok(self
            .record()
            .await?
            .and_then(|record| dot::get_in(&record.data, key).cloned())
            .unwrap_or(default))
    }

    /// Whether `key` holds a non-null value
    pub async fn has(&self, key: &str) -> DomainResult<bool> {
        Ok(self.record().await?.is_some_and(|record| {
            dot::get_in(&record.data, key).is_some_and(|value| !value.is_null())
        }))
    }

    /// Remove `key`; true when something was removed
    pub async fn forget(&self, key: &str) -> DomainResult<bool> {
        let Some(mut record) = self.record().await? else {
            return Ok(false);
        };
        if dot::forget_in(&mut record.data, key).is_none() {
            return Ok(false);
        }
        self.write(record).await?;
        Ok(true)
    }

    /// The whole data blob
    pub async fn all(&self) -> DomainResult<Map<String, Json>> {
        Ok(self.record().await?.map(|record| record.data).unwrap_or_default())
    }

    /// Empty the data blob, keeping the current state
    pub async fn clear(&self) -> DomainResult<()> {
        if let Some(mut record) = self.record().await? {
            record.data.clear();
            self.write(record).await?;
        }
        Ok(())
    }

    /// Decoded current state
    pub async fn current(&self) -> DomainResult<Option<S>> {
        Ok(self
            .record()
            .await?
            .and_then(|record| record.current_state)
            .and_then(|stored| S::decode(&stored)))
    }

    /// Whether the current state is `state`
    pub async fn is(&self, state: &S) -> DomainResult<bool> {
        Ok(self.current().await?.as_ref() == Some(state))
    }

    /// Whether the current state is any of `states`
    pub async fn in_any(&self, states: &[S]) -> DomainResult<bool> {
        Ok(self
            .current()
            .await?
            .is_some_and(|current| states.contains(&current)))
    }

    /// Clear current state and data, keeping the record
    pub async fn reset(&self) -> DomainResult<()> {
        if let Some(mut record) = self.record().await? {
            record.current_state = None;
            record.data.clear();
            self.write(record).await?;
        }
        Ok(())
    }

    /// Remove the record; true when one existed
    pub async fn delete(&self) -> DomainResult<bool> {
        self.services.store.delete(&self.owner).await
    }

    /// Move to `target`, merging `extra` into the data blob at top level
    pub async fn transition_to(&self, target: S, extra: Map<String, Json>) -> DomainResult<()> {
        let current = self.current().await?;
        let from = current.as_ref().map(StateEnum::encode);
        let to = target.encode();

        if let Some(current) = &current {
            if !current.can_transition_to(&target) {
                let error = DomainError::InvalidStateTransition {
                    from: current.name().to_string(),
                    to: target.name().to_string(),
                };
                self.transition_failed(from, to, &error);
                return Err(error);
            }
        }

        match self.apply(current.as_ref(), &target, &extra).await {
            Ok(()) => {
                tracing::debug!(owner = %self.owner, ?from, %to, "state changed");
                self.publish(StateEvent::StateChanged {
                    owner: self.owner.clone(),
                    from,
                    to,
                    data: extra,
                });
                Ok(())
            }
            Err(error) => {
                self.transition_failed(from, to, &error);
                Err(error)
            }
        }
    }

    async fn apply(
        &self,
        current: Option<&S>,
        target: &S,
        extra: &Map<String, Json>,
    ) -> DomainResult<()> {
        let mut tx = self.services.store.begin().await?;
        match self.stage(tx.as_mut(), current, target, extra).await {
            Ok(()) => tx.commit().await,
            Err(error) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(owner = %self.owner, %rollback, "state rollback failed");
                }
                Err(error)
            }
        }
    }

    async fn stage(
        &self,
        tx: &mut dyn StateTransaction,
        current: Option<&S>,
        target: &S,
        extra: &Map<String, Json>,
    ) -> DomainResult<()> {
        let mut record = tx
            .load(&self.owner)
            .await?
            .unwrap_or_else(|| StateRecord::new(self.owner.clone()));

        if let (Some(flow), Some(current)) = (&self.flow, current) {
            flow.on_exit(current, extra, &self.owner).await?;
        }

        record.current_state = Some(target.encode());
        record
            .data
            .extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
        record.touch();
        tx.save(record).await?;

        if let Some(flow) = &self.flow {
            flow.on_enter(target, extra, &self.owner).await?;
        }
        Ok(())
    }

    fn transition_failed(&self, from: Option<String>, to: String, error: &DomainError) {
        tracing::warn!(owner = %self.owner, ?from, %to, %error, "transition failed");
        self.publish(StateEvent::TransitionFailed {
            owner: self.owner.clone(),
            from,
            to,
            error: error.clone(),
        });
    }

    fn publish(&self, event: StateEvent) {
        if let Err(error) = self.services.publisher.publish(Notification::State(event)) {
            tracing::warn!(owner = %self.owner, %error, "notification dropped");
        }
    }
}

/// An entity owning a state record
#[async_trait]
pub trait Stateful: Send + Sync {
    /// State enumeration of the entity
    type State: StateEnum;

    /// Reference identifying the entity's record
    fn state_owner(&self) -> EntityRef;

    /// State manager for this entity
    fn state(&self, services: &StateServices) -> StateManager<Self::State> {
        services.manager(self.state_owner())
    }

    /// Remove the state record alongside the entity
    async fn delete_state(&self, services: &StateServices) -> DomainResult<bool> {
        services.store().delete(&self.state_owner()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::enumeration::Enumeration;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum Door {
        Open,
        Closed,
    }

    impl Enumeration for Door {
        const NAME: &'static str = "Door";

        fn cases() -> Vec<Self> {
            vec![Door::Open, Door::Closed]
        }

        fn name(&self) -> &'static str {
            match self {
                Door::Open => "Open",
                Door::Closed => "Closed",
            }
        }
    }

    impl StateEnum for Door {}

    #[tokio::test]
    async fn test_data_operations_create_record_lazily() {
        let services = StateServices::in_memory();
        let state: StateManager<Door> = services.manager(EntityRef::new("House", "1"));

        assert!(!state.has("color").await.unwrap());
        assert_eq!(state.get("color", json!("none")).await.unwrap(), json!("none"));

        state.set("paint.color", "red").await.unwrap();
        assert!(state.has("paint.color").await.unwrap());
        assert_eq!(state.all().await.unwrap(), json!({"paint": {"color": "red"}}).as_object().cloned().unwrap());

        assert!(state.forget("paint.color").await.unwrap());
        assert!(!state.forget("paint.color").await.unwrap());

        state.clear().await.unwrap();
        assert!(state.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_null_values_do_not_count_as_present() {
        let services = StateServices::in_memory();
        let state: StateManager<Door> = services.manager(EntityRef::new("House", "2"));

        state.set("key", Json::Null).await.unwrap();
        state.set("lock.code", Json::Null).await.unwrap();

        assert!(!state.has("key").await.unwrap());
        assert!(!state.has("lock.code").await.unwrap());
        assert_eq!(state.get("key", json!("fallback")).await.unwrap(), Json::Null);
        assert!(state.all().await.unwrap().contains_key("key"));

        state.set("key", false).await.unwrap();
        assert!(state.has("key").await.unwrap());
    }

    #[tokio::test]
    async fn test_unrestricted_transitions_and_reset() {
        let services = StateServices::in_memory();
        let state: StateManager<Door> = services.manager(EntityRef::new("House", "1"));

        assert_eq!(state.current().await.unwrap(), None);
        state.transition_to(Door::Open, Map::new()).await.unwrap();
        state.transition_to(Door::Closed, Map::new()).await.unwrap();
        assert!(state.is(&Door::Closed).await.unwrap());
        assert!(state.in_any(&[Door::Open, Door::Closed]).await.unwrap());

        state.reset().await.unwrap();
        assert_eq!(state.current().await.unwrap(), None);
        assert!(state.delete().await.unwrap());
    }
}
