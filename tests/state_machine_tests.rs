// Copyright 2025 Cowboy AI, LLC.

//! Guarded transitions, flow hooks and failure handling of state records

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cim_pragmatic::errors::{DomainError, DomainResult};
use cim_pragmatic::events::InMemoryEventPublisher;
use cim_pragmatic::state_machine::{
    EntityRef, FlowHandler, InMemoryStateStore, StateEnum, StateEvent, StateManager, StateRecord,
    StateServices, StateStore, StateTransaction, Stateful,
};
use cim_pragmatic::support::Enumeration;
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value as Json};
use test_case::test_case;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Order {
    Pending,
    Paid,
    Shipped,
    Cancelled,
}

impl Enumeration for Order {
    const NAME: &'static str = "Order";

    fn cases() -> Vec<Self> {
        vec![Order::Pending, Order::Paid, Order::Shipped, Order::Cancelled]
    }

    fn name(&self) -> &'static str {
        match self {
            Order::Pending => "Pending",
            Order::Paid => "Paid",
            Order::Shipped => "Shipped",
            Order::Cancelled => "Cancelled",
        }
    }
}

impl StateEnum for Order {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (Order::Pending, Order::Paid)
                | (Order::Pending, Order::Cancelled)
                | (Order::Paid, Order::Shipped)
                | (Order::Paid, Order::Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Review {
    Draft,
}

impl Enumeration for Review {
    const NAME: &'static str = "Review";

    fn cases() -> Vec<Self> {
        vec![Review::Draft]
    }

    fn name(&self) -> &'static str {
        "Draft"
    }
}

impl StateEnum for Review {}

fn extra(value: Json) -> Map<String, Json> {
    value.as_object().cloned().unwrap_or_default()
}

fn recorded() -> (StateServices, Arc<InMemoryEventPublisher>) {
    let publisher = Arc::new(InMemoryEventPublisher::new());
    let services = StateServices::new(Arc::new(InMemoryStateStore::new()), publisher.clone());
    (services, publisher)
}

fn order(services: &StateServices) -> StateManager<Order> {
    services.manager(EntityRef::new("Invoice", "42"))
}

#[test_case(Order::Paid, true ; "pending to paid")]
#[test_case(Order::Cancelled, true ; "pending to cancelled")]
#[test_case(Order::Shipped, false ; "pending to shipped")]
#[test_case(Order::Pending, false ; "pending to pending")]
fn test_order_guard(target: Order, allowed: bool) {
    assert_eq!(Order::Pending.can_transition_to(&target), allowed);
}

#[tokio::test]
async fn test_first_transition_is_unguarded() {
    let (services, publisher) = recorded();
    let state = order(&services);

    state.transition_to(Order::Shipped, Map::new()).await.unwrap();

    assert_eq!(state.current().await.unwrap(), Some(Order::Shipped));
    assert_eq!(publisher.names(), vec!["StateChanged"]);
}

#[tokio::test]
async fn test_rejected_transition_publishes_failure() {
    let (services, publisher) = recorded();
    let state = order(&services);
    state.transition_to(Order::Pending, Map::new()).await.unwrap();

    let err = state.transition_to(Order::Shipped, Map::new()).await.unwrap_err();

    assert!(matches!(
        &err,
        DomainError::InvalidStateTransition { from, to } if from == "Pending" && to == "Shipped"
    ));
    assert_eq!(err.to_string(), "Invalid state transition from Pending to Shipped");
    assert_eq!(state.current().await.unwrap(), Some(Order::Pending));

    let events = publisher.state_events();
    assert_eq!(events.len(), 2);
    match &events[1] {
        StateEvent::TransitionFailed { owner, from, to, .. } => {
            assert_eq!(owner.to_string(), "Invoice#42");
            assert_eq!(from.as_deref(), Some("Order@Pending"));
            assert_eq!(to, "Order@Shipped");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_extra_data_merges_at_top_level() {
    let (services, publisher) = recorded();
    let state = order(&services);
    state.set("customer.name", "Ada").await.unwrap();
    state
        .transition_to(Order::Pending, extra(json!({"total": 10})))
        .await
        .unwrap();

    state
        .transition_to(Order::Paid, extra(json!({"total": 12, "receipt": "r-1"})))
        .await
        .unwrap();

    assert_eq!(
        Json::Object(state.all().await.unwrap()),
        json!({"customer": {"name": "Ada"}, "total": 12, "receipt": "r-1"})
    );
    match publisher.state_events().last() {
        Some(StateEvent::StateChanged { from, to, data, .. }) => {
            assert_eq!(from.as_deref(), Some("Order@Pending"));
            assert_eq!(to, "Order@Paid");
            assert_eq!(data, &extra(json!({"total": 12, "receipt": "r-1"})));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_stored_state_of_another_type_reads_as_none() {
    let services = StateServices::in_memory();
    let owner = EntityRef::new("Invoice", "42");
    services
        .manager::<Review>(owner.clone())
        .transition_to(Review::Draft, Map::new())
        .await
        .unwrap();

    let state: StateManager<Order> = services.manager(owner);
    assert_eq!(state.current().await.unwrap(), None);
    assert!(!state.is(&Order::Pending).await.unwrap());
    assert!(!state.in_any(&Order::cases()).await.unwrap());
}

#[derive(Default)]
struct Audit {
    log: Mutex<Vec<String>>,
    fail_enter: bool,
}

impl Audit {
    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl FlowHandler<Order> for Audit {
    async fn on_exit(&self, state: &Order, data: &Map<String, Json>, owner: &EntityRef) -> DomainResult<()> {
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        self.log
            .lock()
            .unwrap()
            .push(format!("exit:{}:{owner}:{}", state.name(), keys.join(",")));
        Ok(())
    }

    async fn on_enter(&self, state: &Order, data: &Map<String, Json>, _owner: &EntityRef) -> DomainResult<()> {
        let total = data.get("total").cloned().unwrap_or(Json::Null);
        self.log.lock().unwrap().push(format!("enter:{}:{total}", state.name()));
        if self.fail_enter {
            return Err(DomainError::validation("payment provider rejected"));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_flow_hooks_run_around_the_write() {
    let (services, _) = recorded();
    let audit = Arc::new(Audit::default());
    let state = order(&services).use_flow(audit.clone());

    state
        .transition_to(Order::Pending, extra(json!({"total": 5})))
        .await
        .unwrap();
    state
        .transition_to(Order::Paid, extra(json!({"receipt": "r-9"})))
        .await
        .unwrap();

    assert_eq!(
        audit.entries(),
        vec!["enter:Pending:5", "exit:Pending:Invoice#42:receipt", "enter:Paid:null"]
    );
    assert_eq!(state.get("total", Json::Null).await.unwrap(), json!(5));
}

#[tokio::test]
async fn test_hooks_and_notification_see_only_the_transition_data() {
    let (services, publisher) = recorded();
    let audit = Arc::new(Audit::default());
    let state = order(&services).use_flow(audit.clone());
    state.set("secret", "keep").await.unwrap();
    state.set("total", 30).await.unwrap();

    state
        .transition_to(Order::Pending, extra(json!({"by": "ada"})))
        .await
        .unwrap();

    assert_eq!(audit.entries(), vec!["enter:Pending:null"]);
    match publisher.state_events().last() {
        Some(StateEvent::StateChanged { data, .. }) => {
            assert_eq!(data, &extra(json!({"by": "ada"})));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(
        Json::Object(state.all().await.unwrap()),
        json!({"secret": "keep", "total": 30, "by": "ada"})
    );
}

#[tokio::test]
async fn test_failing_enter_hook_rolls_back() {
    let (services, publisher) = recorded();
    order(&services)
        .transition_to(Order::Pending, Map::new())
        .await
        .unwrap();
    let audit = Arc::new(Audit {
        fail_enter: true,
        ..Default::default()
    });
    let state = order(&services).use_flow(audit);

    let err = state
        .transition_to(Order::Paid, extra(json!({"total": 9})))
        .await
        .unwrap_err();

    assert!(err.is_validation_error());
    assert_eq!(state.current().await.unwrap(), Some(Order::Pending));
    assert!(!state.has("total").await.unwrap());
    assert_eq!(publisher.names(), vec!["StateChanged", "TransitionFailed"]);
}

/// Store whose transactions can fail on save or on commit
struct FlakyStore {
    inner: InMemoryStateStore,
    fail_save: bool,
    fail_commit: bool,
}

impl FlakyStore {
    fn new(fail_save: bool, fail_commit: bool) -> Self {
        Self {
            inner: InMemoryStateStore::new(),
            fail_save,
            fail_commit,
        }
    }
}

#[async_trait]
impl StateStore for FlakyStore {
    async fn load(&self, owner: &EntityRef) -> DomainResult<Option<StateRecord>> {
        self.inner.load(owner).await
    }

    async fn save(&self, record: StateRecord) -> DomainResult<()> {
        self.inner.save(record).await
    }

    async fn delete(&self, owner: &EntityRef) -> DomainResult<bool> {
        self.inner.delete(owner).await
    }

    async fn begin(&self) -> DomainResult<Box<dyn StateTransaction>> {
        Ok(Box::new(FlakyTransaction {
            inner: self.inner.begin().await?,
            fail_save: self.fail_save,
            fail_commit: self.fail_commit,
        }))
    }
}

struct FlakyTransaction {
    inner: Box<dyn StateTransaction>,
    fail_save: bool,
    fail_commit: bool,
}

#[async_trait]
impl StateTransaction for FlakyTransaction {
    async fn load(&mut self, owner: &EntityRef) -> DomainResult<Option<StateRecord>> {
        self.inner.load(owner).await
    }

    async fn save(&mut self, record: StateRecord) -> DomainResult<()> {
        if self.fail_save {
            return Err(DomainError::InternalError("disk full".into()));
        }
        self.inner.save(record).await
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        if self.fail_commit {
            self.inner.rollback().await?;
            return Err(DomainError::InternalError("commit lost".into()));
        }
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        self.inner.rollback().await
    }
}

#[test_case(true, false, "Internal error: disk full" ; "save fails")]
#[test_case(false, true, "Internal error: commit lost" ; "commit fails")]
#[tokio::test]
async fn test_store_failures_never_announce_a_change(fail_save: bool, fail_commit: bool, message: &str) {
    let publisher = Arc::new(InMemoryEventPublisher::new());
    let services = StateServices::new(
        Arc::new(FlakyStore::new(fail_save, fail_commit)),
        publisher.clone(),
    );
    let audit = Arc::new(Audit::default());
    let state = order(&services).use_flow(audit.clone());

    let err = state
        .transition_to(Order::Pending, Map::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), message);
    assert_eq!(state.current().await.unwrap(), None);
    assert_eq!(publisher.names(), vec!["TransitionFailed"]);
    if fail_save {
        assert!(audit.entries().is_empty());
    } else {
        assert_eq!(audit.entries(), vec!["enter:Pending:null"]);
    }
}

struct Invoice {
    number: u32,
}

impl Stateful for Invoice {
    type State = Order;

    fn state_owner(&self) -> EntityRef {
        EntityRef::new("Invoice", self.number.to_string())
    }
}

#[tokio::test]
async fn test_stateful_entities_share_records_by_owner() {
    let services = StateServices::in_memory();
    let invoice = Invoice { number: 42 };

    invoice
        .state(&services)
        .transition_to(Order::Pending, Map::new())
        .await
        .unwrap();
    assert!(order(&services).is(&Order::Pending).await.unwrap());
    assert!(!Invoice { number: 7 }.state(&services).has("total").await.unwrap());

    assert!(invoice.delete_state(&services).await.unwrap());
    assert!(!invoice.delete_state(&services).await.unwrap());
    assert_eq!(invoice.state(&services).current().await.unwrap(), None);
}
