use super::types::{validate_event_kinds, EventKind, FilterEvent};
use ferrous_filters_domain::DomainError;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error};

type Handler = Arc<dyn Fn(&FilterEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Synchronous publish/subscribe mediator.
///
/// Handlers run on the publishing thread in registration order. A panicking
/// handler is logged and skipped; the remaining handlers still run.
pub struct EventBus {
    handlers: RwLock<BTreeMap<u64, Handler>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Result<Self, DomainError> {
        validate_event_kinds(&EventKind::ALL)?;
        Ok(Self {
            handlers: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&FilterEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(handler));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id.0)
            .is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn publish(&self, event: FilterEvent) {
        // Snapshot so handlers may subscribe or unsubscribe while being called.
        let handlers: Vec<(u64, Handler)> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, h)| (*id, Arc::clone(h)))
            .collect();

        let kind = event.kind();
        debug!(event = kind.as_str(), subscribers = handlers.len(), "Publishing event");

        for (id, handler) in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                error!(
                    event = kind.as_str(),
                    subscription = id,
                    "Event handler panicked"
                );
            }
        }
    }
}
