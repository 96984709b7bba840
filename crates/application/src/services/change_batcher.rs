use crate::events::{EventBus, FilterEvent, SubscriptionId};
use crate::ports::{FilterStateRepository, FilterStateSnapshot, RuleStorage};
use crate::services::rule_aggregator::RuleAggregator;
use ferrous_filters_domain::{DomainError, FilterId, GroupId, USER_FILTER_ID};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// One mutation waiting for the end of the debounce window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    AddRules {
        filter_id: FilterId,
        rules: Vec<String>,
    },
    RemoveRule {
        filter_id: FilterId,
        rule: String,
    },
    ReplaceRules {
        filter_id: FilterId,
        rules: Vec<String>,
    },
    EnableDisable {
        filter_id: FilterId,
        snapshot: FilterStateSnapshot,
    },
    GroupEnableDisable {
        group_id: GroupId,
        enabled: bool,
    },
    MetadataOnly {
        filter_id: FilterId,
    },
}

impl PendingChange {
    pub fn from_event(event: &FilterEvent) -> Option<Self> {
        match event {
            FilterEvent::RulesAdded { filter_id, rules } => Some(PendingChange::AddRules {
                filter_id: *filter_id,
                rules: rules.clone(),
            }),
            FilterEvent::RuleRemoved { filter_id, rule } => Some(PendingChange::RemoveRule {
                filter_id: *filter_id,
                rule: rule.clone(),
            }),
            FilterEvent::FilterRulesReplaced { filter_id, rules } => {
                Some(PendingChange::ReplaceRules {
                    filter_id: *filter_id,
                    rules: rules.clone(),
                })
            }
            FilterEvent::FilterEnabledChanged { filter }
            | FilterEvent::FilterAddedRemoved { filter } => Some(PendingChange::EnableDisable {
                filter_id: filter.id,
                snapshot: FilterStateSnapshot {
                    state: filter.state,
                    lifecycle: filter.lifecycle,
                },
            }),
            FilterEvent::GroupEnabledChanged { group } => {
                Some(PendingChange::GroupEnableDisable {
                    group_id: group.group_id,
                    enabled: group.is_enabled(),
                })
            }
            FilterEvent::FilterMetadataUpdated { filter_id } => {
                Some(PendingChange::MetadataOnly {
                    filter_id: *filter_id,
                })
            }
            FilterEvent::FilterDownloadStarted { .. }
            | FilterEvent::FilterDownloadSucceeded { .. }
            | FilterEvent::FilterDownloadFailed { .. }
            | FilterEvent::UserRulesUpdated
            | FilterEvent::RulesUpdated
            | FilterEvent::ActiveSetRebuilt { .. }
            | FilterEvent::UpdateCheckStarted { .. }
            | FilterEvent::UpdateCheckSucceeded { .. }
            | FilterEvent::UpdateCheckFailed { .. } => None,
        }
    }

    pub fn filter_id(&self) -> Option<FilterId> {
        match self {
            PendingChange::AddRules { filter_id, .. }
            | PendingChange::RemoveRule { filter_id, .. }
            | PendingChange::ReplaceRules { filter_id, .. }
            | PendingChange::EnableDisable { filter_id, .. }
            | PendingChange::MetadataOnly { filter_id } => Some(*filter_id),
            PendingChange::GroupEnableDisable { .. } => None,
        }
    }

    pub fn touches_rules(&self) -> bool {
        matches!(
            self,
            PendingChange::AddRules { .. }
                | PendingChange::RemoveRule { .. }
                | PendingChange::ReplaceRules { .. }
        )
    }

    /// Everything except a state-only metadata update changes what the
    /// active set should contain.
    pub fn forces_rebuild(&self) -> bool {
        !matches!(self, PendingChange::MetadataOnly { .. })
    }
}

/// Replays rule changes, in order, over the last persisted rule text.
///
/// Add appends, remove deletes every occurrence of the exact line, replace
/// discards everything before it. Non-rule changes are ignored.
pub fn replay_rule_changes<'a, I>(base: Vec<String>, changes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a PendingChange>,
{
    changes.into_iter().fold(base, |mut rules, change| {
        match change {
            PendingChange::AddRules { rules: added, .. } => rules.extend(added.iter().cloned()),
            PendingChange::RemoveRule { rule, .. } => rules.retain(|r| r != rule),
            PendingChange::ReplaceRules {
                rules: replacement,
                ..
            } => rules = replacement.clone(),
            PendingChange::EnableDisable { .. }
            | PendingChange::GroupEnableDisable { .. }
            | PendingChange::MetadataOnly { .. } => {}
        }
        rules
    })
}

struct BatchWorker {
    bus: Arc<EventBus>,
    storage: Arc<dyn RuleStorage>,
    state_repo: Arc<dyn FilterStateRepository>,
    aggregator: Arc<RuleAggregator>,
}

impl BatchWorker {
    async fn run(
        self,
        mut receiver: mpsc::UnboundedReceiver<PendingChange>,
        window: Duration,
        cancel: CancellationToken,
    ) {
        let mut pending: Vec<PendingChange> = Vec::new();
        let deadline = tokio::time::sleep(window);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    while let Ok(change) = receiver.try_recv() {
                        pending.push(change);
                    }
                    if !pending.is_empty() {
                        info!(pending = pending.len(), "Flushing pending changes before shutdown");
                        self.process(mem::take(&mut pending)).await;
                    }
                    break;
                }

                received = receiver.recv() => match received {
                    Some(change) => {
                        pending.push(change);
                        deadline.as_mut().reset(Instant::now() + window);
                    }
                    None => {
                        if !pending.is_empty() {
                            self.process(mem::take(&mut pending)).await;
                        }
                        break;
                    }
                },

                _ = &mut deadline, if !pending.is_empty() => {
                    let batch = mem::take(&mut pending);
                    self.process(batch).await;
                }
            }
        }

        info!("Change batcher stopped");
    }

    async fn process(&self, batch: Vec<PendingChange>) {
        let total = batch.len();
        let needs_rebuild = batch.iter().any(PendingChange::forces_rebuild);

        let mut by_filter: BTreeMap<FilterId, Vec<PendingChange>> = BTreeMap::new();
        let mut groups: BTreeMap<GroupId, bool> = BTreeMap::new();
        for change in batch {
            match change {
                PendingChange::GroupEnableDisable { group_id, enabled } => {
                    groups.insert(group_id, enabled);
                }
                other => {
                    if let Some(filter_id) = other.filter_id() {
                        by_filter.entry(filter_id).or_default().push(other);
                    }
                }
            }
        }

        let rule_writes = by_filter
            .iter()
            .filter(|(_, changes)| changes.iter().any(PendingChange::touches_rules))
            .map(|(filter_id, changes)| async move {
                (*filter_id, self.persist_rules(*filter_id, changes).await)
            });

        let state_writes = by_filter
            .iter()
            .filter_map(|(filter_id, changes)| {
                changes.iter().rev().find_map(|change| match change {
                    PendingChange::EnableDisable { snapshot, .. } => Some((*filter_id, *snapshot)),
                    _ => None,
                })
            })
            .map(|(filter_id, snapshot)| async move {
                (filter_id, self.state_repo.save_state(filter_id, snapshot).await)
            });

        let group_writes = groups.iter().map(|(group_id, enabled)| async move {
            (
                *group_id,
                self.state_repo.save_group_state(*group_id, *enabled).await,
            )
        });

        let (rule_results, state_results, group_results) = futures::join!(
            join_all(rule_writes),
            join_all(state_writes),
            join_all(group_writes)
        );

        let mut user_rules_saved = false;
        for (filter_id, result) in &rule_results {
            match result {
                Ok(()) => user_rules_saved |= *filter_id == USER_FILTER_ID,
                Err(e) => error!(filter_id, error = %e, "Failed to persist filter rules"),
            }
        }
        for (filter_id, result) in &state_results {
            if let Err(e) = result {
                error!(filter_id, error = %e, "Failed to persist filter state");
            }
        }
        for (group_id, result) in &group_results {
            if let Err(e) = result {
                error!(group_id, error = %e, "Failed to persist group state");
            }
        }

        debug!(
            changes = total,
            filters = by_filter.len(),
            rule_writes = rule_results.len(),
            state_writes = state_results.len() + group_results.len(),
            needs_rebuild,
            "Processed change batch"
        );

        if user_rules_saved {
            self.bus.publish(FilterEvent::UserRulesUpdated);
        }

        if needs_rebuild {
            if let Err(e) = self.aggregator.rebuild().await {
                error!(error = %e, "Active rule set rebuild failed");
            }
        } else {
            self.bus.publish(FilterEvent::RulesUpdated);
        }
    }

    async fn persist_rules(
        &self,
        filter_id: FilterId,
        changes: &[PendingChange],
    ) -> Result<(), DomainError> {
        let starts_with_replace = matches!(
            changes.iter().find(|c| c.touches_rules()),
            Some(PendingChange::ReplaceRules { .. })
        );
        let base = if starts_with_replace {
            Vec::new()
        } else {
            self.storage.read(filter_id).await?.unwrap_or_default()
        };

        let rules = replay_rule_changes(base, changes);
        self.storage.write(filter_id, &rules).await?;
        debug!(filter_id, rules = rules.len(), "Persisted filter rules");
        Ok(())
    }
}

/// Debounces bus mutations into one persistence flush and at most one
/// rebuild per window.
///
/// The pending queue is owned by a single task; the bus subscription only
/// forwards changes over a channel.
pub struct ChangeBatcher {
    bus: Arc<EventBus>,
    subscription: SubscriptionId,
    sender: mpsc::UnboundedSender<PendingChange>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ChangeBatcher {
    pub fn spawn(
        bus: Arc<EventBus>,
        storage: Arc<dyn RuleStorage>,
        state_repo: Arc<dyn FilterStateRepository>,
        aggregator: Arc<RuleAggregator>,
        window: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let forward = sender.clone();
        let subscription = bus.subscribe(move |event| {
            if let Some(change) = PendingChange::from_event(event) {
                if forward.send(change).is_err() {
                    warn!(event = event.kind().as_str(), "Change batcher stopped, dropping event");
                }
            }
        });

        let worker = BatchWorker {
            bus: Arc::clone(&bus),
            storage,
            state_repo,
            aggregator,
        };
        let handle = tokio::spawn(worker.run(receiver, window, cancel.clone()));

        info!(window_ms = window.as_millis() as u64, "Change batcher started");

        Self {
            bus,
            subscription,
            sender,
            cancel,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Queues a change without going through the bus.
    pub fn submit(&self, change: PendingChange) -> Result<(), DomainError> {
        self.sender
            .send(change)
            .map_err(|_| DomainError::BatcherStopped)
    }

    /// Stops listening, processes whatever is pending and waits for the task.
    pub async fn shutdown(&self) {
        self.bus.unsubscribe(self.subscription);
        self.cancel.cancel();
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Change batcher task failed");
            }
        }
    }
}
