//! In-process report store
//!
//! Backs the CLI and tests. Supports fault injection (failed lists, failed
//! subscribes, broken channels) and exposes call counters so callers can
//! check how often the store was hit.

use crate::error::{LiveError, LiveResult};
use crate::model::{BaseReport, Category, CategoryDetails, RawReport, ReportEntity};
use crate::store::{
    ChangeEvent, ChangeKind, ChannelEvent, Collection, ReportStore, Subscription,
    SubscriptionGuard,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Report store held in memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    list_calls: AtomicUsize,
    subscribe_attempts: AtomicUsize,
    releases: AtomicUsize,
}

#[derive(Default)]
struct State {
    reports: BTreeMap<i64, BaseReport>,
    details: HashMap<i64, CategoryDetails>,
    subscribers: Vec<Subscriber>,
    next_subscriber: u64,
    failing_lists: u32,
    failing_subscribes: u32,
    list_delay: Duration,
}

struct Subscriber {
    id: u64,
    channel: String,
    collections: Vec<Collection>,
    tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn broadcast(&mut self, event: ChangeEvent) {
        self.subscribers.retain(|sub| {
            !sub.collections.contains(&event.collection)
                || sub.tx.send(ChannelEvent::Change(event)).is_ok()
        });
    }

    fn next_id(&self) -> i64 {
        self.reports.keys().next_back().map_or(1, |last| last + 1)
    }

    fn upsert(&mut self, report: RawReport) {
        let id = report.base.id;
        let kind = if self.reports.contains_key(&id) {
            ChangeKind::Updated
        } else {
            ChangeKind::Inserted
        };
        let category = report.base.category;
        self.reports.insert(id, report.base);
        self.broadcast(ChangeEvent::new(Collection::Reports, kind));

        if let Some(details) = report.details {
            self.details.insert(id, details);
            self.broadcast(ChangeEvent::new(Collection::details_for(category), kind));
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `reports`; seeding sends no notifications
    pub fn with_reports(reports: impl IntoIterator<Item = RawReport>) -> Self {
        let store = Self::new();
        {
            let mut state = store.shared.state();
            for report in reports {
                if let Some(details) = report.details {
                    state.details.insert(report.base.id, details);
                }
                state.reports.insert(report.base.id, report.base);
            }
        }
        store
    }

    /// Insert or replace a report and notify subscribers
    pub fn insert(&self, report: RawReport) {
        self.shared.state().upsert(report);
    }

    /// Create a report with the next free id; returns that id
    pub fn create(&self, category: Category, description: &str, location: &str) -> i64 {
        let mut state = self.shared.state();
        let id = state.next_id();
        state.upsert(RawReport {
            base: BaseReport {
                id,
                category,
                description: description.to_string(),
                location: location.to_string(),
                created_at: Utc::now(),
            },
            details: None,
        });
        id
    }

    /// Move a report; returns false when it does not exist
    pub fn update_location(&self, id: i64, location: &str) -> bool {
        let mut state = self.shared.state();
        let Some(report) = state.reports.get_mut(&id) else {
            return false;
        };
        report.location = location.to_string();
        state.broadcast(ChangeEvent::new(Collection::Reports, ChangeKind::Updated));
        true
    }

    /// Delete a report and its details; returns false when it does not exist
    pub fn remove(&self, id: i64) -> bool {
        let mut state = self.shared.state();
        let Some(report) = state.reports.remove(&id) else {
            return false;
        };
        state.broadcast(ChangeEvent::new(Collection::Reports, ChangeKind::Deleted));
        if state.details.remove(&id).is_some() {
            state.broadcast(ChangeEvent::new(
                Collection::details_for(report.category),
                ChangeKind::Deleted,
            ));
        }
        true
    }

    /// Send a raw notification to matching subscribers
    pub fn notify(&self, event: ChangeEvent) {
        self.shared.state().broadcast(event);
    }

    /// Fail every open channel with `reason` and drop it
    pub fn break_channels(&self, reason: &str) {
        let subscribers = std::mem::take(&mut self.shared.state().subscribers);
        for sub in subscribers {
            debug!(channel = %sub.channel, reason, "Breaking channel");
            let _ = sub.tx.send(ChannelEvent::Error(reason.to_string()));
        }
    }

    /// Make the next `n` list calls fail
    pub fn fail_next_lists(&self, n: u32) {
        self.shared.state().failing_lists = n;
    }

    /// Make the next `n` subscribe calls fail
    pub fn fail_next_subscribes(&self, n: u32) {
        self.shared.state().failing_subscribes = n;
    }

    /// Delay every list call by `delay`.
    ///
    /// The list is read when the call starts and returned after the delay,
    /// like a slow network round trip.
    pub fn set_list_delay(&self, delay: Duration) {
        self.shared.state().list_delay = delay;
    }

    pub fn list_calls(&self) -> usize {
        self.shared.list_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_attempts(&self) -> usize {
        self.shared.subscribe_attempts.load(Ordering::SeqCst)
    }

    /// Subscriptions released by their guards
    pub fn releases(&self) -> usize {
        self.shared.releases.load(Ordering::SeqCst)
    }

    /// Currently open channels
    pub fn active_subscriptions(&self) -> usize {
        self.shared.state().subscribers.len()
    }

    /// Names of the currently open channels
    pub fn channels(&self) -> Vec<String> {
        self.shared
            .state()
            .subscribers
            .iter()
            .map(|sub| sub.channel.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shared.state().reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<ReportEntity> {
        let state = self.shared.state();
        let mut reports: Vec<ReportEntity> = state
            .reports
            .values()
            .map(|base| ReportEntity::enrich(base.clone(), state.details.get(&base.id).cloned()))
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        reports
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn list_reports(&self) -> LiveResult<Vec<ReportEntity>> {
        self.shared.list_calls.fetch_add(1, Ordering::SeqCst);

        let delay = {
            let mut state = self.shared.state();
            if state.failing_lists > 0 {
                state.failing_lists -= 1;
                return Err(LiveError::store("injected list failure"));
            }
            state.list_delay
        };

        let reports = self.snapshot();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(reports)
    }

    async fn subscribe(
        &self,
        channel: &str,
        collections: &[Collection],
    ) -> LiveResult<Subscription> {
        self.shared.subscribe_attempts.fetch_add(1, Ordering::SeqCst);

        let mut state = self.shared.state();
        if state.failing_subscribes > 0 {
            state.failing_subscribes -= 1;
            return Err(LiveError::subscription(format!(
                "injected subscribe failure on {channel}"
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let id = state.next_subscriber;
        state.next_subscriber += 1;
        state.subscribers.push(Subscriber {
            id,
            channel: channel.to_string(),
            collections: collections.to_vec(),
            tx,
        });

        let shared = Arc::clone(&self.shared);
        let guard = SubscriptionGuard::new(move || {
            shared.state().subscribers.retain(|sub| sub.id != id);
            shared.releases.fetch_add(1, Ordering::SeqCst);
        });

        Ok(Subscription::new(rx, guard))
    }
}
