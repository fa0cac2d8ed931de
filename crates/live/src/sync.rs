//! Live synchronization with the report store
//!
//! One background task per mounted map:
//!
//! 1. One subscription covering every collection in [`Collection::ALL`]
//! 2. Once the channel is open, an optional initial fetch; changes made while
//!    it is in flight queue up as notifications
//! 3. Each notification restarts a debounce timer; when it fires, the full
//!    report list is fetched once and handed to the [`RefreshHandler`]
//! 4. A failed subscribe or broken channel releases the subscription, waits
//!    the retry delay and subscribes again, then refreshes at once
//!
//! Unmounting cancels the task (including a fetch in flight), releases the
//! subscription exactly once and guarantees the handler is not called
//! afterwards.

use crate::model::ReportEntity;
use crate::store::{ChannelEvent, Collection, ReportStore, SubscriptionGuard};
use pinmap_core::config::SyncConfig;
use pinmap_core::retry::RetryConfig;
use pinmap_telemetry::{metrics, Timer};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Receives each successfully fetched report list.
///
/// Runs on the sync task. It may unmount or drop its own
/// [`LiveSyncHandle`]; that call returns without waiting for the handler.
pub trait RefreshHandler: Send + Sync + 'static {
    fn on_refresh(&self, reports: Vec<ReportEntity>);
}

impl<F> RefreshHandler for F
where
    F: Fn(Vec<ReportEntity>) + Send + Sync + 'static,
{
    fn on_refresh(&self, reports: Vec<ReportEntity>) {
        self(reports);
    }
}

/// Coordinator state, observable through [`LiveSyncHandle::subscribe_state`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Subscribing,
    Subscribed,
    Debouncing,
    Error,
    Closed,
}

/// Entry point for mounting a live map
pub struct LiveSyncCoordinator;

impl LiveSyncCoordinator {
    /// Start syncing `store` into `handler`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount<S, H>(store: Arc<S>, config: &SyncConfig, handler: H) -> LiveSyncHandle
    where
        S: ReportStore + 'static,
        H: RefreshHandler,
    {
        let channel = format!("report-map-{}", Uuid::new_v4());
        let (state_tx, state_rx) = watch::channel(SyncState::Idle);

        let shared = Arc::new(Shared {
            lifecycle: Mutex::new(Lifecycle {
                alive: true,
                guard: None,
                committer: None,
            }),
            commit_gate: Mutex::new(()),
            cancel: CancellationToken::new(),
            state: state_tx,
            channel: channel.clone(),
        });

        let worker = Worker {
            store,
            handler,
            shared: Arc::clone(&shared),
            debounce: config.debounce(),
            retry: config.retry(),
            initial_fetch: config.initial_fetch,
        };

        info!(
            channel = %channel,
            debounce_ms = config.debounce_ms,
            retry_delay_ms = config.retry_delay_ms,
            max_attempts = ?config.max_attempts,
            "Mounting live map sync"
        );
        tokio::spawn(worker.run());

        LiveSyncHandle {
            shared,
            state: state_rx,
        }
    }
}

/// Owner of a mounted map's sync task; unmounts on drop
pub struct LiveSyncHandle {
    shared: Arc<Shared>,
    state: watch::Receiver<SyncState>,
}

impl LiveSyncHandle {
    /// Unique channel name of this mount
    pub fn channel_name(&self) -> &str {
        &self.shared.channel
    }

    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }

    /// Wait until the coordinator reaches `target`; false if it closed first
    pub async fn wait_for_state(&self, target: SyncState) -> bool {
        let mut rx = self.state.clone();
        match rx
            .wait_for(|state| *state == target || *state == SyncState::Closed)
            .await
        {
            Ok(state) => *state == target,
            Err(_) => false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.is_alive()
    }

    /// Stop syncing; returns false if already unmounted.
    ///
    /// Once this returns, the refresh handler will not be called again.
    pub fn unmount(&self) -> bool {
        self.shared.teardown()
    }
}

impl Drop for LiveSyncHandle {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

struct Lifecycle {
    alive: bool,
    guard: Option<SubscriptionGuard>,
    /// Thread currently running the refresh handler
    committer: Option<ThreadId>,
}

struct Shared {
    lifecycle: Mutex<Lifecycle>,
    /// Held for the whole handler call so teardown can wait it out
    commit_gate: Mutex<()>,
    cancel: CancellationToken,
    state: watch::Sender<SyncState>,
    channel: String,
}

impl Shared {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_alive(&self) -> bool {
        self.lifecycle().alive
    }

    /// Publish `state` unless unmounted; false once unmounted
    fn transition(&self, state: SyncState) -> bool {
        let lifecycle = self.lifecycle();
        if !lifecycle.alive {
            return false;
        }
        self.state.send_replace(state);
        true
    }

    /// Keep `guard` for later release; released immediately if unmounted
    fn install(&self, mut guard: SubscriptionGuard) -> bool {
        let mut lifecycle = self.lifecycle();
        if !lifecycle.alive {
            drop(lifecycle);
            guard.release();
            return false;
        }
        lifecycle.guard = Some(guard);
        true
    }

    fn release_current(&self) {
        let guard = self.lifecycle().guard.take();
        if let Some(mut guard) = guard {
            guard.release();
            debug!(channel = %self.channel, "Released subscription");
        }
    }

    /// Run `commit` only while mounted.
    ///
    /// The lifecycle lock is not held during `commit`; teardown from another
    /// thread waits on the commit gate instead.
    fn commit_if_alive(&self, commit: impl FnOnce()) -> bool {
        let _gate = self.commit_gate.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut lifecycle = self.lifecycle();
            if !lifecycle.alive {
                return false;
            }
            lifecycle.committer = Some(thread::current().id());
        }

        commit();
        self.lifecycle().committer = None;
        true
    }

    fn teardown(&self) -> bool {
        let (guard, from_handler) = {
            let mut lifecycle = self.lifecycle();
            if !lifecycle.alive {
                return false;
            }
            lifecycle.alive = false;
            let from_handler = lifecycle.committer == Some(thread::current().id());
            (lifecycle.guard.take(), from_handler)
        };

        self.cancel.cancel();
        if let Some(mut guard) = guard {
            guard.release();
        }
        if !from_handler {
            // Wait out a handler call that passed the liveness check
            drop(self.commit_gate.lock().unwrap_or_else(PoisonError::into_inner));
        }
        self.state.send_replace(SyncState::Closed);
        info!(channel = %self.channel, "Unmounted live map sync");
        true
    }
}

enum Outcome {
    Cancelled,
    Failed,
}

struct Worker<S, H> {
    store: Arc<S>,
    handler: H,
    shared: Arc<Shared>,
    debounce: Duration,
    retry: RetryConfig,
    initial_fetch: bool,
}

impl<S, H> Worker<S, H>
where
    S: ReportStore + 'static,
    H: RefreshHandler,
{
    async fn run(self) {
        let mut failures: u32 = 0;
        let mut refresh_on_subscribe = self.initial_fetch;
        let mut first_attempt = true;

        loop {
            if !self.shared.transition(SyncState::Subscribing) {
                break;
            }

            let opened = tokio::select! {
                _ = self.shared.cancel.cancelled() => break,
                opened = self.store.subscribe(&self.shared.channel, &Collection::ALL) => opened,
            };

            let outcome = match opened {
                Ok(subscription) => {
                    failures = 0;
                    let (events, guard) = subscription.into_parts();
                    if !self.shared.install(guard) {
                        break;
                    }
                    if !self.shared.transition(SyncState::Subscribed) {
                        break;
                    }
                    info!(
                        channel = %self.shared.channel,
                        refresh = refresh_on_subscribe,
                        "Subscribed to report changes"
                    );
                    self.listen(events, refresh_on_subscribe).await
                }
                Err(err) => {
                    warn!(channel = %self.shared.channel, error = %err, "Subscribe failed");
                    metrics().increment("live_sync.subscribe_failed");
                    // Show what the store has while the channel is down
                    if first_attempt && self.initial_fetch {
                        self.refresh().await;
                    }
                    Outcome::Failed
                }
            };
            first_attempt = false;

            match outcome {
                Outcome::Cancelled => break,
                Outcome::Failed => {
                    self.shared.release_current();
                    failures = failures.saturating_add(1);

                    if !self.retry.allows_attempt(failures) {
                        error!(
                            channel = %self.shared.channel,
                            failures,
                            "Giving up on live updates"
                        );
                        metrics().increment("live_sync.gave_up");
                        self.shared.transition(SyncState::Error);
                        break;
                    }
                    if !self.shared.transition(SyncState::Error) {
                        break;
                    }

                    let delay = self.retry.delay_for_attempt(failures);
                    debug!(delay_ms = delay.as_millis() as u64, "Waiting before resubscribing");
                    tokio::select! {
                        _ = self.shared.cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                    refresh_on_subscribe = true;
                }
            }
        }

        debug!(channel = %self.shared.channel, "Live sync task finished");
    }

    /// Handle events until the channel fails or the map unmounts.
    ///
    /// With `refresh_now`, the report list is fetched before the first event
    /// is read. Notifications sent meanwhile wait in the channel.
    async fn listen(
        &self,
        mut events: mpsc::UnboundedReceiver<ChannelEvent>,
        refresh_now: bool,
    ) -> Outcome {
        if refresh_now {
            self.refresh().await;
            if self.shared.cancel.is_cancelled() {
                return Outcome::Cancelled;
            }
        }

        let mut pending: Option<Pin<Box<Sleep>>> = None;

        loop {
            tokio::select! {
                _ = self.shared.cancel.cancelled() => return Outcome::Cancelled,
                event = events.recv() => match event {
                    Some(ChannelEvent::Change(change)) => {
                        debug!(
                            collection = %change.collection,
                            kind = ?change.kind,
                            "Change notification"
                        );
                        metrics().increment("live_sync.notifications");
                        if !self.shared.transition(SyncState::Debouncing) {
                            return Outcome::Cancelled;
                        }
                        let deadline = Instant::now() + self.debounce;
                        match pending.as_mut() {
                            Some(timer) => timer.as_mut().reset(deadline),
                            None => pending = Some(Box::pin(tokio::time::sleep_until(deadline))),
                        }
                    }
                    Some(ChannelEvent::Error(reason)) => {
                        warn!(channel = %self.shared.channel, reason = %reason, "Channel error");
                        return Outcome::Failed;
                    }
                    None => {
                        warn!(channel = %self.shared.channel, "Channel closed by store");
                        return Outcome::Failed;
                    }
                },
                () = async {
                    if let Some(timer) = &mut pending {
                        timer.await;
                    }
                }, if pending.is_some() => {
                    pending = None;
                    self.refresh().await;
                    if !self.shared.transition(SyncState::Subscribed) {
                        return Outcome::Cancelled;
                    }
                }
            }
        }
    }

    /// Fetch once and hand the result over; failures keep the previous data
    async fn refresh(&self) {
        let timer = Timer::start("live_sync.fetch");
        let fetched = tokio::select! {
            _ = self.shared.cancel.cancelled() => {
                debug!("Fetch abandoned on unmount");
                return;
            }
            fetched = self.store.list_reports() => fetched,
        };
        let elapsed = timer.stop();

        match fetched {
            Ok(reports) => {
                let count = reports.len();
                let committed = self
                    .shared
                    .commit_if_alive(|| self.handler.on_refresh(reports));

                if committed {
                    metrics().increment("live_sync.refresh");
                    info!(
                        count,
                        duration_ms = elapsed.as_millis() as u64,
                        "Refreshed reports"
                    );
                } else {
                    debug!("Discarding fetch completed after unmount");
                }
            }
            Err(err) => {
                metrics().increment("live_sync.refresh_failed");
                warn!(error = %err, "Refresh failed; keeping previous reports");
            }
        }
    }
}
