//! Poll loop: snapshot subscriptions, look up each channel once, notify on
//! change.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    tokio::{sync::Mutex, task::JoinHandle},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use tubewatch_config::PollerConfig;

use crate::{
    Error, Result,
    cache::{LastSeenCache, Observation},
    dispatch::{NotificationDispatcher, format_notification},
    error::{DispatchError, LookupError},
    lookup::ContentLookup,
    registry::SubscriptionRegistry,
    types::{ChannelId, ConversationId, CycleReport, Item, WatcherStatus},
};

/// Cadence of the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Sleep between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
    /// Sleep before the first cycle.
    pub warmup: Duration,
    /// A lookup running longer than this counts as failed.
    pub lookup_timeout: Option<Duration>,
    /// A single notification taking longer than this counts as failed.
    pub dispatch_timeout: Option<Duration>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self::from(&PollerConfig::default())
    }
}

impl From<&PollerConfig> for WatcherConfig {
    fn from(cfg: &PollerConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(cfg.poll_interval_seconds),
            warmup: Duration::from_secs(cfg.warmup_seconds),
            lookup_timeout: (cfg.lookup_timeout_seconds > 0)
                .then(|| Duration::from_secs(cfg.lookup_timeout_seconds)),
            dispatch_timeout: (cfg.dispatch_timeout_seconds > 0)
                .then(|| Duration::from_secs(cfg.dispatch_timeout_seconds)),
        }
    }
}

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Background poller over the subscription registry.
pub struct WatcherService {
    registry: Arc<SubscriptionRegistry>,
    cache: LastSeenCache,
    lookup: Arc<dyn ContentLookup>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    config: WatcherConfig,
    task: Mutex<Option<PollTask>>,
    /// Held for a whole cycle so manual and scheduled cycles never overlap.
    cycle_lock: Mutex<()>,
    cycles_completed: AtomicU64,
    last_cycle: std::sync::Mutex<Option<CycleReport>>,
}

impl WatcherService {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        lookup: Arc<dyn ContentLookup>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        config: WatcherConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            cache: LastSeenCache::new(),
            lookup,
            dispatcher,
            config,
            task: Mutex::new(None),
            cycle_lock: Mutex::new(()),
            cycles_completed: AtomicU64::new(0),
            last_cycle: std::sync::Mutex::new(None),
        })
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &LastSeenCache {
        &self.cache
    }

    /// Spawn the poll loop. Fails if a loop is already running.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return Err(Error::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let svc = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            svc.poll_loop(token).await;
        });

        *task = Some(PollTask { cancel, handle });
        info!(
            warmup_secs = self.config.warmup.as_secs(),
            interval_secs = self.config.poll_interval.as_secs(),
            "watcher started"
        );
        Ok(())
    }

    /// Cancel the poll loop and wait for it to exit.
    ///
    /// An in-flight lookup or dispatch is abandoned, never awaited.
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        if let Some(PollTask { cancel, handle }) = task {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "watcher task ended abnormally");
            }
        }
        info!("watcher stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    pub async fn status(&self) -> WatcherStatus {
        let running = self.is_running().await;
        let last_cycle = self
            .last_cycle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        WatcherStatus {
            running,
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            conversations: self.registry.conversation_count(),
            channels_tracked: self.cache.len(),
            last_cycle,
        }
    }

    /// Run one full pass over the current subscriptions.
    ///
    /// Pairs are grouped by channel first: each channel is looked up and
    /// compared once, then every subscriber is notified. Failures stay local
    /// to their channel (lookup) or conversation (dispatch).
    pub async fn run_cycle(&self) -> CycleReport {
        let _cycle = self.cycle_lock.lock().await;

        let by_channel = group_by_channel(self.registry.list_subscriptions());
        let mut report = CycleReport::default();
        for (channel, conversations) in &by_channel {
            self.check_channel(channel, conversations, &mut report)
                .await;
        }

        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        *self.last_cycle.lock().unwrap_or_else(|e| e.into_inner()) = Some(report.clone());
        debug!(
            channels = report.channels_checked,
            changes = report.changes,
            sent = report.notifications_sent,
            lookup_failures = report.lookup_failures,
            dispatch_failures = report.dispatch_failures,
            "poll cycle finished"
        );
        report
    }

    // ── Internal ────────────────────────────────────────────────────────

    async fn poll_loop(&self, cancel: CancellationToken) {
        if !sleep_or_cancel(&cancel, self.config.warmup).await {
            return;
        }

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = self.run_cycle() => {},
            }
            if !sleep_or_cancel(&cancel, self.config.poll_interval).await {
                break;
            }
        }
        debug!("watcher loop exited");
    }

    async fn check_channel(
        &self,
        channel: &ChannelId,
        conversations: &[ConversationId],
        report: &mut CycleReport,
    ) {
        report.channels_checked += 1;

        let item = match self.fetch_latest(channel).await {
            Ok(item) => item,
            Err(e) => {
                report.lookup_failures += 1;
                warn!(channel = %channel, error = %e.source, "channel lookup failed");
                return;
            },
        };

        match self.cache.observe(channel, &item.id) {
            Observation::First => {
                report.first_observations += 1;
                debug!(channel = %channel, item_id = %item.id, "first observation, not notifying");
            },
            Observation::Unchanged => report.unchanged += 1,
            Observation::Changed { previous } => {
                report.changes += 1;
                info!(
                    channel = %channel,
                    previous = %previous,
                    item_id = %item.id,
                    subscribers = conversations.len(),
                    "new item detected"
                );
                self.notify_all(channel, &item, conversations, report)
                    .await;
            },
        }
    }

    async fn fetch_latest(&self, channel: &ChannelId) -> std::result::Result<Item, LookupError> {
        let lookup = self.lookup.latest_item(channel);
        match self.config.lookup_timeout {
            Some(limit) => tokio::time::timeout(limit, lookup)
                .await
                .map_err(|elapsed| LookupError::new(channel.clone(), elapsed))?,
            None => lookup.await,
        }
    }

    async fn deliver(
        &self,
        conversation: &ConversationId,
        message: &str,
    ) -> std::result::Result<(), DispatchError> {
        let send = self.dispatcher.notify(conversation, message);
        match self.config.dispatch_timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|elapsed| DispatchError::new(conversation.clone(), elapsed))?,
            None => send.await,
        }
    }

    async fn notify_all(
        &self,
        channel: &ChannelId,
        item: &Item,
        conversations: &[ConversationId],
        report: &mut CycleReport,
    ) {
        let message = format_notification(channel, item);
        for conversation in conversations {
            match self.deliver(conversation, &message).await {
                Ok(()) => {
                    report.notifications_sent += 1;
                    info!(conversation = %conversation, channel = %channel, "notification sent");
                },
                Err(e) => {
                    // The cache already holds the new id; this change is not retried.
                    report.dispatch_failures += 1;
                    warn!(
                        conversation = %conversation,
                        channel = %channel,
                        error = %e.source,
                        "notification dispatch failed"
                    );
                },
            }
        }
    }
}

/// Invert the registry snapshot so each channel appears once.
fn group_by_channel(
    snapshot: Vec<(ConversationId, HashSet<ChannelId>)>,
) -> BTreeMap<ChannelId, Vec<ConversationId>> {
    let mut grouped: BTreeMap<ChannelId, Vec<ConversationId>> = BTreeMap::new();
    for (conversation, channels) in snapshot {
        for channel in channels {
            grouped
                .entry(channel)
                .or_default()
                .push(conversation.clone());
        }
    }
    grouped
}

/// Returns `false` if cancelled before `duration` elapsed.
async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}
