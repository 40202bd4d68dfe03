// ── Live service ──
//
// One shared push channel per running client. Owns the connection task,
// the snapshot fallback poller, the match store and the event broadcast.

mod dispatch;
mod state;
mod task;

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use matchday_api::{Connector, HttpConnector, MatchClient};

use crate::config::LiveConfig;
use crate::error::CoreError;
use crate::model::{LiveEvent, MatchSnapshot, SubscriptionKey};
use crate::poller::{CommentaryView, SnapshotPoller};
use crate::source::MatchSource;
use crate::store::{ApplyOutcome, MatchStore, StoreSweeper};
use crate::subscription::SubscriptionRegistry;

pub use state::{ConnectionState, Signal};

use task::{Command, ConnectionTask, Shared, TaskSettings};

const EVENT_CHANNEL_SIZE: usize = 256;

// ── LiveService ──────────────────────────────────────────────────────

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<LiveInner>`. Construct once, call
/// [`connect()`](Self::connect), and hand clones to every screen.
#[derive(Clone)]
pub struct LiveService {
    inner: Arc<LiveInner>,
}

struct LiveInner {
    config: LiveConfig,
    connector: Arc<dyn Connector>,
    source: Arc<dyn MatchSource>,
    shared: Arc<Shared>,
    command_tx: mpsc::UnboundedSender<Command>,
    /// Handed to the connection task on the first `connect()`.
    pending: Mutex<Option<(mpsc::UnboundedReceiver<Command>, SubscriptionRegistry)>>,
    active_keys: watch::Receiver<Vec<SubscriptionKey>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl LiveService {
    /// Create a service. Does NOT connect; call [`connect()`](Self::connect).
    pub fn new(
        config: LiveConfig,
        connector: Arc<dyn Connector>,
        source: Arc<dyn MatchSource>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let registry = SubscriptionRegistry::new();
        let active_keys = registry.watch_active();

        Self {
            inner: Arc::new(LiveInner {
                config,
                connector,
                source,
                shared: Arc::new(Shared {
                    store: Arc::new(MatchStore::new()),
                    state,
                    events,
                }),
                command_tx,
                pending: Mutex::new(Some((command_rx, registry))),
                active_keys,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Build a service talking to a real server over HTTP.
    pub fn from_config(config: LiveConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        let connector = HttpConnector::new(config.live_base()?, &transport)?;
        let client = MatchClient::new(config.api_url.as_str(), &transport)?;
        Ok(Self::new(config, Arc::new(connector), Arc::new(client)))
    }

    pub fn config(&self) -> &LiveConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<MatchStore> {
        &self.inner.shared.store
    }

    pub fn source(&self) -> Arc<dyn MatchSource> {
        Arc::clone(&self.inner.source)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the push channel, the snapshot fallback poller and the
    /// unheld-snapshot sweeper.
    ///
    /// Idempotent. Never fails because the server is unreachable; that
    /// only shows up in [`state()`](Self::state).
    pub async fn connect(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::ServiceStopped);
        }
        let Some((commands, registry)) = self.inner.pending.lock().await.take() else {
            debug!("connect() on a running service");
            return Ok(());
        };

        let config = &self.inner.config;
        let task = ConnectionTask::new(
            TaskSettings {
                push_enabled: config.push_enabled,
                upgrade_transport: config.upgrade_transport,
                reconnect: config.reconnect.clone(),
            },
            Arc::clone(&self.inner.connector),
            registry,
            commands,
            Arc::clone(&self.inner.shared),
            self.inner.cancel.clone(),
        );
        let poller = SnapshotPoller::new(
            Arc::clone(&self.inner.source),
            Arc::clone(&self.inner.shared.store),
            self.inner.shared.state.subscribe(),
            self.inner.active_keys.clone(),
            config.snapshot_poll_interval,
        );
        let sweeper = StoreSweeper::new(
            Arc::clone(&self.inner.shared.store),
            self.inner.active_keys.clone(),
            config.unheld_retention,
        );

        let mut handles = self.inner.task_handles.lock().await;
        handles.push(tokio::spawn(task.run()));
        handles.push(tokio::spawn(poller.run(self.inner.cancel.clone())));
        handles.push(tokio::spawn(sweeper.run(self.inner.cancel.clone())));

        info!(push = config.push_enabled, "Live service started");
        Ok(())
    }

    /// Stop every background task. The service cannot be restarted.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner
            .shared
            .state
            .send_replace(ConnectionState::Disconnected);
        debug!("Live service stopped");
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register interest in a match. The returned guard releases it on drop.
    pub fn watch_match(&self, key: SubscriptionKey) -> MatchSubscription {
        let snapshot = self.inner.shared.store.watch_match(&key.match_id);
        if self.inner.command_tx.send(Command::Subscribe(key.clone())).is_err() {
            debug!(%key, "Subscribe after the connection task ended");
        }
        MatchSubscription {
            key,
            commands: self.inner.command_tx.clone(),
            snapshot,
        }
    }

    /// Keys with at least one holder.
    pub fn active_keys(&self) -> Vec<SubscriptionKey> {
        self.inner.active_keys.borrow().clone()
    }

    /// Fetch a match over REST and store it. Use for the initial render
    /// before any push arrives.
    pub async fn load_match(&self, key: &SubscriptionKey) -> Result<Arc<MatchSnapshot>, CoreError> {
        let payload = self.inner.source.fetch_match(&key.match_id).await?;
        match self.inner.shared.store.apply_rest_snapshot(key, payload) {
            ApplyOutcome::Applied { .. } => self
                .inner
                .shared
                .store
                .get(&key.match_id)
                .ok_or_else(|| CoreError::Internal(format!("snapshot for {key} vanished"))),
            ApplyOutcome::Dropped(reason) => Err(CoreError::MalformedPayload {
                reason: reason.to_string(),
            }),
        }
    }

    /// Commentary view for one match using this service's data source.
    /// Polling is not started.
    pub fn commentary_view(&self, match_id: impl Into<String>) -> CommentaryView {
        CommentaryView::new(match_id, Arc::clone(&self.inner.source))
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.shared.state.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.shared.state.borrow().clone()
    }

    /// Discrete live events. Slow receivers see `Lagged` and skip ahead.
    pub fn events(&self) -> broadcast::Receiver<LiveEvent> {
        self.inner.shared.events.subscribe()
    }
}

impl Drop for LiveInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── MatchSubscription ────────────────────────────────────────────────

/// One holder's interest in a match. Dropping it releases the reference;
/// the last release sends the leave and evicts the snapshot.
pub struct MatchSubscription {
    key: SubscriptionKey,
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<Option<Arc<MatchSnapshot>>>,
}

impl MatchSubscription {
    pub fn key(&self) -> &SubscriptionKey {
        &self.key
    }

    /// Latest snapshot for this match, if any has arrived.
    pub fn latest(&self) -> Option<Arc<MatchSnapshot>> {
        self.snapshot.borrow().clone()
    }

    /// Wait for the next snapshot change. Returns `None` once the store
    /// is gone.
    pub async fn changed(&mut self) -> Option<Option<Arc<MatchSnapshot>>> {
        self.snapshot.changed().await.ok()?;
        Some(self.snapshot.borrow_and_update().clone())
    }

    pub fn snapshots(&self) -> watch::Receiver<Option<Arc<MatchSnapshot>>> {
        self.snapshot.clone()
    }
}

impl Drop for MatchSubscription {
    fn drop(&mut self) {
        // Ignored when the service is already gone.
        let _ = self.commands.send(Command::Unsubscribe(self.key.clone()));
    }
}

impl std::fmt::Debug for MatchSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSubscription")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
