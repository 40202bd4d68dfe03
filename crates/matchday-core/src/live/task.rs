// ── Connection task ──
//
// Single owner of the push link and the subscription registry. Opens
// long-polling first, tries the stream upgrade, dispatches frames, and
// reconnects with backoff until cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use matchday_api::{ClientMessage, Connector, Link, LinkEvent, ReconnectConfig, TransportKind};

use super::dispatch::dispatch;
use super::state::{ConnectionState, Signal};
use crate::model::{LiveEvent, SubscriptionKey};
use crate::store::MatchStore;
use crate::subscription::{Release, SubscriptionRegistry};

/// Requests from service handles and subscription guards.
#[derive(Debug)]
pub(crate) enum Command {
    Subscribe(SubscriptionKey),
    Unsubscribe(SubscriptionKey),
}

/// State shared between the service handle and its task.
pub(crate) struct Shared {
    pub(crate) store: Arc<MatchStore>,
    pub(crate) state: watch::Sender<ConnectionState>,
    pub(crate) events: broadcast::Sender<LiveEvent>,
}

pub(crate) struct TaskSettings {
    pub(crate) push_enabled: bool,
    pub(crate) upgrade_transport: bool,
    pub(crate) reconnect: ReconnectConfig,
}

enum SessionEnd {
    Cancelled,
    Lost(String),
}

pub(crate) struct ConnectionTask {
    settings: TaskSettings,
    connector: Arc<dyn Connector>,
    registry: SubscriptionRegistry,
    commands: mpsc::UnboundedReceiver<Command>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl ConnectionTask {
    pub(crate) fn new(
        settings: TaskSettings,
        connector: Arc<dyn Connector>,
        registry: SubscriptionRegistry,
        commands: mpsc::UnboundedReceiver<Command>,
        shared: Arc<Shared>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            connector,
            registry,
            commands,
            shared,
            cancel,
        }
    }

    pub(crate) async fn run(mut self) {
        if self.settings.push_enabled {
            self.signal(&Signal::ConnectRequested);
            self.connection_loop().await;
        } else {
            info!("Push channel disabled, running poll-only");
            self.signal(&Signal::PushDisabled);
            self.serve_commands().await;
        }

        self.registry.on_disconnected();
        self.signal(&Signal::Shutdown);
        debug!("Connection task stopped");
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    async fn connection_loop(&mut self) {
        loop {
            let opened = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                result = self.connector.open(TransportKind::Polling) => result,
            };

            match opened {
                Ok(link) => match self.run_session(link).await {
                    SessionEnd::Cancelled => return,
                    SessionEnd::Lost(reason) => {
                        self.registry.on_disconnected();
                        info!(%reason, "Push channel lost");
                        self.signal(&Signal::Lost { reason });
                    }
                },
                Err(e) => {
                    let attempt = self.current_state().attempt();
                    warn!(error = %e, attempt, "Push channel connect failed");
                    self.signal(&Signal::Lost {
                        reason: e.to_string(),
                    });
                }
            }

            let attempt = self.current_state().attempt();
            let delay = self.settings.reconnect.delay_for(attempt);
            debug!(attempt, delay_ms = delay.as_millis(), "Waiting before reconnect");
            if !self.backoff(delay).await {
                return;
            }
        }
    }

    async fn run_session(&mut self, mut link: Link) -> SessionEnd {
        // Apply queued subscribes first so they join with the replay.
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command, None).await;
        }
        let joins = self.registry.on_connected();
        send_all(&link, joins).await;
        self.signal(&Signal::Opened {
            transport: link.kind(),
        });
        info!(transport = %link.kind(), "Push channel connected");

        if self.settings.upgrade_transport && link.kind() == TransportKind::Polling {
            // Keep dispatching polled frames while the stream handshake runs.
            let connector = Arc::clone(&self.connector);
            let upgrade = connector.open(TransportKind::Stream);
            tokio::pin!(upgrade);
            let upgraded = loop {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => {
                        link.close();
                        return SessionEnd::Cancelled;
                    }
                    result = &mut upgrade => break result,
                    event = link.recv() => match event {
                        LinkEvent::Frame(frame) => {
                            dispatch(frame, &self.shared.store, &self.shared.events);
                        }
                        LinkEvent::Closed { reason } => return SessionEnd::Lost(reason),
                    },
                }
            };
            match upgraded {
                Ok(stream) => {
                    link.close();
                    for frame in link.drain_frames() {
                        dispatch(frame, &self.shared.store, &self.shared.events);
                    }
                    link = stream;
                    // The stream is a fresh session on the server side.
                    self.registry.on_disconnected();
                    let joins = self.registry.on_connected();
                    send_all(&link, joins).await;
                    self.signal(&Signal::Upgraded);
                    info!("Push channel upgraded to stream");
                }
                Err(e) => {
                    debug!(error = %e, "Stream upgrade failed, staying on polling");
                    self.signal(&Signal::UpgradeFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    link.close();
                    return SessionEnd::Cancelled;
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        link.close();
                        return SessionEnd::Cancelled;
                    };
                    self.handle_command(command, Some(&link)).await;
                }
                event = link.recv() => match event {
                    LinkEvent::Frame(frame) => {
                        dispatch(frame, &self.shared.store, &self.shared.events);
                    }
                    LinkEvent::Closed { reason } => return SessionEnd::Lost(reason),
                },
            }
        }
    }

    /// Sleep for `delay` while still serving commands. Returns `false`
    /// when the task should stop.
    async fn backoff(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return false,
                () = &mut sleep => return true,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command, None).await,
                    None => return false,
                },
            }
        }
    }

    /// Serve commands with no link until cancelled.
    async fn serve_commands(&mut self) {
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command, None).await,
                    None => return,
                },
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    async fn handle_command(&mut self, command: Command, link: Option<&Link>) {
        match command {
            Command::Subscribe(key) => {
                debug!(%key, "Subscribe");
                if let (Some(join), Some(link)) = (self.registry.subscribe(key), link) {
                    send_all(link, vec![join]).await;
                }
            }
            Command::Unsubscribe(key) => match self.registry.unsubscribe(&key) {
                Release::Released { leave } => {
                    debug!(%key, "Last holder released");
                    let still_held = self
                        .registry
                        .active_keys()
                        .iter()
                        .any(|k| k.match_id == key.match_id);
                    if !still_held {
                        self.shared.store.evict(&key.match_id);
                    }
                    if let (Some(leave), Some(link)) = (leave, link) {
                        send_all(link, vec![leave]).await;
                    }
                }
                Release::StillHeld { remaining } => debug!(%key, remaining, "Unsubscribe"),
                Release::NotHeld => {}
            },
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn current_state(&self) -> ConnectionState {
        self.shared.state.borrow().clone()
    }

    fn signal(&self, signal: &Signal) {
        let reconnect = &self.settings.reconnect;
        self.shared.state.send_if_modified(|state| {
            let next = state.next(signal, reconnect);
            if *state == next {
                return false;
            }
            debug!(from = %state, to = %next, "Connection state change");
            *state = next;
            true
        });
    }
}

/// Send join/leave messages. A failed send means the link is going down;
/// the registry replays on the next session.
async fn send_all(link: &Link, messages: Vec<ClientMessage>) {
    for message in messages {
        if let Err(e) = link.send(message.to_frame()).await {
            debug!(error = %e, "Could not send subscription message");
            return;
        }
    }
}
