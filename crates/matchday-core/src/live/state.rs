// ── Connection state machine ──
//
// The connection task reports what happened as a `Signal`; `next` is the
// only place that decides which state follows.

use std::fmt;

use matchday_api::{ReconnectConfig, TransportKind};

/// Push-channel state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected { transport: TransportKind },
    /// Automatic reconnection in progress. `attempt` counts consecutive
    /// failures since the channel was last up.
    Reconnecting { attempt: u32 },
    /// Automatic attempts exhausted, or push disabled. Retrying continues
    /// quietly at the capped delay; consumers should rely on polling.
    Degraded { attempt: u32 },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Failures counted so far in the current outage.
    pub fn attempt(&self) -> u32 {
        match self {
            Self::Reconnecting { attempt } | Self::Degraded { attempt } => *attempt,
            _ => 0,
        }
    }

    /// Pure transition function.
    pub fn next(&self, signal: &Signal, reconnect: &ReconnectConfig) -> Self {
        match (self, signal) {
            (_, Signal::Shutdown) => Self::Disconnected,
            (_, Signal::PushDisabled) => Self::Degraded { attempt: 0 },

            (Self::Disconnected, Signal::ConnectRequested) => Self::Connecting,
            (_, Signal::ConnectRequested) => self.clone(),

            (_, Signal::Opened { transport }) => Self::Connected {
                transport: *transport,
            },

            (Self::Connected { .. }, Signal::Upgraded) => Self::Connected {
                transport: TransportKind::Stream,
            },
            (_, Signal::Upgraded | Signal::UpgradeFailed { .. }) => self.clone(),

            (Self::Connected { .. } | Self::Connecting | Self::Disconnected, Signal::Lost { .. }) => {
                Self::Reconnecting { attempt: 0 }
            }
            (Self::Reconnecting { attempt }, Signal::Lost { .. }) => {
                let attempt = attempt.saturating_add(1);
                if reconnect.exhausted(attempt) {
                    Self::Degraded { attempt }
                } else {
                    Self::Reconnecting { attempt }
                }
            }
            (Self::Degraded { attempt }, Signal::Lost { .. }) => Self::Degraded {
                attempt: attempt.saturating_add(1),
            },
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected { transport } => write!(f, "connected ({transport})"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {})", attempt + 1),
            Self::Degraded { .. } => f.write_str("degraded (polling)"),
        }
    }
}

/// Something that happened to the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    ConnectRequested,
    /// A session opened (initial connect or reconnect).
    Opened { transport: TransportKind },
    /// The session moved onto the stream transport.
    Upgraded,
    /// Upgrade attempt failed; the polling session carries on.
    UpgradeFailed { reason: String },
    /// An open session dropped, or an attempt to open one failed.
    Lost { reason: String },
    PushDisabled,
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lost() -> Signal {
        Signal::Lost {
            reason: "reset".into(),
        }
    }

    #[test]
    fn connect_is_idempotent() {
        let cfg = ReconnectConfig::default();
        let connecting = ConnectionState::Disconnected.next(&Signal::ConnectRequested, &cfg);
        assert_eq!(connecting, ConnectionState::Connecting);
        assert_eq!(connecting.next(&Signal::ConnectRequested, &cfg), connecting);

        let degraded = ConnectionState::Degraded { attempt: 9 };
        assert_eq!(degraded.next(&Signal::ConnectRequested, &cfg), degraded);
    }

    #[test]
    fn upgrade_and_upgrade_failure() {
        let cfg = ReconnectConfig::default();
        let polling = ConnectionState::Connecting.next(
            &Signal::Opened {
                transport: TransportKind::Polling,
            },
            &cfg,
        );
        let failed = polling.next(
            &Signal::UpgradeFailed {
                reason: "blocked".into(),
            },
            &cfg,
        );
        assert_eq!(
            failed,
            ConnectionState::Connected {
                transport: TransportKind::Polling
            }
        );
        assert_eq!(
            polling.next(&Signal::Upgraded, &cfg),
            ConnectionState::Connected {
                transport: TransportKind::Stream
            }
        );
    }

    #[test]
    fn failures_escalate_to_degraded() {
        let cfg = ReconnectConfig {
            max_attempts: 3,
            ..ReconnectConfig::default()
        };
        let mut state = ConnectionState::Connected {
            transport: TransportKind::Stream,
        };
        let mut seen = Vec::new();
        for _ in 0..5 {
            state = state.next(&lost(), &cfg);
            seen.push(state.clone());
        }
        assert_eq!(
            seen,
            vec![
                ConnectionState::Reconnecting { attempt: 0 },
                ConnectionState::Reconnecting { attempt: 1 },
                ConnectionState::Reconnecting { attempt: 2 },
                ConnectionState::Degraded { attempt: 3 },
                ConnectionState::Degraded { attempt: 4 },
            ]
        );
    }

    #[test]
    fn recovery_resets_attempts() {
        let cfg = ReconnectConfig::default();
        let state = ConnectionState::Degraded { attempt: 12 }.next(
            &Signal::Opened {
                transport: TransportKind::Polling,
            },
            &cfg,
        );
        assert!(state.is_connected());
        assert_eq!(state.next(&lost(), &cfg), ConnectionState::Reconnecting { attempt: 0 });
    }

    #[test]
    fn shutdown_and_push_disabled() {
        let cfg = ReconnectConfig::default();
        let state = ConnectionState::Reconnecting { attempt: 2 };
        assert_eq!(state.next(&Signal::Shutdown, &cfg), ConnectionState::Disconnected);
        assert_eq!(
            ConnectionState::Disconnected.next(&Signal::PushDisabled, &cfg),
            ConnectionState::Degraded { attempt: 0 }
        );
    }
}
