// ── Inbound frame routing ──

use tokio::sync::broadcast;
use tracing::{trace, warn};

use matchday_api::{Frame, InboundMessage};

use crate::model::LiveEvent;
use crate::store::MatchStore;

/// Route one pushed frame: snapshots to the store, discrete events to the
/// broadcast. Never fails; bad frames are logged and dropped.
pub(crate) fn dispatch(frame: Frame, store: &MatchStore, events: &broadcast::Sender<LiveEvent>) {
    let event = match InboundMessage::from_frame(frame) {
        InboundMessage::MatchUpdate(update) => {
            store.apply(&update);
            return;
        }
        InboundMessage::MatchStarted(payload) => LiveEvent::MatchStarted { payload },
        InboundMessage::MatchEnded(payload) => LiveEvent::MatchEnded { payload },
        InboundMessage::GoalScored(payload) => LiveEvent::GoalScored { payload },
        InboundMessage::WicketFallen(payload) => LiveEvent::WicketFallen { payload },
        InboundMessage::NewContent(payload) => LiveEvent::NewContent { payload },
        InboundMessage::Notification(n) => LiveEvent::Notification {
            category: n.kind,
            message: n.message,
        },
        InboundMessage::Malformed { event, reason } => {
            warn!(%event, %reason, "Dropping malformed frame");
            return;
        }
        InboundMessage::Unknown { event } => {
            trace!(%event, "Ignoring unhandled event");
            return;
        }
    };

    // No receivers is fine.
    let _ = events.send(event);
}
