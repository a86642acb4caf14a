// MIT License - Copyright (c) 2026 Peter Wright

use serde::Serialize;

use crate::controller::{AlarmCause, PanelState};

/// All events that can be emitted by the panel.
///
/// Users subscribe via `panel.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<PanelEvent>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PanelEvent {
    /// The controller moved between states
    StateChanged { from: PanelState, to: PanelState },
    /// A full code matched the stored code
    CodeAccepted { state: PanelState },
    /// A full code did not match; `attempts` is the lockout counter after the check
    CodeRejected { state: PanelState, attempts: u32 },
    /// The panel is entering Alarm
    AlarmRaised {
        #[serde(serialize_with = "serialize_cause")]
        cause: AlarmCause,
    },
    /// The alarm light timed out while the panel stays in Alarm
    AlarmLightExpired,
    /// The report was acknowledged and the cause discarded
    CauseCleared,
}

fn serialize_cause<S: serde::Serializer>(cause: &AlarmCause, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(cause)
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<PanelEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<PanelEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
