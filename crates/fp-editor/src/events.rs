//! Observable editor events.
//!
//! Observers register callbacks on the editor that owns the document; there
//! is no process-wide bus.

use fp_core::DeviceId;
use serde::Serialize;

/// Something the UI may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum EditorEvent {
    /// A device's committed position changed.
    DeviceMoved { id: DeviceId, x: f32, y: f32 },
    /// The selection changed; `None` means nothing is selected.
    DeviceSelected { id: Option<DeviceId> },
    /// A device's committed scale changed.
    DeviceResized { id: DeviceId, scale: f32 },
    /// A document finished loading with this many devices.
    DocumentLoaded { devices: usize },
    /// Undo/redo availability changed.
    HistoryChanged { can_undo: bool, can_redo: bool },
}

impl EditorEvent {
    /// JSON form handed to script hosts.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&EditorEvent)>;

/// Registered listeners, called in subscription order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &EditorEvent) {
        log::trace!("event {event:?}");
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
