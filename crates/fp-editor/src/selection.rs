//! At most one selected device.

use fp_core::DeviceId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<DeviceId>,
}

impl Selection {
    pub fn current(&self) -> Option<DeviceId> {
        self.current
    }

    pub fn is_selected(&self, id: DeviceId) -> bool {
        self.current == Some(id)
    }

    /// Replace the selection, returning the previous one.
    pub fn replace(&mut self, id: Option<DeviceId>) -> Option<DeviceId> {
        std::mem::replace(&mut self.current, id)
    }

    pub fn clear(&mut self) -> Option<DeviceId> {
        self.current.take()
    }

    /// Follow a rekey. Returns whether the selection pointed at `old`.
    pub fn rekey(&mut self, old: DeviceId, new: DeviceId) -> bool {
        if self.current == Some(old) {
            self.current = Some(new);
            true
        } else {
            false
        }
    }
}
