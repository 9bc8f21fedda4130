//! Device Registry: every device of the open document, keyed by id.

use crate::error::{FloorplanError, Result};
use crate::id::DeviceId;
use crate::model::Device;
use std::collections::HashMap;

/// Keyed device collection.
///
/// Iteration follows insertion order so snapshots and exports are
/// deterministic; a rekey keeps the device's position in that order.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, Device>,
    order: Vec<DeviceId>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device with `indicator_count` default indicators (clamped to 1..=8).
    ///
    /// # Errors
    /// `DuplicateId` if `id` is taken; the registry is left untouched.
    pub fn create(
        &mut self,
        id: DeviceId,
        name: impl Into<String>,
        x: f32,
        y: f32,
        indicator_count: usize,
    ) -> Result<&mut Device> {
        self.insert(Device::new(id, name, x, y, indicator_count))
    }

    /// Insert an already built device.
    ///
    /// # Errors
    /// `DuplicateId` if its id is taken.
    pub fn insert(&mut self, device: Device) -> Result<&mut Device> {
        let id = device.id();
        if self.devices.contains_key(&id) {
            return Err(FloorplanError::DuplicateId {
                id: id.as_str().to_string(),
            });
        }
        self.order.push(id);
        Ok(self.devices.entry(id).or_insert(device))
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        self.devices.get_mut(&id)
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.devices.contains_key(&id)
    }

    /// Remove and return a device.
    pub fn remove(&mut self, id: DeviceId) -> Option<Device> {
        let device = self.devices.remove(&id)?;
        self.order.retain(|&d| d != id);
        Some(device)
    }

    /// Remove a device. `false` if it was absent.
    pub fn delete(&mut self, id: DeviceId) -> bool {
        self.remove(id).is_some()
    }

    /// Move a device to a new key.
    ///
    /// Returns `Ok(false)` when `old` is absent or equal to `new`. Derived
    /// indicator identifiers follow automatically since they are computed
    /// from the id. The caller repoints any selection.
    ///
    /// # Errors
    /// `DuplicateId` if `new` belongs to another device.
    pub fn rekey(&mut self, old: DeviceId, new: DeviceId) -> Result<bool> {
        if old == new || !self.devices.contains_key(&old) {
            return Ok(false);
        }
        if self.devices.contains_key(&new) {
            return Err(FloorplanError::DuplicateId {
                id: new.as_str().to_string(),
            });
        }
        let Some(mut device) = self.devices.remove(&old) else {
            return Ok(false);
        };
        device.set_id(new);
        self.devices.insert(new, device);
        if let Some(slot) = self.order.iter_mut().find(|d| **d == old) {
            *slot = new;
        }
        Ok(true)
    }

    /// All devices in registry order.
    pub fn list_all(&self) -> impl Iterator<Item = &Device> + '_ {
        self.order.iter().filter_map(|id| self.devices.get(id))
    }

    pub fn ids(&self) -> &[DeviceId] {
        &self.order
    }

    /// Remove every device, returning them in registry order.
    pub fn clear(&mut self) -> Vec<Device> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.devices.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Smallest positive integer id not in use, as a string.
    pub fn next_free_id(&self) -> DeviceId {
        let next = self
            .order
            .iter()
            .filter_map(|id| id.as_str().parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        DeviceId::intern(&next.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IndicatorIndex;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> DeviceId {
        DeviceId::intern(s)
    }

    #[test]
    fn create_and_lookup() {
        let mut reg = DeviceRegistry::new();
        let dev = reg.create(id("42"), "Pump", 10.0, 20.0, 3).unwrap();
        assert_eq!(dev.indicators().len(), 3);
        assert!(reg.get(id("42")).is_some());
        assert!(reg.get(id("43")).is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_id_rejected_without_mutation() {
        let mut reg = DeviceRegistry::new();
        reg.create(id("42"), "A", 0.0, 0.0, 2).unwrap();
        let err = reg.create(id("42"), "B", 5.0, 5.0, 4).unwrap_err();
        assert_eq!(
            err,
            FloorplanError::DuplicateId {
                id: "42".to_string()
            }
        );
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(id("42")).unwrap().name, "A");
    }

    #[test]
    fn rekey_moves_device_and_derived_ids() {
        let mut reg = DeviceRegistry::new();
        reg.create(id("1"), "A", 0.0, 0.0, 1).unwrap();
        reg.create(id("42"), "B", 0.0, 0.0, 2).unwrap();
        reg.create(id("3"), "C", 0.0, 0.0, 1).unwrap();

        assert!(reg.rekey(id("42"), id("99")).unwrap());
        assert!(reg.get(id("42")).is_none());
        let dev = reg.get(id("99")).unwrap();
        assert_eq!(dev.id(), id("99"));
        assert_eq!(dev.indicator_element_ids(), vec!["dev_99_p1", "dev_99_p2"]);
        assert_eq!(reg.ids(), &[id("1"), id("99"), id("3")]);
    }

    #[test]
    fn rekey_missing_or_taken() {
        let mut reg = DeviceRegistry::new();
        reg.create(id("1"), "A", 0.0, 0.0, 1).unwrap();
        reg.create(id("2"), "B", 0.0, 0.0, 1).unwrap();
        assert!(!reg.rekey(id("7"), id("8")).unwrap());
        assert!(!reg.rekey(id("1"), id("1")).unwrap());
        assert!(reg.rekey(id("1"), id("2")).is_err());
        assert!(reg.get(id("1")).is_some());
    }

    #[test]
    fn delete_and_clear() {
        let mut reg = DeviceRegistry::new();
        reg.create(id("1"), "A", 0.0, 0.0, 1).unwrap();
        reg.create(id("2"), "B", 0.0, 0.0, 1).unwrap();
        assert!(reg.delete(id("1")));
        assert!(!reg.delete(id("1")));
        let drained = reg.clear();
        assert_eq!(drained.len(), 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn next_free_id_skips_used_numbers() {
        let mut reg = DeviceRegistry::new();
        assert_eq!(reg.next_free_id(), id("1"));
        reg.create(id("7"), "A", 0.0, 0.0, 1).unwrap();
        reg.create(id("pump"), "B", 0.0, 0.0, 1).unwrap();
        assert_eq!(reg.next_free_id(), id("8"));
        let first = reg.list_all().next().unwrap();
        assert!(first.indicator(IndicatorIndex::new(1).unwrap()).is_some());
    }
}
