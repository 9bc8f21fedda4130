//! History Snapshot: an owned, versioned capture of the whole document state.
//!
//! Every field that restore consumes is enumerated here. Adding a field to
//! [`Device`] or [`Indicator`](crate::model::Indicator) without adding it to
//! these records makes undo drop it, so the conversion functions below
//! destructure exhaustively where they can.

use crate::error::{FloorplanError, Result};
use crate::id::{DeviceId, IndicatorIndex};
use crate::model::{Color, Device};
use crate::registry::DeviceRegistry;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::num::NonZeroU32;

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub index: IndicatorIndex,
    pub color: Color,
    pub off_color: Color,
    pub blink: bool,
    pub query: Option<NonZeroU32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    /// In visual order.
    pub indicators: Vec<IndicatorRecord>,
}

/// Full document state: devices in registry order plus the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub selected: Option<DeviceId>,
    pub devices: Vec<DeviceRecord>,
}

impl Snapshot {
    /// Deep-copy the registry. Scene handles are not captured.
    pub fn capture(registry: &DeviceRegistry, selected: Option<DeviceId>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            selected,
            devices: registry.list_all().map(DeviceRecord::from).collect(),
        }
    }

    /// An empty document with nothing selected.
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            selected: None,
            devices: Vec::new(),
        }
    }

    /// Parse a snapshot from JSON.
    ///
    /// # Errors
    /// `InvalidDocument` for malformed JSON or an unknown version.
    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(text)
            .map_err(|e| FloorplanError::invalid_document(format!("snapshot: {e}")))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(FloorplanError::invalid_document(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn device(&self, id: DeviceId) -> Option<&DeviceRecord> {
        self.devices.iter().find(|d| d.id == id)
    }
}

impl From<&Device> for DeviceRecord {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id(),
            name: device.name.clone(),
            x: device.x,
            y: device.y,
            scale: device.scale(),
            indicators: device
                .indicators()
                .iter()
                .map(|ind| IndicatorRecord {
                    index: ind.index(),
                    color: ind.color,
                    off_color: ind.off_color,
                    blink: ind.blink,
                    query: ind.query,
                })
                .collect(),
        }
    }
}

impl DeviceRecord {
    /// Rebuild a device (without scene handles) with this record's
    /// indicator order and data.
    ///
    /// # Errors
    /// `InvalidOrder` if the record has no indicators or repeats a P-number.
    pub fn to_device(&self) -> Result<Device> {
        let Self {
            id,
            name,
            x,
            y,
            scale,
            indicators,
        } = self;

        let mut device = Device::new(*id, name.clone(), *x, *y, indicators.len());
        let order: SmallVec<[IndicatorIndex; 8]> = indicators.iter().map(|r| r.index).collect();
        device.set_indicator_membership(&order)?;
        device.set_scale(*scale);

        for record in indicators {
            let IndicatorRecord {
                index,
                color,
                off_color,
                blink,
                query,
            } = record;
            if let Some(ind) = device.indicator_mut(*index) {
                ind.color = *color;
                ind.off_color = *off_color;
                ind.blink = *blink;
                ind.query = *query;
            }
        }
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(n: u8) -> IndicatorIndex {
        IndicatorIndex::new(n).unwrap()
    }

    fn sample_registry() -> DeviceRegistry {
        let mut reg = DeviceRegistry::new();
        let dev = reg.create(DeviceId::intern("5"), "Chiller", 40.0, 60.0, 3).unwrap();
        dev.set_scale(2.5);
        dev.reorder(&[p(3), p(1), p(2)]).unwrap();
        let ind = dev.indicator_mut(p(1)).unwrap();
        ind.color = Color::from_hex("#123456").unwrap();
        ind.blink = true;
        ind.query = NonZeroU32::new(2);
        reg
    }

    #[test]
    fn capture_restore_is_lossless() {
        let reg = sample_registry();
        let snap = Snapshot::capture(&reg, Some(DeviceId::intern("5")));
        let rebuilt = snap.devices[0].to_device().unwrap();
        let original = reg.get(DeviceId::intern("5")).unwrap();

        assert_eq!(rebuilt.scale(), 2.5);
        assert_eq!(rebuilt.visual_order().as_slice(), &[p(3), p(1), p(2)]);
        assert_eq!(DeviceRecord::from(&rebuilt), DeviceRecord::from(original));
    }

    #[test]
    fn json_roundtrip_and_version_check() {
        let snap = Snapshot::capture(&sample_registry(), None);
        let json = snap.to_json();
        assert!(json.contains("\"off_color\":\"#333333\""));
        assert_eq!(Snapshot::from_json(&json).unwrap(), snap);

        let future = json.replace("\"version\":1", "\"version\":9");
        assert!(Snapshot::from_json(&future).is_err());
        assert!(Snapshot::from_json("{").is_err());
    }

    #[test]
    fn record_without_indicators_is_rejected() {
        let record = DeviceRecord {
            id: DeviceId::intern("1"),
            name: "Empty".into(),
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            indicators: Vec::new(),
        };
        assert!(matches!(
            record.to_device(),
            Err(FloorplanError::InvalidOrder { .. })
        ));
    }
}
