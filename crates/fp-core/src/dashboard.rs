//! Read-only view of the registry for the external dashboard generator.
//!
//! Everything here is derived from `(device id, P-number)` so the same
//! registry always yields the same snapshot.

use crate::id::{DeviceId, IndicatorIndex};
use crate::model::Color;
use crate::registry::DeviceRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::num::NonZeroU32;

/// Binds a dashboard series name to an SVG element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SvgMapping {
    pub mapped_name: String,
    pub svg_id: String,
}

/// ON/OFF colors for one P-number of one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorMapping {
    #[serde(rename = "ON")]
    pub on: Color,
    #[serde(rename = "OFF")]
    pub off: Color,
    pub blink: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<NonZeroU32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardDevice {
    /// Position in registry order; selects the device's query series.
    pub query: usize,
    pub id: DeviceId,
    pub name: String,
    /// Keyed by `P{n}`.
    pub color_map: BTreeMap<String, ColorMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub svg_mappings: Vec<SvgMapping>,
    pub devices: Vec<DashboardDevice>,
    /// Every P-number used by any device, ascending.
    pub p_indices: Vec<u8>,
    /// `P1|P3|…` over `p_indices`, for a field filter.
    pub field_pattern: String,
    /// Cleaned SVG markup, when the caller attached it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg_source: Option<String>,
}

impl DashboardSnapshot {
    pub fn from_registry(registry: &DeviceRegistry) -> Self {
        let mut svg_mappings = Vec::new();
        let mut devices = Vec::with_capacity(registry.len());
        let mut used: Vec<IndicatorIndex> = Vec::new();

        for (query, device) in registry.list_all().enumerate() {
            let mut color_map = BTreeMap::new();
            for ind in device.indicators() {
                let element_id = device.id().indicator_element_id(ind.index());
                svg_mappings.push(SvgMapping {
                    mapped_name: element_id.clone(),
                    svg_id: element_id,
                });
                color_map.insert(
                    ind.index().to_string(),
                    ColorMapping {
                        on: ind.color,
                        off: ind.off_color,
                        blink: ind.blink,
                        query: ind.query,
                    },
                );
                if !used.contains(&ind.index()) {
                    used.push(ind.index());
                }
            }
            devices.push(DashboardDevice {
                query,
                id: device.id(),
                name: device.name.clone(),
                color_map,
            });
        }

        used.sort();
        let field_pattern = used
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("|");

        Self {
            svg_mappings,
            devices,
            p_indices: used.iter().map(|i| i.get()).collect(),
            field_pattern,
            svg_source: None,
        }
    }

    /// Attach exported SVG markup.
    #[must_use]
    pub fn with_svg(mut self, svg: String) -> Self {
        self.svg_source = Some(svg);
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(n: u8) -> IndicatorIndex {
        IndicatorIndex::new(n).unwrap()
    }

    #[test]
    fn mappings_follow_visual_order() {
        let mut reg = DeviceRegistry::new();
        let a = reg.create(DeviceId::intern("12"), "Boiler", 0.0, 0.0, 3).unwrap();
        a.reorder(&[p(3), p(1), p(2)]).unwrap();
        let b = reg.create(DeviceId::intern("4"), "Fan", 0.0, 0.0, 1).unwrap();
        b.set_indicator_membership(&[p(6)]).unwrap();

        let snap = DashboardSnapshot::from_registry(&reg);
        let ids: Vec<_> = snap.svg_mappings.iter().map(|m| m.svg_id.as_str()).collect();
        assert_eq!(ids, vec!["dev_12_p3", "dev_12_p1", "dev_12_p2", "dev_4_p6"]);
        assert!(snap.svg_mappings.iter().all(|m| m.mapped_name == m.svg_id));
        assert_eq!(snap.p_indices, vec![1, 2, 3, 6]);
        assert_eq!(snap.field_pattern, "P1|P2|P3|P6");
        assert_eq!(snap.devices[1].query, 1);
        assert_eq!(snap.devices[1].color_map["P6"].on.to_hex(), "#ff00ff");
    }

    #[test]
    fn json_shape() {
        let mut reg = DeviceRegistry::new();
        reg.create(DeviceId::intern("1"), "A", 0.0, 0.0, 1).unwrap();
        let json = DashboardSnapshot::from_registry(&reg)
            .with_svg("<svg/>".into())
            .to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["devices"][0]["id"], "1");
        assert_eq!(value["devices"][0]["color_map"]["P1"]["ON"], "#00ff00");
        assert_eq!(value["devices"][0]["color_map"]["P1"]["OFF"], "#333333");
        assert_eq!(value["svg_source"], "<svg/>");
    }
}
