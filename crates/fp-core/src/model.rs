//! Device / indicator data model.
//!
//! A floorplan document holds a flat set of devices. Each device owns an
//! ordered list of 1–8 indicator tiles. An indicator's P-number
//! (`IndicatorIndex`) is its stable identity; its position in the list is
//! its visual order, top to bottom. Reordering never renumbers.

use crate::error::{FloorplanError, Result};
use crate::id::{DeviceId, IndicatorIndex};
use crate::layout;
use crate::scene::{DeviceDescriptor, SceneHandle};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::num::NonZeroU32;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from 8-bit channels.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let nibble = |i: usize| hex_val(bytes[i]).map(|v| v * 17);
        let byte = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);

        let (r, g, b, a) = match bytes.len() {
            3 => (nibble(0)?, nibble(1)?, nibble(2)?, 255),
            4 => (nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?),
            6 => (byte(0)?, byte(2)?, byte(4)?, 255),
            8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
            _ => return None,
        };
        Some(Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ))
    }

    /// Emit as lowercase `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = [self.r, self.g, self.b, self.a].map(|c| (c * 255.0).round() as u8);
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color: {s}")))
    }
}

/// Default ON colors for P1..P8.
pub const PRESET_ON_COLORS: [Color; 8] = [
    Color::rgb8(0x00, 0xff, 0x00),
    Color::rgb8(0xff, 0x88, 0x00),
    Color::rgb8(0xff, 0x00, 0x00),
    Color::rgb8(0x00, 0x88, 0xff),
    Color::rgb8(0xff, 0xff, 0xff),
    Color::rgb8(0xff, 0x00, 0xff),
    Color::rgb8(0x00, 0xff, 0xff),
    Color::rgb8(0xff, 0xff, 0x00),
];

/// OFF color shared by every freshly created indicator.
pub const PRESET_OFF_COLOR: Color = Color::rgb8(0x33, 0x33, 0x33);

/// Preset ON color for a P-number.
pub fn preset_color(index: IndicatorIndex) -> Color {
    PRESET_ON_COLORS[index.table_slot()]
}

// ─── Indicator ───────────────────────────────────────────────────────────

/// One status tile of a device.
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    index: IndicatorIndex,
    /// ON color.
    pub color: Color,
    pub off_color: Color,
    pub blink: bool,
    /// External dashboard query reference (A=1, B=2, …).
    pub query: Option<NonZeroU32>,
    /// Visual tile in the scene, once one has been created.
    pub tile: Option<SceneHandle>,
}

impl Indicator {
    /// A fresh indicator with the preset colors for its P-number.
    pub fn with_defaults(index: IndicatorIndex) -> Self {
        Self {
            index,
            color: preset_color(index),
            off_color: PRESET_OFF_COLOR,
            blink: false,
            query: None,
            tile: None,
        }
    }

    pub fn index(&self) -> IndicatorIndex {
        self.index
    }
}

// ─── Device ──────────────────────────────────────────────────────────────

/// A named, positioned, scaled group of indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    id: DeviceId,
    pub name: String,
    /// Document-space origin of the device group.
    pub x: f32,
    pub y: f32,
    scale: f32,
    indicators: SmallVec<[Indicator; 8]>,
    /// Group element in the scene, once one has been created.
    pub handle: Option<SceneHandle>,
}

impl Device {
    /// Create a device with indicators P1..P`count` (count clamped to 1..=8).
    pub fn new(id: DeviceId, name: impl Into<String>, x: f32, y: f32, count: usize) -> Self {
        let count = count.clamp(1, IndicatorIndex::MAX as usize);
        Self {
            id,
            name: name.into(),
            x,
            y,
            scale: 1.0,
            indicators: IndicatorIndex::all()
                .take(count)
                .map(Indicator::with_defaults)
                .collect(),
            handle: None,
        }
    }

    /// Rebuild a device from markup found in a loaded document.
    ///
    /// Indicators are ordered by their on-screen Y so a reordered device
    /// keeps its visual order across save/load. A group with no tiles gets
    /// a default P1 whose tile the caller still has to create.
    pub fn from_descriptor(desc: &DeviceDescriptor) -> Self {
        let mut found: Vec<_> = desc.indicators.iter().collect();
        found.sort_by(|a, b| a.y.total_cmp(&b.y));

        let mut indicators: SmallVec<[Indicator; 8]> = SmallVec::new();
        for ind in found {
            if indicators.iter().any(|i| i.index == ind.index) {
                continue;
            }
            indicators.push(Indicator {
                index: ind.index,
                color: ind.color.unwrap_or_else(|| preset_color(ind.index)),
                off_color: ind.off_color.unwrap_or(PRESET_OFF_COLOR),
                blink: ind.blink,
                query: ind.query,
                tile: Some(ind.tile),
            });
        }
        if indicators.is_empty() {
            log::warn!("device {} has no indicator tiles, adding P1", desc.id);
            indicators.push(Indicator::with_defaults(IndicatorIndex::P1));
        }

        Self {
            id: desc.id,
            name: desc
                .name
                .clone()
                .unwrap_or_else(|| format!("Device {}", desc.id)),
            x: desc.x,
            y: desc.y,
            scale: layout::clamp_scale(desc.scale),
            indicators,
            handle: Some(desc.group),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    #[cfg(test)]
    pub(crate) fn without_indicators(mut self) -> Self {
        self.indicators.clear();
        self
    }

    pub(crate) fn set_id(&mut self, id: DeviceId) {
        self.id = id;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Set the scale factor, clamped to the allowed range. Returns the stored value.
    pub fn set_scale(&mut self, scale: f32) -> f32 {
        self.scale = layout::clamp_scale(scale);
        self.scale
    }

    /// Indicators in visual order (top to bottom).
    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn indicators_mut(&mut self) -> impl Iterator<Item = &mut Indicator> {
        self.indicators.iter_mut()
    }

    pub fn indicator(&self, index: IndicatorIndex) -> Option<&Indicator> {
        self.indicators.iter().find(|i| i.index == index)
    }

    pub fn indicator_mut(&mut self, index: IndicatorIndex) -> Option<&mut Indicator> {
        self.indicators.iter_mut().find(|i| i.index == index)
    }

    /// Visual slot (0 = top) of the indicator with this P-number.
    pub fn slot_of(&self, index: IndicatorIndex) -> Option<usize> {
        self.indicators.iter().position(|i| i.index == index)
    }

    /// P-numbers in visual order.
    pub fn visual_order(&self) -> SmallVec<[IndicatorIndex; 8]> {
        self.indicators.iter().map(|i| i.index).collect()
    }

    /// Markup id of each indicator tile, in visual order.
    pub fn indicator_element_ids(&self) -> Vec<String> {
        self.indicators
            .iter()
            .map(|i| self.id.indicator_element_id(i.index))
            .collect()
    }

    // ─── Indicator set & order ───────────────────────────────────────────

    /// Replace the indicator set with exactly `order`, in that visual order.
    ///
    /// P-numbers already present keep their colors, blink and query; new ones
    /// get preset defaults. Dropped indicators are returned so the caller can
    /// tear down their tiles. Their settings are not remembered.
    pub fn set_indicator_membership(
        &mut self,
        order: &[IndicatorIndex],
    ) -> Result<SmallVec<[Indicator; 8]>> {
        validate_unique(order)?;

        let mut previous = std::mem::take(&mut self.indicators);
        let mut next: SmallVec<[Indicator; 8]> = SmallVec::new();
        for &index in order {
            match previous.iter().position(|i| i.index == index) {
                Some(pos) => next.push(previous.remove(pos)),
                None => next.push(Indicator::with_defaults(index)),
            }
        }
        self.indicators = next;
        Ok(previous)
    }

    /// Re-sequence indicators without touching their data.
    ///
    /// `order` must be a permutation of the current P-numbers; otherwise
    /// nothing changes. Returns whether the visual order changed.
    pub fn reorder(&mut self, order: &[IndicatorIndex]) -> Result<bool> {
        validate_unique(order)?;
        if order.len() != self.indicators.len()
            || order.iter().any(|&index| self.indicator(index).is_none())
        {
            return Err(FloorplanError::invalid_order(format!(
                "{order:?} is not a permutation of {:?}",
                self.visual_order().as_slice()
            )));
        }
        if self.visual_order().as_slice() == order {
            return Ok(false);
        }

        let mut previous = std::mem::take(&mut self.indicators);
        for &index in order {
            if let Some(pos) = previous.iter().position(|i| i.index == index) {
                self.indicators.push(previous.remove(pos));
            }
        }
        Ok(true)
    }

    /// Swap with the neighbor above. No-op (false) at the top or if absent.
    pub fn move_up(&mut self, index: IndicatorIndex) -> bool {
        match self.slot_of(index) {
            Some(slot) if slot > 0 => {
                self.indicators.swap(slot - 1, slot);
                true
            }
            _ => false,
        }
    }

    /// Swap with the neighbor below. No-op (false) at the bottom or if absent.
    pub fn move_down(&mut self, index: IndicatorIndex) -> bool {
        match self.slot_of(index) {
            Some(slot) if slot + 1 < self.indicators.len() => {
                self.indicators.swap(slot, slot + 1);
                true
            }
            _ => false,
        }
    }

    /// Grow or shrink to `count` indicators (clamped to 1..=8).
    ///
    /// Growth appends the lowest unused P-numbers with preset defaults;
    /// shrinking drops from the bottom of the visual order. Returns the
    /// dropped indicators.
    pub fn set_indicator_count(&mut self, count: usize) -> SmallVec<[Indicator; 8]> {
        let count = count.clamp(1, IndicatorIndex::MAX as usize);
        if count < self.indicators.len() {
            return self.indicators.drain(count..).collect();
        }
        for index in IndicatorIndex::all() {
            if self.indicators.len() >= count {
                break;
            }
            if self.indicator(index).is_none() {
                self.indicators.push(Indicator::with_defaults(index));
            }
        }
        SmallVec::new()
    }
}

/// Reject empty sets and repeated P-numbers.
fn validate_unique(order: &[IndicatorIndex]) -> Result<()> {
    if order.is_empty() {
        return Err(FloorplanError::invalid_order(
            "a device needs at least one indicator",
        ));
    }
    for (i, index) in order.iter().enumerate() {
        if order[..i].contains(index) {
            return Err(FloorplanError::invalid_order(format!(
                "{index} appears more than once"
            )));
        }
    }
    Ok(())
}
