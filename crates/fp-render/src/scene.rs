//! `SvgScene`: the Scene Adapter over an in-memory SVG document.
//!
//! Device groups are `<g id="device_{id}">` elements carrying a `<title>`,
//! one `<rect>` per indicator and, while interactive, a resize handle rect.
//! Group placement lives in the `transform` attribute; an in-progress drag
//! displaces the children instead, and that residual offset is folded back
//! into the transform when the drag is committed.

use crate::transform::{format_transform, parse_transform, with_origin};
use fp_core::document::{Element, SvgDocument, XmlNode};
use fp_core::emitter::{ExportConfig, INTERACTIVE_CLASS, SELECTED_CLASS, export_document, format_num};
use fp_core::layout::{HandleGeometry, TILE_SIZE, TILE_STROKE_WIDTH, TileGeometry};
use fp_core::parser::parse_document;
use fp_core::scene::{DeviceDescriptor, IndicatorDescriptor, SceneAdapter, SceneHandle};
use fp_core::{Color, DeviceId, Indicator, IndicatorIndex, NodeIndex, Result};
use kurbo::{Affine, Point, Vec2};
use std::collections::HashMap;
use std::num::NonZeroU32;

pub const TILE_STROKE: &str = "#555555";
pub const HANDLE_FILL: &str = "#10D1CD";
pub const HANDLE_STROKE: &str = "#ffffff";
pub const HANDLE_RADIUS: f32 = 2.0;

/// An editable SVG drawing.
#[derive(Debug, Default)]
pub struct SvgScene {
    doc: Option<SvgDocument>,
    nodes: HashMap<SceneHandle, NodeIndex>,
    handles: HashMap<NodeIndex, SceneHandle>,
    next_handle: u64,
    /// Residual child displacement of groups being dragged.
    offsets: HashMap<SceneHandle, Vec2>,
    zoom: f32,
}

impl SvgScene {
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            ..Self::default()
        }
    }

    pub fn document(&self) -> Option<&SvgDocument> {
        self.doc.as_ref()
    }

    /// Set the viewport zoom used to size resize handles. Non-positive
    /// values are ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom > 0.0 && zoom.is_finite() {
            self.zoom = zoom;
        }
    }

    /// Document node behind a handle, if it is still alive.
    pub fn node(&self, handle: SceneHandle) -> Option<NodeIndex> {
        let idx = *self.nodes.get(&handle)?;
        self.doc.as_ref()?.contains(idx).then_some(idx)
    }

    pub fn element(&self, handle: SceneHandle) -> Option<&Element> {
        let idx = self.node(handle)?;
        self.doc.as_ref()?.element(idx)
    }

    /// The group transform as written in the markup (drag offset excluded).
    pub fn group_transform(&self, group: SceneHandle) -> Option<Affine> {
        let el = self.element(group)?;
        Some(el.attr("transform").map_or(Affine::IDENTITY, parse_transform))
    }

    /// The resize handle rect of a group, if one is placed.
    pub fn resize_handle(&self, group: SceneHandle) -> Option<NodeIndex> {
        let doc = self.doc.as_ref()?;
        let idx = self.node(group)?;
        doc.child_elements(idx).find(|&c| {
            doc.element(c)
                .is_some_and(|el| el.has_class(INTERACTIVE_CLASS))
        })
    }

    fn install(&mut self, mut doc: SvgDocument) {
        // Leftovers from a save that skipped export cleaning.
        let stale: Vec<NodeIndex> = doc
            .descendants(doc.root)
            .into_iter()
            .filter(|&i| doc.element(i).is_some_and(|el| el.has_class(INTERACTIVE_CLASS)))
            .collect();
        for idx in stale {
            doc.remove(idx);
        }
        for idx in doc.descendants(doc.root) {
            if let Some(el) = doc.element_mut(idx) {
                el.remove_class(SELECTED_CLASS);
            }
        }

        self.nodes.clear();
        self.handles.clear();
        self.offsets.clear();
        self.doc = Some(doc);
    }

    fn handle_for(&mut self, idx: NodeIndex) -> SceneHandle {
        if let Some(&handle) = self.handles.get(&idx) {
            return handle;
        }
        self.next_handle += 1;
        let handle = SceneHandle::from_raw(self.next_handle);
        self.nodes.insert(handle, idx);
        self.handles.insert(idx, handle);
        handle
    }

    /// Drop handles for `idx` and everything below it, then remove it.
    fn remove_subtree(&mut self, idx: NodeIndex) {
        let Some(doc) = self.doc.as_mut() else {
            return;
        };
        for node in doc.descendants(idx) {
            if let Some(handle) = self.handles.remove(&node) {
                self.nodes.remove(&handle);
                self.offsets.remove(&handle);
            }
        }
        doc.remove(idx);
    }

    /// Write `x`/`y` of every positioned child of `group`, shifted by `delta`.
    fn shift_children(&mut self, group: NodeIndex, delta: Vec2) {
        let Some(doc) = self.doc.as_mut() else {
            return;
        };
        let children: Vec<NodeIndex> = doc.child_elements(group).collect();
        for child in children {
            let Some(el) = doc.element_mut(child) else {
                continue;
            };
            let (Some(x), Some(y)) = (el.number_attr("x"), el.number_attr("y")) else {
                continue;
            };
            el.set_attr("x", format_num(x + delta.x as f32));
            el.set_attr("y", format_num(y + delta.y as f32));
        }
    }

    fn offset_of(&self, group: SceneHandle) -> Vec2 {
        self.offsets.get(&group).copied().unwrap_or(Vec2::ZERO)
    }

    /// Group transform without its translation.
    fn linear_part(&self, group: SceneHandle) -> Affine {
        self.group_transform(group)
            .unwrap_or(Affine::IDENTITY)
            .with_translation(Vec2::ZERO)
    }

    /// Owning device group of a tile.
    fn group_of(&self, tile: NodeIndex) -> Option<SceneHandle> {
        let parent = self.doc.as_ref()?.parent(tile)?;
        self.handles.get(&parent).copied()
    }

    fn describe_group(&mut self, idx: NodeIndex, id: DeviceId) -> DeviceDescriptor {
        let group = self.handle_for(idx);
        let mut found = Vec::new();
        for index in IndicatorIndex::all() {
            let element_id = id.indicator_element_id(index);
            let tile = self.doc.as_ref().and_then(|doc| {
                doc.descendants(idx)
                    .into_iter()
                    .find(|&n| doc.attr(n, "id") == Some(element_id.as_str()))
            });
            if let Some(tile) = tile {
                found.push((index, tile));
            }
        }

        let mut indicators = Vec::with_capacity(found.len());
        for (index, tile) in found {
            let handle = self.handle_for(tile);
            let Some(el) = self.doc.as_ref().and_then(|doc| doc.element(tile)) else {
                continue;
            };
            indicators.push(IndicatorDescriptor {
                index,
                tile: handle,
                color: el.attr("fill").and_then(Color::from_hex),
                off_color: el.attr("data-off-color").and_then(Color::from_hex),
                blink: el.attr("data-blink") == Some("true"),
                query: el
                    .attr("data-query")
                    .and_then(|q| q.trim().parse::<u32>().ok())
                    .and_then(NonZeroU32::new),
                y: el.number_attr("y").unwrap_or(0.0),
                width: el.number_attr("width").unwrap_or(TILE_SIZE),
            });
        }
        indicators.sort_by(|a, b| a.y.total_cmp(&b.y));

        let (name, origin) = match self.doc.as_ref() {
            Some(doc) => {
                let name = doc
                    .find_child(idx, "title")
                    .map(|t| doc.text_content(t).trim().to_string())
                    .filter(|n| !n.is_empty());
                let origin = doc
                    .attr(idx, "transform")
                    .map_or(Vec2::ZERO, |t| parse_transform(t).translation());
                (name, origin)
            }
            None => (None, Vec2::ZERO),
        };

        DeviceDescriptor {
            id,
            group,
            name,
            x: origin.x as f32,
            y: origin.y as f32,
            scale: indicators.first().map_or(1.0, |i| i.width / TILE_SIZE),
            indicators,
        }
    }

    fn write_tile_geometry(&mut self, idx: NodeIndex, geometry: TileGeometry, offset: Vec2) {
        if let Some(el) = self.doc.as_mut().and_then(|d| d.element_mut(idx)) {
            el.set_attr("x", format_num(offset.x as f32));
            el.set_attr("y", format_num(geometry.offset + offset.y as f32));
            el.set_attr("width", format_num(geometry.size));
            el.set_attr("height", format_num(geometry.size));
            el.set_attr("rx", format_num(geometry.radius));
        }
    }
}

fn query_attr(query: Option<NonZeroU32>) -> String {
    query.map(|q| q.get().to_string()).unwrap_or_default()
}

impl SceneAdapter for SvgScene {
    fn load_document(&mut self, text: &str) -> Result<()> {
        let doc = parse_document(text)?;
        self.install(doc);
        Ok(())
    }

    fn export_document(&self, config: &ExportConfig) -> Option<String> {
        self.doc.as_ref().map(|doc| export_document(doc, config))
    }

    fn enumerate_existing_devices(&mut self) -> Vec<DeviceDescriptor> {
        let groups: Vec<(NodeIndex, DeviceId)> = match self.doc.as_ref() {
            Some(doc) => doc
                .elements_with_id(|id| DeviceId::from_group_element_id(id).is_some())
                .into_iter()
                .filter(|&idx| doc.element(idx).is_some_and(|el| el.tag == "g"))
                .filter_map(|idx| {
                    let id = DeviceId::from_group_element_id(doc.attr(idx, "id")?)?;
                    Some((idx, id))
                })
                .collect(),
            None => Vec::new(),
        };

        let mut seen: Vec<DeviceId> = Vec::new();
        let mut out = Vec::with_capacity(groups.len());
        for (idx, id) in groups {
            if seen.contains(&id) {
                log::warn!("ignoring second group for device {id}");
                continue;
            }
            seen.push(id);
            out.push(self.describe_group(idx, id));
        }
        log::debug!("found {} device groups", out.len());
        out
    }

    fn create_device_group(&mut self, id: DeviceId, name: &str) -> SceneHandle {
        let Some(doc) = self.doc.as_mut() else {
            return SceneHandle::from_raw(0);
        };
        let root = doc.root;
        let group = doc.append_element(
            root,
            Element::new("g").with_attr("id", id.group_element_id()),
        );
        let title = doc.append_element(group, Element::new("title"));
        doc.append(title, XmlNode::Text(name.to_string()));
        log::trace!("created group for device {id}");
        self.handle_for(group)
    }

    fn remove_device_group(&mut self, group: SceneHandle) {
        if let Some(idx) = self.node(group) {
            self.remove_subtree(idx);
        }
    }

    fn set_device_id(&mut self, group: SceneHandle, id: DeviceId) {
        if let Some(idx) = self.node(group)
            && let Some(doc) = self.doc.as_mut()
        {
            doc.set_attr(idx, "id", id.group_element_id());
        }
    }

    fn set_device_name(&mut self, group: SceneHandle, name: &str) {
        let Some(idx) = self.node(group) else {
            return;
        };
        let Some(doc) = self.doc.as_mut() else {
            return;
        };
        let title = match doc.find_child(idx, "title") {
            Some(title) => title,
            None => doc.append_element(idx, Element::new("title")),
        };
        doc.set_text_content(title, name);
    }

    fn set_device_transform(&mut self, group: SceneHandle, x: f32, y: f32) {
        let Some(idx) = self.node(group) else {
            return;
        };
        if let Some(offset) = self.offsets.remove(&group) {
            self.shift_children(idx, -offset);
        }
        let current = self.group_transform(group).unwrap_or(Affine::IDENTITY);
        if let Some(doc) = self.doc.as_mut() {
            doc.set_attr(idx, "transform", format_transform(with_origin(current, x, y)));
        }
    }

    fn read_resolved_transform(&self, group: SceneHandle) -> Option<(f32, f32)> {
        let transform = self.group_transform(group)?;
        // Offsets live in group-local units.
        let shift = (self.linear_part(group) * self.offset_of(group).to_point()).to_vec2();
        let origin = transform.translation() + shift;
        Some((origin.x as f32, origin.y as f32))
    }

    fn preview_offset(&mut self, group: SceneHandle, dx: f32, dy: f32) {
        let Some(idx) = self.node(group) else {
            return;
        };
        let linear = self.linear_part(group);
        if linear.determinant().abs() < f64::EPSILON {
            return;
        }
        let next = (linear.inverse() * Point::new(f64::from(dx), f64::from(dy))).to_vec2();
        let delta = next - self.offset_of(group);
        self.shift_children(idx, delta);
        self.offsets.insert(group, next);
    }

    fn set_highlight(&mut self, group: SceneHandle, on: bool) {
        let Some(idx) = self.node(group) else {
            return;
        };
        if let Some(el) = self.doc.as_mut().and_then(|d| d.element_mut(idx)) {
            if on {
                el.add_class(SELECTED_CLASS);
            } else {
                el.remove_class(SELECTED_CLASS);
            }
        }
    }

    fn create_indicator_tile(
        &mut self,
        group: SceneHandle,
        element_id: &str,
        geometry: TileGeometry,
        indicator: &Indicator,
    ) -> SceneHandle {
        let Some(group_idx) = self.node(group) else {
            return SceneHandle::from_raw(0);
        };
        let offset = self.offset_of(group);
        let handle_rect = self.resize_handle(group);
        let Some(doc) = self.doc.as_mut() else {
            return SceneHandle::from_raw(0);
        };
        let rect = Element::new("rect")
            .with_attr("id", element_id)
            .with_attr("fill", indicator.color.to_hex())
            .with_attr("stroke", TILE_STROKE)
            .with_attr("stroke-width", format_num(TILE_STROKE_WIDTH))
            .with_attr("data-query", query_attr(indicator.query))
            .with_attr("data-off-color", indicator.off_color.to_hex())
            .with_attr("data-blink", indicator.blink.to_string());
        let idx = doc.append_element(group_idx, rect);
        if let Some(handle_rect) = handle_rect {
            doc.bring_to_front(handle_rect);
        }
        self.write_tile_geometry(idx, geometry, offset);
        self.handle_for(idx)
    }

    fn set_fill(&mut self, tile: SceneHandle, color: Color) {
        if let Some(idx) = self.node(tile)
            && let Some(doc) = self.doc.as_mut()
        {
            doc.set_attr(idx, "fill", color.to_hex());
        }
    }

    fn set_tile_data(&mut self, tile: SceneHandle, indicator: &Indicator) {
        let Some(idx) = self.node(tile) else {
            return;
        };
        if let Some(el) = self.doc.as_mut().and_then(|d| d.element_mut(idx)) {
            el.set_attr("data-off-color", indicator.off_color.to_hex());
            el.set_attr("data-blink", indicator.blink.to_string());
            el.set_attr("data-query", query_attr(indicator.query));
        }
    }

    fn set_tile_id(&mut self, tile: SceneHandle, element_id: &str) {
        if let Some(idx) = self.node(tile)
            && let Some(doc) = self.doc.as_mut()
        {
            doc.set_attr(idx, "id", element_id);
        }
    }

    fn set_tile_geometry(&mut self, tile: SceneHandle, geometry: TileGeometry) {
        let Some(idx) = self.node(tile) else {
            return;
        };
        let offset = self
            .group_of(idx)
            .map_or(Vec2::ZERO, |group| self.offset_of(group));
        self.write_tile_geometry(idx, geometry, offset);
    }

    fn remove_tile(&mut self, tile: SceneHandle) {
        if let Some(idx) = self.node(tile) {
            self.remove_subtree(idx);
        }
    }

    fn place_resize_handle(&mut self, group: SceneHandle, geometry: HandleGeometry) {
        let Some(group_idx) = self.node(group) else {
            return;
        };
        let offset = self.offset_of(group);
        let existing = self.resize_handle(group);
        let Some(doc) = self.doc.as_mut() else {
            return;
        };
        let idx = match existing {
            Some(idx) => idx,
            None => doc.append_element(
                group_idx,
                Element::new("rect")
                    .with_attr("class", INTERACTIVE_CLASS)
                    .with_attr("fill", HANDLE_FILL)
                    .with_attr("stroke", HANDLE_STROKE)
                    .with_attr("stroke-width", format_num(TILE_STROKE_WIDTH))
                    .with_attr("rx", format_num(HANDLE_RADIUS))
                    .with_attr("style", "cursor: nwse-resize"),
            ),
        };
        if let Some(el) = doc.element_mut(idx) {
            el.set_attr("x", format_num(geometry.x + offset.x as f32));
            el.set_attr("y", format_num(geometry.y + offset.y as f32));
            el.set_attr("width", format_num(geometry.size));
            el.set_attr("height", format_num(geometry.size));
        }
        doc.bring_to_front(idx);
    }

    fn remove_resize_handle(&mut self, group: SceneHandle) {
        while let Some(idx) = self.resize_handle(group) {
            self.remove_subtree(idx);
        }
    }

    fn zoom(&self) -> f32 {
        self.zoom
    }
}
