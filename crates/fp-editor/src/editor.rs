//! The editor: one open document, its devices, history and selection.
//!
//! Every public mutation follows the same shape: look the target up, work
//! out whether anything would change, record the pre-edit snapshot, then
//! apply the change to the registry and mirror it into the scene. Missing
//! targets and no-op edits return `false` without touching history.

use crate::config::EditorConfig;
use crate::events::{EditorEvent, EventBus, SubscriptionId};
use crate::gesture::Gesture;
use crate::history::History;
use crate::selection::Selection;
use fp_core::layout::{clamp_scale, handle_geometry, tile_geometry};
use fp_core::{
    Color, DashboardSnapshot, Device, DeviceId, DeviceRecord, DeviceRegistry, ExportDiagnostic,
    FloorplanError, Indicator, IndicatorIndex, Result, SceneAdapter, Snapshot, validate_export,
};
use smallvec::SmallVec;
use std::num::NonZeroU32;

pub struct Editor<S: SceneAdapter> {
    pub(crate) scene: S,
    pub(crate) registry: DeviceRegistry,
    pub(crate) history: History,
    pub(crate) selection: Selection,
    pub(crate) events: EventBus,
    pub(crate) config: EditorConfig,
    pub(crate) gesture: Option<Gesture>,
    loaded: bool,
    /// Last `(can_undo, can_redo)` reported to listeners.
    history_flags: (bool, bool),
}

impl<S: SceneAdapter> Editor<S> {
    pub fn new(scene: S) -> Self {
        Self::with_config(scene, EditorConfig::default())
    }

    pub fn with_config(scene: S, config: EditorConfig) -> Self {
        Self {
            scene,
            registry: DeviceRegistry::new(),
            history: History::new(config.max_undo_depth),
            selection: Selection::default(),
            events: EventBus::default(),
            config,
            gesture: None,
            loaded: false,
            history_flags: (false, false),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Direct scene access for view-only changes such as zoom. Call
    /// [`Self::refresh_handles`] after changing anything that affects
    /// handle size.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.registry.get(id)
    }

    /// Strict lookup for callers that want an error instead of `None`.
    ///
    /// # Errors
    /// `NotFound` if no device has this id.
    pub fn require_device(&self, id: DeviceId) -> Result<&Device> {
        self.registry.get(id).ok_or_else(|| FloorplanError::NotFound {
            id: id.as_str().to_string(),
        })
    }

    /// All devices in registry order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> + '_ {
        self.registry.list_all()
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Load document text, replacing everything.
    ///
    /// Devices are rebuilt from the markup; history and selection start
    /// empty. On error nothing changes.
    ///
    /// # Errors
    /// `InvalidDocument` if the text does not parse as SVG.
    pub fn load_document(&mut self, text: &str) -> Result<usize> {
        self.scene.load_document(text)?;

        self.gesture = None;
        self.registry = DeviceRegistry::new();
        self.selection.clear();
        self.history.clear();

        let descriptors = self.scene.enumerate_existing_devices();
        for desc in &descriptors {
            let device = Device::from_descriptor(desc);
            let needs_tiles = device.indicators().iter().any(|ind| ind.tile.is_none());
            match self.registry.insert(device) {
                // Tileless groups were given a default indicator.
                Ok(_) if needs_tiles => self.sync_tiles(desc.id, &[]),
                Ok(_) => {}
                Err(err) => log::warn!("skipping device group: {err}"),
            }
        }
        self.loaded = true;
        self.refresh_handles();

        let count = self.registry.len();
        log::debug!("loaded document with {count} devices");
        self.events.emit(&EditorEvent::DocumentLoaded { devices: count });
        self.events.emit(&EditorEvent::DeviceSelected { id: None });
        self.notify_history();
        Ok(count)
    }

    /// Start from a blank drawing of the given size.
    pub fn new_document(&mut self, width: f32, height: f32) -> Result<usize> {
        let blank = fp_core::emit_document(&fp_core::SvgDocument::empty(width, height));
        self.load_document(&blank)
    }

    /// Cleaned SVG for download. `None` before a document is loaded.
    pub fn export_document(&self) -> Option<String> {
        self.scene.export_document(&self.config.export)
    }

    pub fn validate_export(&self) -> Vec<ExportDiagnostic> {
        validate_export(&self.registry)
    }

    /// Read-only device view for the dashboard generator, with the cleaned
    /// SVG attached when a document is loaded.
    pub fn dashboard_snapshot(&self) -> DashboardSnapshot {
        let snapshot = DashboardSnapshot::from_registry(&self.registry);
        match self.export_document() {
            Some(svg) => snapshot.with_svg(svg),
            None => snapshot,
        }
    }

    // ─── Snapshots & history ─────────────────────────────────────────────

    pub fn capture_state(&self) -> Snapshot {
        Snapshot::capture(&self.registry, self.selection.current())
    }

    /// Replace the whole document state with `snapshot`, as one undo step.
    ///
    /// # Errors
    /// `InvalidOrder` or `DuplicateId` if the snapshot is inconsistent; the
    /// current state and history are left untouched.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        let rebuilt = Self::rebuild_registry(snapshot)?;
        if *snapshot == self.capture_state() {
            return Ok(());
        }
        self.record("restore");
        self.install_registry(rebuilt, snapshot.selected);
        self.notify_history();
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        self.settle_for_history();
        let Some(target) = self.history.peek_undo() else {
            return false;
        };
        // Both stacks stay put when the stored state cannot be rebuilt.
        let registry = match Self::rebuild_registry(&target.snapshot) {
            Ok(registry) => registry,
            Err(err) => {
                log::warn!("cannot undo {}: {err}", target.label);
                return false;
            }
        };
        let current = self.capture_state();
        let Some(entry) = self.history.undo(current) else {
            return false;
        };
        log::debug!("undo {}", entry.label);
        self.install_registry(registry, entry.snapshot.selected);
        self.notify_history();
        true
    }

    pub fn redo(&mut self) -> bool {
        self.settle_for_history();
        let Some(target) = self.history.peek_redo() else {
            return false;
        };
        let registry = match Self::rebuild_registry(&target.snapshot) {
            Ok(registry) => registry,
            Err(err) => {
                log::warn!("cannot redo {}: {err}", target.label);
                return false;
            }
        };
        let current = self.capture_state();
        let Some(entry) = self.history.redo(current) else {
            return false;
        };
        log::debug!("redo {}", entry.label);
        self.install_registry(registry, entry.snapshot.selected);
        self.notify_history();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Group the following edits into one undo step.
    pub fn begin_batch(&mut self, label: &str) {
        let current = self.capture_state();
        self.history.begin_batch(current, label);
    }

    /// Close a batch. Returns whether an undo step was recorded.
    pub fn end_batch(&mut self) -> bool {
        let current = self.capture_state();
        let pushed = self.history.end_batch(&current);
        self.notify_history();
        pushed
    }

    /// Run `f` as a single undo step.
    pub fn batch<R>(&mut self, label: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_batch(label);
        let out = f(self);
        self.end_batch();
        out
    }

    // ─── Device lifecycle ────────────────────────────────────────────────

    /// Create a device with default indicators and select it.
    ///
    /// # Errors
    /// `BlankId` for an empty id, `DuplicateId` if the id is taken,
    /// `InvalidDocument` before a document is loaded. None of them touch
    /// registry or history.
    pub fn create_device(
        &mut self,
        id: &str,
        name: &str,
        x: f32,
        y: f32,
        indicator_count: usize,
    ) -> Result<DeviceId> {
        if !self.loaded {
            return Err(FloorplanError::invalid_document("no document loaded"));
        }
        let id = id.trim();
        if id.is_empty() {
            return Err(FloorplanError::BlankId);
        }
        let id = DeviceId::intern(id);
        if self.registry.contains(id) {
            return Err(FloorplanError::DuplicateId {
                id: id.as_str().to_string(),
            });
        }

        self.record("create device");
        if let Err(err) = self.registry.create(id, name, x, y, indicator_count) {
            self.history.discard_last();
            return Err(err);
        }
        self.attach_visuals(id);
        self.select(id);
        log::debug!("created device {id}");
        self.notify_history();
        Ok(id)
    }

    /// Create a device with the next free numeric id at the configured
    /// default position and indicator count.
    ///
    /// # Errors
    /// `InvalidDocument` before a document is loaded.
    pub fn add_device(&mut self, name: &str) -> Result<DeviceId> {
        let id = self.registry.next_free_id();
        let (x, y) = self.config.default_position;
        let count = self.config.default_indicator_count;
        self.create_device(id.as_str(), name, x, y, count)
    }

    pub fn delete_device(&mut self, id: DeviceId) -> bool {
        if !self.registry.contains(id) {
            return false;
        }
        if self.gesture.as_ref().is_some_and(|g| g.device() == id) {
            self.gesture = None;
        }
        self.record("delete device");
        if let Some(device) = self.registry.remove(id)
            && let Some(group) = device.handle
        {
            self.scene.remove_device_group(group);
        }
        if self.selection.is_selected(id) {
            self.selection.clear();
            self.events.emit(&EditorEvent::DeviceSelected { id: None });
        }
        log::debug!("deleted device {id}");
        self.notify_history();
        true
    }

    // ─── Geometry ────────────────────────────────────────────────────────

    /// Move a device's origin. One undo step; emits `DeviceMoved`.
    pub fn set_position(&mut self, id: DeviceId, x: f32, y: f32) -> bool {
        let Some(device) = self.registry.get(id) else {
            return false;
        };
        if device.x == x && device.y == y {
            // Still fold away any residual drag offset.
            if let Some(group) = device.handle {
                self.scene.set_device_transform(group, x, y);
            }
            return false;
        }

        self.record("move device");
        let Some(device) = self.registry.get_mut(id) else {
            return false;
        };
        device.x = x;
        device.y = y;
        if let Some(group) = device.handle {
            self.scene.set_device_transform(group, x, y);
        }
        self.events.emit(&EditorEvent::DeviceMoved { id, x, y });
        self.notify_history();
        true
    }

    /// Set the scale factor (clamped to 0.5..=20) and re-lay tiles.
    pub fn set_scale(&mut self, id: DeviceId, scale: f32) -> bool {
        let Some(device) = self.registry.get(id) else {
            return false;
        };
        let scale = clamp_scale(scale);
        if device.scale() == scale {
            self.layout_visuals(id, scale);
            return false;
        }

        self.record("resize device");
        let Some(device) = self.registry.get_mut(id) else {
            return false;
        };
        let scale = device.set_scale(scale);
        self.layout_visuals(id, scale);
        self.events.emit(&EditorEvent::DeviceResized { id, scale });
        self.notify_history();
        true
    }

    // ─── Naming ──────────────────────────────────────────────────────────

    pub fn set_name(&mut self, id: DeviceId, name: &str) -> bool {
        match self.registry.get(id) {
            Some(device) if device.name != name => {}
            _ => return false,
        }
        self.record("rename device");
        let Some(device) = self.registry.get_mut(id) else {
            return false;
        };
        device.name = name.to_string();
        if let Some(group) = device.handle {
            self.scene.set_device_name(group, name);
        }
        self.notify_history();
        true
    }

    /// Change a device's id (rekey). Markup ids of the group and every tile
    /// follow, and so does the selection.
    ///
    /// Returns `Ok(false)` when `old` is missing or the id is unchanged.
    ///
    /// # Errors
    /// `DuplicateId` if another device already uses `new`.
    pub fn set_device_id(&mut self, old: DeviceId, new: &str) -> Result<bool> {
        let new = new.trim();
        if new.is_empty() || !self.registry.contains(old) {
            return Ok(false);
        }
        let new = DeviceId::intern(new);
        if new == old {
            return Ok(false);
        }
        if self.registry.contains(new) {
            return Err(FloorplanError::DuplicateId {
                id: new.as_str().to_string(),
            });
        }

        self.record("change device id");
        if let Err(err) = self.registry.rekey(old, new) {
            self.history.discard_last();
            return Err(err);
        }
        if let Some(device) = self.registry.get(new) {
            if let Some(group) = device.handle {
                self.scene.set_device_id(group, new);
            }
            for ind in device.indicators() {
                if let Some(tile) = ind.tile {
                    self.scene
                        .set_tile_id(tile, &new.indicator_element_id(ind.index()));
                }
            }
        }
        if self.selection.rekey(old, new) {
            self.events.emit(&EditorEvent::DeviceSelected { id: Some(new) });
        }
        if let Some(Gesture::Drag { device, .. } | Gesture::Resize { device, .. }) =
            self.gesture.as_mut()
            && *device == old
        {
            *device = new;
        }
        log::debug!("rekeyed device {old} -> {new}");
        self.notify_history();
        Ok(true)
    }

    // ─── Indicator data ──────────────────────────────────────────────────

    pub fn set_indicator_color(&mut self, id: DeviceId, index: IndicatorIndex, color: Color) -> bool {
        self.update_indicator(id, index, "indicator color", |ind| ind.color = color)
    }

    pub fn set_indicator_off_color(
        &mut self,
        id: DeviceId,
        index: IndicatorIndex,
        color: Color,
    ) -> bool {
        self.update_indicator(id, index, "indicator off color", |ind| {
            ind.off_color = color;
        })
    }

    pub fn set_indicator_blink(&mut self, id: DeviceId, index: IndicatorIndex, blink: bool) -> bool {
        self.update_indicator(id, index, "indicator blink", |ind| ind.blink = blink)
    }

    pub fn set_indicator_query(
        &mut self,
        id: DeviceId,
        index: IndicatorIndex,
        query: Option<NonZeroU32>,
    ) -> bool {
        self.update_indicator(id, index, "indicator query", |ind| ind.query = query)
    }

    // ─── Indicator set & order ───────────────────────────────────────────

    /// Replace the indicator set with exactly `order`, in that visual order.
    /// Kept P-numbers keep their data; dropped ones lose it.
    ///
    /// # Errors
    /// `InvalidOrder` for an empty set or repeated P-numbers; nothing changes.
    pub fn set_indicator_membership(&mut self, id: DeviceId, order: &[IndicatorIndex]) -> Result<bool> {
        let Some(device) = self.registry.get(id) else {
            return Ok(false);
        };
        let mut trial = device.clone();
        trial.set_indicator_membership(order)?;
        if trial.visual_order() == device.visual_order() {
            return Ok(false);
        }

        self.record("indicator set");
        let removed = match self.registry.get_mut(id) {
            Some(device) => match device.set_indicator_membership(order) {
                Ok(removed) => removed,
                Err(err) => {
                    self.history.discard_last();
                    return Err(err);
                }
            },
            None => return Ok(false),
        };
        self.sync_tiles(id, &removed);
        self.notify_history();
        Ok(true)
    }

    /// Add or remove one P-number, as a checkbox would. Added indicators go
    /// to the bottom. Removing the last indicator is refused.
    pub fn toggle_indicator(&mut self, id: DeviceId, index: IndicatorIndex, on: bool) -> bool {
        let Some(device) = self.registry.get(id) else {
            return false;
        };
        let mut order: SmallVec<[IndicatorIndex; 8]> = device.visual_order();
        match (on, order.iter().position(|&i| i == index)) {
            (true, None) => order.push(index),
            (false, Some(pos)) if order.len() > 1 => {
                order.remove(pos);
            }
            _ => return false,
        }
        self.set_indicator_membership(id, &order).unwrap_or(false)
    }

    /// Re-sequence indicators; data is untouched.
    ///
    /// # Errors
    /// `InvalidOrder` unless `order` is a permutation of the current
    /// P-numbers; nothing changes.
    pub fn reorder_indicators(&mut self, id: DeviceId, order: &[IndicatorIndex]) -> Result<bool> {
        let Some(device) = self.registry.get(id) else {
            return Ok(false);
        };
        let mut trial = device.clone();
        if !trial.reorder(order)? {
            return Ok(false);
        }

        self.record("reorder indicators");
        if let Some(device) = self.registry.get_mut(id) {
            *device = trial;
        }
        self.layout_current(id);
        self.notify_history();
        Ok(true)
    }

    pub fn move_indicator_up(&mut self, id: DeviceId, index: IndicatorIndex) -> bool {
        self.shift_indicator(id, "move indicator up", |d| d.move_up(index))
    }

    pub fn move_indicator_down(&mut self, id: DeviceId, index: IndicatorIndex) -> bool {
        self.shift_indicator(id, "move indicator down", |d| d.move_down(index))
    }

    /// Grow (lowest unused P-numbers first) or shrink (from the bottom) to
    /// `count` indicators, clamped to 1..=8.
    pub fn set_indicator_count(&mut self, id: DeviceId, count: usize) -> bool {
        let Some(device) = self.registry.get(id) else {
            return false;
        };
        let mut trial = device.clone();
        trial.set_indicator_count(count);
        if trial.visual_order() == device.visual_order() {
            return false;
        }

        self.record("indicator count");
        let Some(device) = self.registry.get_mut(id) else {
            return false;
        };
        let removed = device.set_indicator_count(count);
        self.sync_tiles(id, &removed);
        self.notify_history();
        true
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select `id`, or clear the selection if it is not a known device.
    /// Returns whether something is selected afterwards.
    pub fn select(&mut self, id: DeviceId) -> bool {
        let target = self.registry.contains(id).then_some(id);
        self.set_selection(target);
        target.is_some()
    }

    pub fn deselect(&mut self) {
        self.set_selection(None);
    }

    pub fn selected_id(&self) -> Option<DeviceId> {
        self.selection.current()
    }

    pub fn selected(&self) -> Option<&Device> {
        self.registry.get(self.selection.current()?)
    }

    // ─── Events ──────────────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn on_device_moved(&mut self, mut f: impl FnMut(DeviceId, f32, f32) + 'static) -> SubscriptionId {
        self.events.subscribe(move |event| {
            if let EditorEvent::DeviceMoved { id, x, y } = event {
                f(*id, *x, *y);
            }
        })
    }

    pub fn on_device_selected(&mut self, mut f: impl FnMut(Option<DeviceId>) + 'static) -> SubscriptionId {
        self.events.subscribe(move |event| {
            if let EditorEvent::DeviceSelected { id } = event {
                f(*id);
            }
        })
    }

    pub fn on_device_resized(&mut self, mut f: impl FnMut(DeviceId, f32) + 'static) -> SubscriptionId {
        self.events.subscribe(move |event| {
            if let EditorEvent::DeviceResized { id, scale } = event {
                f(*id, *scale);
            }
        })
    }

    // ─── Scene sync ──────────────────────────────────────────────────────

    /// Re-place every resize handle, e.g. after a zoom change.
    pub fn refresh_handles(&mut self) {
        let zoom = self.scene.zoom();
        for device in self.registry.list_all() {
            let Some(group) = device.handle else {
                continue;
            };
            let count = device.indicators().len();
            if count == 0 {
                self.scene.remove_resize_handle(group);
            } else {
                let geometry =
                    handle_geometry(count, device.scale(), zoom, self.config.handle_screen_size);
                self.scene.place_resize_handle(group, geometry);
            }
        }
    }

    /// Lay out tiles and handle for `scale` without touching the registry.
    pub(crate) fn layout_visuals(&mut self, id: DeviceId, scale: f32) {
        let zoom = self.scene.zoom();
        let Some(device) = self.registry.get(id) else {
            return;
        };
        for (slot, ind) in device.indicators().iter().enumerate() {
            if let Some(tile) = ind.tile {
                self.scene.set_tile_geometry(tile, tile_geometry(slot, scale));
            }
        }
        if let Some(group) = device.handle {
            let count = device.indicators().len();
            if count == 0 {
                self.scene.remove_resize_handle(group);
            } else {
                let geometry = handle_geometry(count, scale, zoom, self.config.handle_screen_size);
                self.scene.place_resize_handle(group, geometry);
            }
        }
    }

    pub(crate) fn layout_current(&mut self, id: DeviceId) {
        if let Some(scale) = self.registry.get(id).map(Device::scale) {
            self.layout_visuals(id, scale);
        }
    }

    /// Create the group and tiles of a registry device that has none yet.
    fn attach_visuals(&mut self, id: DeviceId) {
        let Some(device) = self.registry.get_mut(id) else {
            return;
        };
        let group = self.scene.create_device_group(id, &device.name);
        self.scene.set_device_transform(group, device.x, device.y);
        device.handle = Some(group);
        let scale = device.scale();
        for (slot, ind) in device.indicators_mut().enumerate() {
            let element_id = id.indicator_element_id(ind.index());
            let tile = self
                .scene
                .create_indicator_tile(group, &element_id, tile_geometry(slot, scale), ind);
            ind.tile = Some(tile);
        }
        self.layout_visuals(id, scale);
    }

    /// After a membership change: drop tiles of `removed`, create tiles for
    /// indicators without one, then re-lay everything.
    fn sync_tiles(&mut self, id: DeviceId, removed: &[Indicator]) {
        for tile in removed.iter().filter_map(|ind| ind.tile) {
            self.scene.remove_tile(tile);
        }
        if let Some(device) = self.registry.get_mut(id)
            && let Some(group) = device.handle
        {
            let scale = device.scale();
            for (slot, ind) in device.indicators_mut().enumerate() {
                if ind.tile.is_some() {
                    continue;
                }
                let element_id = id.indicator_element_id(ind.index());
                let tile =
                    self.scene
                        .create_indicator_tile(group, &element_id, tile_geometry(slot, scale), ind);
                ind.tile = Some(tile);
            }
        }
        self.layout_current(id);
    }

    fn update_indicator(
        &mut self,
        id: DeviceId,
        index: IndicatorIndex,
        label: &str,
        edit: impl FnOnce(&mut Indicator),
    ) -> bool {
        let Some(current) = self.registry.get(id).and_then(|d| d.indicator(index)) else {
            return false;
        };
        let mut next = current.clone();
        edit(&mut next);
        if next == *current {
            return false;
        }

        self.record(label);
        let Some(live) = self
            .registry
            .get_mut(id)
            .and_then(|d| d.indicator_mut(index))
        else {
            return false;
        };
        *live = next;
        if let Some(tile) = live.tile {
            self.scene.set_fill(tile, live.color);
            self.scene.set_tile_data(tile, live);
        }
        self.notify_history();
        true
    }

    fn shift_indicator(&mut self, id: DeviceId, label: &str, shift: impl FnOnce(&mut Device) -> bool) -> bool {
        let Some(device) = self.registry.get(id) else {
            return false;
        };
        let mut trial = device.clone();
        if !shift(&mut trial) {
            return false;
        }
        self.record(label);
        if let Some(device) = self.registry.get_mut(id) {
            *device = trial;
        }
        self.layout_current(id);
        self.notify_history();
        true
    }

    fn set_selection(&mut self, target: Option<DeviceId>) {
        let previous = self.selection.replace(target);
        if previous == target {
            return;
        }
        if let Some(group) = previous.and_then(|p| self.registry.get(p)).and_then(|d| d.handle) {
            self.scene.set_highlight(group, false);
        }
        if let Some(group) = target.and_then(|t| self.registry.get(t)).and_then(|d| d.handle) {
            self.scene.set_highlight(group, true);
        }
        self.events.emit(&EditorEvent::DeviceSelected { id: target });
    }

    // ─── History plumbing ────────────────────────────────────────────────

    /// Push the pre-edit snapshot.
    fn record(&mut self, label: &str) {
        let snapshot = self.capture_state();
        self.history.before_edit(snapshot, label);
        log::trace!("recorded '{label}' ({} undo steps)", self.history.undo_depth());
    }

    fn notify_history(&mut self) {
        let flags = (self.history.can_undo(), self.history.can_redo());
        if flags != self.history_flags {
            self.history_flags = flags;
            self.events.emit(&EditorEvent::HistoryChanged {
                can_undo: flags.0,
                can_redo: flags.1,
            });
        }
    }

    /// Undo/redo act on committed state: drop any gesture preview and
    /// close open batches first.
    fn settle_for_history(&mut self) {
        self.cancel_gesture();
        while self.history.is_batching() {
            self.end_batch();
        }
    }

    fn rebuild_registry(snapshot: &Snapshot) -> Result<DeviceRegistry> {
        let mut registry = DeviceRegistry::new();
        for record in &snapshot.devices {
            registry.insert(DeviceRecord::to_device(record)?)?;
        }
        Ok(registry)
    }

    /// Tear down every live device and rebuild visuals for `registry`.
    fn install_registry(&mut self, registry: DeviceRegistry, selected: Option<DeviceId>) {
        self.gesture = None;
        for device in self.registry.clear() {
            if let Some(group) = device.handle {
                self.scene.remove_device_group(group);
            }
        }
        self.registry = registry;
        for id in self.registry.ids().to_vec() {
            self.attach_visuals(id);
        }

        let previous = self.selection.clear();
        let selected = selected.filter(|&id| self.registry.contains(id));
        self.selection.replace(selected);
        if let Some(group) = selected.and_then(|id| self.registry.get(id)).and_then(|d| d.handle) {
            self.scene.set_highlight(group, true);
        }
        if previous != selected {
            self.events.emit(&EditorEvent::DeviceSelected { id: selected });
        }
        log::debug!("restored {} devices", self.registry.len());
    }
}

impl<S: SceneAdapter> std::fmt::Debug for Editor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("devices", &self.registry.len())
            .field("selected", &self.selection.current())
            .field("undo", &self.history.undo_depth())
            .field("redo", &self.history.redo_depth())
            .finish_non_exhaustive()
    }
}
