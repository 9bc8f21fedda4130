//! Scene Adapter boundary.
//!
//! The editor never touches rendering primitives directly. Every visual
//! change goes through [`SceneAdapter`], and the editor keeps only opaque
//! [`SceneHandle`]s.

use crate::emitter::ExportConfig;
use crate::error::Result;
use crate::id::{DeviceId, IndicatorIndex};
use crate::layout::{HandleGeometry, TileGeometry};
use crate::model::{Color, Indicator};
use std::num::NonZeroU32;

/// Opaque reference to a visual element owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneHandle(u64);

impl SceneHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// An indicator tile found in a loaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorDescriptor {
    pub index: IndicatorIndex,
    pub tile: SceneHandle,
    /// `fill` attribute, if it parsed as a color.
    pub color: Option<Color>,
    /// `data-off-color` attribute, if present and a color.
    pub off_color: Option<Color>,
    pub blink: bool,
    pub query: Option<NonZeroU32>,
    /// Local Y of the tile; sorts the visual order.
    pub y: f32,
    pub width: f32,
}

/// A device group found in a loaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    pub group: SceneHandle,
    /// `<title>` text, if any.
    pub name: Option<String>,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub indicators: Vec<IndicatorDescriptor>,
}

/// Visual collaborator the editor drives.
///
/// Implementations own the scene graph. Every method tolerates a stale
/// handle by doing nothing; the editor may race a delete in the UI.
pub trait SceneAdapter {
    // ─── Document boundary ───────────────────────────────────────────────

    /// Replace the whole scene with a parsed document. On error the
    /// previous scene must be left as it was.
    fn load_document(&mut self, text: &str) -> Result<()>;

    /// Serialize the current scene, stripping interactive affordances as
    /// `config` asks. `None` before any document was loaded.
    fn export_document(&self, config: &ExportConfig) -> Option<String>;

    /// Device groups present in the loaded markup. Mints the handles the
    /// descriptors carry, hence `&mut`.
    fn enumerate_existing_devices(&mut self) -> Vec<DeviceDescriptor>;

    // ─── Device groups ───────────────────────────────────────────────────

    fn create_device_group(&mut self, id: DeviceId, name: &str) -> SceneHandle;

    fn remove_device_group(&mut self, group: SceneHandle);

    /// Rewrite the group's markup id after a rekey.
    fn set_device_id(&mut self, group: SceneHandle, id: DeviceId);

    fn set_device_name(&mut self, group: SceneHandle, name: &str);

    /// Set the group translation and clear any residual drag offset.
    fn set_device_transform(&mut self, group: SceneHandle, x: f32, y: f32);

    /// Document-space origin of the group as currently displayed,
    /// including any offset left behind by an in-progress drag.
    fn read_resolved_transform(&self, group: SceneHandle) -> Option<(f32, f32)>;

    /// Visual-only displacement during a drag; never committed by itself.
    fn preview_offset(&mut self, group: SceneHandle, dx: f32, dy: f32);

    fn set_highlight(&mut self, group: SceneHandle, on: bool);

    // ─── Indicator tiles ─────────────────────────────────────────────────

    fn create_indicator_tile(
        &mut self,
        group: SceneHandle,
        element_id: &str,
        geometry: TileGeometry,
        indicator: &Indicator,
    ) -> SceneHandle;

    fn set_fill(&mut self, tile: SceneHandle, color: Color);

    /// Write OFF color, blink flag and query reference onto the tile.
    fn set_tile_data(&mut self, tile: SceneHandle, indicator: &Indicator);

    fn set_tile_id(&mut self, tile: SceneHandle, element_id: &str);

    fn set_tile_geometry(&mut self, tile: SceneHandle, geometry: TileGeometry);

    fn remove_tile(&mut self, tile: SceneHandle);

    // ─── Resize handle ───────────────────────────────────────────────────

    /// Create or move the group's resize handle, keeping it on top.
    fn place_resize_handle(&mut self, group: SceneHandle, geometry: HandleGeometry);

    fn remove_resize_handle(&mut self, group: SceneHandle);

    /// Current viewport zoom; the handle keeps a constant on-screen size.
    fn zoom(&self) -> f32 {
        1.0
    }
}
