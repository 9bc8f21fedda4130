//! Editor configuration.

use fp_core::ExportConfig;
use serde::Deserialize;

/// Tunables for an [`Editor`](crate::Editor). Every field has a default,
/// so a host can deserialize a partial JSON object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo steps kept before the oldest is discarded.
    pub max_undo_depth: usize,
    /// Indicators on a device created without an explicit count.
    pub default_indicator_count: usize,
    /// Where a device is placed when the host gives no position.
    pub default_position: (f32, f32),
    /// Document units of vertical drag per unit of scale on the resize handle.
    pub resize_sensitivity: f32,
    /// On-screen edge length of the resize handle, in pixels.
    pub handle_screen_size: f32,
    pub export: ExportConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: 50,
            default_indicator_count: 5,
            default_position: (100.0, 100.0),
            resize_sensitivity: 100.0,
            handle_screen_size: 28.0,
            export: ExportConfig::default(),
        }
    }
}
