//! FP Editor: interactive editing of a floorplan document.
//!
//! [`Editor`] owns the device registry, undo/redo history, selection and
//! event listeners, and drives any [`fp_core::SceneAdapter`] for visuals.

pub mod config;
pub mod editor;
pub mod events;
pub mod gesture;
pub mod history;
pub mod input;
pub mod selection;

pub use config::EditorConfig;
pub use editor::Editor;
pub use events::{EditorEvent, EventBus, SubscriptionId};
pub use gesture::Gesture;
pub use history::{History, HistoryEntry};
pub use input::{InputEvent, screen_to_document};
pub use selection::Selection;
