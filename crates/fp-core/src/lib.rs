pub mod dashboard;
pub mod document;
pub mod emitter;
pub mod error;
pub mod id;
pub mod layout;
pub mod model;
pub mod parser;
pub mod registry;
pub mod scene;
pub mod snapshot;
pub mod validate;

pub use dashboard::DashboardSnapshot;
pub use document::{Element, SvgDocument, ViewBox, XmlNode};
pub use emitter::{ExportConfig, emit_document, export_document};
pub use error::{FloorplanError, Result};
pub use id::{DeviceId, IndicatorIndex};
pub use model::*;
pub use parser::parse_document;
pub use registry::DeviceRegistry;
pub use scene::{DeviceDescriptor, IndicatorDescriptor, SceneAdapter, SceneHandle};
pub use snapshot::{DeviceRecord, IndicatorRecord, SNAPSHOT_VERSION, Snapshot};
pub use validate::{ExportDiagnostic, ExportSeverity, validate_export};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
