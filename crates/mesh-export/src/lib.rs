//! Writes finished parts out as meshes.

pub mod error;
pub mod exporter;
pub mod stl;
pub mod writer;

pub use error::ExportError;
pub use exporter::{artifact_name, ExportedArtifact, Exporter, DEFAULT_TOLERANCE};
pub use writer::{MemoryWriter, MeshWriter, StlDirWriter, StlFormat};
