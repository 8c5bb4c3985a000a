use bracket_types::RoleTag;
use part_assembler::Part;
use solid_kernel::KernelBundle;
use tracing::{info, instrument, warn};

use crate::error::ExportError;
use crate::writer::MeshWriter;

/// Linear deflection used when none is configured (mm).
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// What was written for one part.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedArtifact {
    pub name: String,
    pub location: String,
    pub triangles: usize,
}

/// Deterministic artifact name for a role, e.g. `bottom_bracket_right`.
pub fn artifact_name(role: RoleTag) -> String {
    role.to_string()
}

/// Hands finished parts to a [`MeshWriter`].
pub struct Exporter<W> {
    writer: W,
    tolerance: f64,
}

impl<W: MeshWriter> Exporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Tessellate `part` and write it once. The part is consumed either way.
    #[instrument(skip_all, fields(role = %part.role()))]
    pub fn export(
        &mut self,
        kernel: &mut dyn KernelBundle,
        part: Part,
    ) -> Result<ExportedArtifact, ExportError> {
        let name = artifact_name(part.role());
        let mesh = kernel
            .tessellate(part.handle(), self.tolerance)
            .map_err(|source| ExportError::Tessellate {
                name: name.clone(),
                source,
            })?;
        let location = self.writer.write(&name, &mesh)?;
        info!(%name, triangles = mesh.triangle_count(), %location, "exported part");
        Ok(ExportedArtifact {
            name,
            location,
            triangles: mesh.triangle_count(),
        })
    }

    /// Export every part; one failure does not stop the rest.
    pub fn export_all(
        &mut self,
        kernel: &mut dyn KernelBundle,
        parts: Vec<Part>,
    ) -> Vec<(RoleTag, Result<ExportedArtifact, ExportError>)> {
        parts
            .into_iter()
            .map(|part| {
                let role = part.role();
                let result = self.export(kernel, part);
                if let Err(e) = &result {
                    warn!(%role, error = %e, "export failed");
                }
                (role, result)
            })
            .collect()
    }
}
