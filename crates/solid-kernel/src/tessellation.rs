//! Tessellation wrapper with face-range metadata.

use crate::types::*;
use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::MeshableShape;

type TruckSolid = truck_modeling::Solid;

/// Tessellate a truck Solid into a RenderMesh, one face range per B-rep face.
pub fn tessellate_solid(
    solid: &TruckSolid,
    tolerance: f64,
) -> std::result::Result<RenderMesh, KernelError> {
    let meshed_solid = solid.triangulation(tolerance);

    let mut mesh = RenderMesh::default();
    let mut face_index = 0u64;

    for shell in meshed_solid.boundaries().iter() {
        for face in shell.face_iter() {
            let face_id = KernelId(face_index);
            face_index += 1;

            let maybe_mesh: Option<PolygonMesh> = face.surface();
            let Some(face_mesh) = maybe_mesh else {
                continue;
            };

            // Inverted faces need their triangles flipped to keep outward winding.
            let face_mesh = if !face.orientation() {
                let mut m = face_mesh;
                m.invert();
                m
            } else {
                face_mesh
            };

            let start_index = mesh.indices.len() as u32;
            let base_vertex = (mesh.vertices.len() / 3) as u32;

            let positions = face_mesh.positions();
            let normals = face_mesh.normals();

            for pos in positions {
                mesh.vertices
                    .extend_from_slice(&[pos[0] as f32, pos[1] as f32, pos[2] as f32]);
            }
            if normals.len() == positions.len() {
                for norm in normals {
                    mesh.normals
                        .extend_from_slice(&[norm[0] as f32, norm[1] as f32, norm[2] as f32]);
                }
            } else {
                mesh.normals
                    .extend(std::iter::repeat(0.0).take(positions.len() * 3));
            }

            for tri in face_mesh.tri_faces() {
                for v in tri.iter() {
                    mesh.indices.push(v.pos as u32 + base_vertex);
                }
            }

            let end_index = mesh.indices.len() as u32;
            if end_index > start_index {
                mesh.face_ranges.push(FaceRange {
                    face_id,
                    start_index,
                    end_index,
                });
            }
        }
    }

    if mesh.indices.is_empty() {
        return Err(KernelError::TessellationFailed {
            reason: "triangulation produced no triangles".to_string(),
        });
    }
    Ok(mesh)
}
