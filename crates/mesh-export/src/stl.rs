//! STL encoding of a `RenderMesh`, binary and ASCII.

use solid_kernel::RenderMesh;

use crate::error::ExportError;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Reject meshes an STL reader could not make sense of.
fn check_mesh(mesh: &RenderMesh, name: &str) -> Result<usize, ExportError> {
    let fail = |reason: String| ExportError::Encode {
        name: name.to_string(),
        reason,
    };
    let tri_count = mesh.triangle_count();
    if tri_count == 0 {
        return Err(fail("mesh has no triangles".to_string()));
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(fail(format!(
            "{} indices do not form whole triangles",
            mesh.indices.len()
        )));
    }
    let vertex_count = mesh.vertices.len() / 3;
    if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(fail(format!(
            "index {bad} out of range (vertex count = {vertex_count})"
        )));
    }
    Ok(tri_count)
}

/// Facet normal from the winding; degenerate triangles get +Z.
fn facet_normal([a, b, c]: &[[f32; 3]; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Binary STL: 80-byte header, little-endian u32 facet count, then 50 bytes
/// per facet (normal, three corners, zero attribute word).
pub fn encode_binary(mesh: &RenderMesh, name: &str) -> Result<Vec<u8>, ExportError> {
    let tri_count = check_mesh(mesh, name)?;
    let count = u32::try_from(tri_count).map_err(|_| ExportError::Encode {
        name: name.to_string(),
        reason: format!("{tri_count} triangles exceed the binary STL limit"),
    })?;

    let mut buf = Vec::with_capacity(HEADER_LEN + 4 + tri_count * FACET_LEN);
    let header = format!("binary STL: {name}");
    let header = header.as_bytes();
    buf.extend_from_slice(&header[..header.len().min(HEADER_LEN)]);
    buf.resize(HEADER_LEN, 0u8);
    buf.extend_from_slice(&count.to_le_bytes());

    for tri in mesh.triangles() {
        for value in facet_normal(&tri).iter().chain(tri.iter().flatten()) {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
    Ok(buf)
}

pub fn encode_ascii(mesh: &RenderMesh, name: &str) -> Result<String, ExportError> {
    let tri_count = check_mesh(mesh, name)?;
    let mut out = String::with_capacity(tri_count * 256);
    out.push_str(&format!("solid {name}\n"));
    for tri in mesh.triangles() {
        let [nx, ny, nz] = facet_normal(&tri);
        out.push_str(&format!("  facet normal {nx} {ny} {nz}\n"));
        out.push_str("    outer loop\n");
        for [x, y, z] in tri {
            out.push_str(&format!("      vertex {x} {y} {z}\n"));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }
    out.push_str(&format!("endsolid {name}\n"));
    Ok(out)
}
