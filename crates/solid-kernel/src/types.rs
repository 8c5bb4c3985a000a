use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to a solid in the geometry kernel.
/// Valid only for the kernel session that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelSolidHandle(pub(crate) u64);

impl KernelSolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for KernelSolidHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "solid#{}", self.0)
    }
}

/// Transient kernel-internal entity identifier.
/// Every operation re-issues ids, so an id is only meaningful for the solid it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelId(pub u64);

impl Serialize for KernelId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KernelId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(KernelId)
    }
}

/// The request kinds a kernel serves. Used for logging and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelOp {
    Extrude,
    CutHole,
    Fillet,
    Mirror,
    Tessellate,
}

impl fmt::Display for KernelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KernelOp::Extrude => "extrude",
            KernelOp::CutHole => "cut_hole",
            KernelOp::Fillet => "fillet",
            KernelOp::Mirror => "mirror",
            KernelOp::Tessellate => "tessellate",
        };
        f.write_str(s)
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("extrude failed: {reason}")]
    ExtrudeFailed { reason: String },

    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("fillet failed: {reason}")]
    FilletFailed { reason: String },

    #[error("mirror failed: {reason}")]
    MirrorFailed { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("unknown solid {handle}")]
    SolidNotFound { handle: u64 },

    #[error("entity not found: {id:?}")]
    EntityNotFound { id: KernelId },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

/// A planar outline in the XY plane swept along +Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrudeRequest {
    /// Closed polygon, last point connects back to the first.
    pub outline: Vec<[f64; 2]>,
    /// Z of the bottom cap.
    pub z_start: f64,
    /// Sweep length along +Z. Must be positive.
    pub depth: f64,
}

/// A cylindrical through-cut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoleCut {
    /// Point on the hole axis where the cutter starts.
    pub origin: [f64; 3],
    /// Unit drilling direction.
    pub axis: [f64; 3],
    pub diameter: f64,
    /// Cutter length from `origin` along `axis`.
    pub length: f64,
}

/// Reflection plane through `origin` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MirrorPlane {
    pub origin: [f64; 3],
    pub normal: [f64; 3],
}

impl MirrorPlane {
    pub fn reflect_point(&self, p: [f64; 3]) -> [f64; 3] {
        let d = (0..3)
            .map(|i| (p[i] - self.origin[i]) * self.normal[i])
            .sum::<f64>();
        [
            p[0] - 2.0 * d * self.normal[0],
            p[1] - 2.0 * d * self.normal[1],
            p[2] - 2.0 * d * self.normal[2],
        ]
    }

    pub fn reflect_vector(&self, v: [f64; 3]) -> [f64; 3] {
        let d = v[0] * self.normal[0] + v[1] * self.normal[1] + v[2] * self.normal[2];
        [
            v[0] - 2.0 * d * self.normal[0],
            v[1] - 2.0 * d * self.normal[1],
            v[2] - 2.0 * d * self.normal[2],
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    Line,
    Circle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    Planar,
    Cylindrical,
    Other,
}

/// Geometry of one edge as seen by role resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeInfo {
    pub id: KernelId,
    pub start: [f64; 3],
    pub end: [f64; 3],
    pub curve: CurveKind,
    /// Outward normals of the adjacent planar faces. Curved neighbours are omitted.
    pub face_normals: Vec<[f64; 3]>,
}

impl EdgeInfo {
    pub fn direction(&self) -> [f64; 3] {
        [
            self.end[0] - self.start[0],
            self.end[1] - self.start[1],
            self.end[2] - self.start[2],
        ]
    }

    pub fn length(&self) -> f64 {
        let d = self.direction();
        (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceInfo {
    pub id: KernelId,
    pub surface: SurfaceKind,
    /// Outward normal for planar faces.
    pub normal: Option<[f64; 3]>,
}

/// Axis-aligned box around a solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn from_points<I: IntoIterator<Item = [f64; 3]>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bb = BoundingBox {
            min: first,
            max: first,
        };
        for p in iter {
            for i in 0..3 {
                bb.min[i] = bb.min[i].min(p[i]);
                bb.max[i] = bb.max[i].max(p[i]);
            }
        }
        Some(bb)
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn diagonal(&self) -> f64 {
        let s = self.size();
        (s[0] * s[0] + s[1] * s[1] + s[2] * s[2]).sqrt()
    }
}

/// Tessellated triangle mesh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderMesh {
    /// Flat array of vertex positions [x0, y0, z0, x1, y1, z1, ...].
    pub vertices: Vec<f32>,
    /// Flat array of vertex normals, parallel to `vertices`.
    pub normals: Vec<f32>,
    /// Triangle indices into the vertex array.
    pub indices: Vec<u32>,
    /// Mapping from triangle ranges to logical faces.
    pub face_ranges: Vec<FaceRange>,
}

impl RenderMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex(&self, index: u32) -> [f32; 3] {
        let i = index as usize * 3;
        [self.vertices[i], self.vertices[i + 1], self.vertices[i + 2]]
    }

    /// Triangles as corner positions.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [self.vertex(t[0]), self.vertex(t[1]), self.vertex(t[2])])
    }
}

/// Maps a contiguous range of triangles to a logical face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRange {
    pub face_id: KernelId,
    /// Start index in the indices array (inclusive).
    pub start_index: u32,
    /// End index in the indices array (exclusive).
    pub end_index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_plane_reflects_across_yz() {
        let plane = MirrorPlane {
            origin: [0.0; 3],
            normal: [1.0, 0.0, 0.0],
        };
        assert_eq!(plane.reflect_point([-45.0, -4.0, 10.0]), [45.0, -4.0, 10.0]);
        assert_eq!(plane.reflect_vector([0.0, 1.0, 0.0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn bounding_box_of_points() {
        let bb = BoundingBox::from_points([[0.0, 0.0, 0.0], [4.0, -3.0, 12.0]]).unwrap();
        assert_eq!(bb.size(), [4.0, 3.0, 12.0]);
        assert_eq!(bb.diagonal(), 13.0);
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }
}
