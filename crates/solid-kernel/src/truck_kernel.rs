//! TruckKernel: real geometry kernel wrapping truck's API.

use crate::primitives;
use crate::tessellation;
use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use truck_modeling::builder;
use truck_modeling::geometry::{Curve, Surface};
use truck_modeling::topology::{Edge, Face, Solid, Vertex};
use truck_modeling::Matrix4;

/// Boolean tolerance handed to truck-shapeops.
const BOOLEAN_TOLERANCE: f64 = 0.05;

// Entity ids are derived from the owning handle and the entity's position in
// traversal order: handle * STRIDE + block + index.
const STRIDE: u64 = 10000;
const FACE_BLOCK: u64 = 0;
const EDGE_BLOCK: u64 = 1000;
const VERTEX_BLOCK: u64 = 2000;
const BLOCK_SIZE: u64 = 1000;

/// Real geometry kernel backed by the truck BREP library.
pub struct TruckKernel {
    next_handle: u64,
    solids: HashMap<u64, Solid>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: HashMap::new(),
        }
    }

    pub(crate) fn store_solid(&mut self, solid: Solid) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(h.id(), solid);
        h
    }

    pub(crate) fn get_solid(&self, handle: &KernelSolidHandle) -> Result<&Solid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::SolidNotFound {
                handle: handle.id(),
            })
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(handle: &KernelSolidHandle, block: u64, index: usize) -> KernelId {
    KernelId(handle.id() * STRIDE + block + index as u64)
}

fn decode(handle: &KernelSolidHandle, id: KernelId, block: u64) -> Option<usize> {
    if id.0 / STRIDE != handle.id() {
        return None;
    }
    let local = id.0 % STRIDE;
    (block..block + BLOCK_SIZE)
        .contains(&local)
        .then(|| (local - block) as usize)
}

fn unique_faces(solid: &Solid) -> Vec<Face> {
    solid
        .boundaries()
        .iter()
        .flat_map(|shell| shell.face_iter().map(|f| f.clone()).collect::<Vec<_>>())
        .collect()
}

fn unique_edges(solid: &Solid) -> Vec<Edge> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for shell in solid.boundaries().iter() {
        for edge in shell.edge_iter() {
            if seen.insert(edge.id()) {
                edges.push(edge.clone());
            }
        }
    }
    edges
}

fn unique_vertices(solid: &Solid) -> Vec<Vertex> {
    let mut seen = HashSet::new();
    let mut vertices = Vec::new();
    for shell in solid.boundaries().iter() {
        for v in shell.vertex_iter() {
            if seen.insert(v.id()) {
                vertices.push(v.clone());
            }
        }
    }
    vertices
}

fn planar_normal(face: &Face) -> Option<[f64; 3]> {
    match face.oriented_surface() {
        Surface::Plane(plane) => {
            let n = plane.normal();
            Some([n[0], n[1], n[2]])
        }
        _ => None,
    }
}

fn surface_kind(face: &Face) -> SurfaceKind {
    match face.surface() {
        Surface::Plane(_) => SurfaceKind::Planar,
        Surface::RevolutedCurve(_) => SurfaceKind::Cylindrical,
        Surface::BSplineSurface(_) | Surface::NurbsSurface(_) => SurfaceKind::Other,
    }
}

/// Householder reflection through `plane`, as a homogeneous matrix.
fn reflection_matrix(plane: &MirrorPlane) -> Matrix4 {
    let n = plane.normal;
    let d = 2.0 * (n[0] * plane.origin[0] + n[1] * plane.origin[1] + n[2] * plane.origin[2]);
    let h = |i: usize, j: usize| {
        let delta = if i == j { 1.0 } else { 0.0 };
        delta - 2.0 * n[i] * n[j]
    };
    // Column-major.
    Matrix4::new(
        h(0, 0),
        h(1, 0),
        h(2, 0),
        0.0,
        h(0, 1),
        h(1, 1),
        h(2, 1),
        0.0,
        h(0, 2),
        h(1, 2),
        h(2, 2),
        0.0,
        d * n[0],
        d * n[1],
        d * n[2],
        1.0,
    )
}

impl Kernel for TruckKernel {
    fn extrude(
        &mut self,
        base: Option<&KernelSolidHandle>,
        request: &ExtrudeRequest,
    ) -> Result<KernelSolidHandle, KernelError> {
        if !(request.depth > 0.0) {
            return Err(KernelError::ExtrudeFailed {
                reason: format!("depth must be positive, got {}", request.depth),
            });
        }
        let prism = primitives::make_prism(&request.outline, request.z_start, request.depth)?;
        let solid = match base {
            Some(base) => {
                let base = self.get_solid(base)?.clone();
                truck_shapeops::or(&base, &prism, BOOLEAN_TOLERANCE).ok_or_else(|| {
                    KernelError::BooleanFailed {
                        reason: "truck or() returned None for pad".to_string(),
                    }
                })?
            }
            None => prism,
        };
        Ok(self.store_solid(solid))
    }

    fn cut_hole(
        &mut self,
        solid: &KernelSolidHandle,
        cut: &HoleCut,
    ) -> Result<KernelSolidHandle, KernelError> {
        let target = self.get_solid(solid)?.clone();
        let mut cutter =
            primitives::make_cylinder(cut.origin, cut.axis, cut.diameter / 2.0, cut.length)?;

        // Subtraction = A ∩ ¬B. not() mutates in place.
        cutter.not();
        let result = truck_shapeops::and(&target, &cutter, BOOLEAN_TOLERANCE).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "truck and() returned None for hole cut".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn fillet_edges(
        &mut self,
        _solid: &KernelSolidHandle,
        _edges: &[KernelId],
        _radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        Err(KernelError::NotSupported {
            operation: "fillet_edges".to_string(),
        })
    }

    fn mirror(
        &mut self,
        solid: &KernelSolidHandle,
        plane: &MirrorPlane,
    ) -> Result<KernelSolidHandle, KernelError> {
        let source = self.get_solid(solid)?;
        let n = plane.normal;
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len < 1e-12 {
            return Err(KernelError::MirrorFailed {
                reason: "mirror plane normal has zero length".to_string(),
            });
        }
        let unit = MirrorPlane {
            origin: plane.origin,
            normal: [n[0] / len, n[1] / len, n[2] / len],
        };
        let mut mirrored = builder::transformed(source, reflection_matrix(&unit));
        // A reflection turns every face inside out.
        mirrored.not();
        debug!(handle = solid.id(), "mirrored solid");
        Ok(self.store_solid(mirrored))
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        let truck_solid = self.get_solid(solid)?;
        tessellation::tessellate_solid(truck_solid, tolerance)
    }
}

impl KernelIntrospect for TruckKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Ok(s) = self.get_solid(solid) else {
            return Vec::new();
        };
        (0..unique_faces(s).len())
            .map(|i| encode(solid, FACE_BLOCK, i))
            .collect()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Ok(s) = self.get_solid(solid) else {
            return Vec::new();
        };
        (0..unique_edges(s).len())
            .map(|i| encode(solid, EDGE_BLOCK, i))
            .collect()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Ok(s) = self.get_solid(solid) else {
            return Vec::new();
        };
        (0..unique_vertices(s).len())
            .map(|i| encode(solid, VERTEX_BLOCK, i))
            .collect()
    }

    fn edge_info(&self, solid: &KernelSolidHandle, edge: KernelId) -> Option<EdgeInfo> {
        let s = self.get_solid(solid).ok()?;
        let index = decode(solid, edge, EDGE_BLOCK)?;
        let target = unique_edges(s).into_iter().nth(index)?;
        let front = target.front().point();
        let back = target.back().point();
        let curve = match target.curve() {
            Curve::Line(_) => CurveKind::Line,
            _ => CurveKind::Other,
        };
        let face_normals = unique_faces(s)
            .iter()
            .filter(|f| {
                f.boundaries()
                    .iter()
                    .any(|w| w.edge_iter().any(|e| e.id() == target.id()))
            })
            .filter_map(planar_normal)
            .collect();
        Some(EdgeInfo {
            id: edge,
            start: [front[0], front[1], front[2]],
            end: [back[0], back[1], back[2]],
            curve,
            face_normals,
        })
    }

    fn face_info(&self, solid: &KernelSolidHandle, face: KernelId) -> Option<FaceInfo> {
        let s = self.get_solid(solid).ok()?;
        let index = decode(solid, face, FACE_BLOCK)?;
        let target = unique_faces(s).into_iter().nth(index)?;
        Some(FaceInfo {
            id: face,
            surface: surface_kind(&target),
            normal: planar_normal(&target),
        })
    }

    fn vertex_position(&self, solid: &KernelSolidHandle, vertex: KernelId) -> Option<[f64; 3]> {
        let s = self.get_solid(solid).ok()?;
        let index = decode(solid, vertex, VERTEX_BLOCK)?;
        let p = unique_vertices(s).get(index)?.point();
        Some([p[0], p[1], p[2]])
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Option<BoundingBox> {
        let s = self.get_solid(solid).ok()?;
        BoundingBox::from_points(unique_vertices(s).iter().map(|v| {
            let p = v.point();
            [p[0], p[1], p[2]]
        }))
    }
}
