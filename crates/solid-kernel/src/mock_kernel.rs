//! MockKernel: deterministic test double implementing Kernel + KernelIntrospect.
//!
//! Solids are plain vertex/edge/face tables with real coordinates, so bounding
//! boxes, mirroring and edge queries behave like a real kernel's. Booleans are
//! approximated: a pad appends the new prism's topology, a hole cut appends a
//! cylindrical wall, a fillet swaps the edge for a curved face.

use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone)]
struct MockVertex {
    id: KernelId,
    position: [f64; 3],
}

#[derive(Debug, Clone)]
struct MockEdge {
    id: KernelId,
    start: KernelId,
    end: KernelId,
    curve: CurveKind,
}

#[derive(Debug, Clone)]
struct MockFace {
    id: KernelId,
    edges: Vec<KernelId>,
    /// Vertex loop, counter-clockwise seen from outside. Empty for curved faces.
    boundary: Vec<KernelId>,
    surface: SurfaceKind,
    normal: [f64; 3],
}

#[derive(Debug, Clone, Default)]
struct MockSolid {
    vertices: Vec<MockVertex>,
    edges: Vec<MockEdge>,
    faces: Vec<MockFace>,
}

impl MockSolid {
    fn position(&self, id: KernelId) -> Option<[f64; 3]> {
        self.vertices
            .iter()
            .find(|v| v.id == id)
            .map(|v| v.position)
    }

    fn faces_of_edge(&self, edge: KernelId) -> impl Iterator<Item = &MockFace> + '_ {
        self.faces.iter().filter(move |f| f.edges.contains(&edge))
    }
}

/// Deterministic test double for the geometry kernel.
pub struct MockKernel {
    next_id: u64,
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    /// Pending injected failures: op -> successful calls left before it fails.
    failures: HashMap<KernelOp, usize>,
    calls: Vec<KernelOp>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_handle: 1,
            solids: HashMap::new(),
            failures: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// Make the next call of `op` fail once.
    pub fn fail_next(&mut self, op: KernelOp) {
        self.fail_after(op, 0);
    }

    /// Let `successes` calls of `op` through, then fail the following one.
    pub fn fail_after(&mut self, op: KernelOp, successes: usize) {
        self.failures.insert(op, successes);
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> &[KernelOp] {
        &self.calls
    }

    pub fn call_count(&self, op: KernelOp) -> usize {
        self.calls.iter().filter(|&&c| c == op).count()
    }

    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    fn begin(&mut self, op: KernelOp) -> Result<(), KernelError> {
        self.calls.push(op);
        let Some(remaining) = self.failures.get_mut(&op) else {
            return Ok(());
        };
        if *remaining > 0 {
            *remaining -= 1;
            return Ok(());
        }
        self.failures.remove(&op);
        let reason = "injected failure".to_string();
        Err(match op {
            KernelOp::Extrude => KernelError::ExtrudeFailed { reason },
            KernelOp::CutHole => KernelError::BooleanFailed { reason },
            KernelOp::Fillet => KernelError::FilletFailed { reason },
            KernelOp::Mirror => KernelError::MirrorFailed { reason },
            KernelOp::Tessellate => KernelError::TessellationFailed { reason },
        })
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn store(&mut self, solid: MockSolid) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(h.id(), solid);
        h
    }

    fn get(&self, handle: &KernelSolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::SolidNotFound {
                handle: handle.id(),
            })
    }

    /// Copy `from` into `into` under fresh ids, mapping positions and normals.
    fn append_mapped<P, N>(
        &mut self,
        into: &mut MockSolid,
        from: &MockSolid,
        map_point: P,
        map_normal: N,
        reverse_loops: bool,
    ) where
        P: Fn([f64; 3]) -> [f64; 3],
        N: Fn([f64; 3]) -> [f64; 3],
    {
        let mut id_map: HashMap<KernelId, KernelId> = HashMap::new();
        for v in &from.vertices {
            let new_id = self.alloc_id();
            id_map.insert(v.id, new_id);
            into.vertices.push(MockVertex {
                id: new_id,
                position: map_point(v.position),
            });
        }
        for e in &from.edges {
            let new_id = self.alloc_id();
            id_map.insert(e.id, new_id);
            into.edges.push(MockEdge {
                id: new_id,
                start: id_map[&e.start],
                end: id_map[&e.end],
                curve: e.curve,
            });
        }
        for f in &from.faces {
            let mut boundary: Vec<KernelId> = f.boundary.iter().map(|v| id_map[v]).collect();
            if reverse_loops {
                boundary.reverse();
            }
            into.faces.push(MockFace {
                id: self.alloc_id(),
                edges: f.edges.iter().map(|e| id_map[e]).collect(),
                boundary,
                surface: f.surface,
                normal: map_normal(f.normal),
            });
        }
    }

    fn reid(&mut self, solid: &MockSolid) -> MockSolid {
        let mut out = MockSolid::default();
        self.append_mapped(&mut out, solid, |p| p, |n| n, false);
        out
    }

    fn add_vertex(&mut self, solid: &mut MockSolid, position: [f64; 3]) -> KernelId {
        let id = self.alloc_id();
        solid.vertices.push(MockVertex { id, position });
        id
    }

    fn add_edge(
        &mut self,
        solid: &mut MockSolid,
        start: KernelId,
        end: KernelId,
        curve: CurveKind,
    ) -> KernelId {
        let id = self.alloc_id();
        solid.edges.push(MockEdge {
            id,
            start,
            end,
            curve,
        });
        id
    }

    /// Build a right prism over `outline`: V = 2n, E = 3n, F = n + 2.
    fn make_prism(&mut self, request: &ExtrudeRequest) -> Result<MockSolid, KernelError> {
        let n = request.outline.len();
        if n < 3 {
            return Err(KernelError::ExtrudeFailed {
                reason: format!("outline has {n} points, need at least 3"),
            });
        }
        if !(request.depth > 0.0 && request.depth.is_finite()) {
            return Err(KernelError::ExtrudeFailed {
                reason: format!("depth must be positive, got {}", request.depth),
            });
        }
        let area = shoelace_area(&request.outline);
        if area.abs() < 1e-12 {
            return Err(KernelError::ExtrudeFailed {
                reason: "outline encloses no area".to_string(),
            });
        }
        let mut pts = request.outline.clone();
        if area < 0.0 {
            pts.reverse();
        }

        let z0 = request.z_start;
        let z1 = z0 + request.depth;
        let mut solid = MockSolid::default();
        let bottom: Vec<KernelId> = pts
            .iter()
            .map(|p| self.add_vertex(&mut solid, [p[0], p[1], z0]))
            .collect();
        let top: Vec<KernelId> = pts
            .iter()
            .map(|p| self.add_vertex(&mut solid, [p[0], p[1], z1]))
            .collect();

        let mut bottom_edges = Vec::with_capacity(n);
        let mut top_edges = Vec::with_capacity(n);
        let mut vertical = Vec::with_capacity(n);
        for i in 0..n {
            let j = (i + 1) % n;
            bottom_edges.push(self.add_edge(&mut solid, bottom[i], bottom[j], CurveKind::Line));
            top_edges.push(self.add_edge(&mut solid, top[i], top[j], CurveKind::Line));
        }
        for i in 0..n {
            vertical.push(self.add_edge(&mut solid, bottom[i], top[i], CurveKind::Line));
        }

        let mut bottom_loop = bottom.clone();
        bottom_loop.reverse();
        let bottom_face = MockFace {
            id: self.alloc_id(),
            edges: bottom_edges.clone(),
            boundary: bottom_loop,
            surface: SurfaceKind::Planar,
            normal: [0.0, 0.0, -1.0],
        };
        let top_face = MockFace {
            id: self.alloc_id(),
            edges: top_edges.clone(),
            boundary: top.clone(),
            surface: SurfaceKind::Planar,
            normal: [0.0, 0.0, 1.0],
        };
        solid.faces.push(bottom_face);
        solid.faces.push(top_face);

        for i in 0..n {
            let j = (i + 1) % n;
            let dx = pts[j][0] - pts[i][0];
            let dy = pts[j][1] - pts[i][1];
            let len = (dx * dx + dy * dy).sqrt();
            let normal = if len > 0.0 {
                [dy / len, -dx / len, 0.0]
            } else {
                [0.0, 0.0, 0.0]
            };
            let face = MockFace {
                id: self.alloc_id(),
                edges: vec![bottom_edges[i], vertical[j], top_edges[i], vertical[i]],
                boundary: vec![bottom[i], bottom[j], top[j], top[i]],
                surface: SurfaceKind::Planar,
                normal,
            };
            solid.faces.push(face);
        }
        Ok(solid)
    }

    /// Fan-triangulate every planar face.
    fn tessellate_faces(solid: &MockSolid) -> RenderMesh {
        let mut mesh = RenderMesh::default();
        for face in &solid.faces {
            if face.boundary.len() < 3 {
                continue;
            }
            let positions: Vec<[f64; 3]> = face
                .boundary
                .iter()
                .filter_map(|&v| solid.position(v))
                .collect();
            let start_index = mesh.indices.len() as u32;
            let base_vertex = (mesh.vertices.len() / 3) as u32;
            for p in &positions {
                mesh.vertices
                    .extend_from_slice(&[p[0] as f32, p[1] as f32, p[2] as f32]);
                mesh.normals.extend_from_slice(&[
                    face.normal[0] as f32,
                    face.normal[1] as f32,
                    face.normal[2] as f32,
                ]);
            }
            for k in 1..positions.len().saturating_sub(1) as u32 {
                mesh.indices
                    .extend_from_slice(&[base_vertex, base_vertex + k, base_vertex + k + 1]);
            }
            mesh.face_ranges.push(FaceRange {
                face_id: face.id,
                start_index,
                end_index: mesh.indices.len() as u32,
            });
        }
        mesh
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn shoelace_area(pts: &[[f64; 2]]) -> f64 {
    let n = pts.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += pts[i][0] * pts[j][1];
        area -= pts[j][0] * pts[i][1];
    }
    area / 2.0
}

fn normalize(v: [f64; 3]) -> Option<[f64; 3]> {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    (len > 1e-12).then(|| [v[0] / len, v[1] / len, v[2] / len])
}

/// A unit vector orthogonal to `n`.
fn perpendicular(n: [f64; 3]) -> [f64; 3] {
    let up = if n[0].abs() < 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    let u = cross(up, n);
    normalize(u).unwrap_or([0.0, 0.0, 1.0])
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn offset(p: [f64; 3], dir: [f64; 3], s: f64) -> [f64; 3] {
    [p[0] + dir[0] * s, p[1] + dir[1] * s, p[2] + dir[2] * s]
}

/// Clip the segment `origin + t * axis`, `t in [0, length]`, against a box.
fn clip_to_box(
    origin: [f64; 3],
    axis: [f64; 3],
    length: f64,
    bb: &BoundingBox,
) -> Option<(f64, f64)> {
    let (mut t0, mut t1) = (0.0_f64, length);
    for i in 0..3 {
        if axis[i].abs() < 1e-12 {
            if origin[i] < bb.min[i] || origin[i] > bb.max[i] {
                return None;
            }
            continue;
        }
        let ta = (bb.min[i] - origin[i]) / axis[i];
        let tb = (bb.max[i] - origin[i]) / axis[i];
        t0 = t0.max(ta.min(tb));
        t1 = t1.min(ta.max(tb));
    }
    (t0 < t1).then_some((t0, t1))
}

impl Kernel for MockKernel {
    fn extrude(
        &mut self,
        base: Option<&KernelSolidHandle>,
        request: &ExtrudeRequest,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.begin(KernelOp::Extrude)?;
        let base = base.map(|h| self.get(h).cloned()).transpose()?;
        let prism = self.make_prism(request)?;
        let solid = match base {
            Some(base) => {
                let mut out = self.reid(&base);
                out.vertices.extend(prism.vertices);
                out.edges.extend(prism.edges);
                out.faces.extend(prism.faces);
                out
            }
            None => prism,
        };
        debug!(
            vertices = solid.vertices.len(),
            edges = solid.edges.len(),
            faces = solid.faces.len(),
            "mock extrude"
        );
        Ok(self.store(solid))
    }

    fn cut_hole(
        &mut self,
        solid: &KernelSolidHandle,
        cut: &HoleCut,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.begin(KernelOp::CutHole)?;
        let source = self.get(solid)?.clone();
        if !(cut.diameter > 0.0 && cut.length > 0.0) {
            return Err(KernelError::BooleanFailed {
                reason: format!(
                    "cutter must have positive size (diameter {}, length {})",
                    cut.diameter, cut.length
                ),
            });
        }
        let axis = normalize(cut.axis).ok_or_else(|| KernelError::BooleanFailed {
            reason: "cutter axis has zero length".to_string(),
        })?;
        let bb = BoundingBox::from_points(source.vertices.iter().map(|v| v.position)).ok_or_else(
            || KernelError::BooleanFailed {
                reason: "cannot cut an empty solid".to_string(),
            },
        )?;
        let (t0, t1) = clip_to_box(cut.origin, axis, cut.length, &bb).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: format!("cutter at {:?} misses the solid", cut.origin),
            }
        })?;

        let mut out = self.reid(&source);
        let r = cut.diameter / 2.0;
        let side = perpendicular(axis);
        let entry = offset(offset(cut.origin, axis, t0), side, r);
        let exit = offset(offset(cut.origin, axis, t1), side, r);
        let v_entry = self.add_vertex(&mut out, entry);
        let v_exit = self.add_vertex(&mut out, exit);
        let rim_entry = self.add_edge(&mut out, v_entry, v_entry, CurveKind::Circle);
        let rim_exit = self.add_edge(&mut out, v_exit, v_exit, CurveKind::Circle);
        let seam = self.add_edge(&mut out, v_entry, v_exit, CurveKind::Line);
        let wall = MockFace {
            id: self.alloc_id(),
            edges: vec![rim_entry, rim_exit, seam],
            boundary: Vec::new(),
            surface: SurfaceKind::Cylindrical,
            normal: [-side[0], -side[1], -side[2]],
        };
        out.faces.push(wall);
        Ok(self.store(out))
    }

    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.begin(KernelOp::Fillet)?;
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(KernelError::FilletFailed {
                reason: "radius must be positive".to_string(),
            });
        }
        if edges.is_empty() {
            return Err(KernelError::FilletFailed {
                reason: "no edges given".to_string(),
            });
        }
        let source = self.get(solid)?.clone();
        for eid in edges {
            let found = source
                .edges
                .iter()
                .any(|e| e.id == *eid && e.curve == CurveKind::Line);
            if !found {
                return Err(KernelError::FilletFailed {
                    reason: format!("edge {:?} not found in solid", eid),
                });
            }
        }

        // Each filleted edge is replaced by a cylindrical face bounded by two
        // tangent edges, one on each neighbouring face.
        let filleted: HashSet<KernelId> = edges.iter().copied().collect();
        let mut work = source.clone();
        work.edges.retain(|e| !filleted.contains(&e.id));
        for face in &mut work.faces {
            face.edges.retain(|e| !filleted.contains(e));
        }
        for eid in edges {
            let Some(edge) = source.edges.iter().find(|e| e.id == *eid) else {
                continue;
            };
            let (Some(start), Some(end)) = (source.position(edge.start), source.position(edge.end))
            else {
                continue;
            };
            let neighbours: Vec<(KernelId, [f64; 3])> = source
                .faces_of_edge(*eid)
                .map(|f| (f.id, f.normal))
                .collect();
            let mut tangent_edges = Vec::new();
            for (k, (face_id, _)) in neighbours.iter().enumerate() {
                let other = neighbours
                    .get(1 - k.min(1))
                    .map(|(_, n)| *n)
                    .unwrap_or([0.0; 3]);
                let a = self.add_vertex(&mut work, offset(start, other, -radius));
                let b = self.add_vertex(&mut work, offset(end, other, -radius));
                let e = self.add_edge(&mut work, a, b, CurveKind::Line);
                if let Some(face) = work.faces.iter_mut().find(|f| f.id == *face_id) {
                    face.edges.push(e);
                }
                tangent_edges.push(e);
            }
            let normal = neighbours
                .iter()
                .fold([0.0; 3], |acc, (_, n)| [acc[0] + n[0], acc[1] + n[1], acc[2] + n[2]]);
            let round = MockFace {
                id: self.alloc_id(),
                edges: tangent_edges,
                boundary: Vec::new(),
                surface: SurfaceKind::Cylindrical,
                normal: normalize(normal).unwrap_or([0.0, 0.0, 1.0]),
            };
            work.faces.push(round);
        }
        let out = self.reid(&work);
        debug!(edges = edges.len(), radius, "mock fillet");
        Ok(self.store(out))
    }

    fn mirror(
        &mut self,
        solid: &KernelSolidHandle,
        plane: &MirrorPlane,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.begin(KernelOp::Mirror)?;
        let source = self.get(solid)?.clone();
        let normal = normalize(plane.normal).ok_or_else(|| KernelError::MirrorFailed {
            reason: "mirror plane normal has zero length".to_string(),
        })?;
        let plane = MirrorPlane {
            origin: plane.origin,
            normal,
        };
        let mut out = MockSolid::default();
        self.append_mapped(
            &mut out,
            &source,
            |p| plane.reflect_point(p),
            |n| plane.reflect_vector(n),
            true,
        );
        Ok(self.store(out))
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        self.begin(KernelOp::Tessellate)?;
        if !(tolerance > 0.0) {
            return Err(KernelError::TessellationFailed {
                reason: format!("tolerance must be positive, got {tolerance}"),
            });
        }
        let mesh = Self::tessellate_faces(self.get(solid)?);
        if mesh.indices.is_empty() {
            return Err(KernelError::TessellationFailed {
                reason: "solid has no planar faces".to_string(),
            });
        }
        Ok(mesh)
    }
}

impl KernelIntrospect for MockKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.faces.iter().map(|f| f.id).collect())
            .unwrap_or_default()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.edges.iter().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.vertices.iter().map(|v| v.id).collect())
            .unwrap_or_default()
    }

    fn edge_info(&self, solid: &KernelSolidHandle, edge: KernelId) -> Option<EdgeInfo> {
        let s = self.solids.get(&solid.id())?;
        let e = s.edges.iter().find(|e| e.id == edge)?;
        let face_normals = s
            .faces_of_edge(edge)
            .filter(|f| f.surface == SurfaceKind::Planar)
            .map(|f| f.normal)
            .collect();
        Some(EdgeInfo {
            id: e.id,
            start: s.position(e.start)?,
            end: s.position(e.end)?,
            curve: e.curve,
            face_normals,
        })
    }

    fn face_info(&self, solid: &KernelSolidHandle, face: KernelId) -> Option<FaceInfo> {
        let s = self.solids.get(&solid.id())?;
        let f = s.faces.iter().find(|f| f.id == face)?;
        Some(FaceInfo {
            id: f.id,
            surface: f.surface,
            normal: (f.surface == SurfaceKind::Planar).then_some(f.normal),
        })
    }

    fn vertex_position(&self, solid: &KernelSolidHandle, vertex: KernelId) -> Option<[f64; 3]> {
        self.solids.get(&solid.id())?.position(vertex)
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Option<BoundingBox> {
        let s = self.solids.get(&solid.id())?;
        BoundingBox::from_points(s.vertices.iter().map(|v| v.position))
    }
}
