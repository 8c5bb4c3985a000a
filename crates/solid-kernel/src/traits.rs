use crate::types::*;

/// Boundary-representation kernel. Every request either yields a new solid
/// handle or a typed failure; inputs are never modified in place.
///
/// Implemented by `TruckKernel` (feature `truck`) and `MockKernel`.
pub trait Kernel {
    /// Sweep a planar outline along +Z. With `base`, the new prism is fused onto it.
    fn extrude(
        &mut self,
        base: Option<&KernelSolidHandle>,
        request: &ExtrudeRequest,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Subtract a cylinder from the solid.
    fn cut_hole(
        &mut self,
        solid: &KernelSolidHandle,
        cut: &HoleCut,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Fillet (round) the specified edges with the given radius.
    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Reflect a solid through a plane.
    fn mirror(
        &mut self,
        solid: &KernelSolidHandle,
        plane: &MirrorPlane,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Tessellate a solid to a triangle mesh.
    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError>;
}

/// Read-only topology queries on kernel solids.
pub trait KernelIntrospect {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// Endpoints, curve kind and adjacent face normals of an edge.
    fn edge_info(&self, solid: &KernelSolidHandle, edge: KernelId) -> Option<EdgeInfo>;

    fn face_info(&self, solid: &KernelSolidHandle, face: KernelId) -> Option<FaceInfo>;

    fn vertex_position(&self, solid: &KernelSolidHandle, vertex: KernelId) -> Option<[f64; 3]>;

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Option<BoundingBox>;

    /// Every edge of the solid with its geometry.
    fn all_edge_info(&self, solid: &KernelSolidHandle) -> Vec<EdgeInfo> {
        self.list_edges(solid)
            .into_iter()
            .filter_map(|e| self.edge_info(solid, e))
            .collect()
    }
}
