//! Finding the live solid edges a fillet role refers to.
//!
//! Roles name profile corners, and the corner's geometry is what gets matched:
//! the edge must be a straight line swept along Z from that corner, flanked by
//! faces whose normals are the outward normals of the corner's two profile
//! edges. Edge ids never enter into it, so the match survives re-ordered
//! vertices and re-issued kernel ids.

use bracket_planner::FilletError;
use bracket_types::{Corner, EdgeRole, Profile};
use solid_kernel::{CurveKind, EdgeInfo, KernelId, KernelIntrospect, KernelSolidHandle};

/// Position tolerance when projecting edge endpoints onto a corner (mm).
const POSITION_TOL: f64 = 1e-6;
/// Minimum cosine between a face normal and the expected normal.
const NORMAL_COS: f64 = 1.0 - 1e-6;

fn is_vertical_line(edge: &EdgeInfo) -> bool {
    let [dx, dy, dz] = edge.direction();
    edge.curve == CurveKind::Line
        && dx.abs() <= POSITION_TOL
        && dy.abs() <= POSITION_TOL
        && dz.abs() > POSITION_TOL
}

fn projects_onto(edge: &EdgeInfo, corner: &Corner) -> bool {
    [edge.start, edge.end].iter().all(|p| {
        (p[0] - corner.position.x).abs() <= POSITION_TOL
            && (p[1] - corner.position.y).abs() <= POSITION_TOL
    })
}

fn has_normal(edge: &EdgeInfo, expected: [f64; 3]) -> bool {
    edge.face_normals.iter().any(|n| {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        let dot = n[0] * expected[0] + n[1] * expected[1] + n[2] * expected[2];
        len > 0.0 && dot / len >= NORMAL_COS
    })
}

/// Edges of `solid` that carry the fillet for `role`.
///
/// An empty match is an error: a role that resolves to nothing would
/// otherwise be silently dropped.
pub fn resolve_fillet_edges(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    profile: &Profile,
    role: EdgeRole,
) -> Result<Vec<KernelId>, FilletError> {
    let tag = role.corner_tag();
    let corner = profile
        .corner(tag)
        .ok_or(FilletError::MissingCorner { role, corner: tag })?;
    let normals = corner
        .outward_normals()
        .map(|n| [n.x, n.y, 0.0]);

    let edges: Vec<KernelId> = introspect
        .all_edge_info(solid)
        .into_iter()
        .filter(|e| is_vertical_line(e) && projects_onto(e, &corner))
        .filter(|e| normals.iter().all(|n| has_normal(e, *n)))
        .map(|e| e.id)
        .collect();

    if edges.is_empty() {
        return Err(FilletError::Unresolved { role, corner: tag });
    }
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_planner::{build_profile, mirror_plan, plan_bracket, DimensionSet};
    use bracket_types::{BracketFamily, MirrorAxis, VertexTag};
    use solid_kernel::{ExtrudeRequest, Kernel, MirrorPlane, MockKernel};

    fn extruded(kernel: &mut MockKernel, profile: &Profile) -> KernelSolidHandle {
        kernel
            .extrude(
                None,
                &ExtrudeRequest {
                    outline: profile.outline(),
                    z_start: 0.0,
                    depth: 40.0,
                },
            )
            .unwrap()
    }

    #[test]
    fn each_role_finds_exactly_one_edge() {
        let mut kernel = MockKernel::new();
        let profile = build_profile(&DimensionSet::prusa_6u()).unwrap();
        let solid = extruded(&mut kernel, &profile);
        for role in EdgeRole::ALL {
            let edges = resolve_fillet_edges(&kernel, &solid, &profile, role).unwrap();
            assert_eq!(edges.len(), 1, "{role}");
            let info = kernel.edge_info(&solid, edges[0]).unwrap();
            let corner = profile.find(role.corner_tag()).unwrap().position;
            assert_eq!((info.start[0], info.start[1]), (corner.x, corner.y));
        }
    }

    #[test]
    fn unrelated_solid_does_not_resolve() {
        let mut kernel = MockKernel::new();
        let profile = build_profile(&DimensionSet::prusa_6u()).unwrap();
        let solid = kernel
            .extrude(
                None,
                &ExtrudeRequest {
                    outline: vec![[100.0, 0.0], [110.0, 0.0], [110.0, 10.0], [100.0, 10.0]],
                    z_start: 0.0,
                    depth: 40.0,
                },
            )
            .unwrap();
        assert_eq!(
            resolve_fillet_edges(&kernel, &solid, &profile, EdgeRole::WallToFace),
            Err(FilletError::Unresolved {
                role: EdgeRole::WallToFace,
                corner: VertexTag::OuterHeel
            })
        );
    }

    #[test]
    fn mirrored_solid_resolves_against_mirrored_profile() {
        let mut kernel = MockKernel::new();
        let plan = plan_bracket(&DimensionSet::prusa_6u(), BracketFamily::Top).unwrap();
        let left = extruded(&mut kernel, &plan.profile);
        let right = kernel
            .mirror(
                &left,
                &MirrorPlane {
                    origin: [0.0; 3],
                    normal: [1.0, 0.0, 0.0],
                },
            )
            .unwrap();
        let mirrored = mirror_plan(&plan, MirrorAxis::Y);
        for role in EdgeRole::ALL {
            assert_eq!(
                resolve_fillet_edges(&kernel, &right, &mirrored.profile, role)
                    .unwrap()
                    .len(),
                1
            );
        }
        // The left-hand corner is not where the right-hand solid has its edge.
        assert!(
            resolve_fillet_edges(&kernel, &right, &plan.profile, EdgeRole::WallToFace).is_err()
        );
    }
}
