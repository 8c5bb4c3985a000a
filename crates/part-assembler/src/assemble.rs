use bracket_planner::variant::rail_extension;
use bracket_planner::{
    brace_triangle, build_profile, plan_fillets, plan_holes, requested_fillets, BracketPlan,
    DimensionSet, PatternSide,
};
use bracket_types::{BracketFamily, Hand, HoleSpec, MirrorAxis, RoleTag};
use solid_kernel::{ExtrudeRequest, HoleCut, KernelBundle, KernelError, KernelSolidHandle};
use tracing::{debug, info, instrument};

use crate::part::{mirror, Part};
use crate::resolve::resolve_fillet_edges;
use crate::types::{AssemblyError, AssemblyStep, StepError};

/// How far a hole cutter starts outside the solid's bounding box (mm).
const CUTTER_SLACK: f64 = 1.0;

/// Place a through-all cutter for `hole` against the solid's current extent.
fn hole_cut(
    kernel: &dyn KernelBundle,
    solid: &KernelSolidHandle,
    hole: &HoleSpec,
) -> Result<HoleCut, KernelError> {
    let bb = kernel
        .as_introspect()
        .bounding_box(solid)
        .ok_or_else(|| KernelError::Other {
            message: format!("{solid} has no extent to drill through"),
        })?;
    let axis = hole.face.axis_index();
    Ok(HoleCut {
        origin: hole.face.to_world(&hole.center, bb.min[axis] - CUTTER_SLACK),
        axis: hole.face.axis(),
        diameter: hole.diameter,
        length: bb.size()[axis] + 2.0 * CUTTER_SLACK,
    })
}

fn at<E: Into<StepError>>(role: RoleTag, step: AssemblyStep) -> impl Fn(E) -> AssemblyError {
    move |e| AssemblyError::new(role, step, e)
}

fn cut_holes(
    kernel: &mut dyn KernelBundle,
    mut solid: KernelSolidHandle,
    holes: &[HoleSpec],
) -> Result<KernelSolidHandle, KernelError> {
    for hole in holes {
        let cut = hole_cut(kernel, &solid, hole)?;
        solid = kernel.cut_hole(&solid, &cut)?;
        debug!(pattern = %hole.pattern, u = hole.center.x, v = hole.center.y, "cut hole");
    }
    Ok(solid)
}

/// Build the canonical (left-hand) bracket of a family.
///
/// Steps run in a fixed order: profile, extrusion, rail extension, frame
/// holes, rail holes, fillets. Holes are cut into the extruded solid, and
/// fillets come last so the edge resolver sees the final topology. The first
/// failure ends the build; nothing partial is returned.
#[instrument(skip(kernel, dims))]
pub fn assemble_canonical(
    kernel: &mut dyn KernelBundle,
    dims: &DimensionSet,
    family: BracketFamily,
) -> Result<Part, AssemblyError> {
    let role = RoleTag::new(family, Hand::Left);
    let profile = build_profile(dims).map_err(at(role, AssemblyStep::BuildProfile))?;

    let mut solid = kernel
        .extrude(
            None,
            &ExtrudeRequest {
                outline: profile.outline(),
                z_start: 0.0,
                depth: dims.frame_leg_width,
            },
        )
        .map_err(at(role, AssemblyStep::Extrude))?;

    let extension = rail_extension(dims, family);
    if let Some(ext) = &extension {
        solid = kernel
            .extrude(
                Some(&solid),
                &ExtrudeRequest {
                    outline: ext.outline_coords(),
                    z_start: ext.z_start,
                    depth: ext.depth,
                },
            )
            .map_err(at(role, AssemblyStep::RailExtension))?;
    }

    let frame_holes = plan_holes(dims, family, PatternSide::Frame)
        .map_err(at(role, AssemblyStep::FrameHoles))?;
    solid = cut_holes(kernel, solid, &frame_holes)
        .map_err(at(role, AssemblyStep::FrameHoles))?;

    let rail_holes = plan_holes(dims, family, PatternSide::Rail)
        .map_err(at(role, AssemblyStep::RailHoles))?;
    solid = cut_holes(kernel, solid, &rail_holes)
        .map_err(at(role, AssemblyStep::RailHoles))?;

    let fillets = plan_fillets(&profile, &requested_fillets(dims), dims)
        .map_err(at(role, AssemblyStep::Fillets))?;
    for fillet in &fillets {
        let edges = resolve_fillet_edges(kernel.as_introspect(), &solid, &profile, fillet.role)
            .map_err(at(role, AssemblyStep::Fillets))?;
        solid = kernel
            .fillet_edges(&solid, &edges, fillet.radius)
            .map_err(at(role, AssemblyStep::Fillets))?;
        debug!(edge_role = %fillet.role, radius = fillet.radius, "filleted");
    }

    let plan = BracketPlan {
        role,
        brace: brace_triangle(dims),
        width: dims.frame_leg_width,
        rail_extension: extension,
        profile,
        frame_holes,
        rail_holes,
        fillets,
    };
    info!(%role, holes = plan.hole_count(), %solid, "assembled part");
    Ok(Part::new(solid, plan))
}

/// Build any role: right-hand parts are the mirror of their left-hand sibling.
pub fn assemble(
    kernel: &mut dyn KernelBundle,
    dims: &DimensionSet,
    role: RoleTag,
) -> Result<Part, AssemblyError> {
    let canonical = assemble_canonical(kernel, dims, role.family)
        .map_err(|e| e.for_role(role))?;
    match role.mirror_axis() {
        MirrorAxis::None => Ok(canonical),
        axis => mirror(kernel, &canonical, axis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_planner::{FilletError, HoleOutOfBounds};
    use solid_kernel::{KernelOp, MockKernel};

    fn top_left() -> RoleTag {
        RoleTag::new(BracketFamily::Top, Hand::Left)
    }

    #[test]
    fn operations_run_in_order() {
        let mut kernel = MockKernel::new();
        let mut dims = DimensionSet::prusa_6u();
        dims.heel_fillet_radius = 1.0;
        assemble(&mut kernel, &dims, top_left()).unwrap();
        let mut expected = vec![KernelOp::Extrude, KernelOp::Extrude];
        expected.extend([KernelOp::CutHole; 5]);
        expected.push(KernelOp::Fillet);
        assert_eq!(kernel.calls(), expected.as_slice());
    }

    #[test]
    fn top_left_bounding_box() {
        let mut kernel = MockKernel::new();
        let part = assemble(&mut kernel, &DimensionSet::prusa_6u(), top_left()).unwrap();
        let bb = part.bounding_box(&kernel).unwrap();
        assert_eq!(bb.min, [-45.0, -4.0, 0.0]);
        assert_eq!(bb.max, [4.0, 39.0, 97.0]);
        assert_eq!(part.plan().hole_count(), 5);
    }

    #[test]
    fn right_part_is_the_mirror_of_the_left() {
        let mut kernel = MockKernel::new();
        let dims = DimensionSet::prusa_6u();
        let role = RoleTag::new(BracketFamily::Bottom, Hand::Right);
        let part = assemble(&mut kernel, &dims, role).unwrap();
        assert_eq!(part.role(), role);
        assert_eq!(kernel.call_count(KernelOp::Mirror), 1);
        let bb = part.bounding_box(&kernel).unwrap();
        assert_eq!(bb.min, [-4.0, -4.0, -55.0]);
        assert_eq!(bb.max, [45.0, 39.0, 40.0]);
    }

    #[test]
    fn cut_failure_reports_the_rail_step() {
        let mut kernel = MockKernel::new();
        // Two frame holes succeed, the first rail hole fails.
        kernel.fail_after(KernelOp::CutHole, 2);
        let err = assemble(&mut kernel, &DimensionSet::prusa_6u(), top_left()).unwrap_err();
        assert_eq!(err.step, AssemblyStep::RailHoles);
        assert!(matches!(err.source, StepError::Kernel(_)));
        // Nothing after the failing cut ran.
        assert_eq!(kernel.call_count(KernelOp::CutHole), 3);
        assert_eq!(kernel.call_count(KernelOp::Fillet), 0);
    }

    #[test]
    fn hole_error_aborts_before_cutting() {
        let mut kernel = MockKernel::new();
        let mut dims = DimensionSet::prusa_6u();
        dims.top.frame_hole_offset = 8.0;
        let err = assemble(&mut kernel, &dims, top_left()).unwrap_err();
        assert_eq!(err.step, AssemblyStep::FrameHoles);
        assert!(matches!(err.source, StepError::Hole(HoleOutOfBounds { .. })));
        assert_eq!(kernel.call_count(KernelOp::CutHole), 0);
    }

    #[test]
    fn fillet_overflow_is_reported_not_clamped() {
        let mut kernel = MockKernel::new();
        let mut dims = DimensionSet::prusa_6u();
        dims.brace_fillet_radius = 3.0;
        let err = assemble(&mut kernel, &dims, top_left()).unwrap_err();
        assert_eq!(err.step, AssemblyStep::Fillets);
        assert!(matches!(
            err.source,
            StepError::Fillet(FilletError::Overflow { .. })
        ));
    }

    #[test]
    fn canonical_failure_is_charged_to_the_requested_role() {
        let mut kernel = MockKernel::new();
        kernel.fail_next(KernelOp::Extrude);
        let role = RoleTag::new(BracketFamily::Top, Hand::Right);
        let err = assemble(&mut kernel, &DimensionSet::prusa_6u(), role).unwrap_err();
        assert_eq!(err.role, role);
        assert_eq!(err.step, AssemblyStep::Extrude);
    }
}
