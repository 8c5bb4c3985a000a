use bracket_planner::{mirror_plan, BracketPlan};
use bracket_types::{MirrorAxis, RoleTag};
use solid_kernel::{BoundingBox, KernelBundle, KernelSolidHandle, MirrorPlane};
use tracing::debug;

use crate::types::{AssemblyError, AssemblyStep, StepError};

/// A finished solid together with the plan it was built from.
///
/// Not `Clone`: a part has one owner, first the assembler and then the
/// exporter that consumes it.
#[derive(Debug)]
pub struct Part {
    handle: KernelSolidHandle,
    plan: BracketPlan,
}

impl Part {
    pub(crate) fn new(handle: KernelSolidHandle, plan: BracketPlan) -> Self {
        Self { handle, plan }
    }

    pub fn role(&self) -> RoleTag {
        self.plan.role
    }

    pub fn handle(&self) -> &KernelSolidHandle {
        &self.handle
    }

    pub fn plan(&self) -> &BracketPlan {
        &self.plan
    }

    /// Topology counts `(vertices, edges, faces)` of the live solid.
    pub fn topology(&self, kernel: &dyn KernelBundle) -> (usize, usize, usize) {
        let k = kernel.as_introspect();
        (
            k.list_vertices(&self.handle).len(),
            k.list_edges(&self.handle).len(),
            k.list_faces(&self.handle).len(),
        )
    }

    pub fn bounding_box(&self, kernel: &dyn KernelBundle) -> Option<BoundingBox> {
        kernel.as_introspect().bounding_box(&self.handle)
    }
}

/// Reflect a finished part through the profile-plane axis.
///
/// The solid is mirrored by the kernel and the plan by the same transform, so
/// the result carries the sibling role and mirrored hole coordinates. The new
/// part always owns a new solid; [`MirrorAxis::None`] is rejected.
pub fn mirror(
    kernel: &mut dyn KernelBundle,
    part: &Part,
    axis: MirrorAxis,
) -> Result<Part, AssemblyError> {
    let Some(normal) = axis.plane_normal() else {
        return Err(AssemblyError::new(
            part.role(),
            AssemblyStep::Mirror,
            StepError::NoMirrorAxis,
        ));
    };
    let plan = mirror_plan(&part.plan, axis);
    let plane = MirrorPlane {
        origin: [0.0; 3],
        normal,
    };
    let handle = kernel
        .mirror(&part.handle, &plane)
        .map_err(|e| AssemblyError::new(plan.role, AssemblyStep::Mirror, e))?;
    debug!(from = %part.role(), to = %plan.role, %handle, "mirrored part");
    Ok(Part::new(handle, plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble_canonical;
    use bracket_planner::DimensionSet;
    use bracket_types::BracketFamily;
    use solid_kernel::{KernelOp, MockKernel};

    #[test]
    fn mirror_without_an_axis_is_refused() {
        let mut kernel = MockKernel::new();
        let left =
            assemble_canonical(&mut kernel, &DimensionSet::prusa_6u(), BracketFamily::Top).unwrap();
        let solids = kernel.solid_count();
        let err = mirror(&mut kernel, &left, MirrorAxis::None).unwrap_err();
        assert_eq!(err.role, left.role());
        assert_eq!(err.step, AssemblyStep::Mirror);
        assert_eq!(err.source, StepError::NoMirrorAxis);
        assert_eq!(kernel.call_count(KernelOp::Mirror), 0);
        assert_eq!(kernel.solid_count(), solids);
    }

    #[test]
    fn mirrored_part_owns_a_new_solid() {
        let mut kernel = MockKernel::new();
        let left =
            assemble_canonical(&mut kernel, &DimensionSet::prusa_6u(), BracketFamily::Top).unwrap();
        let solids = kernel.solid_count();
        let right = mirror(&mut kernel, &left, MirrorAxis::Y).unwrap();
        assert_eq!(kernel.solid_count(), solids + 1);
        assert_ne!(right.handle(), left.handle());
        assert_eq!(right.role(), left.role().sibling());
    }
}
