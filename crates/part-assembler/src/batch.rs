use bracket_planner::{build_profile, DimensionError, DimensionSet};
use bracket_types::{BracketFamily, MirrorAxis, RoleTag};
use solid_kernel::KernelBundle;
use tracing::{info, instrument, warn};

use crate::assemble::assemble_canonical;
use crate::part::{mirror, Part};
use crate::types::AssemblyError;

/// Everything one run produced: the parts that were built and every role that was not.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub parts: Vec<Part>,
    pub failures: Vec<AssemblyError>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn part(&self, role: RoleTag) -> Option<&Part> {
        self.parts.iter().find(|p| p.role() == role)
    }

    pub fn failure(&self, role: RoleTag) -> Option<&AssemblyError> {
        self.failures.iter().find(|f| f.role == role)
    }
}

/// Build every requested role from one Dimension Set.
///
/// The Dimension Set is checked once up front; an invalid set aborts the run
/// before any kernel request. After that, failures are per role: each family's
/// left part is built once and its right part is mirrored from it, so a left
/// failure is also reported against the right role. Roles are produced in
/// [`RoleTag::ALL`] order regardless of the order requested.
#[instrument(skip_all, fields(roles = roles.len()))]
pub fn generate(
    kernel: &mut dyn KernelBundle,
    dims: &DimensionSet,
    roles: &[RoleTag],
) -> Result<BatchOutcome, DimensionError> {
    dims.validate()?;
    build_profile(dims)?;

    let mut outcome = BatchOutcome::default();
    for family in BracketFamily::ALL {
        let wanted: Vec<RoleTag> = RoleTag::ALL
            .into_iter()
            .filter(|r| r.family == family && roles.contains(r))
            .collect();
        if wanted.is_empty() {
            continue;
        }

        let canonical = match assemble_canonical(kernel, dims, family) {
            Ok(part) => part,
            Err(err) => {
                for role in wanted {
                    let err = err.for_role(role);
                    warn!(%role, step = %err.step, error = %err.source, "role failed");
                    outcome.failures.push(err);
                }
                continue;
            }
        };

        let mut keep_canonical = false;
        for role in wanted {
            match role.mirror_axis() {
                MirrorAxis::None => keep_canonical = true,
                axis => match mirror(kernel, &canonical, axis) {
                    Ok(part) => outcome.parts.push(part),
                    Err(err) => {
                        warn!(%role, step = %err.step, error = %err.source, "role failed");
                        outcome.failures.push(err);
                    }
                },
            }
        }
        if keep_canonical {
            outcome.parts.push(canonical);
        }
    }
    outcome.parts.sort_by_key(|p| p.role());

    info!(
        built = outcome.parts.len(),
        failed = outcome.failures.len(),
        "batch finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_types::Hand;
    use solid_kernel::{KernelOp, MockKernel};

    #[test]
    fn all_four_roles_in_canonical_order() {
        let mut kernel = MockKernel::new();
        let outcome = generate(&mut kernel, &DimensionSet::prusa_6u(), &RoleTag::ALL).unwrap();
        assert!(outcome.is_complete());
        let roles: Vec<RoleTag> = outcome.parts.iter().map(|p| p.role()).collect();
        assert_eq!(roles, RoleTag::ALL);
        // One canonical build per family, one mirror per right part.
        assert_eq!(kernel.call_count(KernelOp::Mirror), 2);
    }

    #[test]
    fn invalid_dimensions_abort_before_any_kernel_call() {
        let mut kernel = MockKernel::new();
        let mut dims = DimensionSet::prusa_6u();
        dims.frame_leg_depth = -1.0;
        assert!(generate(&mut kernel, &dims, &RoleTag::ALL).is_err());
        assert!(kernel.calls().is_empty());
    }

    #[test]
    fn only_requested_roles_are_returned() {
        let mut kernel = MockKernel::new();
        let wanted = [RoleTag::new(BracketFamily::Bottom, Hand::Right)];
        let outcome = generate(&mut kernel, &DimensionSet::prusa_6u(), &wanted).unwrap();
        assert_eq!(outcome.parts.len(), 1);
        assert_eq!(outcome.parts[0].role(), wanted[0]);
    }
}
