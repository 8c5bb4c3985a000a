use std::fmt;

use bracket_planner::{DimensionError, FilletError, HoleOutOfBounds, PlanError};
use bracket_types::RoleTag;
use serde::{Deserialize, Serialize};
use solid_kernel::KernelError;

/// One stage of building a part, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssemblyStep {
    BuildProfile,
    Extrude,
    RailExtension,
    FrameHoles,
    RailHoles,
    Fillets,
    Mirror,
}

impl fmt::Display for AssemblyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssemblyStep::BuildProfile => "build-profile",
            AssemblyStep::Extrude => "extrude",
            AssemblyStep::RailExtension => "rail-extension",
            AssemblyStep::FrameHoles => "frame-holes",
            AssemblyStep::RailHoles => "rail-holes",
            AssemblyStep::Fillets => "fillets",
            AssemblyStep::Mirror => "mirror",
        };
        f.write_str(s)
    }
}

/// What went wrong inside a step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Dimension(#[from] DimensionError),

    #[error(transparent)]
    Hole(#[from] HoleOutOfBounds),

    #[error(transparent)]
    Fillet(#[from] FilletError),

    #[error("kernel rejected the request: {0}")]
    Kernel(#[from] KernelError),

    #[error("no mirror axis given; the part would share its solid")]
    NoMirrorAxis,
}

impl From<PlanError> for StepError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::Dimension(e) => StepError::Dimension(e),
            PlanError::Hole(e) => StepError::Hole(e),
            PlanError::Fillet(e) => StepError::Fillet(e),
        }
    }
}

/// A role that could not be built. Remaining steps for that role were skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{role} failed at {step}: {source}")]
pub struct AssemblyError {
    pub role: RoleTag,
    pub step: AssemblyStep,
    pub source: StepError,
}

impl AssemblyError {
    pub fn new(role: RoleTag, step: AssemblyStep, source: impl Into<StepError>) -> Self {
        Self {
            role,
            step,
            source: source.into(),
        }
    }

    /// The same failure charged to another role, e.g. a mirrored sibling.
    pub fn for_role(&self, role: RoleTag) -> Self {
        Self {
            role,
            ..self.clone()
        }
    }
}
