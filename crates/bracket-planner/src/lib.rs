//! Pure planning for rack-mount brackets: everything about a part that can be
//! decided from the Dimension Set alone, before any solid is built.

pub mod dims;
pub mod error;
pub mod fillets;
pub mod holes;
pub mod params;
pub mod profile;
pub mod variant;

pub use dims::{DimensionSet, ExtensionDirection, FamilyDimensions, FrameHoleLayout};
pub use error::{DimensionError, FilletError, HoleOutOfBounds, PlanError};
pub use fillets::{plan_fillets, requested_fillets};
pub use holes::{plan_holes, PatternSide};
pub use params::ParamMap;
pub use profile::{brace_triangle, build_profile, validate_profile};
pub use variant::{mirror_plan, plan_bracket, plan_variant, BracketPlan, RailExtension};
