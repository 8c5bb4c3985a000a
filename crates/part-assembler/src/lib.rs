//! Turns bracket plans into kernel solids.
//!
//! [`assemble`] drives one role through the kernel, [`generate`] runs a whole
//! batch and collects per-role failures, [`mirror`] derives right-hand parts.

pub mod assemble;
pub mod batch;
pub mod part;
pub mod report;
pub mod resolve;
pub mod types;

pub use assemble::{assemble, assemble_canonical};
pub use batch::{generate, BatchOutcome};
pub use part::{mirror, Part};
pub use report::BatchReport;
pub use resolve::resolve_fillet_edges;
pub use types::{AssemblyError, AssemblyStep, StepError};
