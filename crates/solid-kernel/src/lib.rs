//! Narrow boundary to a boundary-representation modeling kernel.
//!
//! Callers hand over outlines, hole cuts, edge ids and mirror planes; the
//! kernel owns all solid geometry and hands back opaque handles.

pub mod kernel_ext;
pub mod mock_kernel;
#[cfg(feature = "truck")]
pub mod primitives;
#[cfg(feature = "truck")]
pub mod tessellation;
pub mod traits;
#[cfg(feature = "truck")]
pub mod truck_kernel;
pub mod types;

pub use kernel_ext::KernelBundle;
pub use mock_kernel::MockKernel;
pub use traits::*;
#[cfg(feature = "truck")]
pub use truck_kernel::TruckKernel;
pub use types::*;
