pub mod geometry;
pub mod holes;
pub mod profile;
pub mod roles;

pub use geometry::*;
pub use holes::*;
pub use profile::*;
pub use roles::*;
