use crate::traits::{Kernel, KernelIntrospect};

/// Combined trait for callers that need both mutable `Kernel` access and
/// read-only `KernelIntrospect` access on the same object.
pub trait KernelBundle: Kernel + KernelIntrospect {
    fn as_introspect(&self) -> &dyn KernelIntrospect;
}

impl<T: Kernel + KernelIntrospect> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}
