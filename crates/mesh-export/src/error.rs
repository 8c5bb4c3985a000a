use solid_kernel::KernelError;

/// A part could not be written. Other parts in the same run are unaffected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    #[error("cannot tessellate '{name}': {source}")]
    Tessellate { name: String, source: KernelError },

    #[error("cannot encode '{name}': {reason}")]
    Encode { name: String, reason: String },

    #[error("cannot write '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("writer rejected '{name}': {reason}")]
    Rejected { name: String, reason: String },
}
