use bracket_types::{EdgeRole, HolePattern, MountFace, Point2, VertexTag};

/// A Dimension Set value violates a structural invariant.
///
/// Configuration defect: the whole run stops before any part is attempted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DimensionError {
    #[error("missing required dimension '{key}'")]
    Missing { key: String },

    #[error("unknown dimension '{key}'")]
    Unknown { key: String },

    #[error("dimension '{key}' must be a finite positive length, got {value}")]
    NonPositive { key: String, value: f64 },

    #[error("invalid dimension '{key}': {reason}")]
    Invalid { key: String, reason: String },

    #[error("profile would not be a simple counter-clockwise polygon: {reason}")]
    Profile { reason: String },

    #[error("cannot parse dimension set: {reason}")]
    Parse { reason: String },

    #[error("cannot read '{path}': {reason}")]
    Io { path: String, reason: String },
}

/// A planned hole leaves its face or crowds an edge.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "{pattern} hole (diameter {diameter}) centered at ({u:.3}, {v:.3}) on the {face} \
     is closer than {margin} mm to the face edge",
    u = .center.x,
    v = .center.y
)]
pub struct HoleOutOfBounds {
    pub pattern: HolePattern,
    pub face: MountFace,
    pub center: Point2<f64>,
    pub diameter: f64,
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilletError {
    /// Reported instead of clamped: it means the Dimension Set is inconsistent.
    #[error(
        "fillet radius {radius} on the {role} edge at {edge:?} exceeds the cap of {cap} \
         (wall {wall} mm)"
    )]
    Overflow {
        role: EdgeRole,
        edge: VertexTag,
        radius: f64,
        cap: f64,
        wall: f64,
    },

    #[error("fillet radius for the {role} edge must be positive, got {radius}")]
    InvalidRadius { role: EdgeRole, radius: f64 },

    #[error("profile has no {corner:?} corner for the {role} edge")]
    MissingCorner { role: EdgeRole, corner: VertexTag },

    /// No live edge of the solid sits at the role's corner.
    #[error("no edge of the solid matches the {role} corner at {corner:?}")]
    Unresolved { role: EdgeRole, corner: VertexTag },
}

/// Any failure while planning one bracket.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Dimension(#[from] DimensionError),

    #[error(transparent)]
    Hole(#[from] HoleOutOfBounds),

    #[error(transparent)]
    Fillet(#[from] FilletError),
}
