use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{MirrorAxis, Point2};

/// The planar face a hole pattern is drilled through.
///
/// Hole centers are stored in the face's local `(u, v)` frame; `v` is always
/// the extrusion axis (world Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MountFace {
    /// Horizontal leg resting on the printer frame. `u` = X, drilled along Y.
    FrameLeg,
    /// Vertical leg bolted to the rack rail. `u` = Y, drilled along X.
    RailLeg,
}

impl MountFace {
    /// Drilling direction in world coordinates.
    pub fn axis(self) -> [f64; 3] {
        match self {
            MountFace::FrameLeg => [0.0, 1.0, 0.0],
            MountFace::RailLeg => [1.0, 0.0, 0.0],
        }
    }

    /// Index of the world axis the hole is drilled along.
    pub fn axis_index(self) -> usize {
        match self {
            MountFace::FrameLeg => 1,
            MountFace::RailLeg => 0,
        }
    }

    /// Lift a face-local center into world space, placing it at `depth` along the drill axis.
    pub fn to_world(self, center: &Point2<f64>, depth: f64) -> [f64; 3] {
        match self {
            MountFace::FrameLeg => [center.x, depth, center.y],
            MountFace::RailLeg => [depth, center.x, center.y],
        }
    }

    /// Reflect a face-local center through a profile-plane mirror.
    ///
    /// Only the `u` coordinate can change: `v` runs along the extrusion axis,
    /// which no profile mirror touches.
    pub fn reflect(self, axis: MirrorAxis, center: &Point2<f64>) -> Point2<f64> {
        let flips_u = matches!(
            (self, axis),
            (MountFace::FrameLeg, MirrorAxis::Y) | (MountFace::RailLeg, MirrorAxis::X)
        );
        if flips_u {
            Point2::new(-center.x, center.y)
        } else {
            *center
        }
    }
}

impl fmt::Display for MountFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountFace::FrameLeg => write!(f, "frame leg"),
            MountFace::RailLeg => write!(f, "rail leg"),
        }
    }
}

/// Which planned pattern a hole belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HolePattern {
    /// N holes on one line at a fixed pitch.
    FrameLinear,
    /// Two paired holes plus one apex hole.
    FrameTriangle,
    /// EIA-310 three-hole rail group.
    RailEia,
}

impl fmt::Display for HolePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolePattern::FrameLinear => write!(f, "frame-linear"),
            HolePattern::FrameTriangle => write!(f, "frame-triangle"),
            HolePattern::RailEia => write!(f, "rail-eia"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoleKind {
    Round,
    /// Oversized clearance hole giving alignment slack.
    Slotted,
}

/// One through-hole, positioned on its mount face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoleSpec {
    pub pattern: HolePattern,
    pub face: MountFace,
    /// Face-local `(u, v)` center.
    pub center: Point2<f64>,
    pub diameter: f64,
    pub kind: HoleKind,
}

impl HoleSpec {
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    pub fn mirrored(&self, axis: MirrorAxis) -> Self {
        Self {
            center: self.face.reflect(axis, &self.center),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_hole(u: f64) -> HoleSpec {
        HoleSpec {
            pattern: HolePattern::FrameLinear,
            face: MountFace::FrameLeg,
            center: Point2::new(u, 10.0),
            diameter: 3.2,
            kind: HoleKind::Round,
        }
    }

    #[test]
    fn frame_holes_flip_under_y_mirror() {
        let h = frame_hole(-17.5).mirrored(MirrorAxis::Y);
        assert_eq!(h.center, Point2::new(17.5, 10.0));
        assert_eq!(h.diameter, 3.2);
    }

    #[test]
    fn rail_holes_ignore_y_mirror() {
        let h = HoleSpec {
            pattern: HolePattern::RailEia,
            face: MountFace::RailLeg,
            center: Point2::new(19.5, 54.0),
            diameter: 4.6,
            kind: HoleKind::Round,
        };
        assert_eq!(h.mirrored(MirrorAxis::Y), h);
        assert_eq!(
            h.mirrored(MirrorAxis::X).center,
            Point2::new(-19.5, 54.0)
        );
    }

    #[test]
    fn world_placement_follows_face_axes() {
        let c = Point2::new(-17.5, 10.0);
        assert_eq!(MountFace::FrameLeg.to_world(&c, -5.0), [-17.5, -5.0, 10.0]);
        assert_eq!(MountFace::RailLeg.to_world(&c, 2.0), [2.0, -17.5, 10.0]);
        assert_eq!(MountFace::RailLeg.axis()[MountFace::RailLeg.axis_index()], 1.0);
    }
}
