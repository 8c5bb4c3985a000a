use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::MirrorAxis;
use crate::profile::VertexTag;

/// Symbolic name for an edge that may receive a fillet.
///
/// Each role names a profile corner; the solid edge is the one swept from that
/// corner along the extrusion axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeRole {
    /// Outer heel where the frame leg underside meets the rail leg's outer face.
    WallToFace,
    /// Inner corner where the brace meets the frame leg.
    JointFrameCorner,
    /// Inner corner where the brace meets the rail leg.
    JointRailCorner,
}

impl EdgeRole {
    pub const ALL: [EdgeRole; 3] = [
        EdgeRole::WallToFace,
        EdgeRole::JointFrameCorner,
        EdgeRole::JointRailCorner,
    ];

    pub fn corner_tag(self) -> VertexTag {
        match self {
            EdgeRole::WallToFace => VertexTag::OuterHeel,
            EdgeRole::JointFrameCorner => VertexTag::BraceFrame,
            EdgeRole::JointRailCorner => VertexTag::BraceRail,
        }
    }
}

impl fmt::Display for EdgeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeRole::WallToFace => "wall-to-face",
            EdgeRole::JointFrameCorner => "joint-frame-corner",
            EdgeRole::JointRailCorner => "joint-rail-corner",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilletSpec {
    pub role: EdgeRole,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BracketFamily {
    Top,
    Bottom,
}

impl BracketFamily {
    pub const ALL: [BracketFamily; 2] = [BracketFamily::Top, BracketFamily::Bottom];

    /// Key prefix for family-specific dimensions.
    pub fn key_prefix(self) -> &'static str {
        match self {
            BracketFamily::Top => "top",
            BracketFamily::Bottom => "bottom",
        }
    }
}

impl fmt::Display for BracketFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn opposite(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// Identifies one generated variant, e.g. `top_bracket_left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleTag {
    pub family: BracketFamily,
    pub hand: Hand,
}

impl RoleTag {
    pub const ALL: [RoleTag; 4] = [
        RoleTag::new(BracketFamily::Top, Hand::Left),
        RoleTag::new(BracketFamily::Top, Hand::Right),
        RoleTag::new(BracketFamily::Bottom, Hand::Left),
        RoleTag::new(BracketFamily::Bottom, Hand::Right),
    ];

    pub const fn new(family: BracketFamily, hand: Hand) -> Self {
        Self { family, hand }
    }

    /// Left parts are authored directly; right parts are their Y-axis mirror.
    pub fn mirror_axis(self) -> MirrorAxis {
        match self.hand {
            Hand::Left => MirrorAxis::None,
            Hand::Right => MirrorAxis::Y,
        }
    }

    pub fn is_canonical(self) -> bool {
        self.hand == Hand::Left
    }

    /// The same family, opposite hand.
    pub fn sibling(self) -> RoleTag {
        RoleTag::new(self.family, self.hand.opposite())
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hand = match self.hand {
            Hand::Left => "left",
            Hand::Right => "right",
        };
        write!(f, "{}_bracket_{}", self.family, hand)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role tag '{input}' (expected e.g. top_bracket_left or top-left)")]
pub struct ParseRoleError {
    pub input: String,
}

impl FromStr for RoleTag {
    type Err = ParseRoleError;

    /// Accepts the artifact form (`top_bracket_left`) and the short form (`top-left`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let parts: Vec<&str> = normalized
            .split('_')
            .filter(|p| !p.is_empty() && *p != "bracket")
            .collect();
        let err = || ParseRoleError {
            input: s.to_string(),
        };
        let [family, hand] = parts.as_slice() else {
            return Err(err());
        };
        let family = match *family {
            "top" => BracketFamily::Top,
            "bottom" => BracketFamily::Bottom,
            _ => return Err(err()),
        };
        let hand = match *hand {
            "left" => Hand::Left,
            "right" => Hand::Right,
            _ => return Err(err()),
        };
        Ok(RoleTag::new(family, hand))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_deterministic() {
        let names: Vec<String> = RoleTag::ALL.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            names,
            [
                "top_bracket_left",
                "top_bracket_right",
                "bottom_bracket_left",
                "bottom_bracket_right"
            ]
        );
    }

    #[test]
    fn role_tags_parse_both_forms() {
        let tl = RoleTag::new(BracketFamily::Top, Hand::Left);
        assert_eq!("top_bracket_left".parse::<RoleTag>().unwrap(), tl);
        assert_eq!("top-left".parse::<RoleTag>().unwrap(), tl);
        assert_eq!(
            "Bottom-Right".parse::<RoleTag>().unwrap(),
            RoleTag::new(BracketFamily::Bottom, Hand::Right)
        );
        assert!("middle-left".parse::<RoleTag>().is_err());
        assert!("top".parse::<RoleTag>().is_err());
    }

    #[test]
    fn right_hand_is_mirrored_sibling_of_left() {
        let tl = RoleTag::new(BracketFamily::Top, Hand::Left);
        assert_eq!(tl.mirror_axis(), MirrorAxis::None);
        assert_eq!(tl.sibling().mirror_axis(), MirrorAxis::Y);
        assert_eq!(tl.sibling().sibling(), tl);
    }

    #[test]
    fn edge_roles_name_profile_corners() {
        assert_eq!(EdgeRole::WallToFace.corner_tag(), VertexTag::OuterHeel);
        assert_eq!(EdgeRole::JointRailCorner.to_string(), "joint-rail-corner");
    }
}
