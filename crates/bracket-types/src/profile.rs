use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds2, Point2, Vector2};

/// Semantic name of a characteristic point of the bracket cross-section.
///
/// Tags travel with their vertex through every transform, so consumers look
/// corners up by tag and never by position in the vertex list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VertexTag {
    /// Underside of the frame leg at its free end.
    FrameToeOuter,
    /// Outer corner where the frame leg underside meets the rail leg outer face.
    OuterHeel,
    /// Rail leg outer face at the frame leg's top plane.
    RailHeel,
    /// Free end of the rail leg, outer face.
    RailTipOuter,
    /// Free end of the rail leg, inner face.
    RailTipInner,
    /// End of the angle brace on the rail leg.
    BraceRail,
    /// End of the angle brace on the frame leg.
    BraceFrame,
    /// Top of the frame leg at its free end.
    FrameToeInner,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileVertex {
    pub tag: VertexTag,
    pub position: Point2<f64>,
}

/// A closed polygon describing a part's cross-section before extrusion.
///
/// The closing edge from the last vertex back to the first is implied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    vertices: Vec<ProfileVertex>,
}

/// A profile vertex together with the directions of the two edges meeting there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub position: Point2<f64>,
    /// Direction of the edge arriving at the corner.
    pub incoming: Vector2<f64>,
    /// Direction of the edge leaving the corner.
    pub outgoing: Vector2<f64>,
}

impl Corner {
    /// Outward normals of the two adjacent edges, assuming counter-clockwise order.
    pub fn outward_normals(&self) -> [Vector2<f64>; 2] {
        [outward_normal(&self.incoming), outward_normal(&self.outgoing)]
    }

    /// Signed turn at this corner: positive for convex, negative for reflex.
    pub fn turn(&self) -> f64 {
        self.incoming.perp(&self.outgoing)
    }
}

/// Outward normal of an edge direction on a counter-clockwise loop.
pub fn outward_normal(direction: &Vector2<f64>) -> Vector2<f64> {
    let n = Vector2::new(direction.y, -direction.x);
    let len = n.norm();
    if len > 0.0 {
        n / len
    } else {
        n
    }
}

impl Profile {
    pub fn new(vertices: Vec<ProfileVertex>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[ProfileVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &Point2<f64>> + '_ {
        self.vertices.iter().map(|v| &v.position)
    }

    /// Edges as `(start, end)` pairs, including the implied closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| {
            (
                self.vertices[i].position,
                self.vertices[(i + 1) % n].position,
            )
        })
    }

    pub fn find(&self, tag: VertexTag) -> Option<&ProfileVertex> {
        self.vertices.iter().find(|v| v.tag == tag)
    }

    /// The corner carrying `tag`, with its adjacent edge directions.
    pub fn corner(&self, tag: VertexTag) -> Option<Corner> {
        let n = self.vertices.len();
        let i = self.vertices.iter().position(|v| v.tag == tag)?;
        let prev = self.vertices[(i + n - 1) % n].position;
        let here = self.vertices[i].position;
        let next = self.vertices[(i + 1) % n].position;
        Some(Corner {
            position: here,
            incoming: here - prev,
            outgoing: next - here,
        })
    }

    /// Every corner in traversal order.
    pub fn corners(&self) -> Vec<(VertexTag, Corner)> {
        self.vertices
            .iter()
            .filter_map(|v| self.corner(v.tag).map(|c| (v.tag, c)))
            .collect()
    }

    /// Shoelace area: positive for counter-clockwise traversal.
    pub fn signed_area(&self) -> f64 {
        let twice: f64 = self
            .edges()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum();
        twice / 2.0
    }

    pub fn bounds(&self) -> Option<Bounds2> {
        Bounds2::from_points(self.points())
    }

    /// Plain coordinate list for handing to a modeling kernel.
    pub fn outline(&self) -> Vec<[f64; 2]> {
        self.points().map(|p| [p.x, p.y]).collect()
    }
}

/// The triangular reinforcement filling the inside corner of the L.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// Counter-clockwise corners.
    pub points: [Point2<f64>; 3],
}

impl Triangle {
    pub fn signed_area(&self) -> f64 {
        let [a, b, c] = self.points;
        (b - a).perp(&(c - a)) / 2.0
    }
}
