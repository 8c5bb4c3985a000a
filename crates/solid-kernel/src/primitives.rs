//! Solid builders on top of truck's sweep API.
//!
//! truck has no built-in prism or cylinder; everything is successive sweeps.

use std::f64::consts::PI;
use truck_modeling::builder;
use truck_modeling::geometry::{Curve, Line};
use truck_modeling::topology::{Edge, Solid, Wire};
use truck_modeling::{InnerSpace, Point3, Rad, Vector3};

use crate::types::KernelError;

/// Closed planar polygon in the plane `z`, swept `depth` along +Z.
pub fn make_prism(outline: &[[f64; 2]], z: f64, depth: f64) -> Result<Solid, KernelError> {
    if outline.len() < 3 {
        return Err(KernelError::ExtrudeFailed {
            reason: format!("outline has {} points, need at least 3", outline.len()),
        });
    }
    let pts: Vec<Point3> = outline
        .iter()
        .map(|p| Point3::new(p[0], p[1], z))
        .collect();
    let n = pts.len();
    let vertices: Vec<_> = pts.iter().map(|&p| builder::vertex(p)).collect();
    let mut edges: Vec<Edge> = Vec::with_capacity(n);
    for i in 0..n {
        let j = (i + 1) % n;
        edges.push(Edge::new(
            &vertices[i],
            &vertices[j],
            Curve::Line(Line(pts[i], pts[j])),
        ));
    }
    let wire = Wire::from_iter(edges);
    let face = builder::try_attach_plane(&[wire]).map_err(|e| KernelError::ExtrudeFailed {
        reason: format!("failed to create planar face: {}", e),
    })?;
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, depth)))
}

/// Cylinder of `radius` starting at `origin`, running `length` along `axis`.
pub fn make_cylinder(
    origin: [f64; 3],
    axis: [f64; 3],
    radius: f64,
    length: f64,
) -> Result<Solid, KernelError> {
    let axis = Vector3::new(axis[0], axis[1], axis[2]);
    if axis.magnitude() < 1e-12 {
        return Err(KernelError::BooleanFailed {
            reason: "cutter axis has zero length".to_string(),
        });
    }
    let axis = axis.normalize();
    let up = if axis.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    let radial = up.cross(axis).normalize() * radius;
    let center = Point3::new(origin[0], origin[1], origin[2]);

    let v = builder::vertex(center + radial);
    let wire = builder::rsweep(&v, center, axis, Rad(2.0 * PI));
    let face = builder::try_attach_plane(&[wire]).map_err(|e| KernelError::BooleanFailed {
        reason: format!("failed to create cutter face: {}", e),
    })?;
    Ok(builder::tsweep(&face, axis * length))
}
