use std::collections::BTreeSet;

use bracket_planner::DimensionSet;
use bracket_types::{BracketFamily, Hand, RoleTag};
use mesh_export::{ExportError, Exporter, MemoryWriter, StlDirWriter, StlFormat};
use part_assembler::generate;
use solid_kernel::{KernelOp, MockKernel, RenderMesh};

fn extent(mesh: &RenderMesh) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for p in mesh.vertices.chunks_exact(3) {
        for i in 0..3 {
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
    }
    (min, max)
}

#[test]
fn four_roles_export_as_four_distinct_artifacts() {
    let mut kernel = MockKernel::new();
    let outcome = generate(&mut kernel, &DimensionSet::prusa_6u(), &RoleTag::ALL).unwrap();
    assert!(outcome.is_complete());

    let mut exporter = Exporter::new(MemoryWriter::new());
    let results = exporter.export_all(&mut kernel, outcome.parts);
    assert!(results.iter().all(|(_, r)| r.is_ok()));

    let writer = exporter.into_writer();
    let names: BTreeSet<&str> = writer.names().collect();
    assert_eq!(
        names,
        BTreeSet::from([
            "bottom_bracket_left",
            "bottom_bracket_right",
            "top_bracket_left",
            "top_bracket_right",
        ])
    );

    for family in ["top", "bottom"] {
        let left = writer.get(&format!("{family}_bracket_left")).unwrap();
        let right = writer.get(&format!("{family}_bracket_right")).unwrap();
        assert_eq!(left.triangle_count(), right.triangle_count());
        let (lmin, lmax) = extent(left);
        let (rmin, rmax) = extent(right);
        assert_eq!(lmin[0], -rmax[0]);
        assert_eq!(lmax[0], -rmin[0]);
        assert_eq!((lmin[1], lmin[2]), (rmin[1], rmin[2]));
        assert_eq!((lmax[1], lmax[2]), (rmax[1], rmax[2]));
    }

    let (top_min, top_max) = extent(writer.get("top_bracket_left").unwrap());
    let (bot_min, bot_max) = extent(writer.get("bottom_bracket_left").unwrap());
    assert_eq!(top_max[2] - top_min[2], 97.0);
    assert_eq!(bot_max[2] - bot_min[2], 95.0);
    assert_eq!((top_min[0], top_max[0]), (bot_min[0], bot_max[0]));
}

#[test]
fn one_failed_write_leaves_the_others() {
    let mut kernel = MockKernel::new();
    let outcome = generate(&mut kernel, &DimensionSet::prusa_6u(), &RoleTag::ALL).unwrap();
    let mut exporter = Exporter::new(MemoryWriter::new().reject("top_bracket_right"));
    let results = exporter.export_all(&mut kernel, outcome.parts);

    let failed: Vec<RoleTag> = results
        .iter()
        .filter(|(_, r)| r.is_err())
        .map(|(role, _)| *role)
        .collect();
    assert_eq!(failed, [RoleTag::new(BracketFamily::Top, Hand::Right)]);
    assert_eq!(exporter.writer().len(), 3);
}

#[test]
fn tessellation_failure_is_an_export_error() {
    let mut kernel = MockKernel::new();
    let roles = [RoleTag::new(BracketFamily::Top, Hand::Left)];
    let mut outcome = generate(&mut kernel, &DimensionSet::prusa_6u(), &roles).unwrap();
    kernel.fail_next(KernelOp::Tessellate);
    let part = outcome.parts.pop().unwrap();
    let err = Exporter::new(MemoryWriter::new())
        .export(&mut kernel, part)
        .unwrap_err();
    assert!(matches!(err, ExportError::Tessellate { ref name, .. } if name == "top_bracket_left"));
}

#[test]
fn stl_files_land_in_the_output_directory() {
    let dir = std::env::temp_dir().join(format!("rackbrackets-export-{}", std::process::id()));
    let mut kernel = MockKernel::new();
    let outcome = generate(&mut kernel, &DimensionSet::prusa_6u(), &RoleTag::ALL).unwrap();
    let mut exporter = Exporter::new(StlDirWriter::new(&dir, StlFormat::Binary));
    for (_, result) in exporter.export_all(&mut kernel, outcome.parts) {
        let artifact = result.unwrap();
        let bytes = std::fs::read(&artifact.location).unwrap();
        assert_eq!(bytes.len(), 84 + artifact.triangles * 50);
    }
    assert!(dir.join("bottom_bracket_right.stl").exists());
    std::fs::remove_dir_all(&dir).ok();
}
