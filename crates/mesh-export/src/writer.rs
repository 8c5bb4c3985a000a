use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use solid_kernel::RenderMesh;
use tracing::debug;

use crate::error::ExportError;
use crate::stl::{encode_ascii, encode_binary};

/// Destination for finished meshes.
///
/// `write` is called at most once per artifact and is never retried; the
/// returned string says where the artifact ended up.
pub trait MeshWriter {
    fn write(&mut self, name: &str, mesh: &RenderMesh) -> Result<String, ExportError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StlFormat {
    #[default]
    Binary,
    Ascii,
}

/// Writes `<dir>/<name>.stl`, creating `dir` on first use.
#[derive(Debug, Clone)]
pub struct StlDirWriter {
    dir: PathBuf,
    format: StlFormat,
}

impl StlDirWriter {
    pub fn new(dir: impl Into<PathBuf>, format: StlFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.stl"))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

impl MeshWriter for StlDirWriter {
    fn write(&mut self, name: &str, mesh: &RenderMesh) -> Result<String, ExportError> {
        let bytes = match self.format {
            StlFormat::Binary => encode_binary(mesh, name)?,
            StlFormat::Ascii => encode_ascii(mesh, name)?.into_bytes(),
        };
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.path_for(name);
        fs::write(&path, &bytes).map_err(|e| io_error(&path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote STL");
        Ok(path.display().to_string())
    }
}

/// Keeps meshes in memory, for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    meshes: BTreeMap<String, RenderMesh>,
    reject: BTreeSet<String>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to store the named artifact.
    pub fn reject(mut self, name: impl Into<String>) -> Self {
        self.reject.insert(name.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&RenderMesh> {
        self.meshes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.meshes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl MeshWriter for MemoryWriter {
    fn write(&mut self, name: &str, mesh: &RenderMesh) -> Result<String, ExportError> {
        if self.reject.contains(name) {
            return Err(ExportError::Rejected {
                name: name.to_string(),
                reason: "rejected by writer".to_string(),
            });
        }
        self.meshes.insert(name.to_string(), mesh.clone());
        Ok(format!("memory:{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> RenderMesh {
        RenderMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0].repeat(4),
            indices: vec![0, 1, 2, 0, 2, 3],
            face_ranges: Vec::new(),
        }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mesh-export-{tag}-{}", std::process::id()))
    }

    #[test]
    fn dir_writer_creates_the_directory() {
        let dir = scratch_dir("create").join("nested");
        let mut writer = StlDirWriter::new(&dir, StlFormat::Binary);
        let location = writer.write("top_bracket_left", &square()).unwrap();
        let path = dir.join("top_bracket_left.stl");
        assert_eq!(location, path.display().to_string());
        assert_eq!(fs::metadata(&path).unwrap().len(), 80 + 4 + 2 * 50);
        fs::remove_dir_all(dir.parent().unwrap()).ok();
    }

    #[test]
    fn ascii_format_writes_text() {
        let dir = scratch_dir("ascii");
        let mut writer = StlDirWriter::new(&dir, StlFormat::Ascii);
        writer.write("part", &square()).unwrap();
        let text = fs::read_to_string(writer.path_for("part")).unwrap();
        assert!(text.starts_with("solid part"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn encoding_failure_writes_nothing() {
        let dir = scratch_dir("empty");
        let mut writer = StlDirWriter::new(&dir, StlFormat::Binary);
        assert!(writer.write("empty", &RenderMesh::default()).is_err());
        assert!(!writer.path_for("empty").exists());
    }

    #[test]
    fn memory_writer_can_reject() {
        let mut writer = MemoryWriter::new().reject("b");
        writer.write("a", &square()).unwrap();
        assert!(matches!(
            writer.write("b", &square()),
            Err(ExportError::Rejected { .. })
        ));
        assert_eq!(writer.names().collect::<Vec<_>>(), ["a"]);
    }
}
