//! Plain-text summary of a batch run.

use bracket_types::RoleTag;
use solid_kernel::{BoundingBox, KernelBundle};

use crate::batch::BatchOutcome;
use crate::types::AssemblyStep;

/// One built part.
pub struct PartEntry {
    pub role: RoleTag,
    pub topology: (usize, usize, usize),
    pub bounding_box: Option<BoundingBox>,
    pub hole_count: usize,
    pub fillet_count: usize,
}

/// One role that could not be built.
pub struct FailureEntry {
    pub role: RoleTag,
    pub step: AssemblyStep,
    pub message: String,
}

/// One attempted artifact write.
pub struct ExportEntry {
    pub name: String,
    pub result: Result<String, String>,
}

#[derive(Default)]
pub struct BatchReport {
    pub parts: Vec<PartEntry>,
    pub failures: Vec<FailureEntry>,
    pub exports: Vec<ExportEntry>,
}

impl BatchReport {
    /// Snapshot a batch outcome while its solids are still live in `kernel`.
    pub fn new(kernel: &dyn KernelBundle, outcome: &BatchOutcome) -> Self {
        let parts = outcome
            .parts
            .iter()
            .map(|part| PartEntry {
                role: part.role(),
                topology: part.topology(kernel),
                bounding_box: part.bounding_box(kernel),
                hole_count: part.plan().hole_count(),
                fillet_count: part.plan().fillets.len(),
            })
            .collect();
        let failures = outcome
            .failures
            .iter()
            .map(|f| FailureEntry {
                role: f.role,
                step: f.step,
                message: f.source.to_string(),
            })
            .collect();
        Self {
            parts,
            failures,
            exports: Vec::new(),
        }
    }

    pub fn record_export(&mut self, name: impl Into<String>, result: Result<String, String>) {
        self.exports.push(ExportEntry {
            name: name.into(),
            result,
        });
    }

    /// Whether every role was built and every export succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.exports.iter().all(|e| e.result.is_ok())
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Rack Bracket Report ===\n\n");

        out.push_str(&format!(
            "Parts ({} built, {} failed):\n",
            self.parts.len(),
            self.failures.len(),
        ));
        for entry in &self.parts {
            let (v, e, f) = entry.topology;
            out.push_str(&format!(
                "  {}: V={} E={} F={} | {} holes, {} fillets\n",
                entry.role, v, e, f, entry.hole_count, entry.fillet_count,
            ));
            if let Some(bb) = &entry.bounding_box {
                let [sx, sy, sz] = bb.size();
                out.push_str(&format!(
                    "      Bounding Box: ({:.1}, {:.1}, {:.1}) -> ({:.1}, {:.1}, {:.1}) \
                     [{:.1} x {:.1} x {:.1}]\n",
                    bb.min[0], bb.min[1], bb.min[2], bb.max[0], bb.max[1], bb.max[2], sx, sy, sz,
                ));
            }
        }

        if !self.exports.is_empty() {
            out.push_str("\nExports:\n");
            for e in &self.exports {
                match &e.result {
                    Ok(detail) => out.push_str(&format!("  [OK] {}: {}\n", e.name, detail)),
                    Err(reason) => out.push_str(&format!("  [FAIL] {}: {}\n", e.name, reason)),
                }
            }
        }

        if self.failures.is_empty() {
            out.push_str("\nErrors: none\n");
        } else {
            out.push_str(&format!("\nErrors ({}):\n", self.failures.len()));
            for f in &self.failures {
                out.push_str(&format!("  {} at {}: {}\n", f.role, f.step, f.message));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::generate;
    use bracket_planner::DimensionSet;
    use solid_kernel::{KernelOp, MockKernel};

    #[test]
    fn clean_run_lists_every_part() {
        let mut kernel = MockKernel::new();
        let outcome = generate(&mut kernel, &DimensionSet::prusa_6u(), &RoleTag::ALL).unwrap();
        let text = BatchReport::new(&kernel, &outcome).to_text();
        assert!(text.contains("Parts (4 built, 0 failed)"));
        assert!(text.contains("top_bracket_left: V="));
        assert!(text.contains("[49.0 x 43.0 x 97.0]"));
        assert!(text.contains("Errors: none"));
    }

    #[test]
    fn failures_and_exports_are_listed() {
        let mut kernel = MockKernel::new();
        kernel.fail_next(KernelOp::Mirror);
        let outcome = generate(&mut kernel, &DimensionSet::prusa_6u(), &RoleTag::ALL).unwrap();
        let mut report = BatchReport::new(&kernel, &outcome);
        report.record_export("top_bracket_left", Err("disk full".into()));
        assert!(!report.is_clean());
        let text = report.to_text();
        assert!(text.contains("top_bracket_right at mirror: kernel rejected the request"));
        assert!(text.contains("[FAIL] top_bracket_left: disk full"));
    }
}
