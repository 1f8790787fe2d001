//! Run summary returned alongside the serialized document.

use maskcad_pipeline::{FailedStage, MaskDiagnostics, MaskError};
use serde::Serialize;

/// One mask that failed; the rest of the batch was still exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskFailure {
    /// Position of the mask in the input.
    pub mask_index: usize,
    /// Stage the failure happened in.
    pub stage: FailedStage,
    /// Human-readable cause.
    pub reason: String,
}

impl MaskFailure {
    /// Record a per-mask error.
    #[must_use]
    pub fn new(mask_index: usize, error: &MaskError) -> Self {
        Self {
            mask_index,
            stage: error.stage,
            reason: error.kind.to_string(),
        }
    }
}

/// Outcome of one export run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportReport {
    /// Polylines written to the document.
    pub entities_written: usize,
    /// Names of the layers created, in first-use order.
    pub layers_created: Vec<String>,
    /// Text labels written.
    pub labels_written: usize,
    /// Masks supplied.
    pub masks_total: usize,
    /// Masks that went through every stage (possibly yielding no regions).
    pub masks_exported: usize,
    /// Masks never started because the run was cancelled.
    pub masks_skipped: usize,
    /// Whether cancellation was requested before every mask started.
    pub cancelled: bool,
    /// Failures in input order.
    pub per_mask_errors: Vec<MaskFailure>,
    /// Diagnostics of every exported mask, in input order.
    pub diagnostics: Vec<MaskDiagnostics>,
}

impl ExportReport {
    /// One-line summary suitable for logs.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut s = format!(
            "exported {}/{} masks: {} entities on {} layers ({}), {} failed",
            self.masks_exported,
            self.masks_total,
            self.entities_written,
            self.layers_created.len(),
            self.layers_created.join(", "),
            self.per_mask_errors.len(),
        );
        if self.labels_written > 0 {
            s.push_str(&format!(", {} labels", self.labels_written));
        }
        if self.cancelled {
            s.push_str(&format!(", cancelled ({} skipped)", self.masks_skipped));
        }
        s
    }

    /// Multi-line report: the summary, each failure, then per-mask
    /// diagnostics.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = vec![self.summary()];
        for failure in &self.per_mask_errors {
            lines.push(format!(
                "  mask {}: {} stage failed: {}",
                failure.mask_index, failure.stage, failure.reason
            ));
        }
        for diagnostics in &self.diagnostics {
            lines.push(String::new());
            lines.push(diagnostics.report());
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use maskcad_pipeline::GeometryError;

    use super::*;

    #[test]
    fn failure_keeps_stage_and_reason() {
        let err = MaskError::new(FailedStage::Extract, GeometryError::ZeroArea);
        let failure = MaskFailure::new(2, &err);
        assert_eq!(failure.mask_index, 2);
        assert_eq!(failure.stage, FailedStage::Extract);
        assert_eq!(failure.reason, GeometryError::ZeroArea.to_string());
    }

    #[test]
    fn summary_mentions_cancellation() {
        let report = ExportReport {
            masks_total: 5,
            masks_exported: 2,
            masks_skipped: 3,
            cancelled: true,
            ..ExportReport::default()
        };
        let summary = report.summary();
        assert!(summary.starts_with("exported 2/5 masks"));
        assert!(summary.contains("cancelled (3 skipped)"));
    }

    #[test]
    fn summary_names_layers() {
        let report = ExportReport {
            masks_total: 2,
            masks_exported: 2,
            entities_written: 3,
            layers_created: vec!["WALL".into(), "DOOR".into()],
            ..ExportReport::default()
        };
        assert_eq!(
            report.summary(),
            "exported 2/2 masks: 3 entities on 2 layers (WALL, DOOR), 0 failed"
        );
        let json = serde_json::to_value(&report).unwrap_or_default();
        assert_eq!(json["layers_created"], serde_json::json!(["WALL", "DOOR"]));
    }

    #[test]
    fn report_lists_failures() {
        let report = ExportReport {
            masks_total: 1,
            per_mask_errors: vec![MaskFailure {
                mask_index: 0,
                stage: FailedStage::Simplify,
                reason: "boom".into(),
            }],
            ..ExportReport::default()
        };
        assert!(report.report().contains("mask 0: simplify stage failed: boom"));
    }
}
