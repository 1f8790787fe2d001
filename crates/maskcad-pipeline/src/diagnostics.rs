//! Per-mask diagnostics: counts and other metrics for each stage.
//!
//! Collected alongside every mask that runs through
//! [`process_mask`](crate::process_mask). Durations are not
//! recorded.

use serde::Serialize;

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum StageMetrics {
    /// Mask cleaning.
    Clean {
        /// Foreground pixels after binarization.
        foreground_before: u64,
        /// Foreground pixels in the cleaned raster.
        foreground_after: u64,
        /// Enclosed background components filled.
        holes_filled: usize,
        /// Small components removed.
        components_removed: usize,
    },
    /// Contour extraction.
    Extract {
        /// Regions found.
        regions: usize,
        /// Hole rings across all regions.
        holes: usize,
        /// Components too small to trace.
        degenerate_components: usize,
    },
    /// Simplification.
    Simplify {
        /// Vertices over all rings before.
        vertices_before: usize,
        /// Vertices over all rings after.
        vertices_after: usize,
        /// Regions that kept their original rings.
        fallbacks: usize,
    },
    /// Pixel-to-CAD mapping.
    Transform {
        /// CAD units per pixel.
        scale: f64,
    },
    /// Layer classification.
    Classify {
        /// Distinct layers assigned, in first-use order.
        layers: Vec<String>,
    },
}

impl StageMetrics {
    /// Display name of the stage.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Clean { .. } => "Clean",
            Self::Extract { .. } => "Contour Extraction",
            Self::Simplify { .. } => "Simplification",
            Self::Transform { .. } => "Transform",
            Self::Classify { .. } => "Classification",
        }
    }
}

/// Diagnostics collected from one mask.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaskDiagnostics {
    /// Position of the mask in the input.
    pub index: usize,
    /// Metrics for each completed stage, in order.
    pub stages: Vec<StageMetrics>,
}

impl MaskDiagnostics {
    /// Empty diagnostics for mask `index`.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            stages: Vec::new(),
        }
    }

    /// Record a finished stage.
    pub fn push(&mut self, metrics: StageMetrics) {
        self.stages.push(metrics);
    }

    /// Regions found during extraction, if it ran.
    #[must_use]
    pub fn regions(&self) -> Option<usize> {
        self.stages.iter().find_map(|s| match s {
            StageMetrics::Extract { regions, .. } => Some(*regions),
            _ => None,
        })
    }

    /// Format as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Mask {} Diagnostics\n{}", self.index, "=".repeat(60)));
        lines.push(format!("{:<24}  {}", "Stage", "Details"));
        lines.push("-".repeat(80));

        for metrics in &self.stages {
            lines.push(format!("{:<24}  {}", metrics.name(), format_metrics(metrics)));
        }

        lines.join("\n")
    }
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Clean {
            foreground_before,
            foreground_after,
            holes_filled,
            components_removed,
        } => format!(
            "foreground={foreground_before} -> {foreground_after} holes_filled={holes_filled} removed={components_removed}"
        ),
        StageMetrics::Extract {
            regions,
            holes,
            degenerate_components,
        } => format!("regions={regions} holes={holes} degenerate={degenerate_components}"),
        StageMetrics::Simplify {
            vertices_before,
            vertices_after,
            fallbacks,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let reduction = if *vertices_before > 0 {
                (1.0 - *vertices_after as f64 / *vertices_before as f64) * 100.0
            } else {
                0.0
            };
            format!(
                "vertices={vertices_before} -> {vertices_after} ({reduction:.1}% reduction) fallbacks={fallbacks}"
            )
        }
        StageMetrics::Transform { scale } => format!("scale={scale}"),
        StageMetrics::Classify { layers } => format!("layers={}", layers.join(",")),
    }
}
