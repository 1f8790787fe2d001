//! Batch export: every mask through the pipeline on a bounded worker
//! pool, then a single-threaded reduction into one document.
//!
//! Masks are independent, so each one is a task on a dedicated rayon
//! pool. Results are collected by input index; document assembly walks
//! them in that order, which makes the output independent of scheduling.
//!
//! Input is any slice of [`MaskSource`]: plain [`Mask`]s, or per-mask
//! load results where a mask that could not be read is reported as a
//! failure of the load stage while the rest of the batch goes on.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use maskcad_pipeline::{
    Classified, ConfigError, ContourExtractor, Dimensions, Mask, MaskError, MaskSettings,
    PipelineConfig, process_mask,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::document::{DEFAULT_TEXT_HEIGHT, Document, DxfVersion, Metadata, Units};
use crate::error::ExportError;
use crate::report::{ExportReport, MaskFailure};

/// Default DXF release.
pub const DEFAULT_DXF_VERSION: &str = "R2018";

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 4;

/// Default `$DWGAUTHOR`.
pub const DEFAULT_AUTHOR: &str = "maskcad";

/// Default `$DWGSUBJECT`.
pub const DEFAULT_SUBJECT: &str = "Segmentation vector export";

/// Everything an export run needs besides the masks themselves.
///
/// Pipeline parameters sit at the top level next to the output options:
///
/// ```json
/// { "simplify": { "pixels": 0.5 }, "dxf_version": "R2010", "units": "cm" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Per-mask pipeline parameters.
    #[serde(flatten)]
    pub pipeline: PipelineConfig,

    /// Target DXF release, parsed at the start of the run.
    pub dxf_version: String,

    /// Drawing units.
    pub units: Units,

    /// Worker threads for per-mask processing.
    pub workers: usize,

    /// Drawing properties written to the header.
    pub metadata: Metadata,

    /// Label each region with its mask label on the text layer.
    pub annotate: bool,

    /// Label height in drawing units.
    pub text_height: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            dxf_version: DEFAULT_DXF_VERSION.to_owned(),
            units: Units::default(),
            workers: DEFAULT_WORKERS,
            metadata: Metadata {
                title: None,
                author: Some(DEFAULT_AUTHOR.to_owned()),
                subject: Some(DEFAULT_SUBJECT.to_owned()),
            },
            annotate: false,
            text_height: DEFAULT_TEXT_HEIGHT,
        }
    }
}

/// Validated run-level settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Target DXF release.
    pub version: DxfVersion,
    /// Per-mask settings.
    pub mask: MaskSettings,
    /// Worker threads.
    pub workers: usize,
    /// Label height when annotating, `None` for no labels.
    pub text_height: Option<f64>,
}

impl ExportConfig {
    /// Validate in a fixed order: DXF version, transform, layer rules,
    /// then everything else.
    ///
    /// # Errors
    ///
    /// Returns the first failure as an [`ExportError`].
    pub fn validate(&self, image: Dimensions) -> Result<RunSettings, ExportError> {
        let version: DxfVersion = self.dxf_version.parse()?;
        let mask = self.pipeline.validate(image)?;
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()).into());
        }
        if !(self.text_height.is_finite() && self.text_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "text_height must be positive, got {}",
                self.text_height
            ))
            .into());
        }
        Ok(RunSettings {
            version,
            mask,
            workers: self.workers,
            text_height: self.annotate.then_some(self.text_height),
        })
    }
}

/// Shared flag that stops masks from starting once set.
///
/// Masks already running finish normally; masks not yet started are
/// reported as skipped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What happened to one mask.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskEvent {
    /// Every stage succeeded.
    Completed(Classified),
    /// A stage failed; the mask contributes nothing.
    Failed {
        /// Position of the mask in the input.
        index: usize,
        /// The failure.
        error: MaskError,
    },
    /// Cancelled before it started.
    Skipped {
        /// Position of the mask in the input.
        index: usize,
    },
}

impl MaskEvent {
    /// Position of the mask in the input.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Completed(classified) => classified.index(),
            Self::Failed { index, .. } | Self::Skipped { index } => *index,
        }
    }
}

/// One entry of a batch: a mask, or the reason it could not be loaded.
pub trait MaskSource: Sync {
    /// The mask, or the load failure to report in its place.
    ///
    /// # Errors
    ///
    /// Returns the load failure for a mask that never made it into memory.
    fn mask(&self) -> Result<&Mask, &MaskError>;
}

impl MaskSource for Mask {
    fn mask(&self) -> Result<&Mask, &MaskError> {
        Ok(self)
    }
}

impl MaskSource for Result<Mask, MaskError> {
    fn mask(&self) -> Result<&Mask, &MaskError> {
        self.as_ref()
    }
}

/// Run every mask through the pipeline on a pool of `workers` threads.
///
/// Returns one event per mask, in input order. Entries that failed to
/// load become [`MaskEvent::Failed`] without touching the pipeline.
///
/// # Errors
///
/// Returns [`ExportError::WorkerPool`] if the pool cannot be built.
pub fn process_masks<M: MaskSource, E: ContourExtractor + ?Sized>(
    masks: &[M],
    settings: &MaskSettings,
    extractor: &E,
    workers: usize,
    cancel: &CancelToken,
) -> Result<Vec<MaskEvent>, ExportError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("maskcad-worker-{i}"))
        .build()?;

    Ok(pool.install(|| {
        masks
            .par_iter()
            .enumerate()
            .map(|(index, source)| {
                if cancel.is_cancelled() {
                    return MaskEvent::Skipped { index };
                }
                let mask = match source.mask() {
                    Ok(mask) => mask,
                    Err(error) => {
                        return MaskEvent::Failed {
                            index,
                            error: error.clone(),
                        };
                    }
                };
                match process_mask(index, mask, settings, extractor) {
                    Ok(classified) => MaskEvent::Completed(classified),
                    Err(error) => MaskEvent::Failed { index, error },
                }
            })
            .collect()
    }))
}

/// Fold events, in order, into a document and report. With a
/// `text_height`, every labelled region also gets a text label.
#[must_use]
pub fn build_document(
    events: Vec<MaskEvent>,
    version: DxfVersion,
    units: Units,
    metadata: Metadata,
    text_height: Option<f64>,
) -> (Document, ExportReport) {
    let mut document = Document::new(version, units).with_metadata(metadata);
    let mut report = ExportReport {
        masks_total: events.len(),
        ..ExportReport::default()
    };

    for event in events {
        match event {
            MaskEvent::Completed(classified) => {
                let (regions, diagnostics) = classified.into_parts();
                for region in &regions {
                    document.append(region);
                    if let Some(height) = text_height {
                        document.annotate(region, height);
                    }
                }
                report.masks_exported += 1;
                report.diagnostics.push(diagnostics);
            }
            MaskEvent::Failed { index, error } => {
                tracing::warn!(mask = index, stage = %error.stage, "mask skipped: {error}");
                report.per_mask_errors.push(MaskFailure::new(index, &error));
            }
            MaskEvent::Skipped { .. } => {
                report.masks_skipped += 1;
                report.cancelled = true;
            }
        }
    }

    report.entities_written = document.entities().len();
    report.layers_created = document.layers().iter().map(|l| l.name.clone()).collect();
    report.labels_written = document.labels().len();
    (document, report)
}

/// Run a batch through the pipeline and assemble the document without
/// serializing it.
///
/// Run-level validation happens before any mask is touched; per-mask
/// failures are recorded in the report and do not stop the batch.
///
/// # Errors
///
/// Returns an [`ExportError`] if the configuration is invalid or the
/// worker pool cannot start.
pub fn assemble_batch<M: MaskSource, E: ContourExtractor + ?Sized>(
    masks: &[M],
    image: Dimensions,
    config: &ExportConfig,
    extractor: &E,
    cancel: &CancelToken,
) -> Result<(Document, ExportReport), ExportError> {
    let settings = config.validate(image)?;
    tracing::debug!(
        masks = masks.len(),
        version = %settings.version,
        workers = settings.workers,
        "starting export"
    );

    let events = process_masks(masks, &settings.mask, extractor, settings.workers, cancel)?;
    let (document, report) = build_document(
        events,
        settings.version,
        config.units,
        config.metadata.clone(),
        settings.text_height,
    );
    tracing::info!("{}", report.summary());
    Ok((document, report))
}

/// Export a batch of masks to DXF bytes.
///
/// # Errors
///
/// As [`assemble_batch`], plus serialization failures.
pub fn export_batch<M: MaskSource, E: ContourExtractor + ?Sized>(
    masks: &[M],
    image: Dimensions,
    config: &ExportConfig,
    extractor: &E,
    cancel: &CancelToken,
) -> Result<(Vec<u8>, ExportReport), ExportError> {
    let (document, report) = assemble_batch(masks, image, config, extractor, cancel)?;
    Ok((document.serialize()?, report))
}
