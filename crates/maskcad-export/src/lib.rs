//! maskcad-export: Document assembly and format serializers (sans-IO)
//!
//! Collects classified regions, and optionally their mask labels, into a
//! layered [`Document`] and writes it as DXF (R12, R2000, R2010 or R2018). An SVG preview of the same
//! document is available for quick inspection. The [`batch`] module
//! drives the per-mask pipeline over a bounded worker pool and produces
//! the final bytes together with an [`ExportReport`].

pub mod batch;
pub mod document;
pub mod dxf;
pub mod error;
pub mod report;
pub mod svg;

pub use batch::{
    CancelToken, DEFAULT_AUTHOR, DEFAULT_DXF_VERSION, DEFAULT_SUBJECT, DEFAULT_WORKERS,
    ExportConfig, MaskEvent, MaskSource, RunSettings, assemble_batch, build_document,
    export_batch, process_masks,
};
pub use document::{
    DEFAULT_TEXT_HEIGHT, Document, DocumentState, DxfVersion, Label, Layer, Metadata, Polyline,
    RingRole, TEXT_COLOR, TEXT_LAYER, Units, build,
};
pub use dxf::{LAYER_ZERO, to_dxf};
pub use error::{ExportError, SerializationError};
pub use report::{ExportReport, MaskFailure};
pub use svg::{aci_to_rgb, to_svg};
