//! maskcad-io: Filesystem I/O for maskcad.
//!
//! Loads mask images and the manifests that list them, reads export
//! configuration, and writes output files atomically. Everything that
//! touches the disk lives here so the pipeline and export crates stay
//! pure.

pub mod config;
pub mod error;
pub mod manifest;
pub mod raster;
pub mod write;

pub use config::load_config;
pub use error::IoError;
pub use manifest::{Manifest, MaskEntry, load_manifest};
pub use raster::{decode_mask, encode_png, load_mask_png};
pub use write::write_atomic;
