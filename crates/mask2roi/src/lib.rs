//! # Mask to ROI Polygon Library
//!
//! Converts a binary mask with one or more connected foreground regions into
//! one ordered polygon per region, ready for vector-overlay editing or further
//! geometric processing.
//!
//! ## Core Features
//!
//! - **Region Pipeline**: hole filling, small-object removal, labelling and
//!   per-region boundary extraction, each behind a trait
//! - **Greedy Tour**: orders the unordered boundary pixels of a region into an
//!   outline by repeatedly stepping to the nearest unvisited pixel
//! - **Decimation & Rounding**: stride sampling of the outline vertices
//! - **Named Options**: `NumROIs`, `Connectivity`, `FillHoles`,
//!   `ScaleNumVertices` and `RoundOutput`, from code, files or the command line
//! - **GeoJSON Support**: export ROI sets as feature collections
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mask2roi::{mask2roi, Mask, OptionValue};
//!
//! let mask = Mask::open("mask.png", None)?;
//! let rois = mask2roi(&mask, &[("NumROIs", OptionValue::from(2))])?;
//!
//! for warning in &rois.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! rois.save_geojson("rois.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use mask2roi::{BoundaryOutput, Configuration, Mask, RegionPipeline, algorithms::*};
//!
//! let pipeline = RegionPipeline::builder()
//!     .configuration(Configuration { fill_holes: false, ..Configuration::default() })
//!     .set_hole_filler(BorderFloodHoleFiller::default())
//!     .build();
//! let rois = pipeline.process(&Mask::new(64, 64), BoundaryOutput::Discard)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod config;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;

// Re-exports for convenience
pub use error::{Mask2RoiError, Result, Warning};
pub use config::{Configuration, Connectivity, OptionName, OptionValue};
pub use types::{BoundaryOutput, BoundaryPointSet, LabeledRaster, Mask, Polygon, RoiSet};
pub use traits::*;
pub use pipeline::{RegionPipeline, builder::RegionPipelineBuilder};
pub use io::ConfigFile;

/// Trace every region of `mask` into a polygon.
///
/// `overrides` are option name/value pairs (see [`OptionName`]); anything not
/// given keeps its default. Configuration errors are returned before any
/// processing starts. Non-fatal problems end up in [`RoiSet::warnings`].
pub fn mask2roi<K: AsRef<str>>(mask: &Mask, overrides: &[(K, OptionValue)]) -> Result<RoiSet> {
    run(mask, overrides, BoundaryOutput::Discard)
}

/// Same as [`mask2roi`], also returning the boundary mask of every ROI.
pub fn mask2roi_with_boundaries<K: AsRef<str>>(
    mask: &Mask,
    overrides: &[(K, OptionValue)],
) -> Result<RoiSet> {
    run(mask, overrides, BoundaryOutput::Keep)
}

fn run<K: AsRef<str>>(
    mask: &Mask,
    overrides: &[(K, OptionValue)],
    boundaries: BoundaryOutput,
) -> Result<RoiSet> {
    if mask.is_empty() {
        return Err(Mask2RoiError::EmptyMask);
    }
    let (configuration, mut warnings) = Configuration::resolve(overrides)?;
    let pipeline = RegionPipeline::builder().configuration(configuration).build();

    let mut rois = pipeline.process(mask, boundaries)?;
    warnings.append(&mut rois.warnings);
    rois.warnings = warnings;
    Ok(rois)
}
