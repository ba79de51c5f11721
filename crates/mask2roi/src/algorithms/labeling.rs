use image::Luma;
use imageproc::region_labelling::connected_components;

use crate::{
    config::Connectivity,
    error::Result,
    traits::RegionLabeler,
    types::{BACKGROUND, LabeledRaster, Mask},
};

/// Imageproc-based connected-component labeller
#[derive(Debug, Clone, Default)]
pub struct ImageprocRegionLabeler;

impl RegionLabeler for ImageprocRegionLabeler {
    fn label(&self, mask: &Mask, connectivity: Connectivity) -> Result<LabeledRaster> {
        let raw = connected_components(mask.as_image(), connectivity.into(), Luma([BACKGROUND]));
        Ok(LabeledRaster::from_components(raw))
    }
}
