use std::collections::HashSet;

use image::{GrayImage, Luma};
use imageproc::region_labelling::connected_components;

use crate::{
    algorithms::ImageprocRegionLabeler,
    config::Connectivity,
    error::Result,
    traits::{HoleFiller, ObjectFilter, RegionLabeler},
    types::{BACKGROUND, FOREGROUND, Mask},
};

/// Smallest region (in pixels) that survives [`MinAreaObjectFilter`] in the pipeline
pub const MIN_REGION_AREA: usize = 3;

/// Fills every background component that does not touch the image border.
///
/// Background components are traced with `connectivity` (4 by default, so a
/// diagonal gap in an 8-connected outline still encloses its interior).
#[derive(Debug, Clone)]
pub struct BorderFloodHoleFiller {
    pub connectivity: Connectivity,
}

impl Default for BorderFloodHoleFiller {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Four,
        }
    }
}

impl HoleFiller for BorderFloodHoleFiller {
    fn fill_holes(&self, mask: &Mask) -> Result<Mask> {
        let (width, height) = mask.dimensions();

        // Background becomes foreground so that imageproc labels the background components
        let inverted = GrayImage::from_fn(width, height, |x, y| {
            if mask.get(x, y) {
                Luma([BACKGROUND])
            } else {
                Luma([FOREGROUND])
            }
        });
        let components =
            connected_components(&inverted, self.connectivity.into(), Luma([BACKGROUND]));

        let mut outside: HashSet<u32> = HashSet::new();
        for (x, y, label) in components.enumerate_pixels() {
            let on_border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
            if on_border && label[0] != 0 {
                outside.insert(label[0]);
            }
        }

        let mut filled = mask.clone();
        for (x, y, label) in components.enumerate_pixels() {
            if label[0] != 0 && !outside.contains(&label[0]) {
                filled.set(x, y, true);
            }
        }
        Ok(filled)
    }
}

/// Removes components smaller than the requested area
#[derive(Debug, Clone, Default)]
pub struct MinAreaObjectFilter;

impl ObjectFilter for MinAreaObjectFilter {
    fn remove_small_objects(
        &self,
        mask: &Mask,
        min_area: usize,
        connectivity: Connectivity,
    ) -> Result<Mask> {
        let labeled = ImageprocRegionLabeler.label(mask, connectivity)?;
        let areas = labeled.region_areas();

        let mut filtered = mask.clone();
        for (x, y) in mask.foreground_pixels() {
            let label = labeled.label_at(x, y);
            if label > 0 && areas[(label - 1) as usize] < min_area {
                filtered.set(x, y, false);
            }
        }
        Ok(filtered)
    }
}
