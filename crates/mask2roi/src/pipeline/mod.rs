pub mod builder;

use tracing::{debug, warn};

use crate::{
    algorithms::{MIN_REGION_AREA, boundary_points, round_polygons},
    config::Configuration,
    error::{Mask2RoiError, Result, Warning},
    traits::{BoundaryExtractor, HoleFiller, ObjectFilter, RegionLabeler, TourBuilder, VertexDecimator},
    types::{BoundaryOutput, Mask, Polygon, RoiSet},
};

/// Mask to polygon pipeline: fill, filter, label, then trace and decimate each region in order
pub struct RegionPipeline {
    configuration: Configuration,
    hole_filler: Box<dyn HoleFiller>,
    object_filter: Box<dyn ObjectFilter>,
    labeler: Box<dyn RegionLabeler>,
    boundary_extractor: Box<dyn BoundaryExtractor>,
    tour_builder: Box<dyn TourBuilder>,
    decimator: Box<dyn VertexDecimator>,
}

impl RegionPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::RegionPipelineBuilder {
        builder::RegionPipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        configuration: Configuration,
        hole_filler: Box<dyn HoleFiller>,
        object_filter: Box<dyn ObjectFilter>,
        labeler: Box<dyn RegionLabeler>,
        boundary_extractor: Box<dyn BoundaryExtractor>,
        tour_builder: Box<dyn TourBuilder>,
        decimator: Box<dyn VertexDecimator>,
    ) -> Self {
        Self {
            configuration,
            hole_filler,
            object_filter,
            labeler,
            boundary_extractor,
            tour_builder,
            decimator,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Process a mask through the entire pipeline.
    ///
    /// Returns one polygon per region 1..=N. When more regions are requested
    /// than exist, the missing slots are empty polygons (and all-background
    /// boundary masks); `RoiSet::regions_found` tells the two cases apart.
    pub fn process(&self, mask: &Mask, boundaries: BoundaryOutput) -> Result<RoiSet> {
        if mask.is_empty() {
            return Err(Mask2RoiError::EmptyMask);
        }
        let config = &self.configuration;
        let (width, height) = mask.dimensions();

        // Step 1: Fill holes on a private copy
        let filled;
        let working = if config.fill_holes {
            filled = self.hole_filler.fill_holes(mask)?;
            &filled
        } else {
            mask
        };

        // Step 2: Drop specks too small to trace
        let filtered =
            self.object_filter
                .remove_small_objects(working, MIN_REGION_AREA, config.connectivity)?;

        // Step 3: Label what is left
        let labeled = self.labeler.label(&filtered, config.connectivity)?;
        let found = labeled.count() as usize;
        debug!(regions = found, connectivity = %config.connectivity, "labelled mask");

        // Step 4: Reconcile the requested region count with what was found
        let mut warnings = Vec::new();
        let emitted = match config.region_count {
            0 => found,
            requested => {
                // A mask cannot hold more regions than pixels
                let limit = (width as usize).saturating_mul(height as usize);
                if requested > limit {
                    return Err(Mask2RoiError::TooManyRegions { requested, limit });
                }
                if found > requested {
                    let warning = Warning::RegionsTruncated { found, requested };
                    warn!("{warning}");
                    warnings.push(warning);
                } else if found < requested {
                    debug!(
                        found,
                        requested,
                        "fewer regions than requested; padding with empty polygons"
                    );
                }
                requested
            }
        };
        let traced = emitted.min(found);

        // Step 5: Trace each region in label order
        let mut polygons = Vec::with_capacity(emitted);
        let mut boundary_masks = match boundaries {
            BoundaryOutput::Keep => Some(Vec::with_capacity(emitted)),
            BoundaryOutput::Discard => None,
        };

        for index in 1..=traced {
            let region = labeled.region_mask(index as u32);
            let (edges, points) =
                boundary_points(self.boundary_extractor.as_ref(), &region, config.connectivity)?;
            let tour = self.tour_builder.build_tour(&points);
            let polygon = self.decimator.decimate(&tour);
            debug!(
                region = index,
                boundary_pixels = points.len(),
                vertices = polygon.len(),
                "traced region"
            );

            polygons.push(polygon);
            if let Some(masks) = boundary_masks.as_mut() {
                masks.push(edges);
            }
        }

        // Placeholders for requested regions that do not exist
        polygons.resize_with(emitted, Polygon::empty);
        if let Some(masks) = boundary_masks.as_mut() {
            masks.resize_with(emitted, || Mask::new(width, height));
        }

        // Step 6: Optional rounding
        if config.round_output {
            round_polygons(&mut polygons);
        }

        Ok(RoiSet {
            polygons,
            boundary_masks,
            warnings,
            regions_found: found,
            configuration: config.clone(),
            image_width: width,
            image_height: height,
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let config = &self.configuration;
        format!(
            "RegionPipeline: regions={} connectivity={} fill_holes={} stride={} round={}",
            if config.region_count == 0 {
                "all".to_string()
            } else {
                config.region_count.to_string()
            },
            config.connectivity,
            config.fill_holes,
            config.decimation_stride,
            config.round_output,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Connectivity, types::BoundaryPointSet};
    use std::num::NonZeroUsize;

    fn blocks(grid: u32, blocks: &[(u32, u32, u32)]) -> Mask {
        let mut mask = Mask::new(grid, grid);
        for &(left, top, size) in blocks {
            for y in top..top + size {
                for x in left..left + size {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    fn pipeline(configuration: Configuration) -> RegionPipeline {
        RegionPipeline::builder().configuration(configuration).build()
    }

    fn segments_cross(a: [f32; 2], b: [f32; 2], c: [f32; 2], d: [f32; 2]) -> bool {
        let orient = |p: [f32; 2], q: [f32; 2], r: [f32; 2]| {
            (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0])
        };
        let (d1, d2) = (orient(c, d, a), orient(c, d, b));
        let (d3, d4) = (orient(a, b, c), orient(a, b, d));
        d1 * d2 < 0.0 && d3 * d4 < 0.0
    }

    fn assert_simple(polygon: &Polygon) {
        let v = &polygon.vertices;
        let n = v.len();
        for i in 0..n {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (a, b) = (v[i], v[(i + 1) % n]);
                let (c, d) = (v[j], v[(j + 1) % n]);
                assert!(!segments_cross(a, b, c, d), "edges {i} and {j} cross");
            }
        }
    }

    #[test]
    fn test_single_square_default_configuration() {
        let mask = blocks(10, &[(3, 3, 4)]);
        let result = pipeline(Configuration::default())
            .process(&mask, BoundaryOutput::Keep)
            .expect("Should process successfully");

        assert_eq!(result.len(), 1);
        assert_eq!(result.regions_found, 1);
        assert_eq!(result.polygons[0].len(), 6);
        assert!(result.warnings.is_empty());

        let masks = result.boundary_masks.expect("Boundary masks requested");
        assert_eq!(masks.len(), 1);
        assert_eq!(masks[0].foreground_count(), 12);

        // Every kept vertex is a boundary pixel and coordinates stay integral
        for &[x, y] in result.polygons[0].rows() {
            assert_eq!(x.fract(), 0.0);
            assert!(masks[0].get(x as u32, y as u32));
        }
    }

    #[test]
    fn test_stride_one_keeps_every_boundary_pixel() {
        let mask = blocks(10, &[(3, 3, 4)]);
        let config = Configuration {
            decimation_stride: NonZeroUsize::MIN,
            ..Configuration::default()
        };
        let result = pipeline(config)
            .process(&mask, BoundaryOutput::Keep)
            .expect("Should process successfully");

        let masks = result.boundary_masks.as_ref().expect("Boundary masks requested");
        let expected = BoundaryPointSet::from_mask(&masks[0]);
        let mut actual: Vec<[u32; 2]> = result.polygons[0]
            .rows()
            .iter()
            .map(|&[x, y]| [x as u32, y as u32])
            .collect();
        actual.sort_by_key(|p| (p[1], p[0]));
        assert_eq!(actual, expected.points());
        assert_simple(&result.polygons[0]);
    }

    #[test]
    fn test_separated_blobs_yield_simple_polygons() {
        let mask = blocks(40, &[(2, 2, 6), (20, 4, 8), (5, 25, 10)]);
        let config = Configuration {
            decimation_stride: NonZeroUsize::MIN,
            ..Configuration::default()
        };
        let result = pipeline(config)
            .process(&mask, BoundaryOutput::Discard)
            .expect("Should process successfully");

        assert_eq!(result.len(), 3);
        assert!(result.boundary_masks.is_none());
        for polygon in &result.polygons {
            assert!(!polygon.is_empty());
            assert_simple(polygon);
        }
    }

    #[test]
    fn test_two_squares_in_discovery_order() {
        let mask = blocks(10, &[(5, 1, 3), (1, 5, 3)]);
        let result = pipeline(Configuration::default())
            .process(&mask, BoundaryOutput::Discard)
            .expect("Should process successfully");

        assert_eq!(result.len(), 2);
        assert!(result.polygons[0].rows().iter().all(|&[_, y]| y < 4.0));
        assert!(result.polygons[1].rows().iter().all(|&[_, y]| y >= 5.0));
    }

    #[test]
    fn test_fewer_regions_requested_truncates_with_warning() {
        let mask = blocks(20, &[(1, 1, 3), (8, 1, 3), (15, 1, 3)]);
        let config = Configuration {
            region_count: 2,
            ..Configuration::default()
        };
        let result = pipeline(config)
            .process(&mask, BoundaryOutput::Discard)
            .expect("Should process successfully");

        assert_eq!(result.len(), 2);
        assert_eq!(result.regions_found, 3);
        assert_eq!(
            result.warnings,
            vec![Warning::RegionsTruncated { found: 3, requested: 2 }]
        );
        assert!(result.polygons[1].rows().iter().all(|&[x, _]| (8.0..11.0).contains(&x)));
    }

    #[test]
    fn test_more_regions_requested_pads_with_empty_polygons() {
        let mask = blocks(10, &[(2, 2, 4)]);
        let config = Configuration {
            region_count: 3,
            ..Configuration::default()
        };
        let result = pipeline(config)
            .process(&mask, BoundaryOutput::Keep)
            .expect("Should process successfully");

        assert_eq!(result.len(), 3);
        assert_eq!(result.regions_found, 1);
        assert!(!result.polygons[0].is_empty());
        assert!(result.polygons[1].is_empty());
        assert!(result.polygons[2].is_empty());
        assert_eq!(result.placeholder_count(), 2);
        assert!(result.warnings.is_empty());

        let masks = result.boundary_masks.expect("Boundary masks requested");
        assert_eq!(masks.len(), 3);
        assert_eq!(masks[2].foreground_count(), 0);
        assert_eq!(masks[2].dimensions(), (10, 10));
    }

    #[test]
    fn test_hole_filling_controls_inner_boundary() {
        let mut mask = blocks(12, &[(1, 1, 9)]);
        for y in 4..7 {
            for x in 4..7 {
                mask.set(x, y, false);
            }
        }

        let filled = pipeline(Configuration::default())
            .process(&mask, BoundaryOutput::Keep)
            .expect("Should process successfully");
        let unfilled = pipeline(Configuration {
            fill_holes: false,
            ..Configuration::default()
        })
        .process(&mask, BoundaryOutput::Keep)
        .expect("Should process successfully");

        let filled_edges = &filled.boundary_masks.as_ref().expect("Should keep boundaries")[0];
        let unfilled_edges = &unfilled.boundary_masks.as_ref().expect("Should keep boundaries")[0];
        assert_eq!(filled_edges.foreground_count(), 32);
        assert!(unfilled_edges.foreground_count() > 32);
        assert!(unfilled_edges.get(3, 4));
        assert!(!filled_edges.get(3, 4));
    }

    #[test]
    fn test_specks_are_not_traced() {
        let mask = blocks(10, &[(1, 1, 4), (8, 8, 1)]);
        let result = pipeline(Configuration::default())
            .process(&mask, BoundaryOutput::Discard)
            .expect("Should process successfully");
        assert_eq!(result.regions_found, 1);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_connectivity_four_splits_diagonal_regions() {
        let mask = blocks(10, &[(1, 1, 2), (3, 3, 2)]);
        let eight = pipeline(Configuration::default())
            .process(&mask, BoundaryOutput::Discard)
            .expect("Should process successfully");
        let four = pipeline(Configuration {
            connectivity: Connectivity::Four,
            ..Configuration::default()
        })
        .process(&mask, BoundaryOutput::Discard)
        .expect("Should process successfully");

        assert_eq!(eight.regions_found, 1);
        assert_eq!(four.regions_found, 2);
    }

    #[test]
    fn test_empty_mask_is_rejected() {
        let err = pipeline(Configuration::default())
            .process(&Mask::new(0, 3), BoundaryOutput::Discard)
            .expect_err("Empty mask must be rejected");
        assert!(matches!(err, Mask2RoiError::EmptyMask));
    }

    #[test]
    fn test_input_mask_is_not_modified() {
        let mut mask = blocks(10, &[(1, 1, 5)]);
        mask.set(3, 3, false);
        let before = mask.clone();
        pipeline(Configuration::default())
            .process(&mask, BoundaryOutput::Discard)
            .expect("Should process successfully");
        assert_eq!(mask, before);
    }

    #[test]
    fn test_region_count_beyond_pixel_count_is_rejected() {
        let result = pipeline(Configuration {
            region_count: usize::MAX,
            ..Configuration::default()
        })
        .process(&Mask::new(4, 4), BoundaryOutput::Keep);
        assert!(matches!(
            result,
            Err(Mask2RoiError::TooManyRegions { requested: usize::MAX, limit: 16 })
        ));

        let padded = pipeline(Configuration {
            region_count: 16,
            ..Configuration::default()
        })
        .process(&Mask::new(4, 4), BoundaryOutput::Discard)
        .expect("One region per pixel is allowed");
        assert_eq!(padded.len(), 16);
        assert_eq!(padded.placeholder_count(), 16);
    }

    #[test]
    fn test_padding_without_boundaries_allocates_no_masks() {
        let mask = blocks(10, &[(2, 2, 3)]);
        let result = pipeline(Configuration {
            region_count: 4,
            ..Configuration::default()
        })
        .process(&mask, BoundaryOutput::Discard)
        .expect("Should process successfully");

        assert!(result.boundary_masks.is_none());
        assert_eq!(result.len(), 4);
        assert!(!result.polygons[0].is_empty());
        assert_eq!(result.placeholder_count(), 3);
    }
}
