use crate::{
    config::Connectivity,
    error::Result,
    types::{BoundaryPointSet, LabeledRaster, Mask, Polygon},
};

/// Trait for interior hole filling
pub trait HoleFiller: Send + Sync {
    /// Fill background areas fully enclosed by foreground
    fn fill_holes(&self, mask: &Mask) -> Result<Mask>;
}

/// Trait for removing connected components below an area threshold
pub trait ObjectFilter: Send + Sync {
    /// Zero out components with fewer than `min_area` pixels
    fn remove_small_objects(
        &self,
        mask: &Mask,
        min_area: usize,
        connectivity: Connectivity,
    ) -> Result<Mask>;
}

/// Trait for connected-component labelling
pub trait RegionLabeler: Send + Sync {
    /// Assign ids 1..=K to the connected foreground components, 0 to background
    fn label(&self, mask: &Mask, connectivity: Connectivity) -> Result<LabeledRaster>;
}

/// Trait for boundary (perimeter pixel) extraction of a single region
pub trait BoundaryExtractor: Send + Sync {
    /// Edge mask of the same shape as the input
    fn boundary_mask(&self, region: &Mask, connectivity: Connectivity) -> Result<Mask>;
}

/// Trait for ordering an unordered boundary point set into an outline
pub trait TourBuilder: Send + Sync {
    /// Every input point must appear exactly once in the output
    fn build_tour(&self, points: &BoundaryPointSet) -> Polygon;
}

/// Trait for reducing the vertex count of an ordered outline
pub trait VertexDecimator: Send + Sync {
    fn decimate(&self, polygon: &Polygon) -> Polygon;
}
